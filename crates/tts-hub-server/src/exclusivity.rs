//! Advisory record of which client last claimed the streaming server.
//!
//! Last writer wins. Nothing checks the owner before streaming or
//! synthesizing; the value only answers "who is using this right now".

use std::sync::Mutex;

#[derive(Debug, Default)]
pub struct ActiveClient {
    owner: Mutex<Option<String>>,
}

impl ActiveClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `client_id` as the current owner, replacing any previous one.
    pub fn set_owner(&self, client_id: &str) {
        if let Ok(mut owner) = self.owner.lock() {
            if owner.as_deref() != Some(client_id) {
                tracing::debug!(previous = ?*owner, owner = %client_id, "streaming server claimed");
            }
            *owner = Some(client_id.to_string());
        }
    }

    /// Current owner, if any client has claimed the server.
    pub fn owner(&self) -> Option<String> {
        self.owner.lock().ok().and_then(|owner| owner.clone())
    }

    /// Forget the owner (unit teardown).
    pub fn clear(&self) {
        if let Ok(mut owner) = self.owner.lock() {
            *owner = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn last_writer_wins() {
        let active = ActiveClient::new();
        assert_eq!(active.owner(), None);
        active.set_owner("flow-a");
        active.set_owner("flow-b");
        assert_eq!(active.owner().as_deref(), Some("flow-b"));
    }

    #[test]
    fn clear_forgets_owner() {
        let active = ActiveClient::new();
        active.set_owner("flow-a");
        active.clear();
        assert_eq!(active.owner(), None);
    }
}
