//! Playback target discovery.
//!
//! Browses mDNS for a bounded window and reports every resolved speaker.

use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use mdns_sd::{ServiceDaemon, ServiceEvent};
use tts_hub_types::PlaybackGroup;

/// Sentinel returned to the admin UI when discovery fails.
pub const DISCOVERY_ERROR: &str = "ERRORDISCOVERY";

#[async_trait]
pub trait PlaybackDiscovery: Send + Sync {
    async fn list_targets(&self) -> Result<Vec<PlaybackGroup>>;
}

pub struct MdnsDiscovery {
    service_type: String,
    window: Duration,
}

impl MdnsDiscovery {
    pub fn new(service_type: impl Into<String>, window: Duration) -> Self {
        Self {
            service_type: service_type.into(),
            window,
        }
    }
}

#[async_trait]
impl PlaybackDiscovery for MdnsDiscovery {
    async fn list_targets(&self) -> Result<Vec<PlaybackGroup>> {
        let service_type = self.service_type.clone();
        let window = self.window;
        tokio::task::spawn_blocking(move || browse(&service_type, window))
            .await
            .context("discovery task")?
    }
}

fn browse(service_type: &str, window: Duration) -> Result<Vec<PlaybackGroup>> {
    let daemon = ServiceDaemon::new().map_err(|e| anyhow!("mdns: daemon start failed: {e}"))?;
    let receiver = daemon
        .browse(service_type)
        .map_err(|e| anyhow!("mdns: browse failed: {e}"))?;
    tracing::debug!(service_type = %service_type, "mdns: browsing for playback targets");

    let deadline = Instant::now() + window;
    let mut found: BTreeMap<String, PlaybackGroup> = BTreeMap::new();
    loop {
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            break;
        }
        let event = match receiver.recv_timeout(remaining) {
            Ok(event) => event,
            Err(_) => break,
        };
        if let ServiceEvent::ServiceResolved(info) = event {
            let addr = info.get_addresses().iter().find_map(|ip| match ip {
                mdns_sd::ScopedIp::V4(v4) => Some(*v4.addr()),
                _ => None,
            });
            let Some(ip) = addr else {
                tracing::debug!(fullname = %info.get_fullname(), "mdns: resolved without IPv4");
                continue;
            };
            let name = info
                .get_property("name")
                .map(|p| p.val_str().to_string())
                .unwrap_or_else(|| instance_name(info.get_fullname(), service_type));
            let host = ip.to_string();
            found.insert(host.clone(), PlaybackGroup { name, host });
        }
    }

    let _ = daemon.stop_browse(service_type);
    if let Ok(rx) = daemon.shutdown() {
        let _ = rx.recv_timeout(Duration::from_secs(1));
    }
    tracing::info!(count = found.len(), "mdns: playback targets discovered");
    Ok(found.into_values().collect())
}

/// Instance label from a full mDNS name (`Kitchen._sonos._tcp.local.` -> `Kitchen`).
fn instance_name(fullname: &str, service_type: &str) -> String {
    fullname
        .strip_suffix(service_type)
        .map(|s| s.trim_end_matches('.'))
        .filter(|s| !s.is_empty())
        .unwrap_or(fullname)
        .to_string()
}
