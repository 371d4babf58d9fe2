use serde::{Deserialize, Serialize};

/// Acknowledgement code returned by every best-effort control-plane action.
pub const STATUS_ACK: u16 = 220;

/// A stored audio clip as shown by the admin UI.
///
/// `name` is derived from `filename` on every listing and is never persisted.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct StoredFileEntry {
    /// Display name (category prefix and audio extension stripped).
    pub name: String,
    /// File name as stored on disk.
    pub filename: String,
}

/// Generic acknowledgement for fire-and-forget actions (delete, upload).
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct StatusAck {
    pub status: u16,
}

impl Default for StatusAck {
    fn default() -> Self {
        Self { status: STATUS_ACK }
    }
}

/// A voice offered by the speech service.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct VoiceEntry {
    /// Human readable label (language, name, gender).
    pub name: String,
    /// Voice id passed back to the synthesizer.
    pub id: String,
}

/// A networked playback group reachable from this host.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct PlaybackGroup {
    pub name: String,
    pub host: String,
}

/// Request body for synthesizing a phrase into the cache store.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct SayRequest {
    /// Logical client (automation flow) requesting the stream.
    pub client_id: String,
    /// Text to synthesize.
    pub text: String,
    /// Voice id from the voice catalog.
    pub voice_id: String,
}

/// Where a playback device can fetch a synthesized clip.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct SayResponse {
    /// Absolute path of the clip in the cache store.
    pub path: String,
    /// Streaming server URL for the clip.
    pub url: String,
    /// `true` when an existing cache entry was reused.
    pub cached: bool,
    /// `false` when the streaming server is not listening and `url` is unreachable.
    #[serde(default = "default_true")]
    pub stream_available: bool,
}

fn default_true() -> bool {
    true
}

/// Current advisory owner of the streaming server.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct OwnerResponse {
    /// Last client that claimed the server, if any.
    pub owner: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}
