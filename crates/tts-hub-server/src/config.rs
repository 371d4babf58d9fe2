//! Configuration loading and parsing.
//!
//! Defines the hub config schema and resolves defaults.

use std::net::{IpAddr, SocketAddr};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

/// Stream port used before the listener moved off the host's own port.
pub const LEGACY_STREAM_PORT: u16 = 1880;
/// Default streaming server port.
pub const DEFAULT_STREAM_PORT: u16 = 1980;
const DEFAULT_BIND: &str = "0.0.0.0:8080";
const DEFAULT_STORAGE_ROOT: &str = "tts-hub-storage";
const DEFAULT_DISCOVERY_SERVICE: &str = "_sonos._tcp.local.";
const DEFAULT_DISCOVERY_TIMEOUT_MS: u64 = 3000;
const DEFAULTS_DIR: &str = "defaults";

/// Top-level hub configuration loaded from TOML.
#[derive(Debug, Default, Deserialize)]
pub struct ServerConfig {
    /// Control-plane bind address (host:port).
    pub bind: Option<String>,
    /// IP address playback devices use to reach the streaming server.
    pub ip_address: Option<String>,
    /// Streaming server port.
    pub stream_port: Option<u16>,
    /// Interface the streaming server listens on.
    pub stream_host: Option<String>,
    /// Persistent storage root holding the three file stores.
    pub storage_root: Option<String>,
    /// Bundled default clips used to seed permanent and hailing stores.
    pub defaults_dir: Option<String>,
    /// Cache retention at startup: "leave" or "purge".
    pub purge_dir_at_restart: Option<String>,
    /// Remote speech service settings.
    pub speech: Option<SpeechConfig>,
    /// Playback target discovery settings.
    pub discovery: Option<DiscoveryConfig>,
}

/// Speech service configuration.
#[derive(Debug, Default, Deserialize)]
pub struct SpeechConfig {
    /// Base URL of the synthesis service (e.g. http://127.0.0.1:5002).
    pub base_url: Option<String>,
}

/// mDNS discovery configuration.
#[derive(Debug, Default, Deserialize)]
pub struct DiscoveryConfig {
    /// Service type to browse (default: _sonos._tcp.local.).
    pub service_type: Option<String>,
    /// Browse window in milliseconds (default: 3000).
    pub timeout_ms: Option<u64>,
}

/// What happens to the cache store at startup.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PurgePolicy {
    #[default]
    Leave,
    Purge,
}

impl PurgePolicy {
    /// Parse the configured value; anything unrecognised keeps the cache.
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            None | Some("") | Some("leave") => PurgePolicy::Leave,
            Some("purge") => PurgePolicy::Purge,
            Some(other) => {
                tracing::warn!(value = %other, "unknown purge_dir_at_restart; leaving cache untouched");
                PurgePolicy::Leave
            }
        }
    }
}

/// Settings for one configuration unit, with every default applied.
#[derive(Clone, Debug)]
pub struct HubSettings {
    pub bind: SocketAddr,
    pub ip_address: Option<IpAddr>,
    pub stream_host: IpAddr,
    pub stream_port: u16,
    pub storage_root: PathBuf,
    pub defaults_dir: Option<PathBuf>,
    pub purge: PurgePolicy,
    pub speech_base_url: Option<String>,
    pub discovery_service: String,
    pub discovery_timeout_ms: u64,
}

impl ServerConfig {
    /// Load configuration from disk.
    pub fn load(path: &Path) -> Result<Self> {
        let raw =
            std::fs::read_to_string(path).with_context(|| format!("read config {:?}", path))?;
        let cfg = toml::from_str::<ServerConfig>(&raw)
            .with_context(|| format!("parse config {:?}", path))?;
        Ok(cfg)
    }

    /// Apply defaults and parse addresses.
    pub fn resolve(&self) -> Result<HubSettings> {
        let bind = bind_from_config(self)?
            .unwrap_or_else(|| DEFAULT_BIND.parse().expect("default bind"));
        let ip_address = match self.ip_address.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(ip) => Some(ip.parse().with_context(|| format!("parse ip_address {ip}"))?),
        };
        let stream_host = match self.stream_host.as_deref().map(str::trim) {
            None | Some("") => IpAddr::from([0, 0, 0, 0]),
            Some(host) => host
                .parse()
                .with_context(|| format!("parse stream_host {host}"))?,
        };
        let speech_base_url = self
            .speech
            .as_ref()
            .and_then(|s| s.base_url.as_deref())
            .map(|url| url.trim().trim_end_matches('/').to_string())
            .filter(|url| !url.is_empty());
        let discovery = self.discovery.as_ref();

        Ok(HubSettings {
            bind,
            ip_address,
            stream_host,
            stream_port: normalize_stream_port(self.stream_port.unwrap_or(DEFAULT_STREAM_PORT)),
            storage_root: non_empty_path(self.storage_root.as_deref())
                .unwrap_or_else(|| PathBuf::from(DEFAULT_STORAGE_ROOT)),
            defaults_dir: non_empty_path(self.defaults_dir.as_deref())
                .or_else(locate_defaults_dir),
            purge: PurgePolicy::parse(self.purge_dir_at_restart.as_deref()),
            speech_base_url,
            discovery_service: discovery
                .and_then(|d| d.service_type.clone())
                .unwrap_or_else(|| DEFAULT_DISCOVERY_SERVICE.to_string()),
            discovery_timeout_ms: discovery
                .and_then(|d| d.timeout_ms)
                .unwrap_or(DEFAULT_DISCOVERY_TIMEOUT_MS),
        })
    }
}

/// Parse an optional bind address from config.
pub fn bind_from_config(cfg: &ServerConfig) -> Result<Option<SocketAddr>> {
    let Some(bind) = cfg.bind.as_deref() else {
        return Ok(None);
    };
    let addr = bind.parse().with_context(|| format!("parse bind {bind}"))?;
    Ok(Some(addr))
}

/// Remap the legacy port, which collides with the host runtime's own listener.
pub fn normalize_stream_port(port: u16) -> u16 {
    if port == LEGACY_STREAM_PORT {
        tracing::warn!(
            port,
            remapped = DEFAULT_STREAM_PORT,
            "stream port collides with the host runtime; using the default instead"
        );
        return DEFAULT_STREAM_PORT;
    }
    port
}

/// Find the bundled default clips: `defaults/` in the working directory or
/// next to the executable.
fn locate_defaults_dir() -> Option<PathBuf> {
    let mut candidates = Vec::new();
    if let Ok(dir) = std::env::current_dir() {
        candidates.push(dir.join(DEFAULTS_DIR));
    }
    if let Ok(exe) = std::env::current_exe() {
        if let Some(parent) = exe.parent() {
            candidates.push(parent.join(DEFAULTS_DIR));
        }
    }
    let found = candidates.iter().find(|path| path.is_dir()).cloned();
    if found.is_none() {
        tracing::warn!(candidates = ?candidates, "bundled default clips not found; stores will not be seeded");
    }
    found
}

fn non_empty_path(raw: Option<&str>) -> Option<PathBuf> {
    raw.map(str::trim)
        .filter(|s| !s.is_empty())
        .map(PathBuf::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn legacy_stream_port_is_remapped() {
        assert_eq!(normalize_stream_port(1880), 1980);
        assert_eq!(normalize_stream_port(1981), 1981);
    }

    #[test]
    fn purge_policy_defaults_to_leave() {
        assert_eq!(PurgePolicy::parse(None), PurgePolicy::Leave);
        assert_eq!(PurgePolicy::parse(Some("leave")), PurgePolicy::Leave);
        assert_eq!(PurgePolicy::parse(Some("purge")), PurgePolicy::Purge);
        assert_eq!(PurgePolicy::parse(Some("wipe")), PurgePolicy::Leave);
    }

    #[test]
    fn resolve_applies_defaults() {
        let settings = ServerConfig::default().resolve().unwrap();
        assert_eq!(settings.bind, "0.0.0.0:8080".parse().unwrap());
        assert_eq!(settings.stream_port, DEFAULT_STREAM_PORT);
        assert_eq!(settings.purge, PurgePolicy::Leave);
        assert!(settings.ip_address.is_none());
        assert!(settings.speech_base_url.is_none());
    }

    #[test]
    fn resolve_parses_toml() {
        let raw = r#"
            bind = "127.0.0.1:9000"
            ip_address = "192.168.1.20"
            stream_port = 1880
            storage_root = "/var/lib/tts"
            purge_dir_at_restart = "purge"

            [speech]
            base_url = "http://speech.local:5002/"
        "#;
        let cfg: ServerConfig = toml::from_str(raw).unwrap();
        let settings = cfg.resolve().unwrap();
        assert_eq!(settings.bind, "127.0.0.1:9000".parse().unwrap());
        assert_eq!(settings.ip_address, Some("192.168.1.20".parse().unwrap()));
        assert_eq!(settings.stream_port, 1980);
        assert_eq!(settings.storage_root, PathBuf::from("/var/lib/tts"));
        assert_eq!(settings.purge, PurgePolicy::Purge);
        assert_eq!(settings.speech_base_url.as_deref(), Some("http://speech.local:5002"));
    }

    #[actix_web::test]
    async fn stock_settings_seed_bundled_clips() {
        use crate::store::{self, StoreCategory, StoreLayout};

        let settings = ServerConfig::default().resolve().unwrap();
        let defaults = settings.defaults_dir.expect("bundled defaults located");
        let layout = StoreLayout::new(crate::test_support::temp_root("config-seed"));

        let report = store::bootstrap(&layout, Some(&defaults), settings.purge).await;

        assert!(report.seeded >= 2);
        assert!(layout.dir(StoreCategory::Permanent).join("OwnFile_Silence.mp3").exists());
        assert!(layout.dir(StoreCategory::Hailing).join("Hailing_Silence.mp3").exists());
    }

    #[test]
    fn configured_defaults_dir_wins() {
        let cfg = ServerConfig {
            defaults_dir: Some("/opt/tts/defaults".to_string()),
            ..ServerConfig::default()
        };
        assert_eq!(
            cfg.resolve().unwrap().defaults_dir,
            Some(PathBuf::from("/opt/tts/defaults"))
        );
    }

    #[test]
    fn resolve_rejects_bad_bind() {
        let cfg = ServerConfig {
            bind: Some("not-an-address".to_string()),
            ..ServerConfig::default()
        };
        assert!(cfg.resolve().is_err());
    }
}
