//! Per-unit context shared by every handler.
//!
//! One `AppState` exists per configuration unit; handlers receive it through
//! `web::Data` instead of reaching for globals.

use std::net::IpAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::discovery::PlaybackDiscovery;
use crate::exclusivity::ActiveClient;
use crate::speech::SpeechService;
use crate::store::{AUDIO_EXTENSION, StoreCategory, StoreLayout};
use crate::upload::UploadTarget;

const SPOOL_DIR: &str = ".uploads";

pub struct AppState {
    /// The three file stores.
    pub stores: StoreLayout,
    /// Advisory owner of the streaming server.
    pub active: ActiveClient,
    pub speech: Arc<dyn SpeechService>,
    pub discovery: Arc<dyn PlaybackDiscovery>,
    /// Address advertised in stream URLs (detected when unset).
    pub advertised_ip: Option<IpAddr>,
    pub stream_port: u16,
    stream_listening: AtomicBool,
}

impl AppState {
    pub fn new(
        stores: StoreLayout,
        speech: Arc<dyn SpeechService>,
        discovery: Arc<dyn PlaybackDiscovery>,
        advertised_ip: Option<IpAddr>,
        stream_port: u16,
    ) -> Self {
        Self {
            stores,
            active: ActiveClient::new(),
            speech,
            discovery,
            advertised_ip,
            stream_port,
            stream_listening: AtomicBool::new(false),
        }
    }

    /// Record whether the streaming listener is bound.
    pub fn set_stream_listening(&self, listening: bool) {
        self.stream_listening.store(listening, Ordering::SeqCst);
    }

    pub fn stream_listening(&self) -> bool {
        self.stream_listening.load(Ordering::SeqCst)
    }

    /// Uploads are spooled on the same filesystem as the stores so the final
    /// move is a rename.
    pub fn spool_dir(&self) -> PathBuf {
        self.stores.root().join(SPOOL_DIR)
    }

    /// Upload destination for a multipart field.
    pub fn upload_target(&self, category: StoreCategory, field: &'static str) -> UploadTarget {
        UploadTarget {
            field,
            dir: self.stores.dir(category),
            category,
            allowed_extension: AUDIO_EXTENSION,
        }
    }

    /// Host part of stream URLs handed to playback devices.
    pub fn stream_host(&self) -> String {
        self.advertised_ip
            .or_else(|| crate::net::external_ipv4().map(IpAddr::V4))
            .map(|ip| ip.to_string())
            .unwrap_or_else(|| "127.0.0.1".to_string())
    }
}
