//! Startup and teardown of one configuration unit.
//!
//! A unit bootstraps its stores, then binds the control plane and the
//! streaming listener independently. A bind failure leaves the unit serving
//! in degraded mode. Closing stops both listeners, lets in-flight responses
//! finish and waits a fixed grace period. A closed unit cannot be restarted.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use actix_web::web;

use crate::config::HubSettings;
use crate::discovery::{MdnsDiscovery, PlaybackDiscovery};
use crate::listener::BoundServer;
use crate::speech::{self, SpeechService};
use crate::state::AppState;
use crate::store::{self, BootstrapReport, StoreLayout};
use crate::{control, stream_server};

/// Time left for outstanding uploads and deletes after the listeners close.
pub const CLOSE_GRACE: Duration = Duration::from_millis(500);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LifecycleState {
    Uninitialized,
    Bootstrapping,
    Serving,
    Closing,
    Closed,
}

pub struct HubUnit {
    settings: HubSettings,
    context: web::Data<AppState>,
    lifecycle: LifecycleState,
    bootstrap: Option<BootstrapReport>,
    control: Option<BoundServer>,
    stream: Option<BoundServer>,
}

impl HubUnit {
    /// Build a unit with explicit collaborators.
    pub fn new(
        settings: HubSettings,
        speech: Arc<dyn SpeechService>,
        discovery: Arc<dyn PlaybackDiscovery>,
    ) -> Self {
        let context = web::Data::new(AppState::new(
            StoreLayout::new(settings.storage_root.clone()),
            speech,
            discovery,
            settings.ip_address,
            settings.stream_port,
        ));
        Self {
            settings,
            context,
            lifecycle: LifecycleState::Uninitialized,
            bootstrap: None,
            control: None,
            stream: None,
        }
    }

    /// Build a unit with the HTTP speech service and mDNS discovery.
    pub fn from_settings(settings: HubSettings) -> Self {
        let speech = speech::service_from_settings(settings.speech_base_url.as_deref());
        let discovery = Arc::new(MdnsDiscovery::new(
            settings.discovery_service.clone(),
            Duration::from_millis(settings.discovery_timeout_ms),
        ));
        Self::new(settings, speech, discovery)
    }

    pub fn state(&self) -> LifecycleState {
        self.lifecycle
    }

    /// Shared handler context for this unit.
    pub fn context(&self) -> web::Data<AppState> {
        self.context.clone()
    }

    pub fn bootstrap_report(&self) -> Option<&BootstrapReport> {
        self.bootstrap.as_ref()
    }

    pub fn control_addr(&self) -> Option<SocketAddr> {
        self.control.as_ref().and_then(BoundServer::local_addr)
    }

    pub fn stream_addr(&self) -> Option<SocketAddr> {
        self.stream.as_ref().and_then(BoundServer::local_addr)
    }

    /// Bootstrap the stores, then bind both listeners.
    ///
    /// Must run on an actix runtime. Only the first call has any effect.
    pub async fn start(&mut self) {
        if self.lifecycle != LifecycleState::Uninitialized {
            tracing::warn!(state = ?self.lifecycle, "unit already started");
            return;
        }
        self.lifecycle = LifecycleState::Bootstrapping;
        let report = store::bootstrap(
            &self.context.stores,
            self.settings.defaults_dir.as_deref(),
            self.settings.purge,
        )
        .await;
        if !report.degraded.is_empty() {
            tracing::warn!(stores = ?report.degraded, "running with degraded stores");
        }
        tracing::info!(seeded = report.seeded, purged = report.purged, "stores bootstrapped");
        self.bootstrap = Some(report);

        self.control = match control::start(self.settings.bind, self.context.clone()) {
            Ok(server) => Some(server),
            Err(e) => {
                tracing::error!(bind = %self.settings.bind, error = %e, "control plane unavailable");
                None
            }
        };
        let stream_bind = SocketAddr::new(self.settings.stream_host, self.settings.stream_port);
        self.stream = match stream_server::start(stream_bind) {
            Ok(server) => {
                self.context.set_stream_listening(true);
                Some(server)
            }
            Err(e) => {
                tracing::error!(
                    bind = %stream_bind,
                    error = %format!("{e:#}"),
                    "error starting streaming server; continuing without it"
                );
                None
            }
        };
        self.lifecycle = LifecycleState::Serving;
    }

    /// Stop both listeners and release the unit.
    pub async fn close(&mut self) {
        match self.lifecycle {
            LifecycleState::Closing | LifecycleState::Closed => return,
            LifecycleState::Uninitialized => {
                self.lifecycle = LifecycleState::Closed;
                return;
            }
            LifecycleState::Bootstrapping | LifecycleState::Serving => {}
        }
        self.lifecycle = LifecycleState::Closing;
        if let Some(server) = self.stream.take() {
            self.context.set_stream_listening(false);
            server.stop().await;
        }
        if let Some(server) = self.control.take() {
            server.stop().await;
        }
        self.context.active.clear();
        tokio::time::sleep(CLOSE_GRACE).await;
        self.lifecycle = LifecycleState::Closed;
        tracing::info!("unit closed");
    }
}
