//! TTS clip store and streaming hub.
//!
//! Keeps synthesized and uploaded audio clips in three on-disk stores and
//! streams them to playback devices over a dedicated HTTP listener.

pub mod api;
pub mod config;
pub mod control;
pub mod discovery;
pub mod exclusivity;
pub mod lifecycle;
pub mod listener;
pub mod net;
pub mod openapi;
pub mod registry;
pub mod speech;
pub mod startup;
pub mod state;
pub mod store;
pub mod stream_server;
pub mod upload;

#[cfg(test)]
pub(crate) mod test_support;
