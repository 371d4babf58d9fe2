//! Speech service seam: voice catalog and synthesis.
//!
//! The hub never builds synthesis requests itself; it asks a `SpeechService`
//! for audio bytes and keeps the result in the cache store.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use tts_hub_types::VoiceEntry;

use crate::store::AUDIO_EXTENSION;

/// Voice id reported with the placeholder entry when the catalog fails.
pub const FALLBACK_VOICE_ID: &str = "Ivy";

#[async_trait]
pub trait SpeechService: Send + Sync {
    /// Voices available for synthesis.
    async fn voices(&self) -> Result<Vec<VoiceEntry>>;
    /// Synthesize `text` with `voice_id` and return the encoded audio.
    async fn synthesize(&self, text: &str, voice_id: &str) -> Result<Vec<u8>>;
}

/// Speech service reached over HTTP (`GET /voices`, `POST /synthesize`).
pub struct HttpSpeechService {
    base_url: String,
    client: Client,
}

#[derive(Serialize)]
struct SynthesizeBody<'a> {
    text: &'a str,
    voice_id: &'a str,
    format: &'a str,
}

impl HttpSpeechService {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            client: Client::new(),
        }
    }
}

#[async_trait]
impl SpeechService for HttpSpeechService {
    async fn voices(&self) -> Result<Vec<VoiceEntry>> {
        let url = format!("{}/voices", self.base_url);
        let resp = self.client.get(&url).send().await.context("fetch voices")?;
        if !resp.status().is_success() {
            return Err(anyhow!("voice catalog returned {}", resp.status()));
        }
        resp.json::<Vec<VoiceEntry>>()
            .await
            .context("decode voice catalog")
    }

    async fn synthesize(&self, text: &str, voice_id: &str) -> Result<Vec<u8>> {
        let url = format!("{}/synthesize", self.base_url);
        let resp = self
            .client
            .post(&url)
            .json(&SynthesizeBody {
                text,
                voice_id,
                format: AUDIO_EXTENSION,
            })
            .send()
            .await
            .context("request synthesis")?;
        if !resp.status().is_success() {
            return Err(anyhow!("synthesis returned {}", resp.status()));
        }
        let bytes = resp.bytes().await.context("read synthesized audio")?;
        if bytes.is_empty() {
            return Err(anyhow!("synthesis returned no audio"));
        }
        Ok(bytes.to_vec())
    }
}

/// Stand-in used when no speech service is configured.
pub struct UnconfiguredSpeech;

#[async_trait]
impl SpeechService for UnconfiguredSpeech {
    async fn voices(&self) -> Result<Vec<VoiceEntry>> {
        Err(anyhow!("speech service not configured"))
    }

    async fn synthesize(&self, _text: &str, _voice_id: &str) -> Result<Vec<u8>> {
        Err(anyhow!("speech service not configured"))
    }
}

/// Pick the speech service for the configured base URL.
pub fn service_from_settings(base_url: Option<&str>) -> Arc<dyn SpeechService> {
    match base_url {
        Some(url) => Arc::new(HttpSpeechService::new(url)),
        None => {
            tracing::warn!("no speech service configured; synthesis is disabled");
            Arc::new(UnconfiguredSpeech)
        }
    }
}

/// Voice list for the admin UI; failures become one placeholder entry.
pub async fn voices_or_placeholder(service: &dyn SpeechService) -> Vec<VoiceEntry> {
    match service.voices().await {
        Ok(voices) => voices,
        Err(e) => {
            tracing::warn!(error = %e, "error getting voices");
            vec![VoiceEntry {
                name: format!(
                    "Error retrieving voices. Check the speech service settings and restart ({e})"
                ),
                id: FALLBACK_VOICE_ID.to_string(),
            }]
        }
    }
}

/// Cache file name for a phrase: stable for the same text and voice.
pub fn cache_file_name(text: &str, voice_id: &str) -> String {
    let mut hasher = DefaultHasher::new();
    voice_id.hash(&mut hasher);
    text.hash(&mut hasher);
    let voice: String = voice_id
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect();
    format!("{}_{:016x}.{}", voice, hasher.finish(), AUDIO_EXTENSION)
}

/// Synthesize into `cache_dir`, reusing an existing clip for the same phrase.
///
/// Audio is written under `spool_dir` first and renamed into the cache, so the
/// cache only ever holds complete clips. Returns the clip path and whether it
/// came from the cache.
pub async fn synthesize_to_cache(
    service: &dyn SpeechService,
    cache_dir: &Path,
    spool_dir: &Path,
    text: &str,
    voice_id: &str,
) -> Result<(PathBuf, bool)> {
    let path = cache_dir.join(cache_file_name(text, voice_id));
    if tokio::fs::try_exists(&path).await.unwrap_or(false) {
        return Ok((path, true));
    }
    let audio = service.synthesize(text, voice_id).await?;
    tokio::fs::create_dir_all(spool_dir)
        .await
        .with_context(|| format!("create spool dir {:?}", spool_dir))?;
    let partial = spool_dir.join(format!("speech-{}.part", uuid::Uuid::new_v4()));
    tokio::fs::write(&partial, &audio)
        .await
        .with_context(|| format!("write {:?}", partial))?;
    if let Err(e) = tokio::fs::rename(&partial, &path).await {
        let _ = tokio::fs::remove_file(&partial).await;
        return Err(e).with_context(|| format!("move synthesized clip into {:?}", path));
    }
    tracing::info!(path = %path.display(), voice = %voice_id, "synthesized clip cached");
    Ok((path, false))
}
