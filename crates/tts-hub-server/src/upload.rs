//! Multipart upload intake for the permanent and hailing stores.
//!
//! Accepted files are spooled next to the stores and renamed into place under
//! the category prefix. Rejections are logged and never reported back to the
//! browser.

use std::path::{Path, PathBuf};

use actix_multipart::Multipart;
use anyhow::{Context, Result, anyhow};
use futures_util::StreamExt;
use tokio::io::AsyncWriteExt;

use crate::registry::sanitize_file_name;
use crate::store::StoreCategory;

/// Where an upload field ends up.
#[derive(Clone, Debug)]
pub struct UploadTarget {
    /// Multipart field carrying the file.
    pub field: &'static str,
    /// Store directory receiving the file.
    pub dir: PathBuf,
    pub category: StoreCategory,
    /// Required extension, compared case-sensitively.
    pub allowed_extension: &'static str,
}

#[derive(Debug, PartialEq, Eq)]
pub enum UploadOutcome {
    Accepted { path: PathBuf },
    Rejected(UploadRejection),
}

#[derive(Debug, PartialEq, Eq)]
pub enum UploadRejection {
    MissingField,
    DisallowedExtension(String),
    InvalidName(String),
    Failed(String),
}

/// Read the multipart body and move the file field into `target`.
pub async fn receive(payload: Multipart, spool_dir: &Path, target: &UploadTarget) -> UploadOutcome {
    let outcome = match receive_inner(payload, spool_dir, target).await {
        Ok(outcome) => outcome,
        Err(e) => UploadOutcome::Rejected(UploadRejection::Failed(format!("{e:#}"))),
    };
    match &outcome {
        UploadOutcome::Accepted { path } => {
            tracing::info!(path = %path.display(), field = target.field, "upload stored");
        }
        UploadOutcome::Rejected(reason) => {
            tracing::warn!(reason = ?reason, field = target.field, "upload discarded");
        }
    }
    outcome
}

async fn receive_inner(
    mut payload: Multipart,
    spool_dir: &Path,
    target: &UploadTarget,
) -> Result<UploadOutcome> {
    while let Some(item) = payload.next().await {
        let mut field = item.map_err(|e| anyhow!("multipart: {e}"))?;
        let Some(disposition) = field.content_disposition() else {
            continue;
        };
        if disposition.get_name() != Some(target.field) {
            continue;
        }
        let Some(original) = disposition.get_filename().map(str::to_string) else {
            return Ok(UploadOutcome::Rejected(UploadRejection::MissingField));
        };
        if !has_extension(&original, target.allowed_extension) {
            return Ok(UploadOutcome::Rejected(UploadRejection::DisallowedExtension(original)));
        }
        let Some(name) = sanitize_file_name(&original) else {
            return Ok(UploadOutcome::Rejected(UploadRejection::InvalidName(original)));
        };
        let dest = target
            .dir
            .join(format!("{}{}", target.category.prefix(), name));

        tokio::fs::create_dir_all(spool_dir)
            .await
            .with_context(|| format!("create spool dir {:?}", spool_dir))?;
        let spool_path = spool_dir.join(format!("upload-{}.part", uuid::Uuid::new_v4()));
        let written = async {
            let mut file = tokio::fs::File::create(&spool_path)
                .await
                .with_context(|| format!("create spool file {:?}", spool_path))?;
            while let Some(chunk) = field.next().await {
                let chunk = chunk.map_err(|e| anyhow!("multipart: {e}"))?;
                file.write_all(&chunk)
                    .await
                    .with_context(|| format!("write spool file {:?}", spool_path))?;
            }
            file.flush().await?;
            anyhow::Ok(())
        };
        if let Err(e) = written.await {
            let _ = tokio::fs::remove_file(&spool_path).await;
            return Err(e);
        }

        if let Err(e) = tokio::fs::rename(&spool_path, &dest).await {
            let _ = tokio::fs::remove_file(&spool_path).await;
            return Err(e).with_context(|| format!("move upload into {:?}", dest));
        }
        return Ok(UploadOutcome::Accepted { path: dest });
    }
    Ok(UploadOutcome::Rejected(UploadRejection::MissingField))
}

/// True when `filename` ends in `.{extension}` with matching case.
pub fn has_extension(filename: &str, extension: &str) -> bool {
    Path::new(filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext == extension)
}
