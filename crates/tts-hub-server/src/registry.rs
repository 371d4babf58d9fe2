//! Listing and deletion of stored clips.
//!
//! Every operation is best-effort: a missing or unreadable store lists as
//! empty and delete failures are logged, never returned.

use std::path::{Component, Path};

use crate::store::{StoreCategory, StoredFile};

/// Sentinel file name that asks for every prefixed file to be deleted.
pub const DELETE_ALL_SENTINEL: &str = "DELETEallFiles";

/// List regular files in `dir` whose name contains `category`'s prefix.
///
/// Display names drop the prefix and `suffix_to_strip`. Sorted by file name.
pub async fn list(dir: &Path, category: StoreCategory, suffix_to_strip: &str) -> Vec<StoredFile> {
    let prefix = category.prefix();
    let mut entries = match tokio::fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) => {
            tracing::warn!(path = %dir.display(), error = %e, "store not readable; listing as empty");
            return Vec::new();
        }
    };
    let mut files = Vec::new();
    loop {
        let entry = match entries.next_entry().await {
            Ok(Some(entry)) => entry,
            Ok(None) => break,
            Err(e) => {
                tracing::warn!(path = %dir.display(), error = %e, "store enumeration stopped");
                break;
            }
        };
        let Ok(name) = entry.file_name().into_string() else {
            continue;
        };
        if !name.contains(prefix) {
            continue;
        }
        // Subdirectories and special files are never stored clips.
        if !entry.file_type().await.is_ok_and(|t| t.is_file()) {
            continue;
        }
        files.push(StoredFile {
            display_name: display_name(&name, prefix, suffix_to_strip),
            storage_filename: name,
            category,
        });
    }
    files.sort_by(|a, b| a.storage_filename.cmp(&b.storage_filename));
    files
}

/// Strip the first occurrence of `prefix` and of `suffix` from `filename`.
pub fn display_name(filename: &str, prefix: &str, suffix: &str) -> String {
    let name = if prefix.is_empty() {
        filename.to_string()
    } else {
        filename.replacen(prefix, "", 1)
    };
    if suffix.is_empty() {
        name
    } else {
        name.replacen(suffix, "", 1)
    }
}

/// Reduce a client supplied file name to a bare file name inside the store.
pub fn sanitize_file_name(raw: &str) -> Option<&str> {
    let mut components = Path::new(raw).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(name)), None) => name.to_str(),
        _ => None,
    }
}

/// Delete exactly `filename` from `dir`. Failures are logged and swallowed.
pub async fn delete_one(dir: &Path, filename: &str) {
    let Some(name) = sanitize_file_name(filename) else {
        tracing::warn!(file = %filename, "delete ignored: not a plain file name");
        return;
    };
    let path = dir.join(name);
    match tokio::fs::remove_file(&path).await {
        Ok(()) => tracing::info!(path = %path.display(), "deleted file"),
        Err(e) => tracing::warn!(path = %path.display(), error = %e, "delete failed"),
    }
}

/// Delete every file in `dir` whose name contains `category`'s prefix.
///
/// Each deletion is independent. Returns how many files were removed.
pub async fn delete_all(dir: &Path, category: StoreCategory) -> usize {
    let files = list(dir, category, "").await;
    let mut removed = 0;
    for file in files {
        let path = dir.join(&file.storage_filename);
        match tokio::fs::remove_file(&path).await {
            Ok(()) => {
                tracing::warn!(path = %path.display(), "deleted file");
                removed += 1;
            }
            Err(e) => tracing::warn!(path = %path.display(), error = %e, "delete failed"),
        }
    }
    removed
}
