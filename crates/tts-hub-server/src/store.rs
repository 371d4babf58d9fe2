//! On-disk file stores and their bootstrap policy.
//!
//! Three stores live under the storage root: a purgeable cache, user clips
//! (`OwnFile_` prefix) and hailing alert clips (`Hailing_` prefix). The two
//! permanent stores are seeded from bundled defaults without ever overwriting
//! an existing file.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tts_hub_types::StoredFileEntry;

use crate::config::PurgePolicy;

/// Extension accepted for uploads and stripped from display names.
pub const AUDIO_EXTENSION: &str = "mp3";

/// Which store a file belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StoreCategory {
    Cache,
    Permanent,
    Hailing,
}

impl StoreCategory {
    pub const ALL: [StoreCategory; 3] = [
        StoreCategory::Cache,
        StoreCategory::Permanent,
        StoreCategory::Hailing,
    ];

    /// Directory name under the storage root.
    pub fn dir_name(self) -> &'static str {
        match self {
            StoreCategory::Cache => "ttsfiles",
            StoreCategory::Permanent => "ttspermanentfiles",
            StoreCategory::Hailing => "hailingpermanentfiles",
        }
    }

    /// Filename prefix carried by every file of this category.
    pub fn prefix(self) -> &'static str {
        match self {
            StoreCategory::Cache => "",
            StoreCategory::Permanent => "OwnFile_",
            StoreCategory::Hailing => "Hailing_",
        }
    }

    /// Retention rules for this store.
    pub fn policy(self, root: &Path, purge: PurgePolicy) -> DirectoryPolicy {
        let path = root.join(self.dir_name());
        match self {
            StoreCategory::Cache => DirectoryPolicy {
                path,
                purge_on_restart: purge == PurgePolicy::Purge,
                seed_from_defaults: false,
            },
            StoreCategory::Permanent | StoreCategory::Hailing => DirectoryPolicy {
                path,
                purge_on_restart: false,
                seed_from_defaults: true,
            },
        }
    }
}

/// Retention rules for one store directory.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DirectoryPolicy {
    pub path: PathBuf,
    pub purge_on_restart: bool,
    pub seed_from_defaults: bool,
}

/// A file found in a store. `display_name` is recomputed on every listing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StoredFile {
    pub display_name: String,
    pub storage_filename: String,
    pub category: StoreCategory,
}

impl From<StoredFile> for StoredFileEntry {
    fn from(file: StoredFile) -> Self {
        StoredFileEntry {
            name: file.display_name,
            filename: file.storage_filename,
        }
    }
}

/// Paths of the three stores under one storage root.
#[derive(Clone, Debug)]
pub struct StoreLayout {
    root: PathBuf,
}

impl StoreLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        self.root.as_path()
    }

    /// Directory of a store.
    pub fn dir(&self, category: StoreCategory) -> PathBuf {
        self.root.join(category.dir_name())
    }
}

/// Outcome of a bootstrap pass, for logging and tests.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BootstrapReport {
    pub root_ready: bool,
    /// Stores that could not be created and behave as always-empty.
    pub degraded: Vec<StoreCategory>,
    pub seeded: usize,
    pub purged: usize,
}

/// Create `dir` if missing; returns whether it is usable afterwards.
pub async fn ensure(dir: &Path) -> bool {
    match tokio::fs::metadata(dir).await {
        Ok(meta) if meta.is_dir() => return true,
        Ok(_) => {
            tracing::error!(path = %dir.display(), "store path exists but is not a directory");
            return false;
        }
        Err(_) => {}
    }
    match tokio::fs::create_dir_all(dir).await {
        Ok(()) => true,
        Err(e) => {
            tracing::error!(path = %dir.display(), error = %e, "unable to create store directory");
            false
        }
    }
}

/// Copy every default file into `target`, skipping names that already exist.
///
/// Returns the number of files copied. Per-file failures are skipped.
pub async fn seed(defaults_dir: &Path, target: &Path) -> usize {
    let mut entries = match tokio::fs::read_dir(defaults_dir).await {
        Ok(entries) => entries,
        Err(e) => {
            tracing::warn!(path = %defaults_dir.display(), error = %e, "defaults not readable; skipping seed");
            return 0;
        }
    };
    let mut copied = 0;
    loop {
        let entry = match entries.next_entry().await {
            Ok(Some(entry)) => entry,
            Ok(None) => break,
            Err(e) => {
                tracing::warn!(path = %defaults_dir.display(), error = %e, "defaults enumeration stopped");
                break;
            }
        };
        let is_file = entry.file_type().await.map(|t| t.is_file()).unwrap_or(false);
        if !is_file {
            continue;
        }
        let dest = target.join(entry.file_name());
        match copy_if_absent(&entry.path(), &dest).await {
            Ok(true) => copied += 1,
            Ok(false) => {}
            Err(e) => {
                tracing::debug!(path = %dest.display(), error = %e, "seed copy skipped");
            }
        }
    }
    copied
}

async fn copy_if_absent(src: &Path, dest: &Path) -> Result<bool> {
    let mut out = match tokio::fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(dest)
        .await
    {
        Ok(file) => file,
        Err(e) if e.kind() == ErrorKind::AlreadyExists => return Ok(false),
        Err(e) => return Err(e).with_context(|| format!("create {:?}", dest)),
    };
    let copy = async {
        let mut input = tokio::fs::File::open(src)
            .await
            .with_context(|| format!("open {:?}", src))?;
        tokio::io::copy(&mut input, &mut out)
            .await
            .with_context(|| format!("copy {:?} -> {:?}", src, dest))?;
        anyhow::Ok(())
    };
    if let Err(e) = copy.await {
        // Only the file created above is removed; a user file is never touched.
        let _ = tokio::fs::remove_file(dest).await;
        return Err(e);
    }
    Ok(true)
}

/// Delete every entry in `dir`. Returns how many entries were removed.
pub async fn purge(dir: &Path) -> usize {
    let mut entries = match tokio::fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) => {
            tracing::warn!(path = %dir.display(), error = %e, "purge: directory not readable");
            return 0;
        }
    };
    let mut removed = 0;
    loop {
        let entry = match entries.next_entry().await {
            Ok(Some(entry)) => entry,
            Ok(None) => break,
            Err(e) => {
                tracing::warn!(path = %dir.display(), error = %e, "purge: enumeration stopped");
                break;
            }
        };
        let path = entry.path();
        let is_dir = entry.file_type().await.map(|t| t.is_dir()).unwrap_or(false);
        let result = if is_dir {
            tokio::fs::remove_dir_all(&path).await
        } else {
            tokio::fs::remove_file(&path).await
        };
        match result {
            Ok(()) => {
                tracing::info!(path = %path.display(), "deleted cached tts file");
                removed += 1;
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "purge: delete failed");
            }
        }
    }
    removed
}

/// Create, seed and purge the stores in dependency order.
///
/// Seeding runs before the purge so seeded defaults are never purged.
pub async fn bootstrap(
    layout: &StoreLayout,
    defaults_dir: Option<&Path>,
    purge_policy: PurgePolicy,
) -> BootstrapReport {
    let mut report = BootstrapReport {
        root_ready: ensure(layout.root()).await,
        ..BootstrapReport::default()
    };
    if !report.root_ready {
        tracing::error!(path = %layout.root().display(), "unable to set up storage root");
    }

    let mut cache_policy = None;
    for category in StoreCategory::ALL {
        let policy = category.policy(layout.root(), purge_policy);
        if !ensure(&policy.path).await {
            report.degraded.push(category);
            continue;
        }
        tracing::info!(store = ?category, path = %policy.path.display(), "store ready");
        if policy.seed_from_defaults {
            if let Some(defaults) = defaults_dir {
                report.seeded += seed(&defaults.join(category.dir_name()), &policy.path).await;
            }
        }
        if policy.purge_on_restart {
            cache_policy = Some(policy);
        }
    }

    if let Some(policy) = cache_policy {
        report.purged = purge(&policy.path).await;
    }
    report
}
