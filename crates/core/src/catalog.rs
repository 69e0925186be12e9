//! Library catalog: which tracks exist under each storage folder.
//!
//! A catalog is built completely (snapshot first, live listing for the
//! gaps) and only then published through [`CatalogHandle`], which swaps the
//! whole mapping atomically.

use crate::models::Track;
use crate::moods::all_folders;
use arc_swap::ArcSwap;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use storage::{ObjectStore, StorageError};
use thiserror::Error;
use tracing::{debug, info, warn};

pub const TRACK_EXTENSION: &str = ".mp3";

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("catalog unavailable: listing folder {folder} failed: {source}")]
    Unavailable {
        folder: String,
        #[source]
        source: StorageError,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CatalogSource {
    /// Every folder came from the snapshot.
    Cached,
    /// At least one folder was listed live.
    Live,
}

#[derive(Debug, Clone)]
pub struct Catalog {
    folders: BTreeMap<String, Vec<Track>>,
    source: CatalogSource,
    built_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FolderSummary {
    pub name: String,
    pub tracks: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogStats {
    pub total_tracks: usize,
    pub folder_count: usize,
    pub empty_folders: Vec<String>,
    pub source: CatalogSource,
    pub built_at: DateTime<Utc>,
}

impl Catalog {
    pub fn new(folders: BTreeMap<String, Vec<Track>>, source: CatalogSource) -> Self {
        Self {
            folders,
            source,
            built_at: Utc::now(),
        }
    }

    /// Catalog that knows no folders. Used before the first build completes.
    pub fn empty() -> Self {
        Self::new(BTreeMap::new(), CatalogSource::Cached)
    }

    /// `None` means the folder is unknown; `Some(&[])` means verified empty.
    pub fn tracks(&self, folder: &str) -> Option<&[Track]> {
        self.folders.get(folder).map(Vec::as_slice)
    }

    pub fn total_tracks(&self) -> usize {
        self.folders.values().map(Vec::len).sum()
    }

    pub fn source(&self) -> CatalogSource {
        self.source
    }

    pub fn built_at(&self) -> DateTime<Utc> {
        self.built_at
    }

    pub fn folders(&self) -> Vec<FolderSummary> {
        self.folders
            .iter()
            .map(|(name, tracks)| FolderSummary {
                name: name.clone(),
                tracks: tracks.len(),
            })
            .collect()
    }

    pub fn stats(&self) -> CatalogStats {
        CatalogStats {
            total_tracks: self.total_tracks(),
            folder_count: self.folders.len(),
            empty_folders: self
                .folders
                .iter()
                .filter(|(_, t)| t.is_empty())
                .map(|(f, _)| f.clone())
                .collect(),
            source: self.source,
            built_at: self.built_at,
        }
    }
}

/// Shared, atomically replaceable catalog. Readers never take a lock.
#[derive(Clone)]
pub struct CatalogHandle {
    inner: Arc<ArcSwap<Catalog>>,
}

impl CatalogHandle {
    pub fn new(catalog: Catalog) -> Self {
        Self {
            inner: Arc::new(ArcSwap::from_pointee(catalog)),
        }
    }

    pub fn current(&self) -> Arc<Catalog> {
        self.inner.load_full()
    }

    /// Publishes `catalog` and returns the one it replaced.
    pub fn replace(&self, catalog: Catalog) -> Arc<Catalog> {
        self.inner.swap(Arc::new(catalog))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotEntry {
    /// Informational; the track name is always taken from `full_path`.
    #[serde(default)]
    pub filename: String,
    pub full_path: String,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SnapshotDoc {
    Grouped(BTreeMap<String, Vec<SnapshotEntry>>),
    /// Flat list of object keys, as written by the file-list tool.
    Flat(Vec<String>),
}

/// Persisted folder → tracks mapping produced outside this crate.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    folders: BTreeMap<String, Vec<Track>>,
}

impl Snapshot {
    pub fn parse(raw: &str) -> Result<Self, serde_json::Error> {
        let doc: SnapshotDoc = serde_json::from_str(raw)?;
        let mut folders: BTreeMap<String, Vec<Track>> = BTreeMap::new();
        match doc {
            SnapshotDoc::Grouped(map) => {
                for (folder, entries) in map {
                    let prefix = format!("{folder}/");
                    let mut tracks = Vec::with_capacity(entries.len());
                    for entry in entries {
                        if !entry.full_path.starts_with(&prefix) {
                            warn!(folder = %folder, path = %entry.full_path, "snapshot entry outside its folder, skipped");
                            continue;
                        }
                        if !is_track_key(&entry.full_path) {
                            debug!(path = %entry.full_path, "snapshot entry is not a track, skipped");
                            continue;
                        }
                        match Track::from_key(&entry.full_path) {
                            Some(track) => tracks.push(track),
                            None => warn!(path = %entry.full_path, "snapshot entry has no filename, skipped"),
                        }
                    }
                    folders.insert(folder, tracks);
                }
            }
            SnapshotDoc::Flat(keys) => {
                for key in keys.iter().filter(|k| is_track_key(k)) {
                    if let Some(track) = Track::from_key(key) {
                        folders.entry(track.folder.clone()).or_default().push(track);
                    }
                }
            }
        }
        Ok(Self { folders })
    }

    /// A missing or unreadable snapshot is reported as `None`.
    pub async fn load(path: &Path) -> Option<Self> {
        let raw = match tokio::fs::read_to_string(path).await {
            Ok(raw) => raw,
            Err(e) => {
                debug!(path = %path.display(), error = %e, "no catalog snapshot");
                return None;
            }
        };
        match Self::parse(&raw) {
            Ok(snapshot) => {
                info!(
                    path = %path.display(),
                    folders = snapshot.folders.len(),
                    "loaded catalog snapshot"
                );
                Some(snapshot)
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "ignoring malformed catalog snapshot");
                None
            }
        }
    }

    pub fn folder(&self, name: &str) -> Option<&[Track]> {
        self.folders.get(name).map(Vec::as_slice)
    }
}

#[derive(Debug, Clone)]
pub struct CatalogBuilder {
    folders: Vec<String>,
    snapshot_path: Option<PathBuf>,
}

impl CatalogBuilder {
    pub fn new<I, S>(folders: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            folders: folders.into_iter().map(Into::into).collect(),
            snapshot_path: None,
        }
    }

    /// Builder for every folder named by the mood table.
    pub fn for_mood_table() -> Self {
        Self::new(all_folders())
    }

    pub fn with_snapshot(mut self, path: impl Into<PathBuf>) -> Self {
        self.snapshot_path = Some(path.into());
        self
    }

    /// Snapshot first; every required folder it lacks is listed live.
    pub async fn build(&self, store: &dyn ObjectStore) -> Result<Catalog, CatalogError> {
        let snapshot = match &self.snapshot_path {
            Some(path) => Snapshot::load(path).await,
            None => None,
        };
        self.assemble(snapshot, store).await
    }

    /// Ignores the snapshot and lists every required folder.
    pub async fn build_live(&self, store: &dyn ObjectStore) -> Result<Catalog, CatalogError> {
        self.assemble(None, store).await
    }

    async fn assemble(
        &self,
        snapshot: Option<Snapshot>,
        store: &dyn ObjectStore,
    ) -> Result<Catalog, CatalogError> {
        let mut folders = snapshot.map(|s| s.folders).unwrap_or_default();
        let mut live = 0usize;
        for folder in &self.folders {
            if folders.contains_key(folder) {
                continue;
            }
            let tracks = list_folder(store, folder).await?;
            if tracks.is_empty() {
                warn!(folder = %folder, "folder has no tracks");
            }
            folders.insert(folder.clone(), tracks);
            live += 1;
        }
        let source = if live == 0 {
            CatalogSource::Cached
        } else {
            CatalogSource::Live
        };
        let catalog = Catalog::new(folders, source);
        info!(
            folders = catalog.folders.len(),
            listed_live = live,
            tracks = catalog.total_tracks(),
            source = ?source,
            "catalog built"
        );
        Ok(catalog)
    }
}

fn is_track_key(key: &str) -> bool {
    key.to_lowercase().ends_with(TRACK_EXTENSION)
}

async fn list_folder(store: &dyn ObjectStore, folder: &str) -> Result<Vec<Track>, CatalogError> {
    let keys = store
        .list(&format!("{folder}/"))
        .await
        .map_err(|source| CatalogError::Unavailable {
            folder: folder.to_string(),
            source,
        })?;
    Ok(keys
        .iter()
        .filter(|k| is_track_key(k))
        .filter_map(|k| Track::from_key(k))
        .filter(|t| t.folder == folder)
        .collect())
}
