use anyhow::{anyhow, bail, Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;
use std::sync::{Arc, Mutex, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::constants::HISTORY_CACHE_VERSION;
use crate::marker::{Marker, MarkerCategory};
use crate::placement::position_for_index;

// One visited location
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub id: String,
    pub location: String,
    pub description: String,
    pub visited_at: DateTime<Utc>,
    #[serde(default)]
    pub thumbnail: Option<String>,
}

impl HistoryEntry {
    /// Marker for this entry when it is the `index`-th most recent visit.
    pub fn to_marker(&self, index: usize) -> Marker {
        let marker = Marker::new(
            self.id.clone(),
            self.location.clone(),
            MarkerCategory::History,
            position_for_index(index),
        )
        .with_description(self.description.clone());

        match &self.thumbnail {
            Some(thumbnail) => marker.with_thumbnail(thumbnail.clone()),
            None => marker,
        }
    }
}

// Structure for disk persistence
#[derive(Serialize, Deserialize)]
struct CachedHistory {
    version: u32,
    next_id: u64,
    entries: Vec<HistoryEntry>,
}

struct HistoryLog {
    entries: VecDeque<HistoryEntry>,
    next_id: u64,
    capacity: usize,
}

/// Visit history shared between request handlers.
///
/// Entries are kept newest first and bounded by `capacity`; the oldest visit
/// is dropped once the bound is hit.
#[derive(Clone)]
pub struct HistoryStore {
    log: Arc<RwLock<HistoryLog>>,
    // Held for the whole write + rename of the cache file
    save_lock: Arc<Mutex<()>>,
}

impl HistoryStore {
    pub fn new(capacity: usize) -> Self {
        HistoryStore {
            log: Arc::new(RwLock::new(HistoryLog {
                entries: VecDeque::new(),
                next_id: 1,
                capacity: capacity.max(1),
            })),
            save_lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn record(
        &self,
        location: &str,
        description: &str,
        thumbnail: Option<String>,
    ) -> Result<HistoryEntry> {
        let location = location.trim();
        if location.is_empty() {
            bail!("Location name must not be empty");
        }

        let mut log = self.write()?;
        let entry = HistoryEntry {
            id: format!("h-{}", log.next_id),
            location: location.to_string(),
            description: description.trim().to_string(),
            visited_at: Utc::now(),
            thumbnail,
        };
        log.next_id += 1;

        let capacity = log.capacity;
        log.entries.push_front(entry.clone());
        log.entries.truncate(capacity);
        Ok(entry)
    }

    /// All entries, newest first.
    pub fn entries(&self) -> Result<Vec<HistoryEntry>> {
        Ok(self.read()?.entries.iter().cloned().collect())
    }

    /// Markers for the `limit` most recent visits, newest first.
    pub fn recent_markers(&self, limit: usize) -> Result<Vec<Marker>> {
        let log = self.read()?;
        Ok(log
            .entries
            .iter()
            .take(limit)
            .enumerate()
            .map(|(index, entry)| entry.to_marker(index))
            .collect())
    }

    pub fn clear(&self) -> Result<usize> {
        let mut log = self.write()?;
        let removed = log.entries.len();
        log.entries.clear();
        Ok(removed)
    }

    pub fn len(&self) -> Result<usize> {
        Ok(self.read()?.entries.len())
    }

    pub fn capacity(&self) -> Result<usize> {
        Ok(self.read()?.capacity)
    }

    /// Changes the bound on the live store, dropping the oldest overflow.
    /// Returns how many entries were dropped.
    pub fn set_capacity(&self, capacity: usize) -> Result<usize> {
        let mut log = self.write()?;
        log.capacity = capacity.max(1);
        let before = log.entries.len();
        let capacity = log.capacity;
        log.entries.truncate(capacity);
        Ok(before - log.entries.len())
    }

    /// Save the current history to disk using bincode.
    ///
    /// Writes a `.tmp` sibling and renames it over `path`, so readers only
    /// ever see a complete cache.
    pub fn save_to_disk(&self, path: &Path) -> Result<()> {
        let _guard = self
            .save_lock
            .lock()
            .map_err(|_| anyhow!("History save lock poisoned"))?;

        let cache = {
            let log = self.read()?;
            CachedHistory {
                version: HISTORY_CACHE_VERSION,
                next_id: log.next_id,
                entries: log.entries.iter().cloned().collect(),
            }
        };

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Creating cache directory {}", parent.display()))?;
        }

        let tmp = path.with_extension("bin.tmp");
        let file = std::fs::File::create(&tmp)
            .with_context(|| format!("Creating history cache {}", tmp.display()))?;
        let mut writer = BufWriter::new(file);
        bincode::serialize_into(&mut writer, &cache).context("Failed to serialize history cache")?;
        writer.flush().context("Failed to flush history cache")?;
        drop(writer);
        std::fs::rename(&tmp, path)
            .with_context(|| format!("Replacing history cache {}", path.display()))?;

        tracing::debug!(path = %path.display(), entries = cache.entries.len(), "history cache saved");
        Ok(())
    }

    /// Load history from disk. Returns `Ok(false)` when there is nothing usable.
    pub fn load_from_disk(&self, path: &Path) -> Result<bool> {
        if !path.exists() {
            return Ok(false);
        }

        let file = std::fs::File::open(path)
            .with_context(|| format!("Opening history cache {}", path.display()))?;
        let cache: CachedHistory = match bincode::deserialize_from(BufReader::new(file)) {
            Ok(c) => c,
            Err(e) => {
                tracing::warn!(error = %e, path = %path.display(), "history cache corrupted, deleting");
                let _ = std::fs::remove_file(path);
                return Ok(false);
            }
        };

        if cache.version != HISTORY_CACHE_VERSION {
            tracing::warn!(
                found = cache.version,
                expected = HISTORY_CACHE_VERSION,
                "history cache version mismatch, deleting"
            );
            let _ = std::fs::remove_file(path);
            return Ok(false);
        }

        let mut log = self.write()?;
        let capacity = log.capacity;
        log.entries = cache.entries.into_iter().take(capacity).collect();
        log.next_id = log.next_id.max(cache.next_id);
        tracing::info!(entries = log.entries.len(), "history restored from cache");
        Ok(true)
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, HistoryLog>> {
        self.log.read().map_err(|_| anyhow!("History lock poisoned"))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, HistoryLog>> {
        self.log.write().map_err(|_| anyhow!("History lock poisoned"))
    }
}
