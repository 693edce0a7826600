use anyhow::{anyhow, Result};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tokio::sync::broadcast;

use super::events::HistoryEvent;
use crate::constants::EVENT_CHANNEL_CAPACITY;
use crate::history::HistoryStore;
use crate::settings::Settings;

// Application state shared by all handlers
#[derive(Clone)]
pub struct AppState {
    pub history: HistoryStore,
    pub settings: Arc<Mutex<Settings>>,
    pub event_sender: broadcast::Sender<HistoryEvent>,
    /// Where history is cached between runs; `None` disables persistence.
    pub cache_path: Option<PathBuf>,
    /// Where settings updates are written; `None` keeps them in memory only.
    pub settings_path: Option<PathBuf>,
}

impl AppState {
    pub fn new(settings: Settings, history: HistoryStore) -> Self {
        let (event_sender, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            history,
            settings: Arc::new(Mutex::new(settings)),
            event_sender,
            cache_path: None,
            settings_path: None,
        }
    }

    pub fn with_cache_path(mut self, path: PathBuf) -> Self {
        self.cache_path = Some(path);
        self
    }

    pub fn with_settings_path(mut self, path: PathBuf) -> Self {
        self.settings_path = Some(path);
        self
    }

    pub fn settings(&self) -> Result<Settings> {
        self.settings
            .lock()
            .map(|s| s.clone())
            .map_err(|_| anyhow!("Settings lock poisoned"))
    }

    /// Writes the history cache if persistence is configured.
    pub fn persist_history(&self) {
        let Some(path) = &self.cache_path else {
            return;
        };
        if let Err(e) = self.history.save_to_disk(path) {
            tracing::warn!(error = %e, "failed to save history cache");
        }
    }

    pub fn publish(&self, event: HistoryEvent) {
        // No subscribers is fine
        let _ = self.event_sender.send(event);
    }
}
