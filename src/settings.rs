use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::constants::{
    DEFAULT_CLUSTER_THRESHOLD, DEFAULT_MAX_HISTORY_ENTRIES, DEFAULT_PORT, MAX_CLUSTERED_MARKERS,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub port: u16,
    pub cluster_threshold: f64,
    pub max_markers: usize,
    pub max_history_entries: usize,
    pub persist_history: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            cluster_threshold: DEFAULT_CLUSTER_THRESHOLD,
            max_markers: MAX_CLUSTERED_MARKERS,
            max_history_entries: DEFAULT_MAX_HISTORY_ENTRIES,
            persist_history: true,
        }
    }
}

impl Settings {
    pub fn load_from(config_path: &Path) -> Result<Self> {
        if !config_path.exists() {
            return Ok(Settings::default());
        }

        let content = std::fs::read_to_string(config_path).context("Failed to open config file")?;
        Ok(Self::parse(&content))
    }

    /// Parses `key = value` lines. Unknown keys and bad values are ignored.
    pub fn parse(content: &str) -> Self {
        let mut settings = Settings::default();
        let mut config_map = HashMap::new();

        for line in content.lines() {
            let line = line.trim();
            if line.starts_with('#') || line.is_empty() {
                continue;
            }
            if let Some((key, value)) = line.split_once('=') {
                config_map.insert(key.trim(), value.trim().trim_matches('"'));
            }
        }

        if let Some(port) = config_map.get("port").and_then(|v| v.parse::<u16>().ok()) {
            settings.port = port;
        }
        if let Some(threshold) = config_map
            .get("cluster_threshold")
            .and_then(|v| v.parse::<f64>().ok())
            .filter(|t| valid_threshold(*t))
        {
            settings.cluster_threshold = threshold;
        }
        if let Some(max_markers) = config_map.get("max_markers").and_then(|v| v.parse::<usize>().ok()) {
            settings.max_markers = max_markers;
        }
        if let Some(max_entries) = config_map
            .get("max_history_entries")
            .and_then(|v| v.parse::<usize>().ok())
            .filter(|n| valid_history_entries(*n))
        {
            settings.max_history_entries = max_entries;
        }
        if let Some(persist) = config_map.get("persist_history").and_then(|v| v.parse::<bool>().ok()) {
            settings.persist_history = persist;
        }

        settings.sanitize()
    }

    /// Rejects values that `parse` would refuse to load back.
    pub fn validate(&self) -> Result<()> {
        if !valid_threshold(self.cluster_threshold) {
            bail!("cluster_threshold must be a finite, non-negative number");
        }
        if !valid_history_entries(self.max_history_entries) {
            bail!("max_history_entries must be at least 1");
        }
        Ok(())
    }

    /// Clamps values that have a hard upper bound.
    pub fn sanitize(mut self) -> Self {
        self.max_markers = self.max_markers.min(MAX_CLUSTERED_MARKERS);
        self
    }

    /// Fields in `other` that differ from `self` and only apply after a restart.
    pub fn restart_required(&self, other: &Settings) -> Vec<&'static str> {
        let mut fields = Vec::new();
        if self.port != other.port {
            fields.push("port");
        }
        if self.persist_history != other.persist_history {
            fields.push("persist_history");
        }
        fields
    }

    pub fn to_ini(&self) -> String {
        let mut content = String::new();
        content.push_str("# SmartMap Configuration File\n");
        content.push_str(&format!("port = {}\n", self.port));
        content.push_str(&format!("cluster_threshold = {}\n", self.cluster_threshold));
        content.push_str(&format!("max_markers = {}\n", self.max_markers));
        content.push_str(&format!("max_history_entries = {}\n", self.max_history_entries));
        content.push_str(&format!("persist_history = {}\n", self.persist_history));
        content
    }

    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent).context("Creating config directory")?;
        }
        std::fs::write(config_path, self.to_ini()).context("Failed to write to config file")?;
        Ok(())
    }

    /// Marker limit actually used for clustering, never above the hard cap.
    pub fn marker_limit(&self, requested: Option<usize>) -> usize {
        requested.unwrap_or(self.max_markers).min(MAX_CLUSTERED_MARKERS)
    }

    /// `smartmap.ini` beside the binary, or at the project root for cargo builds.
    pub fn config_path() -> PathBuf {
        install_dir(std::env::current_exe().ok().as_deref()).join(CONFIG_FILE_NAME)
    }
}

const CONFIG_FILE_NAME: &str = "smartmap.ini";

fn install_dir(exe: Option<&Path>) -> PathBuf {
    let Some(dir) = exe.and_then(Path::parent) else {
        return PathBuf::from(".");
    };
    let in_cargo_target = ["debug", "release"]
        .iter()
        .any(|profile| dir.ends_with(Path::new("target").join(profile)));
    match dir.parent().and_then(Path::parent) {
        Some(root) if in_cargo_target => root.to_path_buf(),
        _ => dir.to_path_buf(),
    }
}

fn valid_threshold(threshold: f64) -> bool {
    threshold.is_finite() && threshold >= 0.0
}

fn valid_history_entries(entries: usize) -> bool {
    entries > 0
}
