use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
    sync::RwLock,
};

use crate::analysis::{ChunkingConfig, DetectionConfig};

/// Persisted analysis defaults: clinical thresholds plus an optional chunk
/// layout applied when a request does not choose one.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisSettings {
    pub detection: DetectionConfig,
    pub chunking: Option<ChunkingConfig>,
}

pub struct SettingsStore {
    path: PathBuf,
    data: RwLock<AnalysisSettings>,
}

impl SettingsStore {
    /// Load settings from `path`, or start from defaults if it doesn't exist.
    pub fn new(path: PathBuf) -> Result<Self> {
        let data = if path.exists() {
            read_settings(&path)?
        } else {
            AnalysisSettings::default()
        };

        Ok(Self {
            path,
            data: RwLock::new(data),
        })
    }

    pub fn settings(&self) -> AnalysisSettings {
        self.data
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn update(&self, settings: AnalysisSettings) -> Result<()> {
        settings
            .detection
            .validate()
            .context("Refusing to store invalid detection settings")?;

        let mut guard = self
            .data
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *guard = settings;
        self.persist(&guard)
    }

    pub fn reload(&self) -> Result<()> {
        let data = read_settings(&self.path)?;
        let mut guard = self
            .data
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *guard = data;
        Ok(())
    }

    fn persist(&self, data: &AnalysisSettings) -> Result<()> {
        let serialized = serde_json::to_string_pretty(data)?;
        fs::write(&self.path, serialized)
            .with_context(|| format!("Failed to write settings to {}", self.path.display()))
    }
}

fn read_settings(path: &Path) -> Result<AnalysisSettings> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read settings from {}", path.display()))?;
    serde_json::from_str(&contents)
        .with_context(|| format!("Malformed settings in {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let store = SettingsStore::new(dir.path().join("settings.json")).unwrap();
        assert_eq!(store.settings(), AnalysisSettings::default());
    }

    #[test]
    fn update_persists_and_reloads() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        let store = SettingsStore::new(path.clone()).unwrap();

        let mut settings = store.settings();
        settings.detection.spo2_drop_threshold = 4.0;
        settings.chunking = Some(ChunkingConfig::default());
        store.update(settings.clone()).unwrap();

        let reopened = SettingsStore::new(path).unwrap();
        assert_eq!(reopened.settings(), settings);
        reopened.reload().unwrap();
        assert_eq!(reopened.settings().detection.spo2_drop_threshold, 4.0);
    }

    #[test]
    fn invalid_update_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let store = SettingsStore::new(dir.path().join("settings.json")).unwrap();

        let mut settings = store.settings();
        settings.detection.min_event_duration_s = 0.0;
        assert!(store.update(settings).is_err());
        assert_eq!(store.settings(), AnalysisSettings::default());
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, "{ not json").unwrap();
        assert!(SettingsStore::new(path).is_err());
    }
}
