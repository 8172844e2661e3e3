// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Jesof

//! Persistent user settings
//!
//! A flat JSON object of key/value pairs, written back atomically.

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};

use crate::error::Result;

/// Key under which the name of the last selected router is stored
pub const LAST_SELECTED_ROUTER: &str = "last_selected_router";

#[derive(Debug, Clone)]
pub struct SettingsStore {
    path: PathBuf,
    values: Map<String, Value>,
}

impl SettingsStore {
    /// Loads settings from `path`
    ///
    /// A missing or unreadable file starts an empty store.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let values = match std::fs::read_to_string(&path) {
            Ok(content) => match serde_json::from_str::<Map<String, Value>>(&content) {
                Ok(values) => values,
                Err(e) => {
                    tracing::warn!(
                        "Failed to parse settings file '{}', starting fresh: {}",
                        path.display(),
                        e
                    );
                    Map::new()
                }
            },
            Err(_) => Map::new(),
        };
        tracing::debug!("Loaded {} settings from '{}'", values.len(), path.display());
        Self { path, values }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Value stored under `key`, or `default` when absent or of another type
    pub fn get_setting<T: DeserializeOwned>(&self, key: &str, default: T) -> T {
        match self.values.get(key) {
            Some(value) => serde_json::from_value(value.clone()).unwrap_or_else(|e| {
                tracing::debug!("Setting '{}' has an unexpected type: {}", key, e);
                default
            }),
            None => default,
        }
    }

    pub fn set_setting<T: Serialize>(&mut self, key: &str, value: T) -> Result<()> {
        self.values
            .insert(key.to_string(), serde_json::to_value(value)?);
        Ok(())
    }

    pub fn remove_setting(&mut self, key: &str) -> bool {
        self.values.remove(key).is_some()
    }

    /// Writes all settings to disk through a temporary file and a rename
    pub async fn save_settings(&self) -> Result<()> {
        let json = serde_json::to_string_pretty(&self.values)?;
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, &json).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        tracing::debug!("Saved settings to '{}'", self.path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = SettingsStore::open(dir.path().join("settings.json"));
        assert_eq!(store.get_setting("theme", "light".to_string()), "light");
    }

    #[test]
    fn test_wrong_type_returns_default() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = SettingsStore::open(dir.path().join("settings.json"));
        store.set_setting("refresh", "fast").unwrap();
        assert_eq!(store.get_setting("refresh", 1000u64), 1000);
        assert_eq!(store.get_setting("refresh", String::new()), "fast");
    }

    #[test]
    fn test_malformed_file_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, "{not json").unwrap();
        let store = SettingsStore::open(&path);
        assert!(!store.get_setting("anything", false));
    }

    #[tokio::test]
    async fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");

        let mut store = SettingsStore::open(&path);
        store.set_setting(LAST_SELECTED_ROUTER, "core").unwrap();
        store.set_setting("chart_points", 120u32).unwrap();
        store.save_settings().await.unwrap();

        assert!(!path.with_extension("json.tmp").exists());
        let reloaded = SettingsStore::open(&path);
        assert_eq!(
            reloaded.get_setting(LAST_SELECTED_ROUTER, String::new()),
            "core"
        );
        assert_eq!(reloaded.get_setting("chart_points", 0u32), 120);
    }

    #[test]
    fn test_remove_setting() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = SettingsStore::open(dir.path().join("settings.json"));
        store.set_setting("k", 1).unwrap();
        assert!(store.remove_setting("k"));
        assert!(!store.remove_setting("k"));
        assert_eq!(store.get_setting("k", 0), 0);
    }
}
