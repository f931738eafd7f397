//! Per-item reader settings
//!
//! Settings are remembered per media source id and restored the next time
//! the same item is opened.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::panels::ReadingDirection;

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type SettingsResult<T> = std::result::Result<T, SettingsError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ReaderSettings {
    pub direction: ReadingDirection,
    pub pages_per_view: u8,
    pub panel_mode: bool,
}

impl Default for ReaderSettings {
    fn default() -> Self {
        Self {
            direction: ReadingDirection::Ltr,
            pages_per_view: 1,
            panel_mode: false,
        }
    }
}

impl ReaderSettings {
    /// Single page view <-> double page view
    pub fn toggle_view(&mut self) {
        self.pages_per_view = if self.pages_per_view >= 2 { 1 } else { 2 };
    }
}

/// Settings keyed by media source id, optionally persisted to a JSON file
#[derive(Debug, Default)]
pub struct SettingsStore {
    path: Option<PathBuf>,
    items: HashMap<String, ReaderSettings>,
}

impl SettingsStore {
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Load a store from `path`; a missing file starts empty
    pub async fn open(path: impl AsRef<Path>) -> SettingsResult<Self> {
        let path = path.as_ref().to_path_buf();

        let items = match tokio::fs::read(&path).await {
            Ok(data) => serde_json::from_slice(&data)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => HashMap::new(),
            Err(e) => return Err(e.into()),
        };

        tracing::debug!(path = %path.display(), items = items.len(), "Loaded reader settings");

        Ok(Self {
            path: Some(path),
            items,
        })
    }

    /// Settings for an item, defaults when never saved
    pub fn get(&self, media_source_id: &str) -> ReaderSettings {
        self.items.get(media_source_id).copied().unwrap_or_default()
    }

    pub async fn set(&mut self, media_source_id: &str, settings: ReaderSettings) -> SettingsResult<()> {
        self.items.insert(media_source_id.to_string(), settings);
        self.flush().await
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    async fn flush(&self) -> SettingsResult<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let data = serde_json::to_vec_pretty(&self.items)?;
        tokio::fs::write(path, data).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults_for_unknown_item() {
        let store = SettingsStore::in_memory();
        let settings = store.get("unknown");
        assert_eq!(settings, ReaderSettings::default());
        assert_eq!(settings.pages_per_view, 1);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let settings: ReaderSettings = serde_json::from_str(r#"{"direction":"rtl"}"#).unwrap();
        assert_eq!(settings.direction, ReadingDirection::Rtl);
        assert_eq!(settings.pages_per_view, 1);
        assert!(!settings.panel_mode);
    }

    #[test]
    fn test_toggle_view() {
        let mut settings = ReaderSettings::default();
        settings.toggle_view();
        assert_eq!(settings.pages_per_view, 2);
        settings.toggle_view();
        assert_eq!(settings.pages_per_view, 1);
    }

    #[tokio::test]
    async fn test_persists_between_opens() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings").join("comics.json");

        let mut store = SettingsStore::open(&path).await.unwrap();
        assert!(store.is_empty());

        let saved = ReaderSettings {
            direction: ReadingDirection::Rtl,
            pages_per_view: 2,
            panel_mode: true,
        };
        store.set("source-1", saved).await.unwrap();

        let reopened = SettingsStore::open(&path).await.unwrap();
        assert_eq!(reopened.len(), 1);
        assert_eq!(reopened.get("source-1"), saved);
    }

    #[tokio::test]
    async fn test_corrupt_file_is_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("comics.json");
        tokio::fs::write(&path, b"{ not json").await.unwrap();

        assert!(matches!(
            SettingsStore::open(&path).await,
            Err(SettingsError::Json(_))
        ));
    }
}
