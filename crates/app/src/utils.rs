//! Utility functions for the Miro app.
//!
//! Settings persistence, storage and locale locations, and model setup.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use companion::Companion;
use providers::{GeminiClient, GenerateRequest, TextModel};
use services::i18n::default_locales_dir;
use services::{FileStore, MemoryStore, Storage};
use shared::settings::AppSettings;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

fn project_dirs() -> Option<directories::ProjectDirs> {
    directories::ProjectDirs::from("com.local", "Miro", "Miro")
}

/// `RUST_LOG` wins; otherwise `info`.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

pub fn config_path() -> Option<PathBuf> {
    project_dirs().map(|proj| proj.config_dir().join("settings.json"))
}

pub fn load_settings_or_default() -> AppSettings {
    let Some(path) = config_path() else {
        return AppSettings::default();
    };
    match std::fs::read(&path) {
        Ok(bytes) => match serde_json::from_slice::<AppSettings>(&bytes) {
            Ok(settings) => settings,
            Err(e) => {
                warn!("ignoring invalid settings at {}: {}", path.display(), e);
                AppSettings::default()
            }
        },
        Err(_) => AppSettings::default(),
    }
}

pub fn save_settings(settings: &AppSettings) {
    if let Some(path) = config_path() {
        if let Some(parent) = path.parent() {
            let _ = std::fs::create_dir_all(parent);
        }
        match serde_json::to_string_pretty(settings) {
            Ok(json) => {
                if let Err(e) = std::fs::write(&path, json) {
                    error!("failed to save settings: {}", e);
                }
            }
            Err(e) => error!("failed to serialize settings: {}", e),
        }
    }
}

/// `MIRO_DATA_DIR`, then the settings override, then the platform data dir.
pub fn storage_dir(settings: &AppSettings) -> Option<PathBuf> {
    if let Ok(dir) = std::env::var("MIRO_DATA_DIR") {
        if !dir.trim().is_empty() {
            return Some(PathBuf::from(dir));
        }
    }
    if let Some(dir) = settings.data_dir.as_ref().filter(|d| !d.trim().is_empty()) {
        return Some(PathBuf::from(dir));
    }
    project_dirs().map(|proj| proj.data_dir().join("storage"))
}

/// Open the on-disk store, or keep state in memory for this run if that fails.
pub fn open_storage(settings: &AppSettings) -> Arc<Storage> {
    let Some(dir) = storage_dir(settings) else {
        warn!("no data directory available; state will not survive a restart");
        return Storage::new(MemoryStore::new());
    };
    match FileStore::open(dir.clone()) {
        Ok(store) => {
            info!(dir = %dir.display(), "opened storage");
            Storage::new(store)
        }
        Err(e) => {
            error!("failed to open storage at {}: {}", dir.display(), e);
            Storage::new(MemoryStore::new())
        }
    }
}

/// `MIRO_LOCALES_DIR`, then the settings override, then the shipped files.
pub fn locales_dir(settings: &AppSettings) -> PathBuf {
    if let Ok(dir) = std::env::var("MIRO_LOCALES_DIR") {
        if !dir.trim().is_empty() {
            return PathBuf::from(dir);
        }
    }
    settings
        .locales_dir
        .as_ref()
        .filter(|d| !d.trim().is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(default_locales_dir)
}

/// Stands in for the model when no credentials are configured, so every
/// request falls through to the companion's fallbacks.
struct UnconfiguredModel {
    reason: String,
}

#[async_trait]
impl TextModel for UnconfiguredModel {
    async fn generate(&self, _request: GenerateRequest) -> Result<String> {
        Err(anyhow!("{}", self.reason))
    }
}

/// The companion plus, if the model could not be set up, the reason why.
pub fn build_companion(settings: &AppSettings) -> (Companion, Option<String>) {
    match GeminiClient::from_auth(&settings.model.gemini_model, &settings.model.gemini_auth) {
        Ok(client) => {
            info!(model = client.model(), "using Gemini");
            (Companion::new(Arc::new(client)), None)
        }
        Err(e) => {
            let reason = e.to_string();
            error!("AI features unavailable: {}", reason);
            let model = UnconfiguredModel {
                reason: reason.clone(),
            };
            (Companion::new(Arc::new(model)), Some(reason))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settings_dirs_override() {
        let settings = AppSettings {
            data_dir: Some("/tmp/miro-data".into()),
            locales_dir: Some("/tmp/miro-locales".into()),
            ..Default::default()
        };
        if std::env::var("MIRO_DATA_DIR").is_err() {
            assert_eq!(storage_dir(&settings), Some(PathBuf::from("/tmp/miro-data")));
        }
        if std::env::var("MIRO_LOCALES_DIR").is_err() {
            assert_eq!(locales_dir(&settings), PathBuf::from("/tmp/miro-locales"));
        }
    }

    #[tokio::test]
    async fn test_unconfigured_model_errors() {
        let model = UnconfiguredModel {
            reason: "No Gemini authentication configured".into(),
        };
        let err = model.generate(GenerateRequest::prompt("hi")).await.unwrap_err();
        assert!(err.to_string().contains("No Gemini"));
    }
}
