use std::fs;
use std::path::{Path, PathBuf};
use validator::Validate;

use cache_refresher_types::{ConfigError, RefresherSettings};

const DATA_DIR: &str = ".cache_refresher";
const DATA_DIR_ENV: &str = "CACHE_REFRESHER_DATA_DIR";
const SETTINGS_FILE: &str = "settings.json";

/// Data directory, created on first use.
///
/// `CACHE_REFRESHER_DATA_DIR` overrides the default `~/.cache_refresher`.
pub fn get_data_dir() -> Result<PathBuf, ConfigError> {
    let data_dir = match std::env::var(DATA_DIR_ENV) {
        Ok(dir) if !dir.trim().is_empty() => PathBuf::from(dir),
        _ => dirs::home_dir()
            .ok_or_else(|| ConfigError::NotFound { path: "home directory".to_string() })?
            .join(DATA_DIR),
    };

    if !data_dir.exists() {
        fs::create_dir_all(&data_dir).map_err(|e| ConfigError::from_io_error(&e))?;
    }

    Ok(data_dir)
}

/// JSON file holding [`RefresherSettings`].
#[derive(Debug, Clone)]
pub struct SettingsStore {
    path: PathBuf,
}

impl SettingsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store at `settings.json` inside the data directory.
    pub fn open_default() -> Result<Self, ConfigError> {
        Ok(Self::new(get_data_dir()?.join(SETTINGS_FILE)))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load settings. A missing file yields defaults; missing fields are
    /// filled from defaults.
    pub fn load(&self) -> Result<RefresherSettings, ConfigError> {
        if !self.path.exists() {
            return Ok(RefresherSettings::default());
        }

        let content = fs::read_to_string(&self.path)
            .map_err(|e| ConfigError::ParseError { message: e.to_string() })?;
        let settings: RefresherSettings =
            serde_json::from_str(&content).map_err(|e| ConfigError::from_json_error(&e))?;
        settings.validate().map_err(|e| ConfigError::from_validation(&e))?;

        Ok(settings)
    }

    /// Validate and write atomically (temp file, then rename).
    pub fn save(&self, settings: &RefresherSettings) -> Result<(), ConfigError> {
        settings.validate().map_err(|e| ConfigError::from_validation(&e))?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent).map_err(|e| ConfigError::from_io_error(&e))?;
            }
        }

        let content = serde_json::to_string_pretty(settings)
            .map_err(|e| ConfigError::WriteError { message: e.to_string() })?;

        let temp_path = self.path.with_extension("json.tmp");
        fs::write(&temp_path, content).map_err(|e| ConfigError::from_io_error(&e))?;
        fs::rename(&temp_path, &self.path).map_err(|e| ConfigError::from_io_error(&e))?;

        tracing::debug!("[Settings] Saved to {}", self.path.display());
        Ok(())
    }

    /// Load, apply `updater`, save. Nothing is written if validation fails.
    pub fn update<F>(&self, updater: F) -> Result<RefresherSettings, ConfigError>
    where
        F: FnOnce(&mut RefresherSettings),
    {
        let mut settings = self.load()?;
        updater(&mut settings);
        self.save(&settings)?;
        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store() -> (SettingsStore, TempDir) {
        let dir = TempDir::new().expect("temp dir");
        (SettingsStore::new(dir.path().join(SETTINGS_FILE)), dir)
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let (store, _dir) = store();
        assert_eq!(store.load().unwrap(), RefresherSettings::default());
    }

    #[test]
    fn test_save_then_load() {
        let (store, _dir) = store();
        let settings = RefresherSettings {
            enabled: true,
            interval_ms: 60_000,
            max_attempts: 5,
            ..RefresherSettings::default()
        };

        store.save(&settings).unwrap();
        assert_eq!(store.load().unwrap(), settings);
        assert!(!store.path().with_extension("json.tmp").exists());
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let (store, _dir) = store();
        fs::write(store.path(), r#"{"enabled": true, "max_attempts": 7}"#).unwrap();

        let settings = store.load().unwrap();
        assert!(settings.enabled);
        assert_eq!(settings.max_attempts, 7);
        assert_eq!(settings.interval_ms, RefresherSettings::default().interval_ms);
        assert!(settings.show_notifications);
    }

    #[test]
    fn test_invalid_values_rejected() {
        let (store, _dir) = store();
        let bad = RefresherSettings { max_attempts: 0, ..RefresherSettings::default() };

        let err = store.save(&bad).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError { ref field, .. } if field == "max_attempts"));
        assert!(!store.path().exists());

        fs::write(store.path(), r#"{"interval_ms": 0}"#).unwrap();
        assert!(matches!(store.load(), Err(ConfigError::ValidationError { .. })));
    }

    #[test]
    fn test_corrupt_file_is_parse_error() {
        let (store, _dir) = store();
        fs::write(store.path(), "{not json").unwrap();
        assert!(matches!(store.load(), Err(ConfigError::ParseError { .. })));
    }

    #[test]
    fn test_update_persists() {
        let (store, _dir) = store();
        let updated = store.update(|s| s.enabled = true).unwrap();
        assert!(updated.enabled);
        assert!(store.load().unwrap().enabled);

        assert!(store.update(|s| s.refresh_max_tokens = 0).is_err());
        assert_eq!(store.load().unwrap().refresh_max_tokens, 1);
    }
}
