use crate::history::RecentPayloads;
use crate::models::Settings;
use anyhow::{Context, Result};
use camino::{Utf8Path, Utf8PathBuf};
use config::{Config, Environment, File, FileFormat};
use std::fs;

/// Prefix for environment overrides, e.g. `QRYPT__BATCH__SETTLE_MS=50`
pub const ENV_PREFIX: &str = "QRYPT";

/// Separator between prefix, section and key in environment overrides
pub const ENV_SEPARATOR: &str = "__";

/// Configuration manager for the settings file and persisted recent payloads.
///
/// Manages two files inside the configuration directory:
/// - `qrypt.yaml`: [`Settings`], optionally overridden by `QRYPT__*` variables
/// - `recent.yaml`: the [`RecentPayloads`] list
#[derive(Debug, Clone)]
pub struct ConfigManager {
    config_dir: Utf8PathBuf,
    settings_path: Utf8PathBuf,
    recent_path: Utf8PathBuf,
}

impl ConfigManager {
    /// Create a new ConfigManager with the specified configuration directory.
    ///
    /// # Arguments
    /// * `config_dir` - Directory holding configuration files; created if missing
    pub fn new<P: AsRef<Utf8Path>>(config_dir: P) -> Result<Self> {
        let config_dir = config_dir.as_ref().to_path_buf();

        if !config_dir.exists() {
            fs::create_dir_all(&config_dir)
                .with_context(|| format!("Failed to create config directory: {}", config_dir))?;
        }

        Ok(Self {
            settings_path: config_dir.join("qrypt.yaml"),
            recent_path: config_dir.join("recent.yaml"),
            config_dir,
        })
    }

    /// Load settings from `qrypt.yaml` layered under process environment overrides.
    ///
    /// A missing file is not an error; every field has a default.
    pub fn load_settings(&self) -> Result<Settings> {
        self.load_settings_layered(None)
    }

    /// Load settings with an explicit environment map instead of the process
    /// environment. Keys use the same `QRYPT__SECTION__KEY` shape.
    pub fn load_settings_with_env(
        &self,
        env: config::Map<String, String>,
    ) -> Result<Settings> {
        self.load_settings_layered(Some(env))
    }

    fn load_settings_layered(&self, env: Option<config::Map<String, String>>) -> Result<Settings> {
        if !self.settings_path.exists() {
            tracing::debug!(
                "Settings file not found at {}, using defaults",
                self.settings_path
            );
        }

        let environment = Environment::with_prefix(ENV_PREFIX)
            .prefix_separator(ENV_SEPARATOR)
            .separator(ENV_SEPARATOR)
            .try_parsing(true)
            .source(env);

        let layered = Config::builder()
            .add_source(File::new(self.settings_path.as_str(), FileFormat::Yaml).required(false))
            .add_source(environment)
            .build()
            .with_context(|| format!("Failed to read settings: {}", self.settings_path))?;

        let settings: Settings = layered
            .try_deserialize()
            .with_context(|| format!("Failed to parse settings: {}", self.settings_path))?;

        tracing::info!("Loaded settings from {}", self.settings_path);
        Ok(settings)
    }

    /// Save settings to `qrypt.yaml`.
    ///
    /// # Arguments
    /// * `settings` - The Settings to save
    pub fn save_settings(&self, settings: &Settings) -> Result<()> {
        let yaml_string =
            serde_yaml_ng::to_string(settings).context("Failed to serialize settings to YAML")?;

        fs::write(&self.settings_path, yaml_string)
            .with_context(|| format!("Failed to write settings: {}", self.settings_path))?;

        tracing::info!("Saved settings to {}", self.settings_path);
        Ok(())
    }

    /// Open the persisted recent-payload list.
    pub fn recent_payloads(&self, capacity: usize) -> RecentPayloads {
        RecentPayloads::load(&self.recent_path, capacity)
    }

    /// Get the configuration directory path.
    pub fn config_dir(&self) -> &Utf8Path {
        &self.config_dir
    }

    pub fn settings_path(&self) -> &Utf8Path {
        &self.settings_path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_test_config_manager() -> (ConfigManager, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let config_path = Utf8PathBuf::try_from(temp_dir.path().to_path_buf()).unwrap();
        let manager = ConfigManager::new(&config_path).unwrap();
        (manager, temp_dir)
    }

    #[test]
    fn test_missing_file_loads_defaults() {
        let (manager, _temp_dir) = create_test_config_manager();

        let settings = manager.load_settings_with_env(config::Map::new()).unwrap();

        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn test_load_save_settings() {
        let (manager, _temp_dir) = create_test_config_manager();

        let mut settings = Settings::default();
        settings.batch.settle_ms = 25;
        settings.preview.size = 512;
        manager.save_settings(&settings).unwrap();

        let loaded = manager.load_settings_with_env(config::Map::new()).unwrap();
        assert_eq!(loaded, settings);
    }

    #[test]
    fn test_environment_overrides_file() {
        let (manager, _temp_dir) = create_test_config_manager();
        fs::write(manager.settings_path(), "batch:\n  settle_ms: 100\n").unwrap();

        let mut env = config::Map::new();
        env.insert("QRYPT__BATCH__SETTLE_MS".to_string(), "5".to_string());
        let settings = manager.load_settings_with_env(env).unwrap();

        assert_eq!(settings.batch.settle_ms, 5);
        assert_eq!(settings.batch.archive_prefix, "qrypt");
    }
}
