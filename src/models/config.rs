use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::history::recent::RECENT_CAPACITY;
use crate::history::{DEBOUNCE_WINDOW, MAX_HISTORY};
use crate::services::engine::{ErrorCorrection, ImageFormat};

/// Application settings from `qrypt.yaml`
///
/// Every section and field falls back to its default, so partial files load.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub preview: PreviewSettings,
    pub export: ExportSettings,
    pub history: HistorySettings,
    pub batch: BatchSettings,
    pub recent: RecentSettings,
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreviewSettings {
    /// Edge length of the live preview in pixels
    pub size: u32,
}

impl Default for PreviewSettings {
    fn default() -> Self {
        Self { size: 300 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportSettings {
    /// Logo margin applied while exporting at full resolution
    pub logo_margin: u32,
    pub error_correction: ErrorCorrection,
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            logo_margin: 20,
            error_correction: ErrorCorrection::Q,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistorySettings {
    pub debounce_ms: u64,
    pub max_entries: usize,
}

impl Default for HistorySettings {
    fn default() -> Self {
        Self {
            debounce_ms: DEBOUNCE_WINDOW.as_millis() as u64,
            max_entries: MAX_HISTORY,
        }
    }
}

impl HistorySettings {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchSettings {
    /// Delay granted to each off-screen render before export
    pub settle_ms: u64,
    pub format: ImageFormat,
    /// Archive file name prefix, `<prefix>-batch-<N>qr.zip`
    pub archive_prefix: String,
}

impl Default for BatchSettings {
    fn default() -> Self {
        Self {
            settle_ms: 300,
            format: ImageFormat::Png,
            archive_prefix: "qrypt".to_string(),
        }
    }
}

impl BatchSettings {
    pub fn settle(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecentSettings {
    pub capacity: usize,
}

impl Default for RecentSettings {
    fn default() -> Self {
        Self {
            capacity: RECENT_CAPACITY,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    pub debug: bool,
    pub console: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            debug: false,
            console: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settings_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.preview.size, 300);
        assert_eq!(settings.export.logo_margin, 20);
        assert_eq!(settings.history.debounce(), Duration::from_millis(300));
        assert_eq!(settings.history.max_entries, 30);
        assert_eq!(settings.batch.format, ImageFormat::Png);
        assert_eq!(settings.recent.capacity, 5);
    }

    #[test]
    fn test_partial_yaml_uses_defaults() {
        let yaml = "batch:\n  settle_ms: 50\n";
        let settings: Settings = serde_yaml_ng::from_str(yaml).unwrap();

        assert_eq!(settings.batch.settle(), Duration::from_millis(50));
        assert_eq!(settings.batch.archive_prefix, "qrypt");
        assert_eq!(settings.history.max_entries, 30);
    }
}
