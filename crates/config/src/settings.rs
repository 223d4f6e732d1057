// Grid interaction settings
// Loaded from ~/.config/cellgrid/settings.json (or settings.toml)

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Error type for settings I/O.
#[derive(Debug)]
pub enum SettingsError {
    /// File could not be read or written
    Io(String),
    /// File contents are not valid settings
    Parse(String),
    /// Settings could not be encoded
    Serialize(String),
}

impl std::fmt::Display for SettingsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SettingsError::Io(msg) => write!(f, "I/O error: {}", msg),
            SettingsError::Parse(msg) => write!(f, "Parse error: {}", msg),
            SettingsError::Serialize(msg) => write!(f, "Serialize error: {}", msg),
        }
    }
}

impl std::error::Error for SettingsError {}

/// Text direction of the grid. Right-to-left mirrors horizontal arrow keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextDirection {
    #[default]
    Ltr,
    Rtl,
}

impl TextDirection {
    pub fn is_rtl(&self) -> bool {
        matches!(self, TextDirection::Rtl)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct NavigationSettings {
    /// Columns jumped by pageleft/pageright
    pub page_columns: usize,
    /// Rows jumped by PageUp/PageDown when the viewport size is unknown
    pub fallback_page_rows: usize,
    pub text_direction: TextDirection,
}

impl Default for NavigationSettings {
    fn default() -> Self {
        Self {
            page_columns: 5,
            fallback_page_rows: 10,
            text_direction: TextDirection::Ltr,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ViewportSettings {
    /// Attempts to find a materialized cell after a scroll request before
    /// falling back to container focus
    pub max_focus_attempts: u32,
    pub retry_interval_ms: u64,
}

impl Default for ViewportSettings {
    fn default() -> Self {
        Self {
            max_focus_attempts: 10,
            retry_interval_ms: 16,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RowSettings {
    /// Polls of the row count after asking the host to create rows
    pub max_create_attempts: u32,
    pub retry_interval_ms: u64,
}

impl Default for RowSettings {
    fn default() -> Self {
        Self {
            max_create_attempts: 20,
            retry_interval_ms: 50,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SearchSettings {
    pub debounce_ms: u64,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self { debounce_ms: 150 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ClipboardSettings {
    /// strftime pattern for ISO dates pasted into text cells
    pub date_display_format: String,
}

impl Default for ClipboardSettings {
    fn default() -> Self {
        Self {
            date_display_format: "%-m/%-d/%Y".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GridSettings {
    /// Disables editing, cut, paste, clear and row deletion
    pub read_only: bool,
    pub navigation: NavigationSettings,
    pub viewport: ViewportSettings,
    pub rows: RowSettings,
    pub search: SearchSettings,
    pub clipboard: ClipboardSettings,
}

impl GridSettings {
    /// Get the settings file path
    pub fn config_path() -> PathBuf {
        let config_dir = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("cellgrid");
        config_dir.join("settings.json")
    }

    /// Load settings from the default path, falling back to defaults
    pub fn load() -> Self {
        let path = Self::config_path();

        if !path.exists() {
            let settings = Self::default();
            if let Err(e) = settings.save_to(&path) {
                log::warn!("Could not write default settings to {}: {}", path.display(), e);
            }
            return settings;
        }

        match Self::load_from(&path) {
            Ok(settings) => settings,
            Err(e) => {
                log::warn!("Error loading {}: {}. Using default settings", path.display(), e);
                Self::default()
            }
        }
    }

    /// Load settings from a specific file. `.toml` files parse as TOML,
    /// everything else as JSON with `//` line comments allowed.
    pub fn load_from(path: &Path) -> Result<Self, SettingsError> {
        let contents = fs::read_to_string(path).map_err(|e| SettingsError::Io(e.to_string()))?;

        let settings: Self = if is_toml(path) {
            toml::from_str(&contents).map_err(|e| SettingsError::Parse(e.to_string()))?
        } else {
            // Strip comments (lines starting with //)
            let cleaned: String = contents
                .lines()
                .filter(|line| !line.trim().starts_with("//"))
                .collect::<Vec<_>>()
                .join("\n");
            serde_json::from_str(&cleaned).map_err(|e| SettingsError::Parse(e.to_string()))?
        };

        Ok(settings.sanitized())
    }

    /// Save current settings to the default path
    pub fn save(&self) -> Result<(), SettingsError> {
        self.save_to(&Self::config_path())
    }

    pub fn save_to(&self, path: &Path) -> Result<(), SettingsError> {
        // Ensure directory exists
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| SettingsError::Io(e.to_string()))?;
        }

        let contents = if is_toml(path) {
            toml::to_string_pretty(self).map_err(|e| SettingsError::Serialize(e.to_string()))?
        } else {
            serde_json::to_string_pretty(self).map_err(|e| SettingsError::Serialize(e.to_string()))?
        };

        fs::write(path, contents).map_err(|e| SettingsError::Io(e.to_string()))
    }

    /// Clamp values that would stall navigation or retries.
    pub fn sanitized(mut self) -> Self {
        self.navigation.page_columns = self.navigation.page_columns.max(1);
        self.navigation.fallback_page_rows = self.navigation.fallback_page_rows.max(1);
        self.viewport.max_focus_attempts = self.viewport.max_focus_attempts.max(1);
        self.rows.max_create_attempts = self.rows.max_create_attempts.max(1);
        self
    }
}

fn is_toml(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("toml"))
}
