//! Global organizer configuration.

use std::path::{Path, PathBuf};

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{OrganizerError, OrganizerResult};

static DEFAULT_DATA_PATH: &str = "~/organizer";

fn default_data_dir() -> PathBuf {
    PathBuf::from(DEFAULT_DATA_PATH)
}

fn is_default_data_dir(p: &PathBuf) -> bool {
    *p == default_data_dir()
}

/// Global configuration at ~/.config/organizer/config.toml
///
/// Every key can be overridden from the environment with an `ORGANIZER_`
/// prefix, e.g. `ORGANIZER_DATA_DIR` or `ORGANIZER_DEFAULT_REMINDERS=10,30`.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct OrganizerConfig {
    #[serde(default = "default_data_dir", skip_serializing_if = "is_default_data_dir")]
    pub data_dir: PathBuf,

    /// Tax year used when none is given explicitly
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_tax_year: Option<i32>,

    /// Reminder offsets (minutes) for new events created without any
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub default_reminders: Vec<u32>,
}

impl Default for OrganizerConfig {
    fn default() -> Self {
        OrganizerConfig {
            data_dir: default_data_dir(),
            default_tax_year: None,
            default_reminders: Vec::new(),
        }
    }
}

impl OrganizerConfig {
    /// Directory holding config.toml and tax_tables.toml
    pub fn config_dir() -> OrganizerResult<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| OrganizerError::Config("Could not determine config directory".into()))?
            .join("organizer");

        Ok(config_dir)
    }

    pub fn config_path() -> OrganizerResult<PathBuf> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Load from `path` (missing file = defaults), then apply environment overrides.
    pub fn load_from(path: &Path) -> OrganizerResult<Self> {
        debug!(path = %path.display(), "loading config");

        Config::builder()
            .add_source(File::from(path.to_path_buf()).required(false))
            .add_source(
                Environment::with_prefix("ORGANIZER")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("default_reminders"),
            )
            .build()
            .map_err(|e| OrganizerError::Config(e.to_string()))?
            .try_deserialize()
            .map_err(|e| OrganizerError::Config(e.to_string()))
    }

    /// Data directory with `~` expanded.
    pub fn data_path(&self) -> PathBuf {
        let full_path_str = shellexpand::tilde(&self.data_dir.to_string_lossy()).into_owned();

        PathBuf::from(full_path_str)
    }

    pub fn save_to(&self, path: &Path) -> OrganizerResult<()> {
        let content =
            toml::to_string_pretty(self).map_err(|e| OrganizerError::Config(e.to_string()))?;

        std::fs::write(path, content)
            .map_err(|e| OrganizerError::Config(format!("Could not write config file: {e}")))?;

        Ok(())
    }

    /// Create a default config file with all options commented out.
    pub fn create_default_config(path: &Path) -> OrganizerResult<()> {
        let contents = format!(
            "\
# organizer configuration

# Where events and reminders are stored:
# data_dir = \"{}\"

# Tax year used by `organizer tax` when --year is not given:
# default_tax_year = 2025

# Reminders (minutes before start) for new events created without --remind:
# default_reminders = [10, 60]
",
            DEFAULT_DATA_PATH
        );

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                OrganizerError::Config(format!("Could not create config directory: {e}"))
            })?;
        }

        std::fs::write(path, contents)
            .map_err(|e| OrganizerError::Config(format!("Could not write config file: {e}")))?;

        Ok(())
    }
}
