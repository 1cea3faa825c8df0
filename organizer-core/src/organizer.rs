//! Organizer root: configuration, tax tables and the event store in one place.

use std::path::PathBuf;

use crate::config::{OrganizerConfig, TaxTables};
use crate::error::OrganizerResult;
use crate::planner::Planner;
use crate::store::FileStore;
use crate::tax::BracketTable;

pub struct Organizer {
    config: OrganizerConfig,
    tax_tables: TaxTables,
}

impl Organizer {
    /// Load config and tax tables from the user's config directory,
    /// creating default files on first run.
    pub fn load() -> OrganizerResult<Self> {
        let config_path = OrganizerConfig::config_path()?;

        if !config_path.exists() {
            OrganizerConfig::create_default_config(&config_path)?;
        }

        let config = OrganizerConfig::load_from(&config_path)?;
        let tax_tables = TaxTables::load(&TaxTables::path()?)?;

        Ok(Organizer { config, tax_tables })
    }

    pub fn config(&self) -> &OrganizerConfig {
        &self.config
    }

    pub fn data_path(&self) -> PathBuf {
        self.config.data_path()
    }

    pub fn planner(&self) -> OrganizerResult<Planner<FileStore>> {
        Ok(Planner::new(FileStore::open(&self.data_path())?))
    }

    /// Tax year to use when the caller doesn't pick one: the configured
    /// default, else `fallback` (usually the current year).
    pub fn tax_year(&self, fallback: i32) -> i32 {
        self.config.default_tax_year.unwrap_or(fallback)
    }

    pub fn tax_table(&self, year: i32) -> OrganizerResult<&BracketTable> {
        self.tax_tables.for_year(year)
    }

    pub fn tax_years(&self) -> Vec<i32> {
        self.tax_tables.years()
    }
}
