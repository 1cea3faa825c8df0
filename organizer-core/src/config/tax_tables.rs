//! Versioned tax bracket tables, one per tax year.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::OrganizerConfig;
use crate::error::{OrganizerError, OrganizerResult};
use crate::tax::BracketTable;

/// Written to tax_tables.toml the first time tables are loaded.
pub const DEFAULT_TAX_TABLES: &str = r#"# Progressive income-tax tables, one [[table]] per tax year.
#
# Each bracket is `tax = base * rate - deduction` for bases up to `upper_bound`
# (inclusive). The last bracket has no upper_bound.

[[table]]
year = 2025
brackets = [
  { upper_bound = "28467.20", rate = "0", deduction = "0" },
  { upper_bound = "33919.80", rate = "0.075", deduction = "2135.04" },
  { upper_bound = "45012.60", rate = "0.15", deduction = "4679.03" },
  { upper_bound = "55976.16", rate = "0.225", deduction = "8054.97" },
  { rate = "0.275", deduction = "10853.78" },
]
"#;

/// Bracket table for one tax year.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YearTable {
    pub year: i32,
    pub brackets: BracketTable,
}

/// All configured tax years (tax_tables.toml).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TaxTables {
    #[serde(rename = "table", default)]
    tables: Vec<YearTable>,
}

impl TaxTables {
    pub fn path() -> OrganizerResult<PathBuf> {
        Ok(OrganizerConfig::config_dir()?.join("tax_tables.toml"))
    }

    /// Load tables from `path`, writing the default file first if it doesn't exist.
    pub fn load(path: &Path) -> OrganizerResult<Self> {
        if !path.exists() {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(path, DEFAULT_TAX_TABLES)?;
        }

        debug!(path = %path.display(), "loading tax tables");
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Parse tables from TOML. Every table is validated and years must be unique.
    pub fn parse(content: &str) -> OrganizerResult<Self> {
        let tables: TaxTables =
            toml::from_str(content).map_err(|e| OrganizerError::Config(e.to_string()))?;

        let mut seen = BTreeSet::new();
        for table in &tables.tables {
            if !seen.insert(table.year) {
                return Err(OrganizerError::Config(format!(
                    "tax year {} is defined more than once",
                    table.year
                )));
            }
        }

        Ok(tables)
    }

    pub fn for_year(&self, year: i32) -> OrganizerResult<&BracketTable> {
        self.tables
            .iter()
            .find(|t| t.year == year)
            .map(|t| &t.brackets)
            .ok_or(OrganizerError::TaxYearNotFound(year))
    }

    pub fn years(&self) -> Vec<i32> {
        let mut years: Vec<i32> = self.tables.iter().map(|t| t.year).collect();
        years.sort_unstable();
        years
    }

    pub fn latest_year(&self) -> Option<i32> {
        self.tables.iter().map(|t| t.year).max()
    }
}
