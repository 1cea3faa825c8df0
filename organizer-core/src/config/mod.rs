//! Configuration types for organizer.

mod organizer_config;
mod tax_tables;

pub use organizer_config::OrganizerConfig;
pub use tax_tables::{DEFAULT_TAX_TABLES, TaxTables, YearTable};
