//! Core types for the organizer ecosystem.
//!
//! This crate provides the pure calculators used by organizer front-ends:
//! - `recurrence` expands events with a recurrence rule into occurrences
//! - `reminder` turns "minutes before" offsets into fire times
//! - `tax` estimates progressive income tax from a bracket table
//!
//! plus the configuration, persistence and event lifecycle around them.

pub mod config;
pub mod error;
pub mod event;
pub mod organizer;
pub mod planner;
pub mod recurrence;
pub mod reminder;
pub mod store;
pub mod tax;

pub use error::{OrganizerError, OrganizerResult};
pub use event::{Event, EventStatus, Occurrence, OccurrenceId};
