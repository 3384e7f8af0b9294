//! # traficostore
//!
//! Document store for a traffic-event dataset with two record populations
//! (alerts and jams), keyed by application-level identifiers that do not
//! have a single canonical encoding.
//!
//! ## Guarantees
//! - Records are immutable once inserted
//! - Duplicate identities are an explicit error, never silently replaced
//! - Lookups and listings are safe under concurrent access

#![warn(missing_docs)]

mod error;
mod record;
mod store;

pub use error::{Error, Result};
pub use record::{IdentValue, Record, RecordKind};
pub use store::{LoadSummary, MemoryStore, RecordStore};
