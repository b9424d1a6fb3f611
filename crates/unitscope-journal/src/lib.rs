//! journald and systemd access for unitscope
//!
//! This crate provides the follow-mode journal reader and the unit
//! inventory, each behind a trait so the streaming core can be driven by
//! the in-memory fakes in tests.

mod error;
pub mod fake;
mod inventory;
mod journalctl;
mod source;

pub use error::SourceError;
pub use inventory::{SystemCtl, UnitInventory};
pub use journalctl::JournalCtl;
pub use source::{LogSource, RecordStream};

// Re-export types that are used in our public API
pub use unitscope_types::{JournalRecord, MatchClause, MatchSpec, UnitInfo};
