//! Append-only change history attached to each submission payload.

pub mod entry;
pub mod format;
pub mod ledger;

pub use entry::{FieldChange, FieldName, HistoryEntry};
pub use format::{format_entry, format_for_display};
pub use ledger::{ChangeSet, HistoryLedger, ProposedChange};
