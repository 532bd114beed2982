//! Ledger: authoritative balances and the immutable movement log
//!
//! Every balance change anywhere in the system goes through the conditional
//! atomic updates in [`LedgerStore`]; the [`LedgerEntry`] log records each
//! committed movement once and is never mutated after completion (except the
//! admin annotation on pending deposit/withdraw requests).

pub mod entry;
pub mod error;
pub mod store;

pub use entry::{EntryStatus, EntryType, LedgerEntry};
pub use error::LedgerError;
pub use store::{BalancePair, LedgerStore};
