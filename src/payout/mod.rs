//! Payout Approval State Machine
//!
//! Gates the crediting of winnings behind admin approval and an optional
//! second, distinct admin's confirmation. The `pending_approval -> approved`
//! CAS is the only point in the system where a bet's win amount reaches the
//! ledger; the CAS succeeding at most once makes retried approvals unable to
//! double-credit.

pub mod error;
pub mod request;
pub mod service;

pub use error::PayoutError;
pub use request::{PayoutRequest, PayoutRequestStatus};
pub use service::{BatchOutcome, PayoutService};
