//! xoso-ledger - Points Ledger & Settlement Core
//!
//! The money-moving core of a points-based lottery platform, built to
//! guarantee exactly-once movement under concurrent requests.
//!
//! # Modules
//!
//! - [`core_types`] - Id aliases and ULID newtypes
//! - [`account`] - Account model and repository
//! - [`ledger`] - Atomic conditional balance mutations + immutable entry log
//! - [`idempotency`] - Keyed TTL lock + outcome cache (at-most-one effect per key)
//! - [`transfer`] - Transactional transfer orchestration with bounded retry
//! - [`bet`] - Bet categories, model, placement
//! - [`draw`] - Published results with fixed-width tier validation
//! - [`settlement`] - Matching, reward seam, forward/reversal passes
//! - [`payout`] - Approval state machine and dual control (the credit point)
//! - [`funding`] - Deposit/withdraw requests and admin point minting
//! - [`audit`] / [`notify`] - Best-effort post-commit collaborator seams

// Core types - must be first!
pub mod core_types;

// Infrastructure
pub mod config;
pub mod db;
pub mod logging;
pub mod schema;

// Ledger core
pub mod account;
pub mod idempotency;
pub mod ledger;
pub mod transfer;

// Betting & settlement
pub mod bet;
pub mod draw;
pub mod settlement;

// Payout & funding workflows
pub mod funding;
pub mod payout;

// Collaborator seams
pub mod audit;
pub mod notify;

// Convenient re-exports at crate root
pub use account::{Account, AccountStatus};
pub use bet::{Bet, BetCategory, BetStatus, PaymentStatus};
pub use core_types::{AdminId, BetId, DrawId, EntryId, Points, UserId};
pub use draw::{DrawResult, PrizeTiers, ProvinceResult};
pub use idempotency::{Acquisition, IdempotencyGuard};
pub use ledger::{EntryStatus, EntryType, LedgerEntry, LedgerError, LedgerStore};
pub use payout::{PayoutRequest, PayoutService};
pub use settlement::{BaseRatioCalculator, RewardCalculator, SettlementEngine};
pub use transfer::{TransferOrchestrator, TransferRequest};
