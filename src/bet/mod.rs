//! Bets: categories, model, placement
//!
//! A bet debits the ledger atomically at placement and stays `pending`
//! until a settlement pass marks it won or lost. Payment status is advanced
//! only by the payout approval state machine.

pub mod category;
pub mod error;
pub mod model;
pub mod service;

pub use category::{BetCategory, MatchScope};
pub use error::BetError;
pub use model::{Bet, BetStatus, PaymentStatus};
pub use service::BetService;
