//! Account management
//!
//! Account model and repository. Balances are mutated only through the
//! conditional atomic updates in [`crate::ledger`]; this module only reads.

pub mod models;
pub mod repository;

pub use models::{Account, AccountStatus};
pub use repository::AccountRepository;
