//! Funding requests
//!
//! Deposit/withdraw request workflow and the admin point mint. A withdraw
//! debits immediately (the stake is gone the moment the request commits);
//! a rejected withdraw is compensated with a credit. Deposits move nothing
//! until an admin approves. Both leave a pending ledger entry that the
//! processing admin annotates exactly once.

pub mod error;
pub mod service;

pub use error::FundingError;
pub use service::FundingService;
