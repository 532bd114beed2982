//! Audit sink collaborator
//!
//! Called after each committed transfer, approval or settlement batch.
//! Persistence of the audit trail is owned by an external collaborator;
//! failures here are logged and never block or roll back the core.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::core_types::{AdminId, BetId, DrawId, EntryId, Points, UserId};

/// Audited core events
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum AuditEvent {
    TransferCommitted {
        entry_id: EntryId,
        sender: UserId,
        receiver: UserId,
        amount: Points,
    },
    PayoutApproved {
        bet_id: BetId,
        admin: AdminId,
        amount: Points,
    },
    PayoutRejected {
        bet_id: BetId,
        admin: AdminId,
    },
    PayoutDoubleConfirmed {
        bet_id: BetId,
        admin: AdminId,
    },
    SettlementCompleted {
        result_id: DrawId,
        bets_settled: u64,
        bets_won: u64,
    },
    SettlementReversed {
        result_id: DrawId,
        bets_reversed: u64,
        winnings_clawed_back: Points,
    },
    FundingProcessed {
        entry_id: EntryId,
        admin: AdminId,
        approved: bool,
    },
    PointsCreated {
        entry_id: EntryId,
        admin: AdminId,
        receiver: UserId,
        amount: Points,
    },
}

/// Post-commit audit recording; best-effort by contract
#[async_trait]
pub trait AuditSink: Send + Sync {
    async fn record(&self, event: AuditEvent) -> anyhow::Result<()>;
}

/// Default sink: structured log line per event
pub struct TracingAuditSink;

#[async_trait]
impl AuditSink for TracingAuditSink {
    async fn record(&self, event: AuditEvent) -> anyhow::Result<()> {
        tracing::info!(event = ?event, "audit");
        Ok(())
    }
}

#[cfg(test)]
pub mod mock {
    use super::*;
    use std::sync::Mutex;

    /// Counting sink for tests; optionally fails every call to prove the
    /// core never propagates sink errors.
    pub struct MockAuditSink {
        pub events: Mutex<Vec<AuditEvent>>,
        pub fail: std::sync::atomic::AtomicBool,
    }

    impl MockAuditSink {
        pub fn new() -> Self {
            Self {
                events: Mutex::new(Vec::new()),
                fail: std::sync::atomic::AtomicBool::new(false),
            }
        }

        pub fn recorded(&self) -> usize {
            self.events.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl AuditSink for MockAuditSink {
        async fn record(&self, event: AuditEvent) -> anyhow::Result<()> {
            if self.fail.load(std::sync::atomic::Ordering::Relaxed) {
                anyhow::bail!("audit sink unavailable");
            }
            self.events.lock().unwrap().push(event);
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_serializes_with_tag() {
        let event = AuditEvent::TransferCommitted {
            entry_id: EntryId::new(),
            sender: 1,
            receiver: 2,
            amount: 500,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], "transfer_committed");
        assert_eq!(json["amount"], 500);
    }
}
