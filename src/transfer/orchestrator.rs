//! Transfer execution
//!
//! One REPEATABLE READ transaction per attempt: load both accounts,
//! conditional debit, credit, re-read, conservation check, persist the
//! ledger entry, commit. The whole operation runs under the idempotency
//! guard; post-commit side effects are best-effort and never retried.

use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use tracing::{info, warn};

use super::error::TransferError;
use crate::audit::{AuditEvent, AuditSink};
use crate::config::TransferConfig;
use crate::core_types::{Points, UserId};
use crate::idempotency::{Acquisition, IdempotencyGuard};
use crate::ledger::entry::PartyBalances;
use crate::ledger::{LedgerEntry, LedgerError, LedgerStore};
use crate::notify::NotificationSink;

/// Transfer request from the API layer
#[derive(Debug, Clone)]
pub struct TransferRequest {
    pub sender: UserId,
    pub receiver: UserId,
    pub amount: Points,
    /// Client-provided idempotency key; generated at entry when absent
    pub idempotency_key: Option<String>,
}

impl TransferRequest {
    pub fn new(sender: UserId, receiver: UserId, amount: Points) -> Self {
        Self {
            sender,
            receiver,
            amount,
            idempotency_key: None,
        }
    }

    pub fn with_key(sender: UserId, receiver: UserId, amount: Points, key: String) -> Self {
        Self {
            sender,
            receiver,
            amount,
            idempotency_key: Some(key),
        }
    }
}

/// Transfer Orchestrator
pub struct TransferOrchestrator {
    ledger: Arc<LedgerStore>,
    guard: Arc<IdempotencyGuard>,
    audit: Arc<dyn AuditSink>,
    notifier: Arc<dyn NotificationSink>,
    config: TransferConfig,
}

impl TransferOrchestrator {
    pub fn new(
        ledger: Arc<LedgerStore>,
        guard: Arc<IdempotencyGuard>,
        audit: Arc<dyn AuditSink>,
        notifier: Arc<dyn NotificationSink>,
        config: TransferConfig,
    ) -> Self {
        Self {
            ledger,
            guard,
            audit,
            notifier,
            config,
        }
    }

    /// Execute a transfer with at-most-one committed effect per key.
    ///
    /// Returns the committed ledger entry - the recorded one when the key is
    /// a replay of an already-completed request.
    pub async fn transfer(&self, req: TransferRequest) -> Result<LedgerEntry, TransferError> {
        if req.amount == 0 {
            return Err(TransferError::InvalidAmount);
        }
        if req.sender == req.receiver {
            return Err(TransferError::SelfTransfer);
        }

        let key = req
            .idempotency_key
            .clone()
            .unwrap_or_else(|| format!("transfer-{}", ulid::Ulid::new()));

        match self.guard.acquire(&key).await? {
            Acquisition::Replay(outcome) => {
                let entry: LedgerEntry = serde_json::from_value(outcome)?;
                info!(key = %key, entry_id = %entry.entry_id, "Duplicate transfer replayed");
                Ok(entry)
            }
            Acquisition::InProgress => Err(TransferError::OperationInProgress(key)),
            Acquisition::Acquired => {
                let result = run_with_retry(&self.config, async |_| {
                    self.execute_once(&req, &key).await
                })
                .await;

                // Record or release on every exit path
                match &result {
                    Ok(entry) => match serde_json::to_value(entry) {
                        Ok(outcome) => {
                            if let Err(e) = self.guard.record_outcome(&key, &outcome).await {
                                warn!(key = %key, error = %e, "Failed to record outcome (transfer committed)");
                            }
                        }
                        Err(e) => {
                            warn!(key = %key, error = %e, "Failed to serialize outcome");
                            let _ = self.guard.release(&key).await;
                        }
                    },
                    Err(_) => {
                        if let Err(e) = self.guard.release(&key).await {
                            warn!(key = %key, error = %e, "Failed to release idempotency lock");
                        }
                    }
                }

                let entry = result?;
                self.post_commit(&entry).await;
                Ok(entry)
            }
        }
    }

    /// One transactional attempt
    async fn execute_once(
        &self,
        req: &TransferRequest,
        key: &str,
    ) -> Result<LedgerEntry, TransferError> {
        let mut tx = self
            .ledger
            .pool()
            .begin()
            .await
            .map_err(TransferError::from_sqlx)?;

        sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ")
            .execute(&mut *tx)
            .await
            .map_err(TransferError::from_sqlx)?;

        // Both parties must exist before anything moves
        self.ledger.require_account(&mut tx, req.sender).await?;
        self.ledger.require_account(&mut tx, req.receiver).await?;

        let sender_pair = self.ledger.debit(&mut tx, req.sender, req.amount).await?;
        let receiver_pair = self
            .ledger
            .credit(&mut tx, req.receiver, req.amount)
            .await?;

        // Re-read both balances and prove conservation before committing
        let (sender_after, receiver_after) = self
            .ledger
            .read_balances(&mut tx, req.sender, req.receiver)
            .await?;
        if sender_after != sender_pair.after || receiver_after != receiver_pair.after {
            return Err(TransferError::Ledger(LedgerError::IntegrityViolation {
                sender: req.sender,
                receiver: req.receiver,
                before_total: sender_pair.after as u128 + receiver_pair.after as u128,
                after_total: sender_after as u128 + receiver_after as u128,
            }));
        }
        self.ledger
            .conservation_check(req.sender, req.receiver, sender_pair, receiver_pair)?;

        let entry = LedgerEntry::completed_transfer(
            req.sender,
            req.receiver,
            req.amount,
            PartyBalances {
                sender_before: Some(sender_pair.before),
                sender_after: Some(sender_pair.after),
                receiver_before: Some(receiver_pair.before),
                receiver_after: Some(receiver_pair.after),
            },
            key.to_string(),
        )?;
        self.ledger.insert_entry(&mut tx, &entry).await?;

        tx.commit().await.map_err(TransferError::from_sqlx)?;

        info!(
            entry_id = %entry.entry_id,
            sender = req.sender,
            receiver = req.receiver,
            amount = req.amount,
            key = %key,
            "Transfer committed"
        );
        Ok(entry)
    }

    /// Best-effort post-commit side effects; failures are logged, never
    /// rolled back, never retried.
    async fn post_commit(&self, entry: &LedgerEntry) {
        let (Some(sender), Some(receiver)) = (entry.sender_id, entry.receiver_id) else {
            return;
        };

        if let Err(e) = self
            .audit
            .record(AuditEvent::TransferCommitted {
                entry_id: entry.entry_id,
                sender,
                receiver,
                amount: entry.amount,
            })
            .await
        {
            warn!(entry_id = %entry.entry_id, error = %e, "Audit sink failed (transfer already committed)");
        }

        if let Err(e) = self
            .notifier
            .notify(
                receiver,
                &format!("You received {} points from user {}", entry.amount, sender),
            )
            .await
        {
            warn!(entry_id = %entry.entry_id, error = %e, "Notification failed (transfer already committed)");
        }
    }
}

/// Run `op` with the configured attempt budget, backing off exponentially
/// (with jitter) between transient-conflict failures.
pub(crate) async fn run_with_retry<T>(
    config: &TransferConfig,
    mut op: impl AsyncFnMut(u32) -> Result<T, TransferError>,
) -> Result<T, TransferError> {
    let mut attempt = 0;
    loop {
        attempt += 1;
        match op(attempt).await {
            Ok(v) => {
                if attempt > 1 {
                    info!(attempt = attempt, "Recovered from transient conflict");
                }
                return Ok(v);
            }
            Err(e) if e.is_transient() => {
                if attempt >= config.max_attempts {
                    warn!(
                        attempts = attempt,
                        error = %e,
                        "Retry budget exhausted for transient conflict"
                    );
                    return Err(TransferError::TransientConflict { attempts: attempt });
                }
                let delay = backoff_delay(config, attempt);
                warn!(
                    attempt = attempt,
                    delay_ms = delay.as_millis() as u64,
                    error = %e,
                    "Transient conflict, backing off"
                );
                tokio::time::sleep(delay).await;
            }
            Err(e) => return Err(e),
        }
    }
}

/// Base delay doubled each attempt, plus jitter in [0, base/2]
fn backoff_delay(config: &TransferConfig, attempt: u32) -> Duration {
    let base = config.backoff_base_ms.saturating_mul(1u64 << (attempt - 1));
    let jitter = if config.backoff_base_ms >= 2 {
        rand::thread_rng().gen_range(0..=config.backoff_base_ms / 2)
    } else {
        0
    };
    Duration::from_millis(base + jitter)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn fast_config() -> TransferConfig {
        TransferConfig {
            max_attempts: 3,
            backoff_base_ms: 1,
        }
    }

    #[tokio::test]
    async fn test_retry_succeeds_within_budget() {
        let calls = Cell::new(0u32);
        let result = run_with_retry(&fast_config(), async |attempt| {
            calls.set(calls.get() + 1);
            if attempt < 3 {
                Err(TransferError::Transient("injected conflict".into()))
            } else {
                Ok(42u32)
            }
        })
        .await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.get(), 3);
    }

    #[tokio::test]
    async fn test_retry_budget_exhaustion_is_terminal() {
        let calls = Cell::new(0u32);
        let result: Result<u32, _> = run_with_retry(&fast_config(), async |_| {
            calls.set(calls.get() + 1);
            Err(TransferError::Transient("injected conflict".into()))
        })
        .await;

        assert!(matches!(
            result,
            Err(TransferError::TransientConflict { attempts: 3 })
        ));
        assert_eq!(calls.get(), 3);
    }

    #[tokio::test]
    async fn test_non_transient_error_fails_fast() {
        let calls = Cell::new(0u32);
        let result: Result<u32, _> = run_with_retry(&fast_config(), async |_| {
            calls.set(calls.get() + 1);
            Err(TransferError::Ledger(LedgerError::InsufficientFunds {
                account: 1,
                needed: 100,
                available: 10,
            }))
        })
        .await;

        assert_eq!(calls.get(), 1, "no retry for local errors");
        assert_eq!(result.unwrap_err().code(), "INSUFFICIENT_FUNDS");
    }

    #[test]
    fn test_backoff_doubles() {
        let config = TransferConfig {
            max_attempts: 3,
            backoff_base_ms: 100,
        };
        let d1 = backoff_delay(&config, 1).as_millis() as u64;
        let d2 = backoff_delay(&config, 2).as_millis() as u64;
        let d3 = backoff_delay(&config, 3).as_millis() as u64;

        assert!((100..=150).contains(&d1), "attempt 1: {}", d1);
        assert!((200..=250).contains(&d2), "attempt 2: {}", d2);
        assert!((400..=450).contains(&d3), "attempt 3: {}", d3);
    }

    #[tokio::test]
    async fn test_post_commit_failures_are_swallowed() {
        use crate::audit::mock::MockAuditSink;
        use crate::notify::mock::MockNotifier;
        use crate::idempotency::IdempotencyGuard;
        use crate::ledger::LedgerStore;
        use std::sync::atomic::Ordering;

        let pool = sqlx::PgPool::connect_lazy("postgres://localhost/unused").unwrap();
        let audit = Arc::new(MockAuditSink::new());
        let notifier = Arc::new(MockNotifier::new());
        let orchestrator = TransferOrchestrator::new(
            Arc::new(LedgerStore::new(pool.clone())),
            Arc::new(IdempotencyGuard::new(pool, Duration::from_secs(30))),
            audit.clone(),
            notifier.clone(),
            TransferConfig::default(),
        );

        let entry = LedgerEntry::completed_transfer(
            1,
            2,
            500,
            PartyBalances {
                sender_before: Some(1000),
                sender_after: Some(500),
                receiver_before: Some(200),
                receiver_after: Some(700),
            },
            "key-1".to_string(),
        )
        .unwrap();

        // A failing audit sink must not propagate or panic
        audit.fail.store(true, Ordering::Relaxed);
        orchestrator.post_commit(&entry).await;
        assert_eq!(audit.recorded(), 0);
        assert_eq!(notifier.count(), 1, "notification still attempted");

        audit.fail.store(false, Ordering::Relaxed);
        orchestrator.post_commit(&entry).await;
        assert_eq!(audit.recorded(), 1);
    }

    #[test]
    fn test_request_validation_shapes() {
        let req = TransferRequest::new(1, 2, 500);
        assert!(req.idempotency_key.is_none());

        let req = TransferRequest::with_key(1, 2, 500, "k".into());
        assert_eq!(req.idempotency_key.as_deref(), Some("k"));
    }
}
