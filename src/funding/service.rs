//! Funding service

use std::sync::Arc;

use sqlx::Row;
use tracing::{info, warn};

use super::error::FundingError;
use crate::audit::{AuditEvent, AuditSink};
use crate::config::FundingConfig;
use crate::core_types::{AdminId, EntryId, Points, UserId};
use crate::ledger::entry::PartyBalances;
use crate::ledger::{EntryStatus, EntryType, LedgerEntry, LedgerStore};
use crate::notify::NotificationSink;

/// Deposit/withdraw requests and admin point minting
pub struct FundingService {
    ledger: Arc<LedgerStore>,
    audit: Arc<dyn AuditSink>,
    notifier: Arc<dyn NotificationSink>,
    config: FundingConfig,
}

impl FundingService {
    pub fn new(
        ledger: Arc<LedgerStore>,
        audit: Arc<dyn AuditSink>,
        notifier: Arc<dyn NotificationSink>,
        config: FundingConfig,
    ) -> Self {
        Self {
            ledger,
            audit,
            notifier,
            config,
        }
    }

    /// Record a deposit request. No balance change until an admin approves.
    pub async fn request_deposit(
        &self,
        user_id: UserId,
        amount: Points,
    ) -> Result<LedgerEntry, FundingError> {
        // The account must exist before we accept a request against it
        self.ledger.get_account(user_id).await?;

        let entry = LedgerEntry::pending_request(EntryType::Deposit, user_id, amount)?;

        let mut tx = self.ledger.pool().begin().await?;
        self.ledger.insert_entry(&mut tx, &entry).await?;
        tx.commit().await?;

        info!(entry_id = %entry.entry_id, user_id = user_id, amount = amount, "Deposit requested");
        Ok(entry)
    }

    /// Record a withdraw request, debiting immediately so the requested
    /// points cannot be spent while the request is pending.
    pub async fn request_withdraw(
        &self,
        user_id: UserId,
        amount: Points,
    ) -> Result<LedgerEntry, FundingError> {
        let mut tx = self.ledger.pool().begin().await?;

        let pair = self.ledger.debit(&mut tx, user_id, amount).await?;

        let mut entry = LedgerEntry::pending_request(EntryType::Withdraw, user_id, amount)?;
        entry.balances = PartyBalances {
            sender_before: Some(pair.before),
            sender_after: Some(pair.after),
            receiver_before: None,
            receiver_after: None,
        };
        self.ledger.insert_entry(&mut tx, &entry).await?;

        tx.commit().await?;

        info!(entry_id = %entry.entry_id, user_id = user_id, amount = amount, "Withdraw requested (debited)");
        Ok(entry)
    }

    /// Process a pending deposit/withdraw request. The annotation CAS fires
    /// once; an approved deposit credits, a rejected withdraw compensates.
    pub async fn process_request(
        &self,
        entry_id: EntryId,
        admin: AdminId,
        approve: bool,
    ) -> Result<LedgerEntry, FundingError> {
        let entry = self.ledger.get_entry(entry_id).await?;

        let user_id = match (entry.entry_type, entry.sender_id, entry.receiver_id) {
            (EntryType::Deposit, _, Some(user)) => user,
            (EntryType::Withdraw, Some(user), _) => user,
            _ => {
                return Err(FundingError::NotARequest {
                    entry_id: entry_id.to_string(),
                });
            }
        };

        let new_status = if approve {
            EntryStatus::Completed
        } else {
            EntryStatus::Cancelled
        };

        let mut tx = self.ledger.pool().begin().await?;

        let advanced = self
            .ledger
            .process_pending_request(&mut tx, entry_id, admin, new_status)
            .await?;
        if !advanced {
            tx.rollback().await?;
            return Err(FundingError::InvalidStateTransition {
                entry_id: entry_id.to_string(),
                from: entry.status.as_str(),
            });
        }

        match (entry.entry_type, approve) {
            // Approved deposit: the credit happens now
            (EntryType::Deposit, true) => {
                self.ledger.credit(&mut tx, user_id, entry.amount).await?;
            }
            // Rejected withdraw: compensate the upfront debit
            (EntryType::Withdraw, false) => {
                self.ledger.credit(&mut tx, user_id, entry.amount).await?;
            }
            // Approved withdraw (already debited) / rejected deposit: no movement
            _ => {}
        }

        tx.commit().await?;

        info!(
            entry_id = %entry_id,
            admin = admin,
            approved = approve,
            "Funding request processed"
        );

        if let Err(e) = self
            .audit
            .record(AuditEvent::FundingProcessed {
                entry_id,
                admin,
                approved: approve,
            })
            .await
        {
            warn!(entry_id = %entry_id, error = %e, "Audit sink failed (request already processed)");
        }
        let verdict = if approve { "approved" } else { "rejected" };
        if let Err(e) = self
            .notifier
            .notify(
                user_id,
                &format!(
                    "Your {} request of {} points was {}",
                    entry.entry_type.as_str().to_lowercase(),
                    entry.amount,
                    verdict
                ),
            )
            .await
        {
            warn!(entry_id = %entry_id, error = %e, "Notification failed (request already processed)");
        }

        Ok(self.ledger.get_entry(entry_id).await?)
    }

    /// Admin point mint, bounded by the per-admin daily cap.
    pub async fn create_points(
        &self,
        admin: AdminId,
        user_id: UserId,
        amount: Points,
    ) -> Result<LedgerEntry, FundingError> {
        let mut tx = self.ledger.pool().begin().await?;

        if self.config.daily_point_creation_cap > 0 {
            let minted = sqlx::query(
                r#"
                SELECT COALESCE(SUM(amount), 0) AS minted
                FROM ledger_entries_tb
                WHERE entry_type = $1 AND status = $2 AND processed_by = $3
                  AND created_at >= date_trunc('day', NOW())
                "#,
            )
            .bind(EntryType::PointCreation.id())
            .bind(EntryStatus::Completed.id())
            .bind(admin as i64)
            .fetch_one(&mut *tx)
            .await?
            .get::<i64, _>("minted") as Points;

            if minted + amount > self.config.daily_point_creation_cap {
                tx.rollback().await?;
                return Err(FundingError::DailyLimitExceeded {
                    admin,
                    cap: self.config.daily_point_creation_cap,
                    minted,
                });
            }
        }

        let pair = self.ledger.credit(&mut tx, user_id, amount).await?;

        let mut entry = LedgerEntry::new(
            EntryType::PointCreation,
            amount,
            EntryStatus::Completed,
            None,
            Some(user_id),
            PartyBalances {
                sender_before: None,
                sender_after: None,
                receiver_before: Some(pair.before),
                receiver_after: Some(pair.after),
            },
            None,
        )?;
        entry.processed_by = Some(admin);
        entry.processed_at = Some(chrono::Utc::now());
        self.ledger.insert_entry(&mut tx, &entry).await?;

        tx.commit().await?;

        info!(
            entry_id = %entry.entry_id,
            admin = admin,
            user_id = user_id,
            amount = amount,
            "Points created"
        );

        if let Err(e) = self
            .audit
            .record(AuditEvent::PointsCreated {
                entry_id: entry.entry_id,
                admin,
                receiver: user_id,
                amount,
            })
            .await
        {
            warn!(entry_id = %entry.entry_id, error = %e, "Audit sink failed (mint already committed)");
        }

        Ok(entry)
    }
}
