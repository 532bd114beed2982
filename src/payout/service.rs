//! Payout approval service
//!
//! Transitions:
//!   pending_approval -> approved        (single admin; THE credit point)
//!   pending_approval -> rejected        (single admin; note required)
//!   approved         -> double_confirmed (second, distinct admin; no funds)
//!
//! Every transition is one CAS update keyed on the expected starting state;
//! the approve CAS and the ledger credit share a transaction, so a retried
//! or racing approval observes `InvalidStateTransition` instead of paying
//! twice.

use std::sync::Arc;

use sqlx::Row;
use tracing::{info, warn};
use uuid::Uuid;

use super::error::PayoutError;
use super::request::{PayoutRequest, PayoutRequestStatus};
use crate::audit::{AuditEvent, AuditSink};
use crate::bet::service::row_to_bet;
use crate::bet::{Bet, BetStatus, PaymentStatus};
use crate::core_types::{AdminId, BetId, Points, UserId};
use crate::ledger::entry::PartyBalances;
use crate::ledger::{LedgerEntry, LedgerStore};
use crate::notify::NotificationSink;

/// Aggregated outcome of a batched request
#[derive(Debug)]
pub struct BatchOutcome {
    pub request_id: Uuid,
    pub succeeded: u64,
    /// (bet id, error code) per member the per-bet guard refused
    pub failures: Vec<(String, &'static str)>,
}

/// Payout approval / dual-control service
pub struct PayoutService {
    ledger: Arc<LedgerStore>,
    audit: Arc<dyn AuditSink>,
    notifier: Arc<dyn NotificationSink>,
}

impl PayoutService {
    pub fn new(
        ledger: Arc<LedgerStore>,
        audit: Arc<dyn AuditSink>,
        notifier: Arc<dyn NotificationSink>,
    ) -> Self {
        Self {
            ledger,
            audit,
            notifier,
        }
    }

    /// Approve a payout and credit the winnings - the only credit point.
    pub async fn approve(
        &self,
        bet_id: BetId,
        admin: AdminId,
        note: Option<&str>,
    ) -> Result<Bet, PayoutError> {
        let mut tx = self.ledger.pool().begin().await?;

        // CAS: only one approval ever leaves pending_approval
        let row = sqlx::query(
            r#"
            UPDATE bets_tb
            SET payment_status = $1, approved_by = $2, approved_at = NOW(),
                approval_note = $3, updated_at = NOW()
            WHERE bet_id = $4 AND payment_status = $5 AND status = $6
            RETURNING user_id, win_amount
            "#,
        )
        .bind(PaymentStatus::Approved.id())
        .bind(admin as i64)
        .bind(note)
        .bind(bet_id.to_string())
        .bind(PaymentStatus::PendingApproval.id())
        .bind(BetStatus::Won.id())
        .fetch_optional(&mut *tx)
        .await?;

        let Some(row) = row else {
            tx.rollback().await?;
            return Err(self.explain_transition_failure(bet_id, "approve").await?);
        };

        let winner = row.get::<i64, _>("user_id") as UserId;
        let win_amount = row.get::<i64, _>("win_amount") as Points;

        if win_amount > 0 {
            let pair = self.ledger.credit(&mut tx, winner, win_amount).await?;

            let entry = LedgerEntry::completed_win(
                winner,
                win_amount,
                PartyBalances {
                    sender_before: None,
                    sender_after: None,
                    receiver_before: Some(pair.before),
                    receiver_after: Some(pair.after),
                },
                format!("payout-{}", bet_id),
            )?;
            self.ledger.insert_entry(&mut tx, &entry).await?;
        }

        tx.commit().await?;

        info!(
            bet_id = %bet_id,
            admin = admin,
            winner = winner,
            win_amount = win_amount,
            "Payout approved and credited"
        );

        if let Err(e) = self
            .audit
            .record(AuditEvent::PayoutApproved {
                bet_id,
                admin,
                amount: win_amount,
            })
            .await
        {
            warn!(bet_id = %bet_id, error = %e, "Audit sink failed (payout already committed)");
        }
        if let Err(e) = self
            .notifier
            .notify(winner, &format!("Your win of {} points was paid out", win_amount))
            .await
        {
            warn!(bet_id = %bet_id, error = %e, "Notification failed (payout already committed)");
        }

        self.get_bet(bet_id).await
    }

    /// Reject a payout; requires a note, moves no funds.
    pub async fn reject(
        &self,
        bet_id: BetId,
        admin: AdminId,
        note: &str,
    ) -> Result<Bet, PayoutError> {
        if note.trim().is_empty() {
            return Err(PayoutError::NoteRequired);
        }

        let result = sqlx::query(
            r#"
            UPDATE bets_tb
            SET payment_status = $1, approved_by = $2, approved_at = NOW(),
                approval_note = $3, updated_at = NOW()
            WHERE bet_id = $4 AND payment_status = $5
            "#,
        )
        .bind(PaymentStatus::Rejected.id())
        .bind(admin as i64)
        .bind(note)
        .bind(bet_id.to_string())
        .bind(PaymentStatus::PendingApproval.id())
        .execute(self.ledger.pool())
        .await?;

        if result.rows_affected() == 0 {
            return Err(self.explain_transition_failure(bet_id, "reject").await?);
        }

        info!(bet_id = %bet_id, admin = admin, "Payout rejected");

        if let Err(e) = self
            .audit
            .record(AuditEvent::PayoutRejected { bet_id, admin })
            .await
        {
            warn!(bet_id = %bet_id, error = %e, "Audit sink failed (rejection already committed)");
        }

        self.get_bet(bet_id).await
    }

    /// Second-admin attestation on an approved payout. The confirmer must
    /// differ from the approver; no further credit is performed.
    pub async fn double_confirm(&self, bet_id: BetId, admin: AdminId) -> Result<Bet, PayoutError> {
        let result = sqlx::query(
            r#"
            UPDATE bets_tb
            SET payment_status = $1, confirmed_by = $2, confirmed_at = NOW(), updated_at = NOW()
            WHERE bet_id = $3 AND payment_status = $4
              AND approved_by IS NOT NULL AND approved_by <> $2
            "#,
        )
        .bind(PaymentStatus::DoubleConfirmed.id())
        .bind(admin as i64)
        .bind(bet_id.to_string())
        .bind(PaymentStatus::Approved.id())
        .execute(self.ledger.pool())
        .await?;

        if result.rows_affected() == 0 {
            let bet = self.get_bet(bet_id).await?;
            if bet.payment_status == PaymentStatus::Approved && bet.approved_by == Some(admin) {
                return Err(PayoutError::Unauthorized {
                    bet_id: bet_id.to_string(),
                    admin,
                });
            }
            return Err(PayoutError::InvalidStateTransition {
                bet_id: bet_id.to_string(),
                from: bet.payment_status.as_str(),
                action: "double-confirm",
            });
        }

        info!(bet_id = %bet_id, admin = admin, "Payout double-confirmed");

        if let Err(e) = self
            .audit
            .record(AuditEvent::PayoutDoubleConfirmed { bet_id, admin })
            .await
        {
            warn!(bet_id = %bet_id, error = %e, "Audit sink failed (confirmation already committed)");
        }

        self.get_bet(bet_id).await
    }

    // === Batched requests ===

    /// Create a batch of bet ids awaiting one admin decision
    pub async fn create_request(&self, bet_ids: Vec<BetId>) -> Result<PayoutRequest, PayoutError> {
        let request = PayoutRequest::new(bet_ids);
        let ids_json = serde_json::to_value(
            request
                .bet_ids
                .iter()
                .map(|id| id.to_string())
                .collect::<Vec<_>>(),
        )?;

        sqlx::query(
            r#"
            INSERT INTO payout_requests_tb (request_id, bet_ids, status, created_at)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(request.request_id.to_string())
        .bind(ids_json)
        .bind(request.status.id())
        .bind(request.created_at)
        .execute(self.ledger.pool())
        .await?;

        Ok(request)
    }

    /// Decide a whole batch: claim the request with a CAS from `pending`,
    /// then apply the per-bet guard to every member and aggregate outcomes.
    pub async fn process_request(
        &self,
        request_id: Uuid,
        admin: AdminId,
        approve: bool,
        note: Option<&str>,
    ) -> Result<BatchOutcome, PayoutError> {
        let request = self.get_request(request_id).await?;

        let new_status = if approve {
            PayoutRequestStatus::Approved
        } else {
            PayoutRequestStatus::Rejected
        };

        let claimed = sqlx::query(
            r#"
            UPDATE payout_requests_tb
            SET status = $1, processed_by = $2, processed_at = NOW(), note = $3
            WHERE request_id = $4 AND status = $5
            "#,
        )
        .bind(new_status.id())
        .bind(admin as i64)
        .bind(note)
        .bind(request_id.to_string())
        .bind(PayoutRequestStatus::Pending.id())
        .execute(self.ledger.pool())
        .await?;

        if claimed.rows_affected() == 0 {
            return Err(PayoutError::InvalidRequestState {
                action: if approve { "approve" } else { "reject" },
                from: request.status.as_str(),
            });
        }

        let mut outcome = BatchOutcome {
            request_id,
            succeeded: 0,
            failures: Vec::new(),
        };

        for bet_id in request.bet_ids {
            let result = if approve {
                self.approve(bet_id, admin, note).await
            } else {
                self.reject(bet_id, admin, note.unwrap_or("batch rejection"))
                    .await
            };

            match result {
                Ok(_) => outcome.succeeded += 1,
                Err(e) => {
                    warn!(
                        request_id = %request_id,
                        bet_id = %bet_id,
                        code = e.code(),
                        "Batch member refused by per-bet guard"
                    );
                    outcome.failures.push((bet_id.to_string(), e.code()));
                }
            }
        }

        info!(
            request_id = %request_id,
            admin = admin,
            succeeded = outcome.succeeded,
            failed = outcome.failures.len(),
            "Payout request processed"
        );
        Ok(outcome)
    }

    /// Cancel a still-pending request; processed requests cannot be cancelled
    pub async fn cancel_request(
        &self,
        request_id: Uuid,
        admin: AdminId,
    ) -> Result<(), PayoutError> {
        let result = sqlx::query(
            r#"
            UPDATE payout_requests_tb
            SET status = $1, processed_by = $2, processed_at = NOW()
            WHERE request_id = $3 AND status = $4
            "#,
        )
        .bind(PayoutRequestStatus::Cancelled.id())
        .bind(admin as i64)
        .bind(request_id.to_string())
        .bind(PayoutRequestStatus::Pending.id())
        .execute(self.ledger.pool())
        .await?;

        if result.rows_affected() == 0 {
            let request = self.get_request(request_id).await?;
            return Err(PayoutError::InvalidRequestState {
                action: "cancel",
                from: request.status.as_str(),
            });
        }
        Ok(())
    }

    /// Get a payout request by id
    pub async fn get_request(&self, request_id: Uuid) -> Result<PayoutRequest, PayoutError> {
        let row = sqlx::query(
            r#"
            SELECT request_id, bet_ids, status, processed_by, processed_at, note, created_at
            FROM payout_requests_tb
            WHERE request_id = $1
            "#,
        )
        .bind(request_id.to_string())
        .fetch_optional(self.ledger.pool())
        .await?
        .ok_or_else(|| PayoutError::RequestNotFound(request_id.to_string()))?;

        let ids: Vec<String> = serde_json::from_value(row.get::<serde_json::Value, _>("bet_ids"))?;
        let bet_ids = ids
            .iter()
            .filter_map(|s| s.parse::<BetId>().ok())
            .collect::<Vec<_>>();

        Ok(PayoutRequest {
            request_id,
            bet_ids,
            status: PayoutRequestStatus::from_id(row.get::<i16, _>("status"))
                .unwrap_or(PayoutRequestStatus::Cancelled),
            processed_by: row
                .get::<Option<i64>, _>("processed_by")
                .map(|a| a as AdminId),
            processed_at: row.get("processed_at"),
            note: row.get("note"),
            created_at: row.get("created_at"),
        })
    }

    async fn get_bet(&self, bet_id: BetId) -> Result<Bet, PayoutError> {
        let row = sqlx::query(
            r#"
            SELECT bet_id, user_id, numbers, category, amount, province_code, status,
                   win_amount, payment_status, approved_by, approved_at, approval_note,
                   confirmed_by, confirmed_at, result_id, integrity_hash, created_at
            FROM bets_tb
            WHERE bet_id = $1
            "#,
        )
        .bind(bet_id.to_string())
        .fetch_optional(self.ledger.pool())
        .await?
        .ok_or_else(|| PayoutError::BetNotFound(bet_id.to_string()))?;

        row_to_bet(&row).ok_or_else(|| PayoutError::BetNotFound(bet_id.to_string()))
    }

    /// Turn a zero-row CAS into the precise refusal the caller should see
    async fn explain_transition_failure(
        &self,
        bet_id: BetId,
        action: &'static str,
    ) -> Result<PayoutError, PayoutError> {
        let bet = self.get_bet(bet_id).await?;
        Ok(PayoutError::InvalidStateTransition {
            bet_id: bet_id.to_string(),
            from: bet.payment_status.as_str(),
            action,
        })
    }
}
