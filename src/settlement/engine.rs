//! Settlement engine
//!
//! Forward path: per-bet atomic CAS marks against one loaded result.
//! Reversal path: one transaction that claws back credited winnings,
//! resets every linked bet to pending and clears the settled flag, so a
//! corrected result can be re-run without double-counting.

use std::sync::Arc;

use tracing::{info, warn};

use super::error::SettlementError;
use super::matching::bet_matches;
use super::reward::{RewardCalculator, RewardContext};
use crate::audit::{AuditEvent, AuditSink};
use crate::bet::service::row_to_bet;
use crate::bet::{BetStatus, PaymentStatus};
use crate::core_types::{DrawId, Points};
use crate::draw::DrawRepository;
use crate::ledger::entry::{EntryStatus, EntryType, PartyBalances};
use crate::ledger::{LedgerEntry, LedgerStore};

/// Outcome counts of a settlement pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SettlementSummary {
    pub result_id: DrawId,
    pub bets_settled: u64,
    pub bets_won: u64,
    pub bets_lost: u64,
}

/// Outcome counts of a reversal pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReversalSummary {
    pub result_id: DrawId,
    pub bets_reversed: u64,
    pub winnings_clawed_back: Points,
}

/// Bet Settlement Engine
pub struct SettlementEngine {
    ledger: Arc<LedgerStore>,
    reward: Arc<dyn RewardCalculator>,
    audit: Arc<dyn AuditSink>,
}

impl SettlementEngine {
    pub fn new(
        ledger: Arc<LedgerStore>,
        reward: Arc<dyn RewardCalculator>,
        audit: Arc<dyn AuditSink>,
    ) -> Self {
        Self {
            ledger,
            reward,
            audit,
        }
    }

    /// Settle every pending bet covered by the result.
    ///
    /// A result that was already settled (a correction) is reversed first,
    /// so re-running never double-counts or leaves stale credits.
    pub async fn settle(&self, result_id: DrawId) -> Result<SettlementSummary, SettlementError> {
        let mut result = DrawRepository::get(self.ledger.pool(), result_id).await?;

        if result.settled {
            info!(result_id = %result_id, "Result already settled; reversing prior effects before re-run");
            self.reverse(result_id).await?;
            result.settled = false;
        }

        let provinces: Vec<String> = result
            .provinces
            .iter()
            .map(|p| p.province_code.clone())
            .collect();

        let rows = sqlx::query(
            r#"
            SELECT bet_id, user_id, numbers, category, amount, province_code, status,
                   win_amount, payment_status, approved_by, approved_at, approval_note,
                   confirmed_by, confirmed_at, result_id, integrity_hash, created_at
            FROM bets_tb
            WHERE status = $1 AND (province_code IS NULL OR province_code = ANY($2))
            ORDER BY created_at
            "#,
        )
        .bind(BetStatus::Pending.id())
        .bind(&provinces)
        .fetch_all(self.ledger.pool())
        .await?;

        let mut won = 0u64;
        let mut lost = 0u64;

        for row in rows {
            let Some(bet) = row_to_bet(&row) else {
                warn!("Skipping corrupted bet row during settlement");
                continue;
            };

            if bet_matches(&bet, &result) {
                let reward = self.reward.compute(&bet, &RewardContext::for_bet(&bet));
                let win_amount = reward.total();

                // CAS from pending: a concurrent pass settles each bet once
                let updated = sqlx::query(
                    r#"
                    UPDATE bets_tb
                    SET status = $1, win_amount = $2, payment_status = $3,
                        result_id = $4, updated_at = NOW()
                    WHERE bet_id = $5 AND status = $6
                    "#,
                )
                .bind(BetStatus::Won.id())
                .bind(win_amount as i64)
                .bind(PaymentStatus::PendingApproval.id())
                .bind(result_id.to_string())
                .bind(bet.bet_id.to_string())
                .bind(BetStatus::Pending.id())
                .execute(self.ledger.pool())
                .await?;

                if updated.rows_affected() > 0 {
                    won += 1;
                    info!(
                        bet_id = %bet.bet_id,
                        user_id = bet.user_id,
                        numbers = %bet.numbers,
                        win_amount = win_amount,
                        "Bet won"
                    );
                }
            } else {
                let updated = sqlx::query(
                    r#"
                    UPDATE bets_tb
                    SET status = $1, result_id = $2, updated_at = NOW()
                    WHERE bet_id = $3 AND status = $4
                    "#,
                )
                .bind(BetStatus::Lost.id())
                .bind(result_id.to_string())
                .bind(bet.bet_id.to_string())
                .bind(BetStatus::Pending.id())
                .execute(self.ledger.pool())
                .await?;

                if updated.rows_affected() > 0 {
                    lost += 1;
                }
            }
        }

        let mut conn = self.ledger.pool().acquire().await?;
        DrawRepository::set_settled(&mut conn, result_id, true).await?;
        drop(conn);

        let summary = SettlementSummary {
            result_id,
            bets_settled: won + lost,
            bets_won: won,
            bets_lost: lost,
        };
        info!(
            result_id = %result_id,
            settled = summary.bets_settled,
            won = won,
            lost = lost,
            "Settlement pass completed"
        );

        if let Err(e) = self
            .audit
            .record(AuditEvent::SettlementCompleted {
                result_id,
                bets_settled: summary.bets_settled,
                bets_won: won,
            })
            .await
        {
            warn!(result_id = %result_id, error = %e, "Audit sink failed (settlement already committed)");
        }

        Ok(summary)
    }

    /// Reverse a result's settlement effects in one transaction: claw back
    /// any credited winnings, reset linked bets to pending, clear the flag.
    pub async fn reverse(&self, result_id: DrawId) -> Result<ReversalSummary, SettlementError> {
        let mut tx = self.ledger.pool().begin().await?;

        let rows = sqlx::query(
            r#"
            SELECT bet_id, user_id, numbers, category, amount, province_code, status,
                   win_amount, payment_status, approved_by, approved_at, approval_note,
                   confirmed_by, confirmed_at, result_id, integrity_hash, created_at
            FROM bets_tb
            WHERE result_id = $1
            FOR UPDATE
            "#,
        )
        .bind(result_id.to_string())
        .fetch_all(&mut *tx)
        .await?;

        let mut reversed = 0u64;
        let mut clawed_back: Points = 0;

        for row in &rows {
            let Some(bet) = row_to_bet(row) else {
                warn!("Skipping corrupted bet row during reversal");
                continue;
            };

            let credited = matches!(
                bet.payment_status,
                PaymentStatus::Approved | PaymentStatus::DoubleConfirmed
            ) && bet.win_amount > 0;

            if credited {
                let pair = self
                    .ledger
                    .debit(&mut tx, bet.user_id, bet.win_amount)
                    .await
                    .map_err(|source| SettlementError::ReversalFailed {
                        bet_id: bet.bet_id.to_string(),
                        source,
                    })?;

                // Claw-back: a Win-typed entry with the winner on the debit side
                let entry = LedgerEntry::new(
                    EntryType::Win,
                    bet.win_amount,
                    EntryStatus::Completed,
                    Some(bet.user_id),
                    None,
                    PartyBalances {
                        sender_before: Some(pair.before),
                        sender_after: Some(pair.after),
                        receiver_before: None,
                        receiver_after: None,
                    },
                    Some(format!("reversal-{}-{}", result_id, bet.bet_id)),
                )?;
                self.ledger.insert_entry(&mut tx, &entry).await?;
                clawed_back += bet.win_amount;
            }
            reversed += 1;
        }

        sqlx::query(
            r#"
            UPDATE bets_tb
            SET status = $1, win_amount = 0, payment_status = $2,
                approved_by = NULL, approved_at = NULL, approval_note = NULL,
                confirmed_by = NULL, confirmed_at = NULL,
                result_id = NULL, updated_at = NOW()
            WHERE result_id = $3
            "#,
        )
        .bind(BetStatus::Pending.id())
        .bind(PaymentStatus::Pending.id())
        .bind(result_id.to_string())
        .execute(&mut *tx)
        .await?;

        DrawRepository::set_settled(&mut tx, result_id, false).await?;

        tx.commit().await?;

        let summary = ReversalSummary {
            result_id,
            bets_reversed: reversed,
            winnings_clawed_back: clawed_back,
        };
        info!(
            result_id = %result_id,
            reversed = reversed,
            clawed_back = clawed_back,
            "Settlement reversed"
        );

        if let Err(e) = self
            .audit
            .record(AuditEvent::SettlementReversed {
                result_id,
                bets_reversed: reversed,
                winnings_clawed_back: clawed_back,
            })
            .await
        {
            warn!(result_id = %result_id, error = %e, "Audit sink failed (reversal already committed)");
        }

        Ok(summary)
    }

    /// Delete a result: reverse its settlement effects, then drop the row.
    pub async fn delete_result(
        &self,
        result_id: DrawId,
    ) -> Result<ReversalSummary, SettlementError> {
        let summary = self.reverse(result_id).await?;

        let mut conn = self.ledger.pool().acquire().await?;
        DrawRepository::delete(&mut conn, result_id).await?;

        info!(result_id = %result_id, "Result deleted after reversal");
        Ok(summary)
    }
}
