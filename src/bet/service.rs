//! Bet placement and persistence
//!
//! Placement is one transaction: conditional stake debit, bet row, bet
//! ledger entry. Either all three commit or the bet never existed.

use std::sync::Arc;

use sqlx::Row;
use tracing::info;

use super::category::BetCategory;
use super::error::BetError;
use super::model::{Bet, BetStatus, PaymentStatus};
use crate::core_types::{AdminId, BetId, DrawId, Points, UserId};
use crate::ledger::entry::PartyBalances;
use crate::ledger::{LedgerEntry, LedgerStore};

/// Bet placement / lookup service
pub struct BetService {
    ledger: Arc<LedgerStore>,
}

impl BetService {
    pub fn new(ledger: Arc<LedgerStore>) -> Self {
        Self { ledger }
    }

    /// Place a bet: validate, debit the stake, persist bet and ledger entry.
    pub async fn place_bet(
        &self,
        user_id: UserId,
        numbers: &str,
        category: BetCategory,
        amount: Points,
        province_code: Option<String>,
    ) -> Result<Bet, BetError> {
        let bet = Bet::place(user_id, numbers, category, amount, province_code)?;

        let mut tx = self.ledger.pool().begin().await?;

        let stake = self.ledger.debit(&mut tx, user_id, amount).await?;

        insert_bet(&mut tx, &bet).await?;

        let entry = LedgerEntry::completed_bet(
            user_id,
            amount,
            PartyBalances {
                sender_before: Some(stake.before),
                sender_after: Some(stake.after),
                receiver_before: None,
                receiver_after: None,
            },
        )?;
        self.ledger.insert_entry(&mut tx, &entry).await?;

        tx.commit().await?;

        info!(
            bet_id = %bet.bet_id,
            user_id = user_id,
            category = %category,
            numbers = %bet.numbers,
            amount = amount,
            "Bet placed"
        );
        Ok(bet)
    }

    /// Get a bet by id
    pub async fn get(&self, bet_id: BetId) -> Result<Bet, BetError> {
        let row = sqlx::query(BET_SELECT)
            .bind(bet_id.to_string())
            .fetch_optional(self.ledger.pool())
            .await?
            .ok_or_else(|| BetError::BetNotFound(bet_id.to_string()))?;

        row_to_bet(&row).ok_or_else(|| BetError::BetNotFound(bet_id.to_string()))
    }
}

const BET_SELECT: &str = r#"
SELECT bet_id, user_id, numbers, category, amount, province_code, status,
       win_amount, payment_status, approved_by, approved_at, approval_note,
       confirmed_by, confirmed_at, result_id, integrity_hash, created_at
FROM bets_tb
WHERE bet_id = $1
"#;

pub(crate) async fn insert_bet(
    conn: &mut sqlx::PgConnection,
    bet: &Bet,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO bets_tb
            (bet_id, user_id, numbers, category, amount, province_code,
             status, win_amount, payment_status, integrity_hash, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $11)
        "#,
    )
    .bind(bet.bet_id.to_string())
    .bind(bet.user_id as i64)
    .bind(&bet.numbers)
    .bind(bet.category.id())
    .bind(bet.amount as i64)
    .bind(&bet.province_code)
    .bind(bet.status.id())
    .bind(bet.win_amount as i64)
    .bind(bet.payment_status.id())
    .bind(&bet.integrity_hash)
    .bind(bet.created_at)
    .execute(conn)
    .await?;

    Ok(())
}

/// Map a `bets_tb` row; None on unknown enum ids (corrupted row)
pub(crate) fn row_to_bet(row: &sqlx::postgres::PgRow) -> Option<Bet> {
    use crate::db::SafeRow;

    let bet_id: BetId = row.get::<String, _>("bet_id").parse().ok()?;
    let category = BetCategory::from_id(row.try_get_log::<i16>("category")?)?;
    let status = BetStatus::from_id(row.try_get_log::<i16>("status")?)?;
    let payment_status = PaymentStatus::from_id(row.try_get_log::<i16>("payment_status")?)?;
    let result_id = row
        .get::<Option<String>, _>("result_id")
        .and_then(|s| s.parse::<DrawId>().ok());

    Some(Bet {
        bet_id,
        user_id: row.get::<i64, _>("user_id") as UserId,
        numbers: row.get("numbers"),
        category,
        amount: row.get::<i64, _>("amount") as Points,
        province_code: row.get("province_code"),
        status,
        win_amount: row.get::<i64, _>("win_amount") as Points,
        payment_status,
        approved_by: row.get::<Option<i64>, _>("approved_by").map(|a| a as AdminId),
        approved_at: row.get("approved_at"),
        approval_note: row.get("approval_note"),
        confirmed_by: row
            .get::<Option<i64>, _>("confirmed_by")
            .map(|a| a as AdminId),
        confirmed_at: row.get("confirmed_at"),
        result_id,
        integrity_hash: row.get("integrity_hash"),
        created_at: row.get("created_at"),
    })
}
