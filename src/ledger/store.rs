//! Ledger Store
//!
//! Atomic conditional balance mutations and the ledger entry log.
//!
//! No read-then-write balance mutation exists anywhere in this crate: a
//! debit or credit is one conditional `UPDATE` whose `RETURNING` row proves
//! the mutation happened. Callers hand in the transaction connection so a
//! multi-step flow (transfer, payout) commits or vanishes as a unit.

use sqlx::{PgConnection, PgPool, Row};
use tracing::error;

use super::entry::{EntryStatus, LedgerEntry, PartyBalances};
use super::error::LedgerError;
use crate::account::{Account, AccountStatus};
use crate::core_types::{AdminId, EntryId, Points, UserId};

/// Balance of one account before and after a movement
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BalancePair {
    pub before: Points,
    pub after: Points,
}

/// Ledger store over PostgreSQL
pub struct LedgerStore {
    pool: PgPool,
}

impl LedgerStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Get an account, failing with `AccountNotFound` if absent
    pub async fn get_account(&self, user_id: UserId) -> Result<Account, LedgerError> {
        crate::account::AccountRepository::get(&self.pool, user_id)
            .await?
            .ok_or(LedgerError::AccountNotFound(user_id))
    }

    /// Atomically decrement a balance, only if `balance >= amount`.
    ///
    /// The conditional update affecting zero rows is resolved into a precise
    /// error by a follow-up read: missing account, frozen/disabled status,
    /// or a balance that was (or became) insufficient.
    pub async fn debit(
        &self,
        conn: &mut PgConnection,
        user_id: UserId,
        amount: Points,
    ) -> Result<BalancePair, LedgerError> {
        if amount == 0 {
            return Err(LedgerError::InvalidAmount);
        }

        let row = sqlx::query(
            r#"
            UPDATE accounts_tb
            SET balance = balance - $1, version = version + 1, updated_at = NOW()
            WHERE user_id = $2 AND balance >= $1 AND status = $3
            RETURNING balance
            "#,
        )
        .bind(amount as i64)
        .bind(user_id as i64)
        .bind(AccountStatus::Active.id())
        .fetch_optional(&mut *conn)
        .await?;

        match row {
            Some(row) => {
                let after = row.get::<i64, _>("balance") as Points;
                Ok(BalancePair {
                    before: after + amount,
                    after,
                })
            }
            None => Err(self.explain_debit_failure(conn, user_id, amount).await?),
        }
    }

    /// Atomically increment a balance; fails only if the account is absent
    /// or disabled.
    pub async fn credit(
        &self,
        conn: &mut PgConnection,
        user_id: UserId,
        amount: Points,
    ) -> Result<BalancePair, LedgerError> {
        if amount == 0 {
            return Err(LedgerError::InvalidAmount);
        }

        let row = sqlx::query(
            r#"
            UPDATE accounts_tb
            SET balance = balance + $1, version = version + 1, updated_at = NOW()
            WHERE user_id = $2 AND status <> $3
            RETURNING balance
            "#,
        )
        .bind(amount as i64)
        .bind(user_id as i64)
        .bind(AccountStatus::Disabled.id())
        .fetch_optional(&mut *conn)
        .await?;

        match row {
            Some(row) => {
                let after = row.get::<i64, _>("balance") as Points;
                Ok(BalancePair {
                    before: after - amount,
                    after,
                })
            }
            None => {
                let status = self.read_status(conn, user_id).await?;
                match status {
                    None => Err(LedgerError::AccountNotFound(user_id)),
                    Some(_) => Err(LedgerError::AccountDisabled(user_id)),
                }
            }
        }
    }

    /// Conservation invariant: the sum of both balances before a two-party
    /// movement equals the sum after. A mismatch is fatal; the enclosing
    /// transaction must be aborted and operators alerted.
    pub fn conservation_check(
        &self,
        sender: UserId,
        receiver: UserId,
        sender_pair: BalancePair,
        receiver_pair: BalancePair,
    ) -> Result<(), LedgerError> {
        let before_total = sender_pair.before as u128 + receiver_pair.before as u128;
        let after_total = sender_pair.after as u128 + receiver_pair.after as u128;

        if before_total != after_total {
            error!(
                sender = sender,
                receiver = receiver,
                before_total = %before_total,
                after_total = %after_total,
                "INTEGRITY VIOLATION: conservation check failed, aborting transaction"
            );
            return Err(LedgerError::IntegrityViolation {
                sender,
                receiver,
                before_total,
                after_total,
            });
        }
        Ok(())
    }

    /// Re-read both balances inside the transaction (post-mutation view)
    pub async fn read_balances(
        &self,
        conn: &mut PgConnection,
        sender: UserId,
        receiver: UserId,
    ) -> Result<(Points, Points), LedgerError> {
        let sender_balance = self
            .read_balance(conn, sender)
            .await?
            .ok_or(LedgerError::AccountNotFound(sender))?;
        let receiver_balance = self
            .read_balance(conn, receiver)
            .await?
            .ok_or(LedgerError::AccountNotFound(receiver))?;
        Ok((sender_balance, receiver_balance))
    }

    /// Persist a ledger entry on the caller's transaction
    pub async fn insert_entry(
        &self,
        conn: &mut PgConnection,
        entry: &LedgerEntry,
    ) -> Result<(), LedgerError> {
        sqlx::query(
            r#"
            INSERT INTO ledger_entries_tb
                (entry_id, entry_type, amount, status, sender_id, receiver_id,
                 sender_before, sender_after, receiver_before, receiver_after,
                 idempotency_key, integrity_hash, processed_by, processed_at, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
            "#,
        )
        .bind(entry.entry_id.to_string())
        .bind(entry.entry_type.id())
        .bind(entry.amount as i64)
        .bind(entry.status.id())
        .bind(entry.sender_id.map(|u| u as i64))
        .bind(entry.receiver_id.map(|u| u as i64))
        .bind(entry.balances.sender_before.map(|b| b as i64))
        .bind(entry.balances.sender_after.map(|b| b as i64))
        .bind(entry.balances.receiver_before.map(|b| b as i64))
        .bind(entry.balances.receiver_after.map(|b| b as i64))
        .bind(&entry.idempotency_key)
        .bind(&entry.integrity_hash)
        .bind(entry.processed_by.map(|a| a as i64))
        .bind(entry.processed_at)
        .bind(entry.created_at)
        .execute(&mut *conn)
        .await?;

        Ok(())
    }

    /// Get an entry by id
    pub async fn get_entry(&self, entry_id: EntryId) -> Result<LedgerEntry, LedgerError> {
        let row = sqlx::query(
            r#"
            SELECT entry_id, entry_type, amount, status, sender_id, receiver_id,
                   sender_before, sender_after, receiver_before, receiver_after,
                   idempotency_key, integrity_hash, processed_by, processed_at, created_at
            FROM ledger_entries_tb
            WHERE entry_id = $1
            "#,
        )
        .bind(entry_id.to_string())
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| LedgerError::EntryNotFound(entry_id.to_string()))?;

        row_to_entry(&row)
    }

    /// Advance a pending deposit/withdraw request, annotating the processing
    /// admin. CAS on `status = PENDING`; returns false when the request was
    /// already processed (or never existed).
    pub async fn process_pending_request(
        &self,
        conn: &mut PgConnection,
        entry_id: EntryId,
        admin: AdminId,
        new_status: EntryStatus,
    ) -> Result<bool, LedgerError> {
        let result = sqlx::query(
            r#"
            UPDATE ledger_entries_tb
            SET status = $1, processed_by = $2, processed_at = NOW()
            WHERE entry_id = $3 AND status = $4
            "#,
        )
        .bind(new_status.id())
        .bind(admin as i64)
        .bind(entry_id.to_string())
        .bind(EntryStatus::Pending.id())
        .execute(&mut *conn)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Assert an account exists (and is not disabled) inside the caller's
    /// transaction, before any mutation touches it.
    pub async fn require_account(
        &self,
        conn: &mut PgConnection,
        user_id: UserId,
    ) -> Result<(), LedgerError> {
        match self.read_status(conn, user_id).await? {
            None => Err(LedgerError::AccountNotFound(user_id)),
            Some(AccountStatus::Disabled) => Err(LedgerError::AccountDisabled(user_id)),
            Some(_) => Ok(()),
        }
    }

    async fn read_balance(
        &self,
        conn: &mut PgConnection,
        user_id: UserId,
    ) -> Result<Option<Points>, LedgerError> {
        let row = sqlx::query("SELECT balance FROM accounts_tb WHERE user_id = $1")
            .bind(user_id as i64)
            .fetch_optional(&mut *conn)
            .await?;
        Ok(row.map(|r| r.get::<i64, _>("balance") as Points))
    }

    async fn read_status(
        &self,
        conn: &mut PgConnection,
        user_id: UserId,
    ) -> Result<Option<AccountStatus>, LedgerError> {
        let row = sqlx::query("SELECT status FROM accounts_tb WHERE user_id = $1")
            .bind(user_id as i64)
            .fetch_optional(&mut *conn)
            .await?;
        Ok(row.and_then(|r| AccountStatus::from_id(r.get::<i16, _>("status"))))
    }

    async fn explain_debit_failure(
        &self,
        conn: &mut PgConnection,
        user_id: UserId,
        amount: Points,
    ) -> Result<LedgerError, LedgerError> {
        let row = sqlx::query("SELECT balance, status FROM accounts_tb WHERE user_id = $1")
            .bind(user_id as i64)
            .fetch_optional(&mut *conn)
            .await?;

        Ok(match row {
            None => LedgerError::AccountNotFound(user_id),
            Some(row) => {
                let available = row.get::<i64, _>("balance") as Points;
                match AccountStatus::from_id(row.get::<i16, _>("status")) {
                    Some(AccountStatus::Frozen) => LedgerError::AccountFrozen(user_id),
                    Some(AccountStatus::Disabled) => LedgerError::AccountDisabled(user_id),
                    _ => LedgerError::InsufficientFunds {
                        account: user_id,
                        needed: amount,
                        available,
                    },
                }
            }
        })
    }
}

fn row_to_entry(row: &sqlx::postgres::PgRow) -> Result<LedgerEntry, LedgerError> {
    use super::entry::EntryType;

    let entry_id_str: String = row.get("entry_id");
    let entry_id: EntryId = entry_id_str
        .parse()
        .map_err(|_| LedgerError::EntryNotFound(entry_id_str.clone()))?;

    let entry_type = EntryType::from_id(row.get::<i16, _>("entry_type"))
        .ok_or_else(|| LedgerError::EntryNotFound(entry_id_str.clone()))?;
    let status = EntryStatus::from_id(row.get::<i16, _>("status"))
        .ok_or_else(|| LedgerError::EntryNotFound(entry_id_str))?;

    Ok(LedgerEntry {
        entry_id,
        entry_type,
        amount: row.get::<i64, _>("amount") as Points,
        status,
        sender_id: row.get::<Option<i64>, _>("sender_id").map(|u| u as UserId),
        receiver_id: row
            .get::<Option<i64>, _>("receiver_id")
            .map(|u| u as UserId),
        balances: PartyBalances {
            sender_before: row
                .get::<Option<i64>, _>("sender_before")
                .map(|b| b as Points),
            sender_after: row
                .get::<Option<i64>, _>("sender_after")
                .map(|b| b as Points),
            receiver_before: row
                .get::<Option<i64>, _>("receiver_before")
                .map(|b| b as Points),
            receiver_after: row
                .get::<Option<i64>, _>("receiver_after")
                .map(|b| b as Points),
        },
        idempotency_key: row.get("idempotency_key"),
        integrity_hash: row.get("integrity_hash"),
        processed_by: row
            .get::<Option<i64>, _>("processed_by")
            .map(|a| a as AdminId),
        processed_at: row.get("processed_at"),
        created_at: row.get("created_at"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> LedgerStore {
        // Conservation check is pure; a lazy pool that never connects is fine.
        LedgerStore::new(PgPool::connect_lazy("postgres://localhost/unused").unwrap())
    }

    #[tokio::test]
    async fn test_conservation_check_passes() {
        let store = store();
        let sender = BalancePair {
            before: 1000,
            after: 500,
        };
        let receiver = BalancePair {
            before: 200,
            after: 700,
        };
        assert!(store.conservation_check(1, 2, sender, receiver).is_ok());
    }

    #[tokio::test]
    async fn test_conservation_check_detects_leak() {
        let store = store();
        let sender = BalancePair {
            before: 1000,
            after: 500,
        };
        let receiver = BalancePair {
            before: 200,
            after: 600, // 100 points vanished
        };
        let err = store
            .conservation_check(1, 2, sender, receiver)
            .unwrap_err();
        assert!(matches!(err, LedgerError::IntegrityViolation { .. }));
        assert!(err.is_fatal());
    }

    #[tokio::test]
    async fn test_conservation_check_no_overflow_at_extremes() {
        let store = store();
        let sender = BalancePair {
            before: u64::MAX,
            after: u64::MAX - 1,
        };
        let receiver = BalancePair {
            before: u64::MAX - 1,
            after: u64::MAX,
        };
        assert!(store.conservation_check(1, 2, sender, receiver).is_ok());
    }
}
