//! Repository layer for account reads

use super::models::{Account, AccountStatus};
use crate::core_types::{Points, UserId};
use sqlx::{PgPool, Row};

/// Account repository for read operations
pub struct AccountRepository;

impl AccountRepository {
    /// Get account by user id
    pub async fn get(pool: &PgPool, user_id: UserId) -> Result<Option<Account>, sqlx::Error> {
        let row = sqlx::query(
            r#"SELECT user_id, balance, status, version, created_at, updated_at
               FROM accounts_tb WHERE user_id = $1"#,
        )
        .bind(user_id as i64)
        .fetch_optional(pool)
        .await?;

        Ok(row.map(|r| Account {
            user_id: r.get::<i64, _>("user_id") as UserId,
            balance: r.get::<i64, _>("balance") as Points,
            status: AccountStatus::from_id(r.get::<i16, _>("status"))
                .unwrap_or(AccountStatus::Disabled),
            version: r.get("version"),
            created_at: r.get("created_at"),
            updated_at: r.get("updated_at"),
        }))
    }

    /// Create a new account with an opening balance
    pub async fn create(
        pool: &PgPool,
        user_id: UserId,
        opening_balance: Points,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"INSERT INTO accounts_tb (user_id, balance, status) VALUES ($1, $2, $3)"#,
        )
        .bind(user_id as i64)
        .bind(opening_balance as i64)
        .bind(AccountStatus::Active.id())
        .execute(pool)
        .await?;

        Ok(())
    }

    /// Set account status (admin freeze/unfreeze/disable)
    pub async fn set_status(
        pool: &PgPool,
        user_id: UserId,
        status: AccountStatus,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"UPDATE accounts_tb SET status = $1, updated_at = NOW() WHERE user_id = $2"#,
        )
        .bind(status.id())
        .bind(user_id as i64)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
