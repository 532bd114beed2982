//! Ledger database schema
//!
//! Table definitions and startup provisioning for the core stores.
//! All balance mutations rely on the `balance >= 0` CHECK as a last line of
//! defense; the conditional updates in `ledger::LedgerStore` are the first.

use anyhow::Result;
use sqlx::PgPool;

const CREATE_ACCOUNTS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS accounts_tb (
    user_id     BIGINT PRIMARY KEY,
    balance     BIGINT NOT NULL DEFAULT 0 CHECK (balance >= 0),
    status      SMALLINT NOT NULL DEFAULT 1,
    version     BIGINT NOT NULL DEFAULT 1,
    created_at  TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at  TIMESTAMPTZ NOT NULL DEFAULT NOW()
)
"#;

const CREATE_LEDGER_ENTRIES_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS ledger_entries_tb (
    entry_id        TEXT PRIMARY KEY,
    entry_type      SMALLINT NOT NULL,
    amount          BIGINT NOT NULL CHECK (amount > 0),
    status          SMALLINT NOT NULL,
    sender_id       BIGINT,
    receiver_id     BIGINT,
    sender_before   BIGINT,
    sender_after    BIGINT,
    receiver_before BIGINT,
    receiver_after  BIGINT,
    idempotency_key TEXT UNIQUE,
    integrity_hash  TEXT NOT NULL,
    processed_by    BIGINT,
    processed_at    TIMESTAMPTZ,
    created_at      TIMESTAMPTZ NOT NULL DEFAULT NOW()
)
"#;

const CREATE_BETS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS bets_tb (
    bet_id          TEXT PRIMARY KEY,
    user_id         BIGINT NOT NULL,
    numbers         TEXT NOT NULL,
    category        SMALLINT NOT NULL,
    amount          BIGINT NOT NULL CHECK (amount > 0),
    province_code   TEXT,
    status          SMALLINT NOT NULL DEFAULT 0,
    win_amount      BIGINT NOT NULL DEFAULT 0,
    payment_status  SMALLINT NOT NULL DEFAULT 0,
    approved_by     BIGINT,
    approved_at     TIMESTAMPTZ,
    approval_note   TEXT,
    confirmed_by    BIGINT,
    confirmed_at    TIMESTAMPTZ,
    result_id       TEXT,
    integrity_hash  TEXT NOT NULL,
    created_at      TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at      TIMESTAMPTZ NOT NULL DEFAULT NOW()
)
"#;

const CREATE_BETS_PENDING_INDEX: &str = r#"
CREATE INDEX IF NOT EXISTS bets_pending_idx ON bets_tb (status) WHERE status = 0
"#;

const CREATE_RESULTS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS results_tb (
    result_id   TEXT PRIMARY KEY,
    draw_date   DATE NOT NULL,
    region      TEXT NOT NULL,
    provinces   JSONB NOT NULL,
    settled     BOOLEAN NOT NULL DEFAULT FALSE,
    created_at  TIMESTAMPTZ NOT NULL DEFAULT NOW()
)
"#;

const CREATE_PAYOUT_REQUESTS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS payout_requests_tb (
    request_id   TEXT PRIMARY KEY,
    bet_ids      JSONB NOT NULL,
    status       SMALLINT NOT NULL DEFAULT 0,
    processed_by BIGINT,
    processed_at TIMESTAMPTZ,
    note         TEXT,
    created_at   TIMESTAMPTZ NOT NULL DEFAULT NOW()
)
"#;

const CREATE_IDEMPOTENCY_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS idempotency_tb (
    idem_key        TEXT PRIMARY KEY,
    locked          BOOLEAN NOT NULL DEFAULT TRUE,
    lock_expires_at TIMESTAMPTZ NOT NULL,
    outcome         JSONB,
    created_at      TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at      TIMESTAMPTZ NOT NULL DEFAULT NOW()
)
"#;

/// Provision all core tables. Idempotent; runs at service startup.
pub async fn ensure_schema(pool: &PgPool) -> Result<()> {
    tracing::info!("Ensuring ledger schema...");

    sqlx::query(CREATE_ACCOUNTS_TABLE)
        .execute(pool)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to create accounts table: {}", e))?;

    sqlx::query(CREATE_LEDGER_ENTRIES_TABLE)
        .execute(pool)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to create ledger entries table: {}", e))?;

    sqlx::query(CREATE_BETS_TABLE)
        .execute(pool)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to create bets table: {}", e))?;

    sqlx::query(CREATE_BETS_PENDING_INDEX)
        .execute(pool)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to create pending bets index: {}", e))?;

    sqlx::query(CREATE_RESULTS_TABLE)
        .execute(pool)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to create results table: {}", e))?;

    sqlx::query(CREATE_PAYOUT_REQUESTS_TABLE)
        .execute(pool)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to create payout requests table: {}", e))?;

    sqlx::query(CREATE_IDEMPOTENCY_TABLE)
        .execute(pool)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to create idempotency table: {}", e))?;

    tracing::info!("Ledger schema ready");
    Ok(())
}
