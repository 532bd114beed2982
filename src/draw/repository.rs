//! Draw result persistence

use sqlx::{PgPool, Row};

use super::error::DrawError;
use super::model::{DrawResult, ProvinceResult};
use crate::core_types::DrawId;

/// Repository for `results_tb`
pub struct DrawRepository;

impl DrawRepository {
    /// Persist a validated result
    pub async fn insert(pool: &PgPool, result: &DrawResult) -> Result<(), DrawError> {
        let provinces = serde_json::to_value(&result.provinces)?;

        sqlx::query(
            r#"
            INSERT INTO results_tb (result_id, draw_date, region, provinces, settled, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(result.result_id.to_string())
        .bind(result.draw_date)
        .bind(&result.region)
        .bind(provinces)
        .bind(result.settled)
        .bind(result.created_at)
        .execute(pool)
        .await?;

        Ok(())
    }

    /// Get a result by id
    pub async fn get(pool: &PgPool, result_id: DrawId) -> Result<DrawResult, DrawError> {
        let row = sqlx::query(
            r#"
            SELECT result_id, draw_date, region, provinces, settled, created_at
            FROM results_tb
            WHERE result_id = $1
            "#,
        )
        .bind(result_id.to_string())
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| DrawError::ResultNotFound(result_id.to_string()))?;

        let provinces: Vec<ProvinceResult> =
            serde_json::from_value(row.get::<serde_json::Value, _>("provinces"))?;

        Ok(DrawResult {
            result_id,
            draw_date: row.get("draw_date"),
            region: row.get("region"),
            provinces,
            settled: row.get("settled"),
            created_at: row.get("created_at"),
        })
    }

    /// CAS the settled flag; returns false when it already had that value
    pub async fn set_settled(
        conn: &mut sqlx::PgConnection,
        result_id: DrawId,
        settled: bool,
    ) -> Result<bool, DrawError> {
        let result = sqlx::query(
            "UPDATE results_tb SET settled = $1 WHERE result_id = $2 AND settled = $3",
        )
        .bind(settled)
        .bind(result_id.to_string())
        .bind(!settled)
        .execute(conn)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Delete a result row. Callers must have reversed settlement first.
    pub async fn delete(conn: &mut sqlx::PgConnection, result_id: DrawId) -> Result<bool, DrawError> {
        let result = sqlx::query("DELETE FROM results_tb WHERE result_id = $1")
            .bind(result_id.to_string())
            .execute(conn)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
