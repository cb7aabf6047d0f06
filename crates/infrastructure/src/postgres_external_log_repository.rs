use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};

use gatewarden_application::ExternalAccessLogRepository;
use gatewarden_core::{AppError, AppResult};
use gatewarden_domain::ExternalAccessLogEntry;

/// PostgreSQL-backed storage for locally synced movement rows.
#[derive(Clone)]
pub struct PostgresExternalAccessLogRepository {
    pool: PgPool,
}

impl PostgresExternalAccessLogRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct ExternalAccessLogRow {
    external_id: i64,
    movement_type: String,
    origin: String,
    card_id: String,
    client_id: Option<i64>,
    recorded_at: DateTime<Utc>,
    result: String,
    controller_id: Option<i64>,
    access_id: Option<i64>,
    observation: String,
    record_kind: String,
    reason_code: Option<i64>,
    pass_allowed_flag: String,
    pass_allowed_at: Option<DateTime<Utc>>,
    pass_allowed_controller_id: Option<i64>,
    synced_at: DateTime<Utc>,
}

impl From<ExternalAccessLogRow> for ExternalAccessLogEntry {
    fn from(row: ExternalAccessLogRow) -> Self {
        Self {
            external_id: row.external_id,
            movement_type: row.movement_type,
            origin: row.origin,
            card_id: row.card_id,
            client_id: row.client_id,
            recorded_at: row.recorded_at,
            result: row.result,
            controller_id: row.controller_id,
            access_id: row.access_id,
            observation: row.observation,
            record_kind: row.record_kind,
            reason_code: row.reason_code,
            pass_allowed_flag: row.pass_allowed_flag,
            pass_allowed_at: row.pass_allowed_at,
            pass_allowed_controller_id: row.pass_allowed_controller_id,
            synced_at: row.synced_at,
        }
    }
}

#[async_trait]
impl ExternalAccessLogRepository for PostgresExternalAccessLogRepository {
    async fn upsert_entries(&self, entries: &[ExternalAccessLogEntry]) -> AppResult<()> {
        if entries.is_empty() {
            return Ok(());
        }

        let mut transaction = self.pool.begin().await.map_err(|error| {
            AppError::Internal(format!(
                "failed to start external log upsert transaction: {error}"
            ))
        })?;

        for entry in entries {
            sqlx::query(
                r#"
                INSERT INTO external_access_log_entries (
                    external_id,
                    movement_type,
                    origin,
                    card_id,
                    client_id,
                    recorded_at,
                    result,
                    controller_id,
                    access_id,
                    observation,
                    record_kind,
                    reason_code,
                    pass_allowed_flag,
                    pass_allowed_at,
                    pass_allowed_controller_id,
                    synced_at
                )
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)
                ON CONFLICT (external_id)
                DO UPDATE
                SET
                    movement_type = EXCLUDED.movement_type,
                    origin = EXCLUDED.origin,
                    card_id = EXCLUDED.card_id,
                    client_id = EXCLUDED.client_id,
                    recorded_at = EXCLUDED.recorded_at,
                    result = EXCLUDED.result,
                    controller_id = EXCLUDED.controller_id,
                    access_id = EXCLUDED.access_id,
                    observation = EXCLUDED.observation,
                    record_kind = EXCLUDED.record_kind,
                    reason_code = EXCLUDED.reason_code,
                    pass_allowed_flag = EXCLUDED.pass_allowed_flag,
                    pass_allowed_at = EXCLUDED.pass_allowed_at,
                    pass_allowed_controller_id = EXCLUDED.pass_allowed_controller_id,
                    synced_at = EXCLUDED.synced_at
                "#,
            )
            .bind(entry.external_id)
            .bind(entry.movement_type.as_str())
            .bind(entry.origin.as_str())
            .bind(entry.card_id.as_str())
            .bind(entry.client_id)
            .bind(entry.recorded_at)
            .bind(entry.result.as_str())
            .bind(entry.controller_id)
            .bind(entry.access_id)
            .bind(entry.observation.as_str())
            .bind(entry.record_kind.as_str())
            .bind(entry.reason_code)
            .bind(entry.pass_allowed_flag.as_str())
            .bind(entry.pass_allowed_at)
            .bind(entry.pass_allowed_controller_id)
            .bind(entry.synced_at)
            .execute(&mut *transaction)
            .await
            .map_err(|error| {
                AppError::Internal(format!(
                    "failed to upsert external log entry '{}': {error}",
                    entry.external_id
                ))
            })?;
        }

        transaction.commit().await.map_err(|error| {
            AppError::Internal(format!(
                "failed to commit external log upsert transaction: {error}"
            ))
        })
    }

    async fn list_recent(&self, limit: Option<i64>) -> AppResult<Vec<ExternalAccessLogEntry>> {
        let rows = sqlx::query_as::<_, ExternalAccessLogRow>(
            r#"
            SELECT
                external_id,
                movement_type,
                origin,
                card_id,
                client_id,
                recorded_at,
                result,
                controller_id,
                access_id,
                observation,
                record_kind,
                reason_code,
                pass_allowed_flag,
                pass_allowed_at,
                pass_allowed_controller_id,
                synced_at
            FROM external_access_log_entries
            ORDER BY recorded_at DESC, external_id DESC
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to list external log entries: {error}"))
        })?;

        Ok(rows.into_iter().map(ExternalAccessLogEntry::from).collect())
    }
}
