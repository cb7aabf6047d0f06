use std::collections::BTreeSet;
use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use uuid::Uuid;

use gatewarden_application::{WhitelistEntryQuery, WhitelistRepository};
use gatewarden_core::{AppError, AppResult};
use gatewarden_domain::{
    AccessPointId, EventId, PersonId, Recurrence, WhitelistEntry, WhitelistEntryId,
    WhitelistEntryInput,
};

const PAIR_LOCK_NAMESPACE: i32 = 0x6741_7465; // "gAte"

/// PostgreSQL-backed repository for whitelist entries.
///
/// Writes serialize on a transaction-scoped advisory lock keyed by the
/// (person, access point) pair and re-check the contradiction predicate
/// against the committed siblings before touching rows, which closes the
/// check-then-act window between service-level validation and the write.
#[derive(Clone)]
pub struct PostgresWhitelistRepository {
    pool: PgPool,
}

impl PostgresWhitelistRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct WhitelistEntryRow {
    id: Uuid,
    person_id: Uuid,
    access_point_id: Uuid,
    event_id: Option<Uuid>,
    is_allowed: bool,
    valid_from: Option<NaiveDate>,
    valid_until: Option<NaiveDate>,
    start_time: Option<NaiveTime>,
    end_time: Option<NaiveTime>,
    recurrence: String,
    recurrence_days: Vec<i16>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

const ENTRY_COLUMNS: &str = r#"
    id,
    person_id,
    access_point_id,
    event_id,
    is_allowed,
    valid_from,
    valid_until,
    start_time,
    end_time,
    recurrence,
    recurrence_days,
    created_at,
    updated_at
"#;

fn entry_from_row(row: WhitelistEntryRow) -> AppResult<WhitelistEntry> {
    let recurrence_days = row
        .recurrence_days
        .into_iter()
        .map(|day| {
            u8::try_from(day).map_err(|_| {
                AppError::Internal(format!(
                    "stored recurrence day '{day}' is outside the weekday range"
                ))
            })
        })
        .collect::<AppResult<BTreeSet<u8>>>()?;

    let input = WhitelistEntryInput {
        person_id: PersonId::from_uuid(row.person_id),
        access_point_id: AccessPointId::from_uuid(row.access_point_id),
        event_id: row.event_id.map(EventId::from_uuid),
        is_allowed: row.is_allowed,
        valid_from: row.valid_from,
        valid_until: row.valid_until,
        start_time: row.start_time,
        end_time: row.end_time,
        recurrence: Recurrence::from_str(row.recurrence.as_str())?,
        recurrence_days,
    };

    WhitelistEntry::restore(
        WhitelistEntryId::from_uuid(row.id),
        input,
        row.created_at,
        row.updated_at,
    )
}

fn recurrence_days_column(entry: &WhitelistEntry) -> Vec<i16> {
    entry
        .recurrence_days()
        .iter()
        .map(|day| i16::from(*day))
        .collect()
}

fn lock_key(value: Uuid) -> i32 {
    let bytes = value.as_bytes();
    i32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
}

fn is_unique_violation(error: &sqlx::Error) -> bool {
    error
        .as_database_error()
        .and_then(|database_error| database_error.code())
        .is_some_and(|code| code == "23505")
}

async fn lock_pair(
    transaction: &mut Transaction<'_, Postgres>,
    person_id: PersonId,
    access_point_id: AccessPointId,
) -> AppResult<()> {
    sqlx::query("SELECT pg_advisory_xact_lock($1, $2 # $3)")
        .bind(PAIR_LOCK_NAMESPACE)
        .bind(lock_key(person_id.as_uuid()))
        .bind(lock_key(access_point_id.as_uuid()))
        .execute(&mut **transaction)
        .await
        .map_err(|error| {
            AppError::Internal(format!(
                "failed to lock whitelist pair ({person_id}, {access_point_id}): {error}"
            ))
        })?;

    Ok(())
}

async fn fetch_pair_locked(
    transaction: &mut Transaction<'_, Postgres>,
    person_id: PersonId,
    access_point_id: AccessPointId,
) -> AppResult<Vec<WhitelistEntry>> {
    let rows = sqlx::query_as::<_, WhitelistEntryRow>(&format!(
        "SELECT {ENTRY_COLUMNS} FROM whitelist_entries WHERE person_id = $1 AND access_point_id = $2"
    ))
    .bind(person_id.as_uuid())
    .bind(access_point_id.as_uuid())
    .fetch_all(&mut **transaction)
    .await
    .map_err(|error| {
        AppError::Internal(format!(
            "failed to list whitelist entries for pair ({person_id}, {access_point_id}): {error}"
        ))
    })?;

    rows.into_iter().map(entry_from_row).collect()
}

/// Re-runs the contradiction predicate against committed siblings inside
/// the write transaction, after the pair lock is held.
fn check_siblings(
    entry: &WhitelistEntry,
    siblings: &[WhitelistEntry],
    replaced: Option<WhitelistEntryId>,
) -> AppResult<()> {
    let contradicted = siblings
        .iter()
        .filter(|sibling| Some(sibling.id()) != replaced)
        .any(|sibling| entry.contradicts(sibling));

    if contradicted {
        return Err(AppError::Conflict(
            "a contradictory authorization was written concurrently for this person and access point"
                .to_owned(),
        ));
    }

    Ok(())
}

async fn upsert_in_transaction(
    transaction: &mut Transaction<'_, Postgres>,
    entry: &WhitelistEntry,
) -> AppResult<()> {
    sqlx::query(
        r#"
        INSERT INTO whitelist_entries (
            id,
            person_id,
            access_point_id,
            event_id,
            is_allowed,
            valid_from,
            valid_until,
            start_time,
            end_time,
            recurrence,
            recurrence_days,
            created_at,
            updated_at
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
        ON CONFLICT (person_id, access_point_id, event_id)
        DO UPDATE
        SET
            is_allowed = EXCLUDED.is_allowed,
            valid_from = EXCLUDED.valid_from,
            valid_until = EXCLUDED.valid_until,
            start_time = EXCLUDED.start_time,
            end_time = EXCLUDED.end_time,
            recurrence = EXCLUDED.recurrence,
            recurrence_days = EXCLUDED.recurrence_days,
            updated_at = EXCLUDED.updated_at
        "#,
    )
    .bind(entry.id().as_uuid())
    .bind(entry.person_id().as_uuid())
    .bind(entry.access_point_id().as_uuid())
    .bind(entry.event_id().map(|event_id| event_id.as_uuid()))
    .bind(entry.is_allowed())
    .bind(entry.valid_from())
    .bind(entry.valid_until())
    .bind(entry.time_window().map(|window| window.start()))
    .bind(entry.time_window().map(|window| window.end()))
    .bind(entry.recurrence().as_str())
    .bind(recurrence_days_column(entry))
    .bind(entry.created_at())
    .bind(entry.updated_at())
    .execute(&mut **transaction)
    .await
    .map_err(|error| {
        AppError::Internal(format!(
            "failed to upsert whitelist entry '{}': {error}",
            entry.id()
        ))
    })?;

    Ok(())
}

#[async_trait]
impl WhitelistRepository for PostgresWhitelistRepository {
    async fn find_entry(&self, id: WhitelistEntryId) -> AppResult<Option<WhitelistEntry>> {
        let row = sqlx::query_as::<_, WhitelistEntryRow>(&format!(
            "SELECT {ENTRY_COLUMNS} FROM whitelist_entries WHERE id = $1"
        ))
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to find whitelist entry '{id}': {error}"))
        })?;

        row.map(entry_from_row).transpose()
    }

    async fn find_by_key(
        &self,
        person_id: PersonId,
        access_point_id: AccessPointId,
        event_id: Option<EventId>,
    ) -> AppResult<Option<WhitelistEntry>> {
        let row = sqlx::query_as::<_, WhitelistEntryRow>(&format!(
            r#"
            SELECT {ENTRY_COLUMNS}
            FROM whitelist_entries
            WHERE person_id = $1
                AND access_point_id = $2
                AND event_id IS NOT DISTINCT FROM $3
            "#
        ))
        .bind(person_id.as_uuid())
        .bind(access_point_id.as_uuid())
        .bind(event_id.map(|event_id| event_id.as_uuid()))
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!(
                "failed to find whitelist entry by key ({person_id}, {access_point_id}): {error}"
            ))
        })?;

        row.map(entry_from_row).transpose()
    }

    async fn list_for_pair(
        &self,
        person_id: PersonId,
        access_point_id: AccessPointId,
    ) -> AppResult<Vec<WhitelistEntry>> {
        let rows = sqlx::query_as::<_, WhitelistEntryRow>(&format!(
            r#"
            SELECT {ENTRY_COLUMNS}
            FROM whitelist_entries
            WHERE person_id = $1 AND access_point_id = $2
            ORDER BY created_at
            "#
        ))
        .bind(person_id.as_uuid())
        .bind(access_point_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!(
                "failed to list whitelist entries for pair ({person_id}, {access_point_id}): {error}"
            ))
        })?;

        rows.into_iter().map(entry_from_row).collect()
    }

    async fn list_entries(&self, query: WhitelistEntryQuery) -> AppResult<Vec<WhitelistEntry>> {
        let rows = sqlx::query_as::<_, WhitelistEntryRow>(&format!(
            r#"
            SELECT {ENTRY_COLUMNS}
            FROM whitelist_entries
            WHERE ($1::uuid IS NULL OR person_id = $1)
                AND ($2::uuid IS NULL OR access_point_id = $2)
            ORDER BY created_at DESC
            "#
        ))
        .bind(query.person_id.map(|person_id| person_id.as_uuid()))
        .bind(
            query
                .access_point_id
                .map(|access_point_id| access_point_id.as_uuid()),
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to list whitelist entries: {error}"))
        })?;

        rows.into_iter().map(entry_from_row).collect()
    }

    async fn insert_entry(&self, entry: &WhitelistEntry) -> AppResult<()> {
        let mut transaction = self.pool.begin().await.map_err(|error| {
            AppError::Internal(format!(
                "failed to start whitelist insert transaction: {error}"
            ))
        })?;

        lock_pair(&mut transaction, entry.person_id(), entry.access_point_id()).await?;
        let siblings =
            fetch_pair_locked(&mut transaction, entry.person_id(), entry.access_point_id()).await?;
        check_siblings(entry, &siblings, None)?;

        let inserted = sqlx::query(
            r#"
            INSERT INTO whitelist_entries (
                id,
                person_id,
                access_point_id,
                event_id,
                is_allowed,
                valid_from,
                valid_until,
                start_time,
                end_time,
                recurrence,
                recurrence_days,
                created_at,
                updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            "#,
        )
        .bind(entry.id().as_uuid())
        .bind(entry.person_id().as_uuid())
        .bind(entry.access_point_id().as_uuid())
        .bind(entry.event_id().map(|event_id| event_id.as_uuid()))
        .bind(entry.is_allowed())
        .bind(entry.valid_from())
        .bind(entry.valid_until())
        .bind(entry.time_window().map(|window| window.start()))
        .bind(entry.time_window().map(|window| window.end()))
        .bind(entry.recurrence().as_str())
        .bind(recurrence_days_column(entry))
        .bind(entry.created_at())
        .bind(entry.updated_at())
        .execute(&mut *transaction)
        .await;

        if let Err(error) = inserted {
            if is_unique_violation(&error) {
                return Err(AppError::Conflict(
                    "an entry for this person, access point and event already exists".to_owned(),
                ));
            }

            return Err(AppError::Internal(format!(
                "failed to insert whitelist entry '{}': {error}",
                entry.id()
            )));
        }

        transaction.commit().await.map_err(|error| {
            AppError::Internal(format!(
                "failed to commit whitelist insert transaction: {error}"
            ))
        })
    }

    async fn update_entry(&self, entry: &WhitelistEntry) -> AppResult<()> {
        let mut transaction = self.pool.begin().await.map_err(|error| {
            AppError::Internal(format!(
                "failed to start whitelist update transaction: {error}"
            ))
        })?;

        lock_pair(&mut transaction, entry.person_id(), entry.access_point_id()).await?;
        let siblings =
            fetch_pair_locked(&mut transaction, entry.person_id(), entry.access_point_id()).await?;
        check_siblings(entry, &siblings, Some(entry.id()))?;

        let updated = sqlx::query(
            r#"
            UPDATE whitelist_entries
            SET
                person_id = $2,
                access_point_id = $3,
                event_id = $4,
                is_allowed = $5,
                valid_from = $6,
                valid_until = $7,
                start_time = $8,
                end_time = $9,
                recurrence = $10,
                recurrence_days = $11,
                updated_at = $12
            WHERE id = $1
            "#,
        )
        .bind(entry.id().as_uuid())
        .bind(entry.person_id().as_uuid())
        .bind(entry.access_point_id().as_uuid())
        .bind(entry.event_id().map(|event_id| event_id.as_uuid()))
        .bind(entry.is_allowed())
        .bind(entry.valid_from())
        .bind(entry.valid_until())
        .bind(entry.time_window().map(|window| window.start()))
        .bind(entry.time_window().map(|window| window.end()))
        .bind(entry.recurrence().as_str())
        .bind(recurrence_days_column(entry))
        .bind(entry.updated_at())
        .execute(&mut *transaction)
        .await;

        let updated = match updated {
            Ok(result) => result,
            Err(error) if is_unique_violation(&error) => {
                return Err(AppError::Conflict(
                    "an entry for this person, access point and event already exists".to_owned(),
                ));
            }
            Err(error) => {
                return Err(AppError::Internal(format!(
                    "failed to update whitelist entry '{}': {error}",
                    entry.id()
                )));
            }
        };

        if updated.rows_affected() == 0 {
            return Err(AppError::NotFound(format!(
                "whitelist entry '{}' does not exist",
                entry.id()
            )));
        }

        transaction.commit().await.map_err(|error| {
            AppError::Internal(format!(
                "failed to commit whitelist update transaction: {error}"
            ))
        })
    }

    async fn save_batch(&self, entries: &[WhitelistEntry]) -> AppResult<()> {
        if entries.is_empty() {
            return Ok(());
        }

        let mut transaction = self.pool.begin().await.map_err(|error| {
            AppError::Internal(format!(
                "failed to start whitelist batch transaction: {error}"
            ))
        })?;

        // Acquire pair locks in a stable order so concurrent batches cannot
        // deadlock each other.
        let mut ordered: Vec<&WhitelistEntry> = entries.iter().collect();
        ordered.sort_by_key(|entry| (entry.person_id(), entry.access_point_id()));

        for entry in &ordered {
            lock_pair(&mut transaction, entry.person_id(), entry.access_point_id()).await?;
        }

        for entry in ordered {
            let siblings =
                fetch_pair_locked(&mut transaction, entry.person_id(), entry.access_point_id())
                    .await?;
            let replaced = siblings
                .iter()
                .find(|sibling| sibling.event_id() == entry.event_id())
                .map(WhitelistEntry::id);
            check_siblings(entry, &siblings, replaced)?;
            upsert_in_transaction(&mut transaction, entry).await?;
        }

        transaction.commit().await.map_err(|error| {
            AppError::Internal(format!(
                "failed to commit whitelist batch transaction: {error}"
            ))
        })
    }

    async fn delete_entry(&self, id: WhitelistEntryId) -> AppResult<()> {
        let deleted = sqlx::query("DELETE FROM whitelist_entries WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(|error| {
                AppError::Internal(format!("failed to delete whitelist entry '{id}': {error}"))
            })?;

        if deleted.rows_affected() == 0 {
            return Err(AppError::NotFound(format!(
                "whitelist entry '{id}' does not exist"
            )));
        }

        Ok(())
    }
}
