use std::str::FromStr;

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use gatewarden_application::EventRepository;
use gatewarden_core::{AppError, AppResult};
use gatewarden_domain::{Event, EventId, GuestType, PersonType, SiteId};

/// PostgreSQL-backed read model over the event calendar.
#[derive(Clone)]
pub struct PostgresEventRepository {
    pool: PgPool,
}

impl PostgresEventRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct EventRow {
    id: Uuid,
    site_id: Uuid,
    name: String,
    start_date: NaiveDate,
    end_date: NaiveDate,
    start_time: NaiveTime,
    end_time: NaiveTime,
    allowed_person_types: Vec<String>,
    allowed_guest_types: Vec<String>,
}

fn event_from_row(row: EventRow) -> AppResult<Event> {
    let allowed_person_types = row
        .allowed_person_types
        .iter()
        .map(|value| PersonType::from_str(value))
        .collect::<AppResult<Vec<_>>>()?;
    let allowed_guest_types = row
        .allowed_guest_types
        .iter()
        .map(|value| GuestType::from_str(value))
        .collect::<AppResult<Vec<_>>>()?;

    Event::new(
        EventId::from_uuid(row.id),
        SiteId::from_uuid(row.site_id),
        row.name,
        row.start_date,
        row.end_date,
        row.start_time,
        row.end_time,
        allowed_person_types,
        allowed_guest_types,
    )
}

#[async_trait]
impl EventRepository for PostgresEventRepository {
    async fn find_event(&self, id: EventId) -> AppResult<Option<Event>> {
        let row = sqlx::query_as::<_, EventRow>(
            r#"
            SELECT
                id,
                site_id,
                name,
                start_date,
                end_date,
                start_time,
                end_time,
                allowed_person_types,
                allowed_guest_types
            FROM events
            WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to find event '{id}': {error}")))?;

        row.map(event_from_row).transpose()
    }
}
