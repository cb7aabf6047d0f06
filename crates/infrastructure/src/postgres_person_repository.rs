use std::str::FromStr;

use async_trait::async_trait;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use gatewarden_application::{PersonQuery, PersonRepository};
use gatewarden_core::{AppError, AppResult};
use gatewarden_domain::{GuestType, Person, PersonId, PersonType};

/// PostgreSQL-backed read model over the person directory.
#[derive(Clone)]
pub struct PostgresPersonRepository {
    pool: PgPool,
}

impl PostgresPersonRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct PersonRow {
    id: Uuid,
    first_name: String,
    last_name: String,
    document_number: String,
    person_type: String,
    guest_type: Option<String>,
    is_active: bool,
}

fn person_from_row(row: PersonRow) -> AppResult<Person> {
    let guest_type = row
        .guest_type
        .as_deref()
        .map(GuestType::from_str)
        .transpose()?;

    Person::new(
        PersonId::from_uuid(row.id),
        row.first_name,
        row.last_name,
        row.document_number,
        PersonType::from_str(row.person_type.as_str())?,
        guest_type,
        row.is_active,
    )
}

#[async_trait]
impl PersonRepository for PostgresPersonRepository {
    async fn find_person(&self, id: PersonId) -> AppResult<Option<Person>> {
        let row = sqlx::query_as::<_, PersonRow>(
            r#"
            SELECT id, first_name, last_name, document_number, person_type, guest_type, is_active
            FROM persons
            WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to find person '{id}': {error}")))?;

        row.map(person_from_row).transpose()
    }

    async fn list_persons(&self, query: PersonQuery) -> AppResult<Vec<Person>> {
        let person_types: Vec<String> = query
            .person_types
            .iter()
            .map(|person_type| person_type.as_str().to_owned())
            .collect();
        let guest_types: Vec<String> = query
            .guest_types
            .iter()
            .map(|guest_type| guest_type.as_str().to_owned())
            .collect();

        let rows = sqlx::query_as::<_, PersonRow>(
            r#"
            SELECT id, first_name, last_name, document_number, person_type, guest_type, is_active
            FROM persons
            WHERE (cardinality($1::text[]) = 0 OR person_type = ANY($1))
                AND (
                    cardinality($2::text[]) = 0
                    OR person_type <> 'guest'
                    OR guest_type = ANY($2)
                )
                AND ($3::boolean IS NULL OR is_active = $3)
            ORDER BY last_name, first_name
            "#,
        )
        .bind(person_types)
        .bind(guest_types)
        .bind(query.is_active)
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to list persons: {error}")))?;

        rows.into_iter().map(person_from_row).collect()
    }
}
