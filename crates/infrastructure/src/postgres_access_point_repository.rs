use async_trait::async_trait;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use gatewarden_application::AccessPointRepository;
use gatewarden_core::{AppError, AppResult};
use gatewarden_domain::{AccessPoint, AccessPointId, SiteId};

/// PostgreSQL-backed read model over the access point directory.
#[derive(Clone)]
pub struct PostgresAccessPointRepository {
    pool: PgPool,
}

impl PostgresAccessPointRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct AccessPointRow {
    id: Uuid,
    site_id: Uuid,
    name: String,
    description: Option<String>,
}

fn access_point_from_row(row: AccessPointRow) -> AppResult<AccessPoint> {
    AccessPoint::new(
        AccessPointId::from_uuid(row.id),
        SiteId::from_uuid(row.site_id),
        row.name,
        row.description,
    )
}

#[async_trait]
impl AccessPointRepository for PostgresAccessPointRepository {
    async fn find_access_point(&self, id: AccessPointId) -> AppResult<Option<AccessPoint>> {
        let row = sqlx::query_as::<_, AccessPointRow>(
            "SELECT id, site_id, name, description FROM access_points WHERE id = $1",
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to find access point '{id}': {error}"))
        })?;

        row.map(access_point_from_row).transpose()
    }

    async fn list_by_ids(&self, ids: &[AccessPointId]) -> AppResult<Vec<AccessPoint>> {
        let id_values: Vec<Uuid> = ids.iter().map(AccessPointId::as_uuid).collect();

        let rows = sqlx::query_as::<_, AccessPointRow>(
            r#"
            SELECT id, site_id, name, description
            FROM access_points
            WHERE id = ANY($1)
            ORDER BY name
            "#,
        )
        .bind(id_values)
        .fetch_all(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to list access points by ids: {error}"))
        })?;

        rows.into_iter().map(access_point_from_row).collect()
    }

    async fn list_by_site(&self, site_id: SiteId) -> AppResult<Vec<AccessPoint>> {
        let rows = sqlx::query_as::<_, AccessPointRow>(
            r#"
            SELECT id, site_id, name, description
            FROM access_points
            WHERE site_id = $1
            ORDER BY name
            "#,
        )
        .bind(site_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!(
                "failed to list access points for site '{site_id}': {error}"
            ))
        })?;

        rows.into_iter().map(access_point_from_row).collect()
    }
}
