use std::sync::Arc;

use chrono::{DateTime, NaiveDateTime, Utc};
use gatewarden_core::{AppError, AppResult};
use gatewarden_domain::ExternalAccessLogEntry;
use tracing::debug;

use crate::external_log_ports::{
    ExternalAccessLogRepository, ExternalAccessLogSource, RawAccessMovement,
};

/// Application service orchestrating one fetch-transform-persist cycle
/// against the external movement source.
#[derive(Clone)]
pub struct ExternalAccessLogSyncService {
    source: Arc<dyn ExternalAccessLogSource>,
    repository: Arc<dyn ExternalAccessLogRepository>,
    default_limit: i64,
}

impl ExternalAccessLogSyncService {
    /// Creates a sync service with the given per-cycle fetch limit.
    pub fn new(
        source: Arc<dyn ExternalAccessLogSource>,
        repository: Arc<dyn ExternalAccessLogRepository>,
        default_limit: i64,
    ) -> AppResult<Self> {
        if default_limit <= 0 {
            return Err(AppError::Configuration(
                "sync fetch limit must be a positive integer".to_owned(),
            ));
        }

        Ok(Self {
            source,
            repository,
            default_limit,
        })
    }

    /// Fetches and persists the latest movements once.
    ///
    /// Rows without an external identifier are skipped and do not count
    /// toward the returned total. All transformable rows of the cycle are
    /// committed together or not at all.
    pub async fn sync_once(&self, limit: Option<i64>) -> AppResult<usize> {
        let limit = limit.unwrap_or(self.default_limit);
        let movements = self.source.fetch_latest(limit).await?;
        if movements.is_empty() {
            return Ok(0);
        }

        let synced_at = Utc::now();
        let entries: Vec<ExternalAccessLogEntry> = movements
            .into_iter()
            .filter_map(|movement| {
                let entry = transform_movement(movement, synced_at);
                if entry.is_none() {
                    debug!("skipping external movement row without an identifier");
                }
                entry
            })
            .collect();

        if entries.is_empty() {
            return Ok(0);
        }

        self.repository.upsert_entries(&entries).await?;

        Ok(entries.len())
    }
}

/// Read-side service over the locally synced movement rows.
#[derive(Clone)]
pub struct ExternalAccessLogQueryService {
    repository: Arc<dyn ExternalAccessLogRepository>,
}

impl ExternalAccessLogQueryService {
    /// Creates a query service from a repository implementation.
    #[must_use]
    pub fn new(repository: Arc<dyn ExternalAccessLogRepository>) -> Self {
        Self { repository }
    }

    /// Lists stored movements newest first; `None` returns everything.
    pub async fn list_latest(
        &self,
        limit: Option<i64>,
    ) -> AppResult<Vec<ExternalAccessLogEntry>> {
        if let Some(limit) = limit
            && limit <= 0
        {
            return Err(AppError::Validation(
                "limit must be a positive integer".to_owned(),
            ));
        }

        self.repository.list_recent(limit).await
    }
}

fn transform_movement(
    movement: RawAccessMovement,
    synced_at: DateTime<Utc>,
) -> Option<ExternalAccessLogEntry> {
    let external_id = movement.external_id?;

    Some(ExternalAccessLogEntry {
        external_id,
        movement_type: clean_text(movement.movement_type),
        origin: clean_text(movement.origin),
        card_id: clean_text(movement.card_id),
        client_id: movement.client_id,
        recorded_at: parse_timestamp(movement.recorded_at.as_deref()).unwrap_or(synced_at),
        result: clean_text(movement.result),
        controller_id: movement.controller_id,
        access_id: movement.access_id,
        observation: clean_text(movement.observation),
        record_kind: clean_text(movement.record_kind),
        reason_code: movement.reason_code,
        pass_allowed_flag: clean_text(movement.pass_allowed_flag),
        pass_allowed_at: parse_timestamp(movement.pass_allowed_at.as_deref()),
        pass_allowed_controller_id: movement.pass_allowed_controller_id,
        synced_at,
    })
}

fn clean_text(value: Option<String>) -> String {
    value
        .map(|text| text.trim().to_owned())
        .unwrap_or_default()
}

fn parse_timestamp(value: Option<&str>) -> Option<DateTime<Utc>> {
    let value = value?.trim();
    if value.is_empty() {
        return None;
    }

    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Some(parsed.with_timezone(&Utc));
    }

    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(value, format) {
            return Some(parsed.and_utc());
        }
    }

    None
}

#[cfg(test)]
mod tests;
