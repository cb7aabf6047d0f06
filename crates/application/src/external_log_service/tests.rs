use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use gatewarden_core::{AppError, AppResult};
use gatewarden_domain::ExternalAccessLogEntry;
use tokio::sync::Mutex;

use crate::external_log_ports::{
    ExternalAccessLogRepository, ExternalAccessLogSource, RawAccessMovement,
};

use super::{ExternalAccessLogQueryService, ExternalAccessLogSyncService, parse_timestamp};

#[derive(Default)]
struct ScriptedSource {
    batches: Mutex<Vec<Vec<RawAccessMovement>>>,
    requested_limits: Mutex<Vec<i64>>,
}

#[async_trait]
impl ExternalAccessLogSource for ScriptedSource {
    async fn fetch_latest(&self, limit: i64) -> AppResult<Vec<RawAccessMovement>> {
        self.requested_limits.lock().await.push(limit);
        let mut batches = self.batches.lock().await;
        if batches.is_empty() {
            return Ok(Vec::new());
        }

        Ok(batches.remove(0))
    }
}

struct FailingSource;

#[async_trait]
impl ExternalAccessLogSource for FailingSource {
    async fn fetch_latest(&self, _limit: i64) -> AppResult<Vec<RawAccessMovement>> {
        Err(AppError::ExternalSource(
            "could not connect to the external access log source: network unreachable".to_owned(),
        ))
    }
}

#[derive(Default)]
struct FakeExternalLogRepository {
    rows: Mutex<HashMap<i64, ExternalAccessLogEntry>>,
}

#[async_trait]
impl ExternalAccessLogRepository for FakeExternalLogRepository {
    async fn upsert_entries(&self, entries: &[ExternalAccessLogEntry]) -> AppResult<()> {
        let mut rows = self.rows.lock().await;
        for entry in entries {
            rows.insert(entry.external_id, entry.clone());
        }

        Ok(())
    }

    async fn list_recent(&self, limit: Option<i64>) -> AppResult<Vec<ExternalAccessLogEntry>> {
        let rows = self.rows.lock().await;
        let mut entries: Vec<ExternalAccessLogEntry> = rows.values().cloned().collect();
        entries.sort_by(|left, right| {
            right
                .recorded_at
                .cmp(&left.recorded_at)
                .then(right.external_id.cmp(&left.external_id))
        });
        if let Some(limit) = limit {
            entries.truncate(usize::try_from(limit).unwrap_or(usize::MAX));
        }

        Ok(entries)
    }
}

fn movement(external_id: Option<i64>, card_id: &str) -> RawAccessMovement {
    RawAccessMovement {
        external_id,
        movement_type: Some("E".to_owned()),
        origin: Some("A".to_owned()),
        card_id: Some(card_id.to_owned()),
        recorded_at: Some("2016-07-15T16:11:16.800".to_owned()),
        result: Some("OK".to_owned()),
        ..RawAccessMovement::default()
    }
}

fn sync_service(
    source: Arc<dyn ExternalAccessLogSource>,
    repository: Arc<FakeExternalLogRepository>,
) -> ExternalAccessLogSyncService {
    ExternalAccessLogSyncService::new(source, repository, 10)
        .unwrap_or_else(|_| unreachable!())
}

#[tokio::test]
async fn repeated_external_ids_keep_the_latest_values() {
    let source = Arc::new(ScriptedSource::default());
    source.batches.lock().await.extend([
        vec![movement(Some(1), "B4C7BD56"), movement(Some(2), "A0A0A0A0")],
        vec![movement(Some(2), "FFFFFFFF")],
    ]);
    let repository = Arc::new(FakeExternalLogRepository::default());
    let service = sync_service(source, repository.clone());

    let first = service.sync_once(None).await;
    assert!(first.is_ok());
    assert_eq!(first.unwrap_or_default(), 2);

    let first_synced_at = repository.rows.lock().await[&2].synced_at;

    let second = service.sync_once(None).await;
    assert!(second.is_ok());
    assert_eq!(second.unwrap_or_default(), 1);

    let rows = repository.rows.lock().await;
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[&2].card_id, "FFFFFFFF");
    assert!(rows[&2].synced_at >= first_synced_at);
}

#[tokio::test]
async fn rows_without_identifier_are_skipped_and_not_counted() {
    let source = Arc::new(ScriptedSource::default());
    source.batches.lock().await.push(vec![
        movement(Some(7), "B4C7BD56"),
        movement(None, "ghost"),
    ]);
    let repository = Arc::new(FakeExternalLogRepository::default());
    let service = sync_service(source, repository.clone());

    let synced = service.sync_once(None).await;
    assert!(synced.is_ok());
    assert_eq!(synced.unwrap_or_default(), 1);
    assert_eq!(repository.rows.lock().await.len(), 1);
}

#[tokio::test]
async fn empty_fetch_returns_zero_without_writes() {
    let source = Arc::new(ScriptedSource::default());
    let repository = Arc::new(FakeExternalLogRepository::default());
    let service = sync_service(source, repository.clone());

    let synced = service.sync_once(None).await;
    assert!(synced.is_ok());
    assert_eq!(synced.unwrap_or_default(), 0);
    assert!(repository.rows.lock().await.is_empty());
}

#[tokio::test]
async fn explicit_limit_overrides_the_configured_default() {
    let source = Arc::new(ScriptedSource::default());
    let repository = Arc::new(FakeExternalLogRepository::default());
    let service = sync_service(source.clone(), repository);

    let synced = service.sync_once(Some(3)).await;
    assert!(synced.is_ok());
    assert_eq!(*source.requested_limits.lock().await, vec![3]);
}

#[tokio::test]
async fn non_positive_default_limit_is_a_configuration_error() {
    let source: Arc<dyn ExternalAccessLogSource> = Arc::new(ScriptedSource::default());
    let repository = Arc::new(FakeExternalLogRepository::default());

    let service = ExternalAccessLogSyncService::new(source, repository, 0);
    assert!(matches!(service, Err(AppError::Configuration(_))));
}

#[tokio::test]
async fn source_errors_propagate_unchanged() {
    let repository = Arc::new(FakeExternalLogRepository::default());
    let service = sync_service(Arc::new(FailingSource), repository);

    let result = service.sync_once(None).await;
    assert!(matches!(result, Err(AppError::ExternalSource(_))));
}

#[tokio::test]
async fn unparseable_timestamps_fall_back_to_the_sync_instant() {
    let source = Arc::new(ScriptedSource::default());
    let mut garbled = movement(Some(9), "B4C7BD56");
    garbled.recorded_at = Some("not-a-date".to_owned());
    source.batches.lock().await.push(vec![garbled]);
    let repository = Arc::new(FakeExternalLogRepository::default());
    let service = sync_service(source, repository.clone());

    let before = chrono::Utc::now();
    let synced = service.sync_once(None).await;
    assert!(synced.is_ok());

    let rows = repository.rows.lock().await;
    assert!(rows[&9].recorded_at >= before);
    assert_eq!(rows[&9].recorded_at, rows[&9].synced_at);
}

#[tokio::test]
async fn query_service_lists_newest_first_and_validates_limit() {
    let source = Arc::new(ScriptedSource::default());
    let mut older = movement(Some(1), "B4C7BD56");
    older.recorded_at = Some("2016-07-15T10:00:00".to_owned());
    let mut newer = movement(Some(2), "A0A0A0A0");
    newer.recorded_at = Some("2016-07-15T16:11:16".to_owned());
    source.batches.lock().await.push(vec![older, newer]);

    let repository = Arc::new(FakeExternalLogRepository::default());
    let sync = sync_service(source, repository.clone());
    let synced = sync.sync_once(None).await;
    assert!(synced.is_ok());

    let query = ExternalAccessLogQueryService::new(repository);

    let all = query.list_latest(None).await;
    assert!(all.is_ok());
    let all = all.unwrap_or_default();
    assert_eq!(all.len(), 2);
    assert_eq!(all[0].external_id, 2);

    let limited = query.list_latest(Some(1)).await;
    assert!(limited.is_ok());
    assert_eq!(limited.unwrap_or_default().len(), 1);

    let rejected = query.list_latest(Some(0)).await;
    assert!(matches!(rejected, Err(AppError::Validation(_))));
}

#[test]
fn timestamps_parse_from_rfc3339_and_bare_iso() {
    assert!(parse_timestamp(Some("2016-07-15T16:11:16.800")).is_some());
    assert!(parse_timestamp(Some("2016-07-15 16:11:16")).is_some());
    assert!(parse_timestamp(Some("2016-07-15T16:11:16+03:00")).is_some());
    assert!(parse_timestamp(Some("")).is_none());
    assert!(parse_timestamp(Some("not-a-date")).is_none());
    assert!(parse_timestamp(None).is_none());
}
