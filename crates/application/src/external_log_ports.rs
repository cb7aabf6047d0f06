use async_trait::async_trait;
use gatewarden_core::AppResult;
use gatewarden_domain::ExternalAccessLogEntry;

/// One untyped movement row as returned by the external source.
///
/// Timestamps travel as portable text; the sync transform parses them and
/// substitutes the sync instant when they are missing or unreadable. Rows
/// without an `external_id` are skipped during transformation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawAccessMovement {
    /// Identifier assigned by the external source.
    pub external_id: Option<i64>,
    /// Movement type code.
    pub movement_type: Option<String>,
    /// Origin code of the movement.
    pub origin: Option<String>,
    /// Credential card identifier.
    pub card_id: Option<String>,
    /// External client identifier.
    pub client_id: Option<i64>,
    /// Movement timestamp as text.
    pub recorded_at: Option<String>,
    /// Result code reported by the controller.
    pub result: Option<String>,
    /// Controller that registered the movement.
    pub controller_id: Option<i64>,
    /// Access lane identifier.
    pub access_id: Option<i64>,
    /// Free-form observation text.
    pub observation: Option<String>,
    /// Free-form record classification.
    pub record_kind: Option<String>,
    /// Reason code for denied movements.
    pub reason_code: Option<i64>,
    /// Flag reporting whether the pass was finally permitted.
    pub pass_allowed_flag: Option<String>,
    /// Timestamp of the permitted pass as text, when any.
    pub pass_allowed_at: Option<String>,
    /// Controller that permitted the pass, when any.
    pub pass_allowed_controller_id: Option<i64>,
}

/// Port over the external read-only movement source.
#[async_trait]
pub trait ExternalAccessLogSource: Send + Sync {
    /// Fetches the most recent movements, newest first.
    ///
    /// `limit` must be positive; implementations reject other values before
    /// any I/O happens.
    async fn fetch_latest(&self, limit: i64) -> AppResult<Vec<RawAccessMovement>>;
}

/// Persistence port for locally synced movement rows.
#[async_trait]
pub trait ExternalAccessLogRepository: Send + Sync {
    /// Inserts or overwrites rows keyed by `external_id` in one
    /// all-or-nothing transaction.
    async fn upsert_entries(&self, entries: &[ExternalAccessLogEntry]) -> AppResult<()>;

    /// Lists stored rows newest first; `None` returns everything.
    async fn list_recent(&self, limit: Option<i64>) -> AppResult<Vec<ExternalAccessLogEntry>>;
}
