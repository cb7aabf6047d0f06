use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Local copy of one movement row pulled from the external access system.
///
/// `external_id` is the idempotency key: sync cycles insert new rows and
/// overwrite existing ones, nothing here is ever deleted. The descriptive
/// fields mirror the external source and carry no invariants of their own.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExternalAccessLogEntry {
    /// Identifier assigned by the external source.
    pub external_id: i64,
    /// Movement type code.
    pub movement_type: String,
    /// Origin code of the movement.
    pub origin: String,
    /// Credential card identifier.
    pub card_id: String,
    /// External client identifier.
    pub client_id: Option<i64>,
    /// Movement timestamp.
    pub recorded_at: DateTime<Utc>,
    /// Result code reported by the controller.
    pub result: String,
    /// Controller that registered the movement.
    pub controller_id: Option<i64>,
    /// Access lane identifier.
    pub access_id: Option<i64>,
    /// Free-form observation text.
    pub observation: String,
    /// Free-form record classification.
    pub record_kind: String,
    /// Reason code for denied movements.
    pub reason_code: Option<i64>,
    /// Flag reporting whether the pass was finally permitted.
    pub pass_allowed_flag: String,
    /// Timestamp of the permitted pass, when any.
    pub pass_allowed_at: Option<DateTime<Utc>>,
    /// Controller that permitted the pass, when any.
    pub pass_allowed_controller_id: Option<i64>,
    /// Instant of the last local write for this row.
    pub synced_at: DateTime<Utc>,
}
