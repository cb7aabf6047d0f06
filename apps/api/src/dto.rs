use std::collections::BTreeSet;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use gatewarden_application::{BatchAuthorizationInput, BatchAuthorizationOutcome};
use gatewarden_domain::{
    AccessPointId, EventId, ExternalAccessLogEntry, GuestType, Person, PersonId, PersonType,
    Recurrence, SiteId, TimeWindow, WhitelistEntry, WhitelistEntryInput,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Deserialize)]
pub struct WhitelistEntryRequest {
    pub person_id: Uuid,
    pub access_point_id: Uuid,
    #[serde(default)]
    pub event_id: Option<Uuid>,
    #[serde(default = "default_is_allowed")]
    pub is_allowed: bool,
    #[serde(default)]
    pub valid_from: Option<NaiveDate>,
    #[serde(default)]
    pub valid_until: Option<NaiveDate>,
    #[serde(default)]
    pub start_time: Option<NaiveTime>,
    #[serde(default)]
    pub end_time: Option<NaiveTime>,
    #[serde(default)]
    pub recurrence: Recurrence,
    #[serde(default)]
    pub recurrence_days: BTreeSet<u8>,
}

fn default_is_allowed() -> bool {
    true
}

impl WhitelistEntryRequest {
    pub fn into_input(self) -> WhitelistEntryInput {
        WhitelistEntryInput {
            person_id: PersonId::from_uuid(self.person_id),
            access_point_id: AccessPointId::from_uuid(self.access_point_id),
            event_id: self.event_id.map(EventId::from_uuid),
            is_allowed: self.is_allowed,
            valid_from: self.valid_from,
            valid_until: self.valid_until,
            start_time: self.start_time,
            end_time: self.end_time,
            recurrence: self.recurrence,
            recurrence_days: self.recurrence_days,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct WhitelistEntryResponse {
    pub id: Uuid,
    pub person_id: Uuid,
    pub access_point_id: Uuid,
    pub event_id: Option<Uuid>,
    pub is_allowed: bool,
    pub valid_from: Option<NaiveDate>,
    pub valid_until: Option<NaiveDate>,
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
    pub recurrence: Recurrence,
    pub recurrence_days: Vec<u8>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<WhitelistEntry> for WhitelistEntryResponse {
    fn from(entry: WhitelistEntry) -> Self {
        Self {
            id: entry.id().as_uuid(),
            person_id: entry.person_id().as_uuid(),
            access_point_id: entry.access_point_id().as_uuid(),
            event_id: entry.event_id().map(|event_id| event_id.as_uuid()),
            is_allowed: entry.is_allowed(),
            valid_from: entry.valid_from(),
            valid_until: entry.valid_until(),
            start_time: entry.time_window().map(TimeWindow::start),
            end_time: entry.time_window().map(TimeWindow::end),
            recurrence: entry.recurrence(),
            recurrence_days: entry.recurrence_days().iter().copied().collect(),
            created_at: entry.created_at(),
            updated_at: entry.updated_at(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct WhitelistListQuery {
    pub person_id: Option<Uuid>,
    pub access_point_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct BatchAuthorizationRequest {
    #[serde(default)]
    pub access_point_ids: Option<Vec<Uuid>>,
    #[serde(default)]
    pub site_id: Option<Uuid>,
    #[serde(default)]
    pub event_id: Option<Uuid>,
    #[serde(default)]
    pub person_types: Vec<PersonType>,
    #[serde(default)]
    pub guest_types: Vec<GuestType>,
    #[serde(default)]
    pub is_active: Option<bool>,
    #[serde(default = "default_is_allowed")]
    pub is_allowed: bool,
    #[serde(default)]
    pub valid_from: Option<NaiveDate>,
    #[serde(default)]
    pub valid_until: Option<NaiveDate>,
    #[serde(default)]
    pub preview: bool,
}

impl BatchAuthorizationRequest {
    pub fn into_input(self) -> BatchAuthorizationInput {
        BatchAuthorizationInput {
            access_point_ids: self
                .access_point_ids
                .map(|ids| ids.into_iter().map(AccessPointId::from_uuid).collect()),
            site_id: self.site_id.map(SiteId::from_uuid),
            event_id: self.event_id.map(EventId::from_uuid),
            person_types: self.person_types,
            guest_types: self.guest_types,
            is_active: self.is_active,
            is_allowed: self.is_allowed,
            valid_from: self.valid_from,
            valid_until: self.valid_until,
            preview: self.preview,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PersonPreviewResponse {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub document_number: String,
    pub person_type: PersonType,
    pub guest_type: Option<GuestType>,
    pub is_active: bool,
}

impl From<Person> for PersonPreviewResponse {
    fn from(person: Person) -> Self {
        Self {
            id: person.id().as_uuid(),
            first_name: person.first_name().as_str().to_owned(),
            last_name: person.last_name().as_str().to_owned(),
            document_number: person.document_number().as_str().to_owned(),
            person_type: person.person_type(),
            guest_type: person.guest_type(),
            is_active: person.is_active(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum BatchAuthorizationResponse {
    Preview {
        preview: bool,
        people: Vec<PersonPreviewResponse>,
    },
    Applied {
        preview: bool,
        created: usize,
        updated: usize,
        created_entries: Vec<WhitelistEntryResponse>,
        updated_entries: Vec<WhitelistEntryResponse>,
    },
}

impl From<BatchAuthorizationOutcome> for BatchAuthorizationResponse {
    fn from(outcome: BatchAuthorizationOutcome) -> Self {
        match outcome {
            BatchAuthorizationOutcome::Preview { people } => Self::Preview {
                preview: true,
                people: people.into_iter().map(PersonPreviewResponse::from).collect(),
            },
            BatchAuthorizationOutcome::Applied { created, updated } => Self::Applied {
                preview: false,
                created: created.len(),
                updated: updated.len(),
                created_entries: created
                    .into_iter()
                    .map(WhitelistEntryResponse::from)
                    .collect(),
                updated_entries: updated
                    .into_iter()
                    .map(WhitelistEntryResponse::from)
                    .collect(),
            },
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ExternalAccessLogEntryResponse {
    pub external_id: i64,
    pub movement_type: String,
    pub origin: String,
    pub card_id: String,
    pub client_id: Option<i64>,
    pub recorded_at: DateTime<Utc>,
    pub result: String,
    pub controller_id: Option<i64>,
    pub access_id: Option<i64>,
    pub observation: String,
    pub record_kind: String,
    pub reason_code: Option<i64>,
    pub pass_allowed_flag: String,
    pub pass_allowed_at: Option<DateTime<Utc>>,
    pub pass_allowed_controller_id: Option<i64>,
    pub synced_at: DateTime<Utc>,
}

impl From<ExternalAccessLogEntry> for ExternalAccessLogEntryResponse {
    fn from(entry: ExternalAccessLogEntry) -> Self {
        Self {
            external_id: entry.external_id,
            movement_type: entry.movement_type,
            origin: entry.origin,
            card_id: entry.card_id,
            client_id: entry.client_id,
            recorded_at: entry.recorded_at,
            result: entry.result,
            controller_id: entry.controller_id,
            access_id: entry.access_id,
            observation: entry.observation,
            record_kind: entry.record_kind,
            reason_code: entry.reason_code,
            pass_allowed_flag: entry.pass_allowed_flag,
            pass_allowed_at: entry.pass_allowed_at,
            pass_allowed_controller_id: entry.pass_allowed_controller_id,
            synced_at: entry.synced_at,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ExternalAccessLatestQuery {
    pub limit: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct ExternalAccessSyncRequest {
    #[serde(default)]
    pub limit: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct ExternalAccessSyncResponse {
    pub synced: usize,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}
