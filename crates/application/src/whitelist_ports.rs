use async_trait::async_trait;
use gatewarden_core::AppResult;
use gatewarden_domain::{AccessPointId, EventId, PersonId, WhitelistEntry, WhitelistEntryId};

/// Optional filters for whitelist entry listings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WhitelistEntryQuery {
    /// Restrict to entries of one person.
    pub person_id: Option<PersonId>,
    /// Restrict to entries of one access point.
    pub access_point_id: Option<AccessPointId>,
}

/// Persistence port for whitelist entries.
///
/// Every write method runs inside one database transaction. Implementations
/// backed by shared storage must serialize writers touching the same
/// (person, access point) pair and re-check the contradiction predicate
/// before committing, so two concurrent writers cannot slip a contradictory
/// pair past the service-level validation.
#[async_trait]
pub trait WhitelistRepository: Send + Sync {
    /// Looks up one entry by identifier.
    async fn find_entry(&self, id: WhitelistEntryId) -> AppResult<Option<WhitelistEntry>>;

    /// Looks up the entry with the exact (person, access point, event) key.
    ///
    /// A `None` event matches only entries without an event scope.
    async fn find_by_key(
        &self,
        person_id: PersonId,
        access_point_id: AccessPointId,
        event_id: Option<EventId>,
    ) -> AppResult<Option<WhitelistEntry>>;

    /// Lists every entry of a (person, access point) pair.
    async fn list_for_pair(
        &self,
        person_id: PersonId,
        access_point_id: AccessPointId,
    ) -> AppResult<Vec<WhitelistEntry>>;

    /// Lists entries matching the query filters.
    async fn list_entries(&self, query: WhitelistEntryQuery) -> AppResult<Vec<WhitelistEntry>>;

    /// Inserts a new entry; the key must not exist yet.
    async fn insert_entry(&self, entry: &WhitelistEntry) -> AppResult<()>;

    /// Overwrites an existing entry by identifier.
    async fn update_entry(&self, entry: &WhitelistEntry) -> AppResult<()>;

    /// Upserts a set of entries keyed by (person, access point, event) in
    /// one all-or-nothing transaction.
    async fn save_batch(&self, entries: &[WhitelistEntry]) -> AppResult<()>;

    /// Hard-deletes one entry; unknown identifiers yield a not-found error.
    async fn delete_entry(&self, id: WhitelistEntryId) -> AppResult<()>;
}
