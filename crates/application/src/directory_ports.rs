use async_trait::async_trait;
use gatewarden_core::AppResult;
use gatewarden_domain::{
    AccessPoint, AccessPointId, Event, EventId, GuestType, Person, PersonId, PersonType, SiteId,
};

/// Category and activity filters for person resolution.
///
/// Empty filter lists mean "no restriction". The guest-type filter narrows
/// guests only; persons of other categories pass it untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PersonQuery {
    /// Person categories to retain.
    pub person_types: Vec<PersonType>,
    /// Guest subcategories to retain among guests.
    pub guest_types: Vec<GuestType>,
    /// Activity flag to match, when present.
    pub is_active: Option<bool>,
}

/// Read-only port over the person directory.
#[async_trait]
pub trait PersonRepository: Send + Sync {
    /// Looks up one person by identifier.
    async fn find_person(&self, id: PersonId) -> AppResult<Option<Person>>;

    /// Lists persons matching the query filters.
    async fn list_persons(&self, query: PersonQuery) -> AppResult<Vec<Person>>;
}

/// Read-only port over the access point directory.
#[async_trait]
pub trait AccessPointRepository: Send + Sync {
    /// Looks up one access point by identifier.
    async fn find_access_point(&self, id: AccessPointId) -> AppResult<Option<AccessPoint>>;

    /// Lists the access points with the given identifiers; unknown
    /// identifiers are silently dropped.
    async fn list_by_ids(&self, ids: &[AccessPointId]) -> AppResult<Vec<AccessPoint>>;

    /// Lists every access point belonging to a site.
    async fn list_by_site(&self, site_id: SiteId) -> AppResult<Vec<AccessPoint>>;
}

/// Read-only port over the event calendar.
#[async_trait]
pub trait EventRepository: Send + Sync {
    /// Looks up one event by identifier.
    async fn find_event(&self, id: EventId) -> AppResult<Option<Event>>;
}
