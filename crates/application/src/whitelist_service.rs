use std::sync::Arc;

use gatewarden_core::{AppError, AppResult, FieldErrors};
use gatewarden_domain::{
    PersonType, WhitelistEntry, WhitelistEntryId, WhitelistEntryInput,
};

use crate::directory_ports::{AccessPointRepository, EventRepository, PersonRepository};
use crate::whitelist_ports::{WhitelistEntryQuery, WhitelistRepository};

/// Application service for single whitelist entry operations.
///
/// Every write runs the full validation pipeline: field-shape checks at
/// entry construction, reference and event-scope checks against the
/// directory, a uniqueness pre-check on the (person, access point, event)
/// key, and the no-contradiction check against the sibling entries of the
/// same (person, access point) pair.
#[derive(Clone)]
pub struct WhitelistService {
    whitelist_repository: Arc<dyn WhitelistRepository>,
    person_repository: Arc<dyn PersonRepository>,
    access_point_repository: Arc<dyn AccessPointRepository>,
    event_repository: Arc<dyn EventRepository>,
}

impl WhitelistService {
    /// Creates a new whitelist service from repository implementations.
    #[must_use]
    pub fn new(
        whitelist_repository: Arc<dyn WhitelistRepository>,
        person_repository: Arc<dyn PersonRepository>,
        access_point_repository: Arc<dyn AccessPointRepository>,
        event_repository: Arc<dyn EventRepository>,
    ) -> Self {
        Self {
            whitelist_repository,
            person_repository,
            access_point_repository,
            event_repository,
        }
    }

    /// Validates and persists a new entry.
    pub async fn create_entry(&self, input: WhitelistEntryInput) -> AppResult<WhitelistEntry> {
        let entry = WhitelistEntry::create(input)?;
        self.validate_entry(&entry, None).await?;
        self.whitelist_repository.insert_entry(&entry).await?;

        Ok(entry)
    }

    /// Revalidates and persists an update to an existing entry.
    pub async fn update_entry(
        &self,
        id: WhitelistEntryId,
        input: WhitelistEntryInput,
    ) -> AppResult<WhitelistEntry> {
        let existing = self
            .whitelist_repository
            .find_entry(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("whitelist entry '{id}' does not exist")))?;

        let updated = existing.apply_update(input)?;
        self.validate_entry(&updated, Some(id)).await?;
        self.whitelist_repository.update_entry(&updated).await?;

        Ok(updated)
    }

    /// Gets one entry by identifier.
    pub async fn get_entry(&self, id: WhitelistEntryId) -> AppResult<WhitelistEntry> {
        self.whitelist_repository
            .find_entry(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("whitelist entry '{id}' does not exist")))
    }

    /// Lists entries matching the query filters.
    pub async fn list_entries(
        &self,
        query: WhitelistEntryQuery,
    ) -> AppResult<Vec<WhitelistEntry>> {
        self.whitelist_repository.list_entries(query).await
    }

    /// Hard-deletes one entry, removing the grant immediately.
    pub async fn delete_entry(&self, id: WhitelistEntryId) -> AppResult<()> {
        self.whitelist_repository.delete_entry(id).await
    }

    /// Runs the reference, event-scope, uniqueness and contradiction checks
    /// for a shape-valid candidate, excluding `exclude` on updates.
    pub async fn validate_entry(
        &self,
        entry: &WhitelistEntry,
        exclude: Option<WhitelistEntryId>,
    ) -> AppResult<()> {
        self.check_references_and_event_scope(entry).await?;
        self.check_unique_key(entry, exclude).await?;
        self.check_no_contradiction(entry, exclude).await
    }

    async fn check_references_and_event_scope(&self, entry: &WhitelistEntry) -> AppResult<()> {
        let mut errors = FieldErrors::new();

        let person = self.person_repository.find_person(entry.person_id()).await?;
        if person.is_none() {
            errors.push("person", "person does not exist");
        }

        let access_point = self
            .access_point_repository
            .find_access_point(entry.access_point_id())
            .await?;
        if access_point.is_none() {
            errors.push("access_point", "access point does not exist");
        }

        if let Some(event_id) = entry.event_id() {
            match self.event_repository.find_event(event_id).await? {
                None => errors.push("event", "event does not exist"),
                Some(event) => {
                    if let Some(access_point) = &access_point
                        && event.site_id() != access_point.site_id()
                    {
                        errors.push(
                            "event",
                            "the event must belong to the same site as the access point",
                        );
                    }

                    if let Some(person) = &person
                        && !event.permits(person)
                    {
                        if person.person_type() == PersonType::Guest {
                            errors.push(
                                "event",
                                "the guest does not match the guest types allowed for the event",
                            );
                        } else {
                            errors.push(
                                "event",
                                "the person does not belong to a category allowed for the event",
                            );
                        }
                    }
                }
            }
        }

        errors.into_result()
    }

    async fn check_unique_key(
        &self,
        entry: &WhitelistEntry,
        exclude: Option<WhitelistEntryId>,
    ) -> AppResult<()> {
        let existing = self
            .whitelist_repository
            .find_by_key(entry.person_id(), entry.access_point_id(), entry.event_id())
            .await?;

        if let Some(existing) = existing
            && Some(existing.id()) != exclude
        {
            return Err(AppError::Conflict(
                "an entry for this person, access point and event already exists".to_owned(),
            ));
        }

        Ok(())
    }

    async fn check_no_contradiction(
        &self,
        entry: &WhitelistEntry,
        exclude: Option<WhitelistEntryId>,
    ) -> AppResult<()> {
        let siblings = self
            .whitelist_repository
            .list_for_pair(entry.person_id(), entry.access_point_id())
            .await?;

        let contradicted = siblings
            .iter()
            .filter(|sibling| Some(sibling.id()) != exclude)
            .any(|sibling| entry.contradicts(sibling));

        if contradicted {
            return Err(AppError::field(
                "entry",
                "a contradictory authorization exists for the same date and time range",
            ));
        }

        Ok(())
    }
}
