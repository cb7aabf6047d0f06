use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::NaiveDate;
use gatewarden_core::{AppError, AppResult};
use gatewarden_domain::{
    AccessPoint, AccessPointId, Event, EventId, GuestType, Person, PersonType, Recurrence, SiteId,
    WhitelistEntry, WhitelistEntryInput,
};

use crate::directory_ports::{AccessPointRepository, EventRepository, PersonQuery, PersonRepository};
use crate::whitelist_ports::WhitelistRepository;
use crate::whitelist_service::WhitelistService;

/// Target selection and entry fields for a batch authorization run.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchAuthorizationInput {
    /// Explicit access point targets; mutually exclusive with `site_id`.
    pub access_point_ids: Option<Vec<AccessPointId>>,
    /// Site whose access points are targeted; mutually exclusive with
    /// `access_point_ids`.
    pub site_id: Option<SiteId>,
    /// Optional event scope for the written entries.
    pub event_id: Option<EventId>,
    /// Person categories to include; empty means all.
    pub person_types: Vec<PersonType>,
    /// Guest subcategories to include; requires the guest person type.
    pub guest_types: Vec<GuestType>,
    /// Activity flag filter for person resolution.
    pub is_active: Option<bool>,
    /// Grant (`true`) or denial (`false`) written on every entry.
    pub is_allowed: bool,
    /// First valid day for the written entries.
    pub valid_from: Option<NaiveDate>,
    /// Last valid day for the written entries.
    pub valid_until: Option<NaiveDate>,
    /// When set, resolve the person list without writing anything.
    pub preview: bool,
}

/// Result of a batch authorization run.
#[derive(Debug, Clone, PartialEq)]
pub enum BatchAuthorizationOutcome {
    /// Person resolution only; no entry was written.
    Preview {
        /// Persons the batch would target.
        people: Vec<Person>,
    },
    /// Entries written in one transaction.
    Applied {
        /// Entries created by this run.
        created: Vec<WhitelistEntry>,
        /// Entries whose grant and dates were updated by this run.
        updated: Vec<WhitelistEntry>,
    },
}

/// Application service resolving person x access-point cross products into
/// validated whitelist entries with create-or-update semantics.
#[derive(Clone)]
pub struct BatchAuthorizationService {
    whitelist_service: WhitelistService,
    whitelist_repository: Arc<dyn WhitelistRepository>,
    person_repository: Arc<dyn PersonRepository>,
    access_point_repository: Arc<dyn AccessPointRepository>,
    event_repository: Arc<dyn EventRepository>,
}

impl BatchAuthorizationService {
    /// Creates a new batch authorization service.
    #[must_use]
    pub fn new(
        whitelist_service: WhitelistService,
        whitelist_repository: Arc<dyn WhitelistRepository>,
        person_repository: Arc<dyn PersonRepository>,
        access_point_repository: Arc<dyn AccessPointRepository>,
        event_repository: Arc<dyn EventRepository>,
    ) -> Self {
        Self {
            whitelist_service,
            whitelist_repository,
            person_repository,
            access_point_repository,
            event_repository,
        }
    }

    /// Resolves the batch targets and either previews the person list or
    /// upserts one validated entry per (person, access point) pair.
    ///
    /// A single validation failure aborts the whole batch before any write;
    /// the repository persists the surviving set in one transaction.
    pub async fn execute(
        &self,
        input: BatchAuthorizationInput,
    ) -> AppResult<BatchAuthorizationOutcome> {
        self.check_selectors(&input)?;

        let event = match input.event_id {
            Some(event_id) => Some(
                self.event_repository
                    .find_event(event_id)
                    .await?
                    .ok_or_else(|| {
                        AppError::NotFound(format!("event '{event_id}' does not exist"))
                    })?,
            ),
            None => None,
        };

        let access_points = self.resolve_access_points(&input, event.as_ref()).await?;
        let people = self.resolve_people(&input, event.as_ref()).await?;

        if input.preview {
            return Ok(BatchAuthorizationOutcome::Preview { people });
        }

        let mut created = Vec::new();
        let mut updated = Vec::new();
        for person in &people {
            for access_point in &access_points {
                let existing = self
                    .whitelist_repository
                    .find_by_key(person.id(), access_point.id(), input.event_id)
                    .await?;

                let (entry, exclude) = match existing {
                    Some(existing) => {
                        let entry = existing.update_grant(
                            input.is_allowed,
                            input.valid_from,
                            input.valid_until,
                        )?;
                        (entry, Some(existing.id()))
                    }
                    None => {
                        let entry = WhitelistEntry::create(WhitelistEntryInput {
                            person_id: person.id(),
                            access_point_id: access_point.id(),
                            event_id: input.event_id,
                            is_allowed: input.is_allowed,
                            valid_from: input.valid_from,
                            valid_until: input.valid_until,
                            start_time: None,
                            end_time: None,
                            recurrence: Recurrence::None,
                            recurrence_days: BTreeSet::new(),
                        })?;
                        (entry, None)
                    }
                };

                self.whitelist_service.validate_entry(&entry, exclude).await?;

                if exclude.is_some() {
                    updated.push(entry);
                } else {
                    created.push(entry);
                }
            }
        }

        let mut all_entries = Vec::with_capacity(created.len() + updated.len());
        all_entries.extend(created.iter().cloned());
        all_entries.extend(updated.iter().cloned());
        self.whitelist_repository.save_batch(&all_entries).await?;

        Ok(BatchAuthorizationOutcome::Applied { created, updated })
    }

    fn check_selectors(&self, input: &BatchAuthorizationInput) -> AppResult<()> {
        let has_points = input
            .access_point_ids
            .as_ref()
            .is_some_and(|ids| !ids.is_empty());

        match (has_points, input.site_id.is_some()) {
            (true, true) | (false, false) => {
                return Err(AppError::Validation(
                    "provide either explicit access point ids or a site id, not both".to_owned(),
                ));
            }
            _ => {}
        }

        if !input.guest_types.is_empty() && !input.person_types.contains(&PersonType::Guest) {
            return Err(AppError::Validation(
                "guest type filters require the guest person type".to_owned(),
            ));
        }

        Ok(())
    }

    async fn resolve_access_points(
        &self,
        input: &BatchAuthorizationInput,
        event: Option<&Event>,
    ) -> AppResult<Vec<AccessPoint>> {
        let mut access_points = match (&input.access_point_ids, input.site_id) {
            (Some(ids), _) if !ids.is_empty() => {
                self.access_point_repository.list_by_ids(ids).await?
            }
            (_, Some(site_id)) => self.access_point_repository.list_by_site(site_id).await?,
            _ => Vec::new(),
        };

        if let Some(event) = event {
            access_points.retain(|access_point| access_point.site_id() == event.site_id());
        }

        if access_points.is_empty() {
            return Err(AppError::Validation(
                "no matching access points".to_owned(),
            ));
        }

        Ok(access_points)
    }

    async fn resolve_people(
        &self,
        input: &BatchAuthorizationInput,
        event: Option<&Event>,
    ) -> AppResult<Vec<Person>> {
        let mut people = self
            .person_repository
            .list_persons(PersonQuery {
                person_types: input.person_types.clone(),
                guest_types: input.guest_types.clone(),
                is_active: input.is_active,
            })
            .await?;

        if let Some(event) = event {
            people.retain(|person| event.permits(person));
        }

        Ok(people)
    }
}
