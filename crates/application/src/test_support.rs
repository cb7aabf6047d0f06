//! In-memory fakes shared by the service test modules.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime};
use gatewarden_core::{AppError, AppResult};
use gatewarden_domain::{
    AccessPoint, AccessPointId, Event, EventId, GuestType, Person, PersonId, PersonType, SiteId,
    WhitelistEntry, WhitelistEntryId,
};
use tokio::sync::Mutex;

use crate::directory_ports::{
    AccessPointRepository, EventRepository, PersonQuery, PersonRepository,
};
use crate::whitelist_ports::{WhitelistEntryQuery, WhitelistRepository};

#[derive(Default)]
pub struct FakeDirectory {
    pub persons: Vec<Person>,
    pub access_points: Vec<AccessPoint>,
    pub events: Vec<Event>,
}

#[async_trait]
impl PersonRepository for FakeDirectory {
    async fn find_person(&self, id: PersonId) -> AppResult<Option<Person>> {
        Ok(self
            .persons
            .iter()
            .find(|person| person.id() == id)
            .cloned())
    }

    async fn list_persons(&self, query: PersonQuery) -> AppResult<Vec<Person>> {
        Ok(self
            .persons
            .iter()
            .filter(|person| {
                if !query.person_types.is_empty()
                    && !query.person_types.contains(&person.person_type())
                {
                    return false;
                }
                if !query.guest_types.is_empty()
                    && person.person_type() == PersonType::Guest
                    && !person
                        .guest_type()
                        .is_some_and(|guest_type| query.guest_types.contains(&guest_type))
                {
                    return false;
                }
                query
                    .is_active
                    .is_none_or(|is_active| person.is_active() == is_active)
            })
            .cloned()
            .collect())
    }
}

#[async_trait]
impl AccessPointRepository for FakeDirectory {
    async fn find_access_point(&self, id: AccessPointId) -> AppResult<Option<AccessPoint>> {
        Ok(self
            .access_points
            .iter()
            .find(|access_point| access_point.id() == id)
            .cloned())
    }

    async fn list_by_ids(&self, ids: &[AccessPointId]) -> AppResult<Vec<AccessPoint>> {
        Ok(self
            .access_points
            .iter()
            .filter(|access_point| ids.contains(&access_point.id()))
            .cloned()
            .collect())
    }

    async fn list_by_site(&self, site_id: SiteId) -> AppResult<Vec<AccessPoint>> {
        Ok(self
            .access_points
            .iter()
            .filter(|access_point| access_point.site_id() == site_id)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl EventRepository for FakeDirectory {
    async fn find_event(&self, id: EventId) -> AppResult<Option<Event>> {
        Ok(self.events.iter().find(|event| event.id() == id).cloned())
    }
}

#[derive(Default)]
pub struct FakeWhitelistRepository {
    pub entries: Mutex<HashMap<WhitelistEntryId, WhitelistEntry>>,
}

impl FakeWhitelistRepository {
    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }
}

#[async_trait]
impl WhitelistRepository for FakeWhitelistRepository {
    async fn find_entry(&self, id: WhitelistEntryId) -> AppResult<Option<WhitelistEntry>> {
        Ok(self.entries.lock().await.get(&id).cloned())
    }

    async fn find_by_key(
        &self,
        person_id: PersonId,
        access_point_id: AccessPointId,
        event_id: Option<EventId>,
    ) -> AppResult<Option<WhitelistEntry>> {
        Ok(self
            .entries
            .lock()
            .await
            .values()
            .find(|entry| {
                entry.person_id() == person_id
                    && entry.access_point_id() == access_point_id
                    && entry.event_id() == event_id
            })
            .cloned())
    }

    async fn list_for_pair(
        &self,
        person_id: PersonId,
        access_point_id: AccessPointId,
    ) -> AppResult<Vec<WhitelistEntry>> {
        Ok(self
            .entries
            .lock()
            .await
            .values()
            .filter(|entry| {
                entry.person_id() == person_id && entry.access_point_id() == access_point_id
            })
            .cloned()
            .collect())
    }

    async fn list_entries(&self, query: WhitelistEntryQuery) -> AppResult<Vec<WhitelistEntry>> {
        Ok(self
            .entries
            .lock()
            .await
            .values()
            .filter(|entry| {
                query
                    .person_id
                    .is_none_or(|person_id| entry.person_id() == person_id)
                    && query
                        .access_point_id
                        .is_none_or(|access_point_id| entry.access_point_id() == access_point_id)
            })
            .cloned()
            .collect())
    }

    async fn insert_entry(&self, entry: &WhitelistEntry) -> AppResult<()> {
        let mut entries = self.entries.lock().await;
        let key_taken = entries.values().any(|existing| {
            existing.person_id() == entry.person_id()
                && existing.access_point_id() == entry.access_point_id()
                && existing.event_id() == entry.event_id()
        });
        if key_taken {
            return Err(AppError::Conflict(
                "an entry for this person, access point and event already exists".to_owned(),
            ));
        }

        entries.insert(entry.id(), entry.clone());
        Ok(())
    }

    async fn update_entry(&self, entry: &WhitelistEntry) -> AppResult<()> {
        let mut entries = self.entries.lock().await;
        if !entries.contains_key(&entry.id()) {
            return Err(AppError::NotFound(format!(
                "whitelist entry '{}' does not exist",
                entry.id()
            )));
        }

        entries.insert(entry.id(), entry.clone());
        Ok(())
    }

    async fn save_batch(&self, batch: &[WhitelistEntry]) -> AppResult<()> {
        let mut entries = self.entries.lock().await;
        for entry in batch {
            entries.retain(|_, existing| {
                !(existing.person_id() == entry.person_id()
                    && existing.access_point_id() == entry.access_point_id()
                    && existing.event_id() == entry.event_id())
            });
            entries.insert(entry.id(), entry.clone());
        }

        Ok(())
    }

    async fn delete_entry(&self, id: WhitelistEntryId) -> AppResult<()> {
        if self.entries.lock().await.remove(&id).is_none() {
            return Err(AppError::NotFound(format!(
                "whitelist entry '{id}' does not exist"
            )));
        }

        Ok(())
    }
}

pub fn person(person_type: PersonType, guest_type: Option<GuestType>, is_active: bool) -> Person {
    Person::new(
        PersonId::new(),
        "Ana",
        "Suarez",
        "30111222",
        person_type,
        guest_type,
        is_active,
    )
    .unwrap_or_else(|_| unreachable!())
}

pub fn access_point(site_id: SiteId) -> AccessPoint {
    AccessPoint::new(AccessPointId::new(), site_id, "North gate", None)
        .unwrap_or_else(|_| unreachable!())
}

pub fn event(
    site_id: SiteId,
    allowed_person_types: Vec<PersonType>,
    allowed_guest_types: Vec<GuestType>,
) -> Event {
    Event::new(
        EventId::new(),
        site_id,
        "Annual regatta",
        date(2024, 3, 1),
        date(2024, 3, 2),
        time(9, 0),
        time(18, 0),
        allowed_person_types,
        allowed_guest_types,
    )
    .unwrap_or_else(|_| unreachable!())
}

pub fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap_or_default()
}

pub fn time(hour: u32, minute: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(hour, minute, 0).unwrap_or_default()
}
