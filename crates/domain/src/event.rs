use std::fmt::{Display, Formatter};

use chrono::{NaiveDate, NaiveTime};
use gatewarden_core::{AppResult, FieldErrors, NonEmptyString};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::person::{GuestType, Person, PersonType};
use crate::site::SiteId;

/// Event identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EventId(Uuid);

impl EventId {
    /// Creates a random event identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates an event identifier from an existing UUID value.
    #[must_use]
    pub fn from_uuid(value: Uuid) -> Self {
        Self(value)
    }

    /// Returns the underlying UUID value.
    #[must_use]
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for EventId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for EventId {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

/// A scheduled event at a site with category allow-lists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    id: EventId,
    site_id: SiteId,
    name: NonEmptyString,
    start_date: NaiveDate,
    end_date: NaiveDate,
    start_time: NaiveTime,
    end_time: NaiveTime,
    allowed_person_types: Vec<PersonType>,
    allowed_guest_types: Vec<GuestType>,
}

impl Event {
    /// Creates a validated event.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: EventId,
        site_id: SiteId,
        name: impl Into<String>,
        start_date: NaiveDate,
        end_date: NaiveDate,
        start_time: NaiveTime,
        end_time: NaiveTime,
        allowed_person_types: Vec<PersonType>,
        allowed_guest_types: Vec<GuestType>,
    ) -> AppResult<Self> {
        let mut errors = FieldErrors::new();
        if end_date < start_date {
            errors.push("end_date", "event end date precedes the start date");
        }
        if end_time <= start_time {
            errors.push("end_time", "event end time must be after the start time");
        }
        errors.into_result()?;

        Ok(Self {
            id,
            site_id,
            name: NonEmptyString::new(name)?,
            start_date,
            end_date,
            start_time,
            end_time,
            allowed_person_types,
            allowed_guest_types,
        })
    }

    /// Returns the event identifier.
    #[must_use]
    pub fn id(&self) -> EventId {
        self.id
    }

    /// Returns the hosting site identifier.
    #[must_use]
    pub fn site_id(&self) -> SiteId {
        self.site_id
    }

    /// Returns the event name.
    #[must_use]
    pub fn name(&self) -> &NonEmptyString {
        &self.name
    }

    /// Returns the first event day.
    #[must_use]
    pub fn start_date(&self) -> NaiveDate {
        self.start_date
    }

    /// Returns the last event day.
    #[must_use]
    pub fn end_date(&self) -> NaiveDate {
        self.end_date
    }

    /// Returns the daily opening time.
    #[must_use]
    pub fn start_time(&self) -> NaiveTime {
        self.start_time
    }

    /// Returns the daily closing time.
    #[must_use]
    pub fn end_time(&self) -> NaiveTime {
        self.end_time
    }

    /// Returns the person categories admitted to the event.
    #[must_use]
    pub fn allowed_person_types(&self) -> &[PersonType] {
        &self.allowed_person_types
    }

    /// Returns the guest subcategories admitted to the event.
    #[must_use]
    pub fn allowed_guest_types(&self) -> &[GuestType] {
        &self.allowed_guest_types
    }

    /// Returns whether the person's category is admitted.
    ///
    /// Guests are matched by guest type against the guest allow-list;
    /// everyone else by person type against the person allow-list.
    #[must_use]
    pub fn permits(&self, person: &Person) -> bool {
        if person.person_type() == PersonType::Guest {
            person
                .guest_type()
                .is_some_and(|guest_type| self.allowed_guest_types.contains(&guest_type))
        } else {
            self.allowed_person_types.contains(&person.person_type())
        }
    }
}
