use std::collections::BTreeSet;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use gatewarden_core::{AppError, AppResult, FieldErrors};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::event::EventId;
use crate::person::PersonId;
use crate::site::AccessPointId;

/// Whitelist entry identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WhitelistEntryId(Uuid);

impl WhitelistEntryId {
    /// Creates a random whitelist entry identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a whitelist entry identifier from an existing UUID value.
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

impl Default for WhitelistEntryId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for WhitelistEntryId {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

/// How an entry repeats over the calendar.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Recurrence {
    /// Applies continuously over the validity dates.
    #[default]
    None,
    /// Applies every day inside the validity dates.
    Daily,
    /// Applies only on the weekdays listed in the recurrence day set.
    Weekly,
}

impl Recurrence {
    /// Returns a stable storage value for this recurrence.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Daily => "daily",
            Self::Weekly => "weekly",
        }
    }
}

impl FromStr for Recurrence {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "none" => Ok(Self::None),
            "daily" => Ok(Self::Daily),
            "weekly" => Ok(Self::Weekly),
            _ => Err(AppError::Validation(format!("unknown recurrence '{value}'"))),
        }
    }
}

/// A same-day time-of-day window, start strictly before end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    start: NaiveTime,
    end: NaiveTime,
}

impl TimeWindow {
    /// Creates a validated time window.
    pub fn new(start: NaiveTime, end: NaiveTime) -> AppResult<Self> {
        if end <= start {
            return Err(AppError::Validation(
                "time window end must be after its start".to_owned(),
            ));
        }

        Ok(Self { start, end })
    }

    /// Returns the window start.
    #[must_use]
    pub fn start(&self) -> NaiveTime {
        self.start
    }

    /// Returns the window end.
    #[must_use]
    pub fn end(&self) -> NaiveTime {
        self.end
    }

    /// Half-open interval intersection: touching windows do not overlap.
    #[must_use]
    pub fn overlaps(&self, other: &Self) -> bool {
        self.start < other.end && other.start < self.end
    }
}

/// Raw fields for creating or updating a whitelist entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WhitelistEntryInput {
    /// Subject person.
    pub person_id: PersonId,
    /// Gate the rule applies to.
    pub access_point_id: AccessPointId,
    /// Optional event scope.
    pub event_id: Option<EventId>,
    /// Grant (`true`) or explicit denial (`false`).
    pub is_allowed: bool,
    /// First valid day, inclusive; absent means open-ended.
    pub valid_from: Option<NaiveDate>,
    /// Last valid day, inclusive; absent means open-ended.
    pub valid_until: Option<NaiveDate>,
    /// Time-of-day window start; paired with `end_time`.
    pub start_time: Option<NaiveTime>,
    /// Time-of-day window end; paired with `start_time`.
    pub end_time: Option<NaiveTime>,
    /// Calendar repetition rule.
    pub recurrence: Recurrence,
    /// Weekdays (0 = Monday .. 6 = Sunday) for weekly recurrence.
    pub recurrence_days: BTreeSet<u8>,
}

/// A permission or denial for a person at an access point.
///
/// Shape invariants (date ordering, time window pairing, recurrence day
/// rules) are enforced on every construction path; the cross-entry
/// no-contradiction invariant is checked by [`WhitelistEntry::contradicts`]
/// against the sibling entries of the same (person, access point) pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WhitelistEntry {
    id: WhitelistEntryId,
    person_id: PersonId,
    access_point_id: AccessPointId,
    event_id: Option<EventId>,
    is_allowed: bool,
    valid_from: Option<NaiveDate>,
    valid_until: Option<NaiveDate>,
    time_window: Option<TimeWindow>,
    recurrence: Recurrence,
    recurrence_days: BTreeSet<u8>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl WhitelistEntry {
    /// Creates a new entry with a fresh identifier and current timestamps.
    pub fn create(input: WhitelistEntryInput) -> AppResult<Self> {
        let now = Utc::now();
        Self::restore(WhitelistEntryId::new(), input, now, now)
    }

    /// Rebuilds an entry from stored fields, re-checking shape invariants.
    pub fn restore(
        id: WhitelistEntryId,
        input: WhitelistEntryInput,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> AppResult<Self> {
        let time_window = validate_shape(&input)?;

        Ok(Self {
            id,
            person_id: input.person_id,
            access_point_id: input.access_point_id,
            event_id: input.event_id,
            is_allowed: input.is_allowed,
            valid_from: input.valid_from,
            valid_until: input.valid_until,
            time_window,
            recurrence: input.recurrence,
            recurrence_days: input.recurrence_days,
            created_at,
            updated_at,
        })
    }

    /// Returns a revalidated copy carrying the update, preserving identity.
    pub fn apply_update(&self, input: WhitelistEntryInput) -> AppResult<Self> {
        Self::restore(self.id, input, self.created_at, Utc::now())
    }

    /// Returns a copy with a new grant decision and validity dates.
    ///
    /// Used by batch upserts, which only touch `is_allowed` and the date
    /// range of an existing entry.
    pub fn update_grant(
        &self,
        is_allowed: bool,
        valid_from: Option<NaiveDate>,
        valid_until: Option<NaiveDate>,
    ) -> AppResult<Self> {
        let input = WhitelistEntryInput {
            person_id: self.person_id,
            access_point_id: self.access_point_id,
            event_id: self.event_id,
            is_allowed,
            valid_from,
            valid_until,
            start_time: self.time_window.as_ref().map(TimeWindow::start),
            end_time: self.time_window.as_ref().map(TimeWindow::end),
            recurrence: self.recurrence,
            recurrence_days: self.recurrence_days.clone(),
        };

        Self::restore(self.id, input, self.created_at, Utc::now())
    }

    /// Returns the entry identifier.
    #[must_use]
    pub fn id(&self) -> WhitelistEntryId {
        self.id
    }

    /// Returns the subject person identifier.
    #[must_use]
    pub fn person_id(&self) -> PersonId {
        self.person_id
    }

    /// Returns the access point identifier.
    #[must_use]
    pub fn access_point_id(&self) -> AccessPointId {
        self.access_point_id
    }

    /// Returns the event scope identifier when the entry is event-scoped.
    #[must_use]
    pub fn event_id(&self) -> Option<EventId> {
        self.event_id
    }

    /// Returns whether the entry grants (`true`) or denies (`false`) access.
    #[must_use]
    pub fn is_allowed(&self) -> bool {
        self.is_allowed
    }

    /// Returns the first valid day, inclusive.
    #[must_use]
    pub fn valid_from(&self) -> Option<NaiveDate> {
        self.valid_from
    }

    /// Returns the last valid day, inclusive.
    #[must_use]
    pub fn valid_until(&self) -> Option<NaiveDate> {
        self.valid_until
    }

    /// Returns the time-of-day window, absent when the entry spans all day.
    #[must_use]
    pub fn time_window(&self) -> Option<&TimeWindow> {
        self.time_window.as_ref()
    }

    /// Returns the recurrence rule.
    #[must_use]
    pub fn recurrence(&self) -> Recurrence {
        self.recurrence
    }

    /// Returns the weekday set for weekly recurrence.
    #[must_use]
    pub fn recurrence_days(&self) -> &BTreeSet<u8> {
        &self.recurrence_days
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the last update timestamp.
    #[must_use]
    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Returns whether the two entries contradict each other.
    ///
    /// Entries contradict when they target the same (person, access point)
    /// pair, disagree on `is_allowed`, and overlap on every axis: validity
    /// dates (missing bound = unbounded), time of day (missing window = all
    /// day, half-open comparison) and weekdays (weekly entries restricted to
    /// their day set, everything else covering all seven days).
    #[must_use]
    pub fn contradicts(&self, other: &Self) -> bool {
        self.person_id == other.person_id
            && self.access_point_id == other.access_point_id
            && self.is_allowed != other.is_allowed
            && self.dates_overlap(other)
            && self.times_overlap(other)
            && self.weekdays_overlap(other)
    }

    fn dates_overlap(&self, other: &Self) -> bool {
        let self_starts_in_time = match (self.valid_from, other.valid_until) {
            (Some(from), Some(until)) => from <= until,
            _ => true,
        };
        let other_starts_in_time = match (other.valid_from, self.valid_until) {
            (Some(from), Some(until)) => from <= until,
            _ => true,
        };

        self_starts_in_time && other_starts_in_time
    }

    fn times_overlap(&self, other: &Self) -> bool {
        match (&self.time_window, &other.time_window) {
            (Some(own), Some(others)) => own.overlaps(others),
            _ => true,
        }
    }

    fn weekdays_overlap(&self, other: &Self) -> bool {
        match (self.weekly_days(), other.weekly_days()) {
            (Some(own), Some(others)) => !own.is_disjoint(others),
            _ => true,
        }
    }

    fn weekly_days(&self) -> Option<&BTreeSet<u8>> {
        (self.recurrence == Recurrence::Weekly).then_some(&self.recurrence_days)
    }
}

fn validate_shape(input: &WhitelistEntryInput) -> AppResult<Option<TimeWindow>> {
    let mut errors = FieldErrors::new();

    if let (Some(valid_from), Some(valid_until)) = (input.valid_from, input.valid_until)
        && valid_until < valid_from
    {
        errors.push("valid_until", "end date cannot precede the start date");
    }

    match (input.start_time, input.end_time) {
        (Some(start), Some(end)) if end <= start => {
            errors.push("end_time", "end time must be after the start time");
        }
        (Some(_), None) | (None, Some(_)) => {
            errors.push(
                "start_time",
                "a time window requires both a start and an end time",
            );
        }
        _ => {}
    }

    match input.recurrence {
        Recurrence::Weekly => {
            if input.recurrence_days.is_empty() {
                errors.push(
                    "recurrence_days",
                    "weekly recurrence requires at least one weekday",
                );
            } else if input.recurrence_days.iter().any(|day| *day > 6) {
                errors.push(
                    "recurrence_days",
                    "recurrence days must be integers between 0 and 6",
                );
            }
        }
        Recurrence::None | Recurrence::Daily => {
            if !input.recurrence_days.is_empty() {
                errors.push(
                    "recurrence_days",
                    "recurrence days are only allowed with weekly recurrence",
                );
            }
        }
    }

    errors.into_result()?;

    match (input.start_time, input.end_time) {
        (Some(start), Some(end)) => Ok(Some(TimeWindow::new(start, end)?)),
        _ => Ok(None),
    }
}

#[cfg(test)]
mod tests;
