use std::collections::BTreeSet;

use chrono::{NaiveDate, NaiveTime};
use gatewarden_core::AppError;
use proptest::prelude::*;
use uuid::Uuid;

use super::{Recurrence, WhitelistEntry, WhitelistEntryInput};
use crate::person::PersonId;
use crate::site::AccessPointId;

fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap_or_default()
}

fn time(hour: u32, minute: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(hour, minute, 0).unwrap_or_default()
}

fn base_input(person_id: PersonId, access_point_id: AccessPointId) -> WhitelistEntryInput {
    WhitelistEntryInput {
        person_id,
        access_point_id,
        event_id: None,
        is_allowed: true,
        valid_from: None,
        valid_until: None,
        start_time: None,
        end_time: None,
        recurrence: Recurrence::None,
        recurrence_days: BTreeSet::new(),
    }
}

fn entry(input: WhitelistEntryInput) -> WhitelistEntry {
    WhitelistEntry::create(input).unwrap_or_else(|_| unreachable!())
}

#[test]
fn rejects_inverted_date_range() {
    let mut input = base_input(PersonId::new(), AccessPointId::new());
    input.valid_from = Some(date(2024, 2, 1));
    input.valid_until = Some(date(2024, 1, 1));

    let result = WhitelistEntry::create(input);
    assert!(matches!(result, Err(AppError::FieldValidation(_))));
}

#[test]
fn rejects_half_specified_time_window() {
    let mut input = base_input(PersonId::new(), AccessPointId::new());
    input.start_time = Some(time(9, 0));

    let result = WhitelistEntry::create(input);
    let Err(AppError::FieldValidation(errors)) = result else {
        unreachable!();
    };
    assert!(errors.as_map().contains_key("start_time"));
}

#[test]
fn rejects_weekly_without_days_and_inverted_times_together() {
    let mut input = base_input(PersonId::new(), AccessPointId::new());
    input.start_time = Some(time(18, 0));
    input.end_time = Some(time(9, 0));
    input.recurrence = Recurrence::Weekly;

    let result = WhitelistEntry::create(input);
    let Err(AppError::FieldValidation(errors)) = result else {
        unreachable!();
    };
    assert!(errors.as_map().contains_key("end_time"));
    assert!(errors.as_map().contains_key("recurrence_days"));
}

#[test]
fn rejects_out_of_range_recurrence_days() {
    let mut input = base_input(PersonId::new(), AccessPointId::new());
    input.recurrence = Recurrence::Weekly;
    input.recurrence_days = BTreeSet::from([2, 7]);

    assert!(WhitelistEntry::create(input).is_err());
}

#[test]
fn rejects_recurrence_days_without_weekly_recurrence() {
    let mut input = base_input(PersonId::new(), AccessPointId::new());
    input.recurrence = Recurrence::Daily;
    input.recurrence_days = BTreeSet::from([0]);

    assert!(WhitelistEntry::create(input).is_err());
}

#[test]
fn same_decision_never_contradicts_even_when_coincident() {
    let person_id = PersonId::new();
    let access_point_id = AccessPointId::new();
    let mut input = base_input(person_id, access_point_id);
    input.valid_from = Some(date(2024, 1, 1));
    input.valid_until = Some(date(2024, 12, 31));

    let first = entry(input.clone());
    let second = entry(input);
    assert!(!first.contradicts(&second));
}

#[test]
fn different_pair_never_contradicts() {
    let mut allowed = base_input(PersonId::new(), AccessPointId::new());
    allowed.is_allowed = true;
    let mut denied = base_input(PersonId::new(), AccessPointId::new());
    denied.is_allowed = false;

    assert!(!entry(allowed).contradicts(&entry(denied)));
}

#[test]
fn disjoint_date_ranges_do_not_contradict() {
    let person_id = PersonId::new();
    let access_point_id = AccessPointId::new();

    let mut january = base_input(person_id, access_point_id);
    january.valid_from = Some(date(2024, 1, 1));
    january.valid_until = Some(date(2024, 1, 31));

    let mut february = base_input(person_id, access_point_id);
    february.is_allowed = false;
    february.valid_from = Some(date(2024, 2, 1));
    february.valid_until = Some(date(2024, 2, 28));

    assert!(!entry(january).contradicts(&entry(february)));
}

#[test]
fn unbounded_candidate_overlaps_any_dates() {
    let person_id = PersonId::new();
    let access_point_id = AccessPointId::new();

    let unbounded = base_input(person_id, access_point_id);

    let mut bounded = base_input(person_id, access_point_id);
    bounded.is_allowed = false;
    bounded.valid_from = Some(date(2030, 6, 1));
    bounded.valid_until = Some(date(2030, 6, 30));

    assert!(entry(unbounded).contradicts(&entry(bounded)));
}

#[test]
fn touching_time_windows_do_not_contradict() {
    let person_id = PersonId::new();
    let access_point_id = AccessPointId::new();

    let mut morning = base_input(person_id, access_point_id);
    morning.start_time = Some(time(8, 0));
    morning.end_time = Some(time(12, 0));

    let mut afternoon = base_input(person_id, access_point_id);
    afternoon.is_allowed = false;
    afternoon.start_time = Some(time(12, 0));
    afternoon.end_time = Some(time(18, 0));

    assert!(!entry(morning).contradicts(&entry(afternoon)));
}

#[test]
fn missing_time_window_overlaps_any_window() {
    let person_id = PersonId::new();
    let access_point_id = AccessPointId::new();

    let all_day = base_input(person_id, access_point_id);

    let mut evening = base_input(person_id, access_point_id);
    evening.is_allowed = false;
    evening.start_time = Some(time(19, 0));
    evening.end_time = Some(time(22, 0));

    assert!(entry(all_day).contradicts(&entry(evening)));
}

#[test]
fn weekly_candidate_conflicts_with_all_days_entry() {
    let person_id = PersonId::new();
    let access_point_id = AccessPointId::new();

    let mut full_range = base_input(person_id, access_point_id);
    full_range.valid_from = Some(date(2024, 1, 1));
    full_range.valid_until = Some(date(2024, 12, 31));

    let mut wednesdays = base_input(person_id, access_point_id);
    wednesdays.is_allowed = false;
    wednesdays.recurrence = Recurrence::Weekly;
    wednesdays.recurrence_days = BTreeSet::from([2]);

    assert!(entry(wednesdays).contradicts(&entry(full_range)));
}

#[test]
fn weekly_entries_on_disjoint_days_do_not_contradict() {
    let person_id = PersonId::new();
    let access_point_id = AccessPointId::new();

    let mut mondays = base_input(person_id, access_point_id);
    mondays.recurrence = Recurrence::Weekly;
    mondays.recurrence_days = BTreeSet::from([0]);

    let mut fridays = base_input(person_id, access_point_id);
    fridays.is_allowed = false;
    fridays.recurrence = Recurrence::Weekly;
    fridays.recurrence_days = BTreeSet::from([4]);

    assert!(!entry(mondays).contradicts(&entry(fridays)));
}

#[test]
fn weekly_entries_sharing_a_day_contradict() {
    let person_id = PersonId::new();
    let access_point_id = AccessPointId::new();

    let mut weekdays = base_input(person_id, access_point_id);
    weekdays.recurrence = Recurrence::Weekly;
    weekdays.recurrence_days = BTreeSet::from([0, 1, 2, 3, 4]);

    let mut weekend_plus_friday = base_input(person_id, access_point_id);
    weekend_plus_friday.is_allowed = false;
    weekend_plus_friday.recurrence = Recurrence::Weekly;
    weekend_plus_friday.recurrence_days = BTreeSet::from([4, 5, 6]);

    assert!(entry(weekdays).contradicts(&entry(weekend_plus_friday)));
}

#[test]
fn update_grant_preserves_identity_and_schedule() {
    let person_id = PersonId::new();
    let access_point_id = AccessPointId::new();
    let mut input = base_input(person_id, access_point_id);
    input.start_time = Some(time(9, 0));
    input.end_time = Some(time(17, 0));

    let original = entry(input);
    let updated = original.update_grant(false, Some(date(2024, 5, 1)), Some(date(2024, 5, 31)));
    assert!(updated.is_ok());
    let updated = updated.unwrap_or_else(|_| unreachable!());

    assert_eq!(updated.id(), original.id());
    assert_eq!(updated.created_at(), original.created_at());
    assert!(!updated.is_allowed());
    assert_eq!(updated.time_window(), original.time_window());
}

fn shared_pair_input() -> impl Strategy<Value = WhitelistEntryInput> {
    let person_id = PersonId::from_uuid(Uuid::from_u128(1));
    let access_point_id = AccessPointId::from_uuid(Uuid::from_u128(2));

    let dates = (
        proptest::option::of(0i64..30),
        proptest::option::of(0i64..30),
    )
        .prop_map(|(from_offset, length)| {
            let base = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap_or_default();
            let valid_from = from_offset.map(|offset| base + chrono::Days::new(offset as u64));
            let valid_until = length.map(|length| {
                let anchor = valid_from.unwrap_or(base);
                anchor + chrono::Days::new(length as u64)
            });
            (valid_from, valid_until)
        });

    let times = proptest::option::of((0u32..23, 1u32..=4)).prop_map(|window| {
        window.map(|(start_hour, span)| {
            let start = NaiveTime::from_hms_opt(start_hour, 0, 0).unwrap_or_default();
            let end =
                NaiveTime::from_hms_opt((start_hour + span).min(23), 59, 0).unwrap_or_default();
            (start, end)
        })
    });

    let recurrence = prop_oneof![
        Just((Recurrence::None, BTreeSet::<u8>::new())),
        Just((Recurrence::Daily, BTreeSet::<u8>::new())),
        proptest::collection::btree_set(0u8..=6, 1..=7)
            .prop_map(|days| (Recurrence::Weekly, days)),
    ];

    (any::<bool>(), dates, times, recurrence).prop_map(
        move |(is_allowed, (valid_from, valid_until), window, (recurrence, recurrence_days))| {
            WhitelistEntryInput {
                person_id,
                access_point_id,
                event_id: None,
                is_allowed,
                valid_from,
                valid_until,
                start_time: window.map(|(start, _)| start),
                end_time: window.map(|(_, end)| end),
                recurrence,
                recurrence_days,
            }
        },
    )
}

proptest! {
    #[test]
    fn contradiction_is_symmetric(
        left_input in shared_pair_input(),
        right_input in shared_pair_input(),
    ) {
        let left = entry(left_input);
        let right = entry(right_input);

        prop_assert_eq!(left.contradicts(&right), right.contradicts(&left));
        if left.is_allowed() == right.is_allowed() {
            prop_assert!(!left.contradicts(&right));
        }
    }
}
