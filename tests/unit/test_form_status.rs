//! Status policy and effective-status resolver tests

use chrono::{Duration, TimeZone, Utc};
use form_platform_api::models::{FormStatus, Schedule};
use form_platform_api::services::status_policy::{allowed_transitions, check_transition};
use form_platform_api::services::{ServiceError, can_transition, effective_status};

const LEGAL: [(FormStatus, FormStatus); 7] = [
    (FormStatus::Draft, FormStatus::Open),
    (FormStatus::Draft, FormStatus::Close),
    (FormStatus::Draft, FormStatus::Auto),
    (FormStatus::Open, FormStatus::Close),
    (FormStatus::Open, FormStatus::Auto),
    (FormStatus::Close, FormStatus::Open),
    (FormStatus::Close, FormStatus::Auto),
];

#[test]
fn test_every_pair_outside_the_table_is_rejected() {
    for current in FormStatus::ALL {
        for next in FormStatus::ALL {
            let expected = current == next || LEGAL.contains(&(current, next));
            assert_eq!(
                can_transition(current, next),
                expected,
                "{current} -> {next}"
            );
        }
    }
}

#[test]
fn test_saving_unchanged_status_is_always_allowed() {
    for status in FormStatus::ALL {
        assert!(can_transition(status, status));
    }
}

#[test]
fn test_nothing_returns_to_draft() {
    for status in [FormStatus::Open, FormStatus::Close, FormStatus::Auto] {
        assert!(!can_transition(status, FormStatus::Draft));
    }
}

#[test]
fn test_illegal_transition_error_names_both_states() {
    let err = check_transition(FormStatus::Open, FormStatus::Draft).unwrap_err();
    assert!(matches!(
        err,
        ServiceError::IllegalTransition {
            from: FormStatus::Open,
            to: FormStatus::Draft
        }
    ));
    let message = err.to_string();
    assert!(message.contains("'open'"));
    assert!(message.contains("'draft'"));
}

#[test]
fn test_allowed_transitions_excludes_self() {
    assert_eq!(
        allowed_transitions(FormStatus::Draft),
        vec![FormStatus::Open, FormStatus::Close, FormStatus::Auto]
    );
    assert!(allowed_transitions(FormStatus::Auto).is_empty());
}

#[test]
fn test_auto_resolves_against_window() {
    let t1 = Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 0).unwrap();
    let t2 = Utc.with_ymd_and_hms(2025, 3, 8, 17, 0, 0).unwrap();
    let schedule = Schedule::new(Some(t1), Some(t2));

    let before = t1 - Duration::seconds(1);
    let inside = t1 + Duration::days(2);
    let after = t2 + Duration::seconds(1);

    assert_eq!(effective_status(FormStatus::Auto, &schedule, before), FormStatus::Draft);
    assert_eq!(effective_status(FormStatus::Auto, &schedule, t1), FormStatus::Open);
    assert_eq!(effective_status(FormStatus::Auto, &schedule, inside), FormStatus::Open);
    assert_eq!(effective_status(FormStatus::Auto, &schedule, t2), FormStatus::Open);
    assert_eq!(effective_status(FormStatus::Auto, &schedule, after), FormStatus::Close);
}

#[test]
fn test_auto_without_bounds_is_draft() {
    let now = Utc::now();
    assert_eq!(
        effective_status(FormStatus::Auto, &Schedule::default(), now),
        FormStatus::Draft
    );
}

#[test]
fn test_auto_with_one_bound() {
    let now = Utc::now();
    let started = Schedule::new(Some(now - Duration::hours(1)), None);
    let ending = Schedule::new(None, Some(now + Duration::hours(1)));
    let ended = Schedule::new(None, Some(now - Duration::hours(1)));

    assert_eq!(effective_status(FormStatus::Auto, &started, now), FormStatus::Open);
    assert_eq!(effective_status(FormStatus::Auto, &ending, now), FormStatus::Open);
    assert_eq!(effective_status(FormStatus::Auto, &ended, now), FormStatus::Close);
}

#[test]
fn test_stored_statuses_pass_through() {
    let now = Utc::now();
    let schedule = Schedule::new(Some(now - Duration::days(1)), Some(now + Duration::days(1)));
    for status in [FormStatus::Draft, FormStatus::Open, FormStatus::Close] {
        assert_eq!(effective_status(status, &schedule, now), status);
    }
}
