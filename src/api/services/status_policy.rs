//! Form status rules.
//!
//! Two pure functions: [`can_transition`] decides whether a stored status
//! may be changed, and [`effective_status`] derives the status a client
//! should display for a form in `auto` mode.
//!
//! Transition table:
//!
//! | from  | to                   |
//! |-------|----------------------|
//! | draft | open, close, auto    |
//! | open  | close, auto          |
//! | close | open, auto           |
//! | auto  | (none)               |
//!
//! A status may always be saved unchanged. Nothing ever moves back to
//! `draft`.

use crate::models::{FormStatus, Schedule};
use crate::services::error::{ServiceError, ServiceResult};
use chrono::{DateTime, Utc};

/// Whether `current -> next` is a legal stored-status change.
pub fn can_transition(current: FormStatus, next: FormStatus) -> bool {
    use FormStatus::*;

    if current == next {
        return true;
    }
    matches!(
        (current, next),
        (Draft, Open) | (Draft, Close) | (Draft, Auto) | (Open, Close) | (Open, Auto) | (Close, Open) | (Close, Auto)
    )
}

/// Like [`can_transition`] but produces the domain error naming both states.
pub fn check_transition(current: FormStatus, next: FormStatus) -> ServiceResult<()> {
    if can_transition(current, next) {
        Ok(())
    } else {
        Err(ServiceError::IllegalTransition {
            from: current,
            to: next,
        })
    }
}

/// Statuses reachable from `current`, excluding `current` itself.
pub fn allowed_transitions(current: FormStatus) -> Vec<FormStatus> {
    FormStatus::ALL
        .into_iter()
        .filter(|next| *next != current && can_transition(current, *next))
        .collect()
}

/// Status a client should display.
///
/// Stored statuses other than `auto` are returned as is. For `auto` the
/// schedule decides: no bounds or an inverted window is `draft`, before
/// the start is `draft`, after the end is `close`, inside the window is
/// `open`. Both bounds are inclusive.
pub fn effective_status(status: FormStatus, schedule: &Schedule, now: DateTime<Utc>) -> FormStatus {
    if status != FormStatus::Auto {
        return status;
    }
    if schedule.is_empty() || !schedule.is_valid() {
        return FormStatus::Draft;
    }
    if let Some(start) = schedule.start_at {
        if now < start {
            return FormStatus::Draft;
        }
    }
    if let Some(end) = schedule.end_at {
        if now > end {
            return FormStatus::Close;
        }
    }
    let started = schedule.start_at.is_none_or(|start| now >= start);
    let not_ended = schedule.end_at.is_none_or(|end| now <= end);
    if started && not_ended {
        FormStatus::Open
    } else {
        FormStatus::Draft
    }
}
