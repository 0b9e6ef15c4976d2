//! Scheduler sweep.
//!
//! A background task that periodically moves stored form statuses to
//! match their schedule. Every change goes through the same transition
//! policy as manual edits and is written with compare-and-swap, so a
//! concurrent manual edit is never overwritten.

use crate::models::{Form, FormStatus, Schedule};
use crate::services::status_policy::can_transition;
use crate::storage::{Repository, StorageError};
use chrono::{DateTime, Utc};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

/// Outcome of one sweep pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub scanned: usize,
    pub opened: usize,
    pub closed: usize,
    /// Forms whose scheduled change is not a legal transition.
    pub skipped: usize,
    /// Forms modified concurrently; retried on the next tick.
    pub conflicts: usize,
    pub failed: usize,
}

impl SweepReport {
    pub fn changed(&self) -> usize {
        self.opened + self.closed
    }
}

/// Status the sweep wants to store, or `None` when nothing is due.
///
/// Rules apply in order: a `draft` or `auto` form whose start has passed
/// opens, then an `open` or `auto` form whose end has passed closes.
pub fn sweep_target(status: FormStatus, schedule: &Schedule, now: DateTime<Utc>) -> Option<FormStatus> {
    let mut target = status;

    if matches!(target, FormStatus::Draft | FormStatus::Auto)
        && schedule.start_at.is_some_and(|start| start <= now)
    {
        target = FormStatus::Open;
    }
    if matches!(target, FormStatus::Open | FormStatus::Auto)
        && schedule.end_at.is_some_and(|end| end <= now)
    {
        target = FormStatus::Close;
    }

    (target != status).then_some(target)
}

/// Run one sweep over every form.
///
/// Only a failure to list forms is returned as an error; per-form failures
/// are logged and counted in the report.
pub async fn run_sweep(
    forms: &Repository<Form>,
    now: DateTime<Utc>,
) -> Result<SweepReport, StorageError> {
    let mut report = SweepReport::default();

    for mut form in forms.list().await? {
        report.scanned += 1;

        let current = form.status;
        let Some(target) = sweep_target(current, &form.schedule, now) else {
            continue;
        };

        if !can_transition(current, target) {
            if current == FormStatus::Auto {
                // Auto forms resolve on read.
                debug!("Sweep left auto form {} for read-time resolution", form.id());
            } else {
                warn!(
                    "Sweep skipped form {}: scheduled change '{}' -> '{}' is not a legal transition",
                    form.id(),
                    current,
                    target
                );
            }
            report.skipped += 1;
            continue;
        }

        let id = form.id();
        let version = form.meta.version;
        form.status = target;

        match forms.update(form, Some(version)).await {
            Ok(_) => {
                debug!("Sweep moved form {} from '{}' to '{}'", id, current, target);
                match target {
                    FormStatus::Open => report.opened += 1,
                    _ => report.closed += 1,
                }
            }
            Err(e) if e.is_version_conflict() => {
                debug!("Sweep lost a race on form {}, retrying next tick", id);
                report.conflicts += 1;
            }
            Err(e) => {
                error!("Sweep failed to update form {}: {}", id, e);
                report.failed += 1;
            }
        }
    }

    Ok(report)
}

/// Spawn the periodic sweep. The task never exits on its own; errors are
/// logged and the next tick tries again.
pub fn spawn_sweep_task(forms: Repository<Form>, period: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        info!("Form status sweep running every {:?}", period);

        loop {
            interval.tick().await;

            match run_sweep(&forms, Utc::now()).await {
                Ok(report) if report.changed() > 0 => info!(
                    "Sweep opened {} and closed {} of {} forms",
                    report.opened, report.closed, report.scanned
                ),
                Ok(report) => debug!("Sweep found nothing to change ({} forms)", report.scanned),
                Err(e) => error!("Form status sweep failed: {}", e),
            }
        }
    })
}
