// File: ./src/sync.rs
// Reconciles materialized calendar events with the current task and bill definitions.
//
// A pass deletes every event it owns and regenerates the set from scratch.
// There is no rollback: a pass that fails midway leaves whatever the
// per-event error handling produced, and the next pass heals it.
use crate::model::{EventDraft, EventKind, LocalDate};
use crate::projector::EventProjector;
use crate::store::{BillSource, CalendarStore, TaskSource};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};

pub const DEFAULT_HORIZON_MONTHS: u32 = 24;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SyncState {
    #[default]
    Idle,
    Syncing,
}

/// Outcome counters for one reconciliation pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SyncReport {
    pub deleted: usize,
    pub created: usize,
    pub failed_deletes: usize,
    pub failed_inserts: usize,
    pub skipped_sources: usize,
}

impl SyncReport {
    pub fn is_clean(&self) -> bool {
        self.failed_deletes == 0 && self.failed_inserts == 0 && self.skipped_sources == 0
    }
}

#[derive(Debug, Clone)]
pub struct SyncCoordinator {
    projector: EventProjector,
    horizon_months: u32,
    state: SyncState,
}

impl Default for SyncCoordinator {
    fn default() -> Self {
        Self::new(EventProjector::default(), DEFAULT_HORIZON_MONTHS)
    }
}

impl SyncCoordinator {
    pub fn new(projector: EventProjector, horizon_months: u32) -> Self {
        Self {
            projector,
            horizon_months,
            state: SyncState::Idle,
        }
    }

    pub fn state(&self) -> SyncState {
        self.state
    }

    pub fn projector(&self) -> &EventProjector {
        &self.projector
    }

    /// The projection window for a pass started at `now`.
    pub fn horizon(&self, now: &DateTime<Utc>) -> Result<(LocalDate, LocalDate)> {
        let start = LocalDate::of_instant(now);
        let end = start
            .add_months(self.horizon_months)
            .context("Sync horizon overflows the calendar")?;
        Ok((start, end))
    }

    /// Replaces every `task` event with a fresh projection of the current tasks.
    ///
    /// Failing to list tasks or events aborts the pass. A single failed delete
    /// or insert is logged and counted, and the pass carries on.
    pub fn resync(
        &mut self,
        tasks: &dyn TaskSource,
        calendar: &mut dyn CalendarStore,
        now: DateTime<Utc>,
    ) -> Result<SyncReport> {
        self.state = SyncState::Syncing;
        let result = self.resync_tasks(tasks, calendar, now);
        self.state = SyncState::Idle;
        result
    }

    /// Replaces every `bill` event with a fresh projection of the current bills.
    pub fn resync_bills(
        &mut self,
        bills: &dyn BillSource,
        calendar: &mut dyn CalendarStore,
        now: DateTime<Utc>,
    ) -> Result<SyncReport> {
        self.state = SyncState::Syncing;
        let result = self.resync_bill_events(bills, calendar, now);
        self.state = SyncState::Idle;
        result
    }

    fn resync_tasks(
        &self,
        tasks: &dyn TaskSource,
        calendar: &mut dyn CalendarStore,
        now: DateTime<Utc>,
    ) -> Result<SyncReport> {
        let tasks = tasks.list_tasks().context("Failed to list tasks")?;
        let (start, end) = self.horizon(&now)?;
        let mut report = SyncReport::default();

        Self::purge(calendar, EventKind::Task, &mut report)?;

        for task in tasks.iter().filter(|t| t.show_in_calendar) {
            let drafts = match self.projector.try_project(task, start, end) {
                Ok(drafts) => drafts,
                Err(e) => {
                    log::warn!("Skipping task '{}' ({}): {:#}", task.name, task.id, e);
                    report.skipped_sources += 1;
                    continue;
                }
            };
            for draft in drafts {
                Self::insert(calendar, draft, &mut report);
            }
        }

        log::info!(
            "Task resync: {} removed, {} created over {}..{} ({} failed deletes, {} failed inserts, {} skipped)",
            report.deleted,
            report.created,
            start,
            end,
            report.failed_deletes,
            report.failed_inserts,
            report.skipped_sources
        );
        Ok(report)
    }

    fn resync_bill_events(
        &self,
        bills: &dyn BillSource,
        calendar: &mut dyn CalendarStore,
        now: DateTime<Utc>,
    ) -> Result<SyncReport> {
        let bills = bills.list_bills().context("Failed to list bills")?;
        let (start, end) = self.horizon(&now)?;
        let mut report = SyncReport::default();

        Self::purge(calendar, EventKind::Bill, &mut report)?;

        for bill in &bills {
            if bill.validate().is_err() {
                report.skipped_sources += 1;
            }
            for draft in self.projector.project_bill(bill, start, end) {
                Self::insert(calendar, draft, &mut report);
            }
        }

        log::info!(
            "Bill resync: {} removed, {} created ({} failed deletes, {} failed inserts)",
            report.deleted,
            report.created,
            report.failed_deletes,
            report.failed_inserts
        );
        Ok(report)
    }

    fn purge(calendar: &mut dyn CalendarStore, kind: EventKind, report: &mut SyncReport) -> Result<()> {
        let owned: Vec<String> = calendar
            .list_events()
            .context("Failed to list calendar events")?
            .into_iter()
            .filter(|e| e.kind == kind)
            .map(|e| e.id)
            .collect();

        for id in owned {
            match calendar.delete_event(&id) {
                Ok(()) => report.deleted += 1,
                Err(e) => {
                    log::error!("Failed to delete {} event {}: {:#}", kind, id, e);
                    report.failed_deletes += 1;
                }
            }
        }
        Ok(())
    }

    fn insert(calendar: &mut dyn CalendarStore, draft: EventDraft, report: &mut SyncReport) {
        let (date, title) = (draft.date, draft.title.clone());
        match calendar.add_event(draft) {
            Ok(_) => report.created += 1,
            Err(e) => {
                log::error!("Failed to insert event '{}' on {}: {:#}", title, date, e);
                report.failed_inserts += 1;
            }
        }
    }
}
