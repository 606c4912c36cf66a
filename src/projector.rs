// File: ./src/projector.rs
// Expands task and bill definitions into dated calendar event drafts.
use crate::config::Config;
use crate::model::{
    BillDefinition, EventDraft, EventKind, LocalDate, RecurrencePattern, TaskDefinition,
};
use crate::recurrence::RecurrenceEngine;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};

// Walking every day of a multi-year horizon dominates sync time, so the
// day-by-day loops stop after a fixed number of days. Occurrences past the
// cap are not materialized until a later resync moves the window forward.

/// Days visited for `everyday` tasks, about one year.
pub const EVERYDAY_CAP: usize = 365;
/// Days visited for weekly, biweekly, monthly and yearly tasks, about two years.
pub const RECURRING_CAP: usize = 730;

pub const DEFAULT_BILL_TIME: &str = "09:00";
pub const DEFAULT_BILL_DESCRIPTION: &str = "Bill payment due";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectionLimits {
    pub everyday_cap: usize,
    pub recurring_cap: usize,
    pub bill_time: String,
    pub bill_description: String,
}

impl Default for ProjectionLimits {
    fn default() -> Self {
        Self {
            everyday_cap: EVERYDAY_CAP,
            recurring_cap: RECURRING_CAP,
            bill_time: DEFAULT_BILL_TIME.to_string(),
            bill_description: DEFAULT_BILL_DESCRIPTION.to_string(),
        }
    }
}

impl From<&Config> for ProjectionLimits {
    fn from(config: &Config) -> Self {
        Self {
            everyday_cap: config.everyday_cap,
            recurring_cap: config.recurring_cap,
            bill_time: config.bill_time.clone(),
            bill_description: config.bill_description.clone(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct EventProjector {
    limits: ProjectionLimits,
}

impl EventProjector {
    pub fn new(limits: ProjectionLimits) -> Self {
        Self { limits }
    }

    /// Every occurrence of `task` in `[start, end]`.
    ///
    /// A malformed task is logged and yields no events.
    pub fn project(&self, task: &TaskDefinition, start: LocalDate, end: LocalDate) -> Vec<EventDraft> {
        match self.try_project(task, start, end) {
            Ok(drafts) => drafts,
            Err(e) => {
                log::warn!("Skipping task '{}' ({}): {:#}", task.name, task.id, e);
                Vec::new()
            }
        }
    }

    /// Like [`project`](Self::project), but reports malformed tasks as errors.
    pub fn try_project(
        &self,
        task: &TaskDefinition,
        start: LocalDate,
        end: LocalDate,
    ) -> Result<Vec<EventDraft>> {
        task.validate()?;
        if end < start {
            return Ok(Vec::new());
        }

        let now = Utc::now();
        let dates: Vec<LocalDate> = match task.recurrence_pattern {
            RecurrencePattern::OneTime => task
                .scheduled_date
                .filter(|d| (start..=end).contains(d))
                .into_iter()
                .collect(),
            RecurrencePattern::Tomorrow => {
                let target = task
                    .created_on()
                    .add_days(1)
                    .context("Creation date is at the end of the calendar range")?;
                if (start..=end).contains(&target) {
                    vec![target]
                } else {
                    vec![]
                }
            }
            RecurrencePattern::Everyday => Self::walk(start, end, self.limits.everyday_cap)
                .collect(),
            RecurrencePattern::Weekly
            | RecurrencePattern::Biweekly
            | RecurrencePattern::Monthly
            | RecurrencePattern::Yearly => Self::walk(start, end, self.limits.recurring_cap)
                .filter(|d| RecurrenceEngine::is_due_on(task, *d))
                .collect(),
            RecurrencePattern::Unknown => {
                log::debug!("Task {} has an unknown recurrence pattern", task.id);
                vec![]
            }
        };

        Ok(dates
            .into_iter()
            .map(|date| Self::task_draft(task, date, now))
            .collect())
    }

    /// Monthly occurrences of `bill` in `[start, end]`, one step per month.
    ///
    /// Months that lack the due day (the 31st in April, the 30th in February)
    /// are skipped rather than clamped.
    pub fn project_bill(
        &self,
        bill: &BillDefinition,
        start: LocalDate,
        end: LocalDate,
    ) -> Vec<EventDraft> {
        if let Err(e) = bill.validate() {
            log::warn!("Skipping bill '{}' ({}): {:#}", bill.name, bill.id, e);
            return Vec::new();
        }

        let now = Utc::now();
        let mut drafts = Vec::new();
        let Some(first_of_month) = LocalDate::from_ymd(start.year(), start.month(), 1) else {
            return drafts;
        };

        let mut offset = 0;
        while let Some(month) = first_of_month.add_months(offset) {
            if month > end {
                break;
            }
            offset += 1;

            let Some(due) = LocalDate::from_ymd(month.year(), month.month(), bill.due_date) else {
                continue;
            };
            if due < start || due > end {
                continue;
            }
            drafts.push(self.bill_draft(bill, due, now));
        }
        drafts
    }

    // Consecutive days from `start` through `end`, visiting at most `cap` days.
    fn walk(start: LocalDate, end: LocalDate, cap: usize) -> impl Iterator<Item = LocalDate> {
        start
            .naive()
            .iter_days()
            .take(cap)
            .map(LocalDate::from_naive)
            .take_while(move |d| *d <= end)
    }

    fn task_draft(task: &TaskDefinition, date: LocalDate, now: DateTime<Utc>) -> EventDraft {
        EventDraft {
            date,
            time: task.time.clone(),
            title: task.name.clone(),
            kind: EventKind::Task,
            category: Some(task.category),
            task_id: Some(task.id.clone()),
            bill_id: None,
            priority: task.priority,
            description: None,
            updated_at: now,
        }
    }

    fn bill_draft(&self, bill: &BillDefinition, date: LocalDate, now: DateTime<Utc>) -> EventDraft {
        let description = match bill.amount {
            Some(amount) => format!("{} ({:.2})", self.limits.bill_description, amount),
            None => self.limits.bill_description.clone(),
        };
        EventDraft {
            date,
            time: Some(self.limits.bill_time.clone()),
            title: bill.name.clone(),
            kind: EventKind::Bill,
            category: None,
            task_id: None,
            bill_id: Some(bill.id.clone()),
            priority: None,
            description: Some(description),
            updated_at: now,
        }
    }
}
