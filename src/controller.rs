// File: ./src/controller.rs
//! Entry point for every calendar mutation.
//! UI layers call into this controller instead of touching the stores or the
//! sync engine directly. Each task or bill mutation is persisted and followed
//! by a full resync, and resyncs are serialized behind the coordinator lock.
use crate::config::Config;
use crate::context::AppContext;
use crate::model::{
    BillDefinition, CalendarEvent, EventDraft, EventKind, LocalDate, TaskDefinition,
};
use crate::projector::{EventProjector, ProjectionLimits};
use crate::recurrence::RecurrenceEngine;
use crate::storage::LocalStorage;
use crate::store::{CalendarStore, EventStore, TaskStore};
use crate::sync::{SyncCoordinator, SyncReport};
use anyhow::{Result, bail};
use chrono::Utc;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Reports from one controller-level resync.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SyncOutcome {
    pub tasks: SyncReport,
    pub bills: Option<SyncReport>,
}

// Lock order: coordinator, then tasks, then calendar.
#[derive(Clone)]
pub struct CalendarController {
    pub tasks: Arc<Mutex<TaskStore>>,
    pub calendar: Arc<Mutex<EventStore>>,
    coordinator: Arc<Mutex<SyncCoordinator>>,
    pub ctx: Arc<dyn AppContext>,
    config: Config,
}

impl CalendarController {
    pub fn new(tasks: TaskStore, calendar: EventStore, ctx: Arc<dyn AppContext>, config: Config) -> Self {
        let projector = EventProjector::new(ProjectionLimits::from(&config));
        let coordinator = SyncCoordinator::new(projector, config.horizon_months);
        Self {
            tasks: Arc::new(Mutex::new(tasks)),
            calendar: Arc::new(Mutex::new(calendar)),
            coordinator: Arc::new(Mutex::new(coordinator)),
            ctx,
            config,
        }
    }

    /// Loads the task, bill and event snapshots from the context's data dir.
    pub fn open(ctx: Arc<dyn AppContext>, config: Config) -> Result<Self> {
        let store = TaskStore {
            tasks: LocalStorage::load_tasks(ctx.as_ref())?,
            bills: LocalStorage::load_bills(ctx.as_ref())?,
        };
        let calendar = EventStore::from_events(LocalStorage::load_events(ctx.as_ref())?);
        log::debug!(
            "Opened {} tasks, {} bills, {} events",
            store.tasks.len(),
            store.bills.len(),
            calendar.len()
        );
        Ok(Self::new(store, calendar, ctx, config))
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Regenerates task events, and bill events when `sync_bills` is set,
    /// then persists the calendar.
    pub async fn resync(&self) -> Result<SyncOutcome> {
        let mut coordinator = self.coordinator.lock().await;
        let tasks = self.tasks.lock().await;
        let mut calendar = self.calendar.lock().await;
        let now = Utc::now();

        let task_report = coordinator.resync(&*tasks, &mut *calendar, now)?;
        let bill_report = if self.config.sync_bills {
            Some(coordinator.resync_bills(&*tasks, &mut *calendar, now)?)
        } else {
            None
        };

        LocalStorage::save_events(self.ctx.as_ref(), calendar.events())?;
        Ok(SyncOutcome {
            tasks: task_report,
            bills: bill_report,
        })
    }

    /// Adds or replaces a task definition, then resyncs.
    pub async fn upsert_task(&self, task: TaskDefinition) -> Result<SyncOutcome> {
        {
            let mut tasks = self.tasks.lock().await;
            log::info!("Saving task '{}' ({})", task.name, task.id);
            tasks.upsert_task(task);
            LocalStorage::save_tasks(self.ctx.as_ref(), &tasks.tasks)?;
        }
        self.resync().await
    }

    /// Removes a task definition, then resyncs so its events disappear.
    pub async fn delete_task(&self, id: &str) -> Result<SyncOutcome> {
        {
            let mut tasks = self.tasks.lock().await;
            if tasks.delete_task(id).is_none() {
                bail!("Task {} not found", id);
            }
            LocalStorage::save_tasks(self.ctx.as_ref(), &tasks.tasks)?;
        }
        self.resync().await
    }

    /// Merges a batch of task definitions with a single resync at the end.
    pub async fn import_tasks(&self, incoming: Vec<TaskDefinition>) -> Result<SyncOutcome> {
        {
            let mut tasks = self.tasks.lock().await;
            log::info!("Importing {} tasks", incoming.len());
            for task in incoming {
                tasks.upsert_task(task);
            }
            LocalStorage::save_tasks(self.ctx.as_ref(), &tasks.tasks)?;
        }
        self.resync().await
    }

    pub async fn upsert_bill(&self, bill: BillDefinition) -> Result<SyncOutcome> {
        bill.validate()?;
        {
            let mut tasks = self.tasks.lock().await;
            tasks.upsert_bill(bill);
            LocalStorage::save_bills(self.ctx.as_ref(), &tasks.bills)?;
        }
        self.resync().await
    }

    pub async fn delete_bill(&self, id: &str) -> Result<SyncOutcome> {
        {
            let mut tasks = self.tasks.lock().await;
            if tasks.delete_bill(id).is_none() {
                bail!("Bill {} not found", id);
            }
            LocalStorage::save_bills(self.ctx.as_ref(), &tasks.bills)?;
        }
        self.resync().await
    }

    /// Adds a holiday or user-authored event. Task and bill events belong to
    /// the sync passes and cannot be added by hand.
    pub async fn add_event(&self, draft: EventDraft) -> Result<CalendarEvent> {
        if matches!(draft.kind, EventKind::Task | EventKind::Bill) {
            bail!("{} events are generated by resync", draft.kind);
        }
        let mut calendar = self.calendar.lock().await;
        let event = calendar.add_event(draft)?;
        LocalStorage::save_events(self.ctx.as_ref(), calendar.events())?;
        Ok(event)
    }

    pub async fn delete_event(&self, id: &str) -> Result<()> {
        let mut calendar = self.calendar.lock().await;
        match calendar.get(id) {
            None => bail!("Event {} not found", id),
            Some(e) if matches!(e.kind, EventKind::Task | EventKind::Bill) => {
                bail!("{} events are generated by resync", e.kind)
            }
            Some(_) => {}
        }
        calendar.delete_event(id)?;
        LocalStorage::save_events(self.ctx.as_ref(), calendar.events())
    }

    pub async fn events_between(&self, from: LocalDate, to: LocalDate) -> Vec<CalendarEvent> {
        let calendar = self.calendar.lock().await;
        calendar.events_between(from, to).into_iter().cloned().collect()
    }

    pub async fn due_on(&self, date: LocalDate) -> Vec<TaskDefinition> {
        let tasks = self.tasks.lock().await;
        RecurrenceEngine::due_on(&tasks.tasks, date)
            .into_iter()
            .cloned()
            .collect()
    }

    /// Previews the projection of one task over `days` days from today.
    pub async fn preview(&self, id: &str, days: u64) -> Result<Vec<EventDraft>> {
        let coordinator = self.coordinator.lock().await;
        let tasks = self.tasks.lock().await;
        let Some(task) = tasks.get_task(id) else {
            bail!("Task {} not found", id);
        };
        let start = LocalDate::today();
        let end = start.add_days(days.saturating_sub(1)).unwrap_or(start);
        coordinator.projector().try_project(task, start, end)
    }
}
