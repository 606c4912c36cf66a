// File: ./src/store.rs
// Store contracts consumed by the sync engine, and their in-memory implementations.
use crate::model::{BillDefinition, CalendarEvent, EventDraft, EventKind, LocalDate, TaskDefinition};
use anyhow::{Result, anyhow};
use chrono::Utc;
use std::collections::HashMap;
use uuid::Uuid;

/// Read access to task definitions.
pub trait TaskSource {
    fn list_tasks(&self) -> Result<Vec<TaskDefinition>>;
}

/// Read access to bill definitions.
pub trait BillSource {
    fn list_bills(&self) -> Result<Vec<BillDefinition>>;
}

/// CRUD access to materialized calendar events.
pub trait CalendarStore {
    fn list_events(&self) -> Result<Vec<CalendarEvent>>;

    /// Inserts a draft, assigning a fresh id and creation timestamp.
    fn add_event(&mut self, draft: EventDraft) -> Result<CalendarEvent>;

    fn delete_event(&mut self, id: &str) -> Result<()>;
}

#[derive(Debug, Clone, Default)]
pub struct TaskStore {
    pub tasks: Vec<TaskDefinition>,
    pub bills: Vec<BillDefinition>,
}

impl TaskStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tasks(tasks: Vec<TaskDefinition>) -> Self {
        Self {
            tasks,
            bills: Vec::new(),
        }
    }

    pub fn get_task(&self, id: &str) -> Option<&TaskDefinition> {
        self.tasks.iter().find(|t| t.id == id)
    }

    /// Replaces the task with the same id, or appends it.
    pub fn upsert_task(&mut self, task: TaskDefinition) {
        if let Some(existing) = self.tasks.iter_mut().find(|t| t.id == task.id) {
            *existing = task;
        } else {
            self.tasks.push(task);
        }
    }

    pub fn delete_task(&mut self, id: &str) -> Option<TaskDefinition> {
        let idx = self.tasks.iter().position(|t| t.id == id)?;
        Some(self.tasks.remove(idx))
    }

    pub fn upsert_bill(&mut self, bill: BillDefinition) {
        if let Some(existing) = self.bills.iter_mut().find(|b| b.id == bill.id) {
            *existing = bill;
        } else {
            self.bills.push(bill);
        }
    }

    pub fn delete_bill(&mut self, id: &str) -> Option<BillDefinition> {
        let idx = self.bills.iter().position(|b| b.id == id)?;
        Some(self.bills.remove(idx))
    }
}

impl TaskSource for TaskStore {
    fn list_tasks(&self) -> Result<Vec<TaskDefinition>> {
        Ok(self.tasks.clone())
    }
}

impl BillSource for TaskStore {
    fn list_bills(&self) -> Result<Vec<BillDefinition>> {
        Ok(self.bills.clone())
    }
}

#[derive(Debug, Clone, Default)]
pub struct EventStore {
    events: Vec<CalendarEvent>,
    index: HashMap<String, usize>,
}

impl EventStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a store from a loaded snapshot. Later copies of a repeated id
    /// are dropped, since only one of them could ever be addressed.
    pub fn from_events(events: Vec<CalendarEvent>) -> Self {
        let mut store = Self::new();
        for event in events {
            if store.index.contains_key(&event.id) {
                log::warn!("Dropping duplicate event {} ('{}')", event.id, event.title);
                continue;
            }
            store.index.insert(event.id.clone(), store.events.len());
            store.events.push(event);
        }
        store
    }

    pub fn events(&self) -> &[CalendarEvent] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&CalendarEvent> {
        self.index.get(id).map(|&i| &self.events[i])
    }

    pub fn events_of_kind(&self, kind: EventKind) -> impl Iterator<Item = &CalendarEvent> {
        self.events.iter().filter(move |e| e.kind == kind)
    }

    /// Events dated within `[from, to]`, sorted chronologically.
    pub fn events_between(&self, from: LocalDate, to: LocalDate) -> Vec<&CalendarEvent> {
        let mut found: Vec<&CalendarEvent> = self
            .events
            .iter()
            .filter(|e| e.date >= from && e.date <= to)
            .collect();
        found.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));
        found
    }

}

impl CalendarStore for EventStore {
    fn list_events(&self) -> Result<Vec<CalendarEvent>> {
        Ok(self.events.clone())
    }

    fn add_event(&mut self, draft: EventDraft) -> Result<CalendarEvent> {
        let event = CalendarEvent::from_draft(Uuid::new_v4().to_string(), draft, Utc::now());
        self.index.insert(event.id.clone(), self.events.len());
        self.events.push(event.clone());
        Ok(event)
    }

    fn delete_event(&mut self, id: &str) -> Result<()> {
        let idx = self
            .index
            .remove(id)
            .ok_or_else(|| anyhow!("Event {} not found", id))?;
        self.events.swap_remove(idx);
        if let Some(moved) = self.events.get(idx) {
            self.index.insert(moved.id.clone(), idx);
        }
        Ok(())
    }
}
