// File: ./src/model/event.rs
use crate::model::date::LocalDate;
use crate::model::task::{Category, Priority};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Origin of a calendar event.
///
/// Only `Task` and `Bill` events are owned by the sync passes; holidays and
/// user-authored events are left alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum EventKind {
    Task,
    Bill,
    Holiday,
    Custom,
}

/// An occurrence ready to be inserted, before the store assigns identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventDraft {
    pub date: LocalDate,
    pub time: Option<String>,
    pub title: String,
    pub kind: EventKind,
    pub category: Option<Category>,
    pub task_id: Option<String>,
    pub bill_id: Option<String>,
    pub priority: Option<Priority>,
    pub description: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl EventDraft {
    /// A user-authored event with no source definition.
    pub fn custom(date: LocalDate, title: &str, kind: EventKind) -> Self {
        Self {
            date,
            time: None,
            title: title.to_string(),
            kind,
            category: None,
            task_id: None,
            bill_id: None,
            priority: None,
            description: None,
            updated_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalendarEvent {
    pub id: String,
    pub date: LocalDate,
    #[serde(default)]
    pub time: Option<String>,
    pub title: String,
    #[serde(rename = "type")]
    pub kind: EventKind,
    #[serde(default)]
    pub category: Option<Category>,
    #[serde(default)]
    pub task_id: Option<String>,
    #[serde(default)]
    pub bill_id: Option<String>,
    #[serde(default)]
    pub priority: Option<Priority>,
    #[serde(default)]
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CalendarEvent {
    /// Materializes a draft with the given identity and creation time.
    pub fn from_draft(id: String, draft: EventDraft, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            date: draft.date,
            time: draft.time,
            title: draft.title,
            kind: draft.kind,
            category: draft.category,
            task_id: draft.task_id,
            bill_id: draft.bill_id,
            priority: draft.priority,
            description: draft.description,
            created_at,
            updated_at: draft.updated_at,
        }
    }

    /// Chronological order: date, then events with a time before all-day ones.
    pub fn sort_key(&self) -> (LocalDate, bool, Option<&str>) {
        (self.date, self.time.is_none(), self.time.as_deref())
    }
}
