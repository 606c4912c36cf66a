// File: ./src/model/task.rs
use crate::model::date::{LocalDate, parse_weekday};
use anyhow::{Result, bail};
use chrono::{DateTime, Utc, Weekday};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};
use uuid::Uuid;

fn default_uid() -> String {
    Uuid::new_v4().to_string()
}

fn default_created_at() -> DateTime<Utc> {
    Utc::now()
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, Display, EnumString, EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Category {
    #[default]
    Personal,
    Work,
    Family,
    Health,
    Finance,
    Education,
    Shopping,
    Social,
    Other,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Display, EnumString, EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Priority {
    Low,
    Medium,
    High,
}

/// How often a task recurs.
///
/// Stored pattern names that this build does not know deserialize to
/// `Unknown`, which is never due and never projected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case", ascii_case_insensitive)]
pub enum RecurrencePattern {
    OneTime,
    Tomorrow,
    Everyday,
    Weekly,
    Biweekly,
    Monthly,
    Yearly,
    #[serde(other)]
    Unknown,
}

impl RecurrencePattern {
    pub fn uses_schedule(&self) -> bool {
        matches!(self, Self::Weekly | Self::Biweekly)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskDefinition {
    #[serde(default = "default_uid")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub category: Category,
    #[serde(default)]
    pub priority: Option<Priority>,
    pub recurrence_pattern: RecurrencePattern,
    /// Weekday names, only read for weekly and biweekly tasks.
    #[serde(default)]
    pub schedule: Vec<String>,
    #[serde(default)]
    pub scheduled_date: Option<LocalDate>,
    #[serde(default)]
    pub recurrence_date: Option<LocalDate>,
    #[serde(default = "default_created_at")]
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub time: Option<String>,
    #[serde(default)]
    pub show_in_calendar: bool,
}

impl TaskDefinition {
    pub fn new(name: &str, pattern: RecurrencePattern) -> Self {
        Self {
            id: default_uid(),
            name: name.to_string(),
            category: Category::default(),
            priority: None,
            recurrence_pattern: pattern,
            schedule: Vec::new(),
            scheduled_date: None,
            recurrence_date: None,
            created_at: Utc::now(),
            time: None,
            show_in_calendar: true,
        }
    }

    /// Local date the task was created on. Anchors `tomorrow`.
    pub fn created_on(&self) -> LocalDate {
        LocalDate::of_instant(&self.created_at)
    }

    /// Anchor for monthly, yearly and biweekly patterns.
    pub fn anchor(&self) -> LocalDate {
        self.recurrence_date.unwrap_or_else(|| self.created_on())
    }

    /// Schedule entries that name a weekday. Unparseable entries are dropped.
    pub fn schedule_weekdays(&self) -> Vec<Weekday> {
        self.schedule
            .iter()
            .filter_map(|s| parse_weekday(s))
            .collect()
    }

    /// Checks the fields the recurrence pattern relies on.
    pub fn validate(&self) -> Result<()> {
        if self.recurrence_pattern.uses_schedule() {
            if self.schedule.is_empty() {
                bail!(
                    "Task '{}' is {} but has an empty schedule",
                    self.id,
                    self.recurrence_pattern
                );
            }
            if let Some(bad) = self.schedule.iter().find(|s| parse_weekday(s).is_none()) {
                bail!("Task '{}' has an unparseable schedule entry '{}'", self.id, bad);
            }
        }
        if self.recurrence_pattern == RecurrencePattern::OneTime && self.scheduled_date.is_none() {
            bail!("Task '{}' is one-time but has no scheduled date", self.id);
        }
        Ok(())
    }
}
