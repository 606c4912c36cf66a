// File: ./src/recurrence.rs
// Decides whether a task has an occurrence on a given date.
use crate::model::{LocalDate, RecurrencePattern, TaskDefinition};

pub struct RecurrenceEngine;

impl RecurrenceEngine {
    /// Returns true when `task` has an occurrence on `date`.
    ///
    /// Pure and total: fields a pattern needs but the task lacks make the
    /// answer `false`, never an error.
    pub fn is_due_on(task: &TaskDefinition, date: LocalDate) -> bool {
        match task.recurrence_pattern {
            RecurrencePattern::OneTime => task.scheduled_date == Some(date),
            RecurrencePattern::Everyday => true,
            RecurrencePattern::Tomorrow => task.created_on().add_days(1) == Some(date),
            RecurrencePattern::Weekly => Self::on_schedule(task, date),
            RecurrencePattern::Biweekly => {
                Self::on_schedule(task, date) && Self::is_even_week(task.anchor(), date)
            }
            RecurrencePattern::Monthly => date.day() == task.anchor().day(),
            RecurrencePattern::Yearly => {
                let anchor = task.anchor();
                date.day() == anchor.day() && date.month() == anchor.month()
            }
            RecurrencePattern::Unknown => false,
        }
    }

    /// Tasks due on `date`, in input order.
    pub fn due_on(tasks: &[TaskDefinition], date: LocalDate) -> Vec<&TaskDefinition> {
        tasks
            .iter()
            .filter(|t| Self::is_due_on(t, date))
            .collect()
    }

    fn on_schedule(task: &TaskDefinition, date: LocalDate) -> bool {
        task.schedule_weekdays().contains(&date.weekday())
    }

    // Parity uses the absolute distance, so weeks before the anchor mirror
    // the weeks after it.
    fn is_even_week(anchor: LocalDate, date: LocalDate) -> bool {
        let weeks = date.days_since(&anchor).abs() / 7;
        weeks % 2 == 0
    }
}
