// File: ./src/model/mod.rs
// Aggregates the split model files
pub mod bill;
pub mod date;
pub mod event;
pub mod task;

pub use bill::BillDefinition;
pub use date::LocalDate;
pub use event::{CalendarEvent, EventDraft, EventKind};
pub use task::{Category, Priority, RecurrencePattern, TaskDefinition};
