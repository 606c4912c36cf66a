// File: ./tests/resync.rs
use anyhow::{Result, anyhow};
use chrono::{DateTime, TimeZone, Utc};
use std::collections::HashSet;
use taskcal::model::{
    BillDefinition, CalendarEvent, EventDraft, EventKind, LocalDate, RecurrencePattern,
    TaskDefinition,
};
use taskcal::store::{CalendarStore, EventStore, TaskSource, TaskStore};
use taskcal::sync::{SyncCoordinator, SyncState};

fn date(y: i32, m: u32, d: u32) -> LocalDate {
    LocalDate::from_ymd(y, m, d).unwrap()
}

fn fixed_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 1, 1, 12, 0, 0).unwrap()
}

fn weekly(name: &str, schedule: &[&str]) -> TaskDefinition {
    let mut t = TaskDefinition::new(name, RecurrencePattern::Weekly);
    t.schedule = schedule.iter().map(|s| s.to_string()).collect();
    t
}

fn one_time(name: &str, on: LocalDate) -> TaskDefinition {
    let mut t = TaskDefinition::new(name, RecurrencePattern::OneTime);
    t.scheduled_date = Some(on);
    t
}

fn task_event_keys(calendar: &EventStore) -> Vec<(LocalDate, String, Option<String>)> {
    let mut keys: Vec<_> = calendar
        .events_of_kind(EventKind::Task)
        .map(|e| (e.date, e.title.clone(), e.task_id.clone()))
        .collect();
    keys.sort();
    keys
}

// Fails deletes for chosen ids and inserts for chosen titles.
struct FlakyCalendar {
    inner: EventStore,
    fail_delete: HashSet<String>,
    fail_insert: HashSet<String>,
}

impl CalendarStore for FlakyCalendar {
    fn list_events(&self) -> Result<Vec<CalendarEvent>> {
        self.inner.list_events()
    }

    fn add_event(&mut self, draft: EventDraft) -> Result<CalendarEvent> {
        if self.fail_insert.contains(&draft.title) {
            return Err(anyhow!("disk full"));
        }
        self.inner.add_event(draft)
    }

    fn delete_event(&mut self, id: &str) -> Result<()> {
        if self.fail_delete.contains(id) {
            return Err(anyhow!("permission denied"));
        }
        self.inner.delete_event(id)
    }
}

struct OfflineTasks;

impl TaskSource for OfflineTasks {
    fn list_tasks(&self) -> Result<Vec<TaskDefinition>> {
        Err(anyhow!("task store unreachable"))
    }
}

struct OfflineCalendar;

impl CalendarStore for OfflineCalendar {
    fn list_events(&self) -> Result<Vec<CalendarEvent>> {
        Err(anyhow!("calendar store unreachable"))
    }

    fn add_event(&mut self, _draft: EventDraft) -> Result<CalendarEvent> {
        Err(anyhow!("calendar store unreachable"))
    }

    fn delete_event(&mut self, _id: &str) -> Result<()> {
        Err(anyhow!("calendar store unreachable"))
    }
}

#[test]
fn test_resync_materializes_projection_union() {
    let gym = weekly("Gym", &["monday", "wednesday"]);
    let mut dentist = one_time("Dentist", date(2025, 3, 10));
    dentist.time = Some("14:00".into());
    let store = TaskStore::with_tasks(vec![gym.clone(), dentist.clone()]);
    let mut calendar = EventStore::new();
    let mut coordinator = SyncCoordinator::default();

    let report = coordinator.resync(&store, &mut calendar, fixed_now()).unwrap();

    let (start, end) = coordinator.horizon(&fixed_now()).unwrap();
    let projector = coordinator.projector();
    let mut expected: Vec<_> = [&gym, &dentist]
        .iter()
        .flat_map(|t| projector.project(t, start, end))
        .map(|d| (d.date, d.title, d.task_id))
        .collect();
    expected.sort();

    assert_eq!(task_event_keys(&calendar), expected);
    assert_eq!(report.created, expected.len());
    assert_eq!(report.deleted, 0);
    assert!(report.is_clean());
    assert_eq!(coordinator.state(), SyncState::Idle);
}

#[test]
fn test_resync_is_idempotent() {
    let store = TaskStore::with_tasks(vec![
        weekly("Gym", &["monday", "wednesday"]),
        TaskDefinition::new("Stretch", RecurrencePattern::Everyday),
        one_time("Dentist", date(2025, 3, 10)),
    ]);
    let mut calendar = EventStore::new();
    let mut coordinator = SyncCoordinator::default();

    let first = coordinator.resync(&store, &mut calendar, fixed_now()).unwrap();
    let after_first = task_event_keys(&calendar);
    let first_ids: HashSet<String> = calendar.events().iter().map(|e| e.id.clone()).collect();

    let second = coordinator.resync(&store, &mut calendar, fixed_now()).unwrap();
    let after_second = task_event_keys(&calendar);

    assert_eq!(after_first, after_second);
    assert_eq!(second.deleted, first.created);
    assert_eq!(second.created, first.created);
    // Regenerated events get fresh ids
    assert!(calendar.events().iter().all(|e| !first_ids.contains(&e.id)));
}

#[test]
fn test_resync_preserves_non_task_events() {
    let store = TaskStore::with_tasks(vec![weekly("Gym", &["friday"])]);
    let mut calendar = EventStore::new();
    let holiday = calendar
        .add_event(EventDraft::custom(date(2025, 12, 25), "Christmas", EventKind::Holiday))
        .unwrap();
    let party = calendar
        .add_event(EventDraft::custom(date(2025, 2, 14), "Dinner", EventKind::Custom))
        .unwrap();
    let mut coordinator = SyncCoordinator::default();

    coordinator.resync(&store, &mut calendar, fixed_now()).unwrap();
    coordinator.resync(&store, &mut calendar, fixed_now()).unwrap();

    assert_eq!(calendar.get(&holiday.id), Some(&holiday));
    assert_eq!(calendar.get(&party.id), Some(&party));
    assert_eq!(
        calendar.len(),
        calendar.events_of_kind(EventKind::Task).count() + 2
    );
}

#[test]
fn test_removed_and_hidden_tasks_lose_their_events() {
    let gym = weekly("Gym", &["monday"]);
    let mut hidden = weekly("Secret", &["tuesday"]);
    hidden.show_in_calendar = false;
    let mut store = TaskStore::with_tasks(vec![gym.clone(), hidden]);
    let mut calendar = EventStore::new();
    let mut coordinator = SyncCoordinator::default();

    coordinator.resync(&store, &mut calendar, fixed_now()).unwrap();
    assert!(calendar.events_of_kind(EventKind::Task).all(|e| e.title == "Gym"));
    assert!(calendar.events_of_kind(EventKind::Task).count() > 0);

    store.delete_task(&gym.id);
    let report = coordinator.resync(&store, &mut calendar, fixed_now()).unwrap();
    assert_eq!(report.created, 0);
    assert_eq!(calendar.events_of_kind(EventKind::Task).count(), 0);
}

#[test]
fn test_every_task_event_references_an_existing_task() {
    let tasks = vec![
        weekly("Gym", &["monday"]),
        one_time("Dentist", date(2025, 3, 10)),
    ];
    let ids: HashSet<String> = tasks.iter().map(|t| t.id.clone()).collect();
    let store = TaskStore::with_tasks(tasks);
    let mut calendar = EventStore::new();
    // A stale event left behind by a task that no longer exists
    let mut orphan = EventDraft::custom(date(2025, 1, 20), "Old", EventKind::Task);
    orphan.task_id = Some("gone".into());
    calendar.add_event(orphan).unwrap();

    SyncCoordinator::default()
        .resync(&store, &mut calendar, fixed_now())
        .unwrap();

    for e in calendar.events_of_kind(EventKind::Task) {
        assert!(ids.contains(e.task_id.as_deref().unwrap()));
    }
}

#[test]
fn test_malformed_task_does_not_block_others() {
    let broken = TaskDefinition::new("Broken", RecurrencePattern::Weekly);
    let store = TaskStore::with_tasks(vec![broken, one_time("Dentist", date(2025, 3, 10))]);
    let mut calendar = EventStore::new();

    let report = SyncCoordinator::default()
        .resync(&store, &mut calendar, fixed_now())
        .unwrap();

    assert_eq!(report.skipped_sources, 1);
    assert_eq!(report.created, 1);
    assert_eq!(calendar.events()[0].title, "Dentist");
}

#[test]
fn test_store_failures_are_counted_and_skipped() {
    let mut inner = EventStore::new();
    let mut stale = EventDraft::custom(date(2025, 1, 20), "Stale", EventKind::Task);
    stale.task_id = Some("old".into());
    let stuck = inner.add_event(stale.clone()).unwrap();
    let removable = inner.add_event(stale).unwrap();

    let mut calendar = FlakyCalendar {
        inner,
        fail_delete: HashSet::from([stuck.id.clone()]),
        fail_insert: HashSet::from(["Flaky".to_string()]),
    };
    let store = TaskStore::with_tasks(vec![
        one_time("Dentist", date(2025, 3, 10)),
        one_time("Flaky", date(2025, 3, 11)),
    ]);

    let report = SyncCoordinator::default()
        .resync(&store, &mut calendar, fixed_now())
        .unwrap();

    assert_eq!(report.deleted, 1);
    assert_eq!(report.failed_deletes, 1);
    assert_eq!(report.created, 1);
    assert_eq!(report.failed_inserts, 1);
    assert!(!report.is_clean());

    // Best effort: the undeletable event stays, the deletable one is gone.
    assert!(calendar.inner.get(&stuck.id).is_some());
    assert!(calendar.inner.get(&removable.id).is_none());
    let titles: Vec<&str> = calendar.inner.events().iter().map(|e| e.title.as_str()).collect();
    assert!(titles.contains(&"Dentist"));
    assert!(!titles.contains(&"Flaky"));
}

#[test]
fn test_unreachable_stores_abort_the_pass() {
    let mut coordinator = SyncCoordinator::default();

    let mut calendar = EventStore::new();
    calendar
        .add_event(EventDraft::custom(date(2025, 1, 20), "Keep", EventKind::Task))
        .unwrap();
    let err = coordinator
        .resync(&OfflineTasks, &mut calendar, fixed_now())
        .unwrap_err();
    assert!(format!("{:#}", err).contains("task store unreachable"));
    assert_eq!(calendar.len(), 1);
    assert_eq!(coordinator.state(), SyncState::Idle);

    let store = TaskStore::with_tasks(vec![weekly("Gym", &["monday"])]);
    assert!(
        coordinator
            .resync(&store, &mut OfflineCalendar, fixed_now())
            .is_err()
    );
    assert_eq!(coordinator.state(), SyncState::Idle);
}

#[test]
fn test_bill_resync_is_separate_from_tasks() {
    let mut store = TaskStore::with_tasks(vec![weekly("Gym", &["monday"])]);
    store.upsert_bill(BillDefinition::new("Rent", 1));
    store.upsert_bill(BillDefinition::new("Broken", 40));
    let mut calendar = EventStore::new();
    let mut coordinator = SyncCoordinator::default();

    coordinator.resync(&store, &mut calendar, fixed_now()).unwrap();
    let tasks_before = task_event_keys(&calendar);

    let first = coordinator.resync_bills(&store, &mut calendar, fixed_now()).unwrap();
    assert_eq!(first.skipped_sources, 1);
    assert!(first.created >= 24);
    assert!(calendar.events_of_kind(EventKind::Bill).all(|e| e.title == "Rent" && e.date.day() == 1));

    let second = coordinator.resync_bills(&store, &mut calendar, fixed_now()).unwrap();
    assert_eq!(second.deleted, first.created);
    assert_eq!(calendar.events_of_kind(EventKind::Bill).count(), first.created);

    // Task resync leaves bill events alone and vice versa
    coordinator.resync(&store, &mut calendar, fixed_now()).unwrap();
    assert_eq!(calendar.events_of_kind(EventKind::Bill).count(), first.created);
    assert_eq!(task_event_keys(&calendar), tasks_before);
}
