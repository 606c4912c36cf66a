// File: ./tests/bill_projection.rs
use taskcal::model::{BillDefinition, EventKind, LocalDate};
use taskcal::projector::{DEFAULT_BILL_DESCRIPTION, DEFAULT_BILL_TIME, EventProjector, ProjectionLimits};

fn date(y: i32, m: u32, d: u32) -> LocalDate {
    LocalDate::from_ymd(y, m, d).unwrap()
}

fn keys(drafts: &[taskcal::model::EventDraft]) -> Vec<String> {
    drafts.iter().map(|d| d.date.key()).collect()
}

#[test]
fn test_rent_on_31st_skips_february() {
    let rent = BillDefinition::new("Rent", 31);
    let drafts = EventProjector::default().project_bill(&rent, date(2023, 1, 1), date(2023, 3, 31));
    assert_eq!(keys(&drafts), vec!["2023-01-31", "2023-03-31"]);

    for d in &drafts {
        assert_eq!(d.title, "Rent");
        assert_eq!(d.kind, EventKind::Bill);
        assert_eq!(d.time.as_deref(), Some(DEFAULT_BILL_TIME));
        assert_eq!(d.description.as_deref(), Some(DEFAULT_BILL_DESCRIPTION));
        assert_eq!(d.bill_id.as_deref(), Some(rent.id.as_str()));
        assert!(d.task_id.is_none());
    }
}

#[test]
fn test_first_occurrence_at_or_after_start() {
    let phone = BillDefinition::new("Phone", 10);
    let projector = EventProjector::default();

    let drafts = projector.project_bill(&phone, date(2025, 1, 15), date(2025, 4, 30));
    assert_eq!(keys(&drafts), vec!["2025-02-10", "2025-03-10", "2025-04-10"]);

    // The start day itself counts
    let drafts = projector.project_bill(&phone, date(2025, 1, 10), date(2025, 1, 10));
    assert_eq!(keys(&drafts), vec!["2025-01-10"]);
}

#[test]
fn test_february_29_only_in_leap_years() {
    let bill = BillDefinition::new("Insurance", 29);
    let drafts = EventProjector::default().project_bill(&bill, date(2023, 2, 1), date(2024, 3, 1));
    let februaries: Vec<String> = drafts
        .iter()
        .filter(|d| d.date.month() == 2)
        .map(|d| d.date.key())
        .collect();
    assert_eq!(februaries, vec!["2024-02-29"]);
    // Feb 2023 is skipped; Mar 2023 .. Jan 2024 plus Feb 2024
    assert_eq!(drafts.len(), 12);
}

#[test]
fn test_long_horizon_steps_by_month() {
    let bill = BillDefinition::new("Gym membership", 1);
    let drafts = EventProjector::default().project_bill(&bill, date(2025, 1, 1), date(2029, 12, 31));
    assert_eq!(drafts.len(), 60);
}

#[test]
fn test_amount_and_configured_defaults() {
    let mut bill = BillDefinition::new("Water", 5);
    bill.amount = Some(42.5);
    let projector = EventProjector::new(ProjectionLimits {
        bill_time: "18:00".into(),
        bill_description: "Pay".into(),
        ..ProjectionLimits::default()
    });

    let drafts = projector.project_bill(&bill, date(2025, 6, 1), date(2025, 6, 30));
    assert_eq!(drafts.len(), 1);
    assert_eq!(drafts[0].time.as_deref(), Some("18:00"));
    assert_eq!(drafts[0].description.as_deref(), Some("Pay (42.50)"));
}

#[test]
fn test_invalid_due_day_yields_nothing() {
    let projector = EventProjector::default();
    for day in [0, 32] {
        let bill = BillDefinition::new("Broken", day);
        assert!(projector.project_bill(&bill, date(2025, 1, 1), date(2025, 12, 31)).is_empty());
    }
}
