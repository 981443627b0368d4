use chrono::NaiveDate;
use lanewise::config::EngineConfig;
use lanewise::wizard::{
    CargoType, ConfiguratorEngine, CounterpartyTier, EngineEvent, EngineObserver, FieldId,
    FieldValue, ManualClock, NavigationOutcome, ProgressEvent, ReferenceCatalog, RiskLevel,
    SensitivityTier, TransportMode, WizardSection,
};
use std::collections::BTreeSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Default)]
struct EventLog {
    events: Mutex<Vec<EngineEvent>>,
}

impl EventLog {
    fn progress(&self) -> Vec<ProgressEvent> {
        self.events
            .lock()
            .expect("event log mutex poisoned")
            .iter()
            .filter_map(|event| match event {
                EngineEvent::Progress(transition) => Some(*transition),
                _ => None,
            })
            .collect()
    }

    fn recompute_count(&self) -> usize {
        self.events
            .lock()
            .expect("event log mutex poisoned")
            .iter()
            .filter(|event| matches!(event, EngineEvent::Recomputed { .. }))
            .count()
    }
}

impl EngineObserver for EventLog {
    fn notify(&self, event: &EngineEvent) {
        self.events
            .lock()
            .expect("event log mutex poisoned")
            .push(event.clone());
    }
}

fn new_engine() -> (ConfiguratorEngine<ReferenceCatalog>, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::new());
    let engine = ConfiguratorEngine::with_clock(
        Arc::new(ReferenceCatalog::standard()),
        EngineConfig::default(),
        clock.clone(),
    );
    (engine, clock)
}

fn commit(engine: &mut ConfiguratorEngine<ReferenceCatalog>, id: FieldId, value: FieldValue) {
    engine.commit_field(id, value).expect("input field accepted");
}

fn fill_route_and_schedule(engine: &mut ConfiguratorEngine<ReferenceCatalog>) {
    commit(engine, FieldId::TradeLane, FieldValue::Text("VN-US".into()));
    commit(
        engine,
        FieldId::TransportMode,
        FieldValue::Mode(TransportMode::Ocean),
    );
    commit(
        engine,
        FieldId::ServiceRoute,
        FieldValue::Text("VNSGN-USLAX-01".into()),
    );
    commit(
        engine,
        FieldId::DepartureDate,
        FieldValue::Date(NaiveDate::from_ymd_opt(2025, 1, 10).expect("valid date")),
    );
}

#[test]
fn full_configuration_walkthrough_derives_every_downstream_field() {
    let (mut engine, _clock) = new_engine();
    fill_route_and_schedule(&mut engine);

    let form = engine.form();
    assert_eq!(form.text(FieldId::Carrier), Some("Pacific Crown Line"));
    assert_eq!(form.text(FieldId::ScheduleFrequency), Some("weekly"));
    assert_eq!(form.integer(FieldId::TransitDays), Some(20));
    assert_eq!(form.integer(FieldId::SeasonalityIndex), Some(3));
    assert_eq!(
        form.date(FieldId::EstimatedArrival),
        NaiveDate::from_ymd_opt(2025, 2, 2)
    );
    // Pacific Crown Line is 86% on time, minus January seasonality of 3.
    assert_eq!(form.decimal(FieldId::Reliability), Some(83.0));
}

#[test]
fn completed_wizard_scores_and_classifies_the_shipment() {
    let (mut engine, _clock) = new_engine();
    fill_route_and_schedule(&mut engine);
    commit(
        &mut engine,
        FieldId::CargoType,
        FieldValue::Cargo(CargoType::Electronics),
    );
    commit(
        &mut engine,
        FieldId::CargoSensitivity,
        FieldValue::Sensitivity(SensitivityTier::Fragile),
    );
    commit(&mut engine, FieldId::InsuredValue, FieldValue::Decimal(120_000.0));
    commit(
        &mut engine,
        FieldId::CounterpartyTier,
        FieldValue::Counterparty(CounterpartyTier::New),
    );
    commit(
        &mut engine,
        FieldId::MonitoringModules,
        FieldValue::Flags(BTreeSet::from(["gps".to_string(), "temperature".to_string()])),
    );

    assert!(engine.missing_required_fields().is_empty());

    let risk = engine.risk();
    assert!((risk.score - 78.0).abs() < 1e-9);
    assert_eq!(risk.level, RiskLevel::High);
    assert!(risk.components.len() >= 6);
}

#[test]
fn editing_an_upstream_field_reopens_completed_sections() {
    let (mut engine, clock) = new_engine();
    let log = Arc::new(EventLog::default());
    engine.subscribe(log.clone());
    fill_route_and_schedule(&mut engine);

    assert_eq!(
        engine.open_section(WizardSection::Cargo),
        NavigationOutcome::Allowed
    );

    // A keystroke in the trade lane clears the whole downstream cascade.
    engine
        .set_field(FieldId::TradeLane, FieldValue::Text("CN-DE".into()))
        .expect("input field accepted");
    assert!(!engine.form().is_set(FieldId::ServiceRoute));
    assert!(!engine.form().is_set(FieldId::EstimatedArrival));

    clock.advance(Duration::from_millis(250));
    assert!(engine.poll());

    let progress = log.progress();
    assert!(progress.contains(&ProgressEvent::SectionReopened(WizardSection::Schedule)));

    match engine.open_section(WizardSection::Cargo) {
        NavigationOutcome::Redirected { back_to, .. } => {
            assert_eq!(back_to, WizardSection::Schedule);
        }
        NavigationOutcome::Allowed => panic!("cargo must be gated after the cascade"),
    }
}

#[test]
fn keystroke_bursts_coalesce_into_one_recompute() {
    let (mut engine, clock) = new_engine();
    let log = Arc::new(EventLog::default());
    engine.subscribe(log.clone());

    for partial in ["C", "CN", "CN-", "CN-D", "CN-DE"] {
        engine
            .set_field(FieldId::TradeLane, FieldValue::Text(partial.into()))
            .expect("input field accepted");
        clock.advance(Duration::from_millis(30));
        engine.poll();
    }
    assert_eq!(log.recompute_count(), 0, "quiet window still open");

    clock.advance(Duration::from_millis(250));
    assert!(engine.poll());
    assert_eq!(log.recompute_count(), 1);
}

#[test]
fn unknown_route_is_reported_unresolved_not_fatal() {
    let (mut engine, _clock) = new_engine();
    commit(&mut engine, FieldId::TradeLane, FieldValue::Text("VN-US".into()));
    commit(
        &mut engine,
        FieldId::TransportMode,
        FieldValue::Mode(TransportMode::Ocean),
    );
    commit(
        &mut engine,
        FieldId::ServiceRoute,
        FieldValue::Text("VNXXX-NOPE-99".into()),
    );

    assert!(engine.form().is_unresolved(FieldId::Carrier));
    assert!(!engine.form().is_set(FieldId::Carrier));
    // The engine keeps answering risk queries regardless.
    assert!(engine.risk().score >= 0.0);
}

#[test]
fn route_options_narrow_with_lane_and_mode_selection() {
    let (mut engine, _clock) = new_engine();
    assert!(engine.route_options().is_empty());

    commit(&mut engine, FieldId::TradeLane, FieldValue::Text("VN-US".into()));
    commit(
        &mut engine,
        FieldId::TransportMode,
        FieldValue::Mode(TransportMode::Air),
    );

    let options = engine.route_options();
    assert_eq!(options.len(), 1);
    assert_eq!(options[0].route_id, "VNSGN-USORD-A1");
}
