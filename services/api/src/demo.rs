use crate::infra::InMemoryScenarioRepository;
use chrono::{Local, NaiveDate};
use clap::Args;
use lanewise::config::EngineConfig;
use lanewise::error::AppError;
use lanewise::simulation::{
    FactorKey, FactorWeights, SimulationService, SimulationSession,
};
use lanewise::wizard::{
    CargoType, ConfiguratorEngine, CounterpartyTier, FieldId, FieldValue, NavigationOutcome,
    ReferenceCatalog, SensitivityTier, TransportMode, WizardSection,
};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

#[derive(Args, Debug)]
pub(crate) struct AssessArgs {
    /// Trade lane identifier, e.g. VN-US
    #[arg(long)]
    pub(crate) trade_lane: String,
    /// Transport mode: ocean, air, road, or rail
    #[arg(long, value_parser = parse_mode)]
    pub(crate) transport_mode: TransportMode,
    /// Service route identifier, e.g. VNSGN-USLAX-01
    #[arg(long)]
    pub(crate) service_route: String,
    /// Departure date (YYYY-MM-DD)
    #[arg(long, value_parser = crate::infra::parse_date)]
    pub(crate) departure_date: NaiveDate,
    /// Cargo category, e.g. electronics
    #[arg(long, value_parser = parse_cargo)]
    pub(crate) cargo_type: CargoType,
    /// Handling tier: standard, temperature_controlled, or fragile
    #[arg(long, default_value = "standard", value_parser = parse_sensitivity)]
    pub(crate) cargo_sensitivity: SensitivityTier,
    /// Declared insured value in USD
    #[arg(long)]
    pub(crate) insured_value: f64,
    /// Counterparty relationship: new, repeat, or established
    #[arg(long, default_value = "new", value_parser = parse_counterparty)]
    pub(crate) counterparty_tier: CounterpartyTier,
    /// Monitoring modules to enable (repeatable)
    #[arg(long = "monitoring")]
    pub(crate) monitoring_modules: Vec<String>,
}

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Departure date for the scripted shipment (defaults to today)
    #[arg(long, value_parser = crate::infra::parse_date)]
    pub(crate) departure_date: Option<NaiveDate>,
    /// Skip the what-if simulation half of the walkthrough
    #[arg(long)]
    pub(crate) skip_simulation: bool,
}

fn parse_mode(raw: &str) -> Result<TransportMode, String> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "ocean" => Ok(TransportMode::Ocean),
        "air" => Ok(TransportMode::Air),
        "road" => Ok(TransportMode::Road),
        "rail" => Ok(TransportMode::Rail),
        other => Err(format!("unknown transport mode '{other}'")),
    }
}

fn parse_cargo(raw: &str) -> Result<CargoType, String> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "general_merchandise" | "general" => Ok(CargoType::GeneralMerchandise),
        "apparel" => Ok(CargoType::Apparel),
        "machinery" => Ok(CargoType::Machinery),
        "electronics" => Ok(CargoType::Electronics),
        "pharmaceuticals" | "pharma" => Ok(CargoType::Pharmaceuticals),
        "perishables" => Ok(CargoType::Perishables),
        "hazardous_materials" | "hazmat" => Ok(CargoType::HazardousMaterials),
        other => Err(format!("unknown cargo category '{other}'")),
    }
}

fn parse_sensitivity(raw: &str) -> Result<SensitivityTier, String> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "standard" => Ok(SensitivityTier::Standard),
        "temperature_controlled" | "temperature" => Ok(SensitivityTier::TemperatureControlled),
        "fragile" => Ok(SensitivityTier::Fragile),
        other => Err(format!("unknown sensitivity tier '{other}'")),
    }
}

fn parse_counterparty(raw: &str) -> Result<CounterpartyTier, String> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "new" => Ok(CounterpartyTier::New),
        "repeat" => Ok(CounterpartyTier::Repeat),
        "established" => Ok(CounterpartyTier::Established),
        other => Err(format!("unknown counterparty tier '{other}'")),
    }
}

fn print_assessment(engine: &ConfiguratorEngine<ReferenceCatalog>) {
    let form = engine.form();
    println!("Derived schedule");
    println!(
        "- Carrier: {}",
        form.text(FieldId::Carrier).unwrap_or("unresolved")
    );
    println!(
        "- Frequency: {}",
        form.text(FieldId::ScheduleFrequency).unwrap_or("unresolved")
    );
    match form.integer(FieldId::TransitDays) {
        Some(days) => println!("- Transit: {days} day(s)"),
        None => println!("- Transit: unresolved"),
    }
    match form.date(FieldId::EstimatedArrival) {
        Some(eta) => println!("- Estimated arrival: {eta}"),
        None => println!("- Estimated arrival: unresolved"),
    }
    match form.decimal(FieldId::Reliability) {
        Some(pct) => println!("- Reliability: {pct:.1}%"),
        None => println!("- Reliability: unresolved"),
    }

    let risk = engine.risk();
    println!("\nRisk assessment: {:.1} ({})", risk.score, risk.level);
    for component in &risk.components {
        println!("  - {}: {:+.1} ({})", component.field, component.points, component.note);
    }
}

pub(crate) fn run_assess(args: AssessArgs) -> Result<(), AppError> {
    let mut engine = ConfiguratorEngine::new(
        Arc::new(ReferenceCatalog::standard()),
        EngineConfig::default(),
    );

    engine.commit_field(FieldId::TradeLane, FieldValue::Text(args.trade_lane))?;
    engine.commit_field(FieldId::TransportMode, FieldValue::Mode(args.transport_mode))?;
    engine.commit_field(FieldId::ServiceRoute, FieldValue::Text(args.service_route))?;
    engine.commit_field(FieldId::DepartureDate, FieldValue::Date(args.departure_date))?;
    engine.commit_field(FieldId::CargoType, FieldValue::Cargo(args.cargo_type))?;
    engine.commit_field(
        FieldId::CargoSensitivity,
        FieldValue::Sensitivity(args.cargo_sensitivity),
    )?;
    engine.commit_field(FieldId::InsuredValue, FieldValue::Decimal(args.insured_value))?;
    engine.commit_field(
        FieldId::CounterpartyTier,
        FieldValue::Counterparty(args.counterparty_tier),
    )?;
    if !args.monitoring_modules.is_empty() {
        engine.commit_field(
            FieldId::MonitoringModules,
            FieldValue::Flags(args.monitoring_modules.into_iter().collect::<BTreeSet<_>>()),
        )?;
    }

    let missing = engine.missing_required_fields();
    if !missing.is_empty() {
        println!("Configuration incomplete; missing:");
        for field in missing {
            println!("  - {field}");
        }
        return Ok(());
    }

    print_assessment(&engine);
    Ok(())
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let departure = args
        .departure_date
        .unwrap_or_else(|| Local::now().date_naive());

    println!("Shipment configurator demo");
    println!("Configuring an ocean shipment on the VN-US lane, departing {departure}\n");

    let mut engine = ConfiguratorEngine::new(
        Arc::new(ReferenceCatalog::standard()),
        EngineConfig::default(),
    );

    engine.commit_field(FieldId::TradeLane, FieldValue::Text("VN-US".to_string()))?;
    engine.commit_field(FieldId::TransportMode, FieldValue::Mode(TransportMode::Ocean))?;

    match engine.open_section(WizardSection::Cargo) {
        NavigationOutcome::Redirected { warning, .. } => {
            println!("Navigation gate: {warning}");
        }
        NavigationOutcome::Allowed => println!("Navigation gate: cargo already reachable"),
    }

    println!("Service routes available:");
    for record in engine.route_options() {
        println!(
            "  - {} via {} ({} -> {}, transit {})",
            record.route_id,
            record.carrier,
            record.origin_port,
            record.destination_port,
            record.transit_time
        );
    }

    engine.commit_field(
        FieldId::ServiceRoute,
        FieldValue::Text("VNSGN-USLAX-01".to_string()),
    )?;
    engine.commit_field(FieldId::DepartureDate, FieldValue::Date(departure))?;
    engine.commit_field(FieldId::CargoType, FieldValue::Cargo(CargoType::Electronics))?;
    engine.commit_field(
        FieldId::CargoSensitivity,
        FieldValue::Sensitivity(SensitivityTier::Fragile),
    )?;
    engine.commit_field(FieldId::InsuredValue, FieldValue::Decimal(120_000.0))?;
    engine.commit_field(
        FieldId::CounterpartyTier,
        FieldValue::Counterparty(CounterpartyTier::New),
    )?;
    engine.commit_field(
        FieldId::MonitoringModules,
        FieldValue::Flags(BTreeSet::from(["gps".to_string(), "temperature".to_string()])),
    )?;

    println!();
    print_assessment(&engine);

    println!("\nSection progress");
    for section in engine.progress() {
        println!(
            "- {}: {}/{} ({})",
            section.label,
            section.completed_count,
            section.required_total.max(section.completed_count),
            if section.is_complete { "complete" } else { "open" }
        );
    }

    if args.skip_simulation {
        return Ok(());
    }

    println!("\nWhat-if simulation");
    let store = SimulationService::new(
        Arc::new(InMemoryScenarioRepository::default()),
        FactorWeights::default(),
    );
    let baseline = engine.risk();

    let mut session = SimulationSession::new();
    session.set_baseline(baseline.score, BTreeMap::new());

    session.apply_preset("peak_season", &store)?;
    println!("Applied preset 'peak_season': {}", session.preview());

    session.run(&store)?;
    if let Some(outcome) = session.last_outcome() {
        println!(
            "Simulated score {:.1} ({:+.1} vs baseline)",
            outcome.score, outcome.delta
        );
        println!("  {}", outcome.explanation);
    }

    session.save_scenario("peak season buffer", &store)?;
    println!(
        "Saved scenarios: {:?}",
        store.scenario_names().map_err(|err| {
            lanewise::simulation::StoreError::Unavailable(err.to_string())
        })?
    );

    session.reset();
    session.set_adjustment(FactorKey::TransitTime, -4.0);
    session.set_adjustment(FactorKey::CarrierReliability, 3.0);
    session.run(&store)?;
    if let Some(outcome) = session.last_outcome() {
        println!(
            "Expedited alternative scores {:.1} ({:+.1} vs baseline)",
            outcome.score, outcome.delta
        );
    }

    session.load_scenario("peak season buffer", &store)?;
    if let Some(outcome) = session.last_outcome() {
        println!("Reloaded saved scenario; score {:.1}", outcome.score);
    }
    session.delete_scenario("peak season buffer", &store)?;
    println!("Scenario deleted; store is clean again");

    Ok(())
}
