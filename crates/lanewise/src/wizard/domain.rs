use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Identifier for every field the wizard knows about, input and derived alike.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldId {
    TradeLane,
    TransportMode,
    ServiceRoute,
    DepartureDate,
    CargoType,
    CargoSensitivity,
    InsuredValue,
    CounterpartyTier,
    MonitoringModules,
    Carrier,
    ScheduleFrequency,
    TransitDays,
    SeasonalityIndex,
    EstimatedArrival,
    Reliability,
}

impl FieldId {
    pub const fn ordered() -> [Self; 15] {
        [
            Self::TradeLane,
            Self::TransportMode,
            Self::ServiceRoute,
            Self::DepartureDate,
            Self::CargoType,
            Self::CargoSensitivity,
            Self::InsuredValue,
            Self::CounterpartyTier,
            Self::MonitoringModules,
            Self::Carrier,
            Self::ScheduleFrequency,
            Self::TransitDays,
            Self::SeasonalityIndex,
            Self::EstimatedArrival,
            Self::Reliability,
        ]
    }

    /// The value shape this field accepts.
    pub const fn expected_kind(self) -> ValueKind {
        match self {
            Self::TradeLane | Self::ServiceRoute | Self::Carrier | Self::ScheduleFrequency => {
                ValueKind::Text
            }
            Self::TransportMode => ValueKind::Mode,
            Self::DepartureDate | Self::EstimatedArrival => ValueKind::Date,
            Self::CargoType => ValueKind::Cargo,
            Self::CargoSensitivity => ValueKind::Sensitivity,
            Self::InsuredValue | Self::Reliability => ValueKind::Decimal,
            Self::CounterpartyTier => ValueKind::Counterparty,
            Self::MonitoringModules => ValueKind::Flags,
            Self::TransitDays | Self::SeasonalityIndex => ValueKind::Integer,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::TradeLane => "Trade lane",
            Self::TransportMode => "Transport mode",
            Self::ServiceRoute => "Service route",
            Self::DepartureDate => "Departure date",
            Self::CargoType => "Cargo type",
            Self::CargoSensitivity => "Cargo sensitivity",
            Self::InsuredValue => "Insured value",
            Self::CounterpartyTier => "Counterparty tier",
            Self::MonitoringModules => "Monitoring modules",
            Self::Carrier => "Carrier",
            Self::ScheduleFrequency => "Schedule frequency",
            Self::TransitDays => "Transit days",
            Self::SeasonalityIndex => "Seasonality index",
            Self::EstimatedArrival => "Estimated arrival",
            Self::Reliability => "Reliability",
        }
    }
}

impl fmt::Display for FieldId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransportMode {
    Ocean,
    Air,
    Road,
    Rail,
}

impl TransportMode {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Ocean => "Ocean",
            Self::Air => "Air",
            Self::Road => "Road",
            Self::Rail => "Rail",
        }
    }

    /// Fallback schedule cadence when a service route carries no frequency.
    pub const fn default_frequency(self) -> &'static str {
        match self {
            Self::Ocean | Self::Rail => "weekly",
            Self::Air | Self::Road => "daily",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CargoType {
    GeneralMerchandise,
    Apparel,
    Machinery,
    Electronics,
    Pharmaceuticals,
    Perishables,
    HazardousMaterials,
}

impl CargoType {
    pub const fn label(self) -> &'static str {
        match self {
            Self::GeneralMerchandise => "General merchandise",
            Self::Apparel => "Apparel",
            Self::Machinery => "Machinery",
            Self::Electronics => "Electronics",
            Self::Pharmaceuticals => "Pharmaceuticals",
            Self::Perishables => "Perishables",
            Self::HazardousMaterials => "Hazardous materials",
        }
    }

    /// Categories that attract the flat high-risk cargo surcharge.
    pub const fn is_high_risk(self) -> bool {
        matches!(
            self,
            Self::Electronics | Self::Pharmaceuticals | Self::HazardousMaterials
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SensitivityTier {
    Standard,
    TemperatureControlled,
    Fragile,
}

impl SensitivityTier {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Standard => "Standard",
            Self::TemperatureControlled => "Temperature-controlled",
            Self::Fragile => "Fragile",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CounterpartyTier {
    New,
    Repeat,
    Established,
}

impl CounterpartyTier {
    pub const fn label(self) -> &'static str {
        match self {
            Self::New => "New",
            Self::Repeat => "Repeat",
            Self::Established => "Established",
        }
    }
}

/// Wizard sections in navigation order. Section 0 is always reachable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WizardSection {
    Route,
    Schedule,
    Cargo,
    Counterparty,
    Monitoring,
}

impl WizardSection {
    pub const fn ordered() -> [Self; 5] {
        [
            Self::Route,
            Self::Schedule,
            Self::Cargo,
            Self::Counterparty,
            Self::Monitoring,
        ]
    }

    pub const fn index(self) -> usize {
        match self {
            Self::Route => 0,
            Self::Schedule => 1,
            Self::Cargo => 2,
            Self::Counterparty => 3,
            Self::Monitoring => 4,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Route => "Route",
            Self::Schedule => "Schedule",
            Self::Cargo => "Cargo",
            Self::Counterparty => "Counterparty",
            Self::Monitoring => "Monitoring",
        }
    }
}

/// Shape of the value a field carries, used to reject wrongly-typed writes
/// before they reach the form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueKind {
    Text,
    Integer,
    Decimal,
    Date,
    Mode,
    Cargo,
    Sensitivity,
    Counterparty,
    Flags,
}

impl ValueKind {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Integer => "integer",
            Self::Decimal => "decimal",
            Self::Date => "date",
            Self::Mode => "transport mode",
            Self::Cargo => "cargo category",
            Self::Sensitivity => "sensitivity tier",
            Self::Counterparty => "counterparty tier",
            Self::Flags => "flag set",
        }
    }

    /// Integers are welcome wherever a decimal is expected; everything else
    /// must match exactly.
    pub fn accepts(self, offered: ValueKind) -> bool {
        self == offered || (self == Self::Decimal && offered == Self::Integer)
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Typed scalar carried by a field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldValue {
    Text(String),
    Integer(i64),
    Decimal(f64),
    Date(NaiveDate),
    Mode(TransportMode),
    Cargo(CargoType),
    Sensitivity(SensitivityTier),
    Counterparty(CounterpartyTier),
    Flags(BTreeSet<String>),
}

impl FieldValue {
    pub const fn kind(&self) -> ValueKind {
        match self {
            Self::Text(_) => ValueKind::Text,
            Self::Integer(_) => ValueKind::Integer,
            Self::Decimal(_) => ValueKind::Decimal,
            Self::Date(_) => ValueKind::Date,
            Self::Mode(_) => ValueKind::Mode,
            Self::Cargo(_) => ValueKind::Cargo,
            Self::Sensitivity(_) => ValueKind::Sensitivity,
            Self::Counterparty(_) => ValueKind::Counterparty,
            Self::Flags(_) => ValueKind::Flags,
        }
    }

    pub fn summary(&self) -> String {
        match self {
            Self::Text(value) => value.clone(),
            Self::Integer(value) => value.to_string(),
            Self::Decimal(value) => format!("{value:.1}"),
            Self::Date(value) => value.to_string(),
            Self::Mode(mode) => mode.label().to_string(),
            Self::Cargo(cargo) => cargo.label().to_string(),
            Self::Sensitivity(tier) => tier.label().to_string(),
            Self::Counterparty(tier) => tier.label().to_string(),
            Self::Flags(flags) => flags.iter().cloned().collect::<Vec<_>>().join(", "),
        }
    }
}

/// Per-field slot: either unset or holding a typed value. `unresolved` marks
/// a derived field whose inputs were complete but whose reference lookup
/// found no match, so the view layer can render guidance instead of a value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FieldState {
    pub value: Option<FieldValue>,
    pub unresolved: bool,
}

impl FieldState {
    pub fn is_set(&self) -> bool {
        self.value.is_some()
    }

    pub(crate) fn assign(&mut self, value: FieldValue) {
        self.value = Some(value);
        self.unresolved = false;
    }

    pub(crate) fn clear(&mut self) {
        self.value = None;
        self.unresolved = false;
    }

    pub(crate) fn mark_unresolved(&mut self) {
        self.value = None;
        self.unresolved = true;
    }
}

/// Full wizard state: one slot per declared field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormState {
    fields: BTreeMap<FieldId, FieldState>,
}

impl Default for FormState {
    fn default() -> Self {
        Self::new()
    }
}

impl FormState {
    pub fn new() -> Self {
        let fields = FieldId::ordered()
            .into_iter()
            .map(|id| (id, FieldState::default()))
            .collect();
        Self { fields }
    }

    pub fn field(&self, id: FieldId) -> &FieldState {
        self.fields
            .get(&id)
            .expect("form state holds every declared field")
    }

    pub(crate) fn field_mut(&mut self, id: FieldId) -> &mut FieldState {
        self.fields
            .get_mut(&id)
            .expect("form state holds every declared field")
    }

    pub fn value(&self, id: FieldId) -> Option<&FieldValue> {
        self.field(id).value.as_ref()
    }

    pub fn is_set(&self, id: FieldId) -> bool {
        self.field(id).is_set()
    }

    pub fn is_unresolved(&self, id: FieldId) -> bool {
        self.field(id).unresolved
    }

    pub fn text(&self, id: FieldId) -> Option<&str> {
        match self.value(id) {
            Some(FieldValue::Text(value)) => Some(value.as_str()),
            _ => None,
        }
    }

    pub fn integer(&self, id: FieldId) -> Option<i64> {
        match self.value(id) {
            Some(FieldValue::Integer(value)) => Some(*value),
            _ => None,
        }
    }

    pub fn decimal(&self, id: FieldId) -> Option<f64> {
        match self.value(id) {
            Some(FieldValue::Decimal(value)) => Some(*value),
            Some(FieldValue::Integer(value)) => Some(*value as f64),
            _ => None,
        }
    }

    pub fn date(&self, id: FieldId) -> Option<NaiveDate> {
        match self.value(id) {
            Some(FieldValue::Date(value)) => Some(*value),
            _ => None,
        }
    }

    pub fn transport_mode(&self) -> Option<TransportMode> {
        match self.value(FieldId::TransportMode) {
            Some(FieldValue::Mode(mode)) => Some(*mode),
            _ => None,
        }
    }

    pub fn cargo_type(&self) -> Option<CargoType> {
        match self.value(FieldId::CargoType) {
            Some(FieldValue::Cargo(cargo)) => Some(*cargo),
            _ => None,
        }
    }

    pub fn sensitivity(&self) -> Option<SensitivityTier> {
        match self.value(FieldId::CargoSensitivity) {
            Some(FieldValue::Sensitivity(tier)) => Some(*tier),
            _ => None,
        }
    }

    pub fn counterparty(&self) -> Option<CounterpartyTier> {
        match self.value(FieldId::CounterpartyTier) {
            Some(FieldValue::Counterparty(tier)) => Some(*tier),
            _ => None,
        }
    }

    pub fn monitoring_modules(&self) -> Option<&BTreeSet<String>> {
        match self.value(FieldId::MonitoringModules) {
            Some(FieldValue::Flags(flags)) => Some(flags),
            _ => None,
        }
    }
}
