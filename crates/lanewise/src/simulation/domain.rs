use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Named risk factors a what-if scenario may perturb.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FactorKey {
    TransitTime,
    CarrierReliability,
    InsuranceCoverage,
    CargoSensitivity,
    MonitoringCoverage,
    Seasonality,
}

impl FactorKey {
    pub const fn ordered() -> [Self; 6] {
        [
            Self::TransitTime,
            Self::CarrierReliability,
            Self::InsuranceCoverage,
            Self::CargoSensitivity,
            Self::MonitoringCoverage,
            Self::Seasonality,
        ]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::TransitTime => "Transit time",
            Self::CarrierReliability => "Carrier reliability",
            Self::InsuranceCoverage => "Insurance coverage",
            Self::CargoSensitivity => "Cargo sensitivity",
            Self::MonitoringCoverage => "Monitoring coverage",
            Self::Seasonality => "Seasonality",
        }
    }
}

impl fmt::Display for FactorKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Signed perturbations keyed by factor; the live adjustment set of a
/// session, or the stored content of a scenario.
pub type AdjustmentSet = BTreeMap<FactorKey, f64>;

/// A saved what-if scenario. Owned by the scenario repository; updated only
/// by delete-and-recreate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    pub name: String,
    pub adjustments: AdjustmentSet,
    pub baseline_score: f64,
    pub simulated_score: f64,
    pub created_at: DateTime<Utc>,
}

/// Settled result of one simulation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationOutcome {
    pub score: f64,
    pub delta: f64,
    pub explanation: String,
}
