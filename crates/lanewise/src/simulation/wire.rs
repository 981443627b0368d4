//! JSON contract of the simulation remote store. Every response carries a
//! `status` field; non-success statuses are recoverable conditions for the
//! caller, never crashes.

use super::domain::{AdjustmentSet, FactorKey};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const STATUS_SUCCESS: &str = "success";
pub const STATUS_ERROR: &str = "error";

/// `POST /simulate` body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulateRequest {
    pub baseline: f64,
    pub adjustments: AdjustmentSet,
    /// Snapshot of the committed inputs the baseline was scored from; kept
    /// opaque so the store can echo it into audit trails.
    #[serde(default)]
    pub original_inputs: BTreeMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationProfile {
    pub explanation: String,
}

/// One factor's share of the simulated delta.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FactorContribution {
    pub factor: FactorKey,
    pub delta: f64,
    pub weight: f64,
    pub contribution: f64,
}

/// Sensitivity row: the simulated score if this factor's delta moved one
/// unit down or up from the requested value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensitivityRow {
    pub factor: FactorKey,
    pub low: f64,
    pub base: f64,
    pub high: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationPayload {
    pub simulation_score: f64,
    pub delta_from_baseline: f64,
    pub profile: SimulationProfile,
    pub factors: Vec<FactorContribution>,
    pub drivers_changed: Vec<FactorKey>,
    pub matrix: Vec<SensitivityRow>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulateResponse {
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub simulation: Option<SimulationPayload>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl SimulateResponse {
    pub fn success(payload: SimulationPayload) -> Self {
        Self {
            status: STATUS_SUCCESS.to_string(),
            simulation: Some(payload),
            message: None,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            status: STATUS_ERROR.to_string(),
            simulation: None,
            message: Some(message.into()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == STATUS_SUCCESS
    }
}

/// `POST /simulation/save` body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaveScenarioRequest {
    pub name: String,
    pub adjustments: AdjustmentSet,
    /// The simulated score being saved alongside the adjustments.
    pub result: f64,
    pub baseline_score: f64,
}

/// Bare status envelope for save/delete.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusResponse {
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl StatusResponse {
    pub fn success() -> Self {
        Self {
            status: STATUS_SUCCESS.to_string(),
            message: None,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            status: STATUS_ERROR.to_string(),
            message: Some(message.into()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == STATUS_SUCCESS
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioAdjustments {
    pub adjustments: AdjustmentSet,
}

/// `GET /simulation/load/{name}` envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoadScenarioResponse {
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scenario: Option<ScenarioAdjustments>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl LoadScenarioResponse {
    pub fn success(adjustments: AdjustmentSet) -> Self {
        Self {
            status: STATUS_SUCCESS.to_string(),
            scenario: Some(ScenarioAdjustments { adjustments }),
            message: None,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            status: STATUS_ERROR.to_string(),
            scenario: None,
            message: Some(message.into()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == STATUS_SUCCESS
    }
}

/// `GET /simulation/preset/{name}` envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PresetResponse {
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preset: Option<ScenarioAdjustments>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl PresetResponse {
    pub fn success(adjustments: AdjustmentSet) -> Self {
        Self {
            status: STATUS_SUCCESS.to_string(),
            preset: Some(ScenarioAdjustments { adjustments }),
            message: None,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            status: STATUS_ERROR.to_string(),
            preset: None,
            message: Some(message.into()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == STATUS_SUCCESS
    }
}
