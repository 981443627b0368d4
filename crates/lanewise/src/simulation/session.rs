use super::domain::{AdjustmentSet, FactorKey, SimulationOutcome};
use super::store::{ScenarioStore, StoreError};
use super::wire::{SaveScenarioRequest, SimulateRequest, SimulateResponse};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, warn};

/// Lifecycle of the what-if panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    #[default]
    Idle,
    Adjusting,
    Running,
}

impl SessionState {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Adjusting => "adjusting",
            Self::Running => "running",
        }
    }
}

/// Permission to perform exactly one store call. The generation stamp lets
/// the session discard results that settle after a reset.
#[derive(Debug)]
pub struct RunTicket {
    generation: u64,
    pub request: SimulateRequest,
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("no baseline risk score has been established")]
    NoBaseline,
    #[error("every adjustment is zero; nothing to simulate")]
    NoAdjustments,
    #[error("a simulation is already in flight")]
    AlreadyRunning,
    #[error("no simulation result is available to save")]
    NoResult,
    #[error("scenario name must not be empty")]
    EmptyName,
    #[error("scenario '{0}' already exists")]
    DuplicateName(String),
    #[error("simulation store refused: {0}")]
    Rejected(String),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Client half of the what-if subsystem: holds the baseline, the live
/// (unsaved) adjustment set, and the last settled result. At most one
/// simulation is in flight per session.
#[derive(Debug, Default)]
pub struct SimulationSession {
    baseline: Option<f64>,
    original_inputs: BTreeMap<String, Value>,
    adjustments: AdjustmentSet,
    state: SessionState,
    generation: u64,
    in_flight: bool,
    last_outcome: Option<SimulationOutcome>,
    last_error: Option<String>,
    known_names: BTreeSet<String>,
}

impl SimulationSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Anchor the session on a freshly committed risk score.
    pub fn set_baseline(&mut self, score: f64, original_inputs: BTreeMap<String, Value>) {
        self.baseline = Some(score);
        self.original_inputs = original_inputs;
    }

    /// Seed the client-side duplicate-name pre-check, e.g. from a scenario
    /// listing fetched at panel open.
    pub fn seed_known_names<I: IntoIterator<Item = String>>(&mut self, names: I) {
        self.known_names.extend(names);
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn baseline(&self) -> Option<f64> {
        self.baseline
    }

    pub fn adjustments(&self) -> &AdjustmentSet {
        &self.adjustments
    }

    pub fn last_outcome(&self) -> Option<&SimulationOutcome> {
        self.last_outcome.as_ref()
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn has_active_adjustments(&self) -> bool {
        self.adjustments.values().any(|delta| *delta != 0.0)
    }

    /// Record a slider/knob movement. Ignored while a run is in flight;
    /// otherwise the session moves to `Adjusting`. Returns whether the edit
    /// was accepted.
    pub fn set_adjustment(&mut self, factor: FactorKey, delta: f64) -> bool {
        if self.state() == SessionState::Running {
            return false;
        }
        if delta == 0.0 {
            self.adjustments.remove(&factor);
        } else {
            self.adjustments.insert(factor, delta);
        }
        self.state = SessionState::Adjusting;
        true
    }

    /// Cheap local preview; deliberately not a simulation result.
    pub fn preview(&self) -> String {
        let active = self
            .adjustments
            .values()
            .filter(|delta| **delta != 0.0)
            .count();
        if active == 0 {
            return "no adjustments pending".to_string();
        }
        let raw: f64 = self.adjustments.values().sum();
        format!("{active} adjustment(s) pending, raw shift {raw:+.1}")
    }

    /// Gate a run: needs a baseline, at least one non-zero adjustment, and
    /// no run already in flight. The returned ticket authorizes exactly one
    /// store call.
    pub fn begin_run(&mut self) -> Result<RunTicket, SessionError> {
        let baseline = self.baseline.ok_or(SessionError::NoBaseline)?;
        if self.in_flight {
            return Err(SessionError::AlreadyRunning);
        }
        if !self.has_active_adjustments() {
            return Err(SessionError::NoAdjustments);
        }
        self.in_flight = true;
        self.state = SessionState::Running;
        Ok(RunTicket {
            generation: self.generation,
            request: SimulateRequest {
                baseline,
                adjustments: self.adjustments.clone(),
                original_inputs: self.original_inputs.clone(),
            },
        })
    }

    /// Settle a run. Results carrying a stale generation (the user reset
    /// while the call was in flight) are discarded outright; failures leave
    /// the previous outcome on display.
    pub fn complete_run(
        &mut self,
        ticket: RunTicket,
        result: Result<SimulateResponse, StoreError>,
    ) {
        if ticket.generation != self.generation {
            debug!("discarding simulation result from a superseded generation");
            return;
        }
        self.in_flight = false;
        self.state = SessionState::Idle;
        match result {
            Ok(response) if response.is_success() => match response.simulation {
                Some(payload) => {
                    self.last_outcome = Some(SimulationOutcome {
                        score: payload.simulation_score,
                        delta: payload.delta_from_baseline,
                        explanation: payload.profile.explanation,
                    });
                    self.last_error = None;
                }
                None => {
                    self.last_error = Some("store returned success without a payload".to_string());
                }
            },
            Ok(response) => {
                let message = response
                    .message
                    .unwrap_or_else(|| "simulation rejected".to_string());
                warn!(%message, "simulation returned a non-success status");
                self.last_error = Some(message);
            }
            Err(err) => {
                warn!(error = %err, "simulation transport failed");
                self.last_error = Some(err.to_string());
            }
        }
    }

    /// Synchronous begin/call/settle driver for in-process stores.
    pub fn run<S: ScenarioStore + ?Sized>(&mut self, store: &S) -> Result<(), SessionError> {
        let ticket = self.begin_run()?;
        let result = store.simulate(&ticket.request);
        self.complete_run(ticket, result);
        Ok(())
    }

    /// Clear all adjustments and return the display to the baseline. Legal
    /// in any state; an in-flight result is invalidated via the generation
    /// stamp rather than cancelled.
    pub fn reset(&mut self) {
        self.adjustments.clear();
        self.generation += 1;
        self.in_flight = false;
        self.state = SessionState::Idle;
        self.last_outcome = None;
        self.last_error = None;
    }

    /// Save the current adjustments and result under a unique, non-empty
    /// name. Uniqueness is pre-checked client-side before any store call;
    /// the store stays authoritative.
    pub fn save_scenario<S: ScenarioStore + ?Sized>(
        &mut self,
        name: &str,
        store: &S,
    ) -> Result<(), SessionError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(SessionError::EmptyName);
        }
        if self.known_names.contains(name) {
            return Err(SessionError::DuplicateName(name.to_string()));
        }
        let baseline = self.baseline.ok_or(SessionError::NoBaseline)?;
        let outcome = self.last_outcome.as_ref().ok_or(SessionError::NoResult)?;

        let response = store.save(&SaveScenarioRequest {
            name: name.to_string(),
            adjustments: self.adjustments.clone(),
            result: outcome.score,
            baseline_score: baseline,
        })?;
        if !response.is_success() {
            return Err(SessionError::Rejected(
                response
                    .message
                    .unwrap_or_else(|| "save rejected".to_string()),
            ));
        }
        self.known_names.insert(name.to_string());
        Ok(())
    }

    /// Re-apply a saved adjustment set as the live set and trigger a run.
    pub fn load_scenario<S: ScenarioStore + ?Sized>(
        &mut self,
        name: &str,
        store: &S,
    ) -> Result<(), SessionError> {
        let response = store.load(name)?;
        if !response.is_success() {
            return Err(SessionError::Rejected(
                response
                    .message
                    .unwrap_or_else(|| "load rejected".to_string()),
            ));
        }
        let Some(scenario) = response.scenario else {
            return Err(SessionError::Rejected(
                "store returned success without a scenario".to_string(),
            ));
        };
        self.adjustments = scenario.adjustments;
        self.state = SessionState::Adjusting;
        self.known_names.insert(name.to_string());
        match self.run(store) {
            Ok(()) | Err(SessionError::NoAdjustments) => Ok(()),
            Err(err) => Err(err),
        }
    }

    pub fn delete_scenario<S: ScenarioStore + ?Sized>(
        &mut self,
        name: &str,
        store: &S,
    ) -> Result<(), SessionError> {
        let response = store.delete(name)?;
        if !response.is_success() {
            return Err(SessionError::Rejected(
                response
                    .message
                    .unwrap_or_else(|| "delete rejected".to_string()),
            ));
        }
        self.known_names.remove(name);
        Ok(())
    }

    /// Fetch a curated preset and apply it as the live adjustment set.
    pub fn apply_preset<S: ScenarioStore + ?Sized>(
        &mut self,
        name: &str,
        store: &S,
    ) -> Result<(), SessionError> {
        let response = store.preset(name)?;
        if !response.is_success() {
            return Err(SessionError::Rejected(
                response
                    .message
                    .unwrap_or_else(|| "unknown preset".to_string()),
            ));
        }
        let Some(preset) = response.preset else {
            return Err(SessionError::Rejected(
                "store returned success without a preset".to_string(),
            ));
        };
        self.adjustments = preset.adjustments;
        self.state = SessionState::Adjusting;
        Ok(())
    }
}
