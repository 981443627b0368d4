//! What-if simulation over the committed risk baseline: an interactive
//! session state machine on the client side, a deterministic scoring
//! service on the store side, and the JSON contract between them.

pub mod domain;
pub mod router;
pub mod service;
pub mod session;
pub mod store;
pub mod wire;

pub use domain::{AdjustmentSet, FactorKey, Scenario, SimulationOutcome};
pub use router::simulation_router;
pub use service::{FactorWeights, SimulationService};
pub use session::{RunTicket, SessionError, SessionState, SimulationSession};
pub use store::{RepositoryError, ScenarioRepository, ScenarioStore, StoreError};
pub use wire::{
    FactorContribution, LoadScenarioResponse, PresetResponse, SaveScenarioRequest,
    ScenarioAdjustments, SensitivityRow, SimulateRequest, SimulateResponse, SimulationPayload,
    SimulationProfile, StatusResponse,
};
