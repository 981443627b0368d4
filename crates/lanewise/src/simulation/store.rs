use super::domain::Scenario;
use super::wire::{
    LoadScenarioResponse, PresetResponse, SaveScenarioRequest, SimulateRequest, SimulateResponse,
    StatusResponse,
};

/// Client-side port of the simulation remote store. Transport is out of
/// scope here; implementations speak HTTP, sit in-process, or are test
/// doubles — the engine only sees this contract.
pub trait ScenarioStore: Send + Sync {
    fn simulate(&self, request: &SimulateRequest) -> Result<SimulateResponse, StoreError>;
    fn save(&self, request: &SaveScenarioRequest) -> Result<StatusResponse, StoreError>;
    fn load(&self, name: &str) -> Result<LoadScenarioResponse, StoreError>;
    fn delete(&self, name: &str) -> Result<StatusResponse, StoreError>;
    fn preset(&self, name: &str) -> Result<PresetResponse, StoreError>;
}

/// Transport-level store failure. Contract-level refusals travel inside the
/// response envelopes as `status != "success"` instead.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("simulation store unavailable: {0}")]
    Unavailable(String),
}

/// Server-side persistence seam for saved scenarios, so the store service
/// can be exercised without prescribing a storage technology.
pub trait ScenarioRepository: Send + Sync {
    fn insert(&self, scenario: Scenario) -> Result<(), RepositoryError>;
    fn fetch(&self, name: &str) -> Result<Option<Scenario>, RepositoryError>;
    fn remove(&self, name: &str) -> Result<(), RepositoryError>;
    fn names(&self) -> Result<Vec<String>, RepositoryError>;
}

#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("scenario already exists")]
    Conflict,
    #[error("scenario not found")]
    NotFound,
    #[error("scenario repository unavailable: {0}")]
    Unavailable(String),
}
