//! Reactive shipment-configuration wizard: field dependency graph,
//! cascading invalidation, debounced recomputation, risk scoring, and
//! section completion tracking.

pub mod domain;
mod engine;
pub mod derive;
pub mod graph;
pub mod progress;
pub mod reference;
pub mod risk;
pub mod scheduler;

pub use domain::{
    CargoType, CounterpartyTier, FieldId, FieldState, FieldValue, FormState, SensitivityTier,
    TransportMode, ValueKind, WizardSection,
};
pub use engine::{ConfiguratorEngine, EngineEvent, EngineObserver};
pub use graph::{FieldGraph, FieldKind, FieldNode, GraphError, RecomputeReport};
pub use progress::{
    CompletionTracker, NavigationOutcome, ProgressEvent, SectionPlan, SectionProgress,
};
pub use reference::{
    CarrierRating, ReferenceCatalog, ReferenceData, ReferenceImportError, RouteRecord,
};
pub use risk::{RiskAssessment, RiskComponent, RiskLevel, RiskModel, RiskWeights};
pub use scheduler::{Clock, DebounceScheduler, ManualClock, SystemClock};
