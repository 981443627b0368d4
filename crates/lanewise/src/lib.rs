//! Core engine for an interactive shipment-configuration wizard.
//!
//! The [`wizard`] module owns the reactive half: a field dependency graph
//! with cascading invalidation, a debounced recompute scheduler, derived
//! logistics fields, risk scoring, and section completion tracking. The
//! [`simulation`] module owns the what-if half: a client session state
//! machine and a scenario store service with its JSON contract. [`config`],
//! [`telemetry`], and [`error`] carry the runtime plumbing shared with the
//! HTTP service.

pub mod config;
pub mod error;
pub mod simulation;
pub mod telemetry;
pub mod wizard;

pub use error::AppError;
