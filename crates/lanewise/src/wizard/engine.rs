use super::domain::{FieldId, FieldValue, FormState};
use super::graph::{FieldGraph, GraphError, RecomputeReport};
use super::progress::{CompletionTracker, NavigationOutcome, ProgressEvent, SectionProgress};
use super::reference::{ReferenceData, RouteRecord};
use super::risk::{RiskAssessment, RiskModel};
use super::scheduler::{Clock, DebounceScheduler, SystemClock};
use crate::config::EngineConfig;
use crate::wizard::domain::WizardSection;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// State-change notifications published to registered observers; views
/// subscribe instead of polling.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    Progress(ProgressEvent),
    Recomputed {
        report: RecomputeReport,
        risk: RiskAssessment,
    },
}

/// Observer registration seam for the presentation layer.
pub trait EngineObserver: Send + Sync {
    fn notify(&self, event: &EngineEvent);
}

/// The single engine instance owned by the composition root. All field
/// mutations flow through [`set_field`](Self::set_field) and
/// [`commit_field`](Self::commit_field); views only read snapshots.
pub struct ConfiguratorEngine<R> {
    graph: FieldGraph,
    form: FormState,
    reference: Arc<R>,
    scheduler: DebounceScheduler,
    model: RiskModel,
    tracker: CompletionTracker,
    observers: Vec<Arc<dyn EngineObserver>>,
}

impl<R: ReferenceData> ConfiguratorEngine<R> {
    pub fn new(reference: Arc<R>, config: EngineConfig) -> Self {
        Self::with_clock(reference, config, Arc::new(SystemClock))
    }

    pub fn with_clock(reference: Arc<R>, config: EngineConfig, clock: Arc<dyn Clock>) -> Self {
        let scheduler =
            DebounceScheduler::new(Duration::from_millis(config.quiet_window_ms), clock);
        Self {
            graph: FieldGraph::shipment_wizard(),
            form: FormState::new(),
            reference,
            scheduler,
            model: RiskModel::new(config.weights),
            tracker: CompletionTracker::default(),
            observers: Vec::new(),
        }
    }

    pub fn subscribe(&mut self, observer: Arc<dyn EngineObserver>) {
        self.observers.push(observer);
    }

    /// Record a raw edit on an input field. Every transitive dependent is
    /// cleared immediately; recomputation waits for the debounce window.
    /// Returns the cleared fields.
    pub fn set_field(&mut self, id: FieldId, value: FieldValue) -> Result<Vec<FieldId>, GraphError> {
        let cleared = self.write_field(id, value)?;
        self.scheduler.notify_edit();
        Ok(cleared)
    }

    /// Fast path for discrete commits (dropdown choice, toggle flip):
    /// recomputes immediately instead of waiting out the quiet window.
    pub fn commit_field(
        &mut self,
        id: FieldId,
        value: FieldValue,
    ) -> Result<Vec<FieldId>, GraphError> {
        let cleared = self.write_field(id, value)?;
        self.scheduler.cancel();
        self.recompute_pass();
        Ok(cleared)
    }

    fn write_field(&mut self, id: FieldId, value: FieldValue) -> Result<Vec<FieldId>, GraphError> {
        if !self.graph.is_input(id) {
            return Err(GraphError::NotAnInput(id));
        }
        let expected = id.expected_kind();
        if !expected.accepts(value.kind()) {
            return Err(GraphError::ValueMismatch {
                field: id,
                expected,
                offered: value.kind(),
            });
        }
        self.form.field_mut(id).assign(value);
        let cleared = self.graph.invalidate(&mut self.form, id);
        debug!(field = %id, cleared = cleared.len(), "field written, dependents cleared");
        Ok(cleared)
    }

    /// Drive the debounce timer; runs the coalesced recomputation pass when
    /// the quiet window has elapsed. Returns whether a pass ran.
    pub fn poll(&mut self) -> bool {
        if self.scheduler.take_due() {
            self.recompute_pass();
            true
        } else {
            false
        }
    }

    pub fn has_pending_recompute(&self) -> bool {
        self.scheduler.is_pending()
    }

    fn recompute_pass(&mut self) {
        let report = self.graph.recompute(&mut self.form, self.reference.as_ref());
        let risk = self.model.score(&self.form);
        let (_, transitions) = self.tracker.evaluate(&self.form);
        debug!(
            derived = report.derived.len(),
            unresolved = report.unresolved.len(),
            score = risk.score,
            "recomputation pass finished"
        );
        for transition in &transitions {
            self.publish(&EngineEvent::Progress(*transition));
        }
        self.publish(&EngineEvent::Recomputed { report, risk });
    }

    fn publish(&self, event: &EngineEvent) {
        for observer in &self.observers {
            observer.notify(event);
        }
    }

    /// Read-only snapshot of the form state.
    pub fn form(&self) -> &FormState {
        &self.form
    }

    /// Assessment recomputed from the live state on every read, never cached
    /// across edits.
    pub fn risk(&self) -> RiskAssessment {
        self.model.score(&self.form)
    }

    pub fn progress(&self) -> Vec<SectionProgress> {
        self.tracker.progress(&self.form)
    }

    pub fn open_section(&self, target: WizardSection) -> NavigationOutcome {
        self.tracker.check_navigation(target)
    }

    /// Service-route options valid for the currently selected lane and mode.
    pub fn route_options(&self) -> Vec<RouteRecord> {
        match (self.form.text(FieldId::TradeLane), self.form.transport_mode()) {
            (Some(lane), Some(mode)) => self.reference.routes(lane, mode),
            _ => Vec::new(),
        }
    }

    pub fn missing_required_fields(&self) -> Vec<FieldId> {
        RiskModel::missing_required_fields(&self.form)
    }
}
