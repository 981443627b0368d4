use super::domain::{FieldId, FormState, WizardSection};
use serde::Serialize;
use std::collections::BTreeMap;

/// Field membership and requirements for one wizard section.
#[derive(Debug, Clone)]
pub struct SectionSpec {
    pub section: WizardSection,
    pub required: Vec<FieldId>,
    pub members: Vec<FieldId>,
}

/// Ordered section layout of the wizard.
#[derive(Debug, Clone)]
pub struct SectionPlan {
    sections: Vec<SectionSpec>,
}

impl Default for SectionPlan {
    fn default() -> Self {
        Self::standard()
    }
}

impl SectionPlan {
    pub fn standard() -> Self {
        use FieldId::*;
        Self {
            sections: vec![
                SectionSpec {
                    section: WizardSection::Route,
                    required: vec![TradeLane, TransportMode],
                    members: vec![TradeLane, TransportMode],
                },
                SectionSpec {
                    section: WizardSection::Schedule,
                    required: vec![ServiceRoute, DepartureDate],
                    members: vec![
                        ServiceRoute,
                        DepartureDate,
                        Carrier,
                        ScheduleFrequency,
                        TransitDays,
                        SeasonalityIndex,
                        EstimatedArrival,
                        Reliability,
                    ],
                },
                SectionSpec {
                    section: WizardSection::Cargo,
                    required: vec![CargoType, CargoSensitivity, InsuredValue],
                    members: vec![CargoType, CargoSensitivity, InsuredValue],
                },
                SectionSpec {
                    section: WizardSection::Counterparty,
                    required: vec![CounterpartyTier],
                    members: vec![CounterpartyTier],
                },
                // Monitoring is optional: it auto-satisfies once anything in
                // it holds a value, so it never blocks navigation outright.
                SectionSpec {
                    section: WizardSection::Monitoring,
                    required: vec![],
                    members: vec![MonitoringModules],
                },
            ],
        }
    }

    pub fn sections(&self) -> &[SectionSpec] {
        &self.sections
    }
}

/// Point-in-time completion snapshot for one section.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SectionProgress {
    pub section: WizardSection,
    pub label: &'static str,
    pub required_total: usize,
    pub completed_count: usize,
    pub ratio: f64,
    pub is_complete: bool,
}

/// Edge-triggered boundary crossings; never emitted for intermediate
/// recomputes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "transition", content = "section")]
pub enum ProgressEvent {
    SectionCompleted(WizardSection),
    SectionReopened(WizardSection),
}

/// Result of a navigation attempt against the gating policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavigationOutcome {
    Allowed,
    Redirected {
        back_to: WizardSection,
        warning: String,
    },
}

/// Tracks per-section completion and raises events only when a section
/// crosses the 0/100% boundary.
#[derive(Debug)]
pub struct CompletionTracker {
    plan: SectionPlan,
    complete: BTreeMap<WizardSection, bool>,
}

impl Default for CompletionTracker {
    fn default() -> Self {
        Self::new(SectionPlan::standard())
    }
}

impl CompletionTracker {
    pub fn new(plan: SectionPlan) -> Self {
        let complete = plan
            .sections()
            .iter()
            .map(|spec| (spec.section, false))
            .collect();
        Self { plan, complete }
    }

    fn progress_for(spec: &SectionSpec, form: &FormState) -> SectionProgress {
        let (completed_count, ratio, is_complete) = if spec.required.is_empty() {
            // Partial-credit rule for optional sections: any value counts.
            let any_set = spec.members.iter().any(|id| form.is_set(*id));
            let count = spec.members.iter().filter(|id| form.is_set(**id)).count();
            (count, if any_set { 1.0 } else { 0.0 }, any_set)
        } else {
            let count = spec.required.iter().filter(|id| form.is_set(**id)).count();
            let ratio = count as f64 / spec.required.len() as f64;
            (count, ratio, count == spec.required.len())
        };

        SectionProgress {
            section: spec.section,
            label: spec.section.label(),
            required_total: spec.required.len(),
            completed_count,
            ratio,
            is_complete,
        }
    }

    /// Pure snapshot without mutating the edge-trigger state.
    pub fn progress(&self, form: &FormState) -> Vec<SectionProgress> {
        self.plan
            .sections()
            .iter()
            .map(|spec| Self::progress_for(spec, form))
            .collect()
    }

    /// Recompute completion and emit one event per boundary crossing.
    pub fn evaluate(&mut self, form: &FormState) -> (Vec<SectionProgress>, Vec<ProgressEvent>) {
        let snapshot = self.progress(form);
        let mut events = Vec::new();
        for progress in &snapshot {
            let was_complete = self
                .complete
                .get(&progress.section)
                .copied()
                .unwrap_or(false);
            if progress.is_complete && !was_complete {
                events.push(ProgressEvent::SectionCompleted(progress.section));
            } else if !progress.is_complete && was_complete {
                events.push(ProgressEvent::SectionReopened(progress.section));
            }
            self.complete.insert(progress.section, progress.is_complete);
        }
        (snapshot, events)
    }

    /// Opening section N requires every earlier section to sit at 100%;
    /// section 0 is always reachable. On refusal the caller is redirected
    /// to the first incomplete predecessor.
    pub fn check_navigation(&self, target: WizardSection) -> NavigationOutcome {
        if target.index() == 0 {
            return NavigationOutcome::Allowed;
        }
        for spec in self.plan.sections() {
            if spec.section.index() >= target.index() {
                break;
            }
            if !self.complete.get(&spec.section).copied().unwrap_or(false) {
                return NavigationOutcome::Redirected {
                    back_to: spec.section,
                    warning: format!(
                        "complete the {} section before opening {}",
                        spec.section.label(),
                        target.label()
                    ),
                };
            }
        }
        NavigationOutcome::Allowed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wizard::domain::{FieldValue, TransportMode};
    use chrono::NaiveDate;
    use std::collections::BTreeSet;

    fn set(form: &mut FormState, id: FieldId, value: FieldValue) {
        form.field_mut(id).assign(value);
    }

    fn complete_route_section(form: &mut FormState) {
        set(form, FieldId::TradeLane, FieldValue::Text("VN-US".into()));
        set(
            form,
            FieldId::TransportMode,
            FieldValue::Mode(TransportMode::Ocean),
        );
    }

    #[test]
    fn completing_a_section_fires_exactly_one_event() {
        let mut tracker = CompletionTracker::default();
        let mut form = FormState::new();

        set(&mut form, FieldId::TradeLane, FieldValue::Text("VN-US".into()));
        let (_, events) = tracker.evaluate(&form);
        assert!(events.is_empty(), "half-done section stays quiet");

        set(
            &mut form,
            FieldId::TransportMode,
            FieldValue::Mode(TransportMode::Ocean),
        );
        let (_, events) = tracker.evaluate(&form);
        assert_eq!(
            events,
            vec![ProgressEvent::SectionCompleted(WizardSection::Route)]
        );

        // Re-evaluating the same state is silent.
        let (_, events) = tracker.evaluate(&form);
        assert!(events.is_empty());
    }

    #[test]
    fn losing_one_field_fires_a_single_reopen_event() {
        let mut tracker = CompletionTracker::default();
        let mut form = FormState::new();
        complete_route_section(&mut form);
        tracker.evaluate(&form);

        form.field_mut(FieldId::TransportMode).clear();
        let (_, events) = tracker.evaluate(&form);
        assert_eq!(
            events,
            vec![ProgressEvent::SectionReopened(WizardSection::Route)]
        );

        let (_, events) = tracker.evaluate(&form);
        assert!(events.is_empty(), "no event per remaining unset field");
    }

    #[test]
    fn optional_sections_auto_satisfy_on_any_value() {
        let tracker = CompletionTracker::default();
        let mut form = FormState::new();

        let monitoring = |progress: &[SectionProgress]| {
            progress
                .iter()
                .find(|entry| entry.section == WizardSection::Monitoring)
                .cloned()
                .expect("monitoring tracked")
        };

        let before = monitoring(&tracker.progress(&form));
        assert!(!before.is_complete);
        assert_eq!(before.ratio, 0.0);

        set(
            &mut form,
            FieldId::MonitoringModules,
            FieldValue::Flags(BTreeSet::from(["gps".to_string()])),
        );
        let after = monitoring(&tracker.progress(&form));
        assert!(after.is_complete);
        assert_eq!(after.ratio, 1.0);
        assert_eq!(after.required_total, 0);
    }

    #[test]
    fn navigation_gate_redirects_to_the_incomplete_predecessor() {
        let mut tracker = CompletionTracker::default();
        let mut form = FormState::new();
        complete_route_section(&mut form);
        // Schedule section left at 50%: route chosen, no departure date.
        set(
            &mut form,
            FieldId::ServiceRoute,
            FieldValue::Text("VNSGN-USLAX-01".into()),
        );
        tracker.evaluate(&form);

        match tracker.check_navigation(WizardSection::Cargo) {
            NavigationOutcome::Redirected { back_to, warning } => {
                assert_eq!(back_to, WizardSection::Schedule);
                assert!(warning.contains("Schedule"));
            }
            NavigationOutcome::Allowed => panic!("cargo must be gated"),
        }

        assert_eq!(
            tracker.check_navigation(WizardSection::Route),
            NavigationOutcome::Allowed
        );
        assert_eq!(
            tracker.check_navigation(WizardSection::Schedule),
            NavigationOutcome::Allowed
        );

        set(
            &mut form,
            FieldId::DepartureDate,
            FieldValue::Date(NaiveDate::from_ymd_opt(2025, 3, 1).expect("valid")),
        );
        tracker.evaluate(&form);
        assert_eq!(
            tracker.check_navigation(WizardSection::Cargo),
            NavigationOutcome::Allowed
        );
    }
}
