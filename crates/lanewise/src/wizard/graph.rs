use super::derive::{self, Derivation};
use super::domain::{FieldId, FormState, ValueKind};
use super::reference::ReferenceData;
use std::collections::BTreeMap;

/// Whether a node is written by the user or derived from its ancestors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Input,
    Derived,
}

/// One node of the dependency graph. Input nodes may still declare
/// `depends_on` edges: selecting a new trade lane must clear the service
/// route even though both are user-entered.
#[derive(Debug, Clone)]
pub struct FieldNode {
    pub id: FieldId,
    pub kind: FieldKind,
    pub depends_on: Vec<FieldId>,
}

#[derive(Debug, thiserror::Error)]
pub enum GraphError {
    #[error("field graph has a dependency cycle through {0}")]
    Cycle(FieldId),
    #[error("{1} declares a dependency on undeclared field {0}")]
    UnknownDependency(FieldId, FieldId),
    #[error("{0} is a derived field and cannot be written directly")]
    NotAnInput(FieldId),
    #[error("{field} expects a {expected} value, got {offered}")]
    ValueMismatch {
        field: FieldId,
        expected: ValueKind,
        offered: ValueKind,
    },
}

/// Fields touched by one recomputation pass.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RecomputeReport {
    pub derived: Vec<FieldId>,
    pub unresolved: Vec<FieldId>,
}

/// Declarative dependency DAG over the wizard fields, with the topological
/// order fixed at construction.
#[derive(Debug)]
pub struct FieldGraph {
    nodes: BTreeMap<FieldId, FieldNode>,
    dependents: BTreeMap<FieldId, Vec<FieldId>>,
    topo: Vec<FieldId>,
}

impl FieldGraph {
    pub fn try_new(nodes: Vec<FieldNode>) -> Result<Self, GraphError> {
        let by_id: BTreeMap<FieldId, FieldNode> =
            nodes.into_iter().map(|node| (node.id, node)).collect();

        let mut dependents: BTreeMap<FieldId, Vec<FieldId>> =
            by_id.keys().map(|id| (*id, Vec::new())).collect();
        for node in by_id.values() {
            for dep in &node.depends_on {
                let entry = dependents
                    .get_mut(dep)
                    .ok_or(GraphError::UnknownDependency(*dep, node.id))?;
                entry.push(node.id);
            }
        }

        // Kahn's algorithm; any leftover node sits on a cycle.
        let mut in_degree: BTreeMap<FieldId, usize> = by_id
            .values()
            .map(|node| (node.id, node.depends_on.len()))
            .collect();
        let mut ready: Vec<FieldId> = in_degree
            .iter()
            .filter(|(_, degree)| **degree == 0)
            .map(|(id, _)| *id)
            .collect();
        let mut topo = Vec::with_capacity(by_id.len());
        while let Some(id) = ready.pop() {
            topo.push(id);
            for dependent in &dependents[&id] {
                let degree = in_degree
                    .get_mut(dependent)
                    .expect("dependents only reference declared nodes");
                *degree -= 1;
                if *degree == 0 {
                    ready.push(*dependent);
                }
            }
        }
        if topo.len() != by_id.len() {
            let stuck = in_degree
                .iter()
                .find(|(_, degree)| **degree > 0)
                .map(|(id, _)| *id)
                .expect("a non-empty remainder implies a cycle");
            return Err(GraphError::Cycle(stuck));
        }

        Ok(Self {
            nodes: by_id,
            dependents,
            topo,
        })
    }

    /// The transport cascade used by the shipment wizard:
    /// route -> mode -> service -> carrier/schedule/transit -> ETA -> reliability.
    pub fn shipment_wizard() -> Self {
        use FieldId::*;
        let input = |id| FieldNode {
            id,
            kind: FieldKind::Input,
            depends_on: Vec::new(),
        };
        let nodes = vec![
            input(TradeLane),
            input(TransportMode),
            FieldNode {
                id: ServiceRoute,
                kind: FieldKind::Input,
                depends_on: vec![TradeLane, TransportMode],
            },
            input(DepartureDate),
            input(CargoType),
            input(CargoSensitivity),
            input(InsuredValue),
            input(CounterpartyTier),
            input(MonitoringModules),
            FieldNode {
                id: Carrier,
                kind: FieldKind::Derived,
                depends_on: vec![TradeLane, TransportMode, ServiceRoute],
            },
            FieldNode {
                id: ScheduleFrequency,
                kind: FieldKind::Derived,
                depends_on: vec![TradeLane, TransportMode, ServiceRoute],
            },
            FieldNode {
                id: TransitDays,
                kind: FieldKind::Derived,
                depends_on: vec![TradeLane, TransportMode, ServiceRoute],
            },
            FieldNode {
                id: SeasonalityIndex,
                kind: FieldKind::Derived,
                depends_on: vec![DepartureDate],
            },
            FieldNode {
                id: EstimatedArrival,
                kind: FieldKind::Derived,
                depends_on: vec![DepartureDate, TransitDays, SeasonalityIndex],
            },
            FieldNode {
                id: Reliability,
                kind: FieldKind::Derived,
                depends_on: vec![TradeLane, Carrier, SeasonalityIndex],
            },
        ];
        Self::try_new(nodes).expect("builtin wizard graph is a DAG")
    }

    pub fn node(&self, id: FieldId) -> Option<&FieldNode> {
        self.nodes.get(&id)
    }

    pub fn is_input(&self, id: FieldId) -> bool {
        matches!(self.nodes.get(&id), Some(node) if node.kind == FieldKind::Input)
    }

    pub fn direct_dependents(&self, id: FieldId) -> &[FieldId] {
        self.dependents
            .get(&id)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Clear every transitive dependent of `changed` so no stale derived
    /// value survives between invalidation and recomputation. Returns the
    /// cleared fields in topological order.
    pub fn invalidate(&self, form: &mut FormState, changed: FieldId) -> Vec<FieldId> {
        let mut affected = vec![false; FieldId::ordered().len()];
        let mut stack: Vec<FieldId> = self.direct_dependents(changed).to_vec();
        while let Some(id) = stack.pop() {
            let slot = id as usize;
            if affected[slot] {
                continue;
            }
            affected[slot] = true;
            stack.extend_from_slice(self.direct_dependents(id));
        }

        let mut cleared = Vec::new();
        for id in &self.topo {
            if affected[*id as usize] {
                form.field_mut(*id).clear();
                cleared.push(*id);
            }
        }
        cleared
    }

    /// Re-derive every derived node whose full input set is available,
    /// walking the topological order so upstream values land first.
    pub fn recompute<R: ReferenceData + ?Sized>(
        &self,
        form: &mut FormState,
        reference: &R,
    ) -> RecomputeReport {
        let mut report = RecomputeReport::default();
        for id in &self.topo {
            let node = &self.nodes[id];
            if node.kind != FieldKind::Derived {
                continue;
            }
            if node.depends_on.iter().any(|dep| !form.is_set(*dep)) {
                form.field_mut(*id).clear();
                continue;
            }
            match derive::derive_field(*id, form, reference) {
                Derivation::Value(value) => {
                    form.field_mut(*id).assign(value);
                    report.derived.push(*id);
                }
                Derivation::Unresolved => {
                    form.field_mut(*id).mark_unresolved();
                    report.unresolved.push(*id);
                }
                Derivation::Incomplete => {
                    form.field_mut(*id).clear();
                }
            }
        }
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wizard::domain::{FieldValue, TransportMode};
    use crate::wizard::reference::ReferenceCatalog;
    use chrono::NaiveDate;

    fn populated_form(catalog: &ReferenceCatalog) -> (FieldGraph, FormState) {
        let graph = FieldGraph::shipment_wizard();
        let mut form = FormState::new();
        form.field_mut(FieldId::TradeLane)
            .assign(FieldValue::Text("VN-US".to_string()));
        form.field_mut(FieldId::TransportMode)
            .assign(FieldValue::Mode(TransportMode::Ocean));
        form.field_mut(FieldId::ServiceRoute)
            .assign(FieldValue::Text("VNSGN-USLAX-01".to_string()));
        form.field_mut(FieldId::DepartureDate)
            .assign(FieldValue::Date(
                NaiveDate::from_ymd_opt(2025, 1, 10).expect("valid date"),
            ));
        graph.recompute(&mut form, catalog);
        (graph, form)
    }

    #[test]
    fn rejects_unknown_dependencies() {
        let nodes = vec![FieldNode {
            id: FieldId::Carrier,
            kind: FieldKind::Derived,
            depends_on: vec![FieldId::ServiceRoute],
        }];
        match FieldGraph::try_new(nodes) {
            Err(GraphError::UnknownDependency(dep, of)) => {
                assert_eq!(dep, FieldId::ServiceRoute);
                assert_eq!(of, FieldId::Carrier);
            }
            other => panic!("expected unknown dependency error, got {other:?}"),
        }
    }

    #[test]
    fn rejects_cycles() {
        let nodes = vec![
            FieldNode {
                id: FieldId::Carrier,
                kind: FieldKind::Derived,
                depends_on: vec![FieldId::Reliability],
            },
            FieldNode {
                id: FieldId::Reliability,
                kind: FieldKind::Derived,
                depends_on: vec![FieldId::Carrier],
            },
        ];
        assert!(matches!(
            FieldGraph::try_new(nodes),
            Err(GraphError::Cycle(_))
        ));
    }

    #[test]
    fn invalidation_clears_every_transitive_dependent() {
        let catalog = ReferenceCatalog::standard();
        let (graph, mut form) = populated_form(&catalog);
        assert!(form.is_set(FieldId::Carrier));
        assert!(form.is_set(FieldId::EstimatedArrival));
        assert!(form.is_set(FieldId::Reliability));

        let cleared = graph.invalidate(&mut form, FieldId::TradeLane);

        for id in [
            FieldId::ServiceRoute,
            FieldId::Carrier,
            FieldId::ScheduleFrequency,
            FieldId::TransitDays,
            FieldId::EstimatedArrival,
            FieldId::Reliability,
        ] {
            assert!(cleared.contains(&id), "{id} should be cleared");
            assert!(!form.is_set(id), "{id} should be unset");
        }
        // The departure date and its seasonality are untouched by lane edits.
        assert!(form.is_set(FieldId::DepartureDate));
        assert!(form.is_set(FieldId::SeasonalityIndex));
    }

    #[test]
    fn recompute_skips_nodes_with_incomplete_inputs() {
        let catalog = ReferenceCatalog::standard();
        let graph = FieldGraph::shipment_wizard();
        let mut form = FormState::new();
        form.field_mut(FieldId::DepartureDate)
            .assign(FieldValue::Date(
                NaiveDate::from_ymd_opt(2025, 8, 1).expect("valid date"),
            ));

        let report = graph.recompute(&mut form, &catalog);

        assert_eq!(report.derived, vec![FieldId::SeasonalityIndex]);
        assert!(!form.is_set(FieldId::Carrier));
        assert!(!form.is_set(FieldId::EstimatedArrival));
    }

    #[test]
    fn unresolved_lookup_is_flagged_not_fatal() {
        let catalog = ReferenceCatalog::standard();
        let graph = FieldGraph::shipment_wizard();
        let mut form = FormState::new();
        form.field_mut(FieldId::TradeLane)
            .assign(FieldValue::Text("VN-US".to_string()));
        form.field_mut(FieldId::TransportMode)
            .assign(FieldValue::Mode(TransportMode::Rail));
        form.field_mut(FieldId::ServiceRoute)
            .assign(FieldValue::Text("NO-SUCH-ROUTE".to_string()));

        let report = graph.recompute(&mut form, &catalog);

        assert!(report.unresolved.contains(&FieldId::Carrier));
        assert!(form.is_unresolved(FieldId::Carrier));
        assert!(!form.is_set(FieldId::Carrier));
    }

    #[test]
    fn writes_cannot_target_derived_fields() {
        let graph = FieldGraph::shipment_wizard();
        assert!(graph.is_input(FieldId::ServiceRoute));
        assert!(!graph.is_input(FieldId::Carrier));
        assert!(!graph.is_input(FieldId::EstimatedArrival));
    }
}
