use super::domain::{AdjustmentSet, FactorKey, Scenario};
use super::store::{RepositoryError, ScenarioRepository, ScenarioStore, StoreError};
use super::wire::{
    FactorContribution, LoadScenarioResponse, PresetResponse, SaveScenarioRequest,
    SensitivityRow, SimulateRequest, SimulateResponse, SimulationPayload, SimulationProfile,
    StatusResponse,
};
use chrono::Utc;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info};

/// Score points contributed by one unit of adjustment on each factor.
/// Like the risk weights these are configuration, not invariants.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct FactorWeights {
    pub transit_time: f64,
    pub carrier_reliability: f64,
    pub insurance_coverage: f64,
    pub cargo_sensitivity: f64,
    pub monitoring_coverage: f64,
    pub seasonality: f64,
}

impl Default for FactorWeights {
    fn default() -> Self {
        Self {
            transit_time: 1.2,
            carrier_reliability: -0.6,
            insurance_coverage: -0.4,
            cargo_sensitivity: 2.0,
            monitoring_coverage: 1.0,
            seasonality: 1.5,
        }
    }
}

impl FactorWeights {
    pub fn weight(&self, factor: FactorKey) -> f64 {
        match factor {
            FactorKey::TransitTime => self.transit_time,
            FactorKey::CarrierReliability => self.carrier_reliability,
            FactorKey::InsuranceCoverage => self.insurance_coverage,
            FactorKey::CargoSensitivity => self.cargo_sensitivity,
            FactorKey::MonitoringCoverage => self.monitoring_coverage,
            FactorKey::Seasonality => self.seasonality,
        }
    }
}

/// Server side of the simulation store: deterministic perturbation of a
/// baseline score plus scenario CRUD and preset lookup.
pub struct SimulationService<R> {
    weights: FactorWeights,
    repository: Arc<R>,
    presets: BTreeMap<String, AdjustmentSet>,
}

impl<R: ScenarioRepository> SimulationService<R> {
    pub fn new(repository: Arc<R>, weights: FactorWeights) -> Self {
        Self {
            weights,
            repository,
            presets: Self::standard_presets(),
        }
    }

    pub fn with_presets(mut self, presets: BTreeMap<String, AdjustmentSet>) -> Self {
        self.presets = presets;
        self
    }

    /// Curated starting points offered by the store.
    pub fn standard_presets() -> BTreeMap<String, AdjustmentSet> {
        let mut presets = BTreeMap::new();
        presets.insert(
            "peak_season".to_string(),
            AdjustmentSet::from([(FactorKey::Seasonality, 2.0), (FactorKey::TransitTime, 3.0)]),
        );
        presets.insert(
            "expedited".to_string(),
            AdjustmentSet::from([
                (FactorKey::TransitTime, -5.0),
                (FactorKey::CarrierReliability, 4.0),
            ]),
        );
        presets.insert(
            "extra_coverage".to_string(),
            AdjustmentSet::from([
                (FactorKey::InsuranceCoverage, 6.0),
                (FactorKey::MonitoringCoverage, 2.0),
            ]),
        );
        presets
    }

    /// Apply the factor-weighted deltas to the baseline. Transparent by
    /// construction: the payload itemizes every contribution.
    pub fn simulate(&self, request: &SimulateRequest) -> SimulationPayload {
        let mut factors = Vec::new();
        let mut drivers_changed = Vec::new();
        let mut shift = 0.0;
        for factor in FactorKey::ordered() {
            let delta = request.adjustments.get(&factor).copied().unwrap_or(0.0);
            let weight = self.weights.weight(factor);
            let contribution = delta * weight;
            shift += contribution;
            if delta != 0.0 {
                drivers_changed.push(factor);
            }
            factors.push(FactorContribution {
                factor,
                delta,
                weight,
                contribution,
            });
        }

        let simulation_score = (request.baseline + shift).clamp(0.0, 100.0);
        let delta_from_baseline = simulation_score - request.baseline;

        let matrix = factors
            .iter()
            .map(|entry| SensitivityRow {
                factor: entry.factor,
                low: (request.baseline + shift - entry.weight).clamp(0.0, 100.0),
                base: simulation_score,
                high: (request.baseline + shift + entry.weight).clamp(0.0, 100.0),
            })
            .collect();

        let explanation = Self::explain(request.baseline, simulation_score, &factors);
        debug!(
            baseline = request.baseline,
            simulated = simulation_score,
            drivers = drivers_changed.len(),
            "simulation evaluated"
        );

        SimulationPayload {
            simulation_score,
            delta_from_baseline,
            profile: SimulationProfile { explanation },
            factors,
            drivers_changed,
            matrix,
        }
    }

    fn explain(baseline: f64, simulated: f64, factors: &[FactorContribution]) -> String {
        let mut active: Vec<&FactorContribution> = factors
            .iter()
            .filter(|entry| entry.contribution != 0.0)
            .collect();
        if active.is_empty() {
            return format!("Score unchanged at {baseline:.1}; no factor was adjusted.");
        }
        active.sort_by(|a, b| {
            b.contribution
                .abs()
                .partial_cmp(&a.contribution.abs())
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        let drivers = active
            .iter()
            .map(|entry| format!("{} {:+.1}", entry.factor.label(), entry.contribution))
            .collect::<Vec<_>>()
            .join(", ");
        format!(
            "Simulated score {simulated:.1} against baseline {baseline:.1}; drivers: {drivers}."
        )
    }

    pub fn save_scenario(&self, request: &SaveScenarioRequest) -> Result<(), RepositoryError> {
        let scenario = Scenario {
            name: request.name.clone(),
            adjustments: request.adjustments.clone(),
            baseline_score: request.baseline_score,
            simulated_score: request.result,
            created_at: Utc::now(),
        };
        self.repository.insert(scenario)?;
        info!(name = %request.name, "scenario saved");
        Ok(())
    }

    pub fn load_scenario(&self, name: &str) -> Result<Scenario, RepositoryError> {
        self.repository
            .fetch(name)?
            .ok_or(RepositoryError::NotFound)
    }

    pub fn delete_scenario(&self, name: &str) -> Result<(), RepositoryError> {
        self.repository.remove(name)?;
        info!(name, "scenario deleted");
        Ok(())
    }

    pub fn scenario_names(&self) -> Result<Vec<String>, RepositoryError> {
        self.repository.names()
    }

    pub fn preset(&self, name: &str) -> Option<&AdjustmentSet> {
        self.presets.get(name)
    }
}

/// In-process adapter: the service itself satisfies the client port, which
/// is what the demo, the composition root, and the tests run against.
impl<R: ScenarioRepository> ScenarioStore for SimulationService<R> {
    fn simulate(&self, request: &SimulateRequest) -> Result<SimulateResponse, StoreError> {
        Ok(SimulateResponse::success(SimulationService::simulate(
            self, request,
        )))
    }

    fn save(&self, request: &SaveScenarioRequest) -> Result<StatusResponse, StoreError> {
        match self.save_scenario(request) {
            Ok(()) => Ok(StatusResponse::success()),
            Err(RepositoryError::Unavailable(reason)) => Err(StoreError::Unavailable(reason)),
            Err(err) => Ok(StatusResponse::failure(err.to_string())),
        }
    }

    fn load(&self, name: &str) -> Result<LoadScenarioResponse, StoreError> {
        match self.load_scenario(name) {
            Ok(scenario) => Ok(LoadScenarioResponse::success(scenario.adjustments)),
            Err(RepositoryError::Unavailable(reason)) => Err(StoreError::Unavailable(reason)),
            Err(err) => Ok(LoadScenarioResponse::failure(err.to_string())),
        }
    }

    fn delete(&self, name: &str) -> Result<StatusResponse, StoreError> {
        match self.delete_scenario(name) {
            Ok(()) => Ok(StatusResponse::success()),
            Err(RepositoryError::Unavailable(reason)) => Err(StoreError::Unavailable(reason)),
            Err(err) => Ok(StatusResponse::failure(err.to_string())),
        }
    }

    fn preset(&self, name: &str) -> Result<PresetResponse, StoreError> {
        match SimulationService::preset(self, name) {
            Some(adjustments) => Ok(PresetResponse::success(adjustments.clone())),
            None => Ok(PresetResponse::failure(format!("unknown preset '{name}'"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use std::sync::Mutex;

    #[derive(Default)]
    struct MemoryRepository {
        scenarios: Mutex<BTreeMap<String, Scenario>>,
    }

    impl ScenarioRepository for MemoryRepository {
        fn insert(&self, scenario: Scenario) -> Result<(), RepositoryError> {
            let mut guard = self.scenarios.lock().expect("repository mutex poisoned");
            if guard.contains_key(&scenario.name) {
                return Err(RepositoryError::Conflict);
            }
            guard.insert(scenario.name.clone(), scenario);
            Ok(())
        }

        fn fetch(&self, name: &str) -> Result<Option<Scenario>, RepositoryError> {
            let guard = self.scenarios.lock().expect("repository mutex poisoned");
            Ok(guard.get(name).cloned())
        }

        fn remove(&self, name: &str) -> Result<(), RepositoryError> {
            let mut guard = self.scenarios.lock().expect("repository mutex poisoned");
            guard.remove(name).map(|_| ()).ok_or(RepositoryError::NotFound)
        }

        fn names(&self) -> Result<Vec<String>, RepositoryError> {
            let guard = self.scenarios.lock().expect("repository mutex poisoned");
            Ok(guard.keys().cloned().collect())
        }
    }

    fn service() -> SimulationService<MemoryRepository> {
        SimulationService::new(Arc::new(MemoryRepository::default()), FactorWeights::default())
    }

    #[test]
    fn simulate_applies_weighted_deltas_and_reports_drivers() {
        let service = service();
        let request = SimulateRequest {
            baseline: 55.0,
            adjustments: AdjustmentSet::from([
                (FactorKey::TransitTime, 5.0),
                (FactorKey::CarrierReliability, 5.0),
            ]),
            original_inputs: BTreeMap::new(),
        };

        let payload = service.simulate(&request);

        // 55 + 5*1.2 + 5*(-0.6) = 58.
        assert!((payload.simulation_score - 58.0).abs() < 1e-9);
        assert!((payload.delta_from_baseline - 3.0).abs() < 1e-9);
        assert_eq!(
            payload.drivers_changed,
            vec![FactorKey::TransitTime, FactorKey::CarrierReliability]
        );
        assert!(payload.profile.explanation.contains("Transit time"));
        assert_eq!(payload.factors.len(), FactorKey::ordered().len());
        assert_eq!(payload.matrix.len(), FactorKey::ordered().len());
    }

    #[test]
    fn simulate_clamps_to_the_score_bounds() {
        let service = service();
        let request = SimulateRequest {
            baseline: 95.0,
            adjustments: AdjustmentSet::from([(FactorKey::CargoSensitivity, 50.0)]),
            original_inputs: BTreeMap::new(),
        };
        let payload = service.simulate(&request);
        assert_eq!(payload.simulation_score, 100.0);
        assert_eq!(payload.delta_from_baseline, 5.0);
    }

    #[test]
    fn sensitivity_matrix_brackets_the_simulated_score() {
        let service = service();
        let request = SimulateRequest {
            baseline: 50.0,
            adjustments: AdjustmentSet::from([(FactorKey::TransitTime, 2.0)]),
            original_inputs: BTreeMap::new(),
        };
        let payload = service.simulate(&request);
        let row = payload
            .matrix
            .iter()
            .find(|row| row.factor == FactorKey::TransitTime)
            .expect("transit row present");
        assert!((row.base - 52.4).abs() < 1e-9);
        assert!((row.low - 51.2).abs() < 1e-9);
        assert!((row.high - 53.6).abs() < 1e-9);
    }

    #[test]
    fn duplicate_save_surfaces_a_recoverable_status() {
        let service = service();
        let request = SaveScenarioRequest {
            name: "monsoon".to_string(),
            adjustments: AdjustmentSet::from([(FactorKey::Seasonality, 2.0)]),
            result: 61.0,
            baseline_score: 58.0,
        };

        let first = ScenarioStore::save(&service, &request).expect("transport ok");
        assert!(first.is_success());

        let second = ScenarioStore::save(&service, &request).expect("transport ok");
        assert!(!second.is_success());
        assert_eq!(second.message.as_deref(), Some("scenario already exists"));
    }

    #[test]
    fn load_and_delete_round_trip_through_the_store_port() {
        let service = service();
        let request = SaveScenarioRequest {
            name: "expedite".to_string(),
            adjustments: AdjustmentSet::from([(FactorKey::TransitTime, -4.0)]),
            result: 50.2,
            baseline_score: 55.0,
        };
        ScenarioStore::save(&service, &request).expect("transport ok");

        let loaded = ScenarioStore::load(&service, "expedite").expect("transport ok");
        assert!(loaded.is_success());
        assert_eq!(
            loaded
                .scenario
                .expect("scenario present")
                .adjustments
                .get(&FactorKey::TransitTime),
            Some(&-4.0)
        );

        let deleted = ScenarioStore::delete(&service, "expedite").expect("transport ok");
        assert!(deleted.is_success());

        let missing = ScenarioStore::load(&service, "expedite").expect("transport ok");
        assert!(!missing.is_success());
    }

    #[test]
    fn presets_resolve_by_name_with_recoverable_miss() {
        let service = service();
        let preset = ScenarioStore::preset(&service, "peak_season").expect("transport ok");
        assert!(preset.is_success());
        assert!(preset
            .preset
            .expect("preset present")
            .adjustments
            .contains_key(&FactorKey::Seasonality));

        let missing = ScenarioStore::preset(&service, "nope").expect("transport ok");
        assert!(!missing.is_success());
    }
}
