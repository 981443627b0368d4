use chrono::NaiveDate;
use lanewise::simulation::{RepositoryError, Scenario, ScenarioRepository};
use metrics_exporter_prometheus::PrometheusHandle;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Scenario persistence for a single service process.
#[derive(Default, Clone)]
pub(crate) struct InMemoryScenarioRepository {
    scenarios: Arc<Mutex<BTreeMap<String, Scenario>>>,
}

impl ScenarioRepository for InMemoryScenarioRepository {
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
        guard
            .remove(name)
            .map(|_| ())
            .ok_or(RepositoryError::NotFound)
    }

    fn names(&self) -> Result<Vec<String>, RepositoryError> {
        let guard = self.scenarios.lock().expect("repository mutex poisoned");
        Ok(guard.keys().cloned().collect())
    }
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}

pub(crate) fn deserialize_optional_date<'de, D>(
    deserializer: D,
) -> Result<Option<NaiveDate>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    opt.map(|value| parse_date(&value).map_err(serde::de::Error::custom))
        .transpose()
}
