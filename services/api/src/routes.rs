use crate::infra::{deserialize_optional_date, AppState};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Extension;
use axum::Json;
use chrono::NaiveDate;
use lanewise::config::EngineConfig;
use lanewise::simulation::{simulation_router, ScenarioRepository, SimulationService};
use lanewise::wizard::{
    CargoType, ConfiguratorEngine, CounterpartyTier, FieldId, FieldValue, ReferenceCatalog,
    RiskComponent, RiskLevel, SectionProgress, SensitivityTier, TransportMode,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::BTreeSet;
use std::sync::Arc;

#[derive(Debug, Deserialize)]
pub(crate) struct RiskAssessRequest {
    pub(crate) trade_lane: Option<String>,
    pub(crate) transport_mode: Option<TransportMode>,
    pub(crate) service_route: Option<String>,
    #[serde(default, deserialize_with = "deserialize_optional_date")]
    pub(crate) departure_date: Option<NaiveDate>,
    pub(crate) cargo_type: Option<CargoType>,
    pub(crate) cargo_sensitivity: Option<SensitivityTier>,
    pub(crate) insured_value: Option<f64>,
    pub(crate) counterparty_tier: Option<CounterpartyTier>,
    #[serde(default)]
    pub(crate) monitoring_modules: BTreeSet<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct DerivedFieldsView {
    pub(crate) carrier: Option<String>,
    pub(crate) schedule_frequency: Option<String>,
    pub(crate) transit_days: Option<i64>,
    pub(crate) seasonality_index: Option<i64>,
    pub(crate) estimated_arrival: Option<NaiveDate>,
    pub(crate) reliability: Option<f64>,
}

#[derive(Debug, Serialize)]
pub(crate) struct RiskAssessResponse {
    pub(crate) score: f64,
    pub(crate) level: RiskLevel,
    pub(crate) components: Vec<RiskComponent>,
    pub(crate) derived: DerivedFieldsView,
    pub(crate) sections: Vec<SectionProgress>,
}

/// Compose the simulation store routes with operational endpoints and the
/// one-shot risk assessment.
pub(crate) fn with_wizard_routes<R>(service: Arc<SimulationService<R>>) -> axum::Router
where
    R: ScenarioRepository + 'static,
{
    simulation_router(service)
        .route("/health", axum::routing::get(healthcheck))
        .route("/ready", axum::routing::get(readiness_endpoint))
        .route("/metrics", axum::routing::get(metrics_endpoint))
        .route(
            "/api/v1/risk/assess",
            axum::routing::post(risk_assess_endpoint),
        )
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

pub(crate) async fn risk_assess_endpoint(
    Json(payload): Json<RiskAssessRequest>,
) -> Result<Response, lanewise::error::AppError> {
    let mut engine = ConfiguratorEngine::new(
        Arc::new(ReferenceCatalog::standard()),
        EngineConfig::default(),
    );

    if let Some(lane) = payload.trade_lane {
        engine.commit_field(FieldId::TradeLane, FieldValue::Text(lane))?;
    }
    if let Some(mode) = payload.transport_mode {
        engine.commit_field(FieldId::TransportMode, FieldValue::Mode(mode))?;
    }
    if let Some(route) = payload.service_route {
        engine.commit_field(FieldId::ServiceRoute, FieldValue::Text(route))?;
    }
    if let Some(date) = payload.departure_date {
        engine.commit_field(FieldId::DepartureDate, FieldValue::Date(date))?;
    }
    if let Some(cargo) = payload.cargo_type {
        engine.commit_field(FieldId::CargoType, FieldValue::Cargo(cargo))?;
    }
    if let Some(tier) = payload.cargo_sensitivity {
        engine.commit_field(FieldId::CargoSensitivity, FieldValue::Sensitivity(tier))?;
    }
    if let Some(value) = payload.insured_value {
        engine.commit_field(FieldId::InsuredValue, FieldValue::Decimal(value))?;
    }
    if let Some(tier) = payload.counterparty_tier {
        engine.commit_field(FieldId::CounterpartyTier, FieldValue::Counterparty(tier))?;
    }
    if !payload.monitoring_modules.is_empty() {
        engine.commit_field(
            FieldId::MonitoringModules,
            FieldValue::Flags(payload.monitoring_modules),
        )?;
    }

    let missing = engine.missing_required_fields();
    if !missing.is_empty() {
        let body = json!({
            "error": "incomplete configuration",
            "missing_fields": missing,
        });
        return Ok((StatusCode::UNPROCESSABLE_ENTITY, Json(body)).into_response());
    }

    let risk = engine.risk();
    let form = engine.form();
    let response = RiskAssessResponse {
        score: risk.score,
        level: risk.level,
        components: risk.components,
        derived: DerivedFieldsView {
            carrier: form.text(FieldId::Carrier).map(str::to_string),
            schedule_frequency: form.text(FieldId::ScheduleFrequency).map(str::to_string),
            transit_days: form.integer(FieldId::TransitDays),
            seasonality_index: form.integer(FieldId::SeasonalityIndex),
            estimated_arrival: form.date(FieldId::EstimatedArrival),
            reliability: form.decimal(FieldId::Reliability),
        },
        sections: engine.progress(),
    };

    Ok((StatusCode::OK, Json(response)).into_response())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_request() -> RiskAssessRequest {
        RiskAssessRequest {
            trade_lane: Some("VN-US".to_string()),
            transport_mode: Some(TransportMode::Ocean),
            service_route: Some("VNSGN-USLAX-01".to_string()),
            departure_date: NaiveDate::from_ymd_opt(2025, 1, 10),
            cargo_type: Some(CargoType::Electronics),
            cargo_sensitivity: Some(SensitivityTier::Fragile),
            insured_value: Some(120_000.0),
            counterparty_tier: Some(CounterpartyTier::New),
            monitoring_modules: BTreeSet::from(["gps".to_string(), "temperature".to_string()]),
        }
    }

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body reads");
        serde_json::from_slice(&bytes).expect("body is json")
    }

    #[tokio::test]
    async fn assess_endpoint_scores_a_complete_configuration() {
        let response = risk_assess_endpoint(Json(full_request()))
            .await
            .expect("assessment builds");
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        assert!((body["score"].as_f64().expect("score") - 78.0).abs() < 1e-9);
        assert_eq!(body["level"], "high");
        assert_eq!(body["derived"]["carrier"], "Pacific Crown Line");
        assert_eq!(body["derived"]["transit_days"], 20);
        assert_eq!(body["derived"]["estimated_arrival"], "2025-02-02");
    }

    #[tokio::test]
    async fn assess_endpoint_lists_missing_required_fields() {
        let request = RiskAssessRequest {
            trade_lane: Some("VN-US".to_string()),
            transport_mode: None,
            service_route: None,
            departure_date: None,
            cargo_type: None,
            cargo_sensitivity: None,
            insured_value: None,
            counterparty_tier: None,
            monitoring_modules: BTreeSet::new(),
        };

        let response = risk_assess_endpoint(Json(request))
            .await
            .expect("refusal builds");
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let body = body_json(response).await;
        let missing = body["missing_fields"].as_array().expect("field list");
        assert_eq!(missing.len(), 7);
        assert!(missing.contains(&serde_json::Value::String("transport_mode".to_string())));
    }
}
