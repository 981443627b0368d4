use super::domain::{CounterpartyTier, FieldId, FormState, SensitivityTier};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Weighted-sum coefficients for the risk model. These reproduce the
/// documented heuristics by default but are deliberately configuration,
/// not invariants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskWeights {
    pub base_score: f64,
    pub transit_day_weight: f64,
    pub insurance_divisor: f64,
    pub insurance_cap: f64,
    pub high_risk_cargo_bonus: f64,
    pub fragile_bonus: f64,
    pub temperature_bonus: f64,
    pub new_counterparty_penalty: f64,
    pub repeat_counterparty_penalty: f64,
    pub monitoring_module_weight: f64,
    pub low_threshold: f64,
    pub moderate_threshold: f64,
}

impl Default for RiskWeights {
    fn default() -> Self {
        Self {
            base_score: 20.0,
            transit_day_weight: 0.8,
            insurance_divisor: 5_000.0,
            insurance_cap: 15.0,
            high_risk_cargo_bonus: 10.0,
            fragile_bonus: 8.0,
            temperature_bonus: 5.0,
            new_counterparty_penalty: 6.0,
            repeat_counterparty_penalty: 2.0,
            monitoring_module_weight: 1.5,
            low_threshold: 30.0,
            moderate_threshold: 60.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Low,
    Moderate,
    High,
}

impl RiskLevel {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Moderate => "moderate",
            Self::High => "high",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Discrete contribution to the composite score, kept so explanations can
/// cite the specific factors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskComponent {
    pub field: FieldId,
    pub points: f64,
    pub note: String,
}

/// Bounded composite assessment derived purely from the form state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskAssessment {
    pub score: f64,
    pub level: RiskLevel,
    pub components: Vec<RiskComponent>,
}

/// Deterministic, total scoring function over the form state.
#[derive(Debug, Clone)]
pub struct RiskModel {
    weights: RiskWeights,
}

impl Default for RiskModel {
    fn default() -> Self {
        Self::new(RiskWeights::default())
    }
}

impl RiskModel {
    pub fn new(weights: RiskWeights) -> Self {
        Self { weights }
    }

    pub fn weights(&self) -> &RiskWeights {
        &self.weights
    }

    /// Fields that must be set before a full risk analysis is meaningful.
    pub const fn required_fields() -> [FieldId; 8] {
        [
            FieldId::TradeLane,
            FieldId::TransportMode,
            FieldId::ServiceRoute,
            FieldId::DepartureDate,
            FieldId::CargoType,
            FieldId::CargoSensitivity,
            FieldId::InsuredValue,
            FieldId::CounterpartyTier,
        ]
    }

    pub fn missing_required_fields(form: &FormState) -> Vec<FieldId> {
        Self::required_fields()
            .into_iter()
            .filter(|id| !form.is_set(*id))
            .collect()
    }

    pub fn score(&self, form: &FormState) -> RiskAssessment {
        let w = &self.weights;
        let mut components = Vec::new();
        let mut total = w.base_score;
        components.push(RiskComponent {
            field: FieldId::TradeLane,
            points: w.base_score,
            note: "base exposure for any configured shipment".to_string(),
        });

        if let Some(transit) = form.integer(FieldId::TransitDays) {
            let points = transit as f64 * w.transit_day_weight;
            total += points;
            components.push(RiskComponent {
                field: FieldId::TransitDays,
                points,
                note: format!("{transit} transit day(s) in motion"),
            });
        }

        if let Some(insured) = form.decimal(FieldId::InsuredValue) {
            let points = (insured / w.insurance_divisor).min(w.insurance_cap);
            total += points;
            components.push(RiskComponent {
                field: FieldId::InsuredValue,
                points,
                note: format!("insured value {insured:.0} (capped contribution)"),
            });
        }

        if let Some(cargo) = form.cargo_type() {
            if cargo.is_high_risk() {
                total += w.high_risk_cargo_bonus;
                components.push(RiskComponent {
                    field: FieldId::CargoType,
                    points: w.high_risk_cargo_bonus,
                    note: format!("{} is a high-risk category", cargo.label()),
                });
            }
        }

        if let Some(tier) = form.sensitivity() {
            let points = match tier {
                SensitivityTier::Fragile => w.fragile_bonus,
                SensitivityTier::TemperatureControlled => w.temperature_bonus,
                SensitivityTier::Standard => 0.0,
            };
            if points != 0.0 {
                total += points;
                components.push(RiskComponent {
                    field: FieldId::CargoSensitivity,
                    points,
                    note: format!("{} handling", tier.label()),
                });
            }
        }

        if let Some(tier) = form.counterparty() {
            let points = match tier {
                CounterpartyTier::New => w.new_counterparty_penalty,
                CounterpartyTier::Repeat => w.repeat_counterparty_penalty,
                CounterpartyTier::Established => 0.0,
            };
            if points != 0.0 {
                total += points;
                components.push(RiskComponent {
                    field: FieldId::CounterpartyTier,
                    points,
                    note: format!("{} counterparty relationship", tier.label()),
                });
            }
        }

        if let Some(modules) = form.monitoring_modules() {
            let count = modules.len();
            if count > 0 {
                // More signals watched means more known risk surface.
                let points = count as f64 * w.monitoring_module_weight;
                total += points;
                components.push(RiskComponent {
                    field: FieldId::MonitoringModules,
                    points,
                    note: format!("{count} monitoring module(s) enabled"),
                });
            }
        }

        let score = total.clamp(0.0, 100.0);
        RiskAssessment {
            score,
            level: self.classify(score),
            components,
        }
    }

    fn classify(&self, score: f64) -> RiskLevel {
        if score <= self.weights.low_threshold {
            RiskLevel::Low
        } else if score <= self.weights.moderate_threshold {
            RiskLevel::Moderate
        } else {
            RiskLevel::High
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wizard::domain::{CargoType, FieldValue, TransportMode};
    use chrono::NaiveDate;
    use std::collections::BTreeSet;

    fn form_with(values: &[(FieldId, FieldValue)]) -> FormState {
        let mut form = FormState::new();
        for (id, value) in values {
            form.field_mut(*id).assign(value.clone());
        }
        form
    }

    fn loaded_form() -> FormState {
        form_with(&[
            (FieldId::TradeLane, FieldValue::Text("VN-US".to_string())),
            (FieldId::TransportMode, FieldValue::Mode(TransportMode::Ocean)),
            (
                FieldId::ServiceRoute,
                FieldValue::Text("VNSGN-USLAX-01".to_string()),
            ),
            (
                FieldId::DepartureDate,
                FieldValue::Date(NaiveDate::from_ymd_opt(2025, 1, 10).expect("valid")),
            ),
            (FieldId::TransitDays, FieldValue::Integer(20)),
            (FieldId::CargoType, FieldValue::Cargo(CargoType::Electronics)),
            (
                FieldId::CargoSensitivity,
                FieldValue::Sensitivity(SensitivityTier::Fragile),
            ),
            (FieldId::InsuredValue, FieldValue::Decimal(120_000.0)),
            (
                FieldId::CounterpartyTier,
                FieldValue::Counterparty(CounterpartyTier::New),
            ),
            (
                FieldId::MonitoringModules,
                FieldValue::Flags(BTreeSet::from([
                    "gps".to_string(),
                    "temperature".to_string(),
                ])),
            ),
        ])
    }

    #[test]
    fn identical_states_yield_identical_assessments() {
        let model = RiskModel::default();
        let form = loaded_form();
        let first = model.score(&form);
        let second = model.score(&form);
        assert_eq!(first, second);
    }

    #[test]
    fn default_weights_reproduce_the_documented_sum() {
        let model = RiskModel::default();
        let assessment = model.score(&loaded_form());

        // 20 base + 16 transit + 15 capped insurance + 10 cargo + 8 fragile
        // + 6 new counterparty + 3 monitoring = 78.
        assert!((assessment.score - 78.0).abs() < 1e-9);
        assert_eq!(assessment.level, RiskLevel::High);
    }

    #[test]
    fn score_stays_bounded_for_extreme_inputs() {
        let model = RiskModel::default();
        let form = form_with(&[
            (FieldId::TransitDays, FieldValue::Integer(10_000)),
            (FieldId::InsuredValue, FieldValue::Decimal(f64::MAX / 2.0)),
        ]);
        let assessment = model.score(&form);
        assert!(assessment.score <= 100.0);
        assert!(assessment.score >= 0.0);
        assert_eq!(assessment.level, RiskLevel::High);
    }

    #[test]
    fn empty_form_scores_the_base_constant() {
        let model = RiskModel::default();
        let assessment = model.score(&FormState::new());
        assert_eq!(assessment.score, 20.0);
        assert_eq!(assessment.level, RiskLevel::Low);
        assert_eq!(assessment.components.len(), 1);
    }

    #[test]
    fn level_thresholds_are_inclusive_at_the_boundaries() {
        let model = RiskModel::default();
        assert_eq!(model.classify(30.0), RiskLevel::Low);
        assert_eq!(model.classify(30.1), RiskLevel::Moderate);
        assert_eq!(model.classify(60.0), RiskLevel::Moderate);
        assert_eq!(model.classify(60.1), RiskLevel::High);
    }

    #[test]
    fn missing_required_fields_are_listed_by_name() {
        let form = form_with(&[(FieldId::TradeLane, FieldValue::Text("VN-US".to_string()))]);
        let missing = RiskModel::missing_required_fields(&form);
        assert!(missing.contains(&FieldId::TransportMode));
        assert!(missing.contains(&FieldId::CounterpartyTier));
        assert!(!missing.contains(&FieldId::TradeLane));
        assert_eq!(missing.len(), 7);
    }
}
