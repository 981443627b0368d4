use super::domain::{FieldId, FieldValue, FormState};
use super::reference::ReferenceData;
use chrono::Duration;

/// Outcome of one derivation attempt. Incomplete inputs and failed lookups
/// are ordinary states, never errors.
#[derive(Debug, Clone, PartialEq)]
pub enum Derivation {
    Value(FieldValue),
    Incomplete,
    Unresolved,
}

pub(crate) fn derive_field<R: ReferenceData + ?Sized>(
    id: FieldId,
    form: &FormState,
    reference: &R,
) -> Derivation {
    match id {
        FieldId::Carrier => carrier(form, reference),
        FieldId::ScheduleFrequency => schedule_frequency(form, reference),
        FieldId::TransitDays => transit_days(form, reference),
        FieldId::SeasonalityIndex => seasonality_index(form),
        FieldId::EstimatedArrival => estimated_arrival(form),
        FieldId::Reliability => reliability(form, reference),
        _ => Derivation::Incomplete,
    }
}

fn carrier<R: ReferenceData + ?Sized>(form: &FormState, reference: &R) -> Derivation {
    let (Some(lane), Some(mode), Some(route_id)) = (
        form.text(FieldId::TradeLane),
        form.transport_mode(),
        form.text(FieldId::ServiceRoute),
    ) else {
        return Derivation::Incomplete;
    };
    match reference.route(lane, mode, route_id) {
        Some(record) => Derivation::Value(FieldValue::Text(record.carrier)),
        None => Derivation::Unresolved,
    }
}

fn schedule_frequency<R: ReferenceData + ?Sized>(form: &FormState, reference: &R) -> Derivation {
    let (Some(lane), Some(mode), Some(route_id)) = (
        form.text(FieldId::TradeLane),
        form.transport_mode(),
        form.text(FieldId::ServiceRoute),
    ) else {
        return Derivation::Incomplete;
    };
    match reference.route(lane, mode, route_id) {
        Some(record) => {
            let frequency = record
                .frequency
                .unwrap_or_else(|| mode.default_frequency().to_string());
            Derivation::Value(FieldValue::Text(frequency))
        }
        None => Derivation::Unresolved,
    }
}

fn transit_days<R: ReferenceData + ?Sized>(form: &FormState, reference: &R) -> Derivation {
    let (Some(lane), Some(mode), Some(route_id)) = (
        form.text(FieldId::TradeLane),
        form.transport_mode(),
        form.text(FieldId::ServiceRoute),
    ) else {
        return Derivation::Incomplete;
    };
    match reference.route(lane, mode, route_id) {
        Some(record) => match parse_transit_days(&record.transit_time) {
            Some(days) => Derivation::Value(FieldValue::Integer(days)),
            None => Derivation::Unresolved,
        },
        None => Derivation::Unresolved,
    }
}

fn seasonality_index(form: &FormState) -> Derivation {
    use chrono::Datelike;
    match form.date(FieldId::DepartureDate) {
        Some(departure) => Derivation::Value(FieldValue::Integer(seasonality_for_month(
            departure.month(),
        ))),
        None => Derivation::Incomplete,
    }
}

fn estimated_arrival(form: &FormState) -> Derivation {
    let (Some(departure), Some(transit), Some(seasonality)) = (
        form.date(FieldId::DepartureDate),
        form.integer(FieldId::TransitDays),
        form.integer(FieldId::SeasonalityIndex),
    ) else {
        return Derivation::Incomplete;
    };
    match departure.checked_add_signed(Duration::days(transit + seasonality)) {
        Some(arrival) => Derivation::Value(FieldValue::Date(arrival)),
        None => Derivation::Unresolved,
    }
}

fn reliability<R: ReferenceData + ?Sized>(form: &FormState, reference: &R) -> Derivation {
    let (Some(lane), Some(carrier), Some(seasonality)) = (
        form.text(FieldId::TradeLane),
        form.text(FieldId::Carrier),
        form.integer(FieldId::SeasonalityIndex),
    ) else {
        return Derivation::Incomplete;
    };
    let rating = reference
        .carrier_ratings(lane)
        .into_iter()
        .find(|rating| rating.carrier == carrier);
    let Some(rating) = rating else {
        return Derivation::Unresolved;
    };
    let base = match (rating.on_time_pct, rating.rating) {
        (Some(pct), _) => pct,
        (None, Some(stars)) => stars * 20.0,
        (None, None) => return Derivation::Unresolved,
    };
    let value = (base - seasonality as f64).clamp(0.0, 100.0);
    Derivation::Value(FieldValue::Decimal(value))
}

/// Coarse monsoon/peak-season proxy keyed on departure month alone.
pub fn seasonality_for_month(month: u32) -> i64 {
    match month {
        1..=3 => 3,
        7..=9 => 5,
        _ => 0,
    }
}

/// Parse a published transit figure into whole days. Ranges (`"18-22"`)
/// resolve to their arithmetic mean rounded to the nearest integer; figures
/// with an hour suffix (`"36h"`, `"30 hours"`) convert by ceiling division
/// by 24.
pub fn parse_transit_days(raw: &str) -> Option<i64> {
    let lowered = raw.trim().to_ascii_lowercase();
    let (body, in_hours) = if let Some(rest) = lowered.strip_suffix("hours") {
        (rest, true)
    } else if let Some(rest) = lowered.strip_suffix("hrs") {
        (rest, true)
    } else if let Some(rest) = lowered.strip_suffix("hr") {
        (rest, true)
    } else if let Some(rest) = lowered.strip_suffix('h') {
        (rest, true)
    } else if let Some(rest) = lowered.strip_suffix("days") {
        (rest, false)
    } else if let Some(rest) = lowered.strip_suffix('d') {
        (rest, false)
    } else {
        (lowered.as_str(), false)
    };

    let body = body.trim();
    let magnitude = match body.split_once('-') {
        Some((low, high)) => {
            let low: f64 = low.trim().parse().ok()?;
            let high: f64 = high.trim().parse().ok()?;
            (low + high) / 2.0
        }
        None => body.parse().ok()?,
    };
    if !magnitude.is_finite() || magnitude < 0.0 {
        return None;
    }

    let days = if in_hours {
        (magnitude / 24.0).ceil()
    } else {
        magnitude.round()
    };
    Some(days as i64)
}
