use super::domain::TransportMode;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::Read;

/// A carrier-operated port pairing inside a trade lane and transport mode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteRecord {
    pub trade_lane: String,
    pub mode: TransportMode,
    pub route_id: String,
    pub carrier: String,
    pub origin_port: String,
    pub destination_port: String,
    /// Sailing/departure cadence; derived fields fall back to the mode
    /// default when absent.
    pub frequency: Option<String>,
    /// Raw transit figure as published, e.g. `"18-22"` (days) or `"36h"`.
    pub transit_time: String,
}

/// Published carrier performance for one trade lane. Either an on-time
/// percentage or a 0-5 rating may be present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CarrierRating {
    pub carrier: String,
    pub on_time_pct: Option<f64>,
    pub rating: Option<f64>,
}

/// Read-only lookup tables keyed by trade-lane identifiers.
pub trait ReferenceData: Send + Sync {
    fn route(&self, trade_lane: &str, mode: TransportMode, route_id: &str) -> Option<RouteRecord>;
    fn routes(&self, trade_lane: &str, mode: TransportMode) -> Vec<RouteRecord>;
    fn carrier_ratings(&self, trade_lane: &str) -> Vec<CarrierRating>;
}

/// Error raised while ingesting reference tables.
#[derive(Debug, thiserror::Error)]
pub enum ReferenceImportError {
    #[error("reference csv malformed: {0}")]
    Csv(#[from] csv::Error),
}

#[derive(Debug, Deserialize)]
struct RatingRow {
    trade_lane: String,
    carrier: String,
    on_time_pct: Option<f64>,
    rating: Option<f64>,
}

/// In-memory reference tables, either built in for demos/tests or ingested
/// from CSV exports of the routing master data.
#[derive(Debug, Clone, Default)]
pub struct ReferenceCatalog {
    routes: Vec<RouteRecord>,
    ratings: BTreeMap<String, Vec<CarrierRating>>,
}

impl ReferenceCatalog {
    pub fn new(routes: Vec<RouteRecord>, ratings: BTreeMap<String, Vec<CarrierRating>>) -> Self {
        Self { routes, ratings }
    }

    /// Load routes and carrier ratings from CSV readers. Route columns:
    /// `trade_lane,mode,route_id,carrier,origin_port,destination_port,frequency,transit_time`;
    /// rating columns: `trade_lane,carrier,on_time_pct,rating`.
    pub fn from_csv<A: Read, B: Read>(
        route_reader: A,
        rating_reader: B,
    ) -> Result<Self, ReferenceImportError> {
        let mut routes = Vec::new();
        for record in csv::Reader::from_reader(route_reader).deserialize() {
            let record: RouteRecord = record?;
            routes.push(record);
        }

        let mut ratings: BTreeMap<String, Vec<CarrierRating>> = BTreeMap::new();
        for row in csv::Reader::from_reader(rating_reader).deserialize() {
            let row: RatingRow = row?;
            ratings.entry(row.trade_lane).or_default().push(CarrierRating {
                carrier: row.carrier,
                on_time_pct: row.on_time_pct,
                rating: row.rating,
            });
        }

        Ok(Self { routes, ratings })
    }

    /// Built-in catalog covering the demo trade lanes.
    pub fn standard() -> Self {
        let routes = vec![
            RouteRecord {
                trade_lane: "VN-US".to_string(),
                mode: TransportMode::Ocean,
                route_id: "VNSGN-USLAX-01".to_string(),
                carrier: "Pacific Crown Line".to_string(),
                origin_port: "Ho Chi Minh City (SGN)".to_string(),
                destination_port: "Los Angeles (LAX)".to_string(),
                frequency: Some("weekly".to_string()),
                transit_time: "18-22".to_string(),
            },
            RouteRecord {
                trade_lane: "VN-US".to_string(),
                mode: TransportMode::Ocean,
                route_id: "VNHPH-USSEA-02".to_string(),
                carrier: "Meridian Container Co".to_string(),
                origin_port: "Haiphong (HPH)".to_string(),
                destination_port: "Seattle (SEA)".to_string(),
                frequency: None,
                transit_time: "21-25".to_string(),
            },
            RouteRecord {
                trade_lane: "VN-US".to_string(),
                mode: TransportMode::Air,
                route_id: "VNSGN-USORD-A1".to_string(),
                carrier: "TransPac Air Cargo".to_string(),
                origin_port: "Tan Son Nhat (SGN)".to_string(),
                destination_port: "Chicago O'Hare (ORD)".to_string(),
                frequency: Some("daily".to_string()),
                transit_time: "36h".to_string(),
            },
            RouteRecord {
                trade_lane: "CN-DE".to_string(),
                mode: TransportMode::Rail,
                route_id: "CNCQ-DEHAM-R1".to_string(),
                carrier: "Silk Road Rail Freight".to_string(),
                origin_port: "Chongqing".to_string(),
                destination_port: "Hamburg".to_string(),
                frequency: None,
                transit_time: "16-18".to_string(),
            },
            RouteRecord {
                trade_lane: "CN-DE".to_string(),
                mode: TransportMode::Ocean,
                route_id: "CNSHA-DEHAM-01".to_string(),
                carrier: "Meridian Container Co".to_string(),
                origin_port: "Shanghai (SHA)".to_string(),
                destination_port: "Hamburg (HAM)".to_string(),
                frequency: Some("weekly".to_string()),
                transit_time: "28-32".to_string(),
            },
            RouteRecord {
                trade_lane: "MX-US".to_string(),
                mode: TransportMode::Road,
                route_id: "MXMTY-USLAR-T1".to_string(),
                carrier: "Norte Cargo Express".to_string(),
                origin_port: "Monterrey".to_string(),
                destination_port: "Laredo".to_string(),
                frequency: None,
                transit_time: "2-3".to_string(),
            },
        ];

        let mut ratings: BTreeMap<String, Vec<CarrierRating>> = BTreeMap::new();
        ratings.insert(
            "VN-US".to_string(),
            vec![
                CarrierRating {
                    carrier: "Pacific Crown Line".to_string(),
                    on_time_pct: Some(86.0),
                    rating: Some(4.2),
                },
                CarrierRating {
                    carrier: "Meridian Container Co".to_string(),
                    on_time_pct: None,
                    rating: Some(3.5),
                },
                CarrierRating {
                    carrier: "TransPac Air Cargo".to_string(),
                    on_time_pct: Some(93.0),
                    rating: Some(4.7),
                },
            ],
        );
        ratings.insert(
            "CN-DE".to_string(),
            vec![
                CarrierRating {
                    carrier: "Silk Road Rail Freight".to_string(),
                    on_time_pct: Some(81.0),
                    rating: None,
                },
                CarrierRating {
                    carrier: "Meridian Container Co".to_string(),
                    on_time_pct: None,
                    rating: Some(3.5),
                },
            ],
        );
        ratings.insert(
            "MX-US".to_string(),
            vec![CarrierRating {
                carrier: "Norte Cargo Express".to_string(),
                on_time_pct: Some(88.0),
                rating: Some(4.0),
            }],
        );

        Self { routes, ratings }
    }

    pub fn trade_lanes(&self) -> Vec<String> {
        let mut lanes: Vec<String> = self
            .routes
            .iter()
            .map(|record| record.trade_lane.clone())
            .collect();
        lanes.sort();
        lanes.dedup();
        lanes
    }
}

impl ReferenceData for ReferenceCatalog {
    fn route(&self, trade_lane: &str, mode: TransportMode, route_id: &str) -> Option<RouteRecord> {
        self.routes
            .iter()
            .find(|record| {
                record.trade_lane == trade_lane
                    && record.mode == mode
                    && record.route_id == route_id
            })
            .cloned()
    }

    fn routes(&self, trade_lane: &str, mode: TransportMode) -> Vec<RouteRecord> {
        self.routes
            .iter()
            .filter(|record| record.trade_lane == trade_lane && record.mode == mode)
            .cloned()
            .collect()
    }

    fn carrier_ratings(&self, trade_lane: &str) -> Vec<CarrierRating> {
        self.ratings.get(trade_lane).cloned().unwrap_or_default()
    }
}
