use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A WGS84 point. Positional conventions differ per boundary (the polyline
/// wire format is latitude-first, GeoJSON arrays are longitude-first), so the
/// in-memory representation uses named fields and every boundary converts
/// explicitly.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lon: f64,
    pub lat: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TripType {
    Hike,
    Bike,
}

impl TripType {
    pub fn as_str(self) -> &'static str {
        match self {
            TripType::Hike => "hike",
            TripType::Bike => "bike",
        }
    }
}

impl fmt::Display for TripType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TripType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "hike" => Ok(TripType::Hike),
            "bike" => Ok(TripType::Bike),
            other => Err(format!("unknown trip type \"{other}\"")),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TripRequest {
    pub destination: String,
    #[serde(rename = "type")]
    pub trip_type: TripType,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TripResponse {
    pub destination: String,
    #[serde(rename = "type")]
    pub trip_type: TripType,
    pub path: Vec<Coordinate>,
    pub path_days: Vec<Vec<Coordinate>>,
    pub distance_km: f64,
    #[serde(default)]
    pub forecast: Vec<DailyForecast>,
    pub image_url: String,
}

/// One day of the daily weather forecast.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyForecast {
    pub date: String,
    pub temp_max: f64,
    pub temp_min: f64,
    pub precipitation: f64,
}

/// Body for `POST /api/routes`. The path fields carry the route currently
/// displayed by the caller; the owner is never part of the body, it comes from
/// the verified identity header.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveTripRequest {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub destination: String,
    #[serde(rename = "type")]
    pub trip_type: TripType,
    pub path: Vec<Coordinate>,
    #[serde(default)]
    pub path_days: Vec<Vec<Coordinate>>,
}

/// A stored route decoded back into in-memory paths.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedTrip {
    pub id: i32,
    pub name: String,
    pub description: Option<String>,
    pub destination: String,
    #[serde(rename = "type")]
    pub trip_type: TripType,
    pub path: Vec<Coordinate>,
    pub path_days: Vec<Vec<Coordinate>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    pub message: String,
}
