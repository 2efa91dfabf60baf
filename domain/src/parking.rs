//! Parking availability as the frontend consumes it.

use crate::error::Error;
use crate::gateway::ServiceClient;
use chrono::{DateTime, SecondsFormat, Utc};
use log::*;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;

const CURRENT_AVAILABILITY_PATH: &str = "/analytics/availability/current";

/// Address shown for every spot; the analytics feed carries none.
const DEFAULT_ADDRESS: &str = "Ljubljana";

/// One row of the parking service's current-availability feed.
#[derive(Debug, Clone, Deserialize)]
pub struct AvailabilityRecord {
    pub available_spots: i64,
    pub total_spots: i64,
    #[serde(default)]
    pub name: Option<String>,
    /// Hourly price in cents.
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default)]
    pub lon: Option<f64>,
    #[serde(default)]
    pub lat: Option<f64>,
    #[serde(default)]
    pub actual_timestamp: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParkingSpot {
    pub id: String,
    pub name: String,
    pub address: String,
    pub total_spots: i64,
    pub available_spots: i64,
    /// `null` when the feed has no price for the location.
    pub price_per_hour: Option<f64>,
    pub is_open: bool,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParkingAvailability {
    pub parking_spots: Vec<ParkingSpot>,
    pub total_count: usize,
    pub timestamp: String,
}

/// Collapses the feed to one spot per named location, keeping the first record
/// seen for each name. Records without a name are dropped.
pub fn summarize(records: Vec<AvailabilityRecord>, now: DateTime<Utc>) -> ParkingAvailability {
    let mut seen = HashSet::new();
    let parking_spots: Vec<ParkingSpot> = records
        .into_iter()
        .filter_map(|record| {
            let name = record.name.clone().filter(|n| !n.is_empty())?;
            seen.insert(name.clone()).then_some((name, record))
        })
        .enumerate()
        .map(|(index, (name, record))| ParkingSpot {
            id: (index + 1).to_string(),
            name,
            address: DEFAULT_ADDRESS.to_string(),
            total_spots: record.total_spots,
            available_spots: record.available_spots,
            price_per_hour: record.price.map(|cents| cents / 100.0),
            is_open: true,
            latitude: record.lat,
            longitude: record.lon,
        })
        .collect();

    ParkingAvailability {
        total_count: parking_spots.len(),
        parking_spots,
        timestamp: now.to_rfc3339_opts(SecondsFormat::Millis, true),
    }
}

pub async fn current_availability(
    client: &ServiceClient,
    bearer: Option<&str>,
) -> Result<ParkingAvailability, Error> {
    let records: Vec<AvailabilityRecord> =
        client.get_json(CURRENT_AVAILABILITY_PATH, bearer).await?;
    debug!("Received {} availability records", records.len());

    Ok(summarize(records, Utc::now()))
}

/// Forwards a GraphQL document to the parking service unchanged.
pub async fn forward_graphql(
    client: &ServiceClient,
    body: &Value,
    bearer: Option<&str>,
) -> Result<Value, Error> {
    client.post_graphql(body, bearer).await
}
