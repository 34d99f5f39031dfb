use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;

use super::alert::GeoPoint;

#[derive(Debug, Clone, FromRow)]
pub struct SensorRow {
    pub sensor_id: String,
    pub lng: f64,
    pub lat: f64,
    pub is_active: bool,
    pub last_ping: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Sensor {
    pub sensor_id: String,
    pub location: GeoPoint,
    pub is_active: bool,
    pub last_ping: DateTime<Utc>,
}

impl From<SensorRow> for Sensor {
    fn from(row: SensorRow) -> Self {
        Self {
            sensor_id: row.sensor_id,
            location: GeoPoint::new(row.lng, row.lat),
            is_active: row.is_active,
            last_ping: row.last_ping,
        }
    }
}
