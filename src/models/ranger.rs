use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

use super::alert::GeoPoint;

#[derive(Debug, Clone, FromRow)]
pub struct RangerRow {
    pub ranger_id: Uuid,
    pub name: String,
    pub badge_number: String,
    pub phone_number: Option<String>,
    pub email: Option<String>,
    pub team: Option<String>,
    pub is_active: bool,
    pub lng: f64,
    pub lat: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Ranger {
    pub id: Uuid,
    pub name: String,
    pub badge_number: String,
    pub phone_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub team: Option<String>,
    pub is_active: bool,
    pub current_location: GeoPoint,
}

impl From<RangerRow> for Ranger {
    fn from(row: RangerRow) -> Self {
        Self {
            id: row.ranger_id,
            name: row.name,
            badge_number: row.badge_number,
            phone_number: row.phone_number,
            email: row.email,
            team: row.team,
            is_active: row.is_active,
            current_location: GeoPoint::new(row.lng, row.lat),
        }
    }
}

/// Read-only projection merged into alert detail responses.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RangerSummary {
    pub id: Uuid,
    pub name: String,
    pub badge_number: String,
    pub phone_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub team: Option<String>,
}

impl From<&RangerRow> for RangerSummary {
    fn from(row: &RangerRow) -> Self {
        Self {
            id: row.ranger_id,
            name: row.name.clone(),
            badge_number: row.badge_number.clone(),
            phone_number: row.phone_number.clone(),
            team: row.team.clone(),
        }
    }
}
