use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;

use super::ranger::RangerSummary;

/// GeoJSON-style point: coordinates are [longitude, latitude].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    #[serde(rename = "type", default = "point_type")]
    pub kind: PointType,
    pub coordinates: [f64; 2],
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub enum PointType {
    #[default]
    Point,
}

fn point_type() -> PointType {
    PointType::Point
}

impl GeoPoint {
    pub fn new(lng: f64, lat: f64) -> Self {
        Self {
            kind: PointType::Point,
            coordinates: [lng, lat],
        }
    }

    pub fn lng(&self) -> f64 {
        self.coordinates[0]
    }

    pub fn lat(&self) -> f64 {
        self.coordinates[1]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertStatus {
    New,
    Assigned,
    Investigating,
    Resolved,
    FalsePositive,
}

impl AlertStatus {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "new" => Some(Self::New),
            "assigned" => Some(Self::Assigned),
            "investigating" => Some(Self::Investigating),
            "resolved" => Some(Self::Resolved),
            "false_positive" => Some(Self::FalsePositive),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::New => "new",
            Self::Assigned => "assigned",
            Self::Investigating => "investigating",
            Self::Resolved => "resolved",
            Self::FalsePositive => "false_positive",
        }
    }

    /// Terminal in practice; either can still be reopened by an operator.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Resolved | Self::FalsePositive)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AlertSource {
    #[serde(rename = "single-sensor")]
    SingleSensor,
    #[serde(rename = "triangulated")]
    Triangulated,
}

impl AlertSource {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "single-sensor" => Some(Self::SingleSensor),
            "triangulated" => Some(Self::Triangulated),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SingleSensor => "single-sensor",
            Self::Triangulated => "triangulated",
        }
    }
}

/// Display-only classification derived from source and confidence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

pub fn derive_severity(source: AlertSource, confidence: f64) -> Severity {
    if source == AlertSource::Triangulated || confidence > 80.0 {
        Severity::High
    } else if confidence > 60.0 {
        Severity::Medium
    } else {
        Severity::Low
    }
}

/// Confidence values always live in [0, 100]; out-of-range input is clamped.
pub fn clamp_confidence(value: f64) -> f64 {
    if value.is_nan() {
        return 0.0;
    }
    value.clamp(0.0, 100.0)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SensorReading {
    pub sensor_id: String,
    pub timestamp: DateTime<Utc>,
    pub confidence: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioEvidence {
    pub filename: String,
    pub url: String,
    pub duration: f64,
}

/// Raw alerts row. Location is stored as plain lng/lat columns and assembled
/// into a GeoPoint on the wire DTO.
#[derive(Debug, Clone, FromRow)]
pub struct AlertRow {
    pub alert_id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub lng: f64,
    pub lat: f64,
    pub source: String,
    pub confirmed: bool,
    pub status: String,
    pub confidence: f64,
    pub assigned_ranger: Option<Uuid>,
    pub notes: Option<String>,
    pub resolution_notes: Option<String>,
    pub resolved_at: Option<DateTime<Utc>>,
    pub sensor_readings: Json<Vec<SensorReading>>,
    pub audio_evidence: Option<Json<AudioEvidence>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Wire representation of an alert, matching the dashboard API schema.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Alert {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub location: GeoPoint,
    pub source: AlertSource,
    pub confirmed: bool,
    pub status: AlertStatus,
    pub confidence: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assigned_ranger: Option<Uuid>,
    pub notes: Option<String>,
    pub resolution_notes: Option<String>,
    pub resolved_at: Option<DateTime<Utc>>,
    pub sensor_readings: Vec<SensorReading>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio_evidence: Option<AudioEvidence>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Alert {
    pub fn severity(&self) -> Severity {
        derive_severity(self.source, self.confidence)
    }
}

impl From<AlertRow> for Alert {
    fn from(row: AlertRow) -> Self {
        Self {
            id: row.alert_id,
            timestamp: row.timestamp,
            location: GeoPoint::new(row.lng, row.lat),
            source: AlertSource::parse(&row.source).unwrap_or(AlertSource::SingleSensor),
            confirmed: row.confirmed,
            status: AlertStatus::parse(&row.status).unwrap_or(AlertStatus::New),
            confidence: row.confidence,
            assigned_ranger: row.assigned_ranger,
            notes: row.notes,
            resolution_notes: row.resolution_notes,
            resolved_at: row.resolved_at,
            sensor_readings: row.sensor_readings.0,
            audio_evidence: row.audio_evidence.map(|j| j.0),
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Alert with the assigned ranger's summary denormalized for display. The
/// persisted record keeps only the ranger id; the summary is a secondary
/// lookup merged into the response.
#[derive(Debug, Clone, Serialize)]
pub struct AlertDetail {
    #[serde(flatten)]
    pub alert: Alert,
    #[serde(rename = "assignedRanger", skip_serializing_if = "Option::is_none")]
    pub ranger: Option<RangerSummary>,
}

impl AlertDetail {
    pub fn new(mut alert: Alert, ranger: Option<RangerSummary>) -> Self {
        if ranger.is_some() {
            // The summary replaces the bare id on the wire.
            alert.assigned_ranger = None;
        }
        Self { alert, ranger }
    }
}
