use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::error::AppError;

use super::alert::{clamp_confidence, GeoPoint};

/// Incoming gunshot event as posted by a sensor. Everything is optional at
/// the parse stage; `validate` decides what is actually acceptable.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SensorEventPayload {
    pub sensor_id: Option<String>,
    pub timestamp: Option<DateTime<Utc>>,
    pub location: Option<RawLocation>,
    pub confidence: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub struct RawLocation {
    #[serde(default)]
    pub coordinates: Option<Vec<f64>>,
}

/// A sensor event that passed validation: non-empty sensor id and a finite
/// [lng, lat] pair. The timestamp defaults to ingestion time.
#[derive(Debug, Clone)]
pub struct ValidatedEvent {
    pub sensor_id: String,
    pub timestamp: DateTime<Utc>,
    pub location: GeoPoint,
    pub confidence: f64,
}

impl SensorEventPayload {
    pub fn validate(self) -> Result<ValidatedEvent, AppError> {
        let sensor_id = match self.sensor_id {
            Some(id) if !id.trim().is_empty() => id,
            _ => {
                return Err(AppError::Validation(
                    "Invalid sensor data: sensorId and location.coordinates are required".into(),
                ))
            }
        };

        let coordinates = self
            .location
            .and_then(|l| l.coordinates)
            .ok_or_else(|| {
                AppError::Validation(
                    "Invalid sensor data: sensorId and location.coordinates are required".into(),
                )
            })?;

        if coordinates.len() != 2 {
            return Err(AppError::Validation(
                "location.coordinates must be a [longitude, latitude] pair".into(),
            ));
        }
        if coordinates.iter().any(|c| !c.is_finite()) {
            return Err(AppError::Validation(
                "location.coordinates must be finite numbers".into(),
            ));
        }

        Ok(ValidatedEvent {
            sensor_id,
            timestamp: self.timestamp.unwrap_or_else(Utc::now),
            location: GeoPoint::new(coordinates[0], coordinates[1]),
            confidence: clamp_confidence(self.confidence.unwrap_or(0.0)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(json: &str) -> SensorEventPayload {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn accepts_well_formed_event() {
        let event = payload(
            r#"{"sensorId": "sensor_alpha_01",
                "timestamp": "2026-08-01T12:00:00Z",
                "location": {"type": "Point", "coordinates": [36.8219, -1.2921]}}"#,
        )
        .validate()
        .unwrap();

        assert_eq!(event.sensor_id, "sensor_alpha_01");
        assert_eq!(event.location.lng(), 36.8219);
        assert_eq!(event.location.lat(), -1.2921);
        assert_eq!(event.confidence, 0.0);
    }

    #[test]
    fn defaults_timestamp_to_ingestion_time() {
        let before = Utc::now();
        let event = payload(
            r#"{"sensorId": "s1", "location": {"coordinates": [1.0, 2.0]}}"#,
        )
        .validate()
        .unwrap();
        assert!(event.timestamp >= before);
    }

    #[test]
    fn rejects_missing_sensor_id() {
        let err = payload(r#"{"location": {"coordinates": [1.0, 2.0]}}"#)
            .validate()
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[test]
    fn rejects_blank_sensor_id() {
        let err = payload(r#"{"sensorId": "  ", "location": {"coordinates": [1.0, 2.0]}}"#)
            .validate()
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[test]
    fn rejects_missing_coordinates() {
        let err = payload(r#"{"sensorId": "s1", "location": {}}"#)
            .validate()
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[test]
    fn rejects_wrong_arity() {
        let err = payload(r#"{"sensorId": "s1", "location": {"coordinates": [1.0]}}"#)
            .validate()
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        let err = payload(r#"{"sensorId": "s1", "location": {"coordinates": [1.0, 2.0, 3.0]}}"#)
            .validate()
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[test]
    fn rejects_non_finite_coordinates() {
        let raw = SensorEventPayload {
            sensor_id: Some("s1".into()),
            timestamp: None,
            location: Some(RawLocation {
                coordinates: Some(vec![f64::NAN, 2.0]),
            }),
            confidence: None,
        };
        assert!(matches!(raw.validate(), Err(AppError::Validation(_))));
    }

    #[test]
    fn clamps_reported_confidence() {
        let raw = SensorEventPayload {
            sensor_id: Some("s1".into()),
            timestamp: None,
            location: Some(RawLocation {
                coordinates: Some(vec![1.0, 2.0]),
            }),
            confidence: Some(250.0),
        };
        assert_eq!(raw.validate().unwrap().confidence, 100.0);
    }
}
