use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use sqlx::types::Json;
use tracing::info;
use uuid::Uuid;

use crate::db::{queries, DbPool};
use crate::error::{AppError, AppResult};
use crate::models::alert::{Alert, AlertDetail, AlertRow, AlertSource, AlertStatus, SensorReading};
use crate::models::event::SensorEventPayload;
use crate::models::ranger::{RangerRow, RangerSummary};
use crate::realtime::{Broadcaster, WsEvent};
use crate::triangulation::Estimator;

pub const DEFAULT_RECENT_LIMIT: i64 = 50;
pub const DEFAULT_RELATED_DISTANCE_METERS: f64 = 2000.0;
pub const DEFAULT_RELATED_WINDOW_MINUTES: i64 = 30;
pub const MAX_RELATED_ALERTS: i64 = 5;

/// One-sided correlation window: only detections preceding the target within
/// the given number of minutes are considered related.
pub fn related_window(target: DateTime<Utc>, minutes: i64) -> (DateTime<Utc>, DateTime<Utc>) {
    (target - Duration::minutes(minutes), target)
}

/// The alert lifecycle manager: validates incoming detections, persists them,
/// applies triage mutations, and fans state changes out to viewers. Every
/// mutation broadcasts only after the durable write; broadcast failures never
/// affect the persisted result.
#[derive(Clone)]
pub struct AlertService {
    pool: DbPool,
    estimator: Arc<dyn Estimator>,
    broadcaster: Broadcaster,
}

impl AlertService {
    pub fn new(pool: DbPool, estimator: Arc<dyn Estimator>, broadcaster: Broadcaster) -> Self {
        Self {
            pool,
            estimator,
            broadcaster,
        }
    }

    /// Ingest a raw sensor report: validate, run the triangulation estimator,
    /// persist in one write, then broadcast `new-alert`.
    pub async fn ingest(&self, payload: SensorEventPayload) -> AppResult<Alert> {
        let event = payload.validate()?;

        let reading = SensorReading {
            sensor_id: event.sensor_id.clone(),
            timestamp: event.timestamp,
            confidence: event.confidence,
        };

        // The refinement must be part of the first durable write, never a
        // follow-up update.
        let (location, source) = match self.estimator.estimate(&event.location) {
            Some(refined) => (refined, AlertSource::Triangulated),
            None => (event.location, AlertSource::SingleSensor),
        };

        let row: AlertRow = sqlx::query_as(queries::INSERT_ALERT)
            .bind(Uuid::new_v4())
            .bind(event.timestamp)
            .bind(location.lng())
            .bind(location.lat())
            .bind(source.as_str())
            .bind(event.confidence)
            .bind(Json(vec![reading]))
            .fetch_one(&self.pool)
            .await?;

        let alert = Alert::from(row);
        info!(
            alert_id = %alert.id,
            sensor_id = %event.sensor_id,
            source = source.as_str(),
            severity = alert.severity().as_str(),
            "alert created"
        );

        self.broadcaster.publish(WsEvent::NewAlert(alert.clone()));
        Ok(alert)
    }

    pub async fn list_recent(&self, limit: Option<i64>) -> AppResult<Vec<Alert>> {
        let limit = limit.unwrap_or(DEFAULT_RECENT_LIMIT).max(1);
        let rows: Vec<AlertRow> = sqlx::query_as(queries::SELECT_RECENT_ALERTS)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(Alert::from).collect())
    }

    pub async fn get_detail(&self, alert_id: Uuid) -> AppResult<AlertDetail> {
        let row: AlertRow = sqlx::query_as(queries::SELECT_ALERT_BY_ID)
            .bind(alert_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(AppError::NotFound("Alert"))?;

        let alert = Alert::from(row);
        let ranger = self.ranger_summary(alert.assigned_ranger).await?;
        Ok(AlertDetail::new(alert, ranger))
    }

    pub async fn set_confirmed(&self, alert_id: Uuid, confirmed: bool) -> AppResult<Alert> {
        let row: AlertRow = sqlx::query_as(queries::UPDATE_ALERT_CONFIRMED)
            .bind(alert_id)
            .bind(confirmed)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(AppError::NotFound("Alert"))?;

        let alert = Alert::from(row);
        self.broadcaster.publish(WsEvent::AlertUpdated(alert.clone()));
        Ok(alert)
    }

    /// Assign a ranger and force the status to `assigned`. The ranger must
    /// exist; the optional notes overwrite only when provided.
    pub async fn assign_ranger(
        &self,
        alert_id: Uuid,
        ranger_id: Uuid,
        notes: Option<String>,
    ) -> AppResult<AlertDetail> {
        let ranger: RangerRow = sqlx::query_as(queries::SELECT_RANGER_BY_ID)
            .bind(ranger_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(AppError::NotFound("Ranger"))?;

        let row: AlertRow = sqlx::query_as(queries::UPDATE_ALERT_ASSIGNMENT)
            .bind(alert_id)
            .bind(ranger_id)
            .bind(notes)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(AppError::NotFound("Alert"))?;

        let alert = Alert::from(row);
        info!(alert_id = %alert.id, ranger_id = %ranger_id, "alert assigned");
        self.broadcaster.publish(WsEvent::AlertUpdated(alert.clone()));
        Ok(AlertDetail::new(alert, Some(RangerSummary::from(&ranger))))
    }

    pub async fn update_notes(&self, alert_id: Uuid, notes: String) -> AppResult<Alert> {
        let row: AlertRow = sqlx::query_as(queries::UPDATE_ALERT_NOTES)
            .bind(alert_id)
            .bind(notes)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(AppError::NotFound("Alert"))?;

        let alert = Alert::from(row);
        self.broadcaster.publish(WsEvent::AlertUpdated(alert.clone()));
        Ok(alert)
    }

    /// Set the status. `resolved_at` is kept consistent inside the single
    /// UPDATE: non-null iff the status is terminal, preserved when a terminal
    /// status is set again.
    pub async fn update_status(
        &self,
        alert_id: Uuid,
        status: &str,
        resolution_notes: Option<String>,
    ) -> AppResult<Alert> {
        let status = AlertStatus::parse(status)
            .ok_or_else(|| AppError::Validation(format!("Invalid status: {}", status)))?;

        let row: AlertRow = sqlx::query_as(queries::UPDATE_ALERT_STATUS)
            .bind(alert_id)
            .bind(status.as_str())
            .bind(resolution_notes.unwrap_or_default())
            .fetch_optional(&self.pool)
            .await?
            .ok_or(AppError::NotFound("Alert"))?;

        let alert = Alert::from(row);
        info!(
            alert_id = %alert.id,
            status = status.as_str(),
            terminal = status.is_terminal(),
            "alert status updated"
        );
        self.broadcaster.publish(WsEvent::AlertUpdated(alert.clone()));
        Ok(alert)
    }

    /// Best-effort enrichment: up to 5 alerts within `distance_meters` whose
    /// timestamp falls in the window before the target's. A missing target
    /// yields an empty list, not an error.
    pub async fn find_related(
        &self,
        alert_id: Uuid,
        distance_meters: Option<f64>,
        time_window_minutes: Option<i64>,
    ) -> AppResult<Vec<Alert>> {
        let target: Option<AlertRow> = sqlx::query_as(queries::SELECT_ALERT_BY_ID)
            .bind(alert_id)
            .fetch_optional(&self.pool)
            .await?;
        let target = match target {
            Some(row) => row,
            None => return Ok(Vec::new()),
        };

        let distance = distance_meters.unwrap_or(DEFAULT_RELATED_DISTANCE_METERS);
        let minutes = time_window_minutes.unwrap_or(DEFAULT_RELATED_WINDOW_MINUTES);
        let (since, until) = related_window(target.timestamp, minutes);

        let rows: Vec<AlertRow> = sqlx::query_as(queries::SELECT_RELATED_ALERTS)
            .bind(alert_id)
            .bind(since)
            .bind(until)
            .bind(target.lat)
            .bind(target.lng)
            .bind(distance)
            .bind(MAX_RELATED_ALERTS)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(Alert::from).collect())
    }

    async fn ranger_summary(&self, ranger_id: Option<Uuid>) -> AppResult<Option<RangerSummary>> {
        let Some(ranger_id) = ranger_id else {
            return Ok(None);
        };
        let row: Option<RangerRow> = sqlx::query_as(queries::SELECT_RANGER_BY_ID)
            .bind(ranger_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.as_ref().map(RangerSummary::from))
    }
}
