use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::alerts::stats::{self, StatsBucket, StatsParams, StatsQuery};
use crate::db::queries;
use crate::error::{AppError, AppResult};
use crate::models::alert::{Alert, AlertDetail};
use crate::models::event::SensorEventPayload;
use crate::models::ranger::{Ranger, RangerRow};
use crate::models::sensor::{Sensor, SensorRow};
use crate::sms::{BulkSmsRequest, SmsRequest};

use super::extract::{ApiJson, ApiPath, ApiQuery};
use super::AppState;

#[derive(Debug, Serialize)]
pub struct EventResponse {
    pub message: &'static str,
    pub alert: Alert,
}

/// `POST /api/event` — gunshot event from a sensor.
pub async fn ingest_event(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<SensorEventPayload>,
) -> AppResult<(StatusCode, Json<EventResponse>)> {
    let alert = state.alerts().ingest(payload).await?;
    Ok((
        StatusCode::CREATED,
        Json(EventResponse {
            message: "Event processed successfully",
            alert,
        }),
    ))
}

#[derive(Debug, Deserialize)]
pub struct ListAlertsQuery {
    pub limit: Option<i64>,
}

/// `GET /api/alerts` — recent alerts, newest first.
pub async fn list_alerts(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<ListAlertsQuery>,
) -> AppResult<Json<Vec<Alert>>> {
    let alerts = state.alerts().list_recent(query.limit).await?;
    Ok(Json(alerts))
}

/// `GET /api/alerts/stats` — time-bucketed counts.
pub async fn alert_stats(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<StatsQuery>,
) -> AppResult<Json<Vec<StatsBucket>>> {
    let params = StatsParams::from_query(query)?;
    let buckets = stats::compute_stats(state.pool(), params).await?;
    Ok(Json(buckets))
}

/// `GET /api/alerts/:id` — one alert with its ranger summary resolved.
pub async fn get_alert(
    State(state): State<AppState>,
    ApiPath(alert_id): ApiPath<Uuid>,
) -> AppResult<Json<AlertDetail>> {
    let detail = state.alerts().get_detail(alert_id).await?;
    Ok(Json(detail))
}

#[derive(Debug, Deserialize)]
pub struct ConfirmRequest {
    pub confirmed: Option<bool>,
}

/// `PATCH /api/alerts/:id` — toggle the operator confirmation flag.
pub async fn set_confirmed(
    State(state): State<AppState>,
    ApiPath(alert_id): ApiPath<Uuid>,
    ApiJson(body): ApiJson<ConfirmRequest>,
) -> AppResult<Json<Alert>> {
    let confirmed = body
        .confirmed
        .ok_or_else(|| AppError::Validation("confirmed is required".into()))?;
    let alert = state.alerts().set_confirmed(alert_id, confirmed).await?;
    Ok(Json(alert))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelatedQuery {
    pub distance_meters: Option<f64>,
    pub time_window_minutes: Option<i64>,
}

/// `GET /api/alerts/:id/related` — spatially/temporally close alerts.
pub async fn related_alerts(
    State(state): State<AppState>,
    ApiPath(alert_id): ApiPath<Uuid>,
    ApiQuery(query): ApiQuery<RelatedQuery>,
) -> AppResult<Json<Vec<Alert>>> {
    let related = state
        .alerts()
        .find_related(alert_id, query.distance_meters, query.time_window_minutes)
        .await?;
    Ok(Json(related))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignRequest {
    pub ranger_id: Option<String>,
    pub notes: Option<String>,
}

/// `PATCH /api/alerts/:id/assign` — assign a ranger, forcing `assigned`.
pub async fn assign_ranger(
    State(state): State<AppState>,
    ApiPath(alert_id): ApiPath<Uuid>,
    ApiJson(body): ApiJson<AssignRequest>,
) -> AppResult<Json<AlertDetail>> {
    let ranger_id = body
        .ranger_id
        .ok_or_else(|| AppError::Validation("rangerId is required".into()))?;
    let ranger_id = Uuid::parse_str(&ranger_id)
        .map_err(|_| AppError::Validation(format!("Invalid rangerId: {}", ranger_id)))?;
    let detail = state
        .alerts()
        .assign_ranger(alert_id, ranger_id, body.notes)
        .await?;
    Ok(Json(detail))
}

#[derive(Debug, Deserialize)]
pub struct NotesRequest {
    pub notes: Option<String>,
}

/// `PATCH /api/alerts/:id/notes` — overwrite operator notes.
pub async fn update_notes(
    State(state): State<AppState>,
    ApiPath(alert_id): ApiPath<Uuid>,
    ApiJson(body): ApiJson<NotesRequest>,
) -> AppResult<Json<Alert>> {
    let notes = body
        .notes
        .ok_or_else(|| AppError::Validation("notes is required".into()))?;
    let alert = state.alerts().update_notes(alert_id, notes).await?;
    Ok(Json(alert))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusRequest {
    pub status: Option<String>,
    pub resolution_notes: Option<String>,
}

/// `PATCH /api/alerts/:id/status` — lifecycle status transition.
pub async fn update_status(
    State(state): State<AppState>,
    ApiPath(alert_id): ApiPath<Uuid>,
    ApiJson(body): ApiJson<StatusRequest>,
) -> AppResult<Json<Alert>> {
    let status = body
        .status
        .ok_or_else(|| AppError::Validation("status is required".into()))?;
    let alert = state
        .alerts()
        .update_status(alert_id, &status, body.resolution_notes)
        .await?;
    Ok(Json(alert))
}

/// `GET /api/rangers` — active rangers.
pub async fn list_rangers(State(state): State<AppState>) -> AppResult<Json<Vec<Ranger>>> {
    let rows: Vec<RangerRow> = sqlx::query_as(queries::SELECT_ACTIVE_RANGERS)
        .fetch_all(state.pool())
        .await?;
    Ok(Json(rows.into_iter().map(Ranger::from).collect()))
}

#[derive(Debug, Deserialize)]
pub struct LocationRequest {
    pub coordinates: Option<Vec<f64>>,
}

/// `PATCH /api/rangers/:id/location` — live field position update.
pub async fn update_ranger_location(
    State(state): State<AppState>,
    ApiPath(ranger_id): ApiPath<Uuid>,
    ApiJson(body): ApiJson<LocationRequest>,
) -> AppResult<Json<Ranger>> {
    let coordinates = body
        .coordinates
        .ok_or_else(|| AppError::Validation("coordinates are required".into()))?;
    if coordinates.len() != 2 || coordinates.iter().any(|c| !c.is_finite()) {
        return Err(AppError::Validation(
            "coordinates must be a finite [longitude, latitude] pair".into(),
        ));
    }

    let row: RangerRow = sqlx::query_as(queries::UPDATE_RANGER_LOCATION)
        .bind(ranger_id)
        .bind(coordinates[0])
        .bind(coordinates[1])
        .fetch_optional(state.pool())
        .await?
        .ok_or(AppError::NotFound("Ranger"))?;
    Ok(Json(Ranger::from(row)))
}

/// `GET /api/sensors` — all provisioned sensors.
pub async fn list_sensors(State(state): State<AppState>) -> AppResult<Json<Vec<Sensor>>> {
    let rows: Vec<SensorRow> = sqlx::query_as(queries::SELECT_SENSORS)
        .fetch_all(state.pool())
        .await?;
    Ok(Json(rows.into_iter().map(Sensor::from).collect()))
}

#[derive(Debug, Serialize)]
pub struct SmsResponse {
    pub status: &'static str,
    pub data: SmsResponseData,
}

#[derive(Debug, Serialize)]
pub struct SmsResponseData {
    pub result: Value,
    pub message: String,
}

/// `POST /api/send-sms` — single-recipient dispatch.
pub async fn send_sms(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<SmsRequest>,
) -> AppResult<Json<SmsResponse>> {
    let result = state.sms().send_single(request).await?;
    Ok(Json(SmsResponse {
        status: "success",
        data: SmsResponseData {
            result,
            message: "SMS sent successfully".to_string(),
        },
    }))
}

/// `POST /api/send-bulk-sms` — whole batch validated before any send.
pub async fn send_bulk_sms(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<BulkSmsRequest>,
) -> AppResult<Json<SmsResponse>> {
    let recipients = request.phone_numbers.as_ref().map_or(0, |n| n.len());
    let result = state.sms().send_bulk(request).await?;
    Ok(Json(SmsResponse {
        status: "success",
        data: SmsResponseData {
            result,
            message: format!("SMS sent to {} recipients successfully", recipients),
        },
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn assign_request_uses_camel_case() {
        let body: AssignRequest =
            serde_json::from_str(r#"{"rangerId": "a", "notes": "north ridge"}"#).unwrap();
        assert_eq!(body.ranger_id.as_deref(), Some("a"));
        assert_eq!(body.notes.as_deref(), Some("north ridge"));
    }

    #[test]
    fn status_request_resolution_notes_optional() {
        let body: StatusRequest = serde_json::from_str(r#"{"status": "resolved"}"#).unwrap();
        assert_eq!(body.status.as_deref(), Some("resolved"));
        assert!(body.resolution_notes.is_none());
    }

    #[test]
    fn related_query_parameters_optional() {
        let query: RelatedQuery = serde_json::from_str(r#"{}"#).unwrap();
        assert!(query.distance_meters.is_none());
        assert!(query.time_window_minutes.is_none());

        let query: RelatedQuery =
            serde_json::from_str(r#"{"distanceMeters": 100.0, "timeWindowMinutes": 10}"#).unwrap();
        assert_eq!(query.distance_meters, Some(100.0));
        assert_eq!(query.time_window_minutes, Some(10));
    }
}
