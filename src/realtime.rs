use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::Response;
use chrono::{DateTime, Utc};
use futures::{SinkExt, StreamExt};
use serde::Serialize;
use serde_json::Value;
use tokio::sync::broadcast;
use tracing::{debug, warn};

use crate::api::AppState;
use crate::models::alert::Alert;

/// Events fanned out to connected dashboard viewers. Wire framing is
/// `{"event": "...", "data": {...}}`; event names are part of the dashboard
/// protocol and must stay stable.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", content = "data")]
pub enum WsEvent {
    #[serde(rename = "new-alert")]
    NewAlert(Alert),
    #[serde(rename = "alert-updated")]
    AlertUpdated(Alert),
    #[serde(rename = "sms_sent")]
    SmsSent(SmsNotice),
    #[serde(rename = "sms_error")]
    SmsError(SmsErrorNotice),
    #[serde(rename = "bulk_sms_sent")]
    BulkSmsSent(BulkSmsNotice),
    #[serde(rename = "bulk_sms_error")]
    BulkSmsError(BulkSmsErrorNotice),
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SmsNotice {
    pub phone_number: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alert_details: Option<Value>,
    pub timestamp: DateTime<Utc>,
    pub result: Value,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SmsErrorNotice {
    pub phone_number: String,
    pub error: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkSmsNotice {
    pub phone_numbers: Vec<String>,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alert_details: Option<Value>,
    pub timestamp: DateTime<Utc>,
    pub result: Value,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkSmsErrorNotice {
    pub phone_numbers: Vec<String>,
    pub error: String,
    pub timestamp: DateTime<Utc>,
}

/// Best-effort fan-out to every connected viewer. No acks, no replay: a
/// viewer that connects after an event was published never sees it.
#[derive(Clone)]
pub struct Broadcaster {
    tx: broadcast::Sender<WsEvent>,
}

impl Broadcaster {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Fire-and-forget publish. A send error only means no viewer is
    /// connected, which is not a failure.
    pub fn publish(&self, event: WsEvent) {
        let _ = self.tx.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<WsEvent> {
        self.tx.subscribe()
    }

    pub fn viewer_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

/// `GET /ws` — upgrade a dashboard viewer connection.
pub async fn ws_handler(State(state): State<AppState>, ws: WebSocketUpgrade) -> Response {
    let broadcaster = state.broadcaster().clone();
    ws.on_upgrade(move |socket| handle_socket(socket, broadcaster))
}

async fn handle_socket(socket: WebSocket, broadcaster: Broadcaster) {
    let (mut sender, mut receiver) = socket.split();
    let mut rx = broadcaster.subscribe();
    debug!("viewer connected ({} total)", broadcaster.viewer_count());

    loop {
        tokio::select! {
            result = rx.recv() => match result {
                Ok(event) => {
                    let json = match serde_json::to_string(&event) {
                        Ok(json) => json,
                        Err(e) => {
                            warn!("failed to serialize broadcast event: {}", e);
                            continue;
                        }
                    };
                    if sender.send(Message::Text(json)).await.is_err() {
                        break;
                    }
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    warn!("viewer lagged, {} events dropped", n);
                }
                Err(broadcast::error::RecvError::Closed) => break,
            },
            msg = receiver.next() => match msg {
                Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                // Viewers only listen; ignore anything they send.
                Some(Ok(_)) => {}
            },
        }
    }

    debug!("viewer disconnected");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::alert::{Alert, AlertSource, AlertStatus, GeoPoint};
    use uuid::Uuid;

    fn sample_alert() -> Alert {
        Alert {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            location: GeoPoint::new(36.8219, -1.2921),
            source: AlertSource::SingleSensor,
            confirmed: false,
            status: AlertStatus::New,
            confidence: 0.0,
            assigned_ranger: None,
            notes: None,
            resolution_notes: None,
            resolved_at: None,
            sensor_readings: vec![],
            audio_evidence: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn subscribers_receive_published_events() {
        let broadcaster = Broadcaster::new(16);
        let mut rx = broadcaster.subscribe();

        let alert = sample_alert();
        broadcaster.publish(WsEvent::NewAlert(alert.clone()));

        match rx.recv().await.unwrap() {
            WsEvent::NewAlert(received) => assert_eq!(received.id, alert.id),
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[test]
    fn publish_without_viewers_is_not_an_error() {
        let broadcaster = Broadcaster::new(16);
        broadcaster.publish(WsEvent::NewAlert(sample_alert()));
        assert_eq!(broadcaster.viewer_count(), 0);
    }

    #[test]
    fn events_use_named_envelope() {
        let json = serde_json::to_value(WsEvent::NewAlert(sample_alert())).unwrap();
        assert_eq!(json["event"], "new-alert");
        assert_eq!(json["data"]["status"], "new");

        let notice = SmsErrorNotice {
            phone_number: "+254712345678".into(),
            error: "provider down".into(),
            timestamp: Utc::now(),
        };
        let json = serde_json::to_value(WsEvent::SmsError(notice)).unwrap();
        assert_eq!(json["event"], "sms_error");
        assert_eq!(json["data"]["phoneNumber"], "+254712345678");
    }
}
