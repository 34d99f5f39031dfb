use std::sync::Arc;

use axum::routing::{get, patch, post};
use axum::Router;

use crate::alerts::lifecycle::AlertService;
use crate::db::DbPool;
use crate::realtime::{self, Broadcaster};
use crate::sms::{SmsGateway, SmsService};
use crate::triangulation::Estimator;

pub mod extract;
pub mod handlers;

/// Shared state handed to every handler. Cloning is cheap; the inner state is
/// behind one Arc.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    pool: DbPool,
    broadcaster: Broadcaster,
    alerts: AlertService,
    sms: SmsService,
}

impl AppState {
    pub fn new(
        pool: DbPool,
        broadcaster: Broadcaster,
        estimator: Arc<dyn Estimator>,
        gateway: Arc<dyn SmsGateway>,
    ) -> Self {
        let alerts = AlertService::new(pool.clone(), estimator, broadcaster.clone());
        let sms = SmsService::new(gateway, broadcaster.clone());
        Self {
            inner: Arc::new(AppStateInner {
                pool,
                broadcaster,
                alerts,
                sms,
            }),
        }
    }

    pub fn pool(&self) -> &DbPool {
        &self.inner.pool
    }

    pub fn broadcaster(&self) -> &Broadcaster {
        &self.inner.broadcaster
    }

    pub fn alerts(&self) -> &AlertService {
        &self.inner.alerts
    }

    pub fn sms(&self) -> &SmsService {
        &self.inner.sms
    }
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/api/event", post(handlers::ingest_event))
        .route("/api/alerts", get(handlers::list_alerts))
        .route("/api/alerts/stats", get(handlers::alert_stats))
        .route(
            "/api/alerts/:id",
            get(handlers::get_alert).patch(handlers::set_confirmed),
        )
        .route("/api/alerts/:id/related", get(handlers::related_alerts))
        .route("/api/alerts/:id/assign", patch(handlers::assign_ranger))
        .route("/api/alerts/:id/notes", patch(handlers::update_notes))
        .route("/api/alerts/:id/status", patch(handlers::update_status))
        .route("/api/rangers", get(handlers::list_rangers))
        .route(
            "/api/rangers/:id/location",
            patch(handlers::update_ranger_location),
        )
        .route("/api/sensors", get(handlers::list_sensors))
        .route("/api/send-sms", post(handlers::send_sms))
        .route("/api/send-bulk-sms", post(handlers::send_bulk_sms))
        .route("/ws", get(realtime::ws_handler))
        .with_state(state)
}
