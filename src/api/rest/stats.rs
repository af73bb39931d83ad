use std::sync::Arc;

use axum::Json;
use axum::Router;
use axum::extract::State;
use axum::routing::get;
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::api::rest::{ApiResponse, endpoint_not_found};
use crate::error::AppError;
use crate::models::inspection::{Inspection, InspectionStatus};
use crate::models::notification::Notification;
use crate::state::AppState;
use crate::store::{InspectionFilter, NotificationFilter, PageRequest};

const RECENT_LIMIT: i64 = 5;

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/stats", get(stats).fallback(endpoint_not_found))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    pub notifications: NotificationSummary,
    pub inspections: InspectionSummary,
    pub last_updated: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct NotificationSummary {
    pub total: u64,
    pub unread: u64,
    pub recent: Vec<Notification>,
}

#[derive(Debug, Serialize)]
pub struct InspectionSummary {
    pub total: u64,
    pub pending: u64,
    pub urgent: u64,
    pub recent: Vec<Inspection>,
}

async fn stats(State(state): State<Arc<AppState>>) -> Result<Json<ApiResponse<Summary>>, AppError> {
    let store = &state.store;
    let all_notifications = NotificationFilter::default();
    let unread = NotificationFilter::unread();
    let all_inspections = InspectionFilter::default();
    let pending = InspectionFilter::with_status(InspectionStatus::Pending);
    let urgent = InspectionFilter::urgent();
    let recent = PageRequest::first(RECENT_LIMIT);

    let (
        notification_total,
        unread_total,
        inspection_total,
        pending_total,
        urgent_total,
        recent_notifications,
        recent_inspections,
    ) = tokio::try_join!(
        store.count_notifications(&all_notifications),
        store.count_notifications(&unread),
        store.count_inspections(&all_inspections),
        store.count_inspections(&pending),
        store.count_inspections(&urgent),
        store.find_notifications(&all_notifications, recent),
        store.find_inspections(&all_inspections, recent),
    )?;

    Ok(Json(ApiResponse::new(Summary {
        notifications: NotificationSummary {
            total: notification_total,
            unread: unread_total,
            recent: recent_notifications,
        },
        inspections: InspectionSummary {
            total: inspection_total,
            pending: pending_total,
            urgent: urgent_total,
            recent: recent_inspections,
        },
        last_updated: Utc::now(),
    })))
}
