use std::sync::Arc;

use axum::Json;
use axum::Router;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, patch, post};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::api::rest::pagination::{Page, Pagination};
use crate::api::rest::{ApiResponse, endpoint_not_found, parse_filter};
use crate::error::AppError;
use crate::models::RecordId;
use crate::models::notification::{Notification, NotificationPayload};
use crate::models::validation::trimmed;
use crate::state::AppState;
use crate::store::NotificationFilter;

const LEGACY_LIST_LIMIT: u64 = 50;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/notifications",
            post(create_notification).get(list_notifications).fallback(endpoint_not_found),
        )
        .route(
            "/notifications/simple",
            post(create_notification_legacy).fallback(endpoint_not_found),
        )
        .route(
            "/notifications/list",
            get(list_notifications_legacy).fallback(endpoint_not_found),
        )
        .route("/notifications/:id", get(get_notification).fallback(endpoint_not_found))
        .route(
            "/notifications/:id/read",
            patch(mark_notification_read).fallback(endpoint_not_found),
        )
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationQuery {
    pub driver: Option<String>,
    pub warehouse: Option<String>,
    pub status: Option<String>,
    pub priority: Option<String>,
    pub unread_only: Option<String>,
    pub page: Option<String>,
    pub limit: Option<String>,
}

impl NotificationQuery {
    fn filter(&self) -> Result<NotificationFilter, AppError> {
        Ok(NotificationFilter {
            driver: trimmed(self.driver.clone()),
            warehouse: trimmed(self.warehouse.clone()),
            status: parse_filter("status", self.status.as_deref())?,
            priority: parse_filter("priority", self.priority.as_deref())?,
            unread_only: matches!(self.unread_only.as_deref().map(str::trim), Some("true" | "1")),
        })
    }
}

#[derive(Serialize)]
struct NotificationPage {
    success: bool,
    data: Vec<Notification>,
    pagination: Pagination,
}

#[derive(Serialize)]
struct LegacyCreated {
    success: bool,
    message: &'static str,
    notification: Notification,
}

#[derive(Serialize)]
struct LegacyList {
    success: bool,
    notifications: Vec<Notification>,
    count: usize,
}

async fn create(state: &AppState, payload: NotificationPayload) -> Result<Notification, AppError> {
    let new = payload.validate().map_err(AppError::Validation)?;
    let notification = state.store.insert_notification(new).await?;

    state
        .metrics
        .records_created_total
        .with_label_values(&["notification"])
        .inc();
    info!(
        id = %notification.id,
        driver = %notification.driver,
        status = %notification.status,
        "notification created"
    );

    Ok(notification)
}

async fn list(
    state: &AppState,
    filter: &NotificationFilter,
    page: Page,
) -> Result<(Vec<Notification>, Pagination), AppError> {
    let (notifications, total) = tokio::try_join!(
        state.store.find_notifications(filter, page.request()),
        state.store.count_notifications(filter),
    )?;

    Ok((notifications, Pagination::new(page, total)))
}

async fn create_notification(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<NotificationPayload>, JsonRejection>,
) -> Result<(StatusCode, Json<ApiResponse<Notification>>), AppError> {
    let Json(payload) = payload?;
    let notification = create(&state, payload).await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::with_message(
            "Notification created successfully",
            notification,
        )),
    ))
}

async fn create_notification_legacy(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<NotificationPayload>, JsonRejection>,
) -> Result<Json<LegacyCreated>, AppError> {
    let Json(payload) = payload?;
    let notification = create(&state, payload).await?;

    Ok(Json(LegacyCreated {
        success: true,
        message: "Notification sent successfully",
        notification,
    }))
}

async fn list_notifications(
    State(state): State<Arc<AppState>>,
    Query(query): Query<NotificationQuery>,
) -> Result<Json<NotificationPage>, AppError> {
    let filter = query.filter()?;
    let page = Page::from_query(query.page.as_deref(), query.limit.as_deref());
    let (data, pagination) = list(&state, &filter, page).await?;

    Ok(Json(NotificationPage {
        success: true,
        data,
        pagination,
    }))
}

async fn list_notifications_legacy(
    State(state): State<Arc<AppState>>,
) -> Result<Json<LegacyList>, AppError> {
    let newest = Page::first(LEGACY_LIST_LIMIT).request();
    let notifications = state
        .store
        .find_notifications(&NotificationFilter::default(), newest)
        .await?;

    Ok(Json(LegacyList {
        success: true,
        count: notifications.len(),
        notifications,
    }))
}

async fn get_notification(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<Notification>>, AppError> {
    let id: RecordId = id.parse()?;
    let notification = state
        .store
        .get_notification(&id)
        .await?
        .ok_or_else(|| AppError::NotFound("Notification not found".to_string()))?;

    Ok(Json(ApiResponse::new(notification)))
}

async fn mark_notification_read(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<Notification>>, AppError> {
    let id: RecordId = id.parse()?;
    let notification = state
        .store
        .mark_notification_read(&id)
        .await?
        .ok_or_else(|| AppError::NotFound("Notification not found".to_string()))?;

    info!(id = %notification.id, "notification marked read");
    Ok(Json(ApiResponse::with_message(
        "Notification marked as read",
        notification,
    )))
}
