use std::sync::Arc;

use axum::Json;
use axum::Router;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, patch, post};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::api::rest::pagination::{Page, Pagination};
use crate::api::rest::{ApiResponse, endpoint_not_found, parse_filter};
use crate::error::AppError;
use crate::models::RecordId;
use crate::models::inspection::{Inspection, InspectionPayload, StatusUpdatePayload, UrgencyLevel};
use crate::models::validation::trimmed;
use crate::state::AppState;
use crate::store::InspectionFilter;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/inspections",
            post(create_inspection).get(list_inspections).fallback(endpoint_not_found),
        )
        .route("/inspections/:id", get(get_inspection).fallback(endpoint_not_found))
        .route(
            "/inspections/:id/status",
            patch(update_inspection_status).fallback(endpoint_not_found),
        )
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InspectionQuery {
    pub driver: Option<String>,
    pub tractor_number: Option<String>,
    pub status: Option<String>,
    pub urgency_level: Option<String>,
    pub page: Option<String>,
    pub limit: Option<String>,
}

impl InspectionQuery {
    fn filter(&self) -> Result<InspectionFilter, AppError> {
        let urgency: Option<UrgencyLevel> =
            parse_filter("urgencyLevel", self.urgency_level.as_deref())?;

        Ok(InspectionFilter {
            driver: trimmed(self.driver.clone()),
            tractor_number: trimmed(self.tractor_number.clone()),
            status: parse_filter("status", self.status.as_deref())?,
            urgency_levels: urgency.into_iter().collect(),
        })
    }
}

/// Older clients read `inspection`/`inspections`, newer ones read `data`.
#[derive(Serialize)]
struct InspectionCreated {
    success: bool,
    message: &'static str,
    data: Inspection,
    inspection: Inspection,
}

#[derive(Serialize)]
struct InspectionPage {
    success: bool,
    data: Vec<Inspection>,
    inspections: Vec<Inspection>,
    pagination: Pagination,
}

async fn create_inspection(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<InspectionPayload>, JsonRejection>,
) -> Result<(StatusCode, Json<InspectionCreated>), AppError> {
    let Json(payload) = payload?;
    let new = payload.validate().map_err(AppError::Validation)?;
    let inspection = state.store.insert_inspection(new).await?;

    state
        .metrics
        .records_created_total
        .with_label_values(&["inspection"])
        .inc();
    info!(
        id = %inspection.id,
        driver = %inspection.driver,
        tractor = %inspection.tractor_number,
        urgency = %inspection.urgency_level,
        "inspection submitted"
    );

    Ok((
        StatusCode::CREATED,
        Json(InspectionCreated {
            success: true,
            message: "Inspection submitted successfully",
            data: inspection.clone(),
            inspection,
        }),
    ))
}

async fn list_inspections(
    State(state): State<Arc<AppState>>,
    Query(query): Query<InspectionQuery>,
) -> Result<Json<InspectionPage>, AppError> {
    let filter = query.filter()?;
    let page = Page::from_query(query.page.as_deref(), query.limit.as_deref());

    let (inspections, total) = tokio::try_join!(
        state.store.find_inspections(&filter, page.request()),
        state.store.count_inspections(&filter),
    )?;

    Ok(Json(InspectionPage {
        success: true,
        data: inspections.clone(),
        inspections,
        pagination: Pagination::new(page, total),
    }))
}

async fn get_inspection(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<Inspection>>, AppError> {
    let id: RecordId = id.parse()?;
    let inspection = state
        .store
        .get_inspection(&id)
        .await?
        .ok_or_else(|| AppError::NotFound("Inspection not found".to_string()))?;

    Ok(Json(ApiResponse::new(inspection)))
}

async fn update_inspection_status(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    payload: Result<Json<StatusUpdatePayload>, JsonRejection>,
) -> Result<Json<ApiResponse<Inspection>>, AppError> {
    let id: RecordId = id.parse()?;
    let Json(payload) = payload?;
    let status = payload.validate().map_err(|errors| {
        warn!(id = %id, "rejected inspection status update");
        AppError::Validation(errors)
    })?;

    let inspection = state
        .store
        .update_inspection_status(&id, status)
        .await?
        .ok_or_else(|| AppError::NotFound("Inspection not found".to_string()))?;

    info!(id = %inspection.id, status = %inspection.status, "inspection status updated");
    Ok(Json(ApiResponse::with_message(
        "Inspection status updated",
        inspection,
    )))
}
