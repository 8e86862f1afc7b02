use std::sync::Arc;

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::domain::{IntakeForm, RecordId, RecordStatus};
use super::repository::RecordRepository;
use super::service::{IntakeRecordService, RecordServiceError};
use crate::pagination::PaginationQuery;

/// Single-resource success body.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: T,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

/// Query string accepted by the list endpoint.
#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub status: Option<RecordStatus>,
}

/// Router builder exposing the intake record endpoints.
pub fn record_router<R>(service: Arc<IntakeRecordService<R>>) -> Router
where
    R: RecordRepository + 'static,
{
    Router::new()
        .route(
            "/api/v1/records",
            post(create_handler::<R>).get(list_handler::<R>),
        )
        .route(
            "/api/v1/records/:record_id",
            get(get_handler::<R>)
                .patch(update_handler::<R>)
                .delete(delete_handler::<R>),
        )
        .route(
            "/api/v1/records/:record_id/dysfunctional",
            post(dysfunctional_handler::<R>),
        )
        .route(
            "/api/v1/records/:record_id/interviews",
            post(interview_handler::<R>),
        )
        .route("/api/v1/audit/records", get(audit_handler::<R>))
        .with_state(service)
}

fn invalid_payload(rejection: impl std::fmt::Display) -> RecordServiceError {
    RecordServiceError::InvalidPayload(rejection.to_string())
}

pub(crate) async fn create_handler<R>(
    State(service): State<Arc<IntakeRecordService<R>>>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Response, RecordServiceError>
where
    R: RecordRepository + 'static,
{
    let Json(body) = payload.map_err(invalid_payload)?;
    let form: IntakeForm = serde_json::from_value(body).map_err(invalid_payload)?;
    let record = service.create(form)?;
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(record))).into_response())
}

pub(crate) async fn list_handler<R>(
    State(service): State<Arc<IntakeRecordService<R>>>,
    params: Result<Query<ListParams>, QueryRejection>,
) -> Result<Response, RecordServiceError>
where
    R: RecordRepository + 'static,
{
    let Query(params) = params.map_err(invalid_payload)?;
    let query = PaginationQuery {
        page: params.page,
        limit: params.limit,
    };
    let page = service.list(query, params.status)?;
    Ok(Json(page).into_response())
}

pub(crate) async fn get_handler<R>(
    State(service): State<Arc<IntakeRecordService<R>>>,
    Path(record_id): Path<String>,
) -> Result<Response, RecordServiceError>
where
    R: RecordRepository + 'static,
{
    let record = service.get(&RecordId(record_id))?;
    Ok(Json(ApiResponse::ok(record)).into_response())
}

pub(crate) async fn update_handler<R>(
    State(service): State<Arc<IntakeRecordService<R>>>,
    Path(record_id): Path<String>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Response, RecordServiceError>
where
    R: RecordRepository + 'static,
{
    let Json(patch) = payload.map_err(invalid_payload)?;
    let record = service.update(&RecordId(record_id), patch)?;
    Ok(Json(ApiResponse::ok(record)).into_response())
}

pub(crate) async fn delete_handler<R>(
    State(service): State<Arc<IntakeRecordService<R>>>,
    Path(record_id): Path<String>,
) -> Result<Response, RecordServiceError>
where
    R: RecordRepository + 'static,
{
    service.delete(&RecordId(record_id))?;
    Ok(StatusCode::NO_CONTENT.into_response())
}

pub(crate) async fn dysfunctional_handler<R>(
    State(service): State<Arc<IntakeRecordService<R>>>,
    Path(record_id): Path<String>,
) -> Result<Response, RecordServiceError>
where
    R: RecordRepository + 'static,
{
    let record = service.mark_dysfunctional(&RecordId(record_id))?;
    Ok(Json(ApiResponse::ok(record)).into_response())
}

pub(crate) async fn interview_handler<R>(
    State(service): State<Arc<IntakeRecordService<R>>>,
    Path(record_id): Path<String>,
) -> Result<Response, RecordServiceError>
where
    R: RecordRepository + 'static,
{
    let record = service.link_interview(&RecordId(record_id))?;
    Ok(Json(ApiResponse::ok(record)).into_response())
}

pub(crate) async fn audit_handler<R>(
    State(service): State<Arc<IntakeRecordService<R>>>,
) -> Result<Response, RecordServiceError>
where
    R: RecordRepository + 'static,
{
    let anomalies = service.audit()?;
    Ok(Json(ApiResponse::ok(anomalies)).into_response())
}
