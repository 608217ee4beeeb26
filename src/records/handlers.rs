use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use tracing::instrument;
use uuid::Uuid;

use super::dto::{CreateRecordRequest, DateRange, UpdateRecordRequest};
use super::repo_types::Record;
use super::services;
use crate::{
    error::{created, ok, reject, ApiError, ApiResult, Envelope},
    state::AppState,
};

pub fn record_routes() -> Router<AppState> {
    Router::new()
        .route("/records", get(list_records).post(create_record))
        .route("/records/date/:date", get(get_record_by_date))
        .route(
            "/records/:id",
            get(get_record).put(update_record).delete(delete_record),
        )
}

#[instrument(skip(state))]
pub async fn list_records(
    State(state): State<AppState>,
    Query(range): Query<DateRange>,
) -> ApiResult<Vec<Record>> {
    let records = services::list_records(state.store.as_ref(), range)
        .await
        .map_err(reject)?;
    ok(records)
}

#[instrument(skip(state))]
pub async fn get_record(State(state): State<AppState>, Path(id): Path<Uuid>) -> ApiResult<Record> {
    let record = services::get_record(state.store.as_ref(), id)
        .await
        .map_err(reject)?;
    ok(record)
}

#[instrument(skip(state))]
pub async fn get_record_by_date(
    State(state): State<AppState>,
    Path(date): Path<String>,
) -> ApiResult<Record> {
    let record = services::get_record_by_date(state.store.as_ref(), &date)
        .await
        .map_err(reject)?;
    ok(record)
}

#[instrument(skip(state, body))]
pub async fn create_record(
    State(state): State<AppState>,
    Json(body): Json<CreateRecordRequest>,
) -> Result<(StatusCode, Json<Envelope<Record>>), ApiError> {
    let mut session = state.session.lock().await;
    let record = services::create_record(state.store.as_ref(), &mut session, body)
        .await
        .map_err(reject)?;
    created(record)
}

#[instrument(skip(state, body))]
pub async fn update_record(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(body): Json<UpdateRecordRequest>,
) -> ApiResult<Record> {
    let mut session = state.session.lock().await;
    let record = services::update_record(state.store.as_ref(), &mut session, id, body)
        .await
        .map_err(reject)?;
    ok(record)
}

#[instrument(skip(state))]
pub async fn delete_record(State(state): State<AppState>, Path(id): Path<Uuid>) -> ApiResult<Uuid> {
    let mut session = state.session.lock().await;
    services::delete_record(state.store.as_ref(), &mut session, id)
        .await
        .map_err(reject)?;
    ok(id)
}
