use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::instrument;
use uuid::Uuid;

use super::dto::{CreateSchemeRequest, UpdateSchemeRequest};
use super::repo_types::Scheme;
use super::services;
use crate::{
    error::{created, ok, reject, ApiError, ApiResult, Envelope},
    rotation::PoolState,
    state::AppState,
};

pub fn scheme_routes() -> Router<AppState> {
    Router::new()
        .route("/schemes", get(list_schemes).post(create_scheme))
        .route(
            "/schemes/:id",
            get(get_scheme).put(update_scheme).delete(delete_scheme),
        )
        .route("/schemes/:id/activate", post(activate_scheme))
        .route("/schemes/:id/reset", post(reset_pools))
}

#[instrument(skip(state))]
pub async fn list_schemes(State(state): State<AppState>) -> ApiResult<Vec<Scheme>> {
    let schemes = state.store.list_schemes().await.map_err(reject)?;
    ok(schemes)
}

#[instrument(skip(state))]
pub async fn get_scheme(State(state): State<AppState>, Path(id): Path<Uuid>) -> ApiResult<Scheme> {
    let scheme = services::get_scheme(state.store.as_ref(), id)
        .await
        .map_err(reject)?;
    ok(scheme)
}

#[instrument(skip(state, body))]
pub async fn create_scheme(
    State(state): State<AppState>,
    Json(body): Json<CreateSchemeRequest>,
) -> Result<(StatusCode, Json<Envelope<Scheme>>), ApiError> {
    let scheme = services::create_scheme(state.store.as_ref(), body)
        .await
        .map_err(reject)?;
    created(scheme)
}

#[instrument(skip(state, body))]
pub async fn update_scheme(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(body): Json<UpdateSchemeRequest>,
) -> ApiResult<Scheme> {
    let mut session = state.session.lock().await;
    let scheme = services::update_scheme(state.store.as_ref(), &mut session, id, body)
        .await
        .map_err(reject)?;
    ok(scheme)
}

#[instrument(skip(state))]
pub async fn delete_scheme(State(state): State<AppState>, Path(id): Path<Uuid>) -> ApiResult<Uuid> {
    let mut session = state.session.lock().await;
    services::delete_scheme(state.store.as_ref(), &mut session, id)
        .await
        .map_err(reject)?;
    ok(id)
}

#[instrument(skip(state))]
pub async fn activate_scheme(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<PoolState> {
    let mut session = state.session.lock().await;
    let pool_state = services::activate_scheme(state.store.as_ref(), &mut session, id)
        .await
        .map_err(reject)?;
    ok(pool_state)
}

#[instrument(skip(state))]
pub async fn reset_pools(State(state): State<AppState>, Path(id): Path<Uuid>) -> ApiResult<Scheme> {
    let mut session = state.session.lock().await;
    let scheme = services::reset_pools(state.store.as_ref(), &mut session, id)
        .await
        .map_err(reject)?;
    ok(scheme)
}
