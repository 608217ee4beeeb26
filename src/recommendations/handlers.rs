use axum::{
    extract::{Path, State},
    routing::{get, post, put},
    Json, Router,
};
use rand::{rngs::StdRng, SeedableRng};
use tracing::instrument;
use uuid::Uuid;

use super::dto::{ConfirmResponse, GenerateRequest, UpdateMealsRequest};
use super::services;
use crate::{
    error::{ok, reject, ApiResult, AppError},
    rotation::{PoolStatus, Recommendation},
    state::AppState,
};

pub fn recommendation_routes() -> Router<AppState> {
    Router::new()
        .route("/recommendations", get(list_pending).post(generate))
        .route("/recommendations/pool", get(pool_status))
        .route(
            "/recommendations/:id",
            put(update_meals).delete(discard),
        )
        .route("/recommendations/:id/confirm", post(confirm))
}

#[instrument(skip(state))]
pub async fn list_pending(State(state): State<AppState>) -> ApiResult<Vec<Recommendation>> {
    let session = state.session.lock().await;
    ok(session.pending().to_vec())
}

#[instrument(skip(state, body))]
pub async fn generate(
    State(state): State<AppState>,
    Json(body): Json<GenerateRequest>,
) -> ApiResult<Vec<Recommendation>> {
    let mut rng = StdRng::from_entropy();
    let mut session = state.session.lock().await;
    let recs = services::generate(
        state.store.as_ref(),
        &mut session,
        &state.config.recommend,
        body,
        &mut rng,
    )
    .await
    .map_err(reject)?;
    ok(recs)
}

#[instrument(skip(state))]
pub async fn pool_status(State(state): State<AppState>) -> ApiResult<PoolStatus> {
    let session = state.session.lock().await;
    let status = session.pool_status().ok_or(AppError::NoActiveScheme).map_err(reject)?;
    ok(status)
}

#[instrument(skip(state, body))]
pub async fn update_meals(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(body): Json<UpdateMealsRequest>,
) -> ApiResult<Recommendation> {
    let mut session = state.session.lock().await;
    let rec = session.update_meals(id, body.meals).map_err(reject)?.clone();
    ok(rec)
}

#[instrument(skip(state))]
pub async fn confirm(State(state): State<AppState>, Path(id): Path<Uuid>) -> ApiResult<ConfirmResponse> {
    let mut session = state.session.lock().await;
    let out = services::confirm(state.store.as_ref(), &mut session, id)
        .await
        .map_err(reject)?;
    ok(out)
}

#[instrument(skip(state))]
pub async fn discard(State(state): State<AppState>, Path(id): Path<Uuid>) -> ApiResult<Uuid> {
    let mut session = state.session.lock().await;
    session.discard(id).map_err(reject)?;
    ok(id)
}
