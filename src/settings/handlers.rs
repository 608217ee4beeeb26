use axum::{extract::State, routing::get, Json, Router};
use tracing::instrument;

use super::dto::UpdateSettingsRequest;
use super::repo_types::Settings;
use super::services;
use crate::{
    error::{ok, reject, ApiResult},
    state::AppState,
};

pub fn settings_routes() -> Router<AppState> {
    Router::new().route("/settings", get(get_settings).put(update_settings))
}

#[instrument(skip(state))]
pub async fn get_settings(State(state): State<AppState>) -> ApiResult<Settings> {
    let settings = state.store.get_settings().await.map_err(reject)?;
    ok(settings)
}

#[instrument(skip(state, body))]
pub async fn update_settings(
    State(state): State<AppState>,
    Json(body): Json<UpdateSettingsRequest>,
) -> ApiResult<Settings> {
    let mut session = state.session.lock().await;
    let settings = services::update_settings(
        state.store.as_ref(),
        &mut session,
        &state.config.recommend,
        body,
    )
    .await
    .map_err(reject)?;
    ok(settings)
}
