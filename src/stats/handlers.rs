use axum::{
    extract::{Query, State},
    routing::get,
    Router,
};
use tracing::instrument;

use super::dto::StatsQuery;
use super::services::{self, Statistics};
use crate::{
    error::{ok, reject, ApiResult},
    state::AppState,
};

pub fn stats_routes() -> Router<AppState> {
    Router::new().route("/stats", get(get_statistics))
}

#[instrument(skip(state))]
pub async fn get_statistics(
    State(state): State<AppState>,
    Query(q): Query<StatsQuery>,
) -> ApiResult<Statistics> {
    let stats = services::load_statistics(state.store.as_ref(), q)
        .await
        .map_err(reject)?;
    ok(stats)
}
