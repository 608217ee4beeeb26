mod dto;
pub mod handlers;
mod repo;
mod repo_types;
pub mod services;

use crate::state::AppState;
use axum::Router;

pub use repo_types::{NewRecord, Record, RecordPatch};

pub fn router() -> Router<AppState> {
    Router::new().merge(handlers::record_routes())
}
