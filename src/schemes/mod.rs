mod dto;
pub mod handlers;
mod repo;
mod repo_types;
pub mod services;

use crate::state::AppState;
use axum::Router;

pub use repo_types::{NewScheme, Scheme, SchemePatch};

pub fn router() -> Router<AppState> {
    Router::new().merge(handlers::scheme_routes())
}
