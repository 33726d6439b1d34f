use crate::state::AppState;
use axum::Router;

mod dto;
pub mod handlers;
pub mod memory;
pub mod pg;
pub mod repo;
pub mod repo_types;
pub mod validate;

pub fn router() -> Router<AppState> {
    handlers::user_routes()
}
