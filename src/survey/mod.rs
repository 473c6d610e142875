pub mod handlers;
pub mod questions;
pub mod repo;
pub mod services;

use crate::state::AppState;
use axum::Router;

pub fn router() -> Router<AppState> {
    handlers::survey_routes()
}
