pub mod export;
pub mod handlers;
pub mod repo;
pub mod services;
pub mod throttle;

pub use services::AdminGate;

use crate::state::AppState;
use axum::Router;

pub fn router() -> Router<AppState> {
    handlers::admin_routes()
}
