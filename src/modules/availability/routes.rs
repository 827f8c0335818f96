use axum::{routing::get, Router};

use crate::app_state::AppState;

use super::handlers::get_availability;

pub fn availability_routes() -> Router<AppState> {
    Router::new().route("/availability/:coach_id/:date", get(get_availability))
}
