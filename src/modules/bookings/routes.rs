use axum::{routing::post, Router};

use crate::app_state::AppState;

use super::handlers::create_booking;

pub fn booking_routes() -> Router<AppState> {
    Router::new().route("/bookings", post(create_booking))
}
