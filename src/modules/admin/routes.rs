use axum::middleware;
use axum::{
    routing::{delete, get, post, put},
    Router,
};

use crate::app_state::AppState;
use crate::middleware::auth::require_admin_session;

use super::handlers;

/// Back-office API. Everything except login sits behind the session guard.
pub fn admin_routes(state: AppState) -> Router<AppState> {
    let guarded = Router::new()
        .route("/logout", post(handlers::logout))
        .route(
            "/coaches",
            get(handlers::list_coaches).post(handlers::create_coach),
        )
        .route(
            "/coaches/:id",
            put(handlers::update_coach).delete(handlers::delete_coach),
        )
        .route(
            "/coaches/:id/rules",
            get(handlers::list_rules).post(handlers::create_rule),
        )
        .route(
            "/coaches/:id/rules/:rule_id",
            put(handlers::update_rule).delete(handlers::delete_rule),
        )
        .route(
            "/coaches/:id/exceptions",
            get(handlers::list_exceptions).post(handlers::upsert_exception),
        )
        .route(
            "/coaches/:id/exceptions/:date",
            delete(handlers::delete_exception),
        )
        .route(
            "/services",
            get(handlers::list_services).post(handlers::create_service),
        )
        .route(
            "/services/:id",
            put(handlers::update_service).delete(handlers::delete_service),
        )
        .route(
            "/accounts",
            get(handlers::list_accounts).post(handlers::create_account),
        )
        .route("/accounts/:id", delete(handlers::delete_account))
        .route("/gift-cards/:code/redeem", post(handlers::redeem_gift_card))
        .route("/gift-cards/:code/void", post(handlers::void_gift_card))
        .layer(middleware::from_fn_with_state(state, require_admin_session));

    Router::new()
        .route("/login", post(handlers::login))
        .merge(guarded)
}
