pub mod bookings;
pub mod extract;
pub mod health;

use std::sync::Arc;

use axum::http::HeaderValue;
use axum::routing::get;
use axum::Router;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::state::AppState;

pub fn router(state: Arc<AppState>) -> Router {
    let origins: Vec<HeaderValue> = state
        .config
        .cors_origins
        .iter()
        .filter_map(|o| o.parse().ok())
        .collect();

    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health::health))
        .route(
            "/bookings",
            get(bookings::list_bookings).post(bookings::create_booking),
        )
        .route(
            "/bookings/",
            get(bookings::list_bookings).post(bookings::create_booking),
        )
        .route("/bookings/slots", get(bookings::occupied_slots))
        .route(
            "/bookings/:id",
            get(bookings::get_booking)
                .put(bookings::update_booking)
                .patch(bookings::update_booking)
                .delete(bookings::delete_booking),
        )
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
