use axum::{Router, middleware};

use crate::state::SharedState;

/// API key middleware.
pub mod api_key;
/// Contest administration routes.
pub mod contests;
/// Swagger UI.
pub mod docs;
/// Health check route.
pub mod health;
/// Join and vote routes.
pub mod participation;

/// Compose all route trees, wiring in shared state and documentation routes.
pub fn router(state: SharedState) -> Router<()> {
    let api_router = contests::router()
        .merge(participation::router())
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            api_key::require_api_key,
        ));

    health::router()
        .nest("/api", api_router)
        .merge(docs::router())
        .with_state(state)
}
