// ============================
// crates/backend-lib/src/router.rs
// ============================
//! HTTP router.
use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::handlers::{self, auth, users};
use crate::storage::UserStore;
use crate::AppState;

/// Create the application router, with the API mounted under `api.prefix`
pub fn create_router<S: UserStore + Clone + 'static>(state: Arc<AppState<S>>) -> Router {
    let api: Router<Arc<AppState<S>>> = Router::new()
        .route("/auth/register", post(auth::register::<S>))
        .route("/auth/login", post(auth::login::<S>))
        .route("/users/me", get(users::me))
        .route("/users", get(users::list::<S>))
        .route(
            "/users/{id}",
            get(users::get_user::<S>)
                .put(users::update_user::<S>)
                .delete(users::delete_user::<S>),
        );

    Router::new()
        .route("/", get(handlers::root::<S>))
        .route("/health", get(handlers::health))
        .nest(&state.settings.api.prefix, api)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
