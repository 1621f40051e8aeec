// ============================
// crates/backend-lib/src/handlers/mod.rs
// ============================
//! HTTP handlers.
pub mod auth;
pub mod users;

use std::sync::Arc;

use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::auth::MaybeUser;
use crate::storage::UserStore;
use crate::AppState;

/// Service banner. Guests are welcome; a bad token is not.
pub async fn root<S: UserStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    MaybeUser(user): MaybeUser,
) -> Json<Value> {
    Json(json!({
        "message": state.settings.api.project_name,
        "status": "active",
        "user": user.map(|u| u.email),
    }))
}

pub async fn health() -> Json<Value> {
    Json(json!({ "status": "healthy" }))
}
