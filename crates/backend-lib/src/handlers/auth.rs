// ============================
// crates/backend-lib/src/handlers/auth.rs
// ============================
//! Registration and login endpoints.
use std::sync::Arc;

use axum::{extract::State, http::StatusCode, Form, Json};
use exoplanet_common::{LoginForm, TokenResponse, UserCreate, UserResponse};

use crate::error::AppError;
use crate::storage::UserStore;
use crate::AppState;

pub async fn register<S: UserStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Json(request): Json<UserCreate>,
) -> Result<(StatusCode, Json<UserResponse>), AppError> {
    let user = state.users().register(request).await?;
    Ok((StatusCode::CREATED, Json(user.into())))
}

/// OAuth2 password-style login; `username` carries the email
pub async fn login<S: UserStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Form(form): Form<LoginForm>,
) -> Result<Json<TokenResponse>, AppError> {
    let token = state.users().login(&form.username, form.password).await?;
    Ok(Json(token))
}
