// ============================
// crates/backend-lib/src/handlers/users.rs
// ============================
//! Profile endpoints. Every route here needs a valid token.
use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use exoplanet_common::{ListQuery, UserId, UserResponse, UserUpdate};

use crate::auth::CurrentUser;
use crate::error::AppError;
use crate::storage::UserStore;
use crate::users::ensure_owner;
use crate::AppState;

pub async fn me(CurrentUser(user): CurrentUser) -> Json<UserResponse> {
    Json(user.into())
}

pub async fn list<S: UserStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    CurrentUser(_): CurrentUser,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<UserResponse>>, AppError> {
    let users = state.users().list(query.skip, query.limit).await?;
    Ok(Json(users.into_iter().map(UserResponse::from).collect()))
}

pub async fn get_user<S: UserStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    CurrentUser(current): CurrentUser,
    Path(id): Path<UserId>,
) -> Result<Json<UserResponse>, AppError> {
    ensure_owner(&current, id, "user")?;
    let user = state.users().get(id).await?;
    Ok(Json(user.into()))
}

pub async fn update_user<S: UserStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    CurrentUser(current): CurrentUser,
    Path(id): Path<UserId>,
    Json(update): Json<UserUpdate>,
) -> Result<Json<UserResponse>, AppError> {
    ensure_owner(&current, id, "user")?;
    let user = state.users().update(id, update).await?;
    Ok(Json(user.into()))
}

pub async fn delete_user<S: UserStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    CurrentUser(current): CurrentUser,
    Path(id): Path<UserId>,
) -> Result<StatusCode, AppError> {
    ensure_owner(&current, id, "user")?;
    state.users().delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
