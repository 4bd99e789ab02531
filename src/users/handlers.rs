use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::{
    auth::{
        extractors::CurrentUser,
        services::{is_valid_email, normalize_email},
    },
    error::ApiError,
    state::AppState,
    users::{
        dto::{DeletedResponse, SearchQuery, UserResponse},
        repo_types::UserPatch,
    },
};

pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/users", get(list_users))
        .route("/users/search", get(search_users))
        .route(
            "/users/:id",
            get(get_user).put(update_user).delete(delete_user),
        )
}

#[instrument(skip_all, fields(caller = %caller.id))]
pub async fn list_users(
    State(state): State<AppState>,
    CurrentUser(caller): CurrentUser,
) -> Result<Json<Vec<UserResponse>>, ApiError> {
    let users = state.users.list().await?;
    Ok(Json(users.into_iter().map(UserResponse::from).collect()))
}

#[instrument(skip_all, fields(caller = %caller.id))]
pub async fn search_users(
    State(state): State<AppState>,
    CurrentUser(caller): CurrentUser,
    Query(q): Query<SearchQuery>,
) -> Result<Json<Vec<UserResponse>>, ApiError> {
    let name = q
        .name
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .ok_or_else(|| ApiError::BadRequest("Name is required".into()))?;

    let users = state.users.search_by_name(name).await?;
    Ok(Json(users.into_iter().map(UserResponse::from).collect()))
}

#[instrument(skip_all, fields(caller = %caller.id, user_id = %id))]
pub async fn get_user(
    State(state): State<AppState>,
    CurrentUser(caller): CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<UserResponse>, ApiError> {
    let user = state
        .users
        .find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".into()))?;
    Ok(Json(user.into()))
}

#[instrument(skip_all, fields(caller = %caller.id, user_id = %id))]
pub async fn update_user(
    State(state): State<AppState>,
    CurrentUser(caller): CurrentUser,
    Path(id): Path<Uuid>,
    Json(mut patch): Json<UserPatch>,
) -> Result<Json<UserResponse>, ApiError> {
    if let Some(email) = patch.email.take() {
        let email = normalize_email(&email);
        if !is_valid_email(&email) {
            warn!("invalid email");
            return Err(ApiError::BadRequest("Invalid email".into()));
        }
        patch.email = Some(email);
    }
    if matches!(patch.name.as_deref(), Some(n) if n.trim().is_empty()) {
        return Err(ApiError::BadRequest("Name is required".into()));
    }

    let user = state.users.update(id, patch).await?;
    info!(user_id = %user.id, "user updated");
    Ok(Json(user.into()))
}

#[instrument(skip_all, fields(caller = %caller.id, user_id = %id))]
pub async fn delete_user(
    State(state): State<AppState>,
    CurrentUser(caller): CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<DeletedResponse>, ApiError> {
    let user = state.users.delete(id).await?;
    info!(user_id = %user.id, "user deleted");
    Ok(Json(DeletedResponse {
        message: "User deleted".into(),
        deleted_user: user.into(),
    }))
}
