use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Form, Json, Router,
};
use tracing::{info, instrument, warn};

use crate::{
    auth::{
        dto::{LoginRequest, RegisterRequest, TokenForm, TokenResponse},
        extractors::CurrentUser,
        services::{
            authenticate, create_account, is_valid_email, normalize_email, token_for,
            MIN_PASSWORD_LEN,
        },
    },
    error::ApiError,
    state::AppState,
    users::dto::UserResponse,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/token", post(token))
}

pub fn me_routes() -> Router<AppState> {
    Router::new().route("/users/me", get(get_me))
}

#[instrument(skip(state, payload), fields(email = %payload.email))]
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<TokenResponse>), ApiError> {
    let email = normalize_email(&payload.email);
    if !is_valid_email(&email) {
        warn!("invalid email");
        return Err(ApiError::BadRequest("Invalid email".into()));
    }
    if payload.password.len() < MIN_PASSWORD_LEN {
        warn!("password too short");
        return Err(ApiError::BadRequest("Password too short".into()));
    }
    if payload.name.trim().is_empty() {
        return Err(ApiError::BadRequest("Name is required".into()));
    }

    let user = create_account(state.users.as_ref(), payload)
        .await
        .map_err(|e| {
            warn!(error = %e, "registration refused");
            ApiError::from(e)
        })?;

    info!(user_id = %user.id, "user registered");
    let body = token_for(&state.keys, state.clock.as_ref(), user)?;
    Ok((StatusCode::CREATED, Json(body)))
}

#[instrument(skip(state, payload), fields(email = %payload.email))]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<TokenResponse>, ApiError> {
    login_with(&state, &payload.email, &payload.password).await.map(Json)
}

/// Same as [`login`] but takes the OAuth2 password-grant form.
#[instrument(skip(state, form), fields(email = %form.username))]
pub async fn token(
    State(state): State<AppState>,
    Form(form): Form<TokenForm>,
) -> Result<Json<TokenResponse>, ApiError> {
    login_with(&state, &form.username, &form.password).await.map(Json)
}

async fn login_with(
    state: &AppState,
    email: &str,
    password: &str,
) -> Result<TokenResponse, ApiError> {
    let user = authenticate(state.users.as_ref(), email, password)
        .await
        .map_err(|e| {
            warn!(error = %e, "login refused");
            ApiError::from(e)
        })?;

    info!(user_id = %user.id, "user logged in");
    Ok(token_for(&state.keys, state.clock.as_ref(), user)?)
}

#[instrument(skip_all)]
pub async fn get_me(CurrentUser(user): CurrentUser) -> Json<UserResponse> {
    Json(user.into())
}
