use axum::{
    extract::{FromRef, State},
    http::StatusCode,
    routing::post,
    Json, Router,
};
use tracing::{info, instrument, warn};

use crate::{
    auth::{
        claims::SessionUser,
        dto::{LoginRequest, LoginResponse, RegisterRequest},
        jwt::JwtKeys,
        password::{spawn_hash, spawn_verify, CredentialError},
    },
    error::ApiError,
    extract::ApiJson,
    response::MessageResponse,
    state::AppState,
    users::{
        repo::NewUser,
        validate::{checked_email, checked_name, normalize_email},
    },
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<RegisterRequest>,
) -> Result<(StatusCode, Json<MessageResponse>), ApiError> {
    let name = checked_name(&payload.name)?;
    let email = checked_email(&payload.email)?;

    if payload.password.is_empty() {
        warn!(email = %email, "empty password");
        return Err(ApiError::BadRequest("Password is required"));
    }

    if state.store.find_by_email(&email).await?.is_some() {
        warn!(email = %email, "email already registered");
        return Err(ApiError::EmailTaken);
    }

    let hash = spawn_hash(payload.password).await?;
    let user = state
        .store
        .create(NewUser {
            name,
            email,
            address: payload.address,
            password_hash: Some(hash),
        })
        .await?;

    info!(user_id = user.id, email = %user.email, "user registered");
    Ok((
        StatusCode::CREATED,
        Json(MessageResponse::ok("User registered successfully")),
    ))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let email = normalize_email(&payload.email);

    let Some(user) = state.store.find_by_email(&email).await? else {
        warn!(email = %email, "login unknown email");
        return Err(ApiError::UserNotFound);
    };

    let ok = match spawn_verify(payload.password, user.password_hash.clone()).await {
        Ok(v) => v,
        Err(CredentialError::NotSet) => {
            warn!(user_id = user.id, "login for user without password");
            return Err(ApiError::PasswordNotSet);
        }
        Err(e) => return Err(e.into()),
    };
    if !ok {
        warn!(user_id = user.id, "login invalid password");
        return Err(ApiError::WrongPassword);
    }

    let keys = JwtKeys::from_ref(&state);
    let token = keys.issue(&SessionUser::from(&user))?;

    info!(user_id = user.id, email = %user.email, "user logged in");
    Ok(Json(LoginResponse {
        success: true,
        message: "Login successful".into(),
        token,
    }))
}
