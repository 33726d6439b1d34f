use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, patch},
    Json, Router,
};
use tracing::{debug, info, instrument};

use crate::{
    auth::extractors::AuthUser,
    error::ApiError,
    extract::{ApiJson, ApiPath},
    response::MessageResponse,
    state::AppState,
    users::{
        dto::{CreateUserRequest, PublicUser, UpdateUserRequest, UserResponse, UsersResponse},
        repo::{NewUser, UserChanges},
        validate::{checked_email, checked_name},
    },
};

pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/users", get(list_users).post(create_user))
        .route("/users/:id", patch(update_user).delete(delete_user))
        .route("/me", get(get_me))
}

#[instrument(skip(state, payload))]
pub async fn create_user(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<CreateUserRequest>,
) -> Result<(StatusCode, Json<MessageResponse>), ApiError> {
    let user = state
        .store
        .create(NewUser {
            name: checked_name(&payload.name)?,
            email: checked_email(&payload.email)?,
            address: payload.address,
            password_hash: None,
        })
        .await?;

    info!(user_id = user.id, email = %user.email, "user created");
    Ok((
        StatusCode::CREATED,
        Json(MessageResponse::ok("User has been created")),
    ))
}

#[instrument(skip(state, caller))]
pub async fn list_users(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
) -> Result<Json<UsersResponse>, ApiError> {
    debug!(caller_id = caller.user.id, "listing users");
    let users = state.store.list().await?;
    Ok(Json(UsersResponse {
        success: true,
        message: "User fetched successfully".into(),
        data: users.into_iter().map(PublicUser::from).collect(),
    }))
}

#[instrument(skip(state, payload))]
pub async fn update_user(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(payload): ApiJson<UpdateUserRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    let changes = UserChanges {
        name: payload.name.as_deref().map(checked_name).transpose()?,
        email: payload.email.as_deref().map(checked_email).transpose()?,
        address: payload.address,
    };
    let user = state.store.update(id, changes).await?;

    info!(user_id = user.id, "user updated");
    Ok(Json(MessageResponse::ok("User updated successfully")))
}

#[instrument(skip(state))]
pub async fn delete_user(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<MessageResponse>, ApiError> {
    state.store.delete(id).await?;

    info!(user_id = id, "user deleted");
    Ok(Json(MessageResponse::ok("User has been deleted")))
}

/// Returns the caller's current record; the token may carry stale fields.
#[instrument(skip(state, caller))]
pub async fn get_me(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
) -> Result<Json<UserResponse>, ApiError> {
    let user = state
        .store
        .find_by_id(caller.user.id)
        .await?
        .ok_or(ApiError::UserNotFound)?;

    Ok(Json(UserResponse {
        success: true,
        message: "User fetched successfully".into(),
        data: user.into(),
    }))
}
