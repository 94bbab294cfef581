//! Authentication handlers

use axum::{
    extract::{Path, State},
    Json,
};

use shared::models::User;

use crate::error::AppResult;
use crate::services::auth::{AuthService, LoginInput, RegisterInput, UpdateUserInput};
use crate::AppState;

/// Register a dealer account
pub async fn register(
    State(state): State<AppState>,
    Json(body): Json<RegisterInput>,
) -> AppResult<Json<User>> {
    let service = AuthService::new(state.db);
    let user = service.register(body).await?;
    Ok(Json(user))
}

/// Login endpoint handler
pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginInput>,
) -> AppResult<Json<User>> {
    let service = AuthService::new(state.db);
    let user = service.login(body).await?;
    Ok(Json(user))
}

/// Get an account by id
pub async fn get_user(
    State(state): State<AppState>,
    Path(user_id): Path<i32>,
) -> AppResult<Json<User>> {
    let service = AuthService::new(state.db);
    let user = service.get_user(user_id).await?;
    Ok(Json(user))
}

/// Update account profile fields
pub async fn update_user(
    State(state): State<AppState>,
    Path(user_id): Path<i32>,
    Json(body): Json<UpdateUserInput>,
) -> AppResult<Json<User>> {
    let service = AuthService::new(state.db);
    let user = service.update_user(user_id, body).await?;
    Ok(Json(user))
}
