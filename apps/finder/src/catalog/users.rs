use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::user::User;
use crate::state::AppState;
use crate::validation::validate_email;

#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub email: String,
    #[serde(default)]
    pub is_staff: bool,
}

/// POST /api/v1/users
pub async fn handle_create_user(
    State(state): State<AppState>,
    Json(req): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<User>), AppError> {
    let email = validate_email(&req.email)?.to_lowercase();

    let user = sqlx::query_as::<_, User>(
        "INSERT INTO users (id, email, is_staff) VALUES ($1, $2, $3) RETURNING *",
    )
    .bind(Uuid::new_v4())
    .bind(&email)
    .bind(req.is_staff)
    .fetch_one(&state.db)
    .await
    .map_err(|e| match e {
        e if crate::db::is_unique_violation(&e) => {
            AppError::Conflict(format!("User {email} already exists"))
        }
        e => AppError::Database(e),
    })?;

    Ok((StatusCode::CREATED, Json(user)))
}

/// GET /api/v1/users/:id
pub async fn handle_get_user(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<User>, AppError> {
    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
        .bind(id)
        .fetch_optional(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {id} not found")))?;
    Ok(Json(user))
}
