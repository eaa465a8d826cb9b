use std::collections::BTreeSet;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use sqlx::{Postgres, Transaction};
use uuid::Uuid;

use crate::access::{resolve_viewer, ViewerQuery};
use crate::errors::AppError;
use crate::models::skill::SkillRow;
use crate::state::AppState;
use crate::validation::{validate_text, validate_weight};

const SKILL_TITLE_MAX: usize = 32;

#[derive(Debug, Deserialize)]
pub struct CreateSkillRequest {
    pub user_id: Uuid,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub weight: f64,
}

#[derive(Debug, Deserialize)]
pub struct UpdateSkillRequest {
    pub user_id: Uuid,
    pub title: Option<String>,
    pub description: Option<String>,
    pub weight: Option<f64>,
}

/// GET /api/v1/skills
pub async fn handle_list_skills(
    State(state): State<AppState>,
) -> Result<Json<Vec<SkillRow>>, AppError> {
    let skills = sqlx::query_as::<_, SkillRow>("SELECT * FROM skills ORDER BY title, id")
        .fetch_all(&state.db)
        .await?;
    Ok(Json(skills))
}

/// GET /api/v1/skills/:id
pub async fn handle_get_skill(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SkillRow>, AppError> {
    let skill = sqlx::query_as::<_, SkillRow>("SELECT * FROM skills WHERE id = $1")
        .bind(id)
        .fetch_optional(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Skill {id} not found")))?;
    Ok(Json(skill))
}

/// POST /api/v1/skills
///
/// Skill weights drive match scoring, so only staff may set them.
pub async fn handle_create_skill(
    State(state): State<AppState>,
    Json(req): Json<CreateSkillRequest>,
) -> Result<(StatusCode, Json<SkillRow>), AppError> {
    resolve_viewer(&state.db, req.user_id).await?.require_staff()?;

    let title = validate_text("title", &req.title, SKILL_TITLE_MAX)?;
    let weight = validate_weight("weight", req.weight)?;

    let skill = sqlx::query_as::<_, SkillRow>(
        "INSERT INTO skills (id, title, description, weight) VALUES ($1, $2, $3, $4) RETURNING *",
    )
    .bind(Uuid::new_v4())
    .bind(title)
    .bind(req.description.trim())
    .bind(weight)
    .fetch_one(&state.db)
    .await?;

    Ok((StatusCode::CREATED, Json(skill)))
}

/// PATCH /api/v1/skills/:id
pub async fn handle_update_skill(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateSkillRequest>,
) -> Result<Json<SkillRow>, AppError> {
    resolve_viewer(&state.db, req.user_id).await?.require_staff()?;

    let title = req
        .title
        .as_deref()
        .map(|t| validate_text("title", t, SKILL_TITLE_MAX))
        .transpose()?;
    let weight = req
        .weight
        .map(|w| validate_weight("weight", w))
        .transpose()?;

    let skill = sqlx::query_as::<_, SkillRow>(
        r#"
        UPDATE skills
        SET title = COALESCE($2, title),
            description = COALESCE($3, description),
            weight = COALESCE($4, weight)
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(title)
    .bind(req.description.as_deref().map(str::trim))
    .bind(weight)
    .fetch_optional(&state.db)
    .await?
    .ok_or_else(|| AppError::NotFound(format!("Skill {id} not found")))?;

    Ok(Json(skill))
}

/// DELETE /api/v1/skills/:id
pub async fn handle_delete_skill(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(viewer): Query<ViewerQuery>,
) -> Result<StatusCode, AppError> {
    resolve_viewer(&state.db, viewer.user_id).await?.require_staff()?;

    let deleted = sqlx::query("DELETE FROM skills WHERE id = $1")
        .bind(id)
        .execute(&state.db)
        .await?
        .rows_affected();
    if deleted == 0 {
        return Err(AppError::NotFound(format!("Skill {id} not found")));
    }
    Ok(StatusCode::NO_CONTENT)
}

/// Fails with a validation error naming the first unknown skill id.
pub async fn ensure_skills_exist(
    tx: &mut Transaction<'_, Postgres>,
    skill_ids: &BTreeSet<Uuid>,
) -> Result<(), AppError> {
    if skill_ids.is_empty() {
        return Ok(());
    }

    let requested: Vec<Uuid> = skill_ids.iter().copied().collect();
    let known: BTreeSet<Uuid> =
        sqlx::query_scalar::<_, Uuid>("SELECT id FROM skills WHERE id = ANY($1)")
            .bind(requested.as_slice())
            .fetch_all(&mut **tx)
            .await?
            .into_iter()
            .collect();

    match skill_ids.difference(&known).next() {
        Some(missing) => Err(AppError::Validation(format!("Skill {missing} not found"))),
        None => Ok(()),
    }
}
