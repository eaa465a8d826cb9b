//! Resumes. Skill ranks belong to the candidate, so writing a resume's
//! skills upserts the candidate's ranks in the same transaction.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::access::{resolve_viewer, Scope, ViewerQuery};
use crate::catalog::candidates::{upsert_skill_ranks, SkillRankInput};
use crate::errors::AppError;
use crate::matching::profile::load_candidate_skills;
use crate::matching::scoring::resume_maturity_score;
use crate::models::candidate::CandidateSkillRow;
use crate::models::resume::{ResumeRow, DEFAULT_RESUME_NAME};
use crate::state::AppState;
use crate::validation::validate_text;

const RESUME_NAME_MAX: usize = 100;

#[derive(Debug, Deserialize)]
pub struct CreateResumeRequest {
    pub user_id: Uuid,
    pub name: Option<String>,
    pub is_active: Option<bool>,
    #[serde(default)]
    pub skills: Vec<SkillRankInput>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateResumeRequest {
    pub user_id: Uuid,
    pub name: Option<String>,
    pub is_active: Option<bool>,
    pub skills: Option<Vec<SkillRankInput>>,
}

#[derive(Debug, Serialize)]
pub struct ResumeDetail {
    #[serde(flatten)]
    pub resume: ResumeRow,
    pub digital_maturity_score: f64,
    pub skills: Vec<CandidateSkillRow>,
}

pub async fn load_resume_detail(
    pool: &PgPool,
    resume: ResumeRow,
) -> Result<ResumeDetail, AppError> {
    let skills = load_candidate_skills(pool, resume.candidate_id).await?;
    let weights: Vec<f64> = skills.iter().map(|s| s.weight).collect();
    Ok(ResumeDetail {
        digital_maturity_score: resume_maturity_score(&weights),
        resume,
        skills,
    })
}

fn resume_name(raw: Option<&str>) -> Result<String, AppError> {
    match raw {
        Some(name) => validate_text("name", name, RESUME_NAME_MAX),
        None => Ok(DEFAULT_RESUME_NAME.to_string()),
    }
}

/// Loads a resume the viewer is allowed to see; others are reported missing.
async fn fetch_visible_resume(
    pool: &PgPool,
    scope: Scope,
    id: Uuid,
) -> Result<ResumeRow, AppError> {
    let resume = sqlx::query_as::<_, ResumeRow>("SELECT * FROM resumes WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?;

    resume
        .filter(|r| scope.permits(r.candidate_id))
        .ok_or_else(|| AppError::NotFound(format!("Resume {id} not found")))
}

/// GET /api/v1/resumes?user_id=
pub async fn handle_list_resumes(
    State(state): State<AppState>,
    Query(params): Query<ViewerQuery>,
) -> Result<Json<Vec<ResumeDetail>>, AppError> {
    let viewer = resolve_viewer(&state.db, params.user_id).await?;
    let scope = viewer.candidate_scope();
    if scope == Scope::Nothing {
        return Ok(Json(vec![]));
    }

    let resumes = sqlx::query_as::<_, ResumeRow>(
        r#"
        SELECT * FROM resumes
        WHERE ($1::uuid IS NULL OR candidate_id = $1)
        ORDER BY created_at, id
        "#,
    )
    .bind(scope.filter_id())
    .fetch_all(&state.db)
    .await?;

    let mut details = Vec::with_capacity(resumes.len());
    for resume in resumes {
        details.push(load_resume_detail(&state.db, resume).await?);
    }
    Ok(Json(details))
}

/// GET /api/v1/resumes/:id?user_id=
pub async fn handle_get_resume(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(params): Query<ViewerQuery>,
) -> Result<Json<ResumeDetail>, AppError> {
    let viewer = resolve_viewer(&state.db, params.user_id).await?;
    let resume = fetch_visible_resume(&state.db, viewer.candidate_scope(), id).await?;
    Ok(Json(load_resume_detail(&state.db, resume).await?))
}

/// POST /api/v1/resumes
///
/// Only candidates create resumes; the resume belongs to the caller.
pub async fn handle_create_resume(
    State(state): State<AppState>,
    Json(req): Json<CreateResumeRequest>,
) -> Result<(StatusCode, Json<ResumeDetail>), AppError> {
    let viewer = resolve_viewer(&state.db, req.user_id).await?;
    let candidate_id = viewer.require_candidate()?;
    let name = resume_name(req.name.as_deref())?;

    let mut tx = state.db.begin().await?;
    let resume = sqlx::query_as::<_, ResumeRow>(
        r#"
        INSERT INTO resumes (id, candidate_id, name, is_active)
        VALUES ($1, $2, $3, $4)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(candidate_id)
    .bind(name)
    .bind(req.is_active.unwrap_or(true))
    .fetch_one(&mut *tx)
    .await?;
    upsert_skill_ranks(&mut tx, candidate_id, &req.skills).await?;
    tx.commit().await?;

    let detail = load_resume_detail(&state.db, resume).await?;
    Ok((StatusCode::CREATED, Json(detail)))
}

/// PATCH /api/v1/resumes/:id
pub async fn handle_update_resume(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateResumeRequest>,
) -> Result<Json<ResumeDetail>, AppError> {
    let viewer = resolve_viewer(&state.db, req.user_id).await?;
    let existing = fetch_visible_resume(&state.db, viewer.candidate_scope(), id).await?;

    let name = req
        .name
        .as_deref()
        .map(|n| validate_text("name", n, RESUME_NAME_MAX))
        .transpose()?;

    let mut tx = state.db.begin().await?;
    let resume = sqlx::query_as::<_, ResumeRow>(
        r#"
        UPDATE resumes
        SET name = COALESCE($2, name), is_active = COALESCE($3, is_active)
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(name)
    .bind(req.is_active)
    .fetch_one(&mut *tx)
    .await?;
    if let Some(skills) = &req.skills {
        upsert_skill_ranks(&mut tx, existing.candidate_id, skills).await?;
    }
    tx.commit().await?;

    Ok(Json(load_resume_detail(&state.db, resume).await?))
}

/// DELETE /api/v1/resumes/:id?user_id=
pub async fn handle_delete_resume(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(params): Query<ViewerQuery>,
) -> Result<StatusCode, AppError> {
    let viewer = resolve_viewer(&state.db, params.user_id).await?;
    fetch_visible_resume(&state.db, viewer.candidate_scope(), id).await?;

    sqlx::query("DELETE FROM resumes WHERE id = $1")
        .bind(id)
        .execute(&state.db)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resume_name_defaults() {
        assert_eq!(resume_name(None).unwrap(), DEFAULT_RESUME_NAME);
        assert_eq!(resume_name(Some(" Backend ")).unwrap(), "Backend");
        assert!(resume_name(Some("")).is_err());
    }

    #[test]
    fn test_create_request_skills_default_empty() {
        let req: CreateResumeRequest =
            serde_json::from_value(serde_json::json!({ "user_id": Uuid::nil() })).unwrap();
        assert!(req.skills.is_empty());
        assert!(req.is_active.is_none());
    }
}
