//! Vacancies and their required skill sets.

use std::collections::BTreeSet;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::access::{resolve_viewer, Viewer, ViewerQuery};
use crate::catalog::skills::ensure_skills_exist;
use crate::errors::AppError;
use crate::models::skill::SkillRow;
use crate::models::vacancy::VacancyRow;
use crate::state::AppState;
use crate::validation::validate_text;

const VACANCY_TITLE_MAX: usize = 64;

#[derive(Debug, Deserialize)]
pub struct CreateVacancyRequest {
    pub user_id: Uuid,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub skills: Vec<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateVacancyRequest {
    pub user_id: Uuid,
    pub title: Option<String>,
    pub description: Option<String>,
    /// Replaces the required skill set when present.
    pub skills: Option<Vec<Uuid>>,
}

#[derive(Debug, Serialize)]
pub struct VacancyDetail {
    #[serde(flatten)]
    pub vacancy: VacancyRow,
    pub skills: Vec<SkillRow>,
}

async fn fetch_vacancy(pool: &PgPool, id: Uuid) -> Result<VacancyRow, AppError> {
    sqlx::query_as::<_, VacancyRow>("SELECT * FROM vacancies WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Vacancy {id} not found")))
}

async fn load_vacancy_detail(
    pool: &PgPool,
    vacancy: VacancyRow,
) -> Result<VacancyDetail, AppError> {
    let skills = sqlx::query_as::<_, SkillRow>(
        r#"
        SELECT s.* FROM skills s
        JOIN vacancy_skills vs ON vs.skill_id = s.id
        WHERE vs.vacancy_id = $1
        ORDER BY s.title, s.id
        "#,
    )
    .bind(vacancy.id)
    .fetch_all(pool)
    .await?;
    Ok(VacancyDetail { vacancy, skills })
}

/// Replaces the vacancy's required skills with `skill_ids`.
async fn replace_required_skills(
    tx: &mut Transaction<'_, Postgres>,
    vacancy_id: Uuid,
    skill_ids: &[Uuid],
) -> Result<(), AppError> {
    let unique: BTreeSet<Uuid> = skill_ids.iter().copied().collect();
    ensure_skills_exist(tx, &unique).await?;

    sqlx::query("DELETE FROM vacancy_skills WHERE vacancy_id = $1")
        .bind(vacancy_id)
        .execute(&mut **tx)
        .await?;

    let ids: Vec<Uuid> = unique.into_iter().collect();
    sqlx::query(
        "INSERT INTO vacancy_skills (vacancy_id, skill_id) SELECT $1, UNNEST($2::uuid[])",
    )
    .bind(vacancy_id)
    .bind(ids.as_slice())
    .execute(&mut **tx)
    .await?;
    Ok(())
}

fn ensure_can_manage(viewer: &Viewer, vacancy: &VacancyRow) -> Result<(), AppError> {
    let own_company = viewer
        .hr
        .as_ref()
        .is_some_and(|hr| hr.company_id == vacancy.company_id);
    if viewer.user.is_staff || own_company {
        Ok(())
    } else {
        Err(AppError::Forbidden(
            "Only the company's HR managers can change this vacancy".to_string(),
        ))
    }
}

/// GET /api/v1/vacancies?user_id=
///
/// HR managers see their own company's vacancies; everyone else sees all.
pub async fn handle_list_vacancies(
    State(state): State<AppState>,
    Query(params): Query<ViewerQuery>,
) -> Result<Json<Vec<VacancyDetail>>, AppError> {
    let viewer = resolve_viewer(&state.db, params.user_id).await?;

    let vacancies = sqlx::query_as::<_, VacancyRow>(
        r#"
        SELECT * FROM vacancies
        WHERE ($1::uuid IS NULL OR company_id = $1)
        ORDER BY created_at, id
        "#,
    )
    .bind(viewer.vacancy_company_scope().filter_id())
    .fetch_all(&state.db)
    .await?;

    let mut details = Vec::with_capacity(vacancies.len());
    for vacancy in vacancies {
        details.push(load_vacancy_detail(&state.db, vacancy).await?);
    }
    Ok(Json(details))
}

/// GET /api/v1/vacancies/:id
pub async fn handle_get_vacancy(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<VacancyDetail>, AppError> {
    let vacancy = fetch_vacancy(&state.db, id).await?;
    Ok(Json(load_vacancy_detail(&state.db, vacancy).await?))
}

/// POST /api/v1/vacancies
///
/// The vacancy is created for the calling HR manager's company.
pub async fn handle_create_vacancy(
    State(state): State<AppState>,
    Json(req): Json<CreateVacancyRequest>,
) -> Result<(StatusCode, Json<VacancyDetail>), AppError> {
    let viewer = resolve_viewer(&state.db, req.user_id).await?;
    let company_id = viewer
        .hr
        .as_ref()
        .map(|hr| hr.company_id)
        .ok_or_else(|| AppError::Forbidden("You are not attached to a company".to_string()))?;

    let title = validate_text("title", &req.title, VACANCY_TITLE_MAX)?;

    let mut tx = state.db.begin().await?;
    let vacancy = sqlx::query_as::<_, VacancyRow>(
        r#"
        INSERT INTO vacancies (id, company_id, title, description)
        VALUES ($1, $2, $3, $4)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(company_id)
    .bind(title)
    .bind(req.description.trim())
    .fetch_one(&mut *tx)
    .await?;
    replace_required_skills(&mut tx, vacancy.id, &req.skills).await?;
    tx.commit().await?;

    let detail = load_vacancy_detail(&state.db, vacancy).await?;
    Ok((StatusCode::CREATED, Json(detail)))
}

/// PATCH /api/v1/vacancies/:id
pub async fn handle_update_vacancy(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateVacancyRequest>,
) -> Result<Json<VacancyDetail>, AppError> {
    let viewer = resolve_viewer(&state.db, req.user_id).await?;
    let existing = fetch_vacancy(&state.db, id).await?;
    ensure_can_manage(&viewer, &existing)?;

    let title = req
        .title
        .as_deref()
        .map(|t| validate_text("title", t, VACANCY_TITLE_MAX))
        .transpose()?;

    let mut tx = state.db.begin().await?;
    let vacancy = sqlx::query_as::<_, VacancyRow>(
        r#"
        UPDATE vacancies
        SET title = COALESCE($2, title), description = COALESCE($3, description)
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(title)
    .bind(req.description.as_deref().map(str::trim))
    .fetch_one(&mut *tx)
    .await?;
    if let Some(skills) = &req.skills {
        replace_required_skills(&mut tx, id, skills).await?;
    }
    tx.commit().await?;

    Ok(Json(load_vacancy_detail(&state.db, vacancy).await?))
}

/// DELETE /api/v1/vacancies/:id?user_id=
pub async fn handle_delete_vacancy(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(params): Query<ViewerQuery>,
) -> Result<StatusCode, AppError> {
    let viewer = resolve_viewer(&state.db, params.user_id).await?;
    let existing = fetch_vacancy(&state.db, id).await?;
    ensure_can_manage(&viewer, &existing)?;

    sqlx::query("DELETE FROM vacancies WHERE id = $1")
        .bind(id)
        .execute(&state.db)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
