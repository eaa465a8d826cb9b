//! Candidate profiles, their education/experience, and skill ranks.

use std::collections::BTreeSet;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::access::{resolve_viewer, Scope, Viewer, ViewerQuery};
use crate::catalog::skills::ensure_skills_exist;
use crate::errors::AppError;
use crate::matching::profile::load_candidate_skills;
use crate::models::candidate::{CandidateRow, CandidateSkillRow, EducationRow, ExperienceRow};
use crate::state::AppState;
use crate::validation::{validate_age, validate_rank, validate_text};

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CreateCandidateRequest {
    pub user_id: Uuid,
    pub full_name: String,
    pub age: i32,
    #[serde(default)]
    pub about: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateCandidateRequest {
    pub user_id: Uuid,
    pub full_name: Option<String>,
    pub age: Option<i32>,
    pub about: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SkillRankInput {
    pub skill_id: Uuid,
    pub rank: i64,
}

#[derive(Debug, Deserialize)]
pub struct SetSkillsRequest {
    pub user_id: Uuid,
    pub skills: Vec<SkillRankInput>,
}

#[derive(Debug, Deserialize)]
pub struct CreateEducationRequest {
    pub user_id: Uuid,
    pub title: String,
    pub establishment: String,
    pub avg_mark: f64,
}

#[derive(Debug, Deserialize)]
pub struct CreateExperienceRequest {
    pub user_id: Uuid,
    pub company_id: Uuid,
    pub hire_date: NaiveDate,
    pub dismissal_date: Option<NaiveDate>,
    #[serde(default)]
    pub about: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateEducationRequest {
    pub user_id: Uuid,
    pub title: Option<String>,
    pub establishment: Option<String>,
    pub avg_mark: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateExperienceRequest {
    pub user_id: Uuid,
    pub company_id: Option<Uuid>,
    pub hire_date: Option<NaiveDate>,
    /// `null` leaves the date unchanged; use `still_employed` to clear it.
    pub dismissal_date: Option<NaiveDate>,
    #[serde(default)]
    pub still_employed: bool,
    pub about: Option<String>,
}

impl UpdateExperienceRequest {
    /// The employment dates after applying this update to `current`.
    fn merged_dates(&self, current: &ExperienceRow) -> (NaiveDate, Option<NaiveDate>) {
        let hire_date = self.hire_date.unwrap_or(current.hire_date);
        let dismissal_date = if self.still_employed {
            None
        } else {
            self.dismissal_date.or(current.dismissal_date)
        };
        (hire_date, dismissal_date)
    }
}

#[derive(Debug, Serialize)]
pub struct CandidateDetail {
    #[serde(flatten)]
    pub candidate: CandidateRow,
    pub skills: Vec<CandidateSkillRow>,
    pub education: Vec<EducationRow>,
    pub experience: Vec<ExperienceRow>,
    pub resumes: Vec<Uuid>,
}

// ────────────────────────────────────────────────────────────────────────────
// Queries
// ────────────────────────────────────────────────────────────────────────────

pub async fn fetch_candidate(pool: &PgPool, id: Uuid) -> Result<CandidateRow, AppError> {
    sqlx::query_as::<_, CandidateRow>("SELECT * FROM candidates WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Candidate {id} not found")))
}

pub async fn load_candidate_detail(
    pool: &PgPool,
    candidate: CandidateRow,
) -> Result<CandidateDetail, AppError> {
    let skills = load_candidate_skills(pool, candidate.id).await?;

    let education = sqlx::query_as::<_, EducationRow>(
        "SELECT * FROM educations WHERE candidate_id = $1 ORDER BY title, id",
    )
    .bind(candidate.id)
    .fetch_all(pool)
    .await?;

    let experience = sqlx::query_as::<_, ExperienceRow>(
        r#"
        SELECT e.id, e.candidate_id, e.company_id, c.name AS company_name,
               e.hire_date, e.dismissal_date, e.about
        FROM experiences e
        JOIN companies c ON c.id = e.company_id
        WHERE e.candidate_id = $1
        ORDER BY e.hire_date DESC, e.id
        "#,
    )
    .bind(candidate.id)
    .fetch_all(pool)
    .await?;

    let resumes: Vec<Uuid> = sqlx::query_scalar(
        "SELECT id FROM resumes WHERE candidate_id = $1 ORDER BY created_at, id",
    )
    .bind(candidate.id)
    .fetch_all(pool)
    .await?;

    Ok(CandidateDetail {
        candidate,
        skills,
        education,
        experience,
        resumes,
    })
}

/// Upserts ranks for the candidate; a later entry for the same skill wins.
/// All ranks and skill ids are validated before anything is written.
pub async fn upsert_skill_ranks(
    tx: &mut Transaction<'_, Postgres>,
    candidate_id: Uuid,
    skills: &[SkillRankInput],
) -> Result<(), AppError> {
    let ranks = skills
        .iter()
        .map(|s| validate_rank(s.rank).map(|rank| (s.skill_id, rank)))
        .collect::<Result<Vec<_>, _>>()?;

    let skill_ids: BTreeSet<Uuid> = ranks.iter().map(|(id, _)| *id).collect();
    ensure_skills_exist(tx, &skill_ids).await?;

    for (skill_id, rank) in ranks {
        sqlx::query(
            r#"
            INSERT INTO candidate_skills (candidate_id, skill_id, rank)
            VALUES ($1, $2, $3)
            ON CONFLICT (candidate_id, skill_id) DO UPDATE SET rank = EXCLUDED.rank
            "#,
        )
        .bind(candidate_id)
        .bind(skill_id)
        .bind(rank)
        .execute(&mut **tx)
        .await?;
    }
    Ok(())
}

async fn fetch_experience(
    pool: &PgPool,
    candidate_id: Uuid,
    id: Uuid,
) -> Result<ExperienceRow, AppError> {
    sqlx::query_as::<_, ExperienceRow>(
        r#"
        SELECT e.id, e.candidate_id, e.company_id, c.name AS company_name,
               e.hire_date, e.dismissal_date, e.about
        FROM experiences e
        JOIN companies c ON c.id = e.company_id
        WHERE e.id = $1 AND e.candidate_id = $2
        "#,
    )
    .bind(id)
    .bind(candidate_id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| AppError::NotFound(format!("Experience {id} not found")))
}

fn check_employment_dates(
    hire_date: NaiveDate,
    dismissal_date: Option<NaiveDate>,
) -> Result<(), AppError> {
    if dismissal_date.is_some_and(|d| d < hire_date) {
        Err(AppError::Validation("dismissal_date cannot be before hire_date".to_string()))
    } else {
        Ok(())
    }
}

fn check_avg_mark(avg_mark: f64) -> Result<f64, AppError> {
    if avg_mark.is_finite() && avg_mark >= 0.0 {
        Ok(avg_mark)
    } else {
        Err(AppError::Validation("avg_mark must be a non-negative number".to_string()))
    }
}

fn ensure_can_edit(viewer: &Viewer, candidate_id: Uuid) -> Result<(), AppError> {
    if viewer.can_edit_candidate(candidate_id) {
        Ok(())
    } else {
        Err(AppError::Forbidden(
            "Candidates can only edit their own profile".to_string(),
        ))
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// GET /api/v1/candidates?user_id=
///
/// Staff see every candidate; a candidate sees only themselves.
pub async fn handle_list_candidates(
    State(state): State<AppState>,
    Query(params): Query<ViewerQuery>,
) -> Result<Json<Vec<CandidateRow>>, AppError> {
    let viewer = resolve_viewer(&state.db, params.user_id).await?;
    let scope = viewer.candidate_scope();
    if scope == Scope::Nothing {
        return Ok(Json(vec![]));
    }

    let candidates = sqlx::query_as::<_, CandidateRow>(
        r#"
        SELECT * FROM candidates
        WHERE ($1::uuid IS NULL OR id = $1)
        ORDER BY created_at, id
        "#,
    )
    .bind(scope.filter_id())
    .fetch_all(&state.db)
    .await?;

    Ok(Json(candidates))
}

/// GET /api/v1/candidates/:id?user_id=
///
/// Same visibility as the list: candidates outside the viewer's scope are
/// reported missing.
pub async fn handle_get_candidate(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(params): Query<ViewerQuery>,
) -> Result<Json<CandidateDetail>, AppError> {
    let viewer = resolve_viewer(&state.db, params.user_id).await?;
    if !viewer.candidate_scope().permits(id) {
        return Err(AppError::NotFound(format!("Candidate {id} not found")));
    }

    let candidate = fetch_candidate(&state.db, id).await?;
    Ok(Json(load_candidate_detail(&state.db, candidate).await?))
}

/// POST /api/v1/candidates
///
/// One candidate profile per user.
pub async fn handle_create_candidate(
    State(state): State<AppState>,
    Json(req): Json<CreateCandidateRequest>,
) -> Result<(StatusCode, Json<CandidateRow>), AppError> {
    let viewer = resolve_viewer(&state.db, req.user_id).await?;
    if viewer.candidate_id.is_some() {
        return Err(AppError::Conflict(
            "This user already has a candidate profile".to_string(),
        ));
    }
    if viewer.hr.is_some() {
        return Err(AppError::Conflict(
            "HR managers cannot register as candidates".to_string(),
        ));
    }

    let full_name = validate_text("full_name", &req.full_name, 256)?;
    let age = validate_age(req.age)?;

    let candidate = sqlx::query_as::<_, CandidateRow>(
        r#"
        INSERT INTO candidates (id, user_id, full_name, age, about)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(req.user_id)
    .bind(full_name)
    .bind(age)
    .bind(req.about.trim())
    .fetch_one(&state.db)
    .await?;

    Ok((StatusCode::CREATED, Json(candidate)))
}

/// PATCH /api/v1/candidates/:id
pub async fn handle_update_candidate(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateCandidateRequest>,
) -> Result<Json<CandidateRow>, AppError> {
    let viewer = resolve_viewer(&state.db, req.user_id).await?;
    ensure_can_edit(&viewer, id)?;

    let full_name = req
        .full_name
        .as_deref()
        .map(|n| validate_text("full_name", n, 256))
        .transpose()?;
    let age = req.age.map(validate_age).transpose()?;

    let candidate = sqlx::query_as::<_, CandidateRow>(
        r#"
        UPDATE candidates
        SET full_name = COALESCE($2, full_name),
            age = COALESCE($3, age),
            about = COALESCE($4, about)
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(full_name)
    .bind(age)
    .bind(req.about.as_deref().map(str::trim))
    .fetch_optional(&state.db)
    .await?
    .ok_or_else(|| AppError::NotFound(format!("Candidate {id} not found")))?;

    Ok(Json(candidate))
}

/// PUT /api/v1/candidates/:id/skills
///
/// Upserts skill ranks; skills not mentioned keep their current rank.
pub async fn handle_set_skills(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<SetSkillsRequest>,
) -> Result<Json<Vec<CandidateSkillRow>>, AppError> {
    let viewer = resolve_viewer(&state.db, req.user_id).await?;
    ensure_can_edit(&viewer, id)?;
    fetch_candidate(&state.db, id).await?;

    let mut tx = state.db.begin().await?;
    upsert_skill_ranks(&mut tx, id, &req.skills).await?;
    tx.commit().await?;

    Ok(Json(load_candidate_skills(&state.db, id).await?))
}

/// POST /api/v1/candidates/:id/educations
pub async fn handle_add_education(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<CreateEducationRequest>,
) -> Result<(StatusCode, Json<EducationRow>), AppError> {
    let viewer = resolve_viewer(&state.db, req.user_id).await?;
    ensure_can_edit(&viewer, id)?;

    let title = validate_text("title", &req.title, 128)?;
    let establishment = validate_text("establishment", &req.establishment, 128)?;
    let avg_mark = check_avg_mark(req.avg_mark)?;

    let education = sqlx::query_as::<_, EducationRow>(
        r#"
        INSERT INTO educations (id, candidate_id, title, establishment, avg_mark)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(id)
    .bind(title)
    .bind(establishment)
    .bind(avg_mark)
    .fetch_one(&state.db)
    .await?;

    Ok((StatusCode::CREATED, Json(education)))
}

/// POST /api/v1/candidates/:id/experiences
pub async fn handle_add_experience(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<CreateExperienceRequest>,
) -> Result<(StatusCode, Json<ExperienceRow>), AppError> {
    let viewer = resolve_viewer(&state.db, req.user_id).await?;
    ensure_can_edit(&viewer, id)?;

    check_employment_dates(req.hire_date, req.dismissal_date)?;

    let experience = sqlx::query_as::<_, ExperienceRow>(
        r#"
        WITH inserted AS (
            INSERT INTO experiences (id, candidate_id, company_id, hire_date, dismissal_date, about)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
        )
        SELECT i.id, i.candidate_id, i.company_id, c.name AS company_name,
               i.hire_date, i.dismissal_date, i.about
        FROM inserted i
        JOIN companies c ON c.id = i.company_id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(id)
    .bind(req.company_id)
    .bind(req.hire_date)
    .bind(req.dismissal_date)
    .bind(req.about.trim())
    .fetch_one(&state.db)
    .await?;

    Ok((StatusCode::CREATED, Json(experience)))
}

/// DELETE /api/v1/candidates/:id/skills/:skill_id?user_id=
pub async fn handle_remove_skill(
    State(state): State<AppState>,
    Path((id, skill_id)): Path<(Uuid, Uuid)>,
    Query(params): Query<ViewerQuery>,
) -> Result<StatusCode, AppError> {
    let viewer = resolve_viewer(&state.db, params.user_id).await?;
    ensure_can_edit(&viewer, id)?;

    let deleted = sqlx::query(
        "DELETE FROM candidate_skills WHERE candidate_id = $1 AND skill_id = $2",
    )
    .bind(id)
    .bind(skill_id)
    .execute(&state.db)
    .await?
    .rows_affected();
    if deleted == 0 {
        return Err(AppError::NotFound(format!(
            "Candidate {id} has no rank for skill {skill_id}"
        )));
    }
    Ok(StatusCode::NO_CONTENT)
}

/// PATCH /api/v1/candidates/:id/educations/:education_id
pub async fn handle_update_education(
    State(state): State<AppState>,
    Path((id, education_id)): Path<(Uuid, Uuid)>,
    Json(req): Json<UpdateEducationRequest>,
) -> Result<Json<EducationRow>, AppError> {
    let viewer = resolve_viewer(&state.db, req.user_id).await?;
    ensure_can_edit(&viewer, id)?;

    let title = req
        .title
        .as_deref()
        .map(|t| validate_text("title", t, 128))
        .transpose()?;
    let establishment = req
        .establishment
        .as_deref()
        .map(|e| validate_text("establishment", e, 128))
        .transpose()?;
    let avg_mark = req.avg_mark.map(check_avg_mark).transpose()?;

    let education = sqlx::query_as::<_, EducationRow>(
        r#"
        UPDATE educations
        SET title = COALESCE($3, title),
            establishment = COALESCE($4, establishment),
            avg_mark = COALESCE($5, avg_mark)
        WHERE id = $1 AND candidate_id = $2
        RETURNING *
        "#,
    )
    .bind(education_id)
    .bind(id)
    .bind(title)
    .bind(establishment)
    .bind(avg_mark)
    .fetch_optional(&state.db)
    .await?
    .ok_or_else(|| AppError::NotFound(format!("Education {education_id} not found")))?;

    Ok(Json(education))
}

/// DELETE /api/v1/candidates/:id/educations/:education_id?user_id=
pub async fn handle_delete_education(
    State(state): State<AppState>,
    Path((id, education_id)): Path<(Uuid, Uuid)>,
    Query(params): Query<ViewerQuery>,
) -> Result<StatusCode, AppError> {
    let viewer = resolve_viewer(&state.db, params.user_id).await?;
    ensure_can_edit(&viewer, id)?;

    let deleted = sqlx::query("DELETE FROM educations WHERE id = $1 AND candidate_id = $2")
        .bind(education_id)
        .bind(id)
        .execute(&state.db)
        .await?
        .rows_affected();
    if deleted == 0 {
        return Err(AppError::NotFound(format!("Education {education_id} not found")));
    }
    Ok(StatusCode::NO_CONTENT)
}

/// PATCH /api/v1/candidates/:id/experiences/:experience_id
///
/// Dates are validated against the stored values they are merged with.
pub async fn handle_update_experience(
    State(state): State<AppState>,
    Path((id, experience_id)): Path<(Uuid, Uuid)>,
    Json(req): Json<UpdateExperienceRequest>,
) -> Result<Json<ExperienceRow>, AppError> {
    let viewer = resolve_viewer(&state.db, req.user_id).await?;
    ensure_can_edit(&viewer, id)?;

    let current = fetch_experience(&state.db, id, experience_id).await?;
    let (hire_date, dismissal_date) = req.merged_dates(&current);
    check_employment_dates(hire_date, dismissal_date)?;

    let experience = sqlx::query_as::<_, ExperienceRow>(
        r#"
        WITH updated AS (
            UPDATE experiences
            SET company_id = COALESCE($3, company_id),
                hire_date = $4,
                dismissal_date = $5,
                about = COALESCE($6, about)
            WHERE id = $1 AND candidate_id = $2
            RETURNING *
        )
        SELECT u.id, u.candidate_id, u.company_id, c.name AS company_name,
               u.hire_date, u.dismissal_date, u.about
        FROM updated u
        JOIN companies c ON c.id = u.company_id
        "#,
    )
    .bind(experience_id)
    .bind(id)
    .bind(req.company_id)
    .bind(hire_date)
    .bind(dismissal_date)
    .bind(req.about.as_deref().map(str::trim))
    .fetch_optional(&state.db)
    .await?
    .ok_or_else(|| AppError::NotFound(format!("Experience {experience_id} not found")))?;

    Ok(Json(experience))
}

/// DELETE /api/v1/candidates/:id/experiences/:experience_id?user_id=
pub async fn handle_delete_experience(
    State(state): State<AppState>,
    Path((id, experience_id)): Path<(Uuid, Uuid)>,
    Query(params): Query<ViewerQuery>,
) -> Result<StatusCode, AppError> {
    let viewer = resolve_viewer(&state.db, params.user_id).await?;
    ensure_can_edit(&viewer, id)?;

    let deleted = sqlx::query("DELETE FROM experiences WHERE id = $1 AND candidate_id = $2")
        .bind(experience_id)
        .bind(id)
        .execute(&state.db)
        .await?
        .rows_affected();
    if deleted == 0 {
        return Err(AppError::NotFound(format!("Experience {experience_id} not found")));
    }
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn experience(hire: NaiveDate, dismissal: Option<NaiveDate>) -> ExperienceRow {
        ExperienceRow {
            id: Uuid::new_v4(),
            candidate_id: Uuid::new_v4(),
            company_id: Uuid::new_v4(),
            company_name: "Acme".to_string(),
            hire_date: hire,
            dismissal_date: dismissal,
            about: String::new(),
        }
    }

    fn update(body: serde_json::Value) -> UpdateExperienceRequest {
        let mut body = body;
        body["user_id"] = serde_json::json!(Uuid::nil());
        serde_json::from_value(body).unwrap()
    }

    #[test]
    fn test_dismissal_before_hire_rejected() {
        assert!(check_employment_dates(date(2020, 5, 1), Some(date(2020, 4, 30))).is_err());
        assert!(check_employment_dates(date(2020, 5, 1), Some(date(2020, 5, 1))).is_ok());
        assert!(check_employment_dates(date(2020, 5, 1), None).is_ok());
    }

    #[test]
    fn test_partial_update_keeps_stored_dates() {
        let current = experience(date(2019, 1, 1), Some(date(2021, 1, 1)));
        let req = update(serde_json::json!({ "about": "Backend" }));
        assert_eq!(
            req.merged_dates(&current),
            (date(2019, 1, 1), Some(date(2021, 1, 1)))
        );
    }

    #[test]
    fn test_moving_hire_date_past_stored_dismissal_is_caught() {
        let current = experience(date(2019, 1, 1), Some(date(2021, 1, 1)));
        let req = update(serde_json::json!({ "hire_date": "2022-03-01" }));
        let (hire, dismissal) = req.merged_dates(&current);
        assert!(check_employment_dates(hire, dismissal).is_err());
    }

    #[test]
    fn test_still_employed_clears_dismissal() {
        let current = experience(date(2019, 1, 1), Some(date(2021, 1, 1)));
        let req = update(serde_json::json!({ "still_employed": true }));
        assert_eq!(req.merged_dates(&current), (date(2019, 1, 1), None));
    }

    #[test]
    fn test_avg_mark_must_be_non_negative() {
        assert_eq!(check_avg_mark(4.5).unwrap(), 4.5);
        assert!(check_avg_mark(-0.1).is_err());
        assert!(check_avg_mark(f64::NAN).is_err());
    }
}
