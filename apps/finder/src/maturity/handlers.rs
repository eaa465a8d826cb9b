//! Axum route handlers for the digital-maturity questionnaire.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::access::{resolve_viewer, ViewerQuery};
use crate::catalog::companies::fetch_company;
use crate::errors::AppError;
use crate::maturity::aggregator::MaturityTier;
use crate::maturity::submission::{
    recompute_company_maturity, submit_answers, update_question_weight, AnswerInput,
    MaturityOutcome,
};
use crate::models::maturity::{MaturityAnswerRow, MaturityQuestionRow};
use crate::state::AppState;
use crate::validation::{validate_text, validate_weight};

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CreateQuestionRequest {
    pub user_id: Uuid,
    pub text: String,
    pub weight: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateQuestionRequest {
    pub user_id: Uuid,
    pub text: Option<String>,
    pub weight: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub struct SubmitAnswersRequest {
    pub user_id: Uuid,
    pub answers: Vec<AnswerInput>,
}

#[derive(Debug, Serialize)]
pub struct SubmitAnswersResponse {
    pub detail: String,
    pub company_id: Uuid,
    pub maturity_level: u8,
    pub tier: MaturityTier,
    pub tier_label: &'static str,
}

#[derive(Debug, Serialize)]
pub struct CompanyMaturityResponse {
    pub company_id: Uuid,
    pub maturity_level: i16,
    pub tier: MaturityTier,
    pub tier_label: &'static str,
    pub answers: Vec<MaturityAnswerRow>,
}

impl SubmitAnswersResponse {
    fn new(detail: &str, outcome: MaturityOutcome) -> Self {
        let tier = MaturityTier::from_level(outcome.maturity_level);
        Self {
            detail: detail.to_string(),
            company_id: outcome.company_id,
            maturity_level: outcome.maturity_level,
            tier,
            tier_label: tier.label(),
        }
    }
}

const QUESTION_TEXT_MAX: usize = 255;
const DEFAULT_QUESTION_WEIGHT: f64 = 1.0;

fn tier_of(level: i16) -> MaturityTier {
    MaturityTier::from_level(u8::try_from(level).unwrap_or(0))
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// GET /api/v1/maturity/questions
pub async fn handle_list_questions(
    State(state): State<AppState>,
) -> Result<Json<Vec<MaturityQuestionRow>>, AppError> {
    let questions = sqlx::query_as::<_, MaturityQuestionRow>(
        "SELECT * FROM maturity_questions ORDER BY created_at, id",
    )
    .fetch_all(&state.db)
    .await?;
    Ok(Json(questions))
}

/// POST /api/v1/maturity/questions
pub async fn handle_create_question(
    State(state): State<AppState>,
    Json(req): Json<CreateQuestionRequest>,
) -> Result<(StatusCode, Json<MaturityQuestionRow>), AppError> {
    resolve_viewer(&state.db, req.user_id).await?.require_staff()?;

    let text = validate_text("text", &req.text, QUESTION_TEXT_MAX)?;
    let weight = validate_weight("weight", req.weight.unwrap_or(DEFAULT_QUESTION_WEIGHT))?;

    let question = sqlx::query_as::<_, MaturityQuestionRow>(
        "INSERT INTO maturity_questions (id, text, weight) VALUES ($1, $2, $3) RETURNING *",
    )
    .bind(Uuid::new_v4())
    .bind(text)
    .bind(weight)
    .fetch_one(&state.db)
    .await?;

    Ok((StatusCode::CREATED, Json(question)))
}

/// PATCH /api/v1/maturity/questions/:id
///
/// A weight change recomputes every company that answered the question.
pub async fn handle_update_question(
    State(state): State<AppState>,
    Path(question_id): Path<Uuid>,
    Json(req): Json<UpdateQuestionRequest>,
) -> Result<Json<MaturityQuestionRow>, AppError> {
    resolve_viewer(&state.db, req.user_id).await?.require_staff()?;

    let text = req
        .text
        .as_deref()
        .map(|t| validate_text("text", t, QUESTION_TEXT_MAX))
        .transpose()?;

    let question =
        update_question_weight(&state.db, question_id, text.as_deref(), req.weight).await?;
    Ok(Json(question))
}

/// POST /api/v1/maturity/submit
///
/// Stores an HR manager's answers for their company and returns the new level.
pub async fn handle_submit_answers(
    State(state): State<AppState>,
    Json(req): Json<SubmitAnswersRequest>,
) -> Result<Json<SubmitAnswersResponse>, AppError> {
    let viewer = resolve_viewer(&state.db, req.user_id).await?;
    let company_id = viewer
        .hr
        .as_ref()
        .map(|hr| hr.company_id)
        .ok_or_else(|| {
            AppError::Forbidden("Only an HR manager can answer the questionnaire".to_string())
        })?;

    let outcome = submit_answers(&state.db, company_id, &req.answers).await?;
    Ok(Json(SubmitAnswersResponse::new("Answers saved", outcome)))
}

/// GET /api/v1/companies/:id/maturity
pub async fn handle_company_maturity(
    State(state): State<AppState>,
    Path(company_id): Path<Uuid>,
) -> Result<Json<CompanyMaturityResponse>, AppError> {
    let company = fetch_company(&state, company_id).await?;

    let answers = sqlx::query_as::<_, MaturityAnswerRow>(
        r#"
        SELECT * FROM company_maturity_answers
        WHERE company_id = $1
        ORDER BY created_at, question_id
        "#,
    )
    .bind(company_id)
    .fetch_all(&state.db)
    .await?;

    let tier = tier_of(company.maturity_level);
    Ok(Json(CompanyMaturityResponse {
        company_id,
        maturity_level: company.maturity_level,
        tier,
        tier_label: tier.label(),
        answers,
    }))
}

/// POST /api/v1/companies/:id/maturity/recompute
pub async fn handle_recompute_maturity(
    State(state): State<AppState>,
    Path(company_id): Path<Uuid>,
    Query(viewer): Query<ViewerQuery>,
) -> Result<Json<SubmitAnswersResponse>, AppError> {
    resolve_viewer(&state.db, viewer.user_id).await?.require_staff()?;

    let maturity_level = recompute_company_maturity(&state.db, company_id).await?;
    let outcome = MaturityOutcome {
        company_id,
        maturity_level,
    };
    Ok(Json(SubmitAnswersResponse::new("Maturity recomputed", outcome)))
}
