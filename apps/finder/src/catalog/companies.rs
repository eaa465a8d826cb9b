use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::access::resolve_viewer;
use crate::errors::AppError;
use crate::models::company::CompanyRow;
use crate::state::AppState;
use crate::validation::validate_text;

const COMPANY_NAME_MAX: usize = 128;

/// `maturity_level` is not accepted here; it only changes through the questionnaire.
#[derive(Debug, Deserialize)]
pub struct CompanyRequest {
    pub user_id: Uuid,
    pub name: String,
}

/// GET /api/v1/companies
pub async fn handle_list_companies(
    State(state): State<AppState>,
) -> Result<Json<Vec<CompanyRow>>, AppError> {
    let companies = sqlx::query_as::<_, CompanyRow>("SELECT * FROM companies ORDER BY name, id")
        .fetch_all(&state.db)
        .await?;
    Ok(Json(companies))
}

/// GET /api/v1/companies/:id
pub async fn handle_get_company(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<CompanyRow>, AppError> {
    Ok(Json(fetch_company(&state, id).await?))
}

/// POST /api/v1/companies
pub async fn handle_create_company(
    State(state): State<AppState>,
    Json(req): Json<CompanyRequest>,
) -> Result<(StatusCode, Json<CompanyRow>), AppError> {
    resolve_viewer(&state.db, req.user_id).await?;
    let name = validate_text("name", &req.name, COMPANY_NAME_MAX)?;

    let company = sqlx::query_as::<_, CompanyRow>(
        "INSERT INTO companies (id, name, maturity_level) VALUES ($1, $2, 0) RETURNING *",
    )
    .bind(Uuid::new_v4())
    .bind(name)
    .fetch_one(&state.db)
    .await?;

    Ok((StatusCode::CREATED, Json(company)))
}

/// PATCH /api/v1/companies/:id
///
/// Staff, or an HR manager of this company.
pub async fn handle_update_company(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<CompanyRequest>,
) -> Result<Json<CompanyRow>, AppError> {
    let viewer = resolve_viewer(&state.db, req.user_id).await?;
    let is_own_company = viewer.hr.as_ref().is_some_and(|hr| hr.company_id == id);
    if !viewer.user.is_staff && !is_own_company {
        return Err(AppError::Forbidden(
            "Only this company's HR managers can edit it".to_string(),
        ));
    }

    let name = validate_text("name", &req.name, COMPANY_NAME_MAX)?;
    let company = sqlx::query_as::<_, CompanyRow>(
        "UPDATE companies SET name = $2 WHERE id = $1 RETURNING *",
    )
    .bind(id)
    .bind(name)
    .fetch_optional(&state.db)
    .await?
    .ok_or_else(|| AppError::NotFound(format!("Company {id} not found")))?;

    Ok(Json(company))
}

pub async fn fetch_company(state: &AppState, id: Uuid) -> Result<CompanyRow, AppError> {
    sqlx::query_as::<_, CompanyRow>("SELECT * FROM companies WHERE id = $1")
        .bind(id)
        .fetch_optional(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Company {id} not found")))
}
