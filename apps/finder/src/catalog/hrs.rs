use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::access::{resolve_viewer, Scope, ViewerQuery};
use crate::catalog::companies::fetch_company;
use crate::db::is_unique_violation;
use crate::errors::AppError;
use crate::models::company::HrDetailRow;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateHrRequest {
    pub user_id: Uuid,
    pub company_id: Uuid,
}

const HR_DETAIL_SELECT: &str = r#"
    SELECT h.id, h.user_id, u.email, h.company_id, c.name AS company_name
    FROM hrs h
    JOIN users u ON u.id = h.user_id
    JOIN companies c ON c.id = h.company_id
"#;

/// POST /api/v1/hrs
///
/// Binds the calling user to a company as its HR manager. A user can be HR
/// for one company only, and never while also being a candidate.
pub async fn handle_create_hr(
    State(state): State<AppState>,
    Json(req): Json<CreateHrRequest>,
) -> Result<(StatusCode, Json<HrDetailRow>), AppError> {
    let viewer = resolve_viewer(&state.db, req.user_id).await?;
    if viewer.hr.is_some() {
        return Err(AppError::Conflict("You are already an HR manager".to_string()));
    }
    if viewer.candidate_id.is_some() {
        return Err(AppError::Conflict(
            "Candidates cannot register as HR managers".to_string(),
        ));
    }
    fetch_company(&state, req.company_id).await?;

    let id = Uuid::new_v4();
    sqlx::query("INSERT INTO hrs (id, user_id, company_id) VALUES ($1, $2, $3)")
        .bind(id)
        .bind(req.user_id)
        .bind(req.company_id)
        .execute(&state.db)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                AppError::Conflict("You are already an HR manager".to_string())
            } else {
                AppError::Database(e)
            }
        })?;

    let hr = sqlx::query_as::<_, HrDetailRow>(&format!("{HR_DETAIL_SELECT} WHERE h.id = $1"))
        .bind(id)
        .fetch_one(&state.db)
        .await?;

    Ok((StatusCode::CREATED, Json(hr)))
}

/// GET /api/v1/hrs?user_id=
pub async fn handle_list_hrs(
    State(state): State<AppState>,
    Query(params): Query<ViewerQuery>,
) -> Result<Json<Vec<HrDetailRow>>, AppError> {
    let viewer = resolve_viewer(&state.db, params.user_id).await?;
    let scope = viewer.hr_user_scope();
    if scope == Scope::Nothing {
        return Ok(Json(vec![]));
    }

    let hrs = sqlx::query_as::<_, HrDetailRow>(&format!(
        "{HR_DETAIL_SELECT} WHERE ($1::uuid IS NULL OR h.user_id = $1) ORDER BY u.email, h.id"
    ))
    .bind(scope.filter_id())
    .fetch_all(&state.db)
    .await?;

    Ok(Json(hrs))
}
