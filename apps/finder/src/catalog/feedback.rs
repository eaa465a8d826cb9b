//! Discipline feedback HR managers leave on candidates.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::access::{resolve_viewer, Scope, ViewerQuery};
use crate::catalog::candidates::fetch_candidate;
use crate::errors::AppError;
use crate::models::candidate::DisciplineFeedbackRow;
use crate::state::AppState;
use crate::validation::{validate_knowledge_level, validate_text};

const DEFAULT_KNOWLEDGE_LEVEL: i64 = 2;
const DISCIPLINE_MAX: usize = 128;

#[derive(Debug, Deserialize)]
pub struct CreateFeedbackRequest {
    pub user_id: Uuid,
    pub candidate_id: Uuid,
    pub discipline: String,
    pub knowledge_level: Option<i64>,
    #[serde(default)]
    pub comment: String,
}

/// POST /api/v1/discipline-feedback
pub async fn handle_create_feedback(
    State(state): State<AppState>,
    Json(req): Json<CreateFeedbackRequest>,
) -> Result<(StatusCode, Json<DisciplineFeedbackRow>), AppError> {
    let viewer = resolve_viewer(&state.db, req.user_id).await?;
    let hr = viewer.require_hr()?;

    let discipline = validate_text("discipline", &req.discipline, DISCIPLINE_MAX)?;
    let knowledge_level =
        validate_knowledge_level(req.knowledge_level.unwrap_or(DEFAULT_KNOWLEDGE_LEVEL))?;
    fetch_candidate(&state.db, req.candidate_id).await?;

    let feedback = sqlx::query_as::<_, DisciplineFeedbackRow>(
        r#"
        INSERT INTO discipline_feedbacks
            (id, candidate_id, hr_id, discipline, knowledge_level, comment)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(req.candidate_id)
    .bind(hr.id)
    .bind(discipline)
    .bind(knowledge_level)
    .bind(req.comment.trim())
    .fetch_one(&state.db)
    .await?;

    Ok((StatusCode::CREATED, Json(feedback)))
}

/// GET /api/v1/discipline-feedback?user_id=
///
/// HR managers see the feedback they wrote, newest first. Nobody else sees any.
pub async fn handle_list_feedback(
    State(state): State<AppState>,
    Query(params): Query<ViewerQuery>,
) -> Result<Json<Vec<DisciplineFeedbackRow>>, AppError> {
    let viewer = resolve_viewer(&state.db, params.user_id).await?;
    let Scope::Only(hr_id) = viewer.feedback_scope() else {
        return Ok(Json(vec![]));
    };

    let feedback = sqlx::query_as::<_, DisciplineFeedbackRow>(
        "SELECT * FROM discipline_feedbacks WHERE hr_id = $1 ORDER BY created_at DESC, id",
    )
    .bind(hr_id)
    .fetch_all(&state.db)
    .await?;

    Ok(Json(feedback))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_discipline_fits_column_width() {
        assert!(validate_text("discipline", &"d".repeat(128), DISCIPLINE_MAX).is_ok());
        assert!(validate_text("discipline", &"d".repeat(129), DISCIPLINE_MAX).is_err());
    }

    #[test]
    fn test_feedback_request_defaults() {
        let req: CreateFeedbackRequest = serde_json::from_value(serde_json::json!({
            "user_id": Uuid::nil(),
            "candidate_id": Uuid::nil(),
            "discipline": "Rust",
        }))
        .unwrap();
        assert!(req.knowledge_level.is_none());
        assert!(req.comment.is_empty());
        let level = req.knowledge_level.unwrap_or(DEFAULT_KNOWLEDGE_LEVEL);
        assert_eq!(validate_knowledge_level(level).unwrap(), 2);
    }
}
