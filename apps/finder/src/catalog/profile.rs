use axum::{
    extract::{Query, State},
    Json,
};
use serde::Serialize;

use crate::access::{resolve_viewer, Role, ViewerQuery};
use crate::catalog::candidates::{fetch_candidate, load_candidate_detail, CandidateDetail};
use crate::catalog::companies::fetch_company;
use crate::catalog::resumes::{load_resume_detail, ResumeDetail};
use crate::errors::AppError;
use crate::models::company::{CompanyRow, HrRow};
use crate::models::resume::ResumeRow;
use crate::state::AppState;

#[derive(Debug, Serialize)]
#[serde(tag = "role", rename_all = "snake_case")]
pub enum ProfileResponse {
    Candidate {
        candidate: CandidateDetail,
        resumes: Vec<ResumeDetail>,
    },
    Hr {
        hr: HrRow,
        company: CompanyRow,
    },
}

/// GET /api/v1/profile?user_id=
pub async fn handle_get_profile(
    State(state): State<AppState>,
    Query(params): Query<ViewerQuery>,
) -> Result<Json<ProfileResponse>, AppError> {
    let viewer = resolve_viewer(&state.db, params.user_id).await?;

    match (viewer.role(), viewer.candidate_id, viewer.hr) {
        (Role::Candidate, Some(candidate_id), _) => {
            let candidate = fetch_candidate(&state.db, candidate_id).await?;
            let resume_rows = sqlx::query_as::<_, ResumeRow>(
                "SELECT * FROM resumes WHERE candidate_id = $1 ORDER BY created_at, id",
            )
            .bind(candidate_id)
            .fetch_all(&state.db)
            .await?;

            let mut resumes = Vec::with_capacity(resume_rows.len());
            for resume in resume_rows {
                resumes.push(load_resume_detail(&state.db, resume).await?);
            }

            Ok(Json(ProfileResponse::Candidate {
                candidate: load_candidate_detail(&state.db, candidate).await?,
                resumes,
            }))
        }
        (Role::Hr, _, Some(hr)) => {
            let company = fetch_company(&state, hr.company_id).await?;
            Ok(Json(ProfileResponse::Hr { hr, company }))
        }
        _ => Err(AppError::NotFound("Profile not found".to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    #[test]
    fn test_hr_profile_is_tagged_with_role() {
        let company = CompanyRow {
            id: Uuid::new_v4(),
            name: "Acme".to_string(),
            maturity_level: 2,
            created_at: Utc::now(),
        };
        let profile = ProfileResponse::Hr {
            hr: HrRow {
                id: Uuid::new_v4(),
                user_id: Uuid::new_v4(),
                company_id: company.id,
            },
            company,
        };

        let json = serde_json::to_value(&profile).unwrap();
        assert_eq!(json["role"], "hr");
        assert_eq!(json["company"]["name"], "Acme");
    }
}
