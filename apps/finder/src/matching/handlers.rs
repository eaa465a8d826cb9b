//! Axum route handlers for candidate/vacancy recommendations.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::errors::AppError;
use crate::matching::profile::{
    load_candidate_profile, load_candidate_snapshots, load_vacancy_requirements,
    load_vacancy_snapshots, CandidateSnapshot, VacancySnapshot,
};
use crate::matching::ranking::{rank_by_score, Ranked};
use crate::matching::scoring::{MatchBreakdown, MaturityWeight};
use crate::models::candidate::{CandidateRow, CandidateSkillRow};
use crate::models::vacancy::VacancyRow;
use crate::pagination::{paginate, Page, PageParams};
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

/// `maturity_weight` stays a raw string so malformed values fall back to the
/// default instead of failing extraction.
#[derive(Debug, Deserialize)]
pub struct RecommendCandidatesQuery {
    pub maturity_weight: Option<String>,
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct RecommendVacanciesQuery {
    pub candidate_id: Uuid,
    pub company_id: Option<Uuid>,
    pub maturity_weight: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct VacancyMatchQuery {
    pub candidate_id: Uuid,
    pub maturity_weight: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CandidateMatch {
    #[serde(flatten)]
    pub candidate: CandidateRow,
    pub skills: Vec<CandidateSkillRow>,
}

impl From<CandidateSnapshot> for CandidateMatch {
    fn from(snapshot: CandidateSnapshot) -> Self {
        Self {
            candidate: snapshot.candidate,
            skills: snapshot.skills,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct VacancyMatch {
    #[serde(flatten)]
    pub vacancy: VacancyRow,
    pub skills: Vec<Uuid>,
}

impl From<VacancySnapshot> for VacancyMatch {
    fn from(snapshot: VacancySnapshot) -> Self {
        Self {
            skills: snapshot
                .requirements
                .skills
                .iter()
                .map(|s| s.skill_id)
                .collect(),
            vacancy: snapshot.vacancy,
        }
    }
}

fn maturity_weight(state: &AppState, raw: Option<&str>) -> MaturityWeight {
    MaturityWeight::parse(raw, state.config.default_maturity_weight)
}

async fn ensure_vacancy_exists(state: &AppState, vacancy_id: Uuid) -> Result<(), AppError> {
    let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM vacancies WHERE id = $1)")
        .bind(vacancy_id)
        .fetch_one(&state.db)
        .await?;
    if exists {
        Ok(())
    } else {
        Err(AppError::NotFound(format!("Vacancy {vacancy_id} not found")))
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// GET /api/v1/recommendations/candidates/:vacancy_id
///
/// Every candidate scored against the vacancy, best match first.
pub async fn handle_recommend_candidates(
    State(state): State<AppState>,
    Path(vacancy_id): Path<Uuid>,
    Query(query): Query<RecommendCandidatesQuery>,
) -> Result<Json<Page<Ranked<CandidateMatch>>>, AppError> {
    let page_params = PageParams {
        page: query.page,
        page_size: query.page_size,
    };
    page_params.validate()?;

    ensure_vacancy_exists(&state, vacancy_id).await?;
    let requirements = load_vacancy_requirements(&state.db, vacancy_id).await?;
    let weight = maturity_weight(&state, query.maturity_weight.as_deref());

    let snapshots = load_candidate_snapshots(&state.db).await?;
    debug!(
        "Scoring {} candidates for vacancy {vacancy_id} (maturity_weight={})",
        snapshots.len(),
        weight.value()
    );

    let scorer = state.match_scorer.as_ref();
    let ranked: Vec<Ranked<CandidateMatch>> = rank_by_score(
        snapshots,
        |s| s.candidate.id,
        |s| scorer.score(&s.profile, &requirements, weight),
    )
    .into_iter()
    .map(|r| r.map(CandidateMatch::from))
    .collect();

    Ok(Json(paginate(ranked, page_params)?))
}

/// GET /api/v1/recommendations/vacancies?candidate_id=
///
/// Every vacancy (optionally one company's) scored for the candidate.
pub async fn handle_recommend_vacancies(
    State(state): State<AppState>,
    Query(query): Query<RecommendVacanciesQuery>,
) -> Result<Json<Vec<Ranked<VacancyMatch>>>, AppError> {
    let profile = load_candidate_profile(&state.db, query.candidate_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Candidate {} not found", query.candidate_id)))?;
    let weight = maturity_weight(&state, query.maturity_weight.as_deref());

    let snapshots = load_vacancy_snapshots(&state.db, query.company_id).await?;
    debug!(
        "Scoring {} vacancies for candidate {}",
        snapshots.len(),
        query.candidate_id
    );

    let scorer = state.match_scorer.as_ref();
    let ranked = rank_by_score(
        snapshots,
        |s| s.vacancy.id,
        |s| scorer.score(&profile, &s.requirements, weight),
    )
    .into_iter()
    .map(|r| r.map(VacancyMatch::from))
    .collect();

    Ok(Json(ranked))
}

/// GET /api/v1/vacancies/:id/match?candidate_id=
///
/// One candidate/vacancy score with the terms it was blended from.
pub async fn handle_vacancy_match(
    State(state): State<AppState>,
    Path(vacancy_id): Path<Uuid>,
    Query(query): Query<VacancyMatchQuery>,
) -> Result<Json<MatchBreakdown>, AppError> {
    ensure_vacancy_exists(&state, vacancy_id).await?;
    let profile = load_candidate_profile(&state.db, query.candidate_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Candidate {} not found", query.candidate_id)))?;
    let requirements = load_vacancy_requirements(&state.db, vacancy_id).await?;
    let weight = maturity_weight(&state, query.maturity_weight.as_deref());

    Ok(Json(state.match_scorer.breakdown(&profile, &requirements, weight)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matching::scoring::{CandidateProfile, RequiredSkill, VacancyRequirements};
    use chrono::Utc;

    #[test]
    fn test_candidate_match_flattens_candidate_fields() {
        let candidate = CandidateRow {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            full_name: "Ada Lovelace".to_string(),
            age: 36,
            about: String::new(),
            created_at: Utc::now(),
        };
        let snapshot = CandidateSnapshot {
            candidate: candidate.clone(),
            skills: vec![],
            profile: CandidateProfile::default(),
        };
        let ranked = Ranked {
            item: CandidateMatch::from(snapshot),
            match_score: 0.5,
        };

        let json = serde_json::to_value(&ranked).unwrap();
        assert_eq!(json["full_name"], "Ada Lovelace");
        assert_eq!(json["match_score"], 0.5);
        assert!(json["skills"].as_array().unwrap().is_empty());
    }

    #[test]
    fn test_vacancy_match_lists_required_skill_ids() {
        let skill_id = Uuid::new_v4();
        let vacancy = VacancyRow {
            id: Uuid::new_v4(),
            company_id: Uuid::new_v4(),
            title: "Backend engineer".to_string(),
            description: String::new(),
            created_at: Utc::now(),
        };
        let snapshot = VacancySnapshot {
            requirements: VacancyRequirements {
                vacancy_id: vacancy.id,
                skills: vec![RequiredSkill {
                    skill_id,
                    weight: 1.0,
                }],
            },
            vacancy,
        };
        assert_eq!(VacancyMatch::from(snapshot).skills, vec![skill_id]);
    }
}
