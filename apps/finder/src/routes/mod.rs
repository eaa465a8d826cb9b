pub mod health;

use axum::{
    routing::{delete, get, patch, post, put},
    Router,
};

use crate::catalog::{
    candidates, companies, feedback, hrs, profile, resumes, skills, users, vacancies,
};
use crate::matching::handlers as matching;
use crate::maturity::handlers as maturity;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Recommendations
        .route(
            "/api/v1/recommendations/candidates/:vacancy_id",
            get(matching::handle_recommend_candidates),
        )
        .route(
            "/api/v1/recommendations/vacancies",
            get(matching::handle_recommend_vacancies),
        )
        .route("/api/v1/vacancies/:id/match", get(matching::handle_vacancy_match))
        // Digital maturity questionnaire
        .route(
            "/api/v1/maturity/questions",
            get(maturity::handle_list_questions).post(maturity::handle_create_question),
        )
        .route(
            "/api/v1/maturity/questions/:id",
            patch(maturity::handle_update_question),
        )
        .route("/api/v1/maturity/submit", post(maturity::handle_submit_answers))
        .route(
            "/api/v1/companies/:id/maturity",
            get(maturity::handle_company_maturity),
        )
        .route(
            "/api/v1/companies/:id/maturity/recompute",
            post(maturity::handle_recompute_maturity),
        )
        // Catalog
        .route("/api/v1/users", post(users::handle_create_user))
        .route("/api/v1/users/:id", get(users::handle_get_user))
        .route(
            "/api/v1/companies",
            get(companies::handle_list_companies).post(companies::handle_create_company),
        )
        .route(
            "/api/v1/companies/:id",
            get(companies::handle_get_company).patch(companies::handle_update_company),
        )
        .route(
            "/api/v1/skills",
            get(skills::handle_list_skills).post(skills::handle_create_skill),
        )
        .route(
            "/api/v1/skills/:id",
            get(skills::handle_get_skill)
                .patch(skills::handle_update_skill)
                .delete(skills::handle_delete_skill),
        )
        .route(
            "/api/v1/candidates",
            get(candidates::handle_list_candidates).post(candidates::handle_create_candidate),
        )
        .route(
            "/api/v1/candidates/:id",
            get(candidates::handle_get_candidate).patch(candidates::handle_update_candidate),
        )
        .route("/api/v1/candidates/:id/skills", put(candidates::handle_set_skills))
        .route(
            "/api/v1/candidates/:id/educations",
            post(candidates::handle_add_education),
        )
        .route(
            "/api/v1/candidates/:id/skills/:skill_id",
            delete(candidates::handle_remove_skill),
        )
        .route(
            "/api/v1/candidates/:id/educations/:education_id",
            patch(candidates::handle_update_education)
                .delete(candidates::handle_delete_education),
        )
        .route(
            "/api/v1/candidates/:id/experiences",
            post(candidates::handle_add_experience),
        )
        .route(
            "/api/v1/candidates/:id/experiences/:experience_id",
            patch(candidates::handle_update_experience)
                .delete(candidates::handle_delete_experience),
        )
        .route(
            "/api/v1/resumes",
            get(resumes::handle_list_resumes).post(resumes::handle_create_resume),
        )
        .route(
            "/api/v1/resumes/:id",
            get(resumes::handle_get_resume)
                .patch(resumes::handle_update_resume)
                .delete(resumes::handle_delete_resume),
        )
        .route(
            "/api/v1/vacancies",
            get(vacancies::handle_list_vacancies).post(vacancies::handle_create_vacancy),
        )
        .route(
            "/api/v1/vacancies/:id",
            get(vacancies::handle_get_vacancy)
                .patch(vacancies::handle_update_vacancy)
                .delete(vacancies::handle_delete_vacancy),
        )
        .route(
            "/api/v1/hrs",
            get(hrs::handle_list_hrs).post(hrs::handle_create_hr),
        )
        .route(
            "/api/v1/discipline-feedback",
            get(feedback::handle_list_feedback).post(feedback::handle_create_feedback),
        )
        .route("/api/v1/profile", get(profile::handle_get_profile))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use sqlx::postgres::PgPoolOptions;
    use tower::ServiceExt;

    use super::*;
    use crate::config::Config;
    use crate::matching::scoring::WeightedSkillScorer;

    /// The pool never connects; these requests are answered before any query.
    fn test_state() -> AppState {
        let config = Config {
            database_url: "postgres://localhost/finder_test".to_string(),
            db_max_connections: 1,
            port: 0,
            rust_log: "info".to_string(),
            default_maturity_weight: 0.3,
        };
        let db = PgPoolOptions::new()
            .max_connections(1)
            .connect_lazy(&config.database_url)
            .unwrap();
        AppState {
            db,
            config,
            match_scorer: Arc::new(WeightedSkillScorer),
        }
    }

    async fn status_of(method: &str, uri: &str) -> StatusCode {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap();
        build_router(test_state())
            .oneshot(request)
            .await
            .unwrap()
            .status()
    }

    #[tokio::test]
    async fn test_health_ok() {
        assert_eq!(status_of("GET", "/health").await, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_malformed_id_rejected() {
        assert_eq!(
            status_of("GET", "/api/v1/skills/not-a-uuid").await,
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of("GET", "/api/v1/recommendations/candidates/42").await,
            StatusCode::BAD_REQUEST
        );
    }

    #[tokio::test]
    async fn test_nested_candidate_records_are_routed() {
        // Each id is validated by the path extractor before any query runs.
        let bad_skill = format!("/api/v1/candidates/{}/skills/x", uuid::Uuid::nil());
        assert_eq!(status_of("DELETE", &bad_skill).await, StatusCode::BAD_REQUEST);
        assert_eq!(
            status_of("DELETE", "/api/v1/candidates/x/educations/y").await,
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of("PATCH", "/api/v1/candidates/x/experiences/y").await,
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of("DELETE", "/api/v1/resumes/not-a-uuid").await,
            StatusCode::BAD_REQUEST
        );
    }

    #[tokio::test]
    async fn test_candidate_detail_requires_viewer() {
        let uri = format!("/api/v1/candidates/{}", uuid::Uuid::nil());
        assert_eq!(status_of("GET", &uri).await, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_unknown_route_not_found() {
        assert_eq!(status_of("GET", "/api/v1/nope").await, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_wrong_method_rejected() {
        assert_eq!(
            status_of("DELETE", "/api/v1/maturity/submit").await,
            StatusCode::METHOD_NOT_ALLOWED
        );
    }
}
