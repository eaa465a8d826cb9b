use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CandidateRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub full_name: String,
    pub age: i32,
    pub about: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct EducationRow {
    pub id: Uuid,
    pub candidate_id: Uuid,
    pub title: String,
    pub establishment: String,
    pub avg_mark: f64,
}

/// Experience joined with the employer's name.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ExperienceRow {
    pub id: Uuid,
    pub candidate_id: Uuid,
    pub company_id: Uuid,
    pub company_name: String,
    pub hire_date: NaiveDate,
    pub dismissal_date: Option<NaiveDate>,
    pub about: String,
}

/// A candidate's rank for one skill, joined with the skill's title and weight.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CandidateSkillRow {
    pub candidate_id: Uuid,
    pub skill_id: Uuid,
    pub title: String,
    pub weight: f64,
    pub rank: i16,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DisciplineFeedbackRow {
    pub id: Uuid,
    pub candidate_id: Uuid,
    pub hr_id: Uuid,
    pub discipline: String,
    pub knowledge_level: i16,
    pub comment: String,
    pub created_at: DateTime<Utc>,
}
