use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct VacancyRow {
    pub id: Uuid,
    pub company_id: Uuid,
    pub title: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

/// One required skill of a vacancy with the skill's current weight.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct VacancySkillRow {
    pub vacancy_id: Uuid,
    pub skill_id: Uuid,
    pub weight: f64,
}
