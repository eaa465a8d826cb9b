use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct MaturityQuestionRow {
    pub id: Uuid,
    pub text: String,
    pub weight: f64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct MaturityAnswerRow {
    pub company_id: Uuid,
    pub question_id: Uuid,
    pub answer_value: f64,
    pub created_at: DateTime<Utc>,
}

/// An answer paired with its question's weight, as fed to the aggregator.
#[derive(Debug, Clone, Copy, FromRow)]
pub struct WeightedAnswerRow {
    pub weight: f64,
    pub answer_value: f64,
}
