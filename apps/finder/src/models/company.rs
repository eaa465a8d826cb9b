use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CompanyRow {
    pub id: Uuid,
    pub name: String,
    /// Derived from the company's questionnaire answers; never written directly.
    pub maturity_level: i16,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct HrRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub company_id: Uuid,
}

/// HR joined with the owning user's email and company name.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct HrDetailRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub email: String,
    pub company_id: Uuid,
    pub company_name: String,
}
