//! Writes questionnaire answers and the derived company maturity level as
//! one transaction.
//!
//! Every path that changes an answer set or a question weight goes through
//! here. The company row is locked (`FOR UPDATE`) before its answers are
//! read, so concurrent submissions for one company are applied one after
//! another and readers never see answers without their recomputed level.
//!
//! Lock order is questions first, then companies by id.

use std::collections::BTreeSet;

use serde::Deserialize;
use sqlx::{PgPool, Postgres, Transaction};
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::maturity::aggregator::recalc_maturity;
use crate::models::maturity::{MaturityQuestionRow, WeightedAnswerRow};
use crate::validation::{validate_answer_value, validate_weight};

#[derive(Debug, Clone, Deserialize)]
pub struct AnswerInput {
    pub question_id: Uuid,
    pub answer_value: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MaturityOutcome {
    pub company_id: Uuid,
    pub maturity_level: u8,
}

/// Upserts `answers` for the company and recomputes its maturity level.
/// A later answer for the same question overwrites an earlier one.
/// Nothing is written if any answer is invalid.
pub async fn submit_answers(
    pool: &PgPool,
    company_id: Uuid,
    answers: &[AnswerInput],
) -> Result<MaturityOutcome, AppError> {
    for answer in answers {
        validate_answer_value(answer.answer_value)?;
    }

    let mut tx = pool.begin().await?;

    let requested: Vec<Uuid> = answers
        .iter()
        .map(|a| a.question_id)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    let known: BTreeSet<Uuid> = sqlx::query_scalar::<_, Uuid>(
        "SELECT id FROM maturity_questions WHERE id = ANY($1) ORDER BY id FOR SHARE",
    )
    .bind(requested.as_slice())
    .fetch_all(&mut *tx)
    .await?
    .into_iter()
    .collect();
    if let Some(missing) = requested.iter().find(|id| !known.contains(id)) {
        return Err(AppError::Validation(format!("Question {missing} not found")));
    }

    lock_company(&mut tx, company_id).await?;

    for answer in answers {
        sqlx::query(
            r#"
            INSERT INTO company_maturity_answers (company_id, question_id, answer_value)
            VALUES ($1, $2, $3)
            ON CONFLICT (company_id, question_id)
            DO UPDATE SET answer_value = EXCLUDED.answer_value
            "#,
        )
        .bind(company_id)
        .bind(answer.question_id)
        .bind(answer.answer_value)
        .execute(&mut *tx)
        .await?;
    }

    let maturity_level = recompute_in_tx(&mut tx, company_id).await?;
    tx.commit().await?;

    info!(
        "Stored {} maturity answers for company {company_id}; level is now {maturity_level}",
        answers.len()
    );

    Ok(MaturityOutcome {
        company_id,
        maturity_level,
    })
}

/// Re-derives a company's level from its stored answers.
pub async fn recompute_company_maturity(pool: &PgPool, company_id: Uuid) -> Result<u8, AppError> {
    let mut tx = pool.begin().await?;
    lock_company(&mut tx, company_id).await?;
    let level = recompute_in_tx(&mut tx, company_id).await?;
    tx.commit().await?;
    info!("Recomputed maturity for company {company_id}: level {level}");
    Ok(level)
}

/// Changes a question's weight and recomputes every company that answered it.
pub async fn update_question_weight(
    pool: &PgPool,
    question_id: Uuid,
    text: Option<&str>,
    weight: Option<f64>,
) -> Result<MaturityQuestionRow, AppError> {
    if let Some(w) = weight {
        validate_weight("weight", w)?;
    }

    let mut tx = pool.begin().await?;

    let question = sqlx::query_as::<_, MaturityQuestionRow>(
        r#"
        UPDATE maturity_questions
        SET text = COALESCE($2, text), weight = COALESCE($3, weight)
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(question_id)
    .bind(text)
    .bind(weight)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or_else(|| AppError::NotFound(format!("Question {question_id} not found")))?;

    if weight.is_some() {
        // Companies are locked in id order.
        let companies: Vec<Uuid> = sqlx::query_scalar(
            r#"
            SELECT c.id FROM companies c
            WHERE EXISTS (
                SELECT 1 FROM company_maturity_answers a
                WHERE a.company_id = c.id AND a.question_id = $1
            )
            ORDER BY c.id
            FOR UPDATE OF c
            "#,
        )
        .bind(question_id)
        .fetch_all(&mut *tx)
        .await?;

        for company_id in &companies {
            recompute_in_tx(&mut tx, *company_id).await?;
        }
        info!(
            "Question {question_id} reweighted; recomputed {} companies",
            companies.len()
        );
    }

    tx.commit().await?;
    Ok(question)
}

async fn lock_company(
    tx: &mut Transaction<'_, Postgres>,
    company_id: Uuid,
) -> Result<(), AppError> {
    sqlx::query_scalar::<_, Uuid>("SELECT id FROM companies WHERE id = $1 FOR UPDATE")
        .bind(company_id)
        .fetch_optional(&mut **tx)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Company {company_id} not found")))?;
    Ok(())
}

/// Caller must hold the company row lock.
async fn recompute_in_tx(
    tx: &mut Transaction<'_, Postgres>,
    company_id: Uuid,
) -> Result<u8, sqlx::Error> {
    let rows = sqlx::query_as::<_, WeightedAnswerRow>(
        r#"
        SELECT q.weight, a.answer_value
        FROM company_maturity_answers a
        JOIN maturity_questions q ON q.id = a.question_id
        WHERE a.company_id = $1
        "#,
    )
    .bind(company_id)
    .fetch_all(&mut **tx)
    .await?;

    let pairs: Vec<(f64, f64)> = rows.iter().map(|r| (r.weight, r.answer_value)).collect();
    let level = recalc_maturity(&pairs);

    sqlx::query("UPDATE companies SET maturity_level = $1 WHERE id = $2")
        .bind(i16::from(level))
        .bind(company_id)
        .execute(&mut **tx)
        .await?;

    Ok(level)
}
