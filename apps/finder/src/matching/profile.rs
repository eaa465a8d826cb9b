//! Loads immutable scoring snapshots from PostgreSQL.
//!
//! Bulk loaders issue a fixed number of queries and group rows in memory so
//! ranking a whole table never degrades into one query per row.

use std::collections::{HashMap, HashSet};

use sqlx::PgPool;
use uuid::Uuid;

use crate::matching::scoring::{
    maturity_signal, resume_maturity_score, CandidateProfile, RequiredSkill, VacancyRequirements,
};
use crate::models::candidate::{CandidateRow, CandidateSkillRow};
use crate::models::vacancy::{VacancyRow, VacancySkillRow};

/// A candidate row plus everything needed to score and display it.
#[derive(Debug, Clone)]
pub struct CandidateSnapshot {
    pub candidate: CandidateRow,
    pub skills: Vec<CandidateSkillRow>,
    pub profile: CandidateProfile,
}

#[derive(Debug, Clone)]
pub struct VacancySnapshot {
    pub vacancy: VacancyRow,
    pub requirements: VacancyRequirements,
}

const CANDIDATE_SKILLS_SQL: &str = r#"
    SELECT cs.candidate_id, cs.skill_id, s.title, s.weight, cs.rank
    FROM candidate_skills cs
    JOIN skills s ON s.id = cs.skill_id
"#;

/// Builds a scoring profile from a candidate's ranked skills.
/// Candidates without an active resume get a maturity signal of 0.
pub fn build_candidate_profile(
    candidate_id: Uuid,
    skills: &[CandidateSkillRow],
    has_active_resume: bool,
) -> CandidateProfile {
    let signal = if has_active_resume {
        let weights: Vec<f64> = skills.iter().map(|s| s.weight).collect();
        maturity_signal(resume_maturity_score(&weights))
    } else {
        0.0
    };

    CandidateProfile {
        candidate_id,
        skill_ranks: skills.iter().map(|s| (s.skill_id, s.rank)).collect(),
        maturity_signal: signal,
    }
}

pub fn build_vacancy_requirements(
    vacancy_id: Uuid,
    rows: &[VacancySkillRow],
) -> VacancyRequirements {
    VacancyRequirements {
        vacancy_id,
        skills: rows
            .iter()
            .map(|r| RequiredSkill {
                skill_id: r.skill_id,
                weight: r.weight,
            })
            .collect(),
    }
}

/// Returns a candidate's ranked skills, ordered by skill title.
pub async fn load_candidate_skills(
    pool: &PgPool,
    candidate_id: Uuid,
) -> Result<Vec<CandidateSkillRow>, sqlx::Error> {
    sqlx::query_as::<_, CandidateSkillRow>(&format!(
        "{CANDIDATE_SKILLS_SQL} WHERE cs.candidate_id = $1 ORDER BY s.title, cs.skill_id"
    ))
    .bind(candidate_id)
    .fetch_all(pool)
    .await
}

pub async fn has_active_resume(pool: &PgPool, candidate_id: Uuid) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar(
        "SELECT EXISTS(SELECT 1 FROM resumes WHERE candidate_id = $1 AND is_active)",
    )
    .bind(candidate_id)
    .fetch_one(pool)
    .await
}

/// Loads a single candidate's profile. `None` when the candidate does not exist.
pub async fn load_candidate_profile(
    pool: &PgPool,
    candidate_id: Uuid,
) -> Result<Option<CandidateProfile>, sqlx::Error> {
    let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM candidates WHERE id = $1)")
        .bind(candidate_id)
        .fetch_one(pool)
        .await?;
    if !exists {
        return Ok(None);
    }

    let skills = load_candidate_skills(pool, candidate_id).await?;
    let active = has_active_resume(pool, candidate_id).await?;
    Ok(Some(build_candidate_profile(candidate_id, &skills, active)))
}

/// Loads every candidate with its skills and scoring profile.
pub async fn load_candidate_snapshots(
    pool: &PgPool,
) -> Result<Vec<CandidateSnapshot>, sqlx::Error> {
    let candidates = sqlx::query_as::<_, CandidateRow>(
        "SELECT * FROM candidates ORDER BY created_at, id",
    )
    .fetch_all(pool)
    .await?;

    let skill_rows = sqlx::query_as::<_, CandidateSkillRow>(&format!(
        "{CANDIDATE_SKILLS_SQL} ORDER BY s.title, cs.skill_id"
    ))
    .fetch_all(pool)
    .await?;

    let active: HashSet<Uuid> = sqlx::query_scalar::<_, Uuid>(
        "SELECT DISTINCT candidate_id FROM resumes WHERE is_active",
    )
    .fetch_all(pool)
    .await?
    .into_iter()
    .collect();

    let mut skills_by_candidate: HashMap<Uuid, Vec<CandidateSkillRow>> = HashMap::new();
    for row in skill_rows {
        skills_by_candidate
            .entry(row.candidate_id)
            .or_default()
            .push(row);
    }

    Ok(candidates
        .into_iter()
        .map(|candidate| {
            let skills = skills_by_candidate.remove(&candidate.id).unwrap_or_default();
            let profile =
                build_candidate_profile(candidate.id, &skills, active.contains(&candidate.id));
            CandidateSnapshot {
                candidate,
                skills,
                profile,
            }
        })
        .collect())
}

pub async fn load_vacancy_requirements(
    pool: &PgPool,
    vacancy_id: Uuid,
) -> Result<VacancyRequirements, sqlx::Error> {
    let rows = sqlx::query_as::<_, VacancySkillRow>(
        r#"
        SELECT vs.vacancy_id, vs.skill_id, s.weight
        FROM vacancy_skills vs
        JOIN skills s ON s.id = vs.skill_id
        WHERE vs.vacancy_id = $1
        ORDER BY vs.skill_id
        "#,
    )
    .bind(vacancy_id)
    .fetch_all(pool)
    .await?;

    Ok(build_vacancy_requirements(vacancy_id, &rows))
}

/// Loads every vacancy, or only one company's, with its requirements.
pub async fn load_vacancy_snapshots(
    pool: &PgPool,
    company_id: Option<Uuid>,
) -> Result<Vec<VacancySnapshot>, sqlx::Error> {
    let vacancies = sqlx::query_as::<_, VacancyRow>(
        r#"
        SELECT * FROM vacancies
        WHERE ($1::uuid IS NULL OR company_id = $1)
        ORDER BY created_at, id
        "#,
    )
    .bind(company_id)
    .fetch_all(pool)
    .await?;

    let rows = sqlx::query_as::<_, VacancySkillRow>(
        r#"
        SELECT vs.vacancy_id, vs.skill_id, s.weight
        FROM vacancy_skills vs
        JOIN skills s ON s.id = vs.skill_id
        JOIN vacancies v ON v.id = vs.vacancy_id
        WHERE ($1::uuid IS NULL OR v.company_id = $1)
        ORDER BY vs.vacancy_id, vs.skill_id
        "#,
    )
    .bind(company_id)
    .fetch_all(pool)
    .await?;

    let mut rows_by_vacancy: HashMap<Uuid, Vec<VacancySkillRow>> = HashMap::new();
    for row in rows {
        rows_by_vacancy.entry(row.vacancy_id).or_default().push(row);
    }

    Ok(vacancies
        .into_iter()
        .map(|vacancy| {
            let rows = rows_by_vacancy.remove(&vacancy.id).unwrap_or_default();
            let requirements = build_vacancy_requirements(vacancy.id, &rows);
            VacancySnapshot {
                vacancy,
                requirements,
            }
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn skill(candidate_id: Uuid, weight: f64, rank: i16) -> CandidateSkillRow {
        CandidateSkillRow {
            candidate_id,
            skill_id: Uuid::new_v4(),
            title: "rust".to_string(),
            weight,
            rank,
        }
    }

    #[test]
    fn test_profile_with_active_resume_uses_mean_weight() {
        let id = Uuid::new_v4();
        let skills = vec![skill(id, 2.0, 5), skill(id, 4.0, 1)];
        let profile = build_candidate_profile(id, &skills, true);
        // mean weight 3.0 / 4.0
        assert_eq!(profile.maturity_signal, 0.75);
        assert_eq!(profile.skill_ranks.len(), 2);
        assert_eq!(profile.skill_ranks[&skills[1].skill_id], 1);
    }

    #[test]
    fn test_profile_without_active_resume_has_zero_signal() {
        let id = Uuid::new_v4();
        let skills = vec![skill(id, 4.0, 5)];
        let profile = build_candidate_profile(id, &skills, false);
        assert_eq!(profile.maturity_signal, 0.0);
        assert_eq!(profile.skill_ranks.len(), 1);
    }

    #[test]
    fn test_profile_without_skills_has_zero_signal() {
        let profile = build_candidate_profile(Uuid::new_v4(), &[], true);
        assert_eq!(profile.maturity_signal, 0.0);
        assert!(profile.skill_ranks.is_empty());
    }

    #[test]
    fn test_vacancy_requirements_carry_weights() {
        let vacancy_id = Uuid::new_v4();
        let rows = vec![
            VacancySkillRow {
                vacancy_id,
                skill_id: Uuid::new_v4(),
                weight: 2.0,
            },
            VacancySkillRow {
                vacancy_id,
                skill_id: Uuid::new_v4(),
                weight: 1.5,
            },
        ];
        let req = build_vacancy_requirements(vacancy_id, &rows);
        assert_eq!(req.vacancy_id, vacancy_id);
        assert_eq!(req.total_weight(), 3.5);
    }
}
