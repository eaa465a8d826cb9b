//! Match scoring: a pluggable scorer that measures a candidate against a vacancy.
//!
//! Default: `WeightedSkillScorer` (pure, deterministic, no I/O).
//! `AppState` holds an `Arc<dyn MatchScorer>`, so the ranking handlers never
//! depend on a concrete backend.
//!
//! Inputs are immutable snapshots built by `matching::profile`; the scorer
//! never reaches into storage.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const DEFAULT_MATURITY_WEIGHT: f64 = 0.3;

/// Highest candidate skill rank.
pub const MAX_RANK: i16 = 5;

/// Largest resume digital-maturity score; the candidate signal is divided by it.
pub const MAX_MATURITY_SCORE: f64 = 4.0;

// ────────────────────────────────────────────────────────────────────────────
// Input snapshots
// ────────────────────────────────────────────────────────────────────────────

/// Blend factor between skill match and the candidate's maturity signal.
/// Always within `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MaturityWeight(f64);

impl MaturityWeight {
    /// Clamps into `[0, 1]`. Non-finite values fall back to the default.
    pub fn new(value: f64) -> Self {
        if value.is_finite() {
            Self(value.clamp(0.0, 1.0))
        } else {
            Self(DEFAULT_MATURITY_WEIGHT)
        }
    }

    /// Parses a raw query value. A missing value yields `when_absent`;
    /// malformed or non-finite input always yields `DEFAULT_MATURITY_WEIGHT`.
    pub fn parse(raw: Option<&str>, when_absent: f64) -> Self {
        let Some(raw) = raw else {
            return Self::new(when_absent);
        };
        match raw.trim().parse::<f64>() {
            Ok(v) if v.is_finite() => Self::new(v),
            _ => Self::default(),
        }
    }

    pub fn value(self) -> f64 {
        self.0
    }
}

impl Default for MaturityWeight {
    fn default() -> Self {
        Self(DEFAULT_MATURITY_WEIGHT)
    }
}

/// Everything the scorer knows about a candidate.
#[derive(Debug, Clone, Default)]
pub struct CandidateProfile {
    pub candidate_id: Uuid,
    /// skill_id → rank (1–5). At most one rank per skill.
    pub skill_ranks: HashMap<Uuid, i16>,
    /// Normalised digital-maturity proxy in `[0, 1]`.
    pub maturity_signal: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RequiredSkill {
    pub skill_id: Uuid,
    pub weight: f64,
}

/// The weighted skill set a vacancy requires.
#[derive(Debug, Clone, Default)]
pub struct VacancyRequirements {
    pub vacancy_id: Uuid,
    pub skills: Vec<RequiredSkill>,
}

impl VacancyRequirements {
    pub fn total_weight(&self) -> f64 {
        self.skills.iter().map(|s| sanitize_weight(s.weight)).sum()
    }
}

/// Score together with the terms it was blended from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchBreakdown {
    pub candidate_id: Uuid,
    pub vacancy_id: Uuid,
    pub skill_match: f64,
    pub maturity_signal: f64,
    pub maturity_weight: f64,
    pub score: f64,
    pub scorer_backend: String,
}

// ────────────────────────────────────────────────────────────────────────────
// Trait definition
// ────────────────────────────────────────────────────────────────────────────

/// Implement this to swap scoring backends without touching the handlers.
pub trait MatchScorer: Send + Sync {
    fn backend(&self) -> &'static str;

    fn breakdown(
        &self,
        candidate: &CandidateProfile,
        vacancy: &VacancyRequirements,
        maturity_weight: MaturityWeight,
    ) -> MatchBreakdown;

    fn score(
        &self,
        candidate: &CandidateProfile,
        vacancy: &VacancyRequirements,
        maturity_weight: MaturityWeight,
    ) -> f64 {
        self.breakdown(candidate, vacancy, maturity_weight).score
    }
}

/// Weighted skill overlap blended with the candidate maturity signal.
///
/// 1. skill_match = Σ(rank/5 × weight) / Σ(weight) over required skills,
///    a missing rank contributing 0
/// 2. score = (1 − w) × skill_match + w × maturity_signal
/// 3. rounded to 3 decimals
///
/// A vacancy whose required weights sum to 0 scores exactly 0.
pub struct WeightedSkillScorer;

impl MatchScorer for WeightedSkillScorer {
    fn backend(&self) -> &'static str {
        "weighted_skill"
    }

    fn breakdown(
        &self,
        candidate: &CandidateProfile,
        vacancy: &VacancyRequirements,
        maturity_weight: MaturityWeight,
    ) -> MatchBreakdown {
        let maturity_signal = clamp_unit(candidate.maturity_signal);
        let (skill_match, score) = match skill_match(candidate, vacancy) {
            Some(skill_match) => (
                round3(skill_match),
                blend(skill_match, maturity_signal, maturity_weight),
            ),
            None => (0.0, 0.0),
        };

        MatchBreakdown {
            candidate_id: candidate.candidate_id,
            vacancy_id: vacancy.vacancy_id,
            skill_match,
            maturity_signal: round3(maturity_signal),
            maturity_weight: maturity_weight.value(),
            score,
            scorer_backend: self.backend().to_string(),
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Core arithmetic
// ────────────────────────────────────────────────────────────────────────────

/// Maps a rank onto `[0, 1]`; 0 means "not ranked".
pub fn normalized_rank(rank: i16) -> f64 {
    f64::from(rank.clamp(0, MAX_RANK)) / f64::from(MAX_RANK)
}

/// Weighted skill overlap, or `None` when the vacancy carries no weight.
pub fn skill_match(candidate: &CandidateProfile, vacancy: &VacancyRequirements) -> Option<f64> {
    let total_weight = vacancy.total_weight();
    if total_weight <= 0.0 {
        return None;
    }

    let matched: f64 = vacancy
        .skills
        .iter()
        .map(|required| {
            let rank = candidate
                .skill_ranks
                .get(&required.skill_id)
                .copied()
                .unwrap_or(0);
            normalized_rank(rank) * sanitize_weight(required.weight)
        })
        .sum();

    Some(clamp_unit(matched / total_weight))
}

fn blend(skill_match: f64, maturity_signal: f64, maturity_weight: MaturityWeight) -> f64 {
    let w = maturity_weight.value();
    clamp_unit(round3((1.0 - w) * skill_match + w * maturity_signal))
}

/// Candidate maturity signal from an active resume's digital-maturity score.
pub fn maturity_signal(resume_score: f64) -> f64 {
    clamp_unit(resume_score / MAX_MATURITY_SCORE)
}

/// Resume digital-maturity score: mean weight of the candidate's ranked
/// skills, rounded to 2 decimals. 0 when the candidate has no skills.
pub fn resume_maturity_score(skill_weights: &[f64]) -> f64 {
    if skill_weights.is_empty() {
        return 0.0;
    }
    let mean = skill_weights.iter().map(|w| sanitize_weight(*w)).sum::<f64>()
        / skill_weights.len() as f64;
    (mean * 100.0).round() / 100.0
}

pub fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

fn sanitize_weight(weight: f64) -> f64 {
    if weight.is_finite() {
        weight.max(0.0)
    } else {
        0.0
    }
}

fn clamp_unit(value: f64) -> f64 {
    if value.is_finite() {
        value.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(ranks: &[(Uuid, i16)], maturity_signal: f64) -> CandidateProfile {
        CandidateProfile {
            candidate_id: Uuid::new_v4(),
            skill_ranks: ranks.iter().copied().collect(),
            maturity_signal,
        }
    }

    fn vacancy(skills: &[(Uuid, f64)]) -> VacancyRequirements {
        VacancyRequirements {
            vacancy_id: Uuid::new_v4(),
            skills: skills
                .iter()
                .map(|&(skill_id, weight)| RequiredSkill { skill_id, weight })
                .collect(),
        }
    }

    #[test]
    fn test_worked_example_rounds_to_0_617() {
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        let c = candidate(&[(a, 5)], 0.5);
        let v = vacancy(&[(a, 2.0), (b, 1.0)]);

        let report = WeightedSkillScorer.breakdown(&c, &v, MaturityWeight::new(0.3));
        assert_eq!(report.skill_match, 0.667);
        assert_eq!(report.score, 0.617);
    }

    #[test]
    fn test_zero_total_weight_scores_zero() {
        let a = Uuid::new_v4();
        let c = candidate(&[(a, 5)], 1.0);
        let v = vacancy(&[(a, 0.0)]);
        assert_eq!(WeightedSkillScorer.score(&c, &v, MaturityWeight::default()), 0.0);
    }

    #[test]
    fn test_vacancy_without_skills_scores_zero_even_with_maturity() {
        let c = candidate(&[], 1.0);
        let v = vacancy(&[]);
        let report = WeightedSkillScorer.breakdown(&c, &v, MaturityWeight::new(1.0));
        assert_eq!(report.score, 0.0);
        assert_eq!(report.skill_match, 0.0);
    }

    #[test]
    fn test_all_rank_five_is_full_skill_match() {
        let ids: Vec<Uuid> = (0..4).map(|_| Uuid::new_v4()).collect();
        let ranks: Vec<_> = ids.iter().map(|id| (*id, 5)).collect();
        let skills: Vec<_> = ids.iter().zip([0.5, 1.0, 2.0, 3.5]).map(|(id, w)| (*id, w)).collect();

        let c = candidate(&ranks, 0.0);
        let v = vacancy(&skills);
        assert_eq!(skill_match(&c, &v), Some(1.0));
        assert_eq!(WeightedSkillScorer.score(&c, &v, MaturityWeight::new(0.0)), 1.0);
    }

    #[test]
    fn test_missing_skill_contributes_zero() {
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        let c = candidate(&[(b, 5)], 0.0);
        let v = vacancy(&[(a, 1.0)]);
        assert_eq!(skill_match(&c, &v), Some(0.0));
    }

    #[test]
    fn test_extra_candidate_skills_are_ignored() {
        let (a, extra) = (Uuid::new_v4(), Uuid::new_v4());
        let c = candidate(&[(a, 3), (extra, 5)], 0.0);
        let v = vacancy(&[(a, 1.0)]);
        let sm = skill_match(&c, &v).unwrap();
        assert!((sm - 0.6).abs() < 1e-9, "skill_match was {sm}");
    }

    #[test]
    fn test_score_stays_in_unit_interval() {
        let ids: Vec<Uuid> = (0..3).map(|_| Uuid::new_v4()).collect();
        for rank in 0..=MAX_RANK {
            for signal in [0.0, 0.25, 0.5, 1.0] {
                for w in [0.0, 0.3, 0.7, 1.0] {
                    for weights in [[0.0, 0.0, 1.0], [1.0, 2.0, 3.0], [10.0, 0.1, 0.0]] {
                        let c = candidate(&[(ids[0], rank), (ids[1], rank)], signal);
                        let skills: Vec<_> =
                            ids.iter().zip(weights).map(|(id, w)| (*id, w)).collect();
                        let v = vacancy(&skills);
                        let s = WeightedSkillScorer.score(&c, &v, MaturityWeight::new(w));
                        assert!((0.0..=1.0).contains(&s), "score {s} out of range");
                    }
                }
            }
        }
    }

    #[test]
    fn test_maturity_weight_one_uses_only_signal() {
        let a = Uuid::new_v4();
        let c = candidate(&[], 0.42);
        let v = vacancy(&[(a, 1.0)]);
        assert_eq!(WeightedSkillScorer.score(&c, &v, MaturityWeight::new(1.0)), 0.42);
    }

    #[test]
    fn test_maturity_weight_parse_falls_back() {
        assert_eq!(MaturityWeight::parse(None, 0.3).value(), 0.3);
        assert_eq!(MaturityWeight::parse(Some("abc"), 0.3).value(), 0.3);
        assert_eq!(MaturityWeight::parse(Some("NaN"), 0.3).value(), 0.3);
        assert_eq!(MaturityWeight::parse(Some(" 0.5 "), 0.3).value(), 0.5);
    }

    #[test]
    fn test_malformed_maturity_weight_ignores_configured_default() {
        assert_eq!(MaturityWeight::parse(None, 0.5).value(), 0.5);
        assert_eq!(MaturityWeight::parse(Some("zz"), 0.5).value(), DEFAULT_MATURITY_WEIGHT);
        assert_eq!(MaturityWeight::parse(Some("inf"), 0.5).value(), DEFAULT_MATURITY_WEIGHT);
        assert_eq!(MaturityWeight::parse(Some("0.8"), 0.5).value(), 0.8);
    }

    #[test]
    fn test_maturity_weight_is_clamped() {
        assert_eq!(MaturityWeight::parse(Some("1.7"), 0.3).value(), 1.0);
        assert_eq!(MaturityWeight::parse(Some("-2"), 0.3).value(), 0.0);
        assert_eq!(MaturityWeight::new(f64::INFINITY).value(), DEFAULT_MATURITY_WEIGHT);
    }

    #[test]
    fn test_maturity_signal_normalised_and_clamped() {
        assert_eq!(maturity_signal(2.0), 0.5);
        assert_eq!(maturity_signal(9.0), 1.0);
        assert_eq!(maturity_signal(-1.0), 0.0);
    }

    #[test]
    fn test_resume_maturity_score_mean_rounded() {
        assert_eq!(resume_maturity_score(&[]), 0.0);
        assert_eq!(resume_maturity_score(&[1.0, 2.0, 2.0]), 1.67);
    }

    #[test]
    fn test_normalized_rank_bounds() {
        assert_eq!(normalized_rank(1), 0.2);
        assert_eq!(normalized_rank(5), 1.0);
        assert_eq!(normalized_rank(0), 0.0);
        assert_eq!(normalized_rank(9), 1.0);
    }

    #[test]
    fn test_scorer_backend_label() {
        let report = WeightedSkillScorer.breakdown(
            &CandidateProfile::default(),
            &VacancyRequirements::default(),
            MaturityWeight::default(),
        );
        assert_eq!(report.scorer_backend, "weighted_skill");
    }
}
