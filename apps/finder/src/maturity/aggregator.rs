use serde::Serialize;

/// Upper bounds of the weighted answer score for tiers 1–3; anything above is tier 4.
const TIER_BOUNDS: [(f64, u8); 3] = [(0.25, 1), (0.50, 2), (0.75, 3)];

pub const MAX_TIER: u8 = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MaturityTier {
    NotAssessed,
    Initial,
    Developing,
    Established,
    Advanced,
}

impl MaturityTier {
    pub fn from_level(level: u8) -> Self {
        match level {
            0 => MaturityTier::NotAssessed,
            1 => MaturityTier::Initial,
            2 => MaturityTier::Developing,
            3 => MaturityTier::Established,
            _ => MaturityTier::Advanced,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            MaturityTier::NotAssessed => "not assessed",
            MaturityTier::Initial => "initial",
            MaturityTier::Developing => "developing",
            MaturityTier::Established => "established",
            MaturityTier::Advanced => "advanced",
        }
    }
}

/// Weighted mean of answer values, or `None` when there is nothing to weigh.
/// Each pair is `(question_weight, answer_value)`.
pub fn weighted_score(answers: &[(f64, f64)]) -> Option<f64> {
    let total_weight: f64 = answers.iter().map(|(w, _)| w.max(0.0)).sum();
    if answers.is_empty() || total_weight <= 0.0 || !total_weight.is_finite() {
        return None;
    }

    let weighted: f64 = answers
        .iter()
        .map(|(w, v)| v.clamp(0.0, 1.0) * w.max(0.0))
        .sum();
    Some(weighted / total_weight)
}

pub fn tier_for(weighted: f64) -> u8 {
    TIER_BOUNDS
        .iter()
        .find(|(bound, _)| weighted <= *bound)
        .map(|(_, tier)| *tier)
        .unwrap_or(MAX_TIER)
}

/// Company maturity level in `{0, 1, 2, 3, 4}`.
/// 0 when there are no answers or every question weight is 0.
pub fn recalc_maturity(answers: &[(f64, f64)]) -> u8 {
    weighted_score(answers).map_or(0, tier_for)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_answers_is_level_zero() {
        assert_eq!(recalc_maturity(&[]), 0);
    }

    #[test]
    fn test_zero_weights_is_level_zero() {
        assert_eq!(recalc_maturity(&[(0.0, 1.0), (0.0, 0.8)]), 0);
    }

    #[test]
    fn test_equal_weights_low_answers_tier_one() {
        // (0.1 + 0.3 + 0.2) / 3 = 0.2
        assert_eq!(recalc_maturity(&[(1.0, 0.1), (1.0, 0.3), (1.0, 0.2)]), 1);
    }

    #[test]
    fn test_high_answers_tier_four() {
        assert_eq!(recalc_maturity(&[(2.0, 0.9), (1.0, 0.9)]), 4);
    }

    #[test]
    fn test_boundaries_are_inclusive() {
        assert_eq!(tier_for(0.0), 1);
        assert_eq!(tier_for(0.25), 1);
        assert_eq!(tier_for(0.26), 2);
        assert_eq!(tier_for(0.5), 2);
        assert_eq!(tier_for(0.75), 3);
        assert_eq!(tier_for(0.76), 4);
        assert_eq!(tier_for(1.0), 4);
    }

    #[test]
    fn test_all_zero_answers_still_tier_one() {
        assert_eq!(recalc_maturity(&[(1.0, 0.0)]), 1);
    }

    #[test]
    fn test_weights_shift_the_mean() {
        // (0.2*3 + 1.0*1) / 4 = 0.4
        let score = weighted_score(&[(3.0, 0.2), (1.0, 1.0)]).unwrap();
        assert!((score - 0.4).abs() < 1e-9, "score was {score}");
        assert_eq!(recalc_maturity(&[(3.0, 0.2), (1.0, 1.0)]), 2);
    }

    #[test]
    fn test_recalc_is_idempotent() {
        let answers = [(1.0, 0.6), (2.0, 0.7), (0.5, 0.1)];
        assert_eq!(recalc_maturity(&answers), recalc_maturity(&answers));
    }

    #[test]
    fn test_tier_labels() {
        assert_eq!(MaturityTier::from_level(0).label(), "not assessed");
        assert_eq!(MaturityTier::from_level(4), MaturityTier::Advanced);
    }
}
