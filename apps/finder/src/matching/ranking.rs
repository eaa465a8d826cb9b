//! Annotates items with a match score and orders them best-first.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An item with the score it was ranked by.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ranked<T> {
    #[serde(flatten)]
    pub item: T,
    pub match_score: f64,
}

impl<T> Ranked<T> {
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Ranked<U> {
        Ranked {
            item: f(self.item),
            match_score: self.match_score,
        }
    }
}

/// Scores every item and sorts by descending score. Equal scores are
/// ordered by ascending id so pages stay stable between requests.
pub fn rank_by_score<T>(
    items: Vec<T>,
    id_of: impl Fn(&T) -> Uuid,
    score_of: impl Fn(&T) -> f64,
) -> Vec<Ranked<T>> {
    let mut ranked: Vec<(Uuid, Ranked<T>)> = items
        .into_iter()
        .map(|item| {
            let match_score = score_of(&item);
            (id_of(&item), Ranked { item, match_score })
        })
        .collect();

    ranked.sort_by(|(a_id, a), (b_id, b)| {
        b.match_score
            .total_cmp(&a.match_score)
            .then_with(|| a_id.cmp(b_id))
    });

    ranked.into_iter().map(|(_, r)| r).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone)]
    struct Item {
        id: Uuid,
        score: f64,
    }

    #[test]
    fn test_sorted_descending() {
        let items = vec![
            Item { id: Uuid::new_v4(), score: 0.2 },
            Item { id: Uuid::new_v4(), score: 0.9 },
            Item { id: Uuid::new_v4(), score: 0.5 },
        ];
        let ranked = rank_by_score(items, |i| i.id, |i| i.score);
        let scores: Vec<f64> = ranked.iter().map(|r| r.match_score).collect();
        assert_eq!(scores, vec![0.9, 0.5, 0.2]);
    }

    #[test]
    fn test_ties_broken_by_id() {
        let low = Uuid::from_u128(1);
        let high = Uuid::from_u128(2);
        let items = vec![Item { id: high, score: 0.5 }, Item { id: low, score: 0.5 }];
        let ranked = rank_by_score(items, |i| i.id, |i| i.score);
        assert_eq!(ranked[0].item.id, low);
        assert_eq!(ranked[1].item.id, high);
    }

    #[test]
    fn test_empty_input() {
        let ranked = rank_by_score(Vec::<Item>::new(), |i| i.id, |i| i.score);
        assert!(ranked.is_empty());
    }

    #[test]
    fn test_map_keeps_score() {
        let ranked = Ranked { item: 3_u32, match_score: 0.25 }.map(|n| n * 2);
        assert_eq!(ranked.item, 6);
        assert_eq!(ranked.match_score, 0.25);
    }
}
