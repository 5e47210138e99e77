//! Candidates derived from one shopper's own history

use std::collections::{BTreeMap, BTreeSet, HashMap};

use super::features::FeatureVector;
use super::popularity::trending;
use super::similarity::SimilarityScorer;
use super::types::{rank_descending, ScoredProduct};
use crate::domain::behavior::{BehaviorEvent, UserId};
use crate::domain::product::ProductId;

/// Most recent events consulted for category picks.
pub const RECENT_EVENT_WINDOW: usize = 10;
pub const PICKS_PER_RECENT_CATEGORY: usize = 2;

/// Content score of every product `user` has not engaged with:
/// `Σ similarity(candidate, engaged) × strongest behavior weight on engaged`.
pub fn user_profile(
    scorer: &SimilarityScorer,
    user: &UserId,
    events: &[BehaviorEvent],
    catalog: &[FeatureVector],
) -> Vec<ScoredProduct> {
    let mut engaged: BTreeMap<&ProductId, f64> = BTreeMap::new();
    for event in events.iter().filter(|event| &event.user_id == user) {
        let weight = engaged.entry(&event.product_id).or_insert(0.0);
        *weight = weight.max(event.kind.weight());
    }
    if engaged.is_empty() {
        return Vec::new();
    }

    let index: HashMap<&ProductId, &FeatureVector> =
        catalog.iter().map(|product| (&product.id, product)).collect();
    let profile: Vec<(&FeatureVector, f64)> = engaged
        .iter()
        .filter_map(|(id, weight)| index.get(*id).map(|product| (*product, *weight)))
        .collect();

    let mut scores: Vec<ScoredProduct> = catalog
        .iter()
        .filter(|candidate| !engaged.contains_key(&candidate.id))
        .map(|candidate| {
            let score = profile
                .iter()
                .map(|(product, weight)| scorer.similarity(candidate, product) * weight)
                .sum::<f64>();
            ScoredProduct::new(candidate.id.clone(), score)
        })
        .filter(|candidate| candidate.score > 0.0)
        .collect();
    rank_descending(&mut scores);
    scores
}

/// Best sellers of the categories `user` touched in their `window` most recent
/// events, `per_category` each. Newer timestamps come first; undated events
/// count as oldest and later log entries win ties.
pub fn recent_category_picks(
    user: &UserId,
    events: &[BehaviorEvent],
    catalog: &[FeatureVector],
    window: usize,
    per_category: usize,
) -> Vec<ScoredProduct> {
    let mut history: Vec<(usize, &BehaviorEvent)> =
        events.iter().enumerate().filter(|(_, event)| &event.user_id == user).collect();
    history.sort_by(|(left_pos, left), (right_pos, right)| {
        right.timestamp.cmp(&left.timestamp).then_with(|| right_pos.cmp(left_pos))
    });

    let index: HashMap<&ProductId, &FeatureVector> =
        catalog.iter().map(|product| (&product.id, product)).collect();
    let categories: BTreeSet<&str> = history
        .iter()
        .take(window)
        .filter_map(|(_, event)| index.get(&event.product_id))
        .map(|product| product.category.as_str())
        .collect();
    if categories.is_empty() {
        return Vec::new();
    }

    let pool: Vec<FeatureVector> = catalog
        .iter()
        .filter(|product| categories.contains(product.category.as_str()))
        .cloned()
        .collect();
    trending(&pool, per_category)
}
