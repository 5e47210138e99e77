//! Product recommendation engine
//!
//! Scores products against one read-only catalog and behavior-log snapshot:
//! feature similarity, collaborative filtering over implicit feedback, random
//! walks and two-hop propagation over behavior graphs, sales-driven and
//! shopper-history picks, similarity bundles, and an aggregator that merges all
//! of them into one ranked list.

pub mod bundles;
pub mod collaborative;
pub mod engine;
pub mod features;
pub mod graph;
pub mod popularity;
pub mod profile;
pub mod random_walk;
pub mod similarity;
pub mod types;

pub use bundles::{Bundle, BundleGenerator, DEFAULT_BUNDLE_DISCOUNT_PERCENT};
pub use collaborative::{CollaborativeFilter, CollaborativeStrategy, TimeDecay};
pub use engine::RecommendationEngine;
pub use features::{normalize_catalog, FeatureVector};
pub use graph::{jaccard, BehaviorGraph};
pub use popularity::{behavior_stats, BehaviorStats, DEFAULT_TRENDING_PER_CATEGORY};
pub use profile::{PICKS_PER_RECENT_CATEGORY, RECENT_EVENT_WINDOW};
pub use random_walk::{ProductGraph, RandomWalk, DEFAULT_MAX_DEPTH};
pub use similarity::{SimilarityBreakdown, SimilarityScorer, SimilarityWeights};
pub use types::*;

use rand::Rng;

use crate::domain::behavior::{BehaviorEvent, UserId};
use crate::domain::product::{Product, ProductId};
use crate::errors::DomainError;

/// Result type for recommendation operations
pub type RecommendResult<T> = Result<T, DomainError>;

/// Default similarity sub-score weights
pub const DEFAULT_SIMILARITY_WEIGHTS: SimilarityWeights = SimilarityWeights {
    category: 0.30,
    tags: 0.20,
    price: 0.15,
    rating: 0.10,
    origin: 0.10,
    organic: 0.05,
    attributes: 0.05,
    shelf_life: 0.05,
};

/// Default per-strategy weights in the composite score
pub const DEFAULT_STRATEGY_WEIGHTS: StrategyWeights = StrategyWeights {
    similarity: 0.30,
    user_based: 0.30,
    item_based: 0.25,
    random_walk: 0.20,
    category_popular: 0.15,
    complementary: 0.10,
    derivative: 0.10,
    two_hop: 0.20,
    user_profile: 0.25,
    recent_category: 0.10,
    trending: 0.10,
};

/// Page size when the caller does not ask for one
pub const DEFAULT_LIMIT: usize = 10;

/// Upper bound (exclusive) of the per-product diversity jitter
pub const DEFAULT_JITTER: f64 = 0.1;

pub const POPULARITY_WEIGHT: f64 = 0.7;
pub const RATING_WEIGHT: f64 = 0.2;
pub const TAG_AFFINITY_WEIGHT: f64 = 0.3;

fn ids(scores: Vec<ScoredProduct>) -> Vec<ProductId> {
    scores.into_iter().map(|score| score.product_id).collect()
}

/// Ids of the `limit` products most similar to `product_id`.
pub fn get_similar_products(
    product_id: &ProductId,
    catalog: &[Product],
    limit: usize,
) -> RecommendResult<Vec<ProductId>> {
    RecommendationEngine::new().similar_products(product_id, catalog, limit).map(ids)
}

pub fn get_collaborative_recommendations(
    user_id: &UserId,
    catalog: &[Product],
    events: &[BehaviorEvent],
    limit: usize,
    strategy: CollaborativeStrategy,
) -> RecommendResult<Vec<ProductId>> {
    RecommendationEngine::new()
        .collaborative(user_id, catalog, events, limit, strategy, None)
        .map(ids)
}

pub fn get_graph_recommendations<R: Rng + ?Sized>(
    product_id: &ProductId,
    catalog: &[Product],
    events: &[BehaviorEvent],
    limit: usize,
    rng: &mut R,
) -> RecommendResult<Vec<ProductId>> {
    RecommendationEngine::new()
        .graph_recommendations(product_id, catalog, events, limit, rng)
        .map(ids)
}

pub fn get_bundles(catalog: &[Product]) -> RecommendResult<Vec<Bundle>> {
    RecommendationEngine::new().bundles(catalog)
}

pub fn recommend(
    context: &RecommendationContext,
    catalog: &[Product],
    events: &[BehaviorEvent],
    limit: usize,
) -> RecommendResult<Vec<ProductId>> {
    RecommendationEngine::new().recommend(context, catalog, events, limit)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_strategy_weights_match_named_strategies() {
        let weights = StrategyWeights::default();
        assert_eq!(weights.weight_for(Strategy::Similarity), 0.30);
        assert_eq!(weights.weight_for(Strategy::Trending), 0.10);
        assert_eq!(weights.weight_for(Strategy::UserProfile), 0.25);
        assert_eq!(weights.values().len(), 11);
    }

    #[test]
    fn free_functions_use_default_engine() {
        let catalog = vec![Product::new("1", "fruit", 10.0), Product::new("2", "fruit", 12.0)];
        let similar = get_similar_products(&ProductId::new("1"), &catalog, 5).expect("valid catalog");
        assert_eq!(similar, vec![ProductId::new("2")]);
    }
}
