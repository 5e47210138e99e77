//! Types shared by the recommendation strategies

use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use crate::domain::behavior::UserId;
use crate::domain::product::ProductId;

/// A candidate product with a strategy-specific, non-normalized score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredProduct {
    pub product_id: ProductId,
    pub score: f64,
}

impl ScoredProduct {
    pub fn new(product_id: ProductId, score: f64) -> Self {
        Self { product_id, score }
    }
}

/// Pairwise similarity result; scores always lie in `[0, 1]`.
pub type SimilarityScore = ScoredProduct;

/// Sort descending by score, ties broken by ascending product id.
pub fn rank_descending(candidates: &mut [ScoredProduct]) {
    candidates.sort_by(|a, b| {
        b.score.total_cmp(&a.score).then_with(|| a.product_id.cmp(&b.product_id))
    });
}

/// Source of a candidate list merged by the aggregator
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// Feature similarity to the target product
    Similarity,
    /// Users with overlapping behavior engaged with this
    UserBased,
    /// Engaged with by the same users as the target product
    ItemBased,
    /// Reached by a random walk over the product graph
    RandomWalk,
    /// Best seller in the target's category
    CategoryPopular,
    /// Best seller in a category that pairs with the target's
    Complementary,
    /// Shares the target's category or one of its tags
    Derivative,
    /// Reached in two hops product → shopper → product
    TwoHop,
    /// Resembles what the shopper already engaged with
    UserProfile,
    /// Best seller in a category the shopper touched recently
    RecentCategory,
    /// Best seller overall, used when there is no other context
    Trending,
}

impl Strategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::Similarity => "similarity",
            Strategy::UserBased => "user_based",
            Strategy::ItemBased => "item_based",
            Strategy::RandomWalk => "random_walk",
            Strategy::CategoryPopular => "category_popular",
            Strategy::Complementary => "complementary",
            Strategy::Derivative => "derivative",
            Strategy::TwoHop => "two_hop",
            Strategy::UserProfile => "user_profile",
            Strategy::RecentCategory => "recent_category",
            Strategy::Trending => "trending",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Weight of each strategy's normalized score in the composite score
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StrategyWeights {
    pub similarity: f64,
    pub user_based: f64,
    pub item_based: f64,
    pub random_walk: f64,
    pub category_popular: f64,
    pub complementary: f64,
    pub derivative: f64,
    pub two_hop: f64,
    pub user_profile: f64,
    pub recent_category: f64,
    pub trending: f64,
}

impl StrategyWeights {
    pub fn weight_for(&self, strategy: Strategy) -> f64 {
        match strategy {
            Strategy::Similarity => self.similarity,
            Strategy::UserBased => self.user_based,
            Strategy::ItemBased => self.item_based,
            Strategy::RandomWalk => self.random_walk,
            Strategy::CategoryPopular => self.category_popular,
            Strategy::Complementary => self.complementary,
            Strategy::Derivative => self.derivative,
            Strategy::TwoHop => self.two_hop,
            Strategy::UserProfile => self.user_profile,
            Strategy::RecentCategory => self.recent_category,
            Strategy::Trending => self.trending,
        }
    }

    pub fn values(&self) -> [(&'static str, f64); 11] {
        [
            ("similarity", self.similarity),
            ("user_based", self.user_based),
            ("item_based", self.item_based),
            ("random_walk", self.random_walk),
            ("category_popular", self.category_popular),
            ("complementary", self.complementary),
            ("derivative", self.derivative),
            ("two_hop", self.two_hop),
            ("user_profile", self.user_profile),
            ("recent_category", self.recent_category),
            ("trending", self.trending),
        ]
    }
}

impl Default for StrategyWeights {
    fn default() -> Self {
        super::DEFAULT_STRATEGY_WEIGHTS
    }
}

/// Who and what a recommendation request is about
#[derive(Debug, Clone, Default)]
pub struct RecommendationContext {
    /// Product the shopper is looking at
    pub target_product: Option<ProductId>,
    /// Shopper, when signed in
    pub user_id: Option<UserId>,
    /// Fixed seed for reproducible random walks and jitter
    pub seed: Option<u64>,
    /// Reference instant for behavior time decay
    pub as_of: Option<DateTime<Utc>>,
}

impl RecommendationContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn for_product(product_id: impl Into<String>) -> Self {
        Self { target_product: Some(ProductId(product_id.into())), ..Self::default() }
    }

    pub fn for_user(user_id: impl Into<String>) -> Self {
        Self { user_id: Some(UserId(user_id.into())), ..Self::default() }
    }

    pub fn with_product(mut self, product_id: impl Into<String>) -> Self {
        self.target_product = Some(ProductId(product_id.into()));
        self
    }

    pub fn with_user(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(UserId(user_id.into()));
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_as_of(mut self, as_of: DateTime<Utc>) -> Self {
        self.as_of = Some(as_of);
        self
    }

    /// Random source for this request. Without an explicit seed each request
    /// gets a time-derived one.
    pub fn rng(&self) -> StdRng {
        let seed = self.seed.unwrap_or_else(|| {
            Utc::now().timestamp_nanos_opt().map(|nanos| nanos as u64).unwrap_or_default()
        });
        StdRng::seed_from_u64(seed)
    }
}

/// A ranked, deduplicated recommendation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub product_id: ProductId,
    pub composite_score: f64,
    pub strategies: BTreeSet<Strategy>,
}
