//! Recommendation engine: runs the applicable strategies over one catalog and
//! behavior snapshot and merges their candidates into a single ranking.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use chrono::{DateTime, Utc};
use rand::Rng;
use tracing::debug;

use super::bundles::{Bundle, BundleGenerator};
use super::collaborative::{CollaborativeFilter, CollaborativeStrategy, TimeDecay};
use super::features::{normalize_catalog, FeatureVector};
use super::graph::BehaviorGraph;
use super::popularity::{
    category_popular, complementary, derivative, max_sales, normalized_rating, normalized_sales,
    trending, user_interest_tags,
};
use super::profile::{
    recent_category_picks, user_profile, PICKS_PER_RECENT_CATEGORY, RECENT_EVENT_WINDOW,
};
use super::random_walk::{ProductGraph, RandomWalk};
use super::similarity::SimilarityScorer;
use super::types::{
    rank_descending, Recommendation, RecommendationContext, ScoredProduct, SimilarityScore,
    Strategy,
};
use super::{POPULARITY_WEIGHT, RATING_WEIGHT, TAG_AFFINITY_WEIGHT};
use crate::config::RecommenderConfig;
use crate::domain::behavior::{validate_events, BehaviorEvent, UserId};
use crate::domain::product::{Product, ProductId};
use crate::errors::DomainError;

#[derive(Debug, Clone, Default)]
pub struct RecommendationEngine {
    config: RecommenderConfig,
}

impl RecommendationEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: RecommenderConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RecommenderConfig {
        &self.config
    }

    fn scorer(&self) -> SimilarityScorer {
        SimilarityScorer::with_weights(self.config.similarity)
    }

    fn decay(&self, as_of: Option<DateTime<Utc>>) -> Option<TimeDecay> {
        let decay_days = self.config.collaborative.decay_days?;
        Some(TimeDecay { decay_days, as_of: as_of.unwrap_or_else(Utc::now) })
    }

    /// Most similar products to `product_id`, best first.
    pub fn similar_products(
        &self,
        product_id: &ProductId,
        catalog: &[Product],
        limit: usize,
    ) -> Result<Vec<SimilarityScore>, DomainError> {
        if catalog.is_empty() {
            return Ok(Vec::new());
        }
        let features = normalize_catalog(catalog)?;
        let target = find_target(&features, product_id)?;

        let scores = self.scorer().find_most_similar(target, &features, limit);
        debug!(
            event_name = "recommend.similar.completed",
            product_id = %product_id,
            candidates = scores.len(),
            "similar products scored"
        );
        Ok(scores)
    }

    /// Collaborative candidates for `user`. A user without recorded behavior
    /// gets an empty list.
    pub fn collaborative(
        &self,
        user: &UserId,
        catalog: &[Product],
        events: &[BehaviorEvent],
        limit: usize,
        strategy: CollaborativeStrategy,
        as_of: Option<DateTime<Utc>>,
    ) -> Result<Vec<ScoredProduct>, DomainError> {
        let features = normalize_catalog(catalog)?;
        validate_events(events)?;

        let graph = BehaviorGraph::build(events);
        let filter = CollaborativeFilter::new(&graph, events).with_decay(self.decay(as_of));
        let known: BTreeSet<&ProductId> = features.iter().map(|product| &product.id).collect();

        let mut scores: Vec<ScoredProduct> = filter
            .recommend(user, strategy)
            .into_iter()
            .filter(|candidate| known.contains(&candidate.product_id))
            .collect();
        scores.truncate(limit);

        debug!(
            event_name = "recommend.collaborative.completed",
            user_id = %user,
            strategy = ?strategy,
            graph_users = graph.user_count(),
            candidates = scores.len(),
            "collaborative candidates scored"
        );
        Ok(scores)
    }

    /// Candidates reached by one bounded random walk from `product_id`.
    pub fn graph_recommendations<R: Rng + ?Sized>(
        &self,
        product_id: &ProductId,
        catalog: &[Product],
        events: &[BehaviorEvent],
        limit: usize,
        rng: &mut R,
    ) -> Result<Vec<ScoredProduct>, DomainError> {
        if catalog.is_empty() {
            return Ok(Vec::new());
        }
        let features = normalize_catalog(catalog)?;
        validate_events(events)?;
        find_target(&features, product_id)?;

        let graph = ProductGraph::build(&features, events);
        let mut visits = RandomWalk::new(self.config.max_walk_depth).walk(&graph, product_id, rng);
        visits.truncate(limit);

        debug!(
            event_name = "recommend.graph.completed",
            product_id = %product_id,
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            candidates = visits.len(),
            "random walk finished"
        );
        Ok(visits)
    }

    pub fn bundles(&self, catalog: &[Product]) -> Result<Vec<Bundle>, DomainError> {
        let bundles =
            BundleGenerator::new(self.scorer(), self.config.bundle_discount_percent).generate(catalog)?;
        debug!(event_name = "recommend.bundles.completed", bundles = bundles.len(), "bundles generated");
        Ok(bundles)
    }

    /// Ranked product ids for `context`, at most `limit` of them.
    pub fn recommend(
        &self,
        context: &RecommendationContext,
        catalog: &[Product],
        events: &[BehaviorEvent],
        limit: usize,
    ) -> Result<Vec<ProductId>, DomainError> {
        Ok(self
            .recommend_detailed(context, catalog, events, limit)?
            .into_iter()
            .map(|recommendation| recommendation.product_id)
            .collect())
    }

    /// Merges every applicable strategy into deduplicated recommendations
    /// ranked by composite score.
    pub fn recommend_detailed(
        &self,
        context: &RecommendationContext,
        catalog: &[Product],
        events: &[BehaviorEvent],
        limit: usize,
    ) -> Result<Vec<Recommendation>, DomainError> {
        if catalog.is_empty() {
            return Ok(Vec::new());
        }
        let mut features = normalize_catalog(catalog)?;
        features.sort_by(|a, b| a.id.cmp(&b.id));
        validate_events(events)?;

        let target = match &context.target_product {
            Some(product_id) => Some(find_target(&features, product_id)?),
            None => None,
        };

        let mut rng = context.rng();
        let jitter: HashMap<&ProductId, f64> = features
            .iter()
            .map(|product| (&product.id, draw_jitter(&mut rng, self.config.jitter)))
            .collect();

        let behavior = BehaviorGraph::build(events);
        let filter =
            CollaborativeFilter::new(&behavior, events).with_decay(self.decay(context.as_of));

        let scorer = self.scorer();
        let mut candidates: Vec<(Strategy, Vec<ScoredProduct>)> = Vec::new();
        if let Some(target) = target {
            let walk_graph = ProductGraph::build(&features, events);
            candidates.push((
                Strategy::Similarity,
                scorer.find_most_similar(target, &features, features.len()),
            ));
            candidates.push((
                Strategy::RandomWalk,
                RandomWalk::new(self.config.max_walk_depth).walk(&walk_graph, &target.id, &mut rng),
            ));
            candidates.push((Strategy::TwoHop, behavior.two_hop_scores(&target.id)));
            candidates.push((Strategy::CategoryPopular, category_popular(target, &features)));
            candidates
                .push((Strategy::Complementary, complementary(target, &features, &self.config.complements)));
            candidates.push((Strategy::Derivative, derivative(target, &features)));
        }
        // Collaborative filtering only ever runs for a known shopper.
        if let Some(user) = &context.user_id {
            candidates.push((Strategy::UserBased, filter.user_based(user)));
            let item_based = match target {
                Some(target) => filter.item_based(&target.id),
                None => filter.item_based_for_user(user),
            };
            candidates.push((Strategy::ItemBased, item_based));
            candidates.push((Strategy::UserProfile, user_profile(&scorer, user, events, &features)));
            candidates.push((
                Strategy::RecentCategory,
                recent_category_picks(
                    user,
                    events,
                    &features,
                    RECENT_EVENT_WINDOW,
                    PICKS_PER_RECENT_CATEGORY,
                ),
            ));
        }

        let mut excluded: BTreeSet<&ProductId> = BTreeSet::new();
        if let Some(target) = target {
            excluded.insert(&target.id);
        }
        if let Some(own) = context.user_id.as_ref().and_then(|user| behavior.products_of(user)) {
            excluded.extend(own.iter());
        }

        let index: HashMap<&ProductId, &FeatureVector> =
            features.iter().map(|product| (&product.id, product)).collect();
        let keep = |candidate: &ScoredProduct| {
            index.contains_key(&candidate.product_id) && !excluded.contains(&candidate.product_id)
        };
        for (_, list) in candidates.iter_mut() {
            list.retain(|candidate| keep(candidate));
        }

        if candidates.iter().all(|(_, list)| list.is_empty()) {
            let mut fallback = trending(&features, self.config.trending_per_category);
            fallback.retain(|candidate| keep(candidate));
            candidates = vec![(Strategy::Trending, fallback)];
        }

        let interests: BTreeSet<String> = context
            .user_id
            .as_ref()
            .map(|user| user_interest_tags(user, events, &features))
            .unwrap_or_default()
            .into_iter()
            .map(|(tag, _)| tag)
            .collect();
        let top_sales = max_sales(&features);

        let mut merged: BTreeMap<ProductId, Recommendation> = BTreeMap::new();
        for (strategy, list) in &candidates {
            debug!(
                event_name = "recommend.aggregate.strategy",
                strategy = %strategy,
                candidates = list.len(),
                "strategy candidates collected"
            );

            let strategy_max = list.iter().map(|candidate| candidate.score).fold(0.0, f64::max);
            let weight = self.config.strategies.weight_for(*strategy);

            for candidate in list {
                let Some(product) = index.get(&candidate.product_id) else {
                    continue;
                };
                let normalized = if strategy_max > 0.0 { candidate.score / strategy_max } else { 0.0 };
                let composite = POPULARITY_WEIGHT * normalized_sales(product, top_sales)
                    + RATING_WEIGHT * normalized_rating(product)
                    + weight * normalized
                    + TAG_AFFINITY_WEIGHT * tag_affinity(product, &interests)
                    + jitter.get(&product.id).copied().unwrap_or(0.0);

                let entry = merged.entry(candidate.product_id.clone()).or_insert_with(|| Recommendation {
                    product_id: candidate.product_id.clone(),
                    composite_score: composite,
                    strategies: BTreeSet::new(),
                });
                entry.composite_score = entry.composite_score.max(composite);
                entry.strategies.insert(*strategy);
            }
        }

        let mut ranked: Vec<Recommendation> = merged.into_values().collect();
        ranked.sort_by(|a, b| {
            b.composite_score
                .total_cmp(&a.composite_score)
                .then_with(|| a.product_id.cmp(&b.product_id))
        });
        ranked.truncate(limit);

        debug!(
            event_name = "recommend.aggregate.completed",
            target = context.target_product.as_ref().map(ProductId::as_str).unwrap_or("none"),
            user = context.user_id.as_ref().map(UserId::as_str).unwrap_or("anonymous"),
            strategies = candidates.len(),
            returned = ranked.len(),
            "recommendations ranked"
        );
        Ok(ranked)
    }

    /// Full catalog records for `recommendations`, in ranking order. Ids
    /// missing from the catalog are skipped.
    pub fn resolve(&self, recommendations: &[Recommendation], catalog: &[Product]) -> Vec<Product> {
        let by_id: HashMap<&ProductId, &Product> =
            catalog.iter().map(|product| (&product.id, product)).collect();
        recommendations
            .iter()
            .filter_map(|recommendation| by_id.get(&recommendation.product_id).map(|p| (*p).clone()))
            .collect()
    }
}

fn find_target<'a>(
    features: &'a [FeatureVector],
    product_id: &ProductId,
) -> Result<&'a FeatureVector, DomainError> {
    features
        .iter()
        .find(|product| &product.id == product_id)
        .ok_or_else(|| DomainError::product_not_found(product_id.as_str()))
}

fn draw_jitter<R: Rng + ?Sized>(rng: &mut R, bound: f64) -> f64 {
    if bound > 0.0 {
        rng.gen_range(0.0..bound)
    } else {
        0.0
    }
}

/// Share of the product's tags the user has shown interest in.
fn tag_affinity(product: &FeatureVector, interests: &BTreeSet<String>) -> f64 {
    if product.tags.is_empty() || interests.is_empty() {
        return 0.0;
    }
    let matching = product.tags.iter().filter(|tag| interests.contains(*tag)).count();
    matching as f64 / product.tags.len() as f64
}
