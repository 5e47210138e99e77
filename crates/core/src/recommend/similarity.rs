//! Pairwise product similarity
//!
//! Each sub-score is symmetric and bounded to `[0, 1]`. Only sub-scores whose
//! inputs are known on both products contribute, and the weighted sum is divided
//! by the weights actually applied, so sparse records are not penalised for what
//! the catalog never recorded.

use serde::{Deserialize, Serialize};

use super::features::FeatureVector;
use super::types::{rank_descending, SimilarityScore};

/// Weights for similarity sub-scores
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SimilarityWeights {
    /// Same category (default: 0.30)
    pub category: f64,
    /// Tag overlap (default: 0.20)
    pub tags: f64,
    /// Price proximity (default: 0.15)
    pub price: f64,
    /// Rating proximity (default: 0.10)
    pub rating: f64,
    /// Same origin place (default: 0.10)
    pub origin: f64,
    /// Same organic flag (default: 0.05)
    pub organic: f64,
    /// Agreement on local/seasonal/premium/fresh flags (default: 0.05)
    pub attributes: f64,
    /// Shelf-life proximity (default: 0.05)
    pub shelf_life: f64,
}

impl SimilarityWeights {
    pub fn total(&self) -> f64 {
        self.values().iter().map(|(_, weight)| weight).sum()
    }

    pub fn values(&self) -> [(&'static str, f64); 8] {
        [
            ("category", self.category),
            ("tags", self.tags),
            ("price", self.price),
            ("rating", self.rating),
            ("origin", self.origin),
            ("organic", self.organic),
            ("attributes", self.attributes),
            ("shelf_life", self.shelf_life),
        ]
    }

    pub fn validate(&self) -> Result<(), String> {
        if let Some((name, weight)) =
            self.values().into_iter().find(|(_, weight)| !weight.is_finite() || *weight < 0.0)
        {
            return Err(format!("similarity weight `{name}` must be a non-negative number, got {weight}"));
        }

        let total = self.total();
        if (total - 1.0).abs() > 1e-6 {
            return Err(format!("similarity weights must sum to 1.0, got {total:.4}"));
        }

        Ok(())
    }
}

impl Default for SimilarityWeights {
    fn default() -> Self {
        super::DEFAULT_SIMILARITY_WEIGHTS
    }
}

/// Sub-scores for one product pair; `None` marks a sub-score excluded from the
/// average because an input was unknown.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SimilarityBreakdown {
    pub category: f64,
    pub tags: Option<f64>,
    pub price: f64,
    pub rating: Option<f64>,
    pub origin: Option<f64>,
    pub organic: Option<f64>,
    pub attributes: Option<f64>,
    pub shelf_life: Option<f64>,
}

impl SimilarityBreakdown {
    pub fn between(a: &FeatureVector, b: &FeatureVector) -> Self {
        Self {
            category: if a.category == b.category { 1.0 } else { 0.0 },
            tags: tag_overlap(a, b),
            price: proximity(a.price, b.price),
            rating: both(a.rating, b.rating).map(|(x, y)| 1.0 - ((x - y).abs() / 5.0).min(1.0)),
            origin: both(a.origin.as_ref(), b.origin.as_ref()).map(|(x, y)| exact(x == y)),
            organic: both(a.organic, b.organic).map(|(x, y)| exact(x == y)),
            attributes: flag_agreement(&a.attribute_flags(), &b.attribute_flags()),
            shelf_life: both(a.shelf_life_days, b.shelf_life_days).map(|(x, y)| proximity(x, y)),
        }
    }

    pub fn score(&self, weights: &SimilarityWeights) -> f64 {
        let parts = [
            (Some(self.category), weights.category),
            (self.tags, weights.tags),
            (Some(self.price), weights.price),
            (self.rating, weights.rating),
            (self.origin, weights.origin),
            (self.organic, weights.organic),
            (self.attributes, weights.attributes),
            (self.shelf_life, weights.shelf_life),
        ];

        let mut weighted = 0.0;
        let mut applied = 0.0;
        for (value, weight) in parts {
            if let Some(value) = value {
                weighted += value * weight;
                applied += weight;
            }
        }

        if applied <= 0.0 {
            0.0
        } else {
            (weighted / applied).clamp(0.0, 1.0)
        }
    }
}

/// Similarity scorer with named weights
#[derive(Debug, Clone, Default)]
pub struct SimilarityScorer {
    weights: SimilarityWeights,
}

impl SimilarityScorer {
    pub fn new() -> Self {
        Self { weights: SimilarityWeights::default() }
    }

    pub fn with_weights(weights: SimilarityWeights) -> Self {
        Self { weights }
    }

    pub fn weights(&self) -> &SimilarityWeights {
        &self.weights
    }

    pub fn breakdown(&self, a: &FeatureVector, b: &FeatureVector) -> SimilarityBreakdown {
        SimilarityBreakdown::between(a, b)
    }

    pub fn similarity(&self, a: &FeatureVector, b: &FeatureVector) -> f64 {
        SimilarityBreakdown::between(a, b).score(&self.weights)
    }

    /// Top `limit` products most similar to `target`, never including the target.
    pub fn find_most_similar(
        &self,
        target: &FeatureVector,
        catalog: &[FeatureVector],
        limit: usize,
    ) -> Vec<SimilarityScore> {
        let mut scores: Vec<SimilarityScore> = catalog
            .iter()
            .filter(|candidate| candidate.id != target.id)
            .map(|candidate| SimilarityScore::new(candidate.id.clone(), self.similarity(target, candidate)))
            .collect();

        rank_descending(&mut scores);
        scores.truncate(limit);
        scores
    }
}

fn both<T>(a: Option<T>, b: Option<T>) -> Option<(T, T)> {
    a.zip(b)
}

fn exact(equal: bool) -> f64 {
    if equal {
        1.0
    } else {
        0.0
    }
}

/// `1 - |a-b| / max(a,b)`, zero when both values are zero.
fn proximity(a: f64, b: f64) -> f64 {
    let max = a.max(b);
    if max <= 0.0 {
        return 0.0;
    }
    (1.0 - (a - b).abs() / max).clamp(0.0, 1.0)
}

fn tag_overlap(a: &FeatureVector, b: &FeatureVector) -> Option<f64> {
    if a.tags.is_empty() && b.tags.is_empty() {
        return None;
    }
    let larger = a.tags.len().max(b.tags.len());
    let common = a.tags.intersection(&b.tags).count();
    Some(common as f64 / larger as f64)
}

fn flag_agreement(a: &[Option<bool>], b: &[Option<bool>]) -> Option<f64> {
    let known: Vec<bool> = a
        .iter()
        .zip(b.iter())
        .filter_map(|(x, y)| x.zip(*y).map(|(x, y)| x == y))
        .collect();

    if known.is_empty() {
        return None;
    }
    Some(known.iter().filter(|agrees| **agrees).count() as f64 / known.len() as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::product::Product;

    fn features(product: Product) -> FeatureVector {
        FeatureVector::from_product(&product).expect("valid product")
    }

    #[test]
    fn default_weights_sum_to_one() {
        assert!(SimilarityWeights::default().validate().is_ok());
        assert!((SimilarityWeights::default().total() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn invalid_weights_are_reported_by_name() {
        let weights = SimilarityWeights { origin: -0.1, ..SimilarityWeights::default() };
        let error = weights.validate().expect_err("negative weight");
        assert!(error.contains("origin"));

        let weights = SimilarityWeights { category: 0.9, ..SimilarityWeights::default() };
        assert!(weights.validate().expect_err("sum").contains("sum to 1.0"));
    }

    #[test]
    fn same_category_beats_cross_category_on_price() {
        let apple = features(Product::new("1", "fruit", 10.0));
        let pear = features(Product::new("2", "fruit", 12.0));
        let carrot = features(Product::new("3", "veg", 3.0));
        let scorer = SimilarityScorer::new();

        let top = scorer.find_most_similar(&apple, &[apple.clone(), pear.clone(), carrot], 1);
        assert_eq!(top.len(), 1);
        assert_eq!(top[0].product_id.as_str(), "2");
        assert!(top[0].score > 0.9);
    }

    #[test]
    fn identical_products_score_one() {
        let a = features(
            Product::new("1", "fruit", 4.0)
                .with_tags(["citrus"])
                .with_rating(4.0)
                .with_origin("Sicily")
                .with_organic(true)
                .with_local(true)
                .with_shelf_life_days(10.0),
        );
        let mut b = a.clone();
        b.id = "2".into();

        assert!((SimilarityScorer::new().similarity(&a, &b) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn unknown_inputs_are_excluded_rather_than_counted_as_zero() {
        let a = features(Product::new("1", "fruit", 10.0));
        let b = features(Product::new("2", "fruit", 10.0).with_origin("Spain").with_organic(true));
        let breakdown = SimilarityBreakdown::between(&a, &b);

        assert_eq!(breakdown.origin, None);
        assert_eq!(breakdown.organic, None);
        assert_eq!(breakdown.rating, None);
        assert!((SimilarityScorer::new().similarity(&a, &b) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn tag_overlap_uses_the_larger_tag_set() {
        let a = features(Product::new("1", "fruit", 1.0).with_tags(["red", "sweet"]));
        let b = features(Product::new("2", "fruit", 1.0).with_tags(["red", "sweet", "crisp", "local"]));
        let c = features(Product::new("3", "fruit", 1.0));

        assert_eq!(SimilarityBreakdown::between(&a, &b).tags, Some(0.5));
        assert_eq!(SimilarityBreakdown::between(&a, &c).tags, Some(0.0));
        assert_eq!(SimilarityBreakdown::between(&c, &c).tags, None);
    }

    #[test]
    fn zero_prices_give_zero_price_proximity() {
        let a = features(Product::new("1", "gift", 0.0));
        let b = features(Product::new("2", "gift", 0.0));
        assert_eq!(SimilarityBreakdown::between(&a, &b).price, 0.0);
    }

    #[test]
    fn attribute_flags_score_only_jointly_known_flags() {
        let a = features(Product::new("1", "veg", 2.0).with_local(true).with_fresh(true));
        let b = features(Product::new("2", "veg", 2.0).with_local(true).with_fresh(false).with_premium(true));
        assert_eq!(SimilarityBreakdown::between(&a, &b).attributes, Some(0.5));
    }

    #[test]
    fn target_is_never_returned_and_limit_is_respected() {
        let catalog: Vec<FeatureVector> = (1..=6)
            .map(|id| features(Product::new(id.to_string(), "fruit", id as f64)))
            .collect();
        let result = SimilarityScorer::new().find_most_similar(&catalog[2], &catalog, 3);

        assert_eq!(result.len(), 3);
        assert!(result.iter().all(|score| score.product_id != catalog[2].id));
    }
}
