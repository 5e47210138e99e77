//! Sales-driven candidate lists and per-user behavior summaries

use std::collections::{BTreeMap, HashMap};

use serde::Serialize;

use super::features::FeatureVector;
use super::types::{rank_descending, ScoredProduct};
use crate::domain::behavior::{BehaviorEvent, BehaviorKind, UserId};
use crate::domain::product::ProductId;

pub const DEFAULT_TRENDING_PER_CATEGORY: usize = 2;

pub fn max_sales(catalog: &[FeatureVector]) -> u64 {
    catalog.iter().map(|product| product.sales).max().unwrap_or(0)
}

/// `sales / max_sales`, zero when nothing has sold.
pub fn normalized_sales(product: &FeatureVector, max_sales: u64) -> f64 {
    if max_sales == 0 {
        0.0
    } else {
        product.sales as f64 / max_sales as f64
    }
}

pub fn normalized_rating(product: &FeatureVector) -> f64 {
    product.rating.map(|rating| rating / crate::domain::product::MAX_RATING).unwrap_or(0.0)
}

/// Best sellers of every category, `per_category` each, scored by sales.
pub fn trending(catalog: &[FeatureVector], per_category: usize) -> Vec<ScoredProduct> {
    let mut by_category: BTreeMap<&str, Vec<ScoredProduct>> = BTreeMap::new();
    for product in catalog {
        by_category
            .entry(product.category.as_str())
            .or_default()
            .push(ScoredProduct::new(product.id.clone(), product.sales as f64));
    }

    let mut picks: Vec<ScoredProduct> = by_category
        .into_values()
        .flat_map(|mut products| {
            rank_descending(&mut products);
            products.truncate(per_category);
            products
        })
        .collect();
    rank_descending(&mut picks);
    picks
}

/// Other products in the target's category, scored by sales.
pub fn category_popular(target: &FeatureVector, catalog: &[FeatureVector]) -> Vec<ScoredProduct> {
    let mut picks: Vec<ScoredProduct> = catalog
        .iter()
        .filter(|product| product.id != target.id && product.category == target.category)
        .map(|product| ScoredProduct::new(product.id.clone(), product.sales as f64))
        .collect();
    rank_descending(&mut picks);
    picks
}

/// Products from categories configured to pair with the target's category,
/// scored by `0.7·rating/5 + 0.3·normalized sales`.
pub fn complementary(
    target: &FeatureVector,
    catalog: &[FeatureVector],
    complements: &BTreeMap<String, Vec<String>>,
) -> Vec<ScoredProduct> {
    let Some(partners) = complements.get(&target.category) else {
        return Vec::new();
    };

    rated_by_storefront_score(catalog, |product| {
        product.id != target.id && partners.contains(&product.category)
    })
}

/// Derivative products: anything sharing the target's category or at least
/// one of its tags, scored like [`complementary`].
pub fn derivative(target: &FeatureVector, catalog: &[FeatureVector]) -> Vec<ScoredProduct> {
    rated_by_storefront_score(catalog, |product| {
        product.id != target.id
            && (product.category == target.category || product.shares_tag_with(target))
    })
}

fn rated_by_storefront_score(
    catalog: &[FeatureVector],
    include: impl Fn(&FeatureVector) -> bool,
) -> Vec<ScoredProduct> {
    let top_sales = max_sales(catalog);
    let mut picks: Vec<ScoredProduct> = catalog
        .iter()
        .filter(|product| include(product))
        .map(|product| {
            let score = 0.7 * normalized_rating(product) + 0.3 * normalized_sales(product, top_sales);
            ScoredProduct::new(product.id.clone(), score)
        })
        .collect();
    rank_descending(&mut picks);
    picks
}

/// Tags of everything `user` interacted with, most frequent first. Every event
/// counts, so repeat visits strengthen an interest.
pub fn user_interest_tags(
    user: &UserId,
    events: &[BehaviorEvent],
    catalog: &[FeatureVector],
) -> Vec<(String, usize)> {
    let index: HashMap<&ProductId, &FeatureVector> =
        catalog.iter().map(|product| (&product.id, product)).collect();

    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for event in events.iter().filter(|event| &event.user_id == user) {
        if let Some(product) = index.get(&event.product_id) {
            for tag in &product.tags {
                *counts.entry(tag.as_str()).or_insert(0) += 1;
            }
        }
    }

    let mut ranked: Vec<(String, usize)> =
        counts.into_iter().map(|(tag, count)| (tag.to_owned(), count)).collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    ranked
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BehaviorStats {
    pub view: usize,
    pub favorite: usize,
    pub cart: usize,
    pub purchase: usize,
}

impl BehaviorStats {
    pub fn total(&self) -> usize {
        self.view + self.favorite + self.cart + self.purchase
    }

    pub fn count(&self, kind: BehaviorKind) -> usize {
        match kind {
            BehaviorKind::View => self.view,
            BehaviorKind::Favorite => self.favorite,
            BehaviorKind::Cart => self.cart,
            BehaviorKind::Purchase => self.purchase,
        }
    }
}

pub fn behavior_stats(user: &UserId, events: &[BehaviorEvent]) -> BehaviorStats {
    let mut stats = BehaviorStats::default();
    for event in events.iter().filter(|event| &event.user_id == user) {
        match event.kind {
            BehaviorKind::View => stats.view += 1,
            BehaviorKind::Favorite => stats.favorite += 1,
            BehaviorKind::Cart => stats.cart += 1,
            BehaviorKind::Purchase => stats.purchase += 1,
        }
    }
    stats
}
