//! Bipartite user ↔ product graph built from a behavior log snapshot

use std::collections::{BTreeMap, BTreeSet};

use super::types::{rank_descending, ScoredProduct};
use crate::domain::behavior::{BehaviorEvent, UserId};
use crate::domain::product::ProductId;

/// Adjacency sets in both directions. Built fresh for every request and never
/// mutated afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BehaviorGraph {
    user_products: BTreeMap<UserId, BTreeSet<ProductId>>,
    product_users: BTreeMap<ProductId, BTreeSet<UserId>>,
}

impl BehaviorGraph {
    pub fn build(events: &[BehaviorEvent]) -> Self {
        let mut graph = Self::default();
        for event in events {
            graph
                .user_products
                .entry(event.user_id.clone())
                .or_default()
                .insert(event.product_id.clone());
            graph
                .product_users
                .entry(event.product_id.clone())
                .or_default()
                .insert(event.user_id.clone());
        }
        graph
    }

    pub fn products_of(&self, user: &UserId) -> Option<&BTreeSet<ProductId>> {
        self.user_products.get(user)
    }

    pub fn users_of(&self, product: &ProductId) -> Option<&BTreeSet<UserId>> {
        self.product_users.get(product)
    }

    pub fn user_products(&self) -> &BTreeMap<UserId, BTreeSet<ProductId>> {
        &self.user_products
    }

    pub fn product_users(&self) -> &BTreeMap<ProductId, BTreeSet<UserId>> {
        &self.product_users
    }

    pub fn user_count(&self) -> usize {
        self.user_products.len()
    }

    pub fn product_count(&self) -> usize {
        self.product_users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.user_products.is_empty()
    }

    /// Two-step propagation product → users → products. The audience of
    /// `product` shares one unit of score equally and each member spreads their
    /// share evenly over everything they engaged with.
    pub fn two_hop_scores(&self, product: &ProductId) -> Vec<ScoredProduct> {
        let Some(audience) = self.users_of(product) else {
            return Vec::new();
        };
        let share = 1.0 / audience.len() as f64;

        let mut scores: BTreeMap<&ProductId, f64> = BTreeMap::new();
        for user in audience {
            let Some(products) = self.products_of(user) else {
                continue;
            };
            let spread = share / products.len() as f64;
            for other in products.iter().filter(|other| *other != product) {
                *scores.entry(other).or_insert(0.0) += spread;
            }
        }

        let mut ranked: Vec<ScoredProduct> =
            scores.into_iter().map(|(id, score)| ScoredProduct::new(id.clone(), score)).collect();
        rank_descending(&mut ranked);
        ranked
    }
}

/// `|a ∩ b| / |a ∪ b|`, defined as 0 when both sets are empty.
pub fn jaccard<T: Ord>(a: &BTreeSet<T>, b: &BTreeSet<T>) -> f64 {
    let common = a.intersection(b).count();
    let union = a.len() + b.len() - common;
    if union == 0 {
        0.0
    } else {
        common as f64 / union as f64
    }
}
