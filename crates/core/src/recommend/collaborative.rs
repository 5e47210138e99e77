//! User-based and item-based collaborative filtering over implicit feedback

use std::collections::{BTreeMap, HashMap};
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::graph::{jaccard, BehaviorGraph};
use super::types::{rank_descending, ScoredProduct};
use crate::domain::behavior::{BehaviorEvent, UserId};
use crate::domain::product::ProductId;
use crate::errors::DomainError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollaborativeStrategy {
    User,
    Item,
}

impl FromStr for CollaborativeStrategy {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "user" => Ok(Self::User),
            "item" => Ok(Self::Item),
            other => Err(DomainError::validation(
                "collaborative.strategy",
                format!("unsupported strategy `{other}` (expected user|item)"),
            )),
        }
    }
}

/// Exponential down-weighting of old events relative to `as_of`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeDecay {
    pub decay_days: f64,
    pub as_of: DateTime<Utc>,
}

impl TimeDecay {
    /// Undated events and non-positive decay constants leave weights untouched.
    pub fn factor(&self, timestamp: Option<DateTime<Utc>>) -> f64 {
        let Some(timestamp) = timestamp else {
            return 1.0;
        };
        if self.decay_days.is_nan() || self.decay_days <= 0.0 {
            return 1.0;
        }
        let age_days = (self.as_of - timestamp).num_seconds().max(0) as f64 / 86_400.0;
        (-age_days / self.decay_days).exp()
    }
}

#[derive(Debug, Clone)]
pub struct CollaborativeFilter<'a> {
    graph: &'a BehaviorGraph,
    events: &'a [BehaviorEvent],
    decay: Option<TimeDecay>,
}

impl<'a> CollaborativeFilter<'a> {
    pub fn new(graph: &'a BehaviorGraph, events: &'a [BehaviorEvent]) -> Self {
        Self { graph, events, decay: None }
    }

    pub fn with_decay(mut self, decay: Option<TimeDecay>) -> Self {
        self.decay = decay;
        self
    }

    /// Other users ranked by Jaccard overlap with `user`; zero-overlap users are dropped.
    pub fn user_neighbors(&self, user: &UserId) -> Vec<(UserId, f64)> {
        let Some(own) = self.graph.products_of(user) else {
            return Vec::new();
        };

        let mut neighbors: Vec<(UserId, f64)> = self
            .graph
            .user_products()
            .iter()
            .filter(|(other, _)| *other != user)
            .map(|(other, products)| (other.clone(), jaccard(own, products)))
            .filter(|(_, similarity)| *similarity > 0.0)
            .collect();

        neighbors.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        neighbors
    }

    /// Products the neighbors engaged with and `user` has not, scored by
    /// `Σ similarity(user, neighbor) × behavior weight`.
    pub fn user_based(&self, user: &UserId) -> Vec<ScoredProduct> {
        let Some(own) = self.graph.products_of(user) else {
            return Vec::new();
        };

        let neighbors: HashMap<UserId, f64> = self.user_neighbors(user).into_iter().collect();
        if neighbors.is_empty() {
            return Vec::new();
        }

        let mut scores: BTreeMap<&ProductId, f64> = BTreeMap::new();
        for event in self.events {
            let Some(similarity) = neighbors.get(&event.user_id) else {
                continue;
            };
            if own.contains(&event.product_id) {
                continue;
            }

            let decay = self.decay.map(|decay| decay.factor(event.timestamp)).unwrap_or(1.0);
            *scores.entry(&event.product_id).or_insert(0.0) += similarity * event.kind.weight() * decay;
        }

        collect_ranked(scores)
    }

    /// Products whose audience overlaps with `product`'s, by Jaccard similarity.
    pub fn item_based(&self, product: &ProductId) -> Vec<ScoredProduct> {
        let Some(audience) = self.graph.users_of(product) else {
            return Vec::new();
        };

        let scores: BTreeMap<&ProductId, f64> = self
            .graph
            .product_users()
            .iter()
            .filter(|(other, _)| *other != product)
            .map(|(other, users)| (other, jaccard(audience, users)))
            .filter(|(_, similarity)| *similarity > 0.0)
            .collect();

        collect_ranked(scores)
    }

    /// Item-based candidates seeded by everything `user` engaged with: each
    /// candidate keeps its best overlap with any seed, own products excluded.
    pub fn item_based_for_user(&self, user: &UserId) -> Vec<ScoredProduct> {
        let Some(own) = self.graph.products_of(user) else {
            return Vec::new();
        };

        let mut scores: BTreeMap<ProductId, f64> = BTreeMap::new();
        for seed in own {
            for candidate in self.item_based(seed) {
                if own.contains(&candidate.product_id) {
                    continue;
                }
                let best = scores.entry(candidate.product_id).or_insert(0.0);
                *best = best.max(candidate.score);
            }
        }

        let mut ranked: Vec<ScoredProduct> =
            scores.into_iter().map(|(id, score)| ScoredProduct::new(id, score)).collect();
        rank_descending(&mut ranked);
        ranked
    }

    pub fn recommend(&self, user: &UserId, strategy: CollaborativeStrategy) -> Vec<ScoredProduct> {
        match strategy {
            CollaborativeStrategy::User => self.user_based(user),
            CollaborativeStrategy::Item => self.item_based_for_user(user),
        }
    }
}

fn collect_ranked(scores: BTreeMap<&ProductId, f64>) -> Vec<ScoredProduct> {
    let mut ranked: Vec<ScoredProduct> = scores
        .into_iter()
        .filter(|(_, score)| *score > 0.0)
        .map(|(id, score)| ScoredProduct::new(id.clone(), score))
        .collect();
    rank_descending(&mut ranked);
    ranked
}
