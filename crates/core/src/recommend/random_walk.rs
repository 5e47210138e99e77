//! Product co-occurrence graph and bounded random walks over it

use std::collections::{BTreeMap, BTreeSet};

use rand::Rng;

use super::features::FeatureVector;
use super::types::{rank_descending, ScoredProduct};
use crate::domain::behavior::{BehaviorEvent, UserId};
use crate::domain::product::ProductId;

pub const DEFAULT_MAX_DEPTH: usize = 3;

/// Undirected product adjacency layered from three edge sources: products
/// carted or bought by the same user, products in the same category, and
/// products sharing at least one tag.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductGraph {
    adjacency: BTreeMap<ProductId, BTreeSet<ProductId>>,
}

impl ProductGraph {
    pub fn build(catalog: &[FeatureVector], events: &[BehaviorEvent]) -> Self {
        let mut graph = Self {
            adjacency: catalog.iter().map(|product| (product.id.clone(), BTreeSet::new())).collect(),
        };

        let mut baskets: BTreeMap<&UserId, BTreeSet<&ProductId>> = BTreeMap::new();
        for event in events.iter().filter(|event| event.kind.is_commitment()) {
            if graph.adjacency.contains_key(&event.product_id) {
                baskets.entry(&event.user_id).or_default().insert(&event.product_id);
            }
        }
        for basket in baskets.values() {
            graph.connect_all(basket.iter().copied());
        }

        let mut by_category: BTreeMap<&str, BTreeSet<&ProductId>> = BTreeMap::new();
        let mut by_tag: BTreeMap<&str, BTreeSet<&ProductId>> = BTreeMap::new();
        for product in catalog {
            by_category.entry(product.category.as_str()).or_default().insert(&product.id);
            for tag in &product.tags {
                by_tag.entry(tag.as_str()).or_default().insert(&product.id);
            }
        }
        for group in by_category.values().chain(by_tag.values()) {
            graph.connect_all(group.iter().copied());
        }

        graph
    }

    fn connect_all<'p>(&mut self, members: impl Iterator<Item = &'p ProductId> + Clone) {
        for left in members.clone() {
            for right in members.clone() {
                if left == right {
                    continue;
                }
                if let Some(neighbors) = self.adjacency.get_mut(left) {
                    neighbors.insert(right.clone());
                }
            }
        }
    }

    pub fn neighbors(&self, product: &ProductId) -> Option<&BTreeSet<ProductId>> {
        self.adjacency.get(product)
    }

    pub fn node_count(&self) -> usize {
        self.adjacency.len()
    }

    pub fn edge_count(&self) -> usize {
        self.adjacency.values().map(BTreeSet::len).sum::<usize>() / 2
    }
}

#[derive(Debug, Clone, Copy)]
pub struct RandomWalk {
    max_depth: usize,
}

impl Default for RandomWalk {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_DEPTH)
    }
}

impl RandomWalk {
    pub fn new(max_depth: usize) -> Self {
        Self { max_depth }
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Walks at most `max_depth` steps from `seed`. Each step counts every
    /// unvisited neighbor as a candidate, then hops to a uniformly chosen
    /// neighbor. Stops on a revisit or a dead end. Candidates are scored by how
    /// often they were seen.
    pub fn walk<R: Rng + ?Sized>(
        &self,
        graph: &ProductGraph,
        seed: &ProductId,
        rng: &mut R,
    ) -> Vec<ScoredProduct> {
        let mut visited: BTreeSet<ProductId> = BTreeSet::new();
        let mut visits: BTreeMap<ProductId, u32> = BTreeMap::new();
        let mut current = seed.clone();

        for _ in 0..self.max_depth {
            if visited.contains(&current) {
                break;
            }
            visited.insert(current.clone());

            let neighbors = match graph.neighbors(&current) {
                Some(neighbors) if !neighbors.is_empty() => neighbors,
                _ => break,
            };

            for neighbor in neighbors {
                if neighbor != seed && !visited.contains(neighbor) {
                    *visits.entry(neighbor.clone()).or_insert(0) += 1;
                }
            }

            let step = rng.gen_range(0..neighbors.len());
            match neighbors.iter().nth(step) {
                Some(next) => current = next.clone(),
                None => break,
            }
        }

        let mut ranked: Vec<ScoredProduct> = visits
            .into_iter()
            .map(|(id, count)| ScoredProduct::new(id, f64::from(count)))
            .collect();
        rank_descending(&mut ranked);
        ranked
    }
}
