//! Discounted two-product bundles built from nearest-neighbor similarity

use std::collections::HashMap;

use serde::Serialize;

use super::features::normalize_catalog;
use super::similarity::SimilarityScorer;
use crate::domain::product::{Product, ProductId};
use crate::errors::DomainError;

pub const DEFAULT_BUNDLE_DISCOUNT_PERCENT: u8 = 15;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Bundle {
    pub main_product: Product,
    pub related_product: Product,
    pub combined_price: f64,
    pub discount_percent: u8,
    pub similarity: f64,
}

#[derive(Debug, Clone)]
pub struct BundleGenerator {
    scorer: SimilarityScorer,
    discount_percent: u8,
}

impl Default for BundleGenerator {
    fn default() -> Self {
        Self::new(SimilarityScorer::new(), DEFAULT_BUNDLE_DISCOUNT_PERCENT)
    }
}

impl BundleGenerator {
    pub fn new(scorer: SimilarityScorer, discount_percent: u8) -> Self {
        Self { scorer, discount_percent: discount_percent.min(100) }
    }

    pub fn discount_percent(&self) -> u8 {
        self.discount_percent
    }

    pub fn combined_price(&self, main: &Product, related: &Product) -> f64 {
        (main.price + related.price) * (1.0 - f64::from(self.discount_percent) / 100.0)
    }

    /// One bundle per catalog product, paired with its most similar partner.
    /// Products without a partner scoring above zero are skipped.
    pub fn generate(&self, catalog: &[Product]) -> Result<Vec<Bundle>, DomainError> {
        let features = normalize_catalog(catalog)?;
        let by_id: HashMap<&ProductId, &Product> =
            catalog.iter().map(|product| (&product.id, product)).collect();

        let mut bundles = Vec::new();
        for target in &features {
            let Some(best) = self.scorer.find_most_similar(target, &features, 1).into_iter().next()
            else {
                continue;
            };
            if best.score <= 0.0 {
                continue;
            }

            let (Some(main), Some(related)) = (by_id.get(&target.id), by_id.get(&best.product_id))
            else {
                continue;
            };

            bundles.push(Bundle {
                main_product: (*main).clone(),
                related_product: (*related).clone(),
                combined_price: self.combined_price(main, related),
                discount_percent: self.discount_percent,
                similarity: best.score,
            });
        }

        Ok(bundles)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_product_catalog_has_no_bundles() {
        let bundles = BundleGenerator::default()
            .generate(&[Product::new("1", "fruit", 3.0)])
            .expect("valid catalog");
        assert!(bundles.is_empty());
    }

    #[test]
    fn every_product_pairs_with_its_nearest_neighbor() {
        let catalog = vec![
            Product::new("1", "fruit", 10.0),
            Product::new("2", "fruit", 12.0),
            Product::new("3", "veg", 3.0),
        ];
        let bundles = BundleGenerator::default().generate(&catalog).expect("valid catalog");

        let pairs: Vec<(&str, &str)> = bundles
            .iter()
            .map(|bundle| (bundle.main_product.id.as_str(), bundle.related_product.id.as_str()))
            .collect();
        assert_eq!(pairs, vec![("1", "2"), ("2", "1"), ("3", "1")]);

        assert_eq!(bundles[0].discount_percent, 15);
        assert!((bundles[0].combined_price - 22.0 * 0.85).abs() < 1e-9);
    }

    #[test]
    fn partners_scoring_zero_are_skipped() {
        let catalog = vec![Product::new("1", "fruit", 0.0), Product::new("2", "veg", 0.0)];
        assert!(BundleGenerator::default().generate(&catalog).expect("valid").is_empty());
    }

    #[test]
    fn custom_discount_is_applied() {
        let generator = BundleGenerator::new(SimilarityScorer::new(), 25);
        let catalog = vec![Product::new("1", "fruit", 4.0), Product::new("2", "fruit", 4.0)];
        let bundles = generator.generate(&catalog).expect("valid catalog");

        assert_eq!(bundles.len(), 2);
        assert!((bundles[0].combined_price - 6.0).abs() < 1e-9);
    }

    #[test]
    fn malformed_product_is_rejected() {
        let catalog = vec![Product::new("1", "fruit", -1.0), Product::new("2", "fruit", 1.0)];
        let error = BundleGenerator::default().generate(&catalog).expect_err("negative price");
        assert!(matches!(error, DomainError::Validation { ref field, .. } if field == "product.price"));
    }
}
