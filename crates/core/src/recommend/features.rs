//! Canonical feature shape extracted from catalog records

use std::collections::BTreeSet;

use crate::domain::product::{Product, ProductId};
use crate::errors::DomainError;

/// Comparable features of one product.
///
/// Optional attributes keep their `None` so a pair only contributes the
/// sub-scores that both sides actually recorded.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureVector {
    pub id: ProductId,
    pub category: String,
    pub tags: BTreeSet<String>,
    pub price: f64,
    pub rating: Option<f64>,
    pub sales: u64,
    pub organic: Option<bool>,
    pub local: Option<bool>,
    pub seasonal: Option<bool>,
    pub premium: Option<bool>,
    pub fresh: Option<bool>,
    pub shelf_life_days: Option<f64>,
    pub origin: Option<String>,
}

impl FeatureVector {
    pub fn from_product(product: &Product) -> Result<Self, DomainError> {
        product.validate()?;

        let tags = product
            .tags
            .iter()
            .map(|tag| tag.trim().to_lowercase())
            .filter(|tag| !tag.is_empty())
            .collect();

        let origin = product
            .origin
            .as_deref()
            .map(str::trim)
            .filter(|origin| !origin.is_empty())
            .map(str::to_owned);

        Ok(Self {
            id: product.id.clone(),
            category: product.category.trim().to_owned(),
            tags,
            price: product.price,
            rating: product.rating,
            sales: product.sales as u64,
            organic: product.organic,
            local: product.local,
            seasonal: product.seasonal,
            premium: product.premium,
            fresh: product.fresh,
            shelf_life_days: product.shelf_life_days,
            origin,
        })
    }

    /// Secondary storefront flags: local, seasonal, premium, fresh.
    pub fn attribute_flags(&self) -> [Option<bool>; 4] {
        [self.local, self.seasonal, self.premium, self.fresh]
    }

    pub fn shares_tag_with(&self, other: &FeatureVector) -> bool {
        !self.tags.is_disjoint(&other.tags)
    }
}

pub fn normalize_catalog(catalog: &[Product]) -> Result<Vec<FeatureVector>, DomainError> {
    catalog.iter().map(FeatureVector::from_product).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tags_are_trimmed_lowercased_and_deduplicated() {
        let product =
            Product::new("1", "fruit", 3.0).with_tags(["Citrus", " citrus ", "", "Local"]);
        let features = FeatureVector::from_product(&product).expect("valid product");

        let tags: Vec<&str> = features.tags.iter().map(String::as_str).collect();
        assert_eq!(tags, vec!["citrus", "local"]);
    }

    #[test]
    fn blank_origin_is_treated_as_unknown() {
        let product = Product::new("1", "fruit", 3.0).with_origin("   ");
        let features = FeatureVector::from_product(&product).expect("valid product");
        assert_eq!(features.origin, None);
    }

    #[test]
    fn unknown_flags_stay_unknown() {
        let product = Product::new("1", "veg", 2.0).with_local(false);
        let features = FeatureVector::from_product(&product).expect("valid product");
        assert_eq!(features.attribute_flags(), [Some(false), None, None, None]);
        assert_eq!(features.organic, None);
    }

    #[test]
    fn malformed_record_is_rejected() {
        let catalog = vec![Product::new("1", "fruit", 3.0), Product::new("2", "fruit", f64::NAN)];
        assert!(matches!(normalize_catalog(&catalog), Err(DomainError::Validation { .. })));
    }
}
