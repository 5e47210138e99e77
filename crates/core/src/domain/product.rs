use std::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::WireId;
use crate::errors::DomainError;

pub const MAX_RATING: f64 = 5.0;

#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "WireId")]
pub struct ProductId(pub String);

impl ProductId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<WireId> for ProductId {
    fn from(value: WireId) -> Self {
        Self(value.into())
    }
}

impl From<&str> for ProductId {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Catalog record as supplied by the product store.
///
/// Optional attributes stay `None` when the source did not record them so that
/// similarity scoring can tell "unknown" apart from "false".
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(alias = "categoryId")]
    pub category: String,
    #[serde(default)]
    pub tags: Vec<String>,
    pub price: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<f64>,
    /// Units sold. Storefront exports write numeric columns as floats, so any
    /// whole, non-negative number is accepted.
    #[serde(default)]
    pub sales: f64,
    #[serde(default, alias = "isOrganic", skip_serializing_if = "Option::is_none")]
    pub organic: Option<bool>,
    #[serde(default, alias = "isLocal", skip_serializing_if = "Option::is_none")]
    pub local: Option<bool>,
    #[serde(default, alias = "isSeasonal", skip_serializing_if = "Option::is_none")]
    pub seasonal: Option<bool>,
    #[serde(default, alias = "isPremium", skip_serializing_if = "Option::is_none")]
    pub premium: Option<bool>,
    #[serde(default, alias = "isFresh", skip_serializing_if = "Option::is_none")]
    pub fresh: Option<bool>,
    #[serde(default, alias = "shelfLife", skip_serializing_if = "Option::is_none")]
    pub shelf_life_days: Option<f64>,
    #[serde(default, alias = "originPlace", skip_serializing_if = "Option::is_none")]
    pub origin: Option<String>,
}

impl Product {
    pub fn new(id: impl Into<String>, category: impl Into<String>, price: f64) -> Self {
        Self {
            id: ProductId(id.into()),
            name: None,
            category: category.into(),
            tags: Vec::new(),
            price,
            rating: None,
            sales: 0.0,
            organic: None,
            local: None,
            seasonal: None,
            premium: None,
            fresh: None,
            shelf_life_days: None,
            origin: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_rating(mut self, rating: f64) -> Self {
        self.rating = Some(rating);
        self
    }

    pub fn with_sales(mut self, sales: u64) -> Self {
        self.sales = sales as f64;
        self
    }

    pub fn with_organic(mut self, organic: bool) -> Self {
        self.organic = Some(organic);
        self
    }

    pub fn with_local(mut self, local: bool) -> Self {
        self.local = Some(local);
        self
    }

    pub fn with_seasonal(mut self, seasonal: bool) -> Self {
        self.seasonal = Some(seasonal);
        self
    }

    pub fn with_premium(mut self, premium: bool) -> Self {
        self.premium = Some(premium);
        self
    }

    pub fn with_fresh(mut self, fresh: bool) -> Self {
        self.fresh = Some(fresh);
        self
    }

    pub fn with_shelf_life_days(mut self, days: f64) -> Self {
        self.shelf_life_days = Some(days);
        self
    }

    pub fn with_origin(mut self, origin: impl Into<String>) -> Self {
        self.origin = Some(origin.into());
        self
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        if self.id.0.trim().is_empty() {
            return Err(DomainError::validation("product.id", "must not be empty"));
        }

        if self.category.trim().is_empty() {
            return Err(DomainError::validation(
                "product.category",
                format!("product `{}` has an empty category", self.id),
            ));
        }

        if !self.price.is_finite() || self.price < 0.0 {
            return Err(DomainError::validation(
                "product.price",
                format!("product `{}` has price {} (expected a non-negative number)", self.id, self.price),
            ));
        }

        if !self.sales.is_finite() || self.sales < 0.0 || self.sales.fract() != 0.0 {
            return Err(DomainError::validation(
                "product.sales",
                format!("product `{}` has sales {} (expected a whole non-negative number)", self.id, self.sales),
            ));
        }

        if let Some(rating) = self.rating {
            if !rating.is_finite() || !(0.0..=MAX_RATING).contains(&rating) {
                return Err(DomainError::validation(
                    "product.rating",
                    format!("product `{}` has rating {rating} (expected 0..=5)", self.id),
                ));
            }
        }

        if let Some(days) = self.shelf_life_days {
            if !days.is_finite() || days < 0.0 {
                return Err(DomainError::validation(
                    "product.shelf_life_days",
                    format!("product `{}` has shelf life {days} (expected a non-negative number)", self.id),
                ));
            }
        }

        Ok(())
    }
}
