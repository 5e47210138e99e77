use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::product::ProductId;
use crate::domain::WireId;
use crate::errors::DomainError;

#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "WireId")]
pub struct UserId(pub String);

impl UserId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<WireId> for UserId {
    fn from(value: WireId) -> Self {
        Self(value.into())
    }
}

impl From<&str> for UserId {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Implicit feedback signal, ordered by how strongly it expresses intent.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "&'static str")]
pub enum BehaviorKind {
    View,
    Favorite,
    Cart,
    Purchase,
}

impl BehaviorKind {
    pub const ALL: [BehaviorKind; 4] =
        [BehaviorKind::View, BehaviorKind::Favorite, BehaviorKind::Cart, BehaviorKind::Purchase];

    pub fn weight(self) -> f64 {
        match self {
            BehaviorKind::View => 1.0,
            BehaviorKind::Favorite => 3.0,
            BehaviorKind::Cart => 5.0,
            BehaviorKind::Purchase => 10.0,
        }
    }

    /// Cart and purchase events link products bought together.
    pub fn is_commitment(self) -> bool {
        matches!(self, BehaviorKind::Cart | BehaviorKind::Purchase)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            BehaviorKind::View => "view",
            BehaviorKind::Favorite => "favorite",
            BehaviorKind::Cart => "cart",
            BehaviorKind::Purchase => "purchase",
        }
    }
}

impl FromStr for BehaviorKind {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "view" => Ok(Self::View),
            "favorite" => Ok(Self::Favorite),
            "cart" => Ok(Self::Cart),
            "purchase" => Ok(Self::Purchase),
            other => Err(DomainError::validation(
                "behavior.kind",
                format!("unsupported behavior `{other}` (expected view|favorite|cart|purchase)"),
            )),
        }
    }
}

impl TryFrom<String> for BehaviorKind {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<BehaviorKind> for &'static str {
    fn from(value: BehaviorKind) -> Self {
        value.as_str()
    }
}

impl fmt::Display for BehaviorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BehaviorEvent {
    #[serde(alias = "userId")]
    pub user_id: UserId,
    #[serde(alias = "productId")]
    pub product_id: ProductId,
    #[serde(alias = "behaviorType", alias = "behavior_type")]
    pub kind: BehaviorKind,
    #[serde(default, alias = "createdAt", skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
}

impl BehaviorEvent {
    pub fn new(
        user_id: impl Into<String>,
        product_id: impl Into<String>,
        kind: BehaviorKind,
    ) -> Self {
        Self {
            user_id: UserId(user_id.into()),
            product_id: ProductId(product_id.into()),
            kind,
            timestamp: None,
        }
    }

    pub fn at(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        if self.user_id.0.trim().is_empty() {
            return Err(DomainError::validation("behavior.user_id", "must not be empty"));
        }
        if self.product_id.0.trim().is_empty() {
            return Err(DomainError::validation(
                "behavior.product_id",
                format!("event for user `{}` has an empty product id", self.user_id),
            ));
        }
        Ok(())
    }
}

pub fn validate_events(events: &[BehaviorEvent]) -> Result<(), DomainError> {
    events.iter().try_for_each(BehaviorEvent::validate)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{validate_events, BehaviorEvent, BehaviorKind, UserId};
    use crate::domain::product::ProductId;

    #[test]
    fn behavior_weights_follow_severity_order() {
        let weights: Vec<f64> = BehaviorKind::ALL.iter().map(|kind| kind.weight()).collect();
        assert_eq!(weights, vec![1.0, 3.0, 5.0, 10.0]);
        assert!(BehaviorKind::View < BehaviorKind::Favorite);
        assert!(BehaviorKind::Favorite < BehaviorKind::Cart);
        assert!(BehaviorKind::Cart < BehaviorKind::Purchase);
    }

    #[test]
    fn only_cart_and_purchase_are_commitments() {
        assert!(!BehaviorKind::View.is_commitment());
        assert!(!BehaviorKind::Favorite.is_commitment());
        assert!(BehaviorKind::Cart.is_commitment());
        assert!(BehaviorKind::Purchase.is_commitment());
    }

    #[test]
    fn storefront_event_shape_deserializes() {
        let event: BehaviorEvent = serde_json::from_value(json!({
            "userId": "u1",
            "productId": 1,
            "behaviorType": "Purchase",
            "createdAt": "2024-03-01T10:00:00Z"
        }))
        .expect("storefront event");

        assert_eq!(event.user_id, UserId::new("u1"));
        assert_eq!(event.product_id, ProductId::new("1"));
        assert_eq!(event.kind, BehaviorKind::Purchase);
        assert!(event.timestamp.is_some());
    }

    #[test]
    fn unknown_behavior_kind_is_rejected() {
        let parsed = serde_json::from_value::<BehaviorEvent>(json!({
            "userId": "u1",
            "productId": 1,
            "behaviorType": "wishlist"
        }));
        assert!(parsed.is_err());
        assert!("share".parse::<BehaviorKind>().is_err());
    }

    #[test]
    fn empty_identifiers_fail_validation() {
        let events = vec![
            BehaviorEvent::new("u1", "1", BehaviorKind::View),
            BehaviorEvent::new("u2", " ", BehaviorKind::Cart),
        ];
        assert!(validate_events(&events).is_err());
        assert!(validate_events(&events[..1]).is_ok());
    }
}
