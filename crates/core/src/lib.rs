pub mod config;
pub mod domain;
pub mod errors;
pub mod recommend;

pub use config::{AppConfig, ConfigError, ConfigOverrides, LoadOptions, RecommenderConfig};
pub use domain::behavior::{BehaviorEvent, BehaviorKind, UserId};
pub use domain::product::{Product, ProductId};
pub use errors::{ApplicationError, DomainError};
pub use recommend::{
    get_bundles, get_collaborative_recommendations, get_graph_recommendations,
    get_similar_products, recommend, Bundle, CollaborativeStrategy, Recommendation,
    RecommendationContext, RecommendationEngine, Strategy,
};
