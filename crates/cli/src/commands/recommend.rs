use clap::Args;
use freshcart_core::config::AppConfig;
use freshcart_core::domain::product::{Product, ProductId};
use freshcart_core::errors::ApplicationError;
use freshcart_core::recommend::{Recommendation, RecommendationContext, RecommendationEngine};
use serde::Serialize;

use crate::commands::{CommandResult, SnapshotArgs};
use crate::snapshot::{load_behaviors, load_catalog};

#[derive(Debug, Clone, Args)]
pub struct RecommendArgs {
    #[arg(long, help = "Product the shopper is looking at")]
    pub product: Option<String>,
    #[arg(long, help = "Signed-in shopper")]
    pub user: Option<String>,
    #[command(flatten)]
    pub snapshot: SnapshotArgs,
    #[arg(long, help = "Page size (defaults to recommender.default_limit)")]
    pub limit: Option<usize>,
    #[arg(long, help = "Fixed random seed for reproducible ranking")]
    pub seed: Option<u64>,
    #[arg(long, help = "Inline full product records in the output")]
    pub with_products: bool,
}

#[derive(Debug, Serialize)]
struct RecommendReport {
    product_ids: Vec<ProductId>,
    recommendations: Vec<Recommendation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    products: Option<Vec<Product>>,
}

pub fn run(config: &AppConfig, args: RecommendArgs) -> CommandResult {
    CommandResult::from_outcome("recommend", recommend(config, &args))
}

fn recommend(config: &AppConfig, args: &RecommendArgs) -> Result<RecommendReport, ApplicationError> {
    let catalog = load_catalog(&args.snapshot.catalog)?;
    let events = load_behaviors(args.snapshot.behaviors.as_deref())?;
    let limit = args.limit.unwrap_or(config.recommender.default_limit);

    let mut context = RecommendationContext::new();
    if let Some(product) = &args.product {
        context = context.with_product(product.as_str());
    }
    if let Some(user) = &args.user {
        context = context.with_user(user.as_str());
    }
    if let Some(seed) = args.seed {
        context = context.with_seed(seed);
    }

    let engine = RecommendationEngine::with_config(config.recommender.clone());
    let recommendations = engine.recommend_detailed(&context, &catalog, &events, limit)?;
    let products = args.with_products.then(|| engine.resolve(&recommendations, &catalog));

    Ok(RecommendReport {
        product_ids: recommendations.iter().map(|r| r.product_id.clone()).collect(),
        recommendations,
        products,
    })
}
