use clap::Args;
use freshcart_core::config::AppConfig;
use freshcart_core::domain::product::ProductId;
use freshcart_core::errors::ApplicationError;
use freshcart_core::recommend::{RecommendationEngine, SimilarityScore};

use crate::commands::{CommandResult, SnapshotArgs};
use crate::snapshot::load_catalog;

#[derive(Debug, Clone, Args)]
pub struct SimilarArgs {
    #[arg(long, help = "Product to find neighbors for")]
    pub product: String,
    #[command(flatten)]
    pub snapshot: SnapshotArgs,
    #[arg(long, help = "Maximum number of results (defaults to recommender.default_limit)")]
    pub limit: Option<usize>,
}

pub fn run(config: &AppConfig, args: SimilarArgs) -> CommandResult {
    CommandResult::from_outcome("similar", similar(config, &args))
}

fn similar(config: &AppConfig, args: &SimilarArgs) -> Result<Vec<SimilarityScore>, ApplicationError> {
    let catalog = load_catalog(&args.snapshot.catalog)?;
    let limit = args.limit.unwrap_or(config.recommender.default_limit);

    let scores = RecommendationEngine::with_config(config.recommender.clone()).similar_products(
        &ProductId::new(args.product.as_str()),
        &catalog,
        limit,
    )?;
    Ok(scores)
}
