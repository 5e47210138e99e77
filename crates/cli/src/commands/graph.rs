use clap::Args;
use freshcart_core::config::AppConfig;
use freshcart_core::domain::product::ProductId;
use freshcart_core::errors::ApplicationError;
use freshcart_core::recommend::{RecommendationContext, RecommendationEngine, ScoredProduct};

use crate::commands::{CommandResult, SnapshotArgs};
use crate::snapshot::{load_behaviors, load_catalog};

#[derive(Debug, Clone, Args)]
pub struct GraphArgs {
    #[arg(long, help = "Product the random walk starts from")]
    pub product: String,
    #[command(flatten)]
    pub snapshot: SnapshotArgs,
    #[arg(long, help = "Maximum number of results (defaults to recommender.default_limit)")]
    pub limit: Option<usize>,
    #[arg(long, help = "Fixed random seed for a reproducible walk")]
    pub seed: Option<u64>,
}

pub fn run(config: &AppConfig, args: GraphArgs) -> CommandResult {
    CommandResult::from_outcome("graph", walk(config, &args))
}

fn walk(config: &AppConfig, args: &GraphArgs) -> Result<Vec<ScoredProduct>, ApplicationError> {
    let catalog = load_catalog(&args.snapshot.catalog)?;
    let events = load_behaviors(args.snapshot.behaviors.as_deref())?;
    let limit = args.limit.unwrap_or(config.recommender.default_limit);

    let context = RecommendationContext { seed: args.seed, ..RecommendationContext::default() };
    let mut rng = context.rng();
    let visits = RecommendationEngine::with_config(config.recommender.clone())
        .graph_recommendations(
            &ProductId::new(args.product.as_str()),
            &catalog,
            &events,
            limit,
            &mut rng,
        )?;
    Ok(visits)
}
