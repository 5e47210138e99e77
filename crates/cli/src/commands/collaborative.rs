use clap::Args;
use freshcart_core::config::AppConfig;
use freshcart_core::domain::behavior::UserId;
use freshcart_core::errors::ApplicationError;
use freshcart_core::recommend::{CollaborativeStrategy, RecommendationEngine, ScoredProduct};

use crate::commands::{CommandResult, SnapshotArgs};
use crate::snapshot::{load_behaviors, load_catalog};

#[derive(Debug, Clone, Args)]
pub struct CollaborativeArgs {
    #[arg(long, help = "User to recommend for")]
    pub user: String,
    #[arg(long, default_value = "user", help = "Filtering strategy: user|item")]
    pub strategy: String,
    #[command(flatten)]
    pub snapshot: SnapshotArgs,
    #[arg(long, help = "Maximum number of results (defaults to recommender.default_limit)")]
    pub limit: Option<usize>,
}

pub fn run(config: &AppConfig, args: CollaborativeArgs) -> CommandResult {
    CommandResult::from_outcome("collaborative", collaborative(config, &args))
}

fn collaborative(
    config: &AppConfig,
    args: &CollaborativeArgs,
) -> Result<Vec<ScoredProduct>, ApplicationError> {
    let strategy: CollaborativeStrategy = args.strategy.parse()?;
    let catalog = load_catalog(&args.snapshot.catalog)?;
    let events = load_behaviors(args.snapshot.behaviors.as_deref())?;
    let limit = args.limit.unwrap_or(config.recommender.default_limit);

    let scores = RecommendationEngine::with_config(config.recommender.clone()).collaborative(
        &UserId::new(args.user.as_str()),
        &catalog,
        &events,
        limit,
        strategy,
        None,
    )?;
    Ok(scores)
}
