use clap::Args;
use freshcart_core::config::AppConfig;
use freshcart_core::errors::ApplicationError;
use freshcart_core::recommend::{Bundle, RecommendationEngine};

use crate::commands::CommandResult;
use crate::snapshot::load_catalog;

#[derive(Debug, Clone, Args)]
pub struct BundlesArgs {
    #[arg(long, help = "Catalog snapshot: JSON array of products or {\"products\": [...]}")]
    pub catalog: std::path::PathBuf,
}

pub fn run(config: &AppConfig, args: BundlesArgs) -> CommandResult {
    CommandResult::from_outcome("bundles", bundles(config, &args))
}

fn bundles(config: &AppConfig, args: &BundlesArgs) -> Result<Vec<Bundle>, ApplicationError> {
    let catalog = load_catalog(&args.catalog)?;
    Ok(RecommendationEngine::with_config(config.recommender.clone()).bundles(&catalog)?)
}
