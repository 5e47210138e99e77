use clap::Args;
use freshcart_core::domain::behavior::UserId;
use freshcart_core::errors::ApplicationError;
use freshcart_core::recommend::popularity::user_interest_tags;
use freshcart_core::recommend::{behavior_stats, normalize_catalog, BehaviorStats};
use serde::Serialize;

use crate::commands::{CommandResult, SnapshotArgs};
use crate::snapshot::{load_behaviors, load_catalog};

#[derive(Debug, Clone, Args)]
pub struct StatsArgs {
    #[arg(long, help = "User to summarize")]
    pub user: String,
    #[command(flatten)]
    pub snapshot: SnapshotArgs,
    #[arg(long, default_value_t = 5, help = "Number of interest tags to report")]
    pub top_tags: usize,
}

#[derive(Debug, Serialize)]
struct InterestTag {
    tag: String,
    count: usize,
}

#[derive(Debug, Serialize)]
struct StatsReport {
    user_id: UserId,
    total: usize,
    behaviors: BehaviorStats,
    interest_tags: Vec<InterestTag>,
}

pub fn run(args: StatsArgs) -> CommandResult {
    CommandResult::from_outcome("stats", stats(&args))
}

fn stats(args: &StatsArgs) -> Result<StatsReport, ApplicationError> {
    let catalog = load_catalog(&args.snapshot.catalog)?;
    let events = load_behaviors(args.snapshot.behaviors.as_deref())?;
    let features = normalize_catalog(&catalog)?;
    let user = UserId::new(args.user.as_str());

    let behaviors = behavior_stats(&user, &events);
    let interest_tags = user_interest_tags(&user, &events, &features)
        .into_iter()
        .take(args.top_tags)
        .map(|(tag, count)| InterestTag { tag, count })
        .collect();

    Ok(StatsReport { user_id: user, total: behaviors.total(), behaviors, interest_tags })
}
