pub mod commands;
pub mod logging;
pub mod snapshot;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use freshcart_core::config::{AppConfig, ConfigOverrides, LoadOptions, LogFormat};

use commands::bundles::BundlesArgs;
use commands::collaborative::CollaborativeArgs;
use commands::graph::GraphArgs;
use commands::recommend::RecommendArgs;
use commands::similar::SimilarArgs;
use commands::stats::StatsArgs;
use commands::CommandResult;

#[derive(Debug, Parser)]
#[command(
    name = "freshcart",
    about = "Freshcart recommendation CLI",
    long_about = "Run the storefront recommendation engine against catalog and behavior-log snapshots.",
    after_help = "Examples:\n  freshcart similar --product 1 --catalog catalog.json\n  freshcart recommend --user u1 --catalog catalog.json --behaviors behaviors.json --seed 7\n  freshcart config"
)]
pub struct Cli {
    #[arg(long = "config", global = true, help = "Path to freshcart.toml")]
    config_path: Option<PathBuf>,
    #[command(flatten)]
    overrides: OverrideArgs,
    #[command(subcommand)]
    command: Command,
}

/// Per-invocation settings that win over file and environment values.
#[derive(Debug, Clone, Default, Args)]
struct OverrideArgs {
    #[arg(long, global = true, help = "Log level: trace|debug|info|warn|error")]
    log_level: Option<String>,
    #[arg(long, global = true, help = "Log format: compact|pretty|json")]
    log_format: Option<LogFormat>,
    #[arg(long, global = true, help = "Page size when a command gets no --limit")]
    default_limit: Option<usize>,
    #[arg(long, global = true, help = "Maximum random-walk depth")]
    walk_depth: Option<usize>,
    #[arg(long, global = true, help = "Upper bound of the ranking jitter (0 disables it)")]
    jitter: Option<f64>,
    #[arg(long, global = true, help = "Collaborative time-decay constant in days")]
    decay_days: Option<f64>,
}

impl From<OverrideArgs> for ConfigOverrides {
    fn from(args: OverrideArgs) -> Self {
        Self {
            log_level: args.log_level,
            log_format: args.log_format,
            default_limit: args.default_limit,
            max_walk_depth: args.walk_depth,
            jitter: args.jitter,
            decay_days: args.decay_days,
        }
    }
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Products most similar to one product")]
    Similar(SimilarArgs),
    #[command(about = "User-based or item-based collaborative filtering for one user")]
    Collaborative(CollaborativeArgs),
    #[command(about = "Random-walk recommendations over the product graph")]
    Graph(GraphArgs),
    #[command(about = "Discounted two-product bundles for the whole catalog")]
    Bundles(BundlesArgs),
    #[command(about = "Merged, ranked recommendations for a product and/or user")]
    Recommend(RecommendArgs),
    #[command(about = "Behavior counts and interest tags for one user")]
    Stats(StatsArgs),
    #[command(about = "Inspect effective configuration values with source attribution")]
    Config,
}

pub fn run() -> Result<ExitCode> {
    let cli = Cli::parse();
    let result = execute(cli)?;

    println!("{}", result.output);
    Ok(ExitCode::from(result.exit_code))
}

fn execute(cli: Cli) -> Result<CommandResult> {
    let overrides = ConfigOverrides::from(cli.overrides);
    if let Command::Config = cli.command {
        return Ok(commands::config::run(cli.config_path.as_deref(), &overrides));
    }

    let options =
        LoadOptions { config_path: cli.config_path, overrides, ..LoadOptions::default() };
    let config = match AppConfig::load(options) {
        Ok(config) => config,
        Err(error) => {
            return Ok(CommandResult::failure(
                command_name(&cli.command),
                "config_validation",
                format!("config validation failed: {error}"),
                2,
            ))
        }
    };
    logging::init_logging(&config.logging)?;

    tracing::debug!(
        event_name = "cli.command.start",
        command = command_name(&cli.command),
        "running command"
    );

    let result = match cli.command {
        Command::Similar(args) => commands::similar::run(&config, args),
        Command::Collaborative(args) => commands::collaborative::run(&config, args),
        Command::Graph(args) => commands::graph::run(&config, args),
        Command::Bundles(args) => commands::bundles::run(&config, args),
        Command::Recommend(args) => commands::recommend::run(&config, args),
        Command::Stats(args) => commands::stats::run(args),
        Command::Config => commands::config::run(None, &ConfigOverrides::default()),
    };

    tracing::debug!(
        event_name = "cli.command.finished",
        exit_code = result.exit_code,
        "command finished"
    );
    Ok(result)
}

fn command_name(command: &Command) -> &'static str {
    match command {
        Command::Similar(_) => "similar",
        Command::Collaborative(_) => "collaborative",
        Command::Graph(_) => "graph",
        Command::Bundles(_) => "bundles",
        Command::Recommend(_) => "recommend",
        Command::Stats(_) => "stats",
        Command::Config => "config",
    }
}

#[cfg(test)]
mod tests {
    use clap::Parser;
    use freshcart_core::config::{ConfigOverrides, LogFormat};

    use super::{Cli, Command};

    #[test]
    fn parses_recommend_with_shared_snapshot_args() {
        let cli = Cli::try_parse_from([
            "freshcart",
            "recommend",
            "--product",
            "1",
            "--catalog",
            "catalog.json",
            "--behaviors",
            "behaviors.json",
            "--seed",
            "7",
        ])
        .expect("valid arguments");

        match cli.command {
            Command::Recommend(args) => {
                assert_eq!(args.product.as_deref(), Some("1"));
                assert_eq!(args.seed, Some(7));
                assert!(args.snapshot.behaviors.is_some());
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn global_config_flag_is_accepted_after_subcommand() {
        let cli = Cli::try_parse_from(["freshcart", "config", "--config", "custom.toml"])
            .expect("valid arguments");
        assert!(cli.config_path.is_some());
    }

    #[test]
    fn global_overrides_are_accepted_after_subcommand() {
        let cli = Cli::try_parse_from([
            "freshcart",
            "graph",
            "--product",
            "1",
            "--catalog",
            "catalog.json",
            "--walk-depth",
            "5",
            "--jitter",
            "0",
            "--log-format",
            "json",
        ])
        .expect("valid arguments");

        let overrides = ConfigOverrides::from(cli.overrides);
        assert_eq!(overrides.max_walk_depth, Some(5));
        assert_eq!(overrides.jitter, Some(0.0));
        assert_eq!(overrides.log_format, Some(LogFormat::Json));
        assert!(overrides.log_level.is_none());
    }

    #[test]
    fn unknown_log_format_is_rejected() {
        assert!(Cli::try_parse_from(["freshcart", "config", "--log-format", "xml"]).is_err());
    }

    #[test]
    fn similar_requires_a_catalog() {
        assert!(Cli::try_parse_from(["freshcart", "similar", "--product", "1"]).is_err());
    }
}
