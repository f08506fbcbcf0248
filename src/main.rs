use anyhow::Context;
use clap::{Parser, Subcommand};
use contributor_metrics::gather;
use contributor_metrics::git::SystemGit;
use contributor_metrics::github::{ClientConfig, GithubClient};
use contributor_metrics::model::{Config, Period};
use contributor_metrics::report::{combine_results, save_results};
use indicatif::MultiProgress;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Parser, Debug, Clone)]
#[command(version, about)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug, Clone)]
enum Command {
    /// Gather, score and save contributor metrics
    Gather {
        #[arg(long = "config", default_value = "config.json")]
        config_path: PathBuf,
        /// Override the configured dates with a year (YYYY) or month (YYYY-MM)
        #[arg(long)]
        period: Option<String>,
        #[arg(long = "cache-dir", default_value = ".results_cache")]
        cache_dir: PathBuf,
        #[arg(long = "history-dir", default_value = ".results_history")]
        history_dir: PathBuf,
    },
    /// Point the config file at a year (YYYY) or month (YYYY-MM)
    Configure {
        period: String,
        #[arg(long = "config", default_value = "config.json")]
        config_path: PathBuf,
    },
    /// Merge saved runs into combined_results.json
    Combine {
        #[arg(long = "history-dir", default_value = ".results_history")]
        history_dir: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .init();
    let args = Args::parse();
    run(args.command).await
}

async fn run(command: Command) -> anyhow::Result<()> {
    match command {
        Command::Gather {
            config_path,
            period,
            cache_dir,
            history_dir,
        } => gather_run(config_path, period, cache_dir, history_dir).await,
        Command::Configure {
            period,
            config_path,
        } => {
            let period = Period::parse(&period)?;
            period
                .write_to_config(&config_path)
                .with_context(|| format!("Failed to configure `{}`", config_path.display()))?;
            info!(
                period = %period.name,
                start = %period.start_date,
                end = %period.end_date,
                "Config updated"
            );
            Ok(())
        }
        Command::Combine { history_dir } => {
            let path = combine_results(&history_dir)?;
            info!(path = %path.display(), "Combined results saved");
            Ok(())
        }
    }
}

async fn gather_run(
    config_path: PathBuf,
    period: Option<String>,
    cache_dir: PathBuf,
    history_dir: PathBuf,
) -> anyhow::Result<()> {
    let mut config = Config::from_config(&config_path)
        .with_context(|| format!("Failed to load `{}`", config_path.display()))?;
    if let Some(period) = period {
        config = config.with_period(&Period::parse(&period)?);
    }
    info!(start = %config.start_date, end = %config.end_date, "Gathering contributor metrics");

    let client = match &config.github_token {
        Some(token) => {
            let client = GithubClient::new(ClientConfig::new(
                token,
                cache_dir.clone(),
                config.skip_cache,
            ))?;
            client.log_rate_limits().await;
            Some(client)
        }
        None => {
            warn!("No GitHub token configured, analyzing local git history only");
            None
        }
    };

    let multi_progress = MultiProgress::new();
    let result = gather(&config, Arc::new(SystemGit), client.as_ref(), &multi_progress).await;
    info!(
        total_commits = result.total_commits,
        total_pull_requests = result.total_pull_requests,
        active_users = result.active_users,
        team_score = result.team_score,
        "Gathering complete"
    );

    let path = save_results(&result, &history_dir, config.results_name.as_deref())?;
    info!(path = %path.display(), "Results saved");
    Ok(())
}
