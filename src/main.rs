mod config;
mod http;
mod issues;
mod pr;
mod report;

use clap::error::ErrorKind;
use clap::{Args, CommandFactory, Parser, Subcommand};
use std::path::PathBuf;
use tracing::{info, info_span};
use tracing_subscriber::EnvFilter;

use crate::config::{Config, ConfigError};
use crate::http::ReqwestTransport;
use crate::issues::IssueClient;
use crate::pr::PrClient;

/// climate-tally: summarize code-quality issues and pull-request file churn.
#[derive(Parser, Debug)]
#[command(name = "climate-tally", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print issues from the latest default-branch snapshot as JSON
    Issues {
        #[command(flatten)]
        target: IssueTarget,

        /// Issues per page
        #[arg(short, long, default_value_t = 3)]
        page_size: usize,

        /// Fetch every page instead of just the first
        #[arg(long)]
        all: bool,
    },

    /// Count issues in the latest snapshot per language
    Languages {
        #[command(flatten)]
        target: IssueTarget,
    },

    /// Count how many closed pull requests touched each file
    PrFiles {
        /// GitHub repository as owner/name
        #[arg(long)]
        repo: Option<String>,

        /// GitHub access token (falls back to GITHUB_TOKEN)
        #[arg(long)]
        token: Option<String>,

        /// Only count files with this extension (e.g. rb or .rb)
        #[arg(short, long)]
        extension: Option<String>,

        /// Write `filename,count` rows to this file instead of printing
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Only consider pull requests created within this many days
        #[arg(
            long,
            default_value_t = pr::DEFAULT_WINDOW_DAYS,
            value_parser = clap::value_parser!(i64).range(1..=pr::MAX_WINDOW_DAYS)
        )]
        days: i64,
    },
}

#[derive(Args, Debug)]
struct IssueTarget {
    /// Analysis API token (falls back to CODECLIMATE_API_TOKEN)
    #[arg(short, long)]
    token: Option<String>,

    /// Repository id in the analysis API
    #[arg(short, long)]
    repo_id: Option<String>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    info!("loading configuration");
    let config = Config::load()?;
    let transport = ReqwestTransport::new();

    match cli.command {
        Command::Issues {
            target,
            page_size,
            all,
        } => {
            let credentials = usage_on_missing(config.codeclimate_credentials(target.token, target.repo_id))?;
            let _span = info_span!("issues", repo_id = %credentials.repo_id(), page_size, all).entered();

            let client = IssueClient::new(&transport, config.codeclimate_base_url(), credentials);
            let payload = issues::fetch_issues_payload(&client, page_size, all).await;
            report::print_json(&payload)?;
        }
        Command::Languages { target } => {
            let credentials = usage_on_missing(config.codeclimate_credentials(target.token, target.repo_id))?;
            let _span = info_span!("languages", repo_id = %credentials.repo_id()).entered();

            let client = IssueClient::new(&transport, config.codeclimate_base_url(), credentials);
            match issues::language_counts_payload(&client).await {
                Ok(counts) => report::print_language_counts(&counts),
                Err(payload) => report::print_json(&payload)?,
            }
        }
        Command::PrFiles {
            repo,
            token,
            extension,
            output,
            days,
        } => {
            let settings = usage_on_missing(config.github_settings(token, repo))?;
            let _span = info_span!("pr_files", repo = %format!("{}/{}", settings.owner, settings.name)).entered();

            let cutoff = pr::cutoff(chrono::Utc::now(), days)?;
            info!(%cutoff, "fetching closed pull requests");
            let client = PrClient::new(&transport, &settings);
            let index = client
                .aggregate_file_changes(cutoff, extension.as_deref())
                .await?;

            report::output_file_counts(&index.sorted_counts(), output.as_deref())?;
            info!(files = index.len(), "done");
        }
    }

    Ok(())
}

/// A missing token or repository is a usage error: print usage and exit non-zero.
fn usage_on_missing<T>(result: Result<T, ConfigError>) -> Result<T, ConfigError> {
    match result {
        Err(ConfigError::Missing { field }) => Cli::command()
            .error(
                ErrorKind::MissingRequiredArgument,
                format!("the required value `--{}` was not provided", field),
            )
            .exit(),
        other => other,
    }
}
