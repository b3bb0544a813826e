use std::time::Duration;

use clap::{Parser, Subcommand};

use crate::entities::trial::{self, ProviderId, SearchOptions};
use crate::error::TrialScoutError;
use crate::render;

#[derive(Debug, Parser)]
#[command(
    name = "trialscout",
    about = "Search clinical trial sources for a drug and merge the results",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Search all configured trial sources for a drug
    Search {
        /// Drug or molecule name, e.g. semaglutide
        subject: String,

        /// Source to query (repeatable): registry, literature, generative,
        /// offline. Defaults to all of them.
        #[arg(short, long = "source", value_name = "SOURCE")]
        sources: Vec<String>,

        /// Per-source timeout in seconds
        #[arg(long, default_value_t = 10)]
        timeout_secs: u64,

        /// Maximum results requested per source
        #[arg(long, default_value_t = 5)]
        limit: usize,

        /// Emit pretty JSON instead of markdown
        #[arg(short, long)]
        json: bool,
    },
}

fn parse_sources(raw: &[String]) -> Result<Vec<ProviderId>, TrialScoutError> {
    if raw.is_empty() {
        return Ok(ProviderId::ALL.to_vec());
    }
    raw.iter().map(|s| s.parse()).collect()
}

pub async fn run(cli: Cli) -> anyhow::Result<String> {
    match cli.command {
        Commands::Search {
            subject,
            sources,
            timeout_secs,
            limit,
            json,
        } => {
            let enabled = parse_sources(&sources)?;
            let options = SearchOptions {
                provider_timeout: Duration::from_secs(timeout_secs),
                page_size: limit,
            };

            let outcome = trial::aggregate(&subject, &enabled, &options).await?;
            if json {
                Ok(render::json::to_pretty(&outcome)?)
            } else {
                Ok(render::markdown::render_outcome(subject.trim(), &outcome))
            }
        }
    }
}
