use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use crate::collectors::http::HttpSettings;
use crate::collectors::{Backend, Limit, SourceFilter};

#[derive(Parser, Debug, Clone)]
#[command(name = "jobhunter", about = "Search job boards and freelance marketplaces")]
pub struct Config {
    /// Emit logs as JSON lines
    #[arg(long, env = "JOBHUNTER_LOG_JSON", global = true)]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(clap::Subcommand, Debug, Clone)]
pub enum Command {
    /// Search the selected sources and print a JSON report
    Search(SearchArgs),
    /// List the registered sources
    Sources,
    /// Print extra metadata for one listing
    Details {
        /// Source the listing came from
        #[arg(long, short = 's')]
        source: String,

        /// Listing URL
        url: String,

        /// Use the real-fetch backend where one exists
        #[arg(long)]
        live: bool,
    },
}

#[derive(clap::Args, Debug, Clone)]
pub struct SearchArgs {
    /// Search keywords
    #[arg(long, short = 'k')]
    pub keywords: String,

    /// Location filter
    #[arg(long, short = 'l', default_value = "")]
    pub location: String,

    /// Maximum jobs per source
    #[arg(long, short = 'n', env = "JOBHUNTER_LIMIT", default_value = "50")]
    pub limit: Limit,

    /// Source to search (repeatable, default all)
    #[arg(long = "source", short = 's')]
    pub sources: Vec<String>,

    /// Only remote job boards
    #[arg(long)]
    pub remote_only: bool,

    /// Only freelance marketplaces
    #[arg(long)]
    pub freelance_only: bool,

    /// Use the real-fetch backend where one exists
    #[arg(long, env = "JOBHUNTER_LIVE")]
    pub live: bool,

    /// Override a source's base URL, as NAME=URL (repeatable)
    #[arg(long = "base-url", value_parser = parse_base_url)]
    pub base_urls: Vec<(String, String)>,

    /// Per-source timeout in seconds
    #[arg(long, env = "JOBHUNTER_TIMEOUT_SECS", default_value = "30")]
    pub timeout_secs: u64,

    /// Request budget per source per minute
    #[arg(long, env = "JOBHUNTER_REQUESTS_PER_MINUTE", default_value = "30")]
    pub requests_per_minute: u32,

    /// Write the report here instead of stdout
    #[arg(long, short = 'o')]
    pub output: Option<PathBuf>,

    /// Pretty-print the report
    #[arg(long)]
    pub pretty: bool,
}

impl SearchArgs {
    pub fn backend(&self) -> Backend {
        backend(self.live)
    }

    pub fn filter(&self) -> SourceFilter {
        SourceFilter {
            remote_only: self.remote_only,
            freelance_only: self.freelance_only,
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }

    pub fn http_settings(&self) -> HttpSettings {
        HttpSettings {
            timeout: self.timeout(),
            requests_per_minute: self.requests_per_minute,
            ..HttpSettings::default()
        }
    }
}

pub fn backend(live: bool) -> Backend {
    if live { Backend::Live } else { Backend::Sample }
}

fn parse_base_url(value: &str) -> Result<(String, String), String> {
    let (name, url) = value
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=URL, got '{value}'"))?;
    let (name, url) = (name.trim(), url.trim());
    if name.is_empty() || url.is_empty() {
        return Err(format!("expected NAME=URL, got '{value}'"));
    }
    crate::collectors::parse_base_url(url).map_err(|e| e.to_string())?;
    Ok((name.to_string(), url.to_string()))
}
