use std::collections::HashMap;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use jobhunter::collectors::runner::{Runner, build_collectors};
use jobhunter::collectors::{CollectorOptions, SearchQuery, get_collector, select_sources, sources};
use jobhunter::config::{Command, Config, SearchArgs, backend};

fn init_tracing(json: bool) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("jobhunter=info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse();
    init_tracing(config.log_json);

    match config.command {
        Command::Search(args) => search(args).await?,
        Command::Sources => {
            for profile in sources::catalogue() {
                println!(
                    "{:<16} {:<10} {}",
                    profile.name,
                    format!("{:?}", profile.kind).to_lowercase(),
                    profile.base_url
                );
            }
        }
        Command::Details { source, url, live } => {
            let collector = get_collector(&source, backend(live), CollectorOptions::default())?;
            let details = collector.get_job_details(&url).await;
            println!("{}", serde_json::to_string_pretty(&details)?);
        }
    }

    Ok(())
}

async fn search(args: SearchArgs) -> anyhow::Result<()> {
    let query = SearchQuery::new(&args.keywords, &args.location, args.limit)?;
    let profiles = select_sources(&args.sources, args.filter())?;
    if profiles.is_empty() {
        anyhow::bail!("No sources match the given filters");
    }

    let span = tracing::info_span!("search", keywords = %query.keywords());
    let base_urls: HashMap<String, String> = args.base_urls.iter().cloned().collect();
    let collectors = build_collectors(
        &profiles,
        args.backend(),
        &args.http_settings(),
        &base_urls,
        &span,
    )?;
    let runner = Runner::new(collectors, args.timeout());

    tokio::select! {
        biased;
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Shutdown signal received, abandoning search");
        }
        report = runner.run(&query) => {
            report.write_to(args.output.as_deref(), args.pretty)?;
        }
    }

    Ok(())
}
