use std::collections::{HashMap, HashSet};
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde::Serialize;
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::collectors::http::HttpSettings;
use crate::collectors::sources::SourceProfile;
use crate::collectors::{
    Backend, CollectorOptions, JobCollector, ScrapeMetrics, ScrapeOutcome, SearchQuery,
    get_collector,
};
use crate::error::AppError;
use crate::models::Job;

/// Result of one search across all selected sources.
#[derive(Debug, Serialize)]
pub struct RunReport {
    pub session_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub query: SearchQuery,
    pub sources: Vec<ScrapeMetrics>,
    /// Jobs returned by all sources, before dedup.
    pub jobs_found: usize,
    /// Jobs kept after dedup; `jobs_found - duplicates_removed`.
    pub jobs_saved: usize,
    pub duplicates_removed: usize,
    pub jobs: Vec<Job>,
}

impl RunReport {
    /// Write the report as JSON to `output`, or to stdout when `None`.
    pub fn write_to(&self, output: Option<&Path>, pretty: bool) -> Result<(), AppError> {
        let json = if pretty {
            serde_json::to_string_pretty(self)?
        } else {
            serde_json::to_string(self)?
        };

        match output {
            Some(path) => {
                std::fs::write(path, json)?;
                tracing::info!("Report written to {}", path.display());
            }
            None => {
                let mut stdout = std::io::stdout().lock();
                writeln!(stdout, "{json}")?;
            }
        }
        Ok(())
    }
}

/// Build one collector per profile. `base_urls` maps source names
/// (any case) to URL overrides.
pub fn build_collectors(
    profiles: &[&SourceProfile],
    backend: Backend,
    http: &HttpSettings,
    base_urls: &HashMap<String, String>,
    span: &tracing::Span,
) -> Result<Vec<Arc<dyn JobCollector>>, AppError> {
    let overrides: HashMap<String, &String> = base_urls
        .iter()
        .map(|(name, url)| (name.to_lowercase(), url))
        .collect();

    profiles
        .iter()
        .map(|profile| {
            let options = CollectorOptions {
                base_url: overrides.get(&profile.name.to_lowercase()).map(|u| u.to_string()),
                span: Some(span.clone()),
                http: http.clone(),
            };
            get_collector(profile.name, backend, options)
        })
        .collect()
}

/// Runs a set of collectors concurrently and merges their output.
pub struct Runner {
    collectors: Vec<Arc<dyn JobCollector>>,
    timeout: Duration,
}

impl Runner {
    pub fn new(collectors: Vec<Arc<dyn JobCollector>>, timeout: Duration) -> Self {
        Runner {
            collectors,
            timeout,
        }
    }

    /// Run every collector on its own task. Output keeps collector order;
    /// a collector that panics or times out contributes nothing.
    pub async fn run(&self, query: &SearchQuery) -> RunReport {
        let session_id = Uuid::new_v4();
        let started_at = Utc::now();
        tracing::info!(
            "Run {session_id} started: '{}' across {} sources",
            query.keywords(),
            self.collectors.len()
        );

        let handles: Vec<_> = self
            .collectors
            .iter()
            .map(|collector| {
                let collector = Arc::clone(collector);
                let query = query.clone();
                let timeout = self.timeout;
                let name = collector.name().to_string();
                let handle = tokio::spawn(async move {
                    let started = Instant::now();
                    match tokio::time::timeout(timeout, collector.scrape_jobs(&query)).await {
                        Ok(outcome) => outcome,
                        Err(_) => {
                            tracing::warn!("{} timed out after {timeout:?}", collector.name());
                            ScrapeOutcome::failed(
                                collector.name(),
                                format!("timed out after {timeout:?}"),
                                started.elapsed(),
                            )
                        }
                    }
                });
                (name, handle)
            })
            .collect();

        let mut outcomes = Vec::with_capacity(handles.len());
        for (name, handle) in handles {
            let outcome = match handle.await {
                Ok(outcome) => outcome,
                Err(e) => {
                    tracing::error!("{name} task failed: {e}");
                    ScrapeOutcome::failed(&name, format!("task failed: {e}"), Duration::ZERO)
                }
            };
            outcomes.push(outcome);
        }

        let (sources, jobs, duplicates_removed) = merge(outcomes);
        let finished_at = Utc::now();
        let jobs_found = jobs.len() + duplicates_removed;
        tracing::info!(
            "Run {session_id} completed: {jobs_found} found, {} saved, {duplicates_removed} duplicates removed",
            jobs.len()
        );

        RunReport {
            session_id,
            started_at,
            finished_at,
            query: query.clone(),
            sources,
            jobs_found,
            jobs_saved: jobs.len(),
            duplicates_removed,
            jobs,
        }
    }
}

/// Concatenate outcomes in order, dropping repeated (source, url) pairs and
/// listings whose content fingerprint was already seen.
fn merge(outcomes: Vec<ScrapeOutcome>) -> (Vec<ScrapeMetrics>, Vec<Job>, usize) {
    let mut seen_urls = HashSet::new();
    let mut seen_fingerprints = HashSet::new();
    let mut sources = Vec::with_capacity(outcomes.len());
    let mut jobs = Vec::new();
    let mut duplicates = 0;

    for outcome in outcomes {
        sources.push(outcome.metrics);
        for job in outcome.jobs {
            let key = (job.source().to_string(), job.url().to_string());
            let print = fingerprint(&job);
            if seen_urls.contains(&key) || seen_fingerprints.contains(&print) {
                duplicates += 1;
                continue;
            }
            seen_urls.insert(key);
            seen_fingerprints.insert(print);
            jobs.push(job);
        }
    }

    (sources, jobs, duplicates)
}

/// Hex SHA-256 over lowercased title, company and location.
pub fn fingerprint(job: &Job) -> String {
    let content = format!(
        "{}|{}|{}",
        job.title(),
        job.company().name(),
        job.location()
    )
    .to_lowercase();
    hex::encode(Sha256::digest(content.as_bytes()))
}
