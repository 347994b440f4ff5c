// Source collectors: the shared contract every job site adapter implements,
// plus the registry that builds adapters by name.

pub mod http;
pub mod remoteok;
pub mod runner;
pub mod sources;
pub mod template;

use std::num::NonZeroUsize;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde::Serialize;
use url::Url;

use crate::error::AppError;
use crate::models::{ExtraData, Job};

use self::http::HttpSettings;
use self::remoteok::RemoteOk;
use self::sources::{SourceKind, SourceProfile};
use self::template::TemplateCollector;

/// Supplementary metadata for one listing.
pub type JobDetails = ExtraData;

const DEFAULT_LIMIT: usize = 50;

/// Maximum number of jobs one `scrape_jobs` call may return. Always > 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Limit(NonZeroUsize);

impl Limit {
    pub fn new(limit: usize) -> Result<Limit, AppError> {
        NonZeroUsize::new(limit)
            .map(Limit)
            .ok_or_else(|| AppError::InvalidInput("limit must be greater than zero".to_string()))
    }

    pub fn get(self) -> usize {
        self.0.get()
    }

    /// The limit further bounded by a source-specific cap.
    pub fn capped(self, cap: usize) -> usize {
        self.get().min(cap)
    }
}

impl Default for Limit {
    fn default() -> Self {
        Limit(NonZeroUsize::new(DEFAULT_LIMIT).unwrap_or(NonZeroUsize::MIN))
    }
}

impl std::str::FromStr for Limit {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let n: usize = s
            .trim()
            .parse()
            .map_err(|_| AppError::InvalidInput(format!("limit '{s}' is not a number")))?;
        Limit::new(n)
    }
}

/// Search parameters passed to every collector.
#[derive(Debug, Clone, Serialize)]
pub struct SearchQuery {
    keywords: String,
    location: String,
    limit: Limit,
}

impl SearchQuery {
    pub fn new(keywords: &str, location: &str, limit: Limit) -> Result<SearchQuery, AppError> {
        let keywords = keywords.split_whitespace().collect::<Vec<_>>().join(" ");
        if keywords.is_empty() {
            return Err(AppError::InvalidInput("keywords must not be empty".to_string()));
        }
        Ok(SearchQuery {
            keywords,
            location: location.trim().to_string(),
            limit,
        })
    }

    pub fn keywords(&self) -> &str {
        &self.keywords
    }

    pub fn location(&self) -> &str {
        &self.location
    }

    pub fn limit(&self) -> Limit {
        self.limit
    }
}

/// What one `scrape_jobs` call did.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ScrapeMetrics {
    pub source: String,
    pub jobs_scraped: u64,
    pub jobs_failed: u64,
    pub requests_made: u64,
    pub duration_ms: u64,
    pub error: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ScrapeOutcome {
    pub jobs: Vec<Job>,
    pub metrics: ScrapeMetrics,
}

impl ScrapeOutcome {
    /// An empty outcome for a call that never produced a result.
    pub fn failed(source: &str, error: impl Into<String>, elapsed: Duration) -> ScrapeOutcome {
        ScrapeOutcome {
            jobs: Vec::new(),
            metrics: ScrapeMetrics {
                source: source.to_string(),
                jobs_failed: 1,
                duration_ms: elapsed.as_millis() as u64,
                error: Some(error.into()),
                ..ScrapeMetrics::default()
            },
        }
    }
}

/// Running totals for one collector instance.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CollectorStats {
    pub calls: u64,
    pub jobs_scraped: u64,
    pub jobs_failed: u64,
    pub requests_made: u64,
}

#[derive(Debug, Default)]
pub struct StatsCounter {
    calls: AtomicU64,
    jobs_scraped: AtomicU64,
    jobs_failed: AtomicU64,
    requests_made: AtomicU64,
}

impl StatsCounter {
    pub fn record(&self, metrics: &ScrapeMetrics) {
        self.calls.fetch_add(1, Ordering::Relaxed);
        self.jobs_scraped
            .fetch_add(metrics.jobs_scraped, Ordering::Relaxed);
        self.jobs_failed.fetch_add(metrics.jobs_failed, Ordering::Relaxed);
        self.requests_made
            .fetch_add(metrics.requests_made, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> CollectorStats {
        CollectorStats {
            calls: self.calls.load(Ordering::Relaxed),
            jobs_scraped: self.jobs_scraped.load(Ordering::Relaxed),
            jobs_failed: self.jobs_failed.load(Ordering::Relaxed),
            requests_made: self.requests_made.load(Ordering::Relaxed),
        }
    }
}

/// Turn the result of one scrape attempt into an outcome. Failures are
/// logged and become an empty job list; successes are trimmed to `limit`.
pub(crate) fn settle(
    source: &str,
    stats: &StatsCounter,
    started: Instant,
    requests_made: u64,
    limit: usize,
    result: Result<Vec<Job>, AppError>,
) -> ScrapeOutcome {
    let outcome = match result {
        Ok(mut jobs) => {
            jobs.truncate(limit);
            tracing::info!("{source} produced {} jobs", jobs.len());
            ScrapeOutcome {
                metrics: ScrapeMetrics {
                    source: source.to_string(),
                    jobs_scraped: jobs.len() as u64,
                    requests_made,
                    duration_ms: started.elapsed().as_millis() as u64,
                    ..ScrapeMetrics::default()
                },
                jobs,
            }
        }
        Err(e) => {
            tracing::error!("{source} scraping failed: {e}");
            let mut outcome = ScrapeOutcome::failed(source, e.to_string(), started.elapsed());
            outcome.metrics.requests_made = requests_made;
            outcome
        }
    };
    stats.record(&outcome.metrics);
    outcome
}

/// Trait that all job collectors must implement.
/// Each collector retrieves listings from one external source and returns
/// them as normalized [`Job`] records.
#[async_trait]
pub trait JobCollector: Send + Sync {
    /// Source name stamped on every job this collector produces.
    fn name(&self) -> &str;

    fn base_url(&self) -> &str;

    fn kind(&self) -> SourceKind;

    /// Search the source. Never fails: errors are logged and yield an
    /// empty job list. At most `query.limit()` jobs are returned.
    async fn scrape_jobs(&self, query: &SearchQuery) -> ScrapeOutcome;

    /// Extra metadata for a listing previously returned by `scrape_jobs`.
    /// Always contains a `"source"` entry.
    async fn get_job_details(&self, job_url: &str) -> JobDetails;

    fn stats(&self) -> CollectorStats;
}

/// Which implementation backs a source.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Backend {
    /// Synthetic listings built from the source profile.
    #[default]
    Sample,
    /// Real fetch-and-parse where the source has one; sample data otherwise.
    Live,
}

/// Construction options shared by all collectors.
#[derive(Debug, Clone, Default)]
pub struct CollectorOptions {
    pub base_url: Option<String>,
    /// Parent span for the collector's log lines.
    pub span: Option<tracing::Span>,
    pub http: HttpSettings,
}

impl CollectorOptions {
    pub(crate) fn collector_span(&self, name: &str) -> tracing::Span {
        match &self.span {
            Some(parent) => tracing::info_span!(parent: parent, "collector", source = %name),
            None => tracing::info_span!("collector", source = %name),
        }
    }
}

/// Parse a source base URL. Only absolute http(s) URLs with a host are
/// accepted.
pub fn parse_base_url(raw: &str) -> Result<Url, AppError> {
    let invalid = || AppError::InvalidInput(format!("'{raw}' is not an http(s) base url"));
    let url = Url::parse(raw.trim()).map_err(|_| invalid())?;
    if !matches!(url.scheme(), "http" | "https") || !url.has_host() {
        return Err(invalid());
    }
    Ok(url)
}

/// Look up a source profile by name, ignoring case.
pub fn find_profile(name: &str) -> Option<&'static SourceProfile> {
    sources::catalogue()
        .iter()
        .find(|p| p.name.eq_ignore_ascii_case(name.trim()))
}

/// Build the collector registered under `name`.
pub fn get_collector(
    name: &str,
    backend: Backend,
    options: CollectorOptions,
) -> Result<Arc<dyn JobCollector>, AppError> {
    let profile =
        find_profile(name).ok_or_else(|| AppError::UnknownSource(name.trim().to_string()))?;

    if backend == Backend::Live {
        if profile.name == sources::REMOTEOK.name {
            return Ok(Arc::new(RemoteOk::new(options)?));
        }
        tracing::debug!("{} has no live backend, using sample data", profile.name);
    }

    Ok(Arc::new(TemplateCollector::new(profile.clone(), options)?))
}

/// Filters applied when no explicit source list is given.
#[derive(Debug, Clone, Copy, Default)]
pub struct SourceFilter {
    pub remote_only: bool,
    pub freelance_only: bool,
}

/// Pick sources in registry order. An explicit list wins over the filter;
/// unknown names are rejected.
pub fn select_sources(
    requested: &[String],
    filter: SourceFilter,
) -> Result<Vec<&'static SourceProfile>, AppError> {
    if !requested.is_empty() {
        let mut selected: Vec<&'static SourceProfile> = Vec::with_capacity(requested.len());
        for name in requested {
            let profile =
                find_profile(name).ok_or_else(|| AppError::UnknownSource(name.clone()))?;
            if !selected.iter().any(|p| p.name == profile.name) {
                selected.push(profile);
            }
        }
        selected.sort_by_key(|p| p.priority);
        return Ok(selected);
    }

    let selected = sources::catalogue()
        .iter()
        .filter(|p| !filter.remote_only || p.kind == SourceKind::Remote)
        .filter(|p| !filter.freelance_only || p.kind == SourceKind::Freelance)
        .collect();
    Ok(selected)
}
