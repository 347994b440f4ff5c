use std::time::Instant;

use async_trait::async_trait;
use serde_json::json;
use tracing::Instrument;
use url::Url;

use crate::collectors::sources::{Listing, SampleContext, SourceKind, SourceProfile};
use crate::collectors::{
    CollectorOptions, CollectorStats, JobCollector, JobDetails, ScrapeOutcome, SearchQuery,
    StatsCounter, parse_base_url, settle,
};
use crate::error::AppError;
use crate::models::{Job, JobType, NewJob};
use crate::text::title_case;

/// A collector driven entirely by a [`SourceProfile`]: the profile supplies
/// the listings, this type supplies the shared control flow.
pub struct TemplateCollector {
    profile: SourceProfile,
    base: Url,
    base_url: String,
    span: tracing::Span,
    stats: StatsCounter,
}

impl TemplateCollector {
    pub fn new(profile: SourceProfile, options: CollectorOptions) -> Result<Self, AppError> {
        let raw = options.base_url.as_deref().unwrap_or(profile.base_url);
        let base = parse_base_url(raw)?;
        let base_url = raw.trim().trim_end_matches('/').to_string();
        let span = options.collector_span(profile.name);

        Ok(TemplateCollector {
            profile,
            base,
            base_url,
            span,
            stats: StatsCounter::default(),
        })
    }

    fn build_jobs(&self, query: &SearchQuery, limit: usize) -> Result<Vec<Job>, AppError> {
        tracing::info!("Scraping {} for: {}", self.profile.name, query.keywords());

        let ctx = SampleContext {
            keywords: query.keywords(),
            title: title_case(query.keywords()),
            location: query.location(),
            companies: self.profile.companies,
            limit,
        };

        let listings = (self.profile.generate)(&ctx)?;
        listings
            .into_iter()
            .take(limit)
            .map(|listing| self.to_job(listing, query))
            .collect()
    }

    fn to_job(&self, listing: Listing, query: &SearchQuery) -> Result<Job, AppError> {
        let posted_date = listing.posted_date();
        let job_type = listing
            .job_type
            .unwrap_or_else(|| JobType::classify(query.keywords(), &listing.description));
        let url = self.base.join(&listing.path).map_err(|e| {
            AppError::InvalidRecord(format!("bad listing path '{}': {e}", listing.path))
        })?;

        Job::new(NewJob {
            title: listing.title,
            company: listing.company,
            location: listing.location,
            description: listing.description,
            url: url.into(),
            source: self.profile.name.to_string(),
            job_type,
            salary: listing.salary,
            posted_date: Some(posted_date),
            extra_data: listing.extra,
        })
    }
}

#[async_trait]
impl JobCollector for TemplateCollector {
    fn name(&self) -> &str {
        self.profile.name
    }

    fn base_url(&self) -> &str {
        &self.base_url
    }

    fn kind(&self) -> SourceKind {
        self.profile.kind
    }

    async fn scrape_jobs(&self, query: &SearchQuery) -> ScrapeOutcome {
        let span = self.span.clone();
        async {
            let started = Instant::now();
            let limit = query.limit().capped(self.profile.max_per_session);
            let result = self.build_jobs(query, limit);
            settle(self.profile.name, &self.stats, started, 0, limit, result)
        }
        .instrument(span)
        .await
    }

    async fn get_job_details(&self, job_url: &str) -> JobDetails {
        let mut details = if job_url.starts_with(&self.base_url) {
            (self.profile.details)(job_url)
        } else {
            tracing::warn!(parent: &self.span, "{job_url} is not a {} listing", self.profile.name);
            JobDetails::from([("error".to_string(), json!("listing not from this source"))])
        };
        details.insert("source".to_string(), json!(self.profile.name));
        details
    }

    fn stats(&self) -> CollectorStats {
        self.stats.snapshot()
    }
}
