use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Instant;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::{Value, json};
use tracing::Instrument;
use url::Url;

use crate::collectors::http::HttpClient;
use crate::collectors::sources::{REMOTEOK, SourceKind};
use crate::collectors::{
    CollectorOptions, CollectorStats, JobCollector, JobDetails, ScrapeOutcome, SearchQuery,
    StatsCounter, parse_base_url, settle,
};
use crate::error::AppError;
use crate::models::{
    Company, Currency, ExtraData, Job, JobType, Location, NewJob, Salary, SalaryPeriod,
};
use crate::text::{clean_text, strip_tags};

/// Live collector for RemoteOK's public JSON feed.
pub struct RemoteOk {
    base: Url,
    base_url: String,
    http: HttpClient,
    span: tracing::Span,
    stats: StatsCounter,
    details: Mutex<HashMap<String, JobDetails>>,
}

impl RemoteOk {
    pub fn new(options: CollectorOptions) -> Result<Self, AppError> {
        let raw = options.base_url.as_deref().unwrap_or(REMOTEOK.base_url);
        let base = parse_base_url(raw)?;
        let base_url = raw.trim().trim_end_matches('/').to_string();

        Ok(RemoteOk {
            http: HttpClient::new(&options.http)?,
            span: options.collector_span(REMOTEOK.name),
            base,
            base_url,
            stats: StatsCounter::default(),
            details: Mutex::new(HashMap::new()),
        })
    }

    async fn fetch(&self, query: &SearchQuery, limit: usize) -> Result<Vec<Job>, AppError> {
        tracing::info!("Scraping RemoteOK for: {}", query.keywords());

        let url = format!("{}/api", self.base_url);
        let data = self.http.get_json(REMOTEOK.name, &url).await?;
        let entries = data
            .as_array()
            .ok_or_else(|| AppError::Parse("RemoteOK feed is not a JSON array".to_string()))?;

        let terms: Vec<String> = query
            .keywords()
            .split_whitespace()
            .map(str::to_lowercase)
            .collect();

        let mut jobs = Vec::new();
        for entry in entries {
            // The feed opens with a legal notice that has no position.
            let Some(title) = entry.get("position").and_then(Value::as_str) else {
                continue;
            };
            if !matches_terms(entry, title, &terms) || !matches_location(entry, query.location())
            {
                continue;
            }

            jobs.push(self.parse_entry(entry, title, query)?);
            if jobs.len() >= limit {
                break;
            }
        }

        tracing::debug!("RemoteOK feed had {} entries, {} matched", entries.len(), jobs.len());
        Ok(jobs)
    }

    fn parse_entry(&self, entry: &Value, title: &str, query: &SearchQuery) -> Result<Job, AppError> {
        let id = entry.get("id").map(|v| match v {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        });

        let url = match (str_field(entry, "url").or_else(|| str_field(entry, "apply_url")), &id) {
            (Some(url), _) => url.to_string(),
            (None, Some(id)) => self
                .base
                .join(&format!("/remote-jobs/{id}"))
                .map_err(|e| AppError::Parse(format!("RemoteOK listing id '{id}': {e}")))?
                .into(),
            (None, None) => {
                return Err(AppError::Parse(format!("RemoteOK listing '{title}' has no url or id")));
            }
        };

        let description = str_field(entry, "description")
            .map(strip_tags)
            .unwrap_or_default();
        let company = Company::new(str_field(entry, "company").unwrap_or("Unknown"))?;

        let mut extra = ExtraData::new();
        if let Some(id) = &id {
            extra.insert("remoteok_id".to_string(), json!(id));
        }
        if let Some(tags) = entry.get("tags").filter(|t| t.is_array()) {
            extra.insert("tags".to_string(), tags.clone());
        }
        if let Some(text) = str_field(entry, "location").map(clean_text).filter(|t| !t.is_empty()) {
            extra.insert("location_text".to_string(), json!(text));
        }
        if let Some(apply) = str_field(entry, "apply_url") {
            extra.insert("apply_url".to_string(), json!(apply));
        }

        Job::new(NewJob {
            title: title.to_string(),
            company,
            location: Location::Remote,
            job_type: JobType::classify(query.keywords(), &description),
            description,
            url,
            source: REMOTEOK.name.to_string(),
            salary: parse_salary(entry),
            posted_date: posted_date(entry),
            extra_data: extra,
        })
    }

    /// Replace the details cache with the jobs of the last successful call.
    fn remember(&self, jobs: &[Job]) {
        if let Ok(mut cache) = self.details.lock() {
            cache.clear();
            for job in jobs {
                cache.insert(job.url().to_string(), job.extra_data().clone());
            }
        }
    }
}

#[async_trait]
impl JobCollector for RemoteOk {
    fn name(&self) -> &str {
        REMOTEOK.name
    }

    fn base_url(&self) -> &str {
        &self.base_url
    }

    fn kind(&self) -> SourceKind {
        REMOTEOK.kind
    }

    async fn scrape_jobs(&self, query: &SearchQuery) -> ScrapeOutcome {
        let span = self.span.clone();
        async {
            let started = Instant::now();
            let limit = query.limit().capped(REMOTEOK.max_per_session);
            let result = self.fetch(query, limit).await;
            if let Ok(jobs) = &result {
                self.remember(jobs);
            }
            settle(REMOTEOK.name, &self.stats, started, 1, limit, result)
        }
        .instrument(span)
        .await
    }

    async fn get_job_details(&self, job_url: &str) -> JobDetails {
        let cached = self
            .details
            .lock()
            .ok()
            .and_then(|cache| cache.get(job_url).cloned());

        let mut details = cached.unwrap_or_else(|| {
            tracing::debug!(parent: &self.span, "No cached details for {job_url}");
            JobDetails::new()
        });
        details.insert("source".to_string(), json!(REMOTEOK.name));
        details.insert("remote".to_string(), json!(true));
        details
    }

    fn stats(&self) -> CollectorStats {
        self.stats.snapshot()
    }
}

fn str_field<'a>(entry: &'a Value, key: &str) -> Option<&'a str> {
    entry
        .get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

/// Any keyword appears in the title, tags or description.
fn matches_terms(entry: &Value, title: &str, terms: &[String]) -> bool {
    let mut haystack = title.to_lowercase();
    if let Some(tags) = entry.get("tags").and_then(Value::as_array) {
        for tag in tags.iter().filter_map(Value::as_str) {
            haystack.push(' ');
            haystack.push_str(&tag.to_lowercase());
        }
    }
    if let Some(description) = str_field(entry, "description") {
        haystack.push(' ');
        haystack.push_str(&description.to_lowercase());
    }
    terms.iter().any(|t| haystack.contains(t.as_str()))
}

/// Entries without a location, or open worldwide, match any location.
fn matches_location(entry: &Value, wanted: &str) -> bool {
    if wanted.is_empty() || wanted.eq_ignore_ascii_case("remote") {
        return true;
    }
    let Some(text) = str_field(entry, "location") else {
        return true;
    };
    let text = text.to_lowercase();
    text.contains("worldwide") || text.contains(&wanted.to_lowercase())
}

fn parse_salary(entry: &Value) -> Option<Salary> {
    let amount = |key: &str| {
        entry
            .get(key)
            .and_then(Value::as_f64)
            .filter(|v| *v > 0.0)
    };

    let (min, max) = match (amount("salary_min"), amount("salary_max")) {
        (Some(min), max) => (min, max),
        (None, Some(max)) => (max, None),
        (None, None) => return None,
    };

    match Salary::new(min, max, Currency::Usd, Some(SalaryPeriod::Year)) {
        Ok(salary) => Some(salary),
        Err(e) => {
            tracing::debug!("Ignoring RemoteOK salary: {e}");
            None
        }
    }
}

fn posted_date(entry: &Value) -> Option<DateTime<Utc>> {
    entry
        .get("epoch")
        .and_then(Value::as_i64)
        .and_then(|secs| DateTime::from_timestamp(secs, 0))
        .or_else(|| {
            str_field(entry, "date")
                .and_then(|d| DateTime::parse_from_rfc3339(d).ok())
                .map(|d| d.with_timezone(&Utc))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn salary_requires_positive_amounts() {
        let both = parse_salary(&json!({"salary_min": 90000, "salary_max": 120000})).unwrap();
        assert_eq!(both.min_amount(), 90000.0);
        assert_eq!(both.max_amount(), Some(120000.0));
        assert_eq!(both.period(), Some(SalaryPeriod::Year));

        assert!(parse_salary(&json!({"salary_min": 0, "salary_max": 0})).is_none());
        assert!(parse_salary(&json!({"salary_min": 120000, "salary_max": 90000})).is_none());

        let only_max = parse_salary(&json!({"salary_max": 70000})).unwrap();
        assert_eq!(only_max.min_amount(), 70000.0);
        assert_eq!(only_max.max_amount(), None);
    }

    #[test]
    fn keyword_match_looks_at_tags() {
        let entry = json!({"position": "Backend Engineer", "tags": ["Rust", "Postgres"]});
        assert!(matches_terms(&entry, "Backend Engineer", &["rust".to_string()]));
        assert!(!matches_terms(&entry, "Backend Engineer", &["python".to_string()]));
    }

    #[test]
    fn location_match_accepts_worldwide() {
        assert!(matches_location(&json!({"location": "Worldwide"}), "Berlin"));
        assert!(matches_location(&json!({"location": "Europe, Berlin"}), "berlin"));
        assert!(!matches_location(&json!({"location": "USA only"}), "Berlin"));
        assert!(matches_location(&json!({}), "Berlin"));
    }

    #[tokio::test]
    async fn details_cache_holds_only_the_last_call() {
        let collector = RemoteOk::new(CollectorOptions::default()).unwrap();
        let query = SearchQuery::new("rust", "", crate::collectors::Limit::default()).unwrap();
        let entry = |id: u32| json!({"id": id, "position": "Rust Engineer", "tags": ["rust"]});
        let first = collector.parse_entry(&entry(1), "Rust Engineer", &query).unwrap();
        let second = collector.parse_entry(&entry(2), "Rust Engineer", &query).unwrap();
        assert_eq!(first.url(), "https://remoteok.com/remote-jobs/1");

        collector.remember(std::slice::from_ref(&first));
        assert_eq!(collector.get_job_details(first.url()).await["tags"], json!(["rust"]));

        collector.remember(std::slice::from_ref(&second));
        assert!(!collector.get_job_details(first.url()).await.contains_key("tags"));
        assert!(collector.get_job_details(second.url()).await.contains_key("tags"));
        assert_eq!(collector.details.lock().unwrap().len(), 1);
    }

    #[test]
    fn rejects_unparseable_base_url() {
        let options = CollectorOptions {
            base_url: Some("remoteok.com".to_string()),
            ..CollectorOptions::default()
        };
        assert!(matches!(RemoteOk::new(options), Err(AppError::InvalidInput(_))));
    }

    #[test]
    fn posted_date_prefers_epoch() {
        let date = posted_date(&json!({"epoch": 1_700_000_000, "date": "2020-01-01T00:00:00+00:00"}));
        assert_eq!(date.unwrap().timestamp(), 1_700_000_000);

        let date = posted_date(&json!({"date": "2024-03-01T12:00:00+00:00"}));
        assert_eq!(date.unwrap().timestamp(), 1_709_294_400);
    }
}
