use std::time::Duration;

use httpmock::prelude::*;
use jobhunter::collectors::http::HttpSettings;
use jobhunter::collectors::{Backend, CollectorOptions, Limit, SearchQuery, get_collector};
use serde_json::json;

fn options(server: &MockServer) -> CollectorOptions {
    CollectorOptions {
        base_url: Some(server.base_url()),
        span: None,
        http: HttpSettings {
            timeout: Duration::from_secs(5),
            min_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
            ..HttpSettings::default()
        },
    }
}

fn feed() -> serde_json::Value {
    json!([
        {"last_updated": 1_700_000_000, "legal": "API terms of service"},
        {
            "id": "101",
            "epoch": 1_700_000_000,
            "position": "Senior Rust Engineer",
            "company": "Ferrous Co",
            "tags": ["rust", "backend"],
            "description": "<p>Build <b>async</b> services with Rust and PostgreSQL.</p>",
            "location": "Worldwide",
            "salary_min": 120000,
            "salary_max": 160000,
            "url": "https://remoteok.com/remote-jobs/101"
        },
        {
            "id": 102,
            "position": "Marketing Lead",
            "company": "Brandly",
            "tags": ["marketing"],
            "description": "SEO and content marketing",
            "salary_min": 0,
            "salary_max": 0
        },
        {
            "id": 103,
            "position": "Rust Contractor",
            "tags": ["rust"],
            "description": "Six month contract"
        }
    ])
}

#[tokio::test]
async fn parses_remoteok_feed() {
    let server = MockServer::start_async().await;
    let api_mock = server
        .mock_async(|when, then| {
            when.method(GET).path("/api");
            then.status(200)
                .header("content-type", "application/json")
                .json_body(feed());
        })
        .await;

    let collector = get_collector("remoteok", Backend::Live, options(&server)).unwrap();
    let query = SearchQuery::new("rust", "", Limit::new(10).unwrap()).unwrap();
    let outcome = collector.scrape_jobs(&query).await;

    api_mock.assert_async().await;
    assert!(outcome.metrics.error.is_none());
    assert_eq!(outcome.metrics.requests_made, 1);
    assert_eq!(outcome.jobs.len(), 2);

    let first = &outcome.jobs[0];
    assert_eq!(first.title(), "Senior Rust Engineer");
    assert_eq!(first.source(), "RemoteOK");
    assert_eq!(first.company().name(), "Ferrous Co");
    assert!(first.location().is_remote());
    assert_eq!(first.description(), "Build async services with Rust and PostgreSQL.");
    assert_eq!(first.url(), "https://remoteok.com/remote-jobs/101");
    assert_eq!(first.posted_date().unwrap().timestamp(), 1_700_000_000);
    let salary = first.salary().unwrap();
    assert_eq!(salary.min_amount(), 120000.0);
    assert_eq!(salary.max_amount(), Some(160000.0));
    assert!(first.skills().contains(&"Rust".to_string()));

    let second = &outcome.jobs[1];
    assert_eq!(second.company().name(), "Unknown");
    assert_eq!(second.url(), format!("{}/remote-jobs/103", server.base_url()));
    assert!(second.salary().is_none());

    let details = collector.get_job_details(first.url()).await;
    assert_eq!(details["source"], "RemoteOK");
    assert_eq!(details["tags"], json!(["rust", "backend"]));
    assert_eq!(details["location_text"], "Worldwide");

    assert_eq!(collector.stats().jobs_scraped, 2);
}

#[tokio::test]
async fn respects_limit() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/api");
            then.status(200).json_body(feed());
        })
        .await;

    let collector = get_collector("RemoteOK", Backend::Live, options(&server)).unwrap();
    let query = SearchQuery::new("rust", "", Limit::new(1).unwrap()).unwrap();
    let outcome = collector.scrape_jobs(&query).await;

    assert_eq!(outcome.jobs.len(), 1);
    assert_eq!(outcome.jobs[0].title(), "Senior Rust Engineer");
}

#[tokio::test]
async fn server_error_yields_empty_result() {
    let server = MockServer::start_async().await;
    let api_mock = server
        .mock_async(|when, then| {
            when.method(GET).path("/api");
            then.status(500);
        })
        .await;

    let collector = get_collector("RemoteOK", Backend::Live, options(&server)).unwrap();
    let query = SearchQuery::new("rust", "", Limit::default()).unwrap();
    let outcome = collector.scrape_jobs(&query).await;

    api_mock.assert_async().await;
    assert!(outcome.jobs.is_empty());
    assert_eq!(outcome.metrics.jobs_failed, 1);
    assert!(outcome.metrics.error.unwrap().contains("500"));
    assert_eq!(collector.stats().jobs_failed, 1);
}

#[tokio::test]
async fn malformed_feed_yields_empty_result() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/api");
            then.status(200).body("<html>maintenance</html>");
        })
        .await;

    let collector = get_collector("RemoteOK", Backend::Live, options(&server)).unwrap();
    let query = SearchQuery::new("rust", "", Limit::default()).unwrap();
    let outcome = collector.scrape_jobs(&query).await;

    assert!(outcome.jobs.is_empty());
    assert_eq!(outcome.metrics.jobs_failed, 1);
}

#[tokio::test]
async fn failed_call_leaves_no_cached_details() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/api");
            then.status(200).json_body(json!([
                {"id": 201, "position": "Rust Engineer", "tags": ["rust"]},
                {"position": "Rust Intern", "tags": ["rust"]}
            ]));
        })
        .await;

    let collector = get_collector("RemoteOK", Backend::Live, options(&server)).unwrap();
    let query = SearchQuery::new("rust", "", Limit::default()).unwrap();
    let outcome = collector.scrape_jobs(&query).await;

    assert!(outcome.jobs.is_empty());
    assert_eq!(outcome.metrics.jobs_failed, 1);

    let details = collector
        .get_job_details(&format!("{}/remote-jobs/201", server.base_url()))
        .await;
    assert_eq!(details["source"], "RemoteOK");
    assert!(!details.contains_key("tags"));
}
