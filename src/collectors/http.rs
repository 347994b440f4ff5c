use std::collections::VecDeque;
use std::time::Duration;

use rand::Rng;
use serde_json::Value;
use tokio::sync::Mutex;
use tokio::time::Instant;

use crate::error::AppError;

const USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:133.0) Gecko/20100101 Firefox/133.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10.15; rv:133.0) Gecko/20100101 Firefox/133.0",
];

const WINDOW: Duration = Duration::from_secs(60);

/// Request timeout and politeness settings for one source.
#[derive(Debug, Clone)]
pub struct HttpSettings {
    pub timeout: Duration,
    pub requests_per_minute: u32,
    pub min_delay: Duration,
    pub max_delay: Duration,
}

impl Default for HttpSettings {
    fn default() -> Self {
        HttpSettings {
            timeout: Duration::from_secs(30),
            requests_per_minute: 30,
            min_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(3),
        }
    }
}

/// Sliding one-minute window plus a random pause before every request.
#[derive(Debug)]
pub struct RateLimiter {
    per_minute: usize,
    min_delay: Duration,
    max_delay: Duration,
    sent: Mutex<VecDeque<Instant>>,
}

impl RateLimiter {
    pub fn new(settings: &HttpSettings) -> Self {
        RateLimiter {
            per_minute: settings.requests_per_minute.max(1) as usize,
            min_delay: settings.min_delay,
            max_delay: settings.max_delay,
            sent: Mutex::new(VecDeque::new()),
        }
    }

    pub async fn wait(&self) {
        let mut sent = self.sent.lock().await;

        let now = Instant::now();
        while sent
            .front()
            .is_some_and(|t| now.duration_since(*t) >= WINDOW)
        {
            sent.pop_front();
        }

        if sent.len() >= self.per_minute
            && let Some(oldest) = sent.front()
        {
            let pause = WINDOW.saturating_sub(now.duration_since(*oldest));
            tracing::debug!("Rate limit reached, waiting {}ms", pause.as_millis());
            tokio::time::sleep(pause).await;
            sent.pop_front();
        }

        tokio::time::sleep(self.jitter()).await;
        sent.push_back(Instant::now());
    }

    fn jitter(&self) -> Duration {
        let min = self.min_delay.as_millis() as u64;
        let max = self.max_delay.as_millis() as u64;
        if max <= min {
            return self.min_delay;
        }
        Duration::from_millis(rand::rng().random_range(min..=max))
    }
}

/// Shared HTTP plumbing for live collectors.
pub struct HttpClient {
    client: reqwest::Client,
    limiter: RateLimiter,
}

impl HttpClient {
    pub fn new(settings: &HttpSettings) -> Result<Self, AppError> {
        let user_agent = USER_AGENTS[rand::rng().random_range(0..USER_AGENTS.len())];
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .timeout(settings.timeout)
            .build()?;

        Ok(HttpClient {
            client,
            limiter: RateLimiter::new(settings),
        })
    }

    /// GET a JSON document, honouring the rate limit.
    pub async fn get_json(&self, source_name: &str, url: &str) -> Result<Value, AppError> {
        self.limiter.wait().await;
        tracing::debug!("GET {url}");

        let resp = self
            .client
            .get(url)
            .header("Accept", "application/json,text/html,*/*;q=0.8")
            .header("Accept-Language", "en-US,en;q=0.5")
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(AppError::Status {
                source_name: source_name.to_string(),
                status: resp.status(),
            });
        }

        resp.json()
            .await
            .map_err(|e| AppError::Parse(format!("{source_name} sent invalid JSON: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn jitter_stays_in_bounds() {
        let limiter = RateLimiter::new(&HttpSettings {
            min_delay: Duration::from_millis(10),
            max_delay: Duration::from_millis(20),
            ..HttpSettings::default()
        });
        for _ in 0..50 {
            let d = limiter.jitter();
            assert!(d >= Duration::from_millis(10) && d <= Duration::from_millis(20));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn waits_when_window_is_full() {
        let limiter = RateLimiter::new(&HttpSettings {
            requests_per_minute: 2,
            min_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
            ..HttpSettings::default()
        });

        let start = Instant::now();
        limiter.wait().await;
        limiter.wait().await;
        assert!(start.elapsed() < Duration::from_secs(1));

        limiter.wait().await;
        assert!(start.elapsed() >= WINDOW);
    }
}
