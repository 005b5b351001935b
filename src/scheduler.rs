//! Scrape Scheduler
//! Mission: Kick the scrape endpoint on a fixed interval, with a real lifecycle

use crate::error::{Error, Result};
use reqwest::Client;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::interval;
use tracing::{error, info, warn};

/// Periodically POSTs the configured scrape endpoint. Constructed explicitly
/// and started/stopped by the owner, so tests can call `trigger` directly
/// instead of waiting on a timer.
///
/// Invocations are fire-and-forget: nothing prevents a slow run from
/// overlapping the next tick. The store-level URL uniqueness keeps dedup
/// correct even then.
pub struct ScrapeScheduler {
    endpoint: String,
    period: Duration,
    client: Client,
    handle: Option<JoinHandle<()>>,
}

impl ScrapeScheduler {
    pub fn new(endpoint: impl Into<String>, period: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| Error::Internal(anyhow::anyhow!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            endpoint: endpoint.into(),
            period,
            client,
            handle: None,
        })
    }

    /// Fire the scrape endpoint exactly once.
    pub async fn trigger(&self) -> Result<()> {
        let response = self
            .client
            .post(&self.endpoint)
            .send()
            .await
            .map_err(|e| Error::Scrape(format!("Scrape trigger failed: {e}")))?;

        if !response.status().is_success() {
            return Err(Error::Scrape(format!(
                "Scrape endpoint returned {}",
                response.status()
            )));
        }
        Ok(())
    }

    /// Spawn the periodic task. Calling `start` on a running scheduler is a
    /// no-op.
    pub fn start(&mut self) {
        if self.handle.is_some() {
            warn!("scheduler already running");
            return;
        }

        let endpoint = self.endpoint.clone();
        let period = self.period;
        let client = self.client.clone();

        info!(
            endpoint = %endpoint,
            period_secs = period.as_secs(),
            "⏱️  Scrape scheduler started"
        );

        self.handle = Some(tokio::spawn(async move {
            let mut ticker = interval(period);
            // The first tick fires immediately; skip it so the service
            // finishes binding before the first self-call.
            ticker.tick().await;

            loop {
                ticker.tick().await;
                match client.post(&endpoint).send().await {
                    Ok(response) if response.status().is_success() => {}
                    Ok(response) => {
                        error!(status = %response.status(), "scheduled scrape returned error")
                    }
                    Err(e) => error!("scheduled scrape failed: {e}"),
                }
            }
        }));
    }

    /// Abort the periodic task if it is running.
    pub fn stop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
            info!("⏹️  Scrape scheduler stopped");
        }
    }

    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }
}

impl Drop for ScrapeScheduler {
    fn drop(&mut self) {
        self.stop();
    }
}
