use super::types::RetryConfig;
use super::utils::calculate_delay;
use crate::core::{ScraperError, ScraperResult};
use crate::stats::StatsTracker;
use log::{debug, warn};
use std::future::Future;
use std::sync::Arc;
use tokio::time::sleep;

/// Re-runs extraction steps that race the page's lazy rendering.
///
/// Only [`ScraperError::TransientRender`] failures are retried. Every other
/// error is returned on the spot, and an exhausted budget surfaces as
/// [`ScraperError::ExtractionExhausted`] carrying the last transient cause.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    config: RetryConfig,
    stats: Arc<StatsTracker>,
}

impl RetryPolicy {
    pub fn new(config: RetryConfig) -> Self {
        Self {
            config,
            stats: Arc::new(StatsTracker::new()),
        }
    }

    pub fn with_stats(mut self, stats: Arc<StatsTracker>) -> Self {
        self.stats = stats;
        self
    }

    pub fn config(&self) -> &RetryConfig {
        &self.config
    }

    pub async fn run<T, F, Fut>(&self, operation: &str, mut step: F) -> ScraperResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = ScraperResult<T>>,
    {
        let max_attempts = self.config.max_attempts.max(1);
        let mut attempt = 1;

        loop {
            match step().await {
                Ok(value) => {
                    if attempt > 1 {
                        debug!("{} succeeded on attempt {}", operation, attempt);
                    }
                    return Ok(value);
                }
                Err(error) if error.is_transient() => {
                    if attempt >= max_attempts {
                        warn!(
                            "{} exhausted {} attempts, giving up: {}",
                            operation, attempt, error
                        );
                        return Err(ScraperError::ExtractionExhausted {
                            operation: operation.to_string(),
                            attempts: attempt,
                            last_error: Box::new(error),
                        });
                    }

                    let delay = calculate_delay(&self.config, attempt);
                    warn!(
                        "Retry triggered for {} (attempt={}/{}, delay={:?}): {}",
                        operation, attempt, max_attempts, delay, error
                    );
                    self.stats.record_retry(operation);

                    sleep(delay).await;
                    attempt += 1;
                }
                Err(error) => return Err(error),
            }
        }
    }
}
