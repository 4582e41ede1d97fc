use super::types::*;
use std::time::Duration;

/// Delay to wait before retry number `retry` (1-based).
pub fn calculate_delay(config: &RetryConfig, retry: usize) -> Duration {
    let retry = retry.max(1);

    let delay = match config.backoff_policy {
        BackoffPolicy::Constant => config.base_delay,
        BackoffPolicy::Linear => config.base_delay.saturating_mul(retry as u32),
        BackoffPolicy::Exponential { factor } => {
            config.base_delay.mul_f32(factor.powi(retry as i32 - 1))
        }
    };

    std::cmp::min(delay, config.max_delay)
}
