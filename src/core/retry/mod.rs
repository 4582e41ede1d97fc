pub mod retry;
pub mod types;
mod utils;

pub use retry::RetryPolicy;
pub use types::{BackoffPolicy, RetryConfig};
pub use utils::calculate_delay;

#[cfg(test)]
mod tests;
