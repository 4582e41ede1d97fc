mod crawler;
mod errors;
pub mod retry;

pub use crawler::{run_scrape, Crawler, RunSummary};
pub use errors::{ScraperError, ScraperResult};
