pub mod browser;
pub mod config;
pub mod core;
pub mod model;
pub mod parser;
pub mod spider;
pub mod stats;
pub mod storage;
pub mod trigger;

pub use browser::{Browser, WebDriverBrowser};
pub use config::{ScrapeConfig, Selectors};
pub use crate::core::{run_scrape, Crawler, RunSummary, ScraperError, ScraperResult};
pub use model::PlayerRecord;
pub use stats::StatsTracker;
pub use storage::{DocumentStore, SnapshotStore};
