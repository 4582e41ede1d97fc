use super::retry::RetryPolicy;
use super::{ScraperError, ScraperResult};
use crate::browser::{Browser, WebDriverBrowser};
use crate::config::ScrapeConfig;
use crate::spider::{PageNavigator, PlayerExtractor};
use crate::stats::{ScrapingStats, StatsTracker};
use crate::storage::{create_store, DocumentStore, SnapshotStore};
use log::{error, info, warn};
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunSummary {
    pub run_id: String,
    pub dataset: String,
    pub pages: usize,
    pub stats: ScrapingStats,
}

/// Drives one full scrape: every listing page is extracted into staging,
/// and staging replaces live only after the last page succeeded.
pub struct Crawler {
    browser: Arc<dyn Browser>,
    snapshot: SnapshotStore,
    config: ScrapeConfig,
}

impl Crawler {
    pub fn new(browser: Arc<dyn Browser>, store: Arc<dyn DocumentStore>, config: ScrapeConfig) -> Self {
        info!("Initializing crawler for dataset {}", config.dataset);
        Self {
            browser,
            snapshot: SnapshotStore::new(store, &config.dataset),
            config,
        }
    }

    pub fn snapshot(&self) -> &SnapshotStore {
        &self.snapshot
    }

    pub async fn run(&self) -> ScraperResult<RunSummary> {
        let run_id = Uuid::now_v7().to_string();
        let stats = Arc::new(StatsTracker::new());

        if !self
            .snapshot
            .acquire_lock(&run_id, self.config.lock_ttl)
            .await?
        {
            return Err(ScraperError::RunLocked {
                dataset: self.config.dataset.clone(),
            });
        }
        info!("Run {} started on {}", run_id, self.config.dataset);

        let result = self.scrape(&run_id, &stats).await;

        if let Err(e) = self.snapshot.release_lock(&run_id).await {
            warn!("Could not release run lock {}: {}", run_id, e);
        }
        stats.finish();
        stats.print_summary();

        match result {
            Ok(pages) => {
                info!("Run {} committed {} pages", run_id, pages);
                Ok(RunSummary {
                    run_id,
                    dataset: self.config.dataset.clone(),
                    pages,
                    stats: stats.get_stats(),
                })
            }
            Err(e) => {
                error!("Run {} aborted, live data left unchanged: {}", run_id, e);
                Err(e)
            }
        }
    }

    async fn scrape(&self, run_id: &str, stats: &Arc<StatsTracker>) -> ScraperResult<usize> {
        self.snapshot.begin_run().await?;

        let retry = RetryPolicy::new(self.config.retry.clone()).with_stats(Arc::clone(stats));
        let extractor = PlayerExtractor::new(
            Arc::clone(&self.browser),
            self.config.selectors.clone(),
            retry,
            Arc::clone(stats),
        );
        let mut navigator =
            PageNavigator::new(Arc::clone(&self.browser), self.config.selectors.clone());

        let page_count = navigator.start(&self.config.listing_url).await?;

        loop {
            let batch = extractor.extract_page(&mut navigator).await?;
            let persisted = self.snapshot.append_batch(&batch).await?;
            stats.record_page(persisted);
            info!(
                "Page {}/{} staged ({} players)",
                navigator.page_index() + 1,
                page_count,
                persisted
            );
            self.keep_lock(run_id).await?;

            if navigator.is_last_page() {
                break;
            }
            navigator.next_page().await?;
        }

        self.snapshot.commit().await?;
        Ok(page_count)
    }

    /// Extends the run lease; a run that lost it must not commit.
    async fn keep_lock(&self, run_id: &str) -> ScraperResult<()> {
        if self
            .snapshot
            .renew_lock(run_id, self.config.lock_ttl)
            .await?
        {
            return Ok(());
        }
        warn!("Run {} lost the lock on {}", run_id, self.config.dataset);
        Err(ScraperError::RunLocked {
            dataset: self.config.dataset.clone(),
        })
    }
}

/// Connects to the configured browser and store, runs one scrape, and
/// closes the browser session whatever the outcome.
pub async fn run_scrape(config: ScrapeConfig) -> ScraperResult<RunSummary> {
    let store = create_store(config.store.clone()).await?;
    let browser = Arc::new(WebDriverBrowser::connect(config.webdriver_url.clone(), config.headless()).await?);

    let crawler = Crawler::new(browser.clone(), store, config);
    let result = crawler.run().await;

    if let Err(e) = browser.close().await {
        warn!("Could not close browser session: {}", e);
    }
    result
}
