use chrono::{DateTime, Utc};
use log::info;
use parking_lot::RwLock;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ScrapingStats {
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub pages_completed: usize,
    pub players_extracted: usize,
    pub documents_persisted: usize,
    pub retry_count: usize,
    pub retry_reasons: HashMap<String, usize>,
}

/// Shared counters for a single scrape run.
#[derive(Debug, Clone)]
pub struct StatsTracker {
    stats: Arc<RwLock<ScrapingStats>>,
}

impl StatsTracker {
    pub fn new() -> Self {
        Self {
            stats: Arc::new(RwLock::new(ScrapingStats {
                start_time: Utc::now(),
                end_time: None,
                pages_completed: 0,
                players_extracted: 0,
                documents_persisted: 0,
                retry_count: 0,
                retry_reasons: HashMap::new(),
            })),
        }
    }

    pub fn record_player(&self) {
        self.stats.write().players_extracted += 1;
    }

    pub fn record_page(&self, persisted: usize) {
        let mut stats = self.stats.write();
        stats.pages_completed += 1;
        stats.documents_persisted += persisted;
    }

    pub fn record_retry(&self, operation: &str) {
        let mut stats = self.stats.write();
        stats.retry_count += 1;
        *stats
            .retry_reasons
            .entry(operation.to_string())
            .or_insert(0) += 1;
    }

    pub fn finish(&self) {
        self.stats.write().end_time = Some(Utc::now());
    }

    pub fn get_stats(&self) -> ScrapingStats {
        self.stats.read().clone()
    }

    pub fn print_summary(&self) {
        let stats = self.stats.read();
        let duration = stats
            .end_time
            .unwrap_or_else(Utc::now)
            .signed_duration_since(stats.start_time);

        info!("Scraping Statistics:");
        info!("  Duration: {} seconds", duration.num_seconds());
        info!("  Pages Completed: {}", stats.pages_completed);
        info!("  Players Extracted: {}", stats.players_extracted);
        info!("  Documents Persisted: {}", stats.documents_persisted);
        info!("  Retry Count: {}", stats.retry_count);

        for (operation, count) in &stats.retry_reasons {
            info!("    {}: {}", operation, count);
        }
    }
}

impl Default for StatsTracker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters() {
        let tracker = StatsTracker::new();
        tracker.record_player();
        tracker.record_player();
        tracker.record_page(2);
        tracker.record_retry("fixtures");
        tracker.record_retry("fixtures");
        tracker.record_retry("history");
        tracker.finish();

        let stats = tracker.get_stats();
        assert_eq!(stats.players_extracted, 2);
        assert_eq!(stats.pages_completed, 1);
        assert_eq!(stats.documents_persisted, 2);
        assert_eq!(stats.retry_count, 3);
        assert_eq!(stats.retry_reasons.get("fixtures"), Some(&2));
        assert!(stats.end_time.is_some());
    }

    #[test]
    fn test_clones_share_counters() {
        let tracker = StatsTracker::new();
        tracker.clone().record_player();
        assert_eq!(tracker.get_stats().players_extracted, 1);
    }
}
