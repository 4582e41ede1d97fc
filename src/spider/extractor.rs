use super::PageNavigator;
use crate::browser::Browser;
use crate::config::Selectors;
use crate::core::retry::RetryPolicy;
use crate::core::{ScraperError, ScraperResult};
use crate::model::{
    AggregateStats, FixtureRecord, GameweekStatRecord, HistoryRecord, PerNinetyStats, PlayerRecord,
    PlayerSummary, SeasonStats, SeasonTotals,
};
use crate::parser::{parse_fixtures, parse_player_summary, ParseError};
use crate::stats::StatsTracker;
use log::{debug, info};
use std::sync::Arc;

const SEASON_STATS: &str = "season_stats";
const HISTORY: &str = "history";
const FIXTURES: &str = "fixtures";

/// Turns every listing row of the current page into a [`PlayerRecord`].
///
/// The summary block is present as soon as the dialog opens and is read
/// once. The stats tables, the history table and the fixtures tab render
/// lazily, so each is read under the retry policy. Stats and history come
/// before fixtures, since opening the fixtures tab starts another render.
pub struct PlayerExtractor {
    browser: Arc<dyn Browser>,
    selectors: Selectors,
    retry: RetryPolicy,
    stats: Arc<StatsTracker>,
}

impl PlayerExtractor {
    pub fn new(
        browser: Arc<dyn Browser>,
        selectors: Selectors,
        retry: RetryPolicy,
        stats: Arc<StatsTracker>,
    ) -> Self {
        Self {
            browser,
            selectors,
            retry,
            stats,
        }
    }

    /// Extracts the page the navigator is on, in row order. Any failure
    /// fails the whole page.
    pub async fn extract_page(
        &self,
        navigator: &mut PageNavigator,
    ) -> ScraperResult<Vec<PlayerRecord>> {
        let rows = navigator.row_count().await?;
        let page = navigator.page_index() + 1;
        info!("Extracting {} players from page {}", rows, page);

        let mut batch = Vec::with_capacity(rows);
        for row in 0..rows {
            navigator.open_row(row).await?;
            let record = self.extract_player().await?;
            navigator.close_detail().await?;

            debug!(
                "Page {} row {}: {}{}",
                page,
                row,
                record.name(),
                if record.is_flagged() { " (flagged)" } else { "" }
            );
            self.stats.record_player();
            batch.push(record);
        }

        Ok(batch)
    }

    /// Reads the detail dialog that is currently open.
    pub async fn extract_player(&self) -> ScraperResult<PlayerRecord> {
        let summary = self.read_summary().await?;

        let season_stats = self
            .retry
            .run(SEASON_STATS, || self.read_season_stats())
            .await?;
        let history = self.retry.run(HISTORY, || self.read_history()).await?;

        self.browser
            .click(&self.selectors.fixtures_tab)
            .await
            .map_err(|e| ScraperError::navigation(format!("could not open fixtures tab: {}", e)))?;
        let fixtures = self.retry.run(FIXTURES, || self.read_fixtures()).await?;

        Ok(PlayerRecord::new(summary, season_stats, history, fixtures))
    }

    async fn read_summary(&self) -> ScraperResult<PlayerSummary> {
        let texts = self
            .browser
            .read_inner_text(&self.selectors.dialog_summary)
            .await?;
        let lines: Vec<String> = texts
            .first()
            .map(|text| text.split('\n').map(str::to_string).collect())
            .unwrap_or_default();
        Ok(parse_player_summary(&lines)?)
    }

    async fn read_season_stats(&self) -> ScraperResult<SeasonStats> {
        self.expect_rendered(SEASON_STATS, &self.selectors.season_table)
            .await?;

        let gameweek_stats = self
            .rows(SEASON_STATS, &self.selectors.gameweek_rows)
            .await?
            .iter()
            .map(|cells| GameweekStatRecord::from_cells(cells))
            .collect::<Result<Vec<_>, ParseError>>()?;

        let season_totals = self
            .rows(SEASON_STATS, &self.selectors.season_totals_row)
            .await?
            .first()
            .map(|cells| SeasonTotals::from_cells(cells))
            .transpose()?;

        let per_ninety = self
            .rows(SEASON_STATS, &self.selectors.per_ninety_row)
            .await?
            .first()
            .map(|cells| PerNinetyStats::from_cells(cells))
            .transpose()?;

        Ok(SeasonStats {
            gameweek_stats,
            aggregate_stats: AggregateStats {
                season_totals,
                per_ninety,
            },
        })
    }

    async fn read_history(&self) -> ScraperResult<Vec<HistoryRecord>> {
        self.expect_rendered(HISTORY, &self.selectors.history_section)
            .await?;

        let history = self
            .rows(HISTORY, &self.selectors.history_rows)
            .await?
            .iter()
            .map(|cells| HistoryRecord::from_cells(cells))
            .collect::<Result<Vec<_>, ParseError>>()?;
        Ok(history)
    }

    async fn read_fixtures(&self) -> ScraperResult<Vec<FixtureRecord>> {
        let texts = self
            .browser
            .read_text(&self.selectors.fixtures_body)
            .await
            .map_err(|e| ScraperError::from_read(FIXTURES, e))?;

        let text = texts.first().map(|t| t.trim()).unwrap_or_default();
        if text.is_empty() {
            return Err(ScraperError::transient(FIXTURES, "fixtures table is empty"));
        }

        Ok(parse_fixtures(text)?)
    }

    async fn expect_rendered(&self, operation: &str, container: &str) -> ScraperResult<()> {
        let found = self
            .browser
            .count_matches(container)
            .await
            .map_err(|e| ScraperError::from_read(operation, e))?;
        if found == 0 {
            return Err(ScraperError::transient(
                operation,
                format!("`{}` not rendered", container),
            ));
        }
        Ok(())
    }

    async fn rows(&self, operation: &str, row_selector: &str) -> ScraperResult<Vec<Vec<String>>> {
        self.browser
            .evaluate(&Selectors::rows_script(row_selector))
            .await
            .map_err(|e| ScraperError::from_read(operation, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::browser::{MockBrowser, MockPlayer, MockSite};
    use crate::core::retry::RetryConfig;
    use crate::model::{Gameweek, PlayerStatus, Severity};
    use std::time::Duration;
    use url::Url;

    struct Harness {
        browser: Arc<MockBrowser>,
        navigator: PageNavigator,
        extractor: PlayerExtractor,
        stats: Arc<StatsTracker>,
    }

    async fn harness(pages: Vec<Vec<MockPlayer>>, max_attempts: usize) -> Harness {
        let selectors = Selectors::default();
        let browser = Arc::new(MockBrowser::new(MockSite { pages }, selectors.clone()));
        let stats = Arc::new(StatsTracker::new());
        let retry = RetryPolicy::new(
            RetryConfig::default()
                .with_max_attempts(max_attempts)
                .with_base_delay(Duration::from_millis(1)),
        )
        .with_stats(stats.clone());

        let mut navigator = PageNavigator::new(browser.clone(), selectors.clone());
        navigator
            .start(&Url::parse("https://fantasy.example/statistics").unwrap())
            .await
            .unwrap();

        Harness {
            extractor: PlayerExtractor::new(browser.clone(), selectors, retry, stats.clone()),
            browser,
            navigator,
            stats,
        }
    }

    #[tokio::test]
    async fn test_extracts_rows_in_order() {
        let mut h = harness(
            vec![vec![MockPlayer::sample("Salah"), MockPlayer::sample("Saka")]],
            10,
        )
        .await;

        let batch = h.extractor.extract_page(&mut h.navigator).await.unwrap();

        assert_eq!(
            batch.iter().map(|p| p.name()).collect::<Vec<_>>(),
            vec!["Salah", "Saka"]
        );
        let salah = &batch[0];
        assert_eq!(salah.season_stats.gameweek_stats.len(), 2);
        assert_eq!(salah.season_stats.gameweek_stats[0].selected_by, 1204);
        assert_eq!(salah.season_stats.gameweek_stats[0].price, 7.5);
        assert!(salah.season_stats.aggregate_stats.season_totals.is_some());
        assert!(salah.season_stats.aggregate_stats.per_ninety.is_some());
        assert_eq!(salah.history.len(), 1);
        assert_eq!(salah.fixtures.len(), 2);
        assert_eq!(salah.fixtures[1].gameweek(), Gameweek::Tbc);

        assert_eq!(h.stats.get_stats().players_extracted, 2);
        assert_eq!(h.stats.get_stats().retry_count, 0);
    }

    #[tokio::test]
    async fn test_step_order_within_a_row() {
        let mut h = harness(vec![vec![MockPlayer::sample("Salah")]], 10).await;
        h.extractor.extract_page(&mut h.navigator).await.unwrap();

        let actions = h.browser.actions();
        let row_actions: Vec<&str> = actions
            .iter()
            .skip_while(|a| !a.starts_with("open row"))
            .map(String::as_str)
            .collect();
        assert_eq!(
            row_actions,
            vec![
                "open row 0",
                "read summary",
                "read gameweek",
                "read totals",
                "read per ninety",
                "read history",
                "open fixtures",
                "read fixtures",
                "close dialog",
            ]
        );
    }

    #[tokio::test]
    async fn test_lazy_tables_are_retried() {
        let player = MockPlayer::sample("Saka")
            .flagged("Knock - 75% chance of playing")
            .lazy(3, 2);
        let mut h = harness(vec![vec![player]], 10).await;

        let batch = h.extractor.extract_page(&mut h.navigator).await.unwrap();

        assert_eq!(
            batch[0].summary.status,
            PlayerStatus::Flagged {
                severity: Severity::Yellow,
                reason: "Knock - 75% chance of playing".to_string(),
            }
        );
        let stats = h.stats.get_stats();
        assert_eq!(stats.retry_count, 5);
        assert_eq!(stats.retry_reasons.get(SEASON_STATS), Some(&3));
        assert_eq!(stats.retry_reasons.get(FIXTURES), Some(&2));
        assert_eq!(stats.retry_reasons.get(HISTORY), None);
    }

    #[tokio::test]
    async fn test_exhausted_retries_fail_the_page() {
        let mut h = harness(vec![vec![MockPlayer::sample("Slow").lazy(50, 0)]], 3).await;

        match h.extractor.extract_page(&mut h.navigator).await {
            Err(ScraperError::ExtractionExhausted {
                operation,
                attempts,
                ..
            }) => {
                assert_eq!(operation, SEASON_STATS);
                assert_eq!(attempts, 3);
            }
            other => panic!("unexpected result: {other:?}"),
        }
        assert_eq!(h.stats.get_stats().players_extracted, 0);
    }

    #[tokio::test]
    async fn test_wrong_column_count_is_not_retried() {
        let mut player = MockPlayer::sample("Broken");
        player.history_rows[0].pop();
        let mut h = harness(vec![vec![player]], 10).await;

        let result = h.extractor.extract_page(&mut h.navigator).await;

        assert!(matches!(
            result,
            Err(ScraperError::Parse(ParseError::ColumnCount {
                table: "history",
                expected: 26,
                actual: 25,
            }))
        ));
        assert_eq!(h.stats.get_stats().retry_count, 0);
    }

    #[tokio::test]
    async fn test_missing_aggregate_rows_are_none() {
        let mut player = MockPlayer::sample("New Signing");
        player.season_totals = None;
        player.per_ninety = None;
        player.gameweek_rows.clear();
        let mut h = harness(vec![vec![player]], 10).await;

        let batch = h.extractor.extract_page(&mut h.navigator).await.unwrap();
        let season = &batch[0].season_stats;
        assert!(season.gameweek_stats.is_empty());
        assert_eq!(season.aggregate_stats, AggregateStats::default());
    }

    #[tokio::test]
    async fn test_fixture_text_without_terminator_is_a_parse_error() {
        let mut player = MockPlayer::sample("Odd");
        player.fixtures = "Sat 19 Oct 15:009ARS".to_string();
        let mut h = harness(vec![vec![player]], 10).await;

        assert!(matches!(
            h.extractor.extract_page(&mut h.navigator).await,
            Err(ScraperError::Parse(ParseError::MissingTerminator(_)))
        ));
    }
}
