use crate::browser::Browser;
use crate::config::Selectors;
use crate::core::{ScraperError, ScraperResult};
use crate::parser::parse_page_count;
use log::{debug, info};
use std::sync::Arc;
use url::Url;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavState {
    /// `start` has not loaded the listing yet.
    NotStarted,
    /// Listing rows and pagination controls are visible.
    Listing,
    /// The detail dialog of one listing row is open.
    DetailOpen { row: usize },
}

/// Walks the paginated listing one page at a time.
///
/// ```text
/// NotStarted --start()-->       Listing
/// Listing    --open_row(i)-->   DetailOpen
/// DetailOpen --close_detail()-> Listing
/// Listing    --next_page()-->   Listing   (only while page_index < page_count - 1)
/// ```
pub struct PageNavigator {
    browser: Arc<dyn Browser>,
    selectors: Selectors,
    state: NavState,
    page_index: usize,
    page_count: usize,
}

impl PageNavigator {
    pub fn new(browser: Arc<dyn Browser>, selectors: Selectors) -> Self {
        Self {
            browser,
            selectors,
            state: NavState::NotStarted,
            page_index: 0,
            page_count: 0,
        }
    }

    pub fn state(&self) -> NavState {
        self.state
    }

    pub fn page_index(&self) -> usize {
        self.page_index
    }

    pub fn page_count(&self) -> usize {
        self.page_count
    }

    pub fn is_last_page(&self) -> bool {
        self.page_index + 1 >= self.page_count
    }

    /// Loads the listing, dismisses the consent banner and reads how many
    /// pages there are.
    pub async fn start(&mut self, listing_url: &Url) -> ScraperResult<usize> {
        info!("Opening listing at {}", listing_url);
        self.browser
            .navigate(listing_url.as_str())
            .await
            .map_err(|e| ScraperError::navigation(format!("could not load listing: {}", e)))?;

        self.browser
            .click(&self.selectors.consent_button)
            .await
            .map_err(|e| ScraperError::navigation(format!("could not accept consent: {}", e)))?;

        let label = self
            .browser
            .read_text(&self.selectors.pagination_label)
            .await
            .map_err(|e| ScraperError::navigation(format!("no pagination label: {}", e)))?;

        self.page_count = parse_page_count(&label)?;
        self.page_index = 0;
        self.state = NavState::Listing;

        info!("Listing has {} pages", self.page_count);
        Ok(self.page_count)
    }

    pub async fn row_count(&self) -> ScraperResult<usize> {
        self.expect_listing("count rows")?;
        Ok(self
            .browser
            .count_matches(&self.selectors.row_buttons)
            .await?)
    }

    pub async fn open_row(&mut self, row: usize) -> ScraperResult<()> {
        self.expect_listing("open a row")?;

        self.browser
            .click(&self.selectors.row_button(row))
            .await
            .map_err(|e| {
                ScraperError::navigation(format!(
                    "could not open row {} on page {}: {}",
                    row,
                    self.page_index + 1,
                    e
                ))
            })?;

        debug!("Opened row {} on page {}", row, self.page_index + 1);
        self.state = NavState::DetailOpen { row };
        Ok(())
    }

    pub async fn close_detail(&mut self) -> ScraperResult<()> {
        let NavState::DetailOpen { row } = self.state else {
            return Err(ScraperError::navigation("no detail dialog is open"));
        };

        self.browser
            .click(&self.selectors.dialog_close)
            .await
            .map_err(|e| {
                ScraperError::navigation(format!("could not close detail of row {}: {}", row, e))
            })?;

        self.state = NavState::Listing;
        Ok(())
    }

    pub async fn next_page(&mut self) -> ScraperResult<()> {
        self.expect_listing("change page")?;

        if self.is_last_page() {
            return Err(ScraperError::navigation(format!(
                "already on the last page ({} of {})",
                self.page_index + 1,
                self.page_count
            )));
        }

        let disabled = self
            .browser
            .read_attribute(&self.selectors.next_page_button, "disabled")
            .await
            .map_err(|e| ScraperError::navigation(format!("no next-page control: {}", e)))?;
        if disabled.is_some() {
            return Err(ScraperError::navigation(format!(
                "next-page control is disabled on page {} of {}",
                self.page_index + 1,
                self.page_count
            )));
        }

        self.browser
            .click(&self.selectors.next_page_button)
            .await
            .map_err(|e| ScraperError::navigation(format!("could not change page: {}", e)))?;

        self.page_index += 1;
        debug!("Moved to page {} of {}", self.page_index + 1, self.page_count);
        Ok(())
    }

    fn expect_listing(&self, action: &str) -> ScraperResult<()> {
        match self.state {
            NavState::Listing => Ok(()),
            NavState::NotStarted => Err(ScraperError::navigation(format!(
                "cannot {} before the listing is loaded",
                action
            ))),
            NavState::DetailOpen { row } => Err(ScraperError::navigation(format!(
                "cannot {} while row {} is open",
                action, row
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::browser::{MockBrowser, MockPlayer, MockSite};

    fn site(rows_per_page: &[usize]) -> MockSite {
        MockSite {
            pages: rows_per_page
                .iter()
                .map(|rows| vec![MockPlayer::default(); *rows])
                .collect(),
        }
    }

    fn navigator(rows_per_page: &[usize]) -> (Arc<MockBrowser>, PageNavigator) {
        let browser = Arc::new(MockBrowser::new(site(rows_per_page), Selectors::default()));
        let navigator = PageNavigator::new(browser.clone(), Selectors::default());
        (browser, navigator)
    }

    fn listing_url() -> Url {
        Url::parse("https://fantasy.example/statistics").unwrap()
    }

    #[tokio::test]
    async fn test_start_reads_page_count() {
        let (browser, mut navigator) = navigator(&[3, 3, 1]);

        assert_eq!(navigator.start(&listing_url()).await.unwrap(), 3);
        assert_eq!(navigator.page_index(), 0);
        assert_eq!(navigator.row_count().await.unwrap(), 3);
        assert_eq!(
            browser.actions(),
            vec![
                "navigate https://fantasy.example/statistics".to_string(),
                "accept consent".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn test_detail_state_transitions() {
        let (_, mut navigator) = navigator(&[2]);
        navigator.start(&listing_url()).await.unwrap();

        navigator.open_row(1).await.unwrap();
        assert_eq!(navigator.state(), NavState::DetailOpen { row: 1 });

        assert!(matches!(
            navigator.open_row(0).await,
            Err(ScraperError::Navigation(_))
        ));
        assert!(matches!(
            navigator.next_page().await,
            Err(ScraperError::Navigation(_))
        ));

        navigator.close_detail().await.unwrap();
        assert_eq!(navigator.state(), NavState::Listing);
        assert!(navigator.close_detail().await.is_err());
    }

    #[tokio::test]
    async fn test_next_page_stops_at_last_page() {
        let (browser, mut navigator) = navigator(&[1, 1]);
        navigator.start(&listing_url()).await.unwrap();

        assert!(!navigator.is_last_page());
        navigator.next_page().await.unwrap();
        assert_eq!(navigator.page_index(), 1);
        assert!(navigator.is_last_page());

        assert!(matches!(
            navigator.next_page().await,
            Err(ScraperError::Navigation(_))
        ));
        assert_eq!(browser.current_page(), 1);
    }

    #[tokio::test]
    async fn test_single_page_listing() {
        let (_, mut navigator) = navigator(&[4]);
        assert_eq!(navigator.start(&listing_url()).await.unwrap(), 1);
        assert!(navigator.is_last_page());
        assert!(navigator.next_page().await.is_err());
    }

    #[tokio::test]
    async fn test_actions_before_start_touch_nothing() {
        let (browser, mut navigator) = navigator(&[2, 2]);
        assert_eq!(navigator.state(), NavState::NotStarted);

        assert!(matches!(
            navigator.open_row(0).await,
            Err(ScraperError::Navigation(_))
        ));
        assert!(matches!(
            navigator.next_page().await,
            Err(ScraperError::Navigation(_))
        ));
        assert!(navigator.row_count().await.is_err());
        assert!(navigator.close_detail().await.is_err());
        assert!(browser.actions().is_empty());

        navigator.start(&listing_url()).await.unwrap();
        assert_eq!(navigator.state(), NavState::Listing);
    }
}
