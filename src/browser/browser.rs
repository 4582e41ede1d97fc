use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BrowserError {
    #[error("HTTP client error: {0}")]
    HttpError(#[from] reqwest::Error),
    #[error("No element matches `{0}`")]
    NoSuchElement(String),
    #[error("Element for `{0}` is no longer attached to the page")]
    StaleElement(String),
    #[error("WebDriver error `{error}`: {message}")]
    WebDriver { error: String, message: String },
    #[error("Unexpected WebDriver response: {0}")]
    Protocol(String),
}

pub type BrowserResult<T> = Result<T, BrowserError>;

/// The automation capability the scraper drives.
///
/// One page cursor per instance; callers await each interaction before
/// issuing the next.
#[async_trait]
pub trait Browser: Send + Sync {
    async fn navigate(&self, url: &str) -> BrowserResult<()>;

    /// Clicks the first element matching `selector`.
    async fn click(&self, selector: &str) -> BrowserResult<()>;

    /// `textContent` of every element matching `selector`.
    async fn read_text(&self, selector: &str) -> BrowserResult<Vec<String>>;

    /// `innerText` of every element matching `selector`.
    async fn read_inner_text(&self, selector: &str) -> BrowserResult<Vec<String>>;

    async fn read_attribute(&self, selector: &str, name: &str) -> BrowserResult<Option<String>>;

    async fn count_matches(&self, selector: &str) -> BrowserResult<usize>;

    /// Runs a script returning rows of cell text.
    async fn evaluate(&self, script: &str) -> BrowserResult<Vec<Vec<String>>>;

    async fn close(&self) -> BrowserResult<()> {
        Ok(())
    }
}
