use crate::browser::BrowserError;
use crate::parser::ParseError;
use crate::storage::StorageError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScraperError {
    /// A DOM subtree the step depends on has not been rendered yet.
    #[error("{operation}: content not rendered yet ({detail})")]
    TransientRender { operation: String, detail: String },

    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("{operation} failed after {attempts} attempts: {last_error}")]
    ExtractionExhausted {
        operation: String,
        attempts: usize,
        last_error: Box<ScraperError>,
    },

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Navigation error: {0}")]
    Navigation(String),

    #[error("Browser error: {0}")]
    Browser(#[from] BrowserError),

    #[error("Dataset {dataset} is locked by another run")]
    RunLocked { dataset: String },

    #[error("Configuration error: {0}")]
    Config(String),
}

impl ScraperError {
    pub fn transient(operation: &str, detail: impl Into<String>) -> Self {
        ScraperError::TransientRender {
            operation: operation.to_string(),
            detail: detail.into(),
        }
    }

    pub fn navigation(msg: impl Into<String>) -> Self {
        ScraperError::Navigation(msg.into())
    }

    /// Only unrendered content is worth another attempt.
    pub fn is_transient(&self) -> bool {
        matches!(self, ScraperError::TransientRender { .. })
    }

    /// Reclassifies a browser failure observed while reading a lazily
    /// rendered subtree.
    pub fn from_read(operation: &str, error: BrowserError) -> Self {
        match error {
            BrowserError::NoSuchElement(selector) | BrowserError::StaleElement(selector) => {
                ScraperError::transient(operation, format!("no element for `{}`", selector))
            }
            other => ScraperError::Browser(other),
        }
    }
}

pub type ScraperResult<T> = Result<T, ScraperError>;
