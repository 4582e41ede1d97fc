use crate::core::retry::RetryConfig;
use crate::core::{ScraperError, ScraperResult};
use crate::storage::StoreType;
use std::env;
use std::str::FromStr;
use std::time::Duration;
use url::Url;

pub const DEFAULT_LISTING_URL: &str = "https://fantasy.premierleague.com/statistics";
pub const DEFAULT_WEBDRIVER_URL: &str = "http://localhost:9515";
pub const DEFAULT_DATABASE: &str = "fpl-stats";
pub const DEFAULT_DATASET: &str = "players";

const DIALOG: &str = r#"div#root-dialog > div[role="presentation"] > dialog > div"#;
const DIALOG_SECTION: &str =
    r#"div#root-dialog > div[role="presentation"] > dialog > div > div:nth-child(2)"#;
const LISTING_TABLE: &str = "main > div > div:nth-child(2) > div > div > table";

/// CSS selectors for the statistics page markup.
#[derive(Debug, Clone, PartialEq)]
pub struct Selectors {
    pub consent_button: String,
    pub pagination_label: String,
    pub next_page_button: String,
    pub row_buttons: String,
    pub dialog_summary: String,
    pub dialog_close: String,
    pub season_table: String,
    pub gameweek_rows: String,
    pub season_totals_row: String,
    pub per_ninety_row: String,
    pub history_section: String,
    pub history_rows: String,
    pub fixtures_tab: String,
    pub fixtures_body: String,
}

impl Default for Selectors {
    fn default() -> Self {
        Self {
            consent_button: "button#onetrust-accept-btn-handler".to_string(),
            pagination_label: "main > div > div:nth-child(2) > div > div > div > div".to_string(),
            next_page_button: "main > div#root > div:nth-child(2) > div > div:nth-child(1) > div:nth-child(5) > button:nth-child(4)".to_string(),
            row_buttons: format!("{LISTING_TABLE} tbody tr > td:nth-child(1) > button:nth-child(1)"),
            dialog_summary: format!("{DIALOG_SECTION} > div:nth-child(1)"),
            dialog_close: format!("{DIALOG} div:nth-child(1) button"),
            season_table: format!("{DIALOG_SECTION} > div:nth-child(2) > div:nth-child(2) > div > div > table:nth-child(1)"),
            gameweek_rows: format!("{DIALOG_SECTION} > div:nth-child(2) > div:nth-child(2) > div > div > table:nth-child(1) > tbody > tr"),
            season_totals_row: format!("{DIALOG_SECTION} > div:nth-child(2) > div:nth-child(2) > div > div > table:nth-child(1) > tfoot > tr:nth-child(1)"),
            per_ninety_row: format!("{DIALOG_SECTION} > div:nth-child(2) > div:nth-child(2) > div > div > table:nth-child(1) > tfoot > tr:nth-child(2)"),
            history_section: format!("{DIALOG_SECTION} > div:nth-child(2) > div:nth-child(3)"),
            history_rows: format!("{DIALOG_SECTION} > div:nth-child(2) > div:nth-child(3) > div > div > table > tbody > tr"),
            fixtures_tab: format!("{DIALOG_SECTION} > div:nth-child(2) > ul > li:nth-child(2) > a"),
            fixtures_body: format!("{DIALOG_SECTION} > div:nth-child(2) > div:nth-child(2) > div > div > table:nth-child(2) > tbody"),
        }
    }
}

impl Selectors {
    /// Info button of the listing row at `row` (0-based).
    pub fn row_button(&self, row: usize) -> String {
        self.row_buttons
            .replacen(" tr > ", &format!(" tr:nth-child({}) > ", row + 1), 1)
    }

    /// Script returning the `td` text of every row matching `row_selector`.
    /// Header cells (`th`) are left out, so label columns never count
    /// towards a row's width.
    pub fn rows_script(row_selector: &str) -> String {
        format!(
            "return Array.from(document.querySelectorAll({})).map(row => Array.from(row.querySelectorAll('td')).map(cell => cell.innerText.trim()));",
            serde_json::Value::from(row_selector)
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Environment {
    Prod,
    #[default]
    Dev,
}

impl FromStr for Environment {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim() {
            "prod" => Environment::Prod,
            _ => Environment::Dev,
        })
    }
}

#[derive(Debug, Clone)]
pub struct ScrapeConfig {
    pub listing_url: Url,
    pub webdriver_url: Url,
    pub dataset: String,
    pub store: StoreType,
    pub retry: RetryConfig,
    pub selectors: Selectors,
    pub lock_ttl: Duration,
    pub environment: Environment,
}

impl Default for ScrapeConfig {
    fn default() -> Self {
        Self {
            listing_url: Url::parse(DEFAULT_LISTING_URL).expect("valid default listing url"),
            webdriver_url: Url::parse(DEFAULT_WEBDRIVER_URL).expect("valid default webdriver url"),
            dataset: DEFAULT_DATASET.to_string(),
            store: StoreType::Disk {
                path: "data".to_string(),
            },
            retry: RetryConfig::default(),
            selectors: Selectors::default(),
            lock_ttl: Duration::from_secs(2 * 60 * 60),
            environment: Environment::default(),
        }
    }
}

fn var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|value| !value.trim().is_empty())
}

fn parse_var<T: FromStr>(name: &str) -> ScraperResult<Option<T>> {
    var(name)
        .map(|raw| {
            raw.trim()
                .parse::<T>()
                .map_err(|_| ScraperError::Config(format!("{} has an invalid value: {}", name, raw)))
        })
        .transpose()
}

fn parse_url(name: &str, raw: &str) -> ScraperResult<Url> {
    Url::parse(raw).map_err(|e| ScraperError::Config(format!("{} is not a valid URL: {}", name, e)))
}

impl ScrapeConfig {
    /// Builds the configuration from the process environment, loading a
    /// `.env` file first when one exists.
    pub fn from_env() -> ScraperResult<Self> {
        dotenvy::dotenv().ok();

        let mut config = Self::default();

        if let Some(raw) = var("LISTING_URL") {
            config.listing_url = parse_url("LISTING_URL", &raw)?;
        }
        if let Some(raw) = var("WEBDRIVER_URL") {
            config.webdriver_url = parse_url("WEBDRIVER_URL", &raw)?;
        }
        if let Some(dataset) = var("MONGO_COLLECTION") {
            config.dataset = dataset;
        }
        if let Some(environment) = parse_var::<Environment>("ENV")? {
            config.environment = environment;
        }

        config.store = match var("STORE").as_deref().unwrap_or("disk") {
            "disk" => StoreType::Disk {
                path: var("DATA_DIR").unwrap_or_else(|| "data".to_string()),
            },
            #[cfg(feature = "mongodb")]
            "mongo" => StoreType::Mongo {
                connection_string: var("CONNECTION_STRING").ok_or_else(|| {
                    ScraperError::Config("CONNECTION_STRING is required for STORE=mongo".to_string())
                })?,
                database: var("DB_NAME").unwrap_or_else(|| DEFAULT_DATABASE.to_string()),
            },
            other => {
                return Err(ScraperError::Config(format!(
                    "unsupported STORE value: {}",
                    other
                )))
            }
        };

        if let Some(attempts) = parse_var::<usize>("RETRY_MAX_ATTEMPTS")? {
            config.retry = config.retry.with_max_attempts(attempts);
        }
        if let Some(millis) = parse_var::<u64>("RETRY_BASE_DELAY_MS")? {
            config.retry = config.retry.with_base_delay(Duration::from_millis(millis));
        }
        if let Some(secs) = parse_var::<u64>("LOCK_TTL_SECS")? {
            config.lock_ttl = Duration::from_secs(secs);
        }

        Ok(config)
    }

    pub fn with_listing_url(mut self, url: Url) -> Self {
        self.listing_url = url;
        self
    }

    pub fn with_dataset(mut self, dataset: &str) -> Self {
        self.dataset = dataset.to_string();
        self
    }

    pub fn with_store(mut self, store: StoreType) -> Self {
        self.store = store;
        self
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_selectors(mut self, selectors: Selectors) -> Self {
        self.selectors = selectors;
        self
    }

    pub fn with_lock_ttl(mut self, lock_ttl: Duration) -> Self {
        self.lock_ttl = lock_ttl;
        self
    }

    pub fn headless(&self) -> bool {
        self.environment == Environment::Prod
    }
}
