mod browser;
pub mod mock_browser;
pub mod webdriver;

pub use browser::{Browser, BrowserError, BrowserResult};
pub use mock_browser::{MockBrowser, MockPlayer, MockSite};
pub use webdriver::WebDriverBrowser;
