use super::{Browser, BrowserError, BrowserResult};
use async_trait::async_trait;
use log::{debug, info, trace};
use reqwest::{Client, ClientBuilder, Method};
use serde_json::{json, Value};
use std::time::Duration;
use url::Url;

const ELEMENT_KEY: &str = "element-6066-11e4-a52e-4f735466cecf";
const READ_TEXT_SCRIPT: &str =
    "return Array.from(document.querySelectorAll(arguments[0])).map(e => e.textContent);";
const READ_INNER_TEXT_SCRIPT: &str =
    "return Array.from(document.querySelectorAll(arguments[0])).map(e => e.innerText);";

/// W3C WebDriver client (chromedriver, geckodriver, or a Selenium grid).
pub struct WebDriverBrowser {
    client: Client,
    base_url: Url,
    session_id: String,
}

impl WebDriverBrowser {
    /// Opens a new browser session on the WebDriver server at `base_url`.
    pub async fn connect(base_url: Url, headless: bool) -> BrowserResult<Self> {
        let client = ClientBuilder::new()
            .timeout(Duration::from_secs(120))
            .build()?;

        let args: Vec<&str> = if headless {
            vec!["--headless=new", "--no-sandbox", "--window-size=1920,1080"]
        } else {
            vec!["--window-size=1920,1080"]
        };
        let capabilities = json!({
            "capabilities": {
                "alwaysMatch": {
                    "browserName": "chrome",
                    "goog:chromeOptions": { "args": args },
                }
            }
        });

        let endpoint = Self::join(&base_url, "session")?;
        let value = Self::send(&client, Method::POST, endpoint, Some(capabilities)).await?;
        let session_id = value
            .get("sessionId")
            .and_then(Value::as_str)
            .ok_or_else(|| BrowserError::Protocol(format!("no sessionId in {}", value)))?
            .to_string();

        info!("Opened WebDriver session {}", session_id);

        Ok(Self {
            client,
            base_url,
            session_id,
        })
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    fn join(base_url: &Url, path: &str) -> BrowserResult<Url> {
        let base = base_url.as_str().trim_end_matches('/');
        Url::parse(&format!("{}/{}", base, path))
            .map_err(|e| BrowserError::Protocol(format!("invalid endpoint {}: {}", path, e)))
    }

    async fn send(
        client: &Client,
        method: Method,
        url: Url,
        body: Option<Value>,
    ) -> BrowserResult<Value> {
        trace!("WebDriver {} {}", method, url);
        let mut request = client.request(method, url);
        if let Some(body) = body {
            request = request.json(&body);
        }

        let response: Value = request.send().await?.json().await?;
        let value = response.get("value").cloned().unwrap_or(Value::Null);

        if let Some(error) = value.get("error").and_then(Value::as_str) {
            let message = value
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string();
            return Err(BrowserError::WebDriver {
                error: error.to_string(),
                message,
            });
        }

        Ok(value)
    }

    async fn command(&self, method: Method, path: &str, body: Option<Value>) -> BrowserResult<Value> {
        let url = Self::join(&self.base_url, &format!("session/{}/{}", self.session_id, path))?;
        Self::send(&self.client, method, url, body).await
    }

    async fn execute(&self, script: &str, args: Vec<Value>) -> BrowserResult<Value> {
        self.command(
            Method::POST,
            "execute/sync",
            Some(json!({ "script": script, "args": args })),
        )
        .await
    }

    async fn find_element(&self, selector: &str) -> BrowserResult<String> {
        let value = self
            .command(
                Method::POST,
                "element",
                Some(json!({ "using": "css selector", "value": selector })),
            )
            .await
            .map_err(|e| classify(selector, e))?;

        value
            .get(ELEMENT_KEY)
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| BrowserError::Protocol(format!("no element reference in {}", value)))
    }

    async fn read_strings(&self, script: &str, selector: &str) -> BrowserResult<Vec<String>> {
        let value = self.execute(script, vec![json!(selector)]).await?;
        serde_json::from_value(value)
            .map_err(|e| BrowserError::Protocol(format!("expected a list of strings: {}", e)))
    }
}

/// Maps WebDriver lookup failures onto the element-level variants.
fn classify(selector: &str, err: BrowserError) -> BrowserError {
    match err {
        BrowserError::WebDriver { ref error, .. } if error == "no such element" => {
            BrowserError::NoSuchElement(selector.to_string())
        }
        BrowserError::WebDriver { ref error, .. } if error == "stale element reference" => {
            BrowserError::StaleElement(selector.to_string())
        }
        other => other,
    }
}

#[async_trait]
impl Browser for WebDriverBrowser {
    async fn navigate(&self, url: &str) -> BrowserResult<()> {
        debug!("Navigating to {}", url);
        self.command(Method::POST, "url", Some(json!({ "url": url })))
            .await?;
        Ok(())
    }

    async fn click(&self, selector: &str) -> BrowserResult<()> {
        let element = self.find_element(selector).await?;
        self.command(
            Method::POST,
            &format!("element/{}/click", element),
            Some(json!({})),
        )
        .await
        .map_err(|e| classify(selector, e))?;
        Ok(())
    }

    async fn read_text(&self, selector: &str) -> BrowserResult<Vec<String>> {
        self.read_strings(READ_TEXT_SCRIPT, selector).await
    }

    async fn read_inner_text(&self, selector: &str) -> BrowserResult<Vec<String>> {
        self.read_strings(READ_INNER_TEXT_SCRIPT, selector).await
    }

    async fn read_attribute(&self, selector: &str, name: &str) -> BrowserResult<Option<String>> {
        let element = self.find_element(selector).await?;
        let value = self
            .command(
                Method::GET,
                &format!("element/{}/attribute/{}", element, name),
                None,
            )
            .await
            .map_err(|e| classify(selector, e))?;
        Ok(value.as_str().map(str::to_string))
    }

    async fn count_matches(&self, selector: &str) -> BrowserResult<usize> {
        let value = self
            .command(
                Method::POST,
                "elements",
                Some(json!({ "using": "css selector", "value": selector })),
            )
            .await?;
        value
            .as_array()
            .map(Vec::len)
            .ok_or_else(|| BrowserError::Protocol(format!("expected an element list, got {}", value)))
    }

    async fn evaluate(&self, script: &str) -> BrowserResult<Vec<Vec<String>>> {
        let value = self.execute(script, Vec::new()).await?;
        serde_json::from_value(value)
            .map_err(|e| BrowserError::Protocol(format!("expected rows of cell text: {}", e)))
    }

    async fn close(&self) -> BrowserResult<()> {
        let url = Self::join(&self.base_url, &format!("session/{}", self.session_id))?;
        Self::send(&self.client, Method::DELETE, url, None).await?;
        info!("Closed WebDriver session {}", self.session_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn setup() -> (WebDriverBrowser, MockServer) {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/session"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "value": { "sessionId": "abc123", "capabilities": {} }
            })))
            .mount(&server)
            .await;

        let browser = WebDriverBrowser::connect(Url::parse(&server.uri()).unwrap(), true)
            .await
            .unwrap();
        (browser, server)
    }

    #[tokio::test]
    async fn test_connect_reads_session_id() {
        let (browser, _server) = setup().await;
        assert_eq!(browser.session_id(), "abc123");
    }

    #[tokio::test]
    async fn test_count_matches() {
        let (browser, server) = setup().await;

        Mock::given(method("POST"))
            .and(path("/session/abc123/elements"))
            .and(body_partial_json(json!({ "using": "css selector", "value": "tbody tr" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "value": [{ "element-6066-11e4-a52e-4f735466cecf": "e1" }, { "element-6066-11e4-a52e-4f735466cecf": "e2" }, { "element-6066-11e4-a52e-4f735466cecf": "e3" }]
            })))
            .mount(&server)
            .await;

        assert_eq!(browser.count_matches("tbody tr").await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_click_finds_then_clicks() {
        let (browser, server) = setup().await;

        Mock::given(method("POST"))
            .and(path("/session/abc123/element"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "value": { "element-6066-11e4-a52e-4f735466cecf": "button-1" }
            })))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/session/abc123/element/button-1/click"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "value": null })))
            .expect(1)
            .mount(&server)
            .await;

        browser.click("button#next").await.unwrap();
    }

    #[tokio::test]
    async fn test_missing_element_is_classified() {
        let (browser, server) = setup().await;

        Mock::given(method("POST"))
            .and(path("/session/abc123/element"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({
                "value": {
                    "error": "no such element",
                    "message": "Unable to locate element",
                    "stacktrace": ""
                }
            })))
            .mount(&server)
            .await;

        match browser.click("button#missing").await {
            Err(BrowserError::NoSuchElement(selector)) => assert_eq!(selector, "button#missing"),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_evaluate_returns_rows() {
        let (browser, server) = setup().await;

        Mock::given(method("POST"))
            .and(path("/session/abc123/execute/sync"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "value": [["1", "ARS (H)"], ["2", "CHE (A)"]]
            })))
            .mount(&server)
            .await;

        let rows = browser.evaluate("return [];").await.unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1], vec!["2".to_string(), "CHE (A)".to_string()]);
    }

    #[tokio::test]
    async fn test_evaluate_rejects_non_tabular_result() {
        let (browser, server) = setup().await;

        Mock::given(method("POST"))
            .and(path("/session/abc123/execute/sync"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "value": null })))
            .mount(&server)
            .await;

        assert!(matches!(
            browser.evaluate("return null;").await,
            Err(BrowserError::Protocol(_))
        ));
    }

    #[tokio::test]
    async fn test_read_attribute_absent() {
        let (browser, server) = setup().await;

        Mock::given(method("POST"))
            .and(path("/session/abc123/element"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "value": { "element-6066-11e4-a52e-4f735466cecf": "next" }
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/session/abc123/element/next/attribute/disabled"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "value": null })))
            .mount(&server)
            .await;

        assert_eq!(browser.read_attribute("button", "disabled").await.unwrap(), None);
    }
}
