use std::process::Stdio;
use std::time::Duration;

use fantoccini::{Client, ClientBuilder};
use serde_json::json;
use thiserror::Error;
use tokio::process::{Child, Command};
use tokio::time::sleep;
use tracing::{debug, warn};

use crate::config::RunConfig;
use crate::error::AppError;

/// How long a freshly loaded page gets to settle before the readiness poll.
const SETTLE_DELAY: Duration = Duration::from_secs(1);

/// Upper bound on the document-readiness poll, one probe per second.
const READY_TIMEOUT_SECS: u64 = 30;

/// Attempts made to reach the WebDriver endpoint while the driver
/// process binds its port.
const CONNECT_ATTEMPTS: u32 = 10;

const RENDERED_DOM_JS: &str =
    "return document.getElementsByTagName('html')[0].innerHTML";

/// A page fetch failure. Non-retrying: callers decide whether the run
/// can continue without this page.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("page did not reach readyState \"complete\" within {0} seconds")]
    Timeout(u64),

    #[error("WebDriver fault: {0}")]
    WebDriver(String),
}

/// One automated browser session: the spawned driver process plus the
/// fantoccini client connected to it.
pub struct Session {
    client: Client,
    driver: Child,
}

impl Session {
    /// Spawns the WebDriver binary and connects to it. The binary's
    /// existence has already been checked pre-flight; a spawn failure
    /// here is still fatal.
    pub async fn open(config: &RunConfig) -> Result<Self, AppError> {
        let mut driver = Command::new(&config.driver_path)
            .arg("--port")
            .arg(config.driver_port.to_string())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| {
                AppError::Browser(format!(
                    "failed to start {}: {e}",
                    config.driver_path.display()
                ))
            })?;

        let endpoint = format!("http://localhost:{}", config.driver_port);
        let client = match connect(&endpoint).await {
            Ok(client) => client,
            Err(e) => {
                let _ = driver.start_kill();
                return Err(e);
            }
        };

        // Keep the window small so the session is less intrusive while
        // the operator logs in.
        if let Err(e) = client.set_window_size(700, 500).await {
            let _ = driver.start_kill();
            return Err(AppError::Browser(e.to_string()));
        }

        Ok(Self { client, driver })
    }

    pub async fn goto(&self, url: &str) -> Result<(), AppError> {
        self.client
            .goto(url)
            .await
            .map_err(|e| AppError::Browser(e.to_string()))
    }

    /// Renders `url` and returns its markup. Waits a fixed settle delay,
    /// then polls document readiness up to the bounded timeout. Prefers
    /// the fully rendered DOM and falls back to the raw page source when
    /// the rendered-DOM read is unsupported for that page.
    pub async fn render(&self, url: &str) -> Result<String, FetchError> {
        self.client
            .goto(url)
            .await
            .map_err(|e| FetchError::WebDriver(e.to_string()))?;

        sleep(SETTLE_DELAY).await;
        self.wait_for_ready().await?;

        match self.client.execute(RENDERED_DOM_JS, vec![]).await {
            Ok(value) => match value.as_str() {
                Some(html) if !html.is_empty() => Ok(html.to_string()),
                _ => self.page_source().await,
            },
            Err(e) => {
                debug!("rendered-DOM read unsupported for {url}: {e}");
                self.page_source().await
            }
        }
    }

    async fn page_source(&self) -> Result<String, FetchError> {
        self.client
            .source()
            .await
            .map_err(|e| FetchError::WebDriver(e.to_string()))
    }

    async fn wait_for_ready(&self) -> Result<(), FetchError> {
        for _ in 0..READY_TIMEOUT_SECS {
            let state = self
                .client
                .execute("return document.readyState", vec![])
                .await
                .map_err(|e| FetchError::WebDriver(e.to_string()))?;

            if state.as_str() == Some("complete") {
                return Ok(());
            }
            sleep(Duration::from_secs(1)).await;
        }

        Err(FetchError::Timeout(READY_TIMEOUT_SECS))
    }

    /// Releases the browser session and stops the driver process.
    pub async fn close(mut self) -> Result<(), AppError> {
        let closed = self
            .client
            .close()
            .await
            .map_err(|e| AppError::Browser(e.to_string()));

        if let Err(e) = self.driver.kill().await {
            warn!("failed to stop the WebDriver process: {e}");
        }

        closed
    }
}

async fn connect(endpoint: &str) -> Result<Client, AppError> {
    let mut builder = ClientBuilder::native();
    builder.capabilities(firefox_capabilities());

    // The driver needs a moment to bind its port after spawning.
    let mut last_error = String::new();
    for _ in 0..CONNECT_ATTEMPTS {
        match builder.connect(endpoint).await {
            Ok(client) => return Ok(client),
            Err(e) => {
                last_error = e.to_string();
                sleep(Duration::from_millis(500)).await;
            }
        }
    }

    Err(AppError::Browser(format!(
        "could not reach WebDriver at {endpoint}: {last_error}"
    )))
}

/// Firefox profile tweaks that keep the target site from interfering
/// with the run: no autoplay, shallow session history, no clipboard
/// events, no meta-refresh reloads.
fn firefox_capabilities() -> serde_json::Map<String, serde_json::Value> {
    let capabilities = json!({
        "moz:firefoxOptions": {
            "prefs": {
                "media.autoplay.default": 5,
                "browser.sessionhistory.max_entries": 5,
                "dom.event.clipboardevents.enabled": false,
                "accessibility.blockautorefresh": true,
            }
        }
    });

    capabilities.as_object().cloned().unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn firefox_capabilities_carry_interference_prefs() {
        let capabilities = firefox_capabilities();
        let prefs = &capabilities["moz:firefoxOptions"]["prefs"];

        assert_eq!(prefs["media.autoplay.default"], 5);
        assert_eq!(prefs["dom.event.clipboardevents.enabled"], false);
        assert_eq!(prefs["accessibility.blockautorefresh"], true);
    }

    #[test]
    fn fetch_error_messages_name_the_cause() {
        assert!(FetchError::Timeout(30).to_string().contains("30 seconds"));
        assert!(FetchError::WebDriver("gone".to_string())
            .to_string()
            .contains("gone"));
    }
}
