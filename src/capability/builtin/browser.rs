//! Browser capabilities driven over WebDriver.
//!
//! Each call opens its own session, loads the page, does its one thing and
//! closes the session again, so no browser state survives between cycles.

use std::path::PathBuf;
use std::sync::Arc;

use fantoccini::{Client, ClientBuilder};
use reqwest::Url;

use super::files::resolve_new;
use crate::capability::{Capability, CapabilityArguments, FnCapability, ParameterSchema};
use crate::error::DispatchError;

const DEFAULT_SCREENSHOT: &str = "screenshot.png";

/// Only absolute http(s) URLs may be opened.
fn check_url(capability: &str, raw: &str) -> Result<Url, DispatchError> {
    let url = Url::parse(raw.trim())
        .map_err(|e| DispatchError::execution(capability, format!("'{raw}' is not a valid URL: {e}")))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(DispatchError::execution(
            capability,
            format!("scheme '{other}' is not allowed"),
        )),
    }
}

async fn open_page(capability: &str, webdriver: &str, url: &Url) -> Result<Client, DispatchError> {
    let client = ClientBuilder::rustls()
        .map_err(|e| DispatchError::execution(capability, format!("TLS setup failed: {e}")))?
        .connect(webdriver)
        .await
        .map_err(|e| DispatchError::execution(capability, format!("cannot reach WebDriver at {webdriver}: {e}")))?;

    if let Err(e) = client.goto(url.as_str()).await {
        close(client).await;
        return Err(DispatchError::execution(capability, format!("failed to load {url}: {e}")));
    }
    Ok(client)
}

async fn close(client: Client) {
    if let Err(e) = client.close().await {
        tracing::warn!(error = %e, "failed to close browser session");
    }
}

fn url_schema() -> ParameterSchema {
    ParameterSchema::object()
        .string("url", "Absolute http(s) URL", true)
        .build()
}

/// `navigate_to_url(url)`: open the page and report success.
pub fn navigate_capability(webdriver: Arc<String>) -> Arc<dyn Capability> {
    Arc::new(FnCapability::new(
        "navigate_to_url",
        "Open a web page in the browser",
        url_schema(),
        move |args: CapabilityArguments| {
            let webdriver = Arc::clone(&webdriver);
            async move {
                let url = check_url("navigate_to_url", args.get_str("url")?)?;
                let client = open_page("navigate_to_url", &webdriver, &url).await?;
                close(client).await;
                Ok(format!("Successfully navigated to {url}"))
            }
        },
    ))
}

/// `get_page_title(url)`: the document title of the loaded page.
pub fn page_title_capability(webdriver: Arc<String>) -> Arc<dyn Capability> {
    Arc::new(FnCapability::new(
        "get_page_title",
        "Get the title of a web page",
        url_schema(),
        move |args: CapabilityArguments| {
            let webdriver = Arc::clone(&webdriver);
            async move {
                let url = check_url("get_page_title", args.get_str("url")?)?;
                let client = open_page("get_page_title", &webdriver, &url).await?;
                let title = client.title().await;
                close(client).await;
                let title = title.map_err(|e| DispatchError::execution("get_page_title", e.to_string()))?;
                Ok(format!("Page title: {title}"))
            }
        },
    ))
}

/// `take_screenshot(url, filename?)`: save a PNG of the page under `root`.
pub fn screenshot_capability(webdriver: Arc<String>, root: Arc<PathBuf>) -> Arc<dyn Capability> {
    Arc::new(FnCapability::new(
        "take_screenshot",
        "Save a screenshot of a web page",
        ParameterSchema::object()
            .string("url", "Absolute http(s) URL", true)
            .string("filename", "PNG file name, relative to the workspace", false)
            .build(),
        move |args: CapabilityArguments| {
            let webdriver = Arc::clone(&webdriver);
            let root = Arc::clone(&root);
            async move {
                let url = check_url("take_screenshot", args.get_str("url")?)?;
                let filename = args.get_str_opt("filename").unwrap_or(DEFAULT_SCREENSHOT);
                let target = resolve_new("take_screenshot", &root, filename).await?;

                let client = open_page("take_screenshot", &webdriver, &url).await?;
                let png = client.screenshot().await;
                close(client).await;
                let png = png.map_err(|e| DispatchError::execution("take_screenshot", e.to_string()))?;

                tokio::fs::write(&target, png).await.map_err(|e| {
                    DispatchError::execution("take_screenshot", format!("cannot write {filename}: {e}"))
                })?;
                Ok(format!("Screenshot saved as {filename}"))
            }
        },
    ))
}

/// The three browser capabilities sharing one WebDriver endpoint.
pub fn browser_capabilities(webdriver_url: &str, root: impl Into<PathBuf>) -> Vec<Arc<dyn Capability>> {
    let webdriver = Arc::new(webdriver_url.to_string());
    let root = Arc::new(root.into());
    vec![
        navigate_capability(Arc::clone(&webdriver)),
        page_title_capability(Arc::clone(&webdriver)),
        screenshot_capability(webdriver, root),
    ]
}
