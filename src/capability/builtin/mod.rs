//! Reference capabilities.
//!
//! `get_weather` and `get_calendar` are canned stand-ins for external APIs;
//! `read_log` extracts the latest run from a container log under the
//! workspace root; `draft_email` and `send_email` turn a report body into a
//! plain-text mail. With the `browser` feature, `navigate_to_url`,
//! `get_page_title` and `take_screenshot` drive a WebDriver session. Each is
//! built via [`FnCapability`] and returned as `Arc<dyn Capability>`.
//!
//! ```rust
//! use tooldispatch::capability::builtin::all_capabilities;
//! use tooldispatch::config::DispatchConfig;
//!
//! let caps = all_capabilities(&DispatchConfig::default()).unwrap();
//! assert_eq!(caps.len(), 4);
//! ```

#[cfg(feature = "browser")]
pub mod browser;
pub mod files;
pub mod mail;

#[cfg(feature = "browser")]
pub use browser::browser_capabilities;
pub use files::read_log_capability;
pub use mail::{draft_email_capability, send_email_capability, smtp_send_email_capability, smtp_transport};

use std::sync::Arc;

use crate::capability::{Capability, CapabilityArguments, FnCapability, ParameterSchema};
use crate::config::DispatchConfig;
use crate::error::DispatchError;

/// `get_weather(location, unit?)`: canned current weather.
pub fn weather_capability() -> Arc<dyn Capability> {
    Arc::new(FnCapability::from_sync(
        "get_weather",
        "Get current weather information for a location",
        ParameterSchema::object()
            .string("location", "City name (e.g., New York, Seoul)", true)
            .string_enum("unit", "Temperature unit", &["celsius", "fahrenheit"], false)
            .build(),
        |args: &CapabilityArguments| {
            let location = args.get_str("location")?;
            let unit = args.get_str_opt("unit").unwrap_or("fahrenheit");
            tracing::debug!(location, unit, "weather lookup");
            let temperature = if unit == "celsius" { 20 } else { 68 };
            Ok(format!("현재 {location}의 날씨는 맑음, 기온 {temperature}도입니다."))
        },
    ))
}

/// `get_calendar()`: canned list of today's events.
pub fn calendar_capability() -> Arc<dyn Capability> {
    Arc::new(FnCapability::from_sync(
        "get_calendar",
        "Get today's calendar events",
        ParameterSchema::empty(),
        |_args: &CapabilityArguments| Ok("오늘의 일정: 회의 2건이 있습니다.".to_string()),
    ))
}

/// Reference capabilities for `config`, in registration order.
///
/// `send_email` is added when an SMTP relay is configured, and the browser
/// capabilities when built with `browser` and a WebDriver URL is set.
pub fn all_capabilities(config: &DispatchConfig) -> Result<Vec<Arc<dyn Capability>>, DispatchError> {
    let mut capabilities = vec![
        weather_capability(),
        calendar_capability(),
        read_log_capability(config.workspace_root.clone()),
        draft_email_capability(),
    ];

    if config.smtp.is_configured() {
        capabilities.push(smtp_send_email_capability(&config.smtp)?);
    }

    #[cfg(feature = "browser")]
    if let Some(url) = &config.webdriver_url {
        capabilities.extend(browser_capabilities(url, config.workspace_root.clone()));
    }

    Ok(capabilities)
}
