//! Driver seam for chart measurements.
//!
//! The sampler never talks to a browser directly. It goes through the
//! [`ChartDriver`] trait, which mirrors the handful of browser-automation calls
//! the measurement needs: navigate, read an attribute, read a computed CSS
//! property, find the last element with a given tag. A [`DriverConnector`]
//! opens one driver session per measurement cycle; the session is closed when
//! the cycle ends, whether it succeeded or not.

use std::time::Duration;

use thiserror::Error;

/// Errors raised by a chart driver session.
///
/// Each failure mode is its own variant so callers can match on it instead of
/// string-inspecting a dynamic exception.
#[derive(Debug, Error)]
pub enum DriverError {
    /// HTTP transport failure talking to the driver process.
    #[error("webdriver transport: {0}")]
    Transport(#[from] reqwest::Error),
    /// A session could not be established or has gone away.
    #[error("webdriver session: {0}")]
    Session(String),
    /// The requested element does not exist on the page.
    #[error("element not found: {0}")]
    ElementNotFound(String),
    /// The driver answered with a protocol-level error.
    #[error("webdriver protocol: {0}")]
    Protocol(String),
    /// The driver response was missing the expected value.
    #[error("missing or non-string value in webdriver response: {0}")]
    MissingValue(String),
}

/// The browser-automation surface consumed by the sampler.
///
/// Element lookups are by DOM id (the chart page exposes its container and
/// marker through ids), matching how the upstream page is actually scraped.
pub trait ChartDriver {
    /// Load the given URL in the driven browser.
    fn navigate(&mut self, url: &str) -> Result<(), DriverError>;

    /// Read a DOM attribute of the element with the given id.
    fn attribute(&mut self, element_id: &str, name: &str) -> Result<String, DriverError>;

    /// Read a computed CSS property of the element with the given id.
    fn css_property(&mut self, element_id: &str, name: &str) -> Result<String, DriverError>;

    /// Return the DOM id of the last element with the given tag name.
    ///
    /// The chart renders its marker as the final `<div>` on the page with a
    /// generated id; this is how the marker is located.
    fn last_element_id(&mut self, tag: &str) -> Result<String, DriverError>;

    /// End the driver session.
    fn close(self: Box<Self>) -> Result<(), DriverError>;
}

/// Opens driver sessions. One session per measurement cycle.
pub trait DriverConnector: Send + Sync {
    fn connect(&self) -> Result<Box<dyn ChartDriver>, DriverError>;
}

/// The two pixel readings taken from the chart page.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawMeasurement {
    /// Vertical offset of the dot marker (CSS `top`, px stripped).
    pub marker_offset: f64,
    /// Height of the chart container element.
    pub container_height: f64,
}

/// Configuration for a measurement cycle.
#[derive(Debug, Clone)]
pub struct MeasureConfig {
    /// Chart page to scrape.
    pub chart_url: String,
    /// DOM id of the chart container whose `height` attribute bounds the dot.
    pub container_id: String,
    /// Tag name of the marker element (the dot is the last such element).
    pub marker_tag: String,
    /// Pause between DOM reads to let the chart animation settle.
    pub settle_delay: Duration,
    /// Implicit wait applied to element lookups in the driver session.
    pub implicit_wait: Duration,
    /// Maximum measurement attempts when the reading overflows the chart.
    ///
    /// An overflowed reading (offset past the container height) means the dot
    /// was caught mid-render at the bottom of the chart. The cycle is retried
    /// with a fresh session up to this many times, then fails explicitly.
    pub max_attempts: u32,
}

impl Default for MeasureConfig {
    fn default() -> Self {
        Self {
            chart_url: "https://gcpdot.com/gcpchart.php".to_string(),
            container_id: "gcpChartShadow".to_string(),
            marker_tag: "div".to_string(),
            settle_delay: Duration::from_secs(1),
            implicit_wait: Duration::from_secs(3),
            max_attempts: 5,
        }
    }
}
