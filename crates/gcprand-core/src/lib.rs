//! # gcprand-core
//!
//! **Random seeds harvested from the Global Consciousness Project dot.**
//!
//! `gcprand-core` scrapes the vertical position of the GCP Dot marker from the
//! public chart page, normalizes it into the unit interval, and uses it to seed
//! a deterministic string generator.
//!
//! ## Quick Start
//!
//! ```no_run
//! use gcprand_core::{DotSampler, MeasureConfig, WebDriverConnector, generate};
//!
//! // A geckodriver or chromedriver instance must be listening locally.
//! let connector = WebDriverConnector::new("http://127.0.0.1:4444");
//! let mut sampler = DotSampler::new(Box::new(connector), MeasureConfig::default());
//!
//! // One measurement cycle: navigate, read the chart, normalize, record.
//! let seed = sampler.seed(true)?;
//! let password = generate(seed, 32)?;
//! assert_eq!(password.len(), 32);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Architecture
//!
//! ChartDriver → DotSampler (normalize + bounded retry) → SampleStore → seed → string
//!
//! The driver seam is the [`ChartDriver`] trait; [`WebDriverConnector`] is the
//! production implementation speaking the W3C WebDriver wire protocol to a local
//! driver process. One browser session is opened and closed per measurement.
//! Every valid reading becomes an immutable [`Observation`] in the append-only
//! [`SampleStore`]; seeds are either fresh readings or drawn uniformly from the
//! history with the OS CSPRNG.

pub mod generate;
pub mod normalize;
pub mod sampler;
pub mod source;
pub mod store;
pub mod webdriver;

pub use generate::{ALPHABET, DEFAULT_LENGTH, MAX_LENGTH, MIN_LENGTH, ValidationError, generate};
pub use normalize::{ColorLabel, color_label, normalize, shifted_value};
pub use sampler::{DotSampler, MeasureError};
pub use source::{ChartDriver, DriverConnector, DriverError, MeasureConfig, RawMeasurement};
pub use store::{EmptyStoreError, Observation, SampleStore};
pub use webdriver::WebDriverConnector;

/// Library version (from Cargo.toml).
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
