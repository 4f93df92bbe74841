//! Measurement orchestration: drive the browser, validate the reading,
//! record the observation, hand out seeds.
//!
//! A [`DotSampler`] owns the driver connector, the measurement configuration,
//! and the [`SampleStore`]. The store is an explicit handle passed wherever
//! the history is needed; there is no global state.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use log::{debug, error, warn};
use thiserror::Error;

use crate::normalize::{color_label, normalize, shifted_value};
use crate::source::{ChartDriver, DriverConnector, DriverError, MeasureConfig, RawMeasurement};
use crate::store::{Observation, SampleStore, now_unix};

/// Errors from a measurement cycle.
#[derive(Debug, Error)]
pub enum MeasureError {
    /// The driver session failed; logged and propagated, never retried here.
    #[error(transparent)]
    Driver(#[from] DriverError),
    /// A reading came back that does not parse as a pixel value.
    #[error("malformed {field} reading from chart: {value:?}")]
    MalformedReading { field: &'static str, value: String },
    /// Every attempt produced an overflowed reading.
    #[error("no valid chart reading after {attempts} attempts")]
    RetriesExhausted { attempts: u32 },
}

/// Samples the chart page and maintains the observation history.
pub struct DotSampler {
    connector: Box<dyn DriverConnector>,
    config: MeasureConfig,
    store: SampleStore,
}

impl DotSampler {
    pub fn new(connector: Box<dyn DriverConnector>, config: MeasureConfig) -> Self {
        Self {
            connector,
            config,
            store: SampleStore::new(),
        }
    }

    pub fn config(&self) -> &MeasureConfig {
        &self.config
    }

    pub fn store(&self) -> &SampleStore {
        &self.store
    }

    /// Perform one full measurement cycle and record the observation.
    ///
    /// Opens a fresh driver session, reads the container height and marker
    /// offset, and closes the session again. An overflowed reading (offset at
    /// or past the container height — the dot caught at the bottom edge of
    /// the chart) is discarded and the whole cycle retried, up to
    /// `config.max_attempts` times.
    pub fn sample(&mut self) -> Result<Observation, MeasureError> {
        for attempt in 1..=self.config.max_attempts {
            let raw = self.measure_once()?;
            if raw.marker_offset >= raw.container_height {
                debug!(
                    "overflowed reading on attempt {attempt}: offset {} >= height {}",
                    raw.marker_offset, raw.container_height
                );
                continue;
            }

            let normalized = normalize(raw.marker_offset, raw.container_height);
            let obs = Observation {
                raw_offset: raw.marker_offset,
                normalized_value: normalized,
                shifted_value: shifted_value(normalized),
                color_label: color_label(normalized),
                captured_at: now_unix(),
            };
            debug!(
                "observation: index {normalized:.6} ({}) shifted {:.6}",
                obs.color_label, obs.shifted_value
            );
            self.store.append(obs.clone());
            return Ok(obs);
        }

        Err(MeasureError::RetriesExhausted {
            attempts: self.config.max_attempts,
        })
    }

    /// Select a seed in `[0, 1]`.
    ///
    /// `fresh` forces a new measurement cycle and returns its shifted value.
    /// Otherwise the seed is a uniform random draw from the history; an empty
    /// history triggers one fresh cycle, whose observation is then the only
    /// candidate for the draw.
    pub fn seed(&mut self, fresh: bool) -> Result<f64, MeasureError> {
        if fresh {
            return Ok(self.sample()?.shifted_value);
        }
        match self.store.random_choice() {
            Ok(obs) => Ok(obs.shifted_value),
            Err(_) => Ok(self.sample()?.shifted_value),
        }
    }

    /// Collect up to `limit` observations, sleeping `interval` between cycles.
    ///
    /// Checks `stop` before each cycle so a Ctrl-C handler can end the run
    /// early. `on_sample` is invoked after each recorded observation with its
    /// 1-based ordinal. Returns the number of observations collected.
    pub fn gather<F>(
        &mut self,
        limit: usize,
        interval: Duration,
        stop: &AtomicBool,
        mut on_sample: F,
    ) -> Result<usize, MeasureError>
    where
        F: FnMut(usize, &Observation),
    {
        let mut collected = 0;
        while collected < limit && !stop.load(Ordering::Relaxed) {
            let obs = self.sample()?;
            collected += 1;
            on_sample(collected, &obs);
            if collected < limit && !stop.load(Ordering::Relaxed) {
                std::thread::sleep(interval);
            }
        }
        Ok(collected)
    }

    fn measure_once(&self) -> Result<RawMeasurement, MeasureError> {
        let mut driver = self.connector.connect()?;
        let result = self.read_chart(&mut *driver);
        if let Err(err) = driver.close() {
            warn!("failed to close driver session: {err}");
        }
        if let Err(err) = &result {
            error!("measurement failed: {err}");
        }
        result
    }

    fn read_chart(&self, driver: &mut dyn ChartDriver) -> Result<RawMeasurement, MeasureError> {
        driver.navigate(&self.config.chart_url)?;
        std::thread::sleep(self.config.settle_delay);

        let height_text = driver.attribute(&self.config.container_id, "height")?;
        let marker_id = driver.last_element_id(&self.config.marker_tag)?;
        std::thread::sleep(self.config.settle_delay);
        let offset_text = driver.css_property(&marker_id, "top")?;

        let container_height = parse_number("container height", &height_text)?;
        let marker_offset = parse_px("marker offset", &offset_text)?;
        debug!("chart height: {container_height}, dot offset: {marker_offset}");

        Ok(RawMeasurement {
            marker_offset,
            container_height,
        })
    }
}

fn parse_number(field: &'static str, text: &str) -> Result<f64, MeasureError> {
    text.trim()
        .parse()
        .map_err(|_| MeasureError::MalformedReading {
            field,
            value: text.to_string(),
        })
}

/// Parse a CSS pixel value, stripping the `px` unit suffix.
fn parse_px(field: &'static str, text: &str) -> Result<f64, MeasureError> {
    let stripped = text.trim().trim_end_matches("px").trim();
    stripped
        .parse()
        .map_err(|_| MeasureError::MalformedReading {
            field,
            value: text.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Driver that replays one scripted reading, mirroring the DOM calls the
    /// sampler makes.
    struct ScriptedDriver {
        height: String,
        top: String,
    }

    impl ChartDriver for ScriptedDriver {
        fn navigate(&mut self, _url: &str) -> Result<(), DriverError> {
            Ok(())
        }

        fn attribute(&mut self, _element_id: &str, name: &str) -> Result<String, DriverError> {
            assert_eq!(name, "height");
            Ok(self.height.clone())
        }

        fn css_property(&mut self, element_id: &str, name: &str) -> Result<String, DriverError> {
            assert_eq!(element_id, "gcpdot");
            assert_eq!(name, "top");
            Ok(self.top.clone())
        }

        fn last_element_id(&mut self, tag: &str) -> Result<String, DriverError> {
            assert_eq!(tag, "div");
            Ok("gcpdot".to_string())
        }

        fn close(self: Box<Self>) -> Result<(), DriverError> {
            Ok(())
        }
    }

    /// Connector handing out one scripted session per measurement cycle.
    struct ScriptedConnector {
        readings: Mutex<VecDeque<(String, String)>>,
    }

    impl ScriptedConnector {
        fn new(readings: &[(&str, &str)]) -> Self {
            Self {
                readings: Mutex::new(
                    readings
                        .iter()
                        .map(|(h, t)| (h.to_string(), t.to_string()))
                        .collect(),
                ),
            }
        }
    }

    impl DriverConnector for ScriptedConnector {
        fn connect(&self) -> Result<Box<dyn ChartDriver>, DriverError> {
            let (height, top) = self
                .readings
                .lock()
                .unwrap()
                .pop_front()
                .ok_or_else(|| DriverError::Session("script exhausted".to_string()))?;
            Ok(Box::new(ScriptedDriver { height, top }))
        }
    }

    fn test_sampler(readings: &[(&str, &str)]) -> DotSampler {
        let config = MeasureConfig {
            settle_delay: Duration::ZERO,
            max_attempts: 3,
            ..MeasureConfig::default()
        };
        DotSampler::new(Box::new(ScriptedConnector::new(readings)), config)
    }

    #[test]
    fn sample_records_one_observation() {
        let mut sampler = test_sampler(&[("100", "50px")]);
        let obs = sampler.sample().unwrap();
        assert_eq!(obs.raw_offset, 50.0);
        assert_eq!(obs.normalized_value, 0.5);
        assert_eq!(obs.shifted_value, 0.5);
        assert_eq!(obs.color_label.to_string(), "green");
        assert_eq!(sampler.store().len(), 1);
    }

    #[test]
    fn overflow_is_retried_with_fresh_session() {
        let mut sampler = test_sampler(&[("100", "120px"), ("100", "50px")]);
        let obs = sampler.sample().unwrap();
        assert_eq!(obs.normalized_value, 0.5);
        // only the valid reading is stored
        assert_eq!(sampler.store().len(), 1);
    }

    #[test]
    fn overflow_exhausts_after_max_attempts() {
        let mut sampler = test_sampler(&[("100", "120px"), ("100", "100px"), ("100", "150px")]);
        match sampler.sample() {
            Err(MeasureError::RetriesExhausted { attempts: 3 }) => {}
            other => panic!("expected RetriesExhausted, got {other:?}"),
        }
        assert!(sampler.store().is_empty());
    }

    #[test]
    fn driver_failure_propagates() {
        let mut sampler = test_sampler(&[]);
        match sampler.sample() {
            Err(MeasureError::Driver(DriverError::Session(_))) => {}
            other => panic!("expected driver error, got {other:?}"),
        }
    }

    #[test]
    fn malformed_offset_is_reported() {
        let mut sampler = test_sampler(&[("100", "nonsense")]);
        match sampler.sample() {
            Err(MeasureError::MalformedReading { field, .. }) => {
                assert_eq!(field, "marker offset");
            }
            other => panic!("expected MalformedReading, got {other:?}"),
        }
    }

    #[test]
    fn seed_fresh_returns_new_shifted_value() {
        let mut sampler = test_sampler(&[("100", "50px")]);
        let seed = sampler.seed(true).unwrap();
        assert_eq!(seed, 0.5);
        assert_eq!(sampler.store().len(), 1);
    }

    #[test]
    fn seed_on_empty_store_takes_exactly_one_measurement() {
        let mut sampler = test_sampler(&[("100", "50px")]);
        let seed = sampler.seed(false).unwrap();
        assert_eq!(sampler.store().len(), 1);
        assert_eq!(seed, sampler.store().last().unwrap().shifted_value);
    }

    #[test]
    fn seed_from_history_needs_no_session() {
        // Only one scripted reading: the second seed() must come from history.
        let mut sampler = test_sampler(&[("100", "50px")]);
        sampler.sample().unwrap();
        let seed = sampler.seed(false).unwrap();
        assert_eq!(seed, 0.5);
        assert_eq!(sampler.store().len(), 1);
    }

    #[test]
    fn gather_collects_up_to_limit() {
        let mut sampler = test_sampler(&[("100", "10px"), ("100", "20px"), ("100", "30px")]);
        let stop = AtomicBool::new(false);
        let mut seen = Vec::new();
        let n = sampler
            .gather(3, Duration::ZERO, &stop, |i, obs| {
                seen.push((i, obs.raw_offset));
            })
            .unwrap();
        assert_eq!(n, 3);
        assert_eq!(seen, vec![(1, 10.0), (2, 20.0), (3, 30.0)]);
        assert_eq!(sampler.store().len(), 3);
    }

    #[test]
    fn gather_honors_stop_flag() {
        let mut sampler = test_sampler(&[("100", "10px")]);
        let stop = AtomicBool::new(true);
        let n = sampler.gather(5, Duration::ZERO, &stop, |_, _| {}).unwrap();
        assert_eq!(n, 0);
        assert!(sampler.store().is_empty());
    }

    #[test]
    fn parse_px_strips_unit_suffix() {
        assert_eq!(parse_px("marker offset", "561.25px").unwrap(), 561.25);
        assert_eq!(parse_px("marker offset", " 12px ").unwrap(), 12.0);
        assert_eq!(parse_px("marker offset", "47").unwrap(), 47.0);
        assert!(parse_px("marker offset", "px").is_err());
    }

    #[test]
    fn parse_number_rejects_garbage() {
        assert_eq!(parse_number("container height", "480").unwrap(), 480.0);
        assert!(parse_number("container height", "tall").is_err());
    }
}
