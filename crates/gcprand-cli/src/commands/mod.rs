pub mod gather;
pub mod generate;
pub mod sample;
pub mod serve;

use gcprand_core::{DotSampler, MeasureConfig, Observation, WebDriverConnector};

/// Build a sampler against a local WebDriver endpoint.
pub fn make_sampler(driver_url: &str, chart_url: &str, max_attempts: u32) -> DotSampler {
    let config = MeasureConfig {
        chart_url: chart_url.to_string(),
        max_attempts,
        ..MeasureConfig::default()
    };
    let connector = WebDriverConnector::new(driver_url).with_implicit_wait(config.implicit_wait);
    DotSampler::new(Box::new(connector), config)
}

/// Human-readable one-observation dump shared by `sample` and `gather`.
pub(crate) fn print_observation(obs: &Observation) {
    println!(
        "  index {:.6}  shifted {:.6}  {:<6}  offset {:.1}px  ts {:.0}",
        obs.normalized_value, obs.shifted_value, obs.color_label, obs.raw_offset, obs.captured_at
    );
}
