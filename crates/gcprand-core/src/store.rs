//! Append-only history of chart observations.
//!
//! Every valid measurement becomes an immutable [`Observation`]. The store
//! grows for the lifetime of the process; there is no deduplication and no
//! eviction. Random draws from the history use the OS CSPRNG so replayed
//! seeds are not predictable from request order.

use std::collections::HashMap;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::normalize::ColorLabel;

/// The store holds no observations yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("sample store is empty")]
pub struct EmptyStoreError;

/// One validated chart measurement. Immutable once created.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Observation {
    /// Marker offset in pixels, as read from the page.
    pub raw_offset: f64,
    /// Offset mapped into `[0, 1]` against the container height.
    pub normalized_value: f64,
    /// Digit-shifted seed value in `[0, 1]`.
    pub shifted_value: f64,
    /// Legend bucket of the normalized value.
    pub color_label: ColorLabel,
    /// Unix timestamp (seconds) of the measurement.
    pub captured_at: f64,
}

/// Current unix time in seconds.
pub(crate) fn now_unix() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs_f64()
}

/// Append-only, insertion-ordered sequence of observations.
#[derive(Debug, Default)]
pub struct SampleStore {
    observations: Vec<Observation>,
}

impl SampleStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an observation to the end of the history.
    pub fn append(&mut self, obs: Observation) {
        self.observations.push(obs);
    }

    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    /// The full history, most recent last.
    pub fn observations(&self) -> &[Observation] {
        &self.observations
    }

    /// The most recently appended observation.
    pub fn last(&self) -> Result<&Observation, EmptyStoreError> {
        self.observations.last().ok_or(EmptyStoreError)
    }

    /// A uniformly selected observation from the full history.
    ///
    /// Selection uses the OS CSPRNG with rejection sampling, so it carries no
    /// modulo bias and is not reproducible from the request sequence.
    pub fn random_choice(&self) -> Result<&Observation, EmptyStoreError> {
        if self.observations.is_empty() {
            return Err(EmptyStoreError);
        }
        Ok(&self.observations[secure_index(self.observations.len())])
    }

    /// Count of observations per color label.
    pub fn color_counts(&self) -> HashMap<ColorLabel, usize> {
        let mut counts = HashMap::new();
        for obs in &self.observations {
            *counts.entry(obs.color_label).or_insert(0) += 1;
        }
        counts
    }

    /// Shannon entropy (bits) of the color-label distribution over the history.
    ///
    /// A rough gauge of how much the dot has moved across legend buckets; a
    /// history stuck in one bucket scores 0.
    pub fn color_entropy(&self) -> f64 {
        let total = self.observations.len() as f64;
        if total == 0.0 {
            return 0.0;
        }
        let mut h = 0.0;
        for &count in self.color_counts().values() {
            let p = count as f64 / total;
            h -= p * p.log2();
        }
        h
    }
}

/// Uniform index in `[0, len)` drawn from the OS CSPRNG.
///
/// Rejection-samples the top of the u64 range to avoid modulo bias.
fn secure_index(len: usize) -> usize {
    debug_assert!(len > 0);
    let len = len as u64;
    let limit = u64::MAX - u64::MAX % len;
    loop {
        let mut buf = [0u8; 8];
        getrandom(&mut buf);
        let v = u64::from_le_bytes(buf);
        if v < limit {
            return (v % len) as usize;
        }
    }
}

/// Fill buffer with OS random bytes via the `getrandom` crate.
///
/// # Panics
/// Panics if the OS CSPRNG fails — this indicates a fatal platform issue.
fn getrandom(buf: &mut [u8]) {
    getrandom::fill(buf).expect("OS CSPRNG failed");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::{color_label, normalize, shifted_value};

    fn obs(raw_offset: f64, container_height: f64) -> Observation {
        let normalized = normalize(raw_offset, container_height);
        Observation {
            raw_offset,
            normalized_value: normalized,
            shifted_value: shifted_value(normalized),
            color_label: color_label(normalized),
            captured_at: now_unix(),
        }
    }

    #[test]
    fn append_and_last() {
        let mut store = SampleStore::new();
        assert!(store.is_empty());
        store.append(obs(50.0, 100.0));
        store.append(obs(10.0, 100.0));
        assert_eq!(store.len(), 2);
        let last = store.last().unwrap();
        assert_eq!(last.raw_offset, 10.0);
    }

    #[test]
    fn insertion_order_is_preserved() {
        let mut store = SampleStore::new();
        for offset in [10.0, 20.0, 30.0] {
            store.append(obs(offset, 100.0));
        }
        let offsets: Vec<f64> = store.observations().iter().map(|o| o.raw_offset).collect();
        assert_eq!(offsets, vec![10.0, 20.0, 30.0]);
    }

    #[test]
    fn empty_store_errors() {
        let store = SampleStore::new();
        assert_eq!(store.last().unwrap_err(), EmptyStoreError);
        assert_eq!(store.random_choice().unwrap_err(), EmptyStoreError);
    }

    #[test]
    fn random_choice_draws_from_history() {
        let mut store = SampleStore::new();
        for offset in [10.0, 20.0, 30.0, 40.0] {
            store.append(obs(offset, 100.0));
        }
        for _ in 0..100 {
            let choice = store.random_choice().unwrap();
            assert!(
                store
                    .observations()
                    .iter()
                    .any(|o| o.raw_offset == choice.raw_offset)
            );
        }
    }

    #[test]
    fn random_choice_eventually_hits_every_entry() {
        let mut store = SampleStore::new();
        for offset in [10.0, 20.0, 30.0] {
            store.append(obs(offset, 100.0));
        }
        let mut seen = std::collections::HashSet::new();
        for _ in 0..500 {
            let choice = store.random_choice().unwrap();
            seen.insert(choice.raw_offset as u64);
        }
        assert_eq!(seen.len(), 3);
    }

    #[test]
    fn secure_index_in_range() {
        for len in [1, 2, 7, 100] {
            for _ in 0..50 {
                assert!(secure_index(len) < len);
            }
        }
    }

    #[test]
    fn color_entropy_single_bucket_is_zero() {
        let mut store = SampleStore::new();
        store.append(obs(50.0, 100.0));
        store.append(obs(60.0, 100.0));
        assert_eq!(store.color_entropy(), 0.0);
    }

    #[test]
    fn color_entropy_two_even_buckets_is_one_bit() {
        let mut store = SampleStore::new();
        store.append(obs(50.0, 100.0)); // green
        store.append(obs(50.0, 100.0)); // green
        store.append(obs(1.0, 100.0)); // red
        store.append(obs(1.0, 100.0)); // red
        assert!((store.color_entropy() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn color_entropy_empty_store_is_zero() {
        assert_eq!(SampleStore::new().color_entropy(), 0.0);
    }
}
