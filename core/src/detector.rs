//! Anomaly detector — a 3-sigma outlier rule over the purchaser's network.
//!
//! RULE: Statistics are rounded to cents before they are compared, and the
//! reported mean/sd are exactly the values the decision used.

use crate::types::Amount;

// ── Constants ────────────────────────────────────────────────────────────────

/// Standard deviations above the mean a purchase must exceed.
pub const SIGMA_MULTIPLIER: f64 = 3.0;

/// Smallest sample for which a standard deviation is meaningful.
pub const MIN_SAMPLE_SIZE: usize = 2;

// ── Statistics ───────────────────────────────────────────────────────────────

/// Mean and population standard deviation, both rounded to two decimals.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SampleStats {
    pub mean: f64,
    pub sd:   f64,
}

impl SampleStats {
    /// `None` when the sample is too small to judge.
    pub fn from_sample(sample: &[Amount]) -> Option<Self> {
        if sample.len() < MIN_SAMPLE_SIZE {
            return None;
        }
        let n = sample.len() as f64;
        let mean = sample.iter().sum::<f64>() / n;
        let variance = sample.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n;
        Some(Self {
            mean: round_cents(mean),
            sd:   round_cents(variance.sqrt()),
        })
    }

    pub fn threshold(&self) -> f64 {
        self.mean + SIGMA_MULTIPLIER * self.sd
    }
}

// ── Detector ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default)]
pub struct AnomalyDetector;

impl AnomalyDetector {
    pub fn new() -> Self {
        Self
    }

    /// Statistics of `sample` if `amount` is anomalous against it.
    pub fn evaluate(&self, amount: Amount, sample: &[Amount]) -> Option<SampleStats> {
        SampleStats::from_sample(sample).filter(|stats| amount > stats.threshold())
    }

    pub fn is_anomalous(&self, amount: Amount, sample: &[Amount]) -> bool {
        self.evaluate(amount, sample).is_some()
    }
}

fn round_cents(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tiny_samples_never_flag() {
        let d = AnomalyDetector::new();
        assert!(!d.is_anomalous(1e9, &[]));
        assert!(!d.is_anomalous(1e9, &[1.0]));
    }

    #[test]
    fn population_sd_is_used() {
        let stats = SampleStats::from_sample(&[20.0, 30.0]).unwrap();
        assert_eq!(stats.mean, 25.0);
        assert_eq!(stats.sd, 5.0);
        assert_eq!(stats.threshold(), 40.0);
    }

    #[test]
    fn threshold_is_strict() {
        let d = AnomalyDetector::new();
        let sample = [20.0, 30.0];
        assert!(!d.is_anomalous(40.0, &sample));
        assert!(d.is_anomalous(40.01, &sample));
    }

    #[test]
    fn decision_is_monotonic_in_amount() {
        let d = AnomalyDetector::new();
        let sample = [12.5, 14.0, 9.75, 30.2, 11.0, 16.4];
        let mut seen_flag = false;
        for step in 0..2000 {
            let amount = step as f64 * 0.5;
            let flagged = d.is_anomalous(amount, &sample);
            assert!(!seen_flag || flagged, "unflagged {amount} after a smaller flagged amount");
            seen_flag |= flagged;
        }
        assert!(seen_flag);
    }

    #[test]
    fn stats_are_rounded_to_cents() {
        let stats = SampleStats::from_sample(&[1.0, 2.0, 2.0]).unwrap();
        assert_eq!(stats.mean, 1.67);
        assert_eq!(stats.sd, 0.47);
    }
}
