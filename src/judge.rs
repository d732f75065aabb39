//! Stopping rule for the adaptive loop.
//!
//! The judge looks at the trailing `stat_cycles` durations, computes a mean
//! and a spread, and declares the run stable once every one of the trailing
//! `stat_verify_cycles` samples sits inside `mean ± stdev / 2`.
//!
//! The spread is computed as `Σ (w − μ)(w + μ) / (n − 1)`, i.e.
//! `(Σ w² − n·μ²) / (n − 1)`. With μ the window mean this is algebraically the
//! sample variance, but it rounds differently (and can dip below zero for
//! near-identical samples, giving a NaN band). It is kept in this form so
//! verdicts match existing runs of the harness.

use std::time::Duration;

use crate::config::ClockConfig;

/// Outcome of one evaluation of the stopping rule.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Verdict {
    /// Fewer than `min_cycles` samples recorded.
    InsufficientData,
    /// `max_cycles` reached. Still "not acceptable"; the loop enforces the cap.
    CapReached,
    /// At least one verify-window sample lies outside the band.
    Unstable,
    /// Every verify-window sample lies inside the band.
    Stable,
}

/// Window statistics behind a verdict.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WindowStats {
    pub mean: f64,
    pub stdev: f64,
    pub lower: f64,
    pub upper: f64,
}

#[derive(Clone, Copy, Debug)]
pub struct StabilityJudge {
    min_cycles: usize,
    max_cycles: usize,
    stat_cycles: usize,
    stat_verify_cycles: usize,
}

/// Duration as fractional seconds.
pub fn as_seconds(d: Duration) -> f64 {
    d.as_secs() as f64 + d.subsec_nanos() as f64 / 1_000_000_000.0
}

/// Mean and band of `window`, or `None` if it holds fewer than two samples.
pub fn window_stats(window: &[f64]) -> Option<WindowStats> {
    if window.len() < 2 {
        return None;
    }
    let n = window.len() as f64;
    let mean = window.iter().sum::<f64>() / n;
    let variance = window
        .iter()
        .fold(0.0, |acc, &w| acc + (w - mean) * (w + mean))
        / (n - 1.0);
    let stdev = variance.sqrt();

    Some(WindowStats {
        mean,
        stdev,
        lower: mean - stdev / 2.0,
        upper: mean + stdev / 2.0,
    })
}

impl StabilityJudge {
    pub fn new(config: &ClockConfig) -> Self {
        Self {
            min_cycles: config.min_cycles(),
            max_cycles: config.max_cycles(),
            stat_cycles: config.stat_cycles(),
            stat_verify_cycles: config.stat_verify_cycles(),
        }
    }

    /// Apply the stopping rule to the results recorded so far.
    pub fn evaluate(&self, results: &[Duration]) -> Verdict {
        if results.len() < self.min_cycles {
            return Verdict::InsufficientData;
        }
        if results.len() >= self.max_cycles {
            return Verdict::CapReached;
        }

        let tail = &results[results.len().saturating_sub(self.stat_cycles)..];
        let window: Vec<f64> = tail.iter().copied().map(as_seconds).collect();

        let Some(stats) = window_stats(&window) else {
            return Verdict::Unstable;
        };

        let verify = &window[window.len().saturating_sub(self.stat_verify_cycles)..];
        // NaN bounds compare false on both sides, so a NaN band never rejects.
        let noisy = verify.iter().any(|&w| w < stats.lower || w > stats.upper);

        tracing::trace!(
            samples = results.len(),
            mean = stats.mean,
            stdev = stats.stdev,
            noisy,
            "stability window evaluated"
        );

        if noisy {
            Verdict::Unstable
        } else {
            Verdict::Stable
        }
    }

    /// `true` iff the rule declares the run stable.
    pub fn should_stop(&self, results: &[Duration]) -> bool {
        self.evaluate(results) == Verdict::Stable
    }
}
