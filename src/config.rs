//! Harness configuration.
//!
//! [`ClockConfig`] is the immutable parameter bundle that drives the adaptive
//! loop. It is only obtainable through [`ClockBuilder`], which starts from the
//! defaults below and validates every invariant when it is finalized.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::clock::Clock;
use crate::error::{ClockError, Result};

// ============================================================================
// Time units
// ============================================================================

/// Unit of the per-cycle timeout.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum TimeUnit {
    Nanoseconds,
    Microseconds,
    Milliseconds,
    Seconds,
    #[default]
    Minutes,
    Hours,
    Days,
}

impl TimeUnit {
    pub const ALL: [TimeUnit; 7] = [
        TimeUnit::Nanoseconds,
        TimeUnit::Microseconds,
        TimeUnit::Milliseconds,
        TimeUnit::Seconds,
        TimeUnit::Minutes,
        TimeUnit::Hours,
        TimeUnit::Days,
    ];

    /// Lowercase plural name, as printed in the metadata line.
    pub const fn name(self) -> &'static str {
        match self {
            TimeUnit::Nanoseconds => "nanoseconds",
            TimeUnit::Microseconds => "microseconds",
            TimeUnit::Milliseconds => "milliseconds",
            TimeUnit::Seconds => "seconds",
            TimeUnit::Minutes => "minutes",
            TimeUnit::Hours => "hours",
            TimeUnit::Days => "days",
        }
    }

    const fn nanos_per_unit(self) -> u128 {
        match self {
            TimeUnit::Nanoseconds => 1,
            TimeUnit::Microseconds => 1_000,
            TimeUnit::Milliseconds => 1_000_000,
            TimeUnit::Seconds => 1_000_000_000,
            TimeUnit::Minutes => 60 * 1_000_000_000,
            TimeUnit::Hours => 3_600 * 1_000_000_000,
            TimeUnit::Days => 86_400 * 1_000_000_000,
        }
    }

    /// Convert `length` of this unit into a [`Duration`], saturating at
    /// [`Duration::MAX`].
    pub fn duration(self, length: u64) -> Duration {
        let nanos = length as u128 * self.nanos_per_unit();
        let secs = nanos / 1_000_000_000;
        let sub = (nanos % 1_000_000_000) as u32;
        match u64::try_from(secs) {
            Ok(secs) => Duration::new(secs, sub),
            Err(_) => Duration::MAX,
        }
    }
}

impl fmt::Display for TimeUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for TimeUnit {
    type Err = ClockError;

    fn from_str(s: &str) -> Result<Self> {
        let lowered = s.trim().to_ascii_lowercase();
        let unit = match lowered.as_str() {
            "ns" | "nanos" | "nanoseconds" => TimeUnit::Nanoseconds,
            "us" | "micros" | "microseconds" => TimeUnit::Microseconds,
            "ms" | "millis" | "milliseconds" => TimeUnit::Milliseconds,
            "s" | "secs" | "seconds" => TimeUnit::Seconds,
            "m" | "min" | "minutes" => TimeUnit::Minutes,
            "h" | "hours" => TimeUnit::Hours,
            "d" | "days" => TimeUnit::Days,
            _ => return Err(ClockError::UnknownTimeUnit(s.to_string())),
        };
        Ok(unit)
    }
}

// ============================================================================
// Configuration
// ============================================================================

/// Immutable parameters for one [`Clock`].
///
/// Only obtainable from [`ClockBuilder::build_config`] (or
/// [`ClockConfig::default`]), so every instance has passed validation.
///
/// ```compile_fail
/// use cycle_clock::ClockConfig;
///
/// let config = ClockConfig { thread_pool_size: 0, ..ClockConfig::default() };
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClockConfig {
    print_intermediate: bool,
    thread_pool_size: usize,
    timeout_length: u64,
    timeout_unit: TimeUnit,
    iterations_per_cycle: usize,
    min_cycles: usize,
    stat_cycles: usize,
    stat_verify_cycles: usize,
    max_cycles: usize,
    pin_workers: bool,
}

impl ClockConfig {
    /// Log every cycle duration as it completes (default: true)
    pub fn print_intermediate(&self) -> bool {
        self.print_intermediate
    }

    /// Number of parallel workers for one cycle (default: 1)
    pub fn thread_pool_size(&self) -> usize {
        self.thread_pool_size
    }

    /// Magnitude of the per-cycle wall-clock budget (default: 1)
    pub fn timeout_length(&self) -> u64 {
        self.timeout_length
    }

    /// Unit of the per-cycle wall-clock budget (default: minutes)
    pub fn timeout_unit(&self) -> TimeUnit {
        self.timeout_unit
    }

    /// Task replicas per cycle (default: 10,000)
    pub fn iterations_per_cycle(&self) -> usize {
        self.iterations_per_cycle
    }

    /// Cycles recorded before the stopping rule is consulted (default: 25)
    pub fn min_cycles(&self) -> usize {
        self.min_cycles
    }

    /// Trailing window for mean/stdev (default: 20)
    pub fn stat_cycles(&self) -> usize {
        self.stat_cycles
    }

    /// Trailing sub-window that must sit inside the band (default: 5)
    pub fn stat_verify_cycles(&self) -> usize {
        self.stat_verify_cycles
    }

    /// Hard cap on recorded cycles (default: 100)
    pub fn max_cycles(&self) -> usize {
        self.max_cycles
    }

    /// Pin each worker to its own core for the cycle (default: false)
    pub fn pin_workers(&self) -> bool {
        self.pin_workers
    }

    /// Wall-clock budget for one cycle.
    pub fn timeout(&self) -> Duration {
        self.timeout_unit.duration(self.timeout_length)
    }

    fn validate(&self) -> Result<()> {
        if self.thread_pool_size == 0 {
            return Err(ClockError::invalid("thread_pool_size", "must be at least 1"));
        }
        if self.timeout_length == 0 {
            return Err(ClockError::invalid("timeout_length", "must be at least 1"));
        }
        if self.iterations_per_cycle == 0 {
            return Err(ClockError::invalid(
                "iterations_per_cycle",
                "must be at least 1",
            ));
        }
        if self.min_cycles == 0 {
            return Err(ClockError::invalid("min_cycles", "must be at least 1"));
        }
        if self.stat_cycles < 2 {
            return Err(ClockError::invalid(
                "stat_cycles",
                format!("must be at least 2 to compute a deviation, got {}", self.stat_cycles),
            ));
        }
        if self.stat_verify_cycles == 0 {
            return Err(ClockError::invalid("stat_verify_cycles", "must be at least 1"));
        }
        if self.stat_verify_cycles > self.stat_cycles {
            return Err(ClockError::invalid(
                "stat_verify_cycles",
                format!(
                    "{} exceeds stat_cycles ({})",
                    self.stat_verify_cycles, self.stat_cycles
                ),
            ));
        }
        if self.min_cycles > self.max_cycles {
            return Err(ClockError::invalid(
                "max_cycles",
                format!(
                    "{} is below min_cycles ({})",
                    self.max_cycles, self.min_cycles
                ),
            ));
        }
        Ok(())
    }
}

impl Default for ClockConfig {
    fn default() -> Self {
        Self {
            print_intermediate: true,
            thread_pool_size: 1,
            timeout_length: 1,
            timeout_unit: TimeUnit::Minutes,
            iterations_per_cycle: 10_000,
            min_cycles: 25,
            stat_cycles: 20,
            stat_verify_cycles: 5,
            max_cycles: 100,
            pin_workers: false,
        }
    }
}

// ============================================================================
// Builder
// ============================================================================

/// Builder for [`Clock`], seeded with [`ClockConfig::default`].
#[derive(Clone, Debug, Default)]
pub struct ClockBuilder {
    config: ClockConfig,
}

impl ClockBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn print_intermediate(mut self, enabled: bool) -> Self {
        self.config.print_intermediate = enabled;
        self
    }

    pub fn thread_pool_size(mut self, size: usize) -> Self {
        self.config.thread_pool_size = size;
        self
    }

    pub fn timeout_length(mut self, length: u64) -> Self {
        self.config.timeout_length = length;
        self
    }

    pub fn timeout_unit(mut self, unit: TimeUnit) -> Self {
        self.config.timeout_unit = unit;
        self
    }

    /// Shorthand for setting both timeout fields.
    pub fn timeout(self, length: u64, unit: TimeUnit) -> Self {
        self.timeout_length(length).timeout_unit(unit)
    }

    pub fn iterations_per_cycle(mut self, iterations: usize) -> Self {
        self.config.iterations_per_cycle = iterations;
        self
    }

    pub fn min_cycles(mut self, cycles: usize) -> Self {
        self.config.min_cycles = cycles;
        self
    }

    pub fn stat_cycles(mut self, cycles: usize) -> Self {
        self.config.stat_cycles = cycles;
        self
    }

    pub fn stat_verify_cycles(mut self, cycles: usize) -> Self {
        self.config.stat_verify_cycles = cycles;
        self
    }

    pub fn max_cycles(mut self, cycles: usize) -> Self {
        self.config.max_cycles = cycles;
        self
    }

    pub fn pin_workers(mut self, enabled: bool) -> Self {
        self.config.pin_workers = enabled;
        self
    }

    /// Validate and freeze the configuration.
    pub fn build_config(self) -> Result<ClockConfig> {
        self.config.validate()?;
        if self.config.stat_cycles > self.config.min_cycles {
            tracing::warn!(
                stat_cycles = self.config.stat_cycles,
                min_cycles = self.config.min_cycles,
                "stat window is wider than min_cycles; early verdicts use a truncated window"
            );
        }
        Ok(self.config)
    }

    /// Validate the configuration and construct a [`Clock`].
    pub fn build(self) -> Result<Clock> {
        Ok(Clock::new(self.build_config()?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ClockBuilder::new().build_config().unwrap();
        assert_eq!(config, ClockConfig::default());
        assert!(config.print_intermediate);
        assert_eq!(config.thread_pool_size, 1);
        assert_eq!(config.iterations_per_cycle, 10_000);
        assert_eq!(config.min_cycles, 25);
        assert_eq!(config.stat_cycles, 20);
        assert_eq!(config.stat_verify_cycles, 5);
        assert_eq!(config.max_cycles, 100);
        assert_eq!(config.timeout(), Duration::from_secs(60));
    }

    #[test]
    fn test_unit_conversion() {
        assert_eq!(TimeUnit::Nanoseconds.duration(1_500), Duration::from_nanos(1_500));
        assert_eq!(TimeUnit::Microseconds.duration(7), Duration::from_micros(7));
        assert_eq!(TimeUnit::Milliseconds.duration(50), Duration::from_millis(50));
        assert_eq!(TimeUnit::Seconds.duration(3), Duration::from_secs(3));
        assert_eq!(TimeUnit::Hours.duration(2), Duration::from_secs(7_200));
        assert_eq!(TimeUnit::Days.duration(1), Duration::from_secs(86_400));
        assert_eq!(TimeUnit::Days.duration(u64::MAX), Duration::MAX);
    }

    #[test]
    fn test_unit_names_round_trip() {
        for unit in TimeUnit::ALL {
            assert_eq!(unit.to_string(), unit.name());
            assert_eq!(unit.name().parse::<TimeUnit>().unwrap(), unit);
        }
        assert_eq!("MS".parse::<TimeUnit>().unwrap(), TimeUnit::Milliseconds);
        assert!(matches!(
            "fortnights".parse::<TimeUnit>(),
            Err(ClockError::UnknownTimeUnit(_))
        ));
    }

    #[test]
    fn test_verify_window_wider_than_stat_window_rejected() {
        let err = ClockBuilder::new()
            .stat_cycles(4)
            .stat_verify_cycles(5)
            .build_config()
            .unwrap_err();
        assert!(matches!(
            err,
            ClockError::ConfigInvalid { field: "stat_verify_cycles", .. }
        ));
    }

    #[test]
    fn test_min_above_max_rejected() {
        let err = ClockBuilder::new()
            .min_cycles(10)
            .max_cycles(9)
            .build_config()
            .unwrap_err();
        assert!(matches!(err, ClockError::ConfigInvalid { field: "max_cycles", .. }));
    }

    #[test]
    fn test_min_equal_max_accepted() {
        let config = ClockBuilder::new()
            .min_cycles(4)
            .max_cycles(4)
            .stat_cycles(3)
            .stat_verify_cycles(2)
            .build_config()
            .unwrap();
        assert_eq!(config.min_cycles, config.max_cycles);
    }

    #[test]
    fn test_default_config_is_valid() {
        assert!(ClockConfig::default().validate().is_ok());
    }

    #[test]
    fn test_zero_counts_rejected() {
        let cases: Vec<(&str, ClockBuilder)> = vec![
            ("thread_pool_size", ClockBuilder::new().thread_pool_size(0)),
            ("timeout_length", ClockBuilder::new().timeout_length(0)),
            ("iterations_per_cycle", ClockBuilder::new().iterations_per_cycle(0)),
            ("min_cycles", ClockBuilder::new().min_cycles(0)),
            ("stat_cycles", ClockBuilder::new().stat_cycles(1).stat_verify_cycles(1)),
            ("stat_verify_cycles", ClockBuilder::new().stat_verify_cycles(0)),
        ];

        for (expected, builder) in cases {
            match builder.build_config() {
                Err(ClockError::ConfigInvalid { field, .. }) => assert_eq!(field, expected),
                other => panic!("expected {} to be rejected, got {:?}", expected, other),
            }
        }
    }
}
