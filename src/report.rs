//! Log-line formatting for timing runs.

use std::time::Duration;

use crate::config::ClockConfig;
use crate::judge::as_seconds;

/// Format a cycle duration as `"<seconds>.<millis> seconds"`.
///
/// Uses three fractional digits, rounded: `1.234567s` prints as
/// `"1.235 seconds"`.
pub fn format_duration(d: Duration) -> String {
    format!("{:.3} seconds", as_seconds(d))
}

/// Describe a run: `"<name> - <N> iterations per cycle, <P> threads, <T> <unit> timeout per cycle"`.
pub fn metadata_line(config: &ClockConfig, test_name: &str) -> String {
    format!(
        "{} - {} iterations per cycle, {} threads, {} {} timeout per cycle",
        test_name,
        config.iterations_per_cycle(),
        config.thread_pool_size(),
        config.timeout_length(),
        config.timeout_unit()
    )
}

pub fn log_duration(d: Duration) {
    tracing::info!("{}", format_duration(d));
}

pub fn log_durations(results: &[Duration]) {
    for &d in results {
        log_duration(d);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ClockBuilder, TimeUnit};

    #[test]
    fn test_format_rounds_to_millis() {
        assert_eq!(format_duration(Duration::new(1, 234_567_000)), "1.235 seconds");
        assert_eq!(format_duration(Duration::new(1, 234_000_000)), "1.234 seconds");
        assert_eq!(format_duration(Duration::ZERO), "0.000 seconds");
        assert_eq!(format_duration(Duration::from_millis(12)), "0.012 seconds");
        assert_eq!(format_duration(Duration::from_secs(90)), "90.000 seconds");
    }

    #[test]
    fn test_metadata_line_defaults() {
        let config = ClockBuilder::new().build_config().unwrap();
        assert_eq!(
            metadata_line(&config, "perfTestEncrypt"),
            "perfTestEncrypt - 10000 iterations per cycle, 1 threads, 1 minutes timeout per cycle"
        );
    }

    #[test]
    fn test_metadata_line_custom() {
        let config = ClockBuilder::new()
            .thread_pool_size(16)
            .iterations_per_cycle(100_000)
            .timeout(50, TimeUnit::Milliseconds)
            .build_config()
            .unwrap();
        assert_eq!(
            metadata_line(&config, "decrypt"),
            "decrypt - 100000 iterations per cycle, 16 threads, 50 milliseconds timeout per cycle"
        );
    }
}
