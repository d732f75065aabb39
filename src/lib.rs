//! # Cycle-Clock
//!
//! An adaptive micro-benchmark harness. A [`Clock`] times batches of a
//! caller-supplied task on a bounded worker pool, one cycle at a time, until
//! the trailing cycle durations settle (or a cycle cap is hit).

pub mod clock;
pub mod config;
pub mod error;
pub mod judge;
pub mod payloads;
pub mod registry;
pub mod report;
pub mod runner;
pub mod task;
pub mod utils;

pub use clock::Clock;
pub use config::{ClockBuilder, ClockConfig, TimeUnit};
pub use error::{ClockError, Result};
pub use judge::{StabilityJudge, Verdict};
pub use report::{format_duration, metadata_line};
pub use runner::{CycleRunner, CycleStats};
pub use task::{generate_tasks, guarded, Batch, Task};

/// Re-export commonly used items
pub mod prelude {
    pub use crate::config::{ClockBuilder, TimeUnit};
    pub use crate::registry::{build_registry, Payload, PayloadRegistry};
    pub use crate::task::{guarded, is_cancelled, sleep};
    pub use crate::{Clock, ClockError};
}
