//! Platform helpers for the cycle runner.

pub mod cpu_affinity;

pub use cpu_affinity::{core_count, CpuPinGuard};
