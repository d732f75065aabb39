//! # Dot Product Payload
//!
//! `dot(a, b) = Σ(a[i] * b[i])` over two random `f32` vectors. Each cycle's
//! factory draws fresh vectors outside the timed region; the measured task
//! is the unrolled kernel wrapped so a length mismatch is logged, not raised.

pub mod code;
#[cfg(test)]
pub mod test;

use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;

use rand::Rng;

use crate::clock::Clock;
use crate::error::Result;
use crate::registry::Payload;
use crate::task::guarded;

pub struct DotProductPayload;

/// Two vectors of `size` values drawn uniformly from `[-1, 1)`.
pub fn random_vectors(size: usize) -> (Vec<f32>, Vec<f32>) {
    let mut rng = rand::rng();
    let a = (0..size).map(|_| rng.random_range(-1.0..1.0)).collect();
    let b = (0..size).map(|_| rng.random_range(-1.0..1.0)).collect();
    (a, b)
}

impl Payload for DotProductPayload {
    fn name(&self) -> &'static str {
        "dot_product"
    }

    fn description(&self) -> &'static str {
        "Computes the sum of products of corresponding vector elements"
    }

    fn category(&self) -> &'static str {
        "math"
    }

    fn time(&self, clock: &Clock, size: usize) -> Result<Vec<Duration>> {
        let name = self.name();
        clock.time_named(
            || {
                let (a, b) = random_vectors(size);
                let (a, b) = (Arc::new(a), Arc::new(b));
                Ok::<_, Infallible>(guarded(name, move || code::dot_product_unrolled(&a, &b)))
            },
            name,
        )
    }

    fn verify(&self) -> std::result::Result<(), String> {
        // Non-multiple of 4 to exercise the remainder loop.
        let (a, b) = random_vectors(1023);
        let expected = code::dot_product_original(&a, &b).map_err(|e| e.to_string())?;
        let result = code::dot_product_unrolled(&a, &b).map_err(|e| e.to_string())?;

        // Accumulation order affects the lower bits.
        let diff = (result - expected).abs();
        if diff > 1e-3 {
            return Err(format!(
                "unrolled kernel failed verification. Expected {}, got {}, diff {}",
                expected, result, diff
            ));
        }
        Ok(())
    }
}
