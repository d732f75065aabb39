//! # Xoroshiro128++ Payload
//!
//! Measures drawing `size` numbers from a Xoroshiro128++ stream. The factory
//! seeds each cycle with fresh OS-thread randomness; every replica of the
//! task restarts from that seed, so the task is shared without locking.

pub mod code;
#[cfg(test)]
pub mod test;

use std::convert::Infallible;
use std::time::Duration;

use rand::Rng;

use crate::clock::Clock;
use crate::error::Result;
use crate::registry::Payload;

pub struct XoroshiroPayload;

/// A seed with at least one non-zero half (all-zero is a fixed point).
pub fn random_seed() -> (u64, u64) {
    let mut rng = rand::rng();
    let lo: u64 = rng.random();
    let hi: u64 = rng.random();
    if lo == 0 && hi == 0 {
        (1, 0)
    } else {
        (lo, hi)
    }
}

impl Payload for XoroshiroPayload {
    fn name(&self) -> &'static str {
        "xoroshiro128++"
    }

    fn description(&self) -> &'static str {
        "Xoroshiro128++ pseudo-random number generator"
    }

    fn category(&self) -> &'static str {
        "random"
    }

    fn time(&self, clock: &Clock, size: usize) -> Result<Vec<Duration>> {
        clock.time_named(
            || {
                let seed = random_seed();
                Ok::<_, Infallible>(move || code::xoroshiro_fold(seed, size))
            },
            self.name(),
        )
    }

    fn verify(&self) -> std::result::Result<(), String> {
        // Seed (1, 0): rotl(1, 17) + 1
        let (mut s0, mut s1) = (1, 0);
        let first = code::xoroshiro_next(&mut s0, &mut s1);
        if first != 131_073 {
            return Err(format!("expected 131073 for seed (1, 0), got {}", first));
        }

        let seed = (0xdeadbeef, 0xcafebab);
        let (mut s0, mut s1) = seed;
        let expected = (0..100).fold(0, |acc, _| acc ^ code::xoroshiro_next(&mut s0, &mut s1));
        let folded = code::xoroshiro_fold(seed, 100);
        if folded != expected {
            return Err(format!("fold mismatch: expected {}, got {}", expected, folded));
        }
        Ok(())
    }
}
