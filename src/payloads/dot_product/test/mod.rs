use super::code::*;
use super::{random_vectors, DotProductPayload};
use crate::config::ClockBuilder;
use crate::registry::Payload;

const EPSILON: f32 = 1e-5;

fn assert_close(a: f32, b: f32, msg: &str) {
    let diff = (a - b).abs();
    assert!(diff < EPSILON, "{}: expected {}, got {}, diff = {}", msg, b, a, diff);
}

#[test]
fn test_original_basic() {
    let a = [1.0, 2.0, 3.0, 4.0];
    let b = [5.0, 6.0, 7.0, 8.0];
    // 1*5 + 2*6 + 3*7 + 4*8 = 70
    assert_close(dot_product_original(&a, &b).unwrap(), 70.0, "original basic");
}

#[test]
fn test_unrolled_handles_remainder() {
    let a = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
    let b = [1.0; 6];
    assert_close(dot_product_unrolled(&a, &b).unwrap(), 21.0, "unrolled remainder");
}

#[test]
fn test_empty_is_zero() {
    assert_close(dot_product_unrolled(&[], &[]).unwrap(), 0.0, "unrolled empty");
}

#[test]
fn test_length_mismatch_is_an_error() {
    assert_eq!(
        dot_product_original(&[1.0], &[1.0, 2.0]),
        Err(LengthMismatch { left: 1, right: 2 })
    );
    assert!(dot_product_unrolled(&[1.0, 2.0], &[]).is_err());
}

#[test]
fn test_random_vectors_in_range() {
    let (a, b) = random_vectors(64);
    assert_eq!(a.len(), 64);
    assert_eq!(b.len(), 64);
    assert!(a.iter().chain(b.iter()).all(|v| (-1.0..1.0).contains(v)));
}

#[test]
fn test_payload_runs_under_clock() {
    let clock = ClockBuilder::new()
        .iterations_per_cycle(20)
        .min_cycles(2)
        .max_cycles(3)
        .stat_cycles(2)
        .stat_verify_cycles(1)
        .build()
        .unwrap();

    let results = DotProductPayload.time(&clock, 128).unwrap();
    assert!(results.len() >= 2 && results.len() <= 3);
}
