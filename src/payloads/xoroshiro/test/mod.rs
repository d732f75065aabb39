use super::code;
use super::{random_seed, XoroshiroPayload};
use crate::config::ClockBuilder;
use crate::registry::Payload;

#[test]
fn test_xoroshiro_known_value() {
    // Seed s0 = 1, s1 = 0:
    // result = rotl(s0 + s1, 17) + s0 = 131072 + 1
    let mut s0 = 1;
    let mut s1 = 0;
    assert_eq!(code::xoroshiro_next(&mut s0, &mut s1), 131073);
}

#[test]
fn test_fold_is_deterministic() {
    let seed = (0x12345678, 0x87654321);
    assert_eq!(code::xoroshiro_fold(seed, 1_000), code::xoroshiro_fold(seed, 1_000));
    assert_eq!(code::xoroshiro_fold(seed, 0), 0);
}

#[test]
fn test_random_seed_is_never_all_zero() {
    for _ in 0..100 {
        assert_ne!(random_seed(), (0, 0));
    }
}

#[test]
fn test_payload_runs_under_clock() {
    let clock = ClockBuilder::new()
        .print_intermediate(false)
        .iterations_per_cycle(10)
        .min_cycles(2)
        .max_cycles(2)
        .stat_cycles(2)
        .stat_verify_cycles(1)
        .build()
        .unwrap();

    let results = XoroshiroPayload.time(&clock, 1024).unwrap();
    assert_eq!(results.len(), 2);
}
