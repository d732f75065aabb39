/// One step of Xoroshiro128++.
pub fn xoroshiro_next(seed_lo: &mut u64, seed_hi: &mut u64) -> u64 {
    let s0 = *seed_lo;
    let s1 = *seed_hi;

    let result = s0.wrapping_add(s1).rotate_left(17).wrapping_add(s0);

    let s1 = s1 ^ s0;
    *seed_lo = s0.rotate_left(49) ^ s1 ^ (s1 << 21); // a, b
    *seed_hi = s1.rotate_left(28); // c

    result
}

/// Draw `count` values starting from `seed` and fold them with xor.
pub fn xoroshiro_fold(seed: (u64, u64), count: usize) -> u64 {
    let (mut s0, mut s1) = seed;
    (0..count).fold(0, |acc, _| acc ^ xoroshiro_next(&mut s0, &mut s1))
}
