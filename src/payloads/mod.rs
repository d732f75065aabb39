//! Bundled demo payloads.

pub mod dot_product;
pub mod xoroshiro;
