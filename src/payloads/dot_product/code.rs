//! Dot product kernels.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
#[error("vectors have different lengths ({left} vs {right})")]
pub struct LengthMismatch {
    pub left: usize,
    pub right: usize,
}

/// Reference dot product.
///
/// # Example
/// ```
/// use cycle_clock::payloads::dot_product::code::dot_product_original;
///
/// let a = [1.0, 2.0, 3.0];
/// let b = [4.0, 5.0, 6.0];
/// let result = dot_product_original(&a, &b).unwrap();
/// assert!((result - 32.0).abs() < 1e-6);
/// ```
pub fn dot_product_original(a: &[f32], b: &[f32]) -> Result<f32, LengthMismatch> {
    check_lengths(a, b)?;
    Ok(a.iter().zip(b.iter()).map(|(x, y)| x * y).sum())
}

/// Dot product with 4x unrolling and independent accumulators.
pub fn dot_product_unrolled(a: &[f32], b: &[f32]) -> Result<f32, LengthMismatch> {
    check_lengths(a, b)?;

    let mut sums = [0.0f32; 4];
    let mut chunks_a = a.chunks_exact(4);
    let mut chunks_b = b.chunks_exact(4);
    for (ca, cb) in chunks_a.by_ref().zip(chunks_b.by_ref()) {
        sums[0] += ca[0] * cb[0];
        sums[1] += ca[1] * cb[1];
        sums[2] += ca[2] * cb[2];
        sums[3] += ca[3] * cb[3];
    }
    for (x, y) in chunks_a.remainder().iter().zip(chunks_b.remainder()) {
        sums[0] += x * y;
    }

    Ok((sums[0] + sums[1]) + (sums[2] + sums[3]))
}

fn check_lengths(a: &[f32], b: &[f32]) -> Result<(), LengthMismatch> {
    if a.len() == b.len() {
        Ok(())
    } else {
        Err(LengthMismatch {
            left: a.len(),
            right: b.len(),
        })
    }
}
