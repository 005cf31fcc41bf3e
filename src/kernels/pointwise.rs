//! This module contains the pure, stateless kernels for pixel-wise transforms.
//!
//! Each kernel reads from a full input replica and writes only the indices in the
//! caller's owned range of the output. Indices outside that range are left
//! untouched. Global statistics (`min`, `max`) are computed by the caller over the
//! full replica and passed in, so every rank derives identical constants.

use num_traits::Float;
use std::ops::Range;

use crate::error::FieldError;

/// Contrast inversion: `out = min + range * (1 - (in - min) / range)`.
///
/// A constant input (`range == 0`) is copied through unchanged.
pub fn negate<T: Float>(input: &[T], output: &mut [T], owned: Range<usize>, min: T, max: T) {
    let range = max - min;
    if range == T::zero() {
        output[owned.clone()].copy_from_slice(&input[owned]);
        return;
    }
    for k in owned {
        output[k] = min + range * (T::one() - (input[k] - min) / range);
    }
}

/// Affine map: `out = (in + shift) * scale`.
pub fn shift_scale<T: Float>(input: &[T], output: &mut [T], owned: Range<usize>, shift: T, scale: T) {
    for k in owned {
        output[k] = (input[k] + shift) * scale;
    }
}

/// Rescales into `[0, 1]`: `out = (in - min) / (max - min)`.
///
/// A constant input (`range == 0`) is copied through unchanged.
pub fn normalise<T: Float>(input: &[T], output: &mut [T], owned: Range<usize>, min: T, max: T) {
    let range = max - min;
    if range == T::zero() {
        output[owned.clone()].copy_from_slice(&input[owned]);
        return;
    }
    shift_scale(input, output, owned, -min, T::one() / range);
}

/// Natural logarithm. Fails on the first non-positive element in `owned`.
pub fn log<T: Float>(input: &[T], output: &mut [T], owned: Range<usize>) -> Result<(), FieldError> {
    for k in owned {
        let v = input[k];
        if !(v > T::zero()) {
            return Err(domain_error(k, v));
        }
        output[k] = v.ln();
    }
    Ok(())
}

/// Scans a whole replica for values outside the logarithm's domain.
///
/// Run by every rank over its full input before any work is done, so that a bad
/// value makes the whole group fail together instead of leaving the leader
/// waiting on a follower that bailed out.
pub fn check_log_domain<T: Float>(input: &[T]) -> Result<(), FieldError> {
    match input.iter().position(|&v| !(v > T::zero())) {
        Some(k) => Err(domain_error(k, input[k])),
        None => Ok(()),
    }
}

fn domain_error<T: Float>(index: usize, value: T) -> FieldError {
    FieldError::Domain {
        index,
        value: value.to_f32().unwrap_or(f32::NAN),
    }
}
