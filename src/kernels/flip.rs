//! This module contains the pure, stateless kernels for mirroring a field.
//!
//! Both kernels are row-partitioned. The horizontal flip is row-local: each owned
//! row is mirrored in place of the output. The vertical flip works on the upper
//! half only: owning row `j` means writing both row `j` and its mirror row
//! `height - j - 1`, so one local step touches two disjoint output regions.

use std::ops::Range;

/// Mirrors every owned row left-to-right.
///
/// Columns are swap-written in pairs `(i, width - i - 1)` for `i < width / 2`. On
/// an odd width the centre column maps onto itself and is copied through.
pub fn flip_horizontal<T: Copy>(input: &[T], output: &mut [T], width: usize, rows: Range<usize>) {
    if width == 0 {
        return;
    }
    for j in rows {
        let row = j * width;
        for i in 0..width / 2 {
            output[row + i] = input[row + width - i - 1];
            output[row + width - i - 1] = input[row + i];
        }
        if width % 2 == 1 {
            let mid = row + width / 2;
            output[mid] = input[mid];
        }
    }
}

/// Mirrors owned upper-half rows top-to-bottom.
///
/// `half_rows` indexes `[0, height / 2)`. For each owned row `j`, row `j` of the
/// output receives input row `height - j - 1` and vice versa. The middle row of
/// an odd height is never written here; see [`copy_row`].
pub fn flip_vertical<T: Copy>(
    input: &[T],
    output: &mut [T],
    width: usize,
    height: usize,
    half_rows: Range<usize>,
) {
    for j in half_rows {
        let top = j * width;
        let bottom = (height - j - 1) * width;
        output[top..top + width].copy_from_slice(&input[bottom..bottom + width]);
        output[bottom..bottom + width].copy_from_slice(&input[top..top + width]);
    }
}

/// Copies row `j` unchanged from `input` into `output`.
pub fn copy_row<T: Copy>(input: &[T], output: &mut [T], width: usize, j: usize) {
    let start = j * width;
    output[start..start + width].copy_from_slice(&input[start..start + width]);
}
