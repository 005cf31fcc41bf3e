//! The dense scalar field every process in a group holds a full replica of.

use ndarray::{Array2, ArrayView2};
use serde::{Deserialize, Serialize};

use crate::error::FieldError;

/// A dense 2-D grid of `f32` samples in row-major order.
///
/// Element `(i, j)` (column `i`, row `j`) lives at flat offset `j * width + i`.
/// The buffer always holds exactly `width * height` elements, so a field with a
/// zero dimension has an empty buffer.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(try_from = "RawField")]
pub struct Field {
    width: u32,
    height: u32,
    buffer: Vec<f32>,
}

/// The unchecked wire shape of a [`Field`]; deserialisation goes through
/// [`Field::from_vec`].
#[derive(Deserialize)]
struct RawField {
    width: u32,
    height: u32,
    buffer: Vec<f32>,
}

impl TryFrom<RawField> for Field {
    type Error = FieldError;

    fn try_from(raw: RawField) -> Result<Self, Self::Error> {
        Field::from_vec(raw.width, raw.height, raw.buffer)
    }
}

impl Field {
    /// Creates a `width x height` field with every element set to `fill`.
    pub fn new(width: u32, height: u32, fill: f32) -> Self {
        Self {
            width,
            height,
            buffer: vec![fill; width as usize * height as usize],
        }
    }

    /// Creates a zero-filled field. Output buffers start this way.
    pub fn zeros(width: u32, height: u32) -> Self {
        Self::new(width, height, 0.0)
    }

    /// The `0 x 0` field.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Wraps an existing row-major buffer.
    pub fn from_vec(width: u32, height: u32, buffer: Vec<f32>) -> Result<Self, FieldError> {
        let expected = width as usize * height as usize;
        if buffer.len() != expected {
            return Err(FieldError::DimensionMismatch {
                expected,
                actual: buffer.len(),
            });
        }
        Ok(Self {
            width,
            height,
            buffer,
        })
    }

    /// Builds a field from a `(rows, columns)` array.
    pub fn from_array(array: &Array2<f32>) -> Result<Self, FieldError> {
        let (rows, cols) = array.dim();
        let height = u32::try_from(rows)
            .map_err(|_| FieldError::InternalError(format!("{} rows exceed u32", rows)))?;
        let width = u32::try_from(cols)
            .map_err(|_| FieldError::InternalError(format!("{} columns exceed u32", cols)))?;
        Self::from_vec(width, height, array.iter().copied().collect())
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Total number of elements (`width * height`).
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.buffer
    }

    pub fn as_mut_slice(&mut self) -> &mut [f32] {
        &mut self.buffer
    }

    pub fn into_vec(self) -> Vec<f32> {
        self.buffer
    }

    /// A `(height, width)` view over the buffer.
    pub fn view(&self) -> Result<ArrayView2<'_, f32>, FieldError> {
        ArrayView2::from_shape((self.height as usize, self.width as usize), &self.buffer)
            .map_err(|e| FieldError::InternalError(format!("field view: {}", e)))
    }

    #[inline]
    pub(crate) fn offset(&self, i: u32, j: u32) -> usize {
        j as usize * self.width as usize + i as usize
    }

    fn check_bounds(&self, i: u32, j: u32) -> Result<(), FieldError> {
        if i >= self.width || j >= self.height {
            return Err(FieldError::PixelOutOfBounds {
                i,
                j,
                width: self.width,
                height: self.height,
            });
        }
        Ok(())
    }

    pub fn get(&self, i: u32, j: u32) -> Result<f32, FieldError> {
        self.check_bounds(i, j)?;
        Ok(self.buffer[self.offset(i, j)])
    }

    pub fn set(&mut self, i: u32, j: u32, value: f32) -> Result<(), FieldError> {
        self.check_bounds(i, j)?;
        let k = self.offset(i, j);
        self.buffer[k] = value;
        Ok(())
    }

    /// Row `j` as a slice, or `None` when out of range.
    pub fn row(&self, j: u32) -> Option<&[f32]> {
        if j >= self.height {
            return None;
        }
        let start = self.offset(0, j);
        Some(&self.buffer[start..start + self.width as usize])
    }

    pub fn row_mut(&mut self, j: u32) -> Option<&mut [f32]> {
        if j >= self.height {
            return None;
        }
        let start = self.offset(0, j);
        let width = self.width as usize;
        Some(&mut self.buffer[start..start + width])
    }

    /// True when both fields have the same shape and every element differs by at
    /// most `tolerance`.
    pub fn approx_eq(&self, other: &Field, tolerance: f32) -> bool {
        self.width == other.width
            && self.height == other.height
            && self
                .buffer
                .iter()
                .zip(other.buffer.iter())
                .all(|(a, b)| (a - b).abs() <= tolerance)
    }

    //==============================================================================
    // Statistics over the full replica
    //==============================================================================

    pub fn min(&self) -> Result<f32, FieldError> {
        self.non_empty("min")?;
        Ok(self.buffer.iter().copied().fold(f32::INFINITY, f32::min))
    }

    pub fn max(&self) -> Result<f32, FieldError> {
        self.non_empty("max")?;
        Ok(self.buffer.iter().copied().fold(f32::NEG_INFINITY, f32::max))
    }

    /// `(min, max)` in a single pass.
    pub fn min_max(&self) -> Result<(f32, f32), FieldError> {
        self.non_empty("min_max")?;
        Ok(self
            .buffer
            .iter()
            .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), &v| {
                (lo.min(v), hi.max(v))
            }))
    }

    /// Sum of all elements; `0.0` for an empty field.
    pub fn sum(&self) -> f32 {
        self.buffer.iter().map(|&v| v as f64).sum::<f64>() as f32
    }

    pub fn mean(&self) -> Result<f32, FieldError> {
        self.non_empty("mean")?;
        Ok(self.sum() / self.len() as f32)
    }

    /// Population variance.
    pub fn variance(&self) -> Result<f32, FieldError> {
        self.non_empty("variance")?;
        let mean = self.mean()? as f64;
        let sum_sq: f64 = self
            .buffer
            .iter()
            .map(|&v| {
                let d = v as f64 - mean;
                d * d
            })
            .sum();
        Ok((sum_sq / self.len() as f64) as f32)
    }

    pub fn std_dev(&self) -> Result<f32, FieldError> {
        Ok(self.variance()?.sqrt())
    }

    fn non_empty(&self, op: &str) -> Result<(), FieldError> {
        if self.buffer.is_empty() {
            return Err(FieldError::EmptyField(op.to_string()));
        }
        Ok(())
    }
}
