//! This module contains the local execution step of a filter invocation.
//!
//! It acts as a non-strategic component: given a transform, the full input
//! replica and the partition the planner assigned, it dispatches to the right
//! kernel and writes only the owned part of the output. It never communicates.
//!
//! Execution is split in two so that every rank fails or proceeds together:
//! `prepare` looks at the whole replica (global extrema, logarithm domain) and is
//! identical on every rank, `execute` then touches only owned indices.

use crate::error::FieldError;
use crate::kernels::{flip, pointwise};
use crate::transform_pipeline::models::Transform;
use crate::transform_pipeline::traits::TransformBehavior;
use crate::types::{Field, Partition};

/// A transform together with the replica-wide constants it needs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Prepared {
    transform: Transform,
    /// Global `(min, max)` of the input, for transforms that need it and a
    /// non-empty input.
    extrema: Option<(f32, f32)>,
}

impl Prepared {
    pub fn transform(&self) -> &Transform {
        &self.transform
    }

    pub fn extrema(&self) -> Option<(f32, f32)> {
        self.extrema
    }
}

/// Derives the replica-wide constants of `transform` over `input`.
///
/// For `Log` this scans the whole input, so a single non-positive value fails on
/// every rank before any message is sent.
pub fn prepare(transform: &Transform, input: &Field) -> Result<Prepared, FieldError> {
    let extrema = if transform.needs_extrema() && !input.is_empty() {
        Some(input.min_max()?)
    } else {
        None
    };
    if matches!(transform, Transform::Log) {
        pointwise::check_log_domain(input.as_slice())?;
    }
    Ok(Prepared {
        transform: *transform,
        extrema,
    })
}

/// Writes the part of `output` that `partition` covers.
///
/// `output` must have the dimensions of `input`. Indices outside the partition
/// are left as they were.
pub fn execute(
    prepared: &Prepared,
    input: &Field,
    partition: Partition,
    output: &mut Field,
) -> Result<(), FieldError> {
    if output.len() != input.len() || output.width() != input.width() {
        return Err(FieldError::DimensionMismatch {
            expected: input.len(),
            actual: output.len(),
        });
    }
    let domain = prepared.transform.domain_size(input) as usize;
    let owned = partition.range();
    if owned.end > domain {
        return Err(FieldError::InternalError(format!(
            "partition {} exceeds the {} index space of size {}",
            partition,
            prepared.transform,
            domain
        )));
    }

    let width = input.width() as usize;
    let height = input.height() as usize;
    let src = input.as_slice();
    let dst = output.as_mut_slice();
    // Empty inputs only ever get empty partitions, so the fallback is never read.
    let (min, max) = prepared.extrema.unwrap_or((0.0, 0.0));

    match prepared.transform {
        Transform::Negate => pointwise::negate(src, dst, owned, min, max),
        Transform::ShiftScale { shift, scale } => {
            pointwise::shift_scale(src, dst, owned, shift, scale)
        }
        Transform::Log => pointwise::log(src, dst, owned)?,
        Transform::Normalise => pointwise::normalise(src, dst, owned, min, max),
        Transform::FlipHorizontal => flip::flip_horizontal(src, dst, width, owned),
        Transform::FlipVertical => flip::flip_vertical(src, dst, width, height, owned),
    }
    Ok(())
}

/// The flat output indices `execute` writes for `partition`, in ascending order.
///
/// One range for every transform except the vertical flip, which also writes the
/// mirrored rows of the lower half.
#[cfg(test)]
pub(crate) fn written_ranges(
    transform: &Transform,
    input: &Field,
    partition: Partition,
) -> Vec<std::ops::Range<usize>> {
    let stride = transform.stride(input) as usize;
    let owned = partition.range();
    let primary = owned.start * stride..owned.end * stride;
    match transform {
        Transform::FlipVertical if !partition.is_empty() => {
            let height = input.height() as usize;
            let mirror = (height - owned.end) * stride..(height - owned.start) * stride;
            vec![primary, mirror]
        }
        _ => vec![primary],
    }
}

//==================================================================================
// Unit Tests
//==================================================================================
#[cfg(test)]
mod tests {
    use super::*;

    fn ramp(width: u32, height: u32) -> Field {
        let buffer = (0..width * height).map(|v| v as f32 + 1.0).collect();
        Field::from_vec(width, height, buffer).unwrap()
    }

    #[test]
    fn test_prepare_computes_extrema_only_when_needed() {
        let input = ramp(3, 2);
        assert_eq!(
            prepare(&Transform::Negate, &input).unwrap().extrema(),
            Some((1.0, 6.0))
        );
        assert_eq!(prepare(&Transform::Log, &input).unwrap().extrema(), None);
    }

    #[test]
    fn test_prepare_rejects_log_of_non_positive_anywhere() {
        let mut input = ramp(4, 4);
        input.set(3, 3, 0.0).unwrap();
        assert!(matches!(
            prepare(&Transform::Log, &input),
            Err(FieldError::Domain { index: 15, .. })
        ));
    }

    #[test]
    fn test_prepare_on_empty_field() {
        let prepared = prepare(&Transform::Normalise, &Field::empty()).unwrap();
        assert_eq!(prepared.extrema(), None);
        let mut output = Field::empty();
        execute(&prepared, &Field::empty(), Partition::new(0, 0), &mut output).unwrap();
        assert!(output.is_empty());
    }

    #[test]
    fn test_execute_writes_only_owned_pixels() {
        let input = ramp(4, 1);
        let prepared = prepare(
            &Transform::ShiftScale {
                shift: 1.0,
                scale: 10.0,
            },
            &input,
        )
        .unwrap();
        let mut output = Field::zeros(4, 1);
        execute(&prepared, &input, Partition::new(1, 2), &mut output).unwrap();
        assert_eq!(output.as_slice(), &[0.0, 30.0, 40.0, 0.0]);
    }

    #[test]
    fn test_execute_vertical_flip_writes_both_halves() {
        let input = ramp(2, 5);
        let prepared = prepare(&Transform::FlipVertical, &input).unwrap();
        let mut output = Field::zeros(2, 5);
        execute(&prepared, &input, Partition::new(1, 1), &mut output).unwrap();
        assert_eq!(
            output.as_slice(),
            &[0.0, 0.0, 7.0, 8.0, 0.0, 0.0, 3.0, 4.0, 0.0, 0.0]
        );
        assert_eq!(
            written_ranges(&Transform::FlipVertical, &input, Partition::new(1, 1)),
            vec![2..4, 6..8]
        );
    }

    #[test]
    fn test_execute_rejects_partition_outside_index_space() {
        let input = ramp(3, 3);
        let prepared = prepare(&Transform::FlipVertical, &input).unwrap();
        let mut output = Field::zeros(3, 3);
        let result = execute(&prepared, &input, Partition::new(0, 2), &mut output);
        assert!(matches!(result, Err(FieldError::InternalError(_))));
    }

    #[test]
    fn test_execute_rejects_mismatched_output() {
        let input = ramp(3, 3);
        let prepared = prepare(&Transform::Negate, &input).unwrap();
        let mut output = Field::zeros(3, 2);
        assert!(matches!(
            execute(&prepared, &input, Partition::new(0, 9), &mut output),
            Err(FieldError::DimensionMismatch {
                expected: 9,
                actual: 6
            })
        ));
    }
}
