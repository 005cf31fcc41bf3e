// In: src/transform_pipeline/traits.rs

//! Defines the behavioural contract of every transform.
//!
//! The planner, executor and gather coordinator never match on a transform to
//! decide *how to partition* or *what to exchange*; they ask the transform
//! through `TransformBehavior`. This keeps the three stages consistent with each
//! other: the index space used to plan a rank's work is the same one used to
//! size the bounds and payloads that rank later sends.

use crate::transform_pipeline::models::{Exchange, IndexSpace, Transform};
use crate::types::Field;

/// A trait implemented by every transform, declaring how its work is laid out.
pub trait TransformBehavior {
    /// The linear index space the work is partitioned over.
    fn index_space(&self) -> IndexSpace;

    /// Message exchanges each follower performs, in send order.
    fn exchanges(&self) -> &'static [Exchange];

    /// True when the transform needs the global `[min, max]` of its input.
    fn needs_extrema(&self) -> bool;

    /// Size `N` of the index space for a given input.
    fn domain_size(&self, field: &Field) -> u32 {
        match self.index_space() {
            IndexSpace::Pixels => field.width().saturating_mul(field.height()),
            IndexSpace::Rows => field.height(),
            IndexSpace::HalfRows => field.height() / 2,
        }
    }

    /// Number of output elements one index of the space stands for.
    fn stride(&self, field: &Field) -> u32 {
        match self.index_space() {
            IndexSpace::Pixels => 1,
            IndexSpace::Rows | IndexSpace::HalfRows => field.width(),
        }
    }
}

impl TransformBehavior for Transform {
    fn index_space(&self) -> IndexSpace {
        match self {
            Transform::Negate
            | Transform::ShiftScale { .. }
            | Transform::Log
            | Transform::Normalise => IndexSpace::Pixels,
            Transform::FlipHorizontal => IndexSpace::Rows,
            Transform::FlipVertical => IndexSpace::HalfRows,
        }
    }

    fn exchanges(&self) -> &'static [Exchange] {
        match self.index_space() {
            IndexSpace::HalfRows => &[Exchange::Primary, Exchange::Mirror],
            IndexSpace::Pixels | IndexSpace::Rows => &[Exchange::Primary],
        }
    }

    fn needs_extrema(&self) -> bool {
        matches!(self, Transform::Negate | Transform::Normalise)
    }
}

//==================================================================================
// Unit Tests
//==================================================================================
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pixel_transforms_use_one_exchange() {
        for t in [
            Transform::Negate,
            Transform::ShiftScale {
                shift: 0.0,
                scale: 1.0,
            },
            Transform::Log,
            Transform::Normalise,
        ] {
            assert_eq!(t.index_space(), IndexSpace::Pixels);
            assert_eq!(t.exchanges(), &[Exchange::Primary]);
        }
    }

    #[test]
    fn test_vertical_flip_uses_two_exchanges() {
        assert_eq!(
            Transform::FlipVertical.exchanges(),
            &[Exchange::Primary, Exchange::Mirror]
        );
        assert_eq!(Transform::FlipHorizontal.exchanges(), &[Exchange::Primary]);
    }

    #[test]
    fn test_domain_size_and_stride() {
        let field = Field::zeros(4, 5);
        assert_eq!(Transform::Log.domain_size(&field), 20);
        assert_eq!(Transform::Log.stride(&field), 1);
        assert_eq!(Transform::FlipHorizontal.domain_size(&field), 5);
        assert_eq!(Transform::FlipHorizontal.stride(&field), 4);
        assert_eq!(Transform::FlipVertical.domain_size(&field), 2);
        assert_eq!(Transform::FlipVertical.stride(&field), 4);
    }

    #[test]
    fn test_only_contrast_transforms_need_extrema() {
        assert!(Transform::Negate.needs_extrema());
        assert!(Transform::Normalise.needs_extrema());
        assert!(!Transform::Log.needs_extrema());
        assert!(!Transform::FlipVertical.needs_extrema());
    }
}
