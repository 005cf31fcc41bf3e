// In: src/transform_pipeline/models.rs

//! The strongly-typed vocabulary of the transform pipeline: which transforms
//! exist, which index space each one is partitioned over, and which message
//! exchanges its gather uses.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::config::EngineConfig;
use crate::error::FieldError;
use crate::types::{Field, Partition};

/// A field transform the engine can run across a process group.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
#[serde(tag = "op", content = "params")]
pub enum Transform {
    /// Contrast inversion around the field's own `[min, max]`.
    Negate,
    /// `out = (in + shift) * scale`.
    ShiftScale { shift: f32, scale: f32 },
    /// Natural logarithm; every input value must be strictly positive.
    Log,
    /// Rescale into `[0, 1]` using the field's own `[min, max]`.
    Normalise,
    /// Mirror left-to-right.
    FlipHorizontal,
    /// Mirror top-to-bottom.
    FlipVertical,
}

impl fmt::Display for Transform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Transform::ShiftScale { shift, scale } => {
                write!(f, "ShiftScale(shift={}, scale={})", shift, scale)
            }
            other => write!(f, "{:?}", other),
        }
    }
}

/// The linear index space a transform's work is partitioned over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexSpace {
    /// Flat pixel indices `[0, width * height)`.
    Pixels,
    /// Row indices `[0, height)`.
    Rows,
    /// Upper-half row indices `[0, height / 2)`; each owned row implies its mirror.
    HalfRows,
}

/// One bounds-then-payload message exchange between a follower and the leader.
///
/// Every exchange owns three consecutive tags in the per-call namespace: the
/// start bound, the end bound, and the payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exchange {
    /// The span the follower owns directly.
    Primary,
    /// The lower-half span a vertical flip writes as a side effect.
    Mirror,
}

/// The tags used by one [`Exchange`] under a given tag base.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExchangeTags {
    pub start: i32,
    pub end: i32,
    pub payload: i32,
}

impl Exchange {
    /// Fails when the namespace starting at `tag_base` would overflow `i32`.
    pub fn tags(&self, tag_base: i32) -> Result<ExchangeTags, FieldError> {
        let first = match self {
            Exchange::Primary => tag_base,
            Exchange::Mirror => offset_tag(tag_base, 3)?,
        };
        Ok(ExchangeTags {
            start: first,
            end: offset_tag(first, 1)?,
            payload: offset_tag(first, 2)?,
        })
    }
}

/// Tag used to replicate a complete result to followers between chained filters.
pub fn replicate_tag(tag_base: i32) -> Result<i32, FieldError> {
    offset_tag(tag_base, 6)
}

fn offset_tag(base: i32, offset: i32) -> Result<i32, FieldError> {
    base.checked_add(offset).ok_or_else(|| {
        FieldError::InternalError(format!("tag {} + {} overflows the tag space", base, offset))
    })
}

/// What one process holds after a filter invocation.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterOutcome {
    /// The leader's consolidated, fully valid result.
    Complete(Field),
    /// A follower's output, valid only on the indices of `partition`.
    Partial { field: Field, partition: Partition },
}

impl FilterOutcome {
    pub fn is_complete(&self) -> bool {
        matches!(self, FilterOutcome::Complete(_))
    }

    /// The complete field, or `None` for a follower's partial output.
    pub fn into_complete(self) -> Option<Field> {
        match self {
            FilterOutcome::Complete(field) => Some(field),
            FilterOutcome::Partial { .. } => None,
        }
    }

    /// The complete field, if this outcome holds one.
    pub fn complete(&self) -> Option<&Field> {
        match self {
            FilterOutcome::Complete(field) => Some(field),
            FilterOutcome::Partial { .. } => None,
        }
    }

    /// True when this is a complete result equal to `expected` within the
    /// configured element tolerance.
    pub fn matches(&self, expected: &Field, config: &EngineConfig) -> bool {
        self.complete()
            .is_some_and(|field| field.approx_eq(expected, config.tolerance))
    }

    /// The underlying buffer, whether complete or partial.
    pub fn into_field(self) -> Field {
        match self {
            FilterOutcome::Complete(field) | FilterOutcome::Partial { field, .. } => field,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exchange_tags_are_disjoint() {
        let primary = Exchange::Primary.tags(10).unwrap();
        let mirror = Exchange::Mirror.tags(10).unwrap();
        assert_eq!(
            primary,
            ExchangeTags {
                start: 10,
                end: 11,
                payload: 12
            }
        );
        assert_eq!(
            mirror,
            ExchangeTags {
                start: 13,
                end: 14,
                payload: 15
            }
        );
        assert_eq!(replicate_tag(10).unwrap(), 16);
    }

    #[test]
    fn test_tags_near_i32_max_are_an_error() {
        assert!(Exchange::Primary.tags(i32::MAX - 2).is_ok());
        assert!(matches!(
            Exchange::Primary.tags(i32::MAX - 1),
            Err(FieldError::InternalError(_))
        ));
        assert!(Exchange::Mirror.tags(i32::MAX - 4).is_err());
        assert!(replicate_tag(i32::MAX - 5).is_err());
    }

    #[test]
    fn test_transform_serde_shape() {
        let t = Transform::ShiftScale {
            shift: 1.0,
            scale: 2.0,
        };
        let json = serde_json::to_string(&t).unwrap();
        assert_eq!(json, r#"{"op":"ShiftScale","params":{"shift":1.0,"scale":2.0}}"#);
        let back: Transform = serde_json::from_str(&json).unwrap();
        assert_eq!(back, t);
        let flip: Transform = serde_json::from_str(r#"{"op":"FlipVertical"}"#).unwrap();
        assert_eq!(flip, Transform::FlipVertical);
    }

    #[test]
    fn test_only_complete_outcomes_expose_a_field() {
        let complete = FilterOutcome::Complete(Field::zeros(2, 2));
        assert!(complete.is_complete());
        assert!(complete.complete().is_some());
        assert!(complete.matches(&Field::new(2, 2, 1e-7), &EngineConfig::default()));
        let strict = EngineConfig {
            tolerance: 0.0,
            ..EngineConfig::default()
        };
        assert!(!complete.matches(&Field::new(2, 2, 1e-7), &strict));
        let partial = FilterOutcome::Partial {
            field: Field::zeros(2, 2),
            partition: Partition::new(0, 1),
        };
        assert!(partial.complete().is_none());
        assert_eq!(partial.clone().into_complete(), None);
        assert!(!partial.matches(&Field::zeros(2, 2), &EngineConfig::default()));
        assert_eq!(partial.into_field(), Field::zeros(2, 2));
    }
}
