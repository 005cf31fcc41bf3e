// In: src/transform_pipeline/gather.rs

//! The gather coordinator: consolidates every rank's partial output on the leader.
//!
//! After local execution each rank's output is correct only on the indices it
//! owns. Followers ship those indices to the leader as a fixed sequence of
//! exchanges, each made of three blocking messages under consecutive tags:
//!
//! 1. the start bound (`i64`),
//! 2. the end bound (`i64`),
//! 3. the payload (`f32`), written straight into the leader's buffer.
//!
//! The leader walks followers in increasing rank order and performs the same
//! exchanges in the same tag order. Because messaging is synchronous, any
//! difference between the two sequences blocks the group, so both sides derive
//! their exchanges from the same `TransformBehavior` and the same planner.
//! A follower with an empty partition still sends both bounds and a
//! zero-length payload.

use std::fmt;
use std::ops::Range;

use crate::comm::{Communicator, LEADER_RANK};
use crate::error::FieldError;
use crate::kernels::flip;
use crate::transform_pipeline::models::{replicate_tag, Exchange, FilterOutcome, IndexSpace};
use crate::transform_pipeline::planner;
use crate::transform_pipeline::traits::TransformBehavior;
use crate::types::{Field, Partition};

//==================================================================================
// 1. Wire spans
//==================================================================================

/// The bounds a follower announces for one exchange.
///
/// `start` and `end` are flat offsets into the output. `stride` is the number of
/// elements one index of the transform's space stands for: the payload runs
/// from `start` for `end - start + stride` elements, which is `end - start + 1`
/// for pixel transforms and whole rows for the flips.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WireSpan {
    pub start: i64,
    pub end: i64,
    pub stride: i64,
}

impl WireSpan {
    /// Number of `f32` elements in the payload. Zero for an empty partition.
    pub fn payload_len(&self) -> usize {
        (self.end - self.start + self.stride).max(0) as usize
    }

    /// The payload's position in an output buffer of `buffer_len` elements.
    pub fn buffer_range(&self, buffer_len: usize) -> Result<Range<usize>, FieldError> {
        let len = self.payload_len();
        match usize::try_from(self.start) {
            Ok(start) if start.checked_add(len).is_some_and(|end| end <= buffer_len) => {
                Ok(start..start + len)
            }
            _ => Err(FieldError::Protocol(format!(
                "span {} does not fit an output of {} elements",
                self, buffer_len
            ))),
        }
    }
}

impl fmt::Display for WireSpan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}] (stride {})", self.start, self.end, self.stride)
    }
}

/// The span of `exchange` for a rank owning `partition` of `transform`'s space.
pub fn wire_span<T: TransformBehavior + ?Sized>(
    transform: &T,
    exchange: Exchange,
    partition: Partition,
    field: &Field,
) -> WireSpan {
    let stride = transform.stride(field) as i64;
    let first = partition.start() as i64;
    let last = partition.end();
    match exchange {
        Exchange::Primary => WireSpan {
            start: first * stride,
            end: last * stride,
            stride,
        },
        Exchange::Mirror => {
            let height = field.height() as i64;
            WireSpan {
                start: (height - last - 1) * stride,
                end: (height - first - 1) * stride,
                stride,
            }
        }
    }
}

/// Every exchange a rank owning `partition` performs, in send order.
pub fn wire_spans<T: TransformBehavior + ?Sized>(
    transform: &T,
    partition: Partition,
    field: &Field,
) -> Vec<(Exchange, WireSpan)> {
    transform
        .exchanges()
        .iter()
        .map(|&exchange| (exchange, wire_span(transform, exchange, partition, field)))
        .collect()
}

//==================================================================================
// 2. Follower side
//==================================================================================

/// Sends this rank's owned part of `output` to the leader.
pub fn send_partial<C, T>(
    comm: &C,
    transform: &T,
    partition: Partition,
    output: &Field,
    tag_base: i32,
) -> Result<(), FieldError>
where
    C: Communicator + ?Sized,
    T: TransformBehavior + ?Sized,
{
    for (exchange, span) in wire_spans(transform, partition, output) {
        let tags = exchange.tags(tag_base)?;
        let range = span.buffer_range(output.len())?;
        comm.send_i64(&[span.start], LEADER_RANK, tags.start)?;
        comm.send_i64(&[span.end], LEADER_RANK, tags.end)?;
        comm.send_f32(&output.as_slice()[range], LEADER_RANK, tags.payload)?;
    }
    Ok(())
}

//==================================================================================
// 3. Leader side
//==================================================================================

/// Receives every follower's partial output into `output`, then fills the rows
/// no partition covers.
///
/// The leader's own partition is already in place. Bounds that disagree with
/// the leader's own plan for a follower fail with `Protocol`; the follower is
/// then left blocked on its payload send until the leader's endpoint goes away.
pub fn collect_partials<C, T>(
    comm: &C,
    transform: &T,
    input: &Field,
    output: &mut Field,
    tag_base: i32,
) -> Result<(), FieldError>
where
    C: Communicator + ?Sized,
    T: TransformBehavior + ?Sized,
{
    let size = comm.size();
    for source in (LEADER_RANK + 1)..size {
        let expected = planner::plan_transform(transform, input, size, source)?;
        for (exchange, span) in wire_spans(transform, expected, input) {
            let tags = exchange.tags(tag_base)?;
            let mut start = [0i64; 1];
            let mut end = [0i64; 1];
            comm.recv_i64(&mut start, source, tags.start)?;
            comm.recv_i64(&mut end, source, tags.end)?;

            let announced = WireSpan {
                start: start[0],
                end: end[0],
                stride: span.stride,
            };
            if announced != span {
                return Err(FieldError::Protocol(format!(
                    "rank {} announced {} for its {:?} exchange, expected {}",
                    source, announced, exchange, span
                )));
            }

            let range = announced.buffer_range(output.len())?;
            log_metric!(
                "event" = "gather_recv",
                "source" = &source,
                "exchange" = format!("{:?}", exchange),
                "elements" = &range.len()
            );
            comm.recv_f32(&mut output.as_mut_slice()[range], source, tags.payload)?;
        }
    }

    // No half-row partition covers the middle row of an odd height; it maps onto
    // itself, so the leader copies it from its own replica.
    if transform.index_space() == IndexSpace::HalfRows && input.height() % 2 == 1 {
        let width = input.width() as usize;
        let middle = (input.height() / 2) as usize;
        flip::copy_row(input.as_slice(), output.as_mut_slice(), width, middle);
    }
    Ok(())
}

/// Consolidates partial outputs on the leader.
///
/// The leader gets its complete field back. Followers keep their own partial
/// output alongside the partition it is valid on.
pub fn gather<C, T>(
    comm: &C,
    transform: &T,
    input: &Field,
    partition: Partition,
    mut output: Field,
    tag_base: i32,
) -> Result<FilterOutcome, FieldError>
where
    C: Communicator + ?Sized,
    T: TransformBehavior + ?Sized,
{
    if comm.is_leader() {
        collect_partials(comm, transform, input, &mut output, tag_base)?;
        Ok(FilterOutcome::Complete(output))
    } else {
        send_partial(comm, transform, partition, &output, tag_base)?;
        Ok(FilterOutcome::Partial {
            field: output,
            partition,
        })
    }
}

//==================================================================================
// 4. Replication between chained filters
//==================================================================================

/// Makes the leader's `field` every rank's `field`.
///
/// The leader sends its complete buffer to each follower in rank order;
/// followers receive it over their own buffer, which must already have the same
/// dimensions.
pub fn replicate<C: Communicator + ?Sized>(
    comm: &C,
    field: &mut Field,
    tag_base: i32,
) -> Result<(), FieldError> {
    let tag = replicate_tag(tag_base)?;
    if comm.is_leader() {
        for dest in (LEADER_RANK + 1)..comm.size() {
            comm.send_f32(field.as_slice(), dest, tag)?;
        }
    } else {
        comm.recv_f32(field.as_mut_slice(), LEADER_RANK, tag)?;
    }
    Ok(())
}

//==================================================================================
// Unit Tests
//==================================================================================
#[cfg(test)]
mod tests {
    use super::*;
    use crate::comm::local::LocalGroup;
    use crate::error::CommError;
    use crate::transform_pipeline::executor;
    use crate::transform_pipeline::models::Transform;

    fn all_transforms() -> Vec<Transform> {
        vec![
            Transform::Negate,
            Transform::ShiftScale {
                shift: 0.5,
                scale: 2.0,
            },
            Transform::Log,
            Transform::Normalise,
            Transform::FlipHorizontal,
            Transform::FlipVertical,
        ]
    }

    #[test]
    fn test_empty_span_has_zero_payload() {
        let span = WireSpan {
            start: 8,
            end: 4,
            stride: 4,
        };
        assert_eq!(span.payload_len(), 0);
        assert_eq!(span.buffer_range(8).unwrap(), 8..8);

        let field = Field::zeros(3, 3);
        for t in all_transforms() {
            for (_, span) in wire_spans(&t, Partition::empty_at(1), &field) {
                assert_eq!(span.payload_len(), 0, "{}", t);
            }
        }
    }

    #[test]
    fn test_horizontal_flip_span_covers_whole_rows() {
        let field = Field::zeros(4, 6);
        let span = wire_span(
            &Transform::FlipHorizontal,
            Exchange::Primary,
            Partition::new(2, 2),
            &field,
        );
        assert_eq!(span.start, 8);
        assert_eq!(span.end, 12);
        assert_eq!(span.payload_len(), 8);
    }

    #[test]
    fn test_vertical_flip_mirror_span() {
        let field = Field::zeros(4, 6);
        let spans = wire_spans(&Transform::FlipVertical, Partition::new(1, 2), &field);
        assert_eq!(spans.len(), 2);
        let (exchange, mirror) = spans[1];
        assert_eq!(exchange, Exchange::Mirror);
        // Rows 1..=2 mirror onto rows 3..=4.
        assert_eq!(mirror.start, 12);
        assert_eq!(mirror.end, 16);
        assert_eq!(mirror.buffer_range(24).unwrap(), 12..20);
    }

    #[test]
    fn test_spans_match_what_the_executor_writes() {
        for (w, h) in [(5u32, 7u32), (4, 4), (1, 3)] {
            let field = Field::new(w, h, 2.0);
            for t in all_transforms() {
                for p in 1..6u32 {
                    for rank in 0..p {
                        let part = planner::plan_transform(&t, &field, p, rank).unwrap();
                        if part.is_empty() {
                            continue;
                        }
                        let spans: Vec<_> = wire_spans(&t, part, &field)
                            .into_iter()
                            .map(|(_, s)| s.buffer_range(field.len()).unwrap())
                            .collect();
                        assert_eq!(spans, executor::written_ranges(&t, &field, part));
                    }
                }
            }
        }
    }

    #[test]
    fn test_buffer_range_rejects_overflowing_span() {
        let span = WireSpan {
            start: 6,
            end: 9,
            stride: 1,
        };
        assert!(matches!(span.buffer_range(8), Err(FieldError::Protocol(_))));
        let negative = WireSpan {
            start: -4,
            end: 0,
            stride: 1,
        };
        assert!(negative.buffer_range(8).is_err());
    }

    #[test]
    fn test_gather_assembles_rows_from_followers() {
        let input = Field::from_vec(2, 3, vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]).unwrap();
        let transform = Transform::FlipHorizontal;
        let results = LocalGroup::run(3, |comm| -> Result<FilterOutcome, FieldError> {
            let part = planner::plan_transform(&transform, &input, 3, comm.rank())?;
            let prepared = executor::prepare(&transform, &input)?;
            let mut output = Field::zeros(2, 3);
            executor::execute(&prepared, &input, part, &mut output)?;
            gather(&comm, &transform, &input, part, output, 0)
        })
        .unwrap();
        let leader = results[0].as_ref().unwrap().complete().unwrap();
        assert_eq!(leader.as_slice(), &[2.0, 1.0, 4.0, 3.0, 6.0, 5.0]);
        match results[1].as_ref().unwrap() {
            FilterOutcome::Partial { field, partition } => {
                assert_eq!(*partition, Partition::new(1, 1));
                assert_eq!(field.as_slice(), &[0.0, 0.0, 4.0, 3.0, 0.0, 0.0]);
            }
            FilterOutcome::Complete(_) => panic!("follower must hold a partial output"),
        }
    }

    #[test]
    fn test_overflowing_tag_base_fails_before_any_message() {
        let field = Field::zeros(2, 2);
        let result = send_partial(
            &crate::comm::SingleProcess,
            &Transform::FlipVertical,
            Partition::new(0, 1),
            &field,
            i32::MAX - 1,
        );
        assert!(matches!(result, Err(FieldError::InternalError(_))));

        let mut field = Field::zeros(2, 2);
        let result = replicate(&crate::comm::SingleProcess, &mut field, i32::MAX);
        assert!(matches!(result, Err(FieldError::InternalError(_))));
    }

    #[test]
    fn test_leader_rejects_bounds_that_disagree_with_its_plan() {
        let input = Field::zeros(4, 1);
        let results = LocalGroup::run(2, |comm| -> Result<(), FieldError> {
            if comm.is_leader() {
                let mut output = Field::zeros(4, 1);
                collect_partials(&comm, &Transform::Negate, &input, &mut output, 0)
            } else {
                // Rank 1 owns [2, 3] but claims [1, 3].
                comm.send_i64(&[1], LEADER_RANK, 0)?;
                comm.send_i64(&[3], LEADER_RANK, 1)?;
                comm.send_f32(&[0.0; 3], LEADER_RANK, 2)
            }
        })
        .unwrap();
        assert!(matches!(results[0], Err(FieldError::Protocol(_))));
        assert_eq!(
            results[1].as_ref().unwrap_err().comm_error(),
            Some(CommError::InvalidCommunicator)
        );
    }

    #[test]
    fn test_replicate_copies_leader_buffer() {
        let results = LocalGroup::run(3, |comm| -> Result<Field, FieldError> {
            let mut field = if comm.is_leader() {
                Field::from_vec(2, 2, vec![1.0, 2.0, 3.0, 4.0])?
            } else {
                Field::zeros(2, 2)
            };
            replicate(&comm, &mut field, 20)?;
            Ok(field)
        })
        .unwrap();
        for result in results {
            assert_eq!(result.unwrap().as_slice(), &[1.0, 2.0, 3.0, 4.0]);
        }
    }
}
