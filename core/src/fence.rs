//! Fence values.
//!
//! A fence value is a point on a queue timeline. The highest 8 bits name the queue kind
//! that produced the value, the remaining 56 bits are the per-queue counter.
//! Counter `0` is the state of a queue that has not signaled anything yet,
//! the first submitted batch gets counter `1`.

use crate::kind::QueueKind;

/// Number of bits the queue kind is shifted by.
pub const FENCE_KIND_SHIFT: u32 = 56;

const COUNTER_MASK: u64 = (1 << FENCE_KIND_SHIFT) - 1;

/// Point on the timeline of one queue.
///
/// Values produced by different queue kinds are not comparable.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FenceValue(u64);

impl FenceValue {
    /// Create fence value for queue kind and counter.
    pub fn new(kind: QueueKind, counter: u64) -> Self {
        assert!(counter <= COUNTER_MASK, "Fence counter overflow");
        FenceValue((kind as u64) << FENCE_KIND_SHIFT | counter)
    }

    /// Value of the queue that has not completed anything yet.
    pub fn initial(kind: QueueKind) -> Self {
        FenceValue::new(kind, 0)
    }

    /// Wrap raw value read back from a device fence.
    ///
    /// # Panics
    ///
    /// Panics if the kind bits do not name a queue kind.
    pub fn from_raw(raw: u64) -> Self {
        let index = (raw >> FENCE_KIND_SHIFT) as usize;
        assert!(
            QueueKind::from_index(index).is_some(),
            "Raw fence value {:#x} has no valid queue kind",
            raw
        );
        FenceValue(raw)
    }

    /// Raw value as signaled on the device fence.
    pub fn raw(self) -> u64 {
        self.0
    }

    /// Kind of the queue that produced this value.
    pub fn kind(self) -> QueueKind {
        match QueueKind::from_index((self.0 >> FENCE_KIND_SHIFT) as usize) {
            Some(kind) => kind,
            None => unreachable!("Fence values are validated on construction"),
        }
    }

    /// Per-queue counter.
    pub fn counter(self) -> u64 {
        self.0 & COUNTER_MASK
    }

    /// Next value on the same timeline.
    pub fn next(self) -> Self {
        FenceValue::new(self.kind(), self.counter() + 1)
    }

    /// Previous value on the same timeline.
    ///
    /// # Panics
    ///
    /// Panics on the initial value.
    pub fn prev(self) -> Self {
        assert_ne!(self.counter(), 0, "Initial fence value has no predecessor");
        FenceValue(self.0 - 1)
    }

    /// Check if this value is reached by the queue that completed `completed`.
    ///
    /// # Panics
    ///
    /// Panics if values come from different queue kinds.
    pub fn is_reached_by(self, completed: FenceValue) -> bool {
        assert_eq!(
            self.kind(),
            completed.kind(),
            "Fence values of different queues are not comparable"
        );
        self.0 <= completed.0
    }
}

impl std::fmt::Debug for FenceValue {
    fn fmt(&self, fmt: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(fmt, "FenceValue({:?}#{})", self.kind(), self.counter())
    }
}

impl std::fmt::Display for FenceValue {
    fn fmt(&self, fmt: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(fmt, "{:?}#{}", self.kind(), self.counter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encoding_recovers_kind() {
        for &kind in QueueKind::ALL.iter() {
            let value = FenceValue::new(kind, 42);
            assert_eq!(value.kind(), kind);
            assert_eq!(value.counter(), 42);
            assert_eq!(FenceValue::from_raw(value.raw()), value);
        }
    }

    #[test]
    fn initial_is_reached_by_initial() {
        let initial = FenceValue::initial(QueueKind::Compute);
        assert!(initial.is_reached_by(initial));
        assert!(!initial.next().is_reached_by(initial));
        assert_eq!(initial.next().prev(), initial);
    }

    #[test]
    #[should_panic(expected = "not comparable")]
    fn cross_queue_comparison_is_rejected() {
        FenceValue::new(QueueKind::Copy, 1).is_reached_by(FenceValue::new(QueueKind::Graphics, 1));
    }

    #[test]
    #[should_panic(expected = "no valid queue kind")]
    fn garbage_raw_value_is_rejected() {
        FenceValue::from_raw(0xff << FENCE_KIND_SHIFT);
    }
}
