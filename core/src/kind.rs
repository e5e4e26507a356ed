//! Queue kinds and per-kind storage.

use std::ops::{Index, IndexMut};

/// Class of hardware engine a batch targets.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum QueueKind {
    /// Capable of graphics, compute and transfer commands.
    Graphics = 0,

    /// Capable of compute and transfer commands.
    Compute = 1,

    /// Capable of transfer commands only.
    Copy = 2,
}

impl QueueKind {
    /// All queue kinds, in index order.
    pub const ALL: [QueueKind; 3] = [QueueKind::Graphics, QueueKind::Compute, QueueKind::Copy];

    /// Index of the kind in per-kind storage.
    pub fn index(self) -> usize {
        self as usize
    }

    /// Kind from its index.
    pub fn from_index(index: usize) -> Option<Self> {
        QueueKind::ALL.get(index).cloned()
    }

    /// Check if batches of this kind can record commands of `other` kind.
    pub fn supports(self, other: QueueKind) -> bool {
        match (self, other) {
            (QueueKind::Graphics, _) => true,
            (QueueKind::Compute, QueueKind::Compute) | (QueueKind::Compute, QueueKind::Copy) => {
                true
            }
            (QueueKind::Copy, QueueKind::Copy) => true,
            _ => false,
        }
    }
}

/// Fixed storage with one value per queue kind.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PerQueue<T>([T; 3]);

impl<T> PerQueue<T> {
    /// Create storage by calling `f` for every kind.
    pub fn new(mut f: impl FnMut(QueueKind) -> T) -> Self {
        PerQueue([
            f(QueueKind::Graphics),
            f(QueueKind::Compute),
            f(QueueKind::Copy),
        ])
    }

    /// Create storage by calling fallible `f` for every kind.
    /// Stops at the first error.
    pub fn try_new<E>(mut f: impl FnMut(QueueKind) -> Result<T, E>) -> Result<Self, E> {
        Ok(PerQueue([
            f(QueueKind::Graphics)?,
            f(QueueKind::Compute)?,
            f(QueueKind::Copy)?,
        ]))
    }

    /// Iterate over kinds and values.
    pub fn iter(&self) -> impl Iterator<Item = (QueueKind, &T)> {
        QueueKind::ALL.iter().cloned().zip(self.0.iter())
    }

    /// Unwrap values in kind order.
    pub fn into_inner(self) -> [T; 3] {
        self.0
    }
}

impl<T> Index<QueueKind> for PerQueue<T> {
    type Output = T;

    fn index(&self, kind: QueueKind) -> &T {
        &self.0[kind.index()]
    }
}

impl<T> IndexMut<QueueKind> for PerQueue<T> {
    fn index_mut(&mut self, kind: QueueKind) -> &mut T {
        &mut self.0[kind.index()]
    }
}
