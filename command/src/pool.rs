//! Recycling of command allocators.

use {
    kiln_core::{Backend, Device, DeviceError, FenceValue, QueueKind},
    std::collections::VecDeque,
};

/// Pool of command allocators of one queue kind.
///
/// Allocators are returned tagged with the fence value of the batch that used them
/// and handed out again only once that value is complete.
/// Discards arrive in submission order, so checking the oldest entry is enough.
#[derive(derivative::Derivative)]
#[derivative(Debug(bound = ""))]
pub struct AllocatorPool<B: Backend> {
    kind: QueueKind,
    available: VecDeque<(FenceValue, B::Allocator)>,
    created: usize,
    relevant: relevant::Relevant,
}

impl<B> AllocatorPool<B>
where
    B: Backend,
{
    /// Create empty pool.
    pub fn new(kind: QueueKind) -> Self {
        AllocatorPool {
            kind,
            available: VecDeque::new(),
            created: 0,
            relevant: relevant::Relevant,
        }
    }

    /// Queue kind of allocators in the pool.
    pub fn kind(&self) -> QueueKind {
        self.kind
    }

    /// Number of allocators created by the pool.
    pub fn created(&self) -> usize {
        self.created
    }

    /// Number of allocators waiting in the pool.
    pub fn available(&self) -> usize {
        self.available.len()
    }

    /// Get an allocator for new recording.
    ///
    /// Recycles the oldest returned allocator if its fence value is reached by `completed`,
    /// creates a new one otherwise. Never blocks.
    pub fn request(
        &mut self,
        device: &B::Device,
        completed: FenceValue,
    ) -> Result<B::Allocator, DeviceError> {
        let ready = match self.available.front() {
            Some(&(fence, _)) => fence.is_reached_by(completed),
            None => false,
        };

        if ready {
            if let Some((fence, mut allocator)) = self.available.pop_front() {
                unsafe {
                    // Batch recorded with the allocator is complete.
                    device.reset_allocator(&mut allocator)?;
                }
                log::trace!("Recycled {:?} allocator released at {}", self.kind, fence);
                return Ok(allocator);
            }
        }

        let allocator = device.create_allocator(self.kind)?;
        self.created += 1;
        log::trace!(
            "Created {:?} allocator, {} in total",
            self.kind,
            self.created
        );
        Ok(allocator)
    }

    /// Return allocator used by the batch signaled with `fence`.
    /// The allocator is reset when it is handed out again.
    pub fn discard(&mut self, fence: FenceValue, allocator: B::Allocator) {
        assert_eq!(
            fence.kind(),
            self.kind,
            "Allocator discarded with foreign fence value"
        );
        // Concurrent submitters may return allocators slightly out of order.
        let position = self
            .available
            .iter()
            .rposition(|&(last, _)| last <= fence)
            .map_or(0, |index| index + 1);
        self.available.insert(position, (fence, allocator));
    }

    /// Destroy all allocators.
    ///
    /// # Safety
    ///
    /// Batches recorded with the allocators must be complete.
    pub unsafe fn dispose(self, device: &B::Device) {
        assert_eq!(
            self.available.len(),
            self.created,
            "{} {:?} allocators are not returned to the pool",
            self.created - self.available.len(),
            self.kind,
        );
        for (_, allocator) in self.available {
            device.destroy_allocator(allocator);
        }
        self.relevant.dispose();
    }
}
