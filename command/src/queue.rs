//! Hardware queue with fence tracking.

use {
    crate::{config::QueueConfig, pool::AllocatorPool},
    kiln_core::{
        Backend, CommandList as _, Device, DeviceError, FenceValue, OrFatal, QueueKind,
    },
    parking_lot::{Mutex, MutexGuard},
    std::sync::atomic::{AtomicU64, Ordering},
};

/// Hardware queue of one kind.
///
/// Every executed batch is stamped with the next fence value of the queue.
/// The queue's fence is signaled with that value once the batch completes.
#[derive(derivative::Derivative)]
#[derivative(Debug(bound = ""))]
pub struct CommandQueue<B: Backend> {
    kind: QueueKind,
    raw: Mutex<B::Queue>,
    fence: B::Fence,
    event: Mutex<B::Event>,
    next_fence_value: AtomicU64,
    last_completed_fence_value: AtomicU64,
    pool: Mutex<AllocatorPool<B>>,
    relevant: relevant::Relevant,
}

impl<B> CommandQueue<B>
where
    B: Backend,
{
    /// Create queue with its fence and wait event.
    pub fn create(
        device: &B::Device,
        kind: QueueKind,
        config: &QueueConfig,
    ) -> Result<Self, DeviceError> {
        let initial = FenceValue::initial(kind);
        let raw = device.create_queue(kind, config.priority)?;

        let fence = match device.create_fence(initial.raw()) {
            Ok(fence) => fence,
            Err(err) => {
                unsafe { device.destroy_queue(raw) };
                return Err(err);
            }
        };

        let event = match device.create_event() {
            Ok(event) => event,
            Err(err) => {
                unsafe {
                    device.destroy_fence(fence);
                    device.destroy_queue(raw);
                }
                return Err(err);
            }
        };

        log::debug!("Created {:?} queue", kind);
        Ok(CommandQueue {
            kind,
            raw: Mutex::new(raw),
            fence,
            event: Mutex::new(event),
            next_fence_value: AtomicU64::new(initial.next().raw()),
            last_completed_fence_value: AtomicU64::new(initial.raw()),
            pool: Mutex::new(AllocatorPool::new(kind)),
            relevant: relevant::Relevant,
        })
    }

    /// Kind of the queue.
    pub fn kind(&self) -> QueueKind {
        self.kind
    }

    /// Fence value the next executed batch gets.
    pub fn next_fence_value(&self) -> FenceValue {
        FenceValue::from_raw(self.next_fence_value.load(Ordering::Acquire))
    }

    /// Cached completed fence value. Never decreases.
    pub fn last_completed_fence_value(&self) -> FenceValue {
        FenceValue::from_raw(self.last_completed_fence_value.load(Ordering::Acquire))
    }

    /// Lock raw queue for direct submission, e.g. presentation.
    pub fn raw(&self) -> MutexGuard<'_, B::Queue> {
        self.raw.lock()
    }

    /// Fence signaled by the queue.
    pub fn fence(&self) -> &B::Fence {
        &self.fence
    }

    /// Raise cached completed value to at least `value`.
    fn complete_up_to(&self, value: FenceValue) -> FenceValue {
        let previous = self
            .last_completed_fence_value
            .fetch_max(value.raw(), Ordering::AcqRel);
        FenceValue::from_raw(previous.max(value.raw()))
    }

    /// Re-read completed value from the device fence.
    fn poll(&self, device: &B::Device) -> FenceValue {
        let completed = device.fence_completed_value(&self.fence);
        kiln_core::kiln_slow_assert_eq!(
            FenceValue::from_raw(completed).kind(),
            self.kind,
            "Queue fence holds foreign value"
        );
        self.complete_up_to(FenceValue::from_raw(completed))
    }

    /// Check if `value` is complete.
    /// The device is queried only if the cached value doesn't reach `value`.
    ///
    /// # Panics
    ///
    /// Panics if `value` was not produced by this queue.
    pub fn is_fence_complete(&self, device: &B::Device, value: FenceValue) -> bool {
        assert_eq!(
            value.kind(),
            self.kind,
            "Fence value {} doesn't belong to {:?} queue",
            value,
            self.kind
        );
        value.is_reached_by(self.last_completed_fence_value()) || value.is_reached_by(self.poll(device))
    }

    /// Block until `value` is complete.
    ///
    /// Failed waits are retried by re-querying the fence.
    pub fn wait_for_fence(&self, device: &B::Device, value: FenceValue) {
        if self.is_fence_complete(device, value) {
            return;
        }

        #[cfg(feature = "profiler")]
        thread_profiler::profile_scope!("wait_for_fence");
        let event = self.event.lock();
        while !self.is_fence_complete(device, value) {
            device
                .set_event_on_completion(&self.fence, value.raw(), &event)
                .or_fatal("Arming fence event");

            if let Err(err) = device.wait_event(&event) {
                log::warn!(
                    "Waiting for {} on {:?} queue failed: {}. Retrying",
                    value,
                    self.kind,
                    err
                );
            }
        }
        self.complete_up_to(value);
    }

    /// Block until all executed batches are complete.
    pub fn wait_for_idle(&self, device: &B::Device) {
        self.wait_for_fence(device, self.next_fence_value().prev());
    }

    /// Close and submit `list`. Returns fence value the queue signals on its completion.
    ///
    /// Device failures are fatal.
    pub fn execute_batch(&self, device: &B::Device, list: &mut B::CommandList) -> FenceValue {
        #[cfg(feature = "profiler")]
        thread_profiler::profile_scope!("execute_batch");
        list.close().or_fatal("Closing command list");

        let mut raw = self.raw.lock();
        let value = self.next_fence_value();
        device.submit(&mut raw, list).or_fatal("Command list submission");
        device
            .signal(&mut raw, &self.fence, value.raw())
            .or_fatal("Fence signal");
        self.next_fence_value
            .store(value.next().raw(), Ordering::Release);

        log::trace!("Submitted batch {} to {:?} queue", value, self.kind);
        value
    }

    /// Make this queue wait on the device until `value` of `producer` is complete.
    /// The calling thread is not blocked.
    ///
    /// # Panics
    ///
    /// Panics if `value` was not produced by `producer`.
    pub fn stall_for_fence(&self, device: &B::Device, producer: &CommandQueue<B>, value: FenceValue) {
        assert_eq!(
            value.kind(),
            producer.kind,
            "Fence value {} doesn't belong to {:?} queue",
            value,
            producer.kind
        );
        log::trace!("{:?} queue stalls for {}", self.kind, value);
        device
            .queue_wait(&mut self.raw.lock(), &producer.fence, value.raw())
            .or_fatal("Queue wait");
    }

    /// Make this queue wait for the last batch executed by `producer`.
    pub fn stall_for_producer(&self, device: &B::Device, producer: &CommandQueue<B>) {
        self.stall_for_fence(device, producer, producer.next_fence_value().prev());
    }

    /// Get allocator for new recording. Never blocks.
    pub fn request_allocator(&self, device: &B::Device) -> B::Allocator {
        let completed = self.poll(device);
        self.pool
            .lock()
            .request(device, completed)
            .or_fatal("Command allocator request")
    }

    /// Return allocator used by the batch signaled with `fence`.
    pub fn discard_allocator(&self, fence: FenceValue, allocator: B::Allocator) {
        self.pool.lock().discard(fence, allocator);
    }

    /// Number of allocators created for this queue.
    pub fn allocators_created(&self) -> usize {
        self.pool.lock().created()
    }

    /// Wait for idle and destroy the queue.
    ///
    /// # Safety
    ///
    /// Queue must be created by the `device`.
    /// All allocators requested from the queue must be discarded.
    pub unsafe fn dispose(self, device: &B::Device) {
        self.wait_for_idle(device);
        self.pool.into_inner().dispose(device);
        device.destroy_event(self.event.into_inner());
        device.destroy_fence(self.fence);
        device.destroy_queue(self.raw.into_inner());
        self.relevant.dispose();
        log::debug!("Destroyed {:?} queue", self.kind);
    }
}
