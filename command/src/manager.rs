use {
    crate::{config::Config, queue::CommandQueue},
    kiln_core::{Backend, Device, DeviceError, FenceValue, OrFatal, PerQueue, QueueKind},
    std::sync::Arc,
};

/// Owner of the graphics, compute and copy queues.
///
/// Fence values carry the kind of the queue that produced them,
/// so fence queries are routed without naming the queue.
#[derive(derivative::Derivative)]
#[derivative(Debug(bound = ""))]
pub struct CommandManager<B: Backend> {
    device: Arc<B::Device>,
    queues: PerQueue<CommandQueue<B>>,
    config: Config,
}

impl<B> CommandManager<B>
where
    B: Backend,
{
    /// Create all queues. Any failure aborts creation
    /// and destroys queues created so far.
    pub fn new(device: Arc<B::Device>, config: Config) -> Result<Self, DeviceError> {
        let mut created: Vec<CommandQueue<B>> = Vec::new();
        for &kind in QueueKind::ALL.iter() {
            match CommandQueue::<B>::create(&*device, kind, config.queue(kind)) {
                Ok(queue) => created.push(queue),
                Err(err) => {
                    log::error!("Failed to create {:?} queue: {}", kind, err);
                    for queue in created {
                        unsafe { queue.dispose(&*device) };
                    }
                    return Err(err);
                }
            }
        }

        let mut created = created.into_iter();
        let queues = PerQueue::try_new(|_| created.next().ok_or(DeviceError::DeviceLost))?;
        log::debug!("Command manager created with {:?}", config);
        Ok(CommandManager {
            device,
            queues,
            config,
        })
    }

    /// Device the queues belong to.
    pub fn device(&self) -> &Arc<B::Device> {
        &self.device
    }

    /// Configuration the manager was created with.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Queue of `kind`.
    pub fn queue(&self, kind: QueueKind) -> &CommandQueue<B> {
        &self.queues[kind]
    }

    /// Graphics queue.
    pub fn graphics_queue(&self) -> &CommandQueue<B> {
        self.queue(QueueKind::Graphics)
    }

    /// Compute queue.
    pub fn compute_queue(&self) -> &CommandQueue<B> {
        self.queue(QueueKind::Compute)
    }

    /// Copy queue.
    pub fn copy_queue(&self) -> &CommandQueue<B> {
        self.queue(QueueKind::Copy)
    }

    /// Create new command list of `kind` together with the allocator backing it.
    /// The list is open for recording.
    pub fn create_command_list(&self, kind: QueueKind) -> (B::CommandList, B::Allocator) {
        let allocator = self.queue(kind).request_allocator(&self.device);
        let list = self
            .device
            .create_command_list(kind, &allocator)
            .or_fatal("Command list creation");
        (list, allocator)
    }

    /// Check if fence value is complete on the queue that produced it.
    pub fn is_fence_complete(&self, value: FenceValue) -> bool {
        self.queue(value.kind()).is_fence_complete(&self.device, value)
    }

    /// Block until fence value is complete on the queue that produced it.
    pub fn wait_for_fence(&self, value: FenceValue) {
        self.queue(value.kind()).wait_for_fence(&self.device, value)
    }

    /// Block until every queue is idle.
    /// Must be called before resources used by submitted work are destroyed.
    pub fn wait_for_idle_gpu(&self) {
        for (_, queue) in self.queues.iter() {
            queue.wait_for_idle(&self.device);
        }
    }

    /// Make the `consumer` queue wait on the device for `value` of the queue that produced it.
    pub fn stall_for_fence(&self, consumer: QueueKind, value: FenceValue) {
        self.queue(consumer)
            .stall_for_fence(&self.device, self.queue(value.kind()), value)
    }

    /// Make the `consumer` queue wait on the device for the last batch of `producer` queue.
    pub fn stall_for_producer(&self, consumer: QueueKind, producer: QueueKind) {
        self.queue(consumer)
            .stall_for_producer(&self.device, self.queue(producer))
    }

    /// Wait for idle and destroy all queues.
    ///
    /// # Safety
    ///
    /// All allocators requested from the queues must be discarded.
    pub unsafe fn dispose(self) -> Arc<B::Device> {
        self.wait_for_idle_gpu();
        let [graphics, compute, copy] = self.queues.into_inner();
        for queue in vec![graphics, compute, copy] {
            queue.dispose(&self.device);
        }
        log::debug!("Command manager destroyed");
        self.device
    }
}
