use {
    crate::{
        context::{CommandContext, ContextData, ContextState},
        manager::CommandManager,
    },
    kiln_core::{
        Backend, CommandList as _, Device, FenceValue, OrFatal, PerQueue, QueueKind,
        SubresourceData,
    },
    kiln_resource::Resource,
    parking_lot::Mutex,
    std::{
        collections::VecDeque,
        sync::{
            atomic::{AtomicU64, AtomicUsize, Ordering},
            Arc,
        },
    },
};

/// Free lists of idle command contexts, one per queue kind.
///
/// Contexts are created on demand and live until [`dispose`](#method.dispose).
#[derive(derivative::Derivative)]
#[derivative(Debug(bound = ""))]
pub struct CommandContextManager<B: Backend> {
    manager: Arc<CommandManager<B>>,
    free: PerQueue<Mutex<VecDeque<ContextData<B>>>>,
    created: PerQueue<AtomicUsize>,
    next_id: AtomicU64,
    relevant: relevant::Relevant,
}

impl<B> CommandContextManager<B>
where
    B: Backend,
{
    /// Create manager with empty free lists.
    pub fn new(manager: Arc<CommandManager<B>>) -> Self {
        CommandContextManager {
            manager,
            free: PerQueue::new(|_| Mutex::new(VecDeque::new())),
            created: PerQueue::new(|_| AtomicUsize::new(0)),
            next_id: AtomicU64::new(0),
            relevant: relevant::Relevant,
        }
    }

    /// Command manager contexts submit to.
    pub fn manager(&self) -> &Arc<CommandManager<B>> {
        &self.manager
    }

    /// Number of contexts of `kind` created so far.
    pub fn created(&self, kind: QueueKind) -> usize {
        self.created[kind].load(Ordering::Acquire)
    }

    /// Number of idle contexts of `kind`.
    pub fn available(&self, kind: QueueKind) -> usize {
        self.free[kind].lock().len()
    }

    /// Get context of `kind` ready for recording.
    ///
    /// Reuses an idle context if there is one, creates a new one otherwise. Never blocks.
    pub fn request_context(&self, kind: QueueKind) -> CommandContext<'_, B> {
        let popped = self.free[kind].lock().pop_front();
        let (data, allocator) = match popped {
            Some(mut data) => {
                let allocator = self.manager.queue(kind).request_allocator(self.manager.device());
                data.list.reset(&allocator).or_fatal("Command list reset");
                log::trace!("Reusing {:?} context {}", kind, data.id);
                (data, allocator)
            }
            None => {
                let (list, allocator) = self.manager.create_command_list(kind);
                let id = self.next_id.fetch_add(1, Ordering::Relaxed);
                let total = self.created[kind].fetch_add(1, Ordering::AcqRel) + 1;
                log::debug!("Created {:?} context {}, {} in total", kind, id, total);
                (ContextData::new(id, kind, list), allocator)
            }
        };

        CommandContext::start(self, data, allocator)
    }

    /// Begin recording graphics commands.
    pub fn begin(&self, name: &str) -> CommandContext<'_, B> {
        self.begin_kind(QueueKind::Graphics, name)
    }

    /// Begin recording compute commands.
    pub fn begin_compute(&self, name: &str) -> CommandContext<'_, B> {
        self.begin_kind(QueueKind::Compute, name)
    }

    /// Begin recording copy commands.
    pub fn begin_copy(&self, name: &str) -> CommandContext<'_, B> {
        self.begin_kind(QueueKind::Copy, name)
    }

    fn begin_kind(&self, kind: QueueKind, name: &str) -> CommandContext<'_, B> {
        let mut context = self.request_context(kind);
        context.set_name(name);
        context
    }

    /// Return finished context to its free list.
    pub(crate) fn discard_context(&self, data: ContextData<B>) {
        kiln_core::kiln_slow_assert_eq!(data.state, ContextState::Idle);
        self.free[data.kind].lock().push_back(data);
    }

    /// Fill buffer with `data`. Blocks until done.
    /// See [`CommandContext::initialize_buffer`](struct.CommandContext.html#method.initialize_buffer).
    pub fn initialize_buffer(&self, resource: &mut Resource<B>, data: &[u8]) -> FenceValue {
        CommandContext::initialize_buffer(self, resource, data)
    }

    /// Write `data` at `offset` of the buffer. Blocks until done.
    pub fn initialize_buffer_region(
        &self,
        resource: &mut Resource<B>,
        offset: u64,
        data: &[u8],
    ) -> FenceValue {
        CommandContext::initialize_buffer_region(self, resource, offset, data)
    }

    /// Fill texture subresources. Blocks until done.
    pub fn initialize_texture(
        &self,
        resource: &mut Resource<B>,
        subresources: &[SubresourceData<'_>],
    ) -> FenceValue {
        CommandContext::initialize_texture(self, resource, subresources)
    }

    /// Destroy all contexts.
    ///
    /// Waits for the device to become idle first.
    ///
    /// # Panics
    ///
    /// Panics if any context is not finished.
    pub fn dispose(self) -> Arc<CommandManager<B>> {
        for &kind in QueueKind::ALL.iter() {
            let available = self.available(kind);
            let created = self.created(kind);
            assert_eq!(
                available,
                created,
                "{} {:?} contexts are not finished",
                created - available,
                kind
            );
        }

        self.manager.wait_for_idle_gpu();
        let device = self.manager.device();
        let [graphics, compute, copy] = self.free.into_inner();
        for free in vec![graphics, compute, copy] {
            for data in free.into_inner() {
                unsafe {
                    // Device is idle.
                    device.destroy_command_list(data.list);
                }
            }
        }
        self.relevant.dispose();
        log::debug!("Command context manager destroyed");
        self.manager
    }
}
