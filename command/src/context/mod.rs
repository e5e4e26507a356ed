//! Recording contexts.

mod barriers;
mod compute;
mod graphics;
mod upload;

pub use self::{compute::ComputeContext, graphics::GraphicsContext};

use {
    crate::context_manager::CommandContextManager,
    kiln_core::{
        Backend, Barrier, CommandList as _, DescriptorHeapKind, FenceValue, HeapKind, OrFatal,
        PredicationOp, QueueKind, ResourceState,
    },
    kiln_resource::Resource,
    smallvec::SmallVec,
};

/// Number of barriers a context accumulates before flushing them into the list.
pub const BARRIER_BUFFER_SIZE: usize = 16;

/// Bindings cached to skip redundant rebinding.
#[derive(derivative::Derivative)]
#[derivative(Debug(bound = ""), Default(bound = ""))]
pub(crate) struct BoundState<B: Backend> {
    pub graphics_root_signature: Option<B::RootSignature>,
    pub graphics_pipeline_state: Option<B::PipelineState>,
    pub compute_root_signature: Option<B::RootSignature>,
    pub compute_pipeline_state: Option<B::PipelineState>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum ContextState {
    Idle,
    Recording,
}

/// Pooled part of a context.
/// Lives in the context manager free list while the context is idle.
#[derive(derivative::Derivative)]
#[derivative(Debug(bound = ""))]
pub(crate) struct ContextData<B: Backend> {
    pub id: u64,
    pub kind: QueueKind,
    pub list: B::CommandList,
    pub barriers: SmallVec<[Barrier<B::Resource>; BARRIER_BUFFER_SIZE]>,
    pub bound: BoundState<B>,
    pub descriptor_heaps: [Option<B::DescriptorHeap>; DescriptorHeapKind::COUNT],
    pub name: String,
    pub state: ContextState,
}

impl<B> ContextData<B>
where
    B: Backend,
{
    pub fn new(id: u64, kind: QueueKind, list: B::CommandList) -> Self {
        ContextData {
            id,
            kind,
            list,
            barriers: SmallVec::new(),
            bound: BoundState::default(),
            descriptor_heaps: Default::default(),
            name: String::new(),
            state: ContextState::Idle,
        }
    }
}

/// Recording context checked out from [`CommandContextManager`].
///
/// Records barriers, copies and, through [`graphics`] and [`compute`] views, draws and dispatches.
/// Must be consumed by [`finish`] which submits the work and returns the context to its manager.
///
/// Resource states are updated when barriers are recorded, not when they execute.
///
/// [`CommandContextManager`]: struct.CommandContextManager.html
/// [`graphics`]: #method.graphics
/// [`compute`]: #method.compute
/// [`finish`]: #method.finish
#[derive(derivative::Derivative)]
#[derivative(Debug(bound = ""))]
pub struct CommandContext<'a, B: Backend> {
    #[derivative(Debug = "ignore")]
    owner: &'a CommandContextManager<B>,
    data: ContextData<B>,
    allocator: B::Allocator,
    relevant: relevant::Relevant,
}

impl<'a, B> CommandContext<'a, B>
where
    B: Backend,
{
    /// Start recording with open list backed by `allocator`.
    pub(crate) fn start(
        owner: &'a CommandContextManager<B>,
        mut data: ContextData<B>,
        allocator: B::Allocator,
    ) -> Self {
        kiln_core::kiln_slow_assert_eq!(data.state, ContextState::Idle);
        kiln_core::kiln_slow_assert!(data.barriers.is_empty());
        data.state = ContextState::Recording;
        data.bound = BoundState::default();
        let mut context = CommandContext {
            owner,
            data,
            allocator,
            relevant: relevant::Relevant,
        };
        context.bind_descriptor_heaps();
        context
    }

    pub(crate) fn set_name(&mut self, name: &str) {
        self.data.name.clear();
        self.data.name.push_str(name);
        if self.owner.manager().config().label_objects {
            self.data.list.set_name(name);
        }
    }

    /// Stable id of the context. Recycled contexts keep their id.
    pub fn id(&self) -> u64 {
        self.data.id
    }

    /// Queue kind the context records for.
    pub fn kind(&self) -> QueueKind {
        self.data.kind
    }

    /// Name given on `begin`.
    pub fn name(&self) -> &str {
        &self.data.name
    }

    /// Number of recorded barriers not yet flushed into the list.
    pub fn pending_barriers(&self) -> usize {
        self.data.barriers.len()
    }

    /// Get raw list for recording commands kiln doesn't wrap.
    /// Pending barriers are flushed first.
    pub fn raw(&mut self) -> &mut B::CommandList {
        self.flush_resource_barriers();
        &mut self.data.list
    }

    /// View recording graphics commands.
    ///
    /// # Panics
    ///
    /// Panics if the context is not a graphics context.
    pub fn graphics(&mut self) -> GraphicsContext<'_, 'a, B> {
        assert_eq!(
            self.data.kind,
            QueueKind::Graphics,
            "{:?} context can't record graphics commands",
            self.data.kind
        );
        GraphicsContext::new(self)
    }

    /// View recording compute commands.
    ///
    /// # Panics
    ///
    /// Panics if the context is a copy context.
    pub fn compute(&mut self) -> ComputeContext<'_, 'a, B> {
        assert!(
            self.data.kind.supports(QueueKind::Compute),
            "{:?} context can't record compute commands",
            self.data.kind
        );
        ComputeContext::new(self)
    }

    /// Copy whole buffer.
    pub fn copy_buffer(&mut self, dst: &mut Resource<B>, src: &mut Resource<B>) {
        self.transition_resource(dst, ResourceState::COPY_DESTINATION, false);
        self.prepare_copy_source(src);
        self.flush_resource_barriers();
        self.data.list.copy_resource(dst.raw(), src.raw());
    }

    /// Copy `size` bytes between buffers.
    pub fn copy_buffer_region(
        &mut self,
        dst: &mut Resource<B>,
        dst_offset: u64,
        src: &mut Resource<B>,
        src_offset: u64,
        size: u64,
    ) {
        self.transition_resource(dst, ResourceState::COPY_DESTINATION, false);
        self.prepare_copy_source(src);
        self.flush_resource_barriers();
        self.data
            .list
            .copy_buffer_region(dst.raw(), dst_offset, src.raw(), src_offset, size);
    }

    /// Copy one subresource between textures.
    /// Resources must already be in copy states. Only pending barriers are flushed.
    pub fn copy_subresource(
        &mut self,
        dst: &Resource<B>,
        dst_subresource: u32,
        src: &Resource<B>,
        src_subresource: u32,
    ) {
        self.flush_resource_barriers();
        self.data
            .list
            .copy_texture_region(dst.raw(), dst_subresource, src.raw(), src_subresource);
    }

    /// Copy 4-byte counter at the start of `counter` buffer into `dst`.
    pub fn copy_counter(&mut self, dst: &mut Resource<B>, dst_offset: u64, counter: &mut Resource<B>) {
        self.transition_resource(dst, ResourceState::COPY_DESTINATION, false);
        self.transition_resource(counter, ResourceState::COPY_SOURCE, false);
        self.flush_resource_barriers();
        self.data
            .list
            .copy_buffer_region(dst.raw(), dst_offset, counter.raw(), 0, 4);
    }

    /// Upload heap resources stay in `GENERIC_READ` which already permits copying from them.
    fn prepare_copy_source(&mut self, src: &mut Resource<B>) {
        if src.heap() != HeapKind::Upload {
            self.transition_resource(src, ResourceState::COPY_SOURCE, false);
        }
    }

    /// Write GPU timestamp into the query.
    pub fn insert_timestamp(&mut self, heap: &B::QueryHeap, index: u32) {
        self.data.list.end_query(heap, index);
    }

    /// Write `count` query results starting with `first` into `dst` as 64-bit values.
    pub fn resolve_query_data(
        &mut self,
        heap: &B::QueryHeap,
        first: u32,
        count: u32,
        dst: &Resource<B>,
        dst_offset: u64,
    ) {
        self.flush_resource_barriers();
        self.data
            .list
            .resolve_query_data(heap, first, count, dst.raw(), dst_offset);
    }

    /// Skip following draws, dispatches and clears depending on the 64-bit value
    /// at `offset` of `predicate`. The buffer is transitioned to `PREDICATION`.
    ///
    /// Predication ends with [`clear_predication`] or when the recorded batch is submitted.
    ///
    /// # Panics
    ///
    /// Panics if the context is a copy context.
    ///
    /// [`clear_predication`]: #method.clear_predication
    pub fn set_predication(&mut self, predicate: &mut Resource<B>, offset: u64, op: PredicationOp) {
        assert_ne!(
            self.data.kind,
            QueueKind::Copy,
            "Copy context can't use predication"
        );
        self.transition_resource(predicate, ResourceState::PREDICATION, true);
        self.data
            .list
            .set_predication(Some(predicate.raw()), offset, op);
    }

    /// Make following commands unconditional.
    pub fn clear_predication(&mut self) {
        assert_ne!(
            self.data.kind,
            QueueKind::Copy,
            "Copy context can't use predication"
        );
        self.data
            .list
            .set_predication(None, 0, PredicationOp::EqualZero);
    }

    /// Bind descriptor heap of `kind`. Rebinding the bound heap is skipped.
    ///
    /// # Panics
    ///
    /// Panics if `kind` is not shader visible or the context is a copy context.
    pub fn set_descriptor_heap(&mut self, kind: DescriptorHeapKind, heap: &B::DescriptorHeap) {
        self.set_descriptor_heaps(&[(kind, heap)]);
    }

    /// Bind several descriptor heaps at once. Rebinding bound heaps is skipped.
    pub fn set_descriptor_heaps(&mut self, heaps: &[(DescriptorHeapKind, &B::DescriptorHeap)]) {
        assert_ne!(
            self.data.kind,
            QueueKind::Copy,
            "Copy context can't bind descriptor heaps"
        );

        let mut updated = false;
        for &(kind, heap) in heaps {
            assert!(
                kind.is_shader_visible(),
                "{:?} descriptor heaps are not shader visible",
                kind
            );
            let slot = &mut self.data.descriptor_heaps[kind.index()];
            if slot.as_ref() != Some(heap) {
                *slot = Some(heap.clone());
                updated = true;
            }
        }

        if updated {
            self.bind_descriptor_heaps();
        }
    }

    fn bind_descriptor_heaps(&mut self) {
        let heaps: SmallVec<[&B::DescriptorHeap; DescriptorHeapKind::COUNT]> = self
            .data
            .descriptor_heaps
            .iter()
            .filter_map(Option::as_ref)
            .collect();
        if !heaps.is_empty() {
            self.data.list.set_descriptor_heaps(&heaps);
        }
    }

    /// Submit recorded work and continue recording into the same allocator.
    ///
    /// Bound pipeline state is forgotten. Descriptor heaps are bound again.
    pub fn flush(&mut self, wait: bool) -> FenceValue {
        self.flush_resource_barriers();

        let manager = self.owner.manager();
        let queue = manager.queue(self.data.kind);
        let fence = queue.execute_batch(manager.device(), &mut self.data.list);
        if wait {
            manager.wait_for_fence(fence);
        }

        self.data
            .list
            .reset(&self.allocator)
            .or_fatal("Command list reset");
        self.data.bound = BoundState::default();
        self.bind_descriptor_heaps();
        fence
    }

    /// Submit recorded work and return the context to its manager.
    ///
    /// The allocator goes back to the queue's pool tagged with the returned fence value.
    pub fn finish(mut self, wait: bool) -> FenceValue {
        self.flush_resource_barriers();

        let CommandContext {
            owner,
            mut data,
            allocator,
            relevant,
        } = self;

        let manager = owner.manager();
        let queue = manager.queue(data.kind);
        let fence = queue.execute_batch(manager.device(), &mut data.list);
        queue.discard_allocator(fence, allocator);
        if wait {
            manager.wait_for_fence(fence);
        }

        log::trace!("Context {} '{}' finished with {}", data.id, data.name, fence);
        relevant.dispose();
        data.state = ContextState::Idle;
        owner.discard_context(data);
        fence
    }
}
