//! Backend abstraction.
//!
//! Kiln records and submits work through these traits.
//! Everything above them is backend agnostic.

use {
    crate::{
        error::DeviceError,
        kind::QueueKind,
        types::{
            Barrier, ClearFlags, HeapKind, IndexBufferView, PipelineKind, PlacedFootprint,
            PredicationOp, PrimitiveTopology, QueryKind, QueuePriority, Rect, ResourceDesc,
            ResourceState, VertexBufferView, Viewport,
        },
    },
    std::fmt::Debug,
};

/// Set of associated handle types of a graphics API.
pub trait Backend: Sized + 'static {
    /// Logical device.
    type Device: Device<Self>;

    /// Hardware queue.
    type Queue: Debug + Send;

    /// Monotonic 64-bit fence signaled by queues.
    type Fence: Debug + Send + Sync;

    /// OS event that can be armed to trigger on fence completion.
    type Event: Debug + Send;

    /// Backing storage of command lists.
    type Allocator: Debug + Send;

    /// Recordable list of commands.
    type CommandList: CommandList<Self>;

    /// Buffer or texture handle.
    type Resource: Clone + Debug + PartialEq + Send + Sync;

    /// Root signature handle.
    type RootSignature: Clone + Debug + PartialEq + Send + Sync;

    /// Pipeline state handle.
    type PipelineState: Clone + Debug + PartialEq + Send + Sync;

    /// Shader visible descriptor heap handle.
    type DescriptorHeap: Clone + Debug + PartialEq + Send + Sync;

    /// CPU descriptor handle of a render target or depth stencil view.
    type CpuDescriptor: Clone + Debug + PartialEq + Send + Sync;

    /// Query heap handle.
    type QueryHeap: Clone + Debug + Send + Sync;
}

/// Logical device of the backend.
pub trait Device<B: Backend>: Debug + Send + Sync {
    /// Create a hardware queue of the given kind.
    fn create_queue(&self, kind: QueueKind, priority: QueuePriority)
        -> Result<B::Queue, DeviceError>;

    /// Create a fence with initial completed value.
    fn create_fence(&self, initial: u64) -> Result<B::Fence, DeviceError>;

    /// Create an auto-reset event.
    fn create_event(&self) -> Result<B::Event, DeviceError>;

    /// Create command allocator for lists of the given kind.
    fn create_allocator(&self, kind: QueueKind) -> Result<B::Allocator, DeviceError>;

    /// Create command list backed by `allocator`.
    /// The new list is open for recording.
    fn create_command_list(
        &self,
        kind: QueueKind,
        allocator: &B::Allocator,
    ) -> Result<B::CommandList, DeviceError>;

    /// Create committed resource in `heap` with initial state.
    fn create_resource(
        &self,
        desc: &ResourceDesc,
        heap: HeapKind,
        initial: ResourceState,
    ) -> Result<B::Resource, DeviceError>;

    /// GPU virtual address of a buffer.
    fn gpu_address(&self, resource: &B::Resource) -> u64;

    /// Write host data into a host visible resource.
    fn write_resource(
        &self,
        resource: &B::Resource,
        offset: u64,
        data: &[u8],
    ) -> Result<(), DeviceError>;

    /// Read host visible resource content.
    fn read_resource(
        &self,
        resource: &B::Resource,
        offset: u64,
        data: &mut [u8],
    ) -> Result<(), DeviceError>;

    /// Layout of subresources `first .. first + count` of a texture in a linear buffer,
    /// together with total buffer size required.
    fn copyable_footprints(
        &self,
        desc: &ResourceDesc,
        first: u32,
        count: u32,
    ) -> (Vec<PlacedFootprint>, u64);

    /// Create heap of `count` queries of `kind`.
    fn create_query_heap(&self, kind: QueryKind, count: u32) -> Result<B::QueryHeap, DeviceError>;

    /// Submit closed command list for execution.
    fn submit(&self, queue: &mut B::Queue, list: &B::CommandList) -> Result<(), DeviceError>;

    /// Enqueue fence signal after previously submitted work.
    fn signal(&self, queue: &mut B::Queue, fence: &B::Fence, value: u64)
        -> Result<(), DeviceError>;

    /// Make the queue wait on device until fence reaches value.
    fn queue_wait(
        &self,
        queue: &mut B::Queue,
        fence: &B::Fence,
        value: u64,
    ) -> Result<(), DeviceError>;

    /// Value the fence has reached.
    fn fence_completed_value(&self, fence: &B::Fence) -> u64;

    /// Arm event to be signaled once fence reaches value.
    fn set_event_on_completion(
        &self,
        fence: &B::Fence,
        value: u64,
        event: &B::Event,
    ) -> Result<(), DeviceError>;

    /// Block calling thread until event is signaled.
    fn wait_event(&self, event: &B::Event) -> Result<(), DeviceError>;

    /// Reset allocator, invalidating everything recorded through it.
    ///
    /// # Safety
    ///
    /// Lists recorded with the allocator must have completed execution.
    unsafe fn reset_allocator(&self, allocator: &mut B::Allocator) -> Result<(), DeviceError>;

    /// Destroy queue.
    ///
    /// # Safety
    ///
    /// Queue must be idle.
    unsafe fn destroy_queue(&self, queue: B::Queue);

    /// Destroy fence.
    ///
    /// # Safety
    ///
    /// Fence must not be referenced by pending signals or waits.
    unsafe fn destroy_fence(&self, fence: B::Fence);

    /// Destroy event.
    ///
    /// # Safety
    ///
    /// Event must not be armed.
    unsafe fn destroy_event(&self, event: B::Event);

    /// Destroy allocator.
    ///
    /// # Safety
    ///
    /// Lists recorded with the allocator must have completed execution.
    unsafe fn destroy_allocator(&self, allocator: B::Allocator);

    /// Destroy command list.
    ///
    /// # Safety
    ///
    /// List must not be pending execution.
    unsafe fn destroy_command_list(&self, list: B::CommandList);

    /// Destroy resource.
    ///
    /// # Safety
    ///
    /// Resource must not be used by pending work.
    unsafe fn destroy_resource(&self, resource: B::Resource);

    /// Destroy query heap.
    ///
    /// # Safety
    ///
    /// Heap must not be used by pending work.
    unsafe fn destroy_query_heap(&self, heap: B::QueryHeap);
}

/// Recordable command list.
///
/// Recording calls don't fail. Invalid usage is reported on `close`.
pub trait CommandList<B: Backend>: Debug + Send {
    /// Finish recording.
    fn close(&mut self) -> Result<(), DeviceError>;

    /// Reopen closed list for recording into `allocator`.
    fn reset(&mut self, allocator: &B::Allocator) -> Result<(), DeviceError>;

    /// Set debug name.
    fn set_name(&mut self, name: &str);

    /// Record barriers.
    fn resource_barrier(&mut self, barriers: &[Barrier<B::Resource>]);

    /// Copy whole resource.
    fn copy_resource(&mut self, dst: &B::Resource, src: &B::Resource);

    /// Copy bytes between buffers.
    fn copy_buffer_region(
        &mut self,
        dst: &B::Resource,
        dst_offset: u64,
        src: &B::Resource,
        src_offset: u64,
        size: u64,
    );

    /// Copy one subresource between textures.
    fn copy_texture_region(
        &mut self,
        dst: &B::Resource,
        dst_subresource: u32,
        src: &B::Resource,
        src_subresource: u32,
    );

    /// Copy subresource from a linear buffer laid out by `footprint`.
    fn copy_buffer_to_texture(
        &mut self,
        dst: &B::Resource,
        dst_subresource: u32,
        src: &B::Resource,
        footprint: &PlacedFootprint,
    );

    /// Bind shader visible descriptor heaps.
    fn set_descriptor_heaps(&mut self, heaps: &[&B::DescriptorHeap]);

    /// Bind root signature to the bind point.
    fn set_root_signature(&mut self, kind: PipelineKind, signature: &B::RootSignature);

    /// Bind pipeline state.
    fn set_pipeline_state(&mut self, pipeline: &B::PipelineState);

    /// Set 32-bit root constants.
    fn set_root_constants(&mut self, kind: PipelineKind, index: u32, values: &[u32], offset: u32);

    /// Set root constant buffer view by GPU address.
    fn set_root_constant_buffer(&mut self, kind: PipelineKind, index: u32, address: u64);

    /// Record non-indexed draw.
    fn draw_instanced(
        &mut self,
        vertices: u32,
        instances: u32,
        first_vertex: u32,
        first_instance: u32,
    );

    /// Record indexed draw.
    fn draw_indexed_instanced(
        &mut self,
        indices: u32,
        instances: u32,
        first_index: u32,
        base_vertex: i32,
        first_instance: u32,
    );

    /// Record non-indexed draw with arguments read from a buffer.
    /// See [`DrawArguments`] for the layout.
    ///
    /// [`DrawArguments`]: types/struct.DrawArguments.html
    fn draw_indirect(&mut self, arguments: &B::Resource, offset: u64);

    /// Record compute dispatch.
    fn dispatch(&mut self, x: u32, y: u32, z: u32);

    /// Bind render targets and optional depth stencil target.
    fn set_render_targets(&mut self, rtvs: &[&B::CpuDescriptor], dsv: Option<&B::CpuDescriptor>);

    /// Set viewports.
    fn set_viewports(&mut self, viewports: &[Viewport]);

    /// Set scissor rectangles.
    fn set_scissor_rects(&mut self, rects: &[Rect]);

    /// Set stencil reference value.
    fn set_stencil_ref(&mut self, value: u32);

    /// Set blend factor constant.
    fn set_blend_factor(&mut self, factor: [f32; 4]);

    /// Set primitive topology.
    fn set_primitive_topology(&mut self, topology: PrimitiveTopology);

    /// Bind vertex buffers to consecutive slots starting at `start_slot`.
    fn set_vertex_buffers(&mut self, start_slot: u32, views: &[VertexBufferView]);

    /// Bind index buffer.
    fn set_index_buffer(&mut self, view: &IndexBufferView);

    /// Fill render target with `color`.
    fn clear_render_target(&mut self, rtv: &B::CpuDescriptor, color: [f32; 4]);

    /// Clear depth and/or stencil of a depth stencil target.
    fn clear_depth_stencil(&mut self, dsv: &B::CpuDescriptor, flags: ClearFlags, depth: f32, stencil: u8);

    /// Make subsequent draws, dispatches and clears conditional on the 64-bit value
    /// at `offset` of `buffer`. `None` disables predication.
    fn set_predication(&mut self, buffer: Option<&B::Resource>, offset: u64, op: PredicationOp);

    /// Start counting into an occlusion query.
    fn begin_query(&mut self, heap: &B::QueryHeap, index: u32);

    /// Write timestamp into a timestamp query or stop an occlusion query.
    fn end_query(&mut self, heap: &B::QueryHeap, index: u32);

    /// Write 64-bit query results into a buffer.
    fn resolve_query_data(
        &mut self,
        heap: &B::QueryHeap,
        first: u32,
        count: u32,
        dst: &B::Resource,
        dst_offset: u64,
    );
}
