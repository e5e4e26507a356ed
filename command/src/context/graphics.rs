use {
    super::CommandContext,
    kiln_core::{
        Backend, ClearFlags, CommandList as _, IndexBufferView, PipelineKind, PrimitiveTopology,
        Rect, ResourceState, VertexBufferView, Viewport, MAX_RENDER_TARGETS,
    },
    kiln_resource::Resource,
    std::ops::{Deref, DerefMut},
};

/// Graphics view of a [`CommandContext`].
///
/// [`CommandContext`]: struct.CommandContext.html
#[derive(derivative::Derivative)]
#[derivative(Debug(bound = ""))]
pub struct GraphicsContext<'c, 'a, B: Backend> {
    context: &'c mut CommandContext<'a, B>,
}

impl<'c, 'a, B> GraphicsContext<'c, 'a, B>
where
    B: Backend,
{
    pub(super) fn new(context: &'c mut CommandContext<'a, B>) -> Self {
        GraphicsContext { context }
    }

    /// Bind root signature unless it is already bound.
    pub fn set_root_signature(&mut self, signature: &B::RootSignature) {
        let data = &mut self.context.data;
        if data.bound.graphics_root_signature.as_ref() != Some(signature) {
            data.bound.graphics_root_signature = Some(signature.clone());
            data.list.set_root_signature(PipelineKind::Graphics, signature);
        }
    }

    /// Bind pipeline state unless it is already bound.
    pub fn set_pipeline_state(&mut self, pipeline: &B::PipelineState) {
        let data = &mut self.context.data;
        if data.bound.graphics_pipeline_state.as_ref() != Some(pipeline) {
            data.bound.graphics_pipeline_state = Some(pipeline.clone());
            data.list.set_pipeline_state(pipeline);
        }
    }

    /// Set 32-bit constants of root parameter `index`.
    pub fn set_constants(&mut self, index: u32, values: &[u32]) {
        self.context
            .data
            .list
            .set_root_constants(PipelineKind::Graphics, index, values, 0);
    }

    /// Bind constant buffer at GPU `address` to root parameter `index`.
    pub fn set_constant_buffer(&mut self, index: u32, address: u64) {
        self.context
            .data
            .list
            .set_root_constant_buffer(PipelineKind::Graphics, index, address);
    }

    /// Bind render targets and optional depth stencil target.
    ///
    /// # Panics
    ///
    /// Panics if more than `MAX_RENDER_TARGETS` targets are given.
    pub fn set_render_targets(&mut self, rtvs: &[&B::CpuDescriptor], dsv: Option<&B::CpuDescriptor>) {
        assert!(
            rtvs.len() <= MAX_RENDER_TARGETS,
            "Can't bind {} render targets, at most {} are supported",
            rtvs.len(),
            MAX_RENDER_TARGETS
        );
        self.context.data.list.set_render_targets(rtvs, dsv);
    }

    /// Bind single render target.
    pub fn set_render_target(&mut self, rtv: &B::CpuDescriptor, dsv: Option<&B::CpuDescriptor>) {
        self.set_render_targets(&[rtv], dsv);
    }

    /// Bind depth stencil target without color targets.
    pub fn set_depth_stencil_target(&mut self, dsv: &B::CpuDescriptor) {
        self.set_render_targets(&[], Some(dsv));
    }

    /// Set single viewport.
    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.context.data.list.set_viewports(&[viewport]);
    }

    /// Set single scissor rectangle.
    pub fn set_scissor(&mut self, rect: Rect) {
        self.context.data.list.set_scissor_rects(&[rect]);
    }

    /// Set viewport and scissor to the same rectangle.
    pub fn set_viewport_and_scissor(&mut self, x: u32, y: u32, width: u32, height: u32) {
        self.set_viewport(Viewport::new(x as f32, y as f32, width as f32, height as f32));
        self.set_scissor(Rect::from_extent(x, y, width, height));
    }

    /// Set stencil reference value.
    pub fn set_stencil_ref(&mut self, value: u32) {
        self.context.data.list.set_stencil_ref(value);
    }

    /// Set blend factor constant.
    pub fn set_blend_factor(&mut self, factor: [f32; 4]) {
        self.context.data.list.set_blend_factor(factor);
    }

    /// Set how vertices are assembled into primitives.
    pub fn set_primitive_topology(&mut self, topology: PrimitiveTopology) {
        self.context.data.list.set_primitive_topology(topology);
    }

    /// Bind vertex buffer to `slot`.
    pub fn set_vertex_buffer(&mut self, slot: u32, view: VertexBufferView) {
        self.set_vertex_buffers(slot, &[view]);
    }

    /// Bind vertex buffers to consecutive slots starting at `start_slot`.
    pub fn set_vertex_buffers(&mut self, start_slot: u32, views: &[VertexBufferView]) {
        self.context.data.list.set_vertex_buffers(start_slot, views);
    }

    /// Bind index buffer.
    pub fn set_index_buffer(&mut self, view: IndexBufferView) {
        self.context.data.list.set_index_buffer(&view);
    }

    /// Fill render target with `color`.
    /// The target must already be in `RENDER_TARGET` state. Pending barriers are flushed.
    pub fn clear_color(&mut self, rtv: &B::CpuDescriptor, color: [f32; 4]) {
        self.context.flush_resource_barriers();
        self.context.data.list.clear_render_target(rtv, color);
    }

    /// Clear depth of a depth stencil target in `DEPTH_WRITE` state.
    pub fn clear_depth(&mut self, dsv: &B::CpuDescriptor, depth: f32) {
        self.clear_depth_stencil(dsv, ClearFlags::DEPTH, depth, 0);
    }

    /// Clear stencil of a depth stencil target in `DEPTH_WRITE` state.
    pub fn clear_stencil(&mut self, dsv: &B::CpuDescriptor, stencil: u8) {
        self.clear_depth_stencil(dsv, ClearFlags::STENCIL, 0.0, stencil);
    }

    /// Clear depth and stencil of a depth stencil target in `DEPTH_WRITE` state.
    pub fn clear_depth_and_stencil(&mut self, dsv: &B::CpuDescriptor, depth: f32, stencil: u8) {
        self.clear_depth_stencil(dsv, ClearFlags::DEPTH | ClearFlags::STENCIL, depth, stencil);
    }

    fn clear_depth_stencil(&mut self, dsv: &B::CpuDescriptor, flags: ClearFlags, depth: f32, stencil: u8) {
        self.context.flush_resource_barriers();
        self.context
            .data
            .list
            .clear_depth_stencil(dsv, flags, depth, stencil);
    }

    /// Start occlusion query. Draws recorded until [`end_query`] add their samples to it.
    ///
    /// [`end_query`]: #method.end_query
    pub fn begin_query(&mut self, heap: &B::QueryHeap, index: u32) {
        self.context.data.list.begin_query(heap, index);
    }

    /// Stop occlusion query.
    pub fn end_query(&mut self, heap: &B::QueryHeap, index: u32) {
        self.context.data.list.end_query(heap, index);
    }

    /// Draw `vertices` vertices.
    pub fn draw(&mut self, vertices: u32, first_vertex: u32) {
        self.draw_instanced(vertices, 1, first_vertex, 0);
    }

    /// Draw `indices` indices.
    pub fn draw_indexed(&mut self, indices: u32, first_index: u32, base_vertex: i32) {
        self.draw_indexed_instanced(indices, 1, first_index, base_vertex, 0);
    }

    /// Draw instances.
    pub fn draw_instanced(
        &mut self,
        vertices: u32,
        instances: u32,
        first_vertex: u32,
        first_instance: u32,
    ) {
        self.context.flush_resource_barriers();
        self.context
            .data
            .list
            .draw_instanced(vertices, instances, first_vertex, first_instance);
    }

    /// Draw indexed instances.
    pub fn draw_indexed_instanced(
        &mut self,
        indices: u32,
        instances: u32,
        first_index: u32,
        base_vertex: i32,
        first_instance: u32,
    ) {
        self.context.flush_resource_barriers();
        self.context.data.list.draw_indexed_instanced(
            indices,
            instances,
            first_index,
            base_vertex,
            first_instance,
        );
    }

    /// Draw with arguments read from `arguments` at `offset`.
    /// The buffer is transitioned to `INDIRECT_ARGUMENT`.
    pub fn draw_indirect(&mut self, arguments: &mut Resource<B>, offset: u64) {
        self.context
            .transition_resource(arguments, ResourceState::INDIRECT_ARGUMENT, true);
        self.context.data.list.draw_indirect(arguments.raw(), offset);
    }
}

impl<'c, 'a, B> Deref for GraphicsContext<'c, 'a, B>
where
    B: Backend,
{
    type Target = CommandContext<'a, B>;

    fn deref(&self) -> &CommandContext<'a, B> {
        &*self.context
    }
}

impl<'c, 'a, B> DerefMut for GraphicsContext<'c, 'a, B>
where
    B: Backend,
{
    fn deref_mut(&mut self) -> &mut CommandContext<'a, B> {
        &mut *self.context
    }
}
