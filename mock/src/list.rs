use {
    crate::handle::*,
    kiln_core::{
        Barrier, ClearFlags, CommandList, DescriptorHeapKind, DeviceError, IndexBufferView,
        PipelineKind, PlacedFootprint, PredicationOp, PrimitiveTopology, QueueKind, Rect,
        VertexBufferView, Viewport, MAX_RENDER_TARGETS,
    },
};

/// Command recorded into a [`MockCommandList`].
#[derive(Clone, Debug, PartialEq)]
#[allow(missing_docs)]
pub enum Command {
    Barriers(Vec<Barrier<MockResource>>),
    CopyResource {
        dst: MockResource,
        src: MockResource,
    },
    CopyBufferRegion {
        dst: MockResource,
        dst_offset: u64,
        src: MockResource,
        src_offset: u64,
        size: u64,
    },
    CopyTextureRegion {
        dst: MockResource,
        dst_subresource: u32,
        src: MockResource,
        src_subresource: u32,
    },
    CopyBufferToTexture {
        dst: MockResource,
        dst_subresource: u32,
        src: MockResource,
        footprint: PlacedFootprint,
    },
    SetDescriptorHeaps(Vec<MockDescriptorHeap>),
    SetRootSignature(PipelineKind, MockRootSignature),
    SetPipelineState(MockPipelineState),
    SetRootConstants {
        kind: PipelineKind,
        index: u32,
        values: Vec<u32>,
        offset: u32,
    },
    SetRootConstantBuffer {
        kind: PipelineKind,
        index: u32,
        address: u64,
    },
    Draw {
        vertices: u32,
        instances: u32,
        first_vertex: u32,
        first_instance: u32,
    },
    DrawIndexed {
        indices: u32,
        instances: u32,
        first_index: u32,
        base_vertex: i32,
        first_instance: u32,
    },
    DrawIndirect {
        arguments: MockResource,
        offset: u64,
    },
    Dispatch(u32, u32, u32),
    SetRenderTargets {
        rtvs: Vec<MockDescriptor>,
        dsv: Option<MockDescriptor>,
    },
    SetViewports(Vec<Viewport>),
    SetScissorRects(Vec<Rect>),
    SetStencilRef(u32),
    SetBlendFactor([f32; 4]),
    SetPrimitiveTopology(PrimitiveTopology),
    SetVertexBuffers {
        start_slot: u32,
        views: Vec<VertexBufferView>,
    },
    SetIndexBuffer(IndexBufferView),
    ClearRenderTarget {
        rtv: MockDescriptor,
        color: [f32; 4],
    },
    ClearDepthStencil {
        dsv: MockDescriptor,
        flags: ClearFlags,
        depth: f32,
        stencil: u8,
    },
    SetPredication {
        buffer: Option<MockResource>,
        offset: u64,
        op: PredicationOp,
    },
    BeginQuery {
        heap: MockQueryHeap,
        index: u32,
    },
    EndQuery {
        heap: MockQueryHeap,
        index: u32,
    },
    ResolveQueryData {
        heap: MockQueryHeap,
        first: u32,
        count: u32,
        dst: MockResource,
        dst_offset: u64,
    },
}

/// Command list that records into a plain vector.
#[derive(Debug)]
pub struct MockCommandList {
    pub(crate) id: u64,
    pub(crate) kind: QueueKind,
    pub(crate) allocator: u64,
    pub(crate) commands: Vec<Command>,
    pub(crate) open: bool,
    pub(crate) name: Option<String>,
    errors: Vec<String>,
}

impl MockCommandList {
    pub(crate) fn new(id: u64, kind: QueueKind, allocator: u64) -> Self {
        MockCommandList {
            id,
            kind,
            allocator,
            commands: Vec::new(),
            open: true,
            name: None,
            errors: Vec::new(),
        }
    }

    /// Commands recorded since the last reset.
    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    /// Debug name.
    pub fn name(&self) -> Option<&str> {
        self.name.as_ref().map(String::as_str)
    }

    /// Check if the list is open for recording.
    pub fn is_open(&self) -> bool {
        self.open
    }

    /// Id of the allocator the list records into.
    pub fn allocator(&self) -> u64 {
        self.allocator
    }

    fn record(&mut self, required: QueueKind, command: Command) {
        if !self.open {
            self.errors
                .push(format!("{:?} recorded into closed list", command));
        } else if !self.kind.supports(required) {
            self.errors.push(format!(
                "{:?} is not supported by {:?} list",
                command, self.kind
            ));
        }
        self.commands.push(command);
    }

    fn expect_descriptor(&mut self, descriptor: &MockDescriptor, kind: DescriptorHeapKind) {
        if descriptor.kind != kind {
            self.errors
                .push(format!("{:?} is used as {:?} descriptor", descriptor, kind));
        }
    }

    fn bind_point(kind: PipelineKind) -> QueueKind {
        match kind {
            PipelineKind::Graphics => QueueKind::Graphics,
            PipelineKind::Compute => QueueKind::Compute,
        }
    }
}

impl CommandList<Mock> for MockCommandList {
    fn close(&mut self) -> Result<(), DeviceError> {
        if !self.open {
            return Err(DeviceError::Validation(format!(
                "List {} is already closed",
                self.id
            )));
        }
        self.open = false;
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(DeviceError::Validation(self.errors.join("; ")))
        }
    }

    fn reset(&mut self, allocator: &MockAllocator) -> Result<(), DeviceError> {
        if self.open {
            return Err(DeviceError::Validation(format!(
                "List {} is reset while open",
                self.id
            )));
        }
        if allocator.kind != self.kind {
            return Err(DeviceError::Validation(format!(
                "{:?} list {} is reset with {:?} allocator",
                self.kind, self.id, allocator.kind
            )));
        }
        self.allocator = allocator.id;
        self.commands.clear();
        self.errors.clear();
        self.open = true;
        Ok(())
    }

    fn set_name(&mut self, name: &str) {
        self.name = Some(name.to_owned());
    }

    fn resource_barrier(&mut self, barriers: &[Barrier<MockResource>]) {
        self.record(QueueKind::Copy, Command::Barriers(barriers.to_vec()));
    }

    fn copy_resource(&mut self, dst: &MockResource, src: &MockResource) {
        self.record(
            QueueKind::Copy,
            Command::CopyResource {
                dst: *dst,
                src: *src,
            },
        );
    }

    fn copy_buffer_region(
        &mut self,
        dst: &MockResource,
        dst_offset: u64,
        src: &MockResource,
        src_offset: u64,
        size: u64,
    ) {
        self.record(
            QueueKind::Copy,
            Command::CopyBufferRegion {
                dst: *dst,
                dst_offset,
                src: *src,
                src_offset,
                size,
            },
        );
    }

    fn copy_texture_region(
        &mut self,
        dst: &MockResource,
        dst_subresource: u32,
        src: &MockResource,
        src_subresource: u32,
    ) {
        self.record(
            QueueKind::Copy,
            Command::CopyTextureRegion {
                dst: *dst,
                dst_subresource,
                src: *src,
                src_subresource,
            },
        );
    }

    fn copy_buffer_to_texture(
        &mut self,
        dst: &MockResource,
        dst_subresource: u32,
        src: &MockResource,
        footprint: &PlacedFootprint,
    ) {
        self.record(
            QueueKind::Copy,
            Command::CopyBufferToTexture {
                dst: *dst,
                dst_subresource,
                src: *src,
                footprint: *footprint,
            },
        );
    }

    fn set_descriptor_heaps(&mut self, heaps: &[&MockDescriptorHeap]) {
        self.record(
            QueueKind::Compute,
            Command::SetDescriptorHeaps(heaps.iter().map(|&&heap| heap).collect()),
        );
    }

    fn set_root_signature(&mut self, kind: PipelineKind, signature: &MockRootSignature) {
        self.record(
            Self::bind_point(kind),
            Command::SetRootSignature(kind, *signature),
        );
    }

    fn set_pipeline_state(&mut self, pipeline: &MockPipelineState) {
        self.record(QueueKind::Compute, Command::SetPipelineState(*pipeline));
    }

    fn set_root_constants(&mut self, kind: PipelineKind, index: u32, values: &[u32], offset: u32) {
        self.record(
            Self::bind_point(kind),
            Command::SetRootConstants {
                kind,
                index,
                values: values.to_vec(),
                offset,
            },
        );
    }

    fn set_root_constant_buffer(&mut self, kind: PipelineKind, index: u32, address: u64) {
        self.record(
            Self::bind_point(kind),
            Command::SetRootConstantBuffer {
                kind,
                index,
                address,
            },
        );
    }

    fn draw_instanced(
        &mut self,
        vertices: u32,
        instances: u32,
        first_vertex: u32,
        first_instance: u32,
    ) {
        self.record(
            QueueKind::Graphics,
            Command::Draw {
                vertices,
                instances,
                first_vertex,
                first_instance,
            },
        );
    }

    fn draw_indexed_instanced(
        &mut self,
        indices: u32,
        instances: u32,
        first_index: u32,
        base_vertex: i32,
        first_instance: u32,
    ) {
        self.record(
            QueueKind::Graphics,
            Command::DrawIndexed {
                indices,
                instances,
                first_index,
                base_vertex,
                first_instance,
            },
        );
    }

    fn draw_indirect(&mut self, arguments: &MockResource, offset: u64) {
        self.record(
            QueueKind::Graphics,
            Command::DrawIndirect {
                arguments: *arguments,
                offset,
            },
        );
    }

    fn dispatch(&mut self, x: u32, y: u32, z: u32) {
        self.record(QueueKind::Compute, Command::Dispatch(x, y, z));
    }

    fn set_render_targets(&mut self, rtvs: &[&MockDescriptor], dsv: Option<&MockDescriptor>) {
        if rtvs.len() > MAX_RENDER_TARGETS {
            self.errors
                .push(format!("{} render targets bound at once", rtvs.len()));
        }
        for rtv in rtvs {
            self.expect_descriptor(rtv, DescriptorHeapKind::Rtv);
        }
        if let Some(dsv) = dsv {
            self.expect_descriptor(dsv, DescriptorHeapKind::Dsv);
        }
        self.record(
            QueueKind::Graphics,
            Command::SetRenderTargets {
                rtvs: rtvs.iter().map(|&&rtv| rtv).collect(),
                dsv: dsv.cloned(),
            },
        );
    }

    fn set_viewports(&mut self, viewports: &[Viewport]) {
        self.record(QueueKind::Graphics, Command::SetViewports(viewports.to_vec()));
    }

    fn set_scissor_rects(&mut self, rects: &[Rect]) {
        self.record(QueueKind::Graphics, Command::SetScissorRects(rects.to_vec()));
    }

    fn set_stencil_ref(&mut self, value: u32) {
        self.record(QueueKind::Graphics, Command::SetStencilRef(value));
    }

    fn set_blend_factor(&mut self, factor: [f32; 4]) {
        self.record(QueueKind::Graphics, Command::SetBlendFactor(factor));
    }

    fn set_primitive_topology(&mut self, topology: PrimitiveTopology) {
        self.record(QueueKind::Graphics, Command::SetPrimitiveTopology(topology));
    }

    fn set_vertex_buffers(&mut self, start_slot: u32, views: &[VertexBufferView]) {
        self.record(
            QueueKind::Graphics,
            Command::SetVertexBuffers {
                start_slot,
                views: views.to_vec(),
            },
        );
    }

    fn set_index_buffer(&mut self, view: &IndexBufferView) {
        self.record(QueueKind::Graphics, Command::SetIndexBuffer(*view));
    }

    fn clear_render_target(&mut self, rtv: &MockDescriptor, color: [f32; 4]) {
        self.expect_descriptor(rtv, DescriptorHeapKind::Rtv);
        self.record(
            QueueKind::Graphics,
            Command::ClearRenderTarget { rtv: *rtv, color },
        );
    }

    fn clear_depth_stencil(&mut self, dsv: &MockDescriptor, flags: ClearFlags, depth: f32, stencil: u8) {
        self.expect_descriptor(dsv, DescriptorHeapKind::Dsv);
        if flags.is_empty() {
            self.errors.push(format!("Clear of {:?} without flags", dsv));
        }
        self.record(
            QueueKind::Graphics,
            Command::ClearDepthStencil {
                dsv: *dsv,
                flags,
                depth,
                stencil,
            },
        );
    }

    fn set_predication(&mut self, buffer: Option<&MockResource>, offset: u64, op: PredicationOp) {
        self.record(
            QueueKind::Compute,
            Command::SetPredication {
                buffer: buffer.cloned(),
                offset,
                op,
            },
        );
    }

    fn begin_query(&mut self, heap: &MockQueryHeap, index: u32) {
        self.record(QueueKind::Graphics, Command::BeginQuery { heap: *heap, index });
    }

    fn end_query(&mut self, heap: &MockQueryHeap, index: u32) {
        self.record(QueueKind::Copy, Command::EndQuery { heap: *heap, index });
    }

    fn resolve_query_data(
        &mut self,
        heap: &MockQueryHeap,
        first: u32,
        count: u32,
        dst: &MockResource,
        dst_offset: u64,
    ) {
        self.record(
            QueueKind::Copy,
            Command::ResolveQueryData {
                heap: *heap,
                first,
                count,
                dst: *dst,
                dst_offset,
            },
        );
    }
}
