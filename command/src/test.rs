use {
    crate::{CommandContextManager, CommandManager, Config, BARRIER_BUFFER_SIZE},
    kiln_core::{
        Barrier, BarrierSplit, ClearFlags, DescriptorHeapKind, Device, DrawArguments, HeapKind,
        IndexBufferView, IndexFormat, PredicationOp, PrimitiveTopology, QueryKind, QueueKind,
        Rect, ResourceDesc, ResourceState, SubresourceData, VertexBufferView, Viewport,
    },
    kiln_mock::{
        Command, Mock, MockDescriptor, MockDescriptorHeap, MockDevice, MockPipelineState,
        MockQueryHeap, MockRootSignature, TimelineEvent,
    },
    kiln_resource::Resource,
    std::sync::Arc,
};

fn init() -> (Arc<MockDevice>, CommandContextManager<Mock>) {
    let _ = simple_logger::init_with_level(log::Level::Warn);
    let device = Arc::new(MockDevice::new());
    let manager = CommandManager::new(device.clone(), Config::default()).unwrap();
    (device, CommandContextManager::new(Arc::new(manager)))
}

fn teardown(device: &MockDevice, contexts: CommandContextManager<Mock>, resources: Vec<Resource<Mock>>) {
    let manager = Arc::try_unwrap(contexts.dispose()).unwrap();
    let _ = unsafe { manager.dispose() };
    for resource in resources {
        unsafe { resource.dispose(device) };
    }
    assert_eq!(device.live_objects(), 0);
}

fn buffer(device: &MockDevice, size: u64, state: ResourceState) -> Resource<Mock> {
    Resource::create(device, ResourceDesc::buffer(size), HeapKind::Default, state).unwrap()
}

fn transition(
    resource: &Resource<Mock>,
    before: ResourceState,
    after: ResourceState,
    split: BarrierSplit,
) -> Barrier<kiln_mock::MockResource> {
    Barrier::Transition {
        resource: *resource.raw(),
        before,
        after,
        split,
    }
}

fn read_queries(device: &MockDevice, readback: &Resource<Mock>, count: usize) -> Vec<u64> {
    let mut bytes = vec![0u8; count * 8];
    device.read_resource(readback.raw(), 0, &mut bytes).unwrap();
    bytes
        .chunks(8)
        .map(|chunk| {
            let mut raw = [0u8; 8];
            raw.copy_from_slice(chunk);
            u64::from_le_bytes(raw)
        })
        .collect()
}

fn occlusion_queries(device: &MockDevice, count: u32) -> (MockQueryHeap, Resource<Mock>) {
    let heap = device
        .create_query_heap(QueryKind::Occlusion, count)
        .unwrap();
    let readback: Resource<Mock> = Resource::create(
        device,
        ResourceDesc::buffer(u64::from(count) * 8),
        HeapKind::Readback,
        ResourceState::COPY_DESTINATION,
    )
    .unwrap();
    (heap, readback)
}

fn executed(device: &MockDevice) -> Vec<(Option<String>, Vec<Command>)> {
    device
        .timeline()
        .into_iter()
        .filter_map(|event| match event {
            TimelineEvent::Executed { name, commands, .. } => Some((name, commands)),
            _ => None,
        })
        .collect()
}

#[test]
fn transition_to_current_state_records_nothing() {
    let (device, contexts) = init();
    let mut target = buffer(&device, 64, ResourceState::COPY_DESTINATION);

    let mut context = contexts.begin("noop");
    context.transition_resource(&mut target, ResourceState::COPY_DESTINATION, false);
    assert_eq!(context.pending_barriers(), 0);
    context.transition_resource(&mut target, ResourceState::COPY_DESTINATION, true);
    context.finish(true);

    assert!(device.executed_barriers().is_empty());
    teardown(&device, contexts, vec![target]);
}

#[test]
fn split_transition_records_begin_and_end() {
    let (device, contexts) = init();
    let mut texture = buffer(&device, 64, ResourceState::COPY_DESTINATION);

    let mut context = contexts.begin("split");
    context.begin_transition_resource(&mut texture, ResourceState::PIXEL_SHADER_RESOURCE, false);
    assert_eq!(texture.usage_state(), ResourceState::COPY_DESTINATION);
    assert_eq!(
        texture.transition_state(),
        Some(ResourceState::PIXEL_SHADER_RESOURCE)
    );

    context.transition_resource(&mut texture, ResourceState::PIXEL_SHADER_RESOURCE, false);
    assert_eq!(texture.usage_state(), ResourceState::PIXEL_SHADER_RESOURCE);
    assert_eq!(texture.transition_state(), None);
    context.finish(true);

    assert_eq!(
        device.executed_barriers(),
        vec![
            transition(
                &texture,
                ResourceState::COPY_DESTINATION,
                ResourceState::PIXEL_SHADER_RESOURCE,
                BarrierSplit::BeginOnly
            ),
            transition(
                &texture,
                ResourceState::COPY_DESTINATION,
                ResourceState::PIXEL_SHADER_RESOURCE,
                BarrierSplit::EndOnly
            ),
        ]
    );
    assert!(device.validation_messages().is_empty());
    assert_eq!(
        device.gpu_state(texture.raw()),
        ResourceState::PIXEL_SHADER_RESOURCE
    );
    teardown(&device, contexts, vec![texture]);
}

#[test]
fn outstanding_split_is_completed_before_other_transition() {
    let (device, contexts) = init();
    let mut resource = buffer(&device, 64, ResourceState::COPY_DESTINATION);

    let mut context = contexts.begin("split");
    context.begin_transition_resource(&mut resource, ResourceState::PIXEL_SHADER_RESOURCE, false);
    context.transition_resource(&mut resource, ResourceState::COPY_SOURCE, false);
    assert_eq!(resource.usage_state(), ResourceState::COPY_SOURCE);
    assert_eq!(resource.transition_state(), None);

    context.begin_transition_resource(&mut resource, ResourceState::UNORDERED_ACCESS, false);
    context.begin_transition_resource(&mut resource, ResourceState::GENERIC_READ, false);
    assert_eq!(resource.transition_state(), Some(ResourceState::GENERIC_READ));
    assert_eq!(resource.usage_state(), ResourceState::UNORDERED_ACCESS);
    context.transition_resource(&mut resource, ResourceState::GENERIC_READ, false);
    context.finish(true);

    let splits: Vec<_> = device
        .executed_barriers()
        .into_iter()
        .map(|barrier| match barrier {
            Barrier::Transition { after, split, .. } => (after, split),
            other => panic!("Unexpected {:?}", other),
        })
        .collect();
    assert_eq!(
        splits,
        vec![
            (ResourceState::PIXEL_SHADER_RESOURCE, BarrierSplit::BeginOnly),
            (ResourceState::PIXEL_SHADER_RESOURCE, BarrierSplit::EndOnly),
            (ResourceState::COPY_SOURCE, BarrierSplit::None),
            (ResourceState::UNORDERED_ACCESS, BarrierSplit::BeginOnly),
            (ResourceState::UNORDERED_ACCESS, BarrierSplit::EndOnly),
            (ResourceState::GENERIC_READ, BarrierSplit::BeginOnly),
            (ResourceState::GENERIC_READ, BarrierSplit::EndOnly),
        ]
    );
    assert!(device.validation_messages().is_empty());
    teardown(&device, contexts, vec![resource]);
}

#[test]
fn repeated_split_begin_records_once() {
    let (device, contexts) = init();
    let mut resource = buffer(&device, 64, ResourceState::COMMON);

    let mut context = contexts.begin_compute("split");
    context.begin_transition_resource(&mut resource, ResourceState::NON_PIXEL_SHADER_RESOURCE, false);
    context.begin_transition_resource(&mut resource, ResourceState::NON_PIXEL_SHADER_RESOURCE, false);
    assert_eq!(context.pending_barriers(), 1);
    context.transition_resource(&mut resource, ResourceState::NON_PIXEL_SHADER_RESOURCE, false);
    context.finish(true);

    assert_eq!(device.executed_barriers().len(), 2);
    teardown(&device, contexts, vec![resource]);
}

#[test]
fn unordered_access_begin_in_same_state_orders_writes() {
    let (device, contexts) = init();
    let mut resource = buffer(&device, 64, ResourceState::UNORDERED_ACCESS);

    let mut context = contexts.begin_compute("uav");
    context.begin_transition_resource(&mut resource, ResourceState::UNORDERED_ACCESS, true);
    assert_eq!(resource.transition_state(), None);
    context.finish(true);

    assert_eq!(
        device.executed_barriers(),
        vec![Barrier::UnorderedAccess {
            resource: Some(*resource.raw())
        }]
    );
    teardown(&device, contexts, vec![resource]);
}

#[test]
fn barriers_flush_when_buffer_is_full() {
    let (device, contexts) = init();
    let mut resources: Vec<_> = (0..BARRIER_BUFFER_SIZE + 1)
        .map(|_| buffer(&device, 16, ResourceState::COMMON))
        .collect();

    let mut context = contexts.begin("many");
    for (index, resource) in resources.iter_mut().enumerate() {
        context.transition_resource(resource, ResourceState::COPY_DESTINATION, false);
        assert_eq!(
            context.pending_barriers(),
            (index + 1) % BARRIER_BUFFER_SIZE
        );
    }
    context.insert_uav_barrier(None, false);
    context.insert_alias_barrier(Some(&resources[0]), Some(&resources[1]), true);
    assert_eq!(context.pending_barriers(), 0);
    context.finish(true);

    let batches = executed(&device);
    let sizes: Vec<usize> = batches[0]
        .1
        .iter()
        .map(|command| match command {
            Command::Barriers(barriers) => barriers.len(),
            other => panic!("Unexpected {:?}", other),
        })
        .collect();
    assert_eq!(sizes, vec![BARRIER_BUFFER_SIZE, 3]);
    teardown(&device, contexts, resources);
}

#[test]
fn finished_context_is_recycled_clean() {
    let (device, contexts) = init();
    let signature = MockRootSignature(1);

    let mut context = contexts.begin("first");
    let id = context.id();
    context.graphics().set_root_signature(&signature);
    context.finish(true);
    assert_eq!(contexts.available(QueueKind::Graphics), 1);

    let mut context = contexts.begin("second");
    assert_eq!(context.id(), id);
    assert_eq!(context.name(), "second");
    assert_eq!(context.pending_barriers(), 0);
    context.graphics().set_root_signature(&signature);
    context.finish(true);

    assert_eq!(contexts.created(QueueKind::Graphics), 1);
    let batches = executed(&device);
    assert_eq!(batches.len(), 2);
    assert_eq!(batches[0].0.as_ref().map(String::as_str), Some("first"));
    assert_eq!(batches[1].0.as_ref().map(String::as_str), Some("second"));
    assert_eq!(
        batches[1].1,
        vec![Command::SetRootSignature(
            kiln_core::PipelineKind::Graphics,
            signature
        )]
    );
    teardown(&device, contexts, vec![]);
}

#[test]
fn contexts_of_different_kinds_are_separate() {
    let (device, contexts) = init();
    let graphics = contexts.begin("graphics");
    let compute = contexts.begin_compute("compute");
    let copy = contexts.begin_copy("copy");
    assert_eq!(copy.kind(), QueueKind::Copy);
    assert_ne!(graphics.id(), compute.id());

    let fences = [graphics.finish(false), compute.finish(false), copy.finish(false)];
    for fence in fences.iter() {
        contexts.manager().wait_for_fence(*fence);
        assert!(contexts.manager().is_fence_complete(*fence));
    }
    assert_eq!(fences[2].kind(), QueueKind::Copy);
    teardown(&device, contexts, vec![]);
}

#[test]
fn redundant_bindings_are_skipped() {
    let (device, contexts) = init();
    let heap = MockDescriptorHeap {
        id: 3,
        kind: DescriptorHeapKind::CbvSrvUav,
    };

    let mut context = contexts.begin("bindings");
    context.set_descriptor_heap(DescriptorHeapKind::CbvSrvUav, &heap);
    context.set_descriptor_heap(DescriptorHeapKind::CbvSrvUav, &heap);
    {
        let mut graphics = context.graphics();
        graphics.set_root_signature(&MockRootSignature(1));
        graphics.set_root_signature(&MockRootSignature(1));
        graphics.set_pipeline_state(&MockPipelineState(1));
        graphics.set_pipeline_state(&MockPipelineState(1));
        graphics.set_pipeline_state(&MockPipelineState(2));
        graphics.draw(3, 0);
    }
    context.flush(true);
    context.compute().dispatch_1d(100, 64);
    context.finish(true);

    let batches = executed(&device);
    assert_eq!(
        batches[0].1,
        vec![
            Command::SetDescriptorHeaps(vec![heap]),
            Command::SetRootSignature(kiln_core::PipelineKind::Graphics, MockRootSignature(1)),
            Command::SetPipelineState(MockPipelineState(1)),
            Command::SetPipelineState(MockPipelineState(2)),
            Command::Draw {
                vertices: 3,
                instances: 1,
                first_vertex: 0,
                first_instance: 0,
            },
        ]
    );
    assert_eq!(
        batches[1].1,
        vec![
            Command::SetDescriptorHeaps(vec![heap]),
            Command::Dispatch(2, 1, 1),
        ]
    );
    teardown(&device, contexts, vec![]);
}

#[test]
fn flush_keeps_recording_with_same_allocator() {
    let (device, contexts) = init();
    let mut target = buffer(&device, 16, ResourceState::COMMON);

    let mut context = contexts.begin("flush");
    context.transition_resource(&mut target, ResourceState::COPY_DESTINATION, false);
    let first = context.flush(true);
    assert!(contexts.manager().is_fence_complete(first));
    context.transition_resource(&mut target, ResourceState::COPY_SOURCE, false);
    let second = context.finish(true);

    assert_eq!(second, first.next());
    assert_eq!(
        contexts.manager().graphics_queue().allocators_created(),
        1
    );
    assert_eq!(device.gpu_state(target.raw()), ResourceState::COPY_SOURCE);
    teardown(&device, contexts, vec![target]);
}

#[test]
fn allocator_in_flight_is_not_reused() {
    let (device, contexts) = init();
    device.pause();
    let fence = contexts.begin("in flight").finish(false);
    let context = contexts.begin("while paused");
    assert_eq!(contexts.manager().graphics_queue().allocators_created(), 2);
    device.resume();
    context.finish(true);
    assert!(contexts.manager().is_fence_complete(fence));

    contexts.begin("after").finish(true);
    assert_eq!(contexts.manager().graphics_queue().allocators_created(), 2);
    assert!(device.validation_messages().is_empty());
    teardown(&device, contexts, vec![]);
}

#[test]
fn copies_transition_resources() {
    let (device, contexts) = init();
    let mut source: Resource<Mock> = Resource::create(
        &*device,
        ResourceDesc::buffer(8),
        HeapKind::Upload,
        ResourceState::GENERIC_READ,
    )
    .unwrap();
    device
        .write_resource(source.raw(), 0, &[1, 2, 3, 4, 5, 6, 7, 8])
        .unwrap();
    let mut target = buffer(&device, 8, ResourceState::COMMON);
    let mut counter_copy = buffer(&device, 8, ResourceState::COMMON);

    let mut context = contexts.begin_copy("copies");
    context.copy_buffer_region(&mut target, 0, &mut source, 0, 8);
    assert_eq!(source.usage_state(), ResourceState::GENERIC_READ);
    context.copy_counter(&mut counter_copy, 4, &mut target);
    context.finish(true);

    assert_eq!(device.read_buffer(target.raw()), vec![1, 2, 3, 4, 5, 6, 7, 8]);
    assert_eq!(device.read_buffer(counter_copy.raw()), vec![0, 0, 0, 0, 1, 2, 3, 4]);
    assert_eq!(target.usage_state(), ResourceState::COPY_SOURCE);
    assert!(device.validation_messages().is_empty());
    teardown(&device, contexts, vec![source, target, counter_copy]);
}

#[test]
fn texture_upload_fills_subresources() {
    let (device, contexts) = init();
    let desc = ResourceDesc::Texture {
        width: 4,
        height: 2,
        depth_or_array_size: 1,
        mip_levels: 2,
        texel_size: 4,
    };
    let mut texture: Resource<Mock> =
        Resource::create(&*device, desc, HeapKind::Default, ResourceState::COMMON).unwrap();
    let top: Vec<u8> = (0..32).collect();
    let mip: Vec<u8> = (100..108).collect();

    contexts.initialize_texture(
        &mut texture,
        &[
            SubresourceData {
                data: &top,
                row_pitch: 16,
                slice_pitch: 32,
            },
            SubresourceData {
                data: &mip,
                row_pitch: 8,
                slice_pitch: 8,
            },
        ],
    );

    assert_eq!(texture.usage_state(), ResourceState::GENERIC_READ);
    assert_eq!(device.read_subresource(texture.raw(), 0), top);
    assert_eq!(device.read_subresource(texture.raw(), 1), mip);
    assert_eq!(device.gpu_state(texture.raw()), ResourceState::GENERIC_READ);
    teardown(&device, contexts, vec![texture]);
}

#[test]
fn timestamps_are_resolved() {
    let (device, contexts) = init();
    let heap = device.create_query_heap(QueryKind::Timestamp, 2).unwrap();
    let readback: Resource<Mock> = Resource::create(
        &*device,
        ResourceDesc::buffer(16),
        HeapKind::Readback,
        ResourceState::COPY_DESTINATION,
    )
    .unwrap();

    let mut context = contexts.begin_compute("timestamps");
    context.insert_timestamp(&heap, 0);
    context.compute().dispatch(1, 1, 1);
    context.insert_timestamp(&heap, 1);
    context.resolve_query_data(&heap, 0, 2, &readback, 0);
    context.finish(true);

    let mut bytes = [0u8; 16];
    device.read_resource(readback.raw(), 0, &mut bytes).unwrap();
    let mut first = [0u8; 8];
    let mut second = [0u8; 8];
    first.copy_from_slice(&bytes[..8]);
    second.copy_from_slice(&bytes[8..]);
    let (first, second) = (u64::from_le_bytes(first), u64::from_le_bytes(second));
    assert!(first > 0);
    assert!(second >= first);

    unsafe { device.destroy_query_heap(heap) };
    teardown(&device, contexts, vec![readback]);
}

#[test]
#[should_panic(expected = "can't record graphics commands")]
fn compute_context_rejects_graphics_view() {
    let (_device, contexts) = init();
    let mut context = contexts.begin_compute("compute");
    context.graphics();
}

#[test]
#[should_panic(expected = "can't bind descriptor heaps")]
fn copy_context_rejects_descriptor_heaps() {
    let (_device, contexts) = init();
    let mut context = contexts.begin_copy("copy");
    context.set_descriptor_heap(
        DescriptorHeapKind::Sampler,
        &MockDescriptorHeap {
            id: 0,
            kind: DescriptorHeapKind::Sampler,
        },
    );
}

#[test]
#[should_panic(expected = "not finished")]
fn dispose_with_checked_out_context_panics() {
    let (_device, contexts) = init();
    std::mem::forget(contexts.begin("leaked"));
    contexts.dispose();
}

#[test]
fn startup_failure_is_returned() {
    let device = Arc::new(MockDevice::new());
    device.fail_next_queue_creation();
    assert!(CommandManager::<Mock>::new(device.clone(), Config::default()).is_err());
    assert_eq!(device.live_objects(), 0);
}

#[test]
#[should_panic(expected = "overflows buffer")]
fn upload_past_address_space_panics() {
    let (device, contexts) = init();
    let mut target = buffer(&device, 16, ResourceState::COMMON);
    contexts.initialize_buffer_region(&mut target, u64::max_value() - 1, &[0; 4]);
}

#[test]
fn graphics_state_is_recorded() {
    let (device, contexts) = init();
    let rtv = MockDescriptor::rtv(0);
    let dsv = MockDescriptor::dsv(0);
    let vertices = VertexBufferView {
        address: 0x1000,
        size: 96,
        stride: 32,
    };
    let indices = IndexBufferView {
        address: 0x2000,
        size: 12,
        format: IndexFormat::U16,
    };

    let mut context = contexts.begin("frame");
    {
        let mut graphics = context.graphics();
        graphics.set_render_target(&rtv, Some(&dsv));
        graphics.set_viewport_and_scissor(8, 4, 64, 32);
        graphics.clear_color(&rtv, [0.0, 0.0, 0.0, 1.0]);
        graphics.clear_depth_and_stencil(&dsv, 1.0, 0);
        graphics.set_primitive_topology(PrimitiveTopology::TriangleList);
        graphics.set_stencil_ref(3);
        graphics.set_blend_factor([0.5; 4]);
        graphics.set_vertex_buffer(0, vertices);
        graphics.set_index_buffer(indices);
        graphics.draw_indexed(6, 0, 0);
    }
    context.finish(true);

    assert_eq!(
        executed(&device)[0].1,
        vec![
            Command::SetRenderTargets {
                rtvs: vec![rtv],
                dsv: Some(dsv),
            },
            Command::SetViewports(vec![Viewport {
                x: 8.0,
                y: 4.0,
                width: 64.0,
                height: 32.0,
                min_depth: 0.0,
                max_depth: 1.0,
            }]),
            Command::SetScissorRects(vec![Rect {
                left: 8,
                top: 4,
                right: 72,
                bottom: 36,
            }]),
            Command::ClearRenderTarget {
                rtv,
                color: [0.0, 0.0, 0.0, 1.0],
            },
            Command::ClearDepthStencil {
                dsv,
                flags: ClearFlags::DEPTH | ClearFlags::STENCIL,
                depth: 1.0,
                stencil: 0,
            },
            Command::SetPrimitiveTopology(PrimitiveTopology::TriangleList),
            Command::SetStencilRef(3),
            Command::SetBlendFactor([0.5; 4]),
            Command::SetVertexBuffers {
                start_slot: 0,
                views: vec![vertices],
            },
            Command::SetIndexBuffer(indices),
            Command::DrawIndexed {
                indices: 6,
                instances: 1,
                first_index: 0,
                base_vertex: 0,
                first_instance: 0,
            },
        ]
    );
    assert!(device.validation_messages().is_empty());
    teardown(&device, contexts, vec![]);
}

#[test]
fn depth_only_pass_binds_no_color_targets() {
    let (device, contexts) = init();
    let dsv = MockDescriptor::dsv(2);

    let mut context = contexts.begin("shadow");
    {
        let mut graphics = context.graphics();
        graphics.set_depth_stencil_target(&dsv);
        graphics.clear_depth(&dsv, 1.0);
        graphics.clear_stencil(&dsv, 7);
    }
    context.finish(true);

    assert_eq!(
        executed(&device)[0].1,
        vec![
            Command::SetRenderTargets {
                rtvs: vec![],
                dsv: Some(dsv),
            },
            Command::ClearDepthStencil {
                dsv,
                flags: ClearFlags::DEPTH,
                depth: 1.0,
                stencil: 0,
            },
            Command::ClearDepthStencil {
                dsv,
                flags: ClearFlags::STENCIL,
                depth: 0.0,
                stencil: 7,
            },
        ]
    );
    teardown(&device, contexts, vec![]);
}

#[test]
fn indirect_draws_count_into_occlusion_queries() {
    let (device, contexts) = init();
    let mut arguments = buffer(&device, DrawArguments::SIZE, ResourceState::COMMON);
    let draw = DrawArguments {
        vertices: 3,
        instances: 4,
        first_vertex: 0,
        first_instance: 0,
    };
    contexts.initialize_buffer(&mut arguments, &draw.to_bytes());
    let (heap, readback) = occlusion_queries(&device, 1);

    let mut context = contexts.begin("occlusion");
    {
        let mut graphics = context.graphics();
        graphics.set_primitive_topology(PrimitiveTopology::TriangleList);
        graphics.begin_query(&heap, 0);
        graphics.draw_indirect(&mut arguments, 0);
        graphics.draw(3, 0);
        graphics.end_query(&heap, 0);
    }
    context.resolve_query_data(&heap, 0, 1, &readback, 0);
    context.finish(true);

    assert_eq!(arguments.usage_state(), ResourceState::INDIRECT_ARGUMENT);
    assert_eq!(read_queries(&device, &readback, 1), vec![15]);
    assert!(device.validation_messages().is_empty());

    unsafe { device.destroy_query_heap(heap) };
    teardown(&device, contexts, vec![arguments, readback]);
}

#[test]
fn predicated_draws_are_skipped() {
    let (device, contexts) = init();
    let mut predicate = buffer(&device, 8, ResourceState::COMMON);
    contexts.initialize_buffer(&mut predicate, &0u64.to_le_bytes());
    let (heap, readback) = occlusion_queries(&device, 2);

    let mut context = contexts.begin("predicated");
    context.set_predication(&mut predicate, 0, PredicationOp::EqualZero);
    {
        let mut graphics = context.graphics();
        graphics.set_primitive_topology(PrimitiveTopology::PointList);
        graphics.begin_query(&heap, 0);
        graphics.draw(5, 0);
        graphics.end_query(&heap, 0);
        graphics.clear_predication();
        graphics.begin_query(&heap, 1);
        graphics.draw(5, 0);
        graphics.end_query(&heap, 1);
    }
    context.resolve_query_data(&heap, 0, 2, &readback, 0);
    context.finish(true);

    assert_eq!(predicate.usage_state(), ResourceState::PREDICATION);
    assert_eq!(read_queries(&device, &readback, 2), vec![0, 5]);
    assert!(device.validation_messages().is_empty());

    unsafe { device.destroy_query_heap(heap) };
    teardown(&device, contexts, vec![predicate, readback]);
}

#[test]
fn draw_without_topology_is_reported() {
    let (device, contexts) = init();
    let mut context = contexts.begin("unconfigured");
    context.graphics().draw(3, 0);
    context.finish(true);

    assert_eq!(
        device.validation_messages(),
        vec!["Draw without primitive topology".to_owned()]
    );
    teardown(&device, contexts, vec![]);
}

#[test]
#[should_panic(expected = "render targets")]
fn too_many_render_targets_panic() {
    let (_device, contexts) = init();
    let rtvs: Vec<MockDescriptor> = (0..9).map(MockDescriptor::rtv).collect();
    let refs: Vec<&MockDescriptor> = rtvs.iter().collect();
    let mut context = contexts.begin("targets");
    context.graphics().set_render_targets(&refs, None);
}

#[test]
#[should_panic(expected = "Closing command list failed")]
fn depth_view_bound_as_render_target_fails_on_close() {
    let (_device, contexts) = init();
    let mut context = contexts.begin("mismatch");
    context
        .graphics()
        .set_render_target(&MockDescriptor::dsv(0), None);
    context.finish(true);
}

#[test]
#[should_panic(expected = "can't use predication")]
fn copy_context_rejects_predication() {
    let (device, contexts) = init();
    let mut predicate = buffer(&device, 8, ResourceState::COMMON);
    let mut context = contexts.begin_copy("copy");
    context.set_predication(&mut predicate, 0, PredicationOp::NotEqualZero);
}
