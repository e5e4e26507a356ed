use {
    kiln::{
        command::Config,
        core::{HeapKind, ResourceDesc, ResourceState},
        resource::Resource,
        Commands,
    },
    kiln_mock::{Mock, MockDevice},
    std::sync::Arc,
};

fn commands() -> Commands<Mock> {
    let _ = simple_logger::init_with_level(log::Level::Warn);
    Commands::new(Arc::new(MockDevice::new()), Config::default()).unwrap()
}

#[test]
fn initialized_buffer_is_readable_by_gpu() {
    let commands = commands();
    let mut buffer: Resource<Mock> = Resource::create(
        &**commands.device(),
        ResourceDesc::buffer(256),
        HeapKind::Default,
        ResourceState::COMMON,
    )
    .unwrap();
    let data: Vec<u8> = (0..=255).collect();

    let fence = commands.contexts().initialize_buffer(&mut buffer, &data);

    assert!(commands.manager().is_fence_complete(fence));
    assert_eq!(buffer.usage_state(), ResourceState::GENERIC_READ);
    assert_eq!(buffer.transition_state(), None);
    assert_eq!(commands.device().read_buffer(buffer.raw()), data);
    assert_eq!(
        commands.device().gpu_state(buffer.raw()),
        ResourceState::GENERIC_READ
    );

    let fence = commands
        .contexts()
        .initialize_buffer_region(&mut buffer, 16, &[7; 4]);
    assert!(commands.manager().is_fence_complete(fence));
    let content = commands.device().read_buffer(buffer.raw());
    assert_eq!(&content[12..24], &[12, 13, 14, 15, 7, 7, 7, 7, 20, 21, 22, 23]);
    assert!(commands.device().validation_messages().is_empty());

    let device = commands.dispose();
    unsafe { buffer.dispose(&*device) };
    assert_eq!(device.live_objects(), 0);
}

#[test]
fn staging_buffers_are_released() {
    let commands = commands();
    let mut buffer: Resource<Mock> = Resource::create(
        &**commands.device(),
        ResourceDesc::buffer(64),
        HeapKind::Default,
        ResourceState::COMMON,
    )
    .unwrap();

    for round in 0..4u8 {
        commands
            .contexts()
            .initialize_buffer(&mut buffer, &[round; 64]);
    }
    assert_eq!(commands.device().read_buffer(buffer.raw()), vec![3; 64]);
    assert_eq!(commands.contexts().created(kiln::core::QueueKind::Graphics), 1);

    let device = commands.dispose();
    unsafe { buffer.dispose(&*device) };
    assert_eq!(device.live_objects(), 0);
}
