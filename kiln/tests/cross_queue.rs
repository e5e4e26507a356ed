use {
    kiln::{
        command::Config,
        core::{HeapKind, QueueKind, ResourceDesc, ResourceState},
        resource::Resource,
        Commands,
    },
    kiln_mock::{Mock, MockDevice, TimelineEvent},
    std::sync::Arc,
};

fn commands() -> Commands<Mock> {
    let _ = simple_logger::init_with_level(log::Level::Warn);
    Commands::new(Arc::new(MockDevice::new()), Config::default()).unwrap()
}

fn executed_at(timeline: &[TimelineEvent], kind: QueueKind, batch: &str) -> u64 {
    timeline
        .iter()
        .find_map(|event| match event {
            TimelineEvent::Executed {
                tick, queue, name, ..
            } if *queue == kind && name.as_ref().map(String::as_str) == Some(batch) => Some(*tick),
            _ => None,
        })
        .unwrap_or_else(|| panic!("{} was not executed on {:?} queue", batch, kind))
}

fn signaled_at(timeline: &[TimelineEvent], kind: QueueKind, raw: u64) -> u64 {
    timeline
        .iter()
        .find_map(|event| match *event {
            TimelineEvent::Signaled { tick, queue, value } if queue == kind && value == raw => {
                Some(tick)
            }
            _ => None,
        })
        .unwrap_or_else(|| panic!("{:?} queue never signaled {:#x}", kind, raw))
}

#[test]
fn consumer_waits_for_producer_fence() {
    let commands = commands();
    let device = commands.device().clone();
    let mut staging: Resource<Mock> = Resource::create(
        &*device,
        ResourceDesc::buffer(32),
        HeapKind::Default,
        ResourceState::COMMON,
    )
    .unwrap();
    let mut target: Resource<Mock> = Resource::create(
        &*device,
        ResourceDesc::buffer(32),
        HeapKind::Default,
        ResourceState::COMMON,
    )
    .unwrap();

    device.pause();

    let mut copy = commands.begin(QueueKind::Copy, "produce");
    copy.copy_buffer(&mut target, &mut staging);
    copy.transition_resource(&mut target, ResourceState::COMMON, false);
    let produced = copy.finish(false);
    assert!(!commands.manager().is_fence_complete(produced));

    commands
        .manager()
        .stall_for_fence(QueueKind::Graphics, produced);
    let mut graphics = commands.begin(QueueKind::Graphics, "consume");
    graphics.transition_resource(&mut target, ResourceState::PIXEL_SHADER_RESOURCE, false);
    let consumed = graphics.finish(false);

    device.resume();
    commands.manager().wait_for_fence(consumed);
    assert!(commands.manager().is_fence_complete(produced));

    let timeline = device.timeline();
    let signaled = signaled_at(&timeline, QueueKind::Copy, produced.raw());
    assert!(executed_at(&timeline, QueueKind::Graphics, "consume") > signaled);
    assert!(timeline.iter().any(|event| match *event {
        TimelineEvent::Waited { queue, value, .. } =>
            queue == QueueKind::Graphics && value == produced.raw(),
        _ => false,
    }));
    assert!(device.validation_messages().is_empty());

    drop(device);
    let device = commands.dispose();
    unsafe {
        staging.dispose(&*device);
        target.dispose(&*device);
    }
    assert_eq!(device.live_objects(), 0);
}

#[test]
fn stall_for_producer_orders_last_batch() {
    let commands = commands();
    let device = commands.device().clone();
    device.pause();

    let produced = commands.begin(QueueKind::Compute, "simulate").finish(false);
    commands
        .manager()
        .stall_for_producer(QueueKind::Copy, QueueKind::Compute);
    let consumed = commands.begin(QueueKind::Copy, "readback").finish(false);

    device.resume();
    commands.manager().wait_for_idle_gpu();
    assert!(commands.manager().is_fence_complete(consumed));

    let timeline = device.timeline();
    let signaled = signaled_at(&timeline, QueueKind::Compute, produced.raw());
    assert!(executed_at(&timeline, QueueKind::Copy, "readback") > signaled);

    drop(device);
    let device = commands.dispose();
    assert_eq!(device.live_objects(), 0);
}

#[test]
fn stall_for_idle_producer_does_not_block() {
    let commands = commands();
    commands
        .manager()
        .stall_for_producer(QueueKind::Copy, QueueKind::Compute);
    let fence = commands.begin(QueueKind::Copy, "independent").finish(true);
    assert!(commands.manager().is_fence_complete(fence));
    assert_eq!(
        commands.manager().compute_queue().last_completed_fence_value(),
        kiln::core::FenceValue::initial(QueueKind::Compute)
    );

    let device = commands.dispose();
    assert_eq!(device.live_objects(), 0);
}
