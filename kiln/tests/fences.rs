use {
    kiln::{command::Config, core::{FenceValue, PerQueue, QueueKind}, Commands},
    kiln_mock::{Mock, MockDevice},
    rand::{rngs::StdRng, Rng, SeedableRng},
    std::sync::Arc,
};

#[test]
fn fence_values_are_monotonic_per_queue() {
    let _ = simple_logger::init_with_level(log::Level::Warn);
    let commands: Commands<Mock> =
        Commands::new(Arc::new(MockDevice::new()), Config::default()).unwrap();
    let mut rng = StdRng::seed_from_u64(0x6b696c6e);
    let mut last = PerQueue::new(FenceValue::initial);
    let mut paused = false;

    for round in 0..200 {
        if rng.gen_bool(0.1) {
            if paused {
                commands.device().resume();
            } else {
                commands.device().pause();
            }
            paused = !paused;
        }

        let kind = QueueKind::ALL[rng.gen_range(0, 3)];
        let wait = !paused && rng.gen_bool(0.3);
        let fence = commands
            .begin(kind, &format!("round {}", round))
            .finish(wait);

        assert_eq!(fence, last[kind].next());
        assert_eq!(commands.manager().queue(kind).next_fence_value(), fence.next());
        if wait {
            assert!(commands.manager().is_fence_complete(fence));
        }
        last[kind] = fence;
    }

    if paused {
        commands.device().resume();
    }
    commands.manager().wait_for_idle_gpu();
    for (kind, &fence) in last.iter() {
        assert!(commands.manager().is_fence_complete(fence));
        assert_eq!(
            commands.manager().queue(kind).last_completed_fence_value(),
            fence
        );
    }
    assert!(commands.device().validation_messages().is_empty());

    let device = commands.dispose();
    assert_eq!(device.live_objects(), 0);
}

#[test]
fn concurrent_submissions_get_distinct_fences() {
    let _ = simple_logger::init_with_level(log::Level::Warn);
    let commands: Arc<Commands<Mock>> = Arc::new(
        Commands::new(Arc::new(MockDevice::new()), Config::default()).unwrap(),
    );

    let workers: Vec<_> = (0..4u64)
        .map(|seed| {
            let commands = commands.clone();
            std::thread::spawn(move || {
                let mut rng = StdRng::seed_from_u64(seed);
                (0..50)
                    .map(|_| {
                        let kind = QueueKind::ALL[rng.gen_range(0, 3)];
                        commands.begin(kind, "worker").finish(rng.gen_bool(0.5))
                    })
                    .collect::<Vec<_>>()
            })
        })
        .collect();

    let mut fences: Vec<FenceValue> = workers
        .into_iter()
        .flat_map(|worker| worker.join().unwrap())
        .collect();
    fences.sort();
    let count = fences.len();
    fences.dedup();
    assert_eq!(fences.len(), count);

    let commands = match Arc::try_unwrap(commands) {
        Ok(commands) => commands,
        Err(_) => panic!("Workers still hold commands"),
    };
    for &kind in QueueKind::ALL.iter() {
        let submitted = fences.iter().filter(|fence| fence.kind() == kind).count() as u64;
        assert_eq!(
            commands.manager().queue(kind).next_fence_value().counter(),
            submitted + 1
        );
    }

    let device = commands.dispose();
    assert_eq!(device.live_objects(), 0);
}
