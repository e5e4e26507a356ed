use {
    crate::{
        handle::*,
        list::MockCommandList,
        timeline::{
            self, mip_extent, Batch, EventSlot, Op, QuerySlot, QueueSlot, ResourceSlot, Shared,
            State,
        },
        TimelineEvent,
    },
    kiln_core::{
        Barrier, Device, DeviceError, HeapKind, PlacedFootprint, QueryKind, QueueKind,
        QueuePriority, ResourceDesc, ResourceState,
    },
    parking_lot::MutexGuard,
    std::{sync::Arc, thread::JoinHandle},
};

/// Row pitch alignment of linear texture data.
pub const TEXTURE_DATA_PITCH_ALIGNMENT: u64 = 256;

/// Placement alignment of subresources in linear texture data.
pub const TEXTURE_DATA_PLACEMENT_ALIGNMENT: u64 = 512;

fn align(value: u64, alignment: u64) -> u64 {
    (value + alignment - 1) / alignment * alignment
}

/// Simulated device.
///
/// Dropping the device stops the worker thread. Work still queued is abandoned.
#[derive(Debug)]
pub struct MockDevice {
    shared: Arc<Shared>,
    worker: Option<JoinHandle<()>>,
}

impl Default for MockDevice {
    fn default() -> Self {
        MockDevice::new()
    }
}

impl MockDevice {
    /// Create device and start its timeline.
    pub fn new() -> Self {
        let shared = Arc::new(Shared::default());
        let worker = {
            let shared = shared.clone();
            std::thread::Builder::new()
                .name("kiln-mock-gpu".to_owned())
                .spawn(move || timeline::run(&shared))
                .ok()
        };
        assert!(worker.is_some(), "Failed to spawn simulated GPU thread");
        log::debug!("Simulated device created");
        MockDevice { shared, worker }
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.shared.state.lock()
    }

    fn changed(&self) {
        self.shared.changed.notify_all();
    }

    /// Stop executing submitted work. Everything submitted stays in flight.
    pub fn pause(&self) {
        self.state().paused = true;
    }

    /// Continue executing submitted work.
    pub fn resume(&self) {
        self.state().paused = false;
        self.changed();
    }

    /// Make the next `wait_event` call fail.
    pub fn fail_next_wait(&self) {
        self.state().fail_next_wait = true;
    }

    /// Make the next `create_queue` call fail.
    pub fn fail_next_queue_creation(&self) {
        self.state().fail_next_queue = true;
    }

    /// Content of a buffer as the device sees it.
    pub fn read_buffer(&self, resource: &MockResource) -> Vec<u8> {
        self.read_subresource(resource, 0)
    }

    /// Tightly packed content of a subresource as the device sees it.
    pub fn read_subresource(&self, resource: &MockResource, index: u32) -> Vec<u8> {
        let state = self.state();
        state
            .resources
            .get(&resource.0)
            .and_then(|slot| slot.subresources.get(index as usize))
            .cloned()
            .unwrap_or_else(|| panic!("{:?}[{}] doesn't exist", resource, index))
    }

    /// State the executed barriers left the resource in.
    pub fn gpu_state(&self, resource: &MockResource) -> ResourceState {
        match self.state().resources.get(&resource.0) {
            Some(slot) => slot.state,
            None => panic!("{:?} doesn't exist", resource),
        }
    }

    /// Barrier and copy mismatches found during execution.
    pub fn validation_messages(&self) -> Vec<String> {
        self.state().validation.clone()
    }

    /// Execution log.
    pub fn timeline(&self) -> Vec<TimelineEvent> {
        self.state().timeline.clone()
    }

    /// All barriers executed so far, in execution order.
    pub fn executed_barriers(&self) -> Vec<Barrier<MockResource>> {
        self.state()
            .timeline
            .iter()
            .filter_map(|event| match event {
                TimelineEvent::Executed { commands, .. } => Some(commands),
                _ => None,
            })
            .flatten()
            .filter_map(|command| match command {
                crate::Command::Barriers(barriers) => Some(barriers.iter().cloned()),
                _ => None,
            })
            .flatten()
            .collect()
    }

    /// Number of operations queued but not yet executed.
    pub fn pending_operations(&self) -> usize {
        self.state().queues.values().map(|queue| queue.ops.len()).sum()
    }

    /// Number of device objects created and not yet destroyed.
    pub fn live_objects(&self) -> usize {
        let state = self.state();
        state.queues.len()
            + state.fences.len()
            + state.events.len()
            + state.allocators.len()
            + state.lists.len()
            + state.resources.len()
            + state.query_heaps.len()
    }

    fn enqueue(&self, queue: &MockQueue, op: Op) -> Result<(), DeviceError> {
        let mut state = self.state();
        match state.queues.get_mut(&queue.id) {
            Some(slot) => slot.ops.push_back(op),
            None => return Err(DeviceError::DeviceLost),
        }
        drop(state);
        self.changed();
        Ok(())
    }
}

impl Drop for MockDevice {
    fn drop(&mut self) {
        self.state().shutdown = true;
        self.changed();
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                log::error!("Simulated GPU thread panicked");
            }
        }
    }
}

impl Device<Mock> for MockDevice {
    fn create_queue(
        &self,
        kind: QueueKind,
        priority: QueuePriority,
    ) -> Result<MockQueue, DeviceError> {
        let mut state = self.state();
        if state.fail_next_queue {
            state.fail_next_queue = false;
            return Err(DeviceError::OutOfMemory);
        }
        let id = state.allocate_id();
        state.queues.insert(
            id,
            QueueSlot {
                kind,
                ops: Default::default(),
            },
        );
        log::debug!("Created {:?} queue {} with {:?} priority", kind, id, priority);
        Ok(MockQueue { id, kind })
    }

    fn create_fence(&self, initial: u64) -> Result<MockFence, DeviceError> {
        let mut state = self.state();
        let id = state.allocate_id();
        state.fences.insert(id, initial);
        Ok(MockFence { id })
    }

    fn create_event(&self) -> Result<MockEvent, DeviceError> {
        let mut state = self.state();
        let id = state.allocate_id();
        state.events.insert(id, EventSlot::default());
        Ok(MockEvent { id })
    }

    fn create_allocator(&self, kind: QueueKind) -> Result<MockAllocator, DeviceError> {
        let mut state = self.state();
        let id = state.allocate_id();
        state.allocators.insert(id, timeline::AllocatorSlot { kind, in_flight: 0 });
        Ok(MockAllocator { id, kind })
    }

    fn create_command_list(
        &self,
        kind: QueueKind,
        allocator: &MockAllocator,
    ) -> Result<MockCommandList, DeviceError> {
        if allocator.kind != kind {
            return Err(DeviceError::Validation(format!(
                "{:?} list can't use {:?} allocator",
                kind, allocator.kind
            )));
        }
        let mut state = self.state();
        let id = state.allocate_id();
        state.lists.insert(id);
        Ok(MockCommandList::new(id, kind, allocator.id))
    }

    fn create_resource(
        &self,
        desc: &ResourceDesc,
        heap: HeapKind,
        initial: ResourceState,
    ) -> Result<MockResource, DeviceError> {
        let mut state = self.state();
        let id = state.allocate_id();
        state
            .resources
            .insert(id, ResourceSlot::new(*desc, heap, initial));
        Ok(MockResource(id))
    }

    fn gpu_address(&self, resource: &MockResource) -> u64 {
        match self.state().resources.get(&resource.0) {
            Some(slot) if slot.desc.is_buffer() => resource.0 << 32,
            _ => 0,
        }
    }

    fn write_resource(
        &self,
        resource: &MockResource,
        offset: u64,
        data: &[u8],
    ) -> Result<(), DeviceError> {
        let mut state = self.state();
        let slot = state
            .resources
            .get_mut(&resource.0)
            .ok_or(DeviceError::DeviceLost)?;
        if slot.heap != HeapKind::Upload {
            return Err(DeviceError::Validation(format!(
                "{:?} in {:?} heap is not writable by host",
                resource, slot.heap
            )));
        }
        let offset = offset as usize;
        match slot.subresources[0].get_mut(offset..offset + data.len()) {
            Some(target) => {
                target.copy_from_slice(data);
                Ok(())
            }
            None => Err(DeviceError::Validation(format!(
                "Host write of {} bytes at {} overflows {:?}",
                data.len(),
                offset,
                resource
            ))),
        }
    }

    fn read_resource(
        &self,
        resource: &MockResource,
        offset: u64,
        data: &mut [u8],
    ) -> Result<(), DeviceError> {
        let state = self.state();
        let slot = state
            .resources
            .get(&resource.0)
            .ok_or(DeviceError::DeviceLost)?;
        if slot.heap == HeapKind::Default {
            return Err(DeviceError::Validation(format!(
                "{:?} in default heap is not readable by host",
                resource
            )));
        }
        let offset = offset as usize;
        match slot.subresources[0].get(offset..offset + data.len()) {
            Some(source) => {
                data.copy_from_slice(source);
                Ok(())
            }
            None => Err(DeviceError::Validation(format!(
                "Host read of {} bytes at {} overflows {:?}",
                data.len(),
                offset,
                resource
            ))),
        }
    }

    fn copyable_footprints(
        &self,
        desc: &ResourceDesc,
        first: u32,
        count: u32,
    ) -> (Vec<PlacedFootprint>, u64) {
        match *desc {
            ResourceDesc::Buffer { size } => (
                vec![PlacedFootprint {
                    offset: 0,
                    width: size as u32,
                    height: 1,
                    depth: 1,
                    row_pitch: align(size, TEXTURE_DATA_PITCH_ALIGNMENT) as u32,
                    rows: 1,
                    row_size: size,
                }],
                size,
            ),
            ResourceDesc::Texture {
                width,
                height,
                mip_levels,
                texel_size,
                ..
            } => {
                let mut offset = 0;
                let mut total = 0;
                let footprints = (first..first + count)
                    .map(|index| {
                        let (w, h) = mip_extent(width, height, index % u32::from(mip_levels));
                        let row_size = u64::from(w) * u64::from(texel_size);
                        let row_pitch = align(row_size, TEXTURE_DATA_PITCH_ALIGNMENT);
                        offset = align(offset, TEXTURE_DATA_PLACEMENT_ALIGNMENT);
                        let footprint = PlacedFootprint {
                            offset,
                            width: w,
                            height: h,
                            depth: 1,
                            row_pitch: row_pitch as u32,
                            rows: h,
                            row_size,
                        };
                        total = offset + row_pitch * u64::from(h - 1) + row_size;
                        offset += row_pitch * u64::from(h);
                        footprint
                    })
                    .collect();
                (footprints, total)
            }
        }
    }

    fn create_query_heap(&self, kind: QueryKind, count: u32) -> Result<MockQueryHeap, DeviceError> {
        let mut state = self.state();
        let id = state.allocate_id();
        state.query_heaps.insert(
            id,
            QuerySlot {
                kind,
                values: vec![0; count as usize],
            },
        );
        Ok(MockQueryHeap(id))
    }

    fn submit(&self, queue: &mut MockQueue, list: &MockCommandList) -> Result<(), DeviceError> {
        if list.open {
            return Err(DeviceError::Validation(format!(
                "List {} is submitted while open",
                list.id
            )));
        }
        if list.kind != queue.kind {
            return Err(DeviceError::Validation(format!(
                "{:?} list is submitted to {:?} queue",
                list.kind, queue.kind
            )));
        }
        {
            let mut state = self.state();
            match state.allocators.get_mut(&list.allocator) {
                Some(allocator) => allocator.in_flight += 1,
                None => {
                    return Err(DeviceError::Validation(format!(
                        "List {} uses destroyed allocator",
                        list.id
                    )))
                }
            }
        }
        self.enqueue(
            queue,
            Op::Execute(Batch {
                allocator: list.allocator,
                name: list.name.clone(),
                commands: list.commands.clone(),
            }),
        )
    }

    fn signal(&self, queue: &mut MockQueue, fence: &MockFence, value: u64) -> Result<(), DeviceError> {
        self.enqueue(
            queue,
            Op::Signal {
                fence: fence.id,
                value,
            },
        )
    }

    fn queue_wait(
        &self,
        queue: &mut MockQueue,
        fence: &MockFence,
        value: u64,
    ) -> Result<(), DeviceError> {
        self.enqueue(
            queue,
            Op::Wait {
                fence: fence.id,
                value,
            },
        )
    }

    fn fence_completed_value(&self, fence: &MockFence) -> u64 {
        self.state().fences.get(&fence.id).cloned().unwrap_or(0)
    }

    fn set_event_on_completion(
        &self,
        fence: &MockFence,
        value: u64,
        event: &MockEvent,
    ) -> Result<(), DeviceError> {
        let mut state = self.state();
        let reached = state.fences.get(&fence.id).map_or(false, |&v| v >= value);
        let slot = state
            .events
            .get_mut(&event.id)
            .ok_or(DeviceError::DeviceLost)?;
        if reached {
            slot.armed = None;
            slot.signaled = true;
        } else {
            slot.armed = Some((fence.id, value));
        }
        Ok(())
    }

    fn wait_event(&self, event: &MockEvent) -> Result<(), DeviceError> {
        let mut state = self.state();
        loop {
            if state.fail_next_wait {
                state.fail_next_wait = false;
                return Err(DeviceError::Validation("Injected wait failure".to_owned()));
            }
            if state.shutdown {
                return Err(DeviceError::DeviceLost);
            }
            let slot = state
                .events
                .get_mut(&event.id)
                .ok_or(DeviceError::DeviceLost)?;
            if slot.signaled {
                slot.signaled = false;
                return Ok(());
            }
            if slot.armed.is_none() {
                return Err(DeviceError::Validation(format!(
                    "Waiting on {:?} that is not armed",
                    event
                )));
            }
            self.shared.changed.wait(&mut state);
        }
    }

    unsafe fn reset_allocator(&self, allocator: &mut MockAllocator) -> Result<(), DeviceError> {
        let state = self.state();
        match state.allocators.get(&allocator.id) {
            Some(slot) if slot.in_flight > 0 => Err(DeviceError::Validation(format!(
                "Allocator {} is reset while {} of its batches are in flight",
                allocator.id, slot.in_flight
            ))),
            Some(_) => Ok(()),
            None => Err(DeviceError::DeviceLost),
        }
    }

    unsafe fn destroy_queue(&self, queue: MockQueue) {
        let slot = self.state().queues.remove(&queue.id);
        match slot {
            Some(slot) => assert!(
                slot.ops.is_empty(),
                "{:?} queue is destroyed with {} pending operations",
                slot.kind,
                slot.ops.len()
            ),
            None => panic!("{:?} is destroyed twice", queue),
        }
    }

    unsafe fn destroy_fence(&self, fence: MockFence) {
        assert!(
            self.state().fences.remove(&fence.id).is_some(),
            "{:?} is destroyed twice",
            fence
        );
    }

    unsafe fn destroy_event(&self, event: MockEvent) {
        assert!(
            self.state().events.remove(&event.id).is_some(),
            "{:?} is destroyed twice",
            event
        );
    }

    unsafe fn destroy_allocator(&self, allocator: MockAllocator) {
        let slot = self.state().allocators.remove(&allocator.id);
        match slot {
            Some(slot) => assert_eq!(
                slot.in_flight, 0,
                "Allocator {} is destroyed while in flight",
                allocator.id
            ),
            None => panic!("{:?} is destroyed twice", allocator),
        }
    }

    unsafe fn destroy_command_list(&self, list: MockCommandList) {
        assert!(
            self.state().lists.remove(&list.id),
            "List {} is destroyed twice",
            list.id
        );
    }

    unsafe fn destroy_resource(&self, resource: MockResource) {
        assert!(
            self.state().resources.remove(&resource.0).is_some(),
            "{:?} is destroyed twice",
            resource
        );
    }

    unsafe fn destroy_query_heap(&self, heap: MockQueryHeap) {
        assert!(
            self.state().query_heaps.remove(&heap.0).is_some(),
            "{:?} is destroyed twice",
            heap
        );
    }
}
