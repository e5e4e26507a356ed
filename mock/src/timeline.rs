//! Simulated GPU timeline.

use {
    crate::{handle::*, list::Command},
    kiln_core::{
        Barrier, BarrierSplit, DrawArguments, HeapKind, PlacedFootprint, PredicationOp,
        PrimitiveTopology, QueryKind, QueueKind, ResourceDesc, ResourceState,
    },
    parking_lot::{Condvar, Mutex},
    std::collections::{BTreeMap, HashMap, HashSet, VecDeque},
};

/// Event in the execution log of the simulated device.
#[derive(Clone, Debug, PartialEq)]
pub enum TimelineEvent {
    /// Batch finished execution.
    Executed {
        /// Logical timestamp.
        tick: u64,
        /// Queue kind that executed the batch.
        queue: QueueKind,
        /// Debug name of the list.
        name: Option<String>,
        /// Executed commands.
        commands: Vec<Command>,
    },

    /// Queue signaled a fence.
    Signaled {
        /// Logical timestamp.
        tick: u64,
        /// Queue kind that signaled.
        queue: QueueKind,
        /// Signaled value.
        value: u64,
    },

    /// Queue passed a GPU-side wait.
    Waited {
        /// Logical timestamp.
        tick: u64,
        /// Queue kind that waited.
        queue: QueueKind,
        /// Awaited value.
        value: u64,
    },
}

impl TimelineEvent {
    /// Logical timestamp of the event.
    pub fn tick(&self) -> u64 {
        match *self {
            TimelineEvent::Executed { tick, .. }
            | TimelineEvent::Signaled { tick, .. }
            | TimelineEvent::Waited { tick, .. } => tick,
        }
    }

    /// Queue kind of the event.
    pub fn queue(&self) -> QueueKind {
        match *self {
            TimelineEvent::Executed { queue, .. }
            | TimelineEvent::Signaled { queue, .. }
            | TimelineEvent::Waited { queue, .. } => queue,
        }
    }
}

#[derive(Debug)]
pub(crate) struct Batch {
    pub allocator: u64,
    pub name: Option<String>,
    pub commands: Vec<Command>,
}

#[derive(Debug)]
pub(crate) enum Op {
    Execute(Batch),
    Signal { fence: u64, value: u64 },
    Wait { fence: u64, value: u64 },
}

#[derive(Debug)]
pub(crate) struct QueueSlot {
    pub kind: QueueKind,
    pub ops: VecDeque<Op>,
}

#[derive(Debug, Default)]
pub(crate) struct EventSlot {
    pub armed: Option<(u64, u64)>,
    pub signaled: bool,
}

#[derive(Debug)]
pub(crate) struct AllocatorSlot {
    pub kind: QueueKind,
    pub in_flight: usize,
}

#[derive(Debug)]
pub(crate) struct ResourceSlot {
    pub desc: ResourceDesc,
    pub heap: HeapKind,
    pub state: ResourceState,
    pub split: Option<ResourceState>,
    pub subresources: Vec<Vec<u8>>,
}

impl ResourceSlot {
    pub fn new(desc: ResourceDesc, heap: HeapKind, state: ResourceState) -> Self {
        let subresources = match desc {
            ResourceDesc::Buffer { size } => vec![vec![0; size as usize]],
            ResourceDesc::Texture {
                width,
                height,
                mip_levels,
                texel_size,
                ..
            } => (0..desc.subresource_count())
                .map(|index| {
                    let (w, h) = mip_extent(width, height, index % u32::from(mip_levels));
                    vec![0; (w * h * texel_size) as usize]
                })
                .collect(),
        };

        ResourceSlot {
            desc,
            heap,
            state,
            split: None,
            subresources,
        }
    }
}

#[derive(Debug)]
pub(crate) struct QuerySlot {
    pub kind: QueryKind,
    pub values: Vec<u64>,
}

/// Pipeline state set by the batch being executed.
/// Command lists start with nothing bound.
#[derive(Debug, Default)]
pub(crate) struct PassState {
    pub topology: Option<PrimitiveTopology>,
    pub index_buffer: bool,
    pub predicate: Option<(MockResource, u64, PredicationOp)>,
    pub occlusion: Vec<(u64, u32)>,
}

/// Extent of a mip level.
pub(crate) fn mip_extent(width: u32, height: u32, level: u32) -> (u32, u32) {
    ((width >> level).max(1), (height >> level).max(1))
}

#[derive(Debug, Default)]
pub(crate) struct State {
    pub next_id: u64,
    pub tick: u64,
    pub paused: bool,
    pub shutdown: bool,
    pub fail_next_wait: bool,
    pub fail_next_queue: bool,
    pub queues: BTreeMap<u64, QueueSlot>,
    pub fences: HashMap<u64, u64>,
    pub events: HashMap<u64, EventSlot>,
    pub allocators: HashMap<u64, AllocatorSlot>,
    pub lists: HashSet<u64>,
    pub resources: HashMap<u64, ResourceSlot>,
    pub query_heaps: HashMap<u64, QuerySlot>,
    pub pass: PassState,
    pub timeline: Vec<TimelineEvent>,
    pub validation: Vec<String>,
}

#[derive(Debug, Default)]
pub(crate) struct Shared {
    pub state: Mutex<State>,
    pub changed: Condvar,
}

/// Body of the worker thread.
pub(crate) fn run(shared: &Shared) {
    let mut state = shared.state.lock();
    loop {
        if state.shutdown {
            break;
        }
        if !state.paused && state.advance() {
            shared.changed.notify_all();
        } else {
            shared.changed.wait(&mut state);
        }
    }
    log::debug!("Simulated GPU timeline stopped");
}

impl State {
    pub fn allocate_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    /// Signal fence from the host or a queue and fire armed events.
    pub fn set_fence(&mut self, fence: u64, value: u64) {
        self.fences.insert(fence, value);
        for event in self.events.values_mut() {
            match event.armed {
                Some((armed_fence, armed_value)) if armed_fence == fence && armed_value <= value => {
                    event.armed = None;
                    event.signaled = true;
                }
                _ => {}
            }
        }
    }

    fn validation(&mut self, message: String) {
        log::warn!("GPU validation: {}", message);
        self.validation.push(message);
    }

    /// Execute one ready operation of every queue.
    fn advance(&mut self) -> bool {
        let ids: Vec<u64> = self.queues.keys().cloned().collect();
        let mut progressed = false;
        for id in ids {
            progressed |= self.step(id);
        }
        progressed
    }

    fn step(&mut self, id: u64) -> bool {
        let fences = &self.fences;
        let queue = match self.queues.get_mut(&id) {
            Some(queue) => queue,
            None => return false,
        };
        let ready = match queue.ops.front() {
            None => false,
            Some(Op::Wait { fence, value }) => fences.get(fence).map_or(false, |v| v >= value),
            Some(_) => true,
        };
        if !ready {
            return false;
        }
        let kind = queue.kind;
        let op = match queue.ops.pop_front() {
            Some(op) => op,
            None => return false,
        };

        self.tick += 1;
        let tick = self.tick;
        match op {
            Op::Execute(batch) => {
                log::trace!("{:?} queue executes {:?} at {}", kind, batch.name, tick);
                self.pass = PassState::default();
                for command in &batch.commands {
                    self.execute(command);
                }
                if !self.pass.occlusion.is_empty() {
                    let message = format!(
                        "Batch {:?} ends with occlusion queries {:?} running",
                        batch.name, self.pass.occlusion
                    );
                    self.validation(message);
                }
                if let Some(allocator) = self.allocators.get_mut(&batch.allocator) {
                    allocator.in_flight -= 1;
                }
                self.timeline.push(TimelineEvent::Executed {
                    tick,
                    queue: kind,
                    name: batch.name,
                    commands: batch.commands,
                });
            }
            Op::Signal { fence, value } => {
                self.set_fence(fence, value);
                self.timeline.push(TimelineEvent::Signaled {
                    tick,
                    queue: kind,
                    value,
                });
            }
            Op::Wait { value, .. } => {
                self.timeline.push(TimelineEvent::Waited {
                    tick,
                    queue: kind,
                    value,
                });
            }
        }
        true
    }

    fn execute(&mut self, command: &Command) {
        let error = match *command {
            Command::Barriers(ref barriers) => {
                for barrier in barriers {
                    self.barrier(barrier);
                }
                None
            }
            Command::CopyResource { dst, src } if self.check_copy(dst, src) => {
                let data = self.resources[&src.0].subresources.clone();
                let slot = self.resource_mut(dst);
                if slot.subresources.len() == data.len() {
                    slot.subresources = data;
                    None
                } else {
                    Some(format!("{:?} and {:?} don't match", dst, src))
                }
            }
            Command::CopyBufferRegion {
                dst,
                dst_offset,
                src,
                src_offset,
                size,
            } if self.check_copy(dst, src) => {
                let (from, to, len) = (src_offset as usize, dst_offset as usize, size as usize);
                let data = self.resources[&src.0].subresources[0]
                    .get(from..from + len)
                    .map(<[u8]>::to_vec);
                let copied = match (data, self.resource_mut(dst).subresources[0].get_mut(to..to + len)) {
                    (Some(data), Some(target)) => {
                        target.copy_from_slice(&data);
                        true
                    }
                    _ => false,
                };
                if copied {
                    None
                } else {
                    Some(format!(
                        "Copy of {} bytes from {:?}+{} to {:?}+{} is out of bounds",
                        size, src, src_offset, dst, dst_offset
                    ))
                }
            }
            Command::CopyTextureRegion {
                dst,
                dst_subresource,
                src,
                src_subresource,
            } if self.check_copy(dst, src) => {
                let data = self.resources[&src.0]
                    .subresources
                    .get(src_subresource as usize)
                    .cloned();
                let copied = match (data, self.resource_mut(dst).subresources.get_mut(dst_subresource as usize)) {
                    (Some(data), Some(target)) if data.len() == target.len() => {
                        *target = data;
                        true
                    }
                    _ => false,
                };
                if copied {
                    None
                } else {
                    Some(format!(
                        "Subresource copy {:?}[{}] -> {:?}[{}] is invalid",
                        src, src_subresource, dst, dst_subresource
                    ))
                }
            }
            Command::CopyBufferToTexture {
                dst,
                dst_subresource,
                src,
                footprint,
            } if self.check_copy(dst, src) => {
                self.copy_rows(dst, dst_subresource, src, &footprint).err()
            }
            Command::SetPrimitiveTopology(topology) => {
                self.pass.topology = Some(topology);
                None
            }
            Command::SetIndexBuffer(_) => {
                self.pass.index_buffer = true;
                None
            }
            Command::SetPredication { buffer: None, .. } => {
                self.pass.predicate = None;
                None
            }
            Command::SetPredication {
                buffer: Some(buffer),
                offset,
                op,
            } => {
                let state = self.resource_mut(buffer).state;
                self.pass.predicate = Some((buffer, offset, op));
                if state.contains(ResourceState::PREDICATION) {
                    None
                } else {
                    Some(format!("Predicate {:?} is in {:?}", buffer, state))
                }
            }
            Command::Draw {
                vertices,
                instances,
                ..
            } => self.draw(u64::from(vertices) * u64::from(instances), false),
            Command::DrawIndexed {
                indices, instances, ..
            } => self.draw(u64::from(indices) * u64::from(instances), true),
            Command::DrawIndirect { arguments, offset } => {
                let slot = self.resource_mut(arguments);
                let state = slot.state;
                let read = slot.subresources[0]
                    .get(offset as usize..)
                    .and_then(DrawArguments::from_bytes);
                match read {
                    _ if !state.contains(ResourceState::INDIRECT_ARGUMENT) => Some(format!(
                        "Indirect arguments {:?} are in {:?}",
                        arguments, state
                    )),
                    Some(args) => {
                        self.draw(u64::from(args.vertices) * u64::from(args.instances), false)
                    }
                    None => Some(format!(
                        "Indirect arguments at {:?}+{} are out of bounds",
                        arguments, offset
                    )),
                }
            }
            Command::BeginQuery { heap, index } => {
                let query = self
                    .query_heaps
                    .get_mut(&heap.0)
                    .and_then(|slot| match slot.kind {
                        QueryKind::Occlusion => slot.values.get_mut(index as usize),
                        QueryKind::Timestamp => None,
                    });
                match query {
                    Some(value) => {
                        *value = 0;
                        self.pass.occlusion.push((heap.0, index));
                        None
                    }
                    None => Some(format!(
                        "Query {} of {:?} is not an occlusion query",
                        index, heap
                    )),
                }
            }
            Command::EndQuery { heap, index } => self.end_query(heap, index),
            Command::ResolveQueryData {
                heap,
                first,
                count,
                dst,
                dst_offset,
            } => {
                let bytes: Option<Vec<u8>> = self
                    .query_heaps
                    .get(&heap.0)
                    .and_then(|slot| slot.values.get(first as usize..(first + count) as usize))
                    .map(|values| values.iter().flat_map(|v| v.to_le_bytes().to_vec()).collect());
                let offset = dst_offset as usize;
                let resolved = match bytes {
                    Some(bytes) => self.resource_mut(dst).subresources[0]
                        .get_mut(offset..offset + bytes.len())
                        .map(|target| target.copy_from_slice(&bytes))
                        .is_some(),
                    None => false,
                };
                if resolved {
                    None
                } else {
                    Some(format!(
                        "Resolving queries {}..{} of {:?} into {:?}+{} is invalid",
                        first,
                        first + count,
                        heap,
                        dst,
                        dst_offset
                    ))
                }
            }
            _ => None,
        };

        if let Some(message) = error {
            self.validation(message);
        }
    }

    /// Check if predication currently skips commands.
    fn predicated(&mut self) -> bool {
        match self.pass.predicate {
            Some((buffer, offset, op)) => {
                let offset = offset as usize;
                let value = self.resource_mut(buffer).subresources[0]
                    .get(offset..offset + 8)
                    .map(|bytes| {
                        let mut raw = [0; 8];
                        raw.copy_from_slice(bytes);
                        u64::from_le_bytes(raw)
                    });
                match value {
                    Some(value) => op.skips(value),
                    None => {
                        self.validation(format!(
                            "Predicate {:?}+{} is out of bounds",
                            buffer, offset
                        ));
                        false
                    }
                }
            }
            None => false,
        }
    }

    /// Rasterize `vertices` vertices. Every running occlusion query counts them as samples.
    fn draw(&mut self, vertices: u64, indexed: bool) -> Option<String> {
        if self.predicated() {
            return None;
        }
        if self.pass.topology.is_none() {
            return Some("Draw without primitive topology".to_owned());
        }
        if indexed && !self.pass.index_buffer {
            return Some("Indexed draw without index buffer".to_owned());
        }
        for &(heap, index) in &self.pass.occlusion {
            if let Some(value) = self
                .query_heaps
                .get_mut(&heap)
                .and_then(|slot| slot.values.get_mut(index as usize))
            {
                *value += vertices;
            }
        }
        None
    }

    fn end_query(&mut self, heap: MockQueryHeap, index: u32) -> Option<String> {
        let tick = self.tick;
        let kind = match self.query_heaps.get_mut(&heap.0) {
            Some(slot) if (index as usize) < slot.values.len() => slot.kind,
            _ => return Some(format!("Query {} of {:?} doesn't exist", index, heap)),
        };
        match kind {
            QueryKind::Timestamp => {
                if let Some(slot) = self.query_heaps.get_mut(&heap.0) {
                    slot.values[index as usize] = tick;
                }
                None
            }
            QueryKind::Occlusion => {
                let running = &mut self.pass.occlusion;
                match running.iter().position(|&query| query == (heap.0, index)) {
                    Some(position) => {
                        running.remove(position);
                        None
                    }
                    None => Some(format!(
                        "Query {} of {:?} is ended without begin",
                        index, heap
                    )),
                }
            }
        }
    }

    fn resource_mut(&mut self, resource: MockResource) -> &mut ResourceSlot {
        match self.resources.get_mut(&resource.0) {
            Some(slot) => slot,
            None => panic!("{:?} is used after destruction", resource),
        }
    }

    fn barrier(&mut self, barrier: &Barrier<MockResource>) {
        let (resource, before, after, split) = match *barrier {
            Barrier::Transition {
                resource,
                before,
                after,
                split,
            } => (resource, before, after, split),
            _ => return,
        };

        let slot = self.resource_mut(resource);
        let message = match split {
            BarrierSplit::None | BarrierSplit::BeginOnly if slot.split.is_some() => Some(format!(
                "{:?} is transitioned while split transition to {:?} is pending",
                resource, slot.split
            )),
            BarrierSplit::None | BarrierSplit::BeginOnly if slot.state != before => Some(format!(
                "{:?} barrier expects {:?} but resource is in {:?}",
                resource, before, slot.state
            )),
            BarrierSplit::None => {
                slot.state = after;
                None
            }
            BarrierSplit::BeginOnly => {
                slot.split = Some(after);
                None
            }
            BarrierSplit::EndOnly if slot.split != Some(after) => Some(format!(
                "{:?} ends split transition to {:?} that was not begun",
                resource, after
            )),
            BarrierSplit::EndOnly => {
                slot.split = None;
                slot.state = after;
                None
            }
        };

        if let Some(message) = message {
            self.validation(message);
            // Keep tracking from the state the barrier declares.
            let slot = self.resource_mut(resource);
            slot.split = None;
            slot.state = after;
        }
    }

    fn check_copy(&mut self, dst: MockResource, src: MockResource) -> bool {
        let src_state = self.resource_mut(src).state;
        let dst_state = self.resource_mut(dst).state;
        let mut valid = true;
        if src_state != ResourceState::COMMON && !src_state.contains(ResourceState::COPY_SOURCE) {
            self.validation(format!("Copy source {:?} is in {:?}", src, src_state));
            valid = false;
        }
        if dst_state != ResourceState::COMMON && dst_state != ResourceState::COPY_DESTINATION {
            self.validation(format!("Copy destination {:?} is in {:?}", dst, dst_state));
            valid = false;
        }
        valid
    }

    fn copy_rows(
        &mut self,
        dst: MockResource,
        dst_subresource: u32,
        src: MockResource,
        footprint: &PlacedFootprint,
    ) -> Result<(), String> {
        let row_size = footprint.row_size as usize;
        let rows = (footprint.rows * footprint.depth) as usize;
        let source = &self.resources[&src.0].subresources[0];
        let mut data = Vec::with_capacity(row_size * rows);
        for row in 0..rows {
            let start = footprint.offset as usize + row * footprint.row_pitch as usize;
            match source.get(start..start + row_size) {
                Some(bytes) => data.extend_from_slice(bytes),
                None => return Err(format!("Row {} of {:?} is out of bounds", row, src)),
            }
        }

        match self
            .resource_mut(dst)
            .subresources
            .get_mut(dst_subresource as usize)
        {
            Some(target) if target.len() == data.len() => {
                *target = data;
                Ok(())
            }
            _ => Err(format!(
                "Footprint {:?} doesn't match {:?}[{}]",
                footprint, dst, dst_subresource
            )),
        }
    }
}
