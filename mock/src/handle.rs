use {
    crate::{device::MockDevice, list::MockCommandList},
    kiln_core::{Backend, DescriptorHeapKind, QueueKind},
};

/// Simulated backend.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Mock {}

impl Backend for Mock {
    type Device = MockDevice;
    type Queue = MockQueue;
    type Fence = MockFence;
    type Event = MockEvent;
    type Allocator = MockAllocator;
    type CommandList = MockCommandList;
    type Resource = MockResource;
    type RootSignature = MockRootSignature;
    type PipelineState = MockPipelineState;
    type DescriptorHeap = MockDescriptorHeap;
    type CpuDescriptor = MockDescriptor;
    type QueryHeap = MockQueryHeap;
}

/// Queue handle.
#[derive(Debug, PartialEq, Eq)]
pub struct MockQueue {
    pub(crate) id: u64,
    pub(crate) kind: QueueKind,
}

impl MockQueue {
    /// Kind of the queue.
    pub fn kind(&self) -> QueueKind {
        self.kind
    }
}

/// Fence handle.
#[derive(Debug, PartialEq, Eq)]
pub struct MockFence {
    pub(crate) id: u64,
}

/// Event handle.
#[derive(Debug, PartialEq, Eq)]
pub struct MockEvent {
    pub(crate) id: u64,
}

/// Command allocator handle.
#[derive(Debug, PartialEq, Eq)]
pub struct MockAllocator {
    pub(crate) id: u64,
    pub(crate) kind: QueueKind,
}

impl MockAllocator {
    /// Unique id of the allocator.
    pub fn id(&self) -> u64 {
        self.id
    }
}

/// Buffer or texture handle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MockResource(pub(crate) u64);

/// Root signature handle. Any value can be used.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MockRootSignature(pub u32);

/// Pipeline state handle. Any value can be used.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MockPipelineState(pub u32);

/// Descriptor heap handle. Any value can be used.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MockDescriptorHeap {
    /// Heap id.
    pub id: u32,
    /// Heap kind.
    pub kind: DescriptorHeapKind,
}

/// CPU descriptor handle. Any value can be used.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MockDescriptor {
    /// Kind of the heap the descriptor lives in.
    pub kind: DescriptorHeapKind,
    /// Index in the heap.
    pub index: u32,
}

impl MockDescriptor {
    /// Render target view at `index`.
    pub fn rtv(index: u32) -> Self {
        MockDescriptor {
            kind: DescriptorHeapKind::Rtv,
            index,
        }
    }

    /// Depth stencil view at `index`.
    pub fn dsv(index: u32) -> Self {
        MockDescriptor {
            kind: DescriptorHeapKind::Dsv,
            index,
        }
    }
}

/// Query heap handle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MockQueryHeap(pub(crate) u64);
