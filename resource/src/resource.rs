use kiln_core::{Backend, Device, DeviceError, HeapKind, ResourceDesc, ResourceState};

/// GPU allocation together with its usage state.
///
/// `usage_state` is the state every barrier recorded so far leaves the resource in.
/// `transition_state` is `Some` only while a begin-only split transition is outstanding.
///
/// Must be destroyed with [`dispose`](#method.dispose).
#[derive(derivative::Derivative)]
#[derivative(Debug(bound = ""))]
pub struct Resource<B: Backend> {
    raw: B::Resource,
    desc: ResourceDesc,
    heap: HeapKind,
    usage_state: ResourceState,
    transition_state: Option<ResourceState>,
    gpu_address: u64,
    relevant: relevant::Relevant,
}

impl<B> Resource<B>
where
    B: Backend,
{
    /// Create committed resource.
    ///
    /// # Panics
    ///
    /// Resources in `Upload` heap must start in `GENERIC_READ` state
    /// and resources in `Readback` heap in `COPY_DESTINATION` state.
    pub fn create(
        device: &B::Device,
        desc: ResourceDesc,
        heap: HeapKind,
        initial: ResourceState,
    ) -> Result<Self, DeviceError> {
        match heap {
            HeapKind::Upload => assert_eq!(
                initial,
                ResourceState::GENERIC_READ,
                "Upload heap resources live in GENERIC_READ state"
            ),
            HeapKind::Readback => assert_eq!(
                initial,
                ResourceState::COPY_DESTINATION,
                "Readback heap resources live in COPY_DESTINATION state"
            ),
            HeapKind::Default => assert!(initial.is_valid(), "Invalid initial state {:?}", initial),
        }

        let raw = device.create_resource(&desc, heap, initial)?;
        let gpu_address = device.gpu_address(&raw);
        log::trace!("Created {:?} in {:?} heap as {:?}", desc, heap, raw);
        Ok(Self::from_raw(raw, desc, heap, initial, gpu_address))
    }

    /// Wrap externally created resource.
    /// `initial` is the state the handle was created in.
    pub fn from_raw(
        raw: B::Resource,
        desc: ResourceDesc,
        heap: HeapKind,
        initial: ResourceState,
        gpu_address: u64,
    ) -> Self {
        Resource {
            raw,
            desc,
            heap,
            usage_state: initial,
            transition_state: None,
            gpu_address,
            relevant: relevant::Relevant,
        }
    }

    /// Get raw resource handle.
    pub fn raw(&self) -> &B::Resource {
        &self.raw
    }

    /// Resource description.
    pub fn desc(&self) -> &ResourceDesc {
        &self.desc
    }

    /// Heap the resource lives in.
    pub fn heap(&self) -> HeapKind {
        self.heap
    }

    /// GPU virtual address.
    pub fn gpu_address(&self) -> u64 {
        self.gpu_address
    }

    /// Size of a buffer in bytes. `None` for textures.
    pub fn size(&self) -> Option<u64> {
        match self.desc {
            ResourceDesc::Buffer { size } => Some(size),
            ResourceDesc::Texture { .. } => None,
        }
    }

    /// State after all recorded barriers.
    pub fn usage_state(&self) -> ResourceState {
        self.usage_state
    }

    /// Target of the outstanding split transition.
    pub fn transition_state(&self) -> Option<ResourceState> {
        self.transition_state
    }

    /// # Disclaimer
    ///
    /// This function is designed to use by other kiln crates.
    /// It must be called only together with recording a matching barrier.
    #[doc(hidden)]
    pub fn set_usage_state(&mut self, state: ResourceState) {
        self.usage_state = state;
    }

    /// # Disclaimer
    ///
    /// This function is designed to use by other kiln crates.
    /// It must be called only together with recording a matching split barrier.
    #[doc(hidden)]
    pub fn set_transition_state(&mut self, state: Option<ResourceState>) {
        self.transition_state = state;
    }

    /// Destroy the resource.
    ///
    /// # Safety
    ///
    /// Resource must be created by the `device`
    /// and not be referenced by pending GPU work.
    pub unsafe fn dispose(self, device: &B::Device) {
        self.relevant.dispose();
        device.destroy_resource(self.raw);
    }
}
