use {
    crate::resource::Resource,
    kiln_core::{Backend, Device, DeviceError, HeapKind, ResourceDesc, ResourceState},
};

/// Host visible staging buffer in the upload heap.
#[derive(derivative::Derivative)]
#[derivative(Debug(bound = ""))]
pub struct UploadBuffer<B: Backend> {
    resource: Resource<B>,
}

impl<B> UploadBuffer<B>
where
    B: Backend,
{
    /// Create staging buffer of `size` bytes.
    pub fn create(device: &B::Device, size: u64) -> Result<Self, DeviceError> {
        Ok(UploadBuffer {
            resource: Resource::create(
                device,
                ResourceDesc::buffer(size),
                HeapKind::Upload,
                ResourceState::GENERIC_READ,
            )?,
        })
    }

    /// Copy `data` into the buffer at `offset`.
    ///
    /// # Panics
    ///
    /// Panics if the write doesn't fit.
    pub fn write(&self, device: &B::Device, offset: u64, data: &[u8]) -> Result<(), DeviceError> {
        assert!(
            offset
                .checked_add(data.len() as u64)
                .map_or(false, |end| end <= self.size()),
            "Write of {} bytes at {} overflows upload buffer of {} bytes",
            data.len(),
            offset,
            self.size(),
        );
        device.write_resource(self.resource.raw(), offset, data)
    }

    /// Size in bytes.
    pub fn size(&self) -> u64 {
        match *self.resource.desc() {
            ResourceDesc::Buffer { size } => size,
            ResourceDesc::Texture { .. } => unreachable!(),
        }
    }

    /// Get the wrapped resource.
    pub fn resource(&self) -> &Resource<B> {
        &self.resource
    }

    /// Get raw resource handle.
    pub fn raw(&self) -> &B::Resource {
        self.resource.raw()
    }

    /// Destroy the buffer.
    ///
    /// # Safety
    ///
    /// Buffer must not be referenced by pending GPU work.
    pub unsafe fn dispose(self, device: &B::Device) {
        self.resource.dispose(device)
    }
}

#[cfg(test)]
mod tests {
    use {super::*, kiln_mock::{Mock, MockDevice}};

    #[test]
    fn write_lands_at_offset() {
        let device = MockDevice::new();
        let staging = UploadBuffer::<Mock>::create(&device, 8).unwrap();
        staging.write(&device, 4, &[1, 2, 3, 4]).unwrap();
        assert_eq!(device.read_buffer(staging.raw()), vec![0, 0, 0, 0, 1, 2, 3, 4]);
        unsafe { staging.dispose(&device) };
    }

    #[test]
    #[should_panic(expected = "overflows upload buffer")]
    fn write_past_address_space_panics() {
        let device = MockDevice::new();
        let staging = UploadBuffer::<Mock>::create(&device, 8).unwrap();
        let _ = staging.write(&device, u64::max_value(), &[1]);
    }
}
