use {
    super::CommandContext,
    crate::context_manager::CommandContextManager,
    kiln_core::{
        Backend, CommandList as _, Device, FenceValue, OrFatal, ResourceState, SubresourceData,
    },
    kiln_resource::{Resource, UploadBuffer},
};

impl<'a, B> CommandContext<'a, B>
where
    B: Backend,
{
    /// Fill buffer with `data` through a staging buffer.
    ///
    /// Blocks until the copy completes, so the staging memory can be released.
    /// The buffer is left in `GENERIC_READ` state.
    pub fn initialize_buffer(
        owner: &'a CommandContextManager<B>,
        resource: &mut Resource<B>,
        data: &[u8],
    ) -> FenceValue {
        Self::initialize_buffer_region(owner, resource, 0, data)
    }

    /// Write `data` at `offset` of the buffer through a staging buffer.
    ///
    /// Blocks until the copy completes.
    pub fn initialize_buffer_region(
        owner: &'a CommandContextManager<B>,
        resource: &mut Resource<B>,
        offset: u64,
        data: &[u8],
    ) -> FenceValue {
        let size = data.len() as u64;
        match resource.size() {
            Some(capacity) => assert!(
                offset.checked_add(size).map_or(false, |end| end <= capacity),
                "Upload of {} bytes at {} overflows buffer of {} bytes",
                size,
                offset,
                capacity
            ),
            None => panic!("Buffer upload into texture {:?}", resource.desc()),
        }

        let device = &**owner.manager().device();
        let staging = UploadBuffer::<B>::create(device, size).or_fatal("Staging buffer creation");
        staging.write(device, 0, data).or_fatal("Staging buffer write");

        let mut context = owner.begin("initialize_buffer");
        context.transition_resource(resource, ResourceState::COPY_DESTINATION, true);
        context
            .data
            .list
            .copy_buffer_region(resource.raw(), offset, staging.raw(), 0, size);
        context.transition_resource(resource, ResourceState::GENERIC_READ, true);
        let fence = context.finish(true);

        unsafe {
            // Copy is complete.
            staging.dispose(device);
        }
        fence
    }

    /// Fill first `subresources.len()` subresources of the texture through a staging buffer.
    ///
    /// Blocks until the copy completes.
    /// The texture is left in `GENERIC_READ` state.
    pub fn initialize_texture(
        owner: &'a CommandContextManager<B>,
        resource: &mut Resource<B>,
        subresources: &[SubresourceData<'_>],
    ) -> FenceValue {
        let desc = *resource.desc();
        let count = subresources.len() as u32;
        assert!(!desc.is_buffer(), "Texture upload into buffer");
        assert!(
            count > 0 && count <= desc.subresource_count(),
            "Texture has {} subresources, {} provided",
            desc.subresource_count(),
            count
        );

        let device = &**owner.manager().device();
        let (footprints, total) = device.copyable_footprints(&desc, 0, count);

        let mut staging_data = vec![0u8; total as usize];
        for (index, (footprint, source)) in footprints.iter().zip(subresources).enumerate() {
            let row_size = footprint.row_size as usize;
            for slice in 0..footprint.depth as usize {
                for row in 0..footprint.rows as usize {
                    let from = slice * source.slice_pitch + row * source.row_pitch;
                    let to = footprint.offset as usize
                        + (slice * footprint.rows as usize + row) * footprint.row_pitch as usize;
                    let bytes = source.data.get(from..from + row_size).unwrap_or_else(|| {
                        panic!(
                            "Subresource {} data is too short for row {} of slice {}",
                            index, row, slice
                        )
                    });
                    staging_data[to..to + row_size].copy_from_slice(bytes);
                }
            }
        }

        let staging = UploadBuffer::<B>::create(device, total).or_fatal("Staging buffer creation");
        staging
            .write(device, 0, &staging_data)
            .or_fatal("Staging buffer write");

        let mut context = owner.begin("initialize_texture");
        context.transition_resource(resource, ResourceState::COPY_DESTINATION, true);
        for (index, footprint) in footprints.iter().enumerate() {
            context.data.list.copy_buffer_to_texture(
                resource.raw(),
                index as u32,
                staging.raw(),
                footprint,
            );
        }
        context.transition_resource(resource, ResourceState::GENERIC_READ, true);
        let fence = context.finish(true);

        unsafe {
            // Copy is complete.
            staging.dispose(device);
        }
        fence
    }
}
