use bitflags::bitflags;

bitflags! {
    /// Usage state of a GPU resource.
    ///
    /// Bit values follow the D3D12 resource state encoding.
    /// Read-only states can be combined, write states are exclusive.
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    pub struct ResourceState: u32 {
        /// Default state. Implicitly promoted on first use by some queues.
        const COMMON = 0;
        /// Presentable state. Same bits as `COMMON`.
        const PRESENT = 0;
        /// Read as vertex or constant buffer.
        const VERTEX_AND_CONSTANT_BUFFER = 0x1;
        /// Read as index buffer.
        const INDEX_BUFFER = 0x2;
        /// Written as render target.
        const RENDER_TARGET = 0x4;
        /// Read and written through unordered access views.
        const UNORDERED_ACCESS = 0x8;
        /// Written as depth-stencil target.
        const DEPTH_WRITE = 0x10;
        /// Read as depth-stencil target.
        const DEPTH_READ = 0x20;
        /// Read by non-pixel shader stages.
        const NON_PIXEL_SHADER_RESOURCE = 0x40;
        /// Read by the pixel shader stage.
        const PIXEL_SHADER_RESOURCE = 0x80;
        /// Read as indirect argument buffer.
        const INDIRECT_ARGUMENT = 0x200;
        /// Read as predicate buffer. Same bits as `INDIRECT_ARGUMENT`.
        const PREDICATION = 0x200;
        /// Written by copy commands.
        const COPY_DESTINATION = 0x400;
        /// Read by copy commands.
        const COPY_SOURCE = 0x800;
        /// Union of all read states. Required state of upload heap resources.
        const GENERIC_READ = Self::VERTEX_AND_CONSTANT_BUFFER.bits
            | Self::INDEX_BUFFER.bits
            | Self::NON_PIXEL_SHADER_RESOURCE.bits
            | Self::PIXEL_SHADER_RESOURCE.bits
            | Self::INDIRECT_ARGUMENT.bits
            | Self::COPY_SOURCE.bits;
    }
}

impl ResourceState {
    const WRITE: ResourceState = ResourceState {
        bits: Self::RENDER_TARGET.bits
            | Self::UNORDERED_ACCESS.bits
            | Self::DEPTH_WRITE.bits
            | Self::COPY_DESTINATION.bits,
    };

    /// Check if state permits only reads.
    pub fn is_read_only(self) -> bool {
        !self.intersects(Self::WRITE)
    }

    /// Check if the state is a legal combination.
    /// Write states can't be combined with anything else.
    pub fn is_valid(self) -> bool {
        let writes = self & Self::WRITE;
        writes.is_empty() || self == writes && writes.bits.count_ones() == 1
    }
}
