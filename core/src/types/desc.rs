/// Description of a GPU resource.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ResourceDesc {
    /// Linear buffer.
    Buffer {
        /// Size in bytes.
        size: u64,
    },

    /// Texture with optional array layers (or depth) and mip chain.
    Texture {
        /// Width of the top level in texels.
        width: u32,
        /// Height of the top level in texels.
        height: u32,
        /// Depth of 3D texture or number of array layers.
        depth_or_array_size: u16,
        /// Number of mip levels.
        mip_levels: u16,
        /// Size of one texel in bytes.
        texel_size: u32,
    },
}

impl ResourceDesc {
    /// Buffer description.
    pub fn buffer(size: u64) -> Self {
        ResourceDesc::Buffer { size }
    }

    /// Single level 2D texture description.
    pub fn texture_2d(width: u32, height: u32, texel_size: u32) -> Self {
        ResourceDesc::Texture {
            width,
            height,
            depth_or_array_size: 1,
            mip_levels: 1,
            texel_size,
        }
    }

    /// Check if this is a buffer.
    pub fn is_buffer(&self) -> bool {
        match self {
            ResourceDesc::Buffer { .. } => true,
            ResourceDesc::Texture { .. } => false,
        }
    }

    /// Number of subresources. Buffers have one.
    pub fn subresource_count(&self) -> u32 {
        match *self {
            ResourceDesc::Buffer { .. } => 1,
            ResourceDesc::Texture {
                depth_or_array_size,
                mip_levels,
                ..
            } => u32::from(depth_or_array_size) * u32::from(mip_levels),
        }
    }
}

/// Memory heap a resource lives in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum HeapKind {
    /// Device local memory.
    Default,

    /// Host visible memory for CPU to GPU transfers.
    /// Resources in it are permanently in `GENERIC_READ` state.
    Upload,

    /// Host visible memory for GPU to CPU transfers.
    Readback,
}

/// Source data of one texture subresource.
#[derive(Clone, Copy, Debug)]
pub struct SubresourceData<'a> {
    /// Tightly or loosely packed texel rows.
    pub data: &'a [u8],
    /// Distance between rows in `data`.
    pub row_pitch: usize,
    /// Distance between depth slices in `data`.
    pub slice_pitch: usize,
}

/// Layout of one subresource inside a linear staging buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PlacedFootprint {
    /// Byte offset of the subresource in the buffer.
    pub offset: u64,
    /// Width in texels.
    pub width: u32,
    /// Height in texels.
    pub height: u32,
    /// Depth in texels.
    pub depth: u32,
    /// Aligned distance between rows in the buffer.
    pub row_pitch: u32,
    /// Number of rows.
    pub rows: u32,
    /// Unaligned size of one row in bytes.
    pub row_size: u64,
}

/// Kind of descriptor heap. One heap of each kind can be bound at a time.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DescriptorHeapKind {
    /// Constant buffer, shader resource and unordered access views.
    CbvSrvUav = 0,
    /// Samplers.
    Sampler = 1,
    /// Render target views.
    Rtv = 2,
    /// Depth stencil views.
    Dsv = 3,
}

impl DescriptorHeapKind {
    /// Number of descriptor heap kinds.
    pub const COUNT: usize = 4;

    /// Index of the kind.
    pub fn index(self) -> usize {
        self as usize
    }

    /// Check if heaps of this kind are bound to command lists.
    /// Only shader visible kinds are.
    pub fn is_shader_visible(self) -> bool {
        match self {
            DescriptorHeapKind::CbvSrvUav | DescriptorHeapKind::Sampler => true,
            DescriptorHeapKind::Rtv | DescriptorHeapKind::Dsv => false,
        }
    }
}

/// Scheduling priority of a queue.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum QueuePriority {
    /// Normal priority.
    Normal,
    /// Elevated priority.
    High,
}

impl Default for QueuePriority {
    fn default() -> Self {
        QueuePriority::Normal
    }
}

/// Pipeline bind point.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PipelineKind {
    /// Graphics pipeline.
    Graphics,
    /// Compute pipeline.
    Compute,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subresource_counts() {
        assert_eq!(ResourceDesc::buffer(16).subresource_count(), 1);
        let cube = ResourceDesc::Texture {
            width: 64,
            height: 64,
            depth_or_array_size: 6,
            mip_levels: 7,
            texel_size: 4,
        };
        assert_eq!(cube.subresource_count(), 42);
        assert!(!cube.is_buffer());
    }
}
