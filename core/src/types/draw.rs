use bitflags::bitflags;

/// Maximum number of simultaneously bound render targets.
pub const MAX_RENDER_TARGETS: usize = 8;

/// Rasterizer viewport.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Viewport {
    /// Left edge.
    pub x: f32,
    /// Top edge.
    pub y: f32,
    /// Width.
    pub width: f32,
    /// Height.
    pub height: f32,
    /// Depth mapped to the near plane.
    pub min_depth: f32,
    /// Depth mapped to the far plane.
    pub max_depth: f32,
}

impl Viewport {
    /// Viewport covering the whole `0.0 .. 1.0` depth range.
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Viewport {
            x,
            y,
            width,
            height,
            min_depth: 0.0,
            max_depth: 1.0,
        }
    }
}

/// Scissor rectangle. `right` and `bottom` are exclusive.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Rect {
    /// Left edge.
    pub left: i32,
    /// Top edge.
    pub top: i32,
    /// Right edge.
    pub right: i32,
    /// Bottom edge.
    pub bottom: i32,
}

impl Rect {
    /// Rectangle with top-left corner at `x, y` and given extent.
    pub fn from_extent(x: u32, y: u32, width: u32, height: u32) -> Self {
        Rect {
            left: x as i32,
            top: y as i32,
            right: (x + width) as i32,
            bottom: (y + height) as i32,
        }
    }
}

/// How vertices are assembled into primitives.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PrimitiveTopology {
    /// Every vertex is a point.
    PointList,
    /// Every pair of vertices is a line.
    LineList,
    /// Connected lines.
    LineStrip,
    /// Every three vertices are a triangle.
    TriangleList,
    /// Connected triangles.
    TriangleStrip,
}

/// Width of indices in an index buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum IndexFormat {
    /// 16-bit indices.
    U16,
    /// 32-bit indices.
    U32,
}

/// Vertex buffer binding.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct VertexBufferView {
    /// GPU address of the first vertex.
    pub address: u64,
    /// Size of the view in bytes.
    pub size: u32,
    /// Distance between vertices in bytes.
    pub stride: u32,
}

/// Index buffer binding.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct IndexBufferView {
    /// GPU address of the first index.
    pub address: u64,
    /// Size of the view in bytes.
    pub size: u32,
    /// Index width.
    pub format: IndexFormat,
}

bitflags! {
    /// Aspects of a depth stencil target to clear.
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    pub struct ClearFlags: u32 {
        /// Clear depth.
        const DEPTH = 0x1;
        /// Clear stencil.
        const STENCIL = 0x2;
    }
}

/// Condition under which predicated commands are skipped.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PredicationOp {
    /// Skip when the predicate value is zero.
    EqualZero,
    /// Skip when the predicate value is not zero.
    NotEqualZero,
}

impl PredicationOp {
    /// Check if commands are skipped for the predicate `value`.
    pub fn skips(self, value: u64) -> bool {
        match self {
            PredicationOp::EqualZero => value == 0,
            PredicationOp::NotEqualZero => value != 0,
        }
    }
}

/// Kind of queries stored in a query heap.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum QueryKind {
    /// GPU timestamps written by `end_query`.
    Timestamp,
    /// Number of samples that passed depth and stencil tests
    /// between `begin_query` and `end_query`.
    Occlusion,
}

/// Arguments of a non-indexed indirect draw as laid out in the argument buffer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct DrawArguments {
    /// Vertices per instance.
    pub vertices: u32,
    /// Number of instances.
    pub instances: u32,
    /// First vertex.
    pub first_vertex: u32,
    /// First instance.
    pub first_instance: u32,
}

impl DrawArguments {
    /// Size of the arguments in bytes.
    pub const SIZE: u64 = 16;

    /// Little endian representation.
    pub fn to_bytes(&self) -> [u8; 16] {
        let mut bytes = [0; 16];
        let fields = [
            self.vertices,
            self.instances,
            self.first_vertex,
            self.first_instance,
        ];
        for (chunk, field) in bytes.chunks_mut(4).zip(fields.iter()) {
            chunk.copy_from_slice(&field.to_le_bytes());
        }
        bytes
    }

    /// Read arguments from little endian bytes.
    /// Returns `None` if `bytes` is too short.
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        if bytes.len() < Self::SIZE as usize {
            return None;
        }
        let field = |index: usize| {
            let mut raw = [0; 4];
            raw.copy_from_slice(&bytes[index * 4..index * 4 + 4]);
            u32::from_le_bytes(raw)
        };
        Some(DrawArguments {
            vertices: field(0),
            instances: field(1),
            first_vertex: field(2),
            first_instance: field(3),
        })
    }
}
