//! State categories, typed values and inheritance flags

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

/// Handle to a linked shader program owned by the device layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ProgramId(pub u32);

/// Handle to a texture owned by the device layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TextureId(pub u32);

/// Kind of device state an entry controls
///
/// Declaration order is switching cost, most expensive first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum StateCategory {
    /// Bound shader program
    Program,
    /// Texture bound to the given unit
    Texture(u8),
    /// Blend function, `None` disables blending
    Blend,
    /// Depth comparison, `None` disables the depth test
    DepthTest,
    /// Depth buffer writes
    DepthWrite,
    /// Face culling, `None` disables culling
    CullFace,
    /// Polygon rasterization mode
    PolygonMode,
    /// Fixed-function lighting toggle
    Lighting,
}

impl StateCategory {
    /// Whether `value` is a legal value for this category
    pub fn accepts(&self, value: &StateValue) -> bool {
        matches!(
            (self, value),
            (Self::Program, StateValue::Program(_))
                | (Self::Texture(_), StateValue::Texture(_))
                | (Self::Blend, StateValue::Blend(_))
                | (Self::DepthTest, StateValue::DepthTest(_))
                | (Self::DepthWrite, StateValue::DepthWrite(_))
                | (Self::CullFace, StateValue::CullFace(_))
                | (Self::PolygonMode, StateValue::PolygonMode(_))
                | (Self::Lighting, StateValue::Lighting(_))
        )
    }
}

/// Source/destination blend factor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum BlendFactor {
    /// Factor of 0
    Zero,
    /// Factor of 1
    One,
    /// Source color
    SrcColor,
    /// 1 minus source color
    OneMinusSrcColor,
    /// Source alpha
    SrcAlpha,
    /// 1 minus source alpha
    OneMinusSrcAlpha,
    /// Destination color
    DstColor,
    /// 1 minus destination color
    OneMinusDstColor,
    /// Destination alpha
    DstAlpha,
    /// 1 minus destination alpha
    OneMinusDstAlpha,
}

/// Blend equation operands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BlendFunc {
    /// Source factor
    pub src: BlendFactor,
    /// Destination factor
    pub dst: BlendFactor,
}

impl BlendFunc {
    /// Standard alpha blending
    pub const ALPHA: Self = Self {
        src: BlendFactor::SrcAlpha,
        dst: BlendFactor::OneMinusSrcAlpha,
    };

    /// Additive blending
    pub const ADDITIVE: Self = Self {
        src: BlendFactor::One,
        dst: BlendFactor::One,
    };
}

/// Depth comparison function
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum CompareFunc {
    /// Never passes
    Never,
    /// Passes if the incoming value is less
    Less,
    /// Passes if the values are equal
    Equal,
    /// Passes if the incoming value is less or equal
    LessEqual,
    /// Passes if the incoming value is greater
    Greater,
    /// Passes if the values differ
    NotEqual,
    /// Passes if the incoming value is greater or equal
    GreaterEqual,
    /// Always passes
    Always,
}

/// Faces removed by culling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum CullFace {
    /// Cull front faces
    Front,
    /// Cull back faces
    Back,
    /// Cull all faces
    FrontAndBack,
}

/// Rasterization mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PolygonMode {
    /// Filled triangles
    Fill,
    /// Edges only
    Line,
    /// Vertices only
    Point,
}

/// Value of a single state entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum StateValue {
    /// Shader program to bind
    Program(ProgramId),
    /// Texture to bind on the category's unit
    Texture(TextureId),
    /// Blend function, `None` disables blending
    Blend(Option<BlendFunc>),
    /// Depth comparison, `None` disables the test
    DepthTest(Option<CompareFunc>),
    /// Whether depth writes are enabled
    DepthWrite(bool),
    /// Faces to cull, `None` disables culling
    CullFace(Option<CullFace>),
    /// Rasterization mode
    PolygonMode(PolygonMode),
    /// Whether lighting is enabled
    Lighting(bool),
}

bitflags! {
    /// How an entry interacts with entries pushed above or below it
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
    pub struct StateFlags: u8 {
        /// Keep this entry against entries pushed later in the traversal
        const OVERRIDE = 0b01;
        /// Take effect even below an `OVERRIDE` entry
        const PROTECTED = 0b10;
    }
}

impl Default for StateFlags {
    fn default() -> Self {
        Self::empty()
    }
}

/// Coarse bin placement requested by a state set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub enum RenderingHint {
    /// Inherit whatever the enclosing state requested
    #[default]
    Default,
    /// Opaque geometry, stays in the active bin
    Opaque,
    /// Blended geometry, redirected to the depth-sorted bin
    Transparent,
}
