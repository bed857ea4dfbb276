use std::collections::BTreeMap;

use crate::foundation::core::{Affine, Canvas, Rect, Rgba};

/// Container schema version a movie was decoded from (or will be encoded to).
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize,
)]
pub enum FormatVersion {
    /// Legacy layout with flat movie parameters.
    V1,
    /// Current layout with a nested `MovieParams` message.
    #[default]
    V2,
}

impl FormatVersion {
    /// Header major version byte.
    pub fn major(self) -> u8 {
        match self {
            Self::V1 => 1,
            Self::V2 => 2,
        }
    }

    /// Map a header major version byte back to a schema version.
    pub fn from_major(major: u8) -> Option<Self> {
        match major {
            1 => Some(Self::V1),
            2 => Some(Self::V2),
            _ => None,
        }
    }
}

/// Decoded in-memory representation of one animation file.
///
/// Built once from an immutable buffer and never mutated afterwards.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct MovieEntity {
    pub version: FormatVersion,
    /// Producer-declared version string (free-form, e.g. `"2.0.0"`).
    pub version_tag: String,
    pub canvas: Canvas,
    pub fps: u32,
    /// Total frames; always > 0.
    pub frame_count: u32,
    pub sprites: Vec<SpriteEntity>,
    /// Raw (undecoded) image payloads keyed by image key.
    #[serde(skip)]
    pub images: BTreeMap<String, Vec<u8>>,
}

impl MovieEntity {
    /// Index of the last frame.
    pub fn last_frame(&self) -> u32 {
        self.frame_count.saturating_sub(1)
    }

    /// Image keys referenced by at least one sprite, in first-use order without duplicates.
    pub fn referenced_image_keys(&self) -> Vec<&str> {
        let mut out = Vec::<&str>::new();
        for sprite in &self.sprites {
            if let Some(key) = sprite.image_key.as_deref()
                && !out.contains(&key)
            {
                out.push(key);
            }
        }
        out
    }
}

/// One animated layer: zero-or-one bitmap plus optional vector shapes per frame.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct SpriteEntity {
    pub image_key: Option<String>,
    /// One entry per movie frame.
    pub frames: Vec<FrameEntity>,
    pub matte_key: Option<String>,
}

/// Per-sprite, per-frame snapshot of transform, visibility and shapes.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct FrameEntity {
    /// Opacity in `[0, 1]`; frames below 0.05 are not drawn.
    pub alpha: f64,
    pub transform: Transform,
    pub layout: Layout,
    pub clip_path: Option<String>,
    pub shapes: Vec<ShapeEntity>,
}

/// 2D affine transform `[a b c d tx ty]`.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Transform {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
    pub tx: f64,
    pub ty: f64,
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Transform {
    pub const IDENTITY: Self = Self {
        a: 1.0,
        b: 0.0,
        c: 0.0,
        d: 1.0,
        tx: 0.0,
        ty: 0.0,
    };

    pub fn to_affine(self) -> Affine {
        Affine::new([self.a, self.b, self.c, self.d, self.tx, self.ty])
    }

    pub fn is_identity(&self) -> bool {
        *self == Self::IDENTITY
    }
}

/// Layout rectangle used to place dynamic replacement drawables.
#[derive(Clone, Copy, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Layout {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Layout {
    pub fn to_rect(self) -> Rect {
        Rect::new(self.x, self.y, self.x + self.width, self.y + self.height)
    }
}

/// One vector shape drawn on top of a sprite's bitmap.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ShapeEntity {
    pub kind: ShapeKind,
    pub transform: Transform,
    pub style: Option<Style>,
}

/// Shape geometry, dispatched by tag.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ShapeKind {
    /// Path in the mini path language.
    Path { d: String },
    Ellipse {
        x: f64,
        y: f64,
        radius_x: f64,
        radius_y: f64,
    },
    Rect {
        x: f64,
        y: f64,
        width: f64,
        height: f64,
        corner_radius: f64,
    },
}

/// Fill/stroke styling of a shape.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Style {
    pub fill: Option<Rgba>,
    pub stroke: Option<Rgba>,
    pub stroke_width: f64,
    pub line_cap: LineCap,
    pub line_join: LineJoin,
    pub miter_limit: f64,
    /// Up to three dash segment lengths; empty means a solid stroke.
    pub dashes: Vec<f64>,
}

impl Default for Style {
    fn default() -> Self {
        Self {
            fill: None,
            stroke: None,
            stroke_width: 0.0,
            line_cap: LineCap::Butt,
            line_join: LineJoin::Miter,
            miter_limit: Self::DEFAULT_MITER_LIMIT,
            dashes: Vec::new(),
        }
    }
}

impl Style {
    pub const DEFAULT_MITER_LIMIT: f64 = 4.0;
    pub const MAX_DASHES: usize = 3;
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum LineCap {
    #[default]
    Butt,
    Round,
    Square,
}

impl LineCap {
    pub(crate) fn from_wire(v: u64) -> Self {
        match v {
            1 => Self::Round,
            2 => Self::Square,
            _ => Self::Butt,
        }
    }

    pub(crate) fn to_wire(self) -> u64 {
        match self {
            Self::Butt => 0,
            Self::Round => 1,
            Self::Square => 2,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum LineJoin {
    #[default]
    Miter,
    Round,
    Bevel,
}

impl LineJoin {
    pub(crate) fn from_wire(v: u64) -> Self {
        match v {
            1 => Self::Round,
            2 => Self::Bevel,
            _ => Self::Miter,
        }
    }

    pub(crate) fn to_wire(self) -> u64 {
        match self {
            Self::Miter => 0,
            Self::Round => 1,
            Self::Bevel => 2,
        }
    }
}
