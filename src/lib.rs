//! SVGA movie decoding, playback scheduling and vector rendering.
//!
//! The pipeline is:
//!
//! - [`decode`] a binary movie into a [`MovieEntity`]
//! - [`build`] a [`VideoEntity`] by decoding the referenced images
//! - mount it on a [`Player`], which steps frames on ticks and drives a [`Renderer`]
//! - the renderer issues primitive calls on a host [`Surface`] ([`CpuSurface`] rasterizes them)
#![forbid(unsafe_code)]

mod assets;
mod format;
mod foundation;
mod model;
mod player;
mod render;

pub use crate::foundation::core::{Affine, BezPath, Canvas, Point, Rect, Rgba, Vec2};
pub use crate::foundation::error::{SvgaError, SvgaResult};

pub use crate::format::decode::{DEFAULT_FPS, MAX_FRAMES, decode};
pub use crate::format::encode::encode;
pub use crate::format::header::{HEADER_LEN, Header, MAGIC, sniff_version};
pub use crate::model::{
    FormatVersion, FrameEntity, Layout, LineCap, LineJoin, MovieEntity, ShapeEntity, ShapeKind,
    SpriteEntity, Style, Transform,
};

pub use crate::assets::bitmap::{Bitmap, ImageDecoder, RasterImageDecoder};
pub use crate::assets::video::{DynamicElement, FitMode, VideoEntity, build};

pub use crate::render::cpu::{CpuSurface, FrameRgba};
pub use crate::render::path::parse_path;
pub use crate::render::renderer::{MIN_VISIBLE_ALPHA, Renderer};
pub use crate::render::shapes::{KAPPA, clamp_corner_radius, ellipse_path, rounded_rect_path};
pub use crate::render::surface::{DrawOp, Drawable, RecordingSurface, StrokeStyle, Surface};

pub use crate::player::events::{EventKind, Listener, PlayerEvent};
pub use crate::player::scheduler::Player;
pub use crate::player::state::{Direction, FillMode, PlaybackState, PlayerOptions, PlayerState};
pub use crate::player::tick::{ClockTickSource, ManualTickSource, TickSource};
