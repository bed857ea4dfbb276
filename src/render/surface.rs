use std::fmt;

use crate::assets::bitmap::Bitmap;
use crate::foundation::core::{Affine, BezPath, Rect, Rgba};
use crate::foundation::error::SvgaResult;
use crate::model::{LineCap, LineJoin, Style};

/// Stroke parameters handed to [`Surface::stroke_path`].
#[derive(Clone, Debug, PartialEq)]
pub struct StrokeStyle {
    pub width: f64,
    pub cap: LineCap,
    pub join: LineJoin,
    pub miter_limit: f64,
    /// Dash segment lengths; empty for a solid line.
    pub dashes: Vec<f64>,
}

impl StrokeStyle {
    pub fn from_style(style: &Style) -> Self {
        Self {
            width: style.stroke_width,
            cap: style.line_cap,
            join: style.line_join,
            miter_limit: style.miter_limit,
            dashes: style
                .dashes
                .iter()
                .copied()
                .filter(|d| d.is_finite() && *d >= 0.0)
                .collect(),
        }
    }
}

/// Drawing primitives the renderer needs from a host target.
///
/// State calls (`save`, `restore`, `concat_transform`, `set_global_alpha`, `clip`) compose like a
/// 2D canvas context: `restore` undoes everything since the matching `save`. Paths are in the
/// current local coordinate space.
pub trait Surface {
    fn save(&mut self);
    fn restore(&mut self);
    /// Post-multiply the current transform by `t`.
    fn concat_transform(&mut self, t: Affine);
    /// Replace the global alpha for subsequent draws in this scope.
    fn set_global_alpha(&mut self, alpha: f64);
    /// Intersect the clip region with `path`.
    fn clip(&mut self, path: &BezPath);
    fn fill_path(&mut self, path: &BezPath, color: Rgba) -> SvgaResult<()>;
    fn stroke_path(&mut self, path: &BezPath, color: Rgba, stroke: &StrokeStyle)
    -> SvgaResult<()>;
    /// Blit `bitmap` scaled into `dst` (local coordinates).
    fn draw_bitmap(&mut self, bitmap: &Bitmap, dst: Rect) -> SvgaResult<()>;
    /// Erase the whole target.
    fn clear(&mut self);
}

/// Externally supplied replacement content for a sprite (see [`crate::DynamicElement`]).
pub trait Drawable: Send + Sync {
    /// Natural size before fitting.
    fn intrinsic_size(&self) -> (f64, f64);
    /// Draw into `dst` in the surface's current local space.
    fn draw(&self, surface: &mut dyn Surface, dst: Rect) -> SvgaResult<()>;
}

impl Drawable for Bitmap {
    fn intrinsic_size(&self) -> (f64, f64) {
        self.size()
    }

    fn draw(&self, surface: &mut dyn Surface, dst: Rect) -> SvgaResult<()> {
        surface.draw_bitmap(self, dst)
    }
}

impl fmt::Debug for dyn Drawable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (w, h) = self.intrinsic_size();
        write!(f, "Drawable({w}x{h})")
    }
}

/// One recorded surface call, with the transform and alpha in effect when it was issued.
#[derive(Clone, Debug, PartialEq)]
pub enum DrawOp {
    Save,
    Restore,
    Transform(Affine),
    GlobalAlpha(f64),
    Clip(BezPath),
    Fill {
        path: BezPath,
        color: Rgba,
        ctm: Affine,
        alpha: f64,
    },
    Stroke {
        path: BezPath,
        color: Rgba,
        stroke: StrokeStyle,
        ctm: Affine,
        alpha: f64,
    },
    Bitmap {
        size: (u32, u32),
        dst: Rect,
        ctm: Affine,
        alpha: f64,
        clipped: bool,
    },
    Clear,
}

#[derive(Clone, Copy, Debug)]
struct RecState {
    ctm: Affine,
    alpha: f64,
    clip_depth: usize,
}

impl Default for RecState {
    fn default() -> Self {
        Self {
            ctm: Affine::IDENTITY,
            alpha: 1.0,
            clip_depth: 0,
        }
    }
}

/// In-memory [`Surface`] that records every call; for tests and debugging.
#[derive(Debug, Default)]
pub struct RecordingSurface {
    ops: Vec<DrawOp>,
    state: RecState,
    stack: Vec<RecState>,
}

impl RecordingSurface {
    pub fn new() -> Self {
        Self::default()
    }

    /// Borrow the recorded calls.
    pub fn ops(&self) -> &[DrawOp] {
        &self.ops
    }

    /// Drain the recorded calls.
    pub fn take_ops(&mut self) -> Vec<DrawOp> {
        std::mem::take(&mut self.ops)
    }

    /// Current `save` nesting depth.
    pub fn depth(&self) -> usize {
        self.stack.len()
    }
}

impl Surface for RecordingSurface {
    fn save(&mut self) {
        self.stack.push(self.state);
        self.ops.push(DrawOp::Save);
    }

    fn restore(&mut self) {
        if let Some(prev) = self.stack.pop() {
            self.state = prev;
        }
        self.ops.push(DrawOp::Restore);
    }

    fn concat_transform(&mut self, t: Affine) {
        self.state.ctm = self.state.ctm * t;
        self.ops.push(DrawOp::Transform(t));
    }

    fn set_global_alpha(&mut self, alpha: f64) {
        self.state.alpha = alpha;
        self.ops.push(DrawOp::GlobalAlpha(alpha));
    }

    fn clip(&mut self, path: &BezPath) {
        self.state.clip_depth += 1;
        self.ops.push(DrawOp::Clip(path.clone()));
    }

    fn fill_path(&mut self, path: &BezPath, color: Rgba) -> SvgaResult<()> {
        self.ops.push(DrawOp::Fill {
            path: path.clone(),
            color,
            ctm: self.state.ctm,
            alpha: self.state.alpha,
        });
        Ok(())
    }

    fn stroke_path(
        &mut self,
        path: &BezPath,
        color: Rgba,
        stroke: &StrokeStyle,
    ) -> SvgaResult<()> {
        self.ops.push(DrawOp::Stroke {
            path: path.clone(),
            color,
            stroke: stroke.clone(),
            ctm: self.state.ctm,
            alpha: self.state.alpha,
        });
        Ok(())
    }

    fn draw_bitmap(&mut self, bitmap: &Bitmap, dst: Rect) -> SvgaResult<()> {
        self.ops.push(DrawOp::Bitmap {
            size: (bitmap.width, bitmap.height),
            dst,
            ctm: self.state.ctm,
            alpha: self.state.alpha,
            clipped: self.state.clip_depth > 0,
        });
        Ok(())
    }

    fn clear(&mut self) {
        self.ops.push(DrawOp::Clear);
    }
}
