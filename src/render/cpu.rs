use std::collections::HashMap;
use std::sync::Arc;

use crate::assets::bitmap::Bitmap;
use crate::foundation::core::{Affine, BezPath, Canvas, Rect, Rgba};
use crate::foundation::error::{SvgaError, SvgaResult};
use crate::model::{LineCap, LineJoin};
use crate::render::surface::{StrokeStyle, Surface};

/// One rendered frame as row-major RGBA8.
#[derive(Clone, Debug)]
pub struct FrameRgba {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
    pub premultiplied: bool,
}

impl FrameRgba {
    /// RGBA8 pixel at `(x, y)`, or `None` outside the frame.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = ((y as usize) * (self.width as usize) + (x as usize)) * 4;
        let px = self.data.get(i..i + 4)?;
        Some([px[0], px[1], px[2], px[3]])
    }

    /// Convert to straight alpha (what PNG expects).
    pub fn into_straight(mut self) -> Self {
        if !self.premultiplied {
            return self;
        }
        for px in self.data.chunks_exact_mut(4) {
            let a = u16::from(px[3]);
            if a == 0 || a == 255 {
                continue;
            }
            for c in &mut px[..3] {
                *c = ((u16::from(*c) * 255 + a / 2) / a).min(255) as u8;
            }
        }
        self.premultiplied = false;
        self
    }
}

#[derive(Clone, Copy, Debug)]
struct CpuState {
    ctm: Affine,
    alpha: f64,
    /// Clip layers pushed since the matching `save`.
    clip_layers: usize,
}

impl Default for CpuState {
    fn default() -> Self {
        Self {
            ctm: Affine::IDENTITY,
            alpha: 1.0,
            clip_layers: 0,
        }
    }
}

/// Raster [`Surface`] backed by `vello_cpu`.
///
/// Draw calls are recorded into a render context and rasterized by [`CpuSurface::snapshot`].
pub struct CpuSurface {
    width: u16,
    height: u16,
    ctx: vello_cpu::RenderContext,
    pixmap: vello_cpu::Pixmap,
    state: CpuState,
    stack: Vec<CpuState>,
    // Keyed by pixel buffer address; the Arc is held so the address stays unique. Entries whose
    // bitmap is referenced nowhere else are pruned on `clear`.
    images: HashMap<usize, (Arc<Vec<u8>>, vello_cpu::Image)>,
}

impl std::fmt::Debug for CpuSurface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CpuSurface")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("depth", &self.stack.len())
            .finish_non_exhaustive()
    }
}

impl CpuSurface {
    pub fn new(width: u32, height: u32) -> SvgaResult<Self> {
        let w: u16 = width
            .try_into()
            .map_err(|_| SvgaError::render("surface width exceeds u16"))?;
        let h: u16 = height
            .try_into()
            .map_err(|_| SvgaError::render("surface height exceeds u16"))?;
        if w == 0 || h == 0 {
            return Err(SvgaError::render("surface size must be non-zero"));
        }
        Ok(Self {
            width: w,
            height: h,
            ctx: vello_cpu::RenderContext::new(w, h),
            pixmap: vello_cpu::Pixmap::new(w, h),
            state: CpuState::default(),
            stack: Vec::new(),
            images: HashMap::new(),
        })
    }

    /// Surface sized to a movie canvas (one pixel per canvas unit).
    pub fn for_canvas(canvas: Canvas) -> SvgaResult<Self> {
        let (w, h) = canvas.pixel_size();
        Self::new(w, h)
    }

    pub fn size(&self) -> (u32, u32) {
        (u32::from(self.width), u32::from(self.height))
    }

    /// Number of bitmaps with a cached image paint.
    pub fn cached_images(&self) -> usize {
        self.images.len()
    }

    /// Rasterize everything drawn since the last clear.
    ///
    /// Any clip scopes still open are closed first.
    pub fn snapshot(&mut self) -> FrameRgba {
        while let Some(prev) = self.stack.pop() {
            self.pop_clip_layers();
            self.state = prev;
        }
        self.pop_clip_layers();

        self.ctx.flush();
        self.ctx.render_to_pixmap(&mut self.pixmap);
        FrameRgba {
            width: u32::from(self.width),
            height: u32::from(self.height),
            data: self.pixmap.data_as_u8_slice().to_vec(),
            premultiplied: true,
        }
    }

    fn pop_clip_layers(&mut self) {
        for _ in 0..self.state.clip_layers {
            self.ctx.pop_layer();
        }
        self.state.clip_layers = 0;
    }

    fn with_alpha(&mut self, draw: impl FnOnce(&mut vello_cpu::RenderContext)) {
        let alpha = self.state.alpha.clamp(0.0, 1.0) as f32;
        if alpha < 1.0 {
            self.ctx.push_opacity_layer(alpha);
        }
        draw(&mut self.ctx);
        if alpha < 1.0 {
            self.ctx.pop_layer();
        }
    }

    fn image_for(&mut self, bitmap: &Bitmap) -> SvgaResult<vello_cpu::Image> {
        let id = Arc::as_ptr(&bitmap.rgba8_premul) as usize;
        if let Some((_, paint)) = self.images.get(&id) {
            return Ok(paint.clone());
        }
        let pixmap = premul_bytes_to_pixmap(&bitmap.rgba8_premul, bitmap.width, bitmap.height)?;
        let paint = vello_cpu::Image {
            image: vello_cpu::ImageSource::Pixmap(Arc::new(pixmap)),
            sampler: vello_cpu::peniko::ImageSampler::default(),
        };
        self.images
            .insert(id, (Arc::clone(&bitmap.rgba8_premul), paint.clone()));
        Ok(paint)
    }
}

impl Surface for CpuSurface {
    fn save(&mut self) {
        self.stack.push(self.state);
        self.state.clip_layers = 0;
    }

    fn restore(&mut self) {
        let Some(prev) = self.stack.pop() else {
            tracing::debug!("restore without matching save");
            return;
        };
        self.pop_clip_layers();
        self.state = prev;
    }

    fn concat_transform(&mut self, t: Affine) {
        self.state.ctm = self.state.ctm * t;
    }

    fn set_global_alpha(&mut self, alpha: f64) {
        self.state.alpha = alpha;
    }

    fn clip(&mut self, path: &BezPath) {
        self.ctx.set_transform(affine_to_cpu(self.state.ctm));
        self.ctx.push_clip_layer(&bezpath_to_cpu(path));
        self.state.clip_layers += 1;
    }

    fn fill_path(&mut self, path: &BezPath, color: Rgba) -> SvgaResult<()> {
        self.ctx.set_paint_transform(vello_cpu::kurbo::Affine::IDENTITY);
        self.ctx.set_transform(affine_to_cpu(self.state.ctm));
        self.ctx.set_paint(color_to_cpu(color));
        let cpu_path = bezpath_to_cpu(path);
        self.with_alpha(|ctx| ctx.fill_path(&cpu_path));
        Ok(())
    }

    fn stroke_path(
        &mut self,
        path: &BezPath,
        color: Rgba,
        stroke: &StrokeStyle,
    ) -> SvgaResult<()> {
        if !(stroke.width.is_finite() && stroke.width > 0.0) {
            return Ok(());
        }
        self.ctx.set_paint_transform(vello_cpu::kurbo::Affine::IDENTITY);
        self.ctx.set_transform(affine_to_cpu(self.state.ctm));
        self.ctx.set_paint(color_to_cpu(color));
        self.ctx.set_stroke(stroke_to_cpu(stroke));
        let cpu_path = bezpath_to_cpu(path);
        self.with_alpha(|ctx| ctx.stroke_path(&cpu_path));
        Ok(())
    }

    fn draw_bitmap(&mut self, bitmap: &Bitmap, dst: Rect) -> SvgaResult<()> {
        let (w, h) = bitmap.size();
        if w <= 0.0 || h <= 0.0 || dst.width() == 0.0 || dst.height() == 0.0 {
            return Ok(());
        }
        let paint = self.image_for(bitmap)?;
        let place = Affine::translate((dst.x0, dst.y0))
            * Affine::scale_non_uniform(dst.width() / w, dst.height() / h);

        self.ctx.set_paint_transform(vello_cpu::kurbo::Affine::IDENTITY);
        self.ctx.set_transform(affine_to_cpu(self.state.ctm * place));
        self.ctx.set_paint(paint);
        self.with_alpha(|ctx| ctx.fill_rect(&vello_cpu::kurbo::Rect::new(0.0, 0.0, w, h)));
        Ok(())
    }

    fn clear(&mut self) {
        self.ctx = vello_cpu::RenderContext::new(self.width, self.height);
        clear_pixmap(&mut self.pixmap);
        self.state = CpuState::default();
        self.stack.clear();
        self.images.retain(|_, (pixels, _)| Arc::strong_count(pixels) > 1);
    }
}

fn clear_pixmap(pixmap: &mut vello_cpu::Pixmap) {
    pixmap.data_as_u8_slice_mut().fill(0);
}

fn color_to_cpu(c: Rgba) -> vello_cpu::peniko::Color {
    let [r, g, b, a] = c.to_rgba8();
    vello_cpu::peniko::Color::from_rgba8(r, g, b, a)
}

fn stroke_to_cpu(s: &StrokeStyle) -> vello_cpu::kurbo::Stroke {
    use vello_cpu::kurbo::{Cap, Join};

    let cap = match s.cap {
        LineCap::Butt => Cap::Butt,
        LineCap::Round => Cap::Round,
        LineCap::Square => Cap::Square,
    };
    let join = match s.join {
        LineJoin::Miter => Join::Miter,
        LineJoin::Round => Join::Round,
        LineJoin::Bevel => Join::Bevel,
    };
    let mut stroke = vello_cpu::kurbo::Stroke::new(s.width)
        .with_caps(cap)
        .with_join(join)
        .with_miter_limit(s.miter_limit);

    if s.dashes.iter().any(|d| *d > 0.0) {
        // Odd-length patterns repeat once so on/off alternation stays aligned.
        let mut pattern = s.dashes.clone();
        if pattern.len() % 2 == 1 {
            pattern.extend_from_within(..);
        }
        stroke = stroke.with_dashes(0.0, pattern);
    }
    stroke
}

fn affine_to_cpu(a: Affine) -> vello_cpu::kurbo::Affine {
    vello_cpu::kurbo::Affine::new(a.as_coeffs())
}

fn point_to_cpu(p: kurbo::Point) -> vello_cpu::kurbo::Point {
    vello_cpu::kurbo::Point::new(p.x, p.y)
}

fn bezpath_to_cpu(path: &BezPath) -> vello_cpu::kurbo::BezPath {
    use kurbo::PathEl;

    let mut out = vello_cpu::kurbo::BezPath::new();
    for &el in path.elements() {
        match el {
            PathEl::MoveTo(p) => out.move_to(point_to_cpu(p)),
            PathEl::LineTo(p) => out.line_to(point_to_cpu(p)),
            PathEl::QuadTo(p1, p2) => out.quad_to(point_to_cpu(p1), point_to_cpu(p2)),
            PathEl::CurveTo(p1, p2, p3) => {
                out.curve_to(point_to_cpu(p1), point_to_cpu(p2), point_to_cpu(p3));
            }
            PathEl::ClosePath => out.close_path(),
        }
    }
    out
}

fn premul_bytes_to_pixmap(
    rgba8_premul: &[u8],
    width: u32,
    height: u32,
) -> SvgaResult<vello_cpu::Pixmap> {
    let w: u16 = width
        .try_into()
        .map_err(|_| SvgaError::render("bitmap width exceeds u16"))?;
    let h: u16 = height
        .try_into()
        .map_err(|_| SvgaError::render("bitmap height exceeds u16"))?;
    if rgba8_premul.len() != width as usize * height as usize * 4 {
        return Err(SvgaError::render("bitmap byte length mismatch"));
    }

    let mut may_have_opacities = false;
    let mut pixels = Vec::with_capacity(width as usize * height as usize);
    for px in rgba8_premul.chunks_exact(4) {
        let a = px[3];
        may_have_opacities |= a != 255;
        pixels.push(vello_cpu::peniko::color::PremulRgba8 {
            r: px[0],
            g: px[1],
            b: px[2],
            a,
        });
    }

    Ok(vello_cpu::Pixmap::from_parts_with_opacity(
        pixels,
        w,
        h,
        may_have_opacities,
    ))
}
