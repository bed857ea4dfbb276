use std::borrow::Cow;
use std::collections::HashMap;

use crate::assets::bitmap::Bitmap;
use crate::assets::video::VideoEntity;
use crate::foundation::core::{BezPath, Rect};
use crate::foundation::error::{SvgaError, SvgaResult};
use crate::model::{FrameEntity, ShapeEntity, ShapeKind, SpriteEntity};
use crate::render::path::parse_path;
use crate::render::shapes::shape_path;
use crate::render::surface::{StrokeStyle, Surface};

/// Sprites whose frame alpha is below this are skipped entirely.
pub const MIN_VISIBLE_ALPHA: f64 = 0.05;

/// Translates one movie frame into [`Surface`] calls.
///
/// Parsed path strings (shape paths and clip paths) are cached for the lifetime of the renderer.
#[derive(Debug, Default)]
pub struct Renderer {
    paths: HashMap<String, BezPath>,
}

impl Renderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of distinct path strings parsed so far.
    pub fn cached_paths(&self) -> usize {
        self.paths.len()
    }

    /// Clear `surface` and draw `frame` of `video` onto it.
    ///
    /// Every sprite is attempted even if an earlier one fails; the first failure is returned.
    /// Save/restore calls stay balanced on every path.
    pub fn render(
        &mut self,
        video: &VideoEntity,
        frame: u32,
        surface: &mut dyn Surface,
    ) -> SvgaResult<()> {
        let movie = video.movie();
        if frame >= movie.frame_count {
            return Err(SvgaError::invalid_state(format!(
                "frame {frame} out of range (frame_count={})",
                movie.frame_count
            )));
        }

        surface.clear();
        let mut first_err = None;
        for (index, sprite) in movie.sprites.iter().enumerate() {
            let Some(fe) = sprite.frames.get(frame as usize) else {
                continue;
            };
            if fe.alpha < MIN_VISIBLE_ALPHA {
                continue;
            }
            if let Some(key) = sprite.image_key.as_deref()
                && video.hidden.contains(key)
            {
                continue;
            }

            surface.save();
            let res = self.draw_sprite(video, sprite, fe, surface);
            surface.restore();
            if let Err(e) = res {
                tracing::debug!(sprite = index, frame, error = %e, "sprite draw failed");
                first_err.get_or_insert(e);
            }
        }
        first_err.map_or(Ok(()), Err)
    }

    /// Forget every parsed path (a new movie was mounted).
    pub fn clear_cache(&mut self) {
        self.paths.clear();
    }

    /// Wipe the surface.
    pub fn erase(&mut self, surface: &mut dyn Surface) {
        surface.clear();
    }

    fn draw_sprite(
        &mut self,
        video: &VideoEntity,
        sprite: &SpriteEntity,
        fe: &FrameEntity,
        surface: &mut dyn Surface,
    ) -> SvgaResult<()> {
        surface.set_global_alpha(fe.alpha);
        surface.concat_transform(fe.transform.to_affine());

        let key = sprite.image_key.as_deref();
        if let Some(el) = key.and_then(|k| video.dynamic_elements.get(k)) {
            let dst = el.fit.fit(el.drawable.intrinsic_size(), fe.layout.to_rect());
            el.drawable.draw(surface, dst)?;
        } else if let Some(bitmap) = key.and_then(|k| video.images.get(k)) {
            // Own scope so the clip does not leak into the shapes below.
            surface.save();
            let res = self.draw_bitmap(bitmap, fe.clip_path.as_deref(), surface);
            surface.restore();
            res?;
        }

        for shape in &fe.shapes {
            surface.save();
            let res = self.draw_shape(shape, surface);
            surface.restore();
            res?;
        }
        Ok(())
    }

    fn draw_bitmap(
        &mut self,
        bitmap: &Bitmap,
        clip_path: Option<&str>,
        surface: &mut dyn Surface,
    ) -> SvgaResult<()> {
        if let Some(d) = clip_path {
            let clip = self.cached_path(d)?;
            surface.clip(clip);
        }
        let (w, h) = bitmap.size();
        surface.draw_bitmap(bitmap, Rect::new(0.0, 0.0, w, h))
    }

    fn draw_shape(&mut self, shape: &ShapeEntity, surface: &mut dyn Surface) -> SvgaResult<()> {
        let Some(style) = shape.style.as_ref() else {
            return Ok(());
        };
        let path = self.path_for(&shape.kind)?;
        surface.concat_transform(shape.transform.to_affine());

        // Fill wins over stroke.
        if let Some(fill) = style.fill {
            surface.fill_path(&path, fill)
        } else if let Some(stroke) = style.stroke
            && style.stroke_width > 0.0
        {
            surface.stroke_path(&path, stroke, &StrokeStyle::from_style(style))
        } else {
            Ok(())
        }
    }

    fn path_for(&mut self, kind: &ShapeKind) -> SvgaResult<Cow<'_, BezPath>> {
        match kind {
            ShapeKind::Path { d } => Ok(Cow::Borrowed(self.cached_path(d)?)),
            other => Ok(Cow::Owned(shape_path(other)?)),
        }
    }

    fn cached_path(&mut self, d: &str) -> SvgaResult<&BezPath> {
        if !self.paths.contains_key(d) {
            let parsed = parse_path(d)?;
            self.paths.insert(d.to_owned(), parsed);
        }
        Ok(&self.paths[d])
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/renderer.rs"]
mod tests;
