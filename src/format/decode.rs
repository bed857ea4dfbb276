use std::collections::BTreeMap;

use crate::format::header::{HEADER_LEN, sniff_version};
use crate::format::wire::{Reader, WireType};
use crate::foundation::core::{Canvas, Rgba};
use crate::foundation::error::{SvgaError, SvgaResult};
use crate::model::{
    FormatVersion, FrameEntity, Layout, LineCap, LineJoin, MovieEntity, ShapeEntity, ShapeKind,
    SpriteEntity, Style, Transform,
};

/// Frame rate assumed when a producer declares none.
pub const DEFAULT_FPS: u32 = 20;

/// Largest frame count a movie may declare.
pub const MAX_FRAMES: u32 = 1 << 16;

/// Upper bound on `sprites * frame_count`, i.e. the frames held after padding.
const MAX_FRAME_SLOTS: usize = 1 << 20;

const SHAPE_TYPE_PATH: u64 = 0;
const SHAPE_TYPE_RECT: u64 = 1;
const SHAPE_TYPE_ELLIPSE: u64 = 2;
const SHAPE_TYPE_KEEP: u64 = 3;

/// Decode a complete container (header + body) into a [`MovieEntity`].
///
/// No partial result is ever returned: any header, version or truncation problem fails the
/// whole call.
#[tracing::instrument(skip(bytes), fields(len = bytes.len()))]
pub fn decode(bytes: &[u8]) -> SvgaResult<MovieEntity> {
    let header = sniff_version(bytes)?;
    let body = &bytes[HEADER_LEN..];
    let raw = match header.version {
        FormatVersion::V1 => decode_movie_v1(body)?,
        FormatVersion::V2 => decode_movie_v2(body)?,
    };
    let movie = raw.finish(header.version)?;
    tracing::debug!(
        version = ?movie.version,
        frames = movie.frame_count,
        fps = movie.fps,
        sprites = movie.sprites.len(),
        images = movie.images.len(),
        "decoded movie"
    );
    Ok(movie)
}

#[derive(Default)]
struct RawMovie {
    version_tag: String,
    canvas: Canvas,
    fps: i64,
    frames: i64,
    images: BTreeMap<String, Vec<u8>>,
    sprites: Vec<SpriteEntity>,
}

impl RawMovie {
    fn finish(self, version: FormatVersion) -> SvgaResult<MovieEntity> {
        if self.frames <= 0 {
            return Err(SvgaError::format(format!(
                "frame count must be > 0, got {}",
                self.frames
            )));
        }
        let frame_count = match u32::try_from(self.frames) {
            Ok(v) if v <= MAX_FRAMES => v,
            _ => {
                return Err(SvgaError::format(format!(
                    "frame count {} exceeds the limit of {MAX_FRAMES}",
                    self.frames
                )));
            }
        };
        let slots = self.sprites.len().saturating_mul(frame_count as usize);
        if slots > MAX_FRAME_SLOTS {
            return Err(SvgaError::format(format!(
                "{} sprites x {frame_count} frames exceeds the limit of {MAX_FRAME_SLOTS} frames",
                self.sprites.len()
            )));
        }
        let fps = match u32::try_from(self.fps) {
            Ok(v) if v > 0 => v,
            _ => DEFAULT_FPS,
        };

        let mut sprites = self.sprites;
        for (i, sprite) in sprites.iter_mut().enumerate() {
            let n = sprite.frames.len();
            if n != frame_count as usize {
                tracing::debug!(
                    sprite = i,
                    declared = frame_count,
                    found = n,
                    "normalizing sprite frame count"
                );
                sprite.frames.resize_with(frame_count as usize, FrameEntity::default);
            }
        }

        Ok(MovieEntity {
            version,
            version_tag: self.version_tag,
            canvas: self.canvas,
            fps,
            frame_count,
            sprites,
            images: self.images,
        })
    }
}

fn decode_movie_v2(body: &[u8]) -> SvgaResult<RawMovie> {
    let mut out = RawMovie::default();
    let mut r = Reader::new(body);
    while !r.is_empty() {
        let (field, wt) = r.read_tag()?;
        match (field, wt) {
            (1, WireType::Len) => out.version_tag = r.read_string()?,
            (2, WireType::Len) => decode_params(r.read_len()?, &mut out)?,
            (3, WireType::Len) => decode_image_entry(r.read_len()?, &mut out.images)?,
            (4, WireType::Len) => out
                .sprites
                .push(decode_sprite(r.read_len()?, FormatVersion::V2)?),
            _ => r.skip(wt)?,
        }
    }
    Ok(out)
}

fn decode_movie_v1(body: &[u8]) -> SvgaResult<RawMovie> {
    let mut out = RawMovie::default();
    let mut r = Reader::new(body);
    while !r.is_empty() {
        let (field, wt) = r.read_tag()?;
        match (field, wt) {
            (1, WireType::Len) => out.version_tag = r.read_string()?,
            (2, _) => out.canvas.width = r.read_float(wt)?,
            (3, _) => out.canvas.height = r.read_float(wt)?,
            (4, _) => out.fps = r.read_uint(wt)? as i64,
            (5, _) => out.frames = r.read_uint(wt)? as i64,
            (6, WireType::Len) => decode_image_entry(r.read_len()?, &mut out.images)?,
            (7, WireType::Len) => out
                .sprites
                .push(decode_sprite(r.read_len()?, FormatVersion::V1)?),
            _ => r.skip(wt)?,
        }
    }
    Ok(out)
}

fn decode_params(buf: &[u8], out: &mut RawMovie) -> SvgaResult<()> {
    let mut r = Reader::new(buf);
    while !r.is_empty() {
        let (field, wt) = r.read_tag()?;
        match field {
            1 => out.canvas.width = r.read_float(wt)?,
            2 => out.canvas.height = r.read_float(wt)?,
            // int32 on the wire; negative values arrive sign-extended to 64 bits.
            3 => out.fps = r.read_uint(wt)? as i64,
            4 => out.frames = r.read_uint(wt)? as i64,
            _ => r.skip(wt)?,
        }
    }
    Ok(())
}

fn decode_image_entry(buf: &[u8], images: &mut BTreeMap<String, Vec<u8>>) -> SvgaResult<()> {
    let mut r = Reader::new(buf);
    let mut key = String::new();
    let mut value = Vec::new();
    while !r.is_empty() {
        let (field, wt) = r.read_tag()?;
        match (field, wt) {
            (1, WireType::Len) => key = r.read_string()?,
            (2, WireType::Len) => value = r.read_len()?.to_vec(),
            _ => r.skip(wt)?,
        }
    }
    images.insert(key, value);
    Ok(())
}

fn decode_sprite(buf: &[u8], version: FormatVersion) -> SvgaResult<SpriteEntity> {
    let mut sprite = SpriteEntity::default();
    let mut r = Reader::new(buf);
    while !r.is_empty() {
        let (field, wt) = r.read_tag()?;
        match (field, wt) {
            (1, WireType::Len) => sprite.image_key = non_empty(r.read_string()?),
            (2, WireType::Len) => {
                let (mut frame, keep) = decode_frame(r.read_len()?, version)?;
                if keep {
                    frame.shapes = sprite
                        .frames
                        .last()
                        .map(|prev| prev.shapes.clone())
                        .unwrap_or_default();
                }
                sprite.frames.push(frame);
            }
            (3, WireType::Len) if version == FormatVersion::V2 => {
                sprite.matte_key = non_empty(r.read_string()?)
            }
            _ => r.skip(wt)?,
        }
    }
    Ok(sprite)
}

/// Decode one frame. The flag reports a leading KEEP shape (re-use the previous frame's shapes).
fn decode_frame(buf: &[u8], version: FormatVersion) -> SvgaResult<(FrameEntity, bool)> {
    let mut frame = FrameEntity::default();
    let mut keep = false;
    let mut r = Reader::new(buf);
    while !r.is_empty() {
        let (field, wt) = r.read_tag()?;
        match (field, wt) {
            (1, _) => frame.alpha = unit_alpha(r.read_float(wt)?),
            (2, WireType::Len) => frame.layout = decode_layout(r.read_len()?)?,
            (3, WireType::Len) => frame.transform = decode_transform(r.read_len()?)?,
            (4, WireType::Len) if version == FormatVersion::V2 => {
                frame.clip_path = non_empty(r.read_string()?)
            }
            (5, WireType::Len) => match decode_shape(r.read_len()?)? {
                DecodedShape::Shape(shape) => frame.shapes.push(shape),
                DecodedShape::Keep => keep = frame.shapes.is_empty() || keep,
                DecodedShape::Unknown(kind) => {
                    tracing::debug!(kind, "skipping shape of unknown type");
                }
            },
            _ => r.skip(wt)?,
        }
    }
    Ok((frame, keep))
}

fn decode_layout(buf: &[u8]) -> SvgaResult<Layout> {
    let mut layout = Layout::default();
    let mut r = Reader::new(buf);
    while !r.is_empty() {
        let (field, wt) = r.read_tag()?;
        match field {
            1 => layout.x = r.read_float(wt)?,
            2 => layout.y = r.read_float(wt)?,
            3 => layout.width = r.read_float(wt)?,
            4 => layout.height = r.read_float(wt)?,
            _ => r.skip(wt)?,
        }
    }
    Ok(layout)
}

fn decode_transform(buf: &[u8]) -> SvgaResult<Transform> {
    // Present message: a/d default to 1.0, the rest to 0.
    let mut t = Transform::IDENTITY;
    let mut r = Reader::new(buf);
    while !r.is_empty() {
        let (field, wt) = r.read_tag()?;
        match field {
            1 => t.a = r.read_float(wt)?,
            2 => t.b = r.read_float(wt)?,
            3 => t.c = r.read_float(wt)?,
            4 => t.d = r.read_float(wt)?,
            5 => t.tx = r.read_float(wt)?,
            6 => t.ty = r.read_float(wt)?,
            _ => r.skip(wt)?,
        }
    }
    Ok(t)
}

enum DecodedShape {
    Shape(ShapeEntity),
    Keep,
    Unknown(u64),
}

#[derive(Default)]
struct RawShapeArgs {
    d: String,
    x: f64,
    y: f64,
    width: f64,
    height: f64,
    corner_radius: f64,
    radius_x: f64,
    radius_y: f64,
}

fn decode_shape(buf: &[u8]) -> SvgaResult<DecodedShape> {
    let mut kind = SHAPE_TYPE_PATH;
    let mut args = RawShapeArgs::default();
    let mut transform = Transform::IDENTITY;
    let mut style = None;
    let mut r = Reader::new(buf);
    while !r.is_empty() {
        let (field, wt) = r.read_tag()?;
        match (field, wt) {
            (1, _) => kind = r.read_uint(wt)?,
            (2, WireType::Len) => decode_path_args(r.read_len()?, &mut args)?,
            (3, WireType::Len) => decode_rect_args(r.read_len()?, &mut args)?,
            (4, WireType::Len) => decode_ellipse_args(r.read_len()?, &mut args)?,
            (10, WireType::Len) => style = Some(decode_style(r.read_len()?)?),
            (11, WireType::Len) => transform = decode_transform(r.read_len()?)?,
            _ => r.skip(wt)?,
        }
    }

    let kind = match kind {
        SHAPE_TYPE_PATH => ShapeKind::Path { d: args.d },
        SHAPE_TYPE_RECT => ShapeKind::Rect {
            x: args.x,
            y: args.y,
            width: args.width,
            height: args.height,
            corner_radius: args.corner_radius,
        },
        SHAPE_TYPE_ELLIPSE => ShapeKind::Ellipse {
            x: args.x,
            y: args.y,
            radius_x: args.radius_x,
            radius_y: args.radius_y,
        },
        SHAPE_TYPE_KEEP => return Ok(DecodedShape::Keep),
        other => return Ok(DecodedShape::Unknown(other)),
    };
    Ok(DecodedShape::Shape(ShapeEntity {
        kind,
        transform,
        style,
    }))
}

fn decode_path_args(buf: &[u8], args: &mut RawShapeArgs) -> SvgaResult<()> {
    let mut r = Reader::new(buf);
    while !r.is_empty() {
        let (field, wt) = r.read_tag()?;
        match (field, wt) {
            (1, WireType::Len) => args.d = r.read_string()?,
            _ => r.skip(wt)?,
        }
    }
    Ok(())
}

fn decode_rect_args(buf: &[u8], args: &mut RawShapeArgs) -> SvgaResult<()> {
    let mut r = Reader::new(buf);
    while !r.is_empty() {
        let (field, wt) = r.read_tag()?;
        match field {
            1 => args.x = r.read_float(wt)?,
            2 => args.y = r.read_float(wt)?,
            3 => args.width = r.read_float(wt)?,
            4 => args.height = r.read_float(wt)?,
            5 => args.corner_radius = r.read_float(wt)?,
            _ => r.skip(wt)?,
        }
    }
    Ok(())
}

fn decode_ellipse_args(buf: &[u8], args: &mut RawShapeArgs) -> SvgaResult<()> {
    let mut r = Reader::new(buf);
    while !r.is_empty() {
        let (field, wt) = r.read_tag()?;
        match field {
            1 => args.x = r.read_float(wt)?,
            2 => args.y = r.read_float(wt)?,
            3 => args.radius_x = r.read_float(wt)?,
            4 => args.radius_y = r.read_float(wt)?,
            _ => r.skip(wt)?,
        }
    }
    Ok(())
}

fn decode_style(buf: &[u8]) -> SvgaResult<Style> {
    let mut style = Style::default();
    let mut dashes: [Option<f64>; Style::MAX_DASHES] = [None; Style::MAX_DASHES];
    let mut r = Reader::new(buf);
    while !r.is_empty() {
        let (field, wt) = r.read_tag()?;
        match (field, wt) {
            (1, WireType::Len) => style.fill = Some(decode_color(r.read_len()?)?),
            (2, WireType::Len) => style.stroke = Some(decode_color(r.read_len()?)?),
            (3, _) => style.stroke_width = r.read_float(wt)?,
            (4, _) => style.line_cap = LineCap::from_wire(r.read_uint(wt)?),
            (5, _) => style.line_join = LineJoin::from_wire(r.read_uint(wt)?),
            (6, _) => style.miter_limit = r.read_float(wt)?,
            (7..=9, _) => dashes[(field - 7) as usize] = Some(r.read_float(wt)?),
            _ => r.skip(wt)?,
        }
    }
    style.dashes = dashes.into_iter().flatten().collect();
    Ok(style)
}

fn decode_color(buf: &[u8]) -> SvgaResult<Rgba> {
    let mut c = Rgba::default();
    let mut r = Reader::new(buf);
    while !r.is_empty() {
        let (field, wt) = r.read_tag()?;
        match field {
            1 => c.r = r.read_float(wt)? as f32,
            2 => c.g = r.read_float(wt)? as f32,
            3 => c.b = r.read_float(wt)? as f32,
            4 => c.a = r.read_float(wt)? as f32,
            _ => r.skip(wt)?,
        }
    }
    Ok(c)
}

/// Clamp to `[0, 1]`; NaN reads as fully transparent.
fn unit_alpha(v: f64) -> f64 {
    if v.is_nan() { 0.0 } else { v.clamp(0.0, 1.0) }
}

fn non_empty(s: String) -> Option<String> {
    if s.is_empty() { None } else { Some(s) }
}

#[cfg(test)]
#[path = "../../tests/unit/format/decode.rs"]
mod tests;
