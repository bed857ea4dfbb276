use crate::format::header::write_header;
use crate::format::wire::Writer;
use crate::foundation::core::Rgba;
use crate::model::{
    FormatVersion, FrameEntity, Layout, MovieEntity, ShapeEntity, ShapeKind, SpriteEntity, Style,
    Transform,
};

/// Serialize a movie into a container of the given schema version.
///
/// `decode(&encode(m, v))` reproduces `m` field-for-field for values representable as `f32`.
/// The v1 layout has no clip paths or matte keys; those are dropped when writing v1.
pub fn encode(movie: &MovieEntity, version: FormatVersion) -> Vec<u8> {
    let mut w = Writer::new();
    match version {
        FormatVersion::V2 => {
            w.string(1, &movie.version_tag);
            w.message(2, |p| {
                p.float(1, movie.canvas.width);
                p.float(2, movie.canvas.height);
                p.uint(3, u64::from(movie.fps));
                p.uint(4, u64::from(movie.frame_count));
            });
            for (key, bytes) in &movie.images {
                w.message(3, |e| write_image_entry(e, key, bytes));
            }
            for sprite in &movie.sprites {
                w.message(4, |s| write_sprite(s, sprite, version));
            }
        }
        FormatVersion::V1 => {
            w.string(1, &movie.version_tag);
            w.float(2, movie.canvas.width);
            w.float(3, movie.canvas.height);
            w.uint(4, u64::from(movie.fps));
            w.uint(5, u64::from(movie.frame_count));
            for (key, bytes) in &movie.images {
                w.message(6, |e| write_image_entry(e, key, bytes));
            }
            for sprite in &movie.sprites {
                w.message(7, |s| write_sprite(s, sprite, version));
            }
        }
    }

    let body = w.into_bytes();
    let mut out = Vec::with_capacity(body.len() + crate::format::header::HEADER_LEN);
    write_header(&mut out, version);
    out.extend_from_slice(&body);
    out
}

fn write_image_entry(w: &mut Writer, key: &str, bytes: &[u8]) {
    w.string(1, key);
    w.bytes(2, bytes);
}

fn write_sprite(w: &mut Writer, sprite: &SpriteEntity, version: FormatVersion) {
    if let Some(key) = &sprite.image_key {
        w.string(1, key);
    }
    for frame in &sprite.frames {
        w.message(2, |f| write_frame(f, frame, version));
    }
    if version == FormatVersion::V2
        && let Some(matte) = &sprite.matte_key
    {
        w.string(3, matte);
    }
}

fn write_frame(w: &mut Writer, frame: &FrameEntity, version: FormatVersion) {
    w.float(1, frame.alpha);
    w.message(2, |l| write_layout(l, &frame.layout));
    w.message(3, |t| write_transform(t, &frame.transform));
    if version == FormatVersion::V2
        && let Some(clip) = &frame.clip_path
    {
        w.string(4, clip);
    }
    for shape in &frame.shapes {
        w.message(5, |s| write_shape(s, shape));
    }
}

fn write_layout(w: &mut Writer, layout: &Layout) {
    w.float(1, layout.x);
    w.float(2, layout.y);
    w.float(3, layout.width);
    w.float(4, layout.height);
}

fn write_transform(w: &mut Writer, t: &Transform) {
    w.float(1, t.a);
    w.float(2, t.b);
    w.float(3, t.c);
    w.float(4, t.d);
    w.float(5, t.tx);
    w.float(6, t.ty);
}

fn write_shape(w: &mut Writer, shape: &ShapeEntity) {
    match &shape.kind {
        ShapeKind::Path { d } => {
            w.uint(1, 0);
            w.message(2, |a| a.string(1, d));
        }
        ShapeKind::Rect {
            x,
            y,
            width,
            height,
            corner_radius,
        } => {
            w.uint(1, 1);
            w.message(3, |a| {
                a.float(1, *x);
                a.float(2, *y);
                a.float(3, *width);
                a.float(4, *height);
                a.float(5, *corner_radius);
            });
        }
        ShapeKind::Ellipse {
            x,
            y,
            radius_x,
            radius_y,
        } => {
            w.uint(1, 2);
            w.message(4, |a| {
                a.float(1, *x);
                a.float(2, *y);
                a.float(3, *radius_x);
                a.float(4, *radius_y);
            });
        }
    }
    if let Some(style) = &shape.style {
        w.message(10, |s| write_style(s, style));
    }
    w.message(11, |t| write_transform(t, &shape.transform));
}

fn write_style(w: &mut Writer, style: &Style) {
    if let Some(fill) = style.fill {
        w.message(1, |c| write_color(c, fill));
    }
    if let Some(stroke) = style.stroke {
        w.message(2, |c| write_color(c, stroke));
    }
    w.float(3, style.stroke_width);
    w.uint(4, style.line_cap.to_wire());
    w.uint(5, style.line_join.to_wire());
    w.float(6, style.miter_limit);
    for (i, dash) in style.dashes.iter().take(Style::MAX_DASHES).enumerate() {
        w.float(7 + i as u32, *dash);
    }
}

fn write_color(w: &mut Writer, c: Rgba) {
    w.float(1, f64::from(c.r));
    w.float(2, f64::from(c.g));
    w.float(3, f64::from(c.b));
    w.float(4, f64::from(c.a));
}
