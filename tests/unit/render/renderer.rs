use std::collections::BTreeMap;
use std::sync::Arc;

use super::*;
use crate::assets::video::{DynamicElement, FitMode};
use crate::foundation::core::{Affine, Canvas, Rgba};
use crate::model::{FormatVersion, Layout, MovieEntity, Style, Transform};
use crate::render::surface::{DrawOp, RecordingSurface};

const RED: Rgba = Rgba::opaque(1.0, 0.0, 0.0);
const BLUE: Rgba = Rgba::opaque(0.0, 0.0, 1.0);

fn frame(alpha: f64) -> FrameEntity {
    FrameEntity {
        alpha,
        ..FrameEntity::default()
    }
}

fn sprite(key: Option<&str>, frames: Vec<FrameEntity>) -> SpriteEntity {
    SpriteEntity {
        image_key: key.map(str::to_owned),
        frames,
        matte_key: None,
    }
}

fn video(sprites: Vec<SpriteEntity>, images: &[(&str, Bitmap)]) -> VideoEntity {
    let frame_count = sprites.first().map_or(1, |s| s.frames.len() as u32);
    let movie = MovieEntity {
        version: FormatVersion::V2,
        version_tag: String::new(),
        canvas: Canvas {
            width: 100.0,
            height: 100.0,
        },
        fps: 20,
        frame_count,
        sprites,
        images: BTreeMap::new(),
    };
    VideoEntity::new(
        movie,
        images
            .iter()
            .map(|(k, b)| ((*k).to_owned(), b.clone()))
            .collect(),
    )
}

fn filled(kind: ShapeKind, fill: Option<Rgba>, stroke: Option<Rgba>) -> ShapeEntity {
    ShapeEntity {
        kind,
        transform: Transform::IDENTITY,
        style: Some(Style {
            fill,
            stroke,
            stroke_width: 2.0,
            ..Style::default()
        }),
    }
}

fn square_path() -> ShapeKind {
    ShapeKind::Path {
        d: "M0 0 L10 0 L10 10 Z".to_owned(),
    }
}

#[test]
fn nearly_transparent_sprites_are_skipped() {
    let v = video(
        vec![sprite(Some("a"), vec![frame(0.04)]), sprite(Some("a"), vec![frame(0.05)])],
        &[("a", Bitmap::solid(4, 4, [0, 0, 0, 255]))],
    );
    let mut s = RecordingSurface::new();
    Renderer::new().render(&v, 0, &mut s).unwrap();

    let alphas: Vec<f64> = s
        .ops()
        .iter()
        .filter_map(|op| match op {
            DrawOp::GlobalAlpha(a) => Some(*a),
            _ => None,
        })
        .collect();
    assert_eq!(alphas, vec![0.05]);
}

#[test]
fn bitmap_is_clipped_in_its_own_scope() {
    let mut fe = frame(0.5);
    fe.transform = Transform {
        tx: 3.0,
        ..Transform::IDENTITY
    };
    fe.clip_path = Some("M0 0 L4 0 L4 4 Z".to_owned());
    let v = video(
        vec![sprite(Some("a"), vec![fe])],
        &[("a", Bitmap::solid(8, 6, [0, 0, 0, 255]))],
    );

    let mut s = RecordingSurface::new();
    Renderer::new().render(&v, 0, &mut s).unwrap();
    let ops = s.ops();

    assert_eq!(ops.len(), 9);
    assert_eq!(ops[0], DrawOp::Clear);
    assert_eq!(ops[1], DrawOp::Save);
    assert_eq!(ops[2], DrawOp::GlobalAlpha(0.5));
    assert_eq!(ops[3], DrawOp::Transform(Affine::translate((3.0, 0.0))));
    assert_eq!(ops[4], DrawOp::Save);
    assert!(matches!(ops[5], DrawOp::Clip(_)));
    assert_eq!(
        ops[6],
        DrawOp::Bitmap {
            size: (8, 6),
            dst: Rect::new(0.0, 0.0, 8.0, 6.0),
            ctm: Affine::translate((3.0, 0.0)),
            alpha: 0.5,
            clipped: true,
        }
    );
    assert_eq!(&ops[7..], &[DrawOp::Restore, DrawOp::Restore]);
    assert_eq!(s.depth(), 0);
}

#[test]
fn shapes_are_drawn_after_the_clip_scope_closes() {
    let mut fe = frame(1.0);
    fe.clip_path = Some("M0 0 L1 0 L1 1 Z".to_owned());
    fe.shapes = vec![filled(square_path(), Some(RED), None)];
    let v = video(
        vec![sprite(Some("a"), vec![fe])],
        &[("a", Bitmap::solid(2, 2, [0, 0, 0, 255]))],
    );

    let mut s = RecordingSurface::new();
    Renderer::new().render(&v, 0, &mut s).unwrap();
    let ops = s.ops();

    let bitmap_at = ops
        .iter()
        .position(|op| matches!(op, DrawOp::Bitmap { .. }))
        .unwrap();
    let fill_at = ops
        .iter()
        .position(|op| matches!(op, DrawOp::Fill { .. }))
        .unwrap();
    assert_eq!(ops[bitmap_at + 1], DrawOp::Restore);
    assert_eq!(ops[bitmap_at + 2], DrawOp::Save);
    assert!(fill_at > bitmap_at + 2);
}

#[test]
fn fill_wins_over_stroke() {
    let mut fe = frame(1.0);
    fe.shapes = vec![
        filled(square_path(), Some(RED), Some(BLUE)),
        filled(square_path(), None, Some(BLUE)),
        filled(square_path(), None, None),
    ];
    let v = video(vec![sprite(None, vec![fe])], &[]);

    let mut s = RecordingSurface::new();
    Renderer::new().render(&v, 0, &mut s).unwrap();

    let draws: Vec<&DrawOp> = s
        .ops()
        .iter()
        .filter(|op| matches!(op, DrawOp::Fill { .. } | DrawOp::Stroke { .. }))
        .collect();
    assert_eq!(draws.len(), 2);
    assert!(matches!(draws[0], DrawOp::Fill { color, .. } if *color == RED));
    assert!(matches!(
        draws[1],
        DrawOp::Stroke { color, stroke, .. } if *color == BLUE && stroke.width == 2.0
    ));
}

#[test]
fn shape_transform_composes_with_sprite_transform() {
    let mut fe = frame(1.0);
    fe.transform = Transform {
        a: 2.0,
        d: 2.0,
        ..Transform::IDENTITY
    };
    let mut shape = filled(
        ShapeKind::Ellipse {
            x: 0.0,
            y: 0.0,
            radius_x: 1.0,
            radius_y: 1.0,
        },
        Some(RED),
        None,
    );
    shape.transform = Transform {
        tx: 5.0,
        ..Transform::IDENTITY
    };
    fe.shapes = vec![shape];
    let v = video(vec![sprite(None, vec![fe])], &[]);

    let mut s = RecordingSurface::new();
    Renderer::new().render(&v, 0, &mut s).unwrap();
    let ctm = s
        .ops()
        .iter()
        .find_map(|op| match op {
            DrawOp::Fill { ctm, .. } => Some(*ctm),
            _ => None,
        })
        .unwrap();
    assert_eq!(ctm, Affine::scale(2.0) * Affine::translate((5.0, 0.0)));
}

#[test]
fn dynamic_element_replaces_bitmap_and_is_fitted() {
    let mut fe = frame(1.0);
    fe.layout = Layout {
        x: 0.0,
        y: 0.0,
        width: 40.0,
        height: 20.0,
    };
    let mut v = video(
        vec![sprite(Some("avatar"), vec![fe])],
        &[("avatar", Bitmap::solid(4, 4, [0, 0, 0, 255]))],
    );
    let replacement = Arc::new(Bitmap::solid(10, 10, [255, 255, 255, 255]));
    v.set_dynamic_element("avatar", DynamicElement::new(replacement, FitMode::Contain));

    let mut s = RecordingSurface::new();
    Renderer::new().render(&v, 0, &mut s).unwrap();
    let bitmaps: Vec<_> = s
        .ops()
        .iter()
        .filter_map(|op| match op {
            DrawOp::Bitmap { size, dst, .. } => Some((*size, *dst)),
            _ => None,
        })
        .collect();
    assert_eq!(bitmaps, vec![((10, 10), Rect::new(10.0, 0.0, 30.0, 20.0))]);
}

#[test]
fn hidden_keys_are_not_drawn() {
    let mut v = video(
        vec![sprite(Some("a"), vec![frame(1.0)])],
        &[("a", Bitmap::solid(1, 1, [0, 0, 0, 255]))],
    );
    v.set_hidden("a", true);
    let mut s = RecordingSurface::new();
    Renderer::new().render(&v, 0, &mut s).unwrap();
    assert_eq!(s.ops(), &[DrawOp::Clear]);
}

#[test]
fn path_strings_are_parsed_once() {
    let mut fe = frame(1.0);
    fe.shapes = vec![
        filled(square_path(), Some(RED), None),
        filled(square_path(), Some(BLUE), None),
    ];
    let v = video(vec![sprite(None, vec![fe.clone(), fe])], &[]);

    let mut r = Renderer::new();
    let mut s = RecordingSurface::new();
    r.render(&v, 0, &mut s).unwrap();
    r.render(&v, 1, &mut s).unwrap();
    assert_eq!(r.cached_paths(), 1);
}

#[test]
fn bad_path_fails_but_other_sprites_still_draw() {
    let mut broken = frame(1.0);
    broken.shapes = vec![filled(
        ShapeKind::Path {
            d: "M0 0 L1".to_owned(),
        },
        Some(RED),
        None,
    )];
    let mut fine = frame(1.0);
    fine.shapes = vec![filled(square_path(), Some(BLUE), None)];
    let v = video(
        vec![sprite(None, vec![broken]), sprite(None, vec![fine])],
        &[],
    );

    let mut s = RecordingSurface::new();
    let err = Renderer::new().render(&v, 0, &mut s).unwrap_err();
    assert!(matches!(err, SvgaError::RenderTransient(_)));
    assert_eq!(s.depth(), 0);
    assert!(
        s.ops()
            .iter()
            .any(|op| matches!(op, DrawOp::Fill { color, .. } if *color == BLUE))
    );
}

#[test]
fn out_of_range_frame_is_rejected() {
    let v = video(vec![sprite(None, vec![frame(1.0)])], &[]);
    let mut s = RecordingSurface::new();
    assert!(matches!(
        Renderer::new().render(&v, 1, &mut s),
        Err(SvgaError::InvalidState(_))
    ));
}

#[test]
fn erase_clears_the_surface() {
    let mut s = RecordingSurface::new();
    Renderer::new().erase(&mut s);
    assert_eq!(s.ops(), &[DrawOp::Clear]);
}
