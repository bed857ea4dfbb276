use super::*;
use crate::format::encode::encode;
use crate::format::wire::Writer;

fn sample_movie(version: FormatVersion) -> MovieEntity {
    let style = Style {
        fill: Some(Rgba::new(1.0, 0.5, 0.25, 1.0)),
        stroke: Some(Rgba::opaque(0.0, 0.0, 1.0)),
        stroke_width: 2.0,
        line_cap: LineCap::Round,
        line_join: LineJoin::Bevel,
        miter_limit: 8.0,
        dashes: vec![4.0, 2.0, 1.0],
    };
    let frame = |alpha: f64, tx: f64| FrameEntity {
        alpha,
        transform: Transform {
            tx,
            ty: -3.5,
            ..Transform::IDENTITY
        },
        layout: Layout {
            x: 0.0,
            y: 0.0,
            width: 64.0,
            height: 32.0,
        },
        clip_path: match version {
            FormatVersion::V2 => Some("M0 0 L64 0 L64 32 Z".to_owned()),
            FormatVersion::V1 => None,
        },
        shapes: vec![
            ShapeEntity {
                kind: ShapeKind::Path {
                    d: "M0 0 L10 0 L10 10 Z".to_owned(),
                },
                transform: Transform::IDENTITY,
                style: Some(style.clone()),
            },
            ShapeEntity {
                kind: ShapeKind::Rect {
                    x: 1.0,
                    y: 2.0,
                    width: 30.0,
                    height: 20.0,
                    corner_radius: 4.0,
                },
                transform: Transform {
                    a: 2.0,
                    d: 0.5,
                    ..Transform::IDENTITY
                },
                style: None,
            },
            ShapeEntity {
                kind: ShapeKind::Ellipse {
                    x: 5.0,
                    y: 6.0,
                    radius_x: 7.0,
                    radius_y: 8.0,
                },
                transform: Transform::IDENTITY,
                style: Some(Style::default()),
            },
        ],
    };

    let mut images = BTreeMap::new();
    images.insert("img_0".to_owned(), vec![0x89, b'P', b'N', b'G', 0, 1, 2]);
    images.insert("img_1".to_owned(), vec![]);

    MovieEntity {
        version,
        version_tag: "2.0.0".to_owned(),
        canvas: Canvas {
            width: 750.0,
            height: 400.0,
        },
        fps: 30,
        frame_count: 2,
        sprites: vec![
            SpriteEntity {
                image_key: Some("img_0".to_owned()),
                frames: vec![frame(1.0, 10.0), frame(0.5, 12.25)],
                matte_key: match version {
                    FormatVersion::V2 => Some("img_1".to_owned()),
                    FormatVersion::V1 => None,
                },
            },
            SpriteEntity {
                image_key: None,
                frames: vec![FrameEntity::default(), frame(0.0, 0.0)],
                matte_key: None,
            },
        ],
        images,
    }
}

fn body_bytes(version: FormatVersion, f: impl FnOnce(&mut Writer)) -> Vec<u8> {
    let mut out = b"SVGA".to_vec();
    out.push(version.major());
    out.push(0);
    let mut w = Writer::new();
    f(&mut w);
    out.extend_from_slice(&w.into_bytes());
    out
}

fn params(w: &mut Writer, frames: u64) {
    w.message(2, |p| {
        p.float(1, 100.0);
        p.float(2, 50.0);
        p.uint(3, 24);
        p.uint(4, frames);
    });
}

#[test]
fn roundtrip_v2_is_field_for_field() {
    let movie = sample_movie(FormatVersion::V2);
    let bytes = encode(&movie, FormatVersion::V2);
    let decoded = decode(&bytes).unwrap();
    assert_eq!(decoded, movie);
}

#[test]
fn roundtrip_v1_is_field_for_field() {
    let movie = sample_movie(FormatVersion::V1);
    let bytes = encode(&movie, FormatVersion::V1);
    let decoded = decode(&bytes).unwrap();
    assert_eq!(decoded, movie);
}

#[test]
fn v1_writer_drops_clip_and_matte() {
    let mut movie = sample_movie(FormatVersion::V2);
    movie.version = FormatVersion::V1;
    let decoded = decode(&encode(&movie, FormatVersion::V1)).unwrap();
    assert!(decoded.sprites[0].matte_key.is_none());
    assert!(decoded.sprites[0].frames[0].clip_path.is_none());
    assert_eq!(decoded.sprites[0].frames[0].shapes, movie.sprites[0].frames[0].shapes);
}

#[test]
fn every_sprite_has_frame_count_frames() {
    let bytes = body_bytes(FormatVersion::V2, |w| {
        params(w, 3);
        // One frame only; the decoder pads to the declared count.
        w.message(4, |s| s.message(2, |f| f.float(1, 1.0)));
        // Five frames; truncated to three.
        w.message(4, |s| {
            for _ in 0..5 {
                s.message(2, |f| f.float(1, 1.0));
            }
        });
    });
    let movie = decode(&bytes).unwrap();
    assert_eq!(movie.frame_count, 3);
    for sprite in &movie.sprites {
        assert_eq!(sprite.frames.len(), 3);
    }
    assert_eq!(movie.sprites[0].frames[1].alpha, 0.0);
}

#[test]
fn unknown_fields_are_skipped() {
    let bytes = body_bytes(FormatVersion::V2, |w| {
        w.uint(99, 12345);
        params(w, 1);
        w.string(42, "future metadata");
        w.float(77, 3.0);
        w.message(4, |s| {
            s.string(1, "a");
            s.message(15, |x| x.uint(1, 1));
            s.message(2, |f| {
                f.float(1, 1.0);
                f.uint(30, 9);
            });
        });
    });
    let movie = decode(&bytes).unwrap();
    assert_eq!(movie.sprites.len(), 1);
    assert_eq!(movie.sprites[0].image_key.as_deref(), Some("a"));
    assert_eq!(movie.sprites[0].frames[0].alpha, 1.0);
}

#[test]
fn absent_transform_fields_take_identity_defaults() {
    let bytes = body_bytes(FormatVersion::V2, |w| {
        params(w, 1);
        w.message(4, |s| {
            s.message(2, |f| {
                f.float(1, 1.0);
                // Only tx present: a/d must default to 1.0.
                f.message(3, |t| t.float(5, 7.0));
            })
        });
    });
    let movie = decode(&bytes).unwrap();
    let t = movie.sprites[0].frames[0].transform;
    assert_eq!((t.a, t.b, t.c, t.d, t.tx, t.ty), (1.0, 0.0, 0.0, 1.0, 7.0, 0.0));
}

#[test]
fn keep_shape_reuses_previous_frame_shapes() {
    let bytes = body_bytes(FormatVersion::V2, |w| {
        params(w, 3);
        w.message(4, |s| {
            s.message(2, |f| {
                f.float(1, 1.0);
                f.message(5, |sh| {
                    sh.uint(1, 2);
                    sh.message(4, |e| {
                        e.float(3, 5.0);
                        e.float(4, 5.0);
                    });
                });
            });
            s.message(2, |f| {
                f.float(1, 1.0);
                f.message(5, |sh| sh.uint(1, 3));
            });
            s.message(2, |f| f.float(1, 1.0));
        });
    });
    let movie = decode(&bytes).unwrap();
    let frames = &movie.sprites[0].frames;
    assert_eq!(frames[0].shapes.len(), 1);
    assert_eq!(frames[1].shapes, frames[0].shapes);
    assert!(frames[2].shapes.is_empty());
}

#[test]
fn missing_style_fields_use_defaults() {
    let bytes = body_bytes(FormatVersion::V2, |w| {
        params(w, 1);
        w.message(4, |s| {
            s.message(2, |f| {
                f.message(5, |sh| {
                    sh.message(2, |a| a.string(1, "M0 0"));
                    sh.message(10, |st| st.float(8, 3.0));
                })
            })
        });
    });
    let movie = decode(&bytes).unwrap();
    let shape = &movie.sprites[0].frames[0].shapes[0];
    assert_eq!(shape.transform, Transform::IDENTITY);
    let style = shape.style.as_ref().unwrap();
    assert_eq!(style.miter_limit, Style::DEFAULT_MITER_LIMIT);
    assert_eq!(style.line_cap, LineCap::Butt);
    assert!(style.fill.is_none());
    assert_eq!(style.dashes, vec![3.0]);
}

#[test]
fn zero_fps_falls_back_to_default() {
    let bytes = body_bytes(FormatVersion::V2, |w| {
        w.message(2, |p| p.uint(4, 1));
    });
    assert_eq!(decode(&bytes).unwrap().fps, DEFAULT_FPS);
}

#[test]
fn zero_frames_is_a_format_error() {
    let bytes = body_bytes(FormatVersion::V2, |w| params(w, 0));
    assert!(matches!(decode(&bytes), Err(SvgaError::Format(_))));
}

#[test]
fn truncated_body_is_rejected_without_partial_result() {
    let movie = sample_movie(FormatVersion::V2);
    let bytes = encode(&movie, FormatVersion::V2);
    let cut = &bytes[..bytes.len() - 3];
    assert!(matches!(decode(cut), Err(SvgaError::Truncated(_))));
}

#[test]
fn header_errors_surface_from_decode() {
    assert!(matches!(decode(b"NOPE\x02\x00"), Err(SvgaError::Format(_))));
    assert!(matches!(
        decode(b"SVGA\x05\x00"),
        Err(SvgaError::Version { major: 5, .. })
    ));
}

#[test]
fn oversized_frame_count_is_rejected_before_padding() {
    let bytes = body_bytes(FormatVersion::V2, |w| {
        params(w, 0x7fff_ffff);
        w.message(4, |_| {});
    });
    assert!(bytes.len() < 32);
    assert!(matches!(decode(&bytes), Err(SvgaError::Format(_))));

    let v1 = body_bytes(FormatVersion::V1, |w| {
        w.uint(5, u64::from(MAX_FRAMES) + 1);
        w.message(7, |_| {});
    });
    assert!(matches!(decode(&v1), Err(SvgaError::Format(_))));
}

#[test]
fn frame_count_at_the_limit_is_padded() {
    let bytes = body_bytes(FormatVersion::V2, |w| {
        params(w, u64::from(MAX_FRAMES));
        w.message(4, |_| {});
    });
    let movie = decode(&bytes).unwrap();
    assert_eq!(movie.sprites[0].frames.len(), MAX_FRAMES as usize);
}

#[test]
fn many_sprites_times_many_frames_is_rejected() {
    let bytes = body_bytes(FormatVersion::V2, |w| {
        params(w, u64::from(MAX_FRAMES));
        for _ in 0..17 {
            w.message(4, |_| {});
        }
    });
    assert!(matches!(decode(&bytes), Err(SvgaError::Format(_))));
}

#[test]
fn frame_alpha_is_clamped_to_unit_range() {
    let bytes = body_bytes(FormatVersion::V2, |w| {
        params(w, 4);
        w.message(4, |s| {
            for alpha in [5.0, -1.0, f64::NAN, 0.25] {
                s.message(2, |f| f.float(1, alpha));
            }
        });
    });
    let movie = decode(&bytes).unwrap();
    let alphas: Vec<f64> = movie.sprites[0].frames.iter().map(|f| f.alpha).collect();
    assert_eq!(alphas, vec![1.0, 0.0, 0.0, 0.25]);
}
