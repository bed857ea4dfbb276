use std::collections::BTreeMap;

use super::*;
use crate::foundation::core::Canvas;
use crate::model::{FormatVersion, FrameEntity, SpriteEntity};

/// Test decoder: payload `[w, h]` decodes to a `w` x `h` bitmap, anything else fails.
struct SizeDecoder;

impl ImageDecoder for SizeDecoder {
    fn decode(&self, key: &str, bytes: &[u8]) -> anyhow::Result<Bitmap> {
        match bytes {
            [w, h] => Ok(Bitmap::solid(u32::from(*w), u32::from(*h), [0, 0, 0, 255])),
            _ => Err(anyhow!("payload for '{key}' is not a size pair")),
        }
    }
}

fn movie(images: &[(&str, &[u8])], sprite_keys: &[Option<&str>]) -> MovieEntity {
    MovieEntity {
        version: FormatVersion::V2,
        version_tag: String::new(),
        canvas: Canvas {
            width: 10.0,
            height: 10.0,
        },
        fps: 20,
        frame_count: 1,
        sprites: sprite_keys
            .iter()
            .map(|k| SpriteEntity {
                image_key: k.map(str::to_owned),
                frames: vec![FrameEntity::default()],
                matte_key: None,
            })
            .collect(),
        images: images
            .iter()
            .map(|(k, v)| ((*k).to_owned(), v.to_vec()))
            .collect::<BTreeMap<_, _>>(),
    }
}

#[test]
fn build_resolves_every_referenced_image() {
    let m = movie(
        &[("a", &[2, 3]), ("b", &[4, 5])],
        &[Some("a"), None, Some("b"), Some("a")],
    );
    let video = build(m, Arc::new(SizeDecoder)).unwrap();
    assert_eq!(video.images.len(), 2);
    assert_eq!(video.images["a"].size(), (2.0, 3.0));
    assert_eq!(video.images["b"].size(), (4.0, 5.0));
    assert!(video.dynamic_elements.is_empty());
    assert!(video.hidden.is_empty());
}

#[test]
fn build_fails_naming_the_undecodable_key() {
    let m = movie(&[("good", &[1, 1]), ("bad", b"xyz")], &[Some("good"), Some("bad")]);
    let err = build(m, Arc::new(SizeDecoder)).unwrap_err();
    assert!(matches!(err, SvgaError::ImageDecode { ref key, .. } if key == "bad"));
}

#[test]
fn first_failure_wins_when_several_keys_fail() {
    let m = movie(
        &[("x", b"bad"), ("y", b"worse"), ("ok", &[1, 1])],
        &[Some("x"), Some("y"), Some("ok")],
    );
    let err = build(m, Arc::new(SizeDecoder)).unwrap_err();
    let SvgaError::ImageDecode { key, .. } = err else {
        panic!("expected an image decode error");
    };
    assert!(key == "x" || key == "y");
}

#[test]
fn unreferenced_payloads_are_never_decoded() {
    // "audio" is not referenced by any sprite and is not an image.
    let m = movie(&[("a", &[1, 2]), ("audio", b"ID3....")], &[Some("a")]);
    let video = build(m, Arc::new(SizeDecoder)).unwrap();
    assert_eq!(video.images.len(), 1);
    assert!(!video.images.contains_key("audio"));
}

#[test]
fn missing_payload_for_referenced_key_is_skipped() {
    let m = movie(&[], &[Some("ghost")]);
    let video = build(m, Arc::new(SizeDecoder)).unwrap();
    assert!(video.images.is_empty());
}

#[test]
fn fit_modes_place_source_in_layout() {
    let layout = Rect::new(0.0, 0.0, 100.0, 50.0);
    let src = (20.0, 20.0);

    assert_eq!(
        FitMode::Contain.fit(src, layout),
        Rect::new(25.0, 0.0, 75.0, 50.0)
    );
    assert_eq!(
        FitMode::Cover.fit(src, layout),
        Rect::new(0.0, -25.0, 100.0, 75.0)
    );
    assert_eq!(FitMode::Fill.fit(src, layout), layout);
    assert_eq!(
        FitMode::None.fit(src, layout),
        Rect::new(40.0, 15.0, 60.0, 35.0)
    );
    assert_eq!(FitMode::default(), FitMode::None);
}

#[test]
fn degenerate_source_fills_layout() {
    let layout = Rect::new(1.0, 2.0, 3.0, 4.0);
    assert_eq!(FitMode::Contain.fit((0.0, 5.0), layout), layout);
}

#[test]
fn hidden_and_dynamic_maps_are_editable() {
    let mut video = VideoEntity::new(movie(&[], &[Some("a")]), HashMap::new());
    video.set_hidden("a", true);
    assert!(video.hidden.contains("a"));
    video.set_hidden("a", false);
    assert!(video.hidden.is_empty());

    let bmp: Arc<dyn Drawable> = Arc::new(Bitmap::solid(1, 1, [0, 0, 0, 0]));
    video.set_dynamic_element("a", DynamicElement::new(bmp, FitMode::Cover));
    assert_eq!(video.dynamic_elements["a"].fit, FitMode::Cover);
    video.clear_dynamic();
    assert!(video.dynamic_elements.is_empty());
}
