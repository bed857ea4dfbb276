use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, mpsc};

use anyhow::anyhow;

use crate::assets::bitmap::{Bitmap, ImageDecoder};
use crate::foundation::core::Rect;
use crate::foundation::error::{SvgaError, SvgaResult};
use crate::model::MovieEntity;
use crate::render::surface::Drawable;

/// Strategy for scaling a replacement drawable into a frame's layout rectangle.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum FitMode {
    /// Uniform scale so the source fits inside the layout, centred.
    Contain,
    /// Uniform scale so the source covers the layout, centred. Overflow is not clipped here.
    Cover,
    /// Non-uniform stretch to the layout size.
    Fill,
    /// Intrinsic size, centred.
    #[default]
    None,
}

impl FitMode {
    /// Destination rectangle for a source of `src` size placed in `layout`.
    pub fn fit(self, src: (f64, f64), layout: Rect) -> Rect {
        let (sw, sh) = src;
        let (lw, lh) = (layout.width(), layout.height());
        if self == Self::Fill || sw <= 0.0 || sh <= 0.0 {
            return layout;
        }
        let scale = match self {
            Self::Contain => (lw / sw).min(lh / sh),
            Self::Cover => (lw / sw).max(lh / sh),
            Self::None | Self::Fill => 1.0,
        };
        let (w, h) = (sw * scale, sh * scale);
        let center = layout.center();
        Rect::new(
            center.x - w / 2.0,
            center.y - h / 2.0,
            center.x + w / 2.0,
            center.y + h / 2.0,
        )
    }
}

/// Caller-supplied replacement content for one image key.
#[derive(Clone, Debug)]
pub struct DynamicElement {
    pub drawable: Arc<dyn Drawable>,
    pub fit: FitMode,
}

impl DynamicElement {
    pub fn new(drawable: Arc<dyn Drawable>, fit: FitMode) -> Self {
        Self { drawable, fit }
    }
}

/// A decoded movie plus resolved bitmaps, ready for playback.
///
/// The movie itself is read-only. `images`, `dynamic_elements` and `hidden` may be edited by
/// callers between mounts.
#[derive(Debug)]
pub struct VideoEntity {
    movie: MovieEntity,
    /// Resolved bitmaps by image key; callers may override entries.
    pub images: HashMap<String, Bitmap>,
    /// Replacement drawables by image key.
    pub dynamic_elements: HashMap<String, DynamicElement>,
    /// Image keys whose sprites are not drawn.
    pub hidden: BTreeSet<String>,
}

impl VideoEntity {
    pub fn new(movie: MovieEntity, images: HashMap<String, Bitmap>) -> Self {
        Self {
            movie,
            images,
            dynamic_elements: HashMap::new(),
            hidden: BTreeSet::new(),
        }
    }

    pub fn movie(&self) -> &MovieEntity {
        &self.movie
    }

    pub fn frame_count(&self) -> u32 {
        self.movie.frame_count
    }

    pub fn fps(&self) -> u32 {
        self.movie.fps
    }

    /// Replace the sprite content for `key` with an external drawable.
    pub fn set_dynamic_element(&mut self, key: impl Into<String>, element: DynamicElement) {
        self.dynamic_elements.insert(key.into(), element);
    }

    /// Hide (or show again) every sprite using `key`.
    pub fn set_hidden(&mut self, key: impl Into<String>, hidden: bool) {
        let key = key.into();
        if hidden {
            self.hidden.insert(key);
        } else {
            self.hidden.remove(&key);
        }
    }

    /// Drop every dynamic override and hidden key.
    pub fn clear_dynamic(&mut self) {
        self.dynamic_elements.clear();
        self.hidden.clear();
    }
}

/// Resolve every referenced image payload and produce a [`VideoEntity`].
///
/// Decodes run concurrently on the rayon pool. The first failure to arrive fails the build with
/// [`SvgaError::ImageDecode`]; decodes still in flight finish on their own and are discarded.
/// Payloads no sprite references are never decoded.
#[tracing::instrument(skip(movie, decoder), fields(frames = movie.frame_count))]
pub fn build(movie: MovieEntity, decoder: Arc<dyn ImageDecoder>) -> SvgaResult<VideoEntity> {
    let mut jobs = Vec::<(String, Vec<u8>)>::new();
    for key in movie.referenced_image_keys() {
        match movie.images.get(key) {
            Some(bytes) => jobs.push((key.to_owned(), bytes.clone())),
            None => tracing::debug!(key, "sprite references an image key with no payload"),
        }
    }

    let pending = jobs.len();
    let (tx, rx) = mpsc::channel::<(String, anyhow::Result<Bitmap>)>();
    for (key, bytes) in jobs {
        let tx = tx.clone();
        let decoder = Arc::clone(&decoder);
        rayon::spawn(move || {
            let res = decoder.decode(&key, &bytes);
            // The receiver is gone once the build has already failed.
            let _ = tx.send((key, res));
        });
    }
    drop(tx);

    let mut images = HashMap::with_capacity(pending);
    for _ in 0..pending {
        let (key, res) = rx
            .recv()
            .map_err(|_| anyhow!("image decode task exited without reporting"))?;
        match res {
            Ok(bitmap) => {
                images.insert(key, bitmap);
            }
            Err(e) => {
                tracing::warn!(key = %key, error = %format!("{e:#}"), "image decode failed");
                return Err(SvgaError::image_decode(key, format!("{e:#}")));
            }
        }
    }

    tracing::debug!(images = images.len(), "video entity built");
    Ok(VideoEntity::new(movie, images))
}

#[cfg(test)]
#[path = "../../tests/unit/assets/video.rs"]
mod tests;
