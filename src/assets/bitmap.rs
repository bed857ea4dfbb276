use std::sync::Arc;

use anyhow::Context;

use crate::foundation::error::{SvgaError, SvgaResult};

/// Decoded raster image in premultiplied RGBA8 form.
///
/// Plain pixel data: cheap to clone, safe to hand across threads.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Bitmap {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Pixel bytes in row-major premultiplied RGBA8.
    pub rgba8_premul: Arc<Vec<u8>>,
}

impl Bitmap {
    /// Wrap premultiplied pixels, checking the buffer length.
    pub fn from_premul_rgba8(width: u32, height: u32, rgba8_premul: Vec<u8>) -> SvgaResult<Self> {
        let expected = (width as usize)
            .saturating_mul(height as usize)
            .saturating_mul(4);
        if rgba8_premul.len() != expected {
            return Err(SvgaError::format(format!(
                "bitmap byte len mismatch: expected {expected}, got {}",
                rgba8_premul.len()
            )));
        }
        Ok(Self {
            width,
            height,
            rgba8_premul: Arc::new(rgba8_premul),
        })
    }

    /// A `width` x `height` bitmap filled with one straight-alpha color.
    pub fn solid(width: u32, height: u32, rgba: [u8; 4]) -> Self {
        let px = premul_rgba8(rgba);
        let n = (width as usize) * (height as usize);
        let mut data = Vec::with_capacity(n * 4);
        for _ in 0..n {
            data.extend_from_slice(&px);
        }
        Self {
            width,
            height,
            rgba8_premul: Arc::new(data),
        }
    }

    /// Intrinsic size as floating-point movie units.
    pub fn size(&self) -> (f64, f64) {
        (f64::from(self.width), f64::from(self.height))
    }
}

/// Capability that turns embedded image bytes into a [`Bitmap`].
///
/// The decoder itself never rasterizes; hosts inject this (or use [`RasterImageDecoder`]).
pub trait ImageDecoder: Send + Sync {
    /// Decode the payload stored under `key`.
    fn decode(&self, key: &str, bytes: &[u8]) -> anyhow::Result<Bitmap>;
}

/// Default [`ImageDecoder`] backed by the `image` crate (PNG, JPEG, ...).
#[derive(Clone, Copy, Debug, Default)]
pub struct RasterImageDecoder;

impl ImageDecoder for RasterImageDecoder {
    fn decode(&self, key: &str, bytes: &[u8]) -> anyhow::Result<Bitmap> {
        let dyn_img = image::load_from_memory(bytes)
            .with_context(|| format!("decode image '{key}' from memory"))?;
        let rgba = dyn_img.to_rgba8();
        let (width, height) = rgba.dimensions();

        let mut rgba8_premul = rgba.into_raw();
        premultiply_rgba8_in_place(&mut rgba8_premul);

        Ok(Bitmap {
            width,
            height,
            rgba8_premul: Arc::new(rgba8_premul),
        })
    }
}

fn premul_rgba8(rgba: [u8; 4]) -> [u8; 4] {
    let [r, g, b, a] = rgba;
    let a16 = u16::from(a);
    let premul = |c: u8| -> u8 { (((u16::from(c) * a16) + 127) / 255) as u8 };
    [premul(r), premul(g), premul(b), a]
}

fn premultiply_rgba8_in_place(rgba: &mut [u8]) {
    for px in rgba.chunks_exact_mut(4) {
        let p = premul_rgba8([px[0], px[1], px[2], px[3]]);
        px.copy_from_slice(&p);
    }
}
