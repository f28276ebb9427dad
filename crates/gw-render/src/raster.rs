//! Zoom-independent raster layer for freehand painting.
//!
//! The buffer is sized from the grid (`cells × base_tile_px`), never from
//! the on-screen tile size. Stamps composite with straight-alpha RGBA and
//! one of the [`BlendMode`]s; erase stamps cut alpha out instead.

use gw_core::geometry::{GridDims, raster_buffer_size};
use gw_core::model::BlendMode;
use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, ImageEncoder, ImageFormat, Rgba, RgbaImage};
use kurbo::{Affine, Point, Rect, Vec2};
use log::trace;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RasterError {
    #[error("raster image codec failed: {0}")]
    Codec(#[from] image::ImageError),

    #[error("snapshot is {found:?} but the layer is {expected:?}")]
    SizeMismatch {
        expected: (u32, u32),
        found: (u32, u32),
    },
}

/// How a stamp is composited.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StampMode {
    Paint(BlendMode),
    /// Cutout: removes alpha in proportion to stamp coverage.
    Erase,
}

/// One freehand layer's pixel buffer.
#[derive(Debug, Clone, PartialEq)]
pub struct RasterLayer {
    image: RgbaImage,
}

impl RasterLayer {
    pub fn new(dims: GridDims, base_tile_px: u32) -> Self {
        let (w, h) = raster_buffer_size(dims, base_tile_px);
        Self {
            image: RgbaImage::new(w, h),
        }
    }

    pub fn from_image(image: RgbaImage) -> Self {
        Self { image }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        self.image.get_pixel_checked(x, y).map(|p| p.0)
    }

    pub fn is_blank(&self) -> bool {
        self.image.pixels().all(|p| p.0[3] == 0)
    }

    /// Stamp an anti-aliased solid disc.
    pub fn stamp_disc(
        &mut self,
        center: Point,
        radius: f64,
        color: [u8; 4],
        opacity: f64,
        mode: StampMode,
    ) {
        if radius <= 0.0 {
            return;
        }
        let bounds = Rect::from_center_size(center, (radius * 2.0 + 2.0, radius * 2.0 + 2.0));
        let Some((x0, y0, x1, y1)) = self.clip(bounds) else {
            return;
        };
        for y in y0..y1 {
            for x in x0..x1 {
                let p = Point::new(f64::from(x) + 0.5, f64::from(y) + 0.5);
                let coverage = (radius + 0.5 - p.distance(center)).clamp(0.0, 1.0);
                if coverage > 0.0 {
                    self.composite(x, y, color, coverage * opacity, mode);
                }
            }
        }
    }

    /// Stamp a tip image centered at `center`, scaled to `size`, rotated by
    /// `rotation` degrees and optionally mirrored. Nearest-neighbour sampled.
    #[allow(clippy::too_many_arguments)]
    pub fn stamp_image(
        &mut self,
        tip: &RgbaImage,
        center: Point,
        size: Vec2,
        rotation: f64,
        flip_x: bool,
        flip_y: bool,
        opacity: f64,
        mode: StampMode,
    ) {
        let (tw, th) = (f64::from(tip.width()), f64::from(tip.height()));
        if tw == 0.0 || th == 0.0 || size.x <= 0.0 || size.y <= 0.0 {
            return;
        }
        let sx = if flip_x { -size.x / tw } else { size.x / tw };
        let sy = if flip_y { -size.y / th } else { size.y / th };
        let forward = Affine::translate(center.to_vec2())
            * Affine::rotate(rotation.to_radians())
            * Affine::scale_non_uniform(sx, sy)
            * Affine::translate((-tw / 2.0, -th / 2.0));
        let inverse = forward.inverse();
        let bounds = forward.transform_rect_bbox(Rect::new(0.0, 0.0, tw, th));
        let Some((x0, y0, x1, y1)) = self.clip(bounds) else {
            return;
        };
        for y in y0..y1 {
            for x in x0..x1 {
                let local = inverse * Point::new(f64::from(x) + 0.5, f64::from(y) + 0.5);
                if local.x < 0.0 || local.y < 0.0 || local.x >= tw || local.y >= th {
                    continue;
                }
                let texel = tip.get_pixel(local.x as u32, local.y as u32).0;
                if texel[3] > 0 {
                    self.composite(x, y, texel, opacity, mode);
                }
            }
        }
    }

    /// Encode the whole layer as PNG for history snapshots.
    pub fn snapshot(&self) -> Result<Vec<u8>, RasterError> {
        let mut buf = Vec::new();
        PngEncoder::new(&mut buf).write_image(
            self.image.as_raw(),
            self.image.width(),
            self.image.height(),
            ExtendedColorType::Rgba8,
        )?;
        trace!("raster snapshot: {} bytes", buf.len());
        Ok(buf)
    }

    /// Replace the layer contents with a PNG snapshot of the same size.
    pub fn restore(&mut self, png: &[u8]) -> Result<(), RasterError> {
        let decoded = image::load_from_memory_with_format(png, ImageFormat::Png)?.into_rgba8();
        let expected = self.image.dimensions();
        let found = decoded.dimensions();
        if expected != found {
            return Err(RasterError::SizeMismatch { expected, found });
        }
        self.image = decoded;
        Ok(())
    }

    fn clip(&self, r: Rect) -> Option<(u32, u32, u32, u32)> {
        let x0 = r.x0.floor().max(0.0);
        let y0 = r.y0.floor().max(0.0);
        let x1 = r.x1.ceil().min(f64::from(self.width()));
        let y1 = r.y1.ceil().min(f64::from(self.height()));
        (x0 < x1 && y0 < y1).then(|| (x0 as u32, y0 as u32, x1 as u32, y1 as u32))
    }

    fn composite(&mut self, x: u32, y: u32, src: [u8; 4], coverage: f64, mode: StampMode) {
        let dst = self.image.get_pixel_mut(x, y);
        let sa = f64::from(src[3]) / 255.0 * coverage.clamp(0.0, 1.0);
        let da = f64::from(dst.0[3]) / 255.0;
        *dst = match mode {
            StampMode::Erase => {
                let a = da * (1.0 - sa);
                Rgba([dst.0[0], dst.0[1], dst.0[2], to_u8(a)])
            }
            StampMode::Paint(blend) => {
                let oa = sa + da * (1.0 - sa);
                if oa <= 0.0 {
                    Rgba([0, 0, 0, 0])
                } else {
                    let mut out = [0u8; 4];
                    for i in 0..3 {
                        let cs = f64::from(src[i]) / 255.0;
                        let cb = f64::from(dst.0[i]) / 255.0;
                        // Blend only where the backdrop has coverage.
                        let mixed = (1.0 - da) * cs + da * blend_channel(blend, cb, cs);
                        let premul = sa * mixed + da * cb * (1.0 - sa);
                        out[i] = to_u8(premul / oa);
                    }
                    out[3] = to_u8(oa);
                    Rgba(out)
                }
            }
        };
    }
}

fn blend_channel(mode: BlendMode, cb: f64, cs: f64) -> f64 {
    match mode {
        BlendMode::SourceOver => cs,
        BlendMode::Multiply => cb * cs,
        BlendMode::Screen => cb + cs - cb * cs,
        BlendMode::Lighten => cb.max(cs),
        BlendMode::Darken => cb.min(cs),
    }
}

fn to_u8(v: f64) -> u8 {
    (v.clamp(0.0, 1.0) * 255.0).round() as u8
}
