use std::fmt;
use std::sync::Arc;

use vello_cpu::Pixmap;

use crate::foundation::core::ISize;
use crate::foundation::error::{FilterError, FilterResult};
use crate::foundation::math::mul_div255_u8;
use crate::renderer::sampler::MipFilter;

/// Static description of a texture.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TextureDescriptor {
    /// Size of mip level 0 in pixels.
    pub size: ISize,
    /// Number of mip levels, always at least 1.
    pub mip_count: u32,
    /// Debug label.
    pub label: String,
}

/// Premultiplied RGBA8 pixels with an optional mip chain.
///
/// Textures are shared through `Arc<Texture>`: an atlas or an off-screen render result may back
/// several snapshots and filter inputs at once, and is freed when the last handle drops.
pub struct Texture {
    desc: TextureDescriptor,
    levels: Vec<Arc<Pixmap>>,
}

impl fmt::Debug for Texture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Texture")
            .field("desc", &self.desc)
            .finish_non_exhaustive()
    }
}

impl Texture {
    /// Wrap a single-level pixmap.
    pub fn from_pixmap(label: impl Into<String>, pixmap: Pixmap) -> Self {
        let size = ISize::new(u32::from(pixmap.width()), u32::from(pixmap.height()));
        Self {
            desc: TextureDescriptor {
                size,
                mip_count: 1,
                label: label.into(),
            },
            levels: vec![Arc::new(pixmap)],
        }
    }

    /// Build a single-level texture from tightly packed premultiplied RGBA8 bytes.
    pub fn from_premul_rgba8(
        label: impl Into<String>,
        size: ISize,
        bytes: &[u8],
    ) -> FilterResult<Self> {
        if bytes.len() != size.rgba8_byte_len()? {
            return Err(FilterError::validation(
                "texture bytes must match width*height*4",
            ));
        }
        let mut pixmap = new_pixmap(size)?;
        pixmap.data_as_u8_slice_mut().copy_from_slice(bytes);
        Ok(Self::from_pixmap(label, pixmap))
    }

    /// Build a single-level texture from a straight-alpha RGBA image.
    pub fn from_image(label: impl Into<String>, img: &image::RgbaImage) -> FilterResult<Self> {
        let size = ISize::new(img.width(), img.height());
        let mut bytes = img.as_raw().clone();
        premultiply_rgba8_in_place(&mut bytes);
        Self::from_premul_rgba8(label, size, &bytes)
    }

    /// Replace the mip chain with `mip_count` levels box-filtered down from level 0.
    pub fn with_mip_count(mut self, mip_count: u32) -> FilterResult<Self> {
        let max = max_mip_count(self.desc.size);
        if mip_count == 0 || mip_count > max {
            return Err(FilterError::validation(format!(
                "mip_count must be in 1..={max} for a {}x{} texture",
                self.desc.size.width, self.desc.size.height
            )));
        }
        self.levels.truncate(1);
        while self.levels.len() < mip_count as usize {
            let prev = &self.levels[self.levels.len() - 1];
            let next = downsample_2x(prev)?;
            self.levels.push(Arc::new(next));
        }
        self.desc.mip_count = mip_count;
        Ok(self)
    }

    /// Generate the full mip chain down to 1x1.
    pub fn with_mipmaps(self) -> FilterResult<Self> {
        let max = max_mip_count(self.desc.size);
        self.with_mip_count(max)
    }

    /// Texture descriptor.
    pub fn descriptor(&self) -> &TextureDescriptor {
        &self.desc
    }

    /// Size of mip level 0.
    pub fn size(&self) -> ISize {
        self.desc.size
    }

    /// Number of mip levels.
    pub fn mip_count(&self) -> u32 {
        self.desc.mip_count
    }

    /// Debug label.
    pub fn label(&self) -> &str {
        &self.desc.label
    }

    /// Pixels of mip level `level`.
    pub fn level(&self, level: usize) -> Option<&Arc<Pixmap>> {
        self.levels.get(level)
    }

    /// Premultiplied RGBA8 bytes of mip level 0.
    pub fn base_bytes(&self) -> &[u8] {
        self.levels[0].data_as_u8_slice()
    }

    /// Premultiplied RGBA8 value of a level-0 pixel.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        let size = self.desc.size;
        if x >= size.width || y >= size.height {
            return None;
        }
        let idx = ((y as usize) * (size.width as usize) + (x as usize)) * 4;
        let b = self.base_bytes();
        Some([b[idx], b[idx + 1], b[idx + 2], b[idx + 3]])
    }

    /// Straight-alpha copy of level 0, for readback and debugging.
    pub fn to_rgba_image(&self) -> FilterResult<image::RgbaImage> {
        let size = self.desc.size;
        let mut bytes = self.base_bytes().to_vec();
        unpremultiply_rgba8_in_place(&mut bytes);
        image::RgbaImage::from_raw(size.width, size.height, bytes)
            .ok_or_else(|| FilterError::render("texture readback size mismatch"))
    }

    /// Mip level to sample when drawing at `scale` (device pixels per texel).
    ///
    /// Magnification and single-level textures always use level 0.
    pub(crate) fn select_mip_level(&self, scale: f64, mip_filter: MipFilter) -> usize {
        if self.levels.len() <= 1 || !scale.is_finite() || scale <= 0.0 || scale >= 1.0 {
            return 0;
        }
        let lod = (1.0 / scale).log2();
        let level = match mip_filter {
            MipFilter::Nearest => lod.round(),
            // The raster backend cannot blend two levels; take the sharper one and let the
            // high-quality sampler smooth the rest.
            MipFilter::Linear => lod.floor(),
        };
        (level.max(0.0) as usize).min(self.levels.len() - 1)
    }

    pub(crate) fn into_levels(self) -> Vec<Arc<Pixmap>> {
        self.levels
    }
}

/// Number of levels in a full mip chain for `size` (`floor(log2(max(w, h))) + 1`).
pub fn max_mip_count(size: ISize) -> u32 {
    let max = size.max_dimension();
    if max == 0 {
        return 1;
    }
    u32::BITS - max.leading_zeros()
}

pub(crate) fn new_pixmap(size: ISize) -> FilterResult<Pixmap> {
    if size.is_empty() {
        return Err(FilterError::allocation(format!(
            "cannot allocate an empty {}x{} surface",
            size.width, size.height
        )));
    }
    let w: u16 = size
        .width
        .try_into()
        .map_err(|_| FilterError::allocation("surface width exceeds u16"))?;
    let h: u16 = size
        .height
        .try_into()
        .map_err(|_| FilterError::allocation("surface height exceeds u16"))?;
    Ok(Pixmap::new(w, h))
}

fn downsample_2x(src: &Pixmap) -> FilterResult<Pixmap> {
    let sw = usize::from(src.width());
    let sh = usize::from(src.height());
    let dst_size = ISize::new(((sw / 2).max(1)) as u32, ((sh / 2).max(1)) as u32);
    let mut dst = new_pixmap(dst_size)?;
    let dw = dst_size.width as usize;
    let dh = dst_size.height as usize;

    let s = src.data_as_u8_slice();
    let d = dst.data_as_u8_slice_mut();
    for y in 0..dh {
        let y0 = (2 * y).min(sh - 1);
        let y1 = (2 * y + 1).min(sh - 1);
        for x in 0..dw {
            let x0 = (2 * x).min(sw - 1);
            let x1 = (2 * x + 1).min(sw - 1);
            let out = (y * dw + x) * 4;
            for c in 0..4 {
                let sum = u32::from(s[(y0 * sw + x0) * 4 + c])
                    + u32::from(s[(y0 * sw + x1) * 4 + c])
                    + u32::from(s[(y1 * sw + x0) * 4 + c])
                    + u32::from(s[(y1 * sw + x1) * 4 + c]);
                d[out + c] = ((sum + 2) / 4) as u8;
            }
        }
    }
    Ok(dst)
}

pub(crate) fn premultiply_rgba8_in_place(rgba: &mut [u8]) {
    for px in rgba.chunks_exact_mut(4) {
        let a = u16::from(px[3]);
        if a == 0 {
            px[0] = 0;
            px[1] = 0;
            px[2] = 0;
            continue;
        }
        for c in &mut px[..3] {
            *c = mul_div255_u8(u16::from(*c), a);
        }
    }
}

pub(crate) fn unpremultiply_rgba8_in_place(rgba: &mut [u8]) {
    for px in rgba.chunks_exact_mut(4) {
        let a = u32::from(px[3]);
        if a == 0 || a == 255 {
            continue;
        }
        for c in &mut px[..3] {
            *c = ((u32::from(*c) * 255 + a / 2) / a).min(255) as u8;
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/renderer/texture.rs"]
mod tests;
