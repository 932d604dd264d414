use std::borrow::Cow;

use vello_cpu::peniko::{Extend, ImageQuality, ImageSampler};

/// Texel filter used for magnification and minification.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum MinMagFilter {
    /// Select the nearest texel.
    Nearest,
    /// Bilinear interpolation between texels.
    Linear,
}

/// Filter used between mip levels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum MipFilter {
    /// Sample the nearest mip level.
    Nearest,
    /// Interpolate between mip levels (trilinear when combined with linear min/mag).
    Linear,
}

/// Behavior for texture coordinates outside `[0, 1]`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum SamplerAddressMode {
    /// Repeat the edge texel.
    ClampToEdge,
    /// Tile the texture.
    Repeat,
    /// Tile the texture, mirroring every other repetition.
    Mirror,
    /// Transparent outside the texture.
    Decal,
}

/// Sampling configuration carried by a [`crate::Snapshot`].
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct SamplerDescriptor {
    /// Debug label.
    pub label: Cow<'static, str>,
    /// Minification filter.
    pub min_filter: MinMagFilter,
    /// Magnification filter.
    pub mag_filter: MinMagFilter,
    /// Mip level filter.
    pub mip_filter: MipFilter,
    /// Horizontal address mode.
    pub address_mode_u: SamplerAddressMode,
    /// Vertical address mode.
    pub address_mode_v: SamplerAddressMode,
}

impl SamplerDescriptor {
    /// Create a clamped descriptor with the given filters.
    pub fn new(
        label: impl Into<Cow<'static, str>>,
        min_filter: MinMagFilter,
        mag_filter: MinMagFilter,
        mip_filter: MipFilter,
    ) -> Self {
        Self {
            label: label.into(),
            min_filter,
            mag_filter,
            mip_filter,
            address_mode_u: SamplerAddressMode::ClampToEdge,
            address_mode_v: SamplerAddressMode::ClampToEdge,
        }
    }

    /// Return a copy using `mode` on both axes.
    pub fn with_address_mode(mut self, mode: SamplerAddressMode) -> Self {
        self.address_mode_u = mode;
        self.address_mode_v = mode;
        self
    }

    /// Resolve into the raster backend's sampler.
    ///
    /// The CPU backend has three quality tiers: nearest maps to `Low`, bilinear to `Medium`, and
    /// bilinear with linear mip filtering to `High`.
    pub(crate) fn to_image_sampler(&self, alpha: f32) -> ImageSampler {
        let quality = match (self.min_filter, self.mag_filter, self.mip_filter) {
            (MinMagFilter::Nearest, MinMagFilter::Nearest, _) => ImageQuality::Low,
            (_, _, MipFilter::Linear) => ImageQuality::High,
            _ => ImageQuality::Medium,
        };
        ImageSampler {
            x_extend: extend_for(self.address_mode_u),
            y_extend: extend_for(self.address_mode_v),
            quality,
            alpha: alpha.clamp(0.0, 1.0),
        }
    }
}

impl Default for SamplerDescriptor {
    fn default() -> Self {
        Self::new(
            "Default Sampler",
            MinMagFilter::Nearest,
            MinMagFilter::Nearest,
            MipFilter::Nearest,
        )
    }
}

fn extend_for(mode: SamplerAddressMode) -> Extend {
    match mode {
        // Decal is approximated by clamping: snapshots are drawn through their own bounds only.
        SamplerAddressMode::ClampToEdge | SamplerAddressMode::Decal => Extend::Pad,
        SamplerAddressMode::Repeat => Extend::Repeat,
        SamplerAddressMode::Mirror => Extend::Reflect,
    }
}
