use std::sync::Arc;

use crate::foundation::core::{Affine, Point, Rect, invert, transform_bounds};
use crate::renderer::sampler::{MinMagFilter, MipFilter, SamplerDescriptor};
use crate::renderer::texture::Texture;

/// Label of the sampler every snapshot starts with.
pub const DEFAULT_SNAPSHOT_SAMPLER_LABEL: &str = "Default Snapshot Sampler";

/// A texture together with its intended draw transform and sampler configuration.
///
/// Snapshots reference their texture; cloning one never copies pixels. A snapshot describes the
/// state of its inputs when it was produced and must not be reused once those inputs change.
#[derive(Clone, Debug)]
pub struct Snapshot {
    /// Pixel source.
    pub texture: Arc<Texture>,
    /// Maps texture pixel space into the entity's (device) space.
    pub transform: Affine,
    /// How the texture is sampled when drawn.
    pub sampler_descriptor: SamplerDescriptor,
    /// Opacity applied when drawing.
    pub opacity: f32,
}

impl Snapshot {
    /// Snapshot with the default sampler and full opacity.
    pub fn new(texture: Arc<Texture>, transform: Affine) -> Self {
        Self {
            texture,
            transform,
            sampler_descriptor: default_snapshot_sampler(),
            opacity: 1.0,
        }
    }

    /// Device-space bounds of the texture, or `None` for an empty texture.
    pub fn coverage(&self) -> Option<Rect> {
        let size = self.texture.size();
        if size.is_empty() {
            return None;
        }
        Some(transform_bounds(size.to_rect(), self.transform))
    }

    /// Transform from device space into this snapshot's UV space.
    ///
    /// `None` when the placement transform is singular or the texture is empty.
    pub fn uv_transform(&self) -> Option<Affine> {
        let size = self.texture.size();
        if size.is_empty() {
            return None;
        }
        let inv = invert(self.transform)?;
        Some(
            Affine::scale_non_uniform(1.0 / f64::from(size.width), 1.0 / f64::from(size.height))
                * inv,
        )
    }

    /// Map a device-space rectangle into UV space.
    ///
    /// Corner order: top left, top right, bottom left, bottom right.
    pub fn coverage_uvs(&self, coverage: Rect) -> Option<[Point; 4]> {
        let uv = self.uv_transform()?;
        Some([
            uv * Point::new(coverage.x0, coverage.y0),
            uv * Point::new(coverage.x1, coverage.y0),
            uv * Point::new(coverage.x0, coverage.y1),
            uv * Point::new(coverage.x1, coverage.y1),
        ])
    }

    /// Return `true` when both snapshots reference the same texture allocation.
    pub fn shares_texture_with(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.texture, &other.texture)
    }
}

impl PartialEq for Snapshot {
    fn eq(&self, other: &Self) -> bool {
        self.shares_texture_with(other)
            && self.transform == other.transform
            && self.sampler_descriptor == other.sampler_descriptor
            && self.opacity == other.opacity
    }
}

/// Linear min/mag, nearest mip.
pub fn default_snapshot_sampler() -> SamplerDescriptor {
    SamplerDescriptor::new(
        DEFAULT_SNAPSHOT_SAMPLER_LABEL,
        MinMagFilter::Linear,
        MinMagFilter::Linear,
        MipFilter::Nearest,
    )
}

#[cfg(test)]
#[path = "../../tests/unit/renderer/snapshot.rs"]
mod tests;
