use std::sync::Arc;

use crate::filters::filter_input::FilterInput;
use crate::foundation::core::{Affine, Rect, transform_bounds};
use crate::renderer::context::ContentContext;
use crate::renderer::sampler::MipFilter;
use crate::renderer::snapshot::Snapshot;
use crate::renderer::texture::Texture;
use crate::scene::entity::Entity;

/// Label given to the sampler of mipmapped texture snapshots.
pub const TRILINEAR_SAMPLER_LABEL: &str = "TextureFilterInput Trilinear Sampler";

/// When a texture input switches its snapshot sampler to linear mip filtering.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MipSamplerPolicy {
    /// Smallest mip count that selects the trilinear sampler.
    pub min_mip_count: u32,
}

impl Default for MipSamplerPolicy {
    /// Any texture with more than one mip level.
    fn default() -> Self {
        Self { min_mip_count: 2 }
    }
}

impl MipSamplerPolicy {
    /// Return `true` when a texture with `mip_count` levels should be sampled trilinearly.
    pub fn wants_trilinear(&self, mip_count: u32) -> bool {
        mip_count >= self.min_mip_count.max(2)
    }
}

/// Filter input over an already rasterized texture.
///
/// The placement is fixed at construction; the entity only contributes its own transform.
#[derive(Debug)]
pub struct TextureFilterInput {
    texture: Arc<Texture>,
    local_transform: Affine,
    mip_policy: MipSamplerPolicy,
}

impl TextureFilterInput {
    /// Wrap `texture`, placed by `local_transform`.
    pub fn new(texture: Arc<Texture>, local_transform: Affine) -> Self {
        Self {
            texture,
            local_transform,
            mip_policy: MipSamplerPolicy::default(),
        }
    }

    /// Return a copy using a different mip sampler policy.
    pub fn with_mip_policy(mut self, mip_policy: MipSamplerPolicy) -> Self {
        self.mip_policy = mip_policy;
        self
    }

    /// The wrapped texture.
    pub fn texture(&self) -> &Arc<Texture> {
        &self.texture
    }
}

impl FilterInput for TextureFilterInput {
    fn snapshot(&self, _renderer: &mut ContentContext, entity: &Entity) -> Option<Snapshot> {
        let mut snapshot = Snapshot::new(Arc::clone(&self.texture), self.transform(entity));
        if self.mip_policy.wants_trilinear(self.texture.mip_count()) {
            snapshot.sampler_descriptor.label = TRILINEAR_SAMPLER_LABEL.into();
            snapshot.sampler_descriptor.mip_filter = MipFilter::Linear;
        }
        Some(snapshot)
    }

    fn coverage(&self, entity: &Entity) -> Option<Rect> {
        Some(transform_bounds(
            self.texture.size().to_rect(),
            self.transform(entity),
        ))
    }

    fn local_transform(&self, _entity: &Entity) -> Affine {
        self.local_transform
    }
}

#[cfg(test)]
#[path = "../../tests/unit/filters/texture_input.rs"]
mod tests;
