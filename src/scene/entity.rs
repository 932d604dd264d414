use crate::foundation::core::{Affine, Rect};
use crate::foundation::math::f64_key;

/// How a drawn source combines with what is already in the target.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize,
)]
pub enum BlendMode {
    /// Standard "source over destination" (premultiplied alpha).
    #[default]
    SourceOver,
    /// Replace the destination.
    Source,
    /// Additive.
    Plus,
    /// Multiply colors, source-over alpha.
    Multiply,
    /// Screen colors, source-over alpha.
    Screen,
}

impl BlendMode {
    pub(crate) fn to_peniko(self) -> vello_cpu::peniko::BlendMode {
        use vello_cpu::peniko::{Compose, Mix};
        match self {
            Self::SourceOver => vello_cpu::peniko::BlendMode::new(Mix::Normal, Compose::SrcOver),
            Self::Source => vello_cpu::peniko::BlendMode::new(Mix::Normal, Compose::Copy),
            Self::Plus => vello_cpu::peniko::BlendMode::new(Mix::Normal, Compose::Plus),
            Self::Multiply => vello_cpu::peniko::BlendMode::new(Mix::Multiply, Compose::SrcOver),
            Self::Screen => vello_cpu::peniko::BlendMode::new(Mix::Screen, Compose::SrcOver),
        }
    }
}

/// Per-draw context handed to every filter-input query.
///
/// Entities are read-only values; inputs derive new ones (see [`Entity::pushed`]) instead of
/// mutating the caller's.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Entity {
    transform: Affine,
    clip: Option<Rect>,
    blend_mode: BlendMode,
}

/// Exact, hashable identity of an entity's state.
///
/// Two entities with equal keys resolve every filter input identically.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct EntityKey {
    transform: [u64; 6],
    clip: Option<[u64; 4]>,
    blend_mode: BlendMode,
}

impl Entity {
    /// Identity transform, no clip, source-over.
    pub fn new() -> Self {
        Self::default()
    }

    /// Return a copy with `transform` as the current transform.
    pub fn with_transform(mut self, transform: Affine) -> Self {
        self.transform = transform;
        self
    }

    /// Return a copy clipped to `clip` (device space). `None` removes the clip.
    pub fn with_clip(mut self, clip: Option<Rect>) -> Self {
        self.clip = clip;
        self
    }

    /// Return a copy using `blend_mode`.
    pub fn with_blend_mode(mut self, blend_mode: BlendMode) -> Self {
        self.blend_mode = blend_mode;
        self
    }

    /// Current transform (content space to device space).
    pub fn transform(&self) -> Affine {
        self.transform
    }

    /// Device-space clip; `None` when unclipped.
    pub fn clip(&self) -> Option<Rect> {
        self.clip
    }

    /// Blend mode for this draw.
    pub fn blend_mode(&self) -> BlendMode {
        self.blend_mode
    }

    /// Entity seen by an upstream input that sits beneath `local`.
    ///
    /// The transform becomes `self.transform() * local`; clip and blend mode carry over.
    pub fn pushed(&self, local: Affine) -> Self {
        Self {
            transform: self.transform * local,
            ..self.clone()
        }
    }

    /// Cache key over transform, clip and blend mode.
    pub fn cache_key(&self) -> EntityKey {
        let c = self.transform.as_coeffs();
        EntityKey {
            transform: c.map(f64_key),
            clip: self
                .clip
                .map(|r| [f64_key(r.x0), f64_key(r.y0), f64_key(r.x1), f64_key(r.y1)]),
            blend_mode: self.blend_mode,
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/scene/entity.rs"]
mod tests;
