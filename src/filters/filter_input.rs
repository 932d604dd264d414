use std::fmt;
use std::rc::Rc;

use crate::foundation::core::{Affine, ISize, Rect, is_empty_rect};
use crate::renderer::context::ContentContext;
use crate::renderer::snapshot::Snapshot;
use crate::scene::entity::Entity;

/// Shared handle to a filter input. One input may feed several filters.
pub type FilterInputRef = Rc<dyn FilterInput>;

/// A lazily resolved source of pixels for a filter.
///
/// Every query is relative to the [`Entity`] being drawn. Implementations override
/// [`FilterInput::local_transform`] and leave [`FilterInput::transform`] alone.
///
/// Coverage of `None` means "unbounded or unknown" and is never the same thing as an empty
/// rectangle, which means "nothing to draw".
pub trait FilterInput: fmt::Debug {
    /// Resolve pixels for `entity`.
    ///
    /// `None` when nothing is visible or when the renderer could not provide a target; callers
    /// skip the draw in both cases. Repeated calls with the same entity state return an equal
    /// snapshot without rendering again.
    fn snapshot(&self, renderer: &mut ContentContext, entity: &Entity) -> Option<Snapshot>;

    /// Device-space bounds of what [`FilterInput::snapshot`] would produce. Never rasterizes.
    fn coverage(&self, entity: &Entity) -> Option<Rect>;

    /// Transform applied to this input's content before the entity transform.
    fn local_transform(&self, entity: &Entity) -> Affine;

    /// Content space to device space: `entity.transform() * local_transform(entity)`.
    fn transform(&self, entity: &Entity) -> Affine {
        entity.transform() * self.local_transform(entity)
    }

    /// Dirty signal covering this input and everything upstream of it.
    fn generation(&self) -> u64 {
        0
    }

    /// Direct upstream inputs.
    fn upstream(&self) -> &[FilterInputRef] {
        &[]
    }

    /// Drop memoized snapshots held by this input and its upstream inputs.
    fn clear_cache(&self) {}
}

/// Pixel-aligned render target for `bounds`, or `None` when it is unbounded or empty.
pub(crate) fn pixel_target(bounds: Option<Rect>) -> Option<(Rect, ISize)> {
    let Some(bounds) = bounds else {
        tracing::debug!("target bounds are unbounded; nothing can be sized");
        return None;
    };
    if !bounds.is_finite() || is_empty_rect(bounds) {
        tracing::trace!(?bounds, "empty target bounds");
        return None;
    }
    let rect = bounds.expand();
    Some((rect, ISize::from_rect(rect)))
}
