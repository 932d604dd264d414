use std::cell::RefCell;
use std::rc::Rc;

use crate::filters::cache::{CacheStats, SnapshotCache, SnapshotKey};
use crate::filters::filter_input::{FilterInput, pixel_target};
use crate::foundation::core::{Affine, Rect, Vec2, intersect_coverage};
use crate::renderer::context::ContentContext;
use crate::renderer::snapshot::Snapshot;
use crate::scene::contents::Contents;
use crate::scene::entity::Entity;

/// Filter input that rasterizes a [`Contents`] on demand.
///
/// The render target covers the contents' coverage clipped to the entity's clip, rounded out
/// to whole pixels. Results are memoized per entity state and contents generation.
#[derive(Debug)]
pub struct ContentsFilterInput {
    contents: Rc<dyn Contents>,
    local_transform: Affine,
    cache: RefCell<SnapshotCache>,
}

impl ContentsFilterInput {
    /// Rasterize `contents`, placed by `local_transform`.
    pub fn new(contents: Rc<dyn Contents>, local_transform: Affine) -> Self {
        Self {
            contents,
            local_transform,
            cache: RefCell::new(SnapshotCache::default()),
        }
    }

    /// Return a copy keeping at most `capacity` snapshots. Zero disables memoization.
    pub fn with_cache_capacity(self, capacity: usize) -> Self {
        Self {
            cache: RefCell::new(SnapshotCache::new(capacity)),
            ..self
        }
    }

    /// The wrapped contents.
    pub fn contents(&self) -> &Rc<dyn Contents> {
        &self.contents
    }

    /// Memoization counters.
    pub fn cache_stats(&self) -> CacheStats {
        self.cache.borrow().stats()
    }

    fn render_snapshot(&self, renderer: &mut ContentContext, entity: &Entity) -> Option<Snapshot> {
        let content_entity = entity.pushed(self.local_transform);
        let bounds = intersect_coverage(self.contents.coverage(&content_entity), entity.clip());
        let (target, size) = pixel_target(bounds)?;

        let origin = Vec2::new(target.x0, target.y0);
        let draw_entity = content_entity
            .clone()
            .with_transform(Affine::translate(-origin) * content_entity.transform())
            .with_clip(content_entity.clip().map(|c| c - origin));
        match renderer.make_subpass("ContentsFilterInput", size, |pass| {
            self.contents.render(&draw_entity, pass)
        }) {
            Ok(texture) => Some(Snapshot::new(texture, Affine::translate(origin))),
            Err(e) => {
                tracing::warn!(error = %e, w = size.width, h = size.height, "contents not rendered");
                None
            }
        }
    }
}

impl FilterInput for ContentsFilterInput {
    fn snapshot(&self, renderer: &mut ContentContext, entity: &Entity) -> Option<Snapshot> {
        let key = SnapshotKey {
            entity: entity.cache_key(),
            generation: self.contents.generation(),
        };
        if let Some(hit) = self.cache.borrow_mut().get(&key) {
            tracing::trace!("contents snapshot cache hit");
            return Some(hit);
        }
        let snapshot = self.render_snapshot(renderer, entity)?;
        self.cache.borrow_mut().insert(key, snapshot.clone());
        Some(snapshot)
    }

    fn coverage(&self, entity: &Entity) -> Option<Rect> {
        self.contents.coverage(&entity.pushed(self.local_transform))
    }

    fn local_transform(&self, _entity: &Entity) -> Affine {
        self.local_transform
    }

    fn generation(&self) -> u64 {
        self.contents.generation()
    }

    fn clear_cache(&self) {
        self.cache.borrow_mut().clear();
    }
}

#[cfg(test)]
#[path = "../../tests/unit/filters/contents_input.rs"]
mod tests;
