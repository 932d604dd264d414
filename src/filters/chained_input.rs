use std::cell::RefCell;
use std::rc::Rc;

use smallvec::SmallVec;

use crate::filters::blur::{blur_radius, gaussian_blur_rgba8_premul};
use crate::filters::cache::{CacheStats, SnapshotCache, SnapshotKey};
use crate::filters::color::color_matrix_rgba8_premul;
use crate::filters::filter_input::{FilterInput, FilterInputRef, pixel_target};
use crate::filters::ops::FilterOp;
use crate::foundation::core::{Affine, ISize, Rect, Vec2, intersect_coverage, union_coverage};
use crate::foundation::error::FilterResult;
use crate::foundation::math::Fnv1a64;
use crate::renderer::context::{ContentContext, RenderPass};
use crate::renderer::snapshot::Snapshot;
use crate::scene::entity::{BlendMode, Entity};

/// Filter input produced by running a [`FilterOp`] over upstream inputs.
///
/// Upstream inputs are queried with the entity pushed by this node's own local transform, so
/// `local_transform` composes as `local * upstream.local_transform`. The chain is a DAG by
/// construction: inputs must exist before the node that consumes them.
#[derive(Debug)]
pub struct ChainedFilterInput {
    op: FilterOp,
    inputs: SmallVec<[FilterInputRef; 2]>,
    local_transform: Affine,
    cache: RefCell<SnapshotCache>,
}

impl ChainedFilterInput {
    /// Chain `op` over `inputs`. Fails when the operation rejects the input count or its
    /// parameters.
    pub fn new(
        op: FilterOp,
        inputs: impl IntoIterator<Item = FilterInputRef>,
        local_transform: Affine,
    ) -> FilterResult<Rc<Self>> {
        let inputs: SmallVec<[FilterInputRef; 2]> = inputs.into_iter().collect();
        op.validate(inputs.len())?;
        Ok(Rc::new(Self {
            op,
            inputs,
            local_transform,
            cache: RefCell::new(SnapshotCache::default()),
        }))
    }

    /// The operation this node runs.
    pub fn op(&self) -> &FilterOp {
        &self.op
    }

    /// Memoization counters.
    pub fn cache_stats(&self) -> CacheStats {
        self.cache.borrow().stats()
    }

    fn resolve(&self, renderer: &mut ContentContext, entity: &Entity) -> Option<Snapshot> {
        let upstream = entity.pushed(self.local_transform);
        match self.op {
            FilterOp::PassThrough => self.inputs[0].snapshot(renderer, &upstream),
            FilterOp::Blend { mode, .. } => self.blend(renderer, entity, &upstream, mode),
            FilterOp::GaussianBlur { sigma } => {
                let src = self.inputs[0].snapshot(renderer, &upstream)?;
                let r = f64::from(blur_radius(sigma));
                if r == 0.0 {
                    return Some(src);
                }
                let bounds = intersect_coverage(
                    src.coverage().map(|c| c.inflate(r, r)),
                    entity.clip().map(|c| c.inflate(r, r)),
                );
                filtered(renderer, "GaussianBlur", &src, bounds, |s, d, size| {
                    gaussian_blur_rgba8_premul(s, d, size, sigma)
                })
            }
            FilterOp::ColorMatrix { matrix } => {
                let src = self.inputs[0].snapshot(renderer, &upstream)?;
                let drawn = if matrix.adds_alpha() {
                    entity.clip()
                } else {
                    src.coverage()
                };
                let bounds = intersect_coverage(drawn, entity.clip());
                filtered(renderer, "ColorMatrix", &src, bounds, |s, d, size| {
                    color_matrix_rgba8_premul(&matrix, s, d, size)
                })
            }
        }
    }

    fn blend(
        &self,
        renderer: &mut ContentContext,
        entity: &Entity,
        upstream: &Entity,
        mode: BlendMode,
    ) -> Option<Snapshot> {
        let snapshots: SmallVec<[Snapshot; 2]> = self
            .inputs
            .iter()
            .filter_map(|input| input.snapshot(renderer, upstream))
            .collect();
        if snapshots.is_empty() {
            tracing::debug!("blend has no visible inputs");
            return None;
        }
        let drawn = snapshots
            .iter()
            .map(Snapshot::coverage)
            .filter(Option::is_some)
            .fold(Some(Rect::ZERO), union_coverage);
        let bounds = intersect_coverage(
            intersect_coverage(drawn, self.coverage(entity)),
            entity.clip(),
        );
        let (target, size) = pixel_target(bounds)?;
        let origin = Vec2::new(target.x0, target.y0);
        let to_target = Affine::translate(-origin);
        rendered(renderer, "Blend", size, origin, |pass| {
            for (i, snapshot) in snapshots.iter().enumerate() {
                let blend = if i == 0 { BlendMode::SourceOver } else { mode };
                pass.draw_snapshot(snapshot, to_target, blend);
            }
            Ok(())
        })
    }
}

impl FilterInput for ChainedFilterInput {
    fn snapshot(&self, renderer: &mut ContentContext, entity: &Entity) -> Option<Snapshot> {
        let key = SnapshotKey {
            entity: entity.cache_key(),
            generation: self.generation(),
        };
        if let Some(hit) = self.cache.borrow_mut().get(&key) {
            tracing::trace!(op = self.op.name(), "filter snapshot cache hit");
            return Some(hit);
        }
        let snapshot = self.resolve(renderer, entity)?;
        self.cache.borrow_mut().insert(key, snapshot.clone());
        Some(snapshot)
    }

    fn coverage(&self, entity: &Entity) -> Option<Rect> {
        let upstream = entity.pushed(self.local_transform);
        let inputs: SmallVec<[Option<Rect>; 2]> = self
            .inputs
            .iter()
            .map(|input| input.coverage(&upstream))
            .collect();
        self.op.output_coverage(&inputs)
    }

    fn local_transform(&self, entity: &Entity) -> Affine {
        self.local_transform * self.inputs[0].local_transform(entity)
    }

    fn generation(&self) -> u64 {
        let mut h = Fnv1a64::new_default();
        for input in &self.inputs {
            h.write_u64(input.generation());
        }
        h.finish()
    }

    fn upstream(&self) -> &[FilterInputRef] {
        &self.inputs
    }

    fn clear_cache(&self) {
        self.cache.borrow_mut().clear();
        for input in &self.inputs {
            input.clear_cache();
        }
    }
}

/// Render `src` into a target covering `bounds`, then run a pixel pass over it.
fn filtered(
    renderer: &mut ContentContext,
    label: &str,
    src: &Snapshot,
    bounds: Option<Rect>,
    pass: impl FnOnce(&[u8], &mut [u8], ISize) -> FilterResult<()>,
) -> Option<Snapshot> {
    let (target, size) = pixel_target(bounds)?;
    let origin = Vec2::new(target.x0, target.y0);
    let placed = rendered(renderer, label, size, origin, |p| {
        p.draw_snapshot(src, Affine::translate(-origin), BlendMode::SourceOver);
        Ok(())
    })?;
    let out = renderer.map_pixels(label, &placed.texture, pass);
    renderer.recycle(placed.texture);
    match out {
        Ok(texture) => Some(Snapshot::new(texture, Affine::translate(origin))),
        Err(e) => {
            tracing::warn!(error = %e, label, "filter pass failed");
            None
        }
    }
}

fn rendered(
    renderer: &mut ContentContext,
    label: &str,
    size: ISize,
    origin: Vec2,
    draw: impl FnOnce(&mut RenderPass<'_>) -> FilterResult<()>,
) -> Option<Snapshot> {
    match renderer.make_subpass(label, size, draw) {
        Ok(texture) => Some(Snapshot::new(texture, Affine::translate(origin))),
        Err(e) => {
            tracing::warn!(error = %e, label, w = size.width, h = size.height, "filter not rendered");
            None
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/filters/chained_input.rs"]
mod tests;
