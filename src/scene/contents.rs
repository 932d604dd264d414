use std::cell::{Cell, RefCell};
use std::fmt;

use crate::foundation::core::{BezPath, Rect, transform_bounds};
use crate::foundation::error::FilterResult;
use crate::renderer::context::RenderPass;
use crate::scene::entity::{BlendMode, Entity};

/// A drawable scene node that can be rasterized on demand.
pub trait Contents: fmt::Debug {
    /// Device-space bounds of what [`Contents::render`] would draw for `entity`.
    ///
    /// Must be cheap and must not rasterize. `None` means the bounds are unknown or unbounded.
    fn coverage(&self, entity: &Entity) -> Option<Rect>;

    /// Draw into `pass`. `entity.transform()` maps content space into the pass's target space, and
    /// `entity.clip()` is expressed in that same target space.
    fn render(&self, entity: &Entity, pass: &mut RenderPass<'_>) -> FilterResult<()>;

    /// Dirty signal: changes whenever the rendered output would change for the same entity.
    fn generation(&self) -> u64 {
        0
    }
}

/// Fills a path with a single straight-alpha RGBA8 color.
pub struct SolidColorContents {
    path: RefCell<BezPath>,
    rgba: Cell<[u8; 4]>,
    generation: Cell<u64>,
}

impl fmt::Debug for SolidColorContents {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SolidColorContents")
            .field("rgba", &self.rgba.get())
            .field("generation", &self.generation.get())
            .finish_non_exhaustive()
    }
}

impl SolidColorContents {
    /// Fill `path` with `rgba`.
    pub fn new(path: BezPath, rgba: [u8; 4]) -> Self {
        Self {
            path: RefCell::new(path),
            rgba: Cell::new(rgba),
            generation: Cell::new(0),
        }
    }

    /// Fill the rectangle `rect` with `rgba`.
    pub fn rect(rect: Rect, rgba: [u8; 4]) -> Self {
        use kurbo::Shape;
        Self::new(rect.to_path(0.1), rgba)
    }

    /// Current fill color.
    pub fn color(&self) -> [u8; 4] {
        self.rgba.get()
    }

    /// Change the fill color, invalidating rasterized copies.
    pub fn set_color(&self, rgba: [u8; 4]) {
        if self.rgba.get() != rgba {
            self.rgba.set(rgba);
            self.bump();
        }
    }

    /// Replace the filled path, invalidating rasterized copies.
    pub fn set_path(&self, path: BezPath) {
        *self.path.borrow_mut() = path;
        self.bump();
    }

    fn bump(&self) {
        self.generation.set(self.generation.get().wrapping_add(1));
    }
}

impl Contents for SolidColorContents {
    fn coverage(&self, entity: &Entity) -> Option<Rect> {
        use kurbo::Shape;
        if self.rgba.get()[3] == 0 {
            return Some(Rect::ZERO);
        }
        let bounds = self.path.borrow().bounding_box();
        Some(transform_bounds(bounds, entity.transform()))
    }

    fn render(&self, entity: &Entity, pass: &mut RenderPass<'_>) -> FilterResult<()> {
        pass.fill_path(
            &self.path.borrow(),
            entity.transform(),
            self.rgba.get(),
            BlendMode::SourceOver,
        );
        Ok(())
    }

    fn generation(&self) -> u64 {
        self.generation.get()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/scene/contents.rs"]
mod tests;
