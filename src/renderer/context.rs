use std::fmt;
use std::sync::Arc;

use crate::foundation::core::{Affine, BezPath, ISize, Rect, approximate_scale};
use crate::foundation::error::{FilterError, FilterResult};
use crate::renderer::snapshot::Snapshot;
use crate::renderer::surface_pool::{SurfacePool, SurfacePoolOpts};
use crate::renderer::texture::Texture;
use crate::scene::entity::BlendMode;

/// Environment variable overriding [`ContentContextOpts::max_texture_size`].
pub const MAX_TEXTURE_SIZE_ENV: &str = "FILTERGRAPH_MAX_TEXTURE_SIZE";

/// Options for the renderer context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct ContentContextOpts {
    /// Largest width or height of an off-screen render target. Larger requests fail allocation.
    pub max_texture_size: u32,
    /// Maximum bytes of released render targets retained for reuse.
    pub max_pool_bytes: usize,
    /// Maximum retained render targets per size.
    pub max_surfaces_per_bucket: usize,
}

impl Default for ContentContextOpts {
    fn default() -> Self {
        let pool = SurfacePoolOpts::default();
        Self {
            max_texture_size: 4096,
            max_pool_bytes: pool.max_pool_bytes,
            max_surfaces_per_bucket: pool.max_surfaces_per_bucket,
        }
    }
}

impl ContentContextOpts {
    /// Parse options from JSON; missing fields keep their defaults.
    pub fn from_json_str(s: &str) -> FilterResult<Self> {
        serde_json::from_str(s)
            .map_err(|e| FilterError::validation(format!("invalid renderer options: {e}")))
    }

    /// Return options with a different render-target size limit.
    pub fn with_max_texture_size(mut self, max_texture_size: u32) -> Self {
        self.max_texture_size = max_texture_size;
        self
    }

    /// Apply overrides from the process environment.
    ///
    /// Unparseable or zero values are ignored.
    pub fn with_env_overrides(mut self) -> Self {
        if let Some(n) = std::env::var(MAX_TEXTURE_SIZE_ENV)
            .ok()
            .and_then(|v| v.trim().parse::<u32>().ok())
            .filter(|&n| n > 0)
        {
            self.max_texture_size = n;
        }
        self
    }

    fn pool_opts(&self) -> SurfacePoolOpts {
        SurfacePoolOpts {
            max_pool_bytes: self.max_pool_bytes,
            max_surfaces_per_bucket: self.max_surfaces_per_bucket,
        }
    }
}

/// Counters describing work done by a [`ContentContext`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RenderStats {
    /// Raster or pixel passes executed.
    pub render_passes: u64,
    /// Render targets freshly allocated.
    pub targets_allocated: u64,
    /// Render targets served from the pool.
    pub targets_reused: u64,
    /// Render target requests that failed.
    pub allocation_failures: u64,
    /// Released render targets currently held for reuse.
    pub retained_targets: usize,
    /// Bytes held by retained render targets.
    pub retained_bytes: usize,
    /// Released render targets dropped because the pool was full.
    pub dropped_targets: u64,
}

/// Renderer context used while resolving filter-input snapshots.
///
/// Owns render-target allocation and raster execution. Filter inputs only call into it from
/// `snapshot`; coverage and transform queries never touch it.
pub struct ContentContext {
    opts: ContentContextOpts,
    pool: SurfacePool,
    ctx: Option<vello_cpu::RenderContext>,
    render_passes: u64,
    allocation_failures: u64,
}

impl fmt::Debug for ContentContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContentContext")
            .field("opts", &self.opts)
            .field("stats", &self.stats())
            .finish_non_exhaustive()
    }
}

impl Default for ContentContext {
    fn default() -> Self {
        Self::new(ContentContextOpts::default())
    }
}

impl ContentContext {
    /// Create a context with the given options.
    pub fn new(opts: ContentContextOpts) -> Self {
        Self {
            opts,
            pool: SurfacePool::new(opts.pool_opts()),
            ctx: None,
            render_passes: 0,
            allocation_failures: 0,
        }
    }

    /// Options this context was created with.
    pub fn opts(&self) -> &ContentContextOpts {
        &self.opts
    }

    /// Work counters since creation.
    pub fn stats(&self) -> RenderStats {
        let pool = self.pool.stats();
        RenderStats {
            render_passes: self.render_passes,
            targets_allocated: pool.alloc_surfaces,
            targets_reused: pool.reused_surfaces,
            allocation_failures: self.allocation_failures,
            retained_targets: pool.retained_surfaces,
            retained_bytes: pool.retained_bytes,
            dropped_targets: pool.dropped_on_release,
        }
    }

    /// Render into a fresh off-screen target of `size` and return it as a texture.
    ///
    /// Fails with [`FilterError::Allocation`] for empty targets or targets larger than
    /// [`ContentContextOpts::max_texture_size`].
    #[tracing::instrument(level = "debug", skip(self, draw), fields(w = size.width, h = size.height))]
    pub fn make_subpass(
        &mut self,
        label: &str,
        size: ISize,
        draw: impl FnOnce(&mut RenderPass<'_>) -> FilterResult<()>,
    ) -> FilterResult<Arc<Texture>> {
        let mut pixmap = self.allocate_target(size)?;
        pixmap.data_as_u8_slice_mut().fill(0);

        let (w, h) = (pixmap.width(), pixmap.height());
        let drawn = self.with_ctx_mut(w, h, |ctx| {
            {
                let mut pass = RenderPass { ctx, size };
                draw(&mut pass)?;
            }
            ctx.flush();
            ctx.render_to_pixmap(&mut pixmap);
            Ok(())
        });
        if let Err(e) = drawn {
            self.pool.release(pixmap);
            return Err(e);
        }

        self.render_passes = self.render_passes.saturating_add(1);
        tracing::trace!(label, "subpass rendered");
        Ok(Arc::new(Texture::from_pixmap(label, pixmap)))
    }

    /// Run a CPU pixel pass over level 0 of `src` into a new target of the same size.
    ///
    /// `f` receives the source bytes, a zeroed destination and the size; both buffers are
    /// premultiplied RGBA8.
    pub fn map_pixels(
        &mut self,
        label: &str,
        src: &Texture,
        f: impl FnOnce(&[u8], &mut [u8], ISize) -> FilterResult<()>,
    ) -> FilterResult<Arc<Texture>> {
        let size = src.size();
        let mut pixmap = self.allocate_target(size)?;
        let dst = pixmap.data_as_u8_slice_mut();
        dst.fill(0);
        if let Err(e) = f(src.base_bytes(), dst, size) {
            self.pool.release(pixmap);
            return Err(e);
        }
        self.render_passes = self.render_passes.saturating_add(1);
        Ok(Arc::new(Texture::from_pixmap(label, pixmap)))
    }

    /// Return the pixels of a texture nobody else references to the target pool.
    ///
    /// Returns `false` (and does nothing) when other handles to the texture are still alive.
    pub fn recycle(&mut self, texture: Arc<Texture>) -> bool {
        let Ok(texture) = Arc::try_unwrap(texture) else {
            return false;
        };
        for level in texture.into_levels() {
            if let Ok(pixmap) = Arc::try_unwrap(level) {
                self.pool.release(pixmap);
            }
        }
        true
    }

    fn allocate_target(&mut self, size: ISize) -> FilterResult<vello_cpu::Pixmap> {
        let checked = if size.max_dimension() > self.opts.max_texture_size {
            Err(FilterError::allocation(format!(
                "render target {}x{} exceeds max texture size {}",
                size.width, size.height, self.opts.max_texture_size
            )))
        } else {
            self.pool.borrow(size)
        };
        if checked.is_err() {
            self.allocation_failures = self.allocation_failures.saturating_add(1);
        }
        checked
    }

    fn with_ctx_mut<R>(
        &mut self,
        width: u16,
        height: u16,
        f: impl FnOnce(&mut vello_cpu::RenderContext) -> FilterResult<R>,
    ) -> FilterResult<R> {
        let mut ctx = match self.ctx.take() {
            None => vello_cpu::RenderContext::new(width, height),
            Some(ctx) if ctx.width() == width && ctx.height() == height => ctx,
            Some(_) => vello_cpu::RenderContext::new(width, height),
        };
        ctx.reset();
        let out = f(&mut ctx);
        self.ctx = Some(ctx);
        out
    }
}

/// Drawing interface for one off-screen target.
pub struct RenderPass<'a> {
    ctx: &'a mut vello_cpu::RenderContext,
    size: ISize,
}

impl fmt::Debug for RenderPass<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RenderPass")
            .field("size", &self.size)
            .finish_non_exhaustive()
    }
}

impl RenderPass<'_> {
    /// Target size in pixels.
    pub fn size(&self) -> ISize {
        self.size
    }

    /// Draw `snapshot`, mapping its device space into target space with `transform`.
    ///
    /// Minified draws sample a lower mip level when the snapshot's sampler asks for it.
    pub fn draw_snapshot(&mut self, snapshot: &Snapshot, transform: Affine, blend_mode: BlendMode) {
        if snapshot.opacity.is_nan() || snapshot.opacity <= 0.0 {
            return;
        }
        let full = transform * snapshot.transform;
        let texture = &snapshot.texture;
        let level = texture.select_mip_level(
            approximate_scale(full),
            snapshot.sampler_descriptor.mip_filter,
        );
        let Some(pixmap) = texture.level(level) else {
            return;
        };
        let (lw, lh) = (f64::from(pixmap.width()), f64::from(pixmap.height()));
        let base = texture.size();
        let level_to_base =
            Affine::scale_non_uniform(f64::from(base.width) / lw, f64::from(base.height) / lh);

        self.ctx.set_transform(affine_to_cpu(full * level_to_base));
        self.ctx
            .set_paint_transform(vello_cpu::kurbo::Affine::IDENTITY);
        self.ctx.set_blend_mode(blend_mode.to_peniko());
        self.ctx.set_paint(vello_cpu::Image {
            image: vello_cpu::ImageSource::Pixmap(Arc::clone(pixmap)),
            sampler: snapshot.sampler_descriptor.to_image_sampler(1.0),
        });
        let opacity = snapshot.opacity.min(1.0);
        if opacity < 1.0 {
            self.ctx.push_opacity_layer(opacity);
        }
        self.ctx
            .fill_rect(&vello_cpu::kurbo::Rect::new(0.0, 0.0, lw, lh));
        if opacity < 1.0 {
            self.ctx.pop_layer();
        }
    }

    /// Fill `path` (mapped by `transform`) with a straight-alpha RGBA8 color.
    pub fn fill_path(
        &mut self,
        path: &BezPath,
        transform: Affine,
        rgba: [u8; 4],
        blend_mode: BlendMode,
    ) {
        self.ctx.set_transform(affine_to_cpu(transform));
        self.ctx
            .set_paint_transform(vello_cpu::kurbo::Affine::IDENTITY);
        self.ctx.set_blend_mode(blend_mode.to_peniko());
        self.ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(
            rgba[0], rgba[1], rgba[2], rgba[3],
        ));
        self.ctx.fill_path(&bezpath_to_cpu(path));
    }

    /// Fill `rect` (mapped by `transform`) with a straight-alpha RGBA8 color.
    pub fn fill_rect(&mut self, rect: Rect, transform: Affine, rgba: [u8; 4], blend_mode: BlendMode) {
        self.ctx.set_transform(affine_to_cpu(transform));
        self.ctx
            .set_paint_transform(vello_cpu::kurbo::Affine::IDENTITY);
        self.ctx.set_blend_mode(blend_mode.to_peniko());
        self.ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(
            rgba[0], rgba[1], rgba[2], rgba[3],
        ));
        self.ctx.fill_rect(&vello_cpu::kurbo::Rect::new(
            rect.x0, rect.y0, rect.x1, rect.y1,
        ));
    }
}

fn affine_to_cpu(a: Affine) -> vello_cpu::kurbo::Affine {
    vello_cpu::kurbo::Affine::new(a.as_coeffs())
}

fn bezpath_to_cpu(path: &BezPath) -> vello_cpu::kurbo::BezPath {
    use kurbo::PathEl;

    let mut out = vello_cpu::kurbo::BezPath::new();
    for &el in path.elements() {
        match el {
            PathEl::MoveTo(p) => out.move_to(vello_cpu::kurbo::Point::new(p.x, p.y)),
            PathEl::LineTo(p) => out.line_to(vello_cpu::kurbo::Point::new(p.x, p.y)),
            PathEl::QuadTo(p1, p2) => out.quad_to(
                vello_cpu::kurbo::Point::new(p1.x, p1.y),
                vello_cpu::kurbo::Point::new(p2.x, p2.y),
            ),
            PathEl::CurveTo(p1, p2, p3) => out.curve_to(
                vello_cpu::kurbo::Point::new(p1.x, p1.y),
                vello_cpu::kurbo::Point::new(p2.x, p2.y),
                vello_cpu::kurbo::Point::new(p3.x, p3.y),
            ),
            PathEl::ClosePath => out.close_path(),
        }
    }
    out
}

#[cfg(test)]
#[path = "../../tests/unit/renderer/context.rs"]
mod tests;
