use std::collections::HashMap;

use crate::foundation::core::ISize;
use crate::foundation::error::FilterResult;
use crate::renderer::texture::new_pixmap;

/// Pool configuration for cached render targets.
#[derive(Debug, Clone, Copy)]
pub(crate) struct SurfacePoolOpts {
    /// Maximum bytes retained across all buckets.
    pub(crate) max_pool_bytes: usize,
    /// Maximum number of retained surfaces per size bucket.
    pub(crate) max_surfaces_per_bucket: usize,
}

impl Default for SurfacePoolOpts {
    fn default() -> Self {
        Self {
            max_pool_bytes: 64 * 1024 * 1024,
            max_surfaces_per_bucket: 4,
        }
    }
}

#[derive(Debug, Default, Clone)]
pub(crate) struct SurfacePoolStats {
    pub(crate) retained_surfaces: usize,
    pub(crate) retained_bytes: usize,
    pub(crate) alloc_surfaces: u64,
    pub(crate) reused_surfaces: u64,
    pub(crate) dropped_on_release: u64,
}

fn byte_len(size: ISize) -> usize {
    (size.width as usize)
        .saturating_mul(size.height as usize)
        .saturating_mul(4)
}

/// Bounded pooled allocator for off-screen render targets, keyed by pixel size.
///
/// Borrowed pixmaps keep whatever contents they had when released; callers clear them.
pub(crate) struct SurfacePool {
    opts: SurfacePoolOpts,
    stats: SurfacePoolStats,
    buckets: HashMap<ISize, Vec<vello_cpu::Pixmap>>,
}

impl SurfacePool {
    pub(crate) fn new(opts: SurfacePoolOpts) -> Self {
        Self {
            opts,
            stats: SurfacePoolStats::default(),
            buckets: HashMap::new(),
        }
    }

    pub(crate) fn stats(&self) -> SurfacePoolStats {
        self.stats.clone()
    }

    pub(crate) fn borrow(&mut self, size: ISize) -> FilterResult<vello_cpu::Pixmap> {
        if let Some(p) = self.buckets.get_mut(&size).and_then(Vec::pop) {
            self.stats.retained_surfaces = self.stats.retained_surfaces.saturating_sub(1);
            self.stats.retained_bytes = self.stats.retained_bytes.saturating_sub(byte_len(size));
            self.stats.reused_surfaces = self.stats.reused_surfaces.saturating_add(1);
            return Ok(p);
        }

        let pixmap = new_pixmap(size)?;
        self.stats.alloc_surfaces = self.stats.alloc_surfaces.saturating_add(1);
        Ok(pixmap)
    }

    pub(crate) fn release(&mut self, pixmap: vello_cpu::Pixmap) {
        if self.opts.max_pool_bytes == 0 || self.opts.max_surfaces_per_bucket == 0 {
            self.stats.dropped_on_release = self.stats.dropped_on_release.saturating_add(1);
            return;
        }

        let size = ISize::new(u32::from(pixmap.width()), u32::from(pixmap.height()));
        let bytes = byte_len(size);
        if self.stats.retained_bytes.saturating_add(bytes) > self.opts.max_pool_bytes {
            self.stats.dropped_on_release = self.stats.dropped_on_release.saturating_add(1);
            return;
        }

        let bucket = self.buckets.entry(size).or_default();
        if bucket.len() >= self.opts.max_surfaces_per_bucket {
            self.stats.dropped_on_release = self.stats.dropped_on_release.saturating_add(1);
            return;
        }

        bucket.push(pixmap);
        self.stats.retained_surfaces = self.stats.retained_surfaces.saturating_add(1);
        self.stats.retained_bytes = self.stats.retained_bytes.saturating_add(bytes);
    }
}
