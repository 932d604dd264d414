#![forbid(unsafe_code)]
#![deny(missing_docs)]
//! Lazily resolved filter inputs for a 2D renderer.
//!
//! A filter reads pixels from a [`FilterInput`]: an already rasterized [`Texture`]
//! ([`TextureFilterInput`]), scene [`Contents`] rasterized on demand
//! ([`ContentsFilterInput`]), or the output of another filter ([`ChainedFilterInput`]).
//! Inputs answer geometric queries (coverage, transforms) without rendering and only touch the
//! [`ContentContext`] when a [`Snapshot`] is requested.
//!
//! Coverage is an `Option<Rect>`: `None` means unbounded or unknown, an empty rectangle means
//! nothing is drawn.
//!
//! ```no_run
//! use std::rc::Rc;
//!
//! use filtergraph::{
//!     Affine, ContentContext, Entity, FilterGraph, FilterInput, FilterOp, Rect,
//!     SolidColorContents,
//! };
//!
//! let mut graph = FilterGraph::new();
//! let square = Rc::new(SolidColorContents::rect(
//!     Rect::new(0.0, 0.0, 16.0, 16.0),
//!     [255, 0, 0, 255],
//! ));
//! let leaf = graph.add_contents(square, Affine::IDENTITY);
//! let blur = graph.add_filter(FilterOp::GaussianBlur { sigma: 2.0 }, &[leaf], Affine::IDENTITY)?;
//! let input = graph.build(blur)?;
//!
//! let mut renderer = ContentContext::default();
//! let snapshot = input.snapshot(&mut renderer, &Entity::new());
//! assert!(snapshot.is_some());
//! # Ok::<(), filtergraph::FilterError>(())
//! ```

mod filters;
mod foundation;
mod renderer;
mod scene;

pub use filters::cache::{CacheStats, DEFAULT_SNAPSHOT_CACHE_CAPACITY};
pub use filters::chained_input::ChainedFilterInput;
pub use filters::color::ColorMatrix;
pub use filters::contents_input::ContentsFilterInput;
pub use filters::filter_input::{FilterInput, FilterInputRef};
pub use filters::graph::{FilterGraph, NodeId};
pub use filters::ops::{CoverageMode, FilterOp};
pub use filters::texture_input::{MipSamplerPolicy, TRILINEAR_SAMPLER_LABEL, TextureFilterInput};
pub use foundation::core::{
    Affine, BezPath, ISize, Point, Rect, Size, Vec2, intersect_coverage, invert,
    transform_bounds, union_coverage,
};
pub use foundation::error::{FilterError, FilterResult};
pub use renderer::context::{
    ContentContext, ContentContextOpts, MAX_TEXTURE_SIZE_ENV, RenderPass, RenderStats,
};
pub use renderer::sampler::{MinMagFilter, MipFilter, SamplerAddressMode, SamplerDescriptor};
pub use renderer::snapshot::{DEFAULT_SNAPSHOT_SAMPLER_LABEL, Snapshot, default_snapshot_sampler};
pub use renderer::texture::{Texture, TextureDescriptor, max_mip_count};
pub use scene::contents::{Contents, SolidColorContents};
pub use scene::entity::{BlendMode, Entity, EntityKey};
