pub(crate) mod context;
pub(crate) mod sampler;
pub(crate) mod snapshot;
pub(crate) mod surface_pool;
pub(crate) mod texture;
