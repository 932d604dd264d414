pub(crate) mod blur;
pub(crate) mod cache;
pub(crate) mod chained_input;
pub(crate) mod color;
pub(crate) mod contents_input;
pub(crate) mod filter_input;
pub(crate) mod graph;
pub(crate) mod ops;
pub(crate) mod texture_input;
