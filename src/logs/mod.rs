//! Log text pipeline: timestamp stripping, filtering, rendering, the
//! viewport buffer, and the incremental fetcher for running jobs.

pub mod fetcher;
pub mod filter;
pub mod render;
pub mod strip;
pub mod view;
