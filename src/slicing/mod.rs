//! Slice planning and rendering.

mod driver;
mod planner;
mod store;

pub use driver::SliceRenderDriver;
pub use planner::{
    compute_bounds, linspace, plan_slices, SlicePlan, SliceSpec, CLIP_AHEAD, CLIP_BEHIND, Z_OFFSET,
};
pub use store::{SliceStorage, SliceStore};
