//! The access-control pipeline: an ordered list of admit-or-reject stages
//! run by a fixed driver, followed by the optional response cache.

pub mod context;
pub mod middleware;
pub mod stage;

pub use context::{AccessContext, CallerContext};
pub use middleware::{AccessControl, AccessPipeline};
pub use stage::{run_stages, AccessStage};
