//! Shared data structures for the simulation and prediction core
//!
//! - `features`: the fixed simulation feature keys and their process groups
//! - `api`: request/response types of the prediction backend
//! - `status`: the tri-state application readiness

mod api;
mod features;
mod status;

pub use api::*;
pub use features::*;
pub use status::*;
