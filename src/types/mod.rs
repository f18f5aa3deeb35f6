//! Shared data structures for the forecasting engine
//!
//! - `well` — immutable per-well history and attributes supplied by the data
//!   layer
//! - `forecast` — per-invocation forecast state, decline parameters, and the
//!   caller-facing forecast configuration surface
//! - `correlation` — inputs and outputs of the two history-free correlation
//!   forecasters

mod correlation;
mod forecast;
mod well;

pub use correlation::*;
pub use forecast::*;
pub use well::*;
