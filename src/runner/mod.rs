//! Turn execution: runner and event stream types.

pub mod events;
pub mod runner;

pub use events::*;
pub use runner::*;
