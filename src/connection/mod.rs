//! Public handles for the two ends of the link.
//!
//! [`Console`] runs on the operator's machine and [`Vehicle`] on the vehicle.
//! Both spawn their supervisor on the current tokio runtime and expose state
//! through watch-backed getters and streams.

pub mod console;
pub mod vehicle;


pub use console::Console;
pub use vehicle::Vehicle;
