//! Stream combinators for subscription APIs

mod throttle;

pub use throttle::{Throttle, ThrottleExt};
