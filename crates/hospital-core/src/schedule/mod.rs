//! Doctor schedule generation from weekly recurrence patterns.

mod generator;
mod request;

pub use generator::*;
pub use request::*;
