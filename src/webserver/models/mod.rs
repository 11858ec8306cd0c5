/// API data models
pub mod responses;

pub use responses::*;
