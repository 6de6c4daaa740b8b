#![forbid(unsafe_code)]

pub mod analytics;
pub mod model;
pub mod time;

pub use time::Clock;
