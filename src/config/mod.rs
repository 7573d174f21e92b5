// * Runtime configuration: compile-time constants plus environment-driven settings.

pub mod constants;
pub mod settings;

pub use settings::{FetchEngine, LogFormat, ServiceConfig};
