//! Schema module - Blend, pool, configuration and request types.

mod blend;
mod config;
mod evolution;
mod pool;
mod request;

pub use blend::*;
pub use config::*;
pub use evolution::*;
pub use pool::*;
pub use request::*;
