//! NENO core — shared message types, configuration, and path utilities.
//!
//! Every other crate in the workspace depends on this one; it performs no
//! network I/O.

pub mod config;
pub mod types;
pub mod utils;

pub use types::{Message, ProviderResponse, StreamDelta, Usage};
