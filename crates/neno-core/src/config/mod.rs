//! Configuration system — schema, loading, and env var overrides.
//!
//! # Usage
//! ```no_run
//! use neno_core::config;
//!
//! let cfg = config::load_config(None);
//! println!("Max workers: {}", cfg.cooperative.max_workers);
//! ```

pub mod loader;
pub mod schema;

// Re-export key types
pub use loader::{get_config_path, load_config, save_config};
pub use schema::{
    Config, CooperativeConfig, ProviderConfig, ProvidersConfig, RequestConfig,
    TranscriptionConfig,
};
