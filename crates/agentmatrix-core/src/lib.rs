pub mod config;
pub mod context;
pub mod error;
pub mod filter;
pub mod matrix;
pub mod stats;
pub mod store;
pub mod types;
pub mod validate;

pub use crate::config::{
    CacheConfig, ConfigManager, DataConfig, LoggingConfig, ServerConfig, Settings,
};
pub use context::*;
pub use error::*;
pub use filter::*;
pub use matrix::*;
pub use stats::*;
pub use store::*;
pub use types::*;
pub use validate::*;
