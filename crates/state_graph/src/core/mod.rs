//! # Core Module
//!
//! Shared configuration for the render graph and its traversal accumulator.
//!
//! ## Organization
//!
//! - **Config**: bin registry, accumulator policy and logging settings

pub mod config;

// Re-export commonly used config types
pub use config::{
    AccumulatorConfig,
    BinPolicy,
    BinRegistryConfig,
    Config,
    ConfigError,
    DepthSortMetric,
    RenderGraphConfig,
};
