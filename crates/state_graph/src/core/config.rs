//! # Render Graph Configuration
//!
//! Every setting the render graph consults lives here as a plain value passed
//! into the structures that need it. There is no process-wide registry: two
//! views may run with different bin policies side by side.
//!
//! ## Configuration Categories
//!
//! - **Bin registry**: bin name to default sort policy
//! - **Accumulator**: depth metric, translucency redirect, pruning cadence
//! - **Logging**: default log filter for binaries

use serde::{Deserialize, Serialize};

// Re-export from the config module for convenience
pub use crate::config::{Config, ConfigError};
use crate::cull::{BinMode, BinTarget};
use crate::graph::SortMode;

/// Name of the bin ordinary opaque geometry lands in
pub const DEFAULT_BIN_NAME: &str = "RenderBin";

/// Name of the bin translucent geometry is redirected to
pub const DEPTH_SORTED_BIN_NAME: &str = "DepthSortedBin";

/// Order number of the translucency bin
pub const DEPTH_SORTED_BIN_ORDER: i32 = 10;

/// # Bin Policy
///
/// Default sort mode for bins created under a given name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BinPolicy {
    /// Bin name as used by bin redirects
    pub name: String,
    /// Sort mode a new bin with this name starts with
    pub sort_mode: SortMode,
}

impl BinPolicy {
    /// Create a new policy
    pub fn new(name: impl Into<String>, sort_mode: SortMode) -> Self {
        Self {
            name: name.into(),
            sort_mode,
        }
    }
}

/// # Bin Registry Configuration
///
/// Resolves bin names to sort policies when a bin is first created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BinRegistryConfig {
    /// Sort mode for unnamed bins and names with no policy
    pub default_sort_mode: SortMode,
    /// Named policies
    pub policies: Vec<BinPolicy>,
}

impl BinRegistryConfig {
    /// A registry with no named policies
    pub fn empty() -> Self {
        Self {
            default_sort_mode: SortMode::StateOrder,
            policies: Vec::new(),
        }
    }

    /// Add or replace a named policy
    pub fn with_policy(mut self, name: impl Into<String>, sort_mode: SortMode) -> Self {
        self.register(name, sort_mode);
        self
    }

    /// Add or replace a named policy in place
    pub fn register(&mut self, name: impl Into<String>, sort_mode: SortMode) {
        let name = name.into();
        match self.policies.iter_mut().find(|policy| policy.name == name) {
            Some(policy) => policy.sort_mode = sort_mode,
            None => self.policies.push(BinPolicy::new(name, sort_mode)),
        }
    }

    /// Policy registered for `name`, if any
    pub fn lookup(&self, name: &str) -> Option<SortMode> {
        self.policies
            .iter()
            .find(|policy| policy.name == name)
            .map(|policy| policy.sort_mode)
    }

    /// Sort mode a new bin called `name` should start with
    pub fn sort_mode_for(&self, name: Option<&str>) -> SortMode {
        name.and_then(|name| self.lookup(name))
            .unwrap_or(self.default_sort_mode)
    }

    /// Reject empty or duplicate names
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (index, policy) in self.policies.iter().enumerate() {
            if policy.name.is_empty() {
                return Err(ConfigError::Invalid("Bin policy name cannot be empty".to_string()));
            }
            if self.policies[..index].iter().any(|earlier| earlier.name == policy.name) {
                return Err(ConfigError::Invalid(format!(
                    "Duplicate bin policy: {}",
                    policy.name
                )));
            }
        }
        Ok(())
    }
}

impl Default for BinRegistryConfig {
    fn default() -> Self {
        Self::empty()
            .with_policy(DEFAULT_BIN_NAME, SortMode::StateOrder)
            .with_policy("StateSortedBin", SortMode::StateOrder)
            .with_policy(DEPTH_SORTED_BIN_NAME, SortMode::BackToFront)
            .with_policy("FrontToBackBin", SortMode::FrontToBack)
            .with_policy("TraversalOrderBin", SortMode::TraversalOrder)
            .with_policy("Skybox", SortMode::StateOrder)
            .with_policy("UIOverlay", SortMode::TraversalOrder)
    }
}

/// How the accumulator turns a drawable's view-space center into a sort key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DepthSortMetric {
    /// Squared distance from the eye point
    #[default]
    EyeDistanceSquared,
    /// Distance along the view direction
    LookVectorDistance,
}

/// # Accumulator Configuration
///
/// Per-view accumulation policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AccumulatorConfig {
    /// Sort key computation
    pub depth_metric: DepthSortMetric,
    /// Bin drawables without an explicit redirect land in
    pub default_bin_name: String,
    /// Prune the bin set every N frames; 0 disables automatic pruning
    pub prune_interval_frames: u32,
    /// Consecutive empty frames before a bin may be pruned
    pub prune_after_empty_frames: u32,
    /// Track calculated near/far planes while accumulating
    pub compute_near_far: bool,
    /// Where transparent-hinted drawables go when no redirect is active
    pub transparent_bin: BinTarget,
}

impl AccumulatorConfig {
    /// Create an accumulator configuration with defaults
    pub fn new() -> Self {
        Self {
            depth_metric: DepthSortMetric::default(),
            default_bin_name: DEFAULT_BIN_NAME.to_string(),
            prune_interval_frames: 0,
            prune_after_empty_frames: 0,
            compute_near_far: true,
            transparent_bin: BinTarget::new(DEPTH_SORTED_BIN_ORDER, Some(DEPTH_SORTED_BIN_NAME)),
        }
    }

    /// Set the depth metric
    pub fn with_depth_metric(mut self, metric: DepthSortMetric) -> Self {
        self.depth_metric = metric;
        self
    }

    /// Set the translucency bin
    pub fn with_transparent_bin(mut self, target: BinTarget) -> Self {
        self.transparent_bin = target;
        self
    }

    /// Configure automatic pruning
    pub fn with_pruning(mut self, interval_frames: u32, after_empty_frames: u32) -> Self {
        self.prune_interval_frames = interval_frames;
        self.prune_after_empty_frames = after_empty_frames;
        self
    }

    /// Enable or disable near/far tracking
    pub fn with_near_far(mut self, enabled: bool) -> Self {
        self.compute_near_far = enabled;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.default_bin_name.is_empty() {
            return Err(ConfigError::Invalid("Default bin name cannot be empty".to_string()));
        }
        if self.transparent_bin.order == 0 {
            return Err(ConfigError::Invalid(
                "Transparent bin must not share the default bin order".to_string(),
            ));
        }
        if self.transparent_bin.mode != BinMode::Use {
            return Err(ConfigError::Invalid(
                "Transparent bin redirect must use BinMode::Use".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for AccumulatorConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// # Complete Render Graph Configuration
///
/// Top-level configuration, loadable from TOML or RON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderGraphConfig {
    /// Default log filter for binaries
    pub log_level: String,
    /// Bin name policies
    pub bins: BinRegistryConfig,
    /// Accumulation policy
    pub accumulator: AccumulatorConfig,
}

impl RenderGraphConfig {
    /// Create a configuration with defaults
    pub fn new() -> Self {
        Self {
            log_level: "info".to_string(),
            bins: BinRegistryConfig::default(),
            accumulator: AccumulatorConfig::default(),
        }
    }

    /// Set log level
    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into();
        self
    }

    /// Replace the bin registry
    pub fn with_bins(mut self, bins: BinRegistryConfig) -> Self {
        self.bins = bins;
        self
    }

    /// Replace the accumulator policy
    pub fn with_accumulator(mut self, accumulator: AccumulatorConfig) -> Self {
        self.accumulator = accumulator;
        self
    }

    /// Validate the entire configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.log_level
            .parse::<log::LevelFilter>()
            .map_err(|_| ConfigError::Invalid(format!("Unknown log level: {}", self.log_level)))?;
        self.bins.validate()?;
        self.accumulator.validate()?;
        Ok(())
    }
}

impl Default for RenderGraphConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl Config for RenderGraphConfig {}
