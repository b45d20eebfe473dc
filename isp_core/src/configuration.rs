//! Per-solve configuration of the ISP model
use std::time::Duration;

use derive_builder::Builder;

/// Configuration selecting the problem variant and solver budget
///
/// The four problem variants (base, operational limits, bridging, both) are
/// the cross product of the two boolean flags. A configuration is fixed for
/// the lifetime of one model; solving the same instance under another
/// configuration means building a fresh model.
///
/// # Examples
/// ```rust
/// use isp_core::configuration::IspConfigBuilder;
/// let config = IspConfigBuilder::default()
///     .bridging(true)
///     .build()
///     .unwrap();
/// assert!(config.bridging);
/// assert_eq!(config.max_sessions_per_interpreter, 15);
/// ```
#[derive(Debug, Clone, Builder)]
pub struct IspConfig {
    /// Enable the per-interpreter workload constraints (session cap and
    /// consecutive-block rule)
    #[builder(default = "false")]
    pub operational_limits: bool,
    /// Allow covering a language pair indirectly through a bridge language
    #[builder(default = "false")]
    pub bridging: bool,
    /// Maximum number of sessions one interpreter may be assigned in total
    /// (only enforced with `operational_limits`)
    #[builder(default = "15")]
    pub max_sessions_per_interpreter: usize,
    /// Length of the sliding block window for the consecutive-workload rule
    #[builder(default = "4")]
    pub consecutive_block_window: usize,
    /// Maximum number of worked blocks within any window
    /// (`consecutive_block_window - 1` forbids working the whole window)
    #[builder(default = "3")]
    pub max_worked_blocks_in_window: usize,
    /// Wall-clock budget handed to the MILP engine per solve
    #[builder(default = "Duration::from_secs(600)")]
    pub time_limit: Duration,
}

impl Default for IspConfig {
    fn default() -> Self {
        IspConfigBuilder::default().build().unwrap()
    }
}
