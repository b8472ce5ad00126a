use crate::defaults::{
    DEFAULT_BENCHMARKING_INTERVAL, DEFAULT_BENCHMARKING_URL, DEFAULT_GROUP_MIN_SIZE,
};

/// Run-level switches for one conversion.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerateOptions {
    pub enable_grouping: bool,
    pub use_emoji: bool,
    pub exclude_amplified: bool,
    /// Overrides `ProviderConfig::regex_collapse` when set.
    pub regex_collapse: bool,
    pub group_min_size: usize,
    pub benchmarking_url: String,
    pub benchmarking_interval: u32,
}

impl Default for GenerateOptions {
    fn default() -> Self {
        Self {
            enable_grouping: true,
            use_emoji: false,
            exclude_amplified: false,
            regex_collapse: false,
            group_min_size: DEFAULT_GROUP_MIN_SIZE,
            benchmarking_url: DEFAULT_BENCHMARKING_URL.to_string(),
            benchmarking_interval: DEFAULT_BENCHMARKING_INTERVAL,
        }
    }
}
