//! Default values shared by the config layer and the CLI.

/// Prefix for generated group names when a provider sets none.
pub const DEFAULT_GROUP_PREFIX: &str = "Generated";

/// Health-check endpoint written into `url-test` groups.
pub const DEFAULT_BENCHMARKING_URL: &str = "http://www.gstatic.com/generate_204";

/// Health-check interval in seconds.
pub const DEFAULT_BENCHMARKING_INTERVAL: u32 = 300;

/// Buckets smaller than this are dissolved into `leftover`.
pub const DEFAULT_GROUP_MIN_SIZE: usize = 1;

/// Placeholder inside a template group's `proxies` list that is replaced by
/// the generated group names.
pub const GENERATED_PLACEHOLDER: &str = "GENERATED";
