//! Range and bin-count policies, resolved once from configuration.

mod bin_count;
mod range;

pub use bin_count::{BinCountPolicy, MAX_BINS, MIN_AUTO_BINS};
pub use range::{FirstValueCache, RangePolicy};

/// The active policies and the fixed parameters that go with them.
#[derive(Debug, Clone, PartialEq)]
pub struct PolicyConfig {
    /// How each channel's range is chosen
    pub range: RangePolicy,
    /// How each channel's bin count is chosen
    pub bins: BinCountPolicy,
    /// Prefixed to each histogram title
    pub title_prefix: String,
}

impl PolicyConfig {
    /// Create a policy config
    pub fn new(range: RangePolicy, bins: BinCountPolicy, title_prefix: impl Into<String>) -> Self {
        Self {
            range,
            bins,
            title_prefix: title_prefix.into(),
        }
    }

    /// Any auto policy means every touched channel is rebuilt from its full history,
    /// and raw values must be retained.
    pub fn must_rebuild(&self) -> bool {
        self.range.is_auto() || self.bins.is_auto()
    }
}

impl Default for PolicyConfig {
    /// Auto range and auto bins, titled "Integral".
    fn default() -> Self {
        Self::new(
            RangePolicy::AutoMinMax,
            BinCountPolicy::AutoSqrtN,
            crate::config::DEFAULT_TITLE_PREFIX,
        )
    }
}
