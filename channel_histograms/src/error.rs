use crate::types::ChannelKey;

/// Why a stage's cycle did not run to completion.
///
/// None of these are fatal: the product store is left as it was before the cycle and
/// the next cycle may succeed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CycleError {
    /// The input product has not been published.
    #[error("input product '{label}' not found")]
    InputMissing {
        /// The missing product label
        label: String,
    },
    /// A product exists but holds some other type.
    #[error("product '{label}' is not a {expected}")]
    TypeMismatch {
        /// The product label
        label: String,
        /// The type the stage needed
        expected: &'static str,
    },
    /// A waveform could not be reduced to a finite integral.
    #[error("waveform {index} on channel {channel} does not integrate to a finite value")]
    ReductionFailure {
        /// Channel of the offending waveform
        channel: ChannelKey,
        /// Position of the waveform in its collection
        index: usize,
    },
    /// A product lock was poisoned by a panic in another cycle.
    #[error("product '{label}' lock is poisoned")]
    Poisoned {
        /// The product label
        label: String,
    },
}

impl CycleError {
    /// Missing inputs are routine in a pipeline that is still starting up.
    pub fn is_input_missing(&self) -> bool {
        matches!(self, CycleError::InputMissing { .. })
    }
}

/// Stage parameters that could not be turned into a working configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The parameters are not the expected JSON shape.
    #[error("could not parse stage parameters: {0}")]
    Parse(#[from] serde_json::Error),
    /// A fixed bin count of zero, or above `MAX_BINS`.
    #[error("bins must be between 1 and {}", crate::policy::MAX_BINS)]
    InvalidBins,
    /// A range whose lower bound is above its upper bound.
    #[error("range [{min}, {max}) is inverted")]
    InvalidRange {
        /// Configured lower bound
        min: f64,
        /// Configured upper bound
        max: f64,
    },
    /// NaN or an infinity where a finite number is required.
    #[error("option '{option}' must be finite")]
    NonFinite {
        /// The offending option name
        option: &'static str,
    },
}
