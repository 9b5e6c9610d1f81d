//! Stage parameters, as they arrive from the pipeline's JSON configuration.
//!
//! Every option is optional. Presence checks happen once, in `resolve`, and produce the
//! policy variants the stages run with.

use serde::{Deserialize, Serialize};

use crate::{
    error::ConfigError,
    policy::{BinCountPolicy, PolicyConfig, RangePolicy, MAX_BINS},
};

/// Default label of the sample collection the histogram stage reads
pub const DEFAULT_SAMPLE_PRODUCT: &str = "ChannelIntegralCollection";
/// Default label of the histogram collection the histogram stage publishes
pub const DEFAULT_HISTOGRAM_PRODUCT: &str = "ChannelIntegralHistogramCollection";
/// Default label of the waveform collection the integrator reads
pub const DEFAULT_WAVEFORM_PRODUCT: &str = "NaluWaveformCollection";
/// Default histogram title prefix
pub const DEFAULT_TITLE_PREFIX: &str = "Integral";

/// Where a stage reads from and publishes to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductLabels {
    /// Label of the product the stage consumes
    pub input: String,
    /// Label of the product the stage publishes
    pub output: String,
}

/// Options recognized by the histogram stage.
///
/// | option | effect |
/// |---|---|
/// | `relative_min`, `relative_max` | both present: range relative to each channel's first value |
/// | `min`, `max` | both present (and no relative pair): fixed range |
/// | neither pair | range from each channel's smallest and largest value |
/// | `bins` | present: fixed bin count, otherwise `max(10, sqrt(n))` |
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistogramStageConfig {
    /// Label of the input sample collection
    pub input_product: Option<String>,
    /// Label of the output histogram collection
    pub product_name: Option<String>,
    /// Prefixed to each histogram's title
    pub title_prefix: Option<String>,
    /// Fixed range lower edge
    pub min: Option<f64>,
    /// Fixed range upper edge
    pub max: Option<f64>,
    /// Offset from each channel's first value to its lower edge
    pub relative_min: Option<f64>,
    /// Offset from each channel's first value to its upper edge
    pub relative_max: Option<f64>,
    /// Fixed bin count
    pub bins: Option<usize>,
}

impl HistogramStageConfig {
    /// Parse from a JSON parameter object
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Parse from an already-decoded JSON parameter object
    pub fn from_value(value: serde_json::Value) -> Result<Self, ConfigError> {
        Ok(serde_json::from_value(value)?)
    }

    /// Decide the labels and the policies this configuration describes.
    pub fn resolve(&self) -> Result<(ProductLabels, PolicyConfig), ConfigError> {
        let labels = ProductLabels {
            input: label_or(&self.input_product, DEFAULT_SAMPLE_PRODUCT),
            output: label_or(&self.product_name, DEFAULT_HISTOGRAM_PRODUCT),
        };
        let title_prefix = self
            .title_prefix
            .clone()
            .unwrap_or_else(|| DEFAULT_TITLE_PREFIX.to_string());

        let range = match (self.relative_min, self.relative_max, self.min, self.max) {
            (Some(offset_min), Some(offset_max), min, max) => {
                if min.is_some() || max.is_some() {
                    log::warn!("relative_min/relative_max take precedence over min/max");
                }
                finite("relative_min", offset_min)?;
                finite("relative_max", offset_max)?;
                ordered(offset_min, offset_max)?;
                RangePolicy::RelativeToFirstSample {
                    offset_min,
                    offset_max,
                }
            }
            (relative_min, relative_max, Some(min), Some(max)) => {
                if relative_min.is_some() || relative_max.is_some() {
                    log::warn!("ignoring incomplete relative_min/relative_max pair");
                }
                finite("min", min)?;
                finite("max", max)?;
                ordered(min, max)?;
                RangePolicy::Fixed { min, max }
            }
            (relative_min, relative_max, min, max) => {
                if [relative_min, relative_max, min, max]
                    .iter()
                    .any(Option::is_some)
                {
                    log::warn!("ignoring incomplete range options; using automatic range");
                }
                RangePolicy::AutoMinMax
            }
        };

        let bins = match self.bins {
            Some(bins) if !(1..=MAX_BINS).contains(&bins) => return Err(ConfigError::InvalidBins),
            Some(bins) => BinCountPolicy::Fixed(bins),
            None => BinCountPolicy::AutoSqrtN,
        };

        Ok((labels, PolicyConfig::new(range, bins, title_prefix)))
    }
}

/// Options recognized by the waveform integrator stage.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IntegratorStageConfig {
    /// Label of the input waveform collection
    pub input_product: Option<String>,
    /// Label of the output sample collection
    pub product_name: Option<String>,
}

impl IntegratorStageConfig {
    /// Parse from a JSON parameter object
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Parse from an already-decoded JSON parameter object
    pub fn from_value(value: serde_json::Value) -> Result<Self, ConfigError> {
        Ok(serde_json::from_value(value)?)
    }

    /// The labels this configuration describes
    pub fn resolve(&self) -> ProductLabels {
        ProductLabels {
            input: label_or(&self.input_product, DEFAULT_WAVEFORM_PRODUCT),
            output: label_or(&self.product_name, DEFAULT_SAMPLE_PRODUCT),
        }
    }
}

fn label_or(label: &Option<String>, default: &str) -> String {
    label.clone().unwrap_or_else(|| default.to_string())
}

fn finite(option: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(ConfigError::NonFinite { option })
    }
}

fn ordered(min: f64, max: f64) -> Result<(), ConfigError> {
    if min <= max {
        Ok(())
    } else {
        Err(ConfigError::InvalidRange { min, max })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod test {
    use crate::{
        error::ConfigError,
        policy::{BinCountPolicy, RangePolicy},
    };

    use super::{HistogramStageConfig, IntegratorStageConfig};

    #[test_log::test]
    fn test_defaults_are_auto() {
        let (labels, policy) = HistogramStageConfig::from_json_str("{}")
            .unwrap()
            .resolve()
            .unwrap();
        assert_eq!("ChannelIntegralCollection", labels.input);
        assert_eq!("ChannelIntegralHistogramCollection", labels.output);
        assert_eq!("Integral", policy.title_prefix);
        assert_eq!(RangePolicy::AutoMinMax, policy.range);
        assert_eq!(BinCountPolicy::AutoSqrtN, policy.bins);
        assert!(policy.must_rebuild());
    }

    #[test_log::test]
    fn test_fixed() {
        let (labels, policy) = HistogramStageConfig::from_json_str(
            r#"{"input_product": "in", "product_name": "out", "title_prefix": "Q", "min": 0, "max": 10, "bins": 5}"#,
        )
        .unwrap()
        .resolve()
        .unwrap();
        assert_eq!("in", labels.input);
        assert_eq!("out", labels.output);
        assert_eq!("Q", policy.title_prefix);
        assert_eq!(
            RangePolicy::Fixed {
                min: 0.0,
                max: 10.0
            },
            policy.range
        );
        assert_eq!(BinCountPolicy::Fixed(5), policy.bins);
        assert!(!policy.must_rebuild());
    }

    #[test_log::test]
    fn test_relative_takes_precedence() {
        let (_, policy) = HistogramStageConfig::from_value(serde_json::json!({
            "min": 0.0,
            "max": 10.0,
            "relative_min": -10.0,
            "relative_max": 10.0,
            "bins": 100,
        }))
        .unwrap()
        .resolve()
        .unwrap();
        assert_eq!(
            RangePolicy::RelativeToFirstSample {
                offset_min: -10.0,
                offset_max: 10.0
            },
            policy.range
        );
        assert!(!policy.must_rebuild());
    }

    #[test_log::test]
    fn test_half_pairs_fall_back_to_auto() {
        let (_, policy) = HistogramStageConfig::from_value(serde_json::json!({
            "min": 0.0,
            "relative_max": 10.0,
        }))
        .unwrap()
        .resolve()
        .unwrap();
        assert_eq!(RangePolicy::AutoMinMax, policy.range);
    }

    #[test_log::test]
    fn test_invalid() {
        let zero_bins = HistogramStageConfig {
            bins: Some(0),
            ..Default::default()
        };
        assert!(matches!(zero_bins.resolve(), Err(ConfigError::InvalidBins)));

        let too_many_bins =
            HistogramStageConfig::from_json_str(r#"{"bins": 1000000000000}"#).unwrap();
        assert!(matches!(
            too_many_bins.resolve(),
            Err(ConfigError::InvalidBins)
        ));

        let inverted = HistogramStageConfig {
            min: Some(5.0),
            max: Some(1.0),
            ..Default::default()
        };
        assert!(matches!(
            inverted.resolve(),
            Err(ConfigError::InvalidRange { .. })
        ));

        let infinite = HistogramStageConfig {
            relative_min: Some(f64::NEG_INFINITY),
            relative_max: Some(1.0),
            ..Default::default()
        };
        assert!(matches!(
            infinite.resolve(),
            Err(ConfigError::NonFinite {
                option: "relative_min"
            })
        ));

        assert!(matches!(
            HistogramStageConfig::from_json_str(r#"{"bins": -3}"#),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test_log::test]
    fn test_integrator_labels() {
        let labels = IntegratorStageConfig::default().resolve();
        assert_eq!("NaluWaveformCollection", labels.input);
        assert_eq!("ChannelIntegralCollection", labels.output);

        let labels = IntegratorStageConfig::from_json_str(r#"{"product_name": "sums"}"#)
            .unwrap()
            .resolve();
        assert_eq!("sums", labels.output);
    }
}
