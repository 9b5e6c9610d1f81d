use std::collections::HashMap;

use ordered_float::OrderedFloat;

use crate::{
    aggregation::widened_max,
    types::{ChannelKey, Hasher},
};

/// How a channel's histogram range is chosen.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RangePolicy {
    /// The same configured range for every channel.
    Fixed {
        /// Inclusive lower edge
        min: f64,
        /// Exclusive upper edge
        max: f64,
    },
    /// Offsets applied to each channel's first observed value. The first value is
    /// remembered for the life of the store, so the range never moves once chosen.
    RelativeToFirstSample {
        /// Added to the first value to get the lower edge
        offset_min: f64,
        /// Added to the first value to get the upper edge
        offset_max: f64,
    },
    /// The smallest and largest value the channel has seen. Forces a rebuild on every
    /// cycle that touches the channel.
    AutoMinMax,
}

impl RangePolicy {
    /// Whether this policy depends on the data seen so far, rather than on config.
    pub fn is_auto(&self) -> bool {
        matches!(self, RangePolicy::AutoMinMax)
    }

    /// Decide `(min, max)` for a channel whose histogram is about to be built from
    /// `values`.
    ///
    /// Returns None when the policy needs data and `values` is empty. A degenerate
    /// range is widened so that `min < max`.
    pub fn range(
        &self,
        channel: ChannelKey,
        values: &[f64],
        first_values: &mut FirstValueCache,
    ) -> Option<(f64, f64)> {
        let range = match *self {
            RangePolicy::Fixed { min, max } => (min, max),
            RangePolicy::RelativeToFirstSample {
                offset_min,
                offset_max,
            } => {
                let base = first_values.get_or_insert(channel, values.first().copied())?;
                (base + offset_min, base + offset_max)
            }
            RangePolicy::AutoMinMax => {
                let min = values.iter().copied().map(OrderedFloat).min()?;
                let max = values.iter().copied().map(OrderedFloat).max()?;
                (min.into_inner(), max.into_inner())
            }
        };
        Some(widen_degenerate(range))
    }
}

/// Equal bounds get 1.0 added to the upper edge, or the smallest step that still
/// raises it.
fn widen_degenerate((min, max): (f64, f64)) -> (f64, f64) {
    if min == max {
        log::trace!("widening degenerate range [{min}, {max})");
        (min, widened_max(min))
    } else {
        (min, max)
    }
}

/// The first value seen on each channel, for relative ranges.
///
/// Entries are never evicted by histogram rebuilds; only [`FirstValueCache::clear`]
/// forgets them.
#[derive(Debug, Default, Clone)]
pub struct FirstValueCache {
    first_values: HashMap<ChannelKey, f64, Hasher>,
}

impl FirstValueCache {
    /// The remembered first value of a channel
    pub fn get(&self, channel: ChannelKey) -> Option<f64> {
        self.first_values.get(&channel).copied()
    }

    /// The remembered first value, or remember `candidate` if this is the first time
    /// the channel is seen.
    pub fn get_or_insert(&mut self, channel: ChannelKey, candidate: Option<f64>) -> Option<f64> {
        match self.first_values.get(&channel) {
            Some(existing) => Some(*existing),
            None => {
                let first = candidate?;
                log::debug!("channel {channel} first value {first}");
                self.first_values.insert(channel, first);
                Some(first)
            }
        }
    }

    /// Number of channels remembered
    pub fn len(&self) -> usize {
        self.first_values.len()
    }

    /// True if no channel has been remembered
    pub fn is_empty(&self) -> bool {
        self.first_values.is_empty()
    }

    /// Forget everything
    pub fn clear(&mut self) {
        self.first_values.clear();
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod test {
    use super::{FirstValueCache, RangePolicy};

    #[test_log::test]
    fn test_fixed_ignores_values() {
        let mut cache = FirstValueCache::default();
        let policy = RangePolicy::Fixed {
            min: 0.0,
            max: 10.0,
        };
        assert_eq!(Some((0.0, 10.0)), policy.range(1, &[], &mut cache));
        assert_eq!(Some((0.0, 10.0)), policy.range(1, &[500.0], &mut cache));
        assert!(cache.is_empty());
    }

    #[test_log::test]
    fn test_relative_remembers_first_value() {
        let mut cache = FirstValueCache::default();
        let policy = RangePolicy::RelativeToFirstSample {
            offset_min: -10.0,
            offset_max: 10.0,
        };
        assert_eq!(None, policy.range(3, &[], &mut cache));
        assert_eq!(Some((90.0, 110.0)), policy.range(3, &[100.0, 4.0], &mut cache));
        assert_eq!(Some((90.0, 110.0)), policy.range(3, &[500.0], &mut cache));
        assert_eq!(Some((90.0, 110.0)), policy.range(3, &[], &mut cache));
        assert_eq!(Some(100.0), cache.get(3));
    }

    #[test_log::test]
    fn test_relative_degenerate_offsets() {
        let mut cache = FirstValueCache::default();
        let policy = RangePolicy::RelativeToFirstSample {
            offset_min: 0.0,
            offset_max: 0.0,
        };
        assert_eq!(Some((7.0, 8.0)), policy.range(1, &[7.0], &mut cache));
    }

    #[test_log::test]
    fn test_auto_min_max() {
        let mut cache = FirstValueCache::default();
        let policy = RangePolicy::AutoMinMax;
        assert!(policy.is_auto());
        assert_eq!(None, policy.range(1, &[], &mut cache));
        assert_eq!(Some((-3.0, 12.0)), policy.range(1, &[4.0, -3.0, 12.0], &mut cache));
        assert_eq!(Some((50.0, 51.0)), policy.range(1, &[50.0], &mut cache));
    }

    #[test_log::test]
    fn test_auto_widening_beyond_integer_precision() {
        let mut cache = FirstValueCache::default();
        let (min, max) = RangePolicy::AutoMinMax
            .range(1, &[1e17], &mut cache)
            .unwrap();
        assert_eq!(1e17, min);
        assert!(min < max);

        let (min, max) = RangePolicy::AutoMinMax
            .range(1, &[-1e17, -1e17], &mut cache)
            .unwrap();
        assert_eq!(-1e17, min);
        assert!(min < max);
    }
}
