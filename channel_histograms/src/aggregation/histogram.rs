use std::fmt::Display;

use crate::{policy::MAX_BINS, types::ChannelKey};

/// A fixed-range histogram with equal-width bins for one channel.
///
/// The range is half-open, `[range_min, range_max)`, but nothing is rejected: values
/// below the range land in the first bin and values at or above it land in the last.
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelHistogram {
    channel: ChannelKey,
    name: String,
    title: String,
    range_min: f64,
    range_max: f64,
    counts: Vec<u64>,
    total_fill_count: u64,
}

/// The histogram name used for a channel, `channel_<key>`
pub fn histogram_name(channel: ChannelKey) -> String {
    format!("channel_{channel}")
}

/// The display title used for a channel, `<prefix> - Ch <key>`
pub fn histogram_title(title_prefix: &str, channel: ChannelKey) -> String {
    format!("{title_prefix} - Ch {channel}")
}

/// An upper edge strictly above `min`: `min + 1`, or the next representable value when
/// `min` is too large for adding 1 to change it.
pub(crate) fn widened_max(min: f64) -> f64 {
    let widened = min + 1.0;
    if widened > min {
        widened
    } else if min > 0.0 {
        f64::from_bits(min.to_bits() + 1)
    } else {
        f64::from_bits(min.to_bits() - 1)
    }
}

impl ChannelHistogram {
    /// Create an empty histogram for a channel.
    ///
    /// The bin count is clamped to `[1, MAX_BINS]`, and a range that is not strictly
    /// increasing is widened to `[range_min, range_min + 1)`.
    pub fn new(
        channel: ChannelKey,
        title_prefix: &str,
        bin_count: usize,
        (range_min, range_max): (f64, f64),
    ) -> Self {
        let range_max = if range_min < range_max {
            range_max
        } else {
            widened_max(range_min)
        };
        Self {
            channel,
            name: histogram_name(channel),
            title: histogram_title(title_prefix, channel),
            range_min,
            range_max,
            counts: vec![0; bin_count.clamp(1, MAX_BINS)],
            total_fill_count: 0,
        }
    }

    /// Add 1 to the value's bin
    pub fn fill(&mut self, value: f64) {
        let bin = self.bin_index(value);
        self.counts[bin] += 1;
        self.total_fill_count += 1;
    }

    /// Fill every value in order
    pub fn fill_all<'a>(&mut self, values: impl IntoIterator<Item = &'a f64>) {
        values.into_iter().for_each(|value| self.fill(*value));
    }

    /// The bin a value would be counted in, clamped to the edge bins
    pub fn bin_index(&self, value: f64) -> usize {
        let last = self.counts.len() - 1;
        // Halved operands keep ranges spanning most of f64 from overflowing.
        let position = ((value / 2.0 - self.range_min / 2.0) / self.half_span()
            * self.counts.len() as f64)
            .floor();
        if position.is_nan() {
            if value < self.range_min {
                0
            } else {
                last
            }
        } else if position <= 0.0 {
            0
        } else if position >= last as f64 {
            last
        } else {
            position as usize
        }
    }

    fn half_span(&self) -> f64 {
        self.range_max / 2.0 - self.range_min / 2.0
    }

    /// The channel this histogram belongs to
    pub fn channel(&self) -> ChannelKey {
        self.channel
    }

    /// `channel_<key>`
    pub fn name(&self) -> &str {
        &self.name
    }

    /// `<prefix> - Ch <key>`
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Number of bins
    pub fn bin_count(&self) -> usize {
        self.counts.len()
    }

    /// `(range_min, range_max)`
    pub fn range(&self) -> (f64, f64) {
        (self.range_min, self.range_max)
    }

    /// Width of every bin
    pub fn bin_width(&self) -> f64 {
        (self.range_max - self.range_min) / self.counts.len() as f64
    }

    /// Inclusive lower edge of a bin
    pub fn bin_low_edge(&self, bin: usize) -> f64 {
        let half_offset = bin as f64 / self.counts.len() as f64 * self.half_span();
        self.range_min + half_offset + half_offset
    }

    /// Per-bin counts, lowest bin first
    pub fn counts(&self) -> &[u64] {
        &self.counts
    }

    /// Count for one bin, or None if the bin is out of range
    pub fn count(&self, bin: usize) -> Option<u64> {
        self.counts.get(bin).copied()
    }

    /// Number of values filled since this histogram was created
    pub fn total_fill_count(&self) -> u64 {
        self.total_fill_count
    }

    /// True if nothing has been filled yet
    pub fn is_empty(&self) -> bool {
        self.total_fill_count == 0
    }
}

impl Display for ChannelHistogram {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_map()
            .entry(&"name", &self.name)
            .entry(&"title", &self.title)
            .entry(&"bins", &self.counts.len())
            .entry(&"min", &self.range_min)
            .entry(&"max", &self.range_max)
            .entry(&"entries", &self.total_fill_count)
            .finish()
    }
}
