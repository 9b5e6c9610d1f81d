use std::collections::{btree_map, BTreeMap};
use std::fmt::Display;

use crate::types::ChannelKey;

use super::ChannelHistogram;

/// The published histogram set: one histogram per channel, ordered by channel.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct HistogramCollection {
    histograms: BTreeMap<ChannelKey, ChannelHistogram>,
}

impl HistogramCollection {
    /// Create an empty collection
    pub fn new() -> Self {
        Self::default()
    }

    /// The histogram for a channel
    pub fn get(&self, channel: ChannelKey) -> Option<&ChannelHistogram> {
        self.histograms.get(&channel)
    }

    /// Find a histogram by its `channel_<key>` name
    pub fn get_by_name(&self, name: &str) -> Option<&ChannelHistogram> {
        let channel: ChannelKey = name.strip_prefix("channel_")?.parse().ok()?;
        self.get(channel)
    }

    /// Insert or replace the histogram for its channel
    pub fn insert(&mut self, histogram: ChannelHistogram) -> Option<ChannelHistogram> {
        self.histograms.insert(histogram.channel(), histogram)
    }

    /// Number of histograms
    pub fn len(&self) -> usize {
        self.histograms.len()
    }

    /// True if there are no histograms
    pub fn is_empty(&self) -> bool {
        self.histograms.is_empty()
    }

    /// Iterate histograms in channel order
    pub fn iter(&self) -> btree_map::Values<'_, ChannelKey, ChannelHistogram> {
        self.histograms.values()
    }

    /// The channels present, in order
    pub fn channels(&self) -> impl Iterator<Item = ChannelKey> + '_ {
        self.histograms.keys().copied()
    }
}

impl Display for HistogramCollection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(
            f,
            "ChannelIntegralHistogramCollection with {} histograms:",
            self.len()
        )?;
        for histogram in self.iter() {
            writeln!(f, "{histogram}")?;
        }
        Ok(())
    }
}

impl FromIterator<ChannelHistogram> for HistogramCollection {
    fn from_iter<I: IntoIterator<Item = ChannelHistogram>>(iter: I) -> Self {
        Self {
            histograms: iter
                .into_iter()
                .map(|histogram| (histogram.channel(), histogram))
                .collect(),
        }
    }
}
