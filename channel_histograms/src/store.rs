//! The keyed histogram store: creation, rebuild and fill per channel.

use std::collections::{hash_map::Entry, HashMap};
use std::fmt::Display;

use crate::{
    aggregation::{ChannelHistogram, ValueHistory},
    policy::{FirstValueCache, PolicyConfig},
    types::{ChannelKey, Hasher, SampleBatch},
};

/// Live histograms, one per channel
pub type ChannelHistogramMap = HashMap<ChannelKey, ChannelHistogram, Hasher>;

/// What one cycle did to the store
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CycleReport {
    /// Channels that had at least one usable sample this cycle, in batch order
    pub touched: Vec<ChannelKey>,
    /// Histograms created for channels that had none
    pub created: usize,
    /// Histograms destroyed and built again from retained history
    pub rebuilt: usize,
    /// Fill operations performed, including refills after a rebuild
    pub filled: u64,
    /// Non-finite samples that were dropped
    pub dropped: usize,
}

impl Display for CycleReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_map()
            .entry(&"channels", &self.touched.len())
            .entry(&"created", &self.created)
            .entry(&"rebuilt", &self.rebuilt)
            .entry(&"filled", &self.filled)
            .entry(&"dropped", &self.dropped)
            .finish()
    }
}

/// Owns every channel's histogram along with the cross-cycle state the policies need.
///
/// Under fixed policies (relative ranges count as fixed once a channel's first value is
/// known) a histogram is created once and then only filled incrementally; no raw values
/// are kept. Under any auto policy every channel touched by a cycle is thrown away and
/// built again from all of the values it has ever seen, then refilled from them.
///
/// A store is not meant to be shared between concurrent cycles; `process` takes
/// `&mut self`.
#[derive(Debug)]
pub struct ChannelHistogramStore {
    policy: PolicyConfig,
    histograms: ChannelHistogramMap,
    histories: HashMap<ChannelKey, ValueHistory, Hasher>,
    first_values: FirstValueCache,
}

impl ChannelHistogramStore {
    /// Create an empty store with the given policies
    pub fn new(policy: PolicyConfig) -> Self {
        Self {
            policy,
            histograms: Default::default(),
            histories: Default::default(),
            first_values: Default::default(),
        }
    }

    /// The policies this store was created with
    pub fn policy(&self) -> &PolicyConfig {
        &self.policy
    }

    /// Fold one cycle's samples into the per-channel histograms.
    ///
    /// Channels absent from the batch are left alone.
    pub fn process(&mut self, batch: &SampleBatch) -> CycleReport {
        let Self {
            policy,
            histograms,
            histories,
            first_values,
        } = self;
        let must_rebuild = policy.must_rebuild();
        let mut report = CycleReport::default();

        for (channel, mut values) in batch.group_by_channel() {
            let received = values.len();
            values.retain(|value| value.is_finite());
            if values.len() != received {
                log::warn!(
                    "dropping {} non-finite values on channel {channel}",
                    received - values.len()
                );
                report.dropped += received - values.len();
            }
            if values.is_empty() {
                continue;
            }
            report.touched.push(channel);

            if must_rebuild {
                let history = histories.entry(channel).or_default();
                history.extend(&values);

                if histograms.remove(&channel).is_some() {
                    log::trace!("rebuilding channel {channel} from {} values", history.len());
                    report.rebuilt += 1;
                } else {
                    report.created += 1;
                }
                let Some(mut histogram) =
                    create_histogram(policy, first_values, channel, history.values())
                else {
                    log::error!("no range could be chosen for channel {channel}");
                    continue;
                };
                histogram.fill_all(history.values());
                report.filled += history.len() as u64;
                histograms.insert(channel, histogram);
            } else {
                let histogram = match histograms.entry(channel) {
                    Entry::Occupied(existing) => existing.into_mut(),
                    Entry::Vacant(vacant) => {
                        let Some(histogram) =
                            create_histogram(policy, first_values, channel, &values)
                        else {
                            log::error!("no range could be chosen for channel {channel}");
                            continue;
                        };
                        report.created += 1;
                        vacant.insert(histogram)
                    }
                };
                histogram.fill_all(&values);
                report.filled += values.len() as u64;
            }
        }

        report
    }

    /// The histogram for a channel, if one has been created
    pub fn histogram(&self, channel: ChannelKey) -> Option<&ChannelHistogram> {
        self.histograms.get(&channel)
    }

    /// All live histograms
    pub fn histograms(&self) -> &ChannelHistogramMap {
        &self.histograms
    }

    /// The remembered first value of a channel, under a relative range policy
    pub fn first_value(&self, channel: ChannelKey) -> Option<f64> {
        self.first_values.get(channel)
    }

    /// Number of raw values retained for a channel. Always 0 under fixed policies.
    pub fn retained_len(&self, channel: ChannelKey) -> usize {
        self.histories
            .get(&channel)
            .map(ValueHistory::len)
            .unwrap_or_default()
    }

    /// Number of channels with a histogram
    pub fn len(&self) -> usize {
        self.histograms.len()
    }

    /// True if no channel has a histogram yet
    pub fn is_empty(&self) -> bool {
        self.histograms.is_empty()
    }

    /// Forget every histogram, retained value and first value.
    pub fn reset(&mut self) {
        log::debug!("resetting {} channels", self.histograms.len());
        self.histograms.clear();
        self.histories.clear();
        self.first_values.clear();
    }
}

fn create_histogram(
    policy: &PolicyConfig,
    first_values: &mut FirstValueCache,
    channel: ChannelKey,
    values: &[f64],
) -> Option<ChannelHistogram> {
    let range = policy.range.range(channel, values, first_values)?;
    let bins = policy.bins.bin_count(values.len());
    log::trace!(
        "creating channel {channel} with {bins} bins over [{}, {})",
        range.0,
        range.1
    );
    Some(ChannelHistogram::new(channel, &policy.title_prefix, bins, range))
}
