use std::fmt::Display;

#[cfg(not(feature = "ahash-hasher"))]
use std::collections::hash_map::RandomState;

#[cfg(feature = "ahash-hasher")]
use ahash::RandomState;

/// Alias for the default hasher, selected by the ahash-hasher crate feature
pub(crate) type Hasher = RandomState;

/// An instrument readout path. Histograms are grouped by this.
pub type ChannelKey = u64;

/// One integrated measurement for one channel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    /// The channel this value was read from
    pub channel: ChannelKey,
    /// The integrated value
    pub value: f64,
}

impl Sample {
    /// Create a new sample
    #[inline]
    pub fn new(channel: ChannelKey, value: f64) -> Self {
        Self { channel, value }
    }
}

impl Display for Sample {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "ChannelIntegral {{ channel = {}, integral = {} }}",
            self.channel, self.value
        )
    }
}

impl From<(ChannelKey, f64)> for Sample {
    #[inline]
    fn from((channel, value): (ChannelKey, f64)) -> Self {
        Self { channel, value }
    }
}

/// The samples for one processing cycle, in the order they were produced.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct SampleBatch {
    samples: Vec<Sample>,
}

impl SampleBatch {
    /// Create an empty batch
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a sample to the end of the batch
    pub fn push(&mut self, sample: impl Into<Sample>) {
        self.samples.push(sample.into());
    }

    /// Number of samples in the batch
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// True if this batch has no samples
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Iterate the samples in batch order
    pub fn iter(&self) -> std::slice::Iter<'_, Sample> {
        self.samples.iter()
    }

    /// A view of the samples
    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    /// Group the values by channel.
    ///
    /// Channels are listed in order of first appearance, and each channel's values keep
    /// the order they had in the batch.
    pub fn group_by_channel(&self) -> Vec<(ChannelKey, Vec<f64>)> {
        let mut positions: std::collections::HashMap<ChannelKey, usize, Hasher> =
            Default::default();
        let mut groups: Vec<(ChannelKey, Vec<f64>)> = Vec::new();
        for sample in &self.samples {
            let position = *positions.entry(sample.channel).or_insert_with(|| {
                groups.push((sample.channel, Vec::new()));
                groups.len() - 1
            });
            groups[position].1.push(sample.value);
        }
        groups
    }
}

impl Display for SampleBatch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "ChannelIntegralCollection with {} entries:", self.len())?;
        for sample in &self.samples {
            writeln!(f, "{sample}")?;
        }
        Ok(())
    }
}

impl<T: Into<Sample>> FromIterator<T> for SampleBatch {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self {
            samples: iter.into_iter().map(Into::into).collect(),
        }
    }
}

impl From<Vec<Sample>> for SampleBatch {
    #[inline]
    fn from(samples: Vec<Sample>) -> Self {
        Self { samples }
    }
}

impl<'a> IntoIterator for &'a SampleBatch {
    type Item = &'a Sample;
    type IntoIter = std::slice::Iter<'a, Sample>;

    fn into_iter(self) -> Self::IntoIter {
        self.samples.iter()
    }
}

/// A digitized trace read out from one channel.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Waveform {
    /// The channel the trace was read from
    pub channel: ChannelKey,
    /// Digitizer samples, in time order
    pub trace: Vec<f64>,
}

impl Waveform {
    /// Create a new waveform
    pub fn new(channel: ChannelKey, trace: impl Into<Vec<f64>>) -> Self {
        Self {
            channel,
            trace: trace.into(),
        }
    }
}

/// All of the waveforms read out in one cycle.
pub type WaveformCollection = Vec<Waveform>;

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod test {
    use super::{Sample, SampleBatch};

    #[test_log::test]
    fn test_group_by_channel_is_stable() {
        let batch: SampleBatch = [(2_u64, 1.0), (1, 5.0), (2, 3.0), (1, 7.0), (9, -1.0)]
            .into_iter()
            .collect();

        assert_eq!(
            vec![(2, vec![1.0, 3.0]), (1, vec![5.0, 7.0]), (9, vec![-1.0])],
            batch.group_by_channel(),
        );
    }

    #[test_log::test]
    fn test_empty_batch_has_no_groups() {
        assert!(SampleBatch::new().group_by_channel().is_empty());
    }

    #[test_log::test]
    fn test_display() {
        assert_eq!(
            "ChannelIntegral { channel = 3, integral = 12.5 }",
            Sample::new(3, 12.5).to_string()
        );
        let mut batch = SampleBatch::new();
        batch.push((1_u64, 2.0));
        assert_eq!(
            "ChannelIntegralCollection with 1 entries:\nChannelIntegral { channel = 1, integral = 2 }\n",
            batch.to_string()
        );
    }
}
