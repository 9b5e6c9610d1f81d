/// The fewest bins the automatic policy will choose.
pub const MIN_AUTO_BINS: usize = 10;

/// The most bins any histogram may have.
pub const MAX_BINS: usize = 1 << 24;

/// How many bins a channel's histogram gets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinCountPolicy {
    /// The same configured count for every channel.
    Fixed(usize),
    /// `max(10, floor(sqrt(n)))` for the `n` values the histogram is built from.
    /// Forces a rebuild on every cycle that touches the channel.
    AutoSqrtN,
}

impl BinCountPolicy {
    /// Whether this policy depends on the data seen so far, rather than on config.
    pub fn is_auto(&self) -> bool {
        matches!(self, BinCountPolicy::AutoSqrtN)
    }

    /// The bin count for a histogram about to be built from `sample_count` values
    pub fn bin_count(&self, sample_count: usize) -> usize {
        match *self {
            BinCountPolicy::Fixed(bins) => bins,
            BinCountPolicy::AutoSqrtN => {
                ((sample_count as f64).sqrt().floor() as usize).max(MIN_AUTO_BINS)
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::BinCountPolicy;

    #[test_log::test]
    fn test_fixed() {
        assert_eq!(100, BinCountPolicy::Fixed(100).bin_count(0));
        assert_eq!(5, BinCountPolicy::Fixed(5).bin_count(1_000_000));
        assert!(!BinCountPolicy::Fixed(5).is_auto());
    }

    #[test_log::test]
    fn test_auto_floor() {
        let policy = BinCountPolicy::AutoSqrtN;
        assert_eq!(10, policy.bin_count(0));
        assert_eq!(10, policy.bin_count(4));
        assert_eq!(10, policy.bin_count(120));
        assert_eq!(11, policy.bin_count(121));
        assert_eq!(11, policy.bin_count(143));
        assert_eq!(1000, policy.bin_count(1_000_000));
    }
}
