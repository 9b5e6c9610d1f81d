/// Every value a channel has seen since the session started.
///
/// Auto policies recompute range and bin count from the whole history on each rebuild,
/// so raw values are kept rather than summary statistics.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ValueHistory {
    values: Vec<f64>,
}

impl ValueHistory {
    /// Append values in order
    pub fn extend<'a>(&mut self, values: impl IntoIterator<Item = &'a f64>) {
        self.values.extend(values);
    }

    /// Number of retained values
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// True if nothing has been retained
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// The retained values, oldest first
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Forget every retained value
    pub fn clear(&mut self) {
        self.values.clear();
    }
}

#[cfg(test)]
mod test {
    use super::ValueHistory;

    #[test_log::test]
    fn test_history_keeps_order() {
        let mut history = ValueHistory::default();
        assert!(history.is_empty());

        history.extend(&[3.0, -2.5]);
        history.extend(&[8.0]);
        assert_eq!(&[3.0, -2.5, 8.0], history.values());
        assert_eq!(3, history.len());

        history.clear();
        assert!(history.is_empty());
    }
}
