//! The histogram stage: one store, driven one cycle at a time.

use crate::{
    aggregation::HistogramCollection,
    config::{HistogramStageConfig, ProductLabels},
    error::{ConfigError, CycleError},
    pipeline::{ProductStore, Stage},
    policy::PolicyConfig,
    store::{ChannelHistogramMap, ChannelHistogramStore, CycleReport},
    types::SampleBatch,
};

/// Tags attached to the published histogram collection
pub const HISTOGRAM_PRODUCT_TAGS: [&str; 4] = [
    "HDSoC",
    "histogram",
    "histogram_list",
    "built_by_channel_integral_histogram",
];

/// Accumulates per-channel histograms of integrated samples across cycles.
///
/// Policies are resolved once, at construction. Each cycle either runs directly on a
/// [`SampleBatch`] via [`HistogramEngine::process_batch`], or as a pipeline [`Stage`]
/// that reads the batch from a [`ProductStore`] and publishes a [`HistogramCollection`].
///
/// ```
/// use channel_histograms::{HistogramEngine, SampleBatch};
///
/// let mut engine = HistogramEngine::from_json_str(r#"{"min": 0, "max": 10, "bins": 5}"#)
///     .expect("valid parameters");
/// let batch: SampleBatch = [(1_u64, 5.0), (1, 7.0), (2, 100.0)].into_iter().collect();
/// let histograms = engine.process_batch(&batch);
///
/// assert_eq!(2, histograms[&1].total_fill_count());
/// assert_eq!(&[0, 0, 0, 0, 1], histograms[&2].counts());
/// ```
#[derive(Debug)]
pub struct HistogramEngine {
    labels: ProductLabels,
    store: ChannelHistogramStore,
    last_report: CycleReport,
    republish: bool,
}

impl HistogramEngine {
    /// Resolve a stage configuration into an engine.
    pub fn new(config: &HistogramStageConfig) -> Result<Self, ConfigError> {
        let (labels, policy) = config.resolve()?;
        Ok(Self::with_policy(labels, policy))
    }

    /// Build an engine from a JSON parameter object.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Self::new(&HistogramStageConfig::from_json_str(json)?)
    }

    /// Build an engine from an already-decoded JSON parameter object.
    pub fn from_value(value: serde_json::Value) -> Result<Self, ConfigError> {
        Self::new(&HistogramStageConfig::from_value(value)?)
    }

    /// Build an engine from already-resolved labels and policies.
    pub fn with_policy(labels: ProductLabels, policy: PolicyConfig) -> Self {
        log::debug!(
            "[ChannelIntegralHistogramStage] Initialized with input '{}', output '{}', range {:?}, bins {:?}",
            labels.input,
            labels.output,
            policy.range,
            policy.bins,
        );
        Self {
            labels,
            store: ChannelHistogramStore::new(policy),
            last_report: CycleReport::default(),
            republish: false,
        }
    }

    /// Run one cycle over a batch, returning every live histogram.
    pub fn process_batch(&mut self, batch: &SampleBatch) -> &ChannelHistogramMap {
        self.last_report = self.store.process(batch);
        log::debug!(
            "[{}] Processed {} entries: {}",
            self.name(),
            batch.len(),
            self.last_report
        );
        self.store.histograms()
    }

    /// What the most recent cycle did
    pub fn last_report(&self) -> &CycleReport {
        &self.last_report
    }

    /// The underlying store
    pub fn store(&self) -> &ChannelHistogramStore {
        &self.store
    }

    /// The input and output product labels
    pub fn labels(&self) -> &ProductLabels {
        &self.labels
    }

    /// Forget all histograms and cross-cycle state.
    ///
    /// The next published collection replaces the old one rather than being merged into
    /// it, so histograms from before the reset are not published again.
    pub fn reset(&mut self) {
        self.store.reset();
        self.last_report = CycleReport::default();
        self.republish = true;
    }

    fn publish(&mut self, products: &ProductStore) -> Result<(), CycleError> {
        let output = &self.labels.output;
        if products.has_product(output) && !self.republish {
            products.checkout_write(output, |collection: &mut HistogramCollection| {
                for channel in &self.last_report.touched {
                    if let Some(histogram) = self.store.histogram(*channel) {
                        collection.insert(histogram.clone());
                    }
                }
            })?;
            log::debug!("[{}] Updated histogram list '{output}'", self.name());
        } else {
            let collection: HistogramCollection =
                self.store.histograms().values().cloned().collect();
            products.add_or_update(output.clone(), collection, HISTOGRAM_PRODUCT_TAGS);
            log::debug!("[{}] Created histogram list '{output}'", self.name());
            self.republish = false;
        }
        Ok(())
    }
}

impl Stage for HistogramEngine {
    fn name(&self) -> &'static str {
        "ChannelIntegralHistogramStage"
    }

    /// Reads the sample batch, folds it into the store, and publishes the touched
    /// histograms.
    ///
    /// Every check happens before the store is advanced: a missing input or a product
    /// of the wrong type leaves both the store and the published collection as they
    /// were.
    fn process(&mut self, products: &ProductStore) -> Result<(), CycleError> {
        let input = self.labels.input.clone();
        let output = self.labels.output.clone();
        if !products.has_product(&input) {
            log::warn!("[{}] Input '{input}' not found", self.name());
            return Err(CycleError::InputMissing { label: input });
        }
        if products.has_product(&output) {
            if let Err(error) = products.checkout_read(&output, |_: &HistogramCollection| ()) {
                log::error!("[{}] Output product '{output}': {error}", self.name());
                return Err(error);
            }
        }

        if let Err(error) = products.checkout_read(&input, |batch: &SampleBatch| {
            self.process_batch(batch);
        }) {
            log::error!("[{}] Input product '{input}': {error}", self.name());
            return Err(error);
        }

        self.publish(products).inspect_err(|error| {
            log::error!("[{}] Could not publish '{output}': {error}", self.name())
        })
    }
}
