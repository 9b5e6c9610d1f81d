//! Reduces waveform traces to one integrated sample each.

use crate::{
    config::{IntegratorStageConfig, ProductLabels},
    error::{ConfigError, CycleError},
    pipeline::{ProductStore, Stage},
    types::{Sample, SampleBatch, Waveform, WaveformCollection},
};

/// Sums each waveform's trace and publishes the sums as a [`SampleBatch`].
///
/// The published batch replaces the previous cycle's batch. If any trace fails to
/// integrate, nothing is published and the previous batch stays in place.
#[derive(Debug, Clone)]
pub struct WaveformIntegrator {
    labels: ProductLabels,
}

impl WaveformIntegrator {
    /// Resolve a stage configuration into an integrator.
    pub fn new(config: &IntegratorStageConfig) -> Self {
        let labels = config.resolve();
        log::debug!(
            "[NaluWaveformsIntegratorStage] Initialized with input='{}', output='{}'",
            labels.input,
            labels.output
        );
        Self { labels }
    }

    /// Build an integrator from a JSON parameter object.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(Self::new(&IntegratorStageConfig::from_json_str(json)?))
    }

    /// Build an integrator from an already-decoded JSON parameter object.
    pub fn from_value(value: serde_json::Value) -> Result<Self, ConfigError> {
        Ok(Self::new(&IntegratorStageConfig::from_value(value)?))
    }

    /// The input and output product labels
    pub fn labels(&self) -> &ProductLabels {
        &self.labels
    }
}

impl Default for WaveformIntegrator {
    fn default() -> Self {
        Self::new(&IntegratorStageConfig::default())
    }
}

/// Sum one trace. An empty trace integrates to 0.
pub fn integrate(waveform: &Waveform) -> f64 {
    waveform.trace.iter().sum()
}

/// Integrate every waveform, in order.
///
/// Fails on the first waveform whose sum is not finite.
pub fn integrate_all(waveforms: &[Waveform]) -> Result<SampleBatch, CycleError> {
    waveforms
        .iter()
        .enumerate()
        .map(|(index, waveform)| {
            let integral = integrate(waveform);
            if integral.is_finite() {
                Ok(Sample::new(waveform.channel, integral))
            } else {
                Err(CycleError::ReductionFailure {
                    channel: waveform.channel,
                    index,
                })
            }
        })
        .collect::<Result<Vec<Sample>, CycleError>>()
        .map(SampleBatch::from)
}

impl Stage for WaveformIntegrator {
    fn name(&self) -> &'static str {
        "NaluWaveformsIntegratorStage"
    }

    fn process(&mut self, products: &ProductStore) -> Result<(), CycleError> {
        let input = &self.labels.input;
        if !products.has_product(input) {
            log::warn!("[{}] Input product '{input}' not found", self.name());
            return Err(CycleError::InputMissing {
                label: input.clone(),
            });
        }

        let integrals = products
            .checkout_read(input, |waveforms: &WaveformCollection| {
                integrate_all(waveforms).map(|batch| (waveforms.len(), batch))
            })
            .and_then(|integrated| integrated);
        let (waveform_count, batch) = match integrals {
            Ok(integrated) => integrated,
            Err(error) => {
                log::error!("[{}] Could not integrate '{input}': {error}", self.name());
                return Err(error);
            }
        };

        log::debug!("[{}] Integrated {waveform_count} waveforms", self.name());
        products.add_or_update(self.labels.output.clone(), batch, Vec::<String>::new());
        Ok(())
    }
}
