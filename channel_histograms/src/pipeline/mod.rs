//! Types for wiring stages into a cycle-by-cycle pipeline

mod logging_stage;
mod product_store;

pub use logging_stage::LoggingStage;
pub use product_store::ProductStore;

use crate::error::CycleError;

/// One step of a pipeline cycle: read some products, publish others.
pub trait Stage {
    /// A name for log messages
    fn name(&self) -> &'static str;

    /// Run one cycle against the shared products.
    ///
    /// An error means this stage published nothing this cycle; products it owns are
    /// left as they were after the previous successful cycle.
    fn process(&mut self, products: &ProductStore) -> Result<(), CycleError>;
}

/// The outcome of one stage in one cycle
pub type StageOutcome = (&'static str, Result<(), CycleError>);

/// Stages run in order, once per cycle.
///
/// A failing stage does not stop the stages after it; they see whatever products are
/// currently published.
#[derive(Default)]
pub struct Pipeline {
    stages: Vec<Box<dyn Stage + Send>>,
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.stages.iter().map(|stage| stage.name()))
            .finish()
    }
}

impl Pipeline {
    /// Create an empty pipeline
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a stage. Can be chained.
    pub fn with_stage(mut self, stage: impl Stage + Send + 'static) -> Self {
        self.push(stage);
        self
    }

    /// Append a stage
    pub fn push(&mut self, stage: impl Stage + Send + 'static) {
        self.stages.push(Box::new(stage));
    }

    /// Number of stages
    pub fn len(&self) -> usize {
        self.stages.len()
    }

    /// True if there are no stages
    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Run every stage once, in order.
    pub fn run_cycle(&mut self, products: &ProductStore) -> Vec<StageOutcome> {
        self.stages
            .iter_mut()
            .map(|stage| {
                let outcome = stage.process(products);
                match &outcome {
                    Err(error) if error.is_input_missing() => {
                        log::warn!("[{}] cycle skipped: {error}", stage.name())
                    }
                    Err(error) => log::error!("[{}] cycle failed: {error}", stage.name()),
                    Ok(()) => {}
                }
                (stage.name(), outcome)
            })
            .collect()
    }
}
