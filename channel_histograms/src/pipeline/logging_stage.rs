use std::{any::Any, fmt::Display, marker::PhantomData};

use crate::error::CycleError;

use super::{ProductStore, Stage};

/// A stage that logs a product each cycle and changes nothing
pub struct LoggingStage<T> {
    label: String,
    log_level: log::Level,
    _product: PhantomData<fn() -> T>,
}

impl<T> LoggingStage<T> {
    /// Log the product under `label` at Info
    pub fn new(label: impl Into<String>) -> Self {
        Self::with_level(label, log::Level::Info)
    }

    /// Log the product under `label` at `log_level`
    pub fn with_level(label: impl Into<String>, log_level: log::Level) -> Self {
        Self {
            label: label.into(),
            log_level,
            _product: PhantomData,
        }
    }
}

impl<T> Stage for LoggingStage<T>
where
    T: Display + Any,
{
    fn name(&self) -> &'static str {
        "LoggingStage"
    }

    fn process(&mut self, products: &ProductStore) -> Result<(), CycleError> {
        products.checkout_read(&self.label, |product: &T| {
            log::log!(self.log_level, "[{}] {}: {}", self.name(), self.label, product)
        })
    }
}
