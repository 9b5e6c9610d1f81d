//! Per-channel histograms of integrated waveform samples, accumulated cycle by cycle.
//!
//! This crate keeps one equal-width histogram per readout channel and
//! decides, every processing cycle, whether each channel's histogram already exists,
//! what range and bin count it gets, whether it has to be rebuilt, and which samples
//! are folded into it.
//!
//! # Policies
//!
//! * Range: fixed, relative to each channel's first value, or the channel's own
//!   min/max.
//! * Bins: fixed, or `max(10, sqrt(n))`.
//!
//! Fixed policies stream: histograms are created once and filled incrementally.
//! Automatic policies keep every raw value and rebuild touched channels each cycle.
//!
//! # Getting Started
//!
//! Use a [`HistogramEngine`] directly with [`SampleBatch`]es, or put it in a
//! [`pipeline::Pipeline`] behind a [`WaveformIntegrator`] and let both exchange data
//! through a [`pipeline::ProductStore`].
//!
//! # Feature Flags
//!
//! * `ahash-hasher`: use ahash for the internal channel-keyed hash maps.

pub mod aggregation;
pub mod config;
pub mod engine;
pub mod error;
pub mod integrator;
pub mod pipeline;
pub mod policy;
pub mod store;
pub mod types;

pub use aggregation::{ChannelHistogram, HistogramCollection};
pub use engine::HistogramEngine;
pub use error::{ConfigError, CycleError};
pub use integrator::WaveformIntegrator;
pub use policy::{BinCountPolicy, PolicyConfig, RangePolicy};
pub use store::ChannelHistogramStore;
pub use types::{ChannelKey, Sample, SampleBatch, Waveform, WaveformCollection};
