//! Types for working with in-memory per-channel aggregations

mod collection;
mod histogram;
mod value_history;

pub use collection::HistogramCollection;
pub(crate) use histogram::widened_max;
pub use histogram::{histogram_name, histogram_title, ChannelHistogram};
pub use value_history::ValueHistory;
