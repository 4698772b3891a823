//! Domain services composed over the storage interfaces.

pub mod performance;
pub mod recorder;
pub mod selector;

pub use performance::{click_through_rate, PerformanceAggregator};
pub use recorder::{EventDelivery, EventRecorder};
pub use selector::{sample_uniform, AdSelector};
