pub mod chunks;
pub mod config;

pub use chunks::{day_span, segment_range, start_of_day};
pub use config::{ReconcileConfig, RescaleMethod};
