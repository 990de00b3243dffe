pub mod chunk;
pub mod records;
pub mod series;

pub use chunk::{Chunk, EndBound};
pub use records::{AucRatio, AucRecord, ScalingAudit, ScalingEstimate, ScalingFactor};
pub use series::{Sample, SampleValue, SeriesSet, TimeSeries};
