pub mod increment;
pub mod mean_ratio;
pub mod reference;

pub use increment::apply_audited_scaling;
pub use mean_ratio::{chunk_factor, rescale_by_chunk_means, MeanRatioOutcome};
pub use reference::{reference_percent, rescale_to_reference, ReferenceOutcome};
