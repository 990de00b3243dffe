use crate::error::ReconcileResult;
use crate::models::{Chunk, Sample, ScalingFactor, SeriesSet, TimeSeries};
use crate::segmentation::segment_range;
use crate::{log_debug, log_info};

const ENABLE_LOGS: bool = true;

/// Rescaled fine series plus the factor used for every (keyword, chunk).
#[derive(Debug, Clone, PartialEq)]
pub struct MeanRatioOutcome {
    pub series: SeriesSet,
    pub factors: Vec<ScalingFactor>,
}

/// Factor bringing the fine mean to the coarse mean.
///
/// Falls back to `1.0` when either mean is missing, the fine mean is zero, or the
/// ratio is not a finite non-negative number.
pub fn chunk_factor(keyword: &str, chunk: Chunk, coarse_mean: Option<f64>, fine_mean: Option<f64>) -> ScalingFactor {
    match (coarse_mean, fine_mean) {
        (Some(coarse), Some(fine)) if fine != 0.0 => {
            let factor = coarse / fine;
            if factor.is_finite() && factor >= 0.0 {
                ScalingFactor::computed(keyword, chunk, factor)
            } else {
                ScalingFactor::no_rescale(keyword, chunk)
            }
        }
        _ => ScalingFactor::no_rescale(keyword, chunk),
    }
}

/// Rescale every fine keyword so its mean inside each chunk matches the coarse mean.
///
/// Chunks span the fine set's own time range. Non-numeric entries are excluded from
/// both means and pass through unchanged. Chunk results are concatenated in order
/// with no smoothing at the boundaries.
pub fn rescale_by_chunk_means(
    coarse: &SeriesSet,
    fine: &SeriesSet,
    chunk_width_months: u32,
) -> ReconcileResult<MeanRatioOutcome> {
    let chunks = match fine.time_span() {
        Some((start, end)) => segment_range(start, end, chunk_width_months)?,
        None => Vec::new(),
    };

    log_info!(
        "Rescaling '{}' against '{}' over {} chunk(s)",
        fine.label,
        coarse.label,
        chunks.len()
    );

    let mut rescaled = SeriesSet::new(format!("{} (rescaled)", fine.label));
    let mut factors = Vec::new();

    for series in &fine.series {
        if chunks.is_empty() {
            rescaled.insert(series.clone());
            continue;
        }

        let coarse_series = coarse.get(&series.keyword);
        let mut samples: Vec<Sample> = Vec::with_capacity(series.len());

        for chunk in &chunks {
            let coarse_mean = coarse_series.and_then(|c| c.numeric_mean_within(chunk));
            let fine_mean = series.numeric_mean_within(chunk);
            let factor = chunk_factor(&series.keyword, *chunk, coarse_mean, fine_mean);

            log_debug!(
                "'{}' {} -> {}: coarse mean {:?}, fine mean {:?}, factor {}{}",
                series.keyword,
                chunk.start.date_naive(),
                chunk.end.date_naive(),
                coarse_mean,
                fine_mean,
                factor.factor,
                if factor.fallback { " (no rescale)" } else { "" }
            );

            samples.extend(
                series
                    .within(chunk)
                    .map(|sample| Sample::new(sample.timestamp, sample.value.scaled(factor.factor))),
            );
            factors.push(factor);
        }

        rescaled.insert(TimeSeries::new(series.keyword.clone(), samples));
    }

    Ok(MeanRatioOutcome {
        series: rescaled,
        factors,
    })
}
