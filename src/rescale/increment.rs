use crate::models::{Sample, ScalingAudit, SeriesSet, TimeSeries};
use crate::log_info;

const ENABLE_LOGS: bool = true;

/// Multiply each keyword of an increment by its audited historical/new factor.
///
/// Keywords without an audit row, or whose factor is infinite, pass through.
pub fn apply_audited_scaling(increment: &SeriesSet, audits: &[ScalingAudit]) -> SeriesSet {
    let mut scaled = SeriesSet::new(format!("{} (audit-scaled)", increment.label));

    for series in &increment.series {
        let factor = audits
            .iter()
            .find(|audit| audit.keyword == series.keyword)
            .and_then(|audit| audit.scaling.finite());

        match factor {
            Some(factor) => {
                log_info!("Applying factor {:.3} to '{}'", factor, series.keyword);
                let samples = series
                    .samples
                    .iter()
                    .map(|sample| Sample::new(sample.timestamp, sample.value.scaled(factor)))
                    .collect();
                scaled.insert(TimeSeries::new(series.keyword.clone(), samples));
            }
            None => scaled.insert(series.clone()),
        }
    }

    scaled
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{SampleValue, ScalingEstimate};
    use chrono::{TimeZone, Utc};

    fn audit(keyword: &str, scaling: ScalingEstimate) -> ScalingAudit {
        ScalingAudit {
            keyword: keyword.into(),
            historical_mean: 0.0,
            new_mean: 0.0,
            scaling,
            overlap: 1,
            median_ratio: None,
        }
    }

    #[test]
    fn scales_only_finite_audited_keywords() {
        let at = Utc.with_ymd_and_hms(2025, 7, 1, 0, 0, 0).unwrap();
        let increment = SeriesSet::with_series(
            "inc",
            vec![
                TimeSeries::new("a", vec![Sample::numeric(at, 4.0)]),
                TimeSeries::new("b", vec![Sample::numeric(at, 4.0)]),
                TimeSeries::new("c", vec![Sample::numeric(at, 4.0)]),
            ],
        );
        let audits = vec![
            audit("a", ScalingEstimate::Finite(0.5)),
            audit("b", ScalingEstimate::Infinite),
        ];

        let scaled = apply_audited_scaling(&increment, &audits);

        assert_eq!(scaled.get("a").unwrap().samples[0].value, SampleValue::Numeric(2.0));
        assert_eq!(scaled.get("b").unwrap().samples[0].value, SampleValue::Numeric(4.0));
        assert_eq!(scaled.get("c").unwrap().samples[0].value, SampleValue::Numeric(4.0));
    }
}
