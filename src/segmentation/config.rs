use serde::{Deserialize, Serialize};

use crate::error::{ReconcileError, ReconcileResult};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub enum RescaleMethod {
    /// Per-chunk coarse mean over fine mean.
    #[default]
    MeanRatio,
    /// Every keyword as a percentage of a fixed reference keyword.
    ReferenceRatio,
}

/// Configuration for chunking and rescaling.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct ReconcileConfig {
    /// Width of each comparison/rescaling window in calendar months.
    pub chunk_width_months: u32,

    pub rescale_method: RescaleMethod,

    /// Keyword held unscaled under `RescaleMethod::ReferenceRatio`.
    pub reference_keyword: Option<String>,
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        Self {
            chunk_width_months: 6,
            rescale_method: RescaleMethod::MeanRatio,
            reference_keyword: None,
        }
    }
}

impl ReconcileConfig {
    pub fn validate(&self) -> ReconcileResult<()> {
        if self.chunk_width_months == 0 {
            return Err(ReconcileError::InvalidChunkWidth(self.chunk_width_months));
        }
        if self.rescale_method == RescaleMethod::ReferenceRatio
            && self.reference_keyword.as_deref().map_or(true, str::is_empty)
        {
            return Err(ReconcileError::MissingReferenceKeyword);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_six_month_mean_ratio() {
        let config = ReconcileConfig::default();
        assert_eq!(config.chunk_width_months, 6);
        assert_eq!(config.rescale_method, RescaleMethod::MeanRatio);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn reference_ratio_requires_keyword() {
        let config = ReconcileConfig {
            rescale_method: RescaleMethod::ReferenceRatio,
            ..ReconcileConfig::default()
        };
        assert_eq!(config.validate(), Err(ReconcileError::MissingReferenceKeyword));
    }

    #[test]
    fn zero_width_is_rejected() {
        let config = ReconcileConfig {
            chunk_width_months: 0,
            ..ReconcileConfig::default()
        };
        assert_eq!(config.validate(), Err(ReconcileError::InvalidChunkWidth(0)));
    }

    #[test]
    fn partial_json_falls_back_to_defaults() {
        let config: ReconcileConfig =
            serde_json::from_str(r#"{"rescaleMethod":"referenceRatio","referenceKeyword":"a"}"#)
                .unwrap();
        assert_eq!(config.chunk_width_months, 6);
        assert_eq!(config.reference_keyword.as_deref(), Some("a"));
    }
}
