//! Configuration for the panel validation pipeline

use serde::{Deserialize, Serialize};

use crate::core::{HedgeError, HedgeResult, MoneynessBands};

/// Configuration for panel validation and Greek derivation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PanelConfig {
    /// Calendar days before expiration over which the observation history must
    /// match the trading calendar exactly
    /// Default: 90
    pub validation_window_days: i64,

    /// Calendar days before expiration kept in the emitted panel
    /// Default: 45 (delta hedging), 90 (delta-vega hedging)
    pub tenor_window_days: i64,

    /// Whether vega is derived for every row
    /// Default: false
    pub compute_vega: bool,

    /// Inception delta bands for moneyness labels
    #[serde(default)]
    pub bands: MoneynessBands,
}

impl Default for PanelConfig {
    fn default() -> Self {
        Self::delta_hedge()
    }
}

impl PanelConfig {
    /// 90-day validation, 45-day tenor, delta only
    pub fn delta_hedge() -> Self {
        Self {
            validation_window_days: 90,
            tenor_window_days: 45,
            compute_vega: false,
            bands: MoneynessBands::default(),
        }
    }

    /// 90-day validation and tenor, delta and vega
    pub fn delta_vega() -> Self {
        Self {
            tenor_window_days: 90,
            compute_vega: true,
            ..Self::delta_hedge()
        }
    }

    /// Fail fast on configurations that cannot produce meaningful panels
    pub fn validate(&self) -> HedgeResult<()> {
        if self.validation_window_days <= 0 {
            return Err(HedgeError::config("validation window must be positive"));
        }
        if self.tenor_window_days <= 0 || self.tenor_window_days > self.validation_window_days {
            return Err(HedgeError::config(format!(
                "tenor window {} must lie in 1..={}",
                self.tenor_window_days, self.validation_window_days
            )));
        }
        if !self.bands.is_ordered() {
            return Err(HedgeError::config(format!(
                "moneyness bands are not ordered: {:?}",
                self.bands
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets_are_valid() {
        assert!(PanelConfig::delta_hedge().validate().is_ok());
        assert!(PanelConfig::delta_vega().validate().is_ok());
        assert_eq!(PanelConfig::delta_vega().tenor_window_days, 90);
        assert!(PanelConfig::delta_vega().compute_vega);
    }

    #[test]
    fn test_tenor_longer_than_validation_is_rejected() {
        let config = PanelConfig {
            tenor_window_days: 120,
            ..PanelConfig::delta_hedge()
        };
        assert!(matches!(config.validate(), Err(HedgeError::Config(_))));
    }

    #[test]
    fn test_overlapping_bands_are_rejected() {
        let config = PanelConfig {
            bands: MoneynessBands {
                otm_max: 0.5,
                ..Default::default()
            },
            ..PanelConfig::delta_hedge()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_bands_default_when_absent_from_json() {
        let json = r#"{"validation_window_days":90,"tenor_window_days":30,"compute_vega":false}"#;
        let config: PanelConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.bands, MoneynessBands::default());
        assert_eq!(config.tenor_window_days, 30);
    }
}
