use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("{field} must be a finite number, got {value}")]
    NotFinite { field: &'static str, value: f64 },

    #[error("{field} must not be negative, got {value}")]
    Negative { field: &'static str, value: f64 },

    #[error("concavity must be positive, got {0}")]
    Concavity(f64),
}

/// How member boundaries are merged before simplification
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Smoothing {
    /// Expand, union, contract
    #[default]
    Close,
    /// Legacy/experimental: concave hull around the unbuffered boundaries.
    /// Ignores the buffer distance.
    ConcaveHull { concavity: f64 },
}

/// Parameters for one coverage computation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoverageConfig {
    /// Gap-closing distance in meters (0 disables smoothing)
    pub buffer_distance_m: f64,
    /// Simplification tolerance in meters (0 disables simplification)
    pub simplify_tolerance_m: f64,
    /// Guarantee simple, non-flipped rings when simplifying
    pub preserve_topology: bool,
    pub mode: Smoothing,
}

impl Default for CoverageConfig {
    fn default() -> Self {
        Self {
            buffer_distance_m: 1000.0,
            simplify_tolerance_m: 500.0,
            preserve_topology: true,
            mode: Smoothing::Close,
        }
    }
}

impl CoverageConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_distance("buffer_distance_m", self.buffer_distance_m)?;
        check_distance("simplify_tolerance_m", self.simplify_tolerance_m)?;
        if let Smoothing::ConcaveHull { concavity } = self.mode {
            if !(concavity.is_finite() && concavity > 0.0) {
                return Err(ConfigError::Concavity(concavity));
            }
        }
        Ok(())
    }
}

fn check_distance(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if !value.is_finite() {
        return Err(ConfigError::NotFinite { field, value });
    }
    if value < 0.0 {
        return Err(ConfigError::Negative { field, value });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = CoverageConfig::default();
        assert_eq!(config.buffer_distance_m, 1000.0);
        assert_eq!(config.simplify_tolerance_m, 500.0);
        assert!(config.preserve_topology);
        assert_eq!(config.mode, Smoothing::Close);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: CoverageConfig = toml::from_str("simplify_tolerance_m = 100.0").unwrap();
        assert_eq!(config.simplify_tolerance_m, 100.0);
        assert_eq!(config.buffer_distance_m, 1000.0);
        assert!(config.preserve_topology);
    }

    #[test]
    fn test_hull_mode_from_toml() {
        let config: CoverageConfig =
            toml::from_str("mode = { kind = \"concave_hull\", concavity = 2.0 }").unwrap();
        assert_eq!(config.mode, Smoothing::ConcaveHull { concavity: 2.0 });
    }

    #[test]
    fn test_zero_is_legal() {
        let config = CoverageConfig {
            buffer_distance_m: 0.0,
            simplify_tolerance_m: 0.0,
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_rejects_bad_values() {
        let config = CoverageConfig {
            buffer_distance_m: -1.0,
            ..Default::default()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::Negative {
                field: "buffer_distance_m",
                value: -1.0
            })
        );

        let config = CoverageConfig {
            simplify_tolerance_m: f64::INFINITY,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::NotFinite { .. })
        ));

        let config = CoverageConfig {
            mode: Smoothing::ConcaveHull { concavity: 0.0 },
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::Concavity(0.0)));
    }
}
