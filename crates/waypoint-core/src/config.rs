use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::limits::StaticLimitEvaluator;

const DEFAULT_MOVEMENT_DELTA: f64 = 1.0;
const DEFAULT_CONFIGURABLE_LIMIT: u32 = 64;
const DEFAULT_SELECTABLE_LIMIT: u32 = 1;
/// Twenty server ticks at 20 TPS.
const DEFAULT_JOIN_SETTLE_MS: u64 = 1000;
const DEFAULT_LIST_PAGE_SIZE: u32 = 10;

/// Raw configuration as written in RON. Every key is optional; bad values
/// are replaced during validation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RawWaypointConfig {
    pub movement_delta: Option<f64>,
    pub configurable_limit: Option<i64>,
    pub selectable_limit: Option<i64>,
    pub join_settle_ms: Option<i64>,
    pub list_page_size: Option<i64>,
}

/// Validated engine configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct WaypointConfig {
    /// Squared movement distance below which position updates are skipped.
    /// Zero disables throttling.
    pub movement_delta_sq: f64,
    pub configurable_limit: u32,
    pub selectable_limit: u32,
    /// Wait between an actor joining and its waypoints being rendered.
    pub join_settle: Duration,
    pub list_page_size: u32,
}

impl Default for WaypointConfig {
    fn default() -> Self {
        Self {
            movement_delta_sq: DEFAULT_MOVEMENT_DELTA * DEFAULT_MOVEMENT_DELTA,
            configurable_limit: DEFAULT_CONFIGURABLE_LIMIT,
            selectable_limit: DEFAULT_SELECTABLE_LIMIT,
            join_settle: Duration::from_millis(DEFAULT_JOIN_SETTLE_MS),
            list_page_size: DEFAULT_LIST_PAGE_SIZE,
        }
    }
}

impl WaypointConfig {
    /// Parse and validate a RON config string.
    pub fn from_ron_str(ron_str: &str) -> Result<Self, ConfigError> {
        let options = ron::Options::default();
        let raw: RawWaypointConfig = options
            .from_str(ron_str)
            .map_err(|e| ConfigError::ParseError(e.to_string()))?;
        Ok(Self::from_raw(&raw))
    }

    /// Validate raw values, falling back to defaults with a warning.
    pub fn from_raw(raw: &RawWaypointConfig) -> Self {
        let movement_delta = match raw.movement_delta {
            Some(v) if v.is_finite() && v >= 0.0 => v,
            other => {
                if other.is_some() {
                    log::warn!(
                        "'movement_delta' must be a non-negative number, falling back to {}",
                        DEFAULT_MOVEMENT_DELTA
                    );
                }
                DEFAULT_MOVEMENT_DELTA
            }
        };

        Self {
            movement_delta_sq: movement_delta * movement_delta,
            configurable_limit: checked_u32(
                "configurable_limit",
                raw.configurable_limit,
                0,
                DEFAULT_CONFIGURABLE_LIMIT,
            ),
            selectable_limit: checked_u32(
                "selectable_limit",
                raw.selectable_limit,
                0,
                DEFAULT_SELECTABLE_LIMIT,
            ),
            join_settle: Duration::from_millis(checked_u32(
                "join_settle_ms",
                raw.join_settle_ms,
                0,
                DEFAULT_JOIN_SETTLE_MS as u32,
            ) as u64),
            list_page_size: checked_u32(
                "list_page_size",
                raw.list_page_size,
                1,
                DEFAULT_LIST_PAGE_SIZE,
            ),
        }
    }

    /// The limit policy implied by this configuration.
    pub fn static_limits(&self) -> StaticLimitEvaluator {
        StaticLimitEvaluator::new(self.configurable_limit, self.selectable_limit)
    }
}

fn checked_u32(key: &str, value: Option<i64>, min: i64, default: u32) -> u32 {
    match value {
        None => default,
        Some(v) if v >= min && v <= u32::MAX as i64 => v as u32,
        Some(_) => {
            log::warn!("'{key}' must be an integer >= {min}, falling back to {default}");
            default
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = WaypointConfig::from_ron_str("()").expect("parses");
        assert_eq!(config, WaypointConfig::default());
    }

    #[test]
    fn test_values_are_read() {
        let config = WaypointConfig::from_ron_str(
            "(movement_delta: Some(2.0), configurable_limit: Some(3), selectable_limit: Some(2), join_settle_ms: Some(0))",
        )
        .expect("parses");
        assert_eq!(config.movement_delta_sq, 4.0);
        assert_eq!(config.configurable_limit, 3);
        assert_eq!(config.selectable_limit, 2);
        assert_eq!(config.join_settle, Duration::ZERO);
        assert_eq!(config.list_page_size, 10);
    }

    #[test]
    fn test_invalid_values_fall_back() {
        let raw = RawWaypointConfig {
            movement_delta: Some(-1.0),
            configurable_limit: Some(-5),
            selectable_limit: Some(4),
            join_settle_ms: None,
            list_page_size: Some(0),
        };
        let config = WaypointConfig::from_raw(&raw);
        assert_eq!(config.movement_delta_sq, 1.0);
        assert_eq!(config.configurable_limit, 64);
        assert_eq!(config.selectable_limit, 4);
        assert_eq!(config.list_page_size, 10);
    }

    #[test]
    fn test_malformed_ron_is_an_error() {
        assert!(WaypointConfig::from_ron_str("(movement_delta: \"far\")").is_err());
    }

    #[test]
    fn test_static_limits() {
        let limits = WaypointConfig::default().static_limits();
        assert_eq!(limits, StaticLimitEvaluator::new(64, 1));
    }
}
