//! Loading-indicator timing.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

const fn default_dots_period_ms() -> u64 {
    500
}

const fn default_clock_period_ms() -> u64 {
    10
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct UiConfig {
    /// Tick period of the "Generating response..." dots.
    #[serde(default = "default_dots_period_ms")]
    pub dots_period_ms: u64,

    /// Tick period of the elapsed-time clock.
    #[serde(default = "default_clock_period_ms")]
    pub clock_period_ms: u64,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            dots_period_ms: default_dots_period_ms(),
            clock_period_ms: default_clock_period_ms(),
        }
    }
}

impl UiConfig {
    #[must_use]
    pub const fn dots_period(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.dots_period_ms)
    }

    #[must_use]
    pub const fn clock_period(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.clock_period_ms)
    }

    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        for (field, value) in [
            ("ui.dots_period_ms", self.dots_period_ms),
            ("ui.clock_period_ms", self.clock_period_ms),
        ] {
            if value == 0 {
                return Err(ConfigError::InvalidValue {
                    field: field.into(),
                    reason: "must be greater than zero".into(),
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_correct() {
        let config = UiConfig::default();
        assert_eq!(config.dots_period(), std::time::Duration::from_millis(500));
        assert_eq!(config.clock_period(), std::time::Duration::from_millis(10));
    }

    #[test]
    fn zero_period_is_rejected() {
        let config = UiConfig {
            clock_period_ms: 0,
            ..Default::default()
        };
        assert!(config.validate().unwrap_err().to_string().contains("ui.clock_period_ms"));
    }
}
