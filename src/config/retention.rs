//! Notification retention configuration

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;

#[derive(Debug, Clone, Deserialize)]
pub struct RetentionConfig {
    /// Days a notification lives before it expires
    #[serde(default = "default_notification_days")]
    pub notification_days: i64,

    /// Interval between expiry sweeps; 0 disables the sweeper
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_secs: u64,
}

impl RetentionConfig {
    pub fn sweep_interval(&self) -> Option<Duration> {
        (self.sweep_interval_secs > 0).then(|| Duration::from_secs(self.sweep_interval_secs))
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.notification_days < 1 {
            return Err(ValidationError::InvalidRetention);
        }
        Ok(())
    }
}

impl Default for RetentionConfig {
    fn default() -> Self {
        Self {
            notification_days: default_notification_days(),
            sweep_interval_secs: default_sweep_interval(),
        }
    }
}

fn default_notification_days() -> i64 {
    90
}

fn default_sweep_interval() -> u64 {
    3600
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = RetentionConfig::default();
        assert_eq!(config.notification_days, 90);
        assert_eq!(config.sweep_interval(), Some(Duration::from_secs(3600)));
    }

    #[test]
    fn zero_interval_disables_sweeper() {
        let config = RetentionConfig {
            sweep_interval_secs: 0,
            ..Default::default()
        };
        assert_eq!(config.sweep_interval(), None);
    }
}
