//! Service-level settings shared by every request.

use anyhow::bail;

/// Settings that are not part of any request payload.
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceConfig {
    /// Training epochs for `/gcn/importance` (default: 100).
    pub importance_epochs: usize,
    /// Correlation threshold for `/gcn/compare` graphs built from returns (default: 0.3).
    pub compare_correlation_threshold: f64,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            importance_epochs: 100,
            compare_correlation_threshold: 0.3,
        }
    }
}

impl ServiceConfig {
    pub fn with_importance_epochs(mut self, epochs: usize) -> Self {
        self.importance_epochs = epochs;
        self
    }

    pub fn with_compare_correlation_threshold(mut self, threshold: f64) -> Self {
        self.compare_correlation_threshold = threshold;
        self
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.importance_epochs > crate::validate::MAX_EPOCHS {
            bail!(
                "importance epochs must be at most {}, got {}",
                crate::validate::MAX_EPOCHS,
                self.importance_epochs
            );
        }
        if !(0.0..=1.0).contains(&self.compare_correlation_threshold) {
            bail!(
                "compare correlation threshold must be in [0, 1], got {}",
                self.compare_correlation_threshold
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert!(ServiceConfig::default().validate().is_ok());
    }

    #[test]
    fn test_rejects_bad_threshold() {
        let cfg = ServiceConfig::default().with_compare_correlation_threshold(1.5);
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_rejects_excessive_epochs() {
        let cfg = ServiceConfig::default().with_importance_epochs(10_000);
        assert!(cfg.validate().is_err());
    }
}
