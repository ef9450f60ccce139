use fractic_server_error::ServerError;
use ron::from_str;

use crate::{
    data::models::config_model::ConfigModel,
    entities::Config,
    errors::{InvalidRon, ReadError},
};

pub(crate) struct ConfigRonDatasource;

impl ConfigRonDatasource {
    pub(crate) fn new() -> Self {
        Self
    }

    pub(crate) fn from_string(&self, s: &str) -> Result<Config, ServerError> {
        let model: ConfigModel = from_str(s).map_err(|e| InvalidRon::with_debug("Config", &e))?;
        Ok(model.into())
    }

    pub(crate) async fn from_file<P>(&self, path: P) -> Result<Config, ServerError>
    where
        P: AsRef<std::path::Path> + Send,
    {
        let s = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| ReadError::with_debug(&e))?;
        self.from_string(&s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{DetectionConfig, LedgerConfig};

    #[test]
    fn test_partial_config_keeps_defaults() {
        let config = ConfigRonDatasource::new()
            .from_string(
                "(detection: (overrun_threshold: 0.75, stop_at_first_duplicate: true), ledger: (difficulty: 0))",
            )
            .unwrap();
        assert_eq!(config.detection.overrun_threshold, 0.75);
        assert!(config.detection.stop_at_first_duplicate);
        assert_eq!(
            config.detection.duplicate_window,
            DetectionConfig::default().duplicate_window
        );
        assert_eq!(config.ledger.difficulty, 0);
        assert_eq!(config.ledger.reward_address, LedgerConfig::default().reward_address);
    }

    #[test]
    fn test_empty_config_is_default() {
        let config = ConfigRonDatasource::new().from_string("()").unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_unknown_field_rejected() {
        assert!(ConfigRonDatasource::new()
            .from_string("(detection: (overrun: 0.5))")
            .is_err());
    }
}
