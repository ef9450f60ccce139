use fractic_server_error::ServerError;

use crate::{
    entities::Block,
    errors::{LedgerIntegrityViolation, LedgerSerializationFailed, ReadError, WriteError},
};

/// JSON file holding the full chain, genesis block first.
pub(crate) struct LedgerSnapshotDatasource;

impl LedgerSnapshotDatasource {
    pub(crate) fn new() -> Self {
        Self
    }

    pub(crate) fn to_string(&self, chain: &[Block]) -> Result<String, ServerError> {
        serde_json::to_string_pretty(chain)
            .map_err(|e| LedgerSerializationFailed::with_debug("snapshot", &e))
    }

    pub(crate) fn from_string(&self, s: &str) -> Result<Vec<Block>, ServerError> {
        serde_json::from_str(s)
            .map_err(|e| LedgerIntegrityViolation::with_debug("snapshot is not a valid chain", &e))
    }

    pub(crate) async fn to_file<P>(&self, path: P, chain: &[Block]) -> Result<(), ServerError>
    where
        P: AsRef<std::path::Path> + Send,
    {
        let s = self.to_string(chain)?;
        tokio::fs::write(path, s)
            .await
            .map_err(|e| WriteError::with_debug(&e))
    }

    pub(crate) async fn from_file<P>(&self, path: P) -> Result<Vec<Block>, ServerError>
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
    use crate::entities::LedgerTransaction;

    #[test]
    fn test_snapshot_round_trip_preserves_blocks() {
        let chain = vec![Block {
            index: 0,
            timestamp: 1_700_000_000_000,
            transactions: vec![LedgerTransaction::Reward {
                from: None,
                to: "system".to_string(),
                amount: 100.0,
                timestamp: 1_700_000_000_000,
            }],
            previous_hash: "0".to_string(),
            nonce: 0,
            hash: "abc".to_string(),
        }];
        let datasource = LedgerSnapshotDatasource::new();
        let s = datasource.to_string(&chain).unwrap();
        assert!(s.contains("\"kind\": \"reward\""));
        assert_eq!(datasource.from_string(&s).unwrap(), chain);
    }

    #[test]
    fn test_garbage_snapshot_rejected() {
        assert!(LedgerSnapshotDatasource::new().from_string("{not json").is_err());
    }
}
