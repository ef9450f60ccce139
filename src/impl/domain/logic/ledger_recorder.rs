use chrono::Utc;
use fractic_server_error::ServerError;
use tokio::sync::Mutex;

use crate::entities::{
    Block, ConfirmedRecord, LedgerConfig, LedgerPayload, LedgerStats, StoreOutcome,
    StoredTransaction, Transaction,
};

use super::{hash_chain::Ledger, utils::sha256_hex};

const PAYLOAD_KIND: &str = "budget_transaction";

/// Records financial transactions in a hash-chained ledger.
///
/// The ledger is owned by the recorder rather than shared globally; each
/// caller holding the recorder sees the same chain.
pub(crate) struct LedgerRecorder {
    ledger: Mutex<Ledger>,
    config: LedgerConfig,
}

impl LedgerRecorder {
    pub(crate) fn new(config: LedgerConfig) -> Result<Self, ServerError> {
        Ok(Self {
            ledger: Mutex::new(Ledger::new(&config)?),
            config,
        })
    }

    pub(crate) fn payload_for(transaction: &Transaction) -> LedgerPayload {
        LedgerPayload {
            kind: PAYLOAD_KIND.to_string(),
            budget_id: transaction.budget_id.to_string(),
            transaction_id: transaction.id.to_string(),
            description: transaction.description.clone(),
            amount: transaction.amount,
            category: transaction.category.clone(),
            status: transaction.status.to_string(),
            timestamp: transaction.created_at.to_rfc3339(),
            receipt_hash: transaction.receipt.as_ref().map(|r| sha256_hex(&r.url)),
            transaction_hash: transaction.transaction_hash.clone(),
        }
    }

    /// Queues the transaction and immediately seals it into a block. Any
    /// failure is reported in the outcome; this never returns an error.
    pub(crate) async fn store_transaction(&self, transaction: &Transaction) -> StoreOutcome {
        match self.try_store(transaction).await {
            Ok(stored) => {
                tracing::debug!(
                    transaction_id = %transaction.id,
                    block_index = stored.block_index,
                    "recorded transaction in ledger"
                );
                StoreOutcome::Stored(stored)
            }
            Err(e) => {
                tracing::error!(
                    transaction_id = %transaction.id,
                    "error storing transaction in ledger: {:?}",
                    e
                );
                StoreOutcome::Failed {
                    error: format!("{:?}", e),
                }
            }
        }
    }

    async fn try_store(&self, transaction: &Transaction) -> Result<StoredTransaction, ServerError> {
        let mut ledger = self.ledger.lock().await;
        let transaction_id = ledger.create_transaction(Self::payload_for(transaction))?;
        let sealed = ledger
            .mine_pending_transactions(&self.config.reward_address)
            .map(|block| (block.hash.clone(), block.index));
        let (block_hash, block_index) = match sealed {
            Ok(sealed) => sealed,
            Err(e) => {
                // A failed record must not be sealed by a later block.
                ledger.discard_pending(&transaction_id);
                return Err(e);
            }
        };
        Ok(StoredTransaction {
            transaction_id,
            block_hash,
            block_index,
            confirmation_time: Utc::now(),
        })
    }

    pub(crate) async fn is_chain_valid(&self) -> bool {
        self.ledger.lock().await.is_chain_valid()
    }

    pub(crate) async fn get_transaction(&self, ledger_id: &str) -> Option<ConfirmedRecord> {
        self.ledger.lock().await.get_transaction(ledger_id)
    }

    pub(crate) async fn get_balance(&self, address: &str) -> f64 {
        self.ledger.lock().await.get_balance(address)
    }

    pub(crate) async fn stats(&self) -> LedgerStats {
        self.ledger.lock().await.stats()
    }

    pub(crate) async fn snapshot(&self) -> Vec<Block> {
        self.ledger.lock().await.chain().to_vec()
    }

    /// Replaces the current chain with a persisted one, after validating it.
    /// Records queued but not yet sealed are discarded.
    pub(crate) async fn restore(&self, chain: Vec<Block>) -> Result<(), ServerError> {
        let restored = Ledger::from_chain(chain, &self.config)?;
        *self.ledger.lock().await = restored;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{BudgetId, NewTransaction, Receipt, UserId};

    fn transaction(with_receipt: bool) -> Transaction {
        let mut spec =
            NewTransaction::new(BudgetId::generate(), "Ward 4 drainage", 4200.0, UserId::generate());
        if with_receipt {
            spec.receipt = Some(Receipt {
                url: "https://receipts.example.org/r/42.png".to_string(),
                public_id: None,
                filename: Some("42.png".to_string()),
                mimetype: Some("image/png".to_string()),
                size: Some(1024),
                uploaded_at: Utc::now(),
            });
        }
        Transaction::pending(spec).unwrap()
    }

    #[test]
    fn test_payload_hashes_receipt_url() {
        let tx = transaction(true);
        let payload = LedgerRecorder::payload_for(&tx);
        assert_eq!(payload.kind, "budget_transaction");
        assert_eq!(payload.status, "pending");
        assert_eq!(
            payload.receipt_hash.as_deref(),
            Some(sha256_hex("https://receipts.example.org/r/42.png").as_str())
        );
        assert!(LedgerRecorder::payload_for(&transaction(false))
            .receipt_hash
            .is_none());
    }

    #[tokio::test]
    async fn test_store_transaction_mines_block() {
        let recorder = LedgerRecorder::new(LedgerConfig::default()).unwrap();
        let tx = transaction(true);

        let StoreOutcome::Stored(stored) = recorder.store_transaction(&tx).await else {
            panic!("expected ledger write to succeed");
        };
        assert!(!stored.block_hash.is_empty());
        assert!(stored.block_hash.starts_with("00"));
        assert_eq!(stored.block_index, 1);

        let confirmed = recorder.get_transaction(&stored.transaction_id).await.unwrap();
        assert_eq!(confirmed.record.data.transaction_id, tx.id.to_string());
        assert!(recorder.is_chain_valid().await);
        assert_eq!(recorder.get_balance("system").await, 100.0);
    }

    #[tokio::test]
    async fn test_restore_round_trips_snapshot() {
        let recorder = LedgerRecorder::new(LedgerConfig::default()).unwrap();
        recorder.store_transaction(&transaction(false)).await;
        recorder.store_transaction(&transaction(false)).await;
        let chain = recorder.snapshot().await;

        let other = LedgerRecorder::new(LedgerConfig::default()).unwrap();
        other.restore(chain.clone()).await.unwrap();
        assert_eq!(other.snapshot().await, chain);
        assert_eq!(other.stats().await.total_blocks, 3);
    }
}
