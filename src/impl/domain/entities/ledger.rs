use chrono::{DateTime, Utc};
use serde_derive::{Deserialize, Serialize};

/// Financial transaction as it is written to the ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerPayload {
    #[serde(rename = "type")]
    pub kind: String,
    pub budget_id: String,
    pub transaction_id: String,
    pub description: String,
    pub amount: f64,
    pub category: Option<String>,
    pub status: String,
    /// RFC 3339 creation time of the financial transaction.
    pub timestamp: String,
    pub receipt_hash: Option<String>,
    pub transaction_hash: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerRecord {
    pub id: String,
    /// Milliseconds since the epoch.
    pub timestamp: i64,
    pub data: LedgerPayload,
    /// Truncated content fingerprint. Not an asymmetric signature.
    pub signature: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LedgerTransaction {
    Record(LedgerRecord),
    Reward {
        from: Option<String>,
        to: String,
        amount: f64,
        timestamp: i64,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    pub index: u64,
    pub timestamp: i64,
    pub transactions: Vec<LedgerTransaction>,
    pub previous_hash: String,
    pub nonce: u64,
    pub hash: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StoredTransaction {
    pub transaction_id: String,
    pub block_hash: String,
    pub block_index: u64,
    pub confirmation_time: DateTime<Utc>,
}

/// Result of recording a financial transaction. Recording never fails loudly;
/// callers decide whether a failure matters to them.
#[derive(Debug, Clone, PartialEq)]
pub enum StoreOutcome {
    Stored(StoredTransaction),
    Failed { error: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConfirmedRecord {
    pub record: LedgerRecord,
    pub block_hash: String,
    pub block_index: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LedgerStats {
    pub total_blocks: usize,
    pub total_transactions: usize,
    pub pending_transactions: usize,
    pub is_chain_valid: bool,
    pub last_block_hash: String,
}

// --

impl LedgerTransaction {
    pub fn as_record(&self) -> Option<&LedgerRecord> {
        match self {
            LedgerTransaction::Record(r) => Some(r),
            LedgerTransaction::Reward { .. } => None,
        }
    }
}

impl StoreOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, StoreOutcome::Stored(_))
    }
}
