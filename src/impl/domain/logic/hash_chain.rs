use fractic_server_error::{CriticalError, ServerError};

use crate::{
    entities::{
        Block, ConfirmedRecord, LedgerConfig, LedgerPayload, LedgerRecord, LedgerStats,
        LedgerTransaction,
    },
    errors::{InvalidDifficulty, LedgerIntegrityViolation, LedgerSerializationFailed},
};

use super::utils::{now_millis, sha256_hex};

/// Length of a SHA-256 digest in hex digits.
const MAX_DIFFICULTY: usize = 64;
const SIGNATURE_LEN: usize = 16;

/// Append-only hash chain of ledger records.
///
/// Appending (`create_transaction`) only queues the record. Sealing
/// (`mine_pending_transactions`) links the queued records into a new block,
/// optionally searching for a nonce so that the block hash satisfies the
/// configured difficulty.
pub(crate) struct Ledger {
    chain: Vec<Block>,
    pending: Vec<LedgerTransaction>,
    difficulty: usize,
    mining_reward: f64,
}

impl Ledger {
    pub(crate) fn new(config: &LedgerConfig) -> Result<Self, ServerError> {
        Self::validate_difficulty(config.difficulty)?;
        let timestamp = now_millis();
        let genesis = Block {
            index: 0,
            timestamp,
            transactions: vec![],
            previous_hash: "0".to_string(),
            nonce: 0,
            hash: Self::calculate_hash(0, timestamp, &[], "0", 0)?,
        };
        Ok(Self {
            chain: vec![genesis],
            pending: vec![],
            difficulty: config.difficulty,
            mining_reward: config.mining_reward,
        })
    }

    /// Restores a previously persisted chain. The chain must be non-empty and
    /// pass the integrity check.
    pub(crate) fn from_chain(chain: Vec<Block>, config: &LedgerConfig) -> Result<Self, ServerError> {
        Self::validate_difficulty(config.difficulty)?;
        if chain.is_empty() {
            return Err(LedgerIntegrityViolation::new("chain has no genesis block"));
        }
        let ledger = Self {
            chain,
            pending: vec![],
            difficulty: config.difficulty,
            mining_reward: config.mining_reward,
        };
        if !ledger.is_chain_valid() {
            return Err(LedgerIntegrityViolation::new(
                "stored hashes do not match block contents",
            ));
        }
        let target = "0".repeat(ledger.difficulty);
        if let Some(block) = ledger.chain[1..]
            .iter()
            .find(|b| !b.hash.starts_with(&target))
        {
            return Err(LedgerIntegrityViolation::new(&format!(
                "block {} does not meet difficulty {}",
                block.index, ledger.difficulty
            )));
        }
        Ok(ledger)
    }

    fn validate_difficulty(difficulty: usize) -> Result<(), ServerError> {
        if difficulty > MAX_DIFFICULTY {
            return Err(InvalidDifficulty::new(difficulty));
        }
        Ok(())
    }

    pub(crate) fn calculate_hash(
        index: u64,
        timestamp: i64,
        transactions: &[LedgerTransaction],
        previous_hash: &str,
        nonce: u64,
    ) -> Result<String, ServerError> {
        let transactions_json = serde_json::to_string(transactions)
            .map_err(|e| LedgerSerializationFailed::with_debug("block transactions", &e))?;
        Ok(sha256_hex(format!(
            "{}{}{}{}{}",
            index, timestamp, transactions_json, previous_hash, nonce
        )))
    }

    pub(crate) fn chain(&self) -> &[Block] {
        &self.chain
    }

    pub(crate) fn latest_block(&self) -> &Block {
        // The chain always holds at least the genesis block.
        &self.chain[self.chain.len() - 1]
    }

    pub(crate) fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Drops a queued record that will not be sealed.
    pub(crate) fn discard_pending(&mut self, id: &str) {
        self.pending
            .retain(|tx| tx.as_record().map_or(true, |record| record.id != id));
    }

    /// Queues a record and returns its id.
    pub(crate) fn create_transaction(&mut self, data: LedgerPayload) -> Result<String, ServerError> {
        let timestamp = now_millis();
        let signature = Self::sign(&data, timestamp)?;
        let record = LedgerRecord {
            id: uuid::Uuid::new_v4().to_string(),
            timestamp,
            data,
            signature,
        };
        let id = record.id.clone();
        self.pending.push(LedgerTransaction::Record(record));
        Ok(id)
    }

    fn sign(data: &LedgerPayload, timestamp: i64) -> Result<String, ServerError> {
        let json = serde_json::to_string(data)
            .map_err(|e| LedgerSerializationFailed::with_debug("record payload", &e))?;
        let mut digest = sha256_hex(format!("{}{}", json, timestamp));
        digest.truncate(SIGNATURE_LEN);
        Ok(digest)
    }

    /// Seals all queued records (plus a reward entry) into a new block.
    pub(crate) fn mine_pending_transactions(
        &mut self,
        reward_address: &str,
    ) -> Result<&Block, ServerError> {
        let timestamp = now_millis();
        let mut transactions = self.pending.clone();
        transactions.push(LedgerTransaction::Reward {
            from: None,
            to: reward_address.to_string(),
            amount: self.mining_reward,
            timestamp,
        });

        let previous = self.latest_block();
        let mut block = Block {
            index: previous.index + 1,
            timestamp,
            transactions,
            previous_hash: previous.hash.clone(),
            nonce: 0,
            hash: String::new(),
        };
        self.mine_block(&mut block)?;

        self.chain.push(block);
        self.pending.clear();
        Ok(self.latest_block())
    }

    /// Linear nonce search from 0 until the hash has `difficulty` leading
    /// zeros.
    fn mine_block(&self, block: &mut Block) -> Result<(), ServerError> {
        let target = "0".repeat(self.difficulty);
        loop {
            let hash = Self::calculate_hash(
                block.index,
                block.timestamp,
                &block.transactions,
                &block.previous_hash,
                block.nonce,
            )?;
            if hash.starts_with(&target) {
                block.hash = hash;
                return Ok(());
            }
            block.nonce = block.nonce.checked_add(1).ok_or_else(|| {
                CriticalError::with_debug("nonce space exhausted while mining", &block.index)
            })?;
        }
    }

    /// Genesis block intact, indexes sequential, every block linked to its
    /// predecessor and its stored hash equal to the recomputed one.
    pub(crate) fn is_chain_valid(&self) -> bool {
        let Some(genesis) = self.chain.first() else {
            return false;
        };
        if genesis.index != 0 || genesis.previous_hash != "0" || !Self::hash_matches(genesis) {
            return false;
        }
        self.chain.windows(2).all(|pair| {
            let (previous, current) = (&pair[0], &pair[1]);
            current.index == previous.index + 1
                && current.previous_hash == previous.hash
                && Self::hash_matches(current)
        })
    }

    fn hash_matches(block: &Block) -> bool {
        match Self::calculate_hash(
            block.index,
            block.timestamp,
            &block.transactions,
            &block.previous_hash,
            block.nonce,
        ) {
            Ok(recomputed) => recomputed == block.hash,
            Err(_) => false,
        }
    }

    /// Net reward credits for `address` across the chain.
    pub(crate) fn get_balance(&self, address: &str) -> f64 {
        self.chain
            .iter()
            .flat_map(|block| block.transactions.iter())
            .map(|tx| match tx {
                LedgerTransaction::Reward {
                    from, to, amount, ..
                } => {
                    let credit = if to == address { *amount } else { 0.0 };
                    let debit = if from.as_deref() == Some(address) {
                        *amount
                    } else {
                        0.0
                    };
                    credit - debit
                }
                LedgerTransaction::Record(_) => 0.0,
            })
            .sum()
    }

    pub(crate) fn get_transaction(&self, id: &str) -> Option<ConfirmedRecord> {
        self.chain.iter().find_map(|block| {
            block
                .transactions
                .iter()
                .filter_map(LedgerTransaction::as_record)
                .find(|record| record.id == id)
                .map(|record| ConfirmedRecord {
                    record: record.clone(),
                    block_hash: block.hash.clone(),
                    block_index: block.index,
                })
        })
    }

    pub(crate) fn stats(&self) -> LedgerStats {
        LedgerStats {
            total_blocks: self.chain.len(),
            total_transactions: self.chain.iter().map(|b| b.transactions.len()).sum(),
            pending_transactions: self.pending.len(),
            is_chain_valid: self.is_chain_valid(),
            last_block_hash: self.latest_block().hash.clone(),
        }
    }
}
