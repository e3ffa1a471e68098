use crate::blockchain::core::validation::{validate_chain, ValidationReport};
use crate::error::ChainError;
use crate::miner::{mine_block, MAX_DIFFICULTY};
use crate::transaction::{canonical_json, Transaction};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{debug, info};

/// `previous_hash` sentinel carried by the genesis block.
pub const GENESIS_PREVIOUS_HASH: &str = "0";
/// Fixed genesis timestamp (2023-01-01T00:00:00Z), so every ledger shares one root.
pub const GENESIS_TIMESTAMP: u64 = 1672531200000;
pub const GENESIS_PAYLOAD: &str = "Genesis Block";

/// One sealed unit of chain history.
///
/// Field order matches the wire tuple `(index, timestamp, transactions,
/// previous_hash, nonce, hash)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HashBlock {
    pub index: u64,
    /// Milliseconds since the Unix epoch.
    pub timestamp: u64,
    pub transactions: Vec<Transaction>,
    pub previous_hash: String,
    pub nonce: u64,
    /// Lowercase hex SHA-256 of the other five fields.
    pub hash: String,
}

impl HashBlock {
    pub fn new(
        index: u64,
        timestamp: u64,
        transactions: Vec<Transaction>,
        previous_hash: String,
    ) -> Self {
        let mut block = HashBlock {
            index,
            timestamp,
            transactions,
            previous_hash,
            nonce: 0,
            hash: String::new(),
        };
        block.hash = block.compute_hash();
        block
    }

    /// Re-derives the digest from the block's current contents.
    ///
    /// Variable-length fields are length-prefixed so no two field tuples share
    /// a pre-image.
    pub fn compute_hash(&self) -> String {
        let serialized = canonical_json(&self.transactions);

        let mut hasher = Sha256::new();
        hasher.update(self.index.to_le_bytes());
        hasher.update((self.previous_hash.len() as u64).to_le_bytes());
        hasher.update(self.previous_hash.as_bytes());
        hasher.update(self.timestamp.to_le_bytes());
        hasher.update((serialized.len() as u64).to_le_bytes());
        hasher.update(serialized.as_bytes());
        hasher.update(self.nonce.to_le_bytes());
        hex::encode(hasher.finalize())
    }

    pub fn is_genesis(&self) -> bool {
        self.index == 0
    }

    fn genesis() -> Self {
        HashBlock::new(
            0,
            GENESIS_TIMESTAMP,
            vec![Transaction::new(serde_json::Value::String(
                GENESIS_PAYLOAD.to_string(),
            ))],
            GENESIS_PREVIOUS_HASH.to_string(),
        )
    }
}

/// The ordered chain plus its staging area for unsealed transactions.
///
/// A `Ledger` is a single-writer structure. Anything sharing one across threads
/// must hold a lock around every mutating call, mining included.
#[derive(Debug, Clone, Serialize)]
pub struct Ledger {
    chain: Vec<HashBlock>,
    difficulty: u32,
    pending_transactions: Vec<Transaction>,
}

impl Ledger {
    /// Create a ledger holding only the genesis block.
    pub fn new(difficulty: u32) -> Result<Self, ChainError> {
        check_difficulty(difficulty)?;

        let genesis = HashBlock::genesis();
        debug!(hash = %genesis.hash, "created genesis block");

        Ok(Ledger {
            chain: vec![genesis],
            difficulty,
            pending_transactions: Vec::new(),
        })
    }

    /// Rebuild a ledger from an imported chain, refusing anything that does not
    /// validate.
    pub fn from_chain(chain: Vec<HashBlock>, difficulty: u32) -> Result<Self, ChainError> {
        check_difficulty(difficulty)?;
        if chain.is_empty() {
            return Err(ChainError::EmptyChain);
        }

        let report = validate_chain(&chain);
        if !report.is_valid() {
            return Err(ChainError::InvalidChain(report.to_string()));
        }

        Ok(Ledger {
            chain,
            difficulty,
            pending_transactions: Vec::new(),
        })
    }

    pub fn chain(&self) -> &[HashBlock] {
        &self.chain
    }

    pub fn len(&self) -> usize {
        self.chain.len()
    }

    /// Always false: the genesis block is created with the ledger.
    pub fn is_empty(&self) -> bool {
        self.chain.is_empty()
    }

    pub fn difficulty(&self) -> u32 {
        self.difficulty
    }

    pub fn pending_transactions(&self) -> &[Transaction] {
        &self.pending_transactions
    }

    pub fn block(&self, index: u64) -> Option<&HashBlock> {
        self.chain.get(usize::try_from(index).ok()?)
    }

    pub fn latest_block(&self) -> &HashBlock {
        match self.chain.last() {
            Some(block) => block,
            None => unreachable!("a ledger always holds its genesis block"),
        }
    }

    /// Stage `transaction` and seal it straight away.
    ///
    /// Blocks the caller for as long as mining takes.
    pub fn submit_transaction(&mut self, transaction: Transaction) -> HashBlock {
        self.pending_transactions.push(transaction);
        let batch = std::mem::take(&mut self.pending_transactions);
        self.seal(batch)
    }

    /// Mine everything currently pending into one block.
    ///
    /// Returns `None` when there is nothing to seal.
    pub fn seal_pending_block(&mut self) -> Option<HashBlock> {
        if self.pending_transactions.is_empty() {
            info!("No transactions to mine");
            return None;
        }
        let batch = std::mem::take(&mut self.pending_transactions);
        Some(self.seal(batch))
    }

    fn seal(&mut self, batch: Vec<Transaction>) -> HashBlock {
        let mut block = HashBlock::new(
            self.chain.len() as u64,
            u64::try_from(chrono::Utc::now().timestamp_millis()).unwrap_or(0),
            batch,
            self.latest_block().hash.clone(),
        );

        mine_block(&mut block, self.difficulty);
        self.chain.push(block.clone());

        info!(
            index = block.index,
            transactions = block.transactions.len(),
            "Block successfully mined and added to chain"
        );
        block
    }

    pub fn validate(&self) -> bool {
        self.validation_report().is_valid()
    }

    pub fn validation_report(&self) -> ValidationReport {
        validate_chain(&self.chain)
    }
}

fn check_difficulty(difficulty: u32) -> Result<(), ChainError> {
    if difficulty > MAX_DIFFICULTY {
        return Err(ChainError::InvalidDifficulty {
            requested: difficulty,
            max: MAX_DIFFICULTY,
        });
    }
    Ok(())
}
