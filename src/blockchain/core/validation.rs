use crate::blockchain::core::chain::{HashBlock, GENESIS_PREVIOUS_HASH};
use serde::Serialize;
use std::fmt;

/// A single integrity problem found while walking the chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Violation {
    /// Stored hash no longer matches the block contents.
    HashMismatch {
        index: u64,
        stored: String,
        computed: String,
    },
    /// `previous_hash` does not point at the preceding block.
    BrokenLink {
        index: u64,
        expected: String,
        found: String,
    },
    IndexOutOfSequence { position: usize, found: u64 },
    /// The root block does not carry the genesis `previous_hash` sentinel.
    InvalidGenesis { previous_hash: String },
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Violation::HashMismatch {
                index,
                stored,
                computed,
            } => write!(
                f,
                "block {} hash mismatch: stored {}, computed {}",
                index, stored, computed
            ),
            Violation::BrokenLink {
                index,
                expected,
                found,
            } => write!(
                f,
                "block {} previous_hash mismatch: expected {}, found {}",
                index, expected, found
            ),
            Violation::IndexOutOfSequence { position, found } => write!(
                f,
                "block at position {} carries index {}",
                position, found
            ),
            Violation::InvalidGenesis { previous_hash } => write!(
                f,
                "genesis previous_hash should be {:?}, found {:?}",
                GENESIS_PREVIOUS_HASH, previous_hash
            ),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    pub violations: Vec<Violation>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.violations.is_empty()
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.is_valid() {
            return write!(f, "chain is valid");
        }
        let messages: Vec<String> = self.violations.iter().map(|v| v.to_string()).collect();
        write!(f, "{}", messages.join("; "))
    }
}

/// Check the root, then walk the chain from the first block after genesis,
/// re-deriving every hash and link.
///
/// Every violation is collected rather than stopping at the first one.
pub fn validate_chain(chain: &[HashBlock]) -> ValidationReport {
    let mut report = ValidationReport::default();

    if let Some(root) = chain.first() {
        if !root.is_genesis() {
            report.violations.push(Violation::IndexOutOfSequence {
                position: 0,
                found: root.index,
            });
        }
        if root.previous_hash != GENESIS_PREVIOUS_HASH {
            report.violations.push(Violation::InvalidGenesis {
                previous_hash: root.previous_hash.clone(),
            });
        }
    }

    for (position, pair) in chain.windows(2).enumerate() {
        let (previous, current) = (&pair[0], &pair[1]);
        let position = position + 1;

        if current.index != position as u64 {
            report.violations.push(Violation::IndexOutOfSequence {
                position,
                found: current.index,
            });
        }

        let computed = current.compute_hash();
        if current.hash != computed {
            report.violations.push(Violation::HashMismatch {
                index: current.index,
                stored: current.hash.clone(),
                computed,
            });
        }

        if current.previous_hash != previous.hash {
            report.violations.push(Violation::BrokenLink {
                index: current.index,
                expected: previous.hash.clone(),
                found: current.previous_hash.clone(),
            });
        }
    }

    if !report.is_valid() {
        tracing::warn!(violations = report.violations.len(), "chain validation failed");
    }
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blockchain::Ledger;
    use crate::transaction::Transaction;
    use serde_json::json;

    fn sample_chain(blocks: usize) -> Vec<HashBlock> {
        let mut ledger = Ledger::new(1).unwrap();
        for i in 0..blocks {
            ledger.submit_transaction(Transaction::new(json!({ "seq": i })));
        }
        ledger.chain().to_vec()
    }

    #[test]
    fn test_genesis_only_is_valid() {
        let ledger = Ledger::new(3).unwrap();
        assert!(validate_chain(ledger.chain()).is_valid());
        assert!(validate_chain(&[]).is_valid());
    }

    #[test]
    fn test_reports_every_violation() {
        let mut chain = sample_chain(3);
        chain[1].timestamp += 5;
        chain[3].previous_hash = "deadbeef".to_string();

        let report = validate_chain(&chain);
        assert!(!report.is_valid());

        // Block 1 fails its own hash; block 2 still links to block 1's stored hash.
        assert!(report
            .violations
            .iter()
            .any(|v| matches!(v, Violation::HashMismatch { index: 1, .. })));
        assert!(report.violations.iter().any(|v| matches!(
            v,
            Violation::BrokenLink { index: 3, found, .. } if found == "deadbeef"
        )));
    }

    #[test]
    fn test_rehashed_block_still_breaks_next_link() {
        let mut chain = sample_chain(2);
        chain[1].transactions = vec![Transaction::new(json!("forged"))];
        chain[1].hash = chain[1].compute_hash();

        let report = validate_chain(&chain);
        assert_eq!(report.violations.len(), 1);
        assert!(matches!(
            report.violations[0],
            Violation::BrokenLink { index: 2, .. }
        ));
    }

    #[test]
    fn test_detects_index_gap() {
        let mut chain = sample_chain(2);
        chain.remove(1);

        let report = validate_chain(&chain);
        assert!(report
            .violations
            .contains(&Violation::IndexOutOfSequence { position: 1, found: 2 }));
    }

    #[test]
    fn test_detects_forged_root() {
        let root = HashBlock::new(7, 1, vec![Transaction::new(json!("root"))], "abc".to_string());

        let report = validate_chain(&[root]);
        assert_eq!(
            report.violations,
            vec![
                Violation::IndexOutOfSequence { position: 0, found: 7 },
                Violation::InvalidGenesis {
                    previous_hash: "abc".to_string()
                },
            ]
        );
    }

    #[test]
    fn test_report_display() {
        let mut chain = sample_chain(1);
        chain[1].nonce += 1;
        let text = validate_chain(&chain).to_string();
        assert!(text.starts_with("block 1 hash mismatch"));
    }
}
