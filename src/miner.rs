//! Proof-of-work mining.
//!
//! A block is mined by bumping its nonce until the hex digest starts with
//! `difficulty` zero characters. The search is synchronous and unbounded; each
//! extra unit of difficulty multiplies the expected work by 16.

use crate::blockchain::HashBlock;
use std::time::Instant;
use tracing::{info, warn};

/// Length of a hex SHA-256 digest. No hash can satisfy a larger target.
pub const MAX_DIFFICULTY: u32 = 64;

/// From here on a single block takes noticeably long on one core.
pub const SLOW_DIFFICULTY: u32 = 6;

/// True when `hash` starts with `difficulty` `'0'` characters.
pub fn meets_difficulty(hash: &str, difficulty: u32) -> bool {
    let difficulty = difficulty as usize;
    hash.len() >= difficulty && hash.bytes().take(difficulty).all(|b| b == b'0')
}

/// Mine `block` in place, returning the number of hashes computed.
///
/// The block's current hash is checked first, so at difficulty 0 the nonce
/// stays at its initial value.
pub fn mine_block(block: &mut HashBlock, difficulty: u32) -> u64 {
    if difficulty >= SLOW_DIFFICULTY {
        warn!(
            target: "mining",
            difficulty,
            "Difficulty may take a long time to satisfy"
        );
    }

    let start = Instant::now();
    let mut attempts: u64 = 0;

    while !meets_difficulty(&block.hash, difficulty) {
        block.nonce = block.nonce.wrapping_add(1);
        block.hash = block.compute_hash();
        attempts += 1;
    }

    info!(
        target: "mining",
        index = block.index,
        nonce = block.nonce,
        hash = %block.hash,
        attempts,
        elapsed_ms = start.elapsed().as_millis() as u64,
        "Block mined"
    );
    attempts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transaction::Transaction;
    use serde_json::json;

    fn candidate() -> HashBlock {
        HashBlock::new(
            1,
            1_700_000_000_000,
            vec![Transaction::new(json!({"amount": 5}))],
            "0".repeat(64),
        )
    }

    #[test]
    fn test_meets_difficulty() {
        assert!(meets_difficulty("00ab", 2));
        assert!(!meets_difficulty("0a0b", 2));
        assert!(meets_difficulty("abcd", 0));
        assert!(!meets_difficulty("00", 3));
    }

    #[test]
    fn test_mined_hash_has_leading_zeros() {
        for difficulty in 1..=3 {
            let mut block = candidate();
            mine_block(&mut block, difficulty);
            assert!(block.hash.starts_with(&"0".repeat(difficulty as usize)));
            assert_eq!(block.hash, block.compute_hash());
        }
    }

    #[test]
    fn test_zero_difficulty_keeps_initial_nonce() {
        let mut block = candidate();
        let before = block.hash.clone();
        let attempts = mine_block(&mut block, 0);
        assert_eq!(attempts, 0);
        assert_eq!(block.nonce, 0);
        assert_eq!(block.hash, before);
    }

    #[test]
    fn test_attempts_match_nonce_from_zero() {
        let mut block = candidate();
        let attempts = mine_block(&mut block, 2);
        assert_eq!(attempts, block.nonce);
    }
}
