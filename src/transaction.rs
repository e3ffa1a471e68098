//! Opaque transaction payloads.
//!
//! The ledger never interprets what a transaction means. A payload is any JSON
//! value and is only ever hashed as serialized content.

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Transaction(Value);

impl Transaction {
    pub fn new(payload: Value) -> Self {
        Transaction(payload)
    }

    pub fn payload(&self) -> &Value {
        &self.0
    }

    /// `null` carries no data and is refused at the intake boundary.
    pub fn is_empty(&self) -> bool {
        self.0.is_null()
    }
}

/// Canonical serialization of a batch, as fed into the block hash.
///
/// Object keys come out sorted (serde_json's default map), so two payloads with
/// the same content serialize identically whatever order they arrived in.
pub fn canonical_json(transactions: &[Transaction]) -> String {
    // Serializing a Value sequence cannot fail: every key is a string.
    serde_json::to_string(transactions).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_transaction_is_transparent() {
        let tx = Transaction::new(json!({"amount": 100, "from": "A", "to": "B"}));
        let encoded = serde_json::to_string(&tx).unwrap();
        assert_eq!(encoded, r#"{"amount":100,"from":"A","to":"B"}"#);
    }

    #[test]
    fn test_canonical_json_ignores_key_order() {
        let a: Transaction = serde_json::from_str(r#"{"to":"B","amount":100,"from":"A"}"#).unwrap();
        let b: Transaction = serde_json::from_str(r#"{"from":"A","to":"B","amount":100}"#).unwrap();
        assert_eq!(canonical_json(&[a]), canonical_json(&[b]));
    }

    #[test]
    fn test_null_is_empty() {
        assert!(Transaction::new(Value::Null).is_empty());
        assert!(!Transaction::new(json!("Genesis Block")).is_empty());
    }
}
