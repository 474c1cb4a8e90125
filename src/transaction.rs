// === transaction.rs ===

use serde::{Deserialize, Serialize};

/// In-chain value transfer. Field order is the canonical JSON order used for
/// both signing and block hashing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub sender_blockchain_address: String,
    pub recipient_blockchain_address: String,
    pub value: f32,
}

impl Transaction {
    pub fn new(sender: &str, recipient: &str, value: f32) -> Self {
        Transaction {
            sender_blockchain_address: sender.to_string(),
            recipient_blockchain_address: recipient.to_string(),
            value,
        }
    }
}

/// Signed transaction as submitted to the node, either by a wallet (POST)
/// or by a gossiping peer (PUT). All five fields are required.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sender_blockchain_address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recipient_blockchain_address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sender_public_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signature: Option<String>,
}

impl TransactionRequest {
    pub fn validate(&self) -> bool {
        self.sender_blockchain_address.is_some()
            && self.recipient_blockchain_address.is_some()
            && self.sender_public_key.is_some()
            && self.value.is_some()
            && self.signature.is_some()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AmountResponse {
    pub amount: f32,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_request() -> TransactionRequest {
        TransactionRequest {
            sender_blockchain_address: Some("sender".into()),
            recipient_blockchain_address: Some("recipient".into()),
            sender_public_key: Some("ab".repeat(64)),
            value: Some(1.5),
            signature: Some("cd".repeat(64)),
        }
    }

    #[test]
    fn request_with_all_fields_validates() {
        assert!(full_request().validate());
    }

    #[test]
    fn request_missing_any_field_fails() {
        let mut r = full_request();
        r.signature = None;
        assert!(!r.validate());

        let mut r = full_request();
        r.value = None;
        assert!(!r.validate());
    }

    #[test]
    fn canonical_order_is_sender_recipient_value() {
        let t = Transaction::new("a", "b", 2.5);
        let json = String::from_utf8(crate::cryptography::canonical_json(&t)).unwrap();
        assert_eq!(
            json,
            r#"{"sender_blockchain_address":"a","recipient_blockchain_address":"b","value":2.5}"#
        );
    }
}
