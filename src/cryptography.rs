// === cryptography.rs ===

use p256::ecdsa::signature::Verifier;
use p256::ecdsa::{Signature, VerifyingKey};
use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::transaction::Transaction;

/// Encodes a value into its canonical JSON byte form. Signer, verifier,
/// hasher and validator all go through this function so the bytes agree.
pub fn canonical_json<T: Serialize>(value: &T) -> Vec<u8> {
    serde_json::to_vec(value).expect("canonical JSON encoding")
}

/// SHA-256 over the canonical JSON form of a value.
pub fn hash_json<T: Serialize>(value: &T) -> [u8; 32] {
    Sha256::digest(canonical_json(value)).into()
}

/// Verifies proof-of-work: the lowercase hex of the digest must start with
/// `difficulty` '0' characters.
pub fn verify_pow(digest: &[u8; 32], difficulty: usize) -> bool {
    hex::encode(digest).starts_with(&"0".repeat(difficulty))
}

/// Parses an uncompressed public key from 128 hex chars (X || Y).
pub fn public_key_from_hex(s: &str) -> Result<VerifyingKey, Box<dyn std::error::Error>> {
    let xy = hex::decode(s)?;
    if xy.len() != 64 {
        return Err("public key must be 64 bytes".into());
    }
    let mut sec1 = Vec::with_capacity(65);
    sec1.push(0x04);
    sec1.extend_from_slice(&xy);
    Ok(VerifyingKey::from_sec1_bytes(&sec1)?)
}

/// Parses a signature from 128 hex chars (R || S, each left zero-padded).
pub fn signature_from_hex(s: &str) -> Result<Signature, Box<dyn std::error::Error>> {
    let rs = hex::decode(s)?;
    Ok(Signature::from_slice(&rs)?)
}

/// Checks the ECDSA signature of a transaction against the declared public
/// key. The message is the canonical JSON of the in-chain transaction.
pub fn verify_transaction(public_key: &VerifyingKey, signature: &Signature, transaction: &Transaction) -> bool {
    public_key.verify(&canonical_json(transaction), signature).is_ok()
}

/// Serde codec for 32-byte digests carried as 64 lowercase hex chars.
pub mod hex_digest {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(digest: &[u8; 32], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&hex::encode(digest))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<[u8; 32], D::Error> {
        let s = String::deserialize(deserializer)?;
        let bytes = hex::decode(&s).map_err(serde::de::Error::custom)?;
        bytes
            .try_into()
            .map_err(|_| serde::de::Error::custom("digest must be 32 bytes"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pow_counts_leading_hex_zeros() {
        let mut digest = [0u8; 32];
        digest[0] = 0x00;
        digest[1] = 0x0f;
        // hex "000f..." has three leading zeros
        assert!(verify_pow(&digest, 3));
        assert!(!verify_pow(&digest, 4));
    }

    #[test]
    fn rejects_malformed_key_and_signature_hex() {
        assert!(public_key_from_hex("zz").is_err());
        assert!(public_key_from_hex(&"ab".repeat(10)).is_err());
        assert!(signature_from_hex("0123").is_err());
    }
}
