// === wallet.rs ===

use p256::ecdsa::signature::Signer;
use p256::ecdsa::{Signature, SigningKey, VerifyingKey};
use rand::rngs::OsRng;
use ripemd::Ripemd160;
use sha2::{Digest, Sha256};

use crate::cryptography::canonical_json;
use crate::transaction::Transaction;

/// An ECDSA P-256 key pair together with its derived blockchain address.
pub struct Wallet {
    signing_key: SigningKey,
    blockchain_address: String,
}

impl Wallet {
    pub fn new() -> Self {
        let signing_key = SigningKey::random(&mut OsRng);
        let blockchain_address = derive_address(signing_key.verifying_key());
        Wallet {
            signing_key,
            blockchain_address,
        }
    }

    pub fn verifying_key(&self) -> &VerifyingKey {
        self.signing_key.verifying_key()
    }

    /// Private scalar as 64 lowercase hex chars.
    pub fn private_key_str(&self) -> String {
        hex::encode(self.signing_key.to_bytes())
    }

    /// Uncompressed public key as 128 lowercase hex chars (X || Y, each
    /// left zero-padded to 64).
    pub fn public_key_str(&self) -> String {
        public_key_hex(self.signing_key.verifying_key())
    }

    pub fn blockchain_address(&self) -> &str {
        &self.blockchain_address
    }

    /// ECDSA signature over the canonical JSON of the transaction.
    pub fn sign_transaction(&self, transaction: &Transaction) -> Signature {
        self.signing_key.sign(&canonical_json(transaction))
    }
}

pub fn public_key_hex(verifying_key: &VerifyingKey) -> String {
    let point = verifying_key.to_encoded_point(false);
    // skip the 0x04 uncompressed-point tag, leaving X || Y
    hex::encode(&point.as_bytes()[1..])
}

/// Signature as 128 lowercase hex chars (R || S, each left zero-padded).
pub fn signature_hex(signature: &Signature) -> String {
    hex::encode(signature.to_bytes())
}

/// Derives the textual blockchain address from a public key:
/// SHA-256 over X || Y, RIPEMD-160, version byte 0x00, then base58check
/// with a double-SHA-256 checksum. The coordinates are hashed as unpadded
/// big-endian integers; zero-padding applies only to the hex wire form.
pub fn derive_address(verifying_key: &VerifyingKey) -> String {
    let point = verifying_key.to_encoded_point(false);
    let xy = &point.as_bytes()[1..];

    let mut hasher = Sha256::new();
    hasher.update(strip_leading_zeros(&xy[..32]));
    hasher.update(strip_leading_zeros(&xy[32..]));
    let sha: [u8; 32] = hasher.finalize().into();
    let ripe: [u8; 20] = Ripemd160::digest(sha).into();

    let mut payload = [0u8; 25];
    payload[1..21].copy_from_slice(&ripe);

    let checksum: [u8; 32] = Sha256::digest(Sha256::digest(&payload[..21])).into();
    payload[21..].copy_from_slice(&checksum[..4]);

    bs58::encode(payload).into_string()
}

fn strip_leading_zeros(bytes: &[u8]) -> &[u8] {
    let start = bytes.iter().position(|&b| b != 0).unwrap_or(bytes.len());
    &bytes[start..]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cryptography::{public_key_from_hex, signature_from_hex, verify_transaction};

    #[test]
    fn key_material_has_wire_lengths() {
        let w = Wallet::new();
        assert_eq!(w.private_key_str().len(), 64);
        assert_eq!(w.public_key_str().len(), 128);
        assert!(w.public_key_str().chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn address_carries_version_byte_and_checksum() {
        let w = Wallet::new();
        let decoded = bs58::decode(w.blockchain_address()).into_vec().unwrap();
        assert_eq!(decoded.len(), 25);
        assert_eq!(decoded[0], 0x00);
        let checksum: [u8; 32] = Sha256::digest(Sha256::digest(&decoded[..21])).into();
        assert_eq!(&decoded[21..], &checksum[..4]);
    }

    #[test]
    fn sign_verify_round_trip() {
        let w = Wallet::new();
        let tx = Transaction::new(w.blockchain_address(), "recipient", 7.25);
        let sig = w.sign_transaction(&tx);
        assert!(verify_transaction(w.verifying_key(), &sig, &tx));
    }

    #[test]
    fn tampering_with_any_field_breaks_verification() {
        let w = Wallet::new();
        let tx = Transaction::new(w.blockchain_address(), "recipient", 7.25);
        let sig = w.sign_transaction(&tx);

        let mut tampered = tx.clone();
        tampered.value = 7.26;
        assert!(!verify_transaction(w.verifying_key(), &sig, &tampered));

        let mut tampered = tx.clone();
        tampered.recipient_blockchain_address = "recipienu".into();
        assert!(!verify_transaction(w.verifying_key(), &sig, &tampered));
    }

    #[test]
    fn coordinate_stripping_drops_only_leading_zeros() {
        assert_eq!(strip_leading_zeros(&[0, 0, 1, 0, 2]), &[1, 0, 2]);
        assert_eq!(strip_leading_zeros(&[9, 0, 0]), &[9, 0, 0]);
        assert!(strip_leading_zeros(&[0, 0, 0]).is_empty());
    }

    #[test]
    fn keys_and_signature_survive_hex_round_trip() {
        let w = Wallet::new();
        let tx = Transaction::new(w.blockchain_address(), "recipient", 0.5);
        let sig = w.sign_transaction(&tx);

        let pk = public_key_from_hex(&w.public_key_str()).unwrap();
        let sig2 = signature_from_hex(&signature_hex(&sig)).unwrap();
        assert!(verify_transaction(&pk, &sig2, &tx));
        assert_eq!(derive_address(&pk), w.blockchain_address());
    }
}
