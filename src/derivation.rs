//! Deterministic secret derivation
//!
//! A hardened-only derivation tree over the wallet seed. Restore walks
//! `m / 129372' / 0' / keyset' / index'` and regenerates the exact secrets
//! and blinding factors of every proof the mint ever signed for this seed,
//! so every constant here is part of the backup format.

use bitcoin::hashes::{sha256, sha512, Hash, HashEngine, Hmac, HmacEngine};

use crate::dhke::{blind_message, scalar_from_bytes};
use crate::error::Error;
use crate::nuts::{BlindedMessage, Id, PreMint, PreMintSecrets};
use crate::secret::Secret;
use crate::util::hex;
use crate::Amount;

/// Purpose level of the backup derivation path
const DERIVATION_PURPOSE: u32 = 129372;

/// Coin type level of the backup derivation path
const DERIVATION_COIN: u32 = 0;

/// Top bit of a child number marks the child as hardened
const HARDENED_OFFSET: u32 = 1 << 31;

/// A node of the derivation tree
///
/// Master: HMAC-SHA-512 of the seed under the ASCII key `"Bitcoin seed"`.
/// Hardened child `i`: HMAC-SHA-512 of `0x00 || key || be32(i)` under the
/// chain code. The left half of the digest is the child key directly; there
/// is no parent-key tweak and no non-hardened derivation.
#[derive(Clone)]
pub struct DerivationNode {
    key: [u8; 32],
    chain_code: [u8; 32],
}

impl std::fmt::Debug for DerivationNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DerivationNode")
            .field("key", &"[REDACTED]")
            .field("chain_code", &"[REDACTED]")
            .finish()
    }
}

impl DerivationNode {
    /// Master node from a seed
    pub fn master(seed: &[u8]) -> Self {
        let mut engine = HmacEngine::<sha512::Hash>::new(b"Bitcoin seed");
        engine.input(seed);
        let digest = Hmac::<sha512::Hash>::from_engine(engine).to_byte_array();

        Self::from_digest(digest)
    }

    /// Hardened child at the given index
    ///
    /// The hardened bit is set on the index before it enters the HMAC.
    pub fn hardened_child(&self, index: u32) -> Self {
        let child_number = HARDENED_OFFSET | index;

        let mut engine = HmacEngine::<sha512::Hash>::new(&self.chain_code);
        engine.input(&[0x00]);
        engine.input(&self.key);
        engine.input(&child_number.to_be_bytes());
        let digest = Hmac::<sha512::Hash>::from_engine(engine).to_byte_array();

        Self::from_digest(digest)
    }

    /// Node key bytes
    pub fn key(&self) -> &[u8; 32] {
        &self.key
    }

    fn from_digest(digest: [u8; 64]) -> Self {
        let mut key = [0u8; 32];
        let mut chain_code = [0u8; 32];
        key.copy_from_slice(&digest[..32]);
        chain_code.copy_from_slice(&digest[32..]);

        Self { key, chain_code }
    }
}

/// Leaf node for one derivation index under one keyset
fn leaf_node(master: &DerivationNode, keyset_id: Id, index: u32) -> DerivationNode {
    master
        .hardened_child(DERIVATION_PURPOSE)
        .hardened_child(DERIVATION_COIN)
        .hardened_child(keyset_id.as_derivation_index())
        .hardened_child(index)
}

fn hmac_sha256(key: &[u8], message: &[u8]) -> [u8; 32] {
    let mut engine = HmacEngine::<sha256::Hash>::new(key);
    engine.input(message);
    Hmac::<sha256::Hash>::from_engine(engine).to_byte_array()
}

/// Derive the secret and blinding factor at one index
///
/// `s = HMAC-SHA-256(node.key, [0x00])`, `r = HMAC-SHA-256(node.key, [0x01])`.
/// The secret takes the conventional form of a hex string.
pub fn derive_secret(
    master: &DerivationNode,
    keyset_id: Id,
    index: u32,
) -> Result<(Secret, crate::nuts::SecretKey), Error> {
    let node = leaf_node(master, keyset_id, index);

    let secret = Secret::new(hex::encode(hmac_sha256(node.key(), &[0x00])));
    let r = scalar_from_bytes(hmac_sha256(node.key(), &[0x01]))?;

    Ok((secret, r))
}

/// Blinded outputs for a contiguous range of restore indices
///
/// The result is in ascending index order, which downstream matching relies
/// on. Amounts are zero; restore payloads re-stamp each blinded point with
/// every candidate denomination.
pub fn restore_premint_secrets(
    master: &DerivationNode,
    keyset_id: Id,
    start: u32,
    count: u32,
) -> Result<PreMintSecrets, Error> {
    let mut secrets = Vec::with_capacity(count as usize);

    for index in start..start + count {
        let (secret, r) = derive_secret(master, keyset_id, index)?;
        let (blinded, r) = blind_message(&secret.to_bytes(), Some(r))?;

        secrets.push(PreMint {
            blinded_message: BlindedMessage::new(Amount::ZERO, keyset_id, blinded),
            secret,
            r,
            amount: Amount::ZERO,
        });
    }

    Ok(PreMintSecrets { secrets })
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    const SEED: &[u8] = b"test seed bytes for derivation vectors..........................";

    #[test]
    fn test_master_is_deterministic() {
        let a = DerivationNode::master(SEED);
        let b = DerivationNode::master(SEED);

        assert_eq!(a.key(), b.key());

        let c = DerivationNode::master(b"different seed");
        assert_ne!(a.key(), c.key());
    }

    #[test]
    fn test_child_depends_on_index() {
        let master = DerivationNode::master(SEED);

        let a = master.hardened_child(0);
        let b = master.hardened_child(1);

        assert_ne!(a.key(), b.key());

        // Same index twice gives the same node
        let a2 = master.hardened_child(0);
        assert_eq!(a.key(), a2.key());
    }

    #[test]
    fn test_derive_secret_deterministic_across_nodes() {
        let keyset_id = Id::from_str("009a1f293253e41e").unwrap();

        let master_a = DerivationNode::master(SEED);
        let master_b = DerivationNode::master(SEED);

        for index in 0..5 {
            let (secret_a, r_a) = derive_secret(&master_a, keyset_id, index).unwrap();
            let (secret_b, r_b) = derive_secret(&master_b, keyset_id, index).unwrap();

            assert_eq!(secret_a, secret_b);
            assert_eq!(r_a, r_b);
        }
    }

    #[test]
    fn test_derive_secret_distinct_per_keyset_and_index() {
        let master = DerivationNode::master(SEED);
        let keyset_a = Id::from_str("009a1f293253e41e").unwrap();
        let keyset_b = Id::from_str("00ad268c4d1f5826").unwrap();

        let (secret_a0, _) = derive_secret(&master, keyset_a, 0).unwrap();
        let (secret_a1, _) = derive_secret(&master, keyset_a, 1).unwrap();
        let (secret_b0, _) = derive_secret(&master, keyset_b, 0).unwrap();

        assert_ne!(secret_a0, secret_a1);
        assert_ne!(secret_a0, secret_b0);
    }

    #[test]
    fn test_restore_premint_is_ascending_and_stable() {
        let master = DerivationNode::master(SEED);
        let keyset_id = Id::from_str("009a1f293253e41e").unwrap();

        let batch = restore_premint_secrets(&master, keyset_id, 0, 20).unwrap();
        assert_eq!(batch.len(), 20);

        // Re-deriving the same range reproduces the same blinded points
        let again = restore_premint_secrets(&master, keyset_id, 0, 20).unwrap();
        for (a, b) in batch.secrets.iter().zip(again.secrets.iter()) {
            assert_eq!(a.blinded_message.blinded_secret, b.blinded_message.blinded_secret);
        }

        // Later range is disjoint
        let next = restore_premint_secrets(&master, keyset_id, 20, 20).unwrap();
        assert_ne!(
            batch.secrets[0].blinded_message.blinded_secret,
            next.secrets[0].blinded_message.blinded_secret
        );
    }

    #[test]
    fn test_seed_from_mnemonic() {
        use bip39::Mnemonic;

        let mnemonic = Mnemonic::from_str(
            "half depart obvious quality work element tank gorilla view sugar picture humble",
        )
        .unwrap();
        let seed: [u8; 64] = mnemonic.to_seed("");

        let master = DerivationNode::master(&seed);
        let keyset_id = Id::from_str("009a1f293253e41e").unwrap();

        let (secret, _) = derive_secret(&master, keyset_id, 0).unwrap();

        // 32 bytes hex encoded
        assert_eq!(secret.to_bytes().len(), 64);
    }
}
