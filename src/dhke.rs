//! Diffie-Hellmann key exchange
//!
//! The blind signature scheme: the wallet sends `B_ = Y + r·G`, the mint
//! replies with `C_ = k·B_` and the wallet unblinds to `C = C_ - r·K`.

use bitcoin::hashes::sha256::Hash as Sha256Hash;
use bitcoin::hashes::Hash;
use bitcoin::secp256k1::Scalar;

use crate::error::Error;
use crate::nuts::nut01::{PublicKey, SecretKey};
use crate::nuts::{BlindSignature, Keys, PreMint, Proof, Proofs};
use crate::SECP256K1;

/// Iteration bound for [`hash_to_curve`]. Each round succeeds for roughly
/// half of all inputs, so hitting the bound means the input is broken.
const HASH_TO_CURVE_MAX_ROUNDS: u32 = 100;

/// Map a secret to a point on the curve
///
/// `h = SHA-256(secret)`; parse `0x02 || h` as a compressed point and rehash
/// until a valid x coordinate is found. This construction determines the
/// point identity the mint observes for a secret and must never change.
pub fn hash_to_curve(message: &[u8]) -> Result<PublicKey, Error> {
    let mut hash: [u8; 32] = Sha256Hash::hash(message).to_byte_array();

    for _ in 0..HASH_TO_CURVE_MAX_ROUNDS {
        let mut candidate = [0x02u8; 33];
        candidate[1..].copy_from_slice(&hash);

        match PublicKey::from_slice(&candidate) {
            Ok(pubkey) => return Ok(pubkey),
            Err(_) => {
                hash = Sha256Hash::hash(&hash).to_byte_array();
            }
        }
    }

    Err(Error::Crypto(
        "hash_to_curve exhausted its iteration bound".to_string(),
    ))
}

/// Interpret bytes as a scalar, reducing via SHA-256 while out of range
pub fn scalar_from_bytes(bytes: [u8; 32]) -> Result<SecretKey, Error> {
    let mut candidate = bytes;

    for _ in 0..HASH_TO_CURVE_MAX_ROUNDS {
        match SecretKey::from_slice(&candidate) {
            Ok(key) => return Ok(key),
            Err(_) => {
                candidate = Sha256Hash::hash(&candidate).to_byte_array();
            }
        }
    }

    Err(Error::Crypto("could not reduce bytes to a scalar".to_string()))
}

/// Blind Message
///
/// `B_ = Y + r·G`
pub fn blind_message(
    secret: &[u8],
    blinding_factor: Option<SecretKey>,
) -> Result<(PublicKey, SecretKey), Error> {
    let y: PublicKey = hash_to_curve(secret)?;
    let r: SecretKey = blinding_factor.unwrap_or_else(SecretKey::generate);
    let b: PublicKey = y
        .combine(&r.public_key())
        .map_err(|e| Error::Crypto(e.to_string()))?
        .into();
    Ok((b, r))
}

/// Unblind Message
///
/// `C = C_ - r·K`
pub fn unblind_message(
    // C_
    blinded_key: &PublicKey,
    r: &SecretKey,
    // K
    mint_pubkey: &PublicKey,
) -> Result<PublicKey, Error> {
    let r: Scalar = r.as_scalar();

    // a = r * K
    let a: PublicKey = mint_pubkey
        .mul_tweak(&SECP256K1, &r)
        .map_err(|e| Error::Crypto(e.to_string()))?
        .into();

    // C_ - a
    let a: PublicKey = a.negate(&SECP256K1).into();
    let c: PublicKey = blinded_key
        .combine(&a)
        .map_err(|e| Error::Crypto(e.to_string()))?
        .into();
    Ok(c)
}

/// Construct proofs from the mint's blind signatures
///
/// Outputs are walked in planning order and each consumes the first
/// remaining signature of the same amount, so the caller's ordering of
/// secrets survives into the resulting proofs. An output the mint did not
/// sign is skipped; the mint keeping some outputs is legitimate when change
/// is partially consumed by fees.
pub fn construct_proofs(
    promises: Vec<BlindSignature>,
    pre_mints: &[PreMint],
    keys: &Keys,
) -> Result<Proofs, Error> {
    let requested = pre_mints.len();
    let mut remaining: Vec<Option<BlindSignature>> = promises.into_iter().map(Some).collect();
    let mut proofs = Vec::with_capacity(requested);

    for pre_mint in pre_mints {
        let mut promise = None;
        for slot in remaining.iter_mut() {
            if slot
                .as_ref()
                .map(|p| p.amount == pre_mint.amount)
                .unwrap_or(false)
            {
                promise = slot.take();
                break;
            }
        }

        let promise = match promise {
            Some(promise) => promise,
            None => {
                tracing::warn!(
                    "No signature returned for output of amount {}, skipping",
                    pre_mint.amount
                );
                continue;
            }
        };

        let key = keys.amount_key(promise.amount).ok_or(Error::AmountKey)?;
        let c = unblind_message(&promise.c, &pre_mint.r, &key)?;

        proofs.push(Proof::new(
            promise.amount,
            promise.keyset_id,
            pre_mint.secret.clone(),
            c,
        ));
    }

    Ok(proofs)
}

/// Construct change proofs from melt change signatures
///
/// Change signatures carry mint-assigned amounts and pair with the wallet's
/// blank outputs positionally, `signatures[i]` against `outputs[i]`. Outputs
/// beyond the returned signatures were consumed by fees and are dropped.
pub fn construct_change_proofs(
    promises: Vec<BlindSignature>,
    pre_mints: &[PreMint],
    keys: &Keys,
) -> Result<Proofs, Error> {
    if promises.len() > pre_mints.len() {
        return Err(Error::Protocol(format!(
            "mint returned {} change signatures for {} outputs",
            promises.len(),
            pre_mints.len()
        )));
    }

    if promises.len() < pre_mints.len() {
        tracing::debug!(
            "Mint consumed {} change outputs as fees",
            pre_mints.len() - promises.len()
        );
    }

    promises
        .into_iter()
        .zip(pre_mints)
        .map(|(promise, pre_mint)| {
            let key = keys.amount_key(promise.amount).ok_or(Error::AmountKey)?;
            let c = unblind_message(&promise.c, &pre_mint.r, &key)?;

            Ok(Proof::new(
                promise.amount,
                promise.keyset_id,
                pre_mint.secret.clone(),
                c,
            ))
        })
        .collect()
}

/// Sign Blinded Message
///
/// `C_ = k * B_`, where `k` is the mint private key for the amount. Only a
/// mint signs; the wallet uses this to verify round trips in tests and to
/// drive fake mints.
pub fn sign_message(k: &SecretKey, blinded_message: &PublicKey) -> Result<PublicKey, Error> {
    let k: Scalar = k.as_scalar();
    Ok(blinded_message
        .mul_tweak(&SECP256K1, &k)
        .map_err(|e| Error::Crypto(e.to_string()))?
        .into())
}

/// Verify an unblinded signature against the mint private key
pub fn verify_message(
    k: &SecretKey,
    unblinded_message: PublicKey,
    msg: &[u8],
) -> Result<(), Error> {
    // Y
    let y: PublicKey = hash_to_curve(msg)?;

    let expected: PublicKey = y
        .mul_tweak(&SECP256K1, &k.as_scalar())
        .map_err(|e| Error::Crypto(e.to_string()))?
        .into();

    if unblinded_message == expected {
        return Ok(());
    }

    Err(Error::Crypto("signature does not verify".to_string()))
}
