//! NUT-00: Notation and Models
//!
//! <https://github.com/cashubtc/nuts/blob/main/00.md>

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{de, Deserialize, Deserializer, Serialize};

use super::nut01::{PublicKey, SecretKey};
use super::nut02::Id;
use crate::dhke::{blind_message, hash_to_curve};
use crate::error::Error;
use crate::nuts::Keys;
use crate::secret::Secret;
use crate::Amount;

pub mod token;
pub use token::TokenV3;

/// List of [Proof]
pub type Proofs = Vec<Proof>;

/// Utility methods for [Proofs]
pub trait ProofsMethods {
    /// Try to sum up the amounts of all [Proof]s
    fn total_amount(&self) -> Result<Amount, Error>;

    /// Try to fetch the Y point (hash-to-curve of the secret) of all [Proof]s
    fn ys(&self) -> Result<Vec<PublicKey>, Error>;
}

impl ProofsMethods for Proofs {
    fn total_amount(&self) -> Result<Amount, Error> {
        Amount::try_sum(self.iter().map(|p| p.amount)).map_err(Into::into)
    }

    fn ys(&self) -> Result<Vec<PublicKey>, Error> {
        self.iter().map(Proof::y).collect()
    }
}

/// Blinded Message (also called `output`)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BlindedMessage {
    /// Amount
    ///
    /// The value for the requested [BlindSignature]
    pub amount: Amount,
    /// Keyset ID
    ///
    /// ID from which we expect a signature.
    #[serde(rename = "id")]
    pub keyset_id: Id,
    /// Blinded secret message (B_)
    ///
    /// `B_ = Y + r·G` where `Y` is the hash-to-curve of the secret and `r`
    /// the blinding factor.
    #[serde(rename = "B_")]
    pub blinded_secret: PublicKey,
}

impl BlindedMessage {
    /// Compose new blinded message
    #[inline]
    pub fn new(amount: Amount, keyset_id: Id, blinded_secret: PublicKey) -> Self {
        Self {
            amount,
            keyset_id,
            blinded_secret,
        }
    }
}

/// Blind Signature (also called `promise`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlindSignature {
    /// Amount
    ///
    /// The value of the blinded token.
    pub amount: Amount,
    /// Keyset ID
    ///
    /// ID of the mint keys that signed the token.
    #[serde(rename = "id")]
    pub keyset_id: Id,
    /// Blinded signature (C_)
    ///
    /// The blinded signature on the secret message `B_` of [BlindedMessage].
    #[serde(rename = "C_")]
    pub c: PublicKey,
}

/// Proof
///
/// A bearer token. Two proofs with the same unblinded signature `C` are the
/// same proof; the wallet stores proofs keyed by `C`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proof {
    /// Amount
    pub amount: Amount,
    /// `Keyset id`
    #[serde(rename = "id")]
    pub keyset_id: Id,
    /// Secret message
    pub secret: Secret,
    /// Unblinded signature
    #[serde(rename = "C")]
    pub c: PublicKey,
}

impl Proof {
    /// Create new [`Proof`]
    pub fn new(amount: Amount, keyset_id: Id, secret: Secret, c: PublicKey) -> Self {
        Proof {
            amount,
            keyset_id,
            secret,
            c,
        }
    }

    /// Get y from proof
    ///
    /// Where y is `hash_to_curve(secret)`
    pub fn y(&self) -> Result<PublicKey, Error> {
        hash_to_curve(self.secret.as_bytes())
    }
}

impl Ord for Proof {
    fn cmp(&self, other: &Self) -> Ordering {
        self.amount.cmp(&other.amount)
    }
}

impl PartialOrd for Proof {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Currency Unit
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum CurrencyUnit {
    /// Sat
    #[default]
    Sat,
    /// Msat
    Msat,
    /// Usd
    Usd,
    /// Euro
    Eur,
    /// Custom currency unit
    Custom(String),
}

impl FromStr for CurrencyUnit {
    type Err = Error;
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_uppercase().as_str() {
            "SAT" => Ok(Self::Sat),
            "MSAT" => Ok(Self::Msat),
            "USD" => Ok(Self::Usd),
            "EUR" => Ok(Self::Eur),
            _ => Ok(Self::Custom(value.to_string())),
        }
    }
}

impl fmt::Display for CurrencyUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CurrencyUnit::Sat => "sat",
            CurrencyUnit::Msat => "msat",
            CurrencyUnit::Usd => "usd",
            CurrencyUnit::Eur => "eur",
            CurrencyUnit::Custom(unit) => unit,
        };
        write!(f, "{}", s)
    }
}

impl Serialize for CurrencyUnit {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for CurrencyUnit {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let currency: String = String::deserialize(deserializer)?;
        Self::from_str(&currency).map_err(|_| de::Error::custom("Unsupported unit"))
    }
}

/// PreMint
///
/// A blinded message together with the secret and blinding factor needed to
/// unblind the mint's signature. The secret material lives only in memory for
/// the duration of an operation and is never serialized.
#[derive(Debug, Clone)]
pub struct PreMint {
    /// Blinded message
    pub blinded_message: BlindedMessage,
    /// Secret
    pub secret: Secret,
    /// Blinding factor
    pub r: SecretKey,
    /// Amount
    pub amount: Amount,
}

/// Premint Secrets
#[derive(Debug, Clone, Default)]
pub struct PreMintSecrets {
    /// Secrets
    pub secrets: Vec<PreMint>,
}

impl PreMintSecrets {
    /// Outputs for the given amount with fresh random secrets
    ///
    /// The amount is split into power-of-two parts; each part must have a
    /// mint key in `keys` or the whole call fails.
    pub fn random(keyset_id: Id, amount: Amount, keys: &Keys) -> Result<Self, Error> {
        Self::from_amounts(keyset_id, amount.split(), keys)
    }

    /// Outputs for predetermined part amounts with fresh random secrets
    ///
    /// Part order is preserved so the caller can correlate unblinded proofs
    /// with the amounts it planned.
    pub fn from_amounts(keyset_id: Id, amounts: Vec<Amount>, keys: &Keys) -> Result<Self, Error> {
        let mut output = Vec::with_capacity(amounts.len());

        for amount in amounts {
            if keys.amount_key(amount).is_none() {
                return Err(Error::AmountKey);
            }

            let secret = Secret::generate();
            let (blinded, r) = blind_message(&secret.to_bytes(), None)?;

            let blinded_message = BlindedMessage::new(amount, keyset_id, blinded);

            output.push(PreMint {
                secret,
                blinded_message,
                r,
                amount,
            });
        }

        Ok(PreMintSecrets { secrets: output })
    }

    /// Blank outputs used for change the mint assigns amounts to [NUT-08]
    ///
    /// Enough zero-amount outputs to represent any value up to `surplus` in
    /// powers of two.
    pub fn blank(keyset_id: Id, surplus: Amount) -> Result<Self, Error> {
        let count = ((u64::from(surplus) as f64).log2().ceil() as u64).max(1);

        let mut output = Vec::with_capacity(count as usize);

        for _i in 0..count {
            let secret = Secret::generate();
            let (blinded, r) = blind_message(&secret.to_bytes(), None)?;

            let blinded_message = BlindedMessage::new(Amount::ZERO, keyset_id, blinded);

            output.push(PreMint {
                secret,
                blinded_message,
                r,
                amount: Amount::ZERO,
            })
        }

        Ok(PreMintSecrets { secrets: output })
    }

    /// Blinded messages, in planning order
    pub fn blinded_messages(&self) -> Vec<BlindedMessage> {
        self.secrets
            .iter()
            .map(|pm| pm.blinded_message.clone())
            .collect()
    }

    /// Number of outputs
    #[inline]
    pub fn len(&self) -> usize {
        self.secrets.len()
    }

    /// Whether there are no outputs
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.secrets.is_empty()
    }

    /// Totals the output amounts
    pub fn total_amount(&self) -> Result<Amount, Error> {
        Amount::try_sum(self.secrets.iter().map(|pm| pm.amount)).map_err(Into::into)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::str::FromStr;

    use super::*;

    fn test_keys(amounts: &[u64]) -> Keys {
        let mut map = BTreeMap::new();
        for amount in amounts {
            let sk = SecretKey::generate();
            map.insert(Amount::from(*amount), sk.public_key());
        }
        Keys::new(map)
    }

    #[test]
    fn test_proof_serialization_field_names() {
        let json = r#"{
            "amount": 2,
            "id": "009a1f293253e41e",
            "secret": "407915bc212be61a77e3e6d2aeb4c727980bda51cd06a6afc29e2861768a7837",
            "C": "02bc9097997d81afb2cc7346b5e4345a9346bd2a506eb7958598a72f0cf85163ea"
        }"#;

        let proof: Proof = serde_json::from_str(json).unwrap();
        assert_eq!(proof.amount, Amount::from(2));
        assert_eq!(proof.keyset_id, Id::from_str("009a1f293253e41e").unwrap());

        let round = serde_json::to_value(&proof).unwrap();
        assert!(round.get("C").is_some());
        assert!(round.get("id").is_some());
    }

    #[test]
    fn test_premint_secrets_random() {
        let keys = test_keys(&[1, 2, 4, 8, 16, 32, 64]);
        let keyset_id = Id::from(&keys);

        let premint = PreMintSecrets::random(keyset_id, Amount::from(11), &keys).unwrap();

        assert_eq!(premint.len(), 3);
        assert_eq!(premint.total_amount().unwrap(), Amount::from(11));

        let amounts: Vec<u64> = premint
            .secrets
            .iter()
            .map(|pm| pm.amount.into())
            .collect();
        assert_eq!(amounts, vec![1, 2, 8]);
    }

    #[test]
    fn test_premint_secrets_missing_key() {
        // No key for 8
        let keys = test_keys(&[1, 2, 4]);
        let keyset_id = Id::from(&keys);

        let premint = PreMintSecrets::random(keyset_id, Amount::from(11), &keys);
        assert!(matches!(premint, Err(Error::AmountKey)));
    }

    #[test]
    fn test_blank_output_count() {
        let keys = test_keys(&[1]);
        let keyset_id = Id::from(&keys);

        // Covers values up to 24 with 5 outputs
        let blank = PreMintSecrets::blank(keyset_id, Amount::from(24)).unwrap();
        assert_eq!(blank.len(), 5);

        // At least one output even for 1 sat of surplus
        let blank = PreMintSecrets::blank(keyset_id, Amount::from(1)).unwrap();
        assert_eq!(blank.len(), 1);
    }
}
