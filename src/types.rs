//! Types

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::Error;
use crate::mint_url::MintUrl;
use crate::nuts::{CurrencyUnit, Proof, Proofs, PublicKey, State};
use crate::util::unix_time;
use crate::Amount;

/// Status of a quote held by the wallet
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum QuoteState {
    /// Waiting on the lightning side
    Pending,
    /// Invoice settled, quote is executable
    Paid,
    /// Quote expired before settlement
    Expired,
    /// Mint reported failure
    Failed,
}

impl fmt::Display for QuoteState {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "PENDING"),
            Self::Paid => write!(f, "PAID"),
            Self::Expired => write!(f, "EXPIRED"),
            Self::Failed => write!(f, "FAILED"),
        }
    }
}

impl FromStr for QuoteState {
    type Err = Error;

    fn from_str(state: &str) -> Result<Self, Self::Err> {
        match state {
            "PENDING" => Ok(Self::Pending),
            "PAID" => Ok(Self::Paid),
            "EXPIRED" => Ok(Self::Expired),
            "FAILED" => Ok(Self::Failed),
            _ => Err(Error::Protocol(format!("Unknown quote state: {state}"))),
        }
    }
}

/// Mint Quote Info
///
/// A mint's promise to issue ecash for `amount` once `request` is paid.
#[derive(Debug, Clone, Hash, PartialEq, Eq, Serialize, Deserialize)]
pub struct MintQuote {
    /// Quote id
    pub id: String,
    /// Mint Url
    pub mint_url: MintUrl,
    /// Amount of quote
    pub amount: Amount,
    /// Unit of quote
    pub unit: CurrencyUnit,
    /// Quote payment request e.g. bolt11
    pub request: String,
    /// Quote state
    pub state: QuoteState,
    /// Expiration time of quote
    pub expiry: u64,
}

/// Melt Quote Info
#[derive(Debug, Clone, Hash, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeltQuote {
    /// Quote id
    pub id: String,
    /// Mint Url
    pub mint_url: MintUrl,
    /// Quote unit
    pub unit: CurrencyUnit,
    /// Quote amount
    pub amount: Amount,
    /// Quote Payment request e.g. bolt11
    pub request: String,
    /// Quote fee reserve
    pub fee_reserve: Amount,
    /// Quote state
    pub state: QuoteState,
    /// Expiration time of quote
    pub expiry: u64,
    /// Payment preimage
    pub payment_preimage: Option<String>,
}

/// Melt result
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Melted {
    /// Whether the payment settled
    pub paid: bool,
    /// Preimage of melt payment
    pub preimage: Option<String>,
    /// Change returned by the mint
    pub change: Option<Proofs>,
    /// Total fee paid, lightning and reserve included
    pub fee: Amount,
}

/// Kind of wallet transaction
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    /// Lightning in, ecash out
    Mint,
    /// Ecash in, lightning out
    Melt,
    /// Token created
    SendEcash,
    /// Token redeemed
    ReceiveEcash,
}

/// Status of a wallet transaction
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionStatus {
    /// Transaction completed
    Completed,
    /// Transaction pending
    Pending,
}

/// User facing history entry
#[derive(Debug, Clone, Hash, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    /// Wallet generated id, for display only
    pub id: String,
    /// Kind of transaction
    pub kind: TransactionKind,
    /// Mint Url
    pub mint_url: MintUrl,
    /// Amount moved
    pub amount: Amount,
    /// Fee paid
    pub fee: Amount,
    /// Optional memo
    pub memo: Option<String>,
    /// Seconds since unix epoch
    pub timestamp: u64,
    /// Status
    pub status: TransactionStatus,
}

impl Transaction {
    /// Create a completed [`Transaction`]
    pub fn new(
        kind: TransactionKind,
        mint_url: MintUrl,
        amount: Amount,
        fee: Amount,
        memo: Option<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            kind,
            mint_url,
            amount,
            fee,
            memo,
            timestamp: unix_time(),
            status: TransactionStatus::Completed,
        }
    }
}

/// Proof with wallet metadata
///
/// The store is keyed by the signature point `C`; two records with the same
/// `C` describe the same proof.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProofInfo {
    /// Proof
    pub proof: Proof,
    /// Mint Url
    pub mint_url: MintUrl,
    /// Proof State
    pub state: State,
    /// Unit
    pub unit: CurrencyUnit,
    /// Seconds since unix epoch the proof was stored
    pub created_at: u64,
    /// Reservation deadline, set while state is [`State::Reserved`]
    pub reserved_until: Option<u64>,
}

impl ProofInfo {
    /// Create new [`ProofInfo`]
    pub fn new(proof: Proof, mint_url: MintUrl, state: State, unit: CurrencyUnit) -> Self {
        Self {
            proof,
            mint_url,
            state,
            unit,
            created_at: unix_time(),
            reserved_until: None,
        }
    }

    /// The store key of this proof
    #[inline]
    pub fn c(&self) -> PublicKey {
        self.proof.c
    }

    /// Whether the proof can be selected by a new operation at `now`
    ///
    /// A reservation past its deadline no longer excludes the proof.
    pub fn is_available(&self, now: u64) -> bool {
        match self.state {
            State::Unspent => true,
            State::Reserved => self.reserved_until.map_or(false, |until| until <= now),
            _ => false,
        }
    }

    /// Check if the record matches the given filters
    pub fn matches_conditions(
        &self,
        mint_url: &Option<MintUrl>,
        unit: &Option<CurrencyUnit>,
        states: &Option<Vec<State>>,
    ) -> bool {
        if let Some(mint_url) = mint_url {
            if mint_url.ne(&self.mint_url) {
                return false;
            }
        }

        if let Some(unit) = unit {
            if unit.ne(&self.unit) {
                return false;
            }
        }

        if let Some(states) = states {
            if !states.contains(&self.state) {
                return false;
            }
        }

        true
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;
    use crate::nuts::{Id, SecretKey};
    use crate::secret::Secret;

    fn test_proof(amount: u64) -> Proof {
        Proof::new(
            Amount::from(amount),
            Id::from_str("009a1f293253e41e").unwrap(),
            Secret::generate(),
            SecretKey::generate().public_key(),
        )
    }

    #[test]
    fn test_proof_info_availability() {
        let mint_url = MintUrl::from_str("https://mint.example").unwrap();
        let now = unix_time();

        let info = ProofInfo::new(
            test_proof(4),
            mint_url.clone(),
            State::Unspent,
            CurrencyUnit::Sat,
        );
        assert!(info.is_available(now));

        let mut reserved = info.clone();
        reserved.state = State::Reserved;
        reserved.reserved_until = Some(now + 60);
        assert!(!reserved.is_available(now));

        // Expired reservation is selectable again
        reserved.reserved_until = Some(now.saturating_sub(1));
        assert!(reserved.is_available(now));

        let mut spent = info;
        spent.state = State::Spent;
        assert!(!spent.is_available(now));
    }

    #[test]
    fn test_matches_conditions() {
        let mint_url = MintUrl::from_str("https://mint.example").unwrap();
        let other_url = MintUrl::from_str("https://other.example").unwrap();

        let info = ProofInfo::new(
            test_proof(4),
            mint_url.clone(),
            State::Unspent,
            CurrencyUnit::Sat,
        );

        assert!(info.matches_conditions(&Some(mint_url.clone()), &None, &None));
        assert!(!info.matches_conditions(&Some(other_url), &None, &None));
        assert!(info.matches_conditions(&None, &None, &Some(vec![State::Unspent])));
        assert!(!info.matches_conditions(&None, &None, &Some(vec![State::Spent])));

        // Trailing slash trim makes the urls equal
        let trailing = MintUrl::from_str("https://mint.example/").unwrap();
        assert!(info.matches_conditions(&Some(trailing), &None, &None));
    }
}
