//! Storage backend contract
//!
//! Four logical tables back the wallet: proofs keyed by the signature point
//! `C`, mints keyed by base url, quotes keyed by quote id and advisory
//! derivation counters keyed by scope name. Implementations must make each
//! method atomic with respect to the others on the same store.

use std::collections::HashMap;
use std::fmt::Debug;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

mod memory;

pub use self::memory::WalletMemoryDatabase;
use crate::mint_url::MintUrl;
use crate::nuts::{CurrencyUnit, Id, KeySetInfo, Keys, MintInfo, PublicKey, State};
use crate::types::{MeltQuote, MintQuote, ProofInfo, Transaction};
use crate::Amount;

/// Database Error
#[derive(Debug, Error)]
pub enum Error {
    /// Coverage for a reservation is not achievable
    #[error("Insufficient funds")]
    InsufficientFunds,
    /// Backend failure
    #[error("`{0}`")]
    Database(String),
}

impl From<Error> for crate::Error {
    fn from(err: Error) -> Self {
        match err {
            Error::InsufficientFunds => Self::InsufficientFunds,
            Error::Database(msg) => Self::Database(msg),
        }
    }
}

/// Wallet storage backend
#[async_trait]
pub trait WalletDatabase: Debug + Send + Sync {
    /// Add mint to storage
    async fn add_mint(&self, mint_url: MintUrl, mint_info: Option<MintInfo>) -> Result<(), Error>;
    /// Get mint from storage
    async fn get_mint(&self, mint_url: MintUrl) -> Result<Option<MintInfo>, Error>;
    /// Get all mints from storage
    async fn get_mints(&self) -> Result<HashMap<MintUrl, Option<MintInfo>>, Error>;

    /// Add mint keysets to storage
    async fn add_mint_keysets(
        &self,
        mint_url: MintUrl,
        keysets: Vec<KeySetInfo>,
    ) -> Result<(), Error>;
    /// Get mint keysets from storage
    async fn get_mint_keysets(&self, mint_url: MintUrl)
        -> Result<Option<Vec<KeySetInfo>>, Error>;
    /// Get keyset info by id
    async fn get_keyset_by_id(&self, keyset_id: &Id) -> Result<Option<KeySetInfo>, Error>;

    /// Add [`Keys`] to storage
    async fn add_keys(&self, keys: Keys) -> Result<(), Error>;
    /// Get [`Keys`] from storage
    async fn get_keys(&self, id: &Id) -> Result<Option<Keys>, Error>;

    /// Add mint quote to storage
    async fn add_mint_quote(&self, quote: MintQuote) -> Result<(), Error>;
    /// Get mint quote from storage
    async fn get_mint_quote(&self, quote_id: &str) -> Result<Option<MintQuote>, Error>;
    /// Remove mint quote from storage
    async fn remove_mint_quote(&self, quote_id: &str) -> Result<(), Error>;

    /// Add melt quote to storage
    async fn add_melt_quote(&self, quote: MeltQuote) -> Result<(), Error>;
    /// Get melt quote from storage
    async fn get_melt_quote(&self, quote_id: &str) -> Result<Option<MeltQuote>, Error>;
    /// Remove melt quote from storage
    async fn remove_melt_quote(&self, quote_id: &str) -> Result<(), Error>;

    /// Upsert proofs by `C` and remove the given `C`s
    ///
    /// Insertion of an already known proof merges metadata: mint url and
    /// keyset id follow the incoming record, while stored state only ever
    /// moves `Spent -> Unspent` on an incoming unspent record. Insertion can
    /// never mark a stored proof spent.
    async fn update_proofs(
        &self,
        added: Vec<ProofInfo>,
        removed_cs: Vec<PublicKey>,
    ) -> Result<(), Error>;

    /// Get proofs matching the filters
    async fn get_proofs(
        &self,
        mint_url: Option<MintUrl>,
        unit: Option<CurrencyUnit>,
        states: Option<Vec<State>>,
    ) -> Result<Vec<ProofInfo>, Error>;

    /// Atomically reserve proofs covering `amount` for `mint_url`
    ///
    /// Selection is greedy largest-first over available proofs. Either a
    /// covering set is reserved with `reserved_until = now + timeout` and
    /// returned, or nothing is mutated and
    /// [`Error::InsufficientFunds`] is returned. Two concurrent calls never
    /// receive the same proof.
    async fn reserve_proofs(
        &self,
        amount: Amount,
        mint_url: MintUrl,
        timeout: Duration,
    ) -> Result<Vec<ProofInfo>, Error>;

    /// Transition proofs to spent
    async fn mark_proofs_spent(&self, cs: Vec<PublicKey>) -> Result<(), Error>;
    /// Transition reserved proofs back to unspent
    async fn unreserve_proofs(&self, cs: Vec<PublicKey>) -> Result<(), Error>;
    /// Hard remove proofs
    async fn remove_proofs(&self, cs: Vec<PublicKey>) -> Result<(), Error>;

    /// Increment the advisory derivation counter for a scope, returning the
    /// new value
    async fn increment_counter(&self, scope: &str, count: u32) -> Result<u32, Error>;
    /// Get the advisory derivation counter for a scope
    async fn get_counter(&self, scope: &str) -> Result<Option<u32>, Error>;

    /// Append a history entry
    async fn add_transaction(&self, transaction: Transaction) -> Result<(), Error>;
    /// Get history entries, newest last
    async fn get_transactions(&self, mint_url: Option<MintUrl>)
        -> Result<Vec<Transaction>, Error>;
}
