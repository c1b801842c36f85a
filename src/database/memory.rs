//! Wallet in memory database

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{Error, WalletDatabase};
use crate::mint_url::MintUrl;
use crate::nuts::{CurrencyUnit, Id, KeySetInfo, Keys, MintInfo, PublicKey, State};
use crate::types::{MeltQuote, MintQuote, ProofInfo, Transaction};
use crate::util::unix_time;
use crate::Amount;

#[derive(Debug, Default)]
struct Tables {
    mints: HashMap<MintUrl, Option<MintInfo>>,
    mint_keysets: HashMap<MintUrl, Vec<KeySetInfo>>,
    keys: HashMap<Id, Keys>,
    mint_quotes: HashMap<String, MintQuote>,
    melt_quotes: HashMap<String, MeltQuote>,
    proofs: HashMap<PublicKey, ProofInfo>,
    counters: HashMap<String, u32>,
    transactions: Vec<Transaction>,
}

/// Wallet in Memory Database
///
/// Reference implementation of [`WalletDatabase`]. All tables live behind a
/// single lock so every trait method is atomic; in particular a reservation
/// holds the write lock from selection through state flip, which is what
/// keeps two reservations from handing out the same proof.
#[derive(Debug, Clone, Default)]
pub struct WalletMemoryDatabase {
    tables: Arc<RwLock<Tables>>,
}

impl WalletMemoryDatabase {
    /// Create new [`WalletMemoryDatabase`]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl WalletDatabase for WalletMemoryDatabase {
    async fn add_mint(&self, mint_url: MintUrl, mint_info: Option<MintInfo>) -> Result<(), Error> {
        self.tables.write().await.mints.insert(mint_url, mint_info);
        Ok(())
    }

    async fn get_mint(&self, mint_url: MintUrl) -> Result<Option<MintInfo>, Error> {
        Ok(self
            .tables
            .read()
            .await
            .mints
            .get(&mint_url)
            .cloned()
            .flatten())
    }

    async fn get_mints(&self) -> Result<HashMap<MintUrl, Option<MintInfo>>, Error> {
        Ok(self.tables.read().await.mints.clone())
    }

    async fn add_mint_keysets(
        &self,
        mint_url: MintUrl,
        keysets: Vec<KeySetInfo>,
    ) -> Result<(), Error> {
        let mut tables = self.tables.write().await;
        let known = tables.mint_keysets.entry(mint_url).or_default();

        for keyset in keysets {
            match known.iter_mut().find(|k| k.id == keyset.id) {
                Some(existing) => *existing = keyset,
                None => known.push(keyset),
            }
        }

        Ok(())
    }

    async fn get_mint_keysets(
        &self,
        mint_url: MintUrl,
    ) -> Result<Option<Vec<KeySetInfo>>, Error> {
        Ok(self.tables.read().await.mint_keysets.get(&mint_url).cloned())
    }

    async fn get_keyset_by_id(&self, keyset_id: &Id) -> Result<Option<KeySetInfo>, Error> {
        Ok(self
            .tables
            .read()
            .await
            .mint_keysets
            .values()
            .flatten()
            .find(|k| &k.id == keyset_id)
            .cloned())
    }

    async fn add_keys(&self, keys: Keys) -> Result<(), Error> {
        self.tables
            .write()
            .await
            .keys
            .insert(Id::from(&keys), keys);
        Ok(())
    }

    async fn get_keys(&self, id: &Id) -> Result<Option<Keys>, Error> {
        Ok(self.tables.read().await.keys.get(id).cloned())
    }

    async fn add_mint_quote(&self, quote: MintQuote) -> Result<(), Error> {
        self.tables
            .write()
            .await
            .mint_quotes
            .insert(quote.id.clone(), quote);
        Ok(())
    }

    async fn get_mint_quote(&self, quote_id: &str) -> Result<Option<MintQuote>, Error> {
        Ok(self.tables.read().await.mint_quotes.get(quote_id).cloned())
    }

    async fn remove_mint_quote(&self, quote_id: &str) -> Result<(), Error> {
        self.tables.write().await.mint_quotes.remove(quote_id);
        Ok(())
    }

    async fn add_melt_quote(&self, quote: MeltQuote) -> Result<(), Error> {
        self.tables
            .write()
            .await
            .melt_quotes
            .insert(quote.id.clone(), quote);
        Ok(())
    }

    async fn get_melt_quote(&self, quote_id: &str) -> Result<Option<MeltQuote>, Error> {
        Ok(self.tables.read().await.melt_quotes.get(quote_id).cloned())
    }

    async fn remove_melt_quote(&self, quote_id: &str) -> Result<(), Error> {
        self.tables.write().await.melt_quotes.remove(quote_id);
        Ok(())
    }

    async fn update_proofs(
        &self,
        added: Vec<ProofInfo>,
        removed_cs: Vec<PublicKey>,
    ) -> Result<(), Error> {
        let mut tables = self.tables.write().await;

        for info in added.into_iter() {
            match tables.proofs.get_mut(&info.c()) {
                Some(existing) => {
                    // Same C, same proof: merge metadata, revive on
                    // rediscovery, never spend by insertion
                    existing.mint_url = info.mint_url;
                    existing.proof.keyset_id = info.proof.keyset_id;

                    if existing.state == State::Spent && info.state == State::Unspent {
                        existing.state = State::Unspent;
                        existing.reserved_until = None;
                    }
                }
                None => {
                    tables.proofs.insert(info.c(), info);
                }
            }
        }

        for c in removed_cs.into_iter() {
            tables.proofs.remove(&c);
        }

        Ok(())
    }

    async fn get_proofs(
        &self,
        mint_url: Option<MintUrl>,
        unit: Option<CurrencyUnit>,
        states: Option<Vec<State>>,
    ) -> Result<Vec<ProofInfo>, Error> {
        Ok(self
            .tables
            .read()
            .await
            .proofs
            .values()
            .filter(|info| info.matches_conditions(&mint_url, &unit, &states))
            .cloned()
            .collect())
    }

    async fn reserve_proofs(
        &self,
        amount: Amount,
        mint_url: MintUrl,
        timeout: Duration,
    ) -> Result<Vec<ProofInfo>, Error> {
        let mut tables = self.tables.write().await;
        let now = unix_time();

        let mut candidates: Vec<(PublicKey, Amount)> = tables
            .proofs
            .values()
            .filter(|info| info.mint_url == mint_url && info.is_available(now))
            .map(|info| (info.c(), info.proof.amount))
            .collect();

        // Greedy largest first
        candidates.sort_by(|a, b| b.1.cmp(&a.1));

        let mut selected = Vec::new();
        let mut total = Amount::ZERO;

        for (c, proof_amount) in candidates {
            if total >= amount {
                break;
            }

            total = total
                .checked_add(proof_amount)
                .ok_or_else(|| Error::Database("amount overflow".to_string()))?;
            selected.push(c);
        }

        if total < amount {
            // Nothing was mutated, the whole reservation fails
            return Err(Error::InsufficientFunds);
        }

        let until = now + timeout.as_secs();
        let mut reserved = Vec::with_capacity(selected.len());

        for c in selected {
            let info = tables
                .proofs
                .get_mut(&c)
                .expect("selected proof is present");
            info.state = State::Reserved;
            info.reserved_until = Some(until);
            reserved.push(info.clone());
        }

        Ok(reserved)
    }

    async fn mark_proofs_spent(&self, cs: Vec<PublicKey>) -> Result<(), Error> {
        let mut tables = self.tables.write().await;

        for c in cs.into_iter() {
            if let Some(info) = tables.proofs.get_mut(&c) {
                info.state = State::Spent;
                info.reserved_until = None;
            }
        }

        Ok(())
    }

    async fn unreserve_proofs(&self, cs: Vec<PublicKey>) -> Result<(), Error> {
        let mut tables = self.tables.write().await;

        for c in cs.into_iter() {
            if let Some(info) = tables.proofs.get_mut(&c) {
                if info.state == State::Reserved {
                    info.state = State::Unspent;
                    info.reserved_until = None;
                }
            }
        }

        Ok(())
    }

    async fn remove_proofs(&self, cs: Vec<PublicKey>) -> Result<(), Error> {
        let mut tables = self.tables.write().await;

        for c in cs.into_iter() {
            tables.proofs.remove(&c);
        }

        Ok(())
    }

    async fn increment_counter(&self, scope: &str, count: u32) -> Result<u32, Error> {
        let mut tables = self.tables.write().await;
        let counter = tables.counters.entry(scope.to_string()).or_insert(0);
        *counter += count;
        Ok(*counter)
    }

    async fn get_counter(&self, scope: &str) -> Result<Option<u32>, Error> {
        Ok(self.tables.read().await.counters.get(scope).copied())
    }

    async fn add_transaction(&self, transaction: Transaction) -> Result<(), Error> {
        self.tables.write().await.transactions.push(transaction);
        Ok(())
    }

    async fn get_transactions(
        &self,
        mint_url: Option<MintUrl>,
    ) -> Result<Vec<Transaction>, Error> {
        Ok(self
            .tables
            .read()
            .await
            .transactions
            .iter()
            .filter(|tx| mint_url.as_ref().map_or(true, |url| &tx.mint_url == url))
            .cloned()
            .collect())
    }
}
