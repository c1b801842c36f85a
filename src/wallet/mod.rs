//! Wallet
//!
//! High level cashu wallet for a single mint and unit. Every flow is a
//! saga: reserve inputs from the store, talk to the mint, then commit or
//! roll the reservation back. Observers follow along on the event bus.

use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;
use tracing::instrument;

use crate::database::WalletDatabase;
use crate::derivation::DerivationNode;
use crate::error::Error;
use crate::fees::calculate_fee;
use crate::mint_url::MintUrl;
use crate::nuts::{CurrencyUnit, Id, MintInfo, Proofs};
use crate::Amount;

pub mod client;
mod events;
mod keysets;
mod melt;
mod mint;
mod proofs;
mod receive;
mod restore;
mod send;
mod swap;

pub use client::{HttpClient, MintConnector};
pub use events::{EventBus, WalletEvent};

/// How long a reservation excludes proofs from other operations
///
/// Matches the HTTP timeout so an abandoned operation cannot pin funds for
/// longer than its slowest possible request.
pub const RESERVATION_TIMEOUT: Duration = Duration::from_secs(120);

/// Cashu Wallet
///
/// A [`Wallet`] is for a single mint and single unit.
#[derive(Debug, Clone)]
pub struct Wallet {
    /// Mint Url
    pub mint_url: MintUrl,
    /// Unit
    pub unit: CurrencyUnit,
    /// Storage backend
    pub localstore: Arc<dyn WalletDatabase>,
    client: Arc<dyn MintConnector>,
    master: DerivationNode,
    events: EventBus,
}

impl Wallet {
    /// Create new [`Wallet`]
    ///
    /// The seed is the 64 byte output of the user's mnemonic; the wallet
    /// holds only the derived master node.
    pub fn new(
        mint_url: &str,
        unit: CurrencyUnit,
        localstore: Arc<dyn WalletDatabase>,
        seed: &[u8],
    ) -> Result<Self, Error> {
        let mint_url = MintUrl::from_str(mint_url)?;

        Ok(Self {
            client: Arc::new(HttpClient::new(mint_url.clone())),
            mint_url,
            unit,
            localstore,
            master: DerivationNode::master(seed),
            events: EventBus::new(),
        })
    }

    /// Change the mint connector
    pub fn set_client(&mut self, client: Arc<dyn MintConnector>) {
        self.client = client;
    }

    /// Connector used to reach the mint
    pub(crate) fn client(&self) -> &Arc<dyn MintConnector> {
        &self.client
    }

    /// Master node of the backup derivation tree
    pub(crate) fn master(&self) -> &DerivationNode {
        &self.master
    }

    /// Subscribe to wallet events
    pub fn subscribe(&self) -> broadcast::Receiver<WalletEvent> {
        self.events.subscribe()
    }

    pub(crate) fn notify_proofs_updated(&self) {
        self.events.publish(WalletEvent::ProofsUpdated {
            mint_url: self.mint_url.clone(),
        });
    }

    pub(crate) fn notify_quote_updated(&self, quote_id: &str) {
        self.events.publish(WalletEvent::QuoteUpdated {
            quote_id: quote_id.to_string(),
        });
    }

    pub(crate) fn notify_history_updated(&self) {
        self.events.publish(WalletEvent::HistoryUpdated);
    }

    /// Query the mint for current info, caching the record
    #[instrument(skip(self))]
    pub async fn get_mint_info(&self) -> Result<Option<MintInfo>, Error> {
        let mint_info = match self.client.get_mint_info().await {
            Ok(mint_info) => Some(mint_info),
            Err(err) => {
                tracing::warn!("Could not get mint info {}", err);
                None
            }
        };

        self.localstore
            .add_mint(self.mint_url.clone(), mint_info.clone())
            .await?;

        tracing::trace!("Mint info updated for {}", self.mint_url);

        Ok(mint_info)
    }

    /// Ensure a record for the wallet's mint exists
    pub(crate) async fn ensure_mint(&self) -> Result<(), Error> {
        let mints = self.localstore.get_mints().await?;
        if mints.contains_key(&self.mint_url) {
            return Ok(());
        }

        match self.client.get_mint_info().await {
            Ok(info) => {
                self.localstore
                    .add_mint(self.mint_url.clone(), Some(info))
                    .await?;
                Ok(())
            }
            Err(err) => {
                tracing::error!("No record for mint {}: {}", self.mint_url, err);
                Err(Error::MintNotFound)
            }
        }
    }

    /// Fee required for a proof set
    #[instrument(skip_all)]
    pub async fn get_proofs_fee(&self, proofs: &Proofs) -> Result<Amount, Error> {
        let mut proofs_per_keyset = HashMap::new();
        let mut fee_per_keyset = HashMap::new();

        for proof in proofs {
            if let std::collections::hash_map::Entry::Vacant(e) =
                fee_per_keyset.entry(proof.keyset_id)
            {
                let mint_keyset_info = self
                    .localstore
                    .get_keyset_by_id(&proof.keyset_id)
                    .await?
                    .ok_or(Error::KeysetUnknown(proof.keyset_id))?;
                e.insert(mint_keyset_info.input_fee_ppk);
            }

            proofs_per_keyset
                .entry(proof.keyset_id)
                .and_modify(|count| *count += 1)
                .or_insert(1);
        }

        calculate_fee(&proofs_per_keyset, &fee_per_keyset)
    }

    /// Get fee for a count of inputs from one keyset
    #[instrument(skip(self))]
    pub async fn get_keyset_count_fee(&self, keyset_id: &Id, count: u64) -> Result<Amount, Error> {
        let input_fee_ppk = self
            .localstore
            .get_keyset_by_id(keyset_id)
            .await?
            .ok_or(Error::KeysetUnknown(*keyset_id))?
            .input_fee_ppk;

        let fee = (input_fee_ppk * count + 999) / 1000;

        Ok(Amount::from(fee))
    }

    /// History entries for this mint, newest last
    #[instrument(skip(self))]
    pub async fn transactions(&self) -> Result<Vec<crate::types::Transaction>, Error> {
        Ok(self
            .localstore
            .get_transactions(Some(self.mint_url.clone()))
            .await?)
    }
}
