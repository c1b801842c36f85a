use tracing::instrument;

use crate::nuts::{Id, KeySetInfo, Keys};
use crate::{Error, Wallet};

impl Wallet {
    /// Get keys for mint keyset
    ///
    /// Selected keys from localstore if they are already known, otherwise
    /// queried from the mint and stored.
    #[instrument(skip(self))]
    pub async fn get_keyset_keys(&self, keyset_id: Id) -> Result<Keys, Error> {
        let keys = if let Some(keys) = self.localstore.get_keys(&keyset_id).await? {
            keys
        } else {
            let keyset = self.client().get_mint_keyset(keyset_id).await?;

            keyset.verify_id()?;

            self.localstore.add_keys(keyset.keys.clone()).await?;

            keyset.keys
        };

        Ok(keys)
    }

    /// Get all keysets of the mint, refreshing the local cache
    #[instrument(skip(self))]
    pub async fn get_mint_keysets(&self) -> Result<Vec<KeySetInfo>, Error> {
        let keysets = self.client().get_mint_keysets().await?;

        self.localstore
            .add_mint_keysets(self.mint_url.clone(), keysets.keysets.clone())
            .await?;

        Ok(keysets.keysets)
    }

    /// Active keyset of the mint for the wallet unit
    ///
    /// Keys for the keyset are fetched and cached as a side effect so a
    /// following blind call cannot miss them.
    #[instrument(skip(self))]
    pub async fn fetch_active_keyset(&self) -> Result<KeySetInfo, Error> {
        let keysets = self.get_mint_keysets().await?;

        let active = keysets
            .into_iter()
            .find(|k| k.active && k.unit == self.unit)
            .ok_or(Error::NoActiveKeyset)?;

        self.get_keyset_keys(active.id).await?;

        Ok(active)
    }
}
