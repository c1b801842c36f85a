//! Receive flow: redeem a token into stored proofs

use std::str::FromStr;

use tracing::instrument;

use crate::nuts::{PreMintSecrets, ProofsMethods, State, TokenV3};
use crate::types::{ProofInfo, Transaction, TransactionKind};
use crate::{Amount, Error, Wallet};

/// Minimum fee assumed when redeeming a token
///
/// Guards against a mint rejecting a swap whose outputs leave no room for
/// its input fee.
const RECEIVE_FEE_FLOOR: u64 = 1;

impl Wallet {
    /// Redeem an encoded token
    ///
    /// The token's proofs are swapped for fresh ones bound to this wallet's
    /// secrets. The consumed token proofs are never stored.
    #[instrument(skip_all)]
    pub async fn receive(&self, encoded_token: &str) -> Result<Amount, Error> {
        let token = TokenV3::from_str(encoded_token)?;

        if token.mint_url()? != self.mint_url {
            return Err(Error::IncorrectMint);
        }

        if let Some(unit) = token.unit() {
            if unit != &self.unit {
                return Err(Error::UnsupportedUnit);
            }
        }

        let proofs = token.proofs();
        let proofs_value = proofs.total_amount()?;

        // Refresh keyset infos so fees for the token's keysets are known
        let active_keyset = self.fetch_active_keyset().await?;
        let keys = self.get_keyset_keys(active_keyset.id).await?;

        let fee = self
            .get_proofs_fee(&proofs)
            .await?
            .max(Amount::from(RECEIVE_FEE_FLOOR));

        let receive_amount = proofs_value
            .checked_sub(fee)
            .filter(|amount| *amount > Amount::ZERO)
            .ok_or(Error::InsufficientFunds)?;

        let premint = PreMintSecrets::random(active_keyset.id, receive_amount, &keys)?;

        let recv_proofs = self.run_swap(proofs, &premint, &keys).await?;

        let total_amount = recv_proofs.total_amount()?;

        let recv_infos = recv_proofs
            .into_iter()
            .map(|proof| {
                ProofInfo::new(
                    proof,
                    self.mint_url.clone(),
                    State::Unspent,
                    self.unit.clone(),
                )
            })
            .collect::<Vec<ProofInfo>>();

        self.localstore.update_proofs(recv_infos, vec![]).await?;

        self.localstore
            .add_transaction(Transaction::new(
                TransactionKind::ReceiveEcash,
                self.mint_url.clone(),
                total_amount,
                proofs_value - total_amount,
                token.memo().clone(),
            ))
            .await?;

        self.notify_proofs_updated();
        self.notify_history_updated();

        Ok(total_amount)
    }
}
