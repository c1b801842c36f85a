use tracing::instrument;

use super::RESERVATION_TIMEOUT;
use crate::dhke::hash_to_curve;
use crate::nuts::{CheckStateRequest, ProofState, Proofs, PublicKey, State};
use crate::types::ProofInfo;
use crate::{Amount, Error, Wallet};

impl Wallet {
    /// Get unspent proofs for the wallet mint
    #[instrument(skip(self))]
    pub async fn get_unspent_proofs(&self) -> Result<Proofs, Error> {
        Ok(self
            .localstore
            .get_proofs(
                Some(self.mint_url.clone()),
                Some(self.unit.clone()),
                Some(vec![State::Unspent]),
            )
            .await?
            .into_iter()
            .map(|p| p.proof)
            .collect())
    }

    /// Get reserved proofs for the wallet mint
    #[instrument(skip(self))]
    pub async fn get_reserved_proofs(&self) -> Result<Proofs, Error> {
        Ok(self
            .localstore
            .get_proofs(
                Some(self.mint_url.clone()),
                Some(self.unit.clone()),
                Some(vec![State::Reserved]),
            )
            .await?
            .into_iter()
            .map(|p| p.proof)
            .collect())
    }

    /// Total unspent balance of the wallet
    #[instrument(skip(self))]
    pub async fn total_balance(&self) -> Result<Amount, Error> {
        Amount::try_sum(self.get_unspent_proofs().await?.iter().map(|p| p.amount))
            .map_err(Into::into)
    }

    /// Reserve proofs covering `amount` for an in-flight operation
    #[instrument(skip(self))]
    pub(crate) async fn reserve_proofs(&self, amount: Amount) -> Result<Vec<ProofInfo>, Error> {
        Ok(self
            .localstore
            .reserve_proofs(amount, self.mint_url.clone(), RESERVATION_TIMEOUT)
            .await?)
    }

    /// Return proofs to unspent allowing them to be selected again
    #[instrument(skip(self))]
    pub async fn unreserve_proofs(&self, cs: Vec<PublicKey>) -> Result<(), Error> {
        Ok(self.localstore.unreserve_proofs(cs).await?)
    }

    /// NUT-07 check the state of proofs with the mint
    #[instrument(skip(self, proofs))]
    pub async fn check_proofs_spent(&self, proofs: &Proofs) -> Result<Vec<ProofState>, Error> {
        let ys = proofs
            .iter()
            // Y for the secret
            .map(|p| hash_to_curve(p.secret.as_bytes()))
            .collect::<Result<Vec<PublicKey>, _>>()?;

        let response = self
            .client()
            .post_check_state(CheckStateRequest { ys })
            .await?;

        Ok(response.states)
    }
}
