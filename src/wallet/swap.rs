//! Shared swap engine
//!
//! Send and receive both run the same machine: reserve (send only), blind,
//! post to the mint, unblind, commit. Any failure between reservation and
//! commit runs the rollback branch, which returns the reserved inputs to
//! unspent and propagates the original error.

use std::future::Future;

use crate::dhke::construct_proofs;
use crate::nuts::{Keys, PreMintSecrets, Proofs, PublicKey, SwapRequest};
use crate::{Error, Wallet};

impl Wallet {
    /// Run a mint call with reservation rollback
    ///
    /// On error the reserved proofs are unreserved best-effort; a rollback
    /// failure is logged and never masks the original error.
    pub(crate) async fn try_proof_operation<T, F>(
        &self,
        reserved_cs: &[PublicKey],
        operation: F,
    ) -> Result<T, Error>
    where
        F: Future<Output = Result<T, Error>> + Send,
        T: Send,
    {
        match operation.await {
            Ok(value) => Ok(value),
            Err(err) => {
                tracing::warn!(
                    "Operation failed, reverting {} proofs to unspent: {}",
                    reserved_cs.len(),
                    err
                );

                if let Err(rollback_err) =
                    self.localstore.unreserve_proofs(reserved_cs.to_vec()).await
                {
                    tracing::error!("Reservation rollback failed: {}", rollback_err);
                }

                Err(err)
            }
        }
    }

    /// Post a swap and unblind the full set of signatures
    ///
    /// The mint must sign every output of a swap; the resulting proofs come
    /// back in planning order so callers can split token from change by
    /// position.
    pub(crate) async fn run_swap(
        &self,
        inputs: Proofs,
        premint: &PreMintSecrets,
        keys: &Keys,
    ) -> Result<Proofs, Error> {
        let request = SwapRequest::new(inputs, premint.blinded_messages());

        let response = self.client().post_swap(request).await?;

        let proofs = construct_proofs(response.signatures, &premint.secrets, keys)?;

        if proofs.len() != premint.len() {
            return Err(Error::Protocol(format!(
                "mint signed {} of {} swap outputs",
                proofs.len(),
                premint.len()
            )));
        }

        Ok(proofs)
    }
}
