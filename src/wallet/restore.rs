//! Restore scanner
//!
//! Rebuilds the proof set from the wallet seed alone. For every keyset the
//! scanner walks derivation indices in fixed batches, asks the mint which
//! of the derived blinded points it has ever signed, unblinds the echoes
//! and keeps whatever the mint still reports as unspent.

use tracing::instrument;

use crate::derivation::restore_premint_secrets;
use crate::dhke::unblind_message;
use crate::nuts::{
    BlindedMessage, KeySetInfo, Proof, Proofs, ProofsMethods, RestoreRequest, State,
};
use crate::types::ProofInfo;
use crate::{Amount, Error, Wallet};

/// Derivation indices per restore batch
const RESTORE_BATCH_SIZE: u32 = 20;

/// Consecutive empty batches before a keyset sweep stops
const RESTORE_GAP_LIMIT: u32 = 3;

/// Highest batch start index scanned per keyset
const RESTORE_INDEX_CAP: u32 = 100;

/// Denominations stamped onto every derived blinded point
///
/// 1..=8192 covers the keysets of current mint implementations; the exact
/// set is not normative.
const RESTORE_AMOUNTS: [u64; 14] = [
    1, 2, 4, 8, 16, 32, 64, 128, 256, 512, 1024, 2048, 4096, 8192,
];

impl Wallet {
    /// Restore proofs for this wallet's seed from the mint
    ///
    /// Returns the total unspent amount recovered. Running the scan twice
    /// produces the same proof set; everything is keyed by the signature
    /// point `C` and matching is deterministic.
    #[instrument(skip(self))]
    pub async fn restore(&self) -> Result<Amount, Error> {
        self.ensure_mint().await?;

        let keysets = self.get_mint_keysets().await?;

        let mut restored_value = Amount::ZERO;

        for keyset in keysets {
            if keyset.unit != self.unit {
                continue;
            }

            restored_value += self.restore_keyset(&keyset).await?;
        }

        if restored_value > Amount::ZERO {
            self.notify_proofs_updated();
        }

        Ok(restored_value)
    }

    async fn restore_keyset(&self, keyset: &KeySetInfo) -> Result<Amount, Error> {
        let keys = self.get_keyset_keys(keyset.id).await?;

        let mut restored_value = Amount::ZERO;
        let mut empty_batches = 0u32;
        let mut start_index = 0u32;

        while empty_batches < RESTORE_GAP_LIMIT && start_index <= RESTORE_INDEX_CAP {
            let premint =
                restore_premint_secrets(self.master(), keyset.id, start_index, RESTORE_BATCH_SIZE)?;

            tracing::debug!(
                "Restoring indices {}-{} for keyset {}",
                start_index,
                start_index + RESTORE_BATCH_SIZE - 1,
                keyset.id
            );

            // Every derived point is submitted once per candidate
            // denomination; the mint matches on the point alone
            let outputs: Vec<BlindedMessage> = premint
                .secrets
                .iter()
                .flat_map(|pm| {
                    RESTORE_AMOUNTS.iter().map(|amount| {
                        BlindedMessage::new(
                            Amount::from(*amount),
                            keyset.id,
                            pm.blinded_message.blinded_secret,
                        )
                    })
                })
                .collect();

            let response = self.client().post_restore(RestoreRequest { outputs }).await?;

            if response.signatures.is_empty() {
                empty_batches += 1;
                start_index += RESTORE_BATCH_SIZE;
                continue;
            }

            if response.outputs.len() != response.signatures.len() {
                return Err(Error::Protocol(format!(
                    "restore echoed {} outputs for {} signatures",
                    response.outputs.len(),
                    response.signatures.len()
                )));
            }

            let proofs = self.match_restored_signatures(keyset, &keys, &premint, &response)?;

            // A signed batch resets the gap even when the proofs turn out
            // to be spent
            empty_batches = 0;

            match self.check_proofs_spent(&proofs).await {
                Ok(states) => {
                    let unspent_proofs: Proofs = proofs
                        .into_iter()
                        .zip(states)
                        .filter(|(_, state)| state.state != State::Spent)
                        .map(|(proof, _)| proof)
                        .collect();

                    restored_value += unspent_proofs.total_amount()?;

                    tracing::debug!(
                        "Restored {} unspent proofs for keyset {}",
                        unspent_proofs.len(),
                        keyset.id
                    );

                    let proof_infos = unspent_proofs
                        .into_iter()
                        .map(|proof| {
                            ProofInfo::new(
                                proof,
                                self.mint_url.clone(),
                                State::Unspent,
                                keyset.unit.clone(),
                            )
                        })
                        .collect::<Vec<ProofInfo>>();

                    self.localstore.update_proofs(proof_infos, vec![]).await?;

                    // Advisory: future derivations start past the swept range
                    self.localstore
                        .increment_counter(&keyset.id.to_string(), RESTORE_BATCH_SIZE)
                        .await?;
                }
                Err(err) => {
                    // Without a state check the batch could revive spent
                    // proofs, so it is discarded wholesale
                    tracing::warn!(
                        "Proof state check failed, discarding restore batch {}-{}: {}",
                        start_index,
                        start_index + RESTORE_BATCH_SIZE - 1,
                        err
                    );
                }
            }

            start_index += RESTORE_BATCH_SIZE;
        }

        Ok(restored_value)
    }

    /// Unblind restore echoes against the derived batch
    ///
    /// Signatures are matched to derivation indices in ascending index
    /// order and each index is consumed by its first match, which makes
    /// re-scans of the same seed produce identical proofs.
    fn match_restored_signatures(
        &self,
        keyset: &KeySetInfo,
        keys: &crate::nuts::Keys,
        premint: &crate::nuts::PreMintSecrets,
        response: &crate::nuts::RestoreResponse,
    ) -> Result<Proofs, Error> {
        let mut proofs = Proofs::new();

        for (output, signature) in response.outputs.iter().zip(response.signatures.iter()) {
            let matched = premint
                .secrets
                .iter()
                .find(|pm| pm.blinded_message.blinded_secret == output.blinded_secret);

            let pre_mint = match matched {
                Some(pre_mint) => pre_mint,
                None => {
                    tracing::warn!("Mint echoed an output this batch never derived, skipping");
                    continue;
                }
            };

            let key = keys
                .amount_key(signature.amount)
                .ok_or(Error::AmountKey)?;

            let c = unblind_message(&signature.c, &pre_mint.r, &key)?;

            proofs.push(Proof::new(
                signature.amount,
                keyset.id,
                pre_mint.secret.clone(),
                c,
            ));
        }

        Ok(proofs)
    }
}
