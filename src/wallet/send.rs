//! Send flow: swap stored proofs into a portable token

use tracing::instrument;

use crate::nuts::{PreMintSecrets, ProofsMethods, PublicKey, State, TokenV3};
use crate::types::{ProofInfo, Transaction, TransactionKind};
use crate::{Amount, Error, Wallet};

impl Wallet {
    /// Create a token for `amount`
    ///
    /// Swaps reserved inputs at the mint for exact token denominations plus
    /// change. The token proofs leave the wallet inside the returned
    /// [`TokenV3`]; only the change is kept in the store.
    #[instrument(skip(self))]
    pub async fn send(&self, amount: Amount, memo: Option<String>) -> Result<TokenV3, Error> {
        let active_keyset = self.fetch_active_keyset().await?;
        let keys = self.get_keyset_keys(active_keyset.id).await?;

        let token_amounts = amount.split();

        // The input count is unknown before reservation; assume one more
        // input than token parts to cover the reservation
        let estimated_fee = self
            .get_keyset_count_fee(&active_keyset.id, token_amounts.len() as u64 + 1)
            .await?;

        let to_reserve = amount
            .checked_add(estimated_fee)
            .ok_or(Error::AmountOverflow)?;

        let reserved = self.reserve_proofs(to_reserve).await?;
        let reserved_cs: Vec<PublicKey> = reserved.iter().map(|p| p.c()).collect();

        let inputs: Vec<_> = reserved.into_iter().map(|p| p.proof).collect();
        let inputs_total = inputs.total_amount()?;

        let (premint, token_part_count, actual_fee) = match self
            .plan_send_outputs(&inputs, amount, token_amounts, &keys, active_keyset.id)
            .await
        {
            Ok(plan) => plan,
            Err(err) => {
                // Planning failed before any mint contact; release the inputs
                self.unreserve_proofs(reserved_cs).await?;
                return Err(err);
            }
        };

        tracing::debug!(
            "Sending {} with {} inputs totaling {}, fee {}",
            amount,
            inputs.len(),
            inputs_total,
            actual_fee
        );

        let proofs = self
            .try_proof_operation(&reserved_cs, self.run_swap(inputs, &premint, &keys))
            .await?;

        let change_proofs = proofs[token_part_count..].to_vec();
        let token_proofs = proofs[..token_part_count].to_vec();

        let change_infos = change_proofs
            .iter()
            .map(|proof| {
                ProofInfo::new(
                    proof.clone(),
                    self.mint_url.clone(),
                    State::Unspent,
                    self.unit.clone(),
                )
            })
            .collect::<Vec<ProofInfo>>();

        self.localstore.update_proofs(change_infos, vec![]).await?;
        self.localstore.mark_proofs_spent(reserved_cs).await?;

        self.localstore
            .add_transaction(Transaction::new(
                TransactionKind::SendEcash,
                self.mint_url.clone(),
                amount,
                actual_fee,
                memo.clone(),
            ))
            .await?;

        self.notify_proofs_updated();
        self.notify_history_updated();

        TokenV3::new(
            self.mint_url.clone(),
            token_proofs,
            memo,
            Some(self.unit.clone()),
        )
    }

    /// Plan token and change outputs for the reserved inputs
    ///
    /// The swap fee is recomputed from the actual reserved input set; the
    /// estimate used for reservation only had to get coverage right. Token
    /// parts come first so unblinded proofs split by position.
    async fn plan_send_outputs(
        &self,
        inputs: &crate::nuts::Proofs,
        amount: Amount,
        token_amounts: Vec<Amount>,
        keys: &crate::nuts::Keys,
        keyset_id: crate::nuts::Id,
    ) -> Result<(PreMintSecrets, usize, Amount), Error> {
        let inputs_total = inputs.total_amount()?;
        let actual_fee = self.get_proofs_fee(inputs).await?;

        let change_amount = inputs_total
            .checked_sub(amount)
            .and_then(|rest| rest.checked_sub(actual_fee))
            .ok_or(Error::InsufficientFunds)?;

        let token_part_count = token_amounts.len();
        let mut output_amounts = token_amounts;
        output_amounts.extend(change_amount.split());

        let premint = PreMintSecrets::from_amounts(keyset_id, output_amounts, keys)?;

        Ok((premint, token_part_count, actual_fee))
    }
}
