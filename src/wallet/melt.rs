//! Melt flow: ecash in, lightning out

use tracing::instrument;

use crate::dhke::construct_change_proofs;
use crate::nuts::{
    MeltBolt11Request, MeltQuoteBolt11Request, PreMintSecrets, ProofsMethods, PublicKey, State,
};
use crate::types::{MeltQuote, Melted, ProofInfo, QuoteState, Transaction, TransactionKind};
use crate::util::unix_time;
use crate::{Amount, Error, Wallet};

/// Sats reserved on top of amount and fee reserve
///
/// Covers mints that round the lightning fee up against the wallet; the
/// excess comes back as change.
const MELT_SAFETY_BUFFER: u64 = 3;

impl Wallet {
    /// Request a melt quote for a bolt11 invoice
    #[instrument(skip(self, request))]
    pub async fn melt_quote(&self, request: String) -> Result<MeltQuote, Error> {
        self.ensure_mint().await?;

        let quote_request = MeltQuoteBolt11Request {
            request: request.clone(),
            unit: self.unit.clone(),
        };

        let quote_res = self.client().post_melt_quote(quote_request).await?;

        let quote = MeltQuote {
            id: quote_res.quote,
            mint_url: self.mint_url.clone(),
            amount: quote_res.amount,
            unit: self.unit.clone(),
            request,
            fee_reserve: quote_res.fee_reserve,
            state: QuoteState::Pending,
            expiry: quote_res.expiry.unwrap_or(0),
            payment_preimage: None,
        };

        self.localstore.add_melt_quote(quote.clone()).await?;
        self.notify_quote_updated(&quote.id);

        Ok(quote)
    }

    /// Execute a melt quote
    ///
    /// Reserves inputs covering amount, fee reserve and a small safety
    /// buffer, asks the mint to pay the invoice and books whatever change
    /// signatures come back. Any failure before the mint confirms unreserves
    /// the inputs.
    #[instrument(skip(self))]
    pub async fn melt(&self, quote_id: &str) -> Result<Melted, Error> {
        let quote_info = self
            .localstore
            .get_melt_quote(quote_id)
            .await?
            .ok_or_else(|| Error::InvalidQuote(format!("unknown quote {quote_id}")))?;

        if quote_info.expiry != 0 && quote_info.expiry < unix_time() {
            return Err(Error::InvalidQuote(format!("quote {quote_id} expired")));
        }

        let active_keyset = self.fetch_active_keyset().await?;
        let keys = self.get_keyset_keys(active_keyset.id).await?;

        let needed = quote_info
            .amount
            .checked_add(quote_info.fee_reserve)
            .and_then(|a| a.checked_add(Amount::from(MELT_SAFETY_BUFFER)))
            .ok_or(Error::AmountOverflow)?;

        let reserved = self.reserve_proofs(needed).await?;
        let reserved_cs: Vec<PublicKey> = reserved.iter().map(|p| p.c()).collect();

        let inputs: Vec<_> = reserved.into_iter().map(|p| p.proof).collect();
        let inputs_total = inputs.total_amount()?;

        // Change covers the whole surplus over the invoice amount; the mint
        // assigns denominations, so the outputs are blank
        let surplus = inputs_total
            .checked_sub(quote_info.amount)
            .ok_or(Error::InsufficientFunds)?;

        let melt_response = self
            .try_proof_operation(&reserved_cs, async {
                let premint = PreMintSecrets::blank(active_keyset.id, surplus)?;

                let request = MeltBolt11Request {
                    quote: quote_id.to_string(),
                    inputs: inputs.clone(),
                    outputs: Some(premint.blinded_messages()),
                };

                let response = self.client().post_melt(request).await?;

                if !response.paid {
                    return Err(Error::PaymentFailed);
                }

                Ok((premint, response))
            })
            .await?;

        let (premint, response) = melt_response;

        let change_proofs = match response.change {
            Some(change) => construct_change_proofs(change, &premint.secrets, &keys)?,
            None => Vec::new(),
        };

        let change_total = change_proofs.total_amount()?;

        tracing::debug!(
            "Melt of {} settled, {} returned as change",
            quote_info.amount,
            change_total
        );

        let change_infos = change_proofs
            .iter()
            .map(|proof| {
                ProofInfo::new(
                    proof.clone(),
                    self.mint_url.clone(),
                    State::Unspent,
                    quote_info.unit.clone(),
                )
            })
            .collect::<Vec<ProofInfo>>();

        self.localstore.update_proofs(change_infos, vec![]).await?;
        self.localstore.mark_proofs_spent(reserved_cs).await?;
        self.localstore.remove_melt_quote(&quote_info.id).await?;

        let fee = inputs_total - change_total - quote_info.amount;

        self.localstore
            .add_transaction(Transaction::new(
                TransactionKind::Melt,
                self.mint_url.clone(),
                quote_info.amount,
                fee,
                None,
            ))
            .await?;

        self.notify_proofs_updated();
        self.notify_quote_updated(quote_id);
        self.notify_history_updated();

        Ok(Melted {
            paid: true,
            preimage: response.payment_preimage,
            change: Some(change_proofs),
            fee,
        })
    }
}
