//! Mint flow: lightning in, ecash out

use std::time::Duration;

use tracing::instrument;

use crate::dhke::construct_proofs;
use crate::nuts::{
    MintBolt11Request, MintQuoteBolt11Request, MintQuoteBolt11Response, PreMintSecrets, Proofs,
    ProofsMethods, RestoreRequest, State,
};
use crate::types::{MintQuote, ProofInfo, QuoteState, Transaction, TransactionKind};
use crate::util::unix_time;
use crate::{Amount, Error, Wallet};

/// Interval between quote status polls
const MINT_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Default deadline for waiting on an invoice
const MINT_POLL_TIMEOUT: Duration = Duration::from_secs(120);

impl Wallet {
    /// Request a mint quote
    ///
    /// The returned quote carries the bolt11 invoice the user must pay
    /// before [`Wallet::mint`] can execute.
    #[instrument(skip(self))]
    pub async fn mint_quote(&self, amount: Amount) -> Result<MintQuote, Error> {
        self.ensure_mint().await?;

        let request = MintQuoteBolt11Request {
            amount,
            unit: self.unit.clone(),
        };

        let quote_res = self.client().post_mint_quote(request).await?;

        let quote = MintQuote {
            id: quote_res.quote,
            mint_url: self.mint_url.clone(),
            amount,
            unit: self.unit.clone(),
            request: quote_res.request,
            state: if quote_res.paid {
                QuoteState::Paid
            } else {
                QuoteState::Pending
            },
            expiry: quote_res.expiry.unwrap_or(0),
        };

        self.localstore.add_mint_quote(quote.clone()).await?;
        self.notify_quote_updated(&quote.id);

        Ok(quote)
    }

    /// Check mint quote status with the mint, updating the stored record
    #[instrument(skip(self))]
    pub async fn mint_quote_state(
        &self,
        quote_id: &str,
    ) -> Result<MintQuoteBolt11Response, Error> {
        let response = self.client().get_mint_quote_status(quote_id).await?;

        match self.localstore.get_mint_quote(quote_id).await? {
            Some(quote) => {
                let mut quote = quote;

                let state = if response.paid {
                    QuoteState::Paid
                } else {
                    QuoteState::Pending
                };

                if state != quote.state {
                    quote.state = state;
                    self.localstore.add_mint_quote(quote).await?;
                    self.notify_quote_updated(quote_id);
                }
            }
            None => {
                tracing::info!("Quote mint {} unknown", quote_id);
            }
        }

        Ok(response)
    }

    /// Poll the mint until the quote invoice is paid
    ///
    /// Polls every two seconds until the deadline, then fails with an
    /// invalid quote error.
    #[instrument(skip(self))]
    pub async fn wait_for_paid_quote(
        &self,
        quote_id: &str,
        timeout: Option<Duration>,
    ) -> Result<(), Error> {
        let deadline =
            tokio::time::Instant::now() + timeout.unwrap_or(MINT_POLL_TIMEOUT);

        loop {
            let response = self.mint_quote_state(quote_id).await?;

            if response.paid {
                return Ok(());
            }

            if tokio::time::Instant::now() >= deadline {
                return Err(Error::InvalidQuote(format!(
                    "quote {quote_id} not paid before deadline"
                )));
            }

            tokio::time::sleep(MINT_POLL_INTERVAL).await;
        }
    }

    /// Execute a paid mint quote
    #[instrument(skip(self))]
    pub async fn mint(&self, quote_id: &str) -> Result<Proofs, Error> {
        self.ensure_mint().await?;

        let quote_info = self
            .localstore
            .get_mint_quote(quote_id)
            .await?
            .ok_or_else(|| Error::InvalidQuote(format!("unknown quote {quote_id}")))?;

        if quote_info.expiry != 0 && quote_info.expiry < unix_time() {
            return Err(Error::InvalidQuote(format!("quote {quote_id} expired")));
        }

        let active_keyset = self.fetch_active_keyset().await?;
        let keys = self.get_keyset_keys(active_keyset.id).await?;

        let premint = PreMintSecrets::random(active_keyset.id, quote_info.amount, &keys)?;

        let request = MintBolt11Request {
            quote: quote_id.to_string(),
            outputs: premint.blinded_messages(),
        };

        let signatures = match self.client().post_mint(request).await {
            Ok(response) => response.signatures,
            Err(Error::OutputsAlreadySigned) => {
                // The mint signed these outputs on an earlier attempt whose
                // response never reached us. Ask it to replay the
                // signatures for the very same blinded messages.
                tracing::warn!(
                    "Mint reports outputs for quote {} already signed, recovering via restore",
                    quote_id
                );

                let restore = self
                    .client()
                    .post_restore(RestoreRequest {
                        outputs: premint.blinded_messages(),
                    })
                    .await?;

                restore.signatures
            }
            Err(err) => return Err(err),
        };

        let proofs = construct_proofs(signatures, &premint.secrets, &keys)?;

        if proofs.total_amount()? != quote_info.amount {
            return Err(Error::Protocol(format!(
                "minted amount {} does not match quote amount {}",
                proofs.total_amount()?,
                quote_info.amount
            )));
        }

        let proof_infos = proofs
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

        self.localstore.update_proofs(proof_infos, vec![]).await?;

        self.localstore.remove_mint_quote(&quote_info.id).await?;

        self.localstore
            .add_transaction(Transaction::new(
                TransactionKind::Mint,
                self.mint_url.clone(),
                quote_info.amount,
                Amount::ZERO,
                None,
            ))
            .await?;

        self.notify_proofs_updated();
        self.notify_quote_updated(quote_id);
        self.notify_history_updated();

        Ok(proofs)
    }
}
