//! Wallet client

use std::fmt::Debug;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tracing::instrument;

use crate::error::{Error, ErrorResponse};
use crate::mint_url::MintUrl;
use crate::nuts::{
    CheckStateRequest, CheckStateResponse, Id, KeySet, KeysResponse, KeysetResponse,
    MeltBolt11Request, MeltBolt11Response, MeltQuoteBolt11Request, MeltQuoteBolt11Response,
    MintBolt11Request, MintBolt11Response, MintInfo, MintQuoteBolt11Request,
    MintQuoteBolt11Response, RestoreRequest, RestoreResponse, SwapRequest, SwapResponse,
};

/// Default timeout for mint requests
///
/// Long enough for a mint waiting on a lightning payment; the client does
/// not retry so failures stay explicit.
pub const HTTP_TIMEOUT: Duration = Duration::from_secs(120);

/// Timeout for a single restore batch request
pub const RESTORE_TIMEOUT: Duration = Duration::from_secs(10);

/// Interface to a remote mint
///
/// Carries the full method set of the protocol so no caller ever needs to
/// reach past the trait to a concrete client.
#[async_trait]
pub trait MintConnector: Debug + Send + Sync {
    /// Get Mint Info [NUT-06]
    async fn get_mint_info(&self) -> Result<MintInfo, Error>;

    /// Get Active Mint Keys [NUT-01]
    async fn get_mint_keys(&self) -> Result<Vec<KeySet>, Error>;

    /// Get Keyset Keys [NUT-01]
    async fn get_mint_keyset(&self, keyset_id: Id) -> Result<KeySet, Error>;

    /// Get Keysets [NUT-02]
    async fn get_mint_keysets(&self) -> Result<KeysetResponse, Error>;

    /// Mint Quote [NUT-04]
    async fn post_mint_quote(
        &self,
        request: MintQuoteBolt11Request,
    ) -> Result<MintQuoteBolt11Response, Error>;

    /// Mint Quote status
    async fn get_mint_quote_status(
        &self,
        quote_id: &str,
    ) -> Result<MintQuoteBolt11Response, Error>;

    /// Mint Tokens [NUT-04]
    async fn post_mint(&self, request: MintBolt11Request) -> Result<MintBolt11Response, Error>;

    /// Melt Quote [NUT-05]
    async fn post_melt_quote(
        &self,
        request: MeltQuoteBolt11Request,
    ) -> Result<MeltQuoteBolt11Response, Error>;

    /// Melt [NUT-05]
    async fn post_melt(&self, request: MeltBolt11Request) -> Result<MeltBolt11Response, Error>;

    /// Swap Token [NUT-03]
    async fn post_swap(&self, request: SwapRequest) -> Result<SwapResponse, Error>;

    /// Restore request [NUT-09]
    async fn post_restore(&self, request: RestoreRequest) -> Result<RestoreResponse, Error>;

    /// Spendable check [NUT-07]
    async fn post_check_state(
        &self,
        request: CheckStateRequest,
    ) -> Result<CheckStateResponse, Error>;
}

/// Http Client
#[derive(Debug, Clone)]
pub struct HttpClient {
    mint_url: MintUrl,
    inner: Client,
}

impl HttpClient {
    /// Create new [`HttpClient`] for a mint
    pub fn new(mint_url: MintUrl) -> Self {
        Self {
            mint_url,
            inner: Client::builder()
                .timeout(HTTP_TIMEOUT)
                .build()
                .expect("reqwest client with static config"),
        }
    }

    async fn http_get<T>(&self, paths: &[&str]) -> Result<T, Error>
    where
        T: serde::de::DeserializeOwned,
    {
        let url = self.mint_url.join_paths(paths)?;
        let res = self.inner.get(url).send().await?.json::<Value>().await?;

        decode_response(res)
    }

    async fn http_post<B, T>(&self, paths: &[&str], body: &B) -> Result<T, Error>
    where
        B: serde::Serialize + ?Sized,
        T: serde::de::DeserializeOwned,
    {
        let url = self.mint_url.join_paths(paths)?;
        let res = self
            .inner
            .post(url)
            .json(body)
            .send()
            .await?
            .json::<Value>()
            .await?;

        decode_response(res)
    }
}

/// Decode a mint response, falling back to the error envelope
fn decode_response<T>(value: Value) -> Result<T, Error>
where
    T: serde::de::DeserializeOwned,
{
    match serde_json::from_value::<T>(value.clone()) {
        Ok(decoded) => Ok(decoded),
        Err(_) => Err(ErrorResponse::from_value(value)?.into()),
    }
}

#[async_trait]
impl MintConnector for HttpClient {
    #[instrument(skip(self), fields(mint_url = %self.mint_url))]
    async fn get_mint_info(&self) -> Result<MintInfo, Error> {
        self.http_get(&["v1", "info"]).await
    }

    #[instrument(skip(self), fields(mint_url = %self.mint_url))]
    async fn get_mint_keys(&self) -> Result<Vec<KeySet>, Error> {
        let res: KeysResponse = self.http_get(&["v1", "keys"]).await?;
        Ok(res.keysets)
    }

    #[instrument(skip(self), fields(mint_url = %self.mint_url))]
    async fn get_mint_keyset(&self, keyset_id: Id) -> Result<KeySet, Error> {
        let res: KeysResponse = self
            .http_get(&["v1", "keys", &keyset_id.to_string()])
            .await?;

        res.keysets
            .into_iter()
            .next()
            .ok_or(Error::KeysetUnknown(keyset_id))
    }

    #[instrument(skip(self), fields(mint_url = %self.mint_url))]
    async fn get_mint_keysets(&self) -> Result<KeysetResponse, Error> {
        self.http_get(&["v1", "keysets"]).await
    }

    #[instrument(skip_all, fields(mint_url = %self.mint_url))]
    async fn post_mint_quote(
        &self,
        request: MintQuoteBolt11Request,
    ) -> Result<MintQuoteBolt11Response, Error> {
        self.http_post(&["v1", "mint", "quote", "bolt11"], &request)
            .await
    }

    #[instrument(skip(self), fields(mint_url = %self.mint_url))]
    async fn get_mint_quote_status(
        &self,
        quote_id: &str,
    ) -> Result<MintQuoteBolt11Response, Error> {
        self.http_get(&["v1", "mint", "quote", "bolt11", quote_id])
            .await
    }

    #[instrument(skip_all, fields(mint_url = %self.mint_url))]
    async fn post_mint(&self, request: MintBolt11Request) -> Result<MintBolt11Response, Error> {
        self.http_post(&["v1", "mint", "bolt11"], &request).await
    }

    #[instrument(skip_all, fields(mint_url = %self.mint_url))]
    async fn post_melt_quote(
        &self,
        request: MeltQuoteBolt11Request,
    ) -> Result<MeltQuoteBolt11Response, Error> {
        self.http_post(&["v1", "melt", "quote", "bolt11"], &request)
            .await
    }

    #[instrument(skip_all, fields(mint_url = %self.mint_url))]
    async fn post_melt(&self, request: MeltBolt11Request) -> Result<MeltBolt11Response, Error> {
        self.http_post(&["v1", "melt", "bolt11"], &request).await
    }

    #[instrument(skip_all, fields(mint_url = %self.mint_url))]
    async fn post_swap(&self, request: SwapRequest) -> Result<SwapResponse, Error> {
        self.http_post(&["v1", "swap"], &request).await
    }

    #[instrument(skip_all, fields(mint_url = %self.mint_url))]
    async fn post_restore(&self, request: RestoreRequest) -> Result<RestoreResponse, Error> {
        // Restore sweeps many batches; a slow mint should fail fast rather
        // than stall the whole scan
        let url = self.mint_url.join_paths(&["v1", "restore"])?;
        let res = self
            .inner
            .post(url)
            .timeout(RESTORE_TIMEOUT)
            .json(&request)
            .send()
            .await?
            .json::<Value>()
            .await?;

        decode_response(res)
    }

    #[instrument(skip_all, fields(mint_url = %self.mint_url))]
    async fn post_check_state(
        &self,
        request: CheckStateRequest,
    ) -> Result<CheckStateResponse, Error> {
        self.http_post(&["v1", "checkstate"], &request).await
    }
}
