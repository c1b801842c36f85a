//! Errors

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::nuts::Id;

/// Mint error code for outputs that have already been signed
///
/// Seen when a mint request is retried after the first response was lost in
/// transit; recovery goes through the restore endpoint.
pub const OUTPUTS_ALREADY_SIGNED_CODE: u16 = 10002;

/// Wallet Error
#[derive(Debug, Error)]
pub enum Error {
    /// No record for the given mint url
    #[error("Mint not found")]
    MintNotFound,
    /// Coverage for the requested amount is not achievable
    #[error("Insufficient funds")]
    InsufficientFunds,
    /// Quote missing, unknown or expired
    #[error("Invalid quote: `{0}`")]
    InvalidQuote(String),
    /// Malformed token string
    #[error("Invalid token")]
    InvalidToken,
    /// HTTP or transport failure
    #[error("Network error: `{0}`")]
    Network(String),
    /// Mint response violates the protocol schema
    #[error("Protocol error: `{0}`")]
    Protocol(String),
    /// Point parse, hash-to-curve exhaustion or invalid scalar
    #[error("Crypto error: `{0}`")]
    Crypto(String),
    /// Mint does not have a key for amount
    #[error("No key for amount")]
    AmountKey,
    /// Keyset is not known
    #[error("Keyset id not known: `{0}`")]
    KeysetUnknown(Id),
    /// No active keyset for the wallet unit
    #[error("No active keyset")]
    NoActiveKeyset,
    /// Amount overflow
    #[error("Amount Overflow")]
    AmountOverflow,
    /// Token does not match wallet mint
    #[error("Token does not match wallet mint")]
    IncorrectMint,
    /// Unsupported unit
    #[error("Unit unsupported")]
    UnsupportedUnit,
    /// Mint reported the outputs as already signed
    #[error("Blinded message is already signed")]
    OutputsAlreadySigned,
    /// Payment was not completed by the mint
    #[error("Payment failed")]
    PaymentFailed,
    /// Mint rejected the request
    #[error("Mint error: `{0}`")]
    Mint(String),
    /// Storage backend error
    #[error("Database error: `{0}`")]
    Database(String),
}

impl From<crate::amount::Error> for Error {
    fn from(_: crate::amount::Error) -> Self {
        Self::AmountOverflow
    }
}

impl From<crate::secret::Error> for Error {
    fn from(err: crate::secret::Error) -> Self {
        Self::Protocol(err.to_string())
    }
}

impl From<crate::util::hex::Error> for Error {
    fn from(err: crate::util::hex::Error) -> Self {
        Self::Protocol(err.to_string())
    }
}

impl From<crate::nuts::nut01::Error> for Error {
    fn from(err: crate::nuts::nut01::Error) -> Self {
        Self::Crypto(err.to_string())
    }
}

impl From<crate::nuts::nut02::Error> for Error {
    fn from(err: crate::nuts::nut02::Error) -> Self {
        Self::Protocol(err.to_string())
    }
}

impl From<crate::mint_url::Error> for Error {
    fn from(err: crate::mint_url::Error) -> Self {
        Self::Protocol(err.to_string())
    }
}

impl From<bitcoin::secp256k1::Error> for Error {
    fn from(err: bitcoin::secp256k1::Error) -> Self {
        Self::Crypto(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::Protocol(err.to_string())
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Self::Network(err.to_string())
    }
}

/// Error response from a mint
///
/// `{"detail": "...", "code": 10002}`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error Code
    pub code: Option<u16>,
    /// Human readable Text
    pub detail: Option<String>,
    /// Longer information related to error
    pub error: Option<String>,
}

impl ErrorResponse {
    /// Parse an error body, falling back to the raw value
    pub fn from_value(value: Value) -> Result<Self, Error> {
        match serde_json::from_value::<ErrorResponse>(value.clone()) {
            Ok(res) => Ok(res),
            Err(_) => Err(Error::Protocol(value.to_string())),
        }
    }
}

impl From<ErrorResponse> for Error {
    fn from(err: ErrorResponse) -> Self {
        if err.code == Some(OUTPUTS_ALREADY_SIGNED_CODE) {
            return Self::OutputsAlreadySigned;
        }

        let detail = err
            .detail
            .or(err.error)
            .unwrap_or_else(|| "unknown mint error".to_string());

        Self::Mint(detail)
    }
}
