//! Cashu Token
//!
//! <https://github.com/cashubtc/nuts/blob/main/00.md>

use std::fmt;
use std::str::FromStr;

use bitcoin::base64::engine::{general_purpose, GeneralPurpose};
use bitcoin::base64::{alphabet, Engine as _};
use serde::{Deserialize, Serialize};

use super::{CurrencyUnit, Proofs};
use crate::error::Error;
use crate::mint_url::MintUrl;
use crate::Amount;

/// Proofs of a single mint inside a [`TokenV3`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenV3Token {
    /// Url of mint
    pub mint: MintUrl,
    /// [`Proofs`]
    pub proofs: Proofs,
}

impl TokenV3Token {
    /// Create new [`TokenV3Token`]
    pub fn new(mint_url: MintUrl, proofs: Proofs) -> Self {
        Self {
            mint: mint_url,
            proofs,
        }
    }
}

/// Token V3
///
/// The portable string form is the ASCII prefix `cashuA` followed by the
/// unpadded URL-safe base64 of the JSON object. Decoding accepts both padded
/// and unpadded input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenV3 {
    /// Proofs in [`TokenV3`] by mint
    pub token: Vec<TokenV3Token>,
    /// Memo for token
    #[serde(skip_serializing_if = "Option::is_none")]
    pub memo: Option<String>,
    /// Token Unit
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<CurrencyUnit>,
}

impl TokenV3 {
    /// Create new [`TokenV3`]
    pub fn new(
        mint_url: MintUrl,
        proofs: Proofs,
        memo: Option<String>,
        unit: Option<CurrencyUnit>,
    ) -> Result<Self, Error> {
        if proofs.is_empty() {
            return Err(Error::InvalidToken);
        }

        Ok(Self {
            token: vec![TokenV3Token::new(mint_url, proofs)],
            memo,
            unit,
        })
    }

    /// All proofs in the token
    pub fn proofs(&self) -> Proofs {
        self.token
            .iter()
            .flat_map(|t| t.proofs.clone())
            .collect()
    }

    /// Url of the mint the token is drawn on
    ///
    /// Multi-mint tokens are not produced by this wallet; the first entry is
    /// authoritative.
    pub fn mint_url(&self) -> Result<MintUrl, Error> {
        self.token
            .first()
            .map(|t| t.mint.clone())
            .ok_or(Error::InvalidToken)
    }

    /// Total value of the token
    pub fn value(&self) -> Amount {
        self.token
            .iter()
            .map(|t| t.proofs.iter().map(|p| p.amount).sum())
            .sum()
    }

    /// [`TokenV3`] memo
    pub fn memo(&self) -> &Option<String> {
        &self.memo
    }

    /// Token unit
    pub fn unit(&self) -> &Option<CurrencyUnit> {
        &self.unit
    }
}

impl FromStr for TokenV3 {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.strip_prefix("cashuA").ok_or(Error::InvalidToken)?;

        let decode_config = general_purpose::GeneralPurposeConfig::new()
            .with_decode_padding_mode(bitcoin::base64::engine::DecodePaddingMode::Indifferent);
        let decoded = GeneralPurpose::new(&alphabet::URL_SAFE, decode_config)
            .decode(s)
            .map_err(|_| Error::InvalidToken)?;
        let decoded_str = String::from_utf8(decoded).map_err(|_| Error::InvalidToken)?;
        let token: TokenV3 = serde_json::from_str(&decoded_str).map_err(|_| Error::InvalidToken)?;

        if token.token.iter().all(|t| t.proofs.is_empty()) {
            return Err(Error::InvalidToken);
        }

        Ok(token)
    }
}

impl fmt::Display for TokenV3 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let json_string = serde_json::to_string(self).map_err(|_| fmt::Error)?;
        let encoded = general_purpose::URL_SAFE_NO_PAD.encode(json_string);
        write!(f, "cashuA{}", encoded)
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;
    use crate::nuts::Id;

    const TOKEN_STR: &str = "cashuAeyJ0b2tlbiI6W3sibWludCI6Imh0dHBzOi8vODMzMy5zcGFjZTozMzM4IiwicHJvb2ZzIjpbeyJhbW91bnQiOjIsImlkIjoiMDA5YTFmMjkzMjUzZTQxZSIsInNlY3JldCI6IjQwNzkxNWJjMjEyYmU2MWE3N2UzZTZkMmFlYjRjNzI3OTgwYmRhNTFjZDA2YTZhZmMyOWUyODYxNzY4YTc4MzciLCJDIjoiMDJiYzkwOTc5OTdkODFhZmIyY2M3MzQ2YjVlNDM0NWE5MzQ2YmQyYTUwNmViNzk1ODU5OGE3MmYwY2Y4NTE2M2VhIn0seyJhbW91bnQiOjgsImlkIjoiMDA5YTFmMjkzMjUzZTQxZSIsInNlY3JldCI6ImZlMTUxMDkzMTRlNjFkNzc1NmIwZjhlZTBmMjNhNjI0YWNhYTNmNGUwNDJmNjE0MzNjNzI4YzcwNTdiOTMxYmUiLCJDIjoiMDI5ZThlNTA1MGI4OTBhN2Q2YzA5NjhkYjE2YmMxZDVkNWZhMDQwZWExZGUyODRmNmVjNjlkNjEyOTlmNjcxMDU5In1dfV0sInVuaXQiOiJzYXQiLCJtZW1vIjoiVGhhbmsgeW91LiJ9";

    #[test]
    fn test_token_str_round_trip() {
        let token = TokenV3::from_str(TOKEN_STR).unwrap();

        assert_eq!(
            token.token[0].mint,
            MintUrl::from_str("https://8333.space:3338").unwrap()
        );
        assert_eq!(
            token.token[0].proofs[0].clone().keyset_id,
            Id::from_str("009a1f293253e41e").unwrap()
        );
        assert_eq!(token.unit.clone().unwrap(), CurrencyUnit::Sat);
        assert_eq!(token.value(), Amount::from(10));

        let encoded = &token.to_string();

        let token_data = TokenV3::from_str(encoded).unwrap();

        assert_eq!(token_data, token);
    }

    #[test]
    fn test_token_padded_and_unpadded_decode_equal() {
        let a = TokenV3::from_str(TOKEN_STR).unwrap();

        // Serialization is unpadded; re-pad to a multiple of four and make
        // sure decoding accepts both forms
        let unpadded = a.to_string();
        let body = unpadded.strip_prefix("cashuA").unwrap();
        assert!(!body.ends_with('='));

        let padded = format!("cashuA{}{}", body, "=".repeat((4 - body.len() % 4) % 4));
        let b = TokenV3::from_str(&padded).unwrap();

        assert_eq!(a, b);
    }

    #[test]
    fn test_token_secret_is_byte_exact() {
        let token = TokenV3::from_str(TOKEN_STR).unwrap();
        let secret = token.token[0].proofs[0].secret.clone();

        let reencoded = token.to_string();
        let token_back = TokenV3::from_str(&reencoded).unwrap();

        assert_eq!(
            token_back.token[0].proofs[0].secret.to_bytes(),
            secret.to_bytes()
        );
    }

    #[test]
    fn incorrect_tokens() {
        let incorrect_prefix = "casshuAeyJwcm9vZnMiOlt";
        assert!(TokenV3::from_str(incorrect_prefix).is_err());

        let no_prefix = "eyJwcm9vZnMiOlt";
        assert!(TokenV3::from_str(no_prefix).is_err());

        let not_json = "cashuAbm90IGpzb24gYXQgYWxs";
        assert!(TokenV3::from_str(not_json).is_err());

        assert!(TokenV3::from_str(TOKEN_STR).is_ok());
    }
}
