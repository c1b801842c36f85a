//! Client-side Cashu wallet core
//!
//! Mints, holds, sends, receives, melts and restores Chaumian blind-signed
//! bearer tokens issued by a remote mint. The heart of the crate is the
//! blind Diffie-Hellman key exchange in [`dhke`], the deterministic backup
//! derivation in [`derivation`] and the proof lifecycle store behind
//! [`database::WalletDatabase`]; [`wallet::Wallet`] ties them together into
//! reserve-network-commit sagas against the mint HTTP API.

#![warn(missing_docs)]
#![warn(rustdoc::bare_urls)]

pub mod amount;
pub mod database;
pub mod derivation;
pub mod dhke;
pub mod error;
pub mod fees;
pub mod mint_url;
pub mod nuts;
pub mod secret;
pub mod types;
pub mod util;
pub mod wallet;

#[doc(hidden)]
pub use bitcoin::secp256k1;

#[doc(hidden)]
pub use self::amount::Amount;
#[doc(hidden)]
pub use self::error::Error;
#[doc(hidden)]
pub use self::util::SECP256K1;
#[doc(hidden)]
pub use self::wallet::client::{HttpClient, MintConnector};
#[doc(hidden)]
pub use self::wallet::Wallet;
