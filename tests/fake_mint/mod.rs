//! In-process mint for wallet integration tests
//!
//! Implements [`MintConnector`] with a real BDHKE signer so the full
//! blind, sign, unblind, verify cycle runs against actual curve math.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use cashu_wallet::dhke::{sign_message, verify_message};
use cashu_wallet::error::Error;
use cashu_wallet::nuts::{
    BlindSignature, BlindedMessage, CheckStateRequest, CheckStateResponse, CurrencyUnit, Id,
    KeySet, KeySetInfo, Keys, KeysetResponse, MeltBolt11Request, MeltBolt11Response,
    MeltQuoteBolt11Request, MeltQuoteBolt11Response, MintBolt11Request, MintBolt11Response,
    MintInfo, MintQuoteBolt11Request, MintQuoteBolt11Response, ProofState, Proofs, PublicKey,
    RestoreRequest, RestoreResponse, SecretKey, State, SwapRequest, SwapResponse,
};
use cashu_wallet::wallet::MintConnector;
use cashu_wallet::Amount;
use tokio::sync::Mutex;

/// Denominations every fake keyset carries
const KEYSET_AMOUNTS: [u64; 14] = [
    1, 2, 4, 8, 16, 32, 64, 128, 256, 512, 1024, 2048, 4096, 8192,
];

pub struct FakeKeyset {
    pub id: Id,
    pub active: bool,
    secret_keys: BTreeMap<Amount, SecretKey>,
    keys: Keys,
}

impl FakeKeyset {
    fn generate(active: bool) -> Self {
        let mut secret_keys = BTreeMap::new();
        let mut public_keys = BTreeMap::new();

        for amount in KEYSET_AMOUNTS {
            let sk = SecretKey::generate();
            public_keys.insert(Amount::from(amount), sk.public_key());
            secret_keys.insert(Amount::from(amount), sk);
        }

        let keys = Keys::new(public_keys);
        let id = Id::from(&keys);

        Self {
            id,
            active,
            secret_keys,
            keys,
        }
    }
}

#[derive(Default)]
struct FakeMintState {
    /// B_ hex -> signature previously issued for that blinded message
    signed: HashMap<String, BlindSignature>,
    /// Y hex of spent proofs
    spent: HashSet<String>,
    /// quote id -> (amount, paid)
    mint_quotes: HashMap<String, (Amount, bool)>,
    /// quote id -> (amount, fee reserve)
    melt_quotes: HashMap<String, (Amount, Amount)>,
    /// polls remaining before the pending quote flips to paid
    paid_after_polls: HashMap<String, u32>,
    quote_counter: u32,
}

pub struct FakeMint {
    keysets: Vec<FakeKeyset>,
    input_fee_ppk: u64,
    /// Sats of the melt fee reserve actually consumed by "lightning"
    lightning_fee: u64,
    /// Amount and fee reserve quoted for any melt request
    melt_quote_terms: (Amount, Amount),
    /// Sign mint outputs but answer as if a previous request already did
    zombie_mode: AtomicBool,
    state: Mutex<FakeMintState>,
}

impl std::fmt::Debug for FakeMint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FakeMint").finish()
    }
}

impl FakeMint {
    pub fn new() -> Self {
        Self::with_fees(0, 0)
    }

    pub fn with_fees(input_fee_ppk: u64, lightning_fee: u64) -> Self {
        Self {
            keysets: vec![FakeKeyset::generate(true)],
            input_fee_ppk,
            lightning_fee,
            melt_quote_terms: (Amount::from(0), Amount::from(0)),
            zombie_mode: AtomicBool::new(false),
            state: Mutex::new(FakeMintState::default()),
        }
    }

    /// Add an inactive keyset, returning its id
    pub fn add_inactive_keyset(&mut self) -> Id {
        let keyset = FakeKeyset::generate(false);
        let id = keyset.id;
        self.keysets.push(keyset);
        id
    }

    pub fn active_keyset(&self) -> &FakeKeyset {
        self.keysets
            .iter()
            .find(|k| k.active)
            .expect("an active keyset")
    }

    pub fn set_melt_quote_terms(&mut self, amount: u64, fee_reserve: u64) {
        self.melt_quote_terms = (Amount::from(amount), Amount::from(fee_reserve));
    }

    pub fn set_zombie_mode(&self, enabled: bool) {
        self.zombie_mode.store(enabled, Ordering::SeqCst);
    }

    pub async fn mark_quote_paid(&self, quote_id: &str) {
        let mut state = self.state.lock().await;
        if let Some(entry) = state.mint_quotes.get_mut(quote_id) {
            entry.1 = true;
        }
    }

    /// Flip the quote to paid only after `polls` status requests
    pub async fn mark_quote_paid_after_polls(&self, quote_id: &str, polls: u32) {
        let mut state = self.state.lock().await;
        state.paid_after_polls.insert(quote_id.to_string(), polls);
    }

    /// Record signatures as if a previous device had minted these outputs
    pub async fn pre_sign(&self, outputs: Vec<BlindedMessage>) {
        let mut state = self.state.lock().await;
        for output in outputs {
            self.sign_output(&mut state, &output).expect("pre-sign");
        }
    }

    fn sign_output(
        &self,
        state: &mut FakeMintState,
        output: &BlindedMessage,
    ) -> Result<BlindSignature, Error> {
        let keyset = self
            .keysets
            .iter()
            .find(|k| k.id == output.keyset_id)
            .ok_or(Error::KeysetUnknown(output.keyset_id))?;

        let k = keyset
            .secret_keys
            .get(&output.amount)
            .ok_or(Error::AmountKey)?;

        let c = sign_message(k, &output.blinded_secret)?;

        let signature = BlindSignature {
            amount: output.amount,
            keyset_id: output.keyset_id,
            c,
        };

        state
            .signed
            .insert(output.blinded_secret.to_hex(), signature.clone());

        Ok(signature)
    }

    fn verify_input(
        &self,
        state: &FakeMintState,
        proof: &cashu_wallet::nuts::Proof,
    ) -> Result<PublicKey, Error> {
        let keyset = self
            .keysets
            .iter()
            .find(|k| k.id == proof.keyset_id)
            .ok_or(Error::KeysetUnknown(proof.keyset_id))?;

        let k = keyset
            .secret_keys
            .get(&proof.amount)
            .ok_or(Error::AmountKey)?;

        verify_message(k, proof.c, proof.secret.as_bytes())
            .map_err(|_| Error::Mint("invalid proof".to_string()))?;

        let y = proof.y()?;

        if state.spent.contains(&y.to_hex()) {
            return Err(Error::Mint("token already spent".to_string()));
        }

        Ok(y)
    }

    fn input_fee(&self, inputs: &Proofs) -> Amount {
        Amount::from((self.input_fee_ppk * inputs.len() as u64 + 999) / 1000)
    }
}

#[async_trait]
impl MintConnector for FakeMint {
    async fn get_mint_info(&self) -> Result<MintInfo, Error> {
        Ok(MintInfo {
            name: Some("fake mint".to_string()),
            ..Default::default()
        })
    }

    async fn get_mint_keys(&self) -> Result<Vec<KeySet>, Error> {
        Ok(self
            .keysets
            .iter()
            .filter(|k| k.active)
            .map(|k| KeySet {
                id: k.id,
                unit: CurrencyUnit::Sat,
                keys: k.keys.clone(),
            })
            .collect())
    }

    async fn get_mint_keyset(&self, keyset_id: Id) -> Result<KeySet, Error> {
        self.keysets
            .iter()
            .find(|k| k.id == keyset_id)
            .map(|k| KeySet {
                id: k.id,
                unit: CurrencyUnit::Sat,
                keys: k.keys.clone(),
            })
            .ok_or(Error::KeysetUnknown(keyset_id))
    }

    async fn get_mint_keysets(&self) -> Result<KeysetResponse, Error> {
        Ok(KeysetResponse {
            keysets: self
                .keysets
                .iter()
                .map(|k| KeySetInfo {
                    id: k.id,
                    unit: CurrencyUnit::Sat,
                    active: k.active,
                    input_fee_ppk: self.input_fee_ppk,
                })
                .collect(),
        })
    }

    async fn post_mint_quote(
        &self,
        request: MintQuoteBolt11Request,
    ) -> Result<MintQuoteBolt11Response, Error> {
        let mut state = self.state.lock().await;

        state.quote_counter += 1;
        let quote_id = format!("mint-quote-{}", state.quote_counter);

        state
            .mint_quotes
            .insert(quote_id.clone(), (request.amount, false));

        Ok(MintQuoteBolt11Response {
            quote: quote_id.clone(),
            request: format!("lnbc-fake-{quote_id}"),
            paid: false,
            expiry: None,
        })
    }

    async fn get_mint_quote_status(
        &self,
        quote_id: &str,
    ) -> Result<MintQuoteBolt11Response, Error> {
        let mut state = self.state.lock().await;

        if let Some(remaining) = state.paid_after_polls.get_mut(quote_id) {
            if *remaining == 0 {
                state.paid_after_polls.remove(quote_id);
                if let Some(entry) = state.mint_quotes.get_mut(quote_id) {
                    entry.1 = true;
                }
            } else {
                *remaining -= 1;
            }
        }

        let (_, paid) = state
            .mint_quotes
            .get(quote_id)
            .ok_or_else(|| Error::Mint("unknown quote".to_string()))?;

        Ok(MintQuoteBolt11Response {
            quote: quote_id.to_string(),
            request: format!("lnbc-fake-{quote_id}"),
            paid: *paid,
            expiry: None,
        })
    }

    async fn post_mint(&self, request: MintBolt11Request) -> Result<MintBolt11Response, Error> {
        let mut state = self.state.lock().await;

        let (amount, paid) = *state
            .mint_quotes
            .get(&request.quote)
            .ok_or_else(|| Error::Mint("unknown quote".to_string()))?;

        if !paid {
            return Err(Error::Mint("quote not paid".to_string()));
        }

        if request.total_amount() != amount {
            return Err(Error::Mint("outputs do not match quote".to_string()));
        }

        if request
            .outputs
            .iter()
            .any(|o| state.signed.contains_key(&o.blinded_secret.to_hex()))
        {
            return Err(Error::OutputsAlreadySigned);
        }

        if self.zombie_mode.swap(false, Ordering::SeqCst) {
            // Sign like the lost first request did, then answer like the
            // retry that hits code 10002
            for output in &request.outputs {
                self.sign_output(&mut state, output)?;
            }
            return Err(Error::OutputsAlreadySigned);
        }

        let signatures = request
            .outputs
            .iter()
            .map(|output| self.sign_output(&mut state, output))
            .collect::<Result<Vec<BlindSignature>, Error>>()?;

        state.mint_quotes.remove(&request.quote);

        Ok(MintBolt11Response { signatures })
    }

    async fn post_melt_quote(
        &self,
        _request: MeltQuoteBolt11Request,
    ) -> Result<MeltQuoteBolt11Response, Error> {
        let mut state = self.state.lock().await;

        state.quote_counter += 1;
        let quote_id = format!("melt-quote-{}", state.quote_counter);

        let (amount, fee_reserve) = self.melt_quote_terms;
        state
            .melt_quotes
            .insert(quote_id.clone(), (amount, fee_reserve));

        Ok(MeltQuoteBolt11Response {
            quote: quote_id,
            amount,
            fee_reserve,
            paid: false,
            expiry: None,
        })
    }

    async fn post_melt(&self, request: MeltBolt11Request) -> Result<MeltBolt11Response, Error> {
        let mut state = self.state.lock().await;

        let (amount, _fee_reserve) = *state
            .melt_quotes
            .get(&request.quote)
            .ok_or_else(|| Error::Mint("unknown quote".to_string()))?;

        let input_total = request.proofs_amount();
        let mut input_ys = Vec::new();
        for proof in &request.inputs {
            input_ys.push(self.verify_input(&state, proof)?);
        }

        if input_total < amount {
            return Err(Error::Mint("inputs under quote amount".to_string()));
        }

        for y in input_ys {
            state.spent.insert(y.to_hex());
        }
        state.melt_quotes.remove(&request.quote);

        // Lightning consumed part of the reserve, the rest returns as
        // change on the provided blank outputs
        let change_value =
            u64::from(input_total) - u64::from(amount) - self.lightning_fee;

        let change = match (change_value, request.outputs) {
            (0, _) | (_, None) => None,
            (value, Some(outputs)) => {
                let mut parts = Amount::from(value).split();
                // Largest parts win when outputs are scarce
                parts.reverse();
                parts.truncate(outputs.len());

                let signatures = parts
                    .into_iter()
                    .zip(outputs)
                    .map(|(amount, output)| {
                        let stamped = BlindedMessage::new(
                            amount,
                            output.keyset_id,
                            output.blinded_secret,
                        );
                        self.sign_output(&mut state, &stamped)
                    })
                    .collect::<Result<Vec<BlindSignature>, Error>>()?;

                Some(signatures)
            }
        };

        Ok(MeltBolt11Response {
            paid: true,
            payment_preimage: Some("fake-preimage".to_string()),
            change,
        })
    }

    async fn post_swap(&self, request: SwapRequest) -> Result<SwapResponse, Error> {
        let mut state = self.state.lock().await;

        let mut input_ys = Vec::new();
        for proof in &request.inputs {
            input_ys.push(self.verify_input(&state, proof)?);
        }

        let fee = self.input_fee(&request.inputs);

        // Overpay is burnt, underpay is rejected
        if request.output_amount() + fee > request.input_amount() {
            return Err(Error::Mint("transaction unbalanced".to_string()));
        }

        for y in input_ys {
            state.spent.insert(y.to_hex());
        }

        let signatures = request
            .outputs
            .iter()
            .map(|output| self.sign_output(&mut state, output))
            .collect::<Result<Vec<BlindSignature>, Error>>()?;

        Ok(SwapResponse { signatures })
    }

    async fn post_restore(&self, request: RestoreRequest) -> Result<RestoreResponse, Error> {
        let state = self.state.lock().await;

        let mut seen = HashSet::new();
        let mut outputs = Vec::new();
        let mut signatures = Vec::new();

        for output in request.outputs {
            let b_hex = output.blinded_secret.to_hex();

            if !seen.insert(b_hex.clone()) {
                continue;
            }

            if let Some(signature) = state.signed.get(&b_hex) {
                outputs.push(BlindedMessage::new(
                    signature.amount,
                    signature.keyset_id,
                    output.blinded_secret,
                ));
                signatures.push(signature.clone());
            }
        }

        Ok(RestoreResponse {
            outputs,
            signatures,
        })
    }

    async fn post_check_state(
        &self,
        request: CheckStateRequest,
    ) -> Result<CheckStateResponse, Error> {
        let state = self.state.lock().await;

        Ok(CheckStateResponse {
            states: request
                .ys
                .into_iter()
                .map(|y| {
                    let proof_state = if state.spent.contains(&y.to_hex()) {
                        State::Spent
                    } else {
                        State::Unspent
                    };
                    ProofState {
                        y,
                        state: proof_state,
                    }
                })
                .collect(),
        })
    }
}
