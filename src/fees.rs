//! Calculate fees
//!
//! <https://github.com/cashubtc/nuts/blob/main/02.md>

use std::collections::HashMap;

use crate::nuts::Id;
use crate::{Amount, Error};

/// Fee required for a proof set
///
/// Sum of the per-input parts-per-thousand fees over all keysets, rounded up
/// to the next whole unit.
pub fn calculate_fee(
    proofs_count: &HashMap<Id, u64>,
    keyset_fee: &HashMap<Id, u64>,
) -> Result<Amount, Error> {
    let mut sum_fee = 0u64;

    for (keyset_id, proof_count) in proofs_count {
        let keyset_fee_ppk = keyset_fee
            .get(keyset_id)
            .ok_or(Error::KeysetUnknown(*keyset_id))?;

        sum_fee += keyset_fee_ppk * proof_count;
    }

    let fee = (sum_fee + 999) / 1000;

    Ok(fee.into())
}
