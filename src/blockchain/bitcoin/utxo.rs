//! Unspent output model and selection.

use bitcoin::Txid;
use serde::Deserialize;
use std::str::FromStr;
use tracing::debug;

use crate::core::errors::WalletError;

/// Fixed fee rate in satoshi per virtual byte.
///
/// Fee-market estimation is out of scope; a flat testnet-friendly rate keeps
/// transactions relayable without consulting an external fee oracle.
pub const FEE_RATE_SAT_PER_VB: u64 = 10;

/// One unspent output as reported by the relay.
#[derive(Debug, Clone, Deserialize)]
pub struct Utxo {
    pub txid: String,
    pub vout: u32,
    /// Amount in satoshi.
    pub value: u64,
    #[serde(default)]
    pub status: UtxoStatus,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UtxoStatus {
    #[serde(default)]
    pub confirmed: bool,
}

impl Utxo {
    pub fn txid(&self) -> Result<Txid, WalletError> {
        Txid::from_str(&self.txid).map_err(|e| {
            WalletError::NetworkError(format!("relay returned invalid txid '{}': {}", self.txid, e))
        })
    }
}

/// Rough size-based fee for a P2PKH transaction.
///
/// Input ~148 vbytes, two outputs (recipient + change) ~34 vbytes each,
/// ~10 vbytes fixed overhead.
pub fn estimate_fee(input_count: usize, fee_rate: u64) -> u64 {
    let input_size = 148 * input_count as u64;
    let output_size = 34 * 2;
    let overhead = 10;
    (input_size + output_size + overhead) * fee_rate
}

/// Greedily select outputs (largest first) until they cover
/// `target_amount` plus the fee for the selected input count.
///
/// Returns the selection and the estimated fee.
pub fn select_utxos(
    utxos: &[Utxo],
    target_amount: u64,
    fee_rate: u64,
) -> Result<(Vec<Utxo>, u64), WalletError> {
    if utxos.is_empty() {
        return Err(WalletError::InsufficientFunds("no unspent outputs available".to_string()));
    }

    let mut sorted: Vec<Utxo> = utxos.to_vec();
    sorted.sort_by(|a, b| b.value.cmp(&a.value));

    let mut selected = Vec::new();
    let mut total: u64 = 0;
    for utxo in sorted {
        total = total
            .checked_add(utxo.value)
            .ok_or_else(|| WalletError::InvalidAmount("UTXO total overflows".to_string()))?;
        selected.push(utxo);

        let fee = estimate_fee(selected.len(), fee_rate);
        if total >= target_amount.saturating_add(fee) {
            debug!(
                inputs = selected.len(),
                total_sat = total,
                fee_sat = fee,
                "selected unspent outputs"
            );
            return Ok((selected, fee));
        }
    }

    Err(WalletError::InsufficientFunds(format!(
        "need {} sat plus fees, {} sat available",
        target_amount, total
    )))
}
