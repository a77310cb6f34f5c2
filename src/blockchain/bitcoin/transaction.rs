//! P2PKH transaction assembly and signing.

use bitcoin::absolute::LockTime;
use bitcoin::address::Address;
use bitcoin::blockdata::script::Builder;
use bitcoin::consensus::encode::serialize;
use bitcoin::hashes::Hash;
use bitcoin::script::PushBytesBuf;
use bitcoin::sighash::{EcdsaSighashType, SighashCache};
use bitcoin::transaction::Version;
use bitcoin::{Amount, OutPoint, ScriptBuf, Sequence, Transaction, TxIn, TxOut, Witness};
use std::str::FromStr;
use tracing::debug;

use super::account::BitcoinAccount;
use super::utxo::Utxo;
use crate::core::errors::WalletError;

/// Outputs below this are uneconomical; change under it is left as fee.
pub const DUST_THRESHOLD_SAT: u64 = 546;

/// Build and sign a P2PKH transfer spending `utxos` owned by `account`.
///
/// Outputs: `amount` to `recipient`, change back to the account when it
/// clears the dust threshold. All inputs must be locked to the account's
/// own address, which is the case for anything the relay reports for it.
pub fn build_p2pkh(
    account: &BitcoinAccount,
    utxos: &[Utxo],
    recipient: &str,
    amount: u64,
    fee: u64,
) -> Result<Transaction, WalletError> {
    if amount == 0 {
        return Err(WalletError::InvalidAmount("amount must be strictly positive".to_string()));
    }

    let recipient_address = Address::from_str(recipient.trim())
        .map_err(|e| {
            WalletError::InvalidAddress(format!("invalid recipient '{}': {}", recipient, e))
        })?
        .require_network(account.network())
        .map_err(|e| {
            WalletError::InvalidAddress(format!(
                "recipient '{}' is not a {} address: {}",
                recipient,
                account.network(),
                e
            ))
        })?;

    let total_input: u64 = utxos.iter().map(|u| u.value).sum();
    let spend = amount
        .checked_add(fee)
        .ok_or_else(|| WalletError::InvalidAmount("amount plus fee overflows".to_string()))?;
    if total_input < spend {
        return Err(WalletError::InsufficientFunds(format!(
            "need {} sat, {} sat selected",
            spend, total_input
        )));
    }
    let change = total_input - spend;

    let mut inputs = Vec::with_capacity(utxos.len());
    for utxo in utxos {
        inputs.push(TxIn {
            previous_output: OutPoint { txid: utxo.txid()?, vout: utxo.vout },
            script_sig: ScriptBuf::new(),
            sequence: Sequence::MAX,
            witness: Witness::new(),
        });
    }

    let mut outputs = vec![TxOut {
        value: Amount::from_sat(amount),
        script_pubkey: recipient_address.script_pubkey(),
    }];
    if change >= DUST_THRESHOLD_SAT {
        outputs.push(TxOut {
            value: Amount::from_sat(change),
            script_pubkey: account.address().script_pubkey(),
        });
    }
    // dust change is folded into the fee

    let mut tx = Transaction {
        version: Version::ONE,
        lock_time: LockTime::ZERO,
        input: inputs,
        output: outputs,
    };

    // All inputs spend the account's own P2PKH outputs, so each sighash is
    // computed against the account's script_pubkey.
    let spent_script = account.address().script_pubkey();
    let mut script_sigs = Vec::with_capacity(tx.input.len());
    {
        let cache = SighashCache::new(&tx);
        for index in 0..tx.input.len() {
            let sighash = cache
                .legacy_signature_hash(index, &spent_script, EcdsaSighashType::All.to_u32())
                .map_err(|e| {
                    WalletError::SigningFailed(format!("sighash computation failed: {}", e))
                })?;

            let mut sig_bytes = account.sign_ecdsa(sighash.as_byte_array())?;
            sig_bytes.push(EcdsaSighashType::All.to_u32() as u8);

            let sig_push = PushBytesBuf::try_from(sig_bytes).map_err(|e| {
                WalletError::SigningFailed(format!("signature push data invalid: {:?}", e))
            })?;
            let pk_push = PushBytesBuf::try_from(account.public_key_bytes()).map_err(|e| {
                WalletError::SigningFailed(format!("public key push data invalid: {:?}", e))
            })?;

            script_sigs.push(Builder::new().push_slice(sig_push).push_slice(pk_push).into_script());
        }
    }
    for (index, script_sig) in script_sigs.into_iter().enumerate() {
        tx.input[index].script_sig = script_sig;
    }

    debug!(txid = %tx.txid(), inputs = tx.input.len(), outputs = tx.output.len(), "signed transfer");
    Ok(tx)
}

/// Consensus-encode a transaction as hex for the relay.
pub fn serialize_hex(tx: &Transaction) -> String {
    hex::encode(serialize(tx))
}
