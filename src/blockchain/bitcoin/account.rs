//! Bitcoin testnet signing account.
//!
//! The account couples key material, the derived P2PKH address, and
//! transaction creation: selecting unspent outputs and signing happen in one
//! step, so a "built" UTXO transaction is always ready to broadcast.

use bitcoin::secp256k1::{Message, Secp256k1, SecretKey};
use bitcoin::{Address, Network, PublicKey};
use secrecy::{ExposeSecret, SecretString, SecretVec};
use tracing::{debug, info};

use super::client::BitcoinClient;
use super::transaction;
use super::utxo::{self, FEE_RATE_SAT_PER_VB};
use crate::core::errors::WalletError;

/// Spending account for the UTXO-based ledger.
pub struct BitcoinAccount {
    secret_key: SecretVec<u8>,
    public_key: PublicKey,
    address: Address,
    network: Network,
}

impl BitcoinAccount {
    /// Build an account from a WIF-encoded key.
    ///
    /// The WIF must encode the expected network; a mainnet key is rejected
    /// here rather than producing an unusable address later. No network
    /// access happens during construction.
    pub fn from_wif(key: &SecretString, network: Network) -> Result<Self, WalletError> {
        let raw = key.expose_secret().trim();
        if raw.is_empty() {
            return Err(WalletError::InvalidInput("key is not valid, key is empty".to_string()));
        }

        let parsed = bitcoin::PrivateKey::from_wif(raw)
            .map_err(|e| WalletError::InvalidPrivateKey(format!("invalid WIF key: {}", e)))?;
        if parsed.network != network {
            return Err(WalletError::InvalidPrivateKey(format!(
                "key encodes the {} network, expected {}",
                parsed.network, network
            )));
        }

        let secp = Secp256k1::new();
        let public_key = parsed.public_key(&secp);
        let address = Address::p2pkh(&public_key, network);
        debug!(address = %address, "bitcoin account resolved");

        Ok(Self {
            secret_key: SecretVec::new(parsed.inner.secret_bytes().to_vec()),
            public_key,
            address,
            network,
        })
    }

    pub fn address(&self) -> &Address {
        &self.address
    }

    pub fn address_string(&self) -> String {
        self.address.to_string()
    }

    pub fn network(&self) -> Network {
        self.network
    }

    pub fn public_key_bytes(&self) -> Vec<u8> {
        self.public_key.to_bytes()
    }

    fn secret_key(&self) -> Result<SecretKey, WalletError> {
        SecretKey::from_slice(self.secret_key.expose_secret())
            .map_err(|e| WalletError::SigningFailed(format!("corrupt key material: {}", e)))
    }

    /// ECDSA-sign a sighash, DER-encoded.
    pub fn sign_ecdsa(&self, sighash: &[u8; 32]) -> Result<Vec<u8>, WalletError> {
        let secp = Secp256k1::new();
        let message = Message::from_digest(*sighash);
        let signature = secp.sign_ecdsa(&message, &self.secret_key()?);
        Ok(signature.serialize_der().to_vec())
    }

    /// Spendable balance in satoshi, as seen by the relay.
    pub async fn balance(&self, relay: &BitcoinClient) -> Result<u64, WalletError> {
        relay.address_balance(&self.address_string()).await
    }

    /// Create a signed transfer: list this account's unspent outputs, select
    /// enough of them to cover `amount_sat` plus the size-based fee, and
    /// sign a P2PKH transaction paying `recipient` with change back here.
    ///
    /// Returns the transaction and its consensus-encoded hex.
    pub async fn create_transaction(
        &self,
        relay: &BitcoinClient,
        recipient: &str,
        amount_sat: u64,
    ) -> Result<(bitcoin::Transaction, String), WalletError> {
        if recipient.trim().is_empty() {
            return Err(WalletError::InvalidInput(
                "recipient is not valid, recipient is empty".to_string(),
            ));
        }
        if amount_sat == 0 {
            return Err(WalletError::InvalidAmount(
                "amount must be strictly positive".to_string(),
            ));
        }

        let utxos = relay.list_unspent(&self.address_string()).await?;
        let (selected, fee) = utxo::select_utxos(&utxos, amount_sat, FEE_RATE_SAT_PER_VB)?;
        info!(
            inputs = selected.len(),
            amount_sat,
            fee_sat = fee,
            "building testnet transfer"
        );

        let tx = transaction::build_p2pkh(self, &selected, recipient, amount_sat, fee)?;
        let raw_hex = transaction::serialize_hex(&tx);
        Ok((tx, raw_hex))
    }
}
