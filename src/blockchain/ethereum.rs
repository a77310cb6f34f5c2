//! Account-based (Ethereum) chain support: RPC client, signing account and
//! transfer construction.
//!
//! The reference flow builds and signs a legacy transaction with a fixed gas
//! budget but deliberately never broadcasts it; the send path reports an
//! explicit skip instead (see `wallet::ETH_BROADCAST_SKIPPED`).

use anyhow::Result;
use ethers::providers::{Http, Middleware, Provider};
use ethers::signers::{LocalWallet, Signer};
use ethers::types::transaction::eip2718::TypedTransaction;
use ethers::types::{Address, Bytes, TransactionRequest, U256};
use ethers::utils::to_checksum;
use secrecy::{ExposeSecret, SecretString};
use std::str::FromStr;
use tracing::{debug, info};
use zeroize::Zeroizing;

use crate::core::errors::WalletError;
use crate::core::units;

/// Fixed gas budget for a transfer.
pub const TRANSFER_GAS_LIMIT: u64 = 200_000;
/// Fixed gas price: 50 gwei.
pub const TRANSFER_GAS_PRICE_WEI: u64 = 50_000_000_000;

/// Thin JSON-RPC client for the account-based ledger.
#[derive(Debug, Clone)]
pub struct EthereumClient {
    provider: Provider<Http>,
    rpc_url: String,
}

impl EthereumClient {
    pub fn new(rpc_url: &str) -> Result<Self> {
        let rpc_url = rpc_url.trim();
        let provider = Provider::<Http>::try_from(rpc_url).map_err(|e| {
            anyhow::anyhow!("invalid Ethereum RPC URL '{}': {}", rpc_url, e)
        })?;
        Ok(Self { provider, rpc_url: rpc_url.to_string() })
    }

    pub fn rpc_url(&self) -> &str {
        &self.rpc_url
    }

    /// Current transaction count (nonce) for an address.
    pub async fn transaction_count(&self, address: Address) -> Result<U256, WalletError> {
        debug!(address = %to_checksum(&address, None), "fetching transaction count");
        self.provider.get_transaction_count(address, None).await.map_err(|e| {
            WalletError::NetworkError(format!(
                "failed to fetch transaction count from {}: {}",
                self.rpc_url, e
            ))
        })
    }
}

/// Signing account for the account-based ledger.
///
/// Wraps the configured hex private key; the key bytes only exist outside
/// the signer for the duration of construction.
pub struct EthereumAccount {
    wallet: LocalWallet,
}

impl EthereumAccount {
    /// Build an account from a hex-encoded 32-byte signing key.
    ///
    /// Rejects empty and malformed keys before anything else happens; no
    /// network access is involved.
    pub fn from_signing_key(key: &SecretString, chain_id: u64) -> Result<Self, WalletError> {
        let raw = key.expose_secret().trim();
        if raw.is_empty() {
            return Err(WalletError::InvalidInput("key is not valid, key is empty".to_string()));
        }

        let hex_part = raw.strip_prefix("0x").unwrap_or(raw);
        let bytes = Zeroizing::new(hex::decode(hex_part).map_err(|e| {
            WalletError::InvalidPrivateKey(format!("Ethereum key is not valid hex: {}", e))
        })?);
        if bytes.len() != 32 {
            return Err(WalletError::InvalidPrivateKey(format!(
                "Ethereum private key must be 32 bytes, got {}",
                bytes.len()
            )));
        }

        let wallet = LocalWallet::from_bytes(&bytes)
            .map_err(|e| WalletError::InvalidPrivateKey(format!("invalid Ethereum key: {}", e)))?
            .with_chain_id(chain_id);

        Ok(Self { wallet })
    }

    pub fn address(&self) -> Address {
        self.wallet.address()
    }

    pub fn address_string(&self) -> String {
        to_checksum(&self.wallet.address(), None)
    }

    pub fn chain_id(&self) -> u64 {
        self.wallet.chain_id()
    }

    /// Sign a built transaction and return the raw RLP-encoded bytes.
    pub async fn sign(&self, tx: &TypedTransaction) -> Result<Bytes, WalletError> {
        let signature = self
            .wallet
            .sign_transaction(tx)
            .await
            .map_err(|e| WalletError::SigningFailed(format!("Ethereum signing failed: {}", e)))?;
        Ok(tx.rlp_signed(&signature))
    }
}

/// Build an unsigned legacy transfer for the account.
///
/// The sequence number is fetched live, so rebuilding at a later time may
/// differ in the nonce; everything else is fixed by the inputs.
pub async fn build_transfer(
    client: &EthereumClient,
    account: &EthereumAccount,
    recipient: &str,
    amount: &str,
) -> Result<TypedTransaction, WalletError> {
    let recipient = recipient.trim();
    if recipient.is_empty() {
        return Err(WalletError::InvalidInput(
            "recipient is not valid, recipient is empty".to_string(),
        ));
    }
    let to = Address::from_str(recipient).map_err(|e| {
        WalletError::InvalidAddress(format!("invalid Ethereum recipient '{}': {}", recipient, e))
    })?;
    let value = units::eth_to_wei(amount)?;

    let nonce = client.transaction_count(account.address()).await?;

    let request = TransactionRequest::new()
        .from(account.address())
        .to(to)
        .value(value)
        .gas(TRANSFER_GAS_LIMIT)
        .gas_price(TRANSFER_GAS_PRICE_WEI)
        .nonce(nonce)
        .chain_id(account.chain_id());

    info!(
        to = %to_checksum(&to, None),
        value_wei = %value,
        nonce = %nonce,
        "built Ethereum transfer"
    );

    Ok(TypedTransaction::Legacy(request))
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use serde_json::json;

    // secp256k1 generator point key; its address is a standard test vector
    const KEY_ONE: &str = "0000000000000000000000000000000000000000000000000000000000000001";
    const KEY_ONE_ADDRESS: &str = "0x7e5f4552091a69125d5dfcb7b8c2659029395bdf";

    fn secret(s: &str) -> SecretString {
        SecretString::new(s.to_string())
    }

    // ========== account construction ==========

    #[test]
    fn test_account_from_known_key() {
        let account = EthereumAccount::from_signing_key(&secret(KEY_ONE), 1337).unwrap();
        assert_eq!(format!("{:?}", account.address()), KEY_ONE_ADDRESS);
        assert_eq!(account.chain_id(), 1337);
        assert_eq!(account.address_string().to_lowercase(), KEY_ONE_ADDRESS);
    }

    #[test]
    fn test_account_accepts_0x_prefix() {
        let plain = EthereumAccount::from_signing_key(&secret(KEY_ONE), 1).unwrap();
        let prefixed =
            EthereumAccount::from_signing_key(&secret(&format!("0x{}", KEY_ONE)), 1).unwrap();
        assert_eq!(plain.address(), prefixed.address());
    }

    #[test]
    fn test_empty_key_is_invalid_input() {
        let err = EthereumAccount::from_signing_key(&secret(""), 1).unwrap_err();
        assert!(matches!(err, WalletError::InvalidInput(_)));
    }

    #[test]
    fn test_malformed_keys_rejected() {
        for raw in ["zz", "1234", "0xdeadbeef", &KEY_ONE[..62]] {
            let err = EthereumAccount::from_signing_key(&secret(raw), 1).unwrap_err();
            assert!(matches!(err, WalletError::InvalidPrivateKey(_)), "{}", raw);
        }
    }

    // ========== transfer construction ==========

    #[tokio::test(flavor = "current_thread")]
    async fn test_build_transfer_fields() {
        let server = MockServer::start();
        let nonce_mock = server.mock(|when, then| {
            when.method(POST).path("/").body_contains("eth_getTransactionCount");
            then.status(200)
                .header("content-type", "application/json")
                .json_body(json!({"jsonrpc": "2.0", "id": 1, "result": "0x7"}));
        });

        let client = EthereumClient::new(&server.base_url()).unwrap();
        let account = EthereumAccount::from_signing_key(&secret(KEY_ONE), 1337).unwrap();
        let tx = build_transfer(
            &client,
            &account,
            "0x34BF41B6269B41A07d97603b6B4Ea5C6069eAf79",
            "2.0",
        )
        .await
        .unwrap();

        nonce_mock.assert();
        match tx {
            TypedTransaction::Legacy(request) => {
                assert_eq!(
                    request.value,
                    Some(U256::from_dec_str("2000000000000000000").unwrap())
                );
                assert_eq!(request.gas, Some(U256::from(TRANSFER_GAS_LIMIT)));
                assert_eq!(request.gas_price, Some(U256::from(TRANSFER_GAS_PRICE_WEI)));
                assert_eq!(request.nonce, Some(U256::from(7)));
            }
            other => panic!("expected a legacy transaction, got {:?}", other),
        }
    }

    #[tokio::test(flavor = "current_thread")]
    async fn test_build_and_sign_produces_raw_bytes() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/");
            then.status(200)
                .header("content-type", "application/json")
                .json_body(json!({"jsonrpc": "2.0", "id": 1, "result": "0x0"}));
        });

        let client = EthereumClient::new(&server.base_url()).unwrap();
        let account = EthereumAccount::from_signing_key(&secret(KEY_ONE), 1337).unwrap();
        let tx = build_transfer(&client, &account, KEY_ONE_ADDRESS, "0.5").await.unwrap();

        let raw = account.sign(&tx).await.unwrap();
        assert!(!raw.is_empty());
    }

    #[tokio::test(flavor = "current_thread")]
    async fn test_precondition_failures_skip_the_network() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST);
            then.status(500);
        });

        let client = EthereumClient::new(&server.base_url()).unwrap();
        let account = EthereumAccount::from_signing_key(&secret(KEY_ONE), 1).unwrap();

        let err = build_transfer(&client, &account, "", "1.0").await.unwrap_err();
        assert!(matches!(err, WalletError::InvalidInput(_)));

        let err = build_transfer(&client, &account, "not-an-address", "1.0").await.unwrap_err();
        assert!(matches!(err, WalletError::InvalidAddress(_)));

        let err = build_transfer(&client, &account, KEY_ONE_ADDRESS, "-3").await.unwrap_err();
        assert!(matches!(err, WalletError::InvalidAmount(_)));

        assert_eq!(mock.hits(), 0);
    }

    #[tokio::test(flavor = "current_thread")]
    async fn test_rpc_failure_is_network_error() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST);
            then.status(503).body("maintenance");
        });

        let client = EthereumClient::new(&server.base_url()).unwrap();
        let account = EthereumAccount::from_signing_key(&secret(KEY_ONE), 1).unwrap();
        let err = build_transfer(&client, &account, KEY_ONE_ADDRESS, "1").await.unwrap_err();
        assert!(matches!(err, WalletError::NetworkError(_)));
    }

    #[test]
    fn test_client_rejects_garbage_url() {
        assert!(EthereumClient::new("not a url").is_err());
    }
}
