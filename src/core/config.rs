use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::core::chain::Chain;
use crate::core::errors::WalletError;

fn default_eth_rpc_url() -> String {
    "http://127.0.0.1:7001".to_string()
}

fn default_eth_chain_id() -> u64 {
    // conventional private/dev chain id; override for public networks
    1337
}

fn default_btc_test_api_url() -> String {
    "https://blockstream.info/testnet/api".to_string()
}

fn default_derive_tool() -> PathBuf {
    PathBuf::from("./hd-wallet-derive/hd-wallet-derive.php")
}

/// Wallet configuration, loaded once per run from a JSON document.
///
/// The seed and the per-chain signing keys are the only required material:
/// `seed[0]` feeds the derivation oracle, and the signing key matching the
/// requested chain becomes the spending account. Keys are wrapped in
/// [`SecretString`] so they can be neither logged nor serialized back out.
#[derive(Debug, Deserialize)]
pub struct WalletConfig {
    /// Seed phrases; only the first entry is used.
    pub seed: Vec<SecretString>,
    /// Hex-encoded Ethereum signing key.
    #[serde(default)]
    pub eth_key: Option<SecretString>,
    /// WIF-encoded Bitcoin testnet signing key.
    #[serde(default)]
    pub btc_test_key: Option<SecretString>,
    /// Ethereum JSON-RPC endpoint.
    #[serde(default = "default_eth_rpc_url")]
    pub eth_rpc_url: String,
    /// Chain id used for replay-protected Ethereum signing.
    #[serde(default = "default_eth_chain_id")]
    pub eth_chain_id: u64,
    /// Esplora-style Bitcoin testnet relay endpoint.
    #[serde(default = "default_btc_test_api_url")]
    pub btc_test_api_url: String,
    /// Path to the external HD derivation tool.
    #[serde(default = "default_derive_tool")]
    pub derive_tool: PathBuf,
}

impl WalletConfig {
    /// Read and parse the config file. Fatal on unreadable or malformed input.
    pub fn load(path: &Path) -> Result<Self, WalletError> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            WalletError::ConfigError(format!("cannot read {}: {}", path.display(), e))
        })?;
        serde_json::from_str(&raw).map_err(|e| {
            WalletError::ConfigError(format!("malformed config {}: {}", path.display(), e))
        })
    }

    /// The seed phrase used for key derivation (`seed[0]`).
    pub fn seed(&self) -> Result<&SecretString, WalletError> {
        let seed = self
            .seed
            .first()
            .ok_or_else(|| WalletError::ConfigError("config has no seed entries".to_string()))?;
        if seed.expose_secret().trim().is_empty() {
            return Err(WalletError::ConfigError("seed is not valid, seed is empty".to_string()));
        }
        Ok(seed)
    }

    /// The fixed signing key for the requested chain. Distinct from the
    /// derived keys, which are only used as address sources.
    pub fn signing_key(&self, chain: Chain) -> Result<&SecretString, WalletError> {
        let (key, field) = match chain {
            Chain::Ethereum => (self.eth_key.as_ref(), "eth_key"),
            Chain::BitcoinTestnet => (self.btc_test_key.as_ref(), "btc_test_key"),
            Chain::Bitcoin => {
                return Err(WalletError::UnsupportedChain(
                    "no signing key slot for BTC mainnet".to_string(),
                ))
            }
        };
        key.ok_or_else(|| {
            WalletError::ConfigError(format!("config is missing the {} signing key", field))
        })
    }
}
