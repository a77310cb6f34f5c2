//! HD key derivation through the external `hd-wallet-derive` oracle.
//!
//! The oracle is treated as an opaque deterministic process: it receives the
//! mnemonic and a coin symbol, and prints a JSON array of derived key records
//! on stdout. Everything else (path scheme, curves, encodings) is its
//! business. Failures of any kind surface as
//! [`WalletError::DerivationFailure`] with the oracle's raw diagnostic
//! attached, so a broken tool installation is debuggable from the log alone.

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tokio::process::Command;
use tracing::{debug, info};
use zeroize::Zeroizing;

use crate::core::chain::Chain;
use crate::core::errors::WalletError;

/// Number of keys derived per chain. Valid key indexes are `0..DERIVE_COUNT`.
pub const DERIVE_COUNT: usize = 10;

/// One derived identity as reported by the oracle.
///
/// The private key is deserialized straight into a [`SecretString`]: it is
/// redacted from `Debug` output and the type has no `Serialize` impl, so it
/// cannot leave the process through a log line or a serializer.
#[derive(Debug, Deserialize)]
pub struct KeyRecord {
    pub path: String,
    pub address: String,
    #[serde(rename = "privkey")]
    pub private_key: SecretString,
    #[serde(rename = "pubkey")]
    pub public_key: String,
}

/// Ordered set of derived keys for one chain.
#[derive(Debug)]
pub struct KeySet {
    chain: Chain,
    records: Vec<KeyRecord>,
}

impl KeySet {
    pub fn chain(&self) -> Chain {
        self.chain
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// The record at `index`; indexes run `0..DERIVE_COUNT`.
    pub fn get(&self, index: usize) -> Result<&KeyRecord, WalletError> {
        self.records.get(index).ok_or_else(|| {
            WalletError::InvalidInput(format!(
                "index is not valid, index={} (key set for {} has {} entries)",
                index,
                self.chain,
                self.records.len()
            ))
        })
    }

    pub fn addresses(&self) -> impl Iterator<Item = &str> {
        self.records.iter().map(|r| r.address.as_str())
    }
}

/// Key sets for every chain the flow derives, regardless of which chain the
/// transfer targets.
#[derive(Debug)]
pub struct DerivedKeys {
    pub btc: KeySet,
    pub eth: KeySet,
    pub btc_test: KeySet,
}

impl DerivedKeys {
    pub fn for_chain(&self, chain: Chain) -> &KeySet {
        match chain {
            Chain::Bitcoin => &self.btc,
            Chain::Ethereum => &self.eth,
            Chain::BitcoinTestnet => &self.btc_test,
        }
    }
}

/// Wrapper around the external derivation tool.
pub struct KeyDeriver {
    tool_path: PathBuf,
}

impl KeyDeriver {
    pub fn new(tool_path: impl Into<PathBuf>) -> Self {
        Self { tool_path: tool_path.into() }
    }

    pub fn tool_path(&self) -> &Path {
        &self.tool_path
    }

    /// Derive the key set for one chain by invoking the oracle once.
    ///
    /// Deterministic for identical seed and chain; nothing is cached across
    /// calls.
    pub async fn derive(&self, seed: &SecretString, chain: Chain) -> Result<KeySet, WalletError> {
        if seed.expose_secret().trim().is_empty() {
            return Err(WalletError::InvalidInput("seed is not valid, seed is empty".to_string()));
        }

        debug!(chain = %chain, tool = %self.tool_path.display(), "invoking derivation oracle");

        let mnemonic_arg = Zeroizing::new(format!("--mnemonic={}", seed.expose_secret()));
        let output = Command::new(&self.tool_path)
            .arg(mnemonic_arg.as_str())
            .arg(format!("--coin={}", chain.coin_symbol()))
            .arg(format!("--numderive={}", DERIVE_COUNT))
            .arg("--format=json")
            .arg("--cols=path,address,privkey,pubkey")
            .arg("--includeroot")
            .arg("-g")
            .output()
            .await
            .map_err(|e| {
                WalletError::DerivationFailure(format!(
                    "failed to start {}: {}",
                    self.tool_path.display(),
                    e
                ))
            })?;

        if !output.status.success() {
            return Err(WalletError::DerivationFailure(format!(
                "oracle exited with {} for {}: {}",
                output.status,
                chain,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        let records: Vec<KeyRecord> = serde_json::from_slice(&output.stdout).map_err(|e| {
            WalletError::DerivationFailure(format!(
                "oracle produced malformed output for {}: {} (stderr: {})",
                chain,
                e,
                String::from_utf8_lossy(&output.stderr).trim()
            ))
        })?;

        // --includeroot puts the root key first (path "m"); it is not one of
        // the derived identities and index 0 must stay the first child key.
        let records: Vec<KeyRecord> =
            records.into_iter().filter(|r| r.path != "m").collect();

        if records.len() != DERIVE_COUNT {
            return Err(WalletError::DerivationFailure(format!(
                "oracle returned {} records for {}, expected {}",
                records.len(),
                chain,
                DERIVE_COUNT
            )));
        }

        for (i, record) in records.iter().enumerate() {
            if record.address.trim().is_empty()
                || record.private_key.expose_secret().trim().is_empty()
            {
                return Err(WalletError::DerivationFailure(format!(
                    "oracle record {} for {} is missing an address or private key",
                    i, chain
                )));
            }
        }

        info!(chain = %chain, count = records.len(), "key set derived");
        Ok(KeySet { chain, records })
    }
}
