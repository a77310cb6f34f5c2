//! Minimal multi-chain hot wallet.
//!
//! Given a seed and a target chain, the wallet derives deterministic key
//! sets through an external HD-derivation oracle, turns the configured
//! signing key into a spendable account, builds a chain-appropriate
//! transaction and, for the UTXO chain, broadcasts it to a public testnet
//! relay. Two structurally different ledger models sit behind one contract:
//! an account/nonce-based chain (ETH) and a UTXO-based chain (BTC testnet).

pub mod blockchain;
pub mod cli;
pub mod core;
pub mod derivation;
pub mod wallet;

pub use crate::core::chain::Chain;
pub use crate::core::config::WalletConfig;
pub use crate::core::errors::WalletError;
pub use crate::wallet::{TransferOutcome, Wallet};
