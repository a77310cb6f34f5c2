use std::fmt;

/// Custom error type for wallet operations.
///
/// Every failure in the transfer flow maps onto one of these variants and
/// propagates to the top of the orchestrator, where it is logged and turned
/// into a non-zero exit. Nothing is swallowed along the way.
#[derive(Debug)]
pub enum WalletError {
    /// Bad user-facing input: CLI flags, amounts, recipients, indexes.
    InvalidInput(String),
    /// Unreadable or malformed configuration file.
    ConfigError(String),
    /// The key-derivation oracle failed to run or produced unusable output.
    /// Carries the oracle's raw diagnostic output.
    DerivationFailure(String),
    /// The requested chain has no transfer support.
    UnsupportedChain(String),
    /// A network or relay rejected a finalized transaction.
    BroadcastFailure(String),
    /// Network/RPC failures that are not broadcast rejections.
    NetworkError(String),
    /// Malformed or wrong-network private key material.
    InvalidPrivateKey(String),
    /// Malformed chain address.
    InvalidAddress(String),
    /// Amount failed exact conversion or range checks.
    InvalidAmount(String),
    /// Spendable funds do not cover amount plus fee.
    InsufficientFunds(String),
    /// Signing failed.
    SigningFailed(String),
}

impl fmt::Display for WalletError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WalletError::InvalidInput(msg) => write!(f, "Invalid input: {}", msg),
            WalletError::ConfigError(msg) => write!(f, "Configuration error: {}", msg),
            WalletError::DerivationFailure(msg) => write!(f, "Key derivation failed: {}", msg),
            WalletError::UnsupportedChain(msg) => write!(f, "Unsupported chain: {}", msg),
            WalletError::BroadcastFailure(msg) => write!(f, "Broadcast failed: {}", msg),
            WalletError::NetworkError(msg) => write!(f, "Network error: {}", msg),
            WalletError::InvalidPrivateKey(msg) => write!(f, "Invalid private key: {}", msg),
            WalletError::InvalidAddress(msg) => write!(f, "Invalid address: {}", msg),
            WalletError::InvalidAmount(msg) => write!(f, "Invalid amount: {}", msg),
            WalletError::InsufficientFunds(msg) => write!(f, "Insufficient funds: {}", msg),
            WalletError::SigningFailed(msg) => write!(f, "Signing failed: {}", msg),
        }
    }
}

impl std::error::Error for WalletError {}
