//! UTXO-based (Bitcoin testnet) chain support.

pub mod account;
pub mod client;
pub mod transaction;
pub mod utxo;

pub use account::BitcoinAccount;
pub use client::BitcoinClient;
pub use utxo::Utxo;
