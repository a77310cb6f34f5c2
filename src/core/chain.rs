use std::fmt;

use crate::core::errors::WalletError;

/// Ledgers the wallet knows about.
///
/// Keys are derived for all three chains on every run; transfers are only
/// supported on the account-based `Ethereum` chain and the UTXO-based
/// `BitcoinTestnet` chain. `Bitcoin` mainnet is derivation-only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Chain {
    Bitcoin,
    Ethereum,
    BitcoinTestnet,
}

impl Chain {
    /// Resolve a CLI chain tag. Recognized tags are `BTC`, `ETH` and
    /// `BTC_TEST`; anything else is rejected before any I/O happens.
    pub fn from_cli_tag(tag: &str) -> Result<Self, WalletError> {
        match tag.trim() {
            "BTC" => Ok(Chain::Bitcoin),
            "ETH" => Ok(Chain::Ethereum),
            "BTC_TEST" => Ok(Chain::BitcoinTestnet),
            other => Err(WalletError::InvalidInput(format!(
                "token type is not valid, token_type={} (expected ETH or BTC_TEST)",
                other
            ))),
        }
    }

    /// Coin symbol understood by the HD derivation oracle.
    pub fn coin_symbol(&self) -> &'static str {
        match self {
            Chain::Bitcoin => "BTC",
            Chain::Ethereum => "ETH",
            Chain::BitcoinTestnet => "BTC-test",
        }
    }

    /// Whether this chain has a transfer path in the wallet.
    pub fn supports_transfer(&self) -> bool {
        matches!(self, Chain::Ethereum | Chain::BitcoinTestnet)
    }
}

impl fmt::Display for Chain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.coin_symbol())
    }
}
