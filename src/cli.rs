use clap::Parser;
use rust_decimal::Decimal;
use std::path::PathBuf;
use std::str::FromStr;

use crate::core::chain::Chain;
use crate::core::errors::WalletError;
use crate::derivation::DERIVE_COUNT;

/// Multi-chain wallet transfer CLI.
#[derive(Debug, Parser)]
#[command(
    name = "multichain-wallet",
    about = "Derive HD key sets and send a transfer on ETH or BTC_TEST",
    version
)]
pub struct Cli {
    /// Path to the wallet JSON config
    #[arg(short = 'c', long)]
    pub config: PathBuf,

    /// Target chain tag: ETH or BTC_TEST
    #[arg(short = 't', long)]
    pub token: String,

    /// Derivation index selecting the recipient key (0-9)
    #[arg(short = 'i', long)]
    pub index: u32,

    /// Transfer amount in display units (ETH or BTC)
    #[arg(short = 'a', long, allow_negative_numbers = true)]
    pub amount: String,
}

impl Cli {
    /// Validate everything that can be checked without touching a file or
    /// the network, and resolve the chain tag.
    ///
    /// Strict positivity of the amount is a build-time constraint; here it
    /// only has to be a well-formed non-negative decimal.
    pub fn validate(&self) -> Result<Chain, WalletError> {
        if self.config.as_os_str().is_empty() {
            return Err(WalletError::InvalidInput("config is not valid, config is empty".to_string()));
        }

        let chain = Chain::from_cli_tag(&self.token)?;

        if self.index as usize >= DERIVE_COUNT {
            return Err(WalletError::InvalidInput(format!(
                "index is not valid, index={} (must be 0-{})",
                self.index,
                DERIVE_COUNT - 1
            )));
        }

        let amount = Decimal::from_str(self.amount.trim()).map_err(|_| {
            WalletError::InvalidInput(format!("amount is not valid, amount={}", self.amount))
        })?;
        if amount < Decimal::ZERO {
            return Err(WalletError::InvalidInput(format!(
                "amount is not valid, amount={}",
                self.amount
            )));
        }

        Ok(chain)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cli(token: &str, index: u32, amount: &str) -> Cli {
        Cli {
            config: PathBuf::from("wallet.json"),
            token: token.to_string(),
            index,
            amount: amount.to_string(),
        }
    }

    #[test]
    fn test_valid_args() {
        assert_eq!(cli("BTC_TEST", 0, "0.01").validate().unwrap(), Chain::BitcoinTestnet);
        assert_eq!(cli("ETH", 9, "2.0").validate().unwrap(), Chain::Ethereum);
    }

    #[test]
    fn test_index_out_of_range_rejected() {
        let err = cli("BTC_TEST", 10, "0.01").validate().unwrap_err();
        assert!(matches!(err, WalletError::InvalidInput(_)));
        assert!(err.to_string().contains("index=10"));
    }

    #[test]
    fn test_unknown_token_rejected() {
        assert!(cli("DOGE", 0, "1").validate().is_err());
    }

    #[test]
    fn test_bad_amounts_rejected() {
        assert!(cli("ETH", 0, "abc").validate().is_err());
        assert!(cli("ETH", 0, "-1.0").validate().is_err());
    }

    #[test]
    fn test_zero_amount_passes_cli_validation() {
        // zero survives the CLI gate; the builder enforces strict positivity
        assert!(cli("ETH", 0, "0").validate().is_ok());
    }

    #[test]
    fn test_empty_config_path_rejected() {
        let c = Cli {
            config: PathBuf::new(),
            token: "ETH".to_string(),
            index: 0,
            amount: "1".to_string(),
        };
        assert!(matches!(c.validate(), Err(WalletError::InvalidInput(_))));
    }

    #[test]
    fn test_clap_parses_short_flags() {
        let c = Cli::parse_from([
            "multichain-wallet",
            "-c",
            "conf.json",
            "-t",
            "BTC_TEST",
            "-i",
            "3",
            "-a",
            "0.5",
        ]);
        assert_eq!(c.config, PathBuf::from("conf.json"));
        assert_eq!(c.token, "BTC_TEST");
        assert_eq!(c.index, 3);
        assert_eq!(c.amount, "0.5");
    }
}
