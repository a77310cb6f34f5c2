//! The transaction abstraction layer and top-level transfer flow.
//!
//! One contract covers both ledger models: resolve a signing account from
//! the configured key, build a chain-appropriate transaction, then hand it
//! to the broadcaster. The account-based chain stops deliberately short of
//! broadcast (see [`ETH_BROADCAST_SKIPPED`]); the UTXO chain submits to the
//! public testnet relay. All collaborators are owned by [`Wallet`] and
//! passed down explicitly; there is no ambient network state.

use bitcoin::Network;
use ethers::types::transaction::eip2718::TypedTransaction;
use ethers::types::Bytes;
use tracing::{debug, info};

use crate::blockchain::bitcoin::{BitcoinAccount, BitcoinClient};
use crate::blockchain::ethereum::{self, EthereumAccount, EthereumClient};
use crate::core::chain::Chain;
use crate::core::config::WalletConfig;
use crate::core::errors::WalletError;
use crate::core::units;
use crate::derivation::{DerivedKeys, KeyDeriver};

/// Documented sentinel for the account-chain send path: the reference flow
/// builds and signs but never broadcasts on ETH.
pub const ETH_BROADCAST_SKIPPED: &str =
    "broadcast is not implemented for the ETH flow; the transaction was built and signed but not submitted";

/// Chain-specific signing account handle.
pub enum Account {
    Ethereum(EthereumAccount),
    BitcoinTestnet(BitcoinAccount),
}

impl Account {
    pub fn chain(&self) -> Chain {
        match self {
            Account::Ethereum(_) => Chain::Ethereum,
            Account::BitcoinTestnet(_) => Chain::BitcoinTestnet,
        }
    }

    pub fn address(&self) -> String {
        match self {
            Account::Ethereum(account) => account.address_string(),
            Account::BitcoinTestnet(account) => account.address_string(),
        }
    }
}

/// A constructed transfer, immutable once produced.
///
/// The two ledger models finish construction in different states: the
/// account-based transaction is assembled and signed but not submitted,
/// while the UTXO transaction leaves the builder already signed and
/// relay-ready.
pub enum BuiltTransaction {
    Ethereum {
        request: TypedTransaction,
        raw_signed: Bytes,
    },
    BitcoinTestnet {
        txid: String,
        raw_hex: String,
    },
}

/// What happened at the end of the flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransferOutcome {
    /// The transaction was accepted by the relay.
    Broadcast { txid: String },
    /// The chain's send path is deliberately not wired up; the transaction
    /// was still built (and signed where applicable).
    Skipped { reason: String },
}

/// Owns the configuration and every external collaborator the flow needs.
pub struct Wallet {
    config: WalletConfig,
    deriver: KeyDeriver,
    eth: EthereumClient,
    btc_test: BitcoinClient,
}

impl Wallet {
    pub fn new(config: WalletConfig) -> Result<Self, WalletError> {
        let deriver = KeyDeriver::new(&config.derive_tool);
        let eth = EthereumClient::new(&config.eth_rpc_url)
            .map_err(|e| WalletError::ConfigError(e.to_string()))?;
        let btc_test = BitcoinClient::new(config.btc_test_api_url.clone(), Network::Testnet);
        Ok(Self { config, deriver, eth, btc_test })
    }

    pub fn config(&self) -> &WalletConfig {
        &self.config
    }

    /// Derive key sets for every chain, regardless of the transfer target.
    ///
    /// Only addresses make it into the log; the derived private keys stay
    /// inside the records.
    pub async fn derive_all(&self) -> Result<DerivedKeys, WalletError> {
        let seed = self.config.seed()?;
        let btc = self.deriver.derive(seed, Chain::Bitcoin).await?;
        let eth = self.deriver.derive(seed, Chain::Ethereum).await?;
        let btc_test = self.deriver.derive(seed, Chain::BitcoinTestnet).await?;

        for keyset in [&btc, &eth, &btc_test] {
            for (index, address) in keyset.addresses().enumerate() {
                debug!(chain = %keyset.chain(), index, %address, "derived address");
            }
        }
        Ok(DerivedKeys { btc, eth, btc_test })
    }

    /// Turn the configured signing key for `chain` into an account handle.
    pub fn resolve_account(&self, chain: Chain) -> Result<Account, WalletError> {
        match chain {
            Chain::Ethereum => {
                let key = self.config.signing_key(chain)?;
                let account = EthereumAccount::from_signing_key(key, self.config.eth_chain_id)?;
                Ok(Account::Ethereum(account))
            }
            Chain::BitcoinTestnet => {
                let key = self.config.signing_key(chain)?;
                let account = BitcoinAccount::from_wif(key, self.btc_test.network())?;
                Ok(Account::BitcoinTestnet(account))
            }
            Chain::Bitcoin => Err(WalletError::UnsupportedChain(
                "token_type not supported. Must be ETH or BTC_TEST".to_string(),
            )),
        }
    }

    /// Build the chain-appropriate transfer.
    ///
    /// Account-based: fetch the nonce, assemble the fixed-gas legacy
    /// transaction, and sign it. UTXO-based: the account selects and signs
    /// in one step and the result is ready to broadcast.
    pub async fn build_transfer(
        &self,
        chain: Chain,
        account: &Account,
        recipient: &str,
        amount: &str,
    ) -> Result<BuiltTransaction, WalletError> {
        match (chain, account) {
            (Chain::Ethereum, Account::Ethereum(account)) => {
                let request =
                    ethereum::build_transfer(&self.eth, account, recipient, amount).await?;
                let raw_signed = account.sign(&request).await?;
                Ok(BuiltTransaction::Ethereum { request, raw_signed })
            }
            (Chain::BitcoinTestnet, Account::BitcoinTestnet(account)) => {
                let amount_sat = units::btc_to_sat(amount)?;
                let (tx, raw_hex) =
                    account.create_transaction(&self.btc_test, recipient, amount_sat).await?;
                Ok(BuiltTransaction::BitcoinTestnet { txid: tx.txid().to_string(), raw_hex })
            }
            (Chain::Bitcoin, _) => Err(WalletError::UnsupportedChain(
                "token_type not supported. Must be ETH or BTC_TEST".to_string(),
            )),
            _ => Err(WalletError::InvalidInput(format!(
                "account for {} cannot build a {} transfer",
                account.chain(),
                chain
            ))),
        }
    }

    /// Dispatch a built transfer.
    pub async fn send(
        &self,
        chain: Chain,
        built: &BuiltTransaction,
    ) -> Result<TransferOutcome, WalletError> {
        match (chain, built) {
            (Chain::Ethereum, BuiltTransaction::Ethereum { .. }) => {
                info!(reason = ETH_BROADCAST_SKIPPED, "skipping broadcast");
                Ok(TransferOutcome::Skipped { reason: ETH_BROADCAST_SKIPPED.to_string() })
            }
            (Chain::BitcoinTestnet, BuiltTransaction::BitcoinTestnet { raw_hex, .. }) => {
                let txid = self.btc_test.broadcast(raw_hex).await?;
                Ok(TransferOutcome::Broadcast { txid })
            }
            (Chain::Bitcoin, _) => Err(WalletError::UnsupportedChain(
                "token_type not supported. Must be ETH or BTC_TEST".to_string(),
            )),
            _ => Err(WalletError::InvalidInput(format!(
                "built transaction does not belong to {}",
                chain
            ))),
        }
    }

    /// The full linear flow: derive keys for all chains, pick the derived
    /// address at `index` on the requested chain as recipient, resolve the
    /// configured signing account, build, then broadcast or skip.
    pub async fn run_transfer(
        &self,
        chain: Chain,
        index: usize,
        amount: &str,
    ) -> Result<TransferOutcome, WalletError> {
        if !chain.supports_transfer() {
            return Err(WalletError::UnsupportedChain(
                "token_type not supported. Must be ETH or BTC_TEST".to_string(),
            ));
        }

        let keys = self.derive_all().await?;
        let record = keys.for_chain(chain).get(index)?;

        let account = self.resolve_account(chain)?;
        info!(
            %chain,
            account = %account.address(),
            recipient = %record.address,
            index,
            "account resolved"
        );

        if let Account::BitcoinTestnet(btc_account) = &account {
            let balance = btc_account.balance(&self.btc_test).await?;
            info!(balance_btc = %units::sat_to_btc(balance), "spendable balance");
        }

        let built = self.build_transfer(chain, &account, &record.address, amount).await?;
        self.send(chain, &built).await
    }
}
