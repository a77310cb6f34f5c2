//! Bitcoin testnet relay client.
//!
//! Talks to an Esplora-style public relay: unspent outputs per address and
//! raw-transaction broadcast. This is the only component with side effects
//! on the UTXO chain; everything upstream of it is pure construction.

use bitcoin::Network;
use reqwest::Client as HttpClient;
use tracing::{debug, info};

use super::utxo::Utxo;
use crate::core::errors::WalletError;

pub struct BitcoinClient {
    base_url: String,
    http_client: HttpClient,
    network: Network,
}

impl BitcoinClient {
    pub fn new(base_url: String, network: Network) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http_client: HttpClient::new(),
            network,
        }
    }

    pub fn network(&self) -> Network {
        self.network
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Unspent outputs currently locked to `address`.
    pub async fn list_unspent(&self, address: &str) -> Result<Vec<Utxo>, WalletError> {
        let url = format!("{}/address/{}/utxo", self.base_url, address);
        debug!(%url, "listing unspent outputs");

        let response = self
            .http_client
            .get(&url)
            .send()
            .await
            .map_err(|e| WalletError::NetworkError(format!("relay request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(WalletError::NetworkError(format!(
                "relay returned {} for {}: {}",
                status,
                url,
                body.trim()
            )));
        }

        let utxos: Vec<Utxo> = response.json().await.map_err(|e| {
            WalletError::NetworkError(format!("failed to decode unspent outputs: {}", e))
        })?;
        debug!(count = utxos.len(), "unspent outputs listed");
        Ok(utxos)
    }

    /// Spendable satoshi held by `address`, as the sum of its unspent
    /// outputs.
    pub async fn address_balance(&self, address: &str) -> Result<u64, WalletError> {
        let utxos = self.list_unspent(address).await?;
        utxos
            .iter()
            .try_fold(0u64, |acc, u| acc.checked_add(u.value))
            .ok_or_else(|| WalletError::NetworkError("UTXO total overflows".to_string()))
    }

    /// Submit a raw signed transaction; the relay answers with the txid.
    ///
    /// Rejections (malformed tx, missing inputs, double spend) come back as
    /// [`WalletError::BroadcastFailure`] carrying the relay's response
    /// verbatim. There is no retry.
    pub async fn broadcast(&self, tx_hex: &str) -> Result<String, WalletError> {
        let url = format!("{}/tx", self.base_url);
        info!(%url, "broadcasting transaction");

        let response = self
            .http_client
            .post(&url)
            .body(tx_hex.to_string())
            .send()
            .await
            .map_err(|e| WalletError::BroadcastFailure(format!("relay unreachable: {}", e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| WalletError::BroadcastFailure(format!("relay response unreadable: {}", e)))?;

        if !status.is_success() {
            return Err(WalletError::BroadcastFailure(format!(
                "relay rejected transaction ({}): {}",
                status,
                body.trim()
            )));
        }

        let txid = body.trim().to_string();
        info!(%txid, "transaction broadcast");
        Ok(txid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use serde_json::json;

    fn client(server: &MockServer) -> BitcoinClient {
        BitcoinClient::new(server.base_url(), Network::Testnet)
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let c = BitcoinClient::new("http://localhost:3000/".to_string(), Network::Testnet);
        assert_eq!(c.base_url(), "http://localhost:3000");
        assert_eq!(c.network(), Network::Testnet);
    }

    // ========== unspent outputs / balance ==========

    #[tokio::test(flavor = "current_thread")]
    async fn test_list_unspent_decodes_relay_payload() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/address/mzAddr/utxo");
            then.status(200).json_body(json!([
                {"txid": "aa", "vout": 0, "value": 7000, "status": {"confirmed": true}},
                {"txid": "bb", "vout": 1, "value": 3000, "status": {"confirmed": false}}
            ]));
        });

        let utxos = client(&server).list_unspent("mzAddr").await.unwrap();
        assert_eq!(utxos.len(), 2);
        assert_eq!(utxos[0].value, 7000);
        assert!(!utxos[1].status.confirmed);
    }

    #[tokio::test(flavor = "current_thread")]
    async fn test_address_balance_sums_outputs() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/address/mzAddr/utxo");
            then.status(200).json_body(json!([
                {"txid": "aa", "vout": 0, "value": 7000},
                {"txid": "bb", "vout": 1, "value": 3000}
            ]));
        });

        assert_eq!(client(&server).address_balance("mzAddr").await.unwrap(), 10_000);
    }

    #[tokio::test(flavor = "current_thread")]
    async fn test_relay_error_is_network_error() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET);
            then.status(500).body("relay on fire");
        });

        let err = client(&server).list_unspent("mzAddr").await.unwrap_err();
        assert!(matches!(err, WalletError::NetworkError(_)));
        assert!(err.to_string().contains("relay on fire"));
    }

    // ========== broadcast ==========

    #[tokio::test(flavor = "current_thread")]
    async fn test_broadcast_returns_txid() {
        let server = MockServer::start();
        let txid = "c1".repeat(32);
        let mock = server.mock(|when, then| {
            when.method(POST).path("/tx").body("0100cafe");
            then.status(200).body(format!("{}\n", txid));
        });

        let result = client(&server).broadcast("0100cafe").await.unwrap();
        mock.assert();
        assert_eq!(result, txid);
    }

    #[tokio::test(flavor = "current_thread")]
    async fn test_broadcast_rejection_surfaces_relay_message_verbatim() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/tx");
            then.status(400)
                .body("sendrawtransaction RPC error: {\"code\":-26,\"message\":\"dust\"}");
        });

        let err = client(&server).broadcast("0100").await.unwrap_err();
        assert!(matches!(err, WalletError::BroadcastFailure(_)));
        assert!(err.to_string().contains("\"code\":-26"));
    }

    #[tokio::test(flavor = "current_thread")]
    async fn test_unreachable_relay_is_broadcast_failure() {
        let c = BitcoinClient::new("http://127.0.0.1:1".to_string(), Network::Testnet);
        let err = c.broadcast("0100").await.unwrap_err();
        assert!(matches!(err, WalletError::BroadcastFailure(_)));
    }
}
