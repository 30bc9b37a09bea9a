//! Minimal JSON-RPC client for the handful of `eth_*` calls the deployment needs.

use std::time::Duration;

use alloy_core::primitives::{Address, B256};
use anyhow::Context;
use serde::{Deserialize, de::DeserializeOwned};
use serde_json::Value;
use url::Url;

/// Default timeout for a single RPC request.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Default interval between polling attempts when waiting on the chain.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Create an HTTP client configured for JSON-RPC requests.
pub fn create_client() -> Result<reqwest::Client, anyhow::Error> {
    reqwest::Client::builder()
        .timeout(DEFAULT_TIMEOUT)
        .build()
        .context("Failed to create HTTP client")
}

/// A JSON-RPC endpoint.
#[derive(Debug, Clone)]
pub struct RpcClient {
    client: reqwest::Client,
    url: Url,
}

impl RpcClient {
    pub fn new(url: Url) -> Result<Self, anyhow::Error> {
        Ok(Self {
            client: create_client()?,
            url,
        })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Make a JSON-RPC call and deserialize the result.
    ///
    /// Returns an error if the request failed or the node answered with an error object.
    pub async fn call<T: DeserializeOwned>(
        &self,
        method: &str,
        params: Vec<Value>,
    ) -> Result<T, anyhow::Error> {
        let response = self
            .client
            .post(self.url.clone())
            .json(&serde_json::json!({
                "jsonrpc": "2.0",
                "method": method,
                "params": params,
                "id": 1
            }))
            .send()
            .await
            .with_context(|| format!("Failed to send {} request", method))?;

        let result: Value = response
            .json()
            .await
            .with_context(|| format!("Failed to parse {} response", method))?;

        if let Some(error) = result.get("error") {
            anyhow::bail!(
                "RPC error in {}: {}",
                method,
                error
                    .get("message")
                    .and_then(|m| m.as_str())
                    .unwrap_or("unknown")
            );
        }

        let result_value = result
            .get("result")
            .context("No result in response")?
            .clone();

        serde_json::from_value(result_value)
            .with_context(|| format!("Failed to deserialize {} result", method))
    }

    pub async fn chain_id(&self) -> Result<u64, anyhow::Error> {
        let id: String = self.call("eth_chainId", vec![]).await?;
        parse_quantity(&id)
    }

    pub async fn block_number(&self) -> Result<u64, anyhow::Error> {
        let number: String = self.call("eth_blockNumber", vec![]).await?;
        parse_quantity(&number)
    }

    /// Fetch a receipt, `None` while the transaction is still pending.
    pub async fn transaction_receipt(
        &self,
        hash: B256,
    ) -> Result<Option<TransactionReceipt>, anyhow::Error> {
        self.call("eth_getTransactionReceipt", vec![serde_json::json!(hash)])
            .await
    }
}

/// The subset of a transaction receipt the deployment cares about.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionReceipt {
    pub transaction_hash: B256,
    #[serde(deserialize_with = "deserialize_u64_from_hex")]
    pub block_number: u64,
    #[serde(default)]
    pub contract_address: Option<Address>,
    #[serde(default, deserialize_with = "deserialize_opt_u64_from_hex")]
    pub status: Option<u64>,
}

impl TransactionReceipt {
    /// Pre-byzantium receipts carry no status, treat those as successful.
    pub fn succeeded(&self) -> bool {
        self.status.is_none_or(|status| status == 1)
    }
}

/// Parse a hex encoded JSON-RPC quantity (`0x`-prefixed).
pub fn parse_quantity(value: &str) -> Result<u64, anyhow::Error> {
    let digits = value
        .strip_prefix("0x")
        .with_context(|| format!("Quantity is not 0x-prefixed: {}", value))?;
    u64::from_str_radix(digits, 16).with_context(|| format!("Invalid quantity: {}", value))
}

/// Deserialize a u64 from a hex string (with 0x prefix).
fn deserialize_u64_from_hex<'de, D>(deserializer: D) -> std::result::Result<u64, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s: String = Deserialize::deserialize(deserializer)?;
    parse_quantity(&s).map_err(serde::de::Error::custom)
}

fn deserialize_opt_u64_from_hex<'de, D>(
    deserializer: D,
) -> std::result::Result<Option<u64>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s: Option<String> = Deserialize::deserialize(deserializer)?;
    s.map(|s| parse_quantity(&s).map_err(serde::de::Error::custom))
        .transpose()
}

/// Poll `check_fn` until it yields a value.
///
/// # Arguments
/// * `name` - What is being waited on (for error messages)
/// * `timeout` - Maximum time to wait
/// * `interval` - Delay between two checks
/// * `check_fn` - Returns `Ok(Some(_))` once done, `Ok(None)` to keep waiting
///
/// Errors from `check_fn` are logged and polling continues; they only surface
/// as a timeout.
pub async fn wait_until<T, F, Fut>(
    name: &str,
    timeout: Duration,
    interval: Duration,
    check_fn: F,
) -> Result<T, anyhow::Error>
where
    F: Fn() -> Fut,
    Fut: std::future::Future<Output = Result<Option<T>, anyhow::Error>>,
{
    let start = std::time::Instant::now();

    loop {
        if start.elapsed() > timeout {
            anyhow::bail!("Timeout waiting for {}", name);
        }

        match check_fn().await {
            Ok(Some(value)) => return Ok(value),
            Ok(None) => {
                tracing::trace!(target_name = %name, "Not ready yet, polling again...");
            }
            Err(e) => {
                tracing::debug!(error = %e, target_name = %name, "Check failed, polling again...");
            }
        }

        tokio::time::sleep(interval).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_quantity() {
        assert_eq!(parse_quantity("0x0").unwrap(), 0);
        assert_eq!(parse_quantity("0x2a").unwrap(), 42);
        assert_eq!(parse_quantity("0x45a").unwrap(), 1114);
        assert!(parse_quantity("42").is_err());
        assert!(parse_quantity("0xzz").is_err());
    }

    #[test]
    fn test_receipt_deserialization() {
        let receipt: TransactionReceipt = serde_json::from_value(serde_json::json!({
            "transactionHash": "0x1111111111111111111111111111111111111111111111111111111111111111",
            "blockNumber": "0x2a",
            "contractAddress": "0x5fbdb2315678afecb367f032d93f642f64180aa3",
            "status": "0x1",
            "gasUsed": "0x5208"
        }))
        .unwrap();

        assert_eq!(receipt.block_number, 42);
        assert!(receipt.succeeded());
        assert_eq!(
            receipt.contract_address.unwrap().to_checksum(None),
            "0x5FbDB2315678afecb367f032d93F642f64180aa3"
        );
    }

    #[test]
    fn test_reverted_receipt() {
        let receipt: TransactionReceipt = serde_json::from_value(serde_json::json!({
            "transactionHash": "0x1111111111111111111111111111111111111111111111111111111111111111",
            "blockNumber": "0x1",
            "contractAddress": null,
            "status": "0x0"
        }))
        .unwrap();

        assert!(!receipt.succeeded());
        assert!(receipt.contract_address.is_none());
    }

    #[tokio::test]
    async fn test_wait_until_returns_first_ready_value() {
        let attempts = std::sync::atomic::AtomicU32::new(0);
        let value = wait_until(
            "counter",
            Duration::from_secs(5),
            Duration::from_millis(1),
            || {
                let n = attempts.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
                async move {
                    match n {
                        0 => anyhow::bail!("transient"),
                        1 => Ok(None),
                        _ => Ok(Some(n)),
                    }
                }
            },
        )
        .await
        .unwrap();

        assert_eq!(value, 2);
    }

    #[tokio::test]
    async fn test_wait_until_times_out() {
        let result: Result<(), _> = wait_until(
            "never",
            Duration::from_millis(20),
            Duration::from_millis(5),
            || async { Ok(None) },
        )
        .await;

        assert!(result.is_err());
    }
}
