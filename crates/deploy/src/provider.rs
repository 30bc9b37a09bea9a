//! JSON-RPC backed signer provider.

use std::time::Duration;

use alloy_consensus::{SignableTransaction, TxEnvelope, TxLegacy};
use alloy_core::primitives::{Address, B256, Bytes, TxKind, U256};
use alloy_eips::eip2718::Encodable2718;
use alloy_network::TxSignerSync;
use alloy_signer_local::{MnemonicBuilder, PrivateKeySigner, coins_bip39::English};
use anyhow::{Context, Result};
use url::Url;

use crate::{
    Credentials, SignerProvider,
    rpc::{self, RpcClient},
};

/// Extra gas added on top of the node's estimate, in percent.
const GAS_ESTIMATE_MARGIN_PERCENT: u64 = 20;

/// An account able to authorize transactions.
#[derive(Debug, Clone)]
pub enum EthSigner {
    /// Key held by this process, transactions are signed locally.
    Local(PrivateKeySigner),
    /// Account unlocked on the node, transactions are signed by the node.
    Node(Address),
}

impl EthSigner {
    pub fn address(&self) -> Address {
        match self {
            EthSigner::Local(signer) => signer.address(),
            EthSigner::Node(address) => *address,
        }
    }
}

/// Build the local signer described by `credentials`, if any.
///
/// A private key takes precedence over a mnemonic.
pub fn local_signer(
    credentials: &Credentials,
    account_index: u32,
) -> Result<Option<PrivateKeySigner>> {
    if let Some(key) = credentials.private_key() {
        let signer = key
            .parse::<PrivateKeySigner>()
            .context("Failed to parse private key")?;
        return Ok(Some(signer));
    }

    if let Some(phrase) = credentials.mnemonic() {
        let signer = MnemonicBuilder::<English>::default()
            .phrase(phrase)
            .index(account_index)
            .context("Invalid mnemonic account index")?
            .build()
            .context("Failed to derive signer from mnemonic")?;
        return Ok(Some(signer));
    }

    Ok(None)
}

/// Chain access through a JSON-RPC endpoint.
#[derive(Debug, Clone)]
pub struct EthProvider {
    rpc: RpcClient,
    chain_id: u64,
    local: Option<PrivateKeySigner>,
    /// Upper bound for every wait on the chain.
    pub timeout: Duration,
    pub poll_interval: Duration,
}

impl EthProvider {
    /// Connect to `rpc_url` and check that it serves `expected_chain_id`.
    pub async fn connect(
        rpc_url: Url,
        expected_chain_id: u64,
        local: Option<PrivateKeySigner>,
        timeout: Duration,
    ) -> Result<Self> {
        let rpc = RpcClient::new(rpc_url)?;

        let chain_id = rpc
            .chain_id()
            .await
            .with_context(|| format!("Failed to reach RPC endpoint {}", rpc.url()))?;

        if chain_id != expected_chain_id {
            anyhow::bail!(
                "RPC endpoint {} serves chain {}, expected {}",
                rpc.url(),
                chain_id,
                expected_chain_id
            );
        }

        tracing::debug!(rpc_url = %rpc.url(), chain_id, "Connected to RPC endpoint");

        Ok(Self {
            rpc,
            chain_id,
            local,
            timeout,
            poll_interval: rpc::DEFAULT_POLL_INTERVAL,
        })
    }

    pub fn rpc(&self) -> &RpcClient {
        &self.rpc
    }

    /// Resolve the signer for `address` among the configured ones.
    pub async fn signer(&self, address: Address) -> Result<EthSigner> {
        if let Some(local) = &self.local {
            if local.address() == address {
                return Ok(EthSigner::Local(local.clone()));
            }
            anyhow::bail!("No local key for account {}", address);
        }

        let accounts = self.node_accounts().await?;
        if accounts.contains(&address) {
            Ok(EthSigner::Node(address))
        } else {
            anyhow::bail!("Account {} is not managed by the node", address)
        }
    }

    async fn node_accounts(&self) -> Result<Vec<Address>> {
        self.rpc
            .call("eth_accounts", vec![])
            .await
            .context("Failed to list node accounts")
    }

    pub async fn nonce(&self, address: Address) -> Result<u64> {
        let nonce: String = self
            .rpc
            .call(
                "eth_getTransactionCount",
                vec![serde_json::json!(address), serde_json::json!("pending")],
            )
            .await?;
        rpc::parse_quantity(&nonce)
    }

    pub async fn gas_price(&self) -> Result<u128> {
        let price: String = self.rpc.call("eth_gasPrice", vec![]).await?;
        Ok(u128::from(rpc::parse_quantity(&price)?))
    }

    /// Estimate the gas of a contract creation, with a safety margin.
    pub async fn estimate_creation_gas(&self, from: Address, input: &Bytes) -> Result<u64> {
        let estimate: String = self
            .rpc
            .call(
                "eth_estimateGas",
                vec![serde_json::json!({ "from": from, "data": input })],
            )
            .await
            .context("Failed to estimate deployment gas")?;
        Ok(with_gas_margin(rpc::parse_quantity(&estimate)?))
    }

    /// Sign (if needed) and submit a transaction, returning its hash.
    pub async fn send_transaction(&self, signer: &EthSigner, tx: TxLegacy) -> Result<B256> {
        match signer {
            EthSigner::Local(key) => {
                let raw = sign_legacy(key, tx)?;
                self.rpc
                    .call(
                        "eth_sendRawTransaction",
                        vec![serde_json::json!(format!("0x{}", hex::encode(raw)))],
                    )
                    .await
                    .context("Failed to submit signed transaction")
            }
            EthSigner::Node(from) => {
                let mut request = serde_json::json!({
                    "from": from,
                    "data": tx.input,
                    "gas": format!("0x{:x}", tx.gas_limit),
                    "gasPrice": format!("0x{:x}", tx.gas_price),
                    "nonce": format!("0x{:x}", tx.nonce),
                });
                if let TxKind::Call(to) = tx.to {
                    request["to"] = serde_json::json!(to);
                }
                self.rpc
                    .call("eth_sendTransaction", vec![request])
                    .await
                    .context("Failed to submit transaction to the node")
            }
        }
    }

    /// Build an unsigned contract creation transaction for this chain.
    pub fn creation_tx(
        &self,
        nonce: u64,
        gas_price: u128,
        gas_limit: u64,
        input: Bytes,
    ) -> TxLegacy {
        TxLegacy {
            chain_id: Some(self.chain_id),
            nonce,
            gas_price,
            gas_limit,
            to: TxKind::Create,
            value: U256::ZERO,
            input,
        }
    }
}

/// Add the safety margin to a gas estimate, saturating on absurd node answers.
fn with_gas_margin(estimate: u64) -> u64 {
    estimate.saturating_add(estimate.saturating_mul(GAS_ESTIMATE_MARGIN_PERCENT) / 100)
}

/// Sign a legacy transaction and return its EIP-2718 encoding.
fn sign_legacy(key: &PrivateKeySigner, mut tx: TxLegacy) -> Result<Vec<u8>> {
    let signature = key
        .sign_transaction_sync(&mut tx)
        .context("Failed to sign transaction")?;
    let envelope = TxEnvelope::from(tx.into_signed(signature));
    Ok(envelope.encoded_2718())
}

impl SignerProvider for EthProvider {
    async fn signers(&self) -> Result<Vec<Address>> {
        match &self.local {
            Some(local) => Ok(vec![local.address()]),
            None => self.node_accounts().await,
        }
    }

    async fn balance(&self, address: Address) -> Result<U256> {
        self.rpc
            .call(
                "eth_getBalance",
                vec![serde_json::json!(address), serde_json::json!("latest")],
            )
            .await
            .with_context(|| format!("Failed to fetch balance of {}", address))
    }
}
