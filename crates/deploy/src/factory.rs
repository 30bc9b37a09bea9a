//! Contract factories backed by compiled artifacts and a JSON-RPC node.

use std::path::PathBuf;

use alloy_core::primitives::{Address, Bytes};
use anyhow::{Context, Result};

use crate::{
    ContractArtifact, ContractFactories, ContractFactory, DeployTransaction, DeployedContract,
    EthProvider,
    provider::EthSigner,
    rpc::{self, TransactionReceipt},
};

/// Loads factories from an artifacts directory.
#[derive(Debug, Clone)]
pub struct ArtifactFactories {
    provider: EthProvider,
    artifacts_dir: PathBuf,
}

impl ArtifactFactories {
    pub fn new(provider: EthProvider, artifacts_dir: PathBuf) -> Self {
        Self {
            provider,
            artifacts_dir,
        }
    }
}

impl ContractFactories for ArtifactFactories {
    type Factory = RpcContractFactory;

    async fn factory(&self, name: &str, deployer: Address) -> Result<RpcContractFactory> {
        let artifact = ContractArtifact::find(&self.artifacts_dir, name)?;
        let signer = self.provider.signer(deployer).await?;

        Ok(RpcContractFactory {
            provider: self.provider.clone(),
            signer,
            artifact,
        })
    }
}

/// Factory for a single compiled contract, connected to a signer.
#[derive(Debug, Clone)]
pub struct RpcContractFactory {
    provider: EthProvider,
    signer: EthSigner,
    artifact: ContractArtifact,
}

impl RpcContractFactory {
    pub fn artifact(&self) -> &ContractArtifact {
        &self.artifact
    }
}

impl ContractFactory for RpcContractFactory {
    type Contract = RpcDeployedContract;

    async fn deploy(&self, constructor_args: Bytes) -> Result<RpcDeployedContract> {
        let from = self.signer.address();

        let mut input = self.artifact.creation_code()?.to_vec();
        input.extend_from_slice(&constructor_args);
        let input = Bytes::from(input);

        let nonce = self
            .provider
            .nonce(from)
            .await
            .context("Failed to fetch deployer nonce")?;
        let gas_price = self
            .provider
            .gas_price()
            .await
            .context("Failed to fetch gas price")?;
        let gas_limit = self.provider.estimate_creation_gas(from, &input).await?;

        tracing::debug!(
            contract = %self.artifact.fully_qualified_name(),
            %from,
            nonce,
            gas_price,
            gas_limit,
            "Submitting deployment transaction"
        );

        let tx = self.provider.creation_tx(nonce, gas_price, gas_limit, input);
        let hash = self.provider.send_transaction(&self.signer, tx).await?;

        Ok(RpcDeployedContract {
            provider: self.provider.clone(),
            address: from.create(nonce),
            transaction: DeployTransaction {
                hash,
                gas_limit: Some(gas_limit),
                block_number: None,
            },
        })
    }
}

/// A contract deployed through [`RpcContractFactory`].
#[derive(Debug, Clone)]
pub struct RpcDeployedContract {
    provider: EthProvider,
    address: Address,
    transaction: DeployTransaction,
}

impl RpcDeployedContract {
    async fn wait_for_receipt(&self) -> Result<TransactionReceipt> {
        let rpc = self.provider.rpc();
        let hash = self.transaction.hash;

        rpc::wait_until(
            &format!("transaction {} to be mined", hash),
            self.provider.timeout,
            self.provider.poll_interval,
            || async move { rpc.transaction_receipt(hash).await },
        )
        .await
    }
}

impl DeployedContract for RpcDeployedContract {
    fn address(&self) -> Address {
        self.address
    }

    fn deploy_transaction(&self) -> &DeployTransaction {
        &self.transaction
    }

    async fn deployed(&mut self) -> Result<()> {
        let receipt = self.wait_for_receipt().await?;

        if !receipt.succeeded() {
            anyhow::bail!(
                "Deployment transaction {} reverted in block {}",
                receipt.transaction_hash,
                receipt.block_number
            );
        }

        if let Some(address) = receipt.contract_address {
            if address != self.address {
                tracing::warn!(
                    predicted = %self.address,
                    actual = %address,
                    "Contract address differs from the predicted one"
                );
                self.address = address;
            }
        }

        self.transaction.block_number = Some(receipt.block_number);
        Ok(())
    }

    async fn wait(&self, confirmations: u64) -> Result<()> {
        let mined_in = match self.transaction.block_number {
            Some(block) => block,
            None => self.wait_for_receipt().await?.block_number,
        };

        let rpc = self.provider.rpc();
        rpc::wait_until(
            &format!("{} confirmations", confirmations),
            self.provider.timeout,
            self.provider.poll_interval,
            || async move {
                let head = rpc.block_number().await?;
                if confirmation_depth(mined_in, head) >= confirmations {
                    Ok(Some(()))
                } else {
                    Ok(None)
                }
            },
        )
        .await
    }
}

/// Number of confirmations of a transaction mined in `mined_in` when the chain
/// head is `head`. The inclusion block counts as the first confirmation.
pub fn confirmation_depth(mined_in: u64, head: u64) -> u64 {
    head.saturating_add(1).saturating_sub(mined_in)
}
