use std::path::PathBuf;

use alloy_core::primitives::Bytes;
use anyhow::{Context, Result};
use chrono::Utc;

use crate::{
    ContractFactories, ContractFactory, DeployConfig, DeployedContract, DeploymentRecord, Network,
    SignerProvider, Verifier,
};

/// Settings of a single deployment run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeploySettings {
    pub network: Network,
    /// Contract to deploy.
    pub contract: String,
    /// Label used in log output.
    pub contract_label: String,
    /// Confirmations to wait for before verifying.
    pub confirmations: u64,
    /// Where the deployment summary is written.
    pub out: PathBuf,
}

impl From<&DeployConfig> for DeploySettings {
    fn from(config: &DeployConfig) -> Self {
        Self {
            network: config.network,
            contract: config.contract.clone(),
            contract_label: config.contract_label.clone(),
            confirmations: config.confirmations,
            out: config.out.clone(),
        }
    }
}

/// Runs the deployment: deploy, optionally verify, write the summary.
///
/// The steps run strictly in sequence. Errors before the summary is written abort the
/// run, errors while verifying are logged and ignored.
pub struct Deployer<P, F, V> {
    provider: P,
    factories: F,
    /// Verification is skipped when no verifier is configured.
    verifier: Option<V>,
    settings: DeploySettings,
}

impl<P, F, V> Deployer<P, F, V>
where
    P: SignerProvider,
    F: ContractFactories,
    V: Verifier,
{
    pub fn new(provider: P, factories: F, verifier: Option<V>, settings: DeploySettings) -> Self {
        Self {
            provider,
            factories,
            verifier,
            settings,
        }
    }

    pub async fn deploy(self) -> Result<DeploymentRecord> {
        let network = self.settings.network;

        tracing::info!(
            network = %network,
            chain_id = network.chain_id(),
            "Starting deployment to {}...",
            network.display_name()
        );

        let deployer = self
            .provider
            .signers()
            .await
            .context("Failed to resolve signers")?
            .into_iter()
            .next()
            .context("No signer available, configure a private key or a mnemonic")?;

        let balance = self
            .provider
            .balance(deployer)
            .await
            .context("Failed to fetch deployer balance")?;

        tracing::info!(%deployer, "Deploying contracts with the account");
        tracing::info!(%balance, "Account balance (wei)");

        let factory = self
            .factories
            .factory(&self.settings.contract, deployer)
            .await
            .with_context(|| {
                format!(
                    "Failed to load contract factory for {}",
                    self.settings.contract
                )
            })?;

        tracing::info!(
            contract = %self.settings.contract,
            "Deploying {}...",
            self.settings.contract_label
        );

        let mut contract = factory
            .deploy(Bytes::new())
            .await
            .context("Failed to submit deployment transaction")?;

        contract
            .deployed()
            .await
            .context("Deployment transaction was not mined")?;

        let address = contract.address().to_checksum(None);
        let tx = contract.deploy_transaction().clone();

        tracing::info!("{} deployed successfully!", self.settings.contract_label);
        tracing::info!(contract_address = %address, "Contract address");
        tracing::info!(tx_hash = %tx.hash, "Transaction hash");
        match tx.gas_limit {
            Some(gas_limit) => tracing::info!(gas_limit, "Gas limit"),
            None => tracing::info!("Gas limit not reported by the provider"),
        }

        if let Some(verifier) = &self.verifier {
            if let Err(err) = self.verify(verifier, &contract).await {
                tracing::warn!(error = %format!("{:#}", err), "Error verifying contract");
            }
        }

        let record = DeploymentRecord::new(
            network,
            address,
            deployer.to_checksum(None),
            tx.hash.to_string(),
            tx.block_number,
            Utc::now(),
        );

        tracing::info!("");
        tracing::info!("=== Deployment Summary ===");
        tracing::info!("Contract Name:    {}", self.settings.contract_label);
        tracing::info!("Network:          {}", network.display_name());
        tracing::info!("Deployer:         {}", record.deployer_address);
        tracing::info!("Contract Address: {}", record.contract_address);
        tracing::info!("Explorer URL:     {}", record.explorer_url);
        tracing::info!("");

        record.save_to_file(&self.settings.out)?;

        Ok(record)
    }

    async fn verify(
        &self,
        verifier: &V,
        contract: &<F::Factory as ContractFactory>::Contract,
    ) -> Result<()> {
        tracing::info!(
            confirmations = self.settings.confirmations,
            "Waiting for block confirmations..."
        );
        contract
            .wait(self.settings.confirmations)
            .await
            .context("Failed waiting for confirmations")?;

        tracing::info!(
            "Verifying contract on {} explorer...",
            self.settings.network.display_name()
        );
        verifier.verify(contract.address(), Bytes::new()).await?;

        tracing::info!("Contract verified successfully!");
        Ok(())
    }
}
