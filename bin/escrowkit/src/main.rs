//! escrowkit deploys the escrow contract to a Core network and records the deployment.

mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use url::Url;

use cli::Cli;
use escrowkit_deploy::{
    ArtifactFactories, DeployConfig, DeploySettings, Deployer, EthProvider, ExplorerVerifier,
    provider,
};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize the logger.
    tracing_subscriber::fmt()
        .with_max_level(cli.verbosity)
        .with_writer(std::io::stderr)
        .init();

    if let Err(err) = run(cli).await {
        tracing::error!(error = %format!("{:#}", err), "Deployment failed");
        return Err(err);
    }

    Ok(())
}

async fn run(cli: Cli) -> Result<()> {
    let config = DeployConfig::load(cli.config.as_ref(), &cli.overrides())?;
    let credentials = cli.credentials();

    let rpc_url = config.rpc_url()?;

    tracing::info!(
        network = %config.network,
        rpc_url = %rpc_url,
        contract = %config.contract,
        artifacts = %config.artifacts.display(),
        out = %config.out.display(),
        verify = credentials.explorer_api_key().is_some(),
        "Loaded deployment configuration"
    );

    let local_signer = provider::local_signer(&credentials, config.account_index)?;
    let provider = EthProvider::connect(
        rpc_url,
        config.network.chain_id(),
        local_signer,
        config.timeout(),
    )
    .await?;

    let factories = ArtifactFactories::new(provider.clone(), config.artifacts.clone());

    let verifier = match credentials.explorer_api_key() {
        Some(api_key) => {
            let api_url = Url::parse(config.network.explorer_api_url())
                .context("Invalid explorer API URL")?;
            Some(ExplorerVerifier::new(
                api_url,
                api_key.to_string(),
                config.artifacts.clone(),
                config.contract.clone(),
                config.timeout(),
            )?)
        }
        None => None,
    };

    Deployer::new(provider, factories, verifier, DeploySettings::from(&config))
        .deploy()
        .await?;

    Ok(())
}
