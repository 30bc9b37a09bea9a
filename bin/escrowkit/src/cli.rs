use std::path::PathBuf;

use clap::Parser;
use escrowkit_deploy::{ConfigOverrides, Credentials, Network};
use tracing::level_filters::LevelFilter;
use url::Url;

#[derive(Parser)]
#[command(name = "escrowkit")]
#[command(
    author,
    version,
    about = "Deploy the escrow contract to Core and record the deployment"
)]
pub struct Cli {
    /// The verbosity level.
    #[arg(short, long, env = "ESCROWKIT_VERBOSITY", default_value_t = LevelFilter::INFO)]
    pub verbosity: LevelFilter,

    /// The network to deploy to (core_testnet2, core_mainnet).
    ///
    /// Defaults to core_testnet2.
    #[arg(short, long, env = "ESCROWKIT_NETWORK")]
    pub network: Option<Network>,

    /// The URL of the RPC endpoint.
    ///
    /// If not provided, the network's public endpoint is used.
    #[arg(long, alias = "rpc", env = "ESCROWKIT_RPC_URL")]
    pub rpc_url: Option<Url>,

    /// Hex encoded private key of the deployer account.
    #[arg(long, env = "PRIVATE_KEY", hide_env_values = true)]
    pub private_key: Option<String>,

    /// BIP-39 mnemonic of the deployer account, used when no private key is given.
    ///
    /// Without a private key or a mnemonic, the accounts managed by the node are used.
    #[arg(long, env = "MNEMONIC", hide_env_values = true)]
    pub mnemonic: Option<String>,

    /// Account index to derive from the mnemonic.
    #[arg(long, env = "ESCROWKIT_ACCOUNT_INDEX")]
    pub account_index: Option<u32>,

    /// API key of the block explorer. Enables source verification when set.
    #[arg(long, env = "CORE_SCAN_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Name of the contract to deploy.
    ///
    /// Defaults to Project.
    #[arg(long, env = "ESCROWKIT_CONTRACT")]
    pub contract: Option<String>,

    /// The path to the compiler artifacts directory.
    ///
    /// Defaults to ./artifacts.
    #[arg(long, env = "ESCROWKIT_ARTIFACTS")]
    pub artifacts: Option<PathBuf>,

    /// Where to write the deployment summary.
    ///
    /// Defaults to ./deployment-info.json. An existing file is overwritten.
    #[arg(long, alias = "output", env = "ESCROWKIT_OUT")]
    pub out: Option<PathBuf>,

    /// Block confirmations to wait for before verifying.
    ///
    /// Defaults to 6.
    #[arg(long, alias = "confs", env = "ESCROWKIT_CONFIRMATIONS")]
    pub confirmations: Option<u64>,

    /// Upper bound in seconds for every wait on the chain or the explorer.
    ///
    /// Defaults to 300 seconds.
    #[arg(long, env = "ESCROWKIT_TIMEOUT")]
    pub timeout: Option<u64>,

    /// Path to a TOML configuration file.
    ///
    /// Command line flags take precedence over values from the file.
    #[arg(long, alias = "conf", env = "ESCROWKIT_CONFIG")]
    pub config: Option<PathBuf>,
}

impl Cli {
    pub fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            network: self.network,
            rpc_url: self.rpc_url.clone(),
            contract: self.contract.clone(),
            artifacts: self.artifacts.clone(),
            out: self.out.clone(),
            confirmations: self.confirmations,
            timeout_secs: self.timeout,
            account_index: self.account_index,
        }
    }

    pub fn credentials(&self) -> Credentials {
        Credentials::new(
            self.private_key.clone(),
            self.mnemonic.clone(),
            self.api_key.clone(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_arguments_keeps_defaults() {
        let cli = Cli::try_parse_from(["escrowkit"]).unwrap();
        let overrides = cli.overrides();
        assert!(overrides.network.is_none());
        assert!(overrides.confirmations.is_none());
    }

    #[test]
    fn test_flags_become_overrides() {
        let cli = Cli::try_parse_from([
            "escrowkit",
            "--network",
            "core_mainnet",
            "--confirmations",
            "2",
            "--out",
            "out.json",
        ])
        .unwrap();

        let overrides = cli.overrides();
        assert_eq!(overrides.network, Some(Network::CoreMainnet));
        assert_eq!(overrides.confirmations, Some(2));
        assert_eq!(overrides.out, Some(PathBuf::from("out.json")));
    }

    #[test]
    fn test_unknown_network_is_rejected() {
        assert!(Cli::try_parse_from(["escrowkit", "--network", "sepolia"]).is_err());
    }
}
