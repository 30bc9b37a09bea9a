//! Deployment configuration.
//!
//! Values are layered with [`figment`]: built-in defaults, then an optional TOML file,
//! then explicit overrides (CLI flags and their environment variables).

use std::{path::PathBuf, time::Duration};

use anyhow::{Context, Result};
use figment::{
    Figment,
    providers::{Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::{DEPLOYMENT_INFO_FILENAME, Network};

/// Contract deployed when none is configured.
pub const DEFAULT_CONTRACT: &str = "Project";

/// Confirmations awaited before verifying the contract.
pub const DEFAULT_CONFIRMATIONS: u64 = 6;

/// Default upper bound for waits on the chain and the explorer, in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 300;

/// Non-secret deployment settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeployConfig {
    /// Target network preset.
    pub network: Network,
    /// RPC endpoint, the preset's public endpoint if not set.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rpc_url: Option<Url>,
    /// Name of the contract to deploy.
    pub contract: String,
    /// Label used in log output.
    pub contract_label: String,
    /// Compiler artifacts directory.
    pub artifacts: PathBuf,
    /// Where the deployment summary is written.
    pub out: PathBuf,
    pub confirmations: u64,
    pub timeout_secs: u64,
    /// Derivation index when the signer comes from a mnemonic.
    pub account_index: u32,
}

impl Default for DeployConfig {
    fn default() -> Self {
        Self {
            network: Network::default(),
            rpc_url: None,
            contract: DEFAULT_CONTRACT.to_string(),
            contract_label: "Escrow Contract".to_string(),
            artifacts: PathBuf::from("artifacts"),
            out: PathBuf::from(DEPLOYMENT_INFO_FILENAME),
            confirmations: DEFAULT_CONFIRMATIONS,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            account_index: 0,
        }
    }
}

/// Explicitly set values, e.g. from the command line. `None` keeps the lower layer.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ConfigOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub network: Option<Network>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rpc_url: Option<Url>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contract: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artifacts: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub out: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confirmations: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_index: Option<u32>,
}

impl DeployConfig {
    /// Layer defaults, the TOML file at `path` (if any) and `overrides`.
    pub fn load(path: Option<&PathBuf>, overrides: &ConfigOverrides) -> Result<Self> {
        let mut figment = Figment::from(Serialized::defaults(DeployConfig::default()));

        if let Some(path) = path {
            if !path.exists() {
                anyhow::bail!("Configuration file not found: {}", path.display());
            }
            figment = figment.merge(Toml::file(path));
            tracing::debug!(path = %path.display(), "Loading configuration file");
        }

        figment
            .merge(Serialized::defaults(overrides))
            .extract()
            .context("Failed to load deployment configuration")
    }

    /// The configured RPC endpoint or the network's public one.
    pub fn rpc_url(&self) -> Result<Url> {
        match &self.rpc_url {
            Some(url) => Ok(url.clone()),
            None => Url::parse(self.network.default_rpc_url()).context("Invalid preset RPC URL"),
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Secrets, kept apart from [`DeployConfig`] so they never end up in a file or a log line.
#[derive(Clone, Default)]
pub struct Credentials {
    private_key: Option<String>,
    mnemonic: Option<String>,
    explorer_api_key: Option<String>,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("private_key", &self.private_key.as_ref().map(|_| "<redacted>"))
            .field("mnemonic", &self.mnemonic.as_ref().map(|_| "<redacted>"))
            .field(
                "explorer_api_key",
                &self.explorer_api_key.as_ref().map(|_| "<redacted>"),
            )
            .finish()
    }
}

/// Blank key material counts as unset.
fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

impl Credentials {
    pub fn new(
        private_key: Option<String>,
        mnemonic: Option<String>,
        explorer_api_key: Option<String>,
    ) -> Self {
        Self {
            private_key,
            mnemonic,
            explorer_api_key,
        }
    }

    pub fn private_key(&self) -> Option<&str> {
        non_blank(&self.private_key)
    }

    pub fn mnemonic(&self) -> Option<&str> {
        non_blank(&self.mnemonic)
    }

    /// Source verification is only attempted when this is set to a non-empty value.
    ///
    /// The key is passed through untouched, whitespace included.
    pub fn explorer_api_key(&self) -> Option<&str> {
        self.explorer_api_key.as_deref().filter(|v| !v.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempdir::TempDir;

    #[test]
    fn test_defaults() {
        let config = DeployConfig::load(None, &ConfigOverrides::default()).unwrap();
        assert_eq!(config, DeployConfig::default());
        assert_eq!(config.network, Network::CoreTestnet2);
        assert_eq!(config.contract, "Project");
        assert_eq!(config.confirmations, 6);
        assert_eq!(config.out, PathBuf::from("deployment-info.json"));
        assert_eq!(
            config.rpc_url().unwrap().as_str(),
            "https://rpc.test2.btcs.network/"
        );
    }

    #[test]
    fn test_file_then_overrides() {
        let temp_dir = TempDir::new("escrowkit-test").unwrap();
        let path = temp_dir.path().join("escrowkit.toml");
        std::fs::write(
            &path,
            r#"
network = "core_mainnet"
contract = "Escrow"
confirmations = 3
"#,
        )
        .unwrap();

        let overrides = ConfigOverrides {
            confirmations: Some(10),
            ..Default::default()
        };
        let config = DeployConfig::load(Some(&path), &overrides).unwrap();

        assert_eq!(config.network, Network::CoreMainnet);
        assert_eq!(config.contract, "Escrow");
        assert_eq!(config.confirmations, 10);
        // Untouched by both layers.
        assert_eq!(config.artifacts, PathBuf::from("artifacts"));
    }

    #[test]
    fn test_missing_file() {
        let path = PathBuf::from("/nonexistent/escrowkit.toml");
        assert!(DeployConfig::load(Some(&path), &ConfigOverrides::default()).is_err());
    }

    #[test]
    fn test_rpc_url_override() {
        let overrides = ConfigOverrides {
            rpc_url: Some(Url::parse("http://localhost:8545").unwrap()),
            ..Default::default()
        };
        let config = DeployConfig::load(None, &overrides).unwrap();
        assert_eq!(config.rpc_url().unwrap().as_str(), "http://localhost:8545/");
    }

    #[test]
    fn test_empty_api_key_disables_verification() {
        assert!(
            Credentials::new(None, None, Some(String::new()))
                .explorer_api_key()
                .is_none()
        );
        assert!(Credentials::new(None, None, None).explorer_api_key().is_none());
        assert_eq!(
            Credentials::new(None, None, Some("KEY".to_string())).explorer_api_key(),
            Some("KEY")
        );
    }

    #[test]
    fn test_whitespace_api_key_enables_verification() {
        assert_eq!(
            Credentials::new(None, None, Some("  ".to_string())).explorer_api_key(),
            Some("  ")
        );
    }

    #[test]
    fn test_blank_key_material_is_unset() {
        let credentials = Credentials::new(Some("  ".to_string()), Some("\n".to_string()), None);
        assert!(credentials.private_key().is_none());
        assert!(credentials.mnemonic().is_none());
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let credentials = Credentials::new(
            Some("0xsecretkey".to_string()),
            None,
            Some("apikey123".to_string()),
        );
        let debug = format!("{:?}", credentials);
        assert!(!debug.contains("secretkey"));
        assert!(!debug.contains("apikey123"));
        assert!(debug.contains("<redacted>"));
    }
}
