//! The deployment summary written to disk at the end of a run.

use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::Network;

/// Default file name of the deployment summary.
pub const DEPLOYMENT_INFO_FILENAME: &str = "deployment-info.json";

/// Summary of a single deployment.
///
/// Field order is the order of the keys in the JSON document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentRecord {
    pub network: String,
    pub contract_address: String,
    pub deployer_address: String,
    pub transaction_hash: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_number: Option<u64>,
    /// ISO-8601 UTC timestamp with millisecond precision.
    pub timestamp: String,
    pub explorer_url: String,
}

impl DeploymentRecord {
    pub fn new(
        network: Network,
        contract_address: String,
        deployer_address: String,
        transaction_hash: String,
        block_number: Option<u64>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            network: network.to_string(),
            explorer_url: network.address_url(&contract_address),
            contract_address,
            deployer_address,
            transaction_hash,
            block_number,
            timestamp: timestamp.to_rfc3339_opts(SecondsFormat::Millis, true),
        }
    }

    /// Pretty-printed JSON, two-space indented.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("Failed to serialize deployment record")
    }

    /// Write the record to `path`, replacing any existing file.
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        let json = self.to_json()?;

        std::fs::write(path, json).context(format!(
            "Failed to write deployment info to {}",
            path.display()
        ))?;

        tracing::info!(path = %path.display(), "Deployment info saved");
        Ok(())
    }

    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).context(format!(
            "Failed to read deployment info from {}",
            path.display()
        ))?;

        serde_json::from_str(&content).context("Failed to parse deployment info JSON")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempdir::TempDir;

    fn sample_record(block_number: Option<u64>) -> DeploymentRecord {
        DeploymentRecord::new(
            Network::CoreTestnet2,
            "0x5FbDB2315678afecb367f032d93F642f64180aa3".to_string(),
            "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266".to_string(),
            "0x4a5f1c1e9a3ba2e2d0f8a6e1b7c9d0e3f2a1b4c5d6e7f8091a2b3c4d5e6f7081".to_string(),
            block_number,
            Utc.with_ymd_and_hms(2025, 1, 20, 12, 30, 5).unwrap(),
        )
    }

    #[test]
    fn test_json_layout() {
        let json = sample_record(Some(42)).to_json().unwrap();

        let expected = r#"{
  "network": "core_testnet2",
  "contractAddress": "0x5FbDB2315678afecb367f032d93F642f64180aa3",
  "deployerAddress": "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266",
  "transactionHash": "0x4a5f1c1e9a3ba2e2d0f8a6e1b7c9d0e3f2a1b4c5d6e7f8091a2b3c4d5e6f7081",
  "blockNumber": 42,
  "timestamp": "2025-01-20T12:30:05.000Z",
  "explorerUrl": "https://scan.test2.btcs.network/address/0x5FbDB2315678afecb367f032d93F642f64180aa3"
}"#;
        assert_eq!(json, expected);
    }

    #[test]
    fn test_absent_block_number_is_omitted() {
        let json = sample_record(None).to_json().unwrap();
        assert!(!json.contains("blockNumber"));

        let parsed: DeploymentRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.block_number, None);
    }

    #[test]
    fn test_save_overwrites_existing_file() {
        let temp_dir = TempDir::new("escrowkit-test").expect("Failed to create temp dir");
        let path = temp_dir.path().join(DEPLOYMENT_INFO_FILENAME);

        std::fs::write(&path, "stale content that is longer than nothing").unwrap();

        let record = sample_record(Some(7));
        record.save_to_file(&path).expect("Failed to save record");

        let loaded = DeploymentRecord::load_from_file(&path).expect("Failed to load record");
        assert_eq!(loaded, record);
    }

    #[test]
    fn test_save_to_missing_directory_fails() {
        let temp_dir = TempDir::new("escrowkit-test").expect("Failed to create temp dir");
        let path = temp_dir.path().join("missing").join(DEPLOYMENT_INFO_FILENAME);

        assert!(sample_record(None).save_to_file(&path).is_err());
    }
}
