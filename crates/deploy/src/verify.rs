//! Source verification on an Etherscan-compatible block explorer.

use std::{path::PathBuf, time::Duration};

use alloy_core::primitives::{Address, Bytes};
use anyhow::{Context, Result};
use serde::Deserialize;
use url::Url;

use crate::{ContractArtifact, Verifier, rpc};

/// Default interval between two verification status checks.
pub const STATUS_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Verifies contracts through the explorer's `module=contract` API.
#[derive(Debug, Clone)]
pub struct ExplorerVerifier {
    client: reqwest::Client,
    api_url: Url,
    api_key: String,
    artifacts_dir: PathBuf,
    contract: String,
    timeout: Duration,
    poll_interval: Duration,
}

impl ExplorerVerifier {
    pub fn new(
        api_url: Url,
        api_key: String,
        artifacts_dir: PathBuf,
        contract: String,
        timeout: Duration,
    ) -> Result<Self> {
        Ok(Self {
            client: rpc::create_client()?,
            api_url,
            api_key,
            artifacts_dir,
            contract,
            timeout,
            poll_interval: STATUS_POLL_INTERVAL,
        })
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    async fn submit(&self, address: Address, constructor_args: &Bytes) -> Result<Submission> {
        let artifact = ContractArtifact::find(&self.artifacts_dir, &self.contract)?;
        let build_info = artifact.build_info()?;

        let source_code = serde_json::to_string(&build_info.input)
            .context("Failed to serialize compiler input")?;
        let contract_address = address.to_checksum(None);
        let contract_name = artifact.fully_qualified_name();
        let compiler_version = format!("v{}", build_info.solc_long_version);
        let constructor_args = hex::encode(constructor_args);

        tracing::debug!(
            %contract_address,
            %contract_name,
            %compiler_version,
            "Submitting verification request"
        );

        let form = [
            ("apikey", self.api_key.as_str()),
            ("module", "contract"),
            ("action", "verifysourcecode"),
            ("contractaddress", contract_address.as_str()),
            ("sourceCode", source_code.as_str()),
            ("codeformat", "solidity-standard-json-input"),
            ("contractname", contract_name.as_str()),
            ("compilerversion", compiler_version.as_str()),
            // Misspelled on the API side.
            ("constructorArguements", constructor_args.as_str()),
        ];

        let response: ExplorerResponse = self
            .client
            .post(self.api_url.clone())
            .form(&form)
            .send()
            .await
            .context("Failed to send verification request")?
            .json()
            .await
            .context("Failed to parse verification response")?;

        response.submission()
    }

    async fn check_status(&self, guid: &str) -> Result<ExplorerResponse> {
        self.client
            .get(self.api_url.clone())
            .query(&[
                ("apikey", self.api_key.as_str()),
                ("module", "contract"),
                ("action", "checkverifystatus"),
                ("guid", guid),
            ])
            .send()
            .await
            .context("Failed to send verification status request")?
            .json()
            .await
            .context("Failed to parse verification status response")
    }
}

impl Verifier for ExplorerVerifier {
    async fn verify(&self, address: Address, constructor_args: Bytes) -> Result<()> {
        let guid = match self.submit(address, &constructor_args).await? {
            Submission::AlreadyVerified => {
                tracing::info!(%address, "Contract is already verified");
                return Ok(());
            }
            Submission::Pending(guid) => guid,
        };

        tracing::debug!(%guid, "Verification submitted, waiting for the result...");

        let guid = guid.as_str();
        let status = rpc::wait_until(
            "verification result",
            self.timeout,
            self.poll_interval,
            || async move {
                // Transport errors keep polling, a verdict ends it.
                let response = self.check_status(guid).await?;
                match response.status() {
                    Ok(VerificationStatus::Pending) => Ok(None),
                    verdict => Ok(Some(verdict)),
                }
            },
        )
        .await??;

        tracing::debug!(?status, "Verification finished");
        Ok(())
    }
}

/// Envelope of every explorer API response.
#[derive(Debug, Clone, Deserialize)]
struct ExplorerResponse {
    status: String,
    message: String,
    result: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Submission {
    Pending(String),
    AlreadyVerified,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum VerificationStatus {
    Pending,
    Verified,
    AlreadyVerified,
}

fn is_already_verified(result: &str) -> bool {
    result.to_lowercase().contains("already verified")
}

impl ExplorerResponse {
    fn submission(&self) -> Result<Submission> {
        if self.status == "1" {
            return Ok(Submission::Pending(self.result.clone()));
        }
        if is_already_verified(&self.result) {
            return Ok(Submission::AlreadyVerified);
        }
        anyhow::bail!("Verification rejected: {} ({})", self.result, self.message)
    }

    fn status(&self) -> Result<VerificationStatus> {
        if self.result.to_lowercase().contains("pending") {
            return Ok(VerificationStatus::Pending);
        }
        if is_already_verified(&self.result) {
            return Ok(VerificationStatus::AlreadyVerified);
        }
        if self.status == "1" {
            return Ok(VerificationStatus::Verified);
        }
        anyhow::bail!("Verification failed: {}", self.result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(status: &str, message: &str, result: &str) -> ExplorerResponse {
        serde_json::from_value(serde_json::json!({
            "status": status,
            "message": message,
            "result": result,
        }))
        .unwrap()
    }

    #[test]
    fn test_submission_accepted() {
        let r = response("1", "OK", "ezq878u486pzijkvvmerl6a9mzwhv6sefgvqi5tkwceejc7tvn");
        assert_eq!(
            r.submission().unwrap(),
            Submission::Pending("ezq878u486pzijkvvmerl6a9mzwhv6sefgvqi5tkwceejc7tvn".to_string())
        );
    }

    #[test]
    fn test_submission_already_verified() {
        let r = response("0", "NOTOK", "Contract source code already verified");
        assert_eq!(r.submission().unwrap(), Submission::AlreadyVerified);
    }

    #[test]
    fn test_submission_rejected() {
        let r = response("0", "NOTOK", "Invalid API Key");
        let err = r.submission().unwrap_err();
        assert!(err.to_string().contains("Invalid API Key"));
    }

    #[test]
    fn test_status_transitions() {
        assert_eq!(
            response("0", "NOTOK", "Pending in queue").status().unwrap(),
            VerificationStatus::Pending
        );
        assert_eq!(
            response("1", "OK", "Pass - Verified").status().unwrap(),
            VerificationStatus::Verified
        );
        assert_eq!(
            response("1", "OK", "Already Verified").status().unwrap(),
            VerificationStatus::AlreadyVerified
        );
        assert!(
            response("0", "NOTOK", "Fail - Unable to verify")
                .status()
                .is_err()
        );
    }
}
