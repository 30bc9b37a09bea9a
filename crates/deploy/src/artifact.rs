//! Loading of compiled contract artifacts (hardhat `artifacts/` layout).
//!
//! ```text
//! artifacts/
//! ├── build-info/<id>.json
//! └── contracts/Project.sol/
//!     ├── Project.json       # abi + bytecode
//!     └── Project.dbg.json   # points at the build info
//! ```

use std::path::{Path, PathBuf};

use alloy_core::primitives::Bytes;
use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::Value;

/// A compiled contract.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractArtifact {
    pub contract_name: String,
    pub source_name: String,
    #[serde(default)]
    pub abi: Value,
    pub bytecode: Bytes,

    /// Location of the artifact on disk.
    #[serde(skip)]
    pub path: PathBuf,
}

/// Compiler input and version, needed for source verification.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildInfo {
    pub solc_long_version: String,
    /// Standard JSON input given to solc.
    pub input: Value,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DebugFile {
    build_info: PathBuf,
}

impl ContractArtifact {
    /// `<sourceName>:<contractName>`, e.g. `contracts/Project.sol:Project`.
    pub fn fully_qualified_name(&self) -> String {
        format!("{}:{}", self.source_name, self.contract_name)
    }

    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read artifact {}", path.display()))?;
        let mut artifact: Self = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse artifact {}", path.display()))?;
        artifact.path = path.to_path_buf();
        Ok(artifact)
    }

    /// Find the artifact of `name` below `artifacts_dir`.
    ///
    /// `name` is either a bare contract name or a fully qualified
    /// `<sourceName>:<contractName>`.
    pub fn find(artifacts_dir: &Path, name: &str) -> Result<Self> {
        if let Some((source_name, contract_name)) = name.split_once(':') {
            let path = artifacts_dir
                .join(source_name)
                .join(format!("{}.json", contract_name));
            return Self::load_from_file(&path);
        }

        let file_name = format!("{}.json", name);
        let mut candidates = Vec::new();
        collect_files(&artifacts_dir.join("contracts"), &file_name, &mut candidates)
            .with_context(|| format!("Failed to search artifacts in {}", artifacts_dir.display()))?;

        let mut matches = Vec::new();
        for path in candidates {
            let artifact = Self::load_from_file(&path)?;
            if artifact.contract_name == name {
                matches.push(artifact);
            }
        }

        match matches.len() {
            0 => anyhow::bail!(
                "Artifact for contract \"{}\" not found in {}. Did you compile the contracts?",
                name,
                artifacts_dir.display()
            ),
            1 => {
                let artifact = matches.remove(0);
                tracing::debug!(path = %artifact.path.display(), "Found contract artifact");
                Ok(artifact)
            }
            _ => anyhow::bail!(
                "Multiple artifacts for contract \"{}\", use a fully qualified name: {}",
                name,
                matches
                    .iter()
                    .map(|a| a.fully_qualified_name())
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
        }
    }

    /// Creation bytecode, rejecting abstract contracts and interfaces.
    pub fn creation_code(&self) -> Result<Bytes> {
        if self.bytecode.is_empty() {
            anyhow::bail!(
                "Contract {} has no bytecode, is it abstract or an interface?",
                self.fully_qualified_name()
            );
        }
        Ok(self.bytecode.clone())
    }

    /// Load the build info referenced by the sibling `.dbg.json` file.
    pub fn build_info(&self) -> Result<BuildInfo> {
        let dbg_path = self.path.with_extension("dbg.json");
        let content = std::fs::read_to_string(&dbg_path)
            .with_context(|| format!("Failed to read {}", dbg_path.display()))?;
        let dbg: DebugFile = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse {}", dbg_path.display()))?;

        let parent = dbg_path
            .parent()
            .context("Debug file path must have a parent directory")?;
        let build_info_path = parent.join(dbg.build_info);

        let content = std::fs::read_to_string(&build_info_path)
            .with_context(|| format!("Failed to read build info {}", build_info_path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse build info {}", build_info_path.display()))
    }
}

fn collect_files(dir: &Path, file_name: &str, out: &mut Vec<PathBuf>) -> std::io::Result<()> {
    if !dir.is_dir() {
        return Ok(());
    }

    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            collect_files(&path, file_name, out)?;
        } else if path.file_name().is_some_and(|name| name == file_name) {
            out.push(path);
        }
    }

    Ok(())
}
