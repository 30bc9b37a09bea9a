//! escrowkit-deploy - Deployment library for the escrow contract.
//!
//! This crate deploys a compiled contract to a Core network, optionally verifies its
//! sources on the block explorer, and records the deployment in a JSON summary.

mod artifact;
pub use artifact::{BuildInfo, ContractArtifact};

mod config;
pub use config::{
    ConfigOverrides, Credentials, DEFAULT_CONFIRMATIONS, DEFAULT_CONTRACT, DEFAULT_TIMEOUT_SECS,
    DeployConfig,
};

mod deployer;
pub use deployer::{DeploySettings, Deployer};

mod factory;
pub use factory::{ArtifactFactories, RpcContractFactory, RpcDeployedContract, confirmation_depth};

mod network;
pub use network::Network;

pub mod provider;
pub use provider::{EthProvider, EthSigner};

mod record;
pub use record::{DEPLOYMENT_INFO_FILENAME, DeploymentRecord};

pub mod rpc;

mod traits;
pub use traits::{
    ContractFactories, ContractFactory, DeployTransaction, DeployedContract, SignerProvider,
    Verifier,
};

mod verify;
pub use verify::ExplorerVerifier;
