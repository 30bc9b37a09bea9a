//! Seams between the deployment workflow and the outside world.
//!
//! The [`crate::Deployer`] only talks to the chain and the block explorer through these
//! traits. The JSON-RPC and explorer backed implementations live in
//! [`crate::provider`], [`crate::factory`] and [`crate::verify`].

use std::future::Future;

use alloy_core::primitives::{Address, B256, Bytes, U256};
use anyhow::Result;

/// Source of signing identities and account balances.
pub trait SignerProvider {
    /// All signers known to the provider, in configuration order.
    fn signers(&self) -> impl Future<Output = Result<Vec<Address>>> + Send;

    /// Balance of `address` in wei.
    fn balance(&self, address: Address) -> impl Future<Output = Result<U256>> + Send;
}

/// Loads contract factories by contract name.
pub trait ContractFactories {
    type Factory: ContractFactory;

    /// Load the factory for `name`, deploying from `deployer`.
    fn factory(
        &self,
        name: &str,
        deployer: Address,
    ) -> impl Future<Output = Result<Self::Factory>> + Send;
}

/// Creates new on-chain instances of one contract.
pub trait ContractFactory {
    type Contract: DeployedContract;

    /// Submit the creation transaction. ABI-encoded `constructor_args` are appended
    /// to the creation code.
    ///
    /// Returns as soon as the transaction is accepted by the node.
    fn deploy(&self, constructor_args: Bytes)
    -> impl Future<Output = Result<Self::Contract>> + Send;
}

/// The transaction that created a contract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeployTransaction {
    pub hash: B256,
    /// Gas limit of the transaction, if the provider reports it.
    pub gas_limit: Option<u64>,
    /// Block that included the transaction, known once mined.
    pub block_number: Option<u64>,
}

/// Handle to a contract whose creation transaction has been submitted.
pub trait DeployedContract {
    fn address(&self) -> Address;

    fn deploy_transaction(&self) -> &DeployTransaction;

    /// Wait until the creation transaction is mined.
    ///
    /// Fails if the transaction reverted.
    fn deployed(&mut self) -> impl Future<Output = Result<()>> + Send;

    /// Wait until the creation transaction has `confirmations` blocks on top of it,
    /// counting its own block.
    fn wait(&self, confirmations: u64) -> impl Future<Output = Result<()>> + Send;
}

/// Submits contract sources to a block explorer.
pub trait Verifier {
    fn verify(
        &self,
        address: Address,
        constructor_args: Bytes,
    ) -> impl Future<Output = Result<()>> + Send;
}
