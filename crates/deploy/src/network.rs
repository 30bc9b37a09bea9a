//! Network presets for the Core chains the contract can be deployed to.

use serde::{Deserialize, Serialize};

/// A known deployment target.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
pub enum Network {
    /// Core Testnet 2.
    #[default]
    #[strum(serialize = "core_testnet2")]
    #[serde(rename = "core_testnet2")]
    CoreTestnet2,
    /// Core mainnet.
    #[strum(serialize = "core_mainnet")]
    #[serde(rename = "core_mainnet")]
    CoreMainnet,
}

impl Network {
    pub fn chain_id(&self) -> u64 {
        match self {
            Network::CoreTestnet2 => 1114,
            Network::CoreMainnet => 1116,
        }
    }

    /// Human readable name, used in log output.
    pub fn display_name(&self) -> &'static str {
        match self {
            Network::CoreTestnet2 => "Core Testnet 2",
            Network::CoreMainnet => "Core Mainnet",
        }
    }

    pub fn default_rpc_url(&self) -> &'static str {
        match self {
            Network::CoreTestnet2 => "https://rpc.test2.btcs.network",
            Network::CoreMainnet => "https://rpc.coredao.org",
        }
    }

    /// Base URL of the block explorer web UI.
    pub fn explorer_url(&self) -> &'static str {
        match self {
            Network::CoreTestnet2 => "https://scan.test2.btcs.network",
            Network::CoreMainnet => "https://scan.coredao.org",
        }
    }

    /// Etherscan-compatible API endpoint of the block explorer.
    pub fn explorer_api_url(&self) -> &'static str {
        match self {
            Network::CoreTestnet2 => "https://api.test2.btcs.network/api",
            Network::CoreMainnet => "https://openapi.coredao.org/api",
        }
    }

    /// Link to the explorer page of an address.
    pub fn address_url(&self, address: &str) -> String {
        format!("{}/address/{}", self.explorer_url(), address)
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    #[test]
    fn test_network_names_roundtrip() {
        assert_eq!(Network::CoreTestnet2.to_string(), "core_testnet2");
        assert_eq!(Network::CoreMainnet.to_string(), "core_mainnet");
        assert_eq!(
            Network::from_str("core_testnet2").unwrap(),
            Network::CoreTestnet2
        );
        assert!(Network::from_str("sepolia").is_err());
    }

    #[test]
    fn test_default_network_is_testnet2() {
        let network = Network::default();
        assert_eq!(network, Network::CoreTestnet2);
        assert_eq!(network.chain_id(), 1114);
    }

    #[test]
    fn test_address_url_ends_with_address() {
        let address = "0x5FbDB2315678afecb367f032d93F642f64180aa3";
        let url = Network::CoreTestnet2.address_url(address);
        assert_eq!(
            url,
            "https://scan.test2.btcs.network/address/0x5FbDB2315678afecb367f032d93F642f64180aa3"
        );
        assert!(url.ends_with(address));
    }

    #[test]
    fn test_serde_uses_preset_names() {
        let json = serde_json::to_string(&Network::CoreMainnet).unwrap();
        assert_eq!(json, "\"core_mainnet\"");
        let network: Network = serde_json::from_str("\"core_testnet2\"").unwrap();
        assert_eq!(network, Network::CoreTestnet2);
    }
}
