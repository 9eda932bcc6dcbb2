use serde::{Deserialize, Serialize};

/// Target network
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    Testnet,
    Mainnet,
}

impl Network {
    pub fn default_node_url(&self) -> &'static str {
        match self {
            Network::Testnet => "https://testnet-api.algonode.cloud",
            Network::Mainnet => "https://mainnet-api.algonode.cloud",
        }
    }
}

/// Identifiers of the deployed marketplace contracts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractConfig {
    pub escrow_app_id: u64,
    pub sbt_app_id: u64,
    pub network: Network,
}

impl ContractConfig {
    /// Contract ids of the testnet deployment
    pub fn testnet() -> Self {
        Self {
            escrow_app_id: 742_004_772,
            sbt_app_id: 742_004_783,
            network: Network::Testnet,
        }
    }
}
