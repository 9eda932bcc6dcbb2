use async_trait::async_trait;
use serde::Deserialize;

use ellora_common::{Address, ClientError};

use crate::state::TealKeyValue;
use crate::txn::SuggestedParams;

/// Account holdings, amount in micro-units
#[derive(Debug, Clone, Deserialize)]
pub struct AccountInfo {
    pub address: String,
    pub amount: u64,
}

/// Deployed application and its global state
#[derive(Debug, Clone, Deserialize)]
pub struct ApplicationInfo {
    pub id: u64,
    pub params: ApplicationParams,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApplicationParams {
    #[serde(rename = "global-state", default)]
    pub global_state: Vec<TealKeyValue>,
}

/// An account's local state for one application
#[derive(Debug, Clone, Deserialize)]
pub struct AccountApplicationInfo {
    #[serde(rename = "app-local-state")]
    pub app_local_state: Option<ApplicationLocalState>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApplicationLocalState {
    pub id: u64,
    #[serde(rename = "key-value", default)]
    pub key_value: Vec<TealKeyValue>,
}

/// Pending-pool view of a submitted transaction
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PendingTransaction {
    #[serde(rename = "confirmed-round", default)]
    pub confirmed_round: Option<u64>,
    #[serde(rename = "pool-error", default)]
    pub pool_error: String,
    #[serde(rename = "application-index", default)]
    pub application_index: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NodeStatus {
    #[serde(rename = "last-round")]
    pub last_round: u64,
}

/// External node API. Implemented over HTTP by [`crate::AlgodClient`];
/// tests substitute in-memory stubs.
#[async_trait]
pub trait NodeApi: Send + Sync {
    async fn account_information(&self, address: &Address) -> Result<AccountInfo, ClientError>;

    async fn application_information(&self, app_id: u64) -> Result<ApplicationInfo, ClientError>;

    async fn account_application_information(
        &self,
        address: &Address,
        app_id: u64,
    ) -> Result<AccountApplicationInfo, ClientError>;

    async fn suggested_params(&self) -> Result<SuggestedParams, ClientError>;

    /// Submit signed transaction blobs; a group submits as one unit
    async fn submit_raw(&self, signed: &[Vec<u8>]) -> Result<String, ClientError>;

    async fn pending_transaction(&self, tx_id: &str) -> Result<PendingTransaction, ClientError>;

    async fn status(&self) -> Result<NodeStatus, ClientError>;

    /// Block until the network reaches the given round
    async fn wait_for_round(&self, round: u64) -> Result<NodeStatus, ClientError>;
}
