use base64::Engine;
use serde::Deserialize;
use tracing::debug;

use ellora_common::config::Network;
use ellora_common::{Address, ClientError};

use crate::node::{
    AccountApplicationInfo, AccountInfo, ApplicationInfo, NodeApi, NodeStatus, PendingTransaction,
};
use crate::txn::SuggestedParams;

/// HTTP client for the algod v2 REST API
pub struct AlgodClient {
    base_url: String,
    http: reqwest::Client,
}

/// Response of /v2/transactions/params
#[derive(Debug, Deserialize)]
struct TransactionParams {
    fee: u64,
    #[serde(rename = "min-fee")]
    min_fee: u64,
    #[serde(rename = "last-round")]
    last_round: u64,
    #[serde(rename = "genesis-id")]
    genesis_id: String,
    #[serde(rename = "genesis-hash")]
    genesis_hash: String,
}

#[derive(Debug, Deserialize)]
struct SubmitResponse {
    #[serde(rename = "txId")]
    tx_id: String,
}

impl AlgodClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Self {
            base_url,
            http: reqwest::Client::new(),
        }
    }

    /// Client for a network's public node
    pub fn for_network(network: Network) -> Self {
        Self::new(network.default_node_url())
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        let url = format!("{}{path}", self.base_url);
        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| ClientError::Network(format!("fetch failed: {e}")))?;

        Self::decode_response(response).await
    }

    async fn decode_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, ClientError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::Network(format!(
                "status {}: {}",
                status.as_u16(),
                body.trim()
            )));
        }
        response
            .json::<T>()
            .await
            .map_err(|e| ClientError::Network(format!("malformed node response: {e}")))
    }

    fn suggested_from(params: TransactionParams) -> Result<SuggestedParams, ClientError> {
        let genesis_hash = base64::engine::general_purpose::STANDARD
            .decode(&params.genesis_hash)
            .map_err(|e| ClientError::Network(format!("malformed genesis hash: {e}")))?;

        Ok(SuggestedParams {
            fee: params.fee,
            min_fee: params.min_fee,
            first_round: params.last_round,
            last_round: params.last_round,
            genesis_id: params.genesis_id,
            genesis_hash,
        })
    }
}

#[async_trait::async_trait]
impl NodeApi for AlgodClient {
    async fn account_information(&self, address: &Address) -> Result<AccountInfo, ClientError> {
        self.get_json(&format!("/v2/accounts/{address}")).await
    }

    async fn application_information(&self, app_id: u64) -> Result<ApplicationInfo, ClientError> {
        self.get_json(&format!("/v2/applications/{app_id}")).await
    }

    async fn account_application_information(
        &self,
        address: &Address,
        app_id: u64,
    ) -> Result<AccountApplicationInfo, ClientError> {
        self.get_json(&format!("/v2/accounts/{address}/applications/{app_id}"))
            .await
    }

    async fn suggested_params(&self) -> Result<SuggestedParams, ClientError> {
        let params: TransactionParams = self.get_json("/v2/transactions/params").await?;
        Self::suggested_from(params)
    }

    async fn submit_raw(&self, signed: &[Vec<u8>]) -> Result<String, ClientError> {
        let body: Vec<u8> = signed.concat();
        debug!(blobs = signed.len(), bytes = body.len(), "submitting raw transaction");

        let url = format!("{}/v2/transactions", self.base_url);
        let response = self
            .http
            .post(&url)
            .header("Content-Type", "application/x-binary")
            .body(body)
            .send()
            .await
            .map_err(|e| ClientError::Network(format!("fetch failed: {e}")))?;

        let submitted: SubmitResponse = Self::decode_response(response).await?;
        Ok(submitted.tx_id)
    }

    async fn pending_transaction(&self, tx_id: &str) -> Result<PendingTransaction, ClientError> {
        self.get_json(&format!("/v2/transactions/pending/{tx_id}"))
            .await
    }

    async fn status(&self) -> Result<NodeStatus, ClientError> {
        self.get_json("/v2/status").await
    }

    async fn wait_for_round(&self, round: u64) -> Result<NodeStatus, ClientError> {
        self.get_json(&format!("/v2/status/wait-for-block-after/{round}"))
            .await
    }
}
