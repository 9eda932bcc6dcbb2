use tracing::{debug, info};

use ellora_common::ClientError;

use crate::node::NodeApi;

/// Bound on the confirmation wait; the network's own validity window makes
/// a payload worthless long before this expires anyway.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConfirmationPolicy {
    /// Round boundaries to wait through before giving up
    pub max_rounds: u64,
}

impl Default for ConfirmationPolicy {
    fn default() -> Self {
        Self { max_rounds: 10 }
    }
}

/// A transaction with a finality round attached
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Confirmed {
    pub tx_id: String,
    pub confirmed_round: u64,
    /// Application id reported by the node, set for application transactions
    pub application_index: Option<u64>,
}

/// Submit signed blobs as one unit and block until the network confirms
/// the resulting transaction or the policy bound is reached.
pub async fn submit_and_confirm(
    node: &dyn NodeApi,
    signed: &[Vec<u8>],
    policy: &ConfirmationPolicy,
) -> Result<Confirmed, ClientError> {
    let tx_id = node.submit_raw(signed).await?;
    debug!(%tx_id, "transaction submitted");
    wait_for_confirmation(node, &tx_id, policy).await
}

/// Poll pending-transaction status once per round until a confirmed round
/// appears. A pool error means the node dropped the transaction; that is
/// terminal, not something to wait out.
pub async fn wait_for_confirmation(
    node: &dyn NodeApi,
    tx_id: &str,
    policy: &ConfirmationPolicy,
) -> Result<Confirmed, ClientError> {
    let mut round = node.status().await?.last_round;

    for _ in 0..policy.max_rounds {
        let pending = node.pending_transaction(tx_id).await?;

        if !pending.pool_error.is_empty() {
            return Err(ClientError::Network(format!(
                "transaction {tx_id} rejected by the pool: {}",
                pending.pool_error
            )));
        }

        if let Some(confirmed_round) = pending.confirmed_round.filter(|r| *r > 0) {
            info!(%tx_id, confirmed_round, "transaction confirmed");
            return Ok(Confirmed {
                tx_id: tx_id.to_string(),
                confirmed_round,
                application_index: pending.application_index,
            });
        }

        round += 1;
        node.wait_for_round(round).await?;
    }

    Err(ClientError::Timeout {
        tx_id: tx_id.to_string(),
        rounds: policy.max_rounds,
    })
}
