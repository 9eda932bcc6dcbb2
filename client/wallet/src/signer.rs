use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc;

use ellora_chain::UnsignedTxn;
use ellora_common::{Address, ClientError};

/// Failures surfaced by a wallet signer
#[derive(Debug, Error)]
pub enum SignerError {
    /// The user declined in the wallet UI; terminal, never retried
    #[error("User rejected the request")]
    UserRejected,

    #[error("no active wallet session")]
    ConnectionLost,

    #[error("signer transport error: {0}")]
    Transport(String),
}

impl From<SignerError> for ClientError {
    fn from(err: SignerError) -> Self {
        match err {
            SignerError::UserRejected => ClientError::UserRejected,
            SignerError::ConnectionLost => ClientError::Connection,
            SignerError::Transport(msg) => ClientError::Network(msg),
        }
    }
}

/// One payload of a group together with the account that must sign it
#[derive(Debug, Clone)]
pub struct TxnToSign {
    pub txn: UnsignedTxn,
    pub signer: Address,
}

/// External wallet boundary. Implementations hold their own connection
/// state; the session layer owns classification and persistence.
#[async_trait]
pub trait WalletSigner: Send + Sync {
    /// Handshake with the wallet. An empty account list is the caller's
    /// "no accounts" failure, not an error here.
    async fn connect(&self) -> Result<Vec<Address>, SignerError>;

    /// Sign every payload of one atomic group, in order
    async fn sign(&self, group: &[TxnToSign]) -> Result<Vec<Vec<u8>>, SignerError>;

    async fn disconnect(&self) -> Result<(), SignerError>;

    /// Channel of wallet-initiated disconnect notifications. Single
    /// consumer: returns the receiver once, then None.
    fn disconnect_events(&self) -> Option<mpsc::Receiver<()>>;
}
