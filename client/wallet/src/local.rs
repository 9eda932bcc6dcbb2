use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use ed25519_dalek::{Signer as _, SigningKey};
use tokio::sync::mpsc;

use ellora_common::Address;

use crate::signer::{SignerError, TxnToSign, WalletSigner};

/// Domain separator prepended to payload bytes before signing
const SIGN_PREFIX: &[u8] = b"TX";

/// In-process ed25519 signer for demos and tests. Real deployments put a
/// hardware or mobile wallet behind [`WalletSigner`] instead.
pub struct LocalSigner {
    keys: Vec<(Address, SigningKey)>,
    connected: AtomicBool,
    disconnect_tx: mpsc::Sender<()>,
    disconnect_rx: Mutex<Option<mpsc::Receiver<()>>>,
}

impl LocalSigner {
    pub fn new(keys: Vec<SigningKey>) -> Self {
        let keys = keys
            .into_iter()
            .map(|key| (Address::from_public_key(key.verifying_key().to_bytes()), key))
            .collect();
        let (tx, rx) = mpsc::channel(8);

        Self {
            keys,
            connected: AtomicBool::new(false),
            disconnect_tx: tx,
            disconnect_rx: Mutex::new(Some(rx)),
        }
    }

    /// Single-account signer with a deterministic key
    pub fn from_seed(seed: [u8; 32]) -> Self {
        Self::new(vec![SigningKey::from_bytes(&seed)])
    }

    /// Signer with no accounts; connect yields the "no accounts" case
    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    pub fn addresses(&self) -> Vec<Address> {
        self.keys.iter().map(|(address, _)| *address).collect()
    }

    /// Simulate a wallet-initiated disconnect, as a mobile wallet does
    /// when the user ends the session from the device
    pub async fn emit_disconnect(&self) {
        self.connected.store(false, Ordering::SeqCst);
        let _ = self.disconnect_tx.send(()).await;
    }
}

#[async_trait]
impl WalletSigner for LocalSigner {
    async fn connect(&self) -> Result<Vec<Address>, SignerError> {
        self.connected.store(true, Ordering::SeqCst);
        Ok(self.addresses())
    }

    async fn sign(&self, group: &[TxnToSign]) -> Result<Vec<Vec<u8>>, SignerError> {
        if !self.connected.load(Ordering::SeqCst) {
            return Err(SignerError::ConnectionLost);
        }

        let mut signed = Vec::with_capacity(group.len());
        for item in group {
            let key = self
                .keys
                .iter()
                .find(|(address, _)| *address == item.signer)
                .map(|(_, key)| key)
                .ok_or_else(|| {
                    SignerError::Transport(format!("no key for signer {}", item.signer))
                })?;

            let payload = item.txn.canonical_bytes();
            let mut message = Vec::with_capacity(SIGN_PREFIX.len() + payload.len());
            message.extend_from_slice(SIGN_PREFIX);
            message.extend_from_slice(&payload);

            let signature = key.sign(&message);

            // Signed blob: 64-byte signature followed by the payload
            let mut blob = Vec::with_capacity(64 + payload.len());
            blob.extend_from_slice(&signature.to_bytes());
            blob.extend_from_slice(&payload);
            signed.push(blob);
        }

        Ok(signed)
    }

    async fn disconnect(&self) -> Result<(), SignerError> {
        self.connected.store(false, Ordering::SeqCst);
        Ok(())
    }

    fn disconnect_events(&self) -> Option<mpsc::Receiver<()>> {
        self.disconnect_rx.lock().expect("receiver lock poisoned").take()
    }
}

#[cfg(test)]
mod tests {
    use ed25519_dalek::Verifier;
    use ellora_chain::txn::{app_call, SuggestedParams, METHOD_ACCEPT_JOB};

    use super::*;

    fn params() -> SuggestedParams {
        SuggestedParams {
            fee: 0,
            min_fee: 1000,
            first_round: 100,
            last_round: 100,
            genesis_id: "testnet-v1.0".to_string(),
            genesis_hash: vec![0xaa; 32],
        }
    }

    fn txn_for(signer: &LocalSigner) -> TxnToSign {
        let sender = signer.addresses()[0];
        TxnToSign {
            txn: app_call(&sender, 7, vec![METHOD_ACCEPT_JOB.to_vec()], &params()),
            signer: sender,
        }
    }

    #[tokio::test]
    async fn signatures_verify_against_the_payload() {
        let signer = LocalSigner::from_seed([5u8; 32]);
        signer.connect().await.unwrap();

        let to_sign = txn_for(&signer);
        let blobs = signer.sign(&[to_sign.clone()]).await.unwrap();
        assert_eq!(blobs.len(), 1);

        let payload = to_sign.txn.canonical_bytes();
        let (sig_bytes, signed_payload) = blobs[0].split_at(64);
        assert_eq!(signed_payload, payload.as_slice());

        let mut message = SIGN_PREFIX.to_vec();
        message.extend_from_slice(&payload);

        let key = SigningKey::from_bytes(&[5u8; 32]);
        let signature = ed25519_dalek::Signature::from_bytes(sig_bytes.try_into().unwrap());
        key.verifying_key().verify(&message, &signature).unwrap();
    }

    #[tokio::test]
    async fn signing_without_a_session_is_rejected() {
        let signer = LocalSigner::from_seed([5u8; 32]);
        let to_sign = txn_for(&signer);

        let err = signer.sign(&[to_sign]).await.unwrap_err();
        assert!(matches!(err, SignerError::ConnectionLost));
    }

    #[tokio::test]
    async fn unknown_signer_address_is_rejected() {
        let signer = LocalSigner::from_seed([5u8; 32]);
        signer.connect().await.unwrap();

        let mut to_sign = txn_for(&signer);
        to_sign.signer = Address::from_public_key([9u8; 32]);

        let err = signer.sign(&[to_sign]).await.unwrap_err();
        assert!(matches!(err, SignerError::Transport(_)));
    }

    #[tokio::test]
    async fn disconnect_events_are_single_consumer() {
        let signer = LocalSigner::empty();
        assert!(signer.disconnect_events().is_some());
        assert!(signer.disconnect_events().is_none());
    }
}
