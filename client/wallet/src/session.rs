use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use ellora_chain::NodeApi;
use ellora_common::error::{classify_balance_error, classify_connect_error};
use ellora_common::units::from_micro;
use ellora_common::{Address, ClientError};

use crate::signer::WalletSigner;
use crate::store::AddressStore;

/// How often a live session re-reads the account balance
const REFRESH_INTERVAL: Duration = Duration::from_secs(30);

/// Observable wallet session state. Every transition runs to completion
/// under the write lock; readers never see a partial update.
#[derive(Debug, Clone, PartialEq)]
pub struct WalletState {
    pub connected: bool,
    pub address: Option<Address>,
    /// Balance in whole units
    pub balance: f64,
    pub loading: bool,
    pub error: Option<String>,
}

impl Default for WalletState {
    fn default() -> Self {
        Self {
            connected: false,
            address: None,
            balance: 0.0,
            loading: false,
            error: None,
        }
    }
}

/// Wallet session: connect / disconnect / restore plus a periodic balance
/// refresh and a watcher for wallet-initiated disconnects. Background
/// tasks are owned handles, torn down on disconnect and drop.
pub struct Session {
    signer: Arc<dyn WalletSigner>,
    node: Arc<dyn NodeApi>,
    store: Arc<dyn AddressStore>,
    state: Arc<RwLock<WalletState>>,
    refresh_interval: Duration,
    tasks: Mutex<Tasks>,
}

#[derive(Default)]
struct Tasks {
    refresh: Option<JoinHandle<()>>,
    disconnect_watch: Option<JoinHandle<()>>,
}

impl Session {
    pub fn new(
        signer: Arc<dyn WalletSigner>,
        node: Arc<dyn NodeApi>,
        store: Arc<dyn AddressStore>,
    ) -> Self {
        Self {
            signer,
            node,
            store,
            state: Arc::new(RwLock::new(WalletState::default())),
            refresh_interval: REFRESH_INTERVAL,
            tasks: Mutex::new(Tasks::default()),
        }
    }

    pub fn with_refresh_interval(mut self, interval: Duration) -> Self {
        self.refresh_interval = interval;
        self
    }

    pub async fn state(&self) -> WalletState {
        self.state.read().await.clone()
    }

    /// Handshake with the wallet and take its first account. A failed
    /// balance fetch afterwards does not revert the connection.
    pub async fn connect(&self) -> WalletState {
        {
            let mut state = self.state.write().await;
            state.loading = true;
            state.error = None;
        }

        match self.signer.connect().await {
            Ok(accounts) => match accounts.first().copied() {
                Some(address) => {
                    {
                        let mut state = self.state.write().await;
                        state.connected = true;
                        state.address = Some(address);
                        state.loading = false;
                        state.error = None;
                    }
                    debug!(%address, "wallet connected");

                    if let Err(e) = self.store.set(&address.to_string()).await {
                        warn!("failed to persist wallet address: {e}");
                    }

                    let _ = self.fetch_balance(&address).await;
                    self.spawn_refresh();
                    self.spawn_disconnect_watcher();
                }
                None => {
                    let mut state = self.state.write().await;
                    state.loading = false;
                    state.error = Some(classify_connect_error("No accounts selected"));
                }
            },
            Err(e) => {
                let message = classify_connect_error(&e.to_string());
                warn!("wallet connect failed: {e}");
                let mut state = self.state.write().await;
                state.loading = false;
                state.error = Some(message);
            }
        }

        self.state().await
    }

    /// Always resets local state, even when the wallet call fails;
    /// disconnect is idempotent.
    pub async fn disconnect(&self) {
        if let Err(e) = self.signer.disconnect().await {
            warn!("wallet disconnect reported an error: {e}");
        }

        if let Some(task) = self.tasks.lock().expect("task lock poisoned").refresh.take() {
            task.abort();
        }

        *self.state.write().await = WalletState::default();

        if let Err(e) = self.store.remove().await {
            warn!("failed to clear persisted wallet address: {e}");
        }
    }

    /// Re-establish a session from the persisted address, if any. A
    /// failed balance fetch here means the address is stale: the session
    /// stays disconnected and the persisted value is removed.
    pub async fn restore(&self) -> WalletState {
        let saved = self.store.get().await.unwrap_or_default();
        let Some(text) = saved else {
            return self.state().await;
        };

        match text.parse::<Address>() {
            Ok(address) => {
                {
                    let mut state = self.state.write().await;
                    state.connected = true;
                    state.address = Some(address);
                }

                if self.fetch_balance(&address).await.is_ok() {
                    debug!(%address, "wallet session restored");
                    self.spawn_refresh();
                    self.spawn_disconnect_watcher();
                } else {
                    *self.state.write().await = WalletState::default();
                    if let Err(e) = self.store.remove().await {
                        warn!("failed to clear stale wallet address: {e}");
                    }
                }
            }
            Err(e) => {
                warn!("persisted wallet address is invalid: {e}");
                let _ = self.store.remove().await;
            }
        }

        self.state().await
    }

    /// One-off balance refresh for the connected account
    pub async fn refresh_balance(&self) {
        let address = self.state.read().await.address;
        if let Some(address) = address {
            let _ = self.fetch_balance(&address).await;
        }
    }

    async fn fetch_balance(&self, address: &Address) -> Result<(), ClientError> {
        match self.node.account_information(address).await {
            Ok(info) => {
                let mut state = self.state.write().await;
                state.balance = from_micro(info.amount);
                state.error = None;
                Ok(())
            }
            Err(e) => {
                let message = classify_balance_error(&e.to_string());
                warn!("balance fetch failed for {address}: {e}");
                self.state.write().await.error = Some(message);
                Err(e)
            }
        }
    }

    fn spawn_refresh(&self) {
        let state = self.state.clone();
        let node = self.node.clone();
        let interval = self.refresh_interval;

        let task = tokio::spawn(async move {
            loop {
                tokio::time::sleep(interval).await;

                let address = state.read().await.address;
                let Some(address) = address else { break };

                match node.account_information(&address).await {
                    Ok(info) => {
                        let mut state = state.write().await;
                        state.balance = from_micro(info.amount);
                        state.error = None;
                    }
                    Err(e) => {
                        state.write().await.error = Some(classify_balance_error(&e.to_string()));
                    }
                }
            }
        });

        let mut tasks = self.tasks.lock().expect("task lock poisoned");
        if let Some(previous) = tasks.refresh.replace(task) {
            previous.abort();
        }
    }

    /// Started once per session; survives reconnects because the signer's
    /// event receiver can only be taken once.
    fn spawn_disconnect_watcher(&self) {
        {
            let tasks = self.tasks.lock().expect("task lock poisoned");
            if tasks.disconnect_watch.is_some() {
                return;
            }
        }

        let Some(mut events) = self.signer.disconnect_events() else {
            return;
        };
        let state = self.state.clone();
        let store = self.store.clone();

        let task = tokio::spawn(async move {
            while events.recv().await.is_some() {
                debug!("wallet-initiated disconnect observed");
                *state.write().await = WalletState::default();
                let _ = store.remove().await;
            }
        });

        self.tasks.lock().expect("task lock poisoned").disconnect_watch = Some(task);
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        let mut tasks = self.tasks.lock().expect("task lock poisoned");
        if let Some(task) = tasks.refresh.take() {
            task.abort();
        }
        if let Some(task) = tasks.disconnect_watch.take() {
            task.abort();
        }
    }
}
