//! Wallet boundary for the Ellora client: signer trait, a local ed25519
//! signer, address persistence, and session state.

pub mod local;
pub mod session;
pub mod signer;
pub mod store;

pub use local::LocalSigner;
pub use session::{Session, WalletState};
pub use signer::{SignerError, TxnToSign, WalletSigner};
pub use store::{AddressStore, MemoryStore, SledStore};
