//! Node boundary for the Ellora client: payload construction, submission,
//! confirmation polling, and on-chain state decoding.

pub mod algod;
pub mod node;
pub mod state;
pub mod submit;
pub mod txn;

pub use algod::AlgodClient;
pub use node::NodeApi;
pub use submit::{submit_and_confirm, wait_for_confirmation, Confirmed, ConfirmationPolicy};
pub use txn::{SuggestedParams, TxnBody, UnsignedTxn};
