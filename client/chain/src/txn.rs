use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha512_256};

use ellora_common::Address;

/// Method tags of the escrow contract
pub const METHOD_CREATE_JOB: &[u8] = b"create_job";
pub const METHOD_ACCEPT_JOB: &[u8] = b"accept_job";
pub const METHOD_COMPLETE_JOB: &[u8] = b"complete_job";
pub const METHOD_APPROVE_COMPLETION: &[u8] = b"approve_completion";
pub const METHOD_RAISE_DISPUTE: &[u8] = b"raise_dispute";
pub const METHOD_VOTE_DISPUTE: &[u8] = b"vote_dispute";

/// Method tag of the reputation token contract
pub const METHOD_MINT_SBT: &[u8] = b"mint_sbt";

/// Rounds a payload stays valid after the suggested first round
const VALIDITY_WINDOW: u64 = 1000;

/// Fee and round metadata needed to build payloads
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuggestedParams {
    pub fee: u64,
    pub min_fee: u64,
    pub first_round: u64,
    pub last_round: u64,
    pub genesis_id: String,
    pub genesis_hash: Vec<u8>,
}

/// Unsigned payload handed to the wallet for signature
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnsignedTxn {
    pub sender: Address,
    pub fee: u64,
    pub first_round: u64,
    pub last_round: u64,
    pub genesis_id: String,
    pub genesis_hash: Vec<u8>,
    /// Set for every member of an atomic group, all to the same value
    pub group: Option<[u8; 32]>,
    pub body: TxnBody,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TxnBody {
    /// Invoke a deployed application with fixed-position arguments
    AppCall { app_id: u64, args: Vec<Vec<u8>> },
    /// Move funds, amount in micro-units
    Payment { receiver: Address, amount: u64 },
}

/// Application-call payload with the standard validity window
pub fn app_call(
    sender: &Address,
    app_id: u64,
    args: Vec<Vec<u8>>,
    params: &SuggestedParams,
) -> UnsignedTxn {
    UnsignedTxn {
        sender: *sender,
        fee: params.fee.max(params.min_fee),
        first_round: params.first_round,
        last_round: params.first_round + VALIDITY_WINDOW,
        genesis_id: params.genesis_id.clone(),
        genesis_hash: params.genesis_hash.clone(),
        group: None,
        body: TxnBody::AppCall { app_id, args },
    }
}

/// Payment payload with the standard validity window
pub fn payment(
    sender: &Address,
    receiver: &Address,
    amount: u64,
    params: &SuggestedParams,
) -> UnsignedTxn {
    UnsignedTxn {
        sender: *sender,
        fee: params.fee.max(params.min_fee),
        first_round: params.first_round,
        last_round: params.first_round + VALIDITY_WINDOW,
        genesis_id: params.genesis_id.clone(),
        genesis_hash: params.genesis_hash.clone(),
        group: None,
        body: TxnBody::Payment {
            receiver: *receiver,
            amount,
        },
    }
}

/// Fixed-width big-endian integer argument
pub fn arg_uint(value: u64) -> Vec<u8> {
    value.to_be_bytes().to_vec()
}

impl UnsignedTxn {
    /// Deterministic byte form used for group ids and signing.
    /// Field order is fixed; variable-length fields carry a length prefix.
    pub fn canonical_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(128);
        out.extend_from_slice(self.sender.as_bytes());
        out.extend_from_slice(&self.fee.to_be_bytes());
        out.extend_from_slice(&self.first_round.to_be_bytes());
        out.extend_from_slice(&self.last_round.to_be_bytes());
        out.extend_from_slice(&(self.genesis_id.len() as u32).to_be_bytes());
        out.extend_from_slice(self.genesis_id.as_bytes());
        out.extend_from_slice(&(self.genesis_hash.len() as u32).to_be_bytes());
        out.extend_from_slice(&self.genesis_hash);
        out.extend_from_slice(&self.group.unwrap_or([0u8; 32]));

        match &self.body {
            TxnBody::AppCall { app_id, args } => {
                out.push(1);
                out.extend_from_slice(&app_id.to_be_bytes());
                out.extend_from_slice(&(args.len() as u32).to_be_bytes());
                for arg in args {
                    out.extend_from_slice(&(arg.len() as u32).to_be_bytes());
                    out.extend_from_slice(arg);
                }
            }
            TxnBody::Payment { receiver, amount } => {
                out.push(2);
                out.extend_from_slice(receiver.as_bytes());
                out.extend_from_slice(&amount.to_be_bytes());
            }
        }

        out
    }
}

/// Stamp every payload with one shared group id so the network accepts or
/// rejects them atomically. The id hashes the payloads with group unset.
pub fn assign_group(txns: &mut [UnsignedTxn]) -> [u8; 32] {
    let mut hasher = Sha512_256::new();
    hasher.update(b"TG");
    for txn in txns.iter() {
        debug_assert!(txn.group.is_none());
        hasher.update(txn.canonical_bytes());
    }
    let group: [u8; 32] = hasher.finalize().into();

    for txn in txns.iter_mut() {
        txn.group = Some(group);
    }
    group
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> SuggestedParams {
        SuggestedParams {
            fee: 0,
            min_fee: 1000,
            first_round: 500,
            last_round: 1500,
            genesis_id: "testnet-v1.0".to_string(),
            genesis_hash: vec![0xaa; 32],
        }
    }

    #[test]
    fn uint_args_are_big_endian() {
        assert_eq!(arg_uint(1), vec![0, 0, 0, 0, 0, 0, 0, 1]);
        assert_eq!(
            arg_uint(1_000_000),
            vec![0, 0, 0, 0, 0, 0x0f, 0x42, 0x40]
        );
    }

    #[test]
    fn fee_floor_is_min_fee() {
        let sender = Address::from_public_key([1u8; 32]);
        let txn = app_call(&sender, 7, vec![METHOD_ACCEPT_JOB.to_vec()], &params());
        assert_eq!(txn.fee, 1000);
        assert_eq!(txn.last_round, txn.first_round + 1000);
    }

    #[test]
    fn group_members_share_one_id() {
        let sender = Address::from_public_key([1u8; 32]);
        let receiver = Address::for_application(7);
        let mut group = [
            app_call(&sender, 7, vec![METHOD_CREATE_JOB.to_vec()], &params()),
            payment(&sender, &receiver, 1_000_000, &params()),
        ];

        let id = assign_group(&mut group);
        assert_eq!(group[0].group, Some(id));
        assert_eq!(group[1].group, Some(id));
    }

    #[test]
    fn group_id_depends_on_contents() {
        let sender = Address::from_public_key([1u8; 32]);
        let receiver = Address::for_application(7);

        let mut a = [
            app_call(&sender, 7, vec![METHOD_CREATE_JOB.to_vec()], &params()),
            payment(&sender, &receiver, 1_000_000, &params()),
        ];
        let mut b = [
            app_call(&sender, 7, vec![METHOD_CREATE_JOB.to_vec()], &params()),
            payment(&sender, &receiver, 2_000_000, &params()),
        ];

        assert_ne!(assign_group(&mut a), assign_group(&mut b));
    }

    #[test]
    fn canonical_bytes_cover_arguments() {
        let sender = Address::from_public_key([1u8; 32]);
        let a = app_call(&sender, 7, vec![METHOD_VOTE_DISPUTE.to_vec(), arg_uint(1)], &params());
        let b = app_call(&sender, 7, vec![METHOD_VOTE_DISPUTE.to_vec(), arg_uint(0)], &params());
        assert_ne!(a.canonical_bytes(), b.canonical_bytes());
    }
}
