use std::collections::HashMap;

use base64::Engine;
use serde::Deserialize;

use ellora_common::types::{JobSnapshot, JobStatus, ReputationSnapshot};
use ellora_common::units::from_micro;
use ellora_common::{Address, ClientError};

/// Raw key/value entry as the node reports it, key base64-encoded
#[derive(Debug, Clone, Deserialize)]
pub struct TealKeyValue {
    pub key: String,
    pub value: TealValue,
}

/// Value slot; type 1 carries bytes (base64), type 2 carries a uint
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TealValue {
    #[serde(rename = "type", default)]
    pub value_type: u64,
    #[serde(default)]
    pub bytes: String,
    #[serde(default)]
    pub uint: u64,
}

/// Global state keys written by the escrow contract
pub mod job_keys {
    pub const CLIENT: &str = "client";
    pub const FREELANCER: &str = "freelancer";
    pub const AMOUNT: &str = "amount";
    pub const STATUS: &str = "status";
    pub const CREATED: &str = "created";
    pub const DEADLINE: &str = "deadline";
    pub const VOTES_FOR: &str = "votes_for";
    pub const VOTES_AGAINST: &str = "votes_against";
    pub const JURORS: &str = "jurors";
}

/// Local state keys written by the reputation token contract
pub mod reputation_keys {
    pub const SBT_COUNT: &str = "sbt_count";
    pub const POSITIVE: &str = "positive";
    pub const NEGATIVE: &str = "negative";
    pub const LAST_EARNED: &str = "last_earned";
    pub const JUROR_ELIGIBLE: &str = "juror_eligible";
}

/// Decoded lookup over one state block. Keys that fail to decode and keys
/// outside the known set are ignored.
pub struct StateView {
    entries: HashMap<String, TealValue>,
}

impl StateView {
    pub fn new(raw: &[TealKeyValue]) -> Self {
        let engine = base64::engine::general_purpose::STANDARD;
        let mut entries = HashMap::with_capacity(raw.len());
        for item in raw {
            let Ok(decoded) = engine.decode(&item.key) else {
                continue;
            };
            let Ok(key) = String::from_utf8(decoded) else {
                continue;
            };
            entries.insert(key, item.value.clone());
        }
        Self { entries }
    }

    pub fn uint(&self, key: &str) -> Option<u64> {
        self.entries.get(key).map(|v| v.uint)
    }

    pub fn bytes(&self, key: &str) -> Option<Vec<u8>> {
        let value = self.entries.get(key)?;
        if value.bytes.is_empty() {
            return None;
        }
        base64::engine::general_purpose::STANDARD
            .decode(&value.bytes)
            .ok()
    }

    pub fn address(&self, key: &str) -> Option<Address> {
        let raw = self.bytes(key)?;
        let key_bytes: [u8; 32] = raw.try_into().ok()?;
        Some(Address::from_public_key(key_bytes))
    }
}

/// Rebuild a job snapshot from the escrow application's global state
pub fn decode_job(app_id: u64, raw: &[TealKeyValue]) -> Result<JobSnapshot, ClientError> {
    let view = StateView::new(raw);

    let client = view.address(job_keys::CLIENT).ok_or_else(|| {
        ClientError::Unknown(format!("job {app_id} global state is missing the client key"))
    })?;
    let status_raw = view.uint(job_keys::STATUS).ok_or_else(|| {
        ClientError::Unknown(format!("job {app_id} global state is missing the status key"))
    })?;
    let status = JobStatus::try_from(status_raw)?;

    Ok(JobSnapshot {
        app_id,
        client,
        freelancer: view.address(job_keys::FREELANCER),
        amount: from_micro(view.uint(job_keys::AMOUNT).unwrap_or(0)),
        status,
        created_at: view.uint(job_keys::CREATED).unwrap_or(0),
        deadline_at: view.uint(job_keys::DEADLINE).unwrap_or(0),
        dispute_votes_for: view.uint(job_keys::VOTES_FOR).unwrap_or(0),
        dispute_votes_against: view.uint(job_keys::VOTES_AGAINST).unwrap_or(0),
        total_jurors: view.uint(job_keys::JURORS).unwrap_or(0),
    })
}

/// Rebuild a reputation snapshot from the token contract's local state
pub fn decode_reputation(raw: &[TealKeyValue]) -> ReputationSnapshot {
    let view = StateView::new(raw);

    ReputationSnapshot::new(
        view.uint(reputation_keys::SBT_COUNT).unwrap_or(0),
        view.uint(reputation_keys::POSITIVE).unwrap_or(0),
        view.uint(reputation_keys::NEGATIVE).unwrap_or(0),
        view.uint(reputation_keys::LAST_EARNED).unwrap_or(0),
        view.uint(reputation_keys::JUROR_ELIGIBLE).unwrap_or(0) == 1,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn b64(data: &[u8]) -> String {
        base64::engine::general_purpose::STANDARD.encode(data)
    }

    fn uint_entry(key: &str, value: u64) -> TealKeyValue {
        TealKeyValue {
            key: b64(key.as_bytes()),
            value: TealValue {
                value_type: 2,
                bytes: String::new(),
                uint: value,
            },
        }
    }

    fn bytes_entry(key: &str, value: &[u8]) -> TealKeyValue {
        TealKeyValue {
            key: b64(key.as_bytes()),
            value: TealValue {
                value_type: 1,
                bytes: b64(value),
                uint: 0,
            },
        }
    }

    fn job_state() -> Vec<TealKeyValue> {
        vec![
            bytes_entry(job_keys::CLIENT, &[3u8; 32]),
            uint_entry(job_keys::AMOUNT, 2_500_000),
            uint_entry(job_keys::STATUS, 1),
            uint_entry(job_keys::CREATED, 1_700_000_000),
            uint_entry(job_keys::DEADLINE, 1_700_600_000),
            bytes_entry(job_keys::FREELANCER, &[4u8; 32]),
            uint_entry(job_keys::VOTES_FOR, 0),
            uint_entry(job_keys::VOTES_AGAINST, 0),
            uint_entry(job_keys::JURORS, 5),
        ]
    }

    #[test]
    fn decodes_full_job_state() {
        let job = decode_job(99, &job_state()).unwrap();
        assert_eq!(job.app_id, 99);
        assert_eq!(job.client, Address::from_public_key([3u8; 32]));
        assert_eq!(job.freelancer, Some(Address::from_public_key([4u8; 32])));
        assert_eq!(job.amount, 2.5);
        assert_eq!(job.status, JobStatus::InProgress);
        assert_eq!(job.total_jurors, 5);
    }

    #[test]
    fn empty_freelancer_bytes_mean_unassigned() {
        let mut state = job_state();
        state.retain(|kv| kv.key != b64(job_keys::FREELANCER.as_bytes()));
        state.push(bytes_entry(job_keys::FREELANCER, b""));

        let job = decode_job(99, &state).unwrap();
        assert_eq!(job.freelancer, None);
    }

    #[test]
    fn unknown_keys_are_ignored() {
        let mut state = job_state();
        state.push(uint_entry("future_field", 77));
        state.push(bytes_entry("another_one", b"data"));

        assert!(decode_job(99, &state).is_ok());
    }

    #[test]
    fn out_of_range_status_is_an_error() {
        let mut state = job_state();
        state.retain(|kv| kv.key != b64(job_keys::STATUS.as_bytes()));
        state.push(uint_entry(job_keys::STATUS, 9));

        assert!(decode_job(99, &state).is_err());
    }

    #[test]
    fn missing_client_is_an_error() {
        let state = vec![uint_entry(job_keys::STATUS, 0)];
        assert!(decode_job(99, &state).is_err());
    }

    #[test]
    fn decodes_reputation_with_defaults() {
        let rep = decode_reputation(&[]);
        assert_eq!(rep.token_count, 0);
        assert_eq!(rep.score, 50.0);
        assert!(!rep.juror_eligible);

        let rep = decode_reputation(&[
            uint_entry(reputation_keys::SBT_COUNT, 10),
            uint_entry(reputation_keys::POSITIVE, 8),
            uint_entry(reputation_keys::NEGATIVE, 2),
            uint_entry(reputation_keys::JUROR_ELIGIBLE, 1),
        ]);
        assert_eq!(rep.score, 60.0);
        assert!(rep.juror_eligible);
    }

    #[test]
    fn undecodable_keys_are_skipped() {
        let state = vec![
            TealKeyValue {
                key: "!!! not base64 !!!".to_string(),
                value: TealValue::default(),
            },
            uint_entry(reputation_keys::SBT_COUNT, 1),
        ];
        let rep = decode_reputation(&state);
        assert_eq!(rep.token_count, 1);
    }
}
