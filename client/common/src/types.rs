use serde::{Deserialize, Serialize};

use crate::address::Address;
use crate::error::ClientError;

/// Escrow job lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobStatus {
    Created = 0,
    InProgress = 1,
    Completed = 2,
    Disputed = 3,
    Resolved = 4,
}

impl TryFrom<u64> for JobStatus {
    type Error = ClientError;

    fn try_from(raw: u64) -> Result<Self, Self::Error> {
        match raw {
            0 => Ok(JobStatus::Created),
            1 => Ok(JobStatus::InProgress),
            2 => Ok(JobStatus::Completed),
            3 => Ok(JobStatus::Disputed),
            4 => Ok(JobStatus::Resolved),
            other => Err(ClientError::Unknown(format!(
                "unknown job status value: {other}"
            ))),
        }
    }
}

/// Point-in-time view of an escrow job's global state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobSnapshot {
    pub app_id: u64,
    pub client: Address,
    pub freelancer: Option<Address>,
    /// Escrowed amount in whole units
    pub amount: f64,
    pub status: JobStatus,
    pub created_at: u64,
    pub deadline_at: u64,
    pub dispute_votes_for: u64,
    pub dispute_votes_against: u64,
    pub total_jurors: u64,
}

/// Aggregate reputation read back from the token contract's local state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReputationSnapshot {
    pub token_count: u64,
    pub positive: u64,
    pub negative: u64,
    pub last_earned_at: u64,
    pub juror_eligible: bool,
    pub score: f64,
}

impl ReputationSnapshot {
    pub fn new(
        token_count: u64,
        positive: u64,
        negative: u64,
        last_earned_at: u64,
        juror_eligible: bool,
    ) -> Self {
        Self {
            token_count,
            positive,
            negative,
            last_earned_at,
            juror_eligible,
            score: reputation_score(token_count, positive, negative),
        }
    }
}

/// Score in [0, 100]; accounts with no tokens start at the neutral 50
pub fn reputation_score(token_count: u64, positive: u64, negative: u64) -> f64 {
    if token_count == 0 {
        return 50.0;
    }
    let net = positive as f64 - negative as f64;
    let score = net / token_count as f64 * 100.0;
    score.clamp(0.0, 100.0)
}

/// Parameters for posting a new job
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateJobRequest {
    /// Escrow amount in whole units
    pub amount: f64,
    pub deadline_days: u64,
    pub description: String,
    pub requirements: Vec<String>,
}

impl CreateJobRequest {
    /// Preconditions checked before any network call
    pub fn validate(&self) -> Result<(), ClientError> {
        if !(self.amount > 0.0) {
            return Err(ClientError::Validation(
                "job amount must be greater than zero".to_string(),
            ));
        }
        if self.deadline_days == 0 {
            return Err(ClientError::Validation(
                "job deadline must be at least one day".to_string(),
            ));
        }
        Ok(())
    }
}

/// Uniform outcome of a facade operation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum OperationResult {
    Confirmed {
        tx_id: String,
        app_id: Option<u64>,
    },
    Failed {
        error: String,
    },
}

impl OperationResult {
    pub fn confirmed(tx_id: impl Into<String>, app_id: Option<u64>) -> Self {
        OperationResult::Confirmed {
            tx_id: tx_id.into(),
            app_id,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        OperationResult::Failed {
            error: error.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, OperationResult::Confirmed { .. })
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            OperationResult::Failed { error } => Some(error),
            OperationResult::Confirmed { .. } => None,
        }
    }
}

/// Independent health of both deployed contracts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthReport {
    pub escrow_healthy: bool,
    pub sbt_healthy: bool,
    /// Funding balances of the contracts' derived accounts, whole units
    pub escrow_balance: f64,
    pub sbt_balance: f64,
    pub errors: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn score_is_neutral_with_no_tokens() {
        assert_eq!(reputation_score(0, 0, 0), 50.0);
        assert_eq!(reputation_score(0, 8, 2), 50.0);
    }

    #[test]
    fn score_from_ratings() {
        // (8 - 2) / 10 * 100 = 60
        assert_eq!(reputation_score(10, 8, 2), 60.0);
        assert_eq!(reputation_score(4, 4, 0), 100.0);
    }

    #[test]
    fn score_is_clamped() {
        assert_eq!(reputation_score(2, 0, 2), 0.0);
        assert_eq!(reputation_score(1, 5, 0), 100.0);
    }

    #[test]
    fn create_job_preconditions() {
        let good = CreateJobRequest {
            amount: 1.0,
            deadline_days: 7,
            description: "t".to_string(),
            requirements: vec![],
        };
        assert!(good.validate().is_ok());

        let mut bad = good.clone();
        bad.amount = 0.0;
        assert!(matches!(bad.validate(), Err(ClientError::Validation(_))));

        let mut bad = good.clone();
        bad.amount = -3.0;
        assert!(bad.validate().is_err());

        let mut bad = good;
        bad.deadline_days = 0;
        assert!(bad.validate().is_err());
    }

    #[test]
    fn status_values_round_trip() {
        for (raw, status) in [
            (0, JobStatus::Created),
            (1, JobStatus::InProgress),
            (2, JobStatus::Completed),
            (3, JobStatus::Disputed),
            (4, JobStatus::Resolved),
        ] {
            assert_eq!(JobStatus::try_from(raw).unwrap(), status);
        }
        assert!(JobStatus::try_from(5).is_err());
    }

    #[test]
    fn result_is_never_both() {
        let ok = OperationResult::confirmed("ABC123", Some(42));
        assert!(ok.is_success());
        assert!(ok.error().is_none());

        let failed = OperationResult::failed("boom");
        assert!(!failed.is_success());
        assert_eq!(failed.error(), Some("boom"));
    }
}
