use std::sync::Arc;

use tracing::{error, info};

use ellora_chain::node::NodeApi;
use ellora_chain::state::{decode_job, decode_reputation};
use ellora_chain::submit::{submit_and_confirm, ConfirmationPolicy, Confirmed};
use ellora_chain::txn::{
    app_call, arg_uint, assign_group, payment, METHOD_ACCEPT_JOB, METHOD_APPROVE_COMPLETION,
    METHOD_COMPLETE_JOB, METHOD_CREATE_JOB, METHOD_MINT_SBT, METHOD_RAISE_DISPUTE,
    METHOD_VOTE_DISPUTE,
};
use ellora_common::units::to_micro;
use ellora_common::{
    Address, ClientError, ContractConfig, CreateJobRequest, HealthReport, JobSnapshot,
    OperationResult, ReputationSnapshot,
};
use ellora_wallet::{TxnToSign, WalletSigner};

/// Ratings accepted by the reputation contract
const RATING_RANGE: std::ops::RangeInclusive<u8> = 1..=5;

/// Entry point for every marketplace operation. Explicitly constructed
/// and passed by reference; owns nothing global.
pub struct MarketplaceService {
    node: Arc<dyn NodeApi>,
    signer: Arc<dyn WalletSigner>,
    config: ContractConfig,
    confirmation: ConfirmationPolicy,
}

impl MarketplaceService {
    pub fn new(
        node: Arc<dyn NodeApi>,
        signer: Arc<dyn WalletSigner>,
        config: ContractConfig,
    ) -> Self {
        Self {
            node,
            signer,
            config,
            confirmation: ConfirmationPolicy::default(),
        }
    }

    pub fn with_confirmation_policy(mut self, policy: ConfirmationPolicy) -> Self {
        self.confirmation = policy;
        self
    }

    pub fn config(&self) -> &ContractConfig {
        &self.config
    }

    /// Post a new job: an escrow application call grouped atomically with
    /// the payment funding it. Both confirm or neither does.
    pub async fn create_job(&self, client: &Address, request: &CreateJobRequest) -> OperationResult {
        if let Err(e) = request.validate() {
            return OperationResult::failed(e.to_string());
        }

        info!(
            amount = request.amount,
            deadline_days = request.deadline_days,
            "creating job"
        );

        match self.create_job_group(client, request).await {
            Ok(confirmed) => {
                OperationResult::confirmed(confirmed.tx_id, Some(self.config.escrow_app_id))
            }
            Err(e) => {
                error!("create_job failed: {e}");
                OperationResult::failed(e.to_string())
            }
        }
    }

    async fn create_job_group(
        &self,
        client: &Address,
        request: &CreateJobRequest,
    ) -> Result<Confirmed, ClientError> {
        let params = self.node.suggested_params().await?;
        let amount_micro = to_micro(request.amount);
        let escrow_address = Address::for_application(self.config.escrow_app_id);

        let mut group = [
            app_call(
                client,
                self.config.escrow_app_id,
                vec![
                    METHOD_CREATE_JOB.to_vec(),
                    arg_uint(amount_micro),
                    arg_uint(request.deadline_days),
                ],
                &params,
            ),
            payment(client, &escrow_address, amount_micro, &params),
        ];
        assign_group(&mut group);

        let to_sign: Vec<TxnToSign> = group
            .iter()
            .map(|txn| TxnToSign {
                txn: txn.clone(),
                signer: *client,
            })
            .collect();
        let signed = self.signer.sign(&to_sign).await?;

        submit_and_confirm(self.node.as_ref(), &signed, &self.confirmation).await
    }

    /// Claim an open job as its freelancer
    pub async fn accept_job(&self, freelancer: &Address, job_app_id: u64) -> OperationResult {
        self.single_call(freelancer, job_app_id, vec![METHOD_ACCEPT_JOB.to_vec()], "accept_job")
            .await
    }

    /// Mark the work delivered
    pub async fn complete_job(&self, freelancer: &Address, job_app_id: u64) -> OperationResult {
        self.single_call(
            freelancer,
            job_app_id,
            vec![METHOD_COMPLETE_JOB.to_vec()],
            "complete_job",
        )
        .await
    }

    /// Release escrowed funds to the freelancer
    pub async fn approve_completion(&self, client: &Address, job_app_id: u64) -> OperationResult {
        self.single_call(
            client,
            job_app_id,
            vec![METHOD_APPROVE_COMPLETION.to_vec()],
            "approve_completion",
        )
        .await
    }

    /// Escalate a job to juror voting
    pub async fn raise_dispute(&self, sender: &Address, job_app_id: u64) -> OperationResult {
        self.single_call(
            sender,
            job_app_id,
            vec![METHOD_RAISE_DISPUTE.to_vec()],
            "raise_dispute",
        )
        .await
    }

    /// Cast a juror vote; the contract takes 1 for the freelancer, 0 against
    pub async fn vote_dispute(
        &self,
        juror: &Address,
        job_app_id: u64,
        for_freelancer: bool,
    ) -> OperationResult {
        self.single_call(
            juror,
            job_app_id,
            vec![
                METHOD_VOTE_DISPUTE.to_vec(),
                arg_uint(u64::from(for_freelancer)),
            ],
            "vote_dispute",
        )
        .await
    }

    /// Mint a reputation token recording a completed job's rating
    pub async fn mint_sbt(&self, sender: &Address, rating: u8) -> OperationResult {
        if !RATING_RANGE.contains(&rating) {
            return OperationResult::failed(format!(
                "rating must be between {} and {}",
                RATING_RANGE.start(),
                RATING_RANGE.end()
            ));
        }

        self.single_call(
            sender,
            self.config.sbt_app_id,
            vec![METHOD_MINT_SBT.to_vec(), arg_uint(u64::from(rating))],
            "mint_sbt",
        )
        .await
    }

    async fn single_call(
        &self,
        sender: &Address,
        app_id: u64,
        args: Vec<Vec<u8>>,
        operation: &str,
    ) -> OperationResult {
        info!(app_id, operation, "submitting application call");

        match self.signed_call(sender, app_id, args).await {
            Ok(confirmed) => OperationResult::confirmed(confirmed.tx_id, Some(app_id)),
            Err(e) => {
                error!("{operation} failed: {e}");
                OperationResult::failed(e.to_string())
            }
        }
    }

    async fn signed_call(
        &self,
        sender: &Address,
        app_id: u64,
        args: Vec<Vec<u8>>,
    ) -> Result<Confirmed, ClientError> {
        let params = self.node.suggested_params().await?;
        let call = app_call(sender, app_id, args, &params);
        let signed = self
            .signer
            .sign(&[TxnToSign {
                txn: call,
                signer: *sender,
            }])
            .await?;

        submit_and_confirm(self.node.as_ref(), &signed, &self.confirmation).await
    }

    /// Decode a job's escrow state. A missing application or empty state
    /// is `None`, not an error.
    pub async fn job_state(&self, job_app_id: u64) -> Result<Option<JobSnapshot>, ClientError> {
        let info = match self.node.application_information(job_app_id).await {
            Ok(info) => info,
            Err(e) if e.is_not_found() => return Ok(None),
            Err(e) => return Err(e),
        };

        if info.params.global_state.is_empty() {
            return Ok(None);
        }

        decode_job(job_app_id, &info.params.global_state).map(Some)
    }

    /// Aggregate reputation for an account; `None` until it opts in to the
    /// token contract.
    pub async fn reputation(
        &self,
        address: &Address,
    ) -> Result<Option<ReputationSnapshot>, ClientError> {
        let info = match self
            .node
            .account_application_information(address, self.config.sbt_app_id)
            .await
        {
            Ok(info) => info,
            Err(e) if e.is_not_found() => return Ok(None),
            Err(e) => return Err(e),
        };

        let Some(local) = info.app_local_state else {
            return Ok(None);
        };

        Ok(Some(decode_reputation(&local.key_value)))
    }

    /// Existence and funding of both contracts, checked independently so
    /// one unreachable contract does not mask the other.
    pub async fn health(&self) -> HealthReport {
        let mut report = HealthReport {
            escrow_healthy: false,
            sbt_healthy: false,
            escrow_balance: 0.0,
            sbt_balance: 0.0,
            errors: Vec::new(),
        };

        let escrow = self.check_contract(self.config.escrow_app_id).await;
        report.escrow_healthy = escrow.healthy;
        report.escrow_balance = escrow.balance;
        if let Some(error) = escrow.error {
            report.errors.push(format!("Escrow contract error: {error}"));
        }

        let sbt = self.check_contract(self.config.sbt_app_id).await;
        report.sbt_healthy = sbt.healthy;
        report.sbt_balance = sbt.balance;
        if let Some(error) = sbt.error {
            report.errors.push(format!("SBT contract error: {error}"));
        }

        report
    }

    /// A contract is healthy once its application exists; a failed funding
    /// lookup afterwards is recorded without retracting that.
    async fn check_contract(&self, app_id: u64) -> ContractCheck {
        if let Err(e) = self.node.application_information(app_id).await {
            return ContractCheck {
                healthy: false,
                balance: 0.0,
                error: Some(e.to_string()),
            };
        }

        match self
            .node
            .account_information(&Address::for_application(app_id))
            .await
        {
            Ok(account) => ContractCheck {
                healthy: true,
                balance: ellora_common::units::from_micro(account.amount),
                error: None,
            },
            Err(e) => ContractCheck {
                healthy: true,
                balance: 0.0,
                error: Some(e.to_string()),
            },
        }
    }
}

struct ContractCheck {
    healthy: bool,
    balance: f64,
    error: Option<String>,
}
