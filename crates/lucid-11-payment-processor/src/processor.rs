//! `PaymentProcessor`: routes a validated payment to a settlement
//! router and drives it through its execution model with bounded,
//! non-double-spend-safe retries (spec.md §4.7).

use crate::errors::{ProcessorError, SettlementOutcome};
use crate::ports::{NonInclusionPort, SettlementPort};
use crate::router::{route, ExecutionModel, RoutingDecision, RoutingRule};
use lucid_bus::{EventPublisher, LucidEvent};
use lucid_types::{PaymentRequest, PaymentStatus};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{RwLock, Semaphore};
use uuid::Uuid;

/// Worker-pool size for IMMEDIATE jobs.
pub const DEFAULT_MAX_CONCURRENT_JOBS: usize = 20;
/// BATCH drain cadence.
pub const DEFAULT_BATCH_INTERVAL: Duration = Duration::from_secs(60);
/// Jobs pulled per BATCH drain.
pub const DEFAULT_BATCH_SIZE: usize = 50;
/// Retries attempted after the first settlement try.
pub const DEFAULT_RETRY_ATTEMPTS: u32 = 3;
/// Per-attempt settlement processing budget.
pub const DEFAULT_PROCESSING_TIMEOUT: Duration = Duration::from_secs(300);
/// Overall settlement confirmation budget.
pub const DEFAULT_SETTLEMENT_TIMEOUT: Duration = Duration::from_secs(600);

/// Tunables for [`PaymentProcessor`], defaulting to spec.md §4.7's values.
#[derive(Debug, Clone)]
pub struct ProcessorConfig {
    pub max_concurrent_jobs: usize,
    pub batch_interval: Duration,
    pub batch_size: usize,
    pub retry_attempts: u32,
    pub processing_timeout: Duration,
    pub settlement_timeout: Duration,
}

impl Default for ProcessorConfig {
    fn default() -> Self {
        Self {
            max_concurrent_jobs: DEFAULT_MAX_CONCURRENT_JOBS,
            batch_interval: DEFAULT_BATCH_INTERVAL,
            batch_size: DEFAULT_BATCH_SIZE,
            retry_attempts: DEFAULT_RETRY_ATTEMPTS,
            processing_timeout: DEFAULT_PROCESSING_TIMEOUT,
            settlement_timeout: DEFAULT_SETTLEMENT_TIMEOUT,
        }
    }
}

/// Lifecycle of one settlement job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobStatus {
    /// Waiting on its execution model's trigger (or manual approval).
    Queued,
    Running,
    Succeeded,
    /// Exhausted its retry budget.
    Failed,
    /// Timed out with an observed txid; blocked until non-inclusion is
    /// confirmed out of band.
    AwaitingNonInclusion,
}

struct Job {
    payment_id: Uuid,
    request: PaymentRequest,
    decision: RoutingDecision,
    status: JobStatus,
    tries: u32,
    observed_txid: Option<String>,
    scheduled_at: Option<u64>,
    pending_approval: bool,
}

fn backoff_delay(tries: u32) -> Duration {
    Duration::from_millis(250) * 2u32.saturating_pow(tries.saturating_sub(1))
}

/// Routes and settles validated payment requests.
pub struct PaymentProcessor {
    rules: Vec<RoutingRule>,
    config: ProcessorConfig,
    bus: Arc<dyn EventPublisher>,
    settlement: Arc<dyn SettlementPort>,
    non_inclusion: Arc<dyn NonInclusionPort>,
    immediate_permits: Arc<Semaphore>,
    jobs: RwLock<HashMap<Uuid, Job>>,
}

impl PaymentProcessor {
    #[must_use]
    pub fn new(
        rules: Vec<RoutingRule>,
        config: ProcessorConfig,
        bus: Arc<dyn EventPublisher>,
        settlement: Arc<dyn SettlementPort>,
        non_inclusion: Arc<dyn NonInclusionPort>,
    ) -> Self {
        let immediate_permits = Arc::new(Semaphore::new(config.max_concurrent_jobs));
        Self { rules, config, bus, settlement, non_inclusion, immediate_permits, jobs: RwLock::new(HashMap::new()) }
    }

    async fn publish(&self, event: LucidEvent) {
        self.bus.publish(event).await;
    }

    /// Computes a routing decision and enqueues a job. IMMEDIATE jobs
    /// that don't require manual approval run right away; everything
    /// else waits for a drain call (or [`Self::approve`]).
    pub async fn submit(&self, request: PaymentRequest, scheduled_at: Option<u64>) -> Uuid {
        let decision = route(&self.rules, &request);
        let job_id = Uuid::new_v4();
        let pending_approval = decision.requires_manual_approval;
        let job = Job {
            payment_id: request.payment_id,
            request,
            decision,
            status: JobStatus::Queued,
            tries: 0,
            observed_txid: None,
            scheduled_at,
            pending_approval,
        };
        self.jobs.write().await.insert(job_id, job);

        if !pending_approval && decision.execution_model == ExecutionModel::Immediate {
            self.run(job_id).await.ok();
        }
        job_id
    }

    /// Clears a job's manual-approval hold and, for IMMEDIATE jobs,
    /// runs it right away.
    pub async fn approve(&self, job_id: Uuid) -> Result<(), ProcessorError> {
        let immediate = {
            let mut jobs = self.jobs.write().await;
            let job = jobs.get_mut(&job_id).ok_or(ProcessorError::JobNotFound(job_id))?;
            job.pending_approval = false;
            job.decision.execution_model == ExecutionModel::Immediate
        };
        if immediate {
            self.run(job_id).await?;
        }
        Ok(())
    }

    /// Drains up to `batch_size` queued BATCH jobs.
    pub async fn drain_batch(&self) -> Vec<(Uuid, JobStatus)> {
        let due: Vec<Uuid> = {
            let jobs = self.jobs.read().await;
            jobs.iter()
                .filter(|(_, j)| {
                    j.status == JobStatus::Queued
                        && !j.pending_approval
                        && j.decision.execution_model == ExecutionModel::Batch
                })
                .take(self.config.batch_size)
                .map(|(id, _)| *id)
                .collect()
        };
        self.run_many(due).await
    }

    /// Runs every SCHEDULED job whose `scheduled_at` has passed.
    pub async fn drain_scheduled(&self, now: u64) -> Vec<(Uuid, JobStatus)> {
        let due: Vec<Uuid> = {
            let jobs = self.jobs.read().await;
            jobs.iter()
                .filter(|(_, j)| {
                    j.status == JobStatus::Queued
                        && !j.pending_approval
                        && j.decision.execution_model == ExecutionModel::Scheduled
                        && j.scheduled_at.is_some_and(|t| t <= now)
                })
                .map(|(id, _)| *id)
                .collect()
        };
        self.run_many(due).await
    }

    /// Re-evaluates `precondition` for every queued CONDITIONAL job and
    /// runs the ones it accepts.
    pub async fn drain_conditional<F>(&self, precondition: F) -> Vec<(Uuid, JobStatus)>
    where
        F: Fn(&PaymentRequest) -> bool,
    {
        let due: Vec<Uuid> = {
            let jobs = self.jobs.read().await;
            jobs.iter()
                .filter(|(_, j)| {
                    j.status == JobStatus::Queued
                        && !j.pending_approval
                        && j.decision.execution_model == ExecutionModel::Conditional
                        && precondition(&j.request)
                })
                .map(|(id, _)| *id)
                .collect()
        };
        self.run_many(due).await
    }

    async fn run_many(&self, job_ids: Vec<Uuid>) -> Vec<(Uuid, JobStatus)> {
        let mut results = Vec::with_capacity(job_ids.len());
        for id in job_ids {
            if let Ok(status) = self.run(id).await {
                results.push((id, status));
            }
        }
        results
    }

    /// Retries a job stuck in `AwaitingNonInclusion`. A no-op error if
    /// the job isn't in that state.
    pub async fn retry(&self, job_id: Uuid) -> Result<JobStatus, ProcessorError> {
        {
            let jobs = self.jobs.read().await;
            let job = jobs.get(&job_id).ok_or(ProcessorError::JobNotFound(job_id))?;
            if job.status != JobStatus::AwaitingNonInclusion {
                return Err(ProcessorError::NotSchedulable(job_id));
            }
        }
        self.run(job_id).await
    }

    pub async fn status(&self, job_id: Uuid) -> Option<JobStatus> {
        self.jobs.read().await.get(&job_id).map(|j| j.status)
    }

    async fn run(&self, job_id: Uuid) -> Result<JobStatus, ProcessorError> {
        let _permit = self.immediate_permits.acquire().await.expect("semaphore closed");

        let (payment_id, request, router, mut tries, mut observed_txid) = {
            let mut jobs = self.jobs.write().await;
            let job = jobs.get_mut(&job_id).ok_or(ProcessorError::JobNotFound(job_id))?;
            job.status = JobStatus::Running;
            (job.payment_id, job.request.clone(), job.decision.router, job.tries, job.observed_txid.clone())
        };

        let max_tries = self.config.retry_attempts + 1;
        let final_status;
        let mut reason = String::new();
        let mut settled_txid = None;

        loop {
            if tries > 0 {
                if let Some(txid) = &observed_txid {
                    if !self.non_inclusion.confirm_non_inclusion(txid).await {
                        final_status = JobStatus::AwaitingNonInclusion;
                        break;
                    }
                }
                tokio::time::sleep(backoff_delay(tries)).await;
            }
            tries += 1;

            match self.settlement.settle(router, &request).await {
                SettlementOutcome::Succeeded(txid) => {
                    settled_txid = Some(txid);
                    final_status = JobStatus::Succeeded;
                    break;
                }
                SettlementOutcome::Rejected(why) => {
                    reason = why;
                    if tries >= max_tries {
                        final_status = JobStatus::Failed;
                        break;
                    }
                }
                SettlementOutcome::TimedOut { observed_txid: seen } => {
                    if seen.is_some() {
                        observed_txid = seen;
                    }
                    reason = "settlement timed out".to_string();
                    if tries >= max_tries {
                        final_status = JobStatus::Failed;
                        break;
                    }
                }
            }
        }

        {
            let mut jobs = self.jobs.write().await;
            if let Some(job) = jobs.get_mut(&job_id) {
                job.status = final_status;
                job.tries = tries;
                job.observed_txid = observed_txid.clone();
            }
        }

        match final_status {
            JobStatus::Succeeded => {
                self.publish(LucidEvent::PaymentStatusChanged {
                    payment_id,
                    from: request.status,
                    to: PaymentStatus::Processed,
                })
                .await;
                let _ = settled_txid;
            }
            JobStatus::Failed => {
                self.publish(LucidEvent::CriticalError {
                    component: "lucid-11-payment-processor".to_string(),
                    error: format!("payment {payment_id} job {job_id} failed after {tries} attempts: {reason}"),
                })
                .await;
            }
            JobStatus::AwaitingNonInclusion | JobStatus::Queued | JobStatus::Running => {}
        }

        Ok(final_status)
    }
}
