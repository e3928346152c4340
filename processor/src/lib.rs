//! Processor is part of judge that deals with a single multi-case run (and
//! it doesn't care where the cases have come from).

pub mod fake;
pub mod verdict;

use judge_apis::{
    live::{CaseStatus, RunEvent, TestCaseOutcome},
    problem::Sample,
    run::{RunRequest, RunResult},
};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tracing::Instrument;

/// Something able to run a program once.
///
/// Failures returned here mean that no judgement was obtained at all;
/// a crashing program is a successful execution with a failed result.
#[async_trait::async_trait]
pub trait Executor: Send + Sync {
    async fn execute(&self, req: &RunRequest) -> anyhow::Result<RunResult>;
}

#[async_trait::async_trait]
impl Executor for judge_client::Client {
    async fn execute(&self, req: &RunRequest) -> anyhow::Result<RunResult> {
        Ok(self.submit(req).await?)
    }
}

/// Single test case
#[derive(Debug, Clone)]
pub struct Case {
    pub input: String,
    pub expected_output: Option<String>,
}

impl From<Sample> for Case {
    fn from(sample: Sample) -> Self {
        Case {
            input: sample.input,
            expected_output: Some(sample.output),
        }
    }
}

/// Single multi-case request
#[derive(Debug, Clone)]
pub struct Request {
    pub source_code: String,
    /// Judge language id
    pub language: String,
    pub cases: Vec<Case>,
}

#[derive(Debug, thiserror::Error)]
pub enum ProcessError {
    #[error("source code is empty")]
    EmptySource,
    #[error("background task stopped unexpectedly")]
    Aborted,
}

/// Starts running all cases of `req` in the background.
#[tracing::instrument(skip(req, executor), fields(language = %req.language, cases = req.cases.len()))]
pub fn run_all(req: Request, executor: Arc<dyn Executor>) -> Result<JobProgress, ProcessError> {
    if req.source_code.trim().is_empty() {
        return Err(ProcessError::EmptySource);
    }
    let (done_tx, done_rx) = oneshot::channel();
    let (events_tx, events_rx) = mpsc::channel(16);
    tokio::task::spawn(
        async move {
            let outcomes = run_cases(&req, executor.as_ref(), &events_tx).await;
            drop(events_tx);
            done_tx.send(outcomes).ok();
        }
        .in_current_span(),
    );
    Ok(JobProgress { events_rx, done_rx })
}

/// Can be used to view run progress
pub struct JobProgress {
    events_rx: mpsc::Receiver<RunEvent>,
    done_rx: oneshot::Receiver<Vec<TestCaseOutcome>>,
}

impl JobProgress {
    /// Wait for completion. All pending events will be dropped.
    pub async fn wait(self) -> Result<Vec<TestCaseOutcome>, ProcessError> {
        let JobProgress { events_rx, done_rx } = self;
        drop(events_rx);
        done_rx.await.map_err(|_| ProcessError::Aborted)
    }

    /// Returns next event, or `None` once the run has finished.
    pub async fn event(&mut self) -> Option<RunEvent> {
        self.events_rx.recv().await
    }
}

/// Runs every case concurrently and returns outcomes in case order.
///
/// A failure of one case does not affect the others.
#[tracing::instrument(skip_all, fields(cases = req.cases.len()))]
pub async fn run_cases(
    req: &Request,
    executor: &dyn Executor,
    tx: &mpsc::Sender<RunEvent>,
) -> Vec<TestCaseOutcome> {
    tx.send(RunEvent::Loading { loading: true }).await.ok();
    let outcomes = futures::future::join_all(
        req.cases
            .iter()
            .enumerate()
            .map(|(index, case)| run_case(req, index, case, executor, tx)),
    )
    .await;
    let failed = outcomes
        .iter()
        .filter(|o| o.status == CaseStatus::Error)
        .count();
    tracing::info!(failed, "all cases settled");
    tx.send(RunEvent::Aggregate {
        results: outcomes.clone(),
    })
    .await
    .ok();
    tx.send(RunEvent::Loading { loading: false }).await.ok();
    outcomes
}

async fn run_case(
    req: &Request,
    index: usize,
    case: &Case,
    executor: &dyn Executor,
    tx: &mpsc::Sender<RunEvent>,
) -> TestCaseOutcome {
    tx.send(RunEvent::Running { index }).await.ok();
    let run = RunRequest {
        source_code: req.source_code.clone(),
        language: req.language.clone(),
        stdin: case.input.clone(),
    };
    let mut outcome = TestCaseOutcome {
        index,
        input: case.input.clone(),
        expected_output: case.expected_output.clone(),
        result: None,
        error: None,
        status: CaseStatus::Completed,
        verdict: None,
    };
    match executor.execute(&run).await {
        Ok(result) => {
            outcome.verdict = verdict::classify(&result, case.expected_output.as_deref());
            tracing::debug!(index, verdict = ?outcome.verdict, "case completed");
            outcome.result = Some(result);
        }
        Err(err) => {
            tracing::warn!(index, err = %format_args!("{:#}", err), "case failed");
            outcome.error = Some(format!("{:#}", err));
            outcome.status = CaseStatus::Error;
        }
    }
    tx.send(RunEvent::Completed {
        outcome: outcome.clone(),
    })
    .await
    .ok();
    outcome
}
