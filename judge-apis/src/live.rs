//! Progress and results of a multi-case run.
use crate::run::RunResult;
use serde::{Deserialize, Serialize};

/// Judgement of one test case.
#[derive(
    Serialize,
    Deserialize,
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    strum::Display,
    strum::EnumString,
)]
pub enum Verdict {
    /// Output matches the expected output
    AC,
    /// Program ran, but output differs
    WA,
    /// Program failed at runtime
    RE,
    /// Program failed to compile
    CE,
}

/// Lifecycle of a single case.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum CaseStatus {
    #[default]
    Pending,
    Running,
    Completed,
    /// Judge could not be reached or did not finish the job
    Error,
}

/// Result of one case of a multi-case run.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct TestCaseOutcome {
    pub index: usize,
    pub input: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected_output: Option<String>,
    pub result: Option<RunResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub status: CaseStatus,
    /// None if no expected output was given
    pub verdict: Option<Verdict>,
}

/// Events emitted during a multi-case run.
///
/// A run emits `Loading { loading: true }`, then `Running` for every
/// case, `Completed` for every case in completion order, one `Aggregate`
/// in case order and finally `Loading { loading: false }`.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum RunEvent {
    Loading { loading: bool },
    Running { index: usize },
    Completed { outcome: TestCaseOutcome },
    Aggregate { results: Vec<TestCaseOutcome> },
}
