//! Single submission to the remote judge.
use serde::{Deserialize, Serialize};

/// Source, language and stdin of one submission.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct RunRequest {
    pub source_code: String,
    /// Judge language id, see [`crate::languages`]
    pub language: String,
    #[serde(default)]
    pub stdin: String,
}

/// Outcome of running the program.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ExecStatus {
    Success,
    Failure,
    Timeout,
    #[serde(other)]
    Unknown,
}

/// Outcome of the compile phase.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BuildStatus {
    Success,
    Failure,
    #[serde(other)]
    Unknown,
}

/// Terminal outcome of one submission, as reported by the judge.
///
/// `result` and `build_result` are independent: interpreted languages
/// have no build phase and report `None` there.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct RunResult {
    pub result: Option<ExecStatus>,
    pub build_result: Option<BuildStatus>,
    pub stdout: String,
    pub stderr: String,
    #[serde(default)]
    pub exit_code: Option<i64>,
    #[serde(default)]
    pub build_stdout: String,
    pub build_stderr: String,
    #[serde(default)]
    pub build_exit_code: Option<i64>,
    /// Wall-clock time, seconds
    pub time: Option<f64>,
    /// Peak memory usage, bytes
    pub memory: Option<u64>,
}

impl RunResult {
    pub fn succeeded(&self) -> bool {
        self.result == Some(ExecStatus::Success)
    }

    pub fn build_failed(&self) -> bool {
        self.build_result == Some(BuildStatus::Failure)
    }
}
