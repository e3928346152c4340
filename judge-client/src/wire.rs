//! Payloads of the judge's runner API.
use judge_apis::run::{BuildStatus, ExecStatus, RunResult};
use serde::{de::Error as _, Deserialize, Deserializer, Serialize};

/// Job status after which the job will not change any more.
const TERMINAL_STATUS: &str = "completed";

#[derive(Serialize, Debug)]
pub(crate) struct CreateRunner<'a> {
    pub(crate) source_code: &'a str,
    pub(crate) language: &'a str,
    pub(crate) input: &'a str,
    pub(crate) api_key: &'a str,
}

/// Returned by both `create` and `get_status`
#[derive(Deserialize, Debug)]
pub(crate) struct RunnerStatus {
    #[serde(default)]
    pub(crate) id: Option<String>,
    #[serde(default)]
    pub(crate) status: Option<String>,
    #[serde(default)]
    pub(crate) error: Option<String>,
}

impl RunnerStatus {
    pub(crate) fn is_terminal(&self) -> bool {
        self.status.as_deref() == Some(TERMINAL_STATUS)
    }
}

#[derive(Deserialize, Debug)]
pub(crate) struct RunnerDetails {
    #[serde(default)]
    pub(crate) error: Option<String>,
    #[serde(default)]
    pub(crate) build_stdout: Option<String>,
    #[serde(default)]
    pub(crate) build_stderr: Option<String>,
    #[serde(default)]
    pub(crate) build_exit_code: Option<i64>,
    #[serde(default)]
    pub(crate) build_result: Option<BuildStatus>,
    #[serde(default)]
    pub(crate) stdout: Option<String>,
    #[serde(default)]
    pub(crate) stderr: Option<String>,
    #[serde(default)]
    pub(crate) exit_code: Option<i64>,
    #[serde(default, deserialize_with = "seconds")]
    pub(crate) time: Option<f64>,
    #[serde(default, deserialize_with = "bytes")]
    pub(crate) memory: Option<u64>,
    #[serde(default)]
    pub(crate) result: Option<ExecStatus>,
}

impl From<RunnerDetails> for RunResult {
    fn from(d: RunnerDetails) -> Self {
        RunResult {
            result: d.result,
            build_result: d.build_result,
            stdout: d.stdout.unwrap_or_default(),
            stderr: d.stderr.unwrap_or_default(),
            exit_code: d.exit_code,
            build_stdout: d.build_stdout.unwrap_or_default(),
            build_stderr: d.build_stderr.unwrap_or_default(),
            build_exit_code: d.build_exit_code,
            time: d.time,
            memory: d.memory,
        }
    }
}

/// The judge is not consistent about numbers: `time` comes as a
/// string ("0.01"), `memory` as an integer, and both may be null.
#[derive(Deserialize)]
#[serde(untagged)]
enum Number {
    Int(u64),
    Float(f64),
    Text(String),
}

fn seconds<'de, D: Deserializer<'de>>(d: D) -> Result<Option<f64>, D::Error> {
    match Option::<Number>::deserialize(d)? {
        None => Ok(None),
        Some(Number::Int(i)) => Ok(Some(i as f64)),
        Some(Number::Float(f)) => Ok(Some(f)),
        Some(Number::Text(s)) if s.trim().is_empty() => Ok(None),
        Some(Number::Text(s)) => s
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| D::Error::custom(format_args!("invalid time: {:?}", s))),
    }
}

fn bytes<'de, D: Deserializer<'de>>(d: D) -> Result<Option<u64>, D::Error> {
    match Option::<Number>::deserialize(d)? {
        None => Ok(None),
        Some(Number::Int(i)) => Ok(Some(i)),
        Some(Number::Float(f)) => Ok(Some(f as u64)),
        Some(Number::Text(s)) if s.trim().is_empty() => Ok(None),
        Some(Number::Text(s)) => s
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| D::Error::custom(format_args!("invalid memory: {:?}", s))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn details_with_string_time() {
        let details: RunnerDetails = serde_json::from_str(
            r#"{"id": "x", "status": "completed", "build_result": null,
                "stdout": "4\n", "stderr": "", "exit_code": 0,
                "time": "0.03", "memory": 10240, "result": "success"}"#,
        )
        .unwrap();
        let res = RunResult::from(details);
        assert_eq!(res.time, Some(0.03));
        assert_eq!(res.memory, Some(10240));
        assert!(res.succeeded());
        assert_eq!(res.build_result, None);
        assert_eq!(res.build_stderr, "");
    }

    #[test]
    fn details_with_unexpected_result() {
        let details: RunnerDetails = serde_json::from_str(
            r#"{"build_result": "failure", "build_stderr": "error: expected ';'",
                "stdout": null, "time": null, "memory": null, "result": "killed"}"#,
        )
        .unwrap();
        let res = RunResult::from(details);
        assert_eq!(res.result, Some(ExecStatus::Unknown));
        assert!(res.build_failed());
        assert_eq!(res.stdout, "");
        assert_eq!(res.time, None);
    }
}
