use crate::{
    live::{CaseStatus, TestCaseOutcome},
    problem::{DisplayLanguage, Problem},
};
use base64::Engine as _;
use serde::{de::Error, Deserialize, Serialize};
use uuid::Uuid;

/// Base64 encoding for binary data
#[derive(Debug, Clone)]
pub struct ByteString(pub Vec<u8>);

impl Serialize for ByteString {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let repr = base64::engine::general_purpose::STANDARD.encode(&self.0);
        repr.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for ByteString {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let repr = String::deserialize(deserializer)?;
        base64::engine::general_purpose::STANDARD
            .decode(&repr)
            .map(ByteString)
            .map_err(|err| {
                D::Error::custom(format_args!(
                    "expected valid base64-encoded string: {:#}",
                    err
                ))
            })
    }
}

/// Input of one case and, optionally, the output it should produce
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct CaseSpec {
    pub input: String,
    #[serde(default)]
    pub expected_output: Option<String>,
}

/// Multi-case run request
#[derive(Serialize, Deserialize)]
pub struct JobRequest {
    /// Program source, as a base64-encoded string
    pub source: ByteString,
    /// Judge language id
    pub language: String,
    #[serde(default)]
    pub cases: Vec<CaseSpec>,
}

/// Information about previously created multi-case job
#[derive(Serialize, Deserialize, Debug)]
pub struct JobView {
    /// Identifier of the job
    pub id: Uuid,
    /// Whether cases are still running
    pub loading: bool,
    /// Per-case status, in case order
    pub statuses: Vec<CaseStatus>,
    /// Per-case outcome, in case order, filled in as cases complete
    #[serde(default)]
    pub outcomes: Vec<Option<TestCaseOutcome>>,
    /// Set once all cases have settled
    pub results: Option<Vec<TestCaseOutcome>>,
    /// Error message, if the job has failed as a whole
    pub error: Option<String>,
}

/// Problem or contest scrape request
#[derive(Serialize, Deserialize, Debug)]
pub struct ProblemRequest {
    /// Task / contest id or URL
    pub target: String,
    /// Overrides the service's default statement language
    #[serde(default)]
    pub language: Option<DisplayLanguage>,
}

/// Information about a contest crawl
#[derive(Serialize, Deserialize, Debug)]
pub struct CrawlView {
    pub id: Uuid,
    pub completed: bool,
    /// Problems fetched so far, in task list order
    pub problems: Vec<Problem>,
    /// Error message, if the crawl was aborted
    pub error: Option<String>,
}

/// Body of unsuccessful responses
#[derive(Serialize, Deserialize, Debug)]
pub struct ErrorBody {
    /// Machine-readable error kind, e.g. `InvalidIdentifier`
    pub error: String,
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn job_request_source_is_base64() {
        let req: JobRequest = serde_json::from_str(
            r#"{"source": "aW50IG1haW4oKSB7fQ==", "language": "cpp",
                "cases": [{"input": "1 2", "expectedOutput": "3"}, {"input": "x"}]}"#,
        )
        .unwrap();
        assert_eq!(req.source.0, b"int main() {}");
        assert_eq!(req.cases.len(), 2);
        assert_eq!(req.cases[0].expected_output.as_deref(), Some("3"));
        assert!(req.cases[1].expected_output.is_none());
    }

    #[test]
    fn invalid_base64_is_rejected() {
        let res = serde_json::from_str::<JobRequest>(r#"{"source": "!!", "language": "c"}"#);
        assert!(res.is_err());
    }
}
