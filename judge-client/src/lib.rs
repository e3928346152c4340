//! Allows you to run programs on the remote judge.
//!
//! A submission is an asynchronous job on the judge side: it is created,
//! then its status is polled until it completes, and finally the details
//! (outputs, resource usage) are fetched.

mod wire;

use judge_apis::{
    languages,
    run::{RunRequest, RunResult},
};
use serde::de::DeserializeOwned;
use std::{sync::Arc, time::Duration};
use wire::{CreateRunner, RunnerDetails, RunnerStatus};

pub const DEFAULT_BASE_URL: &str = "https://api.paiza.io";
pub const DEFAULT_API_KEY: &str = "guest";

/// Reasons a submission may fail to produce a [`RunResult`].
///
/// Note that a program which fails to compile or crashes is not an
/// error: that is reported in the result.
#[derive(Debug, thiserror::Error)]
pub enum SubmitError {
    #[error("source code is empty")]
    EmptySource,
    #[error("language {0:?} is not supported by the judge")]
    UnsupportedLanguage(String),
    #[error("failed to {stage}")]
    Transport {
        stage: &'static str,
        #[source]
        source: reqwest::Error,
    },
    #[error("failed to {stage}: judge responded with HTTP {status}")]
    Status { stage: &'static str, status: u16 },
    #[error("judge rejected the job: {0}")]
    Judge(String),
    #[error("job {id} did not complete after {polls} status checks")]
    Timeout { id: String, polls: u32 },
}

struct Settings {
    base_url: String,
    api_key: String,
    poll_interval: Duration,
    max_polls: u32,
}

/// Judge API client. Cheap to clone; holds no per-submission state.
#[derive(Clone)]
pub struct Client {
    settings: Arc<Settings>,
    transport: reqwest::Client,
}

impl Client {
    /// Creates a new builder.
    pub fn builder() -> ClientBuilder {
        ClientBuilder {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: DEFAULT_API_KEY.to_string(),
            poll_interval: Duration::from_secs(1),
            max_polls: 60,
            request_timeout: Duration::from_secs(30),
        }
    }

    /// Runs `req` on the judge and waits for the outcome.
    #[tracing::instrument(skip(self, req), fields(language = %req.language))]
    pub async fn submit(&self, req: &RunRequest) -> Result<RunResult, SubmitError> {
        if req.source_code.trim().is_empty() {
            return Err(SubmitError::EmptySource);
        }
        if !languages::is_supported(&req.language) {
            return Err(SubmitError::UnsupportedLanguage(req.language.clone()));
        }

        let created: RunnerStatus = self
            .call(
                "create job",
                self.transport
                    .post(self.url("runners/create"))
                    .json(&CreateRunner {
                        source_code: &req.source_code,
                        language: &req.language,
                        input: &req.stdin,
                        api_key: &self.settings.api_key,
                    }),
            )
            .await?;
        check_error(created.error.as_deref())?;
        let id = match &created.id {
            Some(id) => id.clone(),
            None => return Err(SubmitError::Judge("response lacks job id".to_string())),
        };
        tracing::debug!(job_id = %id, "job created");

        let mut terminal = created.is_terminal();
        let mut polls = 0;
        while !terminal {
            if polls == self.settings.max_polls {
                tracing::warn!(job_id = %id, polls, "job did not complete in time");
                return Err(SubmitError::Timeout { id, polls });
            }
            tokio::time::sleep(self.settings.poll_interval).await;
            let status: RunnerStatus = self
                .call(
                    "get job status",
                    self.transport
                        .get(self.url("runners/get_status"))
                        .query(&self.job_query(&id)),
                )
                .await?;
            check_error(status.error.as_deref())?;
            terminal = status.is_terminal();
            polls += 1;
        }

        let details: RunnerDetails = self
            .call(
                "get job details",
                self.transport
                    .get(self.url("runners/get_details"))
                    .query(&self.job_query(&id)),
            )
            .await?;
        check_error(details.error.as_deref())?;
        let result = RunResult::from(details);
        tracing::info!(job_id = %id, polls, result = ?result.result, "job completed");
        Ok(result)
    }

    fn job_query<'a>(&'a self, id: &'a str) -> [(&'static str, &'a str); 2] {
        [("id", id), ("api_key", &self.settings.api_key)]
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.settings.base_url, path)
    }

    async fn call<T: DeserializeOwned>(
        &self,
        stage: &'static str,
        req: reqwest::RequestBuilder,
    ) -> Result<T, SubmitError> {
        let resp = req
            .send()
            .await
            .map_err(|source| SubmitError::Transport { stage, source })?;
        let status = resp.status();
        if !status.is_success() {
            return Err(SubmitError::Status {
                stage,
                status: status.as_u16(),
            });
        }
        resp.json()
            .await
            .map_err(|source| SubmitError::Transport { stage, source })
    }
}

fn check_error(error: Option<&str>) -> Result<(), SubmitError> {
    match error {
        Some(msg) if !msg.is_empty() => Err(SubmitError::Judge(msg.to_string())),
        _ => Ok(()),
    }
}

/// The builder for `Client`.
pub struct ClientBuilder {
    base_url: String,
    api_key: String,
    poll_interval: Duration,
    max_polls: u32,
    request_timeout: Duration,
}

impl ClientBuilder {
    /// Judge API root, e.g. `https://api.paiza.io`
    pub fn base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    pub fn api_key(mut self, api_key: &str) -> Self {
        self.api_key = api_key.to_string();
        self
    }

    /// Delay between two job status checks
    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Number of status checks after which a job is considered lost
    pub fn max_polls(mut self, max_polls: u32) -> Self {
        self.max_polls = max_polls;
        self
    }

    /// Timeout of each HTTP request
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Builds a client
    pub fn build(self) -> Result<Client, reqwest::Error> {
        let transport = reqwest::Client::builder()
            .timeout(self.request_timeout)
            .build()?;
        Ok(Client {
            settings: Arc::new(Settings {
                base_url: self.base_url,
                api_key: self.api_key,
                poll_interval: self.poll_interval,
                max_polls: self.max_polls,
            }),
            transport,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use judge_apis::run::{BuildStatus, ExecStatus};
    use serde_json::{json, Value};
    use std::{
        collections::HashMap,
        net::SocketAddr,
        sync::{
            atomic::{AtomicU32, Ordering},
            Arc,
        },
    };
    use warp::{http::StatusCode, Filter};

    /// Fake judge whose jobs complete after `polls_needed` status checks.
    fn spawn_judge(polls_needed: u32, details: Value) -> (SocketAddr, Arc<AtomicU32>) {
        let polls = Arc::new(AtomicU32::new(0));
        let polls2 = polls.clone();

        let create = warp::post()
            .and(warp::path!("runners" / "create"))
            .and(warp::body::json())
            .map(move |body: Value| {
                assert_eq!(body["api_key"], "guest");
                assert_eq!(body["input"], "2 2");
                let status = if polls_needed == 0 { "completed" } else { "running" };
                warp::reply::json(&json!({ "id": "job-1", "status": status }))
            });
        let status = warp::get()
            .and(warp::path!("runners" / "get_status"))
            .and(warp::query::<HashMap<String, String>>())
            .map(move |q: HashMap<String, String>| {
                assert_eq!(q.get("id").map(String::as_str), Some("job-1"));
                let n = polls2.fetch_add(1, Ordering::SeqCst) + 1;
                let status = if n >= polls_needed { "completed" } else { "running" };
                warp::reply::json(&json!({ "id": "job-1", "status": status }))
            });
        let details = warp::get()
            .and(warp::path!("runners" / "get_details"))
            .map(move || warp::reply::json(&details));

        let (addr, server) =
            warp::serve(create.or(status).or(details)).bind_ephemeral(([127, 0, 0, 1], 0));
        tokio::spawn(server);
        (addr, polls)
    }

    fn client(addr: SocketAddr, max_polls: u32) -> Client {
        Client::builder()
            .base_url(&format!("http://{}/", addr))
            .poll_interval(Duration::from_millis(5))
            .max_polls(max_polls)
            .build()
            .unwrap()
    }

    fn request() -> RunRequest {
        RunRequest {
            source_code: "print(sum(map(int, input().split())))".to_string(),
            language: "python3".to_string(),
            stdin: "2 2".to_string(),
        }
    }

    #[tokio::test]
    async fn polls_until_completed() {
        let (addr, polls) = spawn_judge(
            3,
            json!({
                "id": "job-1", "status": "completed", "build_result": null,
                "stdout": "4\n", "stderr": "", "build_stderr": null, "exit_code": 0,
                "time": "0.02", "memory": 9000, "result": "success"
            }),
        );
        let res = client(addr, 10).submit(&request()).await.unwrap();
        assert_eq!(polls.load(Ordering::SeqCst), 3);
        assert_eq!(res.result, Some(ExecStatus::Success));
        assert_eq!(res.stdout, "4\n");
        assert_eq!(res.time, Some(0.02));
        assert_eq!(res.memory, Some(9000));
    }

    #[tokio::test]
    async fn completed_on_create_skips_polling() {
        let (addr, polls) = spawn_judge(
            0,
            json!({
                "build_result": "failure", "build_stderr": "syntax error",
                "stdout": "", "stderr": "", "result": "failure"
            }),
        );
        let res = client(addr, 10).submit(&request()).await.unwrap();
        assert_eq!(polls.load(Ordering::SeqCst), 0);
        assert_eq!(res.build_result, Some(BuildStatus::Failure));
        assert_eq!(res.build_stderr, "syntax error");
    }

    #[tokio::test]
    async fn gives_up_after_max_polls() {
        let (addr, polls) = spawn_judge(u32::MAX, json!({}));
        let err = client(addr, 2).submit(&request()).await.unwrap_err();
        assert!(matches!(err, SubmitError::Timeout { polls: 2, .. }), "{:?}", err);
        assert_eq!(polls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn http_failure_is_reported() {
        let route = warp::any().map(|| {
            warp::reply::with_status("unavailable", StatusCode::SERVICE_UNAVAILABLE)
        });
        let (addr, server) = warp::serve(route).bind_ephemeral(([127, 0, 0, 1], 0));
        tokio::spawn(server);
        let err = client(addr, 2).submit(&request()).await.unwrap_err();
        assert!(
            matches!(err, SubmitError::Status { status: 503, stage: "create job" }),
            "{:?}",
            err
        );
    }

    /// Fake judge whose jobs are created, but `failing` endpoint answers 500.
    fn spawn_broken_judge(failing: &'static str) -> SocketAddr {
        let create = warp::post().and(warp::path!("runners" / "create")).map(|| {
            warp::reply::json(&json!({ "id": "job-1", "status": "running" }))
        });
        let other = warp::get()
            .and(warp::path("runners"))
            .and(warp::path::param::<String>())
            .map(move |endpoint: String| {
                let status = if endpoint == failing {
                    StatusCode::INTERNAL_SERVER_ERROR
                } else {
                    StatusCode::OK
                };
                warp::reply::with_status(
                    warp::reply::json(&json!({ "id": "job-1", "status": "completed" })),
                    status,
                )
            });
        let (addr, server) =
            warp::serve(create.or(other)).bind_ephemeral(([127, 0, 0, 1], 0));
        tokio::spawn(server);
        addr
    }

    #[tokio::test]
    async fn status_failure_after_create_is_reported() {
        let addr = spawn_broken_judge("get_status");
        let err = client(addr, 5).submit(&request()).await.unwrap_err();
        assert!(
            matches!(err, SubmitError::Status { stage: "get job status", status: 500 }),
            "{:?}",
            err
        );
    }

    #[tokio::test]
    async fn details_failure_is_reported() {
        let addr = spawn_broken_judge("get_details");
        let err = client(addr, 5).submit(&request()).await.unwrap_err();
        assert!(
            matches!(err, SubmitError::Status { stage: "get job details", status: 500 }),
            "{:?}",
            err
        );
    }

    #[tokio::test]
    async fn refused_connection_is_transport_error() {
        let addr = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap()
        };
        let err = client(addr, 2).submit(&request()).await.unwrap_err();
        assert!(
            matches!(err, SubmitError::Transport { stage: "create job", .. }),
            "{:?}",
            err
        );
        assert_eq!(err.to_string(), "failed to create job");
    }

    #[tokio::test]
    async fn judge_error_is_reported() {
        let route = warp::post()
            .map(|| warp::reply::json(&json!({ "error": "Language not supported" })));
        let (addr, server) = warp::serve(route).bind_ephemeral(([127, 0, 0, 1], 0));
        tokio::spawn(server);
        let err = client(addr, 2).submit(&request()).await.unwrap_err();
        assert!(matches!(err, SubmitError::Judge(ref m) if m == "Language not supported"));
    }

    #[tokio::test]
    async fn invalid_requests_are_rejected_locally() {
        // nothing listens there
        let c = client(([127, 0, 0, 1], 9).into(), 1);
        let mut req = request();
        req.source_code = "  \n".to_string();
        assert!(matches!(c.submit(&req).await, Err(SubmitError::EmptySource)));

        let mut req = request();
        req.language = "whitespace".to_string();
        assert!(matches!(
            c.submit(&req).await,
            Err(SubmitError::UnsupportedLanguage(l)) if l == "whitespace"
        ));
    }
}
