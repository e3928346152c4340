//! Sample judge REST api

use anyhow::Context;
use futures::future::FutureExt;
use judge_apis::{
    languages,
    live::{CaseStatus, RunEvent, TestCaseOutcome},
    problem::Problem,
    rest::{CrawlView, ErrorBody, JobRequest, JobView, ProblemRequest},
    run::{RunRequest, RunResult},
};
use judge_client::SubmitError;
use problem_loader::{ident::ContestId, FetchOptions, LoadError, Loader};
use processor::{Executor, ProcessError};
use std::{collections::HashMap, convert::Infallible, sync::Arc};
use tokio::sync::{mpsc, Mutex, RwLock};
use uuid::Uuid;
use warp::{http::StatusCode, Filter, Rejection, Reply};

pub struct RestConfig {
    pub port: u16,
}

/// Error reported to the API client as `ErrorBody`
#[derive(Debug, thiserror::Error)]
#[error("{message}")]
struct ApiError {
    status: StatusCode,
    kind: &'static str,
    message: String,
}

impl warp::reject::Reject for ApiError {}

impl ApiError {
    fn new(status: StatusCode, kind: &'static str, message: impl Into<String>) -> Self {
        ApiError {
            status,
            kind,
            message: message.into(),
        }
    }

    fn bad_request(kind: &'static str, message: impl Into<String>) -> Self {
        ApiError::new(StatusCode::BAD_REQUEST, kind, message)
    }

    fn not_found(kind: &'static str) -> Self {
        ApiError::new(StatusCode::NOT_FOUND, kind, "requested object does not exist")
    }

    /// Failure of the remote judge or of the executor in general.
    fn execution(err: anyhow::Error) -> Self {
        let (status, kind) = match err.downcast_ref::<SubmitError>() {
            Some(SubmitError::EmptySource) => (StatusCode::BAD_REQUEST, "EmptySource"),
            Some(SubmitError::UnsupportedLanguage(_)) => {
                (StatusCode::BAD_REQUEST, "UnsupportedLanguage")
            }
            Some(SubmitError::Timeout { .. }) => (StatusCode::BAD_GATEWAY, "Timeout"),
            _ => (StatusCode::BAD_GATEWAY, "JudgeError"),
        };
        ApiError::new(status, kind, format!("{:#}", err))
    }
}

impl From<LoadError> for ApiError {
    fn from(err: LoadError) -> Self {
        let (status, kind) = match &err {
            LoadError::InvalidIdentifier(_) => (StatusCode::BAD_REQUEST, "InvalidIdentifier"),
            LoadError::NoTasksFound(_) => (StatusCode::NOT_FOUND, "NoTasksFound"),
            LoadError::Fetch { .. } => (StatusCode::BAD_GATEWAY, "FetchError"),
            LoadError::Parse { .. } => (StatusCode::BAD_GATEWAY, "ParseError"),
        };
        ApiError::new(status, kind, format!("{:#}", anyhow::Error::new(err)))
    }
}

impl From<ProcessError> for ApiError {
    fn from(err: ProcessError) -> Self {
        match err {
            ProcessError::EmptySource => ApiError::bad_request("EmptySource", err.to_string()),
            ProcessError::Aborted => {
                ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, "Aborted", err.to_string())
            }
        }
    }
}

async fn recover(rejection: Rejection) -> Result<impl Reply, Infallible> {
    let (status, body) = if let Some(err) = rejection.find::<ApiError>() {
        (
            err.status,
            ErrorBody {
                error: err.kind.to_string(),
                message: err.message.clone(),
            },
        )
    } else if rejection.is_not_found() {
        (
            StatusCode::NOT_FOUND,
            ErrorBody {
                error: "NotFound".to_string(),
                message: "no such route".to_string(),
            },
        )
    } else if let Some(err) = rejection.find::<warp::filters::body::BodyDeserializeError>() {
        (
            StatusCode::BAD_REQUEST,
            ErrorBody {
                error: "BadRequest".to_string(),
                message: err.to_string(),
            },
        )
    } else if rejection.find::<warp::reject::MethodNotAllowed>().is_some() {
        (
            StatusCode::METHOD_NOT_ALLOWED,
            ErrorBody {
                error: "MethodNotAllowed".to_string(),
                message: "method not allowed".to_string(),
            },
        )
    } else {
        tracing::error!(?rejection, "unhandled rejection");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            ErrorBody {
                error: "Internal".to_string(),
                message: "internal error".to_string(),
            },
        )
    };
    Ok(warp::reply::with_status(warp::reply::json(&body), status))
}

/// Contains information about single multi-case job
struct RunJob {
    id: Uuid,
    loading: bool,
    statuses: Vec<CaseStatus>,
    outcomes: Vec<Option<TestCaseOutcome>>,
    results: Option<Vec<TestCaseOutcome>>,
    error: Option<String>,
}

impl RunJob {
    fn as_rest(&self) -> JobView {
        JobView {
            id: self.id,
            loading: self.loading,
            statuses: self.statuses.clone(),
            outcomes: self.outcomes.clone(),
            results: self.results.clone(),
            error: self.error.clone(),
        }
    }

    fn apply(&mut self, event: RunEvent) {
        match event {
            RunEvent::Loading { loading } => self.loading = loading,
            RunEvent::Running { index } => {
                if let Some(status) = self.statuses.get_mut(index) {
                    *status = CaseStatus::Running;
                }
            }
            RunEvent::Completed { outcome } => {
                let index = outcome.index;
                if let Some(status) = self.statuses.get_mut(index) {
                    *status = outcome.status;
                }
                if let Some(slot) = self.outcomes.get_mut(index) {
                    *slot = Some(outcome);
                }
            }
            RunEvent::Aggregate { results } => self.results = Some(results),
        }
    }
}

/// Contains information about single contest crawl
struct Crawl {
    id: Uuid,
    completed: bool,
    problems: Vec<Problem>,
    error: Option<String>,
}

impl Crawl {
    fn as_rest(&self) -> CrawlView {
        CrawlView {
            id: self.id,
            completed: self.completed,
            problems: self.problems.clone(),
            error: self.error.clone(),
        }
    }
}

/// Jobs and crawls are kept for the lifetime of the process.
struct State {
    jobs: RwLock<HashMap<Uuid, Arc<Mutex<RunJob>>>>,
    crawls: RwLock<HashMap<Uuid, Arc<Mutex<Crawl>>>>,
    executor: Arc<dyn Executor>,
    loader: Arc<Loader>,
    /// Default fetch options, a request may override the language
    fetch: FetchOptions,
}

impl State {
    fn fetch_options(&self, req: &ProblemRequest) -> FetchOptions {
        let mut opts = self.fetch.clone();
        if let Some(lang) = req.language {
            opts.language = lang;
        }
        opts
    }
}

fn check_language(language: &str) -> Result<(), ApiError> {
    if languages::is_supported(language) {
        Ok(())
    } else {
        Err(ApiError::bad_request(
            "UnsupportedLanguage",
            format!("language {:?} is not supported by the judge", language),
        ))
    }
}

async fn detect_language(editor_id: String) -> Result<languages::Language, ApiError> {
    languages::detect_language(&editor_id)
        .and_then(languages::find)
        .copied()
        .ok_or_else(|| ApiError::not_found("UnknownLanguage"))
}

async fn run_once(state: Arc<State>, req: RunRequest) -> Result<RunResult, ApiError> {
    if req.source_code.trim().is_empty() {
        return Err(ApiError::bad_request("EmptySource", "source code is empty"));
    }
    check_language(&req.language)?;
    state.executor.execute(&req).await.map_err(ApiError::execution)
}

async fn start_job(state: Arc<State>, req: JobRequest) -> Result<JobView, ApiError> {
    let source_code = String::from_utf8(req.source.0)
        .map_err(|_| ApiError::bad_request("BadRequest", "source is not valid UTF-8"))?;
    check_language(&req.language)?;
    let case_count = req.cases.len();
    let proc_request = processor::Request {
        source_code,
        language: req.language,
        cases: req
            .cases
            .into_iter()
            .map(|c| processor::Case {
                input: c.input,
                expected_output: c.expected_output,
            })
            .collect(),
    };
    let mut progress = processor::run_all(proc_request, state.executor.clone())?;

    let job_id = Uuid::new_v4();
    let job = RunJob {
        id: job_id,
        loading: true,
        statuses: vec![CaseStatus::Pending; case_count],
        outcomes: vec![None; case_count],
        results: None,
        error: None,
    };
    let resp = job.as_rest();

    let job = Arc::new(Mutex::new(job));
    state.jobs.write().await.insert(job_id, job.clone());
    tracing::info!(%job_id, cases = case_count, "job started");
    tokio::task::spawn(async move {
        while let Some(ev) = progress.event().await {
            job.lock().await.apply(ev);
        }
        tracing::info!(%job_id, "event stream finished, retrieving outcome");
        let outcome = progress.wait().await;

        let mut job = job.lock().await;
        job.loading = false;
        match outcome {
            Ok(results) => job.results = Some(results),
            Err(err) => {
                tracing::warn!(%job_id, "job failed: {:#}", err);
                job.error = Some(err.to_string());
            }
        }
    });

    Ok(resp)
}

async fn get_job(state: Arc<State>, id: Uuid) -> Result<JobView, ApiError> {
    let job = match state.jobs.read().await.get(&id) {
        Some(job) => job.clone(),
        None => return Err(ApiError::not_found("JobNotFound")),
    };
    let job = job.lock().await;
    Ok(job.as_rest())
}

async fn fetch_problem(state: Arc<State>, req: ProblemRequest) -> Result<Problem, ApiError> {
    let opts = state.fetch_options(&req);
    Ok(state.loader.fetch_problem(&req.target, &opts).await?)
}

async fn start_crawl(state: Arc<State>, req: ProblemRequest) -> Result<CrawlView, ApiError> {
    if ContestId::parse(&req.target).is_none() {
        return Err(LoadError::InvalidIdentifier(req.target).into());
    }
    let opts = state.fetch_options(&req);
    let crawl_id = Uuid::new_v4();
    let crawl = Crawl {
        id: crawl_id,
        completed: false,
        problems: Vec::new(),
        error: None,
    };
    let resp = crawl.as_rest();

    let crawl = Arc::new(Mutex::new(crawl));
    state.crawls.write().await.insert(crawl_id, crawl.clone());
    let loader = state.loader.clone();
    tracing::info!(%crawl_id, target = %req.target, "crawl started");
    tokio::task::spawn(async move {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let fetch = async {
            let res = loader
                .fetch_contest(&req.target, &opts, |_, problem| {
                    tx.send(problem.clone()).ok();
                })
                .await;
            drop(tx);
            res
        };
        let record = async {
            while let Some(problem) = rx.recv().await {
                crawl.lock().await.problems.push(problem);
            }
        };
        let (res, ()) = tokio::join!(fetch, record);

        let mut crawl = crawl.lock().await;
        crawl.completed = true;
        if let Err(err) = res {
            let err = ApiError::from(err);
            tracing::warn!(%crawl_id, "crawl failed: {}", err);
            crawl.error = Some(err.message);
        }
    });

    Ok(resp)
}

async fn get_crawl(state: Arc<State>, id: Uuid) -> Result<CrawlView, ApiError> {
    let crawl = match state.crawls.read().await.get(&id) {
        Some(crawl) => crawl.clone(),
        None => return Err(ApiError::not_found("CrawlNotFound")),
    };
    let crawl = crawl.lock().await;
    Ok(crawl.as_rest())
}

fn with_state(
    state: Arc<State>,
) -> impl Filter<Extract = (Arc<State>,), Error = Infallible> + Clone {
    warp::any().map(move || state.clone())
}

fn json_reply<T: serde::Serialize>(
    res: Result<T, ApiError>,
) -> Result<warp::reply::Json, Rejection> {
    res.map(|resp| warp::reply::json(&resp))
        .map_err(warp::reject::custom)
}

fn routes(state: Arc<State>) -> impl Filter<Extract = (impl Reply,), Error = Infallible> + Clone {
    let route_languages = warp::path!("languages")
        .and(warp::get())
        .map(|| warp::reply::json(&languages::SUPPORTED_LANGUAGES))
        .boxed();

    let route_detect = warp::path!("languages" / "detect" / String)
        .and(warp::get())
        .and_then(|editor_id| detect_language(editor_id).map(json_reply))
        .boxed();

    let route_run = warp::path!("runs")
        .and(warp::post())
        .and(with_state(state.clone()))
        .and(warp::body::json())
        .and_then(|state, req| run_once(state, req).map(json_reply))
        .boxed();

    let route_create_job = warp::path!("jobs")
        .and(warp::post())
        .and(with_state(state.clone()))
        .and(warp::body::json())
        .and_then(|state, req| start_job(state, req).map(json_reply))
        .boxed();

    let route_get_job = warp::path!("jobs" / Uuid)
        .and(warp::get())
        .and(with_state(state.clone()))
        .and_then(|id, state| get_job(state, id).map(json_reply))
        .boxed();

    let route_problem = warp::path!("problems")
        .and(warp::post())
        .and(with_state(state.clone()))
        .and(warp::body::json())
        .and_then(|state, req| fetch_problem(state, req).map(json_reply))
        .boxed();

    let route_create_crawl = warp::path!("contests")
        .and(warp::post())
        .and(with_state(state.clone()))
        .and(warp::body::json())
        .and_then(|state, req| start_crawl(state, req).map(json_reply))
        .boxed();

    let route_get_crawl = warp::path!("contests" / Uuid)
        .and(warp::get())
        .and(with_state(state))
        .and_then(|id, state| get_crawl(state, id).map(json_reply))
        .boxed();

    route_languages
        .or(route_detect)
        .or(route_run)
        .or(route_create_job)
        .or(route_get_job)
        .or(route_problem)
        .or(route_create_crawl)
        .or(route_get_crawl)
        .recover(recover)
}

/// Serves api
#[tracing::instrument(skip(cfg, executor, loader, fetch), fields(port = cfg.port))]
pub async fn serve(
    cfg: RestConfig,
    executor: Arc<dyn Executor>,
    loader: Arc<Loader>,
    fetch: FetchOptions,
) -> anyhow::Result<()> {
    let state = Arc::new(State {
        jobs: RwLock::new(HashMap::new()),
        crawls: RwLock::new(HashMap::new()),
        executor,
        loader,
        fetch,
    });

    let server = warp::serve(routes(state).with(warp::filters::trace::request()));

    let srv = server
        .try_bind_with_graceful_shutdown(([0, 0, 0, 0], cfg.port), futures::future::pending())
        .context("failed to bind")?
        .1;
    srv.await;
    Ok(())
}
