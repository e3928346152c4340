//! This library is responsible for fetching problems from the contest site

pub mod ident;
pub mod page;

use ident::{ContestId, TaskId};
use judge_apis::problem::{DisplayLanguage, Problem, ProblemLink};
use std::{future::Future, time::Duration};
use url::Url;

pub const DEFAULT_SITE_URL: &str = "https://atcoder.jp";
/// Pause between two task page fetches of a crawl
pub const DEFAULT_CRAWL_DELAY: Duration = Duration::from_secs(1);

/// Session cookie name used by the site
const SESSION_COOKIE: &str = "REVEL_SESSION";

#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("invalid task or contest id: {0:?}")]
    InvalidIdentifier(String),
    #[error("failed to fetch {url}")]
    Fetch {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("failed to parse page {url}")]
    Parse {
        url: String,
        #[source]
        source: page::MissingElement,
    },
    #[error("no tasks found on {0}")]
    NoTasksFound(String),
}

/// Used in [`new`](Loader::new) constructor
#[derive(Debug, Clone)]
pub struct LoaderConfig {
    /// Site root, e.g. `https://atcoder.jp`
    pub site_url: Url,
    pub crawl_delay: Duration,
}

/// Per-call options
#[derive(Debug, Clone, Default)]
pub struct FetchOptions {
    pub language: DisplayLanguage,
    /// Value of the site's session cookie; anonymous if absent
    pub session_cookie: Option<String>,
}

pub struct Loader {
    site_url: Url,
    crawl_delay: Duration,
    transport: reqwest::Client,
}

impl Loader {
    pub fn new(config: LoaderConfig) -> Loader {
        Loader {
            site_url: config.site_url,
            crawl_delay: config.crawl_delay,
            transport: reqwest::Client::new(),
        }
    }

    /// Fetches a single task, given its id or URL.
    #[tracing::instrument(skip(self, opts), fields(language = ?opts.language))]
    pub async fn fetch_problem(
        &self,
        target: &str,
        opts: &FetchOptions,
    ) -> Result<Problem, LoadError> {
        let id = TaskId::parse(target)
            .ok_or_else(|| LoadError::InvalidIdentifier(target.to_string()))?;
        let url = id
            .url(&self.site_url)
            .map_err(|_| LoadError::InvalidIdentifier(target.to_string()))?;
        self.scrape_task(url, opts).await
    }

    /// Fetches all tasks of a contest, one after another.
    ///
    /// `on_progress` is called with the task index after each task is
    /// fetched. The first failure aborts the crawl.
    #[tracing::instrument(skip(self, opts, on_progress), fields(language = ?opts.language))]
    pub async fn fetch_contest<F>(
        &self,
        target: &str,
        opts: &FetchOptions,
        on_progress: F,
    ) -> Result<Vec<Problem>, LoadError>
    where
        F: FnMut(usize, &Problem),
    {
        let contest = ContestId::parse(target)
            .ok_or_else(|| LoadError::InvalidIdentifier(target.to_string()))?;
        let url = contest
            .tasks_url(&self.site_url)
            .map_err(|_| LoadError::InvalidIdentifier(target.to_string()))?;
        let html = self.fetch_page(&url, opts).await?;
        let links = page::parse_problem_links(&html, &self.site_url);
        if links.is_empty() {
            return Err(LoadError::NoTasksFound(url.to_string()));
        }
        tracing::info!(contest = contest.as_str(), tasks = links.len(), "found tasks");

        let delay = self.crawl_delay;
        crawl(
            &links,
            |link| self.scrape_link(link.url.clone(), opts),
            || tokio::time::sleep(delay),
            on_progress,
        )
        .await
    }

    async fn scrape_link(&self, url: String, opts: &FetchOptions) -> Result<Problem, LoadError> {
        let url = Url::parse(&url).map_err(|_| LoadError::InvalidIdentifier(url.clone()))?;
        self.scrape_task(url, opts).await
    }

    async fn scrape_task(&self, url: Url, opts: &FetchOptions) -> Result<Problem, LoadError> {
        let target = with_query_param(&url, page::select_language(opts.language));
        let html = self.fetch_page(&target, opts).await?;
        let parsed = page::parse_problem(&html, opts.language).map_err(|source| {
            tracing::warn!(url = %target, "unexpected page markup: {}", source);
            LoadError::Parse {
                url: target.to_string(),
                source,
            }
        })?;
        let problem = Problem {
            language: opts.language,
            id: problem_id(&url),
            url: url.to_string(),
            title: parsed.title,
            execute_constraints: parsed.execute_constraints,
            body_html: parsed.body_html,
            samples: parsed.samples,
        };
        tracing::info!(id = %problem.id, samples = problem.samples.len(), "fetched problem");
        Ok(problem)
    }

    async fn fetch_page(&self, url: &Url, opts: &FetchOptions) -> Result<String, LoadError> {
        let fetch_err = |source| LoadError::Fetch {
            url: url.to_string(),
            source,
        };
        let mut req = self.transport.get(url.clone());
        if let Some(cookie) = &opts.session_cookie {
            req = req.header(
                reqwest::header::COOKIE,
                format!("{}={};", SESSION_COOKIE, cookie),
            );
        }
        tracing::debug!(%url, authenticated = opts.session_cookie.is_some(), "fetching page");
        req.send()
            .await
            .and_then(|resp| resp.error_for_status())
            .map_err(fetch_err)?
            .text()
            .await
            .map_err(fetch_err)
    }
}

/// Drives `scrape` over `links` in order, pausing between two fetches.
///
/// For N links `pause` is awaited exactly N-1 times. `on_progress` runs
/// after a problem is appended and before the pause.
async fn crawl<S, SF, P, PF, F>(
    links: &[ProblemLink],
    mut scrape: S,
    mut pause: P,
    mut on_progress: F,
) -> Result<Vec<Problem>, LoadError>
where
    S: FnMut(&ProblemLink) -> SF,
    SF: Future<Output = Result<Problem, LoadError>>,
    P: FnMut() -> PF,
    PF: Future<Output = ()>,
    F: FnMut(usize, &Problem),
{
    let mut problems = Vec::with_capacity(links.len());
    for (index, link) in links.iter().enumerate() {
        tracing::info!(task = %link.id, index, total = links.len(), "fetching task");
        let problem = scrape(link).await?;
        problems.push(problem);
        if let Some(problem) = problems.last() {
            on_progress(index, problem);
        }
        if index + 1 < links.len() {
            pause().await;
        }
    }
    Ok(problems)
}

/// Sets `key=value`, replacing a previous value of `key`.
fn with_query_param(url: &Url, (key, value): (&str, &str)) -> Url {
    let mut target = url.clone();
    let kept: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(k, _)| k != key)
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    target
        .query_pairs_mut()
        .clear()
        .extend_pairs(kept)
        .append_pair(key, value);
    target
}

/// Last path segment of a task URL
fn problem_id(url: &Url) -> String {
    url.path_segments()
        .and_then(|segments| segments.filter(|s| !s.is_empty()).last())
        .unwrap_or_default()
        .to_string()
}
