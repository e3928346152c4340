mod rest;

use anyhow::Context;
use clap::Parser;
use judge_apis::problem::DisplayLanguage;
use problem_loader::{FetchOptions, Loader, LoaderConfig};
use std::{sync::Arc, time::Duration};

#[derive(Parser)]
struct Args {
    /// Port that service should listen
    #[arg(long, env = "PORT", default_value_t = 1789)]
    port: u16,
    /// Root of the judge API
    #[arg(long, env = "JUDGE_URL", default_value = judge_client::DEFAULT_BASE_URL)]
    judge_url: String,
    #[arg(long, env = "JUDGE_API_KEY", default_value = judge_client::DEFAULT_API_KEY)]
    judge_api_key: String,
    /// Delay between two job status checks, in milliseconds
    #[arg(long, default_value_t = 1000)]
    poll_interval_ms: u64,
    /// Number of status checks after which a job is abandoned
    #[arg(long, default_value_t = 60)]
    max_polls: u32,
    /// Root of the contest site
    #[arg(long, env = "SITE_URL", default_value = problem_loader::DEFAULT_SITE_URL)]
    site_url: url::Url,
    /// Default language of problem statements (english or japanese)
    #[arg(long, default_value = "english")]
    language: DisplayLanguage,
    /// Session cookie of the contest site; problems are fetched anonymously without it
    #[arg(long, env = "SESSION_COOKIE", hide_env_values = true)]
    session_cookie: Option<String>,
    /// Pause between two task fetches of a contest crawl, in milliseconds
    #[arg(long, default_value_t = 1000)]
    crawl_delay_ms: u64,
    /// Do not contact the judge; programs echo their input instead
    #[arg(long)]
    fake_judge: bool,
}

fn create_executor(args: &Args) -> anyhow::Result<Arc<dyn processor::Executor>> {
    if args.fake_judge {
        tracing::warn!("using fake judge");
        let settings = processor::fake::FakeSettings {
            max_latency: Duration::from_millis(500),
        };
        return Ok(Arc::new(processor::fake::FakeExecutor::new(settings)));
    }
    let client = judge_client::Client::builder()
        .base_url(&args.judge_url)
        .api_key(&args.judge_api_key)
        .poll_interval(Duration::from_millis(args.poll_interval_ms))
        .max_polls(args.max_polls)
        .build()
        .context("failed to initialize judge client")?;
    Ok(Arc::new(client))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();
    let args = Args::parse();
    let executor = create_executor(&args)?;
    let loader = Loader::new(LoaderConfig {
        site_url: args.site_url.clone(),
        crawl_delay: Duration::from_millis(args.crawl_delay_ms),
    });
    let fetch = FetchOptions {
        language: args.language,
        session_cookie: args.session_cookie.clone(),
    };
    tracing::info!(
        port = args.port,
        site = %args.site_url,
        authenticated = fetch.session_cookie.is_some(),
        "Running REST API"
    );
    let cfg = rest::RestConfig { port: args.port };
    rest::serve(cfg, executor, Arc::new(loader), fetch).await?;
    Ok(())
}
