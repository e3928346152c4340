use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::Context;
use clap::{Parser, Subcommand};
use judge_apis::{
    languages,
    live::{CaseStatus, TestCaseOutcome},
    problem::{DisplayLanguage, Problem},
    rest::{ByteString, CaseSpec, CrawlView, ErrorBody, JobRequest, JobView, ProblemRequest},
    run::{RunRequest, RunResult},
};
use serde::{de::DeserializeOwned, Serialize};

/// Command-line sample judge client
#[derive(Parser)]
struct Args {
    /// Sample judge API endpoint
    #[arg(long, short = 'a', env = "SAMPLE_JUDGE_API", default_value = "http://localhost:1789")]
    api: String,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Lists languages supported by the judge
    Languages,
    /// Runs a program once and prints its output
    Run {
        /// Path to the source file
        source: PathBuf,
        /// Judge language id; guessed from the file extension if omitted
        #[arg(long, short = 'l')]
        language: Option<String>,
        /// File to use as stdin
        #[arg(long, short = 'i')]
        input: Option<PathBuf>,
    },
    /// Runs a program against test cases and prints verdicts
    Test {
        /// Path to the source file
        source: PathBuf,
        /// Judge language id; guessed from the file extension if omitted
        #[arg(long, short = 'l')]
        language: Option<String>,
        /// Task id or URL whose samples should be used
        #[arg(long, short = 't', conflicts_with = "case")]
        task: Option<String>,
        /// Input file, optionally followed by `:` and expected output file
        #[arg(long, short = 'c', value_name = "IN[:OUT]")]
        case: Vec<String>,
    },
    /// Fetches a problem and prints its samples
    Problem {
        /// Task id or URL
        target: String,
        #[arg(long)]
        statement_language: Option<DisplayLanguage>,
    },
    /// Fetches all problems of a contest
    Contest {
        /// Contest id or URL
        target: String,
        #[arg(long)]
        statement_language: Option<DisplayLanguage>,
    },
}

struct Api {
    base: String,
    client: reqwest::Client,
}

impl Api {
    async fn read<T: DeserializeOwned>(&self, req: reqwest::RequestBuilder) -> anyhow::Result<T> {
        let resp = req.send().await.context("failed to send request")?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            match serde_json::from_str::<ErrorBody>(&body) {
                Ok(err) => anyhow::bail!("{} ({}): {}", err.error, status, err.message),
                Err(_) => anyhow::bail!("request failed with HTTP {}: {}", status, body),
            }
        }
        resp.json().await.context("failed to parse response")
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> anyhow::Result<T> {
        self.read(self.client.get(format!("{}/{}", self.base, path)))
            .await
    }

    async fn post<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> anyhow::Result<T> {
        self.read(self.client.post(format!("{}/{}", self.base, path)).json(body))
            .await
    }
}

/// Picks a judge language for `source`, unless given explicitly.
fn resolve_language(source: &Path, explicit: Option<String>) -> anyhow::Result<String> {
    if let Some(lang) = explicit {
        return Ok(lang);
    }
    source
        .extension()
        .and_then(|ext| ext.to_str())
        .and_then(languages::editor_language_for_extension)
        .and_then(languages::detect_language)
        .map(str::to_string)
        .with_context(|| {
            format!(
                "cannot guess language of {}, use --language",
                source.display()
            )
        })
}

async fn read_text(path: &Path) -> anyhow::Result<String> {
    tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("failed to read {}", path.display()))
}

/// Parses `IN[:OUT]`.
fn parse_case_arg(arg: &str) -> (PathBuf, Option<PathBuf>) {
    match arg.split_once(':') {
        Some((input, output)) if !output.is_empty() => {
            (PathBuf::from(input), Some(PathBuf::from(output)))
        }
        Some((input, _)) => (PathBuf::from(input), None),
        None => (PathBuf::from(arg), None),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let api = Api {
        base: args.api.trim_end_matches('/').to_string(),
        client: reqwest::Client::new(),
    };
    match args.command {
        Command::Languages => {
            let langs: Vec<serde_json::Value> = api.get("languages").await?;
            for lang in langs {
                println!(
                    "{:<14} {}",
                    lang["id"].as_str().unwrap_or_default(),
                    lang["label"].as_str().unwrap_or_default()
                );
            }
        }
        Command::Run {
            source,
            language,
            input,
        } => {
            let language = resolve_language(&source, language)?;
            let stdin = match &input {
                Some(path) => read_text(path).await?,
                None => String::new(),
            };
            let req = RunRequest {
                source_code: read_text(&source).await?,
                language,
                stdin,
            };
            let res: RunResult = api.post("runs", &req).await?;
            print_run(&res);
        }
        Command::Test {
            source,
            language,
            task,
            case,
        } => {
            let language = resolve_language(&source, language)?;
            let cases = match task {
                Some(target) => {
                    let req = ProblemRequest {
                        target,
                        language: None,
                    };
                    let problem: Problem = api.post("problems", &req).await?;
                    println!("{} ({} samples)", problem.title, problem.samples.len());
                    problem
                        .samples
                        .into_iter()
                        .map(|s| CaseSpec {
                            input: s.input,
                            expected_output: Some(s.output),
                        })
                        .collect()
                }
                None => {
                    let mut cases = Vec::new();
                    for arg in &case {
                        let (input, output) = parse_case_arg(arg);
                        let expected_output = match &output {
                            Some(path) => Some(read_text(path).await?),
                            None => None,
                        };
                        cases.push(CaseSpec {
                            input: read_text(&input).await?,
                            expected_output,
                        });
                    }
                    cases
                }
            };
            if cases.is_empty() {
                anyhow::bail!("no test cases, use --task or --case");
            }
            let source = tokio::fs::read(&source)
                .await
                .context("failed to read run source")?;
            let req = JobRequest {
                source: ByteString(source),
                language,
                cases,
            };
            let job: JobView = api.post("jobs", &req).await?;
            println!("Submitted, job id: {}", job.id);
            let mut printer = ProgressPrinter::new(job.statuses.len());
            loop {
                tokio::time::sleep(Duration::from_millis(500)).await;
                let job: JobView = api.get(&format!("jobs/{}", job.id)).await?;
                printer.add(&job.statuses);
                if let Some(msg) = job.error {
                    anyhow::bail!("job was not successful: {}", msg);
                }
                if !job.loading {
                    if let Some(results) = job.results {
                        print_verdicts(&results);
                        break;
                    }
                }
            }
        }
        Command::Problem {
            target,
            statement_language,
        } => {
            let req = ProblemRequest {
                target,
                language: statement_language,
            };
            let problem: Problem = api.post("problems", &req).await?;
            print_problem(&problem);
        }
        Command::Contest {
            target,
            statement_language,
        } => {
            let req = ProblemRequest {
                target,
                language: statement_language,
            };
            let crawl: CrawlView = api.post("contests", &req).await?;
            println!("Crawling, id: {}", crawl.id);
            let mut seen = 0;
            loop {
                tokio::time::sleep(Duration::from_secs(1)).await;
                let crawl: CrawlView = api.get(&format!("contests/{}", crawl.id)).await?;
                for problem in &crawl.problems[seen..] {
                    println!("Fetched {} - {}", problem.id, problem.title);
                }
                seen = crawl.problems.len();
                if crawl.completed {
                    if let Some(msg) = crawl.error {
                        anyhow::bail!("crawl was not successful: {}", msg);
                    }
                    println!("Completed, {} problems", seen);
                    break;
                }
            }
        }
    }
    Ok(())
}

fn print_run(res: &RunResult) {
    if res.build_failed() {
        println!("Compilation failed:");
        print!("{}", res.build_stderr);
        return;
    }
    print!("{}", res.stdout);
    if !res.stderr.is_empty() {
        eprint!("{}", res.stderr);
    }
    println!(
        "--- result: {:?}, exit code: {}, time: {}, memory: {}",
        res.result,
        res.exit_code.map_or("-".to_string(), |c| c.to_string()),
        res.time.map_or("-".to_string(), |t| format!("{:.3}s", t)),
        res.memory.map_or("-".to_string(), |m| format!("{}KB", m / 1024)),
    );
}

fn print_problem(problem: &Problem) {
    println!("{}", problem.title);
    println!("{}", problem.url);
    println!("{}", problem.execute_constraints);
    for (i, sample) in problem.samples.iter().enumerate() {
        println!("--- sample {} input\n{}", i + 1, sample.input);
        println!("--- sample {} output\n{}", i + 1, sample.output);
    }
}

fn print_verdicts(results: &[TestCaseOutcome]) {
    println!("{:>4}  {:<7}  {:>8}  detail", "case", "verdict", "time");
    for outcome in results {
        let verdict = match (outcome.status, outcome.verdict) {
            (CaseStatus::Error, _) => "ERROR".to_string(),
            (_, Some(v)) => v.to_string(),
            (_, None) => "-".to_string(),
        };
        let time = outcome
            .result
            .as_ref()
            .and_then(|r| r.time)
            .map_or("-".to_string(), |t| format!("{:.3}s", t));
        let detail = match (&outcome.error, &outcome.result) {
            (Some(err), _) => err.clone(),
            (None, Some(res)) if outcome.verdict.is_none() => res.stdout.trim().to_string(),
            _ => String::new(),
        };
        println!("{:>4}  {:<7}  {:>8}  {}", outcome.index + 1, verdict, time, detail);
    }
}

struct ProgressPrinter {
    last: Vec<CaseStatus>,
}

impl ProgressPrinter {
    fn new(cases: usize) -> Self {
        ProgressPrinter {
            last: vec![CaseStatus::Pending; cases],
        }
    }

    fn add(&mut self, statuses: &[CaseStatus]) {
        for (i, status) in statuses.iter().enumerate() {
            if self.last.get(i) == Some(status) {
                continue;
            }
            match status {
                CaseStatus::Running => println!("Running case {}", i + 1),
                CaseStatus::Completed => println!("Case {} completed", i + 1),
                CaseStatus::Error => println!("Case {} failed", i + 1),
                CaseStatus::Pending => {}
            }
        }
        self.last = statuses.to_vec();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn case_arguments() {
        assert_eq!(
            parse_case_arg("in1.txt:out1.txt"),
            (PathBuf::from("in1.txt"), Some(PathBuf::from("out1.txt")))
        );
        assert_eq!(parse_case_arg("in1.txt"), (PathBuf::from("in1.txt"), None));
        assert_eq!(parse_case_arg("in1.txt:"), (PathBuf::from("in1.txt"), None));
    }

    #[test]
    fn language_from_extension() {
        assert_eq!(resolve_language(Path::new("a.py"), None).unwrap(), "python3");
        assert_eq!(resolve_language(Path::new("main.rs"), None).unwrap(), "rust");
        assert_eq!(
            resolve_language(Path::new("a.py"), Some("python".to_string())).unwrap(),
            "python"
        );
        assert!(resolve_language(Path::new("notes"), None).is_err());
    }
}
