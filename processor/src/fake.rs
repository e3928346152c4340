//! Pure implementation that returns valid, but fake data

use crate::Executor;
use judge_apis::{
    languages,
    run::{BuildStatus, ExecStatus, RunRequest, RunResult},
};
use rand::{distributions::Uniform, Rng, SeedableRng};
use rand_chacha::ChaChaRng;
use std::{
    hash::{Hash, Hasher},
    time::Duration,
};

#[derive(Clone, Debug, Default)]
pub struct FakeSettings {
    /// Upper bound of the simulated judging latency
    pub max_latency: Duration,
}

/// Executor that never leaves the process: every program echoes its stdin.
///
/// Time, memory and latency are random, but stable for a given request.
#[derive(Clone, Debug, Default)]
pub struct FakeExecutor {
    settings: FakeSettings,
}

impl FakeExecutor {
    pub fn new(settings: FakeSettings) -> FakeExecutor {
        FakeExecutor { settings }
    }
}

fn stable_hash<T: Hash + ?Sized>(val: &T) -> u64 {
    let mut h = std::collections::hash_map::DefaultHasher::new();
    val.hash(&mut h);
    h.finish()
}

fn generate_result(req: &RunRequest, rng: &mut ChaChaRng) -> RunResult {
    RunResult {
        result: Some(ExecStatus::Success),
        build_result: Some(BuildStatus::Success),
        stdout: req.stdin.clone(),
        stderr: String::new(),
        exit_code: Some(0),
        build_stdout: String::new(),
        build_stderr: String::new(),
        build_exit_code: Some(0),
        time: Some(f64::from(rng.sample(Uniform::new(0_u32, 100))) / 1000.0),
        memory: Some(rng.sample(Uniform::new(1_000_000, 100_000_000))),
    }
}

#[async_trait::async_trait]
impl Executor for FakeExecutor {
    async fn execute(&self, req: &RunRequest) -> anyhow::Result<RunResult> {
        if !languages::is_supported(&req.language) {
            anyhow::bail!("language {:?} is not supported by the judge", req.language);
        }
        let seed = stable_hash(&(&req.language, &req.source_code, &req.stdin));
        let mut rng = ChaChaRng::seed_from_u64(seed);
        let max_latency = self.settings.max_latency.as_millis() as u64;
        if max_latency > 0 {
            let latency = rng.sample(Uniform::new(0, max_latency));
            tracing::debug!(seed, latency, "simulating judge latency");
            tokio::time::sleep(Duration::from_millis(latency)).await;
        }
        Ok(generate_result(req, &mut rng))
    }
}
