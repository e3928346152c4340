use judge_apis::{live::Verdict, run::RunResult};

/// Judges `result` against `expected_output`.
///
/// Returns `None` when there is nothing to compare with (no expected output,
/// or one made only of whitespace). Execution outcome is checked before the
/// build outcome: a failed build with a successful run is judged by output.
pub fn classify(result: &RunResult, expected_output: Option<&str>) -> Option<Verdict> {
    let expected = expected_output?.trim();
    if expected.is_empty() {
        return None;
    }
    let verdict = if result.succeeded() {
        if result.stdout.trim() == expected {
            Verdict::AC
        } else {
            Verdict::WA
        }
    } else if result.build_failed() {
        Verdict::CE
    } else {
        Verdict::RE
    };
    Some(verdict)
}

#[cfg(test)]
mod tests {
    use super::*;
    use judge_apis::run::{BuildStatus, ExecStatus};

    fn result(exec: Option<ExecStatus>, build: Option<BuildStatus>, stdout: &str) -> RunResult {
        RunResult {
            result: exec,
            build_result: build,
            stdout: stdout.to_string(),
            stderr: String::new(),
            exit_code: None,
            build_stdout: String::new(),
            build_stderr: String::new(),
            build_exit_code: None,
            time: None,
            memory: None,
        }
    }

    #[test]
    fn trailing_newline_is_ignored() {
        let res = result(Some(ExecStatus::Success), None, "4\n");
        assert_eq!(classify(&res, Some("4")), Some(Verdict::AC));
        assert_eq!(classify(&res, Some("  4\n\n")), Some(Verdict::AC));
    }

    #[test]
    fn different_output_is_wrong_answer() {
        let res = result(Some(ExecStatus::Success), Some(BuildStatus::Success), "5");
        assert_eq!(classify(&res, Some("4")), Some(Verdict::WA));
    }

    #[test]
    fn no_expectation_no_verdict() {
        let res = result(Some(ExecStatus::Success), None, "4");
        assert_eq!(classify(&res, None), None);
        assert_eq!(classify(&res, Some("")), None);
        assert_eq!(classify(&res, Some(" \n\t")), None);
    }

    #[test]
    fn compile_error_beats_runtime_error() {
        let res = result(Some(ExecStatus::Failure), Some(BuildStatus::Failure), "4");
        assert_eq!(classify(&res, Some("4")), Some(Verdict::CE));
        let res = result(None, Some(BuildStatus::Failure), "");
        assert_eq!(classify(&res, Some("4")), Some(Verdict::CE));
    }

    #[test]
    fn execution_outcome_checked_first() {
        let res = result(Some(ExecStatus::Success), Some(BuildStatus::Failure), "4");
        assert_eq!(classify(&res, Some("4")), Some(Verdict::AC));
    }

    #[test]
    fn other_failures_are_runtime_errors() {
        for exec in [
            Some(ExecStatus::Failure),
            Some(ExecStatus::Timeout),
            Some(ExecStatus::Unknown),
            None,
        ] {
            let res = result(exec, Some(BuildStatus::Success), "4");
            assert_eq!(classify(&res, Some("4")), Some(Verdict::RE), "{:?}", exec);
        }
    }
}
