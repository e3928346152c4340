//! Normalization of user-supplied task and contest identifiers.
//!
//! Accepted inputs are bare ids (`abc123_a`, `abc123`) and site URLs
//! (`https://atcoder.jp/contests/abc123/tasks/abc123_a?lang=ja`).
use url::Url;

/// Canonical task identifier
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskId {
    task: String,
    /// As written in site paths, i.e. with hyphens
    contest: String,
}

impl TaskId {
    /// Returns `None` if no task id can be found in `input`.
    pub fn parse(input: &str) -> Option<TaskId> {
        let input = input.trim().to_ascii_lowercase();
        let path = strip_query(&input);
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

        let task = match segment_after(&segments, "tasks") {
            Some(seg) => trailing_id(seg)?,
            None => trailing_id(path)?,
        };
        let contest = match segment_after(&segments, "contests") {
            Some(seg) => contest_segment(seg)?.to_string(),
            None => derive_contest(task),
        };
        Some(TaskId {
            task: task.to_string(),
            contest,
        })
    }

    pub fn task(&self) -> &str {
        &self.task
    }

    pub fn contest(&self) -> &str {
        &self.contest
    }

    /// Task page under `site`
    pub fn url(&self, site: &Url) -> Result<Url, url::ParseError> {
        site.join(&format!("contests/{}/tasks/{}", self.contest, self.task))
    }
}

/// Canonical contest identifier
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContestId(String);

impl ContestId {
    pub fn parse(input: &str) -> Option<ContestId> {
        let input = input.trim().to_ascii_lowercase();
        let path = strip_query(&input);
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

        let contest = match segment_after(&segments, "contests") {
            Some(seg) => contest_segment(seg)?.to_string(),
            // site paths spell contest ids with hyphens: tenka1_2019 -> tenka1-2019
            None => trailing_id(path)?.replace('_', "-"),
        };
        Some(ContestId(contest))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Task list page under `site`
    pub fn tasks_url(&self, site: &Url) -> Result<Url, url::ParseError> {
        site.join(&format!("contests/{}/tasks", self.0))
    }
}

fn strip_query(input: &str) -> &str {
    input.split(['?', '#']).next().unwrap_or_default()
}

fn segment_after<'a>(segments: &[&'a str], marker: &str) -> Option<&'a str> {
    let pos = segments.iter().position(|s| *s == marker)?;
    segments.get(pos + 1).copied()
}

fn contest_segment(seg: &str) -> Option<&str> {
    let valid = !seg.is_empty()
        && seg
            .bytes()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'_' || b == b'-');
    valid.then_some(seg)
}

/// Longest suffix of `s` of the form `[a-z0-9]+(_[a-z0-9]+)*`.
fn trailing_id(s: &str) -> Option<&str> {
    let start = s
        .bytes()
        .rposition(|b| !(b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'_'))
        .map_or(0, |pos| pos + 1);
    let mut id = &s[start..];
    if id.ends_with('_') {
        return None;
    }
    if let Some(pos) = id.rfind("__") {
        id = &id[pos + 2..];
    }
    let id = id.trim_start_matches('_');
    (!id.is_empty()).then_some(id)
}

/// `abc123_a` belongs to `abc123`, `tenka1_2019_a` to `tenka1-2019`.
fn derive_contest(task: &str) -> String {
    let prefix = task.rsplit_once('_').map_or(task, |(prefix, _)| prefix);
    prefix.replace('_', "-")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn task_url() {
        let id = TaskId::parse("https://site/contests/abc123/tasks/abc123_a").unwrap();
        assert_eq!(id.task(), "abc123_a");
        assert_eq!(id.contest(), "abc123");
    }

    #[test]
    fn bare_task_ids() {
        let id = TaskId::parse("abc123_a").unwrap();
        assert_eq!((id.task(), id.contest()), ("abc123_a", "abc123"));

        let id = TaskId::parse(" tenka1_2019_c\n").unwrap();
        assert_eq!((id.task(), id.contest()), ("tenka1_2019_c", "tenka1-2019"));

        // no underscore-delimited segment: the id is its own contest
        let id = TaskId::parse("practice").unwrap();
        assert_eq!((id.task(), id.contest()), ("practice", "practice"));
    }

    #[test]
    fn query_and_case_are_ignored() {
        let id = TaskId::parse("https://atcoder.jp/contests/ABC123/tasks/ABC123_B?lang=ja").unwrap();
        assert_eq!((id.task(), id.contest()), ("abc123_b", "abc123"));
    }

    #[test]
    fn contest_from_url_is_kept_verbatim() {
        let id = TaskId::parse("https://atcoder.jp/contests/tenka1-2019/tasks/tenka1_2019_a")
            .unwrap();
        assert_eq!((id.task(), id.contest()), ("tenka1_2019_a", "tenka1-2019"));
    }

    #[test]
    fn invalid_identifiers() {
        assert_eq!(TaskId::parse(""), None);
        assert_eq!(TaskId::parse("abc123_"), None);
        assert_eq!(TaskId::parse("問題!"), None);
        assert_eq!(TaskId::parse("https://atcoder.jp/contests/abc123/tasks/"), None);
        assert_eq!(ContestId::parse("???"), None);
    }

    #[test]
    fn trailing_id_takes_longest_valid_suffix() {
        assert_eq!(trailing_id("foo/abc__d_e"), Some("d_e"));
        assert_eq!(trailing_id("x-_y"), Some("y"));
        assert_eq!(trailing_id("abc"), Some("abc"));
    }

    #[test]
    fn contest_ids() {
        let site = Url::parse("https://atcoder.jp").unwrap();
        for input in [
            "abc123",
            "https://atcoder.jp/contests/abc123",
            "https://atcoder.jp/contests/abc123/tasks",
            "https://atcoder.jp/contests/abc123/tasks?lang=en",
        ] {
            let id = ContestId::parse(input).unwrap();
            assert_eq!(id.as_str(), "abc123", "{}", input);
            assert_eq!(
                id.tasks_url(&site).unwrap().as_str(),
                "https://atcoder.jp/contests/abc123/tasks"
            );
        }
        assert_eq!(ContestId::parse("tenka1_2019").unwrap().as_str(), "tenka1-2019");
    }

    #[test]
    fn task_page_url() {
        let site = Url::parse("https://atcoder.jp/").unwrap();
        let id = TaskId::parse("abc123_a").unwrap();
        assert_eq!(
            id.url(&site).unwrap().as_str(),
            "https://atcoder.jp/contests/abc123/tasks/abc123_a"
        );
    }
}
