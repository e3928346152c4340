//! Problem data scraped from the contest site.
use serde::{Deserialize, Serialize};

/// Language in which problem statement is rendered.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DisplayLanguage {
    #[default]
    English,
    Japanese,
}

impl DisplayLanguage {
    /// Short code used by the site, both in the `lang` query parameter
    /// and in the `lang-*` class of the statement subtree.
    pub fn code(self) -> &'static str {
        match self {
            DisplayLanguage::English => "en",
            DisplayLanguage::Japanese => "ja",
        }
    }
}

impl std::str::FromStr for DisplayLanguage {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "english" | "en" => Ok(DisplayLanguage::English),
            "japanese" | "ja" => Ok(DisplayLanguage::Japanese),
            _ => Err(format!("unknown display language: {}", s)),
        }
    }
}

/// Published example of problem input and the expected output.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Sample {
    pub input: String,
    pub output: String,
}

/// One task of a contest.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Problem {
    pub language: DisplayLanguage,
    /// Task id, e.g. `abc123_a`
    pub id: String,
    pub url: String,
    pub title: String,
    /// Time and memory limit, as written on the page
    pub execute_constraints: String,
    /// Statement markup in `language`
    pub body_html: String,
    /// In the order they appear in the statement
    pub samples: Vec<Sample>,
}

/// Row of a contest task list.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ProblemLink {
    pub id: String,
    pub name: String,
    pub url: String,
    pub time_limit: String,
    pub memory_limit: String,
    pub submit_url: String,
}
