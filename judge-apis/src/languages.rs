//! Languages understood by the judge.
//!
//! The table is fixed: the judge does not expose a way to enumerate its
//! runtimes, so the list below mirrors its documentation.
use serde::Serialize;

/// A runtime available on the judge.
#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct Language {
    /// Identifier sent to the judge
    pub id: &'static str,
    /// Human-readable
    pub label: &'static str,
}

const fn lang(id: &'static str, label: &'static str) -> Language {
    Language { id, label }
}

pub const SUPPORTED_LANGUAGES: &[Language] = &[
    lang("c", "C"),
    lang("cpp", "C++"),
    lang("objective-c", "Objective-C"),
    lang("java", "Java"),
    lang("kotlin", "Kotlin"),
    lang("scala", "Scala"),
    lang("swift", "Swift"),
    lang("csharp", "C#"),
    lang("go", "Go"),
    lang("haskell", "Haskell"),
    lang("erlang", "Erlang"),
    lang("perl", "Perl"),
    lang("python", "Python 2"),
    lang("python3", "Python 3"),
    lang("ruby", "Ruby"),
    lang("php", "PHP"),
    lang("bash", "Bash"),
    lang("r", "R"),
    lang("javascript", "JavaScript"),
    lang("coffeescript", "CoffeeScript"),
    lang("vb", "Visual Basic"),
    lang("cobol", "COBOL"),
    lang("fsharp", "F#"),
    lang("d", "D"),
    lang("clojure", "Clojure"),
    lang("elixir", "Elixir"),
    lang("mysql", "MySQL"),
    lang("rust", "Rust"),
    lang("scheme", "Scheme"),
    lang("commonlisp", "Common Lisp"),
    lang("nadesiko", "Nadesiko"),
    lang("typescript", "TypeScript"),
    lang("brainfuck", "Brainfuck"),
    lang("plain", "Plain text"),
];

/// Editor language id -> judge language id, where they differ.
const EDITOR_ALIASES: &[(&str, &str)] = &[
    ("python", "python3"),
    ("shellscript", "bash"),
    ("sql", "mysql"),
    ("lisp", "commonlisp"),
    ("plaintext", "plain"),
    ("javascriptreact", "javascript"),
    ("typescriptreact", "typescript"),
];

/// File extension -> editor language id.
const EXTENSIONS: &[(&str, &str)] = &[
    ("c", "c"),
    ("cc", "cpp"),
    ("cpp", "cpp"),
    ("cxx", "cpp"),
    ("m", "objective-c"),
    ("java", "java"),
    ("kt", "kotlin"),
    ("scala", "scala"),
    ("swift", "swift"),
    ("cs", "csharp"),
    ("go", "go"),
    ("hs", "haskell"),
    ("erl", "erlang"),
    ("pl", "perl"),
    ("py", "python"),
    ("rb", "ruby"),
    ("php", "php"),
    ("sh", "shellscript"),
    ("r", "r"),
    ("js", "javascript"),
    ("coffee", "coffeescript"),
    ("vb", "vb"),
    ("cob", "cobol"),
    ("fs", "fsharp"),
    ("d", "d"),
    ("clj", "clojure"),
    ("ex", "elixir"),
    ("exs", "elixir"),
    ("sql", "sql"),
    ("rs", "rust"),
    ("scm", "scheme"),
    ("lisp", "lisp"),
    ("ts", "typescript"),
    ("bf", "brainfuck"),
    ("txt", "plaintext"),
];

/// Looks up a judge language by its id.
pub fn find(id: &str) -> Option<&'static Language> {
    SUPPORTED_LANGUAGES.iter().find(|l| l.id == id)
}

pub fn is_supported(id: &str) -> bool {
    find(id).is_some()
}

/// Maps an editor language id to a judge language id.
/// Returns `None` for unknown ids; the caller has to pick one then.
pub fn detect_language(editor_language_id: &str) -> Option<&'static str> {
    if let Some((_, judge_id)) = EDITOR_ALIASES
        .iter()
        .find(|(editor, _)| *editor == editor_language_id)
    {
        return Some(*judge_id);
    }
    find(editor_language_id).map(|l| l.id)
}

/// Maps a file extension (without the dot) to an editor language id.
pub fn editor_language_for_extension(ext: &str) -> Option<&'static str> {
    let ext = ext.to_ascii_lowercase();
    EXTENSIONS
        .iter()
        .find(|(e, _)| *e == ext)
        .map(|(_, editor)| *editor)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn editor_ids_map_to_judge_ids() {
        assert_eq!(detect_language("cpp"), Some("cpp"));
        assert_eq!(detect_language("python"), Some("python3"));
        assert_eq!(detect_language("shellscript"), Some("bash"));
        assert_eq!(detect_language("markdown"), None);
    }

    #[test]
    fn every_alias_targets_a_supported_language() {
        for (_, judge_id) in EDITOR_ALIASES {
            assert!(is_supported(judge_id), "{} is not supported", judge_id);
        }
        for (_, editor) in EXTENSIONS {
            assert!(detect_language(editor).is_some(), "{} is not mapped", editor);
        }
    }

    #[test]
    fn extensions() {
        assert_eq!(editor_language_for_extension("RS"), Some("rust"));
        assert_eq!(editor_language_for_extension("py"), Some("python"));
        assert_eq!(editor_language_for_extension("docx"), None);
    }
}
