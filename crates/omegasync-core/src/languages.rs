//! Symbolic language-set expansion.

/// Every language/runtime the platform currently accepts.
///
/// Tracks the platform's capability list; update it when the platform adds
/// or retires a runtime.
pub const ALL_LANGUAGES: &[&str] = &[
    "c11-clang",
    "c11-gcc",
    "cpp11-clang",
    "cpp11-gcc",
    "cpp17-clang",
    "cpp17-gcc",
    "cpp20-clang",
    "cpp20-gcc",
    "cs",
    "go",
    "hs",
    "java",
    "js",
    "kt",
    "lua",
    "pas",
    "py2",
    "py3",
    "rb",
    "rs",
];

/// The two Karel variants (Java and Pascal syntax).
pub const KAREL_LANGUAGES: &[&str] = &["kj", "kp"];

/// Expands `all`, `karel` and `none` into the comma-separated code list the
/// platform expects. Anything else is passed through untouched.
pub fn expand_languages(token: &str) -> String {
    match token {
        "all" => ALL_LANGUAGES.join(","),
        "karel" => KAREL_LANGUAGES.join(","),
        "none" => String::new(),
        explicit => explicit.to_string(),
    }
}
