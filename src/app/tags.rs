//! `@file` tagging of user messages.
//!
//! A token like `@src/main.rs` that names a known project file adds a hint
//! asking the model to read it. File contents are never inlined.

use once_cell::sync::Lazy;
use regex::Regex;

/// Prefix that marks a file reference.
pub const TAG_PREFIX: char = '@';

static FILE_HINT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\n\n\[User has referenced these files: [^\]]*\]")
        .expect("file hint regex should compile")
});

/// Appends a read-file hint naming every known file referenced in `input`.
///
/// Referenced files are deduplicated and kept in order of appearance. Input
/// without matching tags is returned unchanged.
///
/// ```
/// use trace_agent::app::tags::resolve_file_tags;
///
/// let files = vec!["main.go".to_string()];
/// assert_eq!(
///     resolve_file_tags("explain @main.go", &files),
///     "explain @main.go\n\n[User has referenced these files: main.go. \
///      Use the read_file tool to view their contents.]"
/// );
/// assert_eq!(resolve_file_tags("no tags", &files), "no tags");
/// ```
#[must_use]
pub fn resolve_file_tags(input: &str, known_files: &[String]) -> String {
    let mut referenced: Vec<&str> = Vec::new();

    for word in input.split_whitespace() {
        let Some(path) = word.strip_prefix(TAG_PREFIX) else {
            continue;
        };
        if known_files.iter().any(|f| f == path) && !referenced.contains(&path) {
            referenced.push(path);
        }
    }

    if referenced.is_empty() {
        return input.to_string();
    }

    format!(
        "{input}\n\n[User has referenced these files: {}. Use the read_file tool to view their contents.]",
        referenced.join(", ")
    )
}

/// Removes the hint added by [`resolve_file_tags`].
#[must_use]
pub fn strip_file_hint(text: &str) -> String {
    FILE_HINT.replace_all(text, "").into_owned()
}
