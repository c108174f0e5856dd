//! Post-processing applied to raw model summaries.

/// Strip markdown emphasis/list/bracket characters and collapse whitespace runs.
///
/// `*`, `[`, `]`, `_`, and newlines become spaces, then every whitespace run collapses to
/// a single space and the ends are trimmed. The model is asked for prose, but markdown
/// leaks through often enough that the cleanup is unconditional.
pub fn clean_summary(raw: &str) -> String {
    let replaced: String = raw
        .chars()
        .map(|c| match c {
            '*' | '[' | ']' | '_' | '\n' => ' ',
            other => other,
        })
        .collect();

    replaced.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_markdown_and_collapses_spaces() {
        assert_eq!(clean_summary("**Point 1**\n\nPoint  2"), "Point 1 Point 2");
    }

    #[test]
    fn strips_brackets_and_underscores() {
        assert_eq!(clean_summary("[Intro] my_summary"), "Intro my summary");
    }

    #[test]
    fn trims_leading_and_trailing_whitespace() {
        assert_eq!(clean_summary("  padded out  "), "padded out");
    }

    #[test]
    fn empty_summary_stays_empty() {
        assert_eq!(clean_summary(""), "");
        assert_eq!(clean_summary("\n\n"), "");
    }
}
