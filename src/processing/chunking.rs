//! Sentence-boundary chunking.
//!
//! Documents are split on the literal two-character sequence `". "` (period followed by a
//! space). This is a heuristic, not a semantic splitter: abbreviations such as `"e.g. "`
//! cause spurious splits, and a period without a following space does not split at all.
//! That lossiness is deliberate; retrieval quality depends on the chunks matching the
//! indexed text exactly, not on smarter boundaries.

/// Split `text` into an ordered sequence of sentence chunks.
///
/// A document with no `". "` boundary yields exactly one chunk containing the whole text,
/// and empty input yields one empty chunk. No size bounds, no overlap, no merging of
/// over-short fragments.
pub fn split_sentences(text: &str) -> Vec<String> {
    text.split(". ").map(str::to_string).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_on_period_space() {
        assert_eq!(split_sentences("A. B. C"), vec!["A", "B", "C"]);
    }

    #[test]
    fn period_without_space_does_not_split() {
        assert_eq!(split_sentences("A.B"), vec!["A.B"]);
    }

    #[test]
    fn text_without_boundary_yields_one_chunk() {
        assert_eq!(split_sentences("no boundaries here"), vec!["no boundaries here"]);
    }

    #[test]
    fn empty_input_yields_one_empty_chunk() {
        assert_eq!(split_sentences(""), vec![""]);
    }

    #[test]
    fn abbreviations_split_spuriously() {
        // Known lossiness of the heuristic, asserted so nobody "fixes" it silently.
        assert_eq!(
            split_sentences("Fruits, e.g. apples, are food"),
            vec!["Fruits, e.g", "apples, are food"]
        );
    }
}
