use std::collections::BTreeSet;

/// Lower-cases and collapses runs of whitespace, so "  Web   Dev " and "web dev"
/// compare equal.
pub fn normalize(term: &str) -> String {
    term.split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Breaks a compound term on `/`, `&` or the standalone word "and".
///
/// ```
/// use collabmatch::taxonomy::split_compound;
///
/// assert_eq!(split_compound("UI/UX"), ["ui", "ux"]);
/// assert_eq!(split_compound("Research and Development"), ["research", "development"]);
/// assert_eq!(split_compound("Android"), ["android"]);
/// ```
pub fn split_compound(term: &str) -> Vec<String> {
    let mut parts = Vec::new();

    for piece in term.split(['/', '&']) {
        let mut words: Vec<String> = Vec::new();
        for word in piece.split_whitespace() {
            let word = word.to_lowercase();
            if word == "and" {
                if !words.is_empty() {
                    parts.push(words.join(" "));
                }
                words.clear();
            } else {
                words.push(word);
            }
        }
        if !words.is_empty() {
            parts.push(words.join(" "));
        }
    }

    parts
}

/// Splits a free-text skill list into normalized atomic terms.
pub fn extract_terms(raw: &str) -> BTreeSet<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|piece| !piece.is_empty())
        .flat_map(split_compound)
        .collect()
}

/// Whether `needle` occurs in `haystack` as a whole-word run. Both sides are expected
/// to be normalized already.
pub fn phrase_contains(haystack: &str, needle: &str) -> bool {
    if needle.is_empty() {
        return false;
    }
    if haystack == needle {
        return true;
    }

    format!(" {haystack} ").contains(&format!(" {needle} "))
}

/// Normalizes prose for keyword scanning: punctuation that never appears inside a
/// skill name becomes whitespace and sentence-final dots are dropped. Dots, slashes,
/// pluses and hashes inside words survive ("node.js", "ui/ux", "c++", "c#").
pub(crate) fn prose_words(text: &str) -> String {
    text.to_lowercase()
        .replace(
            |c: char| matches!(c, ',' | ';' | ':' | '!' | '?' | '(' | ')' | '[' | ']' | '"' | '\''),
            " ",
        )
        .split_whitespace()
        .map(|word| word.trim_end_matches('.'))
        .filter(|word| !word.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_comma_separated_terms() {
        let terms = extract_terms("AI, Web Dev");
        assert_eq!(terms, BTreeSet::from(["ai".to_owned(), "web dev".to_owned()]));
    }

    #[test]
    fn extraction_splits_compounds_and_drops_empties() {
        let terms = extract_terms(" UI/UX ,, Data & Analytics,  ");
        assert_eq!(
            terms,
            BTreeSet::from([
                "analytics".to_owned(),
                "data".to_owned(),
                "ui".to_owned(),
                "ux".to_owned(),
            ])
        );
    }

    #[test]
    fn whitespace_only_input_yields_nothing() {
        assert!(extract_terms("").is_empty());
        assert!(extract_terms("  ,  , ").is_empty());
    }

    #[test]
    fn and_only_splits_as_a_word() {
        assert_eq!(split_compound("Android"), ["android"]);
        assert_eq!(split_compound("Sand and Stone"), ["sand", "stone"]);
        assert_eq!(split_compound("Brand"), ["brand"]);
    }

    #[test]
    fn phrase_containment_respects_word_boundaries() {
        assert!(phrase_contains("nlp research", "nlp"));
        assert!(phrase_contains("applied machine learning", "machine learning"));
        assert!(!phrase_contains("students", "ts"));
        assert!(!phrase_contains("nlp", ""));
    }

    #[test]
    fn prose_keeps_skill_punctuation() {
        assert_eq!(
            prose_words("Built with Node.js, C++ and UI/UX (mostly)."),
            "built with node.js c++ and ui/ux mostly"
        );
    }
}
