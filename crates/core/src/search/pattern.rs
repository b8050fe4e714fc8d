//! Query pattern construction.
//!
//! Pure function from user text to a compiled pattern. Filenames delimit
//! words with dots, plus, minus and underscores as often as spaces, so
//! tokens must match on those boundaries too, and multi-token queries must
//! tolerate any separator run between tokens ("foo bar" matches "foo.bar",
//! "foo_bar", "foo  bar").

use regex_lite::Regex;

/// Accepted token boundary: a word boundary or a filename separator.
const BOUNDARY: &str = r"(\b|[\.\+\-_])";

/// Wildcard tolerated between tokens of a multi-token query.
const TOKEN_GAP: &str = r".*[\s\.\+\-_()\[\]]";

/// Build the case-insensitive match pattern for a query.
///
/// An empty (or all-whitespace) query yields a match-all pattern. Tokens
/// are escaped, so ordinary punctuation in queries matches literally.
/// Returns `None` when the assembled pattern does not compile; callers
/// fail closed on that instead of erroring.
pub fn build_match_pattern(query: &str) -> Option<Regex> {
    let query = query.trim();

    let raw = if query.is_empty() {
        "(?i).".to_string()
    } else if !query.contains(' ') {
        format!("(?i){}", bounded(query))
    } else {
        let parts: Vec<String> = query.split_whitespace().map(|p| bounded(p)).collect();
        format!("(?i){}", parts.join(TOKEN_GAP))
    };

    Regex::new(&raw).ok()
}

fn bounded(token: &str) -> String {
    format!("{BOUNDARY}{}{BOUNDARY}", regex_lite::escape(token))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pattern(query: &str) -> Regex {
        build_match_pattern(query).expect("pattern should compile")
    }

    #[test]
    fn test_empty_query_matches_everything() {
        let re = pattern("");
        assert!(re.is_match("anything.mkv"));
        assert!(re.is_match("x"));
    }

    #[test]
    fn test_whitespace_only_is_match_all() {
        let re = pattern("   ");
        assert!(re.is_match("file.mp4"));
    }

    #[test]
    fn test_single_token_word_boundaries() {
        let re = pattern("loki");
        assert!(re.is_match("Loki.S01E01.mkv"));
        assert!(re.is_match("marvel loki 1080p"));
        assert!(re.is_match("marvel_loki_1080p"));
        assert!(re.is_match("loki"));
        // Token embedded in a longer word does not match
        assert!(!re.is_match("lokis-revenge"));
        assert!(!re.is_match("unlokied"));
    }

    #[test]
    fn test_single_token_case_insensitive() {
        let re = pattern("LOKI");
        assert!(re.is_match("loki.mkv"));
    }

    #[test]
    fn test_multi_token_tolerates_separators() {
        let re = pattern("big show");
        assert!(re.is_match("The.Big.Show.S01E01.mkv"));
        assert!(re.is_match("big_show_720p"));
        assert!(re.is_match("Big  Show"));
        assert!(re.is_match("big-show"));
    }

    #[test]
    fn test_multi_token_requires_order() {
        let re = pattern("big show");
        assert!(!re.is_match("show big"));
    }

    #[test]
    fn test_special_characters_are_literal() {
        // A token ending in punctuation still needs a separator boundary
        // after it; a plain space is not one.
        let re = pattern("c++");
        assert!(re.is_match("intro-c++-tutorial"));
        assert!(!re.is_match("intro-c-tutorial"));

        let re = pattern("what?");
        assert!(re.is_match("what?.mkv"));
        // The ? is literal, not an optional quantifier
        assert!(!re.is_match("what.mkv"));
    }

    #[test]
    fn test_multi_token_with_specials_compiles() {
        assert!(build_match_pattern("(2024) [remaster]").is_some());
    }
}
