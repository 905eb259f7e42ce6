use crate::config::REGEX_MAX_LENGTH;
use sparql_index_model::UriRegex;
use std::collections::BTreeSet;

/// The result of [UriPrefixSummarizer::add_uri].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOutcome {
    /// The prefix of the URI was added to the regex.
    Added,
    /// The regex already matches the URI.
    AlreadyCovered,
    /// The prefix did not fit. The summarizer is now incomplete.
    Truncated,
    /// The URI is empty or consists only of whitespace.
    Rejected,
}

/// Summarizes a stream of URIs as an alternation of anchored prefixes (`^prefix1|^prefix2|...`).
///
/// The regex never grows beyond a fixed length. Once a prefix does not fit, the summarizer is
/// truncated and drops every further prefix. Every URI added before that point matches
/// [UriPrefixSummarizer::regex].
///
/// The emitted regex only uses escapes that are valid both in XPath regular expressions (as
/// evaluated by SPARQL's `regex` function) and in the `regex` crate.
#[derive(Debug, Clone)]
pub struct UriPrefixSummarizer {
    /// Unescaped prefixes, sorted so that the emitted regex is deterministic.
    prefixes: BTreeSet<String>,
    max_length: usize,
    /// Length of the regex emitted for the current prefixes.
    length: usize,
    truncated: bool,
}

impl Default for UriPrefixSummarizer {
    fn default() -> Self {
        Self::new(REGEX_MAX_LENGTH)
    }
}

impl UriPrefixSummarizer {
    pub fn new(max_length: usize) -> Self {
        Self {
            prefixes: BTreeSet::new(),
            max_length,
            length: 0,
            truncated: false,
        }
    }

    pub fn add_uri(&mut self, uri: &str) -> AddOutcome {
        if uri.trim().is_empty() {
            tracing::warn!("Skipping empty URI");
            return AddOutcome::Rejected;
        }
        if self.covers(uri) {
            return AddOutcome::AlreadyCovered;
        }
        if self.truncated {
            return AddOutcome::Truncated;
        }

        let prefix = uri_prefix(uri);
        let separator = usize::from(!self.prefixes.is_empty());
        let length = self.length + separator + 1 + escaped_length(prefix);
        if length > self.max_length {
            tracing::warn!(
                prefix,
                length,
                max_length = self.max_length,
                "URI regex is full, dropping further prefixes"
            );
            self.truncated = true;
            return AddOutcome::Truncated;
        }

        tracing::trace!(prefix, "Adding URI prefix");
        self.prefixes.insert(prefix.to_owned());
        self.length = length;
        AddOutcome::Added
    }

    /// Returns whether a recorded prefix is a prefix of `uri`.
    pub fn covers(&self, uri: &str) -> bool {
        self.prefixes.iter().any(|prefix| uri.starts_with(prefix))
    }

    /// Returns the alternation of all recorded prefixes.
    pub fn regex(&self) -> String {
        let mut regex = String::with_capacity(self.length);
        for (i, prefix) in self.prefixes.iter().enumerate() {
            if i > 0 {
                regex.push('|');
            }
            regex.push('^');
            escape_into(prefix, &mut regex);
        }
        regex
    }

    pub fn is_complete(&self) -> bool {
        !self.truncated
    }

    pub fn is_empty(&self) -> bool {
        self.prefixes.is_empty()
    }

    pub fn prefix_count(&self) -> usize {
        self.prefixes.len()
    }

    /// Returns the regex for the registry, or `None` if no prefix was recorded.
    pub fn to_uri_regex(&self) -> Option<UriRegex> {
        (!self.is_empty()).then(|| UriRegex::new(self.regex(), self.is_complete()))
    }

    /// Returns the regex for the registry once every URI of the position has been added, if
    /// `exhaustive`. Without any prefix, an exhaustive position yields [UriRegex::no_uris].
    pub fn to_final_uri_regex(&self, exhaustive: bool) -> Option<UriRegex> {
        if self.is_empty() {
            exhaustive.then(UriRegex::no_uris)
        } else {
            Some(UriRegex::new(self.regex(), exhaustive && self.is_complete()))
        }
    }
}

/// Returns the part of `uri` up to and including its last `/`, `#` or `:`.
///
/// A URI ending with one of these delimiters is its own prefix. A URI without any delimiter is
/// returned unchanged.
pub fn uri_prefix(uri: &str) -> &str {
    if uri.ends_with(is_delimiter) {
        return uri;
    }
    match uri.rfind(is_delimiter) {
        Some(position) => &uri[..=position],
        None => uri,
    }
}

fn is_delimiter(c: char) -> bool {
    matches!(c, '/' | '#' | ':')
}

fn needs_escape(c: char) -> bool {
    matches!(
        c,
        '\\' | '.' | '^' | '$' | '|' | '?' | '*' | '+' | '(' | ')' | '[' | ']' | '{' | '}' | '-'
    )
}

fn escaped_length(value: &str) -> usize {
    value.len() + value.chars().filter(|c| needs_escape(*c)).count()
}

fn escape_into(value: &str, target: &mut String) {
    for c in value.chars() {
        if needs_escape(c) {
            target.push('\\');
        }
        target.push(c);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use regex::Regex;

    #[test]
    fn exhaustive_position_without_uris_matches_nothing() {
        let summarizer = UriPrefixSummarizer::default();
        assert_eq!(summarizer.to_uri_regex(), None);
        assert_eq!(summarizer.to_final_uri_regex(false), None);

        let regex = summarizer.to_final_uri_regex(true).unwrap();
        assert!(regex.complete);
        let compiled = Regex::new(&regex.pattern).unwrap();
        assert!(!compiled.is_match("http://x.org/a"));
    }

    #[test]
    fn final_regex_is_complete_only_when_exhaustive() {
        let mut summarizer = UriPrefixSummarizer::default();
        summarizer.add_uri("http://x.org/a");
        assert!(summarizer.to_final_uri_regex(true).unwrap().complete);
        assert!(!summarizer.to_final_uri_regex(false).unwrap().complete);
    }

    #[test]
    fn prefix_is_cut_after_last_delimiter() {
        assert_eq!(uri_prefix("http://x.org/a/b"), "http://x.org/a/");
        assert_eq!(uri_prefix("http://x.org/onto#Class"), "http://x.org/onto#");
        assert_eq!(uri_prefix("urn:isbn:123"), "urn:isbn:");
        assert_eq!(uri_prefix("nodelimiter"), "nodelimiter");
    }

    #[test]
    fn trailing_delimiter_keeps_whole_uri() {
        assert_eq!(uri_prefix("http://x.org/"), "http://x.org/");
        assert_eq!(uri_prefix("http://x.org/onto#"), "http://x.org/onto#");
    }

    #[test]
    fn regex_matches_added_uris() {
        let mut summarizer = UriPrefixSummarizer::default();
        let uris = [
            "http://example.com/a/1",
            "http://example.com/b/(weird)+name",
            "urn:uuid:1234",
            "http://example.com/x-y/z?q=1",
        ];
        for uri in uris {
            assert_eq!(summarizer.add_uri(uri), AddOutcome::Added);
        }
        let regex = Regex::new(&summarizer.regex()).unwrap();
        for uri in uris {
            assert!(regex.is_match(uri), "{uri} does not match {regex}");
        }
        assert!(!regex.is_match("http://other.org/a/1"));
        assert!(summarizer.is_complete());
    }

    #[test]
    fn dots_are_escaped() {
        let mut summarizer = UriPrefixSummarizer::default();
        summarizer.add_uri("http://example.com/a");
        assert_eq!(summarizer.regex(), "^http://example\\.com/");
        let regex = Regex::new(&summarizer.regex()).unwrap();
        assert!(!regex.is_match("http://exampleXcom/a"));
    }

    #[test]
    fn known_prefix_is_not_added_twice() {
        let mut summarizer = UriPrefixSummarizer::default();
        assert_eq!(summarizer.add_uri("http://x.org/a"), AddOutcome::Added);
        assert_eq!(summarizer.add_uri("http://x.org/b"), AddOutcome::AlreadyCovered);
        assert_eq!(
            summarizer.add_uri("http://x.org/sub/c"),
            AddOutcome::AlreadyCovered
        );
        assert_eq!(summarizer.prefix_count(), 1);
    }

    #[test]
    fn blank_uris_are_rejected() {
        let mut summarizer = UriPrefixSummarizer::default();
        assert_eq!(summarizer.add_uri(""), AddOutcome::Rejected);
        assert_eq!(summarizer.add_uri(" \t"), AddOutcome::Rejected);
        assert!(summarizer.is_empty());
        assert!(summarizer.is_complete());
        assert_eq!(summarizer.to_uri_regex(), None);
    }

    #[test]
    fn truncation_drops_later_prefixes() {
        let mut summarizer = UriPrefixSummarizer::new(40);
        assert_eq!(summarizer.add_uri("http://a.org/x"), AddOutcome::Added);
        assert_eq!(summarizer.add_uri("http://b.org/x"), AddOutcome::Added);
        assert_eq!(summarizer.add_uri("http://c.org/x"), AddOutcome::Truncated);
        // Even a short prefix is dropped once truncated.
        assert_eq!(summarizer.add_uri("u:x"), AddOutcome::Truncated);

        assert!(!summarizer.is_complete());
        assert!(summarizer.regex().len() <= 40);
        assert_eq!(summarizer.regex(), "^http://a\\.org/|^http://b\\.org/");
        assert_eq!(
            summarizer.to_uri_regex().map(|r| r.complete),
            Some(false)
        );
    }

    #[test]
    fn regex_stays_within_bound_for_many_prefixes() {
        let mut summarizer = UriPrefixSummarizer::default();
        let uris = (0..1000)
            .map(|i| format!("http://host{i}.example.org/resource/{i}"))
            .collect::<Vec<_>>();
        let mut accepted = Vec::new();
        for uri in &uris {
            if summarizer.add_uri(uri) == AddOutcome::Added {
                accepted.push(uri);
            }
        }

        let regex = summarizer.regex();
        assert!(regex.len() <= REGEX_MAX_LENGTH);
        assert!(!summarizer.is_complete());
        let compiled = Regex::new(&regex).unwrap();
        for uri in accepted {
            assert!(compiled.is_match(uri));
        }
    }

    #[test]
    fn tracked_length_equals_emitted_length() {
        let mut summarizer = UriPrefixSummarizer::default();
        for uri in ["http://a.org/x", "urn:a-b:c", "http://(x).org/[y]/z"] {
            summarizer.add_uri(uri);
        }
        assert_eq!(summarizer.regex().len(), summarizer.length);
    }
}
