use std::sync::OnceLock;

use log::debug;
use regex::{Regex, RegexBuilder};

/// Source of the query substituted for anything that would match the empty string.
const NEVER_MATCH_SOURCE: &str = "x^";

#[derive(Debug, Clone)]
pub struct Literal {
    text: String,
    regex: Regex,
}

impl Literal {
    pub fn text(&self) -> &str {
        &self.text
    }
}

#[derive(Debug, Clone)]
pub struct Pattern {
    source: String,
    case_insensitive: bool,
    regex: Regex,
}

impl Pattern {
    pub fn source(&self) -> &str {
        &self.source
    }
}

/// A parsed search target. Both variants carry a compiled regex so the
/// buffer and the highlighter never recompile per keystroke.
#[derive(Debug, Clone)]
pub enum Query {
    Literal(Literal),
    Pattern(Pattern),
}

impl PartialEq for Query {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Query::Literal(a), Query::Literal(b)) => a.text == b.text,
            (Query::Pattern(a), Query::Pattern(b)) => {
                a.source == b.source && a.case_insensitive == b.case_insensitive
            }
            _ => false,
        }
    }
}

impl Eq for Query {}

impl Query {
    /// Builds a literal query, inferring case folding from the text.
    pub fn literal(text: &str) -> Self {
        if text.is_empty() {
            return Self::never();
        }

        let case_insensitive = text == text.to_lowercase();
        match RegexBuilder::new(&regex::escape(text))
            .case_insensitive(case_insensitive)
            .build()
        {
            Ok(regex) => Query::Literal(Literal {
                text: text.to_string(),
                regex,
            }),
            Err(e) => {
                debug!("Literal query too large to compile: {}", e);
                Self::never()
            }
        }
    }

    pub fn pattern(source: &str, case_insensitive: bool) -> Result<Self, regex::Error> {
        let regex = RegexBuilder::new(source)
            .case_insensitive(case_insensitive)
            .multi_line(true)
            .build()?;

        if regex.is_match("") {
            debug!("Pattern /{}/ matches the empty string, disabling it", source);
            return Ok(Self::never());
        }

        Ok(Query::Pattern(Pattern {
            source: source.to_string(),
            case_insensitive,
            regex,
        }))
    }

    /// The canonical query that matches nothing.
    pub fn never() -> Self {
        static NEVER: OnceLock<Regex> = OnceLock::new();
        let regex = NEVER
            .get_or_init(|| {
                Regex::new(NEVER_MATCH_SOURCE).expect("never-match regex should compile")
            })
            .clone();
        Query::Pattern(Pattern {
            source: NEVER_MATCH_SOURCE.to_string(),
            case_insensitive: false,
            regex,
        })
    }

    pub fn is_never(&self) -> bool {
        matches!(self, Query::Pattern(p) if p.source == NEVER_MATCH_SOURCE)
    }

    pub fn is_pattern(&self) -> bool {
        matches!(self, Query::Pattern(_))
    }

    pub fn case_insensitive(&self) -> bool {
        match self {
            Query::Literal(literal) => literal.text == literal.text.to_lowercase(),
            Query::Pattern(pattern) => pattern.case_insensitive,
        }
    }

    pub fn regex(&self) -> &Regex {
        match self {
            Query::Literal(literal) => &literal.regex,
            Query::Pattern(pattern) => &pattern.regex,
        }
    }

    /// Text suitable for pre-filling a search field.
    pub fn source(&self) -> String {
        match self {
            Query::Literal(literal) => literal.text.clone(),
            Query::Pattern(pattern) => {
                let flags = if pattern.case_insensitive { "i" } else { "" };
                format!("/{}/{}", pattern.source, flags)
            }
        }
    }
}

/// Parses raw search-field input.
///
/// `/body/flags` is compiled as a pattern (only `i` is honored); if it does not
/// compile, the raw text is searched literally. Anything else is unescaped and
/// searched literally.
pub fn parse_query(raw: &str) -> Query {
    if let Some((body, flags)) = split_delimited(raw) {
        match Query::pattern(body, flags.contains('i')) {
            Ok(query) => return query,
            Err(e) => {
                debug!("Falling back to literal search for {:?}: {}", raw, e);
                return Query::literal(raw);
            }
        }
    }

    Query::literal(&unescape(raw))
}

/// Expands `\n` and `\r`; any other escaped character stands for itself.
pub fn unescape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}

fn split_delimited(raw: &str) -> Option<(&str, &str)> {
    let rest = raw.strip_prefix('/')?;
    let close = rest.rfind('/')?;
    let (body, flags) = (&rest[..close], &rest[close + 1..]);

    if body.contains(|c: char| c == '\n' || c == '\r') || !flags.chars().all(|c| c.is_ascii_lowercase()) {
        return None;
    }
    Some((body, flags))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_plain_text_is_literal() {
        let query = parse_query("hello");
        assert!(!query.is_pattern());
        assert_eq!(query.source(), "hello");
        assert!(query.case_insensitive());
    }

    #[test]
    fn test_uppercase_literal_is_case_sensitive() {
        let query = parse_query("Hello");
        assert!(!query.case_insensitive());
        assert!(query.regex().is_match("Hello"));
        assert!(!query.regex().is_match("hello"));
    }

    #[test]
    fn test_lowercase_literal_folds_case() {
        let query = parse_query("hello");
        assert!(query.regex().is_match("HeLLo world"));
    }

    #[test]
    fn test_delimited_pattern_with_flag() {
        let query = parse_query("/b.dy/i");
        let Query::Pattern(pattern) = &query else {
            panic!("expected a pattern");
        };
        assert_eq!(pattern.source(), "b.dy");
        assert!(query.case_insensitive());
        assert!(query.regex().is_match("BODY"));
        assert_eq!(query.source(), "/b.dy/i");
    }

    #[test]
    fn test_delimited_pattern_without_flag_is_case_sensitive() {
        let query = parse_query("/abc/");
        assert!(query.is_pattern());
        assert!(!query.case_insensitive());
        assert!(!query.regex().is_match("ABC"));
    }

    #[test]
    fn test_invalid_pattern_falls_back_to_raw_literal() {
        let query = parse_query("/[/");
        let Query::Literal(literal) = &query else {
            panic!("expected a literal");
        };
        assert_eq!(literal.text(), "/[/");
        assert!(query.regex().is_match("x /[/ y"));
    }

    #[test]
    fn test_uppercase_flags_are_not_delimited() {
        let query = parse_query("/abc/I");
        assert!(!query.is_pattern());
        assert_eq!(query.source(), "/abc/I");
    }

    #[test]
    fn test_literal_escapes_regex_metacharacters() {
        let query = parse_query("foo.*bar");
        assert!(!query.regex().is_match("fooXXXbar"));
        assert!(query.regex().is_match("foo.*bar"));
    }

    #[test]
    fn test_unescape_sequences() {
        assert_eq!(unescape(r"a\nb"), "a\nb");
        assert_eq!(unescape(r"a\rb"), "a\rb");
        assert_eq!(unescape(r"a\tb"), "atb");
        assert_eq!(unescape(r"a\\b"), r"a\b");
        assert_eq!(unescape("trailing\\"), "trailing\\");
    }

    #[test]
    fn test_escaped_newline_becomes_multiline_literal() {
        let query = parse_query(r"one\ntwo");
        assert_eq!(query.source(), "one\ntwo");
        assert!(query.regex().is_match("one\ntwo"));
    }

    #[test]
    fn test_empty_queries_never_match() {
        assert!(parse_query("").is_never());
        assert!(parse_query("/a*/").is_never());
        assert!(parse_query("/^/").is_never());
        assert!(!Query::never().regex().is_match(""));
        assert!(!Query::never().regex().is_match("x\nx"));
    }

    #[test]
    fn test_queries_compare_by_source() {
        assert_eq!(parse_query("abc"), parse_query("abc"));
        assert_ne!(parse_query("/abc/"), parse_query("/abc/i"));
        assert_ne!(parse_query("abc"), parse_query("/abc/"));
    }

    #[test]
    fn test_unicode_literal() {
        let query = parse_query("\u{1F600}");
        assert_eq!(query.regex().find_iter("a \u{1F600} b \u{1F600}").count(), 2);
    }

    proptest! {
        #[test]
        fn lowercase_literals_fold_case(text in "[a-z0-9 _.-]{1,24}") {
            prop_assert!(parse_query(&text).case_insensitive());
        }

        #[test]
        fn literals_with_uppercase_are_case_sensitive(
            prefix in "[a-z ]{0,8}",
            upper in "[A-Z]",
            suffix in "[a-zA-Z ]{0,8}",
        ) {
            let text = format!("{prefix}{upper}{suffix}");
            prop_assert!(!parse_query(&text).case_insensitive());
        }
    }
}
