use std::ops::Range;

use regex::Regex;

use crate::query::Query;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Match,
    Plain,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token {
    pub len: usize,
    pub kind: TokenKind,
}

impl Token {
    fn plain(len: usize) -> Self {
        Self {
            len,
            kind: TokenKind::Plain,
        }
    }
}

/// Line tokenizer consulted by the renderer for each visible line.
///
/// Holds only the compiled query, so classification never reads or writes
/// search state and can run any number of times per frame.
#[derive(Debug, Clone)]
pub struct HighlightOverlay {
    regex: Regex,
}

impl HighlightOverlay {
    pub fn new(query: &Query) -> Self {
        Self {
            regex: query.regex().clone(),
        }
    }

    /// Classifies the text of `line` starting at byte `offset`.
    pub fn classify(&self, line: &str, offset: usize) -> Token {
        if offset >= line.len() {
            return Token::plain(0);
        }
        if !line.is_char_boundary(offset) {
            let next = (offset + 1..=line.len())
                .find(|&i| line.is_char_boundary(i))
                .unwrap_or(line.len());
            return Token::plain(next - offset);
        }

        match self.regex.find_at(line, offset) {
            Some(m) if m.start() == offset => {
                let len = if m.is_empty() {
                    line[offset..].chars().next().map_or(1, char::len_utf8)
                } else {
                    m.len()
                };
                Token {
                    len,
                    kind: TokenKind::Match,
                }
            }
            Some(m) => Token::plain(m.start() - offset),
            None => Token::plain(line.len() - offset),
        }
    }

    /// Splits a whole line into consecutive tokens.
    pub fn tokenize(&self, line: &str) -> Vec<(Range<usize>, TokenKind)> {
        let mut tokens = Vec::new();
        let mut offset = 0;
        while offset < line.len() {
            let token = self.classify(line, offset);
            if token.len == 0 {
                break;
            }
            tokens.push((offset..offset + token.len, token.kind));
            offset += token.len;
        }
        tokens
    }

    pub fn count_matches<S: AsRef<str>>(&self, lines: &[S]) -> usize {
        lines
            .iter()
            .map(|line| {
                self.tokenize(line.as_ref())
                    .iter()
                    .filter(|(_, kind)| *kind == TokenKind::Match)
                    .count()
            })
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::parse_query;

    #[test]
    fn test_match_at_offset() {
        let overlay = HighlightOverlay::new(&parse_query("cat"));
        assert_eq!(
            overlay.classify("cat bat cat", 0),
            Token {
                len: 3,
                kind: TokenKind::Match
            }
        );
    }

    #[test]
    fn test_plain_up_to_next_match() {
        let overlay = HighlightOverlay::new(&parse_query("cat"));
        assert_eq!(overlay.classify("cat bat cat", 3), Token::plain(5));
    }

    #[test]
    fn test_plain_to_end_of_line() {
        let overlay = HighlightOverlay::new(&parse_query("dog"));
        assert_eq!(overlay.classify("cat bat cat", 4), Token::plain(7));
        assert_eq!(overlay.classify("cat", 3), Token::plain(0));
    }

    #[test]
    fn test_tokenize_line() {
        let overlay = HighlightOverlay::new(&parse_query("cat"));
        assert_eq!(
            overlay.tokenize("cat bat cat!"),
            vec![
                (0..3, TokenKind::Match),
                (3..8, TokenKind::Plain),
                (8..11, TokenKind::Match),
                (11..12, TokenKind::Plain),
            ]
        );
    }

    #[test]
    fn test_zero_width_match_advances_one_char() {
        let overlay = HighlightOverlay {
            regex: Regex::new(r"\b").unwrap(),
        };
        let token = overlay.classify("\u{e9}t\u{e9}", 0);
        assert_eq!(token.kind, TokenKind::Match);
        assert_eq!(token.len, '\u{e9}'.len_utf8());

        let tokens = overlay.tokenize("ab cd");
        let covered: usize = tokens.iter().map(|(range, _)| range.len()).sum();
        assert_eq!(covered, 5);
    }

    #[test]
    fn test_case_folding_follows_query() {
        let folded = HighlightOverlay::new(&parse_query("cat"));
        assert_eq!(folded.count_matches(&["Cat CAT cat"]), 3);

        let exact = HighlightOverlay::new(&parse_query("Cat"));
        assert_eq!(exact.count_matches(&["Cat CAT cat"]), 1);
    }

    #[test]
    fn test_count_matches_across_lines() {
        let overlay = HighlightOverlay::new(&parse_query("/\\d+/"));
        let lines = ["a 1 b 22", "none", "333"];
        assert_eq!(overlay.count_matches(&lines), 3);
    }

    #[test]
    fn test_never_query_highlights_nothing() {
        let overlay = HighlightOverlay::new(&parse_query(""));
        assert_eq!(overlay.tokenize("x^ x"), vec![(0..4, TokenKind::Plain)]);
    }
}
