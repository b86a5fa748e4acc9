use log::debug;
use regex::Regex;

use crate::buffer::Buffer;
use crate::query::Query;
use crate::span::{Position, Span};

/// Walks the matches of one query through a buffer.
///
/// The cursor starts at a position with no current match; each `find` moves
/// past the current match (or from the start position) in the requested
/// direction.
#[derive(Debug, Clone)]
pub struct MatchCursor<'q> {
    query: &'q Query,
    pos: Position,
    current: Option<Span>,
}

impl<'q> MatchCursor<'q> {
    pub fn new(query: &'q Query, pos: Position) -> Self {
        Self {
            query,
            pos,
            current: None,
        }
    }

    pub fn find<B: Buffer + ?Sized>(&mut self, buffer: &B, backward: bool) -> Option<Span> {
        let from = match self.current {
            Some(span) if backward => span.from,
            Some(span) => span.to,
            None => self.pos,
        };

        let found = buffer
            .scan_next_match(self.query, from, backward)
            .filter(|span| !span.is_empty());
        if found.is_none() {
            self.pos = from;
        }
        self.current = found;
        found
    }

    pub fn current(&self) -> Option<Span> {
        self.current
    }

    /// Replaces the current match, expanding `$N` tokens for pattern queries.
    /// Returns the span of the inserted text, which becomes the current match.
    pub fn replace_current<B: Buffer + ?Sized>(
        &mut self,
        buffer: &mut B,
        text: &str,
    ) -> Option<Span> {
        let span = self.current?;
        let replacement = match self.query {
            Query::Pattern(_) => {
                // Whole lines around the match keep `^`, `$` and `\b` intact.
                let line_start = Position::new(span.from.line, 0);
                let next_line = Position::new(span.to.line + 1, 0).min(buffer.last_position());
                let context = buffer.get_range(line_start, next_line);
                expand_captures(self.query.regex(), &context, span.from.ch, text)
            }
            Query::Literal(_) => text.to_string(),
        };

        let inserted = buffer.replace_range(span.from, span.to, &replacement);
        self.current = Some(inserted);
        Some(inserted)
    }
}

/// Substitutes `$0`..`$9` in `template` with the captures of the match of
/// `regex` that starts at byte `start` of `haystack`. Groups that did not
/// participate expand to nothing.
pub fn expand_captures(regex: &Regex, haystack: &str, start: usize, template: &str) -> String {
    let captures = regex
        .captures_at(haystack, start)
        .filter(|caps| caps.get(0).is_some_and(|m| m.start() == start));
    let mut out = String::with_capacity(template.len());
    let mut chars = template.chars().peekable();

    while let Some(c) = chars.next() {
        let Some(index) = chars
            .peek()
            .filter(|_| c == '$')
            .and_then(|next| next.to_digit(10))
        else {
            out.push(c);
            continue;
        };
        chars.next();

        match captures.as_ref().and_then(|caps| caps.get(index as usize)) {
            Some(group) => out.push_str(group.as_str()),
            None => debug!("Capture group ${} unmatched at byte {}", index, start),
        }
    }

    out
}
