use log::{debug, trace};

use crate::buffer::{AnnotationHandle, Buffer, OverlayHandle, operation};
use crate::matcher::MatchCursor;
use crate::overlay::HighlightOverlay;
use crate::query::{Query, parse_query, unescape};
use crate::span::{Position, Span};

/// Margin, in pixels, kept around a match scrolled into view.
pub const DEFAULT_SCROLL_MARGIN: u32 = 50;

#[derive(Debug, Clone)]
pub struct SearchConfig {
    pub scroll_margin: u32,
    pub annotate_scrollbar: bool,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            scroll_margin: DEFAULT_SCROLL_MARGIN,
            annotate_scrollbar: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplaceScope {
    One,
    All,
}

/// Search state of one buffer.
///
/// While a query is active the state owns an overlay (and, when the host
/// supports it, a scrollbar annotation) installed in the buffer; both are
/// removed before a new query is installed and on `clear`.
#[derive(Debug, Default)]
pub struct SearchState {
    config: SearchConfig,
    query_text: Option<String>,
    query: Option<Query>,
    last_query: Option<Query>,
    pos_from: Position,
    pos_to: Position,
    overlay: Option<OverlayHandle>,
    annotation: Option<AnnotationHandle>,
}

impl SearchState {
    pub fn new(config: SearchConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub fn is_active(&self) -> bool {
        self.query.is_some()
    }

    pub fn query_text(&self) -> Option<&str> {
        self.query_text.as_deref()
    }

    pub fn query(&self) -> Option<&Query> {
        self.query.as_ref()
    }

    pub fn last_query(&self) -> Option<&Query> {
        self.last_query.as_ref()
    }

    /// Bounds of the most recent match, or the search origin.
    pub fn current_span(&self) -> Span {
        Span::new(self.pos_from, self.pos_to)
    }

    pub fn overlay(&self) -> Option<OverlayHandle> {
        self.overlay
    }

    pub fn annotation(&self) -> Option<AnnotationHandle> {
        self.annotation
    }

    /// Makes `raw` the active query. Re-submitting the active text keeps the
    /// current match so the next `find_next` continues from it.
    pub fn find<B: Buffer + ?Sized>(&mut self, buffer: &mut B, raw: &str) {
        if raw.is_empty() || self.query_text.as_deref() == Some(raw) {
            return;
        }
        operation(buffer, |buffer| self.start(buffer, raw));
    }

    fn start<B: Buffer + ?Sized>(&mut self, buffer: &mut B, raw: &str) {
        self.release(buffer);

        let query = parse_query(raw);
        debug!(
            "Starting search for {:?} (case insensitive: {})",
            raw,
            query.case_insensitive()
        );
        self.overlay = Some(buffer.install_overlay(HighlightOverlay::new(&query)));
        if self.config.annotate_scrollbar {
            self.annotation = buffer.install_scrollbar_annotation(&query);
        }
        self.query_text = Some(raw.to_string());
        self.query = Some(query);

        let cursor = buffer.cursor();
        self.pos_from = cursor;
        self.pos_to = cursor;
    }

    /// Selects the next (or previous) match, wrapping around the document
    /// once. Leaves everything untouched when nothing matches.
    pub fn find_next<B: Buffer + ?Sized>(&mut self, buffer: &mut B, backward: bool) -> Option<Span> {
        let query = self.query.as_ref()?;
        let origin = if backward { self.pos_from } else { self.pos_to };
        let margin = self.config.scroll_margin;

        let found = operation(buffer, |buffer| {
            let found = MatchCursor::new(query, origin)
                .find(buffer, backward)
                .or_else(|| {
                    trace!("No match past {}, wrapping around", origin);
                    let boundary = if backward {
                        buffer.last_position()
                    } else {
                        buffer.first_position()
                    };
                    MatchCursor::new(query, boundary).find(&*buffer, backward)
                })?;

            buffer.set_selection(found.from, found.to);
            buffer.scroll_into_view(found, margin);
            Some(found)
        })?;

        self.pos_from = found.from;
        self.pos_to = found.to;
        Some(found)
    }

    /// Deactivates the search, remembering the query for the next session.
    pub fn clear<B: Buffer + ?Sized>(&mut self, buffer: &mut B) {
        operation(buffer, |buffer| {
            if let Some(query) = self.query.take() {
                self.last_query = Some(query);
            }
            self.query_text = None;
            self.release(buffer);
        });
    }

    fn release<B: Buffer + ?Sized>(&mut self, buffer: &mut B) {
        if let Some(handle) = self.overlay.take() {
            buffer.uninstall_overlay(handle);
        }
        if let Some(handle) = self.annotation.take() {
            buffer.uninstall_scrollbar_annotation(handle);
        }
    }

    /// Replaces matches of the selection (or the active/last query) with
    /// `replacement`. Returns how many matches were replaced.
    pub fn replace<B: Buffer + ?Sized>(
        &mut self,
        buffer: &mut B,
        replacement: Option<&str>,
        scope: ReplaceScope,
    ) -> usize {
        if buffer.is_read_only() {
            debug!("Ignoring replace in read-only buffer");
            return 0;
        }
        let Some(replacement) = replacement.filter(|text| !text.is_empty()) else {
            return 0;
        };
        let Some(query) = self.replacement_query(buffer) else {
            return 0;
        };
        let text = unescape(replacement);
        let margin = self.config.scroll_margin;

        match scope {
            ReplaceScope::All => {
                let count = operation(buffer, |buffer| replace_all(buffer, &query, &text));
                debug!("Replaced {} matches of {:?}", count, query.source());
                count
            }
            ReplaceScope::One => {
                let Some((inserted, next)) =
                    operation(buffer, |buffer| replace_one(buffer, &query, &text, margin))
                else {
                    return 0;
                };
                let span = next.unwrap_or(Span::at(inserted.to));
                self.pos_from = span.from;
                self.pos_to = span.to;
                1
            }
        }
    }

    fn replacement_query<B: Buffer + ?Sized>(&self, buffer: &B) -> Option<Query> {
        let selection = buffer.selection();
        if selection.is_empty() {
            return self.query.clone().or_else(|| self.last_query.clone());
        }

        if let Some(query) = &self.query
            && selection == self.current_span()
        {
            return Some(query.clone());
        }
        Some(parse_query(&buffer.get_range(selection.from, selection.to)))
    }
}

/// Replaces every match in document order, resuming after each inserted text.
fn replace_all<B: Buffer + ?Sized>(buffer: &mut B, query: &Query, text: &str) -> usize {
    let mut cursor = MatchCursor::new(query, buffer.first_position());
    let mut count = 0;
    while cursor.find(buffer, false).is_some() {
        cursor.replace_current(buffer, text);
        count += 1;
    }
    count
}

/// Replaces the match at or after the selection start, then selects the
/// following match. Returns the inserted span and the newly selected match.
fn replace_one<B: Buffer + ?Sized>(
    buffer: &mut B,
    query: &Query,
    text: &str,
    margin: u32,
) -> Option<(Span, Option<Span>)> {
    let mut cursor = MatchCursor::new(query, buffer.selection().from);
    if cursor.find(buffer, false).is_none() {
        cursor = MatchCursor::new(query, buffer.first_position());
        cursor.find(buffer, false)?;
    }

    let start = cursor.current()?.from;
    let inserted = cursor.replace_current(buffer, text)?;

    let next = cursor.find(buffer, false).or_else(|| {
        MatchCursor::new(query, buffer.first_position())
            .find(&*buffer, false)
            .filter(|span| span.from != start)
    });

    match next {
        Some(span) => {
            buffer.set_selection(span.from, span.to);
            buffer.scroll_into_view(span, margin);
        }
        None => buffer.set_selection(inserted.to, inserted.to),
    }
    Some((inserted, next))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryBuffer;

    #[test]
    fn test_state_drives_trait_objects() {
        let mut memory = MemoryBuffer::new("cat bat cat");
        let buffer: &mut dyn Buffer = &mut memory;
        let mut state = SearchState::new(SearchConfig::default());

        state.find(buffer, "cat");
        assert!(state.is_active());
        assert_eq!(
            state.find_next(buffer, false),
            Some(Span::new(Position::new(0, 0), Position::new(0, 3)))
        );

        state.clear(buffer);
        assert!(!state.is_active());
        assert_eq!(memory.overlay_count(), 0);
    }

    #[test]
    fn test_find_next_without_query_is_noop() {
        let mut buffer = MemoryBuffer::new("cat");
        let mut state = SearchState::default();
        assert_eq!(state.find_next(&mut buffer, false), None);
        assert!(buffer.events().is_empty());
    }

    #[test]
    fn test_clear_keeps_last_query_when_idle() {
        let mut buffer = MemoryBuffer::new("cat");
        let mut state = SearchState::default();
        state.find(&mut buffer, "/c.t/");
        state.clear(&mut buffer);
        state.clear(&mut buffer);

        assert_eq!(state.last_query().map(Query::source), Some("/c.t/".to_string()));
    }

    #[test]
    fn test_selection_matching_current_span_reuses_pattern() {
        let mut buffer = MemoryBuffer::new("k=1 k=22");
        let mut state = SearchState::default();
        state.find(&mut buffer, r"/k=(\d+)/");
        state.find_next(&mut buffer, false);

        assert_eq!(state.replace(&mut buffer, Some("$1=k"), ReplaceScope::All), 2);
        assert_eq!(buffer.text(), "1=k 22=k");
    }
}
