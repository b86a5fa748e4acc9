use crate::overlay::HighlightOverlay;
use crate::query::Query;
use crate::span::{Position, Span};

/// Opaque id of an overlay installed in a buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OverlayHandle(pub u64);

/// Opaque id of a scrollbar annotation installed in a buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AnnotationHandle(pub u64);

/// The editor surface the search engine drives.
///
/// Implementations own text storage, selection, rendering and scrolling; the
/// engine only reads and edits through these calls.
pub trait Buffer {
    /// Head of the primary selection.
    fn cursor(&self) -> Position;

    fn selection(&self) -> Span;

    fn set_selection(&mut self, from: Position, to: Position);

    fn scroll_into_view(&mut self, span: Span, margin: u32);

    /// Forward: first non-empty match starting at or after `from`.
    /// Backward: last non-empty match ending at or before `from`.
    fn scan_next_match(&self, query: &Query, from: Position, backward: bool) -> Option<Span>;

    fn get_range(&self, from: Position, to: Position) -> String;

    /// Replaces `[from, to)` with `text` and returns the span now covering `text`.
    fn replace_range(&mut self, from: Position, to: Position, text: &str) -> Span;

    fn first_position(&self) -> Position {
        Position::default()
    }

    /// End of the last line.
    fn last_position(&self) -> Position;

    fn install_overlay(&mut self, overlay: HighlightOverlay) -> OverlayHandle;

    fn uninstall_overlay(&mut self, handle: OverlayHandle);

    /// `None` when the host has no scrollbar annotations.
    fn install_scrollbar_annotation(&mut self, _query: &Query) -> Option<AnnotationHandle> {
        None
    }

    fn uninstall_scrollbar_annotation(&mut self, _handle: AnnotationHandle) {}

    fn is_read_only(&self) -> bool {
        false
    }

    /// Lines currently on screen, used for the result count.
    fn visible_lines(&self) -> Vec<String> {
        Vec::new()
    }

    fn begin_operation(&mut self) {}

    fn end_operation(&mut self) {}
}

/// Runs `f` as one transaction against `buffer`.
pub fn operation<B, R>(buffer: &mut B, f: impl FnOnce(&mut B) -> R) -> R
where
    B: Buffer + ?Sized,
{
    buffer.begin_operation();
    let result = f(buffer);
    buffer.end_operation();
    result
}
