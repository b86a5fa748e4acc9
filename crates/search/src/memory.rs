//! A `String`-backed [`Buffer`] used by the CLI and by tests.

use std::ops::Range;

use regex::Regex;

use crate::buffer::{AnnotationHandle, Buffer, OverlayHandle};
use crate::overlay::{HighlightOverlay, TokenKind};
use crate::query::Query;
use crate::span::{Position, Span};

/// Oldest events are dropped past this many.
const MAX_RECORDED_EVENTS: usize = 1024;

/// Side effects a host would act on, recorded in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BufferEvent {
    OverlayInstalled(OverlayHandle),
    OverlayRemoved(OverlayHandle),
    AnnotationInstalled(AnnotationHandle),
    AnnotationRemoved(AnnotationHandle),
    ScrolledIntoView(Span, u32),
    Repaint,
}

#[derive(Debug, Clone)]
pub struct MemoryBuffer {
    text: String,
    line_starts: Vec<usize>,
    anchor: Position,
    head: Position,
    read_only: bool,
    annotations_supported: bool,
    viewport: Option<Range<usize>>,
    overlays: Vec<(OverlayHandle, HighlightOverlay)>,
    annotations: Vec<AnnotationHandle>,
    next_handle: u64,
    operation_depth: usize,
    events: Vec<BufferEvent>,
}

impl MemoryBuffer {
    pub fn new(text: &str) -> Self {
        let mut buffer = Self {
            text: text.to_string(),
            line_starts: Vec::new(),
            anchor: Position::default(),
            head: Position::default(),
            read_only: false,
            annotations_supported: true,
            viewport: None,
            overlays: Vec::new(),
            annotations: Vec::new(),
            next_handle: 1,
            operation_depth: 0,
            events: Vec::new(),
        };
        buffer.reindex();
        buffer
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn set_read_only(&mut self, read_only: bool) {
        self.read_only = read_only;
    }

    pub fn set_annotations_supported(&mut self, supported: bool) {
        self.annotations_supported = supported;
    }

    /// Restricts `visible_lines` to `lines`; `None` shows the whole document.
    pub fn set_viewport(&mut self, lines: Option<Range<usize>>) {
        self.viewport = lines;
    }

    pub fn viewport(&self) -> Range<usize> {
        self.viewport.clone().unwrap_or(0..self.line_count())
    }

    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }

    pub fn line(&self, line: usize) -> Option<&str> {
        let start = *self.line_starts.get(line)?;
        Some(&self.text[start..self.line_end(line)])
    }

    pub fn overlay_count(&self) -> usize {
        self.overlays.len()
    }

    pub fn annotation_count(&self) -> usize {
        self.annotations.len()
    }

    /// Recorded events, oldest first. Only the latest `MAX_RECORDED_EVENTS`
    /// are kept; callers that care drain them with `take_events`.
    pub fn events(&self) -> &[BufferEvent] {
        &self.events
    }

    pub fn take_events(&mut self) -> Vec<BufferEvent> {
        std::mem::take(&mut self.events)
    }

    /// Tokens of `line` according to the most recently installed overlay.
    pub fn highlighted(&self, line: usize) -> Vec<(Range<usize>, TokenKind)> {
        let Some(text) = self.line(line) else {
            return Vec::new();
        };
        match self.overlays.last() {
            Some((_, overlay)) => overlay.tokenize(text),
            None if text.is_empty() => Vec::new(),
            None => vec![(0..text.len(), TokenKind::Plain)],
        }
    }

    pub fn offset_of(&self, pos: Position) -> usize {
        let line = pos.line.min(self.line_count() - 1);
        let start = self.line_starts[line];
        let mut offset = (start + pos.ch).min(self.line_end(line));
        while !self.text.is_char_boundary(offset) {
            offset -= 1;
        }
        offset
    }

    pub fn position_at(&self, offset: usize) -> Position {
        let offset = offset.min(self.text.len());
        let line = self.line_starts.partition_point(|&start| start <= offset) - 1;
        Position::new(line, offset - self.line_starts[line])
    }

    fn line_end(&self, line: usize) -> usize {
        match self.line_starts.get(line + 1) {
            Some(next) => next - 1,
            None => self.text.len(),
        }
    }

    fn reindex(&mut self) {
        self.line_starts.clear();
        self.line_starts.push(0);
        self.line_starts.extend(
            self.text
                .bytes()
                .enumerate()
                .filter(|(_, b)| *b == b'\n')
                .map(|(i, _)| i + 1),
        );
    }

    fn next_handle(&mut self) -> u64 {
        let id = self.next_handle;
        self.next_handle = self.next_handle.wrapping_add(1);
        id
    }

    /// The non-empty match of `regex` in the text before `origin` that ends
    /// closest to it. Every start offset is tried, so matches overlapping a
    /// longer one are still found.
    fn last_match_before(&self, regex: &Regex, origin: usize) -> Option<Range<usize>> {
        let haystack = &self.text[..origin];
        let mut best: Option<Range<usize>> = None;
        let mut start = 0;
        while start <= haystack.len() {
            let Some(m) = regex.find_at(haystack, start) else {
                break;
            };
            if !m.is_empty() && best.as_ref().is_none_or(|b| m.end() >= b.end) {
                best = Some(m.range());
            }
            start = self.next_boundary(m.start());
        }
        best
    }

    fn record(&mut self, event: BufferEvent) {
        if self.events.len() == MAX_RECORDED_EVENTS {
            self.events.remove(0);
        }
        self.events.push(event);
    }

    fn next_boundary(&self, offset: usize) -> usize {
        let mut next = offset + 1;
        while next < self.text.len() && !self.text.is_char_boundary(next) {
            next += 1;
        }
        next
    }
}

impl Buffer for MemoryBuffer {
    fn cursor(&self) -> Position {
        self.head
    }

    fn selection(&self) -> Span {
        Span::new(self.anchor, self.head)
    }

    fn set_selection(&mut self, from: Position, to: Position) {
        self.anchor = self.position_at(self.offset_of(from));
        self.head = self.position_at(self.offset_of(to));
    }

    fn scroll_into_view(&mut self, span: Span, margin: u32) {
        if let Some(viewport) = self.viewport.clone()
            && !viewport.contains(&span.from.line)
        {
            let height = viewport.len();
            let top = span.from.line.saturating_sub(height / 2);
            self.viewport = Some(top..top + height);
        }
        self.record(BufferEvent::ScrolledIntoView(span, margin));
    }

    fn scan_next_match(&self, query: &Query, from: Position, backward: bool) -> Option<Span> {
        let regex = query.regex();
        let origin = self.offset_of(from);

        let found = if backward {
            self.last_match_before(regex, origin)
        } else {
            let mut start = origin;
            loop {
                let m = regex.find_at(&self.text, start)?;
                if !m.is_empty() {
                    break Some(m.range());
                }
                start = self.next_boundary(m.start());
                if start > self.text.len() {
                    break None;
                }
            }
        }?;

        Some(Span::new(
            self.position_at(found.start),
            self.position_at(found.end),
        ))
    }

    fn get_range(&self, from: Position, to: Position) -> String {
        let span = Span::new(from, to);
        self.text[self.offset_of(span.from)..self.offset_of(span.to)].to_string()
    }

    fn replace_range(&mut self, from: Position, to: Position, text: &str) -> Span {
        let span = Span::new(from, to);
        let start = self.offset_of(span.from);
        let end = self.offset_of(span.to);
        let anchor = self.offset_of(self.anchor);
        let head = self.offset_of(self.head);

        self.text.replace_range(start..end, text);
        self.reindex();

        let map = |offset: usize| {
            if offset <= start {
                offset
            } else if offset >= end {
                offset - (end - start) + text.len()
            } else {
                start + text.len()
            }
        };
        self.anchor = self.position_at(map(anchor));
        self.head = self.position_at(map(head));

        Span::new(
            self.position_at(start),
            self.position_at(start + text.len()),
        )
    }

    fn last_position(&self) -> Position {
        self.position_at(self.text.len())
    }

    fn install_overlay(&mut self, overlay: HighlightOverlay) -> OverlayHandle {
        let handle = OverlayHandle(self.next_handle());
        self.overlays.push((handle, overlay));
        self.record(BufferEvent::OverlayInstalled(handle));
        handle
    }

    fn uninstall_overlay(&mut self, handle: OverlayHandle) {
        self.overlays.retain(|(installed, _)| *installed != handle);
        self.record(BufferEvent::OverlayRemoved(handle));
    }

    fn install_scrollbar_annotation(&mut self, _query: &Query) -> Option<AnnotationHandle> {
        if !self.annotations_supported {
            return None;
        }
        let handle = AnnotationHandle(self.next_handle());
        self.annotations.push(handle);
        self.record(BufferEvent::AnnotationInstalled(handle));
        Some(handle)
    }

    fn uninstall_scrollbar_annotation(&mut self, handle: AnnotationHandle) {
        self.annotations.retain(|installed| *installed != handle);
        self.record(BufferEvent::AnnotationRemoved(handle));
    }

    fn is_read_only(&self) -> bool {
        self.read_only
    }

    fn visible_lines(&self) -> Vec<String> {
        self.viewport()
            .filter_map(|line| self.line(line).map(str::to_string))
            .collect()
    }

    fn begin_operation(&mut self) {
        self.operation_depth += 1;
    }

    fn end_operation(&mut self) {
        self.operation_depth = self.operation_depth.saturating_sub(1);
        if self.operation_depth == 0 {
            self.record(BufferEvent::Repaint);
        }
    }
}
