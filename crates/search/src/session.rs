use std::time::Instant;

use crate::buffer::Buffer;
use crate::overlay::HighlightOverlay;
use crate::refresh::{ResultCountRefresh, result_count_label};
use crate::state::{ReplaceScope, SearchConfig, SearchState};
use crate::span::Span;

/// A buffer paired with its search state.
///
/// The state is created on first use and its buffer resources are released
/// by `into_inner`. All methods here are what a find/replace dialog calls.
pub struct SearchSession<B: Buffer> {
    buffer: B,
    config: SearchConfig,
    state: Option<SearchState>,
    refresh: ResultCountRefresh,
}

impl<B: Buffer> SearchSession<B> {
    pub fn new(buffer: B) -> Self {
        Self::with_config(buffer, SearchConfig::default())
    }

    pub fn with_config(buffer: B, config: SearchConfig) -> Self {
        Self {
            buffer,
            config,
            state: None,
            refresh: ResultCountRefresh::default(),
        }
    }

    pub fn with_refresh(mut self, refresh: ResultCountRefresh) -> Self {
        self.refresh = refresh;
        self
    }

    pub fn buffer(&self) -> &B {
        &self.buffer
    }

    pub fn buffer_mut(&mut self) -> &mut B {
        &mut self.buffer
    }

    pub fn state(&self) -> Option<&SearchState> {
        self.state.as_ref()
    }

    /// Releases the overlay and annotation and hands the buffer back.
    pub fn into_inner(mut self) -> B {
        if let Some(state) = self.state.as_mut() {
            state.clear(&mut self.buffer);
        }
        self.buffer
    }

    fn parts(&mut self) -> (&mut SearchState, &mut B) {
        let state = self
            .state
            .get_or_insert_with(|| SearchState::new(self.config.clone()));
        (state, &mut self.buffer)
    }

    fn touched(&mut self) {
        self.refresh.schedule(Instant::now());
    }

    pub fn find(&mut self, raw: &str) {
        let (state, buffer) = self.parts();
        state.find(buffer, raw);
        self.touched();
    }

    pub fn find_next(&mut self) -> Option<Span> {
        let (state, buffer) = self.parts();
        let found = state.find_next(buffer, false);
        self.touched();
        found
    }

    pub fn find_prev(&mut self) -> Option<Span> {
        let (state, buffer) = self.parts();
        let found = state.find_next(buffer, true);
        self.touched();
        found
    }

    pub fn clear(&mut self) {
        if let Some(state) = self.state.as_mut() {
            state.clear(&mut self.buffer);
        }
        self.refresh.cancel();
    }

    pub fn replace(&mut self, replacement: Option<&str>, scope: ReplaceScope) -> usize {
        let (state, buffer) = self.parts();
        let count = state.replace(buffer, replacement, scope);
        self.touched();
        count
    }

    /// Clears any running search and returns the initial search-field value:
    /// the selection, else the last query.
    pub fn open_find(&mut self) -> Option<String> {
        self.clear();

        let selection = self.buffer.selection();
        if !selection.is_empty() {
            return Some(self.buffer.get_range(selection.from, selection.to));
        }
        self.state
            .as_ref()
            .and_then(|state| state.last_query())
            .filter(|query| !query.is_never())
            .map(|query| query.source())
    }

    /// Enter in the search field.
    pub fn submit_query(&mut self, text: &str) -> Option<Span> {
        if text.is_empty() {
            return None;
        }
        self.find(text);
        self.find_next()
    }

    pub fn request_next(&mut self, shift_held: bool) -> Option<Span> {
        if shift_held {
            self.find_prev()
        } else {
            self.find_next()
        }
    }

    pub fn request_prev(&mut self) -> Option<Span> {
        self.find_prev()
    }

    pub fn submit_replace(&mut self, text: &str, all: bool) -> usize {
        let scope = if all {
            ReplaceScope::All
        } else {
            ReplaceScope::One
        };
        self.replace(Some(text), scope)
    }

    pub fn on_dialog_closed(&mut self) {
        self.clear();
    }

    /// Matches of the active query among the buffer's visible lines.
    pub fn result_count(&self) -> usize {
        self.state
            .as_ref()
            .and_then(|state| state.query())
            .map(|query| HighlightOverlay::new(query).count_matches(&self.buffer.visible_lines()))
            .unwrap_or(0)
    }

    pub fn result_count_label(&self) -> String {
        result_count_label(self.result_count())
    }

    /// Returns the refreshed label once the debounce delay has elapsed.
    pub fn poll_result_count(&mut self, now: Instant) -> Option<String> {
        self.refresh.poll(now)?;
        Some(self.result_count_label())
    }
}
