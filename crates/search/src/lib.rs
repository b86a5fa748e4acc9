//! Incremental find/replace over editor buffers.

mod buffer;
mod matcher;
pub mod memory;
mod overlay;
mod query;
mod refresh;
mod session;
mod span;
mod state;

pub use buffer::{AnnotationHandle, Buffer, OverlayHandle, operation};
pub use matcher::{MatchCursor, expand_captures};
pub use overlay::{HighlightOverlay, Token, TokenKind};
pub use query::{Literal, Pattern, Query, parse_query, unescape};
pub use refresh::{DEFAULT_RESULT_COUNT_DELAY_MS, ResultCountRefresh, result_count_label};
pub use session::SearchSession;
pub use span::{Position, Span};
pub use state::{DEFAULT_SCROLL_MARGIN, ReplaceScope, SearchConfig, SearchState};
