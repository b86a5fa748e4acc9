use std::io::IsTerminal;
use std::ops::Range;
use std::path::Path;

use anyhow::Result;
use scout_search::{Buffer, SearchSession, Span, TokenKind, memory::MemoryBuffer};

use super::{open_session, require_query};
use crate::config::AppConfig;

const HIGHLIGHT_START: &str = "\x1b[7m";
const HIGHLIGHT_END: &str = "\x1b[0m";

pub fn run(config: &AppConfig, path: &Path, query: &str, prev: bool, all: bool) -> Result<()> {
    require_query(query)?;
    let mut session = open_session(config, path)?;
    session.find(query);

    let spans = if all {
        collect_matches(&mut session)
    } else {
        session.request_next(prev).into_iter().collect()
    };

    if spans.is_empty() {
        println!("No Results");
        return Ok(());
    }

    let color = std::io::stdout().is_terminal();
    let buffer = session.buffer();
    for span in &spans {
        for line in context_range(buffer, span, config.context_lines) {
            if line == span.from.line {
                let excerpt = render_line(buffer, line, color);
                println!("{}:{}: {}", path.display(), span.from, excerpt);
            } else {
                let text = buffer.line(line).unwrap_or_default();
                println!("{}-{}- {}", path.display(), line + 1, text);
            }
        }
    }
    Ok(())
}

/// Steps through every match once, stopping when the search wraps.
pub fn collect_matches<B: Buffer>(session: &mut SearchSession<B>) -> Vec<Span> {
    let mut spans: Vec<Span> = Vec::new();
    while let Some(span) = session.find_next() {
        if spans.first() == Some(&span) {
            break;
        }
        spans.push(span);
    }
    spans
}

fn context_range(buffer: &MemoryBuffer, span: &Span, context: usize) -> Range<usize> {
    let start = span.from.line.saturating_sub(context);
    let end = (span.from.line + context + 1).min(buffer.line_count());
    start..end
}

fn render_line(buffer: &MemoryBuffer, line: usize, color: bool) -> String {
    let Some(text) = buffer.line(line) else {
        return String::new();
    };
    let (open, close) = if color {
        (HIGHLIGHT_START, HIGHLIGHT_END)
    } else {
        ("[", "]")
    };

    let mut out = String::with_capacity(text.len());
    for (range, kind) in buffer.highlighted(line) {
        match kind {
            TokenKind::Match => {
                out.push_str(open);
                out.push_str(&text[range]);
                out.push_str(close);
            }
            TokenKind::Plain => out.push_str(&text[range]),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use scout_search::Position;

    use super::*;

    fn session(text: &str, query: &str) -> SearchSession<MemoryBuffer> {
        let mut session = SearchSession::new(MemoryBuffer::new(text));
        session.find(query);
        session
    }

    #[test]
    fn collects_each_match_once() {
        let mut session = session("cat bat\ncat\nbat cat", "cat");
        let spans = collect_matches(&mut session);
        let starts: Vec<Position> = spans.iter().map(|span| span.from).collect();
        assert_eq!(
            starts,
            vec![Position::new(0, 0), Position::new(1, 0), Position::new(2, 4)]
        );
    }

    #[test]
    fn collects_nothing_without_matches() {
        let mut session = session("cat", "dog");
        assert!(collect_matches(&mut session).is_empty());
    }

    #[test]
    fn renders_matches_in_brackets() {
        let session = session("a cat and a Cat", "cat");
        assert_eq!(
            render_line(session.buffer(), 0, false),
            "a [cat] and a [Cat]"
        );
    }

    #[test]
    fn context_is_clamped_to_document() {
        let session = session("one\ntwo\nthree", "one");
        let span = Span::new(Position::new(0, 0), Position::new(0, 3));
        assert_eq!(context_range(session.buffer(), &span, 2), 0..3);
        assert_eq!(context_range(session.buffer(), &span, 0), 0..1);
    }
}
