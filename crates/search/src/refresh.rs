use std::time::{Duration, Instant};

/// Delay between a search mutation and the result-count refresh.
pub const DEFAULT_RESULT_COUNT_DELAY_MS: u64 = 120;

/// Debounced "N Results" refresh, polled by the host with its own clock.
///
/// Every `schedule` supersedes the previous one, so a burst of keystrokes
/// produces a single refresh once input settles.
#[derive(Debug, Clone)]
pub struct ResultCountRefresh {
    delay: Duration,
    generation: u64,
    due: Option<(u64, Instant)>,
}

impl Default for ResultCountRefresh {
    fn default() -> Self {
        Self::new(Duration::from_millis(DEFAULT_RESULT_COUNT_DELAY_MS))
    }
}

impl ResultCountRefresh {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            generation: 0,
            due: None,
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Schedules a refresh `delay` after `now`, returning its generation.
    pub fn schedule(&mut self, now: Instant) -> u64 {
        self.generation = self.generation.wrapping_add(1);
        self.due = Some((self.generation, now + self.delay));
        self.generation
    }

    pub fn cancel(&mut self) {
        self.generation = self.generation.wrapping_add(1);
        self.due = None;
    }

    /// Returns the generation of the refresh that fell due, consuming it.
    pub fn poll(&mut self, now: Instant) -> Option<u64> {
        let (generation, at) = self.due?;
        if generation != self.generation || now < at {
            return None;
        }
        self.due = None;
        Some(generation)
    }
}

pub fn result_count_label(count: usize) -> String {
    match count {
        0 => "No Results".to_string(),
        n => format!("{} Results", n),
    }
}
