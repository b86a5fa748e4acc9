use std::{
    env, fs,
    path::{Path, PathBuf},
    time::Duration,
};

use log::warn;
use scout_search::{
    DEFAULT_RESULT_COUNT_DELAY_MS, DEFAULT_SCROLL_MARGIN, ResultCountRefresh, SearchConfig,
};

const MAX_SCROLL_MARGIN: u32 = 1_000;
const MAX_RESULT_COUNT_DELAY_MS: u64 = 5_000;
const MAX_CONTEXT_LINES: usize = 20;

pub const DEFAULT_CONFIG: &str = "# Scout settings\n\
# Margin in pixels kept around a match scrolled into view\n\
# scroll_margin = 50\n\
# Mark matches on the scrollbar when the host supports it\n\
# annotate_scrollbar = true\n\
# Delay before the result count refreshes after a search change\n\
# result_count_delay_ms = 120\n\
# Lines of context printed around each match by `scout find`\n\
# context_lines = 0\n";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub scroll_margin: u32,
    pub annotate_scrollbar: bool,
    pub result_count_delay_ms: u64,
    pub context_lines: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            scroll_margin: DEFAULT_SCROLL_MARGIN,
            annotate_scrollbar: true,
            result_count_delay_ms: DEFAULT_RESULT_COUNT_DELAY_MS,
            context_lines: 0,
        }
    }
}

impl AppConfig {
    pub fn load() -> Self {
        let Some(path) = config_path() else {
            return Self::default();
        };

        match fs::read_to_string(&path) {
            Ok(contents) => Self::from_contents(&contents),
            Err(_) => Self::default(),
        }
    }

    pub fn from_contents(contents: &str) -> Self {
        let mut config = Self::default();
        for (line_number, line) in contents.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let Some((key, value)) = line.split_once('=') else {
                warn!("Ignoring config line {}: expected key = value", line_number + 1);
                continue;
            };
            let key = key.trim();
            let value = value.trim();

            if key.eq_ignore_ascii_case("scroll_margin") {
                match value.parse::<u32>() {
                    Ok(margin) => config.scroll_margin = margin.min(MAX_SCROLL_MARGIN),
                    Err(_) => warn_invalid(line_number, key, value),
                }
            } else if key.eq_ignore_ascii_case("annotate_scrollbar") {
                match parse_bool(value) {
                    Some(enabled) => config.annotate_scrollbar = enabled,
                    None => warn_invalid(line_number, key, value),
                }
            } else if key.eq_ignore_ascii_case("result_count_delay_ms") {
                match value.parse::<u64>() {
                    Ok(delay) => config.result_count_delay_ms = delay.min(MAX_RESULT_COUNT_DELAY_MS),
                    Err(_) => warn_invalid(line_number, key, value),
                }
            } else if key.eq_ignore_ascii_case("context_lines") {
                match value.parse::<usize>() {
                    Ok(lines) => config.context_lines = lines.min(MAX_CONTEXT_LINES),
                    Err(_) => warn_invalid(line_number, key, value),
                }
            } else {
                warn!("Ignoring unknown config key `{}` on line {}", key, line_number + 1);
            }
        }

        config
    }

    pub fn search_config(&self) -> SearchConfig {
        SearchConfig {
            scroll_margin: self.scroll_margin,
            annotate_scrollbar: self.annotate_scrollbar,
        }
    }

    pub fn result_count_refresh(&self) -> ResultCountRefresh {
        ResultCountRefresh::new(Duration::from_millis(self.result_count_delay_ms))
    }

    /// Renders the effective settings in config-file syntax.
    pub fn to_contents(&self) -> String {
        format!(
            "scroll_margin = {}\n\
             annotate_scrollbar = {}\n\
             result_count_delay_ms = {}\n\
             context_lines = {}\n",
            self.scroll_margin,
            self.annotate_scrollbar,
            self.result_count_delay_ms,
            self.context_lines
        )
    }
}

fn warn_invalid(line_number: usize, key: &str, value: &str) {
    warn!(
        "Ignoring invalid value `{}` for `{}` on config line {}",
        value,
        key,
        line_number + 1
    );
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

pub fn config_path() -> Option<PathBuf> {
    if let Ok(xdg_config_home) = env::var("XDG_CONFIG_HOME")
        && !xdg_config_home.trim().is_empty()
    {
        return Some(Path::new(&xdg_config_home).join("scout/config.txt"));
    }

    #[cfg(target_os = "windows")]
    {
        dirs::config_dir().map(|p| p.join("scout").join("config.txt"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        dirs::home_dir().map(|p| p.join(".config").join("scout").join("config.txt"))
    }
}
