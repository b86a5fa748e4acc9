pub mod count;
pub mod find;
pub mod replace;
pub mod show_config;

use std::{fs, path::Path};

use anyhow::{Context, Result, bail};
use scout_search::{SearchSession, memory::MemoryBuffer};

use crate::config::AppConfig;

/// Loads `path` into a fresh buffer with search configured from `config`.
pub fn open_session(config: &AppConfig, path: &Path) -> Result<SearchSession<MemoryBuffer>> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let buffer = MemoryBuffer::new(&text);
    Ok(SearchSession::with_config(buffer, config.search_config())
        .with_refresh(config.result_count_refresh()))
}

pub fn require_query(query: &str) -> Result<()> {
    if query.is_empty() {
        bail!("the search query must not be empty");
    }
    Ok(())
}
