use std::{fs, path::Path};

use anyhow::{Context, Result};
use log::info;

use super::{open_session, require_query};
use crate::config::AppConfig;

pub fn run(
    config: &AppConfig,
    path: &Path,
    query: &str,
    replacement: &str,
    all: bool,
    write: bool,
) -> Result<()> {
    let (text, replaced) = replace_in_file(config, path, query, replacement, all)?;
    info!("Replaced {} matches in {}", replaced, path.display());

    if write {
        fs::write(path, &text).with_context(|| format!("failed to write {}", path.display()))?;
        eprintln!("Replaced {} in {}", replaced, path.display());
    } else {
        print!("{}", text);
    }
    Ok(())
}

fn replace_in_file(
    config: &AppConfig,
    path: &Path,
    query: &str,
    replacement: &str,
    all: bool,
) -> Result<(String, usize)> {
    require_query(query)?;
    let mut session = open_session(config, path)?;
    session.find(query);
    let replaced = session.submit_replace(replacement, all);
    let buffer = session.into_inner();
    Ok((buffer.text().to_string(), replaced))
}
