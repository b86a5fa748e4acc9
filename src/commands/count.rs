use std::path::Path;

use anyhow::Result;

use super::{open_session, require_query};
use crate::config::AppConfig;

pub fn run(config: &AppConfig, path: &Path, query: &str) -> Result<()> {
    require_query(query)?;
    let mut session = open_session(config, path)?;
    session.find(query);
    println!("{}", session.result_count_label());
    Ok(())
}
