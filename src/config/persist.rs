//! Configuration persistence using toml_edit to preserve formatting and comments.

use anyhow::{Context, Result};
use std::path::Path;
use toml_edit::{value, DocumentMut, Item, Table};

/// Reset `[scraper] run_once` to false, leaving the rest of the file untouched.
pub fn clear_run_once(path: &Path) -> Result<()> {
    update_key(path, "scraper", "run_once", value(false))
}

/// Reset `[manual] ids` to an empty string, leaving the rest of the file untouched.
pub fn clear_manual_ids(path: &Path) -> Result<()> {
    update_key(path, "manual", "ids", value(""))
}

fn update_key(path: &Path, section: &str, key: &str, new_value: Item) -> Result<()> {
    let content = if path.exists() {
        std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?
    } else {
        String::new()
    };

    let mut doc: DocumentMut = content
        .parse()
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;

    let table = doc
        .entry(section)
        .or_insert_with(|| Item::Table(Table::new()))
        .as_table_like_mut()
        .with_context(|| format!("[{section}] is not a table in {:?}", path))?;
    table.insert(key, new_value);

    std::fs::write(path, doc.to_string())
        .with_context(|| format!("Failed to write config file: {:?}", path))?;

    Ok(())
}
