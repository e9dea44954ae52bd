//! Convenience helpers shared across command handlers.

use std::fs;
use std::io::{self, Write};
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use idcard::{Batch, CardRecord, JsonSettingsStore, Settings, SettingsStore};

/// Load settings from `path`, or from the default location.
pub fn load_settings(path: Option<&Path>) -> Result<Settings> {
    let store = match path {
        Some(path) => JsonSettingsStore::new(path),
        None => JsonSettingsStore::default_location(),
    };
    store
        .load()
        .with_context(|| format!("failed to load settings from {}", store.path().display()))
}

/// Load a batch file, attaching path context to any error.
pub fn load_batch(path: &Path) -> Result<Batch> {
    Batch::load(path).with_context(|| format!("failed to read batch {}", path.display()))
}

/// Persist a string either to a file or stdout when `-` is provided.
pub fn write_output(path: &Path, content: &str) -> Result<()> {
    if path.as_os_str() == "-" {
        io::stdout().write_all(content.as_bytes())?;
        return Ok(());
    }
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directory {}", parent.display()))?;
    }
    fs::write(path, content).with_context(|| format!("failed to write {}", path.display()))
}

/// Convert a 1-based index from the command line into a slice index.
pub fn zero_based(index: usize, len: usize) -> Result<usize> {
    if index == 0 {
        return Err(anyhow!("card indices are 1-based"));
    }
    if index > len {
        return Err(anyhow!("card index {} out of range 1..={}", index, len));
    }
    Ok(index - 1)
}

/// Numbered listing used by `batch info`, `card show` and `source preview`.
pub fn print_records<'a, I>(records: I, marker: impl Fn(&CardRecord) -> &'static str)
where
    I: IntoIterator<Item = &'a CardRecord>,
{
    for (idx, record) in records.into_iter().enumerate() {
        println!("{:>4} {} {}", idx + 1, marker(record), record.summary());
    }
}
