use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::OpenOptions;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};

use crate::core::record::{CardRecord, CardVariant};
use crate::workspace::Workspace;

const BATCH_VERSION: u8 = 1;

/// Per-batch metadata stored as the first line of the file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BatchHeader {
    pub version: u8,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub variant: CardVariant,
}

impl BatchHeader {
    pub fn new(variant: CardVariant) -> Self {
        Self {
            version: BATCH_VERSION,
            created_at: Utc::now(),
            variant,
        }
    }
}

/// In-memory representation of a batch file: a saved working set.
#[derive(Debug, Clone)]
pub struct Batch {
    pub header: BatchHeader,
    pub cards: Vec<CardRecord>,
    pub path: Option<PathBuf>,
}

impl Batch {
    /// Create an empty batch for `variant`.
    pub fn new(variant: CardVariant) -> Self {
        Self {
            header: BatchHeader::new(variant),
            cards: Vec::new(),
            path: None,
        }
    }

    pub fn load(path: &Path) -> Result<Self> {
        let file = OpenOptions::new()
            .read(true)
            .open(path)
            .with_context(|| format!("failed to open batch file {}", path.display()))?;
        let reader = BufReader::new(file);

        let mut header = None;
        let mut cards = Vec::new();
        for (idx, raw) in reader.lines().enumerate() {
            let line_no = idx + 1;
            let raw = raw.with_context(|| {
                format!("failed to read line {} of {}", line_no, path.display())
            })?;
            if raw.trim().is_empty() {
                continue;
            }
            let line: BatchLine = serde_json::from_str(&raw).with_context(|| {
                format!(
                    "failed to parse batch line {} in {}",
                    line_no,
                    path.display()
                )
            })?;
            match (line, header.is_some()) {
                (BatchLine::Header(h), false) => header = Some(h),
                (BatchLine::Header(_), true) => {
                    return Err(anyhow!(
                        "multiple batch headers found in {} at line {}",
                        path.display(),
                        line_no
                    ));
                }
                (BatchLine::Card(_), false) => {
                    return Err(anyhow!(
                        "expected batch header before the first card in {} (line {})",
                        path.display(),
                        line_no
                    ));
                }
                (BatchLine::Card(card), true) => cards.push(card),
            }
        }

        let header =
            header.ok_or_else(|| anyhow!("batch file {} is empty", path.display()))?;
        Ok(Self {
            header,
            cards,
            path: Some(path.to_path_buf()),
        })
    }

    pub fn save(&mut self, path: &Path) -> Result<()> {
        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)
            .with_context(|| format!("failed to write batch file {}", path.display()))?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer(&mut writer, &BatchLineRef::Header(&self.header))
            .context("failed to serialize batch header")?;
        writer.write_all(b"\n")?;
        for card in &self.cards {
            serde_json::to_writer(&mut writer, &BatchLineRef::Card(card))
                .context("failed to serialize batch card")?;
            writer.write_all(b"\n")?;
        }
        writer.flush()?;
        self.path = Some(path.to_path_buf());
        Ok(())
    }

    pub fn variant(&self) -> CardVariant {
        self.header.variant
    }

    /// Session with this batch as its working set and no candidates loaded.
    pub fn to_workspace(&self) -> Workspace {
        Workspace::with_working_set(self.header.variant, self.cards.clone())
    }

    /// Store the workspace's variant and working set, keeping creation time.
    pub fn update_from(&mut self, workspace: Workspace) {
        self.header.variant = workspace.variant();
        self.cards = workspace.into_working_set();
    }

    pub fn from_workspace(workspace: Workspace) -> Self {
        let mut batch = Self::new(workspace.variant());
        batch.update_from(workspace);
        batch
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum BatchLine {
    Header(BatchHeader),
    Card(CardRecord),
}

#[derive(Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum BatchLineRef<'a> {
    Header(&'a BatchHeader),
    Card(&'a CardRecord),
}
