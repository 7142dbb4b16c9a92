use std::{
    fs::{File, OpenOptions},
    io::{self, BufRead, BufReader, Write},
    path::{Path, PathBuf},
    sync::Mutex,
};

use super::Block;

/// Append-only log of winning claims, one JSON block per line
#[derive(Debug)]
pub struct ClaimJournal {
    path: PathBuf,
    file: Mutex<File>,
}

impl ClaimJournal {
    /// Open (or create) the journal for appending
    pub fn open(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new().create(true).append(true).open(&path)?;

        Ok(Self {
            path,
            file: Mutex::new(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read every well-formed block from a journal file
    ///
    /// A missing file is an empty journal. Unparseable lines are skipped.
    pub fn load(path: impl AsRef<Path>) -> io::Result<Vec<Block>> {
        let path = path.as_ref();
        let file = match File::open(path) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e),
        };

        let mut blocks = Vec::new();
        for (line_no, line) in BufReader::new(file).lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }

            match serde_json::from_str::<Block>(&line) {
                Ok(block) => blocks.push(block),
                Err(e) => tracing::warn!(
                    "Skipping malformed journal line {} in {}: {}",
                    line_no + 1,
                    path.display(),
                    e
                ),
            }
        }

        Ok(blocks)
    }

    /// Append one block and flush it to the OS
    pub fn append(&self, block: &Block) -> io::Result<()> {
        let mut line = serde_json::to_string(block)?;
        line.push('\n');

        let mut file = self
            .file
            .lock()
            .map_err(|_| io::Error::new(io::ErrorKind::Other, "journal lock poisoned"))?;
        file.write_all(line.as_bytes())?;
        file.flush()
    }
}
