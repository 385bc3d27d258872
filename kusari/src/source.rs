//! Statement sources.
//!
//! A [`ScriptSource`] yields raw statement lines one at a time. Blank lines
//! and `#` comment lines are not statements and are skipped by every
//! source. [`FileSource`] streams a script file; [`MemorySource`] wraps
//! in-memory text for `-c` snippets and tests.

use std::fmt;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

/// Error reading from a source.
#[derive(Debug)]
pub enum SourceError {
    Io(io::Error),
}

impl fmt::Display for SourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceError::Io(err) => write!(f, "source read failed: {err}"),
        }
    }
}

impl std::error::Error for SourceError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SourceError::Io(err) => Some(err),
        }
    }
}

impl From<io::Error> for SourceError {
    fn from(err: io::Error) -> SourceError {
        SourceError::Io(err)
    }
}

fn is_statement(line: &str) -> bool {
    let trimmed = line.trim();
    !trimmed.is_empty() && !trimmed.starts_with('#')
}

/// Yields statement lines until exhausted.
pub trait ScriptSource {
    fn next_statement(&mut self) -> Result<Option<String>, SourceError>;
}

/// Line-buffered file reader.
#[derive(Debug)]
pub struct FileSource {
    reader: BufReader<File>,
}

impl FileSource {
    pub fn open(path: impl AsRef<Path>) -> Result<FileSource, SourceError> {
        let file = File::open(path)?;
        Ok(FileSource {
            reader: BufReader::new(file),
        })
    }
}

impl ScriptSource for FileSource {
    fn next_statement(&mut self) -> Result<Option<String>, SourceError> {
        loop {
            let mut line = String::new();
            if self.reader.read_line(&mut line)? == 0 {
                return Ok(None);
            }
            let line = line.trim_end_matches(['\n', '\r']);
            if is_statement(line) {
                return Ok(Some(line.to_string()));
            }
        }
    }
}

/// In-memory text treated as a script.
pub struct MemorySource {
    lines: std::vec::IntoIter<String>,
}

impl MemorySource {
    pub fn new(text: &str) -> MemorySource {
        let lines: Vec<String> = text.lines().map(str::to_string).collect();
        MemorySource {
            lines: lines.into_iter(),
        }
    }
}

impl ScriptSource for MemorySource {
    fn next_statement(&mut self) -> Result<Option<String>, SourceError> {
        for line in self.lines.by_ref() {
            if is_statement(&line) {
                return Ok(Some(line));
            }
        }
        Ok(None)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
