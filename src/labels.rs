use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::error::DetectError;

/// Ordered tag names for the loaded model.
///
/// The position in the table is the authoritative mapping from a model class
/// index to its human-readable tag. A class index the table cannot resolve is
/// a model/label asset mismatch, never papered over with a placeholder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelTable {
    labels: Vec<String>,
}

impl LabelTable {
    /// Read a newline-delimited label file, one tag per line.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, DetectError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| DetectError::ModelLoad {
            reason: format!("cannot open label file {}: {e}", path.display()),
        })?;

        let mut labels = Vec::new();
        for line in BufReader::new(file).lines() {
            let line = line.map_err(|e| DetectError::ModelLoad {
                reason: format!("cannot read label file {}: {e}", path.display()),
            })?;
            labels.push(line.trim().to_string());
        }
        Ok(Self { labels })
    }

    pub fn from_lines(lines: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            labels: lines.into_iter().map(Into::into).collect(),
        }
    }

    /// Resolve a class index as emitted by the graph to its tag name.
    pub fn resolve(&self, index: i64) -> Result<&str, DetectError> {
        usize::try_from(index)
            .ok()
            .and_then(|i| self.labels.get(i))
            .map(String::as_str)
            .ok_or(DetectError::LabelIndexOutOfRange {
                index,
                len: self.labels.len(),
            })
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}
