//! Append-only node record writer

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::core::error::Result;

use super::node::Node;

/// Serializes nodes as fixed-size records appended to the tree file.
///
/// Records are written strictly in finalization order and never rewritten;
/// the returned indices are what child offsets in parent records refer to.
pub struct RecordWriter {
    out: BufWriter<File>,
    written: u64,
}

impl RecordWriter {
    /// Create (or truncate) the tree file at `path`.
    pub fn create(path: &Path) -> Result<Self> {
        let file = File::create(path)?;
        Ok(Self {
            out: BufWriter::new(file),
            written: 0,
        })
    }

    /// Record index the next `append` will occupy.
    pub fn position(&self) -> u64 {
        self.written
    }

    /// Append one record, returning its index in the file.
    pub fn append(&mut self, node: &Node) -> Result<u64> {
        let index = self.written;
        self.out.write_all(&node.encode())?;
        self.written += 1;
        Ok(index)
    }

    /// Flush everything to disk and return the total record count.
    pub fn finish(mut self) -> Result<u64> {
        self.out.flush()?;
        Ok(self.written)
    }
}
