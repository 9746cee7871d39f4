//! Random-access reader for sealed octree files
//!
//! The navigator never scans the file: the root is decoded from the fixed
//! position at the end, and every other node is reached by seeking to
//! `children_base + children_offsets[octant]` records.

use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;

use crate::core::error::{Error, Result};

use super::builder::{header_path, max_depth_for, svo_path};
use super::node::{Node, RECORD_SIZE};
use super::tree::{NodeId, SvoTree};

/// Reader over one sealed tree file.
///
/// Reads are blocking and go through this handle's cursor; give each thread
/// its own reader. The file is immutable once sealed, so no locking is
/// needed beyond that.
pub struct SvoReader {
    file: File,
    grid_size: u64,
    max_depth: usize,
    records: u64,
}

impl SvoReader {
    /// Open `<dir>/<name>_Svo.bin` together with its sidecar header.
    pub fn open(dir: &Path, name: &str) -> Result<Self> {
        let grid_size = read_header(&header_path(dir, name))?;
        let path = svo_path(dir, name);
        let file = File::open(&path)?;
        let len = file.metadata()?.len();
        if len == 0 || len % RECORD_SIZE as u64 != 0 {
            return Err(Error::Corrupt(format!(
                "{}: length {len} is not a positive multiple of {RECORD_SIZE}",
                path.display()
            )));
        }
        let max_depth = max_depth_for(grid_size);
        let records = len / RECORD_SIZE as u64;
        log::debug!("opened '{name}': {records} records, grid_size={grid_size} max_depth={max_depth}");
        Ok(Self {
            file,
            grid_size,
            max_depth,
            records,
        })
    }

    /// Total cell count of the grid, from the sidecar header.
    pub fn grid_size(&self) -> u64 {
        self.grid_size
    }

    /// Tree depth, recomputed exactly as the builder computed it.
    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Number of records in the file.
    pub fn record_count(&self) -> u64 {
        self.records
    }

    /// The root node: by contract the file's last record, the only position
    /// not reached through an offset chain.
    pub fn root(&mut self) -> Result<Node> {
        self.read_record(self.records - 1)
    }

    /// Child of `node` in the given octant, or `None` when that octant is
    /// absent. Octant indices above 7 are a caller bug and panic.
    pub fn child(&mut self, node: &Node, octant: usize) -> Result<Option<Node>> {
        match node.child_record(octant) {
            Some(index) if index < 0 => Err(Error::Corrupt(format!(
                "negative child record index {index}"
            ))),
            Some(index) => Ok(Some(self.read_record(index as u64)?)),
            None => Ok(None),
        }
    }

    /// Materialize the whole tree into an arena with parent back-links and
    /// the flat leaf list, the form the neighbor search operates on.
    pub fn collect_tree(&mut self) -> Result<SvoTree> {
        let root = self.root()?;
        let mut tree = SvoTree::with_root(root);
        self.collect_children(&mut tree, SvoTree::ROOT)?;
        log::debug!(
            "materialized tree: {} nodes, {} leaves",
            tree.node_count(),
            tree.leaf_count()
        );
        Ok(tree)
    }

    fn collect_children(&mut self, tree: &mut SvoTree, parent: NodeId) -> Result<()> {
        let parent_record = tree.record(parent).clone();
        for octant in 0..8 {
            let Some(child) = self.child(&parent_record, octant)? else {
                continue;
            };
            let descend = !child.is_leaf();
            let id = tree.attach(parent, octant, child);
            if descend {
                self.collect_children(tree, id)?;
            }
        }
        Ok(())
    }

    fn read_record(&mut self, index: u64) -> Result<Node> {
        if index >= self.records {
            return Err(Error::Corrupt(format!(
                "record {index} out of bounds ({} records)",
                self.records
            )));
        }
        self.file.seek(SeekFrom::Start(index * RECORD_SIZE as u64))?;
        let mut buf = [0u8; RECORD_SIZE];
        self.file.read_exact(&mut buf)?;
        Ok(Node::decode(&buf))
    }
}

/// Parse the sidecar header: a single line of the form `GridSize <integer>`.
fn read_header(path: &Path) -> Result<u64> {
    let text = std::fs::read_to_string(path)?;
    let line = text.lines().next().unwrap_or("");
    let value = line.strip_prefix("GridSize ").ok_or_else(|| {
        Error::Header(format!("missing 'GridSize ' prefix in {}", path.display()))
    })?;
    value
        .trim()
        .parse::<u64>()
        .map_err(|e| Error::Header(format!("bad GridSize value '{value}': {e}")))
}
