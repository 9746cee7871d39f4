//! Streaming bottom-up octree construction
//!
//! Consumes an ascending stream of Morton ordinals over a cubic grid and
//! serializes the tree in a single forward pass: leaves enter per-depth
//! buffers, full groups of 8 are written out and replaced by their parent
//! one level up, and gaps between consecutive ordinals are covered by
//! placeholder subtrees that never reach the file. The root is always the
//! file's last record.

use std::path::{Path, PathBuf};

use crate::core::error::{Error, Result};

use super::node::{Node, ORDINAL_MASK};
use super::writer::RecordWriter;

/// Tree depth for a grid of `grid_size` unit cells: `ceil(log8) + 1`.
/// The reader must compute the same value from the sidecar header.
pub fn max_depth_for(grid_size: u64) -> usize {
    let mut depth = 0;
    let mut covered = 1u64;
    while covered < grid_size {
        covered *= 8;
        depth += 1;
    }
    depth + 1
}

/// Path of the tree binary for an object name.
pub fn svo_path(dir: &Path, name: &str) -> PathBuf {
    dir.join(format!("{name}_Svo.bin"))
}

/// Path of the sidecar header for an object name.
pub fn header_path(dir: &Path, name: &str) -> PathBuf {
    dir.join(format!("{name}_Header.txt"))
}

/// Streaming octree builder.
///
/// One buffer per depth holds the group of at most 8 nodes currently being
/// assembled at that level; `None` entries are collapsed empty subtrees.
/// Construction is single-threaded and write-once: feed ordinals through
/// [`push`](Self::push) in strictly ascending order, then [`seal`](Self::seal).
pub struct SvoBuilder {
    name: String,
    grid_size: u64,
    max_depth: usize,
    ignore_morton: u64,
    buffers: Vec<Vec<Option<Node>>>,
    writer: RecordWriter,
    header_path: PathBuf,
    /// Next ordinal expected if the stream has no gap.
    current_morton: u64,
}

impl SvoBuilder {
    /// Open `<dir>/<name>_Svo.bin` for writing and set up the depth buffers.
    ///
    /// `grid_size` is the total cell count of the cubic grid and must be a
    /// power of 8 (a power-of-two edge length, cubed). `ignore_morton` is
    /// the producer's out-of-bounds sentinel; matching ordinals are skipped.
    pub fn create(dir: &Path, name: &str, grid_size: u64, ignore_morton: u64) -> Result<Self> {
        if grid_size == 0 || !grid_size.is_power_of_two() || grid_size.trailing_zeros() % 3 != 0 {
            return Err(Error::Build(format!(
                "grid size {grid_size} is not a power-of-two edge length cubed"
            )));
        }
        let max_depth = max_depth_for(grid_size);
        let writer = RecordWriter::create(&svo_path(dir, name))?;
        log::debug!("building '{name}': grid_size={grid_size} max_depth={max_depth}");
        Ok(Self {
            name: name.to_string(),
            grid_size,
            max_depth,
            ignore_morton,
            buffers: (0..max_depth).map(|_| Vec::with_capacity(8)).collect(),
            writer,
            header_path: header_path(dir, name),
            current_morton: 0,
        })
    }

    /// Total cell count of the grid.
    pub fn grid_size(&self) -> u64 {
        self.grid_size
    }

    /// Tree depth, identical to the reader's computation.
    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Next ordinal the builder expects (leaf slots covered so far).
    pub fn current_morton(&self) -> u64 {
        self.current_morton
    }

    /// Feed one raw 64-bit value from the producer.
    ///
    /// A raw zero (an unfilled producer slot) and the ignore sentinel are
    /// skipped; everything else is masked to its 63 ordinal bits. Ordinals
    /// must arrive strictly ascending and inside the grid; violations are
    /// fatal, the file cannot be repaired afterwards.
    pub fn push(&mut self, raw: u64) -> Result<()> {
        if raw == 0 {
            return Ok(());
        }
        let ordinal = raw & ORDINAL_MASK;
        if ordinal == self.ignore_morton {
            return Ok(());
        }
        if ordinal < self.current_morton {
            return Err(Error::Build(format!(
                "ordinal {ordinal} arrived after {}; input must be strictly ascending",
                self.current_morton
            )));
        }
        if ordinal >= self.grid_size {
            return Err(Error::Build(format!(
                "ordinal {ordinal} outside grid of {} cells",
                self.grid_size
            )));
        }
        if self.current_morton != ordinal {
            self.fill_empty(ordinal - self.current_morton)?;
        }
        self.buffers[self.max_depth - 1].push(Some(Node::leaf(ordinal)));
        self.refine(self.max_depth - 1)?;
        self.current_morton += 1;
        Ok(())
    }

    /// Feed a whole stream of raw values.
    pub fn push_all(&mut self, raw: impl IntoIterator<Item = u64>) -> Result<()> {
        for value in raw {
            self.push(value)?;
        }
        Ok(())
    }

    /// Cover the remainder of the grid with empty subtrees, write the root
    /// as the final record, write the sidecar header and flush.
    ///
    /// Returns the total record count (the root's index plus one).
    pub fn seal(mut self) -> Result<u64> {
        if self.current_morton < self.grid_size {
            let remainder = self.grid_size - self.current_morton;
            self.fill_empty(remainder)?;
        }
        let root = match self.buffers[0].pop() {
            Some(Some(node)) => node,
            // a grid with no data at all still gets its root record
            Some(None) => Node::empty(),
            None => return Err(Error::Build("sealing produced no root".into())),
        };
        debug_assert!(self.buffers.iter().all(Vec::is_empty));
        self.writer.append(&root)?;
        let records = self.writer.finish()?;
        std::fs::write(&self.header_path, format!("GridSize {}", self.grid_size))?;
        log::info!(
            "sealed '{}': {} records, grid_size {}",
            self.name,
            records,
            self.grid_size
        );
        Ok(records)
    }

    /// Build and seal a tree in one call.
    pub fn construct(
        dir: &Path,
        name: &str,
        grid_size: u64,
        ignore_morton: u64,
        raw: impl IntoIterator<Item = u64>,
    ) -> Result<u64> {
        let mut builder = Self::create(dir, name, grid_size, ignore_morton)?;
        builder.push_all(raw)?;
        builder.seal()
    }

    /// Cover a gap of `amount` leaf slots with empty placeholders, one
    /// subtree at a time: always the coarsest depth whose full subtree fits
    /// the remaining gap, but never coarser than the deepest buffer that
    /// already holds entries (its group must complete first).
    fn fill_empty(&mut self, amount: u64) -> Result<()> {
        let mut remaining = amount;
        while remaining > 0 {
            let depth = (self.max_depth - 1 - log8_floor(remaining)).max(self.deepest_filled());
            self.buffers[depth].push(None);
            self.refine(depth)?;
            let covered = 8u64.pow((self.max_depth - depth - 1) as u32);
            self.current_morton += covered;
            remaining -= covered;
        }
        Ok(())
    }

    /// Deepest buffer currently holding entries, 0 when all are empty.
    fn deepest_filled(&self) -> usize {
        (0..self.max_depth)
            .rev()
            .find(|&depth| !self.buffers[depth].is_empty())
            .unwrap_or(0)
    }

    /// Collapse full buffers upward: a completed group of 8 becomes one
    /// parent entry a level up, which may complete that level in turn.
    fn refine(&mut self, start: usize) -> Result<()> {
        for depth in (1..=start).rev() {
            if self.buffers[depth].len() < 8 {
                break;
            }
            let group = std::mem::replace(&mut self.buffers[depth], Vec::with_capacity(8));
            let parent = self.group_nodes(group)?;
            self.buffers[depth - 1].push(parent);
        }
        Ok(())
    }

    /// Serialize the present members of a completed group in octant order
    /// and return their parent, or `None` when every octant is empty (the
    /// whole group collapses and nothing reaches the file).
    fn group_nodes(&mut self, group: Vec<Option<Node>>) -> Result<Option<Node>> {
        debug_assert_eq!(group.len(), 8);
        let mut parent = Node::empty();
        let mut first_stored = true;
        for (octant, child) in group.into_iter().enumerate() {
            let Some(child) = child else { continue };
            let index = self.writer.append(&child)?;
            if first_stored {
                parent.children_base = index as i64;
                // the format stores the first child's ordinal on the parent
                // as its occupied marker
                parent.morton = child.morton;
                first_stored = false;
            }
            parent.children_offsets[octant] = (index as i64 - parent.children_base) as i32;
        }
        Ok(if first_stored { None } else { Some(parent) })
    }
}

/// `floor(log8 n)` for `n > 0`.
fn log8_floor(n: u64) -> usize {
    debug_assert!(n > 0);
    (63 - n.leading_zeros() as usize) / 3
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::morton::FILL_BIT;
    use crate::svo::node::{NO_CHILD, RECORD_SIZE};
    use crate::svo::parser::SvoReader;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    use std::collections::BTreeSet;

    // The producer sets the fill bit on every occupied cell; without it a
    // raw value of 0 reads as an unfilled slot.
    fn raw(ordinals: &[u64]) -> Vec<u64> {
        ordinals.iter().map(|&m| m | FILL_BIT).collect()
    }

    fn build(dir: &Path, name: &str, grid_size: u64, ordinals: &[u64]) -> u64 {
        SvoBuilder::construct(dir, name, grid_size, u64::MAX, raw(ordinals)).expect("construct")
    }

    fn leaf_set(dir: &Path, name: &str) -> BTreeSet<u64> {
        let mut reader = SvoReader::open(dir, name).expect("open");
        let tree = reader.collect_tree().expect("collect");
        tree.leaves()
            .iter()
            .map(|&id| tree.record(id).morton)
            .collect()
    }

    #[test]
    fn test_max_depth_matches_grid() {
        assert_eq!(max_depth_for(1), 1);
        assert_eq!(max_depth_for(8), 2);
        assert_eq!(max_depth_for(64), 3);
        assert_eq!(max_depth_for(512), 4);
    }

    #[test]
    fn test_full_octant_grid8() {
        let dir = tempfile::tempdir().expect("tempdir");
        let records = build(dir.path(), "full", 8, &[0, 1, 2, 3, 4, 5, 6, 7]);
        // 8 leaves plus the root, which is their parent
        assert_eq!(records, 9);

        let mut reader = SvoReader::open(dir.path(), "full").expect("open");
        let root = reader.root().expect("root");
        assert_eq!(root.children_base, 0);
        for octant in 0..8 {
            assert_eq!(root.children_offsets[octant], octant as i32);
        }
        assert_eq!(
            leaf_set(dir.path(), "full"),
            (0..8).collect::<BTreeSet<u64>>()
        );
    }

    #[test]
    fn test_sparse_pair_grid8() {
        let dir = tempfile::tempdir().expect("tempdir");
        // gap fill synthesizes placeholders for ordinals 1..=6; none of them
        // reach the file
        let records = build(dir.path(), "pair", 8, &[0, 7]);
        assert_eq!(records, 3);

        let mut reader = SvoReader::open(dir.path(), "pair").expect("open");
        let root = reader.root().expect("root");
        assert_eq!(root.children_base, 0);
        assert_eq!(root.children_offsets[0], 0);
        assert_eq!(root.children_offsets[7], 1);
        let absent = root
            .children_offsets
            .iter()
            .filter(|&&off| off == NO_CHILD)
            .count();
        assert_eq!(absent, 6);
        assert_eq!(leaf_set(dir.path(), "pair"), BTreeSet::from([0, 7]));
    }

    #[test]
    fn test_roundtrip_exhaustive_grid8() {
        let dir = tempfile::tempdir().expect("tempdir");
        for subset in 1u32..256 {
            let ordinals: Vec<u64> = (0..8).filter(|&m| subset & (1 << m) != 0).collect();
            build(dir.path(), "subset", 8, &ordinals);
            assert_eq!(
                leaf_set(dir.path(), "subset"),
                ordinals.iter().copied().collect::<BTreeSet<u64>>(),
                "subset {subset:#010b}"
            );
        }
    }

    #[test]
    fn test_roundtrip_random_grid512() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut rng = StdRng::seed_from_u64(12345);
        for round in 0..20 {
            let density = rng.random_range(1..=512);
            let ordinals: Vec<u64> = (0..512)
                .filter(|_| rng.random_range(0..512) < density)
                .collect();
            build(dir.path(), "rand", 512, &ordinals);
            assert_eq!(
                leaf_set(dir.path(), "rand"),
                ordinals.iter().copied().collect::<BTreeSet<u64>>(),
                "round {round}"
            );
        }
    }

    #[test]
    fn test_gap_accounting_covers_grid() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut builder = SvoBuilder::create(dir.path(), "gaps", 512, u64::MAX).expect("create");
        builder.push_all(raw(&[3, 64, 200, 511])).expect("push");
        // every leaf slot up to and including the last ordinal is accounted for
        assert_eq!(builder.current_morton(), 512);
        builder.seal().expect("seal");
    }

    #[test]
    fn test_collapse_writes_no_empty_records() {
        let dir = tempfile::tempdir().expect("tempdir");
        // one voxel at the far corner of a 4x4x4 grid: exactly one node per
        // level, no placeholder ever serialized
        let records = build(dir.path(), "corner", 64, &[63]);
        assert_eq!(records, 3);

        let bytes = std::fs::read(svo_path(dir.path(), "corner")).expect("read");
        for chunk in bytes.chunks_exact(RECORD_SIZE) {
            let mut buf = [0u8; RECORD_SIZE];
            buf.copy_from_slice(chunk);
            let node = Node::decode(&buf);
            assert!(
                node.morton != 0 || !node.is_leaf(),
                "empty placeholder reached the file: {node:?}"
            );
        }
    }

    #[test]
    fn test_empty_grid_still_has_root() {
        let dir = tempfile::tempdir().expect("tempdir");
        let records = build(dir.path(), "void", 64, &[]);
        assert_eq!(records, 1);

        let mut reader = SvoReader::open(dir.path(), "void").expect("open");
        let root = reader.root().expect("root");
        assert!(root.is_leaf());
        let tree = reader.collect_tree().expect("collect");
        assert!(tree.leaves().is_empty());
    }

    #[test]
    fn test_sentinel_and_unfilled_slots_skipped() {
        let dir = tempfile::tempdir().expect("tempdir");
        let ignore = 77u64;
        let mut builder = SvoBuilder::create(dir.path(), "skip", 512, ignore).expect("create");
        builder
            .push_all([0, 5 | FILL_BIT, ignore | FILL_BIT, 300 | FILL_BIT])
            .expect("push");
        builder.seal().expect("seal");
        assert_eq!(leaf_set(dir.path(), "skip"), BTreeSet::from([5, 300]));
    }

    #[test]
    fn test_out_of_order_is_fatal() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut builder = SvoBuilder::create(dir.path(), "order", 64, u64::MAX).expect("create");
        builder.push(9 | FILL_BIT).expect("push");
        assert!(matches!(builder.push(4 | FILL_BIT), Err(Error::Build(_))));
    }

    #[test]
    fn test_duplicate_is_fatal() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut builder = SvoBuilder::create(dir.path(), "dup", 64, u64::MAX).expect("create");
        builder.push(9 | FILL_BIT).expect("push");
        assert!(matches!(builder.push(9 | FILL_BIT), Err(Error::Build(_))));
    }

    #[test]
    fn test_ordinal_outside_grid_is_fatal() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut builder = SvoBuilder::create(dir.path(), "bounds", 64, u64::MAX).expect("create");
        assert!(matches!(builder.push(64 | FILL_BIT), Err(Error::Build(_))));
    }

    #[test]
    fn test_bad_grid_size_rejected() {
        let dir = tempfile::tempdir().expect("tempdir");
        for grid_size in [0u64, 7, 16, 100] {
            assert!(
                SvoBuilder::create(dir.path(), "bad", grid_size, u64::MAX).is_err(),
                "grid_size {grid_size}"
            );
        }
    }

    #[test]
    fn test_origin_voxel_survives() {
        // ordinal 0 is valid data when the producer's fill bit is set
        let dir = tempfile::tempdir().expect("tempdir");
        build(dir.path(), "origin", 64, &[0]);
        assert_eq!(leaf_set(dir.path(), "origin"), BTreeSet::from([0]));
    }

    #[test]
    fn test_header_contents() {
        let dir = tempfile::tempdir().expect("tempdir");
        build(dir.path(), "hdr", 512, &[1, 2]);
        let text = std::fs::read_to_string(header_path(dir.path(), "hdr")).expect("read");
        assert_eq!(text, "GridSize 512");
    }
}
