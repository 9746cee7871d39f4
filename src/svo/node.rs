//! Octree node and its on-disk record
//!
//! Every node is persisted as one fixed-width, little-endian, 48-byte
//! record with no padding:
//!
//! - `children_base: i64` — record index of the first present child, `-1`
//!   for a leaf
//! - `children_offsets: [i32; 8]` — per-octant offset relative to
//!   `children_base`, `-1` for an absent octant
//! - `morton: u64` — the leaf's ordinal; for internal nodes the first
//!   stored child's ordinal (an occupied marker, not a position)

/// Size in bytes of one serialized node record.
pub const RECORD_SIZE: usize = 48;

/// `children_base` value marking a node with no children (a true leaf).
pub const NO_CHILDREN: i64 = -1;

/// `children_offsets` value marking an absent octant.
pub const NO_CHILD: i32 = -1;

/// Mask selecting the 63 ordinal bits of an input value; producers own the
/// top bit as an "occupied" flag and the builder strips it.
pub const ORDINAL_MASK: u64 = (1 << 63) - 1;

/// One octree node, as stored in the tree file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    /// 63-bit Morton ordinal. Meaningful only for leaves; internal nodes
    /// carry their first stored child's ordinal.
    pub morton: u64,
    /// Record index of the first present child, or [`NO_CHILDREN`].
    pub children_base: i64,
    /// Per-octant record offset relative to `children_base`, or
    /// [`NO_CHILD`]. The first present octant's offset is always 0.
    pub children_offsets: [i32; 8],
}

impl Node {
    /// Node with no data and no children.
    pub const fn empty() -> Self {
        Self {
            morton: 0,
            children_base: NO_CHILDREN,
            children_offsets: [NO_CHILD; 8],
        }
    }

    /// Leaf node carrying one ordinal.
    pub fn leaf(morton: u64) -> Self {
        Self { morton, ..Self::empty() }
    }

    /// True when the node has no children of its own.
    pub fn is_leaf(&self) -> bool {
        self.children_base == NO_CHILDREN
    }

    /// Record index of the child in `octant`, or `None` when that octant is
    /// absent. Octant indices above 7 are a caller bug.
    pub fn child_record(&self, octant: usize) -> Option<i64> {
        assert!(octant < 8, "octant index out of range: {octant}");
        if self.children_offsets[octant] == NO_CHILD {
            return None;
        }
        Some(self.children_base + self.children_offsets[octant] as i64)
    }

    /// Serialize into the fixed 48-byte little-endian record.
    pub fn encode(&self) -> [u8; RECORD_SIZE] {
        let mut buf = [0u8; RECORD_SIZE];
        buf[0..8].copy_from_slice(&self.children_base.to_le_bytes());
        for (i, offset) in self.children_offsets.iter().enumerate() {
            let at = 8 + i * 4;
            buf[at..at + 4].copy_from_slice(&offset.to_le_bytes());
        }
        buf[40..48].copy_from_slice(&self.morton.to_le_bytes());
        buf
    }

    /// Deserialize from the fixed 48-byte little-endian record.
    pub fn decode(buf: &[u8; RECORD_SIZE]) -> Self {
        let mut base = [0u8; 8];
        base.copy_from_slice(&buf[0..8]);
        let mut children_offsets = [NO_CHILD; 8];
        for (i, offset) in children_offsets.iter_mut().enumerate() {
            let at = 8 + i * 4;
            let mut raw = [0u8; 4];
            raw.copy_from_slice(&buf[at..at + 4]);
            *offset = i32::from_le_bytes(raw);
        }
        let mut morton = [0u8; 8];
        morton.copy_from_slice(&buf[40..48]);
        Self {
            morton: u64::from_le_bytes(morton),
            children_base: i64::from_le_bytes(base),
            children_offsets,
        }
    }
}

impl Default for Node {
    fn default() -> Self {
        Self::empty()
    }
}
