//! Greater-or-equal face-neighbor search
//!
//! Samet's neighbor-finding algorithm specialized to the six face
//! directions of an octree. Octants are indexed by axis bits matching the
//! Morton codec: bit 0 is the north/south axis (x), bit 1 up/down (y),
//! bit 2 east/west (z). Flipping a direction's axis bit pairs an octant
//! with its counterpart on the other side of that axis, both inside one
//! parent (the sibling case) and across a parent boundary (the mirrored
//! descent), so one table entry per direction covers all eight octants.

use bytemuck::{Pod, Zeroable};

use super::tree::{NodeId, SvoTree};

/// One of the six face directions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    North,
    South,
    West,
    East,
    Up,
    Down,
}

/// How a direction steps through octant space: which axis bit it moves
/// along, and whether it moves toward octants with that bit set.
struct AxisStep {
    mask: u8,
    toward_set: bool,
}

const STEPS: [AxisStep; 6] = [
    AxisStep { mask: 0b001, toward_set: true },  // North
    AxisStep { mask: 0b001, toward_set: false }, // South
    AxisStep { mask: 0b100, toward_set: false }, // West
    AxisStep { mask: 0b100, toward_set: true },  // East
    AxisStep { mask: 0b010, toward_set: true },  // Up
    AxisStep { mask: 0b010, toward_set: false }, // Down
];

impl Direction {
    /// All six directions, in face-mask bit order.
    pub const ALL: [Direction; 6] = [
        Direction::North,
        Direction::South,
        Direction::West,
        Direction::East,
        Direction::Up,
        Direction::Down,
    ];

    /// The opposing face direction.
    pub fn opposite(self) -> Direction {
        match self {
            Direction::North => Direction::South,
            Direction::South => Direction::North,
            Direction::West => Direction::East,
            Direction::East => Direction::West,
            Direction::Up => Direction::Down,
            Direction::Down => Direction::Up,
        }
    }

    /// Face-mask bit for this direction: N=1, S=2, W=4, E=8, U=16, D=32.
    pub fn mask_bit(self) -> u8 {
        1 << self as u8
    }

    fn step(self) -> &'static AxisStep {
        &STEPS[self as usize]
    }
}

/// Render-facing record for one leaf voxel: its ordinal (decoded to a 3D
/// position by the external codec) and its visible-face bits.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Pod, Zeroable)]
pub struct SurfaceVoxel {
    /// Morton ordinal of the cell.
    pub morton: u64,
    /// Visible-face bits, [`Direction::mask_bit`] per uncovered face.
    pub face_mask: u32,
    _padding: u32,
}

impl SurfaceVoxel {
    fn new(morton: u64, face_mask: u32) -> Self {
        Self {
            morton,
            face_mask,
            _padding: 0,
        }
    }
}

impl SvoTree {
    /// Neighbor of `id` in direction `dir`, at the same resolution when one
    /// exists there and otherwise the coarsest ancestor covering the
    /// adjacent region. `None` means the grid boundary or an unpopulated
    /// region; it is an expected outcome, not an error.
    pub fn neighbor(&self, id: NodeId, dir: Direction) -> Option<NodeId> {
        // the root touches every grid boundary and has no neighbors
        let parent = self.parent(id)?;
        let octant = self.octant_of(id)? as u8;
        let step = dir.step();
        // the paired octant is always the axis-bit flip: the sibling slot
        // when the step stays inside this parent, the mirrored entry slot
        // when it crosses into the adjacent one
        let paired = (octant ^ step.mask) as usize;
        if (octant & step.mask != 0) != step.toward_set {
            return self.child(parent, paired);
        }
        let ancestor = self.neighbor(parent, dir)?;
        if self.record(ancestor).is_leaf() {
            // no finer structure on the other side; the coarser node
            // covers the whole adjacent region
            return Some(ancestor);
        }
        self.child(ancestor, paired)
    }

    /// Visible-face bits for a node: a direction's bit is set when no
    /// neighbor occludes that face.
    pub fn face_mask(&self, id: NodeId) -> u8 {
        let mut mask = 0;
        for dir in Direction::ALL {
            if self.neighbor(id, dir).is_none() {
                mask |= dir.mask_bit();
            }
        }
        mask
    }

    /// Flat output for the rendering collaborator: every leaf voxel with
    /// its visible-face bits.
    pub fn surface_voxels(&self) -> Vec<SurfaceVoxel> {
        self.leaves()
            .iter()
            .map(|&id| SurfaceVoxel::new(self.record(id).morton, self.face_mask(id) as u32))
            .collect()
    }
}
