//! occsvo — out-of-core sparse voxel octree construction and querying
//!
//! Builds a disk-resident SVO from a sorted stream of Morton ordinals in a
//! single forward pass (after Baert, Lagae and Dutré, "Out-of-Core
//! Construction of Sparse Voxel Octrees"), then answers random-access
//! traversal and greater-or-equal face-neighbor queries against the sealed
//! file.

pub mod core;
pub mod math;
pub mod svo;
