//! Morton encoding (Z-order curve) for voxel grid ordinals
//!
//! This is the codec side of the pipeline: voxel producers interleave grid
//! coordinates into 63-bit ordinals before streaming them to the builder,
//! and renderers decode leaf ordinals back into positions. The `svo` modules
//! treat ordinals as opaque and never call into here.

use crate::core::error::{Error, Result};

/// Largest coordinate value per axis: 21 bits each of x, y and z fit in the
/// 63 ordinal bits.
pub const MAX_AXIS: u32 = (1 << 21) - 1;

/// Bit 63, set by voxel producers to flag a cell as occupied. Not part of
/// the ordinal; the builder strips it on input.
pub const FILL_BIT: u64 = 1 << 63;

/// Mask selecting the 63 ordinal bits.
pub const ORDINAL_MASK: u64 = FILL_BIT - 1;

/// Spread the 21 low bits of `x` into every third bit of a 64-bit integer
fn spread_bits(x: u32) -> u64 {
    let mut x = x as u64 & 0x1fffff;
    x = (x | (x << 32)) & 0x1f00000000ffff;
    x = (x | (x << 16)) & 0x1f0000ff0000ff;
    x = (x | (x << 8)) & 0x100f00f00f00f00f;
    x = (x | (x << 4)) & 0x10c30c30c30c30c3;
    x = (x | (x << 2)) & 0x1249249249249249;
    x
}

/// Compact every third bit of a 64-bit integer back into 21 bits
fn compact_bits(x: u64) -> u32 {
    let mut x = x & 0x1249249249249249;
    x = (x | (x >> 2)) & 0x10c30c30c30c30c3;
    x = (x | (x >> 4)) & 0x100f00f00f00f00f;
    x = (x | (x >> 8)) & 0x1f0000ff0000ff;
    x = (x | (x >> 16)) & 0x1f00000000ffff;
    x = (x | (x >> 32)) & 0x1fffff;
    x as u32
}

/// Encode 3D grid coordinates into a Morton ordinal. Coordinates above 21
/// bits are truncated; use [`try_encode`] when the input is not trusted.
pub fn encode(x: u32, y: u32, z: u32) -> u64 {
    spread_bits(x) | (spread_bits(y) << 1) | (spread_bits(z) << 2)
}

/// Encode 3D grid coordinates, rejecting any coordinate above [`MAX_AXIS`].
///
/// The octree builder cannot detect oversized ordinals itself; they must be
/// rejected here, upstream of it.
pub fn try_encode(x: u32, y: u32, z: u32) -> Result<u64> {
    if x > MAX_AXIS || y > MAX_AXIS || z > MAX_AXIS {
        return Err(Error::Encode(format!(
            "coordinate ({x}, {y}, {z}) exceeds {MAX_AXIS} (21 bits per axis)"
        )));
    }
    Ok(encode(x, y, z))
}

/// Decode a Morton ordinal back to 3D grid coordinates. The fill bit, if
/// still present, is ignored.
pub fn decode(ordinal: u64) -> (u32, u32, u32) {
    let ordinal = ordinal & ORDINAL_MASK;
    (
        compact_bits(ordinal),
        compact_bits(ordinal >> 1),
        compact_bits(ordinal >> 2),
    )
}

/// Sentinel ordinal a voxelizer emits for cells outside the mesh bounds:
/// the encoded far corner of the bounding cube, one past the grid in every
/// axis. The builder skips it rather than treating it as data.
pub fn ignore_ordinal(bound_extent: u32) -> u64 {
    encode(bound_extent, bound_extent, bound_extent)
}
