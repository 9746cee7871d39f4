//! Disk-resident sparse voxel octree
//!
//! Construction writes fixed-size node records in one forward pass
//! ([`builder`]), the navigator resolves children by record offset
//! arithmetic ([`parser`]), and face-neighbor queries run over the
//! materialized tree ([`tree`], [`neighbor`]).

pub mod builder;
pub mod neighbor;
pub mod node;
pub mod parser;
pub mod tree;
pub mod writer;

pub use builder::SvoBuilder;
pub use neighbor::{Direction, SurfaceVoxel};
pub use node::Node;
pub use parser::SvoReader;
pub use tree::{NodeId, SvoTree};
pub use writer::RecordWriter;
