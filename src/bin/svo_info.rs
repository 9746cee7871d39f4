//! SVO inspection binary — builds a test shape and dumps tree stats.
//!
//! Usage: cargo run --release --bin svo_info -- [OPTIONS]
//!
//! Options:
//!   --dir <DIR>     Data directory (default: "assets/svo")
//!   --name <NAME>   Object name (default: "sphere")
//!   --edge <N>      Voxelize a test sphere on an NxNxN grid and (re)build
//!                   <name> before inspecting; N must be a power of two
//!                   (default: only inspect an existing tree)
//!
//! Output files:
//!   <dir>/<name>_Svo.bin      # node records, root last
//!   <dir>/<name>_Header.txt   # "GridSize <n>"

use std::path::PathBuf;
use std::time::Instant;

use occsvo::core::error::{Error, Result};
use occsvo::math::morton;
use occsvo::svo::{SvoBuilder, SvoReader};

fn sphere_ordinals(edge: u32) -> Result<Vec<u64>> {
    let center = (edge as f32 - 1.0) / 2.0;
    let radius = edge as f32 / 2.0 - 0.5;
    let mut raw = Vec::new();
    for z in 0..edge {
        for y in 0..edge {
            for x in 0..edge {
                let dx = x as f32 - center;
                let dy = y as f32 - center;
                let dz = z as f32 - center;
                if dx * dx + dy * dy + dz * dz <= radius * radius {
                    raw.push(morton::try_encode(x, y, z)? | morton::FILL_BIT);
                }
            }
        }
    }
    raw.sort_unstable();
    Ok(raw)
}

fn main() -> Result<()> {
    occsvo::core::logging::init();

    let mut dir = PathBuf::from("assets/svo");
    let mut name = String::from("sphere");
    let mut edge: Option<u32> = None;

    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        let mut value = |flag: &str| {
            args.next()
                .ok_or_else(|| Error::Build(format!("{flag} needs a value")))
        };
        match arg.as_str() {
            "--dir" => dir = PathBuf::from(value("--dir")?),
            "--name" => name = value("--name")?,
            "--edge" => {
                edge = Some(value("--edge")?.parse().map_err(|e| {
                    Error::Build(format!("bad --edge value: {e}"))
                })?)
            }
            other => return Err(Error::Build(format!("unknown option {other}"))),
        }
    }

    if let Some(edge) = edge {
        std::fs::create_dir_all(&dir)?;
        let raw = sphere_ordinals(edge)?;
        let grid_size = (edge as u64).pow(3);
        let started = Instant::now();
        let records = SvoBuilder::construct(
            &dir,
            &name,
            grid_size,
            morton::ignore_ordinal(edge),
            raw.iter().copied(),
        )?;
        log::info!(
            "built '{name}': {} voxels -> {records} records in {:.1?}",
            raw.len(),
            started.elapsed()
        );
    }

    let started = Instant::now();
    let mut reader = SvoReader::open(&dir, &name)?;
    let tree = reader.collect_tree()?;
    let surface = tree.surface_voxels();
    let visible = surface.iter().filter(|v| v.face_mask != 0).count();

    log::info!(
        "'{name}': grid_size={} max_depth={} records={}",
        reader.grid_size(),
        reader.max_depth(),
        reader.record_count()
    );
    log::info!(
        "materialized {} nodes, {} leaves ({visible} on the surface), in {:.1?}",
        tree.node_count(),
        tree.leaf_count(),
        started.elapsed()
    );

    Ok(())
}
