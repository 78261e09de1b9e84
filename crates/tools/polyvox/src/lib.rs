//! Polyvox - dense voxel grid to MagicaVoxel converter
//!
//! The last stage of the text-to-voxel pipeline. A mesh rasterizer writes a
//! dense grid dump (every cell stored, palette indexed, 6-bit colors); this
//! crate turns that dump into a MagicaVoxel `.vox` file (sparse voxel list,
//! RGBA palette) that standard voxel tools can open.
//!
//! ## Architecture
//!
//! ```text
//! Text Prompt
//!     ↓ build_prompt() → text-to-image model (external)
//! Image
//!     ↓ image-to-3D model (external)
//! Textured mesh (.glb)
//!     ↓ glb2vox.sh at 96/80/64 (or 64/48/32)
//! Dense grid dump
//!     ↓ SourceVoxelGrid::parse()
//!     ↓ convert::grid_to_vox()
//! VoxModel → MAIN { SIZE, XYZI, RGBA }
//! ```
//!
//! ## Quick Start
//!
//! ```no_run
//! use polyvox::convert_file;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let summary = convert_file("mesh_large.raw", "dragon_large.vox")?;
//!     println!("Wrote {} voxels", summary.voxel_count);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod convert;
pub mod grid;
pub mod pipeline;
pub mod types;
pub mod vox;

// Re-export main types for convenience
pub use config::PipelineConfig;
pub use convert::{
    build_palette, convert, convert_bytes, convert_file, extract_voxels, grid_to_vox,
    ConversionSummary,
};
pub use grid::{Cell, SourceVoxelGrid};
pub use pipeline::{build_prompt, to_snake_case, DetailLevel, Pipeline, PipelineOutput};
pub use types::{PolyvoxError, Result};
pub use vox::{Rgba, VoxModel, VoxSummary, Voxel};
