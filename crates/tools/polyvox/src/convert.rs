//! Dense grid dump to MagicaVoxel `.vox` conversion
//!
//! ## Coordinate System
//!
//! Grid cells are visited z outermost, then y, then x. Every occupied cell at
//! `(x, y, z)` is first shifted one voxel along y and z, then y and z are
//! flipped against the grid extent:
//!
//! ```text
//! vox.x = x
//! vox.y = y_size - (y + 1)
//! vox.z = z_size - (z + 1)
//! ```
//!
//! ## Palette
//!
//! Source entries 1-254 hold 6-bit channels and are scaled by 4 into slots
//! 1-254 with full alpha. Interior cells (value 0) are written with color
//! index 255, whose slot is fully transparent. The trailing slot is padding
//! and is transparent as well.

use crate::grid::{Cell, SourceVoxelGrid};
use crate::types::{PolyvoxError, Result, INTERIOR_COLOR_INDEX, PALETTE_ENTRIES};
use crate::vox::{Palette, Rgba, VoxModel, Voxel};
use glam::IVec3;
use serde::Serialize;
use std::fs;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

/// Scale factor from 6-bit source channels to 8-bit `.vox` channels
pub const CHANNEL_SCALE: u8 = 4;

/// Outcome of a file conversion
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConversionSummary {
    /// Grid size written to the `SIZE` chunk as `[x, y, z]`
    pub size: [i32; 3],
    /// Number of voxels in the `XYZI` chunk
    pub voxel_count: usize,
    /// Number of voxels that came from interior cells
    pub interior_count: usize,
    /// Size of the written `.vox` file
    pub bytes_written: usize,
}

/// Map a grid position into `.vox` space
///
/// Shift first, then flip against the extent. Only called with positions
/// inside a parsed grid, whose axes are at most 256, so each result fits in
/// a byte.
#[inline]
pub(crate) fn remap_position(x: usize, y: usize, z: usize, dims: IVec3) -> (u8, u8, u8) {
    let shifted_y = y + 1;
    let shifted_z = z + 1;
    (
        x as u8,
        (dims.y as usize - shifted_y) as u8,
        (dims.z as usize - shifted_z) as u8,
    )
}

/// Color index written for a cell, or `None` for empty cells
#[inline]
pub fn color_index(cell: Cell) -> Option<u8> {
    match cell {
        Cell::Empty => None,
        Cell::Interior => Some(INTERIOR_COLOR_INDEX),
        Cell::Surface(index) => Some(index),
    }
}

/// Collect every occupied cell as a `.vox` voxel in grid walk order
pub fn extract_voxels(grid: &SourceVoxelGrid) -> Vec<Voxel> {
    let dims = grid.dims();
    let (xs, ys, zs) = (dims.x as usize, dims.y as usize, dims.z as usize);
    let mut voxels = Vec::with_capacity(grid.occupied_count());

    for z in 0..zs {
        for y in 0..ys {
            for x in 0..xs {
                if let Some(i) = color_index(grid.cell(x, y, z)) {
                    let (vx, vy, vz) = remap_position(x, y, z, dims);
                    voxels.push(Voxel::new(vx, vy, vz, i));
                }
            }
        }
    }

    voxels
}

/// Build the 256-entry RGBA palette from the grid's RGB palette
///
/// Fails with [`PolyvoxError::PaletteOverflow`] if a used channel is above 63.
pub fn build_palette(grid: &SourceVoxelGrid) -> Result<Palette> {
    let source = grid.palette();
    let mut palette = [Rgba::TRANSPARENT; PALETTE_ENTRIES];

    // .vox slot n lives at offset n - 1 in the RGBA chunk
    for index in 1..usize::from(INTERIOR_COLOR_INDEX) {
        let [r, g, b] = source[index];
        palette[index - 1] = Rgba::new(
            scale_channel(index, r)?,
            scale_channel(index, g)?,
            scale_channel(index, b)?,
            255,
        );
    }

    Ok(palette)
}

fn scale_channel(index: usize, value: u8) -> Result<u8> {
    value
        .checked_mul(CHANNEL_SCALE)
        .ok_or(PolyvoxError::PaletteOverflow { index, value })
}

/// Transform a parsed grid into a `.vox` model
pub fn grid_to_vox(grid: &SourceVoxelGrid) -> Result<VoxModel> {
    let palette = build_palette(grid)?;
    let voxels = extract_voxels(grid);
    Ok(VoxModel::new(grid.dims(), voxels, palette))
}

/// Convert a dense grid dump held in memory into `.vox` bytes
pub fn convert_bytes(input: &[u8]) -> Result<Vec<u8>> {
    let grid = SourceVoxelGrid::parse(input)?;
    Ok(grid_to_vox(&grid)?.to_bytes())
}

/// Read a dense grid dump from disk and return the `.vox` bytes
pub fn convert(input: impl AsRef<Path>) -> Result<Vec<u8>> {
    let input = input.as_ref();
    let bytes = fs::read(input).map_err(|e| PolyvoxError::io(input, e))?;
    convert_bytes(&bytes)
}

/// Convert `input` and write the `.vox` result to `output`
///
/// The output is only replaced once the whole file has been produced, so a
/// failure never leaves a partial `.vox` behind. `input` and `output` may be
/// the same path.
pub fn convert_file(input: impl AsRef<Path>, output: impl AsRef<Path>) -> Result<ConversionSummary> {
    let input = input.as_ref();
    let output = output.as_ref();

    let bytes = fs::read(input).map_err(|e| PolyvoxError::io(input, e))?;
    let grid = SourceVoxelGrid::parse(&bytes)?;
    let model = grid_to_vox(&grid)?;
    let data = model.to_bytes();

    write_atomic(output, &data)?;

    let dims = model.size;
    let summary = ConversionSummary {
        size: [dims.x, dims.y, dims.z],
        voxel_count: model.voxels.len(),
        interior_count: grid
            .cells()
            .iter()
            .filter(|&&v| Cell::from(v) == Cell::Interior)
            .count(),
        bytes_written: data.len(),
    };

    tracing::debug!(
        input = %input.display(),
        output = %output.display(),
        voxels = summary.voxel_count,
        interior = summary.interior_count,
        "converted grid {}x{}x{}",
        dims.x,
        dims.y,
        dims.z
    );

    Ok(summary)
}

/// Write `data` to a uniquely named sibling of `path`, then rename it over `path`
///
/// The temporary file is removed when any step fails.
fn write_atomic(path: &Path, data: &[u8]) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut tmp = NamedTempFile::new_in(dir).map_err(|e| PolyvoxError::io(path, e))?;
    tmp.write_all(data).map_err(|e| PolyvoxError::io(path, e))?;
    tmp.persist(path).map_err(|e| PolyvoxError::io(path, e.error))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid(dims: IVec3, cells: Vec<u8>) -> SourceVoxelGrid {
        let mut palette = [[0u8; 3]; PALETTE_ENTRIES];
        for (i, entry) in palette.iter_mut().enumerate() {
            let v = (i % 64) as u8;
            *entry = [v, 63 - v, 1];
        }
        SourceVoxelGrid::new(dims, cells, palette).unwrap()
    }

    #[test]
    fn test_remap_unit_grid_is_identity() {
        assert_eq!(remap_position(0, 0, 0, IVec3::ONE), (0, 0, 0));
    }

    #[test]
    fn test_remap_shifts_then_flips() {
        let dims = IVec3::new(4, 5, 6);
        assert_eq!(remap_position(3, 0, 0, dims), (3, 4, 5));
        assert_eq!(remap_position(0, 4, 5, dims), (0, 0, 0));
        assert_eq!(remap_position(1, 2, 3, dims), (1, 2, 2));
    }

    #[test]
    fn test_remap_max_extent_fits_byte() {
        let dims = IVec3::splat(256);
        assert_eq!(remap_position(255, 0, 0, dims), (255, 255, 255));
        assert_eq!(remap_position(0, 255, 255, dims), (0, 0, 0));
    }

    #[test]
    fn test_color_index() {
        assert_eq!(color_index(Cell::Empty), None);
        assert_eq!(color_index(Cell::Interior), Some(255));
        assert_eq!(color_index(Cell::Surface(17)), Some(17));
    }

    #[test]
    fn test_extract_walk_order_is_z_outer() {
        // 2x1x2: cells stored z fastest
        let g = grid(IVec3::new(2, 1, 2), vec![1, 2, 3, 4]);
        let voxels = extract_voxels(&g);

        // z=0: x=0 -> cell 1, x=1 -> cell 3; z=1: x=0 -> cell 2, x=1 -> cell 4
        let indices: Vec<u8> = voxels.iter().map(|v| v.i).collect();
        assert_eq!(indices, vec![1, 3, 2, 4]);
        assert_eq!(voxels[0], Voxel::new(0, 0, 1, 1));
        assert_eq!(voxels[3], Voxel::new(1, 0, 0, 4));
    }

    #[test]
    fn test_palette_scaling_and_tail() {
        let g = grid(IVec3::ONE, vec![255]);
        let palette = build_palette(&g).unwrap();

        assert_eq!(palette.len(), 256);
        // slot 1 <- source entry 1 = [1, 62, 1]
        assert_eq!(palette[0], Rgba::new(4, 248, 4, 255));
        // slot 254 <- source entry 254 = [62, 1, 1]
        assert_eq!(palette[253], Rgba::new(248, 4, 4, 255));
        assert_eq!(palette[254], Rgba::TRANSPARENT);
        assert_eq!(palette[255], Rgba::TRANSPARENT);
    }

    #[test]
    fn test_palette_ignores_reserved_entries() {
        let mut palette = [[0u8; 3]; PALETTE_ENTRIES];
        palette[0] = [255, 255, 255];
        palette[255] = [200, 200, 200];
        let g = SourceVoxelGrid::new(IVec3::ONE, vec![0], palette).unwrap();

        let out = build_palette(&g).unwrap();
        assert_eq!(out[254], Rgba::TRANSPARENT);
    }

    #[test]
    fn test_palette_overflow_rejected() {
        let mut palette = [[0u8; 3]; PALETTE_ENTRIES];
        palette[12] = [10, 64, 10];
        let g = SourceVoxelGrid::new(IVec3::ONE, vec![12], palette).unwrap();

        match build_palette(&g) {
            Err(PolyvoxError::PaletteOverflow { index, value }) => {
                assert_eq!(index, 12);
                assert_eq!(value, 64);
            }
            other => panic!("Expected PaletteOverflow, got {:?}", other),
        }
    }

    #[test]
    fn test_grid_to_vox_keeps_size() {
        let g = grid(IVec3::new(3, 2, 5), vec![255; 30]);
        let model = grid_to_vox(&g).unwrap();
        assert_eq!(model.size, IVec3::new(3, 2, 5));
        assert!(model.voxels.is_empty());
    }

    #[test]
    fn test_write_atomic_leaves_only_target() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.vox");
        write_atomic(&path, b"abc").unwrap();
        assert_eq!(fs::read(&path).unwrap(), b"abc");
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }
}
