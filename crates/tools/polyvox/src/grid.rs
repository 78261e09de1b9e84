//! Dense voxel grid dump produced by the mesh rasterizer
//!
//! ## File Layout
//!
//! ```text
//! [Header: 12 bytes]
//!   x_size: i32 (little-endian)
//!   y_size: i32 (little-endian)
//!   z_size: i32 (little-endian)
//!
//! [Cells: x_size * y_size * z_size bytes]
//!   One byte per voxel, z fastest, then y, then x
//!   255 = empty, 0 = interior, 1-254 = surface palette index
//!
//! [Palette: 768 bytes]
//!   256 RGB triples, 6-bit channels (0-63)
//! ```

use crate::types::{
    PolyvoxError, Result, EMPTY_CELL, HEADER_SIZE, INTERIOR_CELL, MAX_DIMENSION, PALETTE_ENTRIES,
    PALETTE_SIZE,
};
use glam::IVec3;

/// 256-entry RGB palette as stored in the dense grid dump
pub type RgbPalette = [[u8; 3]; PALETTE_ENTRIES];

/// Classification of a single grid cell
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cell {
    /// No voxel at this position
    Empty,
    /// Solid voxel inside the model, no surface color of its own
    Interior,
    /// Surface voxel referencing palette entry 1-254
    Surface(u8),
}

impl From<u8> for Cell {
    fn from(value: u8) -> Self {
        match value {
            EMPTY_CELL => Cell::Empty,
            INTERIOR_CELL => Cell::Interior,
            index => Cell::Surface(index),
        }
    }
}

/// Dense voxel grid with indexed palette
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceVoxelGrid {
    dims: IVec3,
    cells: Vec<u8>,
    palette: RgbPalette,
}

impl SourceVoxelGrid {
    /// Build a grid from its parts, validating dimensions and cell count
    pub fn new(dims: IVec3, cells: Vec<u8>, palette: RgbPalette) -> Result<Self> {
        let cell_count = checked_cell_count(dims)?;
        if cells.len() != cell_count {
            return Err(PolyvoxError::LengthMismatch {
                expected: cell_count,
                actual: cells.len(),
            });
        }

        Ok(Self {
            dims,
            cells,
            palette,
        })
    }

    /// Parse a dense grid dump
    ///
    /// The buffer must hold exactly the header, `x * y * z` cells and the
    /// 768-byte palette. Anything shorter or longer is rejected.
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < HEADER_SIZE {
            return Err(PolyvoxError::TruncatedHeader {
                expected: HEADER_SIZE,
                actual: bytes.len(),
            });
        }

        let dims = IVec3::new(
            read_i32_le(bytes, 0),
            read_i32_le(bytes, 4),
            read_i32_le(bytes, 8),
        );
        let cell_count = checked_cell_count(dims)?;

        let expected = HEADER_SIZE + cell_count + PALETTE_SIZE;
        if bytes.len() != expected {
            return Err(PolyvoxError::LengthMismatch {
                expected,
                actual: bytes.len(),
            });
        }

        let palette_start = HEADER_SIZE + cell_count;
        let cells = bytes[HEADER_SIZE..palette_start].to_vec();

        let mut palette = [[0u8; 3]; PALETTE_ENTRIES];
        for (entry, rgb) in palette
            .iter_mut()
            .zip(bytes[palette_start..].chunks_exact(3))
        {
            entry.copy_from_slice(rgb);
        }

        Ok(Self {
            dims,
            cells,
            palette,
        })
    }

    /// Encode the grid back into the dump layout
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(HEADER_SIZE + self.cells.len() + PALETTE_SIZE);
        out.extend_from_slice(&self.dims.x.to_le_bytes());
        out.extend_from_slice(&self.dims.y.to_le_bytes());
        out.extend_from_slice(&self.dims.z.to_le_bytes());
        out.extend_from_slice(&self.cells);
        for rgb in &self.palette {
            out.extend_from_slice(rgb);
        }
        out
    }

    /// Grid extent as `(x_size, y_size, z_size)`
    pub fn dims(&self) -> IVec3 {
        self.dims
    }

    /// Raw cell bytes in storage order
    pub fn cells(&self) -> &[u8] {
        &self.cells
    }

    pub fn palette(&self) -> &RgbPalette {
        &self.palette
    }

    /// Linear index of `(x, y, z)`: z varies fastest, then y, then x
    #[inline]
    pub fn index(&self, x: usize, y: usize, z: usize) -> usize {
        let ys = self.dims.y as usize;
        let zs = self.dims.z as usize;
        z + y * zs + x * zs * ys
    }

    /// Raw cell value at `(x, y, z)`
    #[inline]
    pub fn value(&self, x: usize, y: usize, z: usize) -> u8 {
        self.cells[self.index(x, y, z)]
    }

    /// Classified cell at `(x, y, z)`
    #[inline]
    pub fn cell(&self, x: usize, y: usize, z: usize) -> Cell {
        Cell::from(self.value(x, y, z))
    }

    /// Number of non-empty cells
    pub fn occupied_count(&self) -> usize {
        self.cells.iter().filter(|&&v| v != EMPTY_CELL).count()
    }
}

fn read_i32_le(bytes: &[u8], offset: usize) -> i32 {
    let mut buf = [0u8; 4];
    buf.copy_from_slice(&bytes[offset..offset + 4]);
    i32::from_le_bytes(buf)
}

/// Validate dimensions and return the implied cell count
fn checked_cell_count(dims: IVec3) -> Result<usize> {
    let valid = |v: i32| (1..=MAX_DIMENSION).contains(&v);
    if !(valid(dims.x) && valid(dims.y) && valid(dims.z)) {
        return Err(PolyvoxError::InvalidDimensions {
            x: dims.x,
            y: dims.y,
            z: dims.z,
            max: MAX_DIMENSION,
        });
    }
    Ok(dims.x as usize * dims.y as usize * dims.z as usize)
}
