//! Error types and format constants shared across the converter and pipeline

use std::path::PathBuf;
use std::process::ExitStatus;
use thiserror::Error;

/// Size of the dense grid header: three little-endian `i32` dimensions
pub const HEADER_SIZE: usize = 12;

/// Number of palette entries in both the source dump and the `.vox` output
pub const PALETTE_ENTRIES: usize = 256;

/// Size of the source RGB palette (256 x RGB)
pub const PALETTE_SIZE: usize = PALETTE_ENTRIES * 3;

/// Largest accepted grid extent per axis.
///
/// `.vox` stores voxel coordinates as single bytes, so no axis may exceed 256.
pub const MAX_DIMENSION: i32 = 256;

/// MagicaVoxel file format version written by the converter
pub const VOX_VERSION: u32 = 150;

/// Cell value marking an unset voxel
pub const EMPTY_CELL: u8 = 255;

/// Cell value marking an interior voxel without its own surface color
pub const INTERIOR_CELL: u8 = 0;

/// Color index assigned to interior voxels in the `.vox` output
pub const INTERIOR_COLOR_INDEX: u8 = 255;

/// Polyvox error types
#[derive(Debug, Error)]
pub enum PolyvoxError {
    #[error("Truncated header: expected {expected} bytes, found {actual}")]
    TruncatedHeader { expected: usize, actual: usize },

    #[error("Invalid grid dimensions {x}x{y}x{z}: each axis must be in 1..={max}")]
    InvalidDimensions { x: i32, y: i32, z: i32, max: i32 },

    #[error("Length mismatch: header implies {expected} bytes, file has {actual}")]
    LengthMismatch { expected: usize, actual: usize },

    #[error("Palette entry {index} has channel value {value}, which overflows a byte when scaled by 4")]
    PaletteOverflow { index: usize, value: u8 },

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Script {} exited with {status}", script.display())]
    ScriptFailed { script: PathBuf, status: ExitStatus },

    #[error("Invalid prompt: {0}")]
    InvalidPrompt(String),

    #[error("Expected output file is missing: {}", path.display())]
    MissingOutput { path: PathBuf },

    #[error("Invalid .vox file: {0}")]
    InvalidVox(String),
}

impl PolyvoxError {
    /// Wrap an I/O error together with the path it happened on
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        PolyvoxError::Io {
            path: path.into(),
            source,
        }
    }

    /// True for errors caused by a malformed dense grid input
    pub fn is_malformed(&self) -> bool {
        matches!(
            self,
            PolyvoxError::TruncatedHeader { .. }
                | PolyvoxError::InvalidDimensions { .. }
                | PolyvoxError::LengthMismatch { .. }
                | PolyvoxError::PaletteOverflow { .. }
        )
    }
}

/// Result type alias for polyvox operations
pub type Result<T> = std::result::Result<T, PolyvoxError>;
