//! MagicaVoxel .vox writing and inspection

pub mod chunk;
pub mod model;

pub use chunk::Chunk;
pub use model::{Palette, Rgba, VoxModel, Voxel, VOX_MAGIC};

use crate::types::{PolyvoxError, Result};
use serde::Serialize;
use std::collections::BTreeSet;

/// Summary of a `.vox` file as seen by a third-party MagicaVoxel reader
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VoxSummary {
    pub version: u32,
    pub model_count: usize,
    /// Size of the first model as `[x, y, z]`
    pub size: [u32; 3],
    pub voxel_count: usize,
    /// Number of distinct palette indices referenced by voxels
    pub distinct_colors: usize,
    pub palette_len: usize,
}

impl VoxSummary {
    /// Parse `.vox` bytes with `dot_vox` and summarize the first model
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let data = dot_vox::load_bytes(bytes).map_err(|e| PolyvoxError::InvalidVox(e.to_string()))?;

        let Some(model) = data.models.first() else {
            return Err(PolyvoxError::InvalidVox("no models found".to_string()));
        };

        let distinct: BTreeSet<u8> = model.voxels.iter().map(|v| v.i).collect();

        Ok(Self {
            version: data.version,
            model_count: data.models.len(),
            size: [model.size.x, model.size.y, model.size.z],
            voxel_count: model.voxels.len(),
            distinct_colors: distinct.len(),
            palette_len: data.palette.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PALETTE_ENTRIES;
    use glam::IVec3;

    #[test]
    fn test_summary_of_written_model() {
        let model = VoxModel::new(
            IVec3::new(3, 4, 5),
            vec![Voxel::new(0, 0, 0, 1), Voxel::new(2, 3, 4, 1), Voxel::new(1, 1, 1, 9)],
            [Rgba::new(40, 40, 40, 255); PALETTE_ENTRIES],
        );

        let summary = VoxSummary::from_bytes(&model.to_bytes()).unwrap();
        assert_eq!(summary.version, 150);
        assert_eq!(summary.model_count, 1);
        assert_eq!(summary.size, [3, 4, 5]);
        assert_eq!(summary.voxel_count, 3);
        assert_eq!(summary.distinct_colors, 2);
    }

    #[test]
    fn test_summary_rejects_garbage() {
        match VoxSummary::from_bytes(b"not a vox file") {
            Err(err @ PolyvoxError::InvalidVox(_)) => assert!(!err.is_malformed()),
            other => panic!("Expected InvalidVox, got {:?}", other),
        }
    }
}
