//! In-memory MagicaVoxel model and its `.vox` serialization

use super::chunk::Chunk;
use crate::types::{PALETTE_ENTRIES, VOX_VERSION};
use glam::IVec3;
use serde::{Deserialize, Serialize};

/// File magic at the start of every `.vox` file
pub const VOX_MAGIC: &[u8; 4] = b"VOX ";

/// A single voxel in `.vox` coordinates with a 1-based palette index
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Voxel {
    pub x: u8,
    pub y: u8,
    pub z: u8,
    pub i: u8,
}

impl Voxel {
    pub const fn new(x: u8, y: u8, z: u8, i: u8) -> Self {
        Self { x, y, z, i }
    }
}

/// RGBA palette color
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    /// Fully transparent black
    pub const TRANSPARENT: Rgba = Rgba::new(0, 0, 0, 0);

    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }
}

/// Exactly 256 palette entries in `RGBA` chunk order
pub type Palette = [Rgba; PALETTE_ENTRIES];

/// A single-model `.vox` scene: `SIZE`, `XYZI` and `RGBA`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoxModel {
    pub size: IVec3,
    pub voxels: Vec<Voxel>,
    pub palette: Palette,
}

impl VoxModel {
    pub fn new(size: IVec3, voxels: Vec<Voxel>, palette: Palette) -> Self {
        Self {
            size,
            voxels,
            palette,
        }
    }

    fn size_chunk(&self) -> Chunk {
        let mut chunk = Chunk::new(b"SIZE");
        chunk.push_i32(self.size.x);
        chunk.push_i32(self.size.y);
        chunk.push_i32(self.size.z);
        chunk
    }

    fn xyzi_chunk(&self) -> Chunk {
        let mut chunk = Chunk::new(b"XYZI");
        chunk.push_u32(self.voxels.len() as u32);
        for v in &self.voxels {
            chunk.push_bytes(&[v.x, v.y, v.z, v.i]);
        }
        chunk
    }

    fn rgba_chunk(&self) -> Chunk {
        let mut chunk = Chunk::new(b"RGBA");
        for c in &self.palette {
            chunk.push_bytes(&[c.r, c.g, c.b, c.a]);
        }
        chunk
    }

    /// Serialize to a complete `.vox` file (version 150)
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut main = Chunk::new(b"MAIN");
        main.push_child(&self.size_chunk());
        main.push_child(&self.xyzi_chunk());
        main.push_child(&self.rgba_chunk());

        let mut out = Vec::with_capacity(8 + main.encoded_len());
        out.extend_from_slice(VOX_MAGIC);
        out.extend_from_slice(&VOX_VERSION.to_le_bytes());
        main.write_to(&mut out);
        out
    }
}
