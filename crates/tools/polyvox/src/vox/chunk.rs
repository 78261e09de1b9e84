//! RIFF-style chunk writer used by the `.vox` container
//!
//! Every chunk is encoded as:
//!
//! ```text
//! id:            4 bytes ASCII
//! content_len:   u32 (little-endian)
//! children_len:  u32 (little-endian)
//! content:       content_len bytes
//! children:      children_len bytes (nested chunks)
//! ```

/// Size of a chunk header (id + two length fields)
pub const CHUNK_HEADER_SIZE: usize = 12;

/// A chunk with its content and already-encoded children
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    id: [u8; 4],
    content: Vec<u8>,
    children: Vec<u8>,
}

impl Chunk {
    /// Create an empty chunk with the given 4-byte id
    pub fn new(id: &[u8; 4]) -> Self {
        Self {
            id: *id,
            content: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Append a `u32` in little-endian order to the content
    pub fn push_u32(&mut self, value: u32) {
        self.content.extend_from_slice(&value.to_le_bytes());
    }

    /// Append an `i32` in little-endian order to the content
    pub fn push_i32(&mut self, value: i32) {
        self.content.extend_from_slice(&value.to_le_bytes());
    }

    /// Append raw bytes to the content
    pub fn push_bytes(&mut self, bytes: &[u8]) {
        self.content.extend_from_slice(bytes);
    }

    /// Nest `child` after any previously added children
    pub fn push_child(&mut self, child: &Chunk) {
        child.write_to(&mut self.children);
    }

    /// Total encoded size including the header and all children
    pub fn encoded_len(&self) -> usize {
        CHUNK_HEADER_SIZE + self.content.len() + self.children.len()
    }

    /// Encode this chunk onto the end of `out`
    pub fn write_to(&self, out: &mut Vec<u8>) {
        out.reserve(self.encoded_len());
        out.extend_from_slice(&self.id);
        out.extend_from_slice(&(self.content.len() as u32).to_le_bytes());
        out.extend_from_slice(&(self.children.len() as u32).to_le_bytes());
        out.extend_from_slice(&self.content);
        out.extend_from_slice(&self.children);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_chunk_is_header_only() {
        let mut out = Vec::new();
        Chunk::new(b"MAIN").write_to(&mut out);
        assert_eq!(out, b"MAIN\0\0\0\0\0\0\0\0");
    }

    #[test]
    fn test_content_length_prefix() {
        let mut chunk = Chunk::new(b"SIZE");
        chunk.push_i32(1);
        chunk.push_i32(2);
        chunk.push_i32(3);

        let mut out = Vec::new();
        chunk.write_to(&mut out);

        assert_eq!(&out[0..4], b"SIZE");
        assert_eq!(&out[4..8], &12u32.to_le_bytes());
        assert_eq!(&out[8..12], &0u32.to_le_bytes());
        assert_eq!(&out[12..16], &1i32.to_le_bytes());
        assert_eq!(out.len(), chunk.encoded_len());
    }

    #[test]
    fn test_push_bytes_appends_after_count() {
        let mut chunk = Chunk::new(b"XYZI");
        chunk.push_u32(2);
        chunk.push_bytes(&[1, 2, 3, 4]);
        chunk.push_bytes(&[5, 6, 7, 8]);

        let mut out = Vec::new();
        chunk.write_to(&mut out);

        assert_eq!(&out[4..8], &12u32.to_le_bytes());
        assert_eq!(&out[12..16], &2u32.to_le_bytes());
        assert_eq!(&out[16..24], &[1, 2, 3, 4, 5, 6, 7, 8]);
    }

    #[test]
    fn test_children_length_matches_nested_chunks() {
        let mut a = Chunk::new(b"AAAA");
        a.push_bytes(&[1, 2, 3, 4]);
        let mut b = Chunk::new(b"BBBB");
        b.push_bytes(&[5]);

        let mut parent = Chunk::new(b"MAIN");
        parent.push_child(&a);
        parent.push_child(&b);

        let mut out = Vec::new();
        parent.write_to(&mut out);

        let children_len = u32::from_le_bytes([out[8], out[9], out[10], out[11]]) as usize;
        assert_eq!(children_len, a.encoded_len() + b.encoded_len());
        assert_eq!(&out[12..16], b"AAAA");
        assert_eq!(&out[12 + a.encoded_len()..16 + a.encoded_len()], b"BBBB");
        assert_eq!(out.len(), parent.encoded_len());
    }
}
