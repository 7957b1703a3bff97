// src/engine/guard.rs
//
// Size guard: the recompressed candidate only replaces the original
// payload when it is no larger. Ties go to the candidate, which carries
// the normalized orientation and target dimensions.

use crate::engine::surface::Dimension;

/// An encoded payload paired with the pixel dimensions it decodes to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedImage {
    pub bytes: Vec<u8>,
    pub dimension: Dimension,
}

impl EncodedImage {
    pub fn new(bytes: Vec<u8>, dimension: Dimension) -> Self {
        Self { bytes, dimension }
    }

    pub fn byte_len(&self) -> usize {
        self.bytes.len()
    }
}

/// Pick the smaller payload. Strictly-larger candidates lose; equal sizes
/// win because the candidate is already normalized.
pub fn choose(original: EncodedImage, candidate: EncodedImage) -> EncodedImage {
    if candidate.bytes.len() > original.bytes.len() {
        original
    } else {
        candidate
    }
}
