//! SPIR-V Binary Loading
//!
//! Turns the assembler's output file into host-order words.

use crate::error::{TranspileError, TranspileResult};

/// SPIR-V magic number
pub const SPIRV_MAGIC: u32 = 0x07230203;

/// Decodes a SPIR-V module from raw bytes
///
/// The byte order is taken from the magic number, so modules written on
/// either endianness load into host words.
pub fn words_from_bytes(bytes: &[u8]) -> TranspileResult<Vec<u32>> {
    if bytes.len() % 4 != 0 {
        return Err(TranspileError::InvalidSpirv(format!(
            "length {} is not a multiple of 4",
            bytes.len()
        )));
    }
    if bytes.is_empty() {
        return Err(TranspileError::InvalidSpirv("module is empty".into()));
    }

    let little: Vec<u32> = bytes
        .chunks_exact(4)
        .map(|c| u32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect();

    match little[0] {
        SPIRV_MAGIC => Ok(little),
        magic if magic.swap_bytes() == SPIRV_MAGIC => {
            Ok(little.into_iter().map(u32::swap_bytes).collect())
        },
        magic => Err(TranspileError::InvalidSpirv(format!(
            "bad magic 0x{:08x}",
            magic
        ))),
    }
}

/// Encodes words as little-endian bytes
pub fn words_to_bytes(words: &[u32]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(words.len() * 4);
    for word in words {
        bytes.extend_from_slice(&word.to_le_bytes());
    }
    bytes
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_little_endian_module() {
        let bytes = words_to_bytes(&[SPIRV_MAGIC, 0x00010000, 0, 8, 0]);
        let words = words_from_bytes(&bytes).unwrap();
        assert_eq!(words.len(), bytes.len() / 4);
        assert_eq!(words[0], SPIRV_MAGIC);
        assert_eq!(words[3], 8);
    }

    #[test]
    fn test_big_endian_module() {
        let mut bytes = Vec::new();
        for word in [SPIRV_MAGIC, 0x00010300] {
            bytes.extend_from_slice(&u32::to_be_bytes(word));
        }
        let words = words_from_bytes(&bytes).unwrap();
        assert_eq!(words, vec![SPIRV_MAGIC, 0x00010300]);
    }

    #[test]
    fn test_rejects_truncated_module() {
        let err = words_from_bytes(&[0x03, 0x02, 0x23]).unwrap_err();
        assert!(err.to_string().contains("multiple of 4"));
    }

    #[test]
    fn test_rejects_bad_magic() {
        let err = words_from_bytes(&[0, 0, 0, 0]).unwrap_err();
        assert!(err.to_string().contains("bad magic"));
        assert!(words_from_bytes(&[]).is_err());
    }
}
