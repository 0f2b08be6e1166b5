//! File fingerprinting.

use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::Path;

use sha2::{Digest, Sha256};

/// Block size used when streaming content into the hasher.
pub const HASH_BLOCK_SIZE: usize = 4096;

/// SHA-256 of everything `reader` yields, as 64 lowercase hex characters.
pub fn hash_reader<R: Read>(mut reader: R) -> io::Result<String> {
    let mut hasher = Sha256::new();
    let mut block = [0u8; HASH_BLOCK_SIZE];

    loop {
        let n = reader.read(&mut block)?;
        if n == 0 {
            break;
        }
        hasher.update(&block[..n]);
    }

    Ok(hex::encode(hasher.finalize()))
}

pub fn hash_bytes(bytes: &[u8]) -> String {
    // Reading from a slice cannot fail
    hash_reader(bytes).unwrap_or_default()
}

pub fn hash_file(path: &Path) -> io::Result<String> {
    hash_reader(BufReader::new(File::open(path)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_digest() {
        assert_eq!(
            hash_bytes(b"hello world"),
            "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9"
        );
        assert_eq!(
            hash_bytes(b""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn test_deterministic_and_lowercase() {
        let content = vec![7u8; HASH_BLOCK_SIZE * 3 + 17];
        let a = hash_bytes(&content);
        let b = hash_bytes(&content);
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
        assert!(a.chars().all(|c| c.is_ascii_digit() || c.is_ascii_lowercase()));
    }

    #[test]
    fn test_single_bit_flip_changes_digest() {
        let original = b"The quick brown fox jumps over the lazy dog".to_vec();
        let mut flipped = original.clone();
        flipped[10] ^= 0b0000_0001;
        assert_ne!(hash_bytes(&original), hash_bytes(&flipped));
    }

    #[test]
    fn test_file_digest_matches_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doc.txt");
        let content = "line\n".repeat(5000);
        std::fs::write(&path, &content).unwrap();
        assert_eq!(hash_file(&path).unwrap(), hash_bytes(content.as_bytes()));
        assert!(hash_file(&dir.path().join("missing.txt")).is_err());
    }
}
