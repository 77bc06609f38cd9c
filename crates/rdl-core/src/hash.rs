//! Sampling file hash
//!
//! Fingerprints a file quickly: small files are hashed in full, large files by
//! three fixed-size samples (head, middle, tail) plus their length.

use crate::error::HashError;
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom};
use std::path::Path;

/// Size of each sample taken from a large file (1 MiB)
pub const HASH_SAMPLE_SIZE: u64 = 1 << 20;

/// Compute the sampling hash of the file at `path` as lowercase hex SHA-256.
///
/// Files up to `2 * HASH_SAMPLE_SIZE` bytes are hashed in full. Larger files
/// hash the samples at offsets `0`, `size / 2` and `size - HASH_SAMPLE_SIZE`,
/// followed by the size as 8 big-endian bytes.
pub fn sample_hash(path: impl AsRef<Path>) -> Result<String, HashError> {
    let path = path.as_ref();
    let metadata = std::fs::metadata(path)?;
    if metadata.is_dir() {
        return Err(HashError::IsDirectory(path.to_path_buf()));
    }

    let mut file = File::open(path)?;
    let size = file.seek(SeekFrom::End(0))?;
    file.seek(SeekFrom::Start(0))?;

    let mut hasher = Sha256::new();
    if size > HASH_SAMPLE_SIZE * 2 {
        let mut buffer = vec![0u8; HASH_SAMPLE_SIZE as usize];
        for offset in [0, size / 2, size - HASH_SAMPLE_SIZE] {
            file.seek(SeekFrom::Start(offset))?;
            file.read_exact(&mut buffer)?;
            hasher.update(&buffer);
        }
        hasher.update(size.to_be_bytes());
    } else {
        io::copy(&mut file, &mut hasher)?;
    }

    Ok(hex::encode(hasher.finalize()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    const MIB: usize = 1 << 20;

    fn write_file(dir: &TempDir, name: &str, content: &[u8]) -> std::path::PathBuf {
        let path = dir.path().join(name);
        let mut file = File::create(&path).unwrap();
        file.write_all(content).unwrap();
        path
    }

    /// 10 MiB whose sampled regions are fixed and whose interior byte is `fill`
    fn large_content(fill: u8) -> Vec<u8> {
        let size = 10 * MIB;
        let mut content = vec![fill; size];
        let sampled = [0..MIB, size / 2..size / 2 + MIB, size - MIB..size];
        for range in sampled {
            for (i, b) in content[range].iter_mut().enumerate() {
                *b = (i % 251) as u8;
            }
        }
        content
    }

    #[test]
    fn test_small_file_is_full_sha256() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "small.txt", b"0123456789");
        assert_eq!(
            sample_hash(&path).unwrap(),
            hex::encode(Sha256::digest(b"0123456789"))
        );
    }

    #[test]
    fn test_small_file_hash_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "small.bin", &vec![7u8; MIB]);
        let first = sample_hash(&path).unwrap();
        let second = sample_hash(&path).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.len(), 64);
    }

    #[test]
    fn test_small_and_large_file_differ() {
        let dir = TempDir::new().unwrap();
        let small = write_file(&dir, "small.bin", b"0123456789");
        let large = write_file(&dir, "large.bin", &large_content(0xAA));
        assert_ne!(sample_hash(&small).unwrap(), sample_hash(&large).unwrap());
    }

    #[test]
    fn test_large_file_only_samples_head_middle_tail() {
        let dir = TempDir::new().unwrap();
        let a = write_file(&dir, "a.bin", &large_content(0xAA));
        let b = write_file(&dir, "b.bin", &large_content(0x55));
        assert_eq!(sample_hash(&a).unwrap(), sample_hash(&b).unwrap());

        let mut changed_head = large_content(0xAA);
        changed_head[0] ^= 0xFF;
        let c = write_file(&dir, "c.bin", &changed_head);
        assert_ne!(sample_hash(&a).unwrap(), sample_hash(&c).unwrap());
    }

    #[test]
    fn test_large_file_digest_layout() {
        let dir = TempDir::new().unwrap();
        let content = large_content(0x11);
        let path = write_file(&dir, "layout.bin", &content);
        let size = content.len();

        let mut hasher = Sha256::new();
        hasher.update(&content[..MIB]);
        hasher.update(&content[size / 2..size / 2 + MIB]);
        hasher.update(&content[size - MIB..]);
        hasher.update((size as u64).to_be_bytes());
        assert_eq!(sample_hash(&path).unwrap(), hex::encode(hasher.finalize()));
    }

    #[test]
    fn test_directory_fails() {
        let dir = TempDir::new().unwrap();
        let err = sample_hash(dir.path()).unwrap_err();
        assert!(matches!(err, HashError::IsDirectory(_)));
    }

    #[test]
    fn test_missing_file_fails() {
        let dir = TempDir::new().unwrap();
        let err = sample_hash(dir.path().join("nope")).unwrap_err();
        assert!(matches!(err, HashError::Io(_)));
    }
}
