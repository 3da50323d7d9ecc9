//! Packed, fixed-size bit vector
//!
//! Bit `n` lives in byte `n / 8` at mask `0x80 >> (n % 8)` (big-endian
//! within the byte), so the raw buffer is portable across platforms.

use std::path::Path;

use super::errors::{SketchError, SketchResult};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BitSequence {
    size: usize,
    bytes: Vec<u8>,
}

#[inline]
fn mask(n: usize) -> u8 {
    0x80 >> (n % 8)
}

impl BitSequence {
    /// Create a zeroed sequence of `size` bits
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` when `size` is zero.
    pub fn new(size: usize) -> SketchResult<Self> {
        if size == 0 {
            return Err(SketchError::InvalidArgument(
                "bit sequence size must be positive".to_string(),
            ));
        }
        Ok(Self {
            size,
            bytes: vec![0u8; size.div_ceil(8)],
        })
    }

    /// Rebuild a sequence from a raw buffer; the size becomes `len * 8`
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` when the buffer is empty.
    pub fn from_bytes(bytes: Vec<u8>) -> SketchResult<Self> {
        if bytes.is_empty() {
            return Err(SketchError::InvalidArgument(
                "bit buffer must not be empty".to_string(),
            ));
        }
        Ok(Self {
            size: bytes.len() * 8,
            bytes,
        })
    }

    #[must_use]
    pub fn size(&self) -> usize {
        self.size
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    fn check(&self, n: usize) -> SketchResult<()> {
        if n >= self.size {
            return Err(SketchError::IndexOutOfRange {
                index: n,
                size: self.size,
            });
        }
        Ok(())
    }

    /// Set bit `n`
    ///
    /// # Errors
    ///
    /// Returns `IndexOutOfRange` when `n >= size`.
    pub fn set(&mut self, n: usize) -> SketchResult<()> {
        self.check(n)?;
        self.bytes[n / 8] |= mask(n);
        Ok(())
    }

    /// Read bit `n`
    ///
    /// # Errors
    ///
    /// Returns `IndexOutOfRange` when `n >= size`.
    pub fn get(&self, n: usize) -> SketchResult<bool> {
        self.check(n)?;
        Ok(self.bytes[n / 8] & mask(n) != 0)
    }

    // Callers guarantee `n < size`; the sketch reduces every hash modulo a
    // size no larger than this sequence.
    #[inline]
    pub(crate) fn set_within(&mut self, n: usize) {
        self.bytes[n / 8] |= mask(n);
    }

    #[inline]
    pub(crate) fn get_within(&self, n: usize) -> bool {
        self.bytes[n / 8] & mask(n) != 0
    }

    /// Number of set bits
    #[must_use]
    pub fn count_ones(&self) -> u64 {
        self.bytes.iter().map(|b| u64::from(b.count_ones())).sum()
    }

    /// Zero every bit, keeping the size
    pub fn clear(&mut self) {
        self.bytes.fill(0);
    }

    /// Write the raw buffer to `path`
    ///
    /// # Errors
    ///
    /// Returns an IO error if the file cannot be written.
    pub fn save(&self, path: &Path) -> SketchResult<()> {
        crate::utils::write_atomic(path, &self.bytes)?;
        Ok(())
    }

    /// Read a raw buffer written by [`BitSequence::save`]
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the file is absent and `InvalidArgument` if it is empty.
    pub fn load(path: &Path) -> SketchResult<Self> {
        if !path.exists() {
            return Err(SketchError::NotFound(path.display().to_string()));
        }
        Self::from_bytes(std::fs::read(path)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_zero_size() {
        assert!(matches!(
            BitSequence::new(0),
            Err(SketchError::InvalidArgument(_))
        ));
    }

    #[test]
    fn big_endian_bit_order() {
        let mut bits = BitSequence::new(16).unwrap();
        bits.set(0).unwrap();
        bits.set(9).unwrap();
        assert_eq!(bits.as_bytes(), &[0x80, 0x40]);
        assert!(bits.get(0).unwrap());
        assert!(!bits.get(1).unwrap());
        assert!(bits.get(9).unwrap());
    }

    #[test]
    fn bounds_are_enforced() {
        let mut bits = BitSequence::new(10).unwrap();
        assert_eq!(bits.as_bytes().len(), 2);
        assert!(bits.set(9).is_ok());
        assert!(matches!(
            bits.set(10),
            Err(SketchError::IndexOutOfRange { index: 10, size: 10 })
        ));
        assert!(bits.get(10).is_err());
    }

    #[test]
    fn reload_rounds_size_up_to_whole_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bits.bin");
        let mut bits = BitSequence::new(10).unwrap();
        bits.set(3).unwrap();
        bits.save(&path).unwrap();

        let loaded = BitSequence::load(&path).unwrap();
        assert_eq!(loaded.size(), 16);
        assert!(loaded.get(3).unwrap());
        assert_eq!(loaded.count_ones(), 1);
    }
}
