//! Bloom-filter membership sketch over strings
//!
//! Hash functions are never persisted: they are rebuilt from
//! `hash_func_count` through [`derive_seeds`], so a saved sketch reloads
//! identically on any machine.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use super::bit_sequence::BitSequence;
use super::errors::{SketchError, SketchResult};
use super::hashing::{MAX_HASH_FUNCS, bkdr_hash, derive_seeds};

/// Metadata file written next to the bit buffer
pub const SKETCH_PARAMS_FILE: &str = "sketch.json";
/// Raw bit buffer file
pub const SKETCH_BITS_FILE: &str = "bits.bin";

/// Persisted sketch parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SketchParams {
    pub size: usize,
    pub hash_func_count: usize,
}

/// Approximate set of strings: no false negatives, bounded false positives
///
/// A single lock covers the whole bit buffer; `add` and `contains` are O(k).
#[derive(Debug)]
pub struct MembershipSketch {
    size: usize,
    seeds: Vec<u64>,
    bits: Mutex<BitSequence>,
}

impl MembershipSketch {
    /// Create an empty sketch of `size` bits using `hash_func_count` hashes
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` when `size` is zero or `hash_func_count`
    /// is outside `1..=MAX_HASH_FUNCS`.
    pub fn new(size: usize, hash_func_count: usize) -> SketchResult<Self> {
        let bits = BitSequence::new(size)?;
        Self::with_bits(size, hash_func_count, bits)
    }

    /// Create a sketch sized for `capacity` keys at `error_rate`
    ///
    /// # Errors
    ///
    /// Propagates validation errors from [`MembershipSketch::best_args`].
    pub fn with_capacity(capacity: usize, error_rate: f64) -> SketchResult<Self> {
        let (size, k) = Self::best_args(capacity, error_rate)?;
        Self::new(size, k)
    }

    fn with_bits(size: usize, hash_func_count: usize, bits: BitSequence) -> SketchResult<Self> {
        if hash_func_count == 0 || hash_func_count > MAX_HASH_FUNCS {
            return Err(SketchError::InvalidArgument(format!(
                "hash function count must be in 1..={MAX_HASH_FUNCS}, got {hash_func_count}"
            )));
        }
        if bits.size() < size {
            return Err(SketchError::Corrupt(format!(
                "bit buffer holds {} bits but sketch size is {size}",
                bits.size()
            )));
        }
        Ok(Self {
            size,
            seeds: derive_seeds(hash_func_count),
            bits: Mutex::new(bits),
        })
    }

    /// Optimal `(size, hash_func_count)` for a target capacity and error rate
    ///
    /// `size = ceil(-n ln p / ln(2)^2)`, `k = round(ln(2) * size / n)`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` for a zero capacity, an error rate outside
    /// `(0, 1)`, or a rate so small the hash count would exceed the cap.
    pub fn best_args(capacity: usize, error_rate: f64) -> SketchResult<(usize, usize)> {
        if capacity == 0 {
            return Err(SketchError::InvalidArgument(
                "capacity must be positive".to_string(),
            ));
        }
        if !(error_rate > 0.0 && error_rate < 1.0) {
            return Err(SketchError::InvalidArgument(format!(
                "error rate must be in (0, 1), got {error_rate}"
            )));
        }
        let ln2 = std::f64::consts::LN_2;
        let n = capacity as f64;
        let size = (-n * error_rate.ln() / (ln2 * ln2)).ceil() as usize;
        let k = (ln2 * size as f64 / n).round() as usize;
        let k = k.max(1);
        if k > MAX_HASH_FUNCS {
            return Err(SketchError::InvalidArgument(format!(
                "error rate {error_rate} needs {k} hash functions, more than {MAX_HASH_FUNCS}"
            )));
        }
        Ok((size, k))
    }

    #[must_use]
    pub fn size(&self) -> usize {
        self.size
    }

    #[must_use]
    pub fn hash_func_count(&self) -> usize {
        self.seeds.len()
    }

    #[must_use]
    pub fn params(&self) -> SketchParams {
        SketchParams {
            size: self.size,
            hash_func_count: self.seeds.len(),
        }
    }

    #[inline]
    fn positions<'a>(&'a self, key: &'a str) -> impl Iterator<Item = usize> + 'a {
        let size = self.size as u64;
        self.seeds
            .iter()
            .map(move |&seed| (bkdr_hash(key, seed) % size) as usize)
    }

    /// Record `key`; idempotent
    pub fn add(&self, key: &str) {
        let mut bits = self.bits.lock();
        for pos in self.positions(key) {
            bits.set_within(pos);
        }
    }

    /// True if `key` may have been added; false means it definitely was not
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        let bits = self.bits.lock();
        self.positions(key).all(|pos| bits.get_within(pos))
    }

    /// Add `key` and report whether it was absent beforehand, in one critical section
    pub fn insert(&self, key: &str) -> bool {
        let mut bits = self.bits.lock();
        let mut fresh = false;
        for pos in self.positions(key) {
            if !bits.get_within(pos) {
                fresh = true;
                bits.set_within(pos);
            }
        }
        fresh
    }

    /// Zero every bit
    pub fn reset(&self) {
        self.bits.lock().clear();
    }

    /// Number of set bits, for fill-ratio diagnostics
    #[must_use]
    pub fn ones(&self) -> u64 {
        self.bits.lock().count_ones()
    }

    /// Write `sketch.json` and `bits.bin` into `dir`
    ///
    /// # Errors
    ///
    /// Returns an IO or serialization error if either file cannot be written.
    pub fn save(&self, dir: &Path) -> SketchResult<()> {
        fs::create_dir_all(dir)?;
        let params = serde_json::to_vec_pretty(&self.params())?;
        crate::utils::write_atomic(&dir.join(SKETCH_PARAMS_FILE), &params)?;
        // Copy out under the lock, write without it.
        let bits = self.bits.lock().clone();
        bits.save(&dir.join(SKETCH_BITS_FILE))?;
        log::debug!(
            target: "snapcrawl::sketch",
            "Saved sketch (size={}, k={}) to {}",
            self.size,
            self.seeds.len(),
            dir.display()
        );
        Ok(())
    }

    /// Load a sketch written by [`MembershipSketch::save`]
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if either file is missing and `Corrupt` if the bit
    /// buffer is shorter than the recorded size.
    pub fn load(dir: &Path) -> SketchResult<Self> {
        let params_path = dir.join(SKETCH_PARAMS_FILE);
        let bits_path = dir.join(SKETCH_BITS_FILE);
        if !params_path.exists() {
            return Err(SketchError::NotFound(params_path.display().to_string()));
        }
        if !bits_path.exists() {
            return Err(SketchError::NotFound(bits_path.display().to_string()));
        }
        let params: SketchParams = serde_json::from_slice(&fs::read(&params_path)?)?;
        if params.size == 0 {
            return Err(SketchError::Corrupt(format!(
                "{} records a zero size",
                params_path.display()
            )));
        }
        let bits = BitSequence::load(&bits_path)?;
        Self::with_bits(params.size, params.hash_func_count, bits)
    }
}
