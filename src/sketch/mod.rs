//! Probabilistic membership sketches
//!
//! `BitSequence` is the storage substrate; `MembershipSketch` layers a family
//! of seeded BKDR hashes over it to give a thread-safe Bloom filter with a
//! typed save/load contract.

pub mod bit_sequence;
pub mod errors;
pub mod hashing;
pub mod membership;

pub use bit_sequence::BitSequence;
pub use errors::{SketchError, SketchResult};
pub use hashing::{MAX_HASH_FUNCS, bkdr_hash, derive_seeds};
pub use membership::{MembershipSketch, SketchParams};
