//! Internal utilities.
//!
//! Intentionally minimal and dependency-free: the only thing the algebra
//! needs from outside the ADT modules is deterministic hashing.

pub mod det_hash;

pub use det_hash::{DetBuildHasher, DetHasher, DetHashSet};
