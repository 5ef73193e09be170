//! Deterministic hashing for canonical forms.
//!
//! Canonicalized causes hash parallel stages commutatively: every element of
//! a stage is hashed on its own with a fixed-seed hasher and the results are
//! combined with a wrapping sum. That only yields reproducible hashes across
//! runs if the per-element hasher itself is deterministic, which `std`'s
//! default (randomly seeded) hasher is not. `DetHasher` fills that role.

use std::hash::{BuildHasher, Hasher};

/// Deterministic, non-cryptographic hasher with a fixed seed.
#[derive(Debug, Clone)]
pub struct DetHasher {
    state: u64,
}

impl DetHasher {
    /// Fixed seed ensures identical hashes across runs.
    const SEED: u64 = 0x9e37_79b9_7f4a_7c15;
    /// Prime multiplier for mixing.
    const MULTIPLIER: u64 = 0x2545_f491_4f6c_dd1d;
}

impl Default for DetHasher {
    fn default() -> Self {
        Self { state: Self::SEED }
    }
}

impl Hasher for DetHasher {
    fn write(&mut self, bytes: &[u8]) {
        for &byte in bytes {
            self.state = self.state.wrapping_mul(Self::MULTIPLIER);
            self.state ^= u64::from(byte);
        }
    }

    fn write_u8(&mut self, i: u8) {
        self.state = self.state.wrapping_mul(Self::MULTIPLIER) ^ u64::from(i);
    }

    fn write_u64(&mut self, i: u64) {
        self.state = self.state.wrapping_mul(Self::MULTIPLIER) ^ i;
    }

    fn finish(&self) -> u64 {
        // Final avalanche for better bit distribution.
        let mut h = self.state;
        h ^= h >> 33;
        h = h.wrapping_mul(0xff51_afd7_ed55_8ccd);
        h ^= h >> 33;
        h = h.wrapping_mul(0xc4ce_b9fe_1a85_ec53);
        h ^= h >> 33;
        h
    }
}

/// Builder for deterministic hashers.
#[derive(Clone, Default)]
pub struct DetBuildHasher;

impl BuildHasher for DetBuildHasher {
    type Hasher = DetHasher;

    fn build_hasher(&self) -> Self::Hasher {
        DetHasher::default()
    }
}

/// `HashSet` with reproducible hashing across runs.
pub type DetHashSet<K> = std::collections::HashSet<K, DetBuildHasher>;
