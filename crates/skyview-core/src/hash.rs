//! Hashing for effect keys and the runtime's queued-observer set.
//!
//! `ahash` and `hashbrown` by default; the `std-hash` feature switches both
//! to the standard library.

use std::hash::{Hash, Hasher};

use crate::effect::Key;

#[cfg(not(feature = "std-hash"))]
mod backend {
    pub use hashbrown::HashSet;
    pub type KeyHasher = ahash::AHasher;
}

#[cfg(feature = "std-hash")]
mod backend {
    pub use std::collections::HashSet;
    pub type KeyHasher = std::collections::hash_map::DefaultHasher;
}

pub(crate) use backend::HashSet;

/// Reduce an effect's dependency value to the key compared between runs.
///
/// Seeds are fixed, so equal dependencies give equal keys for the whole
/// process.
#[inline]
pub fn dependency_key<T: Hash + ?Sized>(deps: &T) -> Key {
    let mut hasher = backend::KeyHasher::default();
    deps.hash(&mut hasher);
    hasher.finish()
}
