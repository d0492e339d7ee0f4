//! Hashing primitives for Cairn.
//!
//! Provides domain-separated BLAKE3 hashing and the skeleton extraction used
//! by content-addressed lines to tell a change of structure from a change of
//! values.

pub mod hasher;
pub mod skeleton;

pub use hasher::{ContentHasher, HasherError};
pub use skeleton::{skeleton, ANNOTATION_KEYS, VOLATILE_KEYS};
