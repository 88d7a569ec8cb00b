//! Core deterministic primitives.
//!
//! Vector math, the seeded RNG and state hashing. Everything above this
//! layer draws randomness only from [`DeterministicRng`].

pub mod vec2;
pub mod rng;
pub mod hash;

// Re-export core types
pub use vec2::Vec2;
pub use rng::DeterministicRng;
pub use hash::{compute_state_hash, StateHash, StateHasher};
