//! # Bladewave Simulation Core
//!
//! Deterministic combat simulation for Bladewave, a top-down wave-survival
//! action game: player actions, enemy AI, waves and progression.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    BLADEWAVE SIM                             │
//! ├─────────────────────────────────────────────────────────────┤
//! │  core/           - Deterministic primitives                  │
//! │  ├── vec2.rs     - 2D vector math                            │
//! │  ├── rng.rs      - Deterministic Xorshift128+ PRNG           │
//! │  └── hash.rs     - State hashing for verification            │
//! │                                                              │
//! │  game/           - Game logic (deterministic)                │
//! │  ├── action.rs   - Player action state machine               │
//! │  ├── enemy.rs    - Enemy pursuit/contact state machine       │
//! │  ├── boss.rs     - Boss telegraph/dash/death                 │
//! │  ├── wave.rs     - Spawn pacing and wave quotas              │
//! │  ├── world.rs    - Run state and outcome routing             │
//! │  └── tick.rs     - Authoritative simulation loop             │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Determinism
//!
//! - No HashMap (uses BTreeMap for sorted iteration)
//! - No system time dependencies; the caller supplies `dt`
//! - All randomness from seeded Xorshift128+
//!
//! Given identical inputs, `dt` sequence and seed, a run produces the same
//! events and the same SHA-256 state hash on the same platform. Simulation
//! time is `f32`, so cross-platform bit equality is not promised.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod core;
pub mod game;

// Re-export commonly used types
pub use core::vec2::Vec2;
pub use core::rng::DeterministicRng;
pub use game::config::SimConfig;
pub use game::input::{InputFrame, InputRecording};
pub use game::world::World;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Nominal tick rate (Hz) used by the demo binary and benches
pub const TICK_RATE: u32 = 60;

/// Seconds per tick at [`TICK_RATE`]
pub const TICK_DT: f32 = 1.0 / TICK_RATE as f32;
