//! Game Logic Module
//!
//! All combat simulation code. Deterministic given a seed and inputs.
//!
//! ## Module Structure
//!
//! - `input`: Per-tick input frames and recordings
//! - `world`: Run state, outcome routing
//! - `tick`: Authoritative simulation loop
//! - `action`: Player action state machine
//! - `cooldown`, `hit_registry`, `pose`, `rig`: Action building blocks
//! - `collision`: Hit geometry, strikes and knockback
//! - `projectile`: Fireballs and sword waves
//! - `enemy`, `boss`: Enemy state machines
//! - `wave`: Spawn pacing and wave progression
//! - `player`, `progression`: Player body, levels and upgrades
//! - `presentation`: Frame snapshots for a frontend
//! - `events`: Game events for presentation and replay verification
//! - `config`, `error`: Tuning and error types

pub mod action;
pub mod boss;
pub mod collision;
pub mod config;
pub mod cooldown;
pub mod enemy;
pub mod error;
pub mod events;
pub mod hit_registry;
pub mod input;
pub mod player;
pub mod pose;
pub mod presentation;
pub mod progression;
pub mod projectile;
pub mod rig;
pub mod tick;
pub mod wave;
pub mod world;

// Re-export key types
pub use action::{ActionController, ActionKind, ActionState};
pub use config::SimConfig;
pub use cooldown::Skill;
pub use enemy::{Agent, EnemyAgent, EnemyTier};
pub use error::{BindingError, ConfigError, SelectionError, SimError};
pub use events::{GameEvent, GameEventData};
pub use input::{InputFrame, InputRecording};
pub use presentation::FrameSnapshot;
pub use progression::UpgradeOption;
pub use tick::{tick, replay_run, TickResult};
pub use world::World;
