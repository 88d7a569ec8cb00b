//! Player Action State Machine
//!
//! Owns the timing of swings, guard, parry and skills. Exactly one action
//! runs at a time: [`ActionState`] is a single enum carrying the progress
//! of whichever action is active, so mutual exclusion holds by
//! construction.
//!
//! ## Lifecycle
//!
//! ```text
//! request_*() ──▶ enter (cooldown, registry, pose, Started event)
//!                   │
//!      tick() ──────┤ advance phase timers, test hitboxes, emit strikes
//!                   │
//!                   ▼
//!             exit_action(reason) ──▶ cleanup, Idle (or Guarding if held)
//! ```
//!
//! Every way out (completion, guard interrupt, `cancel`) goes through
//! `exit_action`, which restores the rest pose and clears the active flag.
//! The controller never touches enemies; hits come back as [`Strike`]s.

use std::collections::BTreeSet;
use serde::{Serialize, Deserialize};
use tracing::debug;

use crate::core::hash::StateHasher;
use crate::core::vec2::Vec2;
use crate::game::collision::{circles_overlap, Strike, StrikeSource, TargetView};
use crate::game::cooldown::{CooldownConfig, CooldownSet, Skill};
use crate::game::hit_registry::{HitRegistry, TargetId};
use crate::game::pose::{lerp, progress, smoothstep, Pose};
use crate::game::projectile::{ProjectileKind, ProjectileSpawn};
use crate::game::rig::ActorRig;

/// Slack when comparing accumulated phase time against a duration.
const PHASE_EPSILON: f32 = 1.0e-5;

#[inline]
fn phase_done(elapsed: f32, duration: f32) -> bool {
    elapsed + PHASE_EPSILON >= duration
}

// =============================================================================
// CONFIG
// =============================================================================

/// Timing and tuning for every player action.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ActionConfig {
    /// Damage of one swing hit at level 1
    pub base_attack_damage: u32,

    /// Swing duration (seconds)
    pub swing_duration: f32,
    /// Weapon angle at swing start (degrees off facing)
    pub swing_start_angle: f32,
    /// Weapon angle at swing end
    pub swing_end_angle: f32,

    /// Weapon angle while guarding
    pub guard_pose_angle: f32,
    /// Half-angle of the forward guard arc
    pub guard_half_angle: f32,

    /// Parry window (seconds)
    pub parry_window: f32,
    /// Weapon angle while parrying
    pub parry_pose_angle: f32,
    /// Half-angle of the forward parry arc
    pub parry_half_angle: f32,
    /// Counter damage as a multiple of attack damage
    pub counter_multiplier: u32,

    /// Spin blend in/out (seconds, each)
    pub spin_blend: f32,
    /// Spin rotation time
    pub spin_duration: f32,
    /// Spin rotation speed
    pub spin_turns_per_second: f32,
    /// Interval between registry clears while spinning
    pub spin_clear_interval: f32,
    /// Weapon angle held while spinning
    pub spin_hold_angle: f32,

    /// Off-hand extend time before launch
    pub fireball_extend: f32,
    /// Hold after launch
    pub fireball_hold: f32,
    /// Off-hand retract time
    pub fireball_retract: f32,

    /// Distance in front of the actor a sword wave starts at
    pub sword_wave_offset: f32,

    /// Blood slash tint-up time
    pub blood_slash_tint: f32,
    /// Blood slash full-rotation swing time
    pub blood_slash_swing: f32,
    /// Blood slash cosmetic expansion time
    pub blood_slash_expand: f32,
    /// Blood slash damage as a multiple of attack damage
    pub blood_slash_multiplier: u32,

    /// Cooldown durations
    pub cooldowns: CooldownConfig,
}

impl Default for ActionConfig {
    fn default() -> Self {
        Self {
            base_attack_damage: 1,
            swing_duration: 0.2,
            swing_start_angle: 60.0,
            swing_end_angle: -60.0,
            guard_pose_angle: 90.0,
            guard_half_angle: 60.0,
            parry_window: 0.5,
            parry_pose_angle: 45.0,
            parry_half_angle: 90.0,
            counter_multiplier: 2,
            spin_blend: 0.15,
            spin_duration: 1.0,
            spin_turns_per_second: 2.0,
            spin_clear_interval: 0.25,
            spin_hold_angle: 90.0,
            fireball_extend: 0.15,
            fireball_hold: 0.1,
            fireball_retract: 0.15,
            sword_wave_offset: 0.5,
            blood_slash_tint: 0.3,
            blood_slash_swing: 0.4,
            blood_slash_expand: 0.5,
            blood_slash_multiplier: 10,
            cooldowns: CooldownConfig::default(),
        }
    }
}

// =============================================================================
// STATE
// =============================================================================

/// Spin sub-phase.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SpinPhase {
    /// Arms sweep to the held pose
    BlendIn,
    /// Rotating, hitbox live
    Rotating,
    /// Arms return to rest
    BlendOut,
}

/// Fireball cast sub-phase.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CastPhase {
    /// Off-hand extending; launches at the end
    Extend,
    /// Brief hold after launch
    Hold,
    /// Off-hand returning
    Retract,
}

/// Blood slash sub-phase.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum BloodSlashPhase {
    /// Tint indicator building
    Tint,
    /// Full-rotation swing; detonates at the end
    Swing,
    /// Cosmetic shockwave
    Expand,
}

/// The single active action with its progress.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum ActionState {
    /// Nothing running
    Idle,
    /// Basic swing
    Attacking {
        /// Seconds into the swing
        elapsed: f32,
    },
    /// Weapon raised while guard is held
    Guarding,
    /// Spin attack
    Spinning {
        /// Current sub-phase
        phase: SpinPhase,
        /// Seconds into the sub-phase
        elapsed: f32,
        /// Seconds since the registry was last cleared
        since_clear: f32,
    },
    /// Parry window open
    Parrying {
        /// Seconds into the window
        elapsed: f32,
    },
    /// Fireball cast
    CastingFireball {
        /// Current sub-phase
        phase: CastPhase,
        /// Seconds into the sub-phase
        elapsed: f32,
    },
    /// Blood slash
    BloodSlash {
        /// Current sub-phase
        phase: BloodSlashPhase,
        /// Seconds into the sub-phase
        elapsed: f32,
    },
}

impl ActionState {
    /// Flat discriminant of this state.
    pub fn kind(&self) -> ActionKind {
        match self {
            ActionState::Idle => ActionKind::Idle,
            ActionState::Attacking { .. } => ActionKind::Attacking,
            ActionState::Guarding => ActionKind::Guarding,
            ActionState::Spinning { .. } => ActionKind::Spinning,
            ActionState::Parrying { .. } => ActionKind::Parrying,
            ActionState::CastingFireball { .. } => ActionKind::CastingFireball,
            ActionState::BloodSlash { .. } => ActionKind::BloodSlash,
        }
    }

    fn elapsed(&self) -> f32 {
        match *self {
            ActionState::Idle | ActionState::Guarding => 0.0,
            ActionState::Attacking { elapsed }
            | ActionState::Spinning { elapsed, .. }
            | ActionState::Parrying { elapsed }
            | ActionState::CastingFireball { elapsed, .. }
            | ActionState::BloodSlash { elapsed, .. } => elapsed,
        }
    }
}

/// Flat action discriminant for events and snapshots.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum ActionKind {
    /// Nothing running
    Idle = 0,
    /// Basic swing
    Attacking = 1,
    /// Guard held
    Guarding = 2,
    /// Spin attack
    Spinning = 3,
    /// Parry window
    Parrying = 4,
    /// Fireball cast
    CastingFireball = 5,
    /// Blood slash
    BloodSlash = 6,
}

/// Why an action ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExitReason {
    /// Ran to completion
    Completed,
    /// Pre-empted by guard
    Interrupted,
    /// Force-terminated (reset, disable, death)
    Cancelled,
    /// Guard input released
    Released,
}

/// Observable action transition.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum ActionEvent {
    /// An action began
    Started(ActionKind),
    /// An action ended
    Ended {
        /// Which action
        action: ActionKind,
        /// Why
        reason: ExitReason,
    },
}

/// What the controller exposes to enemy contact checks.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Exposure {
    /// Guard is up
    pub guarding: bool,
    /// Parry window is open
    pub parrying: bool,
    /// Guard arc half-angle (degrees)
    pub guard_half_angle: f32,
    /// Parry arc half-angle (degrees)
    pub parry_half_angle: f32,
}

/// Everything one controller tick produced.
#[derive(Clone, Debug, Default)]
pub struct ActionOutput {
    /// Damage requests against enemies
    pub strikes: Vec<Strike>,
    /// Projectiles to launch
    pub spawns: Vec<ProjectileSpawn>,
    /// Owner's hit points must drop to 1
    pub sacrifice: bool,
    /// Transitions, in order
    pub events: Vec<ActionEvent>,
}

// =============================================================================
// CONTROLLER
// =============================================================================

/// Player action state machine.
#[derive(Clone, Debug)]
pub struct ActionController {
    config: ActionConfig,
    rig: ActorRig,
    state: ActionState,
    guard_held: bool,
    pose: Pose,
    registry: HitRegistry,
    cooldowns: CooldownSet,
    unlocked: BTreeSet<Skill>,
    attack_damage: u32,
    /// Instant launches requested since the last tick
    queued_launches: Vec<ProjectileKind>,
    /// Output accumulated since the last tick
    pending: ActionOutput,
}

impl ActionController {
    /// Create an idle controller with only the basic attack unlocked.
    pub fn new(config: ActionConfig, rig: ActorRig) -> Self {
        let cooldowns = CooldownSet::new(&config.cooldowns);
        let attack_damage = config.base_attack_damage;
        let mut unlocked = BTreeSet::new();
        unlocked.insert(Skill::Attack);
        Self {
            config,
            rig,
            state: ActionState::Idle,
            guard_held: false,
            pose: Pose::REST,
            registry: HitRegistry::new(),
            cooldowns,
            unlocked,
            attack_damage,
            queued_launches: Vec::new(),
            pending: ActionOutput::default(),
        }
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Current state.
    pub fn state(&self) -> ActionState {
        self.state
    }

    /// Current state discriminant.
    pub fn kind(&self) -> ActionKind {
        self.state.kind()
    }

    /// Current pose.
    pub fn pose(&self) -> Pose {
        self.pose
    }

    /// Cooldown bookkeeping.
    pub fn cooldowns(&self) -> &CooldownSet {
        &self.cooldowns
    }

    /// Current per-hit swing damage.
    pub fn attack_damage(&self) -> u32 {
        self.attack_damage
    }

    /// Is `skill` unlocked?
    pub fn is_unlocked(&self, skill: Skill) -> bool {
        self.unlocked.contains(&skill)
    }

    /// Unlocked skills in index order.
    pub fn unlocked(&self) -> impl Iterator<Item = Skill> + '_ {
        self.unlocked.iter().copied()
    }

    /// Is guard input currently held?
    pub fn guard_held(&self) -> bool {
        self.guard_held
    }

    /// Bound rig.
    pub fn rig(&self) -> &ActorRig {
        &self.rig
    }

    /// Active-action registry (read-only).
    pub fn registry(&self) -> &HitRegistry {
        &self.registry
    }

    /// Guard/parry exposure for enemy contact checks.
    pub fn exposure(&self) -> Exposure {
        Exposure {
            guarding: matches!(self.state, ActionState::Guarding),
            parrying: matches!(self.state, ActionState::Parrying { .. }),
            guard_half_angle: self.config.guard_half_angle,
            parry_half_angle: self.config.parry_half_angle,
        }
    }

    /// Skill bound to an input slot by the current loadout.
    ///
    /// Slot 1 is Fireball, slot 2 is Spin or Parry, slot 3 is Sword Wave
    /// or Blood Slash, whichever is unlocked.
    pub fn slot_skill(&self, slot: u8) -> Option<Skill> {
        let candidates: &[Skill] = match slot {
            1 => &[Skill::Fireball],
            2 => &[Skill::Spin, Skill::Parry],
            3 => &[Skill::SwordWave, Skill::BloodSlash],
            _ => &[],
        };
        candidates.iter().copied().find(|s| self.is_unlocked(*s))
    }

    // =========================================================================
    // Requests
    // =========================================================================

    /// Start a swing. Ignored unless idle and off cooldown.
    pub fn request_attack(&mut self) -> bool {
        if !matches!(self.state, ActionState::Idle) || !self.cooldowns.is_ready(Skill::Attack) {
            return false;
        }
        self.registry.begin_activation();
        self.pose = Pose::with_weapon(self.config.swing_start_angle);
        self.enter(ActionState::Attacking { elapsed: 0.0 });
        true
    }

    /// Update the held guard input.
    ///
    /// Raising guard interrupts a swing; releasing it drops back to idle.
    /// Other actions keep running and guard is raised when they finish.
    pub fn set_guard_held(&mut self, held: bool) {
        self.guard_held = held;
        match (held, self.state) {
            (true, ActionState::Idle) => self.enter_guard(),
            (true, ActionState::Attacking { .. }) => {
                self.exit_action(ExitReason::Interrupted);
                self.enter_guard();
            }
            (false, ActionState::Guarding) => self.exit_action(ExitReason::Released),
            _ => {}
        }
    }

    /// Activate a skill. Ignored unless idle, unlocked, supported by the
    /// rig and off cooldown.
    pub fn request_skill(&mut self, skill: Skill) -> bool {
        if skill == Skill::Attack {
            return self.request_attack();
        }
        if !self.can_start(skill) {
            return false;
        }

        self.cooldowns.trigger(skill);
        match skill {
            Skill::Spin => {
                self.registry.begin_activation();
                self.enter(ActionState::Spinning {
                    phase: SpinPhase::BlendIn,
                    elapsed: 0.0,
                    since_clear: 0.0,
                });
            }
            Skill::Parry => {
                self.registry.begin_activation();
                self.pose = Pose::with_weapon(self.config.parry_pose_angle);
                self.enter(ActionState::Parrying { elapsed: 0.0 });
            }
            Skill::Fireball => {
                self.enter(ActionState::CastingFireball {
                    phase: CastPhase::Extend,
                    elapsed: 0.0,
                });
            }
            Skill::BloodSlash => {
                self.registry.begin_activation();
                self.enter(ActionState::BloodSlash {
                    phase: BloodSlashPhase::Tint,
                    elapsed: 0.0,
                });
            }
            Skill::SwordWave => {
                // Instant: no action state, launch resolved on the next tick
                self.queued_launches.push(ProjectileKind::SwordWave);
                debug!("sword wave queued");
            }
            Skill::Attack => {}
        }
        true
    }

    /// Activate whatever skill the loadout binds to `slot`.
    pub fn request_slot(&mut self, slot: u8) -> bool {
        match self.slot_skill(slot) {
            Some(skill) => self.request_skill(skill),
            None => false,
        }
    }

    /// Unlock a skill.
    pub fn unlock(&mut self, skill: Skill) {
        if self.unlocked.insert(skill) {
            debug!("unlocked {}", skill);
        }
    }

    /// Raise swing damage.
    pub fn increase_damage(&mut self, amount: u32) {
        self.attack_damage = self.attack_damage.saturating_add(amount);
    }

    /// Force-terminate whatever is running and drop held input.
    pub fn cancel(&mut self) {
        self.guard_held = false;
        self.queued_launches.clear();
        if !matches!(self.state, ActionState::Idle) {
            self.exit_action(ExitReason::Cancelled);
        }
    }

    /// Take whatever was produced since the last tick without advancing.
    pub fn drain(&mut self) -> ActionOutput {
        std::mem::take(&mut self.pending)
    }

    /// Parry counter hook, called by the world when an enemy touches the
    /// player inside the parry arc. Returns the counter strike at most once
    /// per enemy per window.
    pub fn on_parry_contact(&mut self, enemy: TargetId, enemy_position: Vec2, origin: Vec2) -> Option<Strike> {
        if !matches!(self.state, ActionState::Parrying { .. }) {
            return None;
        }
        if !self.registry.try_register(enemy) {
            return None;
        }
        let damage = self.attack_damage.saturating_mul(self.config.counter_multiplier);
        debug!("parry counter on enemy {} for {}", enemy, damage);
        Some(Strike::new(enemy, damage, StrikeSource::ParryCounter).with_knockback(enemy_position - origin))
    }

    /// Restore a fresh controller (cleanup runs for anything active).
    pub fn reset(&mut self) {
        self.cancel();
        self.cooldowns.reset();
        self.unlocked.clear();
        self.unlocked.insert(Skill::Attack);
        self.attack_damage = self.config.base_attack_damage;
        self.pending = ActionOutput::default();
    }

    // =========================================================================
    // Tick
    // =========================================================================

    /// Advance the active action by `dt` seconds.
    ///
    /// `targets` are the enemies that can currently be struck, in id order.
    pub fn tick(&mut self, dt: f32, origin: Vec2, facing: Vec2, targets: &[TargetView]) -> ActionOutput {
        self.cooldowns.advance(dt);
        let facing = facing.normalize_or(Vec2::UP);

        for kind in std::mem::take(&mut self.queued_launches) {
            self.pending.spawns.push(ProjectileSpawn {
                kind,
                origin: origin + facing * self.config.sword_wave_offset,
                direction: facing,
            });
        }

        match self.state {
            ActionState::Idle | ActionState::Guarding => {}
            ActionState::Attacking { elapsed } => {
                self.tick_attack(elapsed + dt, origin, facing, targets);
            }
            ActionState::Spinning { phase, elapsed, since_clear } => {
                self.tick_spin(phase, elapsed + dt, since_clear + dt, origin, targets);
            }
            ActionState::Parrying { elapsed } => {
                let elapsed = elapsed + dt;
                self.state = ActionState::Parrying { elapsed };
                if phase_done(elapsed, self.config.parry_window) {
                    self.exit_action(ExitReason::Completed);
                }
            }
            ActionState::CastingFireball { phase, elapsed } => {
                self.tick_fireball(phase, elapsed + dt, origin, facing);
            }
            ActionState::BloodSlash { phase, elapsed } => {
                self.tick_blood_slash(phase, elapsed + dt, targets);
            }
        }

        if self.guard_held && matches!(self.state, ActionState::Idle) {
            self.enter_guard();
        }

        std::mem::take(&mut self.pending)
    }

    fn tick_attack(&mut self, elapsed: f32, origin: Vec2, facing: Vec2, targets: &[TargetView]) {
        let from = self.pose.weapon_angle;
        let t = smoothstep(progress(elapsed, self.config.swing_duration));
        self.pose.weapon_angle = lerp(self.config.swing_start_angle, self.config.swing_end_angle, t);
        self.state = ActionState::Attacking { elapsed };

        // Everything the blade passed through since the last pose
        let to = self.pose.weapon_angle;
        for target in targets {
            if self.rig.blade_sweep_overlap(origin, facing, from, to, target)
                && self.registry.try_register(target.id)
            {
                self.pending
                    .strikes
                    .push(Strike::new(target.id, self.attack_damage, StrikeSource::Swing));
            }
        }

        if phase_done(elapsed, self.config.swing_duration) {
            self.exit_action(ExitReason::Completed);
        }
    }

    fn tick_spin(&mut self, phase: SpinPhase, elapsed: f32, since_clear: f32, origin: Vec2, targets: &[TargetView]) {
        let hold = self.config.spin_hold_angle;
        match phase {
            SpinPhase::BlendIn => {
                self.pose.weapon_angle = lerp(0.0, hold, smoothstep(progress(elapsed, self.config.spin_blend)));
                self.state = if phase_done(elapsed, self.config.spin_blend) {
                    ActionState::Spinning { phase: SpinPhase::Rotating, elapsed: 0.0, since_clear: 0.0 }
                } else {
                    ActionState::Spinning { phase, elapsed, since_clear: 0.0 }
                };
            }
            SpinPhase::Rotating => {
                let mut since_clear = since_clear;
                let interval = self.config.spin_clear_interval;
                if interval > 0.0 {
                    while since_clear + PHASE_EPSILON >= interval {
                        self.registry.clear_periodically();
                        since_clear -= interval;
                    }
                }

                let turns = self.config.spin_turns_per_second * elapsed;
                self.pose.weapon_angle = hold + (turns.fract() * 360.0);

                // No arc limit: anything within weapon reach is struck
                let reach = self.rig.reach();
                for target in targets {
                    if circles_overlap(origin, reach, target.position, target.radius)
                        && self.registry.try_register(target.id)
                    {
                        self.pending
                            .strikes
                            .push(Strike::new(target.id, self.attack_damage, StrikeSource::Spin));
                    }
                }

                self.state = if phase_done(elapsed, self.config.spin_duration) {
                    self.pose.weapon_angle = hold;
                    ActionState::Spinning { phase: SpinPhase::BlendOut, elapsed: 0.0, since_clear: 0.0 }
                } else {
                    ActionState::Spinning { phase, elapsed, since_clear }
                };
            }
            SpinPhase::BlendOut => {
                self.pose.weapon_angle = lerp(hold, 0.0, smoothstep(progress(elapsed, self.config.spin_blend)));
                self.state = ActionState::Spinning { phase, elapsed, since_clear: 0.0 };
                if phase_done(elapsed, self.config.spin_blend) {
                    self.exit_action(ExitReason::Completed);
                }
            }
        }
    }

    fn tick_fireball(&mut self, phase: CastPhase, elapsed: f32, origin: Vec2, facing: Vec2) {
        match phase {
            CastPhase::Extend => {
                self.pose.off_hand_extension = smoothstep(progress(elapsed, self.config.fireball_extend));
                if phase_done(elapsed, self.config.fireball_extend) {
                    self.pose.off_hand_extension = 1.0;
                    if let Some(tip) = self.rig.off_hand_tip(origin, facing, 1.0) {
                        self.pending.spawns.push(ProjectileSpawn {
                            kind: ProjectileKind::Fireball,
                            origin: tip,
                            direction: facing,
                        });
                    }
                    self.state = ActionState::CastingFireball { phase: CastPhase::Hold, elapsed: 0.0 };
                } else {
                    self.state = ActionState::CastingFireball { phase, elapsed };
                }
            }
            CastPhase::Hold => {
                self.state = if phase_done(elapsed, self.config.fireball_hold) {
                    ActionState::CastingFireball { phase: CastPhase::Retract, elapsed: 0.0 }
                } else {
                    ActionState::CastingFireball { phase, elapsed }
                };
            }
            CastPhase::Retract => {
                self.pose.off_hand_extension =
                    1.0 - smoothstep(progress(elapsed, self.config.fireball_retract));
                self.state = ActionState::CastingFireball { phase, elapsed };
                if phase_done(elapsed, self.config.fireball_retract) {
                    self.exit_action(ExitReason::Completed);
                }
            }
        }
    }

    fn tick_blood_slash(&mut self, phase: BloodSlashPhase, elapsed: f32, targets: &[TargetView]) {
        match phase {
            BloodSlashPhase::Tint => {
                self.pose.tint = progress(elapsed, self.config.blood_slash_tint);
                self.state = if phase_done(elapsed, self.config.blood_slash_tint) {
                    ActionState::BloodSlash { phase: BloodSlashPhase::Swing, elapsed: 0.0 }
                } else {
                    ActionState::BloodSlash { phase, elapsed }
                };
            }
            BloodSlashPhase::Swing => {
                let t = smoothstep(progress(elapsed, self.config.blood_slash_swing));
                self.pose.weapon_angle = self.config.swing_start_angle - 360.0 * t;
                self.pose.tint = 1.0;
                if phase_done(elapsed, self.config.blood_slash_swing) {
                    self.detonate_blood_slash(targets);
                    self.state = ActionState::BloodSlash { phase: BloodSlashPhase::Expand, elapsed: 0.0 };
                } else {
                    self.state = ActionState::BloodSlash { phase, elapsed };
                }
            }
            BloodSlashPhase::Expand => {
                let p = progress(elapsed, self.config.blood_slash_expand);
                self.pose.effect_scale = smoothstep(p);
                self.pose.tint = 1.0 - p;
                self.state = ActionState::BloodSlash { phase, elapsed };
                if phase_done(elapsed, self.config.blood_slash_expand) {
                    self.exit_action(ExitReason::Completed);
                }
            }
        }
    }

    fn detonate_blood_slash(&mut self, targets: &[TargetView]) {
        let damage = self.attack_damage.saturating_mul(self.config.blood_slash_multiplier);
        self.pending.sacrifice = true;
        for target in targets {
            if self.registry.try_register(target.id) {
                self.pending
                    .strikes
                    .push(Strike::new(target.id, damage, StrikeSource::BloodSlash));
            }
        }
        debug!("blood slash detonated on {} enemies for {}", self.registry.len(), damage);
    }

    // =========================================================================
    // Transitions
    // =========================================================================

    fn can_start(&self, skill: Skill) -> bool {
        matches!(self.state, ActionState::Idle)
            && self.is_unlocked(skill)
            && self.rig.supports(skill)
            && self.cooldowns.is_ready(skill)
    }

    fn enter(&mut self, state: ActionState) {
        let kind = state.kind();
        self.state = state;
        self.pending.events.push(ActionEvent::Started(kind));
        debug!("action started: {:?}", kind);
    }

    fn enter_guard(&mut self) {
        self.pose = Pose::with_weapon(self.config.guard_pose_angle);
        self.enter(ActionState::Guarding);
    }

    /// Single exit path for every action.
    fn exit_action(&mut self, reason: ExitReason) {
        let kind = self.state.kind();
        if let ActionState::Attacking { .. } = self.state {
            self.cooldowns.trigger(Skill::Attack);
        }
        self.state = ActionState::Idle;
        self.pose = Pose::REST;
        self.pending.events.push(ActionEvent::Ended { action: kind, reason });
        debug!("action ended: {:?} ({:?})", kind, reason);
    }

    /// Feed controller state into a state hash.
    pub fn hash_into(&self, hasher: &mut StateHasher) {
        hasher.update_u8(self.state.kind() as u8);
        hasher.update_f32(self.state.elapsed());
        hasher.update_bool(self.guard_held);
        hasher.update_f32(self.pose.weapon_angle);
        hasher.update_f32(self.pose.off_hand_extension);
        hasher.update_u32(self.attack_damage);
        for skill in Skill::ALL {
            hasher.update_bool(self.is_unlocked(skill));
            hasher.update_f32(self.cooldowns.remaining(skill));
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::rig::{RigConfig, RigPart};
    use proptest::prelude::*;

    const DT: f32 = 0.05;

    fn controller() -> ActionController {
        let (rig, _) = ActorRig::bind(&RigConfig::default()).unwrap();
        ActionController::new(ActionConfig::default(), rig)
    }

    fn controller_with_all() -> ActionController {
        let mut c = controller();
        for skill in Skill::ALL {
            c.unlock(skill);
        }
        c
    }

    fn target(id: u32, x: f32, y: f32) -> TargetView {
        TargetView { id, position: Vec2::new(x, y), radius: 0.35 }
    }

    fn run(c: &mut ActionController, seconds: f32, targets: &[TargetView]) -> ActionOutput {
        let mut all = ActionOutput::default();
        let steps = (seconds / DT).round() as usize;
        for _ in 0..steps {
            let out = c.tick(DT, Vec2::ZERO, Vec2::UP, targets);
            all.strikes.extend(out.strikes);
            all.spawns.extend(out.spawns);
            all.sacrifice |= out.sacrifice;
            all.events.extend(out.events);
        }
        all
    }

    #[test]
    fn test_swing_hits_once_per_activation() {
        let mut c = controller();
        // In front, overlapped by the blade for several ticks of the swing
        let enemy = [target(1, 0.0, 0.5)];

        assert!(c.request_attack());
        let out = run(&mut c, 0.2, &enemy);

        assert_eq!(out.strikes.len(), 1);
        assert_eq!(out.strikes[0].damage, 1);
        assert_eq!(c.kind(), ActionKind::Idle);
        assert!(c.pose().is_rest());
    }

    #[test]
    fn test_swing_sweeps_between_sampled_poses() {
        let mut c = controller();
        // 20 degrees off facing: the sampled poses at 60, 41.25 and 0 all miss it
        let position = Vec2::UP.rotate(20f32.to_radians()) * 1.6;
        let enemy = [target(1, position.x, position.y)];

        assert!(c.request_attack());
        let out = run(&mut c, 0.2, &enemy);

        assert_eq!(out.strikes.len(), 1);
        assert_eq!(out.strikes[0].target, 1);
        assert_eq!(out.strikes[0].source, StrikeSource::Swing);
    }

    #[test]
    fn test_swing_eases_between_poses() {
        let mut c = controller();
        c.request_attack();
        assert_eq!(c.pose().weapon_angle, 60.0);

        c.tick(0.1, Vec2::ZERO, Vec2::UP, &[]);
        assert!(c.pose().weapon_angle.abs() < 1e-4);
    }

    #[test]
    fn test_attack_cooldown_after_swing() {
        let mut c = controller();
        c.request_attack();
        run(&mut c, 0.2, &[]);

        // Cooldown triggered at swing close
        assert!(!c.request_attack());
        run(&mut c, 0.1, &[]);
        assert!(c.request_attack());
    }

    #[test]
    fn test_requests_blocked_while_busy() {
        let mut c = controller_with_all();
        assert!(c.request_skill(Skill::Parry));
        assert!(!c.request_attack());
        assert!(!c.request_skill(Skill::Spin));
        assert!(!c.request_skill(Skill::Fireball));
        assert_eq!(c.kind(), ActionKind::Parrying);
    }

    #[test]
    fn test_locked_skill_ignored() {
        let mut c = controller();
        assert!(!c.request_skill(Skill::Spin));
        assert!(!c.request_slot(2));
        assert_eq!(c.kind(), ActionKind::Idle);
    }

    #[test]
    fn test_slot_loadout() {
        let mut c = controller();
        assert_eq!(c.slot_skill(1), None);
        c.unlock(Skill::Parry);
        c.unlock(Skill::BloodSlash);
        assert_eq!(c.slot_skill(2), Some(Skill::Parry));
        assert_eq!(c.slot_skill(3), Some(Skill::BloodSlash));
        c.unlock(Skill::Fireball);
        assert_eq!(c.slot_skill(1), Some(Skill::Fireball));
        assert_eq!(c.slot_skill(9), None);
    }

    #[test]
    fn test_guard_interrupts_attack() {
        let mut c = controller();
        c.request_attack();
        c.tick(DT, Vec2::ZERO, Vec2::UP, &[]);

        c.set_guard_held(true);
        assert_eq!(c.kind(), ActionKind::Guarding);
        assert_eq!(c.pose().weapon_angle, 90.0);
        // Attack cleanup triggered its cooldown
        assert!(c.cooldowns().remaining(Skill::Attack) > 0.0);

        let out = c.tick(DT, Vec2::ZERO, Vec2::UP, &[]);
        assert_eq!(
            out.events,
            vec![
                ActionEvent::Ended { action: ActionKind::Attacking, reason: ExitReason::Interrupted },
                ActionEvent::Started(ActionKind::Guarding),
            ]
        );
        assert!(out.strikes.is_empty());

        c.set_guard_held(false);
        assert_eq!(c.kind(), ActionKind::Idle);
        assert!(c.pose().is_rest());
    }

    #[test]
    fn test_guard_waits_for_skill_to_finish() {
        let mut c = controller_with_all();
        c.request_skill(Skill::Parry);
        c.set_guard_held(true);
        assert_eq!(c.kind(), ActionKind::Parrying);

        run(&mut c, 0.5, &[]);
        assert_eq!(c.kind(), ActionKind::Guarding);
    }

    #[test]
    fn test_parry_counter_once_per_enemy() {
        let mut c = controller_with_all();
        c.increase_damage(2);
        c.request_skill(Skill::Parry);

        let first = c.on_parry_contact(4, Vec2::new(0.0, 0.3), Vec2::ZERO).unwrap();
        assert_eq!(first.damage, 6);
        assert_eq!(first.source, StrikeSource::ParryCounter);
        assert!(first.knockback.is_some());

        assert!(c.on_parry_contact(4, Vec2::new(0.0, 0.3), Vec2::ZERO).is_none());
        assert!(c.on_parry_contact(5, Vec2::new(0.3, 0.0), Vec2::ZERO).is_some());

        run(&mut c, 0.5, &[]);
        assert_eq!(c.kind(), ActionKind::Idle);
        assert!(c.on_parry_contact(6, Vec2::ZERO, Vec2::ZERO).is_none());
    }

    #[test]
    fn test_spin_clears_registry_periodically() {
        let mut c = controller_with_all();
        let enemy = [target(1, 1.0, 0.0)];
        assert!(c.request_skill(Skill::Spin));

        let out = run(&mut c, 0.15 + 1.0 + 0.15, &enemy);
        let hits = out.strikes.iter().filter(|s| s.source == StrikeSource::Spin).count();
        // One hit per 0.25s clear interval across the 1.0s rotation
        assert!((4..=5).contains(&hits), "got {} hits", hits);
        assert_eq!(c.kind(), ActionKind::Idle);
        assert!(c.pose().is_rest());
    }

    #[test]
    fn test_fireball_launches_from_off_hand() {
        let mut c = controller_with_all();
        assert!(c.request_skill(Skill::Fireball));

        let out = run(&mut c, 0.15, &[]);
        assert_eq!(out.spawns.len(), 1);
        assert_eq!(out.spawns[0].kind, ProjectileKind::Fireball);
        assert!((out.spawns[0].origin.y - 0.6).abs() < 1e-4);
        assert_eq!(c.pose().off_hand_extension, 1.0);

        run(&mut c, 0.25, &[]);
        assert_eq!(c.kind(), ActionKind::Idle);
        assert_eq!(c.pose().off_hand_extension, 0.0);
    }

    #[test]
    fn test_fireball_unavailable_without_off_hand() {
        let config = RigConfig { parts: vec![RigPart::new("weapon", 1.4)], hilt_offset: 0.3 };
        let (rig, _) = ActorRig::bind(&config).unwrap();
        let mut c = ActionController::new(ActionConfig::default(), rig);
        c.unlock(Skill::Fireball);
        assert!(!c.request_skill(Skill::Fireball));
    }

    #[test]
    fn test_cancel_mid_cast_restores_pose() {
        let mut c = controller_with_all();
        c.request_skill(Skill::Fireball);
        c.tick(DT, Vec2::ZERO, Vec2::UP, &[]);
        assert!(c.pose().off_hand_extension > 0.0);

        c.cancel();
        assert_eq!(c.kind(), ActionKind::Idle);
        assert!(c.pose().is_rest());

        // Cancelled before launch: nothing fires later
        let out = run(&mut c, 0.5, &[]);
        assert!(out.spawns.is_empty());
    }

    #[test]
    fn test_sword_wave_is_instant() {
        let mut c = controller_with_all();
        assert!(c.request_skill(Skill::SwordWave));
        assert_eq!(c.kind(), ActionKind::Idle);

        let out = c.tick(DT, Vec2::ZERO, Vec2::UP, &[]);
        assert_eq!(out.spawns.len(), 1);
        assert_eq!(out.spawns[0].kind, ProjectileKind::SwordWave);
        assert!(!c.request_skill(Skill::SwordWave));
    }

    #[test]
    fn test_blood_slash_hits_everything_once() {
        let mut c = controller_with_all();
        let enemies = [target(1, 8.0, 5.0), target(2, -7.0, -3.0)];
        assert!(c.request_skill(Skill::BloodSlash));

        let out = run(&mut c, 0.3 + 0.4 + 0.5, &enemies);
        assert!(out.sacrifice);
        assert_eq!(out.strikes.len(), 2);
        assert!(out.strikes.iter().all(|s| s.damage == 10));
        assert_eq!(c.kind(), ActionKind::Idle);
        assert_eq!(c.pose().tint, 0.0);
        assert!((c.cooldowns().remaining(Skill::BloodSlash) - 18.8).abs() < 1e-3);
    }

    #[test]
    fn test_exposure_tracks_state() {
        let mut c = controller_with_all();
        assert!(!c.exposure().guarding);
        c.set_guard_held(true);
        assert!(c.exposure().guarding);
        c.set_guard_held(false);
        c.request_skill(Skill::Parry);
        assert!(c.exposure().parrying);
        assert!(!c.exposure().guarding);
    }

    proptest! {
        #[test]
        fn test_random_requests_keep_invariants(
            ops in proptest::collection::vec((0u8..8, 0.0f32..0.1), 1..200)
        ) {
            let mut c = controller_with_all();
            let enemy = [target(1, 0.0, 1.0)];

            for (op, dt) in ops {
                match op {
                    0 => { c.request_attack(); }
                    1 => c.set_guard_held(true),
                    2 => c.set_guard_held(false),
                    3 => { c.request_slot(1); }
                    4 => { c.request_slot(2); }
                    5 => { c.request_slot(3); }
                    6 => c.cancel(),
                    _ => { c.request_skill(Skill::Parry); }
                }
                c.tick(dt, Vec2::ZERO, Vec2::UP, &enemy);

                for skill in Skill::ALL {
                    prop_assert!(c.cooldowns().remaining(skill) >= 0.0);
                }
                if c.kind() == ActionKind::Idle {
                    prop_assert!(!c.exposure().guarding && !c.exposure().parrying);
                }
            }
        }
    }
}
