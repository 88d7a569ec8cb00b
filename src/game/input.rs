//! Input Frames and Recording
//!
//! One [`InputFrame`] per tick drives the simulation. Button presses are
//! edge-triggered flags; guard is a held flag. An [`InputRecording`] keeps
//! only the ticks where input changed, so a run can be replayed from its
//! seed and recording to verify determinism.

use serde::{Serialize, Deserialize};

use crate::core::vec2::Vec2;

// =============================================================================
// INPUT FRAME
// =============================================================================

/// Input state for a single tick.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct InputFrame {
    /// Movement X, any magnitude (normalized by the player)
    pub move_x: f32,

    /// Movement Y, any magnitude (normalized by the player)
    pub move_y: f32,

    /// World-space aim point. `None` keeps the current facing.
    pub aim: Option<Vec2>,

    /// Packed bits:
    /// - Bit 0: attack pressed this tick
    /// - Bit 1-3: skill slot 1..3 pressed this tick
    /// - Bit 4: guard held
    /// - Bit 5: skip wave pressed this tick
    pub flags: u8,

    /// Index into the upgrade offer on screen, if picking this tick.
    pub upgrade_choice: Option<u8>,
}

impl InputFrame {
    /// Attack pressed
    pub const FLAG_ATTACK: u8 = 0x01;

    /// Skill slot 1 pressed
    pub const FLAG_SKILL_1: u8 = 0x02;

    /// Skill slot 2 pressed
    pub const FLAG_SKILL_2: u8 = 0x04;

    /// Skill slot 3 pressed
    pub const FLAG_SKILL_3: u8 = 0x08;

    /// Guard held
    pub const FLAG_GUARD: u8 = 0x10;

    /// Skip the current wave
    pub const FLAG_SKIP_WAVE: u8 = 0x20;

    /// Empty frame.
    pub const fn new() -> Self {
        Self {
            move_x: 0.0,
            move_y: 0.0,
            aim: None,
            flags: 0,
            upgrade_choice: None,
        }
    }

    /// Frame with only movement set.
    pub const fn with_movement(move_x: f32, move_y: f32) -> Self {
        Self {
            move_x,
            move_y,
            aim: None,
            flags: 0,
            upgrade_choice: None,
        }
    }

    /// Builder: set the aim point.
    pub fn aiming_at(mut self, aim: Vec2) -> Self {
        self.aim = Some(aim);
        self
    }

    /// Builder: set flag bits.
    pub fn with_flags(mut self, flags: u8) -> Self {
        self.flags |= flags;
        self
    }

    /// Movement vector (not normalized).
    #[inline]
    pub fn move_vector(&self) -> Vec2 {
        Vec2::new(self.move_x, self.move_y)
    }

    /// Attack pressed this tick?
    #[inline]
    pub fn attack_pressed(&self) -> bool {
        self.flags & Self::FLAG_ATTACK != 0
    }

    /// Was skill slot `slot` (1..=3) pressed this tick?
    #[inline]
    pub fn skill_pressed(&self, slot: u8) -> bool {
        match slot {
            1 => self.flags & Self::FLAG_SKILL_1 != 0,
            2 => self.flags & Self::FLAG_SKILL_2 != 0,
            3 => self.flags & Self::FLAG_SKILL_3 != 0,
            _ => false,
        }
    }

    /// Guard held?
    #[inline]
    pub fn guard_held(&self) -> bool {
        self.flags & Self::FLAG_GUARD != 0
    }

    /// Skip wave pressed this tick?
    #[inline]
    pub fn skip_wave_pressed(&self) -> bool {
        self.flags & Self::FLAG_SKIP_WAVE != 0
    }

    /// No movement, no aim, no buttons.
    #[inline]
    pub fn is_idle(&self) -> bool {
        *self == Self::new()
    }

    /// Set or clear a flag bit.
    #[inline]
    pub fn set_flag(&mut self, flag: u8, on: bool) {
        if on {
            self.flags |= flag;
        } else {
            self.flags &= !flag;
        }
    }
}

/// Input that took effect at a tick and persists until the next delta.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct InputDelta {
    /// Tick when this input state began
    pub tick: u32,
    /// The new input state
    pub frame: InputFrame,
}

// =============================================================================
// RECORDING
// =============================================================================

/// In-memory input recording for one run.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct InputRecording {
    /// Seed the run was started with
    pub seed: u64,

    /// Fixed tick length the run used (seconds)
    pub dt: f32,

    /// Last recorded tick
    pub end_tick: u32,

    /// Only ticks where input changed
    deltas: Vec<InputDelta>,

    #[serde(skip)]
    last_frame: InputFrame,
}

impl InputRecording {
    /// Start an empty recording.
    pub fn new(seed: u64, dt: f32) -> Self {
        Self {
            seed,
            dt,
            end_tick: 0,
            deltas: Vec::with_capacity(256),
            last_frame: InputFrame::new(),
        }
    }

    /// Record input for a tick. Only stores changes.
    pub fn record(&mut self, tick: u32, frame: InputFrame) {
        self.end_tick = tick;
        if frame != self.last_frame {
            self.deltas.push(InputDelta { tick, frame });
            self.last_frame = frame;
        }
    }

    /// Input in effect at `tick`.
    pub fn get_input_at(&self, tick: u32) -> InputFrame {
        let idx = self.deltas.partition_point(|d| d.tick <= tick);
        match idx {
            0 => InputFrame::new(),
            _ => self.deltas[idx - 1].frame,
        }
    }

    /// Stored deltas.
    pub fn deltas(&self) -> &[InputDelta] {
        &self.deltas
    }

    /// Number of stored deltas.
    pub fn delta_count(&self) -> usize {
        self.deltas.len()
    }

    /// Iterate `(tick, frame)` for every tick from 0 through `end_tick`.
    pub fn replay_iter(&self) -> ReplayIterator<'_> {
        ReplayIterator {
            recording: self,
            current_tick: 0,
            delta_idx: 0,
            current_frame: InputFrame::new(),
        }
    }
}

/// Tick-by-tick replay of a recording.
pub struct ReplayIterator<'a> {
    recording: &'a InputRecording,
    current_tick: u32,
    delta_idx: usize,
    current_frame: InputFrame,
}

impl<'a> Iterator for ReplayIterator<'a> {
    type Item = (u32, InputFrame);

    fn next(&mut self) -> Option<Self::Item> {
        if self.current_tick > self.recording.end_tick {
            return None;
        }

        while let Some(delta) = self.recording.deltas.get(self.delta_idx) {
            if delta.tick > self.current_tick {
                break;
            }
            self.current_frame = delta.frame;
            self.delta_idx += 1;
        }

        let result = (self.current_tick, self.current_frame);
        self.current_tick += 1;
        Some(result)
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags() {
        let mut frame = InputFrame::new();
        assert!(frame.is_idle());

        frame.set_flag(InputFrame::FLAG_ATTACK, true);
        frame.set_flag(InputFrame::FLAG_SKILL_2, true);
        frame.set_flag(InputFrame::FLAG_GUARD, true);
        assert!(frame.attack_pressed());
        assert!(!frame.skill_pressed(1));
        assert!(frame.skill_pressed(2));
        assert!(!frame.skill_pressed(4));
        assert!(frame.guard_held());
        assert!(!frame.skip_wave_pressed());

        frame.set_flag(InputFrame::FLAG_ATTACK, false);
        assert!(!frame.attack_pressed());
        assert!(!frame.is_idle());
    }

    #[test]
    fn test_builders() {
        let frame = InputFrame::with_movement(1.0, -1.0)
            .aiming_at(Vec2::new(3.0, 4.0))
            .with_flags(InputFrame::FLAG_SKILL_3);
        assert_eq!(frame.move_vector(), Vec2::new(1.0, -1.0));
        assert_eq!(frame.aim, Some(Vec2::new(3.0, 4.0)));
        assert!(frame.skill_pressed(3));
    }

    #[test]
    fn test_recording_stores_only_changes() {
        let mut rec = InputRecording::new(42, 1.0 / 60.0);
        let walk = InputFrame::with_movement(1.0, 0.0);

        rec.record(0, InputFrame::new());
        rec.record(1, walk);
        rec.record(2, walk);
        rec.record(3, walk);
        rec.record(4, InputFrame::new());

        assert_eq!(rec.delta_count(), 2);
        assert_eq!(rec.get_input_at(0), InputFrame::new());
        assert_eq!(rec.get_input_at(2), walk);
        assert_eq!(rec.get_input_at(4), InputFrame::new());
        assert_eq!(rec.get_input_at(99), InputFrame::new());
    }

    #[test]
    fn test_replay_iter() {
        let mut rec = InputRecording::new(7, 0.1);
        let attack = InputFrame::new().with_flags(InputFrame::FLAG_ATTACK);

        for tick in 0..6 {
            let frame = if tick == 2 { attack } else { InputFrame::new() };
            rec.record(tick, frame);
        }

        let replayed: Vec<_> = rec.replay_iter().collect();
        assert_eq!(replayed.len(), 6);
        assert_eq!(replayed[2], (2, attack));
        assert_eq!(replayed[3], (3, InputFrame::new()));
        for (tick, frame) in replayed {
            assert_eq!(frame, rec.get_input_at(tick));
        }
    }
}
