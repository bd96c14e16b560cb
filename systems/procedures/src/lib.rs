#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Deterministic lifecycle of scripted procedures.
//!
//! Every procedure cycles through `Idle -> Movement -> BackWait ->
//! ReverseMovement -> Idle`. Progress is duration based, so any tick length
//! yields the same trajectory up to the instant a threshold is crossed. When a
//! stage threshold is crossed the excess progress is dropped rather than
//! carried into the next state.

use std::time::Duration;

use map_procedures_core::{
    MovementState, Procedure, ProcedureId, ProcedureSnapshot, TimePoint,
};

/// Divisor applied to a procedure's speed to obtain progress per second.
const SPEED_SCALE: f32 = 10.0;

/// Timing parameters of a procedure.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Timing {
    speed: f32,
    back_wait_s: f32,
}

impl Timing {
    /// Creates timing parameters from raw values.
    #[must_use]
    pub const fn new(speed: f32, back_wait_s: f32) -> Self {
        Self { speed, back_wait_s }
    }

    /// Extracts the timing parameters of a procedure definition.
    #[must_use]
    pub fn of(procedure: &Procedure) -> Self {
        Self::new(procedure.speed, procedure.back_wait_s)
    }

    /// Progress gained over `dt` while moving.
    #[must_use]
    pub fn stage_delta(&self, dt: Duration) -> f32 {
        dt.as_secs_f32() * self.speed / SPEED_SCALE
    }

    /// Reports whether the wait has lasted long enough to start retracting.
    ///
    /// A zero back-wait never expires: the geometry stays deployed.
    #[must_use]
    pub fn wait_expired(&self, waited: Duration) -> bool {
        self.back_wait_s > 0.0 && waited.as_secs_f32() >= self.back_wait_s
    }
}

/// Result of evaluating the transition table for one tick.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Step {
    /// State after the tick.
    pub state: MovementState,
    /// Progress inside `state` after the tick.
    pub stage: f32,
    /// Whether the tick crossed into a new state.
    pub transitioned: bool,
}

impl Step {
    const fn stay(state: MovementState, stage: f32) -> Self {
        Self {
            state,
            stage,
            transitioned: false,
        }
    }

    const fn enter(state: MovementState) -> Self {
        Self {
            state,
            stage: 0.0,
            transitioned: true,
        }
    }
}

/// Transition table of the procedure lifecycle.
///
/// `waited` is the time spent in the current state so far; it only matters
/// while in [`MovementState::BackWait`].
#[must_use]
pub fn step(
    state: MovementState,
    stage: f32,
    timing: Timing,
    dt: Duration,
    waited: Duration,
) -> Step {
    match state {
        MovementState::Idle => Step::stay(state, stage),
        MovementState::Movement => {
            let next = stage + timing.stage_delta(dt);
            if next >= 1.0 {
                Step::enter(MovementState::BackWait)
            } else {
                Step::stay(state, next)
            }
        }
        MovementState::BackWait => {
            if timing.wait_expired(waited) {
                Step::enter(MovementState::ReverseMovement)
            } else {
                Step::stay(state, stage)
            }
        }
        MovementState::ReverseMovement => {
            let next = stage + timing.stage_delta(dt);
            if next >= 1.0 {
                Step::enter(MovementState::Idle)
            } else {
                Step::stay(state, next)
            }
        }
    }
}

/// Maps a lifecycle position onto the progress that drives geometry.
///
/// The result deploys with `stage` while moving, holds at one while waiting,
/// and retracts back to zero while reversing.
#[must_use]
pub fn absolute_action_stage(state: MovementState, stage: f32) -> f32 {
    match state {
        MovementState::Idle => 0.0,
        MovementState::Movement => stage,
        MovementState::BackWait => 1.0,
        MovementState::ReverseMovement => 1.0 - stage,
    }
}

/// Lifecycle transition observed while advancing a procedure.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Transition {
    /// State held before the tick.
    pub from: MovementState,
    /// State held after the tick.
    pub to: MovementState,
}

/// Mutable runtime state of one procedure.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ProcedureState {
    state: MovementState,
    stage: f32,
    last_state_change: TimePoint,
}

impl Default for ProcedureState {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcedureState {
    /// Creates an idle procedure state.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            state: MovementState::Idle,
            stage: 0.0,
            last_state_change: TimePoint::ZERO,
        }
    }

    /// Current lifecycle state.
    #[must_use]
    pub const fn state(&self) -> MovementState {
        self.state
    }

    /// Progress inside the current state.
    #[must_use]
    pub const fn stage(&self) -> f32 {
        self.stage
    }

    /// Instant of the most recent transition.
    #[must_use]
    pub const fn last_state_change(&self) -> TimePoint {
        self.last_state_change
    }

    /// Starts the procedure if it is idle.
    ///
    /// Returns `false` and leaves the state untouched when the procedure is
    /// already moving, waiting or reversing.
    pub fn start(&mut self, now: TimePoint) -> bool {
        if self.state != MovementState::Idle {
            return false;
        }
        self.state = MovementState::Movement;
        self.stage = 0.0;
        self.last_state_change = now;
        true
    }

    /// Advances the procedure by one tick ending at `now`.
    pub fn advance(&mut self, timing: Timing, now: TimePoint, dt: Duration) -> Option<Transition> {
        let waited = now.saturating_since(self.last_state_change);
        let next = step(self.state, self.stage, timing, dt, waited);
        let from = self.state;
        self.state = next.state;
        self.stage = next.stage;
        if !next.transitioned {
            return None;
        }
        self.last_state_change = now;
        Some(Transition {
            from,
            to: next.state,
        })
    }

    /// Progress value that currently drives the procedure's geometry.
    #[must_use]
    pub fn absolute_action_stage(&self) -> f32 {
        absolute_action_stage(self.state, self.stage)
    }

    /// Captures an immutable snapshot of the state.
    #[must_use]
    pub fn snapshot(&self, id: ProcedureId) -> ProcedureSnapshot {
        ProcedureSnapshot {
            id,
            state: self.state,
            stage: self.stage,
            last_state_change: self.last_state_change,
            absolute_stage: self.absolute_action_stage(),
        }
    }
}
