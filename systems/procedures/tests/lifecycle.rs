use std::time::Duration;

use map_procedures_core::{MovementState, TimePoint};
use map_procedures_system_procedures::{ProcedureState, Timing, Transition};

const DOOR: Timing = Timing::new(10.0, 1.0);

struct Run {
    state: ProcedureState,
    now: TimePoint,
    transitions: Vec<(TimePoint, Transition)>,
    stages: Vec<(MovementState, f32)>,
}

impl Run {
    fn started() -> Self {
        let mut state = ProcedureState::new();
        assert!(state.start(TimePoint::ZERO));
        Self {
            state,
            now: TimePoint::ZERO,
            transitions: Vec::new(),
            stages: Vec::new(),
        }
    }

    fn tick(&mut self, timing: Timing, dt: Duration) {
        self.now = self.now.saturating_add(dt);
        if let Some(transition) = self.state.advance(timing, self.now, dt) {
            self.transitions.push((self.now, transition));
        }
        self.stages
            .push((self.state.state(), self.state.absolute_action_stage()));
    }

    fn until_idle(mut self, timing: Timing, dt: Duration) -> Self {
        for _ in 0..100_000 {
            self.tick(timing, dt);
            if self.state.state() == MovementState::Idle {
                return self;
            }
        }
        panic!("procedure never returned to idle");
    }
}

#[test]
fn cycle_length_does_not_depend_on_tick_length() {
    for millis in [5u64, 16, 50, 100, 250] {
        let dt = Duration::from_millis(millis);
        let run = Run::started().until_idle(DOOR, dt);

        let finished = run.now.since_start().as_secs_f32();
        let slack = 4.0 * dt.as_secs_f32() + 1e-3;
        assert!(
            (3.0 - 1e-3..=3.0 + slack).contains(&finished),
            "{millis} ms ticks finished after {finished} s"
        );
    }
}

#[test]
fn cycle_visits_every_state_once_in_order() {
    let run = Run::started().until_idle(DOOR, Duration::from_millis(20));

    let order: Vec<(MovementState, MovementState)> = run
        .transitions
        .iter()
        .map(|(_, transition)| (transition.from, transition.to))
        .collect();
    assert_eq!(
        order,
        vec![
            (MovementState::Movement, MovementState::BackWait),
            (MovementState::BackWait, MovementState::ReverseMovement),
            (MovementState::ReverseMovement, MovementState::Idle),
        ]
    );
    assert_eq!(run.state.last_state_change(), run.transitions[2].0);
}

#[test]
fn absolute_stage_rises_then_falls_inside_unit_interval() {
    let run = Run::started().until_idle(DOOR, Duration::from_millis(33));

    let mut previous = 0.0f32;
    for &(state, stage) in &run.stages {
        assert!((0.0..=1.0).contains(&stage), "stage {stage} escaped");
        match state {
            MovementState::Movement => assert!(stage >= previous),
            MovementState::BackWait => assert_eq!(stage, 1.0),
            MovementState::ReverseMovement => assert!(stage <= previous),
            MovementState::Idle => assert_eq!(stage, 0.0),
        }
        previous = stage;
    }
}

#[test]
fn zero_back_wait_holds_the_deployed_position() {
    let timing = Timing::new(10.0, 0.0);
    let mut run = Run::started();
    for _ in 0..1_000 {
        run.tick(timing, Duration::from_millis(50));
    }

    assert_eq!(run.state.state(), MovementState::BackWait);
    assert_eq!(run.state.absolute_action_stage(), 1.0);
    assert!(!run.state.start(run.now));
}

#[test]
fn procedure_restarts_after_returning_to_idle() {
    let mut run = Run::started().until_idle(DOOR, Duration::from_millis(100));
    let restart = run.now;

    assert!(run.state.start(restart));
    assert_eq!(run.state.state(), MovementState::Movement);
    assert_eq!(run.state.stage(), 0.0);

    run.tick(DOOR, Duration::from_millis(100));
    assert!((run.state.absolute_action_stage() - 0.1).abs() < 1e-5);
}
