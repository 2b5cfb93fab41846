//! Gesture-driven runs: scrub by percent, then finish past the threshold
//! or cancel and rewind beneath it.

use kurbo::{Rect, Vec2};
use proptest::prelude::*;

use switchback_stage::{ScreenId, ShellScreen, Stage};
use switchback_transition::gesture::percent_for;
use switchback_transition::{
    InteractiveController, RunStatus, SwipeDirection, Transition, TransitionPhase,
};

const WIDTH: f64 = 400.0;

fn stage_pair() -> (Stage, ScreenId, ScreenId) {
    let mut stage = Stage::new(Rect::new(0.0, 0.0, WIDTH, 800.0));
    let a = stage.insert(Box::new(ShellScreen));
    let b = stage.insert(Box::new(ShellScreen));
    (stage, a, b)
}

#[test]
fn scrub_past_threshold_then_finish_completes_forward() {
    let (mut stage, a, b) = stage_pair();
    let mut t = Transition::builtin_push().with_duration(1.0);
    let _fwd = t.begin(&mut stage, TransitionPhase::Forward, a, b, 0.0, false);

    let mut run = t.begin(&mut stage, TransitionPhase::Backward, b, a, 0.0, true);
    let mut ctl = InteractiveController::new(run.duration(), 0.5);

    for percent in [0.0, 0.2, 0.6] {
        ctl.update(&mut run, percent);
        assert_eq!(run.advance(&mut stage, 0.5), RunStatus::Running);
    }
    // Paused runs track the finger, not the clock.
    assert!((run.progress(0.5) - 0.6).abs() < 1e-9);
    assert!(ctl.past_threshold());

    ctl.finish(&mut run, 1.0);
    assert_eq!(run.advance(&mut stage, 1.2), RunStatus::Running);
    assert_eq!(
        run.advance(&mut stage, 1.4),
        RunStatus::Finished { cancelled: false }
    );
    // The popped screen ends fully offstage.
    assert_eq!(stage.surface(b).unwrap().translation.x, WIDTH);
}

#[test]
fn scrub_below_threshold_then_cancel_rewinds_to_origin() {
    let (mut stage, a, b) = stage_pair();
    let mut t = Transition::builtin_push().with_duration(1.0);
    let _fwd = t.begin(&mut stage, TransitionPhase::Forward, a, b, 0.0, false);

    let mut run = t.begin(&mut stage, TransitionPhase::Backward, b, a, 0.0, true);
    let mut ctl = InteractiveController::new(run.duration(), 0.5);
    for percent in [0.0, 0.2, 0.4] {
        ctl.update(&mut run, percent);
    }
    assert!(!ctl.past_threshold());

    let deadline = ctl.cancel(&mut run, 1.0);
    assert!((deadline - 1.7).abs() < 1e-9);
    assert!(run.is_cancelled());

    assert_eq!(run.advance(&mut stage, 1.1), RunStatus::Running);
    assert_eq!(
        run.advance(&mut stage, 1.4),
        RunStatus::Finished { cancelled: true }
    );
    // Back where the backward phase started.
    assert_eq!(stage.surface(b).unwrap().translation.x, 0.0);

    t.finish_run(&mut stage, &run);
    assert!(stage.surface(a).unwrap().at_rest());
    assert!(stage.surface(b).unwrap().at_rest());
}

#[test]
fn pan_translations_map_to_run_progress() {
    let (mut stage, a, b) = stage_pair();
    let container = stage.bounds();
    let mut t = Transition::builtin_push().with_duration(1.0);
    let _fwd = t.begin(&mut stage, TransitionPhase::Forward, a, b, 0.0, false);

    let mut run = t.begin(&mut stage, TransitionPhase::Backward, b, a, 0.0, true);
    let mut ctl = InteractiveController::new(run.duration(), 0.5);

    let drag = Vec2::new(WIDTH * 0.3, 12.0);
    ctl.update(
        &mut run,
        percent_for(SwipeDirection::LeftToRight, drag, container),
    );
    assert!((ctl.percent() - 0.3).abs() < 1e-9);

    // Dragging against the direction clamps to zero, it never goes negative.
    let reverse = Vec2::new(-90.0, 0.0);
    ctl.update(
        &mut run,
        percent_for(SwipeDirection::LeftToRight, reverse, container),
    );
    assert_eq!(ctl.percent(), 0.0);
    assert!((run.progress(3.0) - 0.0).abs() < 1e-12);
}

proptest! {
    /// A tracked run follows the last clamped percent exactly and never
    /// completes on its own, no matter how wildly the finger scrubs.
    #[test]
    fn scrubbing_tracks_the_finger_and_never_self_completes(
        percents in proptest::collection::vec(-0.5f64..1.5, 1..24),
    ) {
        let (mut stage, a, b) = stage_pair();
        let mut t = Transition::builtin_push().with_duration(1.0);
        let _fwd = t.begin(&mut stage, TransitionPhase::Forward, a, b, 0.0, false);

        let mut run = t.begin(&mut stage, TransitionPhase::Backward, b, a, 0.0, true);
        let mut ctl = InteractiveController::new(run.duration(), 0.5);

        let mut last = 0.0f64;
        for &p in &percents {
            ctl.update(&mut run, p);
            last = p.clamp(0.0, 1.0);
            prop_assert_eq!(run.advance(&mut stage, 0.25), RunStatus::Running);
        }
        prop_assert!((ctl.percent() - last).abs() < 1e-9);
        prop_assert!((run.progress(0.25) - last).abs() < 1e-9);
    }
}
