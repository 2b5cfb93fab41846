#![forbid(unsafe_code)]

//! Transition values and phase runs.
//!
//! A [`Transition`] bundles an animator with its timing and gesture
//! configuration. Starting a phase builds a [`TransitionRun`]: the animator
//! contributes tracks through a [`PhaseContext`], the run owns a fresh
//! [`TransitionClock`] and samples the tracks each tick. The parameter
//! handoff (sender's `handoff_param` into receiver's
//! `transition_will_begin`) is delivered before the first sample of every
//! run, sender being the outgoing side of the phase.
//!
//! Transitions are single-use: one forward run, then at most one backward
//! run, then consumed. Callers check [`Transition::can_run`] and fall back
//! to a built-in when it fails.

use tracing::debug;

use kurbo::Rect;

use switchback_stage::{ScreenId, Stage, Surface};

use crate::animators::{PopupReveal, SystemSlide};
use crate::clock::TransitionClock;
use crate::gesture::SwipeDirection;
use crate::track::{Track, TrackTarget};

use switchback_core::PopupPlacement;

/// Default duration for custom transitions: twice the platform base
/// animation.
pub const DEFAULT_DURATION: f64 = 0.5;
/// Built-in push/present choreography.
pub const SYSTEM_DURATION: f64 = 0.35;
/// Forced duration for fake-push presentations: 1.5x the platform base.
pub const FAKE_PUSH_DURATION: f64 = 0.375;
/// Popup show/dismiss choreography.
pub const POPUP_DURATION: f64 = 0.3;

/// Which way a run plays the animator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionPhase {
    /// Appearance: push, present, popup show.
    Forward,
    /// Disappearance: pop, dismiss, popup dismiss.
    Backward,
}

/// Single-use lifecycle of a transition value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionLife {
    Fresh,
    ForwardDone,
    Consumed,
}

/// Where an animator describes a phase.
///
/// `from` is the outgoing side of the phase and `to` the incoming side;
/// tracks may target any mounted screen or a proxy added here. Animators
/// are pure choreography: the machinery owns time, percent, and gestures.
pub struct PhaseContext<'a> {
    pub stage: &'a mut Stage,
    pub from: ScreenId,
    pub to: ScreenId,
    pub phase: TransitionPhase,
    /// Stage bounds, for offstage distances and reveal extents.
    pub container: Rect,
    pub duration: f64,
    tracks: Vec<Track>,
    proxies: Vec<Surface>,
    instant: bool,
}

impl PhaseContext<'_> {
    pub fn add_track(&mut self, track: Track) {
        self.tracks.push(track);
    }

    /// Register a transient surface owned by the run; target it with the
    /// returned handle.
    pub fn add_proxy(&mut self, surface: Surface) -> TrackTarget {
        self.proxies.push(surface);
        TrackTarget::Proxy(self.proxies.len() - 1)
    }

    /// Declare the phase degenerate: the run completes on its first
    /// advance instead of playing out the clock.
    pub fn complete_now(&mut self) {
        self.instant = true;
    }
}

/// Builds the tracks for each phase of a transition.
pub trait TransitionAnimator: Send {
    /// Choreograph the appearance of `ctx.to` over `ctx.from`.
    fn present(&mut self, ctx: &mut PhaseContext<'_>);

    /// Choreograph the disappearance of `ctx.from`, revealing `ctx.to`.
    fn dismiss(&mut self, ctx: &mut PhaseContext<'_>);

    /// Restore whatever the phase touched, once, after the run ends.
    /// `cancelled` is true when an interactive backward run rewound.
    fn cleanup(&mut self, ctx: &mut PhaseContext<'_>, cancelled: bool) {
        let _ = cancelled;
        for id in [ctx.from, ctx.to] {
            if let Some(surface) = ctx.stage.surface_mut(id) {
                surface.reset_transients();
                surface.alpha = 1.0;
                surface.hidden = false;
            }
        }
    }
}

/// A configured, single-use transition.
pub struct Transition {
    duration: f64,
    threshold: f64,
    swipe: SwipeDirection,
    life: TransitionLife,
    animator: Box<dyn TransitionAnimator>,
}

impl Transition {
    /// A transition at [`DEFAULT_DURATION`] driven by a left-to-right
    /// swipe with the 0.5 finish threshold.
    #[must_use]
    pub fn new(animator: impl TransitionAnimator + 'static) -> Self {
        Self {
            duration: DEFAULT_DURATION,
            threshold: 0.5,
            swipe: SwipeDirection::LeftToRight,
            life: TransitionLife::Fresh,
            animator: Box::new(animator),
        }
    }

    /// # Panics
    ///
    /// The duration must be positive.
    #[must_use]
    pub fn with_duration(mut self, seconds: f64) -> Self {
        assert!(seconds > 0.0, "transition duration must be positive");
        self.duration = seconds;
        self
    }

    /// # Panics
    ///
    /// The threshold must be strictly between zero and one.
    #[must_use]
    pub fn with_threshold(mut self, threshold: f64) -> Self {
        assert!(
            threshold > 0.0 && threshold < 1.0,
            "interactive threshold must be strictly inside (0, 1)"
        );
        self.threshold = threshold;
        self
    }

    /// The gesture direction that drives the backward phase.
    #[must_use]
    pub fn with_swipe(mut self, direction: SwipeDirection) -> Self {
        self.swipe = direction;
        self
    }

    // ---- built-ins ----

    /// The stock push/pop choreography.
    #[must_use]
    pub fn builtin_push() -> Self {
        Self::new(SystemSlide::horizontal()).with_duration(SYSTEM_DURATION)
    }

    /// The stock present/dismiss choreography.
    #[must_use]
    pub fn builtin_present() -> Self {
        Self::new(SystemSlide::vertical())
            .with_duration(SYSTEM_DURATION)
            .with_swipe(SwipeDirection::TopToBottom)
    }

    /// The forced choreography for fake-push presentations.
    #[must_use]
    pub fn fake_push() -> Self {
        Self::new(SystemSlide::horizontal()).with_duration(FAKE_PUSH_DURATION)
    }

    /// Popup show/dismiss choreography for one placement.
    #[must_use]
    pub fn popup(placement: PopupPlacement) -> Self {
        Self::new(PopupReveal::new(placement))
            .with_duration(POPUP_DURATION)
            .with_swipe(SwipeDirection::TopToBottom)
    }

    // ---- accessors ----

    #[must_use]
    pub fn duration(&self) -> f64 {
        self.duration
    }

    #[must_use]
    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    #[must_use]
    pub fn swipe(&self) -> SwipeDirection {
        self.swipe
    }

    #[must_use]
    pub fn life(&self) -> TransitionLife {
        self.life
    }

    /// Whether this value may still play `phase`: forward only when fresh,
    /// backward only after forward.
    #[must_use]
    pub fn can_run(&self, phase: TransitionPhase) -> bool {
        match phase {
            TransitionPhase::Forward => self.life == TransitionLife::Fresh,
            TransitionPhase::Backward => self.life == TransitionLife::ForwardDone,
        }
    }

    /// Start a phase: deliver the handoff, let the animator build tracks,
    /// apply the first sample. Interactive runs start paused at zero.
    pub fn begin(
        &mut self,
        stage: &mut Stage,
        phase: TransitionPhase,
        from: ScreenId,
        to: ScreenId,
        now: f64,
        interactive: bool,
    ) -> TransitionRun {
        self.life = match phase {
            TransitionPhase::Forward => TransitionLife::ForwardDone,
            TransitionPhase::Backward => TransitionLife::Consumed,
        };

        let param = stage.screen(from).and_then(|s| s.handoff_param());
        if let Some(receiver) = stage.screen_mut(to) {
            receiver.transition_will_begin(param.as_ref());
        }

        let container = stage.bounds();
        let mut ctx = PhaseContext {
            stage,
            from,
            to,
            phase,
            container,
            duration: self.duration,
            tracks: Vec::new(),
            proxies: Vec::new(),
            instant: false,
        };
        match phase {
            TransitionPhase::Forward => self.animator.present(&mut ctx),
            TransitionPhase::Backward => self.animator.dismiss(&mut ctx),
        }
        let PhaseContext {
            tracks,
            proxies,
            instant,
            ..
        } = ctx;

        debug!(
            ?phase,
            %from,
            %to,
            tracks = tracks.len(),
            instant,
            interactive,
            "transition run begins"
        );

        let mut run = TransitionRun {
            phase,
            duration: self.duration,
            clock: TransitionClock::started_at(now),
            tracks,
            proxies,
            from,
            to,
            cancelled: false,
            done: instant,
        };
        if interactive {
            run.clock.pause(now);
        }
        run.sample(stage, now);
        run
    }

    /// Run the animator's cleanup for a finished run.
    pub fn finish_run(&mut self, stage: &mut Stage, run: &TransitionRun) {
        let container = stage.bounds();
        let mut ctx = PhaseContext {
            stage,
            from: run.from,
            to: run.to,
            phase: run.phase,
            container,
            duration: run.duration,
            tracks: Vec::new(),
            proxies: Vec::new(),
            instant: false,
        };
        self.animator.cleanup(&mut ctx, run.cancelled);
    }
}

impl std::fmt::Debug for Transition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Transition")
            .field("duration", &self.duration)
            .field("threshold", &self.threshold)
            .field("swipe", &self.swipe)
            .field("life", &self.life)
            .finish_non_exhaustive()
    }
}

/// What a run reports after advancing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Running,
    Finished { cancelled: bool },
}

/// One playing phase: clock plus sampled tracks plus proxy surfaces.
#[derive(Debug)]
pub struct TransitionRun {
    phase: TransitionPhase,
    duration: f64,
    clock: TransitionClock,
    tracks: Vec<Track>,
    proxies: Vec<Surface>,
    from: ScreenId,
    to: ScreenId,
    cancelled: bool,
    done: bool,
}

impl TransitionRun {
    /// Sample tracks at `now` and report completion. A paused run never
    /// completes; a cancelled run completes once it rewinds to the origin.
    pub fn advance(&mut self, stage: &mut Stage, now: f64) -> RunStatus {
        if self.done {
            return RunStatus::Finished {
                cancelled: self.cancelled,
            };
        }
        self.sample(stage, now);
        let local = self.clock.local_time(now);
        if self.cancelled {
            if local <= 0.0 {
                self.done = true;
                debug!(phase = ?self.phase, from = %self.from, "run rewound to origin, cancelled");
                return RunStatus::Finished { cancelled: true };
            }
        } else if !self.clock.is_paused() && local >= self.duration {
            self.done = true;
            return RunStatus::Finished { cancelled: false };
        }
        RunStatus::Running
    }

    fn sample(&mut self, stage: &mut Stage, now: f64) {
        let local = self.clock.local_time(now);
        let progress = (local / self.duration).clamp(0.0, 1.0);
        for i in 0..self.tracks.len() {
            let track = self.tracks[i].clone();
            match track.target {
                TrackTarget::Screen(id) => {
                    if let Some(surface) = stage.surface_mut(id) {
                        track.apply(progress, surface);
                    }
                }
                TrackTarget::Proxy(p) => {
                    if let Some(surface) = self.proxies.get_mut(p) {
                        track.apply(progress, surface);
                    }
                }
            }
        }
    }

    pub(crate) fn scrub(&mut self, percent: f64) {
        self.clock.scrub(self.duration, percent);
    }

    pub(crate) fn resume(&mut self, now: f64) {
        self.clock.resume(now);
    }

    pub(crate) fn cancel(&mut self, now: f64) {
        self.cancelled = true;
        self.clock.reverse(now);
    }

    /// Complete a cancelled run that somehow outlived its snap-back
    /// deadline.
    pub fn settle(&mut self) -> RunStatus {
        if self.cancelled {
            self.done = true;
        }
        if self.done {
            RunStatus::Finished {
                cancelled: self.cancelled,
            }
        } else {
            RunStatus::Running
        }
    }

    #[must_use]
    pub fn phase(&self) -> TransitionPhase {
        self.phase
    }

    #[must_use]
    pub fn duration(&self) -> f64 {
        self.duration
    }

    #[must_use]
    pub fn from(&self) -> ScreenId {
        self.from
    }

    #[must_use]
    pub fn to(&self) -> ScreenId {
        self.to
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled
    }

    #[must_use]
    pub fn is_done(&self) -> bool {
        self.done
    }

    /// Progress in `[0, 1]` at `now`, after easing windows but before
    /// per-track easing.
    #[must_use]
    pub fn progress(&self, now: f64) -> f64 {
        (self.clock.local_time(now) / self.duration).clamp(0.0, 1.0)
    }

    /// Transient surfaces owned by this run (morph proxies and the like).
    #[must_use]
    pub fn proxies(&self) -> &[Surface] {
        &self.proxies
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::easing::linear;
    use crate::track::TrackKind;
    use switchback_core::Value;
    use switchback_stage::Screen;

    struct FadeIn;

    impl TransitionAnimator for FadeIn {
        fn present(&mut self, ctx: &mut PhaseContext<'_>) {
            ctx.add_track(Track::new(
                TrackTarget::Screen(ctx.to),
                TrackKind::Alpha { from: 0.0, to: 1.0 },
                linear,
            ));
        }

        fn dismiss(&mut self, ctx: &mut PhaseContext<'_>) {
            ctx.add_track(Track::new(
                TrackTarget::Screen(ctx.from),
                TrackKind::Alpha { from: 1.0, to: 0.0 },
                linear,
            ));
        }
    }

    #[derive(Default)]
    struct Sender;
    impl Screen for Sender {
        fn handoff_param(&self) -> Option<Value> {
            Some(Value::from("token"))
        }
    }

    #[derive(Default)]
    struct Receiver {
        got: Option<String>,
    }
    impl Screen for Receiver {
        fn transition_will_begin(&mut self, param: Option<&Value>) {
            self.got = param.and_then(Value::as_str).map(str::to_string);
        }
    }

    struct Badge {
        tag: &'static str,
        got: Option<String>,
    }
    impl Screen for Badge {
        fn handoff_param(&self) -> Option<Value> {
            Some(Value::from(self.tag))
        }
        fn transition_will_begin(&mut self, param: Option<&Value>) {
            self.got = param.and_then(Value::as_str).map(str::to_string);
        }
    }

    fn stage_pair() -> (Stage, ScreenId, ScreenId) {
        let mut stage = Stage::new(Rect::new(0.0, 0.0, 100.0, 100.0));
        let from = stage.insert(Box::new(Sender));
        let to = stage.insert(Box::new(Receiver::default()));
        (stage, from, to)
    }

    #[test]
    fn forward_run_completes_at_duration() {
        let (mut stage, from, to) = stage_pair();
        let mut t = Transition::new(FadeIn).with_duration(0.5);
        assert!(t.can_run(TransitionPhase::Forward));
        let mut run = t.begin(&mut stage, TransitionPhase::Forward, from, to, 0.0, false);
        assert_eq!(t.life(), TransitionLife::ForwardDone);

        assert_eq!(run.advance(&mut stage, 0.25), RunStatus::Running);
        let mid_alpha = stage.surface(to).unwrap().alpha;
        assert!((mid_alpha - 0.5).abs() < 1e-9);
        assert_eq!(
            run.advance(&mut stage, 0.5),
            RunStatus::Finished { cancelled: false }
        );
        assert_eq!(stage.surface(to).unwrap().alpha, 1.0);
    }

    #[test]
    fn handoff_reaches_the_receiver_before_sampling() {
        let (mut stage, from, to) = stage_pair();
        let mut t = Transition::new(FadeIn);
        let _run = t.begin(&mut stage, TransitionPhase::Forward, from, to, 0.0, false);
        let receiver = stage.screen_as::<Receiver>(to).unwrap();
        assert_eq!(receiver.got.as_deref(), Some("token"));
    }

    #[test]
    fn backward_handoff_flows_from_the_outgoing_side() {
        let mut stage = Stage::new(Rect::new(0.0, 0.0, 100.0, 100.0));
        let a = stage.insert(Box::new(Badge { tag: "presenter", got: None }));
        let b = stage.insert(Box::new(Badge { tag: "modal", got: None }));
        let mut t = Transition::new(FadeIn).with_duration(0.1);

        let _fwd = t.begin(&mut stage, TransitionPhase::Forward, a, b, 0.0, false);
        assert_eq!(stage.screen_as::<Badge>(b).unwrap().got.as_deref(), Some("presenter"));

        let _back = t.begin(&mut stage, TransitionPhase::Backward, b, a, 1.0, false);
        assert_eq!(stage.screen_as::<Badge>(a).unwrap().got.as_deref(), Some("modal"));
    }

    #[test]
    fn life_consumes_after_both_phases() {
        let (mut stage, from, to) = stage_pair();
        let mut t = Transition::new(FadeIn).with_duration(0.1);
        let _f = t.begin(&mut stage, TransitionPhase::Forward, from, to, 0.0, false);
        assert!(!t.can_run(TransitionPhase::Forward));
        assert!(t.can_run(TransitionPhase::Backward));
        let _b = t.begin(&mut stage, TransitionPhase::Backward, to, from, 1.0, false);
        assert_eq!(t.life(), TransitionLife::Consumed);
        assert!(!t.can_run(TransitionPhase::Backward));
    }

    #[test]
    fn interactive_run_starts_paused_at_zero() {
        let (mut stage, from, to) = stage_pair();
        let mut t = Transition::new(FadeIn).with_duration(0.5);
        let mut run = t.begin(&mut stage, TransitionPhase::Forward, from, to, 0.0, true);
        // Paused: no amount of host time moves it.
        assert_eq!(run.advance(&mut stage, 10.0), RunStatus::Running);
        assert_eq!(stage.surface(to).unwrap().alpha, 0.0);
        assert!((run.progress(10.0) - 0.0).abs() < 1e-12);
    }

    #[test]
    fn cancelled_run_finishes_once_rewound() {
        let (mut stage, from, to) = stage_pair();
        let mut t = Transition::new(FadeIn).with_duration(0.5);
        let mut run = t.begin(&mut stage, TransitionPhase::Backward, to, from, 0.0, true);
        run.scrub(0.4);
        assert_eq!(run.advance(&mut stage, 1.0), RunStatus::Running);
        run.cancel(1.0);
        // local time 0.2, rewinding at unit speed.
        assert_eq!(run.advance(&mut stage, 1.1), RunStatus::Running);
        assert_eq!(
            run.advance(&mut stage, 1.25),
            RunStatus::Finished { cancelled: true }
        );
    }

    #[test]
    fn default_cleanup_returns_surfaces_to_rest() {
        let (mut stage, from, to) = stage_pair();
        let mut t = Transition::new(FadeIn).with_duration(0.5);
        let mut run = t.begin(&mut stage, TransitionPhase::Forward, from, to, 0.0, false);
        let _ = run.advance(&mut stage, 0.2);
        t.finish_run(&mut stage, &run);
        assert!(stage.surface(to).unwrap().at_rest());
        assert!(stage.surface(from).unwrap().at_rest());
    }
}
