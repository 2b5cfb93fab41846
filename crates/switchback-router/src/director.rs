#![forbid(unsafe_code)]

//! The director owns the stage and everything that moves on it.
//!
//! Submission is two-staged: a [`DirectorHandle`] gates each intent through
//! the hub's interceptors synchronously, then queues it; the director
//! drains the queue on [`tick`](Director::tick) and dispatches one of the
//! routing strategies. Animated strategies become transition runs that the
//! director advances against its virtual clock; their structural commits
//! (pop, dismissal) land only when the run finishes uncancelled, so an
//! interactive cancel leaves the stage exactly as it was.
//!
//! Forward transitions that survive their run are parked per screen and
//! picked back up by the matching backward operation, which is how a
//! custom push animation also drives its pop.

use std::any::TypeId;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;
use std::time::Duration;

use kurbo::Rect;
use tracing::{debug, trace, warn};

use switchback_core::{
    HandlerAffinity, Payload, PopupOptions, PopupPlacement, PresentOptions, PresentStyle,
    PushOptions, RouteConfig, SwitchOptions,
};
use switchback_stage::resolve;
use switchback_stage::{Screen, ScreenId, ScreenKind, Stage, StageError};
use switchback_transition::{
    InteractiveController, Pan, PanPhase, RunStatus, SYSTEM_DURATION, SwipeDirection, SystemSlide,
    Transition, TransitionLife, TransitionPhase, TransitionRun, gesture,
};

use crate::engine;
use crate::handler::Handler;
use crate::hub::Hub;
use crate::interceptor::{self, Intercepted};
use crate::route::Route;

/// One-shot callback fired when an intent's work is over. Animated
/// operations fire it when their run completes; synchronous ones fire it
/// during the op. A vetoed intent drops it unfired.
pub type CompletionFn = Box<dyn FnOnce() + Send>;

enum Op {
    Route(Route, Option<CompletionFn>),
    Handler(Handler, Option<CompletionFn>),
}

/// Cloneable submission endpoint for a [`Director`].
///
/// Handles gate and queue; they never touch the stage. Submitting after
/// the director is gone drops the intent with a warning.
#[derive(Clone)]
pub struct DirectorHandle {
    ops: Sender<Op>,
    hub: Arc<Hub>,
}

impl DirectorHandle {
    /// Submit a routing intent. Returns whether it passed the interceptor
    /// gate and was queued.
    pub fn submit(&self, route: Route) -> bool {
        self.submit_route(route, None)
    }

    /// Submit a routing intent with a completion callback.
    pub fn submit_with(&self, route: Route, completion: CompletionFn) -> bool {
        self.submit_route(route, Some(completion))
    }

    /// Submit an action intent. Background-affinity handlers run on a
    /// spawned thread immediately; main-affinity ones queue behind
    /// routing work.
    pub fn submit_handler(&self, handler: Handler) -> bool {
        self.submit_action(handler, None)
    }

    /// Submit an action intent with a completion callback. For background
    /// handlers the completion runs on the handler's thread.
    pub fn submit_handler_with(&self, handler: Handler, completion: CompletionFn) -> bool {
        self.submit_action(handler, Some(completion))
    }

    pub fn hub(&self) -> &Hub {
        &self.hub
    }

    fn submit_route(&self, mut route: Route, completion: Option<CompletionFn>) -> bool {
        let identifier = route.identifier().cloned();
        {
            let mut view = Intercepted::Route(&mut route);
            if !interceptor::gate(self.hub.interceptors(), identifier.as_ref(), &mut view) {
                return false;
            }
        }
        if self.ops.send(Op::Route(route, completion)).is_err() {
            warn!("the director is gone; dropping a route");
            return false;
        }
        true
    }

    fn submit_action(&self, mut handler: Handler, completion: Option<CompletionFn>) -> bool {
        let identifier = handler.identifier().cloned();
        {
            let mut view = Intercepted::Handler(&mut handler);
            if !interceptor::gate(self.hub.interceptors(), identifier.as_ref(), &mut view) {
                return false;
            }
        }
        match handler.affinity() {
            HandlerAffinity::Main => {
                if self.ops.send(Op::Handler(handler, completion)).is_err() {
                    warn!("the director is gone; dropping a handler");
                    return false;
                }
                true
            }
            HandlerAffinity::Background => {
                let spawned = thread::Builder::new()
                    .name("switchback-handler".into())
                    .spawn(move || {
                        (handler.intention)(handler.input.as_ref());
                        if let Some(completion) = completion {
                            completion();
                        }
                    });
                match spawned {
                    Ok(_) => true,
                    Err(err) => {
                        warn!(%err, "failed to spawn a handler thread");
                        false
                    }
                }
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct RunId(u64);

/// Where a forward transition parks once its run lands.
#[derive(Debug, Clone, Copy)]
enum ParkSlot {
    /// Keyed by the presented layer root (or popup host).
    Present(ScreenId),
    /// Keyed by the pushed stack entry.
    Push(ScreenId),
}

/// What to commit or roll back when a run finishes.
#[derive(Debug, Clone, Copy)]
enum RunKind {
    Present {
        content: ScreenId,
        covered: Option<ScreenId>,
        unloads: bool,
    },
    Push {
        entry: ScreenId,
        covered: ScreenId,
    },
    Pop {
        nav: ScreenId,
        popped: ScreenId,
        revealed: ScreenId,
    },
    Dismiss {
        layer: ScreenId,
        outgoing: ScreenId,
        revealed: ScreenId,
    },
    PopupShow {
        content: ScreenId,
        covered: Option<ScreenId>,
    },
    PopupDismiss {
        host: ScreenId,
        content: ScreenId,
        covered: Option<ScreenId>,
    },
}

struct ActiveRun {
    id: RunId,
    transition: Transition,
    run: TransitionRun,
    park: Option<ParkSlot>,
    kind: RunKind,
    completion: Option<CompletionFn>,
}

/// Deadline by which a cancelled run must have rewound.
struct Snapback {
    due: f64,
    run: RunId,
}

#[derive(Default)]
struct Parked {
    present: Option<Transition>,
    push: Option<Transition>,
}

struct GestureSession {
    run: RunId,
    controller: InteractiveController,
    direction: SwipeDirection,
    reference: Rect,
}

enum GestureTarget {
    Pop(ScreenId),
    Dismiss(ScreenId),
}

/// Single logical owner of the stage, the virtual clock, and all runs.
pub struct Director {
    hub: Arc<Hub>,
    stage: Stage,
    now: f64,
    ops: Receiver<Op>,
    handle: DirectorHandle,
    runs: Vec<ActiveRun>,
    snapbacks: Vec<Snapback>,
    parked: BTreeMap<ScreenId, Parked>,
    gesture: Option<GestureSession>,
    next_run: u64,
}

impl Director {
    /// A director over an empty stage with its own hub.
    #[must_use]
    pub fn new(bounds: Rect) -> Self {
        Self::with_hub(bounds, Arc::new(Hub::new()))
    }

    /// A director sharing an existing hub (for example [`Hub::global`]
    /// wrapped by the caller, or one hub across several stages in tests).
    #[must_use]
    pub fn with_hub(bounds: Rect, hub: Arc<Hub>) -> Self {
        let (tx, rx) = mpsc::channel();
        let handle = DirectorHandle {
            ops: tx,
            hub: Arc::clone(&hub),
        };
        Self {
            hub,
            stage: Stage::new(bounds),
            now: 0.0,
            ops: rx,
            handle,
            runs: Vec::new(),
            snapbacks: Vec::new(),
            parked: BTreeMap::new(),
            gesture: None,
            next_run: 0,
        }
    }

    #[must_use]
    pub fn handle(&self) -> DirectorHandle {
        self.handle.clone()
    }

    #[must_use]
    pub fn hub(&self) -> &Hub {
        &self.hub
    }

    #[must_use]
    pub fn stage(&self) -> &Stage {
        &self.stage
    }

    /// Mutable stage access, for mounting roots and host-driven layout.
    pub fn stage_mut(&mut self) -> &mut Stage {
        &mut self.stage
    }

    /// Seconds of virtual time accumulated so far.
    #[must_use]
    pub fn now(&self) -> f64 {
        self.now
    }

    /// Advance virtual time, drain the op queue, fire due snap-backs, and
    /// advance every run. A host loop feeds wall `dt`; tests feed exact
    /// steps.
    ///
    /// # Panics
    ///
    /// Under `debug_assertions`, panics when a routing operation left the
    /// stage structurally inconsistent.
    pub fn tick(&mut self, dt: Duration) {
        self.now += dt.as_secs_f64();
        self.pump();
        self.fire_snapbacks();
        self.advance_runs();
        #[cfg(debug_assertions)]
        if let Err(err) = self.stage.validate() {
            panic!("stage invariant broken after tick: {err}");
        }
    }

    /// Drain queued intents without advancing time.
    pub fn pump(&mut self) {
        while let Ok(op) = self.ops.try_recv() {
            match op {
                Op::Route(route, completion) => self.dispatch_route(route, completion),
                Op::Handler(handler, completion) => {
                    (handler.intention)(handler.input.as_ref());
                    run_completion(completion);
                }
            }
        }
    }

    // ---- dispatch ----------------------------------------------------------

    /// # Panics
    ///
    /// Routing against an empty stage, or with an executor that is not
    /// mounted, is a programmer error.
    fn dispatch_route(&mut self, route: Route, completion: Option<CompletionFn>) {
        let Route {
            factory,
            input,
            config,
            executor,
            transition,
            identifier,
        } = route;

        let Some(executor) = executor.or_else(|| resolve::active_screen(&self.stage)) else {
            panic!("routing with an empty stage; mount a root before submitting");
        };
        assert!(
            self.stage.contains(executor),
            "route executor {executor} is not mounted"
        );

        let dest = self.stage.insert((factory)(input.as_ref()));
        if let Some(payload) = &input {
            self.apply_input(dest, payload);
        }

        let config = match config {
            RouteConfig::Auto => {
                let preferred = self.stage.screen(dest).and_then(|s| s.preferred_config());
                match preferred {
                    Some(RouteConfig::Auto) | None => engine::resolve_auto(&self.stage, executor),
                    Some(explicit) => explicit,
                }
            }
            explicit => explicit,
        };

        // A custom transition must still have its forward phase available.
        let transition = match transition {
            Some(t) if t.can_run(TransitionPhase::Forward) => Some(t),
            Some(t) => {
                warn!(life = ?t.life(), "custom transition is spent; using the built-in");
                None
            }
            None => None,
        };

        debug!(?identifier, %executor, %dest, ?config, "routing");

        match config {
            RouteConfig::Auto => unreachable!("auto resolves before dispatch"),
            RouteConfig::Present(opts, style) => {
                self.do_present(executor, dest, opts, style, transition, completion);
            }
            RouteConfig::Push(opts) => self.do_push(executor, dest, opts, transition, completion),
            RouteConfig::Switch(opts) => {
                // The probe instance never joins the hierarchy; only its
                // concrete type matters.
                let wanted = self.stage.screen(dest).map(|s| s.concrete_type());
                self.stage.remove_subtree(dest);
                if let Some(wanted) = wanted {
                    self.do_switch(executor, wanted, opts, completion);
                }
            }
            RouteConfig::Popup(opts) => self.do_popup(dest, opts, transition, completion),
            RouteConfig::AsChild => self.do_embed(executor, dest, completion),
        }
    }

    fn apply_input(&mut self, dest: ScreenId, payload: &Payload) {
        let Some(screen) = self.stage.screen_mut(dest) else {
            return;
        };
        for (key, value) in payload.iter() {
            if !screen.assign(key, value) {
                trace!(key, "destination declined a payload key");
            }
        }
    }

    // ---- strategies ----------------------------------------------------------

    fn do_present(
        &mut self,
        executor: ScreenId,
        dest: ScreenId,
        opts: PresentOptions,
        style: PresentStyle,
        custom: Option<Transition>,
        completion: Option<CompletionFn>,
    ) {
        let plan = must(engine::present(&mut self.stage, executor, dest, opts, style));

        if !plan.animated {
            if custom.is_some() {
                trace!("animation cancelled; the custom transition is dropped");
            }
            if plan.unloads {
                if let Some(covered) = plan.covered {
                    engine::notify_will_disappear(&mut self.stage, covered, false);
                }
            }
            engine::notify_will_appear(&mut self.stage, plan.content, false);
            engine::notify_did_appear(&mut self.stage, plan.content, false);
            if plan.unloads {
                if let Some(covered) = plan.covered {
                    engine::notify_did_disappear(&mut self.stage, covered, false);
                    if let Some(surface) = self.stage.surface_mut(covered) {
                        surface.hidden = true;
                    }
                }
            }
            run_completion(completion);
            return;
        }

        // Fake push forces the slide choreography.
        let mut transition = if plan.fake_push {
            Transition::fake_push()
        } else {
            custom.unwrap_or_else(|| builtin_present_for(style))
        };

        if plan.unloads {
            if let Some(covered) = plan.covered {
                engine::notify_will_disappear(&mut self.stage, covered, true);
            }
        }
        engine::notify_will_appear(&mut self.stage, plan.content, true);

        let from = plan.covered.unwrap_or(executor);
        let run = transition.begin(
            &mut self.stage,
            TransitionPhase::Forward,
            from,
            plan.content,
            self.now,
            false,
        );
        self.start_run(
            transition,
            run,
            Some(ParkSlot::Present(plan.target)),
            RunKind::Present {
                content: plan.content,
                covered: plan.covered,
                unloads: plan.unloads,
            },
            completion,
        );
    }

    fn do_push(
        &mut self,
        executor: ScreenId,
        dest: ScreenId,
        opts: PushOptions,
        custom: Option<Transition>,
        completion: Option<CompletionFn>,
    ) {
        let plan = must(engine::push(&mut self.stage, executor, dest, opts));
        self.forget(&plan.removed);

        if !plan.animated {
            if custom.is_some() {
                trace!("animation cancelled; the custom transition is dropped");
            }
            self.reset_bottom_bar(plan.reset_bottom_bar);
            engine::notify_will_disappear(&mut self.stage, plan.covered, false);
            engine::notify_will_appear(&mut self.stage, dest, false);
            engine::notify_did_appear(&mut self.stage, dest, false);
            engine::notify_did_disappear(&mut self.stage, plan.covered, false);
            run_completion(completion);
            return;
        }

        let mut transition = custom.unwrap_or_else(Transition::builtin_push);
        engine::notify_will_disappear(&mut self.stage, plan.covered, true);
        engine::notify_will_appear(&mut self.stage, dest, true);
        let run = transition.begin(
            &mut self.stage,
            TransitionPhase::Forward,
            plan.covered,
            dest,
            self.now,
            false,
        );
        // The flag only covers the push call itself.
        self.reset_bottom_bar(plan.reset_bottom_bar);
        self.start_run(
            transition,
            run,
            Some(ParkSlot::Push(dest)),
            RunKind::Push {
                entry: dest,
                covered: plan.covered,
            },
            completion,
        );
    }

    fn do_switch(
        &mut self,
        executor: ScreenId,
        wanted: TypeId,
        opts: SwitchOptions,
        completion: Option<CompletionFn>,
    ) {
        let plan = must(engine::switch_to(&mut self.stage, executor, wanted, opts));
        self.forget(&plan.removed);

        let Some(found) = plan.found else {
            // A miss is a defined no-op; the completion still runs.
            run_completion(completion);
            return;
        };

        match plan.reveal {
            Some(layer) => {
                self.start_dismiss(layer, true, false, completion);
            }
            None => {
                if found != executor {
                    engine::notify_will_appear(&mut self.stage, found, false);
                    engine::notify_did_appear(&mut self.stage, found, false);
                }
                run_completion(completion);
            }
        }
    }

    fn do_popup(
        &mut self,
        dest: ScreenId,
        opts: PopupOptions,
        custom: Option<Transition>,
        completion: Option<CompletionFn>,
    ) {
        let plan = must(engine::popup(&mut self.stage, dest, opts));
        self.forget(&plan.removed);

        if !plan.animated {
            if custom.is_some() {
                trace!("animation cancelled; the custom transition is dropped");
            }
            if let Some(covered) = plan.covered {
                engine::notify_will_disappear(&mut self.stage, covered, false);
            }
            engine::notify_will_appear(&mut self.stage, plan.content, false);
            engine::notify_did_appear(&mut self.stage, plan.content, false);
            if let Some(covered) = plan.covered {
                engine::notify_did_disappear(&mut self.stage, covered, false);
            }
            run_completion(completion);
            return;
        }

        let mut transition = custom.unwrap_or_else(|| Transition::popup(plan.placement));
        if let Some(covered) = plan.covered {
            engine::notify_will_disappear(&mut self.stage, covered, true);
        }
        engine::notify_will_appear(&mut self.stage, plan.content, true);
        let from = plan.covered.unwrap_or(plan.host);
        let run = transition.begin(
            &mut self.stage,
            TransitionPhase::Forward,
            from,
            plan.content,
            self.now,
            false,
        );
        self.start_run(
            transition,
            run,
            Some(ParkSlot::Present(plan.host)),
            RunKind::PopupShow {
                content: plan.content,
                covered: plan.covered,
            },
            completion,
        );
    }

    fn do_embed(&mut self, executor: ScreenId, dest: ScreenId, completion: Option<CompletionFn>) {
        must(engine::embed(&mut self.stage, executor, dest));
        run_completion(completion);
    }

    // ---- backward operations -------------------------------------------------

    /// Pop the top entry of `nav`. The structural pop commits when the run
    /// finishes uncancelled; a pop that cannot happen is a no-op whose
    /// completion still fires.
    pub fn pop(&mut self, nav: ScreenId, animated: bool, completion: Option<CompletionFn>) {
        let _ = self.start_pop(nav, animated, false, completion);
    }

    /// Dismiss the presented layer holding `screen`. Layers stacked above
    /// it go down structurally first; only this layer's exit animates.
    pub fn dismiss(&mut self, screen: ScreenId, animated: bool, completion: Option<CompletionFn>) {
        let layer = resolve::layer_root(&self.stage, screen);
        let _ = self.start_dismiss(layer, animated, false, completion);
    }

    /// Dismiss the popup currently up, if any.
    pub fn dismiss_popup(&mut self, animated: bool, completion: Option<CompletionFn>) {
        let _ = self.start_popup_dismiss(animated, completion);
    }

    /// Backdrop tap: dismisses the popup when its host allows it.
    pub fn tap_popup_backdrop(&mut self) {
        let Some(host) = self.stage.overlay() else {
            return;
        };
        let allowed = matches!(
            self.stage.kind(host),
            Some(ScreenKind::PopupHost {
                tap_dismiss: true,
                ..
            })
        );
        if allowed {
            let _ = self.start_popup_dismiss(true, None);
        } else {
            debug!(%host, "popup backdrop ignores taps");
        }
    }

    /// The navigation chrome's back control. Pops when the stack is deep;
    /// on the root entry of a synthesized shell it dismisses the
    /// presentation instead.
    pub fn trigger_back_affordance(&mut self, nav: ScreenId) {
        let (depth, affordance) = match self.stage.kind(nav) {
            Some(ScreenKind::NavStack {
                stack,
                back_affordance,
            }) => (stack.len(), *back_affordance),
            _ => {
                warn!(%nav, "back affordance on a screen that is not a nav stack");
                return;
            }
        };
        if depth > 1 {
            let _ = self.start_pop(nav, true, false, None);
        } else if affordance {
            let layer = resolve::layer_root(&self.stage, nav);
            let _ = self.start_dismiss(layer, true, false, None);
        } else {
            debug!(%nav, "stack root without a back affordance");
        }
    }

    fn start_pop(
        &mut self,
        nav: ScreenId,
        animated: bool,
        interactive: bool,
        completion: Option<CompletionFn>,
    ) -> Option<RunId> {
        let entries = match self.stage.nav_stack(nav) {
            Ok(entries) => entries.to_vec(),
            Err(err) => {
                warn!(%err, %nav, "pop needs a nav stack");
                run_completion(completion);
                return None;
            }
        };
        if entries.len() < 2 {
            debug!(%nav, "the stack root cannot pop");
            run_completion(completion);
            return None;
        }
        let popped = entries[entries.len() - 1];
        let revealed = entries[entries.len() - 2];

        if !animated {
            let leaf = engine::visible_in(&self.stage, popped);
            engine::notify_gone(&mut self.stage, leaf, false);
            let _ = must(self.stage.nav_pop(nav));
            let removed = self.stage.remove_subtree(popped);
            self.forget(&removed);
            engine::notify_will_appear(&mut self.stage, revealed, false);
            engine::notify_did_appear(&mut self.stage, revealed, false);
            run_completion(completion);
            return None;
        }

        let mut transition = self
            .take_parked_push(popped)
            .filter(|t| t.can_run(TransitionPhase::Backward))
            .unwrap_or_else(Transition::builtin_push);
        engine::notify_will_disappear(&mut self.stage, popped, true);
        engine::notify_will_appear(&mut self.stage, revealed, true);
        let run = transition.begin(
            &mut self.stage,
            TransitionPhase::Backward,
            popped,
            revealed,
            self.now,
            interactive,
        );
        Some(self.start_run(
            transition,
            run,
            None,
            RunKind::Pop {
                nav,
                popped,
                revealed,
            },
            completion,
        ))
    }

    fn start_dismiss(
        &mut self,
        layer: ScreenId,
        animated: bool,
        interactive: bool,
        completion: Option<CompletionFn>,
    ) -> Option<RunId> {
        let Some(presenter) = self.stage.presenter(layer) else {
            warn!(%layer, "dismiss of a screen that is not presented");
            run_completion(completion);
            return None;
        };

        // Layers stacked above this one go down without animation first.
        let above = resolve::presented_chain_above(&self.stage, layer);
        for &over in above.iter().rev() {
            let removed = must(engine::structural_dismiss(&mut self.stage, over));
            self.forget(&removed);
        }

        let outgoing = engine::visible_in(&self.stage, layer);
        let revealed = engine::visible_in(&self.stage, presenter);

        if !animated {
            let removed = must(engine::structural_dismiss(&mut self.stage, layer));
            self.forget(&removed);
            if let Some(surface) = self.stage.surface_mut(revealed) {
                surface.hidden = false;
            }
            engine::notify_will_appear(&mut self.stage, revealed, false);
            engine::notify_did_appear(&mut self.stage, revealed, false);
            run_completion(completion);
            return None;
        }

        let mut transition = self
            .take_parked_present(layer)
            .filter(|t| t.can_run(TransitionPhase::Backward))
            .unwrap_or_else(|| {
                let style = self
                    .stage
                    .get(layer)
                    .and_then(|node| node.present_style())
                    .unwrap_or_default();
                builtin_present_for(style)
            });
        engine::notify_will_disappear(&mut self.stage, outgoing, true);
        if let Some(surface) = self.stage.surface_mut(revealed) {
            surface.hidden = false;
        }
        engine::notify_will_appear(&mut self.stage, revealed, true);
        let run = transition.begin(
            &mut self.stage,
            TransitionPhase::Backward,
            outgoing,
            revealed,
            self.now,
            interactive,
        );
        Some(self.start_run(
            transition,
            run,
            None,
            RunKind::Dismiss {
                layer,
                outgoing,
                revealed,
            },
            completion,
        ))
    }

    fn start_popup_dismiss(
        &mut self,
        animated: bool,
        completion: Option<CompletionFn>,
    ) -> Option<RunId> {
        let Some(host) = self.stage.overlay() else {
            debug!("no popup is up; dismiss is a no-op");
            run_completion(completion);
            return None;
        };
        let Some(content) = self.stage.structural_children(host).first().copied() else {
            let _ = self.stage.take_overlay();
            let removed = self.stage.remove_subtree(host);
            self.forget(&removed);
            run_completion(completion);
            return None;
        };
        let covered = resolve::active_screen(&self.stage);

        if !animated {
            engine::notify_gone(&mut self.stage, content, false);
            let _ = self.stage.take_overlay();
            let removed = self.stage.remove_subtree(host);
            self.forget(&removed);
            if let Some(covered) = covered {
                engine::notify_will_appear(&mut self.stage, covered, false);
                engine::notify_did_appear(&mut self.stage, covered, false);
            }
            run_completion(completion);
            return None;
        }

        let placement = match self.stage.kind(host) {
            Some(ScreenKind::PopupHost { placement, .. }) => *placement,
            _ => PopupPlacement::Center,
        };
        let mut transition = self
            .take_parked_present(host)
            .filter(|t| t.can_run(TransitionPhase::Backward))
            .unwrap_or_else(|| Transition::popup(placement));
        engine::notify_will_disappear(&mut self.stage, content, true);
        if let Some(covered) = covered {
            engine::notify_will_appear(&mut self.stage, covered, true);
        }
        let to = covered.unwrap_or(host);
        let run = transition.begin(
            &mut self.stage,
            TransitionPhase::Backward,
            content,
            to,
            self.now,
            false,
        );
        Some(self.start_run(
            transition,
            run,
            None,
            RunKind::PopupDismiss {
                host,
                content,
                covered,
            },
            completion,
        ))
    }

    // ---- gestures --------------------------------------------------------------

    /// Interactive pop on a nav stack, usually a screen-edge drag. The
    /// session begins lazily once travel agrees with the pop direction.
    ///
    /// # Panics
    ///
    /// The stage bounds must have extent along the swipe axis.
    pub fn nav_pan(&mut self, nav: ScreenId, pan: Pan) {
        self.pan(GestureTarget::Pop(nav), pan);
    }

    /// Interactive dismissal of the presented layer holding `screen`;
    /// fake-push edge hosts get their swipe-back this way.
    ///
    /// # Panics
    ///
    /// The stage bounds must have extent along the swipe axis.
    pub fn edge_pan(&mut self, screen: ScreenId, pan: Pan) {
        let layer = resolve::layer_root(&self.stage, screen);
        self.pan(GestureTarget::Dismiss(layer), pan);
    }

    fn pan(&mut self, target: GestureTarget, pan: Pan) {
        match pan.phase {
            PanPhase::Began | PanPhase::Changed => self.gesture_track(target, pan),
            PanPhase::Ended => self.gesture_end(pan),
            PanPhase::Cancelled => self.gesture_cancel(),
        }
    }

    fn gesture_track(&mut self, target: GestureTarget, pan: Pan) {
        if self.gesture.is_none() {
            self.gesture_begin(target, pan);
        }
        let Some(session) = self.gesture.as_mut() else {
            return;
        };
        let percent = gesture::percent_for(session.direction, pan.translation, session.reference);
        if let Some(active) = self.runs.iter_mut().find(|a| a.id == session.run) {
            session.controller.update(&mut active.run, percent);
        }
    }

    fn gesture_begin(&mut self, target: GestureTarget, pan: Pan) {
        match target {
            GestureTarget::Pop(nav) => {
                let Ok(entries) = self.stage.nav_stack(nav) else {
                    return;
                };
                if entries.len() < 2 {
                    return;
                }
                let top = entries[entries.len() - 1];
                if self
                    .stage
                    .screen(top)
                    .is_some_and(|s| s.resists_interactive_pop())
                {
                    debug!(%top, "top screen resists the interactive pop");
                    return;
                }
                let direction = self
                    .parked
                    .get(&top)
                    .and_then(|p| p.push.as_ref())
                    .map_or(SwipeDirection::LeftToRight, Transition::swipe);
                if direction.raw_projection(pan.translation) < 0.0 {
                    // Travel fights the pop; wait for it to correct.
                    return;
                }
                let Some(id) = self.start_pop(nav, true, true, None) else {
                    return;
                };
                self.attach_session(id, direction);
            }
            GestureTarget::Dismiss(layer) => {
                if self.stage.presenter(layer).is_none() {
                    return;
                }
                let direction = self
                    .parked
                    .get(&layer)
                    .and_then(|p| p.present.as_ref())
                    .map(Transition::swipe)
                    .unwrap_or_else(|| match self.stage.kind(layer) {
                        Some(ScreenKind::EdgeHost) => SwipeDirection::LeftToRight,
                        _ => SwipeDirection::TopToBottom,
                    });
                if direction.raw_projection(pan.translation) < 0.0 {
                    return;
                }
                let Some(id) = self.start_dismiss(layer, true, true, None) else {
                    return;
                };
                self.attach_session(id, direction);
            }
        }
    }

    fn attach_session(&mut self, id: RunId, direction: SwipeDirection) {
        let Some(active) = self.runs.iter().find(|a| a.id == id) else {
            return;
        };
        let controller =
            InteractiveController::new(active.run.duration(), active.transition.threshold());
        self.gesture = Some(GestureSession {
            run: id,
            controller,
            direction,
            reference: self.stage.bounds(),
        });
    }

    fn gesture_end(&mut self, pan: Pan) {
        let Some(mut session) = self.gesture.take() else {
            return;
        };
        let Some(index) = self.runs.iter().position(|a| a.id == session.run) else {
            return;
        };
        let percent = gesture::percent_for(session.direction, pan.translation, session.reference);
        session.controller.update(&mut self.runs[index].run, percent);
        if session.controller.past_threshold() {
            session.controller.finish(&mut self.runs[index].run, self.now);
        } else {
            let due = session.controller.cancel(&mut self.runs[index].run, self.now);
            self.snapbacks.push(Snapback {
                due,
                run: session.run,
            });
        }
    }

    fn gesture_cancel(&mut self) {
        let Some(session) = self.gesture.take() else {
            return;
        };
        let Some(index) = self.runs.iter().position(|a| a.id == session.run) else {
            return;
        };
        let due = session.controller.cancel(&mut self.runs[index].run, self.now);
        self.snapbacks.push(Snapback {
            due,
            run: session.run,
        });
    }

    // ---- run management ----------------------------------------------------

    fn start_run(
        &mut self,
        transition: Transition,
        run: TransitionRun,
        park: Option<ParkSlot>,
        kind: RunKind,
        completion: Option<CompletionFn>,
    ) -> RunId {
        let id = RunId(self.next_run);
        self.next_run += 1;
        self.runs.push(ActiveRun {
            id,
            transition,
            run,
            park,
            kind,
            completion,
        });
        id
    }

    fn advance_runs(&mut self) {
        let mut index = 0;
        while index < self.runs.len() {
            match self.runs[index].run.advance(&mut self.stage, self.now) {
                RunStatus::Running => index += 1,
                RunStatus::Finished { cancelled } => {
                    let active = self.runs.remove(index);
                    self.complete_run(active, cancelled);
                }
            }
        }
    }

    fn fire_snapbacks(&mut self) {
        let now = self.now;
        let due: Vec<RunId> = self
            .snapbacks
            .iter()
            .filter(|s| s.due <= now)
            .map(|s| s.run)
            .collect();
        self.snapbacks.retain(|s| s.due > now);
        for id in due {
            let Some(index) = self.runs.iter().position(|a| a.id == id) else {
                continue;
            };
            if let RunStatus::Finished { cancelled } = self.runs[index].run.settle() {
                warn!("a cancelled run outlived its snap-back deadline; settling it");
                let active = self.runs.remove(index);
                self.complete_run(active, cancelled);
            }
        }
    }

    fn complete_run(&mut self, mut active: ActiveRun, cancelled: bool) {
        self.snapbacks.retain(|s| s.run != active.id);
        if self.gesture.as_ref().is_some_and(|g| g.run == active.id) {
            self.gesture = None;
        }
        active.transition.finish_run(&mut self.stage, &active.run);

        match active.kind {
            RunKind::Present {
                content,
                covered,
                unloads,
            } => {
                engine::notify_did_appear(&mut self.stage, content, true);
                if unloads {
                    if let Some(covered) = covered {
                        engine::notify_did_disappear(&mut self.stage, covered, true);
                        if let Some(surface) = self.stage.surface_mut(covered) {
                            surface.hidden = true;
                        }
                    }
                }
            }
            RunKind::Push { entry, covered } => {
                engine::notify_did_appear(&mut self.stage, entry, true);
                engine::notify_did_disappear(&mut self.stage, covered, true);
            }
            RunKind::Pop {
                nav,
                popped,
                revealed,
            } => {
                if cancelled {
                    self.rebalance_after_cancel(popped, revealed);
                } else {
                    match self.stage.nav_top(nav) {
                        Ok(top) if top == popped => {
                            let _ = self.stage.nav_pop(nav);
                            engine::notify_did_disappear(&mut self.stage, popped, true);
                            let removed = self.stage.remove_subtree(popped);
                            self.forget(&removed);
                            engine::notify_did_appear(&mut self.stage, revealed, true);
                        }
                        _ => warn!(%nav, %popped, "pop landed on a stale stack; leaving it"),
                    }
                }
            }
            RunKind::Dismiss {
                layer,
                outgoing,
                revealed,
            } => {
                if cancelled {
                    self.rebalance_after_cancel(outgoing, revealed);
                    let full_screen = self
                        .stage
                        .get(layer)
                        .and_then(|node| node.present_style())
                        == Some(PresentStyle::FullScreen);
                    if full_screen {
                        if let Some(surface) = self.stage.surface_mut(revealed) {
                            surface.hidden = true;
                        }
                    }
                } else {
                    match self.stage.end_presentation(layer) {
                        Ok(_presenter) => {
                            engine::notify_did_disappear(&mut self.stage, outgoing, true);
                            let removed = self.stage.remove_subtree(layer);
                            self.forget(&removed);
                            engine::notify_did_appear(&mut self.stage, revealed, true);
                        }
                        Err(err) => {
                            warn!(%err, %layer, "dismissal landed on a stale layer; leaving it");
                        }
                    }
                }
            }
            RunKind::PopupShow { content, covered } => {
                engine::notify_did_appear(&mut self.stage, content, true);
                if let Some(covered) = covered {
                    engine::notify_did_disappear(&mut self.stage, covered, true);
                }
            }
            RunKind::PopupDismiss {
                host,
                content,
                covered,
            } => {
                if cancelled {
                    engine::notify_will_appear(&mut self.stage, content, true);
                    engine::notify_did_appear(&mut self.stage, content, true);
                    if let Some(covered) = covered {
                        engine::notify_will_disappear(&mut self.stage, covered, true);
                        engine::notify_did_disappear(&mut self.stage, covered, true);
                    }
                } else {
                    if self.stage.overlay() == Some(host) {
                        let _ = self.stage.take_overlay();
                    }
                    engine::notify_did_disappear(&mut self.stage, content, true);
                    let removed = self.stage.remove_subtree(host);
                    self.forget(&removed);
                    if let Some(covered) = covered {
                        engine::notify_did_appear(&mut self.stage, covered, true);
                    }
                }
            }
        }

        if !cancelled {
            if let Some(slot) = active.park {
                self.park(slot, active.transition);
            }
        }
        run_completion(active.completion);
    }

    /// A cancelled backward run leaves both sides where they started; the
    /// lifecycle books are rebalanced to match.
    fn rebalance_after_cancel(&mut self, outgoing: ScreenId, revealed: ScreenId) {
        engine::notify_will_appear(&mut self.stage, outgoing, true);
        engine::notify_did_appear(&mut self.stage, outgoing, true);
        engine::notify_will_disappear(&mut self.stage, revealed, true);
        engine::notify_did_disappear(&mut self.stage, revealed, true);
    }

    // ---- parked transitions ----------------------------------------------------

    fn park(&mut self, slot: ParkSlot, transition: Transition) {
        if transition.life() != TransitionLife::ForwardDone {
            return;
        }
        match slot {
            ParkSlot::Present(layer) => {
                if self.stage.contains(layer) {
                    self.parked.entry(layer).or_default().present = Some(transition);
                }
            }
            ParkSlot::Push(entry) => {
                if self.stage.contains(entry) {
                    self.parked.entry(entry).or_default().push = Some(transition);
                }
            }
        }
    }

    fn take_parked_present(&mut self, layer: ScreenId) -> Option<Transition> {
        let parked = self.parked.get_mut(&layer)?;
        let transition = parked.present.take();
        if parked.push.is_none() {
            self.parked.remove(&layer);
        }
        transition
    }

    fn take_parked_push(&mut self, entry: ScreenId) -> Option<Transition> {
        let parked = self.parked.get_mut(&entry)?;
        let transition = parked.push.take();
        if parked.present.is_none() {
            self.parked.remove(&entry);
        }
        transition
    }

    /// Drop parked transitions whose screens just left the stage.
    fn forget(&mut self, removed: &[ScreenId]) {
        for id in removed {
            self.parked.remove(id);
        }
    }

    fn reset_bottom_bar(&mut self, flagged: Option<ScreenId>) {
        if let Some(flagged) = flagged {
            // The executor may already be gone when a rewrite cleared it.
            let _ = self.stage.set_hides_bottom_bar(flagged, false);
        }
    }
}

impl std::fmt::Debug for Director {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Director")
            .field("now", &self.now)
            .field("screens", &self.stage.len())
            .field("runs", &self.runs.len())
            .field("parked", &self.parked.len())
            .finish_non_exhaustive()
    }
}

/// The stock disappearance pair for a present style.
fn builtin_present_for(style: PresentStyle) -> Transition {
    match style {
        PresentStyle::Sheet => Transition::new(SystemSlide::sheet())
            .with_duration(SYSTEM_DURATION)
            .with_swipe(SwipeDirection::TopToBottom),
        PresentStyle::FullScreen | PresentStyle::OverFullScreen => Transition::builtin_present(),
    }
}

fn run_completion(completion: Option<CompletionFn>) {
    if let Some(completion) = completion {
        completion();
    }
}

/// # Panics
///
/// Strategies run against executors the director already validated, so a
/// stage rejection here is a programmer error.
fn must<T>(result: Result<T, StageError>) -> T {
    match result {
        Ok(value) => value,
        Err(err) => panic!("stage rejected a routing operation: {err}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicBool, Ordering};

    use kurbo::Vec2;
    use switchback_core::Value;
    use switchback_transition::{PhaseContext, TransitionAnimator};

    #[derive(Default)]
    struct Home;
    impl Screen for Home {}

    #[derive(Default)]
    struct Detail {
        item: Option<String>,
    }
    impl Screen for Detail {
        fn assign(&mut self, key: &str, value: &Value) -> bool {
            match key {
                "item" => {
                    self.item = value.as_str().map(str::to_string);
                    true
                }
                _ => false,
            }
        }
    }

    #[derive(Default)]
    struct Note;
    impl Screen for Note {}

    #[derive(Default)]
    struct Stubborn;
    impl Screen for Stubborn {
        fn resists_interactive_pop(&self) -> bool {
            true
        }
    }

    struct Still;
    impl TransitionAnimator for Still {
        fn present(&mut self, _ctx: &mut PhaseContext<'_>) {}
        fn dismiss(&mut self, _ctx: &mut PhaseContext<'_>) {}
    }

    const BOUNDS: Rect = Rect::new(0.0, 0.0, 400.0, 800.0);

    fn director() -> Director {
        Director::new(BOUNDS)
    }

    fn step(d: &mut Director, seconds: f64) {
        d.tick(Duration::from_secs_f64(seconds));
    }

    fn flag() -> (Arc<AtomicBool>, CompletionFn) {
        let flag = Arc::new(AtomicBool::new(false));
        let seen = Arc::clone(&flag);
        (flag, Box::new(move || seen.store(true, Ordering::SeqCst)))
    }

    /// Root the stage with a nav stack holding `Home`; returns the nav.
    fn mount_nav(d: &mut Director) -> ScreenId {
        let stage = d.stage_mut();
        let home = stage.insert(Box::new(Home));
        let nav = stage.insert_nav(home).unwrap();
        stage.set_root(nav).unwrap();
        nav
    }

    fn mount_plain(d: &mut Director) -> ScreenId {
        let stage = d.stage_mut();
        let home = stage.insert(Box::new(Home));
        stage.set_root(home).unwrap();
        home
    }

    #[test]
    fn auto_pushes_under_a_nav_and_injects_input() {
        let mut d = director();
        let nav = mount_nav(&mut d);
        let (done, completion) = flag();

        let route = Route::to_screen::<Detail>()
            .with_input(Payload::new().with("item", Value::from("42")));
        assert!(d.handle().submit_with(route, completion));
        step(&mut d, 0.0);

        let stack = d.stage().nav_stack(nav).unwrap().to_vec();
        assert_eq!(stack.len(), 2, "the push landed structurally");
        let detail = d.stage().screen_as::<Detail>(stack[1]).unwrap();
        assert_eq!(detail.item.as_deref(), Some("42"));
        assert!(!done.load(Ordering::SeqCst), "animated ops finish with their run");

        step(&mut d, 0.4);
        assert!(done.load(Ordering::SeqCst));
    }

    #[test]
    fn auto_presents_without_a_nav() {
        let mut d = director();
        let home = mount_plain(&mut d);
        let (done, completion) = flag();

        assert!(d.handle().submit_with(Route::to_screen::<Note>(), completion));
        step(&mut d, 0.0);
        let layer = d.stage().presented(home).expect("a layer went up");
        assert!(!done.load(Ordering::SeqCst));

        step(&mut d, 0.4);
        assert!(done.load(Ordering::SeqCst));
        // Full-screen presentation unloads what it covers.
        assert!(d.stage().surface(home).unwrap().hidden);
        assert!(d.stage().contains(layer));
    }

    #[test]
    fn interceptor_veto_keeps_the_stage_and_drops_the_completion() {
        let mut d = director();
        mount_plain(&mut d);
        let id = d.hub().register_screen::<Note>("note/compose");
        d.hub().intercept(&id, Arc::new(|_| false));
        let before = d.stage().len();
        let (done, completion) = flag();

        let route = Route::from_key(d.hub(), "note/compose").unwrap();
        assert!(!d.handle().submit_with(route, completion));
        step(&mut d, 1.0);

        assert_eq!(d.stage().len(), before);
        assert!(!done.load(Ordering::SeqCst), "vetoed completions never fire");
    }

    #[test]
    fn switch_miss_still_completes() {
        let mut d = director();
        let nav = mount_nav(&mut d);
        let (done, completion) = flag();

        let route = Route::to_screen::<Note>()
            .with_config(RouteConfig::Switch(SwitchOptions::empty()));
        d.handle().submit_with(route, completion);
        step(&mut d, 0.0);

        assert!(done.load(Ordering::SeqCst));
        assert_eq!(d.stage().nav_stack(nav).unwrap().len(), 1);
        assert_eq!(d.stage().len(), 2, "the probe instance never stays mounted");
    }

    #[test]
    fn popup_floats_over_the_active_screen() {
        let mut d = director();
        let home = mount_plain(&mut d);
        let (done, completion) = flag();

        let route =
            Route::to_screen::<Note>().with_config(RouteConfig::Popup(PopupOptions::empty()));
        d.handle().submit_with(route, completion);
        step(&mut d, 0.0);

        let host = d.stage().overlay().expect("the popup host is up");
        assert_eq!(
            resolve::active_screen(d.stage()),
            Some(home),
            "the overlay never wins active-screen resolution"
        );
        step(&mut d, 0.35);
        assert!(done.load(Ordering::SeqCst));

        d.tap_popup_backdrop();
        step(&mut d, 0.35);
        assert!(d.stage().overlay().is_none());
        assert!(!d.stage().contains(host));
    }

    #[test]
    fn embed_completes_on_the_pump() {
        let mut d = director();
        let home = mount_plain(&mut d);
        let (done, completion) = flag();

        let route = Route::to_screen::<Note>().with_config(RouteConfig::AsChild);
        d.handle().submit_with(route, completion);
        step(&mut d, 0.0);

        assert!(done.load(Ordering::SeqCst), "embedding is synchronous");
        assert_eq!(d.stage().structural_children(home).len(), 1);
    }

    #[test]
    fn pop_commits_only_when_the_run_finishes() {
        let mut d = director();
        let nav = mount_nav(&mut d);
        let detail = d.stage_mut().insert(Box::new(Detail::default()));
        d.stage_mut().nav_push(nav, detail).unwrap();

        let (done, completion) = flag();
        d.pop(nav, true, Some(completion));
        step(&mut d, 0.1);
        assert_eq!(
            d.stage().nav_stack(nav).unwrap().len(),
            2,
            "the structural pop waits for the run"
        );
        assert!(!done.load(Ordering::SeqCst));

        step(&mut d, 0.3);
        assert_eq!(d.stage().nav_stack(nav).unwrap().len(), 1);
        assert!(!d.stage().contains(detail));
        assert!(done.load(Ordering::SeqCst));
    }

    #[test]
    fn gesture_finish_commits_the_pop() {
        let mut d = director();
        let nav = mount_nav(&mut d);
        let detail = d.stage_mut().insert(Box::new(Detail::default()));
        d.stage_mut().nav_push(nav, detail).unwrap();

        d.nav_pan(nav, Pan::new(PanPhase::Began, Vec2::ZERO));
        d.nav_pan(nav, Pan::new(PanPhase::Changed, Vec2::new(240.0, 0.0)));
        d.nav_pan(nav, Pan::new(PanPhase::Ended, Vec2::new(240.0, 0.0)));
        step(&mut d, 0.2);

        assert_eq!(d.stage().nav_stack(nav).unwrap().len(), 1);
        assert!(!d.stage().contains(detail));
    }

    #[test]
    fn gesture_cancel_restores_the_stack() {
        let mut d = director();
        let nav = mount_nav(&mut d);
        let detail = d.stage_mut().insert(Box::new(Detail::default()));
        d.stage_mut().nav_push(nav, detail).unwrap();

        d.nav_pan(nav, Pan::new(PanPhase::Began, Vec2::ZERO));
        d.nav_pan(nav, Pan::new(PanPhase::Changed, Vec2::new(120.0, 0.0)));
        d.nav_pan(nav, Pan::new(PanPhase::Ended, Vec2::new(120.0, 0.0)));
        step(&mut d, 0.2);

        let stack = d.stage().nav_stack(nav).unwrap();
        assert_eq!(stack.len(), 2, "a cancelled pop leaves the stack alone");
        assert_eq!(*stack.last().unwrap(), detail);
        assert!(d.snapbacks.is_empty(), "the snap-back retired with its run");
        assert!(d.gesture.is_none());
    }

    #[test]
    fn resistant_top_screen_blocks_the_gesture() {
        let mut d = director();
        let nav = mount_nav(&mut d);
        let wall = d.stage_mut().insert(Box::new(Stubborn));
        d.stage_mut().nav_push(nav, wall).unwrap();

        d.nav_pan(nav, Pan::new(PanPhase::Began, Vec2::ZERO));
        assert!(d.gesture.is_none());
        assert!(d.runs.is_empty(), "no run starts for a vetoed gesture");
    }

    #[test]
    fn back_affordance_pops_then_dismisses() {
        let mut d = director();
        let home = mount_plain(&mut d);
        let route = Route::to_screen::<Note>().with_config(RouteConfig::Present(
            PresentOptions::WRAP_NAV | PresentOptions::CANCEL_ANIMATION,
            PresentStyle::FullScreen,
        ));
        d.handle().submit(route);
        step(&mut d, 0.0);
        let shell = d.stage().presented(home).expect("the shell went up");

        let second = d.stage_mut().insert(Box::new(Detail::default()));
        d.stage_mut().nav_push(shell, second).unwrap();

        d.trigger_back_affordance(shell);
        step(&mut d, 0.4);
        assert_eq!(d.stage().nav_stack(shell).unwrap().len(), 1, "deep stacks pop");

        d.trigger_back_affordance(shell);
        step(&mut d, 0.4);
        assert!(d.stage().presented(home).is_none(), "the root entry dismisses");
        assert!(!d.stage().contains(shell));
    }

    #[test]
    #[should_panic(expected = "empty stage")]
    fn routing_with_an_empty_stage_panics() {
        let mut d = director();
        d.handle().submit(Route::to_screen::<Note>());
        step(&mut d, 0.0);
    }

    #[test]
    fn spent_custom_transition_falls_back_to_the_builtin() {
        let mut scratch = Stage::new(BOUNDS);
        let a = scratch.insert(Box::new(Home));
        let b = scratch.insert(Box::new(Note));
        let mut spent = Transition::new(Still).with_duration(5.0);
        let fwd = spent.begin(&mut scratch, TransitionPhase::Forward, a, b, 0.0, false);
        spent.finish_run(&mut scratch, &fwd);
        let back = spent.begin(&mut scratch, TransitionPhase::Backward, b, a, 1.0, false);
        spent.finish_run(&mut scratch, &back);

        let mut d = director();
        mount_plain(&mut d);
        let (done, completion) = flag();
        let route = Route::to_screen::<Note>().with_transition(spent);
        d.handle().submit_with(route, completion);
        step(&mut d, 0.0);
        step(&mut d, 0.4);
        assert!(
            done.load(Ordering::SeqCst),
            "the built-in duration applies, not the spent transition's"
        );
    }

    #[test]
    fn parked_present_transition_drives_the_dismissal() {
        let mut d = director();
        let home = mount_plain(&mut d);
        let custom = Transition::new(Still).with_duration(1.0);
        d.handle()
            .submit(Route::to_screen::<Note>().with_transition(custom));
        step(&mut d, 0.0);
        step(&mut d, 1.05);
        let layer = d.stage().presented(home).expect("the layer is up");

        let (done, completion) = flag();
        d.dismiss(layer, true, Some(completion));
        step(&mut d, 0.5);
        assert!(
            d.stage().presented(home).is_some(),
            "the parked duration outlives the built-in one"
        );
        step(&mut d, 0.6);
        assert!(done.load(Ordering::SeqCst));
        assert!(d.stage().presented(home).is_none());
    }

    #[test]
    fn main_handlers_interleave_with_routes_in_order() {
        let mut d = director();
        mount_plain(&mut d);
        let log: Arc<Mutex<Vec<&'static str>>> = Arc::new(Mutex::new(Vec::new()));

        let first = Arc::clone(&log);
        d.handle().submit_handler(Handler::new(Arc::new(move |_| {
            first.lock().unwrap().push("handler");
        })));
        let second = Arc::clone(&log);
        d.handle().submit_with(
            Route::to_screen::<Note>().with_config(RouteConfig::AsChild),
            Box::new(move || second.lock().unwrap().push("route")),
        );
        step(&mut d, 0.0);

        assert_eq!(*log.lock().unwrap(), ["handler", "route"]);
    }

    #[test]
    fn background_handlers_run_off_the_pump() {
        let d = director();
        let (tx, rx) = mpsc::channel();
        let tx = Mutex::new(tx);
        let handler = Handler::new(Arc::new(move |_| {
            let _ = tx.lock().unwrap().send(());
        }))
        .with_affinity(HandlerAffinity::Background);

        assert!(d.handle().submit_handler(handler));
        // No tick: the spawned thread delivers on its own.
        assert!(rx.recv_timeout(Duration::from_secs(5)).is_ok());
    }
}
