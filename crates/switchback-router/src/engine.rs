#![forbid(unsafe_code)]

//! Strategy execution against the stage.
//!
//! Each function performs the structural half of one routing strategy:
//! mounting, wrapping, marking, rebuilding, relinking. Nothing here owns
//! time; animated phases are described by the returned plan and the
//! director turns them into transition runs. Screens a strategy destroys
//! synchronously get their lifecycle here, because the nodes are gone by
//! the time the plan returns.
//!
//! Presentations always anchor on the top of the executor's window chain,
//! so every `presented` link lives on a layer root and the chain walks in
//! [`resolve`] stay sound.

use std::any::TypeId;

use tracing::{debug, error, warn};

use switchback_core::{
    PopupOptions, PopupPlacement, PresentOptions, PresentStyle, PushOptions, RouteConfig,
    SwitchOptions,
};
use switchback_stage::resolve::{self, WALK_LIMIT};
use switchback_stage::rewrite::{self, StackRewrite};
use switchback_stage::{ScreenId, ScreenKind, Stage, StageError};
use switchback_transition::animators::DIM_ALPHA;

/// Step bound for the switch search as a whole.
const SEARCH_LIMIT: usize = WALK_LIMIT * WALK_LIMIT;

/// What auto-config resolves to for this executor.
pub(crate) fn resolve_auto(stage: &Stage, executor: ScreenId) -> RouteConfig {
    if resolve::is_under_nav(stage, executor) {
        RouteConfig::Push(PushOptions::empty())
    } else {
        RouteConfig::Present(PresentOptions::empty(), PresentStyle::default())
    }
}

// ---- present ---------------------------------------------------------------

pub(crate) struct PresentPlan {
    /// Chain top the presentation was anchored on.
    pub anchor: ScreenId,
    /// Outermost mounted screen: the destination or its synthesized shell.
    pub target: ScreenId,
    /// The destination itself.
    pub content: ScreenId,
    /// Screen the presentation covers, when one was visible.
    pub covered: Option<ScreenId>,
    pub animated: bool,
    /// The edge-host wrapper is up and the slide choreography is forced.
    pub fake_push: bool,
    /// Full-screen style unloads what it covers.
    pub unloads: bool,
}

/// Mount `dest` as a modal presentation above the executor's window chain.
/// Fake-push wraps it in an edge host; wrap-nav wraps it in a nav shell
/// whose back affordance dismisses the presentation.
pub(crate) fn present(
    stage: &mut Stage,
    executor: ScreenId,
    dest: ScreenId,
    opts: PresentOptions,
    style: PresentStyle,
) -> Result<PresentPlan, StageError> {
    let animated = !opts.contains(PresentOptions::CANCEL_ANIMATION);
    let fake_push = opts.contains(PresentOptions::FAKE_PUSH);
    let covered = resolve::active_screen(stage);

    let mut target = dest;
    if opts.contains(PresentOptions::WRAP_NAV) {
        let shell = stage.insert_nav(dest)?;
        stage.set_back_affordance(shell, true)?;
        target = shell;
    }
    if fake_push {
        target = stage.insert_edge_host(target)?;
    }

    let anchor = resolve::modal_top(stage, resolve::window_root(stage, executor));
    stage.present(anchor, target, style)?;
    debug!(%anchor, %target, ?style, fake_push, "presentation mounted");

    Ok(PresentPlan {
        anchor,
        target,
        content: dest,
        covered,
        animated,
        fake_push,
        unloads: style == PresentStyle::FullScreen,
    })
}

// ---- push ------------------------------------------------------------------

pub(crate) struct PushPlan {
    /// Stack that received the entry.
    pub nav: ScreenId,
    /// Top entry before the push. Rewrites may have removed it.
    pub covered: ScreenId,
    pub animated: bool,
    /// Executor whose bottom-bar flag must be cleared once the push call
    /// is over.
    pub reset_bottom_bar: Option<ScreenId>,
    /// Subtrees dropped by the rewrite.
    pub removed: Vec<ScreenId>,
}

/// Push `dest` onto the nav stack nearest the executor, applying the
/// rewrite the options ask for. The rewritten stack lands without
/// animation; only the incoming entry animates.
///
/// # Panics
///
/// No nav stack is reachable from the executor. Pushing from outside any
/// stack is a programmer error.
pub(crate) fn push(
    stage: &mut Stage,
    executor: ScreenId,
    dest: ScreenId,
    opts: PushOptions,
) -> Result<PushPlan, StageError> {
    let Some(nav) = resolve::nearest_nav(stage, executor) else {
        panic!("push from screen {executor} with no reachable nav stack");
    };
    let animated = !opts.contains(PushOptions::CANCEL_ANIMATION);
    let covered = stage.nav_top(nav)?;

    let incoming = stage
        .screen_type(dest)
        .ok_or(StageError::MissingScreen { id: dest })?;
    rewrite::mark_stack(stage, nav, StackRewrite::from(opts), incoming)?;

    // When the incoming entry does not hide the bottom bar itself, the
    // executor hides it for the duration of the push call.
    let reset_bottom_bar = if stage.hides_bottom_bar(dest) {
        None
    } else {
        stage.set_hides_bottom_bar(executor, true)?;
        Some(executor)
    };

    stage.nav_push(nav, dest)?;

    let marked: Vec<ScreenId> = stage
        .nav_stack(nav)?
        .iter()
        .copied()
        .filter(|&id| stage.is_marked(id))
        .collect();
    for id in marked {
        notify_gone(stage, visible_in(stage, id), false);
    }
    let removed = stage.rebuild_stack(nav)?;

    Ok(PushPlan {
        nav,
        covered,
        animated,
        reset_bottom_bar,
        removed,
    })
}

// ---- switch ----------------------------------------------------------------

pub(crate) struct SwitchPlan {
    /// Existing screen brought current, when one matched.
    pub found: Option<ScreenId>,
    /// Presented layer still covering the target; dismissing it animated
    /// finishes the switch.
    pub reveal: Option<ScreenId>,
    /// Subtrees dropped by pop-tos and structural dismissals.
    pub removed: Vec<ScreenId>,
}

/// Bring an already-mounted screen of type `wanted` current: select its
/// tab, pop its stack above it, and unwind presentations covering it.
/// A miss is a silent no-op.
pub(crate) fn switch_to(
    stage: &mut Stage,
    executor: ScreenId,
    wanted: TypeId,
    opts: SwitchOptions,
) -> Result<SwitchPlan, StageError> {
    let animated = !opts.contains(SwitchOptions::CANCEL_ANIMATION);

    // The executor already is the target type: nothing to bring current.
    if stage.screen_type(executor) == Some(wanted) {
        return Ok(SwitchPlan {
            found: Some(executor),
            reveal: None,
            removed: Vec::new(),
        });
    }

    let path = if opts.contains(SwitchOptions::NEAREST) {
        nearest_search(stage, executor, wanted)
    } else {
        root_search(stage, wanted)
    };
    let Some(path) = path else {
        debug!("switch target not mounted; leaving the stage untouched");
        return Ok(SwitchPlan {
            found: None,
            reveal: None,
            removed: Vec::new(),
        });
    };

    let Some(&(last_container, last_index)) = path.last() else {
        return Ok(SwitchPlan {
            found: None,
            reveal: None,
            removed: Vec::new(),
        });
    };
    let found = child_at(stage, last_container, last_index)?;

    // Deepest container first, the way nested containers unwind.
    let mut removed = Vec::new();
    for &(container, index) in path.iter().rev() {
        match stage.kind(container) {
            Some(ScreenKind::TabRack { .. }) => stage.select_tab(container, index)?,
            Some(ScreenKind::NavStack { .. }) => {
                for popped in stage.pop_to(container, index)? {
                    notify_gone(stage, visible_in(stage, popped), false);
                    removed.extend(stage.remove_subtree(popped));
                }
            }
            _ => {}
        }
    }

    // Unwind presentations above the target's layer: outermost first
    // without animation, the innermost left for an animated reveal.
    let layer = resolve::layer_root(stage, found);
    let chain = resolve::presented_chain_above(stage, layer);
    let mut reveal = None;
    if !chain.is_empty() {
        for &over in chain[1..].iter().rev() {
            removed.extend(structural_dismiss(stage, over)?);
        }
        if animated {
            reveal = Some(chain[0]);
        } else {
            removed.extend(structural_dismiss(stage, chain[0])?);
        }
    }

    debug!(%found, reveal = ?reveal, dropped = removed.len(), "switch landed");
    Ok(SwitchPlan {
        found: Some(found),
        reveal,
        removed,
    })
}

/// Walk layer roots from the main window root, forward sibling order.
fn root_search(stage: &Stage, wanted: TypeId) -> Option<Vec<(ScreenId, usize)>> {
    let mut layer = stage.root()?;
    for _ in 0..WALK_LIMIT {
        if let Some(path) = find_descendant(stage, layer, wanted, false) {
            return Some(path);
        }
        layer = stage.presented(layer)?;
    }
    error!("switch layer walk exceeded the walk limit");
    None
}

/// Climb ancestor-ward from the executor, reversed sibling order,
/// crossing presentation boundaries downward.
fn nearest_search(
    stage: &Stage,
    executor: ScreenId,
    wanted: TypeId,
) -> Option<Vec<(ScreenId, usize)>> {
    let mut current = executor;
    for _ in 0..WALK_LIMIT {
        if let Some(path) = find_descendant(stage, current, wanted, true) {
            return Some(path);
        }
        if let Some(parent) = stage.parent(current) {
            current = parent;
        } else if let Some(presenter) = stage.presenter(current) {
            current = presenter;
        } else {
            return None;
        }
    }
    error!(start = %executor, "nearest switch walk exceeded the walk limit");
    None
}

struct SearchFrame {
    container: ScreenId,
    children: Vec<ScreenId>,
    order: Vec<usize>,
    cursor: usize,
}

fn switch_children(stage: &Stage, id: ScreenId) -> Option<Vec<ScreenId>> {
    match stage.kind(id)? {
        ScreenKind::NavStack { stack, .. } => Some(stack.clone()),
        ScreenKind::TabRack { tabs, .. } => Some(tabs.clone()),
        _ => None,
    }
}

/// Depth-first search through switchable containers under `root`,
/// matching direct entries by concrete type. Returns the hop path as
/// `(container, child index)` pairs from `root` down to the match.
fn find_descendant(
    stage: &Stage,
    root: ScreenId,
    wanted: TypeId,
    reversed: bool,
) -> Option<Vec<(ScreenId, usize)>> {
    let children = switch_children(stage, root)?;
    let mut frames = vec![frame_for(root, children, reversed)];
    let mut steps = 0usize;

    loop {
        steps += 1;
        if steps > SEARCH_LIMIT {
            error!(start = %root, "switch search exceeded the step bound");
            return None;
        }
        let frame = frames.last_mut()?;
        let Some(&index) = frame.order.get(frame.cursor) else {
            frames.pop();
            if frames.is_empty() {
                return None;
            }
            continue;
        };
        frame.cursor += 1;
        let child = frame.children[index];

        if stage.screen_type(child) == Some(wanted) {
            let mut hops = Vec::with_capacity(frames.len());
            for pair in frames.windows(2) {
                let position = pair[0].children.iter().position(|&c| c == pair[1].container)?;
                hops.push((pair[0].container, position));
            }
            let last = frames.last()?;
            hops.push((last.container, index));
            return Some(hops);
        }
        if let Some(children) = switch_children(stage, child) {
            frames.push(frame_for(child, children, reversed));
        }
    }
}

fn frame_for(container: ScreenId, children: Vec<ScreenId>, reversed: bool) -> SearchFrame {
    let order: Vec<usize> = if reversed {
        (0..children.len()).rev().collect()
    } else {
        (0..children.len()).collect()
    };
    SearchFrame {
        container,
        children,
        order,
        cursor: 0,
    }
}

fn child_at(stage: &Stage, container: ScreenId, index: usize) -> Result<ScreenId, StageError> {
    let ids = switch_children(stage, container).unwrap_or_default();
    ids.get(index)
        .copied()
        .ok_or(StageError::IndexOutOfRange {
            id: container,
            index,
            len: ids.len(),
        })
}

// ---- popup -----------------------------------------------------------------

pub(crate) struct PopupPlan {
    /// Synthesized backdrop host on the overlay window.
    pub host: ScreenId,
    /// The destination pinned inside the host.
    pub content: ScreenId,
    /// Main-window screen the popup floats over.
    pub covered: Option<ScreenId>,
    /// A replaced earlier popup's subtree.
    pub removed: Vec<ScreenId>,
    pub animated: bool,
    pub placement: PopupPlacement,
}

/// Mount `dest` in a popup host on the overlay window. A popup already up
/// is replaced.
pub(crate) fn popup(
    stage: &mut Stage,
    dest: ScreenId,
    opts: PopupOptions,
) -> Result<PopupPlan, StageError> {
    let animated = !opts.contains(PopupOptions::CANCEL_ANIMATION);
    let placement = opts.placement();
    let covered = resolve::active_screen(stage);

    let mut removed = Vec::new();
    if let Some(previous) = stage.take_overlay() {
        warn!(host = %previous, "a popup is already up; replacing it");
        notify_gone(stage, visible_in(stage, previous), false);
        removed = stage.remove_subtree(previous);
    }

    // Popup backdrops always dismiss on tap.
    let host =
        stage.insert_popup_host(dest, placement, opts.contains(PopupOptions::DIM_BLUR), true)?;
    stage.set_overlay(host)?;
    if !animated {
        // No entrance run will dim the backdrop; land it at rest.
        if let Some(surface) = stage.surface_mut(host) {
            surface.alpha = DIM_ALPHA;
        }
    }

    Ok(PopupPlan {
        host,
        content: dest,
        covered,
        removed,
        animated,
        placement,
    })
}

// ---- embed -----------------------------------------------------------------

/// Embed `dest` as a structural child of the executor, sized to it.
/// Synchronous; no transition applies.
pub(crate) fn embed(
    stage: &mut Stage,
    executor: ScreenId,
    dest: ScreenId,
) -> Result<(), StageError> {
    notify_will_appear(stage, dest, false);
    stage.embed(executor, dest)?;
    notify_did_appear(stage, dest, false);
    Ok(())
}

// ---- shared ----------------------------------------------------------------

/// Unhook a presented layer and drop its subtree without animation.
pub(crate) fn structural_dismiss(
    stage: &mut Stage,
    layer: ScreenId,
) -> Result<Vec<ScreenId>, StageError> {
    notify_gone(stage, visible_in(stage, layer), false);
    stage.end_presentation(layer)?;
    Ok(stage.remove_subtree(layer))
}

/// Deepest active screen within `id`'s subtree.
pub(crate) fn visible_in(stage: &Stage, id: ScreenId) -> ScreenId {
    let mut current = id;
    for _ in 0..WALK_LIMIT {
        match resolve::active_child(stage, current) {
            Some(next) => current = next,
            None => return current,
        }
    }
    error!(start = %id, "active descent exceeded the walk limit");
    current
}

pub(crate) fn notify_will_appear(stage: &mut Stage, id: ScreenId, animated: bool) {
    if let Some(screen) = stage.screen_mut(id) {
        screen.will_appear(animated);
    }
}

pub(crate) fn notify_did_appear(stage: &mut Stage, id: ScreenId, animated: bool) {
    if let Some(screen) = stage.screen_mut(id) {
        screen.did_appear(animated);
    }
}

pub(crate) fn notify_will_disappear(stage: &mut Stage, id: ScreenId, animated: bool) {
    if let Some(screen) = stage.screen_mut(id) {
        screen.will_disappear(animated);
    }
}

pub(crate) fn notify_did_disappear(stage: &mut Stage, id: ScreenId, animated: bool) {
    if let Some(screen) = stage.screen_mut(id) {
        screen.did_disappear(animated);
    }
}

/// Both disappearance hooks at once, for screens going away synchronously.
pub(crate) fn notify_gone(stage: &mut Stage, id: ScreenId, animated: bool) {
    notify_will_disappear(stage, id, animated);
    notify_did_disappear(stage, id, animated);
}
