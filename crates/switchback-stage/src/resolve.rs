#![forbid(unsafe_code)]

//! Bounded resolution walks over the stage.
//!
//! Every walk is iterative and capped at [`WALK_LIMIT`] hops per phase; a
//! hierarchy that exceeds the cap is broken, so the walk logs an error and
//! answers with the last sound screen instead of looping.

use tracing::error;

use crate::tree::{ScreenId, ScreenKind, Stage};

/// Hop bound for each walk phase.
pub const WALK_LIMIT: usize = 64;

/// The screen currently receiving user intent on the main window: climb
/// the modal chain to its top, then descend active children. The overlay
/// window never participates.
#[must_use]
pub fn active_screen(stage: &Stage) -> Option<ScreenId> {
    let root = stage.root()?;
    let top = modal_top(stage, root);
    Some(descend_active(stage, top))
}

/// Follow `presented` links up to the top of the modal chain.
#[must_use]
pub fn modal_top(stage: &Stage, from: ScreenId) -> ScreenId {
    let mut current = from;
    for _ in 0..WALK_LIMIT {
        match stage.presented(current) {
            Some(next) => current = next,
            None => return current,
        }
    }
    error!(start = %from, stop = %current, "modal chain exceeded the walk limit");
    current
}

fn descend_active(stage: &Stage, from: ScreenId) -> ScreenId {
    let mut current = from;
    for _ in 0..WALK_LIMIT {
        match active_child(stage, current) {
            Some(child) => current = child,
            None => return current,
        }
    }
    error!(start = %from, stop = %current, "active-child descent exceeded the walk limit");
    current
}

/// The structurally active child, when the kind defines one: a nav stack's
/// top entry, a tab rack's selection, a host's sole child.
#[must_use]
pub fn active_child(stage: &Stage, id: ScreenId) -> Option<ScreenId> {
    let node = stage.get(id)?;
    match node.kind() {
        ScreenKind::NavStack { stack, .. } => stack.last().copied(),
        ScreenKind::TabRack { tabs, selected } => tabs.get(*selected).copied(),
        ScreenKind::EdgeHost | ScreenKind::PopupHost { .. } => node.embedded().last().copied(),
        ScreenKind::Plain => None,
    }
}

/// Nearest nav stack at or above `from`, following structural parents
/// only; presentation boundaries are not crossed.
#[must_use]
pub fn nearest_nav(stage: &Stage, from: ScreenId) -> Option<ScreenId> {
    let mut current = from;
    for _ in 0..WALK_LIMIT {
        if stage.kind(current)?.is_nav_stack() {
            return Some(current);
        }
        current = stage.parent(current)?;
    }
    error!(start = %from, "nav search exceeded the walk limit");
    None
}

/// Whether auto-config resolves to a push for this executor.
#[must_use]
pub fn is_under_nav(stage: &Stage, from: ScreenId) -> bool {
    nearest_nav(stage, from).is_some()
}

/// Presented screens strictly above `from`, innermost first.
#[must_use]
pub fn presented_chain_above(stage: &Stage, from: ScreenId) -> Vec<ScreenId> {
    let mut chain = Vec::new();
    let mut current = from;
    for _ in 0..WALK_LIMIT {
        match stage.presented(current) {
            Some(next) => {
                chain.push(next);
                current = next;
            }
            None => return chain,
        }
    }
    error!(start = %from, "presented chain exceeded the walk limit");
    chain
}

/// Root of the presentation layer holding `from`: climbs structural
/// parents only. The result is a window root or a presented screen.
#[must_use]
pub fn layer_root(stage: &Stage, from: ScreenId) -> ScreenId {
    let mut current = from;
    for _ in 0..WALK_LIMIT {
        match stage.parent(current) {
            Some(next) => current = next,
            None => return current,
        }
    }
    error!(start = %from, "layer search exceeded the walk limit");
    current
}

/// Root-most holder of `from`: climbs structural parents and presenters
/// until neither exists.
#[must_use]
pub fn window_root(stage: &Stage, from: ScreenId) -> ScreenId {
    let mut current = from;
    for _ in 0..WALK_LIMIT {
        match stage.parent(current).or_else(|| stage.presenter(current)) {
            Some(next) => current = next,
            None => return current,
        }
    }
    error!(start = %from, "root search exceeded the walk limit");
    current
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::screen::Screen;
    use kurbo::Rect;
    use switchback_core::PresentStyle;

    #[derive(Default)]
    struct Blank;
    impl Screen for Blank {}

    fn stage() -> Stage {
        Stage::new(Rect::new(0.0, 0.0, 390.0, 844.0))
    }

    #[test]
    fn active_screen_descends_tabs_and_navs() {
        let mut stage = stage();
        let home = stage.insert(Box::new(Blank));
        let nav = stage.insert_nav(home).unwrap();
        let feed = stage.insert(Box::new(Blank));
        let rack = stage.insert_tabs(vec![nav, feed]).unwrap();
        stage.set_root(rack).unwrap();

        assert_eq!(active_screen(&stage), Some(home));
        stage.select_tab(rack, 1).unwrap();
        assert_eq!(active_screen(&stage), Some(feed));
    }

    #[test]
    fn active_screen_prefers_the_modal_top() {
        let mut stage = stage();
        let home = stage.insert(Box::new(Blank));
        let nav = stage.insert_nav(home).unwrap();
        stage.set_root(nav).unwrap();
        let sheet_body = stage.insert(Box::new(Blank));
        let sheet_nav = stage.insert_nav(sheet_body).unwrap();
        stage
            .present(nav, sheet_nav, PresentStyle::Sheet)
            .unwrap();

        // Modal chain wins over the nav underneath, then descends it.
        assert_eq!(active_screen(&stage), Some(sheet_body));
    }

    #[test]
    fn nearest_nav_counts_the_executor_itself() {
        let mut stage = stage();
        let home = stage.insert(Box::new(Blank));
        let nav = stage.insert_nav(home).unwrap();
        assert_eq!(nearest_nav(&stage, nav), Some(nav));
        assert_eq!(nearest_nav(&stage, home), Some(nav));
        let loner = stage.insert(Box::new(Blank));
        assert_eq!(nearest_nav(&stage, loner), None);
        assert!(!is_under_nav(&stage, loner));
    }

    #[test]
    fn nearest_nav_does_not_cross_presentations() {
        let mut stage = stage();
        let home = stage.insert(Box::new(Blank));
        let nav = stage.insert_nav(home).unwrap();
        stage.set_root(nav).unwrap();
        let modal = stage.insert(Box::new(Blank));
        stage.present(nav, modal, PresentStyle::FullScreen).unwrap();
        assert_eq!(nearest_nav(&stage, modal), None);
    }

    #[test]
    fn presented_chain_is_innermost_first() {
        let mut stage = stage();
        let root = stage.insert(Box::new(Blank));
        stage.set_root(root).unwrap();
        let first = stage.insert(Box::new(Blank));
        let second = stage.insert(Box::new(Blank));
        stage.present(root, first, PresentStyle::FullScreen).unwrap();
        stage
            .present(first, second, PresentStyle::FullScreen)
            .unwrap();
        assert_eq!(presented_chain_above(&stage, root), vec![first, second]);
        assert_eq!(modal_top(&stage, root), second);
        assert_eq!(window_root(&stage, second), root);
    }

    #[test]
    fn layer_root_stops_at_presentation_boundaries() {
        let mut stage = stage();
        let home = stage.insert(Box::new(Blank));
        let nav = stage.insert_nav(home).unwrap();
        stage.set_root(nav).unwrap();
        let body = stage.insert(Box::new(Blank));
        let sheet = stage.insert_nav(body).unwrap();
        stage.present(nav, sheet, PresentStyle::Sheet).unwrap();

        assert_eq!(layer_root(&stage, home), nav);
        assert_eq!(layer_root(&stage, body), sheet);
        assert_eq!(window_root(&stage, body), nav);
    }

    #[test]
    fn deep_chains_hit_the_bound_instead_of_looping() {
        let mut stage = stage();
        let mut current = stage.insert(Box::new(Blank));
        for _ in 0..(WALK_LIMIT + 8) {
            let parent = stage.insert(Box::new(Blank));
            stage.embed(parent, current).unwrap();
            current = parent;
        }
        // `current` is the outermost; the innermost has > WALK_LIMIT parents.
        let deepest = ScreenId::MIN;
        assert_eq!(nearest_nav(&stage, deepest), None);
    }
}
