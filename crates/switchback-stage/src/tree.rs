#![forbid(unsafe_code)]

//! Arena storage for mounted screens.
//!
//! The [`Stage`] owns every mounted screen behind a [`ScreenId`] and keeps
//! the links routing cares about explicit: structural parenthood (container
//! entries and embedded children), the modal presentation chain, and the
//! dedicated overlay slot for popups. All per-screen routing state (removal
//! marks, bottom-bar flags, presentation style) lives on the node itself.
//!
//! Invariants (checked by [`Stage::validate`]):
//! - every structural child's `parent` link points back at its container
//! - `presented`/`presented_by` are mutual
//! - the main root and the overlay root have no parent and no presenter
//! - parent/presenter chains are acyclic
//! - nav stacks are never empty; tab selections are in range

use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::fmt;

use kurbo::Rect;

use switchback_core::{PopupPlacement, PresentStyle};

use crate::screen::{Screen, ShellScreen};
use crate::surface::Surface;

/// Identifier for a mounted screen. Never zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ScreenId(u64);

impl ScreenId {
    /// Smallest valid id.
    pub const MIN: ScreenId = ScreenId(1);

    /// Build from a raw value; zero is reserved and yields `None`.
    #[must_use]
    pub fn new(raw: u64) -> Option<Self> {
        (raw != 0).then_some(Self(raw))
    }

    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }

    #[must_use]
    pub fn checked_next(self) -> Option<Self> {
        self.0.checked_add(1).map(Self)
    }
}

impl fmt::Display for ScreenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Structural role of a mounted screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScreenKind {
    Plain,
    /// Last-in-first-out container; the top entry is active.
    NavStack {
        stack: Vec<ScreenId>,
        /// Synthesized shells around presented destinations carry a back
        /// affordance that dismisses the presentation.
        back_affordance: bool,
    },
    /// Sibling container; exactly one tab is active.
    TabRack {
        tabs: Vec<ScreenId>,
        selected: usize,
    },
    /// Single-child host that fakes a push inside a modal presentation and
    /// owns the interactive edge dismiss.
    EdgeHost,
    /// Overlay-window host: dimmed or blurred backdrop plus one content
    /// child, pinned per placement.
    PopupHost {
        placement: PopupPlacement,
        dim_blur: bool,
        tap_dismiss: bool,
    },
}

impl ScreenKind {
    #[must_use]
    pub fn is_nav_stack(&self) -> bool {
        matches!(self, Self::NavStack { .. })
    }

    #[must_use]
    pub fn is_tab_rack(&self) -> bool {
        matches!(self, Self::TabRack { .. })
    }

    /// Containers the switch walk descends into.
    #[must_use]
    pub fn is_switchable(&self) -> bool {
        self.is_nav_stack() || self.is_tab_rack()
    }
}

/// One mounted screen: user content plus the structure and routing state
/// attached to it.
pub struct ScreenNode {
    pub(crate) content: Box<dyn Screen>,
    pub(crate) kind: ScreenKind,
    pub(crate) parent: Option<ScreenId>,
    pub(crate) presented: Option<ScreenId>,
    pub(crate) presented_by: Option<ScreenId>,
    pub(crate) surface: Surface,
    pub(crate) marked_for_removal: bool,
    pub(crate) hides_bottom_bar: bool,
    pub(crate) present_style: Option<PresentStyle>,
    pub(crate) embedded: Vec<ScreenId>,
}

impl ScreenNode {
    fn new(content: Box<dyn Screen>, kind: ScreenKind, frame: Rect) -> Self {
        Self {
            content,
            kind,
            parent: None,
            presented: None,
            presented_by: None,
            surface: Surface::new(frame),
            marked_for_removal: false,
            hides_bottom_bar: false,
            present_style: None,
            embedded: Vec::new(),
        }
    }

    #[must_use]
    pub fn kind(&self) -> &ScreenKind {
        &self.kind
    }

    #[must_use]
    pub fn parent(&self) -> Option<ScreenId> {
        self.parent
    }

    #[must_use]
    pub fn presented(&self) -> Option<ScreenId> {
        self.presented
    }

    #[must_use]
    pub fn presented_by(&self) -> Option<ScreenId> {
        self.presented_by
    }

    #[must_use]
    pub fn surface(&self) -> &Surface {
        &self.surface
    }

    #[must_use]
    pub fn screen(&self) -> &dyn Screen {
        self.content.as_ref()
    }

    #[must_use]
    pub fn present_style(&self) -> Option<PresentStyle> {
        self.present_style
    }

    #[must_use]
    pub fn hides_bottom_bar(&self) -> bool {
        self.hides_bottom_bar
    }

    /// Embedded (as-child) screens, in mount order.
    #[must_use]
    pub fn embedded(&self) -> &[ScreenId] {
        &self.embedded
    }

    fn is_detached(&self) -> bool {
        self.parent.is_none() && self.presented_by.is_none()
    }
}

impl fmt::Debug for ScreenNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScreenNode")
            .field("kind", &self.kind)
            .field("parent", &self.parent)
            .field("presented", &self.presented)
            .field("presented_by", &self.presented_by)
            .field("marked_for_removal", &self.marked_for_removal)
            .finish_non_exhaustive()
    }
}

/// Structural errors. Routing treats these as programmer errors at the call
/// site; validation reports them for tests and debug assertions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StageError {
    MissingScreen {
        id: ScreenId,
    },
    /// The operation needs a detached screen but this one is mounted.
    AlreadyAttached {
        id: ScreenId,
    },
    AlreadyPresenting {
        anchor: ScreenId,
        presented: ScreenId,
    },
    NotPresented {
        id: ScreenId,
    },
    NotANavStack {
        id: ScreenId,
    },
    NotATabRack {
        id: ScreenId,
    },
    EmptyTabRack,
    EmptyNavStack {
        id: ScreenId,
    },
    IndexOutOfRange {
        id: ScreenId,
        index: usize,
        len: usize,
    },
    RootOccupied {
        root: ScreenId,
    },
    OverlayOccupied {
        overlay: ScreenId,
    },
    MissingChild {
        parent: ScreenId,
        child: ScreenId,
    },
    ParentLinkMismatch {
        child: ScreenId,
        expected: Option<ScreenId>,
        actual: Option<ScreenId>,
    },
    PresentLinkMismatch {
        presenter: ScreenId,
        presented: ScreenId,
    },
    CycleDetected {
        id: ScreenId,
    },
}

impl fmt::Display for StageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingScreen { id } => write!(f, "screen {id} is not mounted"),
            Self::AlreadyAttached { id } => {
                write!(f, "screen {id} is already attached somewhere")
            }
            Self::AlreadyPresenting { anchor, presented } => write!(
                f,
                "screen {anchor} already presents {presented}"
            ),
            Self::NotPresented { id } => write!(f, "screen {id} is not presented"),
            Self::NotANavStack { id } => write!(f, "screen {id} is not a nav stack"),
            Self::NotATabRack { id } => write!(f, "screen {id} is not a tab rack"),
            Self::EmptyTabRack => write!(f, "a tab rack needs at least one tab"),
            Self::EmptyNavStack { id } => write!(f, "nav stack {id} has no entries"),
            Self::IndexOutOfRange { id, index, len } => write!(
                f,
                "index {index} out of range for container {id} of len {len}"
            ),
            Self::RootOccupied { root } => {
                write!(f, "main window already has root {root}")
            }
            Self::OverlayOccupied { overlay } => {
                write!(f, "overlay window already shows {overlay}")
            }
            Self::MissingChild { parent, child } => write!(
                f,
                "container {parent} references missing child {child}"
            ),
            Self::ParentLinkMismatch {
                child,
                expected,
                actual,
            } => write!(
                f,
                "screen {child} parent mismatch: expected {expected:?}, got {actual:?}"
            ),
            Self::PresentLinkMismatch {
                presenter,
                presented,
            } => write!(
                f,
                "presentation links between {presenter} and {presented} are not mutual"
            ),
            Self::CycleDetected { id } => {
                write!(f, "ancestry of screen {id} contains a cycle")
            }
        }
    }
}

impl std::error::Error for StageError {}

/// The owned screen hierarchy: one main window, one overlay slot.
pub struct Stage {
    nodes: BTreeMap<ScreenId, ScreenNode>,
    root: Option<ScreenId>,
    overlay: Option<ScreenId>,
    bounds: Rect,
    next_id: ScreenId,
}

impl Stage {
    #[must_use]
    pub fn new(bounds: Rect) -> Self {
        Self {
            nodes: BTreeMap::new(),
            root: None,
            overlay: None,
            bounds,
            next_id: ScreenId::MIN,
        }
    }

    #[must_use]
    pub fn bounds(&self) -> Rect {
        self.bounds
    }

    #[must_use]
    pub fn root(&self) -> Option<ScreenId> {
        self.root
    }

    #[must_use]
    pub fn overlay(&self) -> Option<ScreenId> {
        self.overlay
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    #[must_use]
    pub fn contains(&self, id: ScreenId) -> bool {
        self.nodes.contains_key(&id)
    }

    pub fn ids(&self) -> impl Iterator<Item = ScreenId> + '_ {
        self.nodes.keys().copied()
    }

    fn allocate(&mut self) -> ScreenId {
        let id = self.next_id;
        // The u64 id space outlives any process; saturate rather than wrap.
        self.next_id = id.checked_next().unwrap_or(id);
        id
    }

    // ---- mounting ----

    /// Mount a plain screen, detached, sized to the stage bounds.
    pub fn insert(&mut self, content: Box<dyn Screen>) -> ScreenId {
        let id = self.allocate();
        self.nodes
            .insert(id, ScreenNode::new(content, ScreenKind::Plain, self.bounds));
        id
    }

    /// Wrap a detached screen in a new nav stack shell.
    pub fn insert_nav(&mut self, root_entry: ScreenId) -> Result<ScreenId, StageError> {
        self.expect_detached(root_entry)?;
        let id = self.allocate();
        self.nodes.insert(
            id,
            ScreenNode::new(
                Box::new(ShellScreen),
                ScreenKind::NavStack {
                    stack: vec![root_entry],
                    back_affordance: false,
                },
                self.bounds,
            ),
        );
        self.link_parent(root_entry, id);
        Ok(id)
    }

    /// Mount a tab rack over detached tab screens; the first is selected.
    pub fn insert_tabs(&mut self, tabs: Vec<ScreenId>) -> Result<ScreenId, StageError> {
        if tabs.is_empty() {
            return Err(StageError::EmptyTabRack);
        }
        for &tab in &tabs {
            self.expect_detached(tab)?;
        }
        let id = self.allocate();
        self.nodes.insert(
            id,
            ScreenNode::new(
                Box::new(ShellScreen),
                ScreenKind::TabRack { tabs: tabs.clone(), selected: 0 },
                self.bounds,
            ),
        );
        for tab in tabs {
            self.link_parent(tab, id);
        }
        Ok(id)
    }

    /// Wrap a detached screen in an edge-swipe host.
    pub fn insert_edge_host(&mut self, child: ScreenId) -> Result<ScreenId, StageError> {
        self.expect_detached(child)?;
        let id = self.allocate();
        let mut node = ScreenNode::new(Box::new(ShellScreen), ScreenKind::EdgeHost, self.bounds);
        node.embedded.push(child);
        self.nodes.insert(id, node);
        self.link_parent(child, id);
        Ok(id)
    }

    /// Wrap a detached screen in a popup host for the overlay window.
    pub fn insert_popup_host(
        &mut self,
        content: ScreenId,
        placement: PopupPlacement,
        dim_blur: bool,
        tap_dismiss: bool,
    ) -> Result<ScreenId, StageError> {
        self.expect_detached(content)?;
        let id = self.allocate();
        let mut node = ScreenNode::new(
            Box::new(ShellScreen),
            ScreenKind::PopupHost {
                placement,
                dim_blur,
                tap_dismiss,
            },
            self.bounds,
        );
        node.embedded.push(content);
        self.nodes.insert(id, node);
        self.link_parent(content, id);
        Ok(id)
    }

    /// Install the main window's root.
    pub fn set_root(&mut self, id: ScreenId) -> Result<(), StageError> {
        if let Some(root) = self.root {
            return Err(StageError::RootOccupied { root });
        }
        self.expect_detached(id)?;
        self.node_mut(id)?.surface.frame = self.bounds;
        self.root = Some(id);
        Ok(())
    }

    /// Install the overlay window's root (popups live here).
    pub fn set_overlay(&mut self, id: ScreenId) -> Result<(), StageError> {
        if let Some(overlay) = self.overlay {
            return Err(StageError::OverlayOccupied { overlay });
        }
        self.expect_detached(id)?;
        self.overlay = Some(id);
        Ok(())
    }

    /// Unhook the overlay root without removing its subtree.
    pub fn take_overlay(&mut self) -> Option<ScreenId> {
        self.overlay.take()
    }

    // ---- presentation ----

    /// Present `target` (detached) on `anchor`. The target fills the stage.
    pub fn present(
        &mut self,
        anchor: ScreenId,
        target: ScreenId,
        style: PresentStyle,
    ) -> Result<(), StageError> {
        if let Some(presented) = self.node(anchor)?.presented {
            return Err(StageError::AlreadyPresenting { anchor, presented });
        }
        self.expect_detached(target)?;
        if target == anchor {
            return Err(StageError::AlreadyAttached { id: target });
        }
        let bounds = self.bounds;
        {
            let node = self.node_mut(target)?;
            node.presented_by = Some(anchor);
            node.present_style = Some(style);
            node.surface.frame = bounds;
        }
        self.node_mut(anchor)?.presented = Some(target);
        Ok(())
    }

    /// Sever a presentation; returns the presenter. The target stays
    /// mounted but detached, ready for [`remove_subtree`](Self::remove_subtree).
    pub fn end_presentation(&mut self, target: ScreenId) -> Result<ScreenId, StageError> {
        let presenter = self
            .node(target)?
            .presented_by
            .ok_or(StageError::NotPresented { id: target })?;
        {
            let node = self.node_mut(target)?;
            node.presented_by = None;
            node.present_style = None;
        }
        if let Ok(anchor) = self.node_mut(presenter) {
            anchor.presented = None;
        }
        Ok(presenter)
    }

    // ---- nav stacks ----

    pub fn nav_stack(&self, nav: ScreenId) -> Result<&[ScreenId], StageError> {
        match &self.node(nav)?.kind {
            ScreenKind::NavStack { stack, .. } => Ok(stack),
            _ => Err(StageError::NotANavStack { id: nav }),
        }
    }

    pub fn nav_top(&self, nav: ScreenId) -> Result<ScreenId, StageError> {
        self.nav_stack(nav)?
            .last()
            .copied()
            .ok_or(StageError::EmptyNavStack { id: nav })
    }

    pub fn nav_push(&mut self, nav: ScreenId, entry: ScreenId) -> Result<(), StageError> {
        self.expect_detached(entry)?;
        let frame = self.node(nav)?.surface.frame;
        match &mut self.node_mut(nav)?.kind {
            ScreenKind::NavStack { stack, .. } => stack.push(entry),
            _ => return Err(StageError::NotANavStack { id: nav }),
        }
        self.link_parent(entry, nav);
        if let Ok(node) = self.node_mut(entry) {
            node.surface.frame = frame;
        }
        Ok(())
    }

    /// Pop the top entry. A single-entry stack stays put (`Ok(None)`).
    /// The popped screen is detached, not removed.
    pub fn nav_pop(&mut self, nav: ScreenId) -> Result<Option<ScreenId>, StageError> {
        let top = match &mut self.node_mut(nav)?.kind {
            ScreenKind::NavStack { stack, .. } => {
                if stack.len() <= 1 {
                    return Ok(None);
                }
                stack.pop()
            }
            _ => return Err(StageError::NotANavStack { id: nav }),
        };
        if let Some(top) = top {
            if let Ok(node) = self.node_mut(top) {
                node.parent = None;
            }
        }
        Ok(top)
    }

    /// Pop every entry above `index`, detaching them; top-last order.
    pub fn pop_to(&mut self, nav: ScreenId, index: usize) -> Result<Vec<ScreenId>, StageError> {
        let popped = match &mut self.node_mut(nav)?.kind {
            ScreenKind::NavStack { stack, .. } => {
                if index >= stack.len() {
                    return Err(StageError::IndexOutOfRange {
                        id: nav,
                        index,
                        len: stack.len(),
                    });
                }
                stack.split_off(index + 1)
            }
            _ => return Err(StageError::NotANavStack { id: nav }),
        };
        for &id in &popped {
            if let Ok(node) = self.node_mut(id) {
                node.parent = None;
            }
        }
        Ok(popped)
    }

    pub fn set_back_affordance(&mut self, nav: ScreenId, on: bool) -> Result<(), StageError> {
        match &mut self.node_mut(nav)?.kind {
            ScreenKind::NavStack {
                back_affordance, ..
            } => {
                *back_affordance = on;
                Ok(())
            }
            _ => Err(StageError::NotANavStack { id: nav }),
        }
    }

    // ---- tab racks ----

    pub fn tabs(&self, rack: ScreenId) -> Result<&[ScreenId], StageError> {
        match &self.node(rack)?.kind {
            ScreenKind::TabRack { tabs, .. } => Ok(tabs),
            _ => Err(StageError::NotATabRack { id: rack }),
        }
    }

    pub fn selected_tab(&self, rack: ScreenId) -> Result<ScreenId, StageError> {
        match &self.node(rack)?.kind {
            ScreenKind::TabRack { tabs, selected } => {
                tabs.get(*selected)
                    .copied()
                    .ok_or(StageError::IndexOutOfRange {
                        id: rack,
                        index: *selected,
                        len: tabs.len(),
                    })
            }
            _ => Err(StageError::NotATabRack { id: rack }),
        }
    }

    pub fn select_tab(&mut self, rack: ScreenId, index: usize) -> Result<(), StageError> {
        match &mut self.node_mut(rack)?.kind {
            ScreenKind::TabRack { tabs, selected } => {
                if index >= tabs.len() {
                    return Err(StageError::IndexOutOfRange {
                        id: rack,
                        index,
                        len: tabs.len(),
                    });
                }
                *selected = index;
                Ok(())
            }
            _ => Err(StageError::NotATabRack { id: rack }),
        }
    }

    // ---- embedding ----

    /// Mount a detached screen as an embedded child, sized to the parent.
    pub fn embed(&mut self, parent: ScreenId, child: ScreenId) -> Result<(), StageError> {
        self.expect_detached(child)?;
        let frame = self.node(parent)?.surface.frame;
        self.node_mut(parent)?.embedded.push(child);
        self.link_parent(child, parent);
        if let Ok(node) = self.node_mut(child) {
            node.surface.frame = frame;
        }
        Ok(())
    }

    // ---- removal & rewriting ----

    pub fn mark_for_removal(&mut self, id: ScreenId, on: bool) -> Result<(), StageError> {
        self.node_mut(id)?.marked_for_removal = on;
        Ok(())
    }

    #[must_use]
    pub fn is_marked(&self, id: ScreenId) -> bool {
        self.nodes
            .get(&id)
            .is_some_and(|node| node.marked_for_removal)
    }

    /// Drop marked entries from a nav stack and remove their subtrees.
    /// Applied without animation; returns every removed id.
    pub fn rebuild_stack(&mut self, nav: ScreenId) -> Result<Vec<ScreenId>, StageError> {
        let stack = self.nav_stack(nav)?.to_vec();
        let (marked, kept): (Vec<ScreenId>, Vec<ScreenId>) =
            stack.into_iter().partition(|&id| self.is_marked(id));
        if marked.is_empty() {
            return Ok(Vec::new());
        }
        match &mut self.node_mut(nav)?.kind {
            ScreenKind::NavStack { stack, .. } => *stack = kept,
            _ => return Err(StageError::NotANavStack { id: nav }),
        }
        let mut removed = Vec::new();
        for id in marked {
            if let Ok(node) = self.node_mut(id) {
                node.parent = None;
            }
            removed.extend(self.remove_subtree(id));
        }
        Ok(removed)
    }

    /// Remove a screen and everything hanging off it: container entries,
    /// embedded children, and presented chains. Returns the removed ids.
    pub fn remove_subtree(&mut self, id: ScreenId) -> Vec<ScreenId> {
        self.detach(id);
        let mut removed = Vec::new();
        let mut pending = vec![id];
        while let Some(current) = pending.pop() {
            let Some(node) = self.nodes.remove(&current) else {
                continue;
            };
            removed.push(current);
            match &node.kind {
                ScreenKind::NavStack { stack, .. } => pending.extend(stack.iter().copied()),
                ScreenKind::TabRack { tabs, .. } => pending.extend(tabs.iter().copied()),
                ScreenKind::Plain | ScreenKind::EdgeHost | ScreenKind::PopupHost { .. } => {}
            }
            pending.extend(node.embedded.iter().copied());
            if let Some(presented) = node.presented {
                pending.push(presented);
            }
        }
        removed
    }

    /// Unhook `id` from whatever holds it, leaving its subtree intact.
    fn detach(&mut self, id: ScreenId) {
        if self.root == Some(id) {
            self.root = None;
        }
        if self.overlay == Some(id) {
            self.overlay = None;
        }
        let (parent, presenter) = match self.nodes.get(&id) {
            Some(node) => (node.parent, node.presented_by),
            None => return,
        };
        if let Some(parent) = parent {
            if let Some(container) = self.nodes.get_mut(&parent) {
                match &mut container.kind {
                    ScreenKind::NavStack { stack, .. } => stack.retain(|&e| e != id),
                    ScreenKind::TabRack { tabs, selected } => {
                        tabs.retain(|&e| e != id);
                        if *selected >= tabs.len() && !tabs.is_empty() {
                            *selected = tabs.len() - 1;
                        }
                    }
                    ScreenKind::Plain | ScreenKind::EdgeHost | ScreenKind::PopupHost { .. } => {}
                }
                container.embedded.retain(|&e| e != id);
            }
        }
        if let Some(presenter) = presenter {
            if let Some(anchor) = self.nodes.get_mut(&presenter) {
                anchor.presented = None;
            }
        }
        if let Some(node) = self.nodes.get_mut(&id) {
            node.parent = None;
            node.presented_by = None;
        }
    }

    // ---- per-node state ----

    pub fn set_hides_bottom_bar(&mut self, id: ScreenId, on: bool) -> Result<(), StageError> {
        self.node_mut(id)?.hides_bottom_bar = on;
        Ok(())
    }

    #[must_use]
    pub fn hides_bottom_bar(&self, id: ScreenId) -> bool {
        self.nodes
            .get(&id)
            .is_some_and(|node| node.hides_bottom_bar)
    }

    // ---- access ----

    #[must_use]
    pub fn get(&self, id: ScreenId) -> Option<&ScreenNode> {
        self.nodes.get(&id)
    }

    pub fn node(&self, id: ScreenId) -> Result<&ScreenNode, StageError> {
        self.nodes.get(&id).ok_or(StageError::MissingScreen { id })
    }

    pub fn node_mut(&mut self, id: ScreenId) -> Result<&mut ScreenNode, StageError> {
        self.nodes
            .get_mut(&id)
            .ok_or(StageError::MissingScreen { id })
    }

    #[must_use]
    pub fn screen(&self, id: ScreenId) -> Option<&dyn Screen> {
        self.nodes.get(&id).map(|node| node.content.as_ref())
    }

    pub fn screen_mut(&mut self, id: ScreenId) -> Option<&mut dyn Screen> {
        self.nodes.get_mut(&id).map(|node| node.content.as_mut())
    }

    /// Downcast a mounted screen to its concrete type.
    #[must_use]
    pub fn screen_as<T: Screen>(&self, id: ScreenId) -> Option<&T> {
        self.screen(id).and_then(|s| s.downcast_ref::<T>())
    }

    pub fn screen_as_mut<T: Screen>(&mut self, id: ScreenId) -> Option<&mut T> {
        self.screen_mut(id).and_then(|s| s.downcast_mut::<T>())
    }

    #[must_use]
    pub fn screen_type(&self, id: ScreenId) -> Option<std::any::TypeId> {
        self.screen(id).map(|s| s.concrete_type())
    }

    #[must_use]
    pub fn kind(&self, id: ScreenId) -> Option<&ScreenKind> {
        self.nodes.get(&id).map(|node| &node.kind)
    }

    #[must_use]
    pub fn parent(&self, id: ScreenId) -> Option<ScreenId> {
        self.nodes.get(&id).and_then(|node| node.parent)
    }

    #[must_use]
    pub fn presented(&self, id: ScreenId) -> Option<ScreenId> {
        self.nodes.get(&id).and_then(|node| node.presented)
    }

    #[must_use]
    pub fn presenter(&self, id: ScreenId) -> Option<ScreenId> {
        self.nodes.get(&id).and_then(|node| node.presented_by)
    }

    #[must_use]
    pub fn surface(&self, id: ScreenId) -> Option<&Surface> {
        self.nodes.get(&id).map(|node| &node.surface)
    }

    pub fn surface_mut(&mut self, id: ScreenId) -> Option<&mut Surface> {
        self.nodes.get_mut(&id).map(|node| &mut node.surface)
    }

    /// Container entries plus embedded children, in structural order.
    #[must_use]
    pub fn structural_children(&self, id: ScreenId) -> Vec<ScreenId> {
        let Some(node) = self.nodes.get(&id) else {
            return Vec::new();
        };
        let mut children = match &node.kind {
            ScreenKind::NavStack { stack, .. } => stack.clone(),
            ScreenKind::TabRack { tabs, .. } => tabs.clone(),
            ScreenKind::Plain | ScreenKind::EdgeHost | ScreenKind::PopupHost { .. } => Vec::new(),
        };
        children.extend(node.embedded.iter().copied());
        children
    }

    fn link_parent(&mut self, child: ScreenId, parent: ScreenId) {
        if let Some(node) = self.nodes.get_mut(&child) {
            node.parent = Some(parent);
        }
    }

    fn expect_detached(&self, id: ScreenId) -> Result<(), StageError> {
        let node = self.node(id)?;
        if !node.is_detached() || self.root == Some(id) || self.overlay == Some(id) {
            return Err(StageError::AlreadyAttached { id });
        }
        Ok(())
    }

    // ---- validation ----

    /// Check every structural invariant. Cheap enough for debug assertions
    /// after routing operations.
    pub fn validate(&self) -> Result<(), StageError> {
        for (&id, node) in &self.nodes {
            for child in self.structural_children(id) {
                let Some(child_node) = self.nodes.get(&child) else {
                    return Err(StageError::MissingChild { parent: id, child });
                };
                if child_node.parent != Some(id) {
                    return Err(StageError::ParentLinkMismatch {
                        child,
                        expected: Some(id),
                        actual: child_node.parent,
                    });
                }
            }
            if let Some(parent) = node.parent {
                let holds = self
                    .nodes
                    .get(&parent)
                    .is_some_and(|_| self.structural_children(parent).contains(&id));
                if !holds {
                    return Err(StageError::ParentLinkMismatch {
                        child: id,
                        expected: None,
                        actual: Some(parent),
                    });
                }
            }
            if let Some(presented) = node.presented {
                let mutual = self
                    .nodes
                    .get(&presented)
                    .is_some_and(|p| p.presented_by == Some(id));
                if !mutual {
                    return Err(StageError::PresentLinkMismatch {
                        presenter: id,
                        presented,
                    });
                }
            }
            if let Some(presenter) = node.presented_by {
                let mutual = self
                    .nodes
                    .get(&presenter)
                    .is_some_and(|p| p.presented == Some(id));
                if !mutual {
                    return Err(StageError::PresentLinkMismatch {
                        presenter,
                        presented: id,
                    });
                }
            }
            match &node.kind {
                ScreenKind::NavStack { stack, .. } if stack.is_empty() => {
                    return Err(StageError::EmptyNavStack { id });
                }
                ScreenKind::TabRack { tabs, selected } if *selected >= tabs.len() => {
                    return Err(StageError::IndexOutOfRange {
                        id,
                        index: *selected,
                        len: tabs.len(),
                    });
                }
                _ => {}
            }
        }
        for anchor in [self.root, self.overlay].into_iter().flatten() {
            let node = self.node(anchor)?;
            if node.parent.is_some() || node.presented_by.is_some() {
                return Err(StageError::AlreadyAttached { id: anchor });
            }
        }
        // Ancestry chains must terminate.
        for &id in self.nodes.keys() {
            let mut seen = BTreeSet::new();
            let mut current = id;
            while let Some(next) = self
                .nodes
                .get(&current)
                .and_then(|n| n.parent.or(n.presented_by))
            {
                if !seen.insert(current) {
                    return Err(StageError::CycleDetected { id });
                }
                current = next;
                if seen.len() > self.nodes.len() {
                    return Err(StageError::CycleDetected { id });
                }
            }
        }
        Ok(())
    }
}

impl fmt::Debug for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Stage")
            .field("root", &self.root)
            .field("overlay", &self.overlay)
            .field("screens", &self.nodes.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kurbo::Rect;

    const BOUNDS: Rect = Rect::new(0.0, 0.0, 390.0, 844.0);

    #[derive(Default)]
    struct Blank;
    impl Screen for Blank {}

    #[derive(Default)]
    struct Other;
    impl Screen for Other {}

    fn stage() -> Stage {
        Stage::new(BOUNDS)
    }

    #[test]
    fn ids_start_at_min_and_advance() {
        let mut stage = stage();
        let a = stage.insert(Box::new(Blank));
        let b = stage.insert(Box::new(Blank));
        assert_eq!(a, ScreenId::MIN);
        assert!(b > a);
        assert!(ScreenId::new(0).is_none());
    }

    #[test]
    fn nav_wrap_links_parenthood() {
        let mut stage = stage();
        let home = stage.insert(Box::new(Blank));
        let nav = stage.insert_nav(home).unwrap();
        assert_eq!(stage.parent(home), Some(nav));
        assert_eq!(stage.nav_stack(nav).unwrap(), &[home]);
        assert!(stage.validate().is_ok());
    }

    #[test]
    fn attached_screens_cannot_be_remounted() {
        let mut stage = stage();
        let home = stage.insert(Box::new(Blank));
        let _nav = stage.insert_nav(home).unwrap();
        let err = stage.insert_nav(home).unwrap_err();
        assert_eq!(err, StageError::AlreadyAttached { id: home });
    }

    #[test]
    fn present_links_are_mutual() {
        let mut stage = stage();
        let root = stage.insert(Box::new(Blank));
        stage.set_root(root).unwrap();
        let modal = stage.insert(Box::new(Other));
        stage.present(root, modal, PresentStyle::FullScreen).unwrap();
        assert_eq!(stage.presented(root), Some(modal));
        assert_eq!(stage.presenter(modal), Some(root));
        assert_eq!(
            stage.node(modal).unwrap().present_style(),
            Some(PresentStyle::FullScreen)
        );
        assert!(stage.validate().is_ok());

        let presenter = stage.end_presentation(modal).unwrap();
        assert_eq!(presenter, root);
        assert_eq!(stage.presented(root), None);
        assert!(stage.validate().is_ok());
    }

    #[test]
    fn double_present_is_rejected() {
        let mut stage = stage();
        let root = stage.insert(Box::new(Blank));
        stage.set_root(root).unwrap();
        let a = stage.insert(Box::new(Blank));
        let b = stage.insert(Box::new(Blank));
        stage.present(root, a, PresentStyle::FullScreen).unwrap();
        let err = stage.present(root, b, PresentStyle::FullScreen).unwrap_err();
        assert_eq!(
            err,
            StageError::AlreadyPresenting {
                anchor: root,
                presented: a
            }
        );
    }

    #[test]
    fn nav_pop_keeps_the_last_entry() {
        let mut stage = stage();
        let home = stage.insert(Box::new(Blank));
        let nav = stage.insert_nav(home).unwrap();
        let detail = stage.insert(Box::new(Other));
        stage.nav_push(nav, detail).unwrap();
        assert_eq!(stage.nav_pop(nav).unwrap(), Some(detail));
        assert_eq!(stage.nav_pop(nav).unwrap(), None);
        assert_eq!(stage.nav_stack(nav).unwrap(), &[home]);
    }

    #[test]
    fn pop_to_detaches_everything_above() {
        let mut stage = stage();
        let a = stage.insert(Box::new(Blank));
        let nav = stage.insert_nav(a).unwrap();
        let b = stage.insert(Box::new(Blank));
        let c = stage.insert(Box::new(Blank));
        stage.nav_push(nav, b).unwrap();
        stage.nav_push(nav, c).unwrap();
        let popped = stage.pop_to(nav, 0).unwrap();
        assert_eq!(popped, vec![b, c]);
        assert_eq!(stage.nav_stack(nav).unwrap(), &[a]);
        assert_eq!(stage.parent(b), None);
    }

    #[test]
    fn rebuild_stack_drops_marked_entries_and_their_subtrees() {
        let mut stage = stage();
        let a = stage.insert(Box::new(Blank));
        let nav = stage.insert_nav(a).unwrap();
        let b = stage.insert(Box::new(Blank));
        let embedded = stage.insert(Box::new(Other));
        stage.nav_push(nav, b).unwrap();
        stage.embed(b, embedded).unwrap();
        let c = stage.insert(Box::new(Blank));
        stage.nav_push(nav, c).unwrap();

        stage.mark_for_removal(b, true).unwrap();
        let removed = stage.rebuild_stack(nav).unwrap();
        assert!(removed.contains(&b));
        assert!(removed.contains(&embedded), "embedded child goes with it");
        assert_eq!(stage.nav_stack(nav).unwrap(), &[a, c]);
        assert!(!stage.contains(b));
        assert!(stage.validate().is_ok());
    }

    #[test]
    fn remove_subtree_takes_presented_chains() {
        let mut stage = stage();
        let root = stage.insert(Box::new(Blank));
        stage.set_root(root).unwrap();
        let modal = stage.insert(Box::new(Blank));
        stage.present(root, modal, PresentStyle::FullScreen).unwrap();
        let second = stage.insert(Box::new(Blank));
        stage.present(modal, second, PresentStyle::Sheet).unwrap();

        let removed = stage.remove_subtree(modal);
        assert!(removed.contains(&modal));
        assert!(removed.contains(&second));
        assert_eq!(stage.presented(root), None);
        assert!(stage.validate().is_ok());
    }

    #[test]
    fn tab_selection_is_bounded() {
        let mut stage = stage();
        let a = stage.insert(Box::new(Blank));
        let b = stage.insert(Box::new(Other));
        let rack = stage.insert_tabs(vec![a, b]).unwrap();
        assert_eq!(stage.selected_tab(rack).unwrap(), a);
        stage.select_tab(rack, 1).unwrap();
        assert_eq!(stage.selected_tab(rack).unwrap(), b);
        let err = stage.select_tab(rack, 2).unwrap_err();
        assert!(matches!(err, StageError::IndexOutOfRange { .. }));
    }

    #[test]
    fn validate_catches_severed_parent_links() {
        let mut stage = stage();
        let home = stage.insert(Box::new(Blank));
        let nav = stage.insert_nav(home).unwrap();
        stage.node_mut(home).unwrap().parent = None;
        let err = stage.validate().unwrap_err();
        assert_eq!(
            err,
            StageError::ParentLinkMismatch {
                child: home,
                expected: Some(nav),
                actual: None
            }
        );
    }

    #[test]
    fn validate_catches_cycles() {
        let mut stage = stage();
        let a = stage.insert(Box::new(Blank));
        let b = stage.insert(Box::new(Blank));
        stage.embed(a, b).unwrap();
        // Force a cycle through the embedded list.
        stage.node_mut(a).unwrap().parent = Some(b);
        stage.node_mut(b).unwrap().embedded.push(a);
        assert!(matches!(
            stage.validate(),
            Err(StageError::CycleDetected { .. } | StageError::ParentLinkMismatch { .. })
        ));
    }

    #[test]
    fn screen_downcast_reaches_concrete_state() {
        let mut stage = stage();
        let id = stage.insert(Box::new(Blank));
        assert!(stage.screen_as::<Blank>(id).is_some());
        assert!(stage.screen_as::<Other>(id).is_none());
        assert_eq!(
            stage.screen_type(id),
            Some(std::any::TypeId::of::<Blank>())
        );
    }

    #[test]
    fn popup_host_wraps_content() {
        let mut stage = stage();
        let content = stage.insert(Box::new(Blank));
        let host = stage
            .insert_popup_host(content, PopupPlacement::Bottom, true, true)
            .unwrap();
        stage.set_overlay(host).unwrap();
        assert_eq!(stage.overlay(), Some(host));
        match stage.kind(host).unwrap() {
            ScreenKind::PopupHost {
                placement,
                dim_blur,
                tap_dismiss,
            } => {
                assert_eq!(*placement, PopupPlacement::Bottom);
                assert!(dim_blur);
                assert!(tap_dismiss);
            }
            other => panic!("unexpected kind {other:?}"),
        }
        assert_eq!(stage.node(host).unwrap().embedded(), &[content]);
    }
}
