//! Block controller: freezes the host page behind an overlay and decides the
//! fate of every intercepted input event.
//!
//! ## State Transitions
//!
//! ```text
//! Unblocked -> Blocked <-> Reviewing -> Unblocked
//! ```
//!
//! Reviewing is a sub-mode of Blocked: the listeners and overlay stay exactly
//! as they are, only the interception policy gains one escape gesture.

use serde::{Deserialize, Serialize};

use super::page::{HostPage, InputEvent, InputKind, ListenerId, ListenerKind, ModalHandle, NodeId, OverlayHandle};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlockPhase {
    Unblocked,
    Blocked,
    Reviewing,
}

/// What the capture listener should do with an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Disposition {
    /// Let the event through untouched.
    Allow,
    /// Let the event through and end the session (outside click while reviewing).
    CloseRequested,
    /// Prevent the default action and stop propagation.
    Suppress,
}

impl Disposition {
    pub fn is_suppressed(self) -> bool {
        self == Disposition::Suppress
    }
}

pub struct BlockController<P: HostPage> {
    page: P,
    phase: BlockPhase,
    overlay: Option<OverlayHandle>,
    modal: Option<ModalHandle>,
    listeners: Vec<ListenerId>,
}

impl<P: HostPage> BlockController<P> {
    pub fn new(page: P) -> Self {
        Self {
            page,
            phase: BlockPhase::Unblocked,
            overlay: None,
            modal: None,
            listeners: Vec::new(),
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn phase(&self) -> BlockPhase {
        self.phase
    }

    pub fn is_blocked(&self) -> bool {
        self.phase != BlockPhase::Unblocked
    }

    pub fn is_reviewing(&self) -> bool {
        self.phase == BlockPhase::Reviewing
    }

    pub fn overlay(&self) -> Option<OverlayHandle> {
        self.overlay
    }

    pub fn modal(&self) -> Option<ModalHandle> {
        self.modal
    }

    pub fn page(&self) -> &P {
        &self.page
    }

    pub fn page_mut(&mut self) -> &mut P {
        &mut self.page
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Freeze the page. Returns `false` if it was already blocked.
    pub fn block(&mut self) -> bool {
        if self.is_blocked() {
            return false;
        }
        self.page.set_scroll_locked(true);
        self.listeners = ListenerKind::INTERCEPTED
            .iter()
            .map(|kind| self.page.add_capture_listener(*kind))
            .collect();
        let overlay = OverlayHandle::new(self.page.create_overlay());
        self.overlay = Some(overlay);
        self.phase = BlockPhase::Blocked;
        tracing::info!(overlay = ?overlay.node(), "page blocked");
        true
    }

    /// Restore the page. Returns `false` if it was not blocked.
    pub fn unblock(&mut self) -> bool {
        if !self.is_blocked() {
            return false;
        }
        self.page.set_scroll_locked(false);
        for id in self.listeners.drain(..) {
            self.page.remove_listener(id);
        }
        if let Some(overlay) = self.overlay.take() {
            self.page.remove_node(overlay.node());
        }
        self.modal = None;
        self.phase = BlockPhase::Unblocked;
        tracing::info!("page unblocked");
        true
    }

    /// Enter or leave the Reviewing sub-mode. Ignored while unblocked.
    pub fn set_review_mode(&mut self, reviewing: bool) {
        self.phase = match (self.phase, reviewing) {
            (BlockPhase::Unblocked, _) => return,
            (_, true) => BlockPhase::Reviewing,
            (_, false) => BlockPhase::Blocked,
        };
        tracing::debug!(phase = ?self.phase, "review mode changed");
    }

    pub fn attach_modal(&mut self, modal: ModalHandle) {
        self.modal = Some(modal);
    }

    pub fn detach_modal(&mut self) -> Option<ModalHandle> {
        self.modal.take()
    }

    /// Interception policy, evaluated in order:
    ///
    /// 1. target inside the modal: allow;
    /// 2. wheel: hit-test the pointer position, inside the modal: allow;
    /// 3. reviewing and a primary click on the overlay itself: close;
    /// 4. anything else: suppress.
    pub fn intercept(&self, event: &InputEvent) -> Disposition {
        if !self.is_blocked() {
            return Disposition::Allow;
        }
        if self.inside_modal(event.target) {
            return Disposition::Allow;
        }
        if let InputKind::Wheel { x, y } = event.kind {
            if let Some(hit) = self.page.element_at(x, y) {
                if self.inside_modal(hit) {
                    return Disposition::Allow;
                }
            }
        }
        if self.is_reviewing()
            && event.is_primary_click()
            && self.overlay.is_some_and(|o| o.node() == event.target)
        {
            return Disposition::CloseRequested;
        }
        Disposition::Suppress
    }

    fn inside_modal(&self, node: NodeId) -> bool {
        self.modal
            .is_some_and(|modal| self.page.contains(modal.node(), node))
    }
}
