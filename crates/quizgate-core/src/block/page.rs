//! Host page seam: the handful of document operations the block controller
//! needs, and the input events it filters.

use serde::{Deserialize, Serialize};

/// Opaque reference to an element on the host page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub u64);

/// The overlay surface. Created and destroyed only by the block controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverlayHandle(NodeId);

impl OverlayHandle {
    pub(crate) fn new(node: NodeId) -> Self {
        Self(node)
    }

    pub fn node(&self) -> NodeId {
        self.0
    }
}

/// The mounted quiz modal. The block controller only keeps this as a
/// back-reference for containment tests; the renderer owns the element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ModalHandle(NodeId);

impl ModalHandle {
    pub fn new(node: NodeId) -> Self {
        Self(node)
    }

    pub fn node(&self) -> NodeId {
        self.0
    }
}

/// Registered capture listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ListenerId(pub u64);

/// Event types intercepted while blocked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListenerKind {
    Click,
    KeyDown,
    TouchMove,
    Wheel,
}

impl ListenerKind {
    pub const INTERCEPTED: [ListenerKind; 4] = [
        ListenerKind::Click,
        ListenerKind::KeyDown,
        ListenerKind::TouchMove,
        ListenerKind::Wheel,
    ];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MouseButton {
    Primary,
    Auxiliary,
    Secondary,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InputKind {
    Click { button: MouseButton },
    KeyDown { key: String },
    TouchMove,
    /// Wheel targets are unreliable across nested scroll containers, so the
    /// pointer position is carried for hit testing.
    Wheel { x: f64, y: f64 },
}

impl InputKind {
    pub fn listener_kind(&self) -> ListenerKind {
        match self {
            InputKind::Click { .. } => ListenerKind::Click,
            InputKind::KeyDown { .. } => ListenerKind::KeyDown,
            InputKind::TouchMove => ListenerKind::TouchMove,
            InputKind::Wheel { .. } => ListenerKind::Wheel,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputEvent {
    pub kind: InputKind,
    pub target: NodeId,
}

impl InputEvent {
    pub fn click(target: NodeId) -> Self {
        Self {
            kind: InputKind::Click {
                button: MouseButton::Primary,
            },
            target,
        }
    }

    pub fn key(target: NodeId, key: &str) -> Self {
        Self {
            kind: InputKind::KeyDown { key: key.into() },
            target,
        }
    }

    pub fn wheel(target: NodeId, x: f64, y: f64) -> Self {
        Self {
            kind: InputKind::Wheel { x, y },
            target,
        }
    }

    pub fn is_primary_click(&self) -> bool {
        matches!(
            self.kind,
            InputKind::Click {
                button: MouseButton::Primary
            }
        )
    }
}

/// Document operations used to freeze and unfreeze a page.
pub trait HostPage: Send {
    /// Suppress or restore page scrolling.
    fn set_scroll_locked(&mut self, locked: bool);

    /// Install a capturing-phase listener on the document.
    fn add_capture_listener(&mut self, kind: ListenerKind) -> ListenerId;

    fn remove_listener(&mut self, id: ListenerId);

    /// Create and attach a full-viewport overlay element.
    fn create_overlay(&mut self) -> NodeId;

    /// Detach and drop an element with its subtree.
    fn remove_node(&mut self, node: NodeId);

    /// Topmost element under the given viewport coordinates.
    fn element_at(&self, x: f64, y: f64) -> Option<NodeId>;

    /// Whether `node` is `ancestor` or one of its descendants.
    fn contains(&self, ancestor: NodeId, node: NodeId) -> bool;
}
