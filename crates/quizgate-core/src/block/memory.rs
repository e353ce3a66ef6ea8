//! In-memory host page: a small element tree with hit-testing, used by the
//! CLI simulator and the test suite.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard};

use super::page::{HostPage, ListenerId, ListenerKind, NodeId};

/// Axis-aligned element bounds in viewport coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub const VIEWPORT: Rect = Rect {
        x: 0.0,
        y: 0.0,
        width: f64::INFINITY,
        height: f64::INFINITY,
    };

    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }

    pub fn contains(&self, x: f64, y: f64) -> bool {
        x >= self.x && y >= self.y && x < self.x + self.width && y < self.y + self.height
    }
}

#[derive(Debug, Clone)]
struct Node {
    parent: Option<NodeId>,
    label: String,
    rect: Option<Rect>,
}

#[derive(Debug)]
struct PageTree {
    nodes: HashMap<NodeId, Node>,
    next_node: u64,
    listeners: BTreeMap<ListenerId, ListenerKind>,
    next_listener: u64,
    scroll_locked: bool,
}

/// Shared handle to an in-memory document. Clones see the same tree, the way
/// every script on a real page sees the same document.
#[derive(Debug, Clone)]
pub struct MemoryPage {
    inner: Arc<Mutex<PageTree>>,
}

impl Default for MemoryPage {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryPage {
    pub const BODY: NodeId = NodeId(0);

    pub fn new() -> Self {
        let mut nodes = HashMap::new();
        nodes.insert(
            Self::BODY,
            Node {
                parent: None,
                label: "body".into(),
                rect: Some(Rect::VIEWPORT),
            },
        );
        Self {
            inner: Arc::new(Mutex::new(PageTree {
                nodes,
                next_node: 1,
                listeners: BTreeMap::new(),
                next_listener: 1,
                scroll_locked: false,
            })),
        }
    }

    fn tree(&self) -> MutexGuard<'_, PageTree> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Append an element under `parent`. Later elements paint above earlier ones.
    pub fn append_child(&self, parent: NodeId, label: &str, rect: Option<Rect>) -> NodeId {
        let mut tree = self.tree();
        let id = NodeId(tree.next_node);
        tree.next_node += 1;
        tree.nodes.insert(
            id,
            Node {
                parent: Some(parent),
                label: label.to_string(),
                rect,
            },
        );
        id
    }

    pub fn exists(&self, node: NodeId) -> bool {
        self.tree().nodes.contains_key(&node)
    }

    pub fn label(&self, node: NodeId) -> Option<String> {
        self.tree().nodes.get(&node).map(|n| n.label.clone())
    }

    pub fn count_labelled(&self, label: &str) -> usize {
        self.tree().nodes.values().filter(|n| n.label == label).count()
    }

    pub fn scroll_locked(&self) -> bool {
        self.tree().scroll_locked
    }

    pub fn listener_count(&self) -> usize {
        self.tree().listeners.len()
    }

    pub fn listener_kinds(&self) -> Vec<ListenerKind> {
        self.tree().listeners.values().copied().collect()
    }
}

impl PageTree {
    fn is_ancestor(&self, ancestor: NodeId, mut node: NodeId) -> bool {
        loop {
            if node == ancestor {
                return true;
            }
            match self.nodes.get(&node).and_then(|n| n.parent) {
                Some(parent) => node = parent,
                None => return false,
            }
        }
    }
}

impl HostPage for MemoryPage {
    fn set_scroll_locked(&mut self, locked: bool) {
        self.tree().scroll_locked = locked;
    }

    fn add_capture_listener(&mut self, kind: ListenerKind) -> ListenerId {
        let mut tree = self.tree();
        let id = ListenerId(tree.next_listener);
        tree.next_listener += 1;
        tree.listeners.insert(id, kind);
        id
    }

    fn remove_listener(&mut self, id: ListenerId) {
        self.tree().listeners.remove(&id);
    }

    fn create_overlay(&mut self) -> NodeId {
        self.append_child(Self::BODY, "overlay", Some(Rect::VIEWPORT))
    }

    fn remove_node(&mut self, node: NodeId) {
        let mut tree = self.tree();
        let doomed: Vec<NodeId> = tree
            .nodes
            .keys()
            .copied()
            .filter(|id| tree.is_ancestor(node, *id))
            .collect();
        for id in doomed {
            tree.nodes.remove(&id);
        }
    }

    fn element_at(&self, x: f64, y: f64) -> Option<NodeId> {
        self.tree()
            .nodes
            .iter()
            .filter(|(_, n)| n.rect.is_some_and(|r| r.contains(x, y)))
            .map(|(id, _)| *id)
            .max()
    }

    fn contains(&self, ancestor: NodeId, node: NodeId) -> bool {
        let tree = self.tree();
        tree.nodes.contains_key(&node) && tree.is_ancestor(ancestor, node)
    }
}
