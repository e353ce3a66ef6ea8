mod controller;
mod memory;
mod page;

pub use controller::{BlockController, BlockPhase, Disposition};
pub use memory::{MemoryPage, Rect};
pub use page::{
    HostPage, InputEvent, InputKind, ListenerId, ListenerKind, ModalHandle, MouseButton, NodeId,
    OverlayHandle,
};
