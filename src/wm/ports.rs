//! Collaborator ports
//!
//! Narrow interfaces the dispatcher talks through. It owns none of the
//! implementations: the X11 driver, the key registry and the group manager
//! are handed to it at construction.

use anyhow::Result;

use crate::shared::{Geometry, Rectangle};
use crate::wm::client::ClientWindow;
use crate::wm::event::{Atom, KeyPress, SizeRequest, WindowId};

/// Index of a group inside the group manager
pub type GroupId = usize;

/// Requests issued to the display server.
///
/// Every request is fire-and-forget: its effect shows up later as a
/// separate notification event, never as a reply the caller waits on.
pub trait Transport {
    /// The root window of the managed screen
    fn root(&self) -> WindowId;

    /// Allocate a fresh window id
    fn generate_id(&self) -> Result<WindowId>;

    /// Create an (unmapped) frame window on the root
    fn create_frame(&self, frame: WindowId, geometry: Geometry) -> Result<()>;

    /// Move `window` into `parent` at the given offset
    fn reparent_window(&self, window: WindowId, parent: WindowId, x: i16, y: i16) -> Result<()>;

    fn map_window(&self, window: WindowId) -> Result<()>;

    fn unmap_window(&self, window: WindowId) -> Result<()>;

    fn destroy_window(&self, window: WindowId) -> Result<()>;

    /// Honour the masked fields of a client's configure request
    fn configure_window(&self, window: WindowId, request: &SizeRequest) -> Result<()>;

    /// Change the background pixel (0xRRGGBB) of `window`
    fn set_background(&self, window: WindowId, pixel: u32) -> Result<()>;

    /// Repaint `area` of `window` with its background. An empty width or
    /// height extends to the window edge.
    fn clear_area(&self, window: WindowId, area: Rectangle) -> Result<()>;

    fn set_input_focus(&self, window: WindowId) -> Result<()>;

    /// Mark `window` as hidden (ICCCM `WM_STATE` Iconic)
    fn hiding_window(&self, window: WindowId) -> Result<()>;

    /// Symbolic name of an atom, if the server knows it
    fn atom_name(&self, atom: Atom) -> Option<String>;

    fn flush(&self) -> Result<()>;
}

/// Key-binding registry
pub trait KeyBindings {
    /// Resolve a raw key press against the bindings
    fn dispatch_event(&mut self, event: &KeyPress);
}

/// Grouping/tiling policy
pub trait GroupManager {
    /// Place a newly manageable window into a group and return it
    fn add_window(&mut self, window: &ClientWindow) -> GroupId;

    /// Drop `window` from `group`
    fn remove_window(&mut self, group: GroupId, window: WindowId);
}
