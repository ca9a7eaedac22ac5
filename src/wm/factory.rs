//! Entity factory
//!
//! Turns a creation notification into registry entries, framing the window
//! when it is a manageable top-level.

use tracing::{debug, warn};

use crate::config::FrameConfig;
use crate::wm::client::{ClientWindow, Entity};
use crate::wm::decorations::Frame;
use crate::wm::event::{CreateNotify, WindowId};
use crate::wm::ports::Transport;
use crate::wm::registry::Registry;

/// Outcome of handling a creation notification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Created {
    /// The id was already tracked; nothing changed
    Duplicate,
    /// Tracked without a frame (override-redirect, non top-level, or framing failed)
    Unmanaged(WindowId),
    /// Tracked and wrapped in a new frame
    Framed { client: WindowId, frame: WindowId },
}

/// Build and register the entities for a new window.
///
/// Duplicates are always ignored: the earlier registration wins and no
/// second logical entity is created.
pub fn create(
    registry: &mut Registry,
    conn: &dyn Transport,
    config: &FrameConfig,
    event: &CreateNotify,
) -> Created {
    if registry.contains(event.window) {
        warn!("Create notify for already existent window 0x{:x}", event.window);
        return Created::Duplicate;
    }

    let mut client = ClientWindow::from_notify(event, conn.root());
    let frame = if client.is_manageable() {
        match Frame::new(conn, client.id, client.geometry, config.border_width) {
            Ok(frame) => Some(frame),
            Err(e) => {
                warn!("Failed to frame window 0x{:x}: {:#}", client.id, e);
                None
            }
        }
    } else {
        debug!(
            "Window 0x{:x} left unframed (toplevel={}, override={})",
            client.id, client.toplevel, client.override_redirect
        );
        None
    };

    let client_id = client.id;
    client.frame = frame.as_ref().map(|f| f.id);
    if registry.register(Entity::Client(client)).is_err() {
        return Created::Duplicate;
    }

    match frame {
        Some(frame) => {
            let frame_id = frame.id;
            if registry.register(Entity::Frame(frame)).is_err() {
                // Transport handed out an id we already track
                if let Some(client) = registry.lookup_client_mut(client_id) {
                    client.frame = None;
                }
                return Created::Unmanaged(client_id);
            }
            Created::Framed { client: client_id, frame: frame_id }
        }
        None => Created::Unmanaged(client_id),
    }
}
