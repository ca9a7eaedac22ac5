//! Events Module
//!
//! The event dispatcher: one transition per decoded event kind, applied to
//! the registry it owns, with effects forwarded to the collaborators.
//!
//! A lookup miss is the only failure a transition recognises. Events for
//! windows the registry has already forgotten arrive routinely (the server
//! destroyed the window while events for it were still queued), so a miss is
//! logged and the event dropped. Transport errors raised inside a transition
//! are logged the same way; nothing ever stops the loop.

use anyhow::Result;
use tracing::{debug, info, warn};

use crate::config::FrameConfig;
use crate::wm::client::Entity;
use crate::wm::event::{
    ClientMessage, CreateNotify, FocusChange, SizeRequest, WindowId, XEvent,
    decode_client_message,
};
use crate::wm::factory::{self, Created};
use crate::wm::ports::{GroupManager, KeyBindings, Transport};
use crate::wm::registry::Registry;
use crate::shared::Rectangle;

/// Result of dispatching one event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventResult {
    /// A transition ran
    Handled,
    /// The target id is unknown; event dropped
    Stale,
    /// No transition for this event (no-op kinds, filtered focus, unknown kinds)
    Ignored,
}

/// A window that existed before the manager started
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExistingWindow {
    pub notify: CreateNotify,
    /// Currently viewable on screen
    pub viewable: bool,
}

pub struct EventDispatcher<T, K, G> {
    conn: T,
    keys: K,
    groups: G,
    registry: Registry,
    frame_config: FrameConfig,
}

impl<T, K, G> EventDispatcher<T, K, G>
where
    T: Transport,
    K: KeyBindings,
    G: GroupManager,
{
    pub fn new(conn: T, keys: K, groups: G, frame_config: FrameConfig) -> Self {
        Self {
            conn,
            keys,
            groups,
            registry: Registry::new(),
            frame_config,
        }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn transport(&self) -> &T {
        &self.conn
    }

    pub fn keys(&self) -> &K {
        &self.keys
    }

    pub fn groups(&self) -> &G {
        &self.groups
    }

    /// Apply one event. Never fails: misses and errors are logged.
    pub fn dispatch(&mut self, event: &XEvent) -> EventResult {
        let result = match event {
            XEvent::KeyPress(e) => {
                self.keys.dispatch_event(e);
                Ok(EventResult::Handled)
            }
            XEvent::KeyRelease(_) => Ok(EventResult::Ignored),
            XEvent::CreateNotify(e) => Ok(self.handle_create_notify(e)),
            XEvent::MapRequest { window } => self.handle_map_request(*window),
            XEvent::MapNotify { window } => Ok(self.handle_map_notify(*window)),
            XEvent::UnmapNotify { window } => self.handle_unmap_notify(*window),
            XEvent::EnterNotify { event } => self.handle_enter_notify(*event),
            XEvent::LeaveNotify { .. } => Ok(EventResult::Ignored),
            XEvent::FocusIn(e) => self.handle_focus(e, true),
            XEvent::FocusOut(e) => self.handle_focus(e, false),
            XEvent::ConfigureRequest(e) => self.handle_configure_request(e),
            XEvent::PropertyNotify { window, atom } => {
                Ok(self.handle_property_notify(*window, *atom))
            }
            XEvent::Expose { window, area } => self.handle_expose(*window, *area),
            XEvent::DestroyNotify { window } => self.handle_destroy_notify(*window),
            XEvent::ConfigureNotify { .. } | XEvent::ReparentNotify { .. } => {
                Ok(EventResult::Ignored)
            }
            XEvent::ClientMessage(e) => Ok(self.handle_client_message(e)),
            XEvent::Other { raw, .. } => {
                debug!("EVENT {}", raw);
                Ok(EventResult::Ignored)
            }
        };

        result.unwrap_or_else(|e| {
            warn!("{} transition failed: {:#}", event.kind(), e);
            EventResult::Handled
        })
    }

    /// Manage windows that were already on screen at startup, as if they
    /// had just been created and asked to be mapped.
    ///
    /// Reparenting a viewable window makes the server unmap it once; that
    /// UnmapNotify is expected and skipped.
    pub fn adopt_existing(&mut self, windows: &[ExistingWindow]) {
        for existing in windows {
            let window = existing.notify.window;
            self.dispatch(&XEvent::CreateNotify(existing.notify));
            if !existing.viewable || existing.notify.override_redirect {
                continue;
            }
            if let Some(client) = self.registry.lookup_client_mut(window) {
                if client.frame.is_some() {
                    client.ignore_unmaps += 1;
                }
            }
            self.dispatch(&XEvent::MapRequest { window });
        }
        info!("Adopted {} existing windows", windows.len());
    }

    fn handle_create_notify(&mut self, event: &CreateNotify) -> EventResult {
        match factory::create(&mut self.registry, &self.conn, &self.frame_config, event) {
            Created::Duplicate => EventResult::Ignored,
            Created::Unmanaged(id) => {
                debug!("Tracking unmanaged window 0x{:x}", id);
                EventResult::Handled
            }
            Created::Framed { client, frame } => {
                info!("Managing window 0x{:x} (frame 0x{:x})", client, frame);
                EventResult::Handled
            }
        }
    }

    fn handle_map_request(&mut self, window: WindowId) -> Result<EventResult> {
        let Some(client) = self.registry.lookup_client_mut(window) else {
            warn!("Map request for non-existent window 0x{:x}", window);
            return Ok(EventResult::Stale);
        };
        client.want.visible = true;
        match client.group {
            // Group assignment shows the window
            None => {
                let group = self.groups.add_window(client);
                debug!("Window 0x{:x} assigned to group {}", window, group);
                client.group = Some(group);
            }
            Some(_) => client.show(&self.conn)?,
        }
        Ok(EventResult::Handled)
    }

    fn handle_map_notify(&mut self, window: WindowId) -> EventResult {
        let Some(entity) = self.registry.lookup_any_mut(window) else {
            warn!("Map notify for non-existent window 0x{:x}", window);
            return EventResult::Stale;
        };
        entity.set_actual_visible(true);
        EventResult::Handled
    }

    fn handle_unmap_notify(&mut self, window: WindowId) -> Result<EventResult> {
        let Some(entity) = self.registry.lookup_any_mut(window) else {
            warn!("Unmap notify for non-existent window 0x{:x}", window);
            return Ok(EventResult::Stale);
        };
        if let Some(client) = entity.as_client_mut() {
            if client.ignore_unmaps > 0 {
                client.ignore_unmaps -= 1;
                debug!("Skipping reparent unmap of 0x{:x}", window);
                return Ok(EventResult::Handled);
            }
        }
        entity.set_actual_visible(false);
        let Some(frame_id) = entity.frame() else {
            return Ok(EventResult::Handled);
        };

        self.conn.hiding_window(window)?;
        match self.registry.lookup_frame_mut(frame_id) {
            Some(frame) => frame.hide(&self.conn)?,
            None => warn!("Frame 0x{:x} of window 0x{:x} is gone", frame_id, window),
        }
        Ok(EventResult::Handled)
    }

    fn handle_enter_notify(&mut self, event: WindowId) -> Result<EventResult> {
        let Some(frame) = self.registry.lookup_frame(event) else {
            warn!("Enter notify for non-existent window 0x{:x}", event);
            return Ok(EventResult::Stale);
        };
        if !self.registry.is_client(frame.client) {
            warn!(
                "Enter notify for frame 0x{:x} of non-existent window 0x{:x}",
                event, frame.client
            );
            return Ok(EventResult::Stale);
        }
        frame.focus(&self.conn)?;
        Ok(EventResult::Handled)
    }

    fn handle_focus(&mut self, event: &FocusChange, focus_in: bool) -> Result<EventResult> {
        let Some(entity) = self.registry.lookup_any_mut(event.event) else {
            warn!("Focus change for non-existent window 0x{:x}", event.event);
            return Ok(EventResult::Stale);
        };
        if !event.is_genuine() {
            debug!(
                "Skipping incidental focus event on 0x{:x} ({:?}/{:?})",
                event.event, event.mode, event.detail
            );
            return Ok(EventResult::Ignored);
        }
        if focus_in {
            entity.focus_in();
        } else {
            entity.focus_out();
        }
        if let Entity::Frame(frame) = entity {
            frame.repaint(&self.conn, &self.frame_config)?;
        }
        Ok(EventResult::Handled)
    }

    fn handle_configure_request(&mut self, request: &SizeRequest) -> Result<EventResult> {
        let Some(client) = self.registry.lookup_client_mut(request.window) else {
            warn!("Configure request for non-existent window 0x{:x}", request.window);
            return Ok(EventResult::Stale);
        };
        client.update_size_request(request, &self.conn)?;
        Ok(EventResult::Handled)
    }

    fn handle_property_notify(&mut self, window: WindowId, atom: u32) -> EventResult {
        let Some(client) = self.registry.lookup_client_mut(window) else {
            warn!("Property notify event for non-existent window 0x{:x}", window);
            return EventResult::Stale;
        };
        client.update_property(atom);
        EventResult::Handled
    }

    fn handle_expose(&mut self, window: WindowId, area: Rectangle) -> Result<EventResult> {
        let Some(entity) = self.registry.lookup_any_mut(window) else {
            warn!("Expose event for non-existent window 0x{:x}", window);
            return Ok(EventResult::Stale);
        };
        entity.expose(area);
        if let Entity::Frame(frame) = entity {
            frame.repaint(&self.conn, &self.frame_config)?;
        }
        Ok(EventResult::Handled)
    }

    fn handle_destroy_notify(&mut self, window: WindowId) -> Result<EventResult> {
        let Some(entity) = self.registry.remove(window) else {
            warn!("Destroy notify for non-existent window 0x{:x}", window);
            return Ok(EventResult::Stale);
        };

        if let Some(group) = entity.group() {
            self.groups.remove_window(group, window);
        }
        if let Entity::Frame(frame) = &entity {
            if let Some(client) = self.registry.lookup_client_mut(frame.client) {
                if client.frame == Some(frame.id) {
                    client.frame = None;
                }
            }
        }
        entity.destroyed(&self.conn)?;
        Ok(EventResult::Handled)
    }

    fn handle_client_message(&mut self, message: &ClientMessage) -> EventResult {
        let name = self
            .conn
            .atom_name(message.type_)
            .unwrap_or_else(|| format!("#{}", message.type_));
        match decode_client_message(&message.data) {
            Ok(words) => {
                debug!("ClientMessage for 0x{:x}: {} {:?}", message.window, name, words);
            }
            Err(e) => {
                warn!("Malformed ClientMessage {} for 0x{:x}: {}", name, message.window, e);
            }
        }
        EventResult::Ignored
    }
}
