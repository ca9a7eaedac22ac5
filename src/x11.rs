//! X11 driver
//!
//! `X11Transport` implements the transport port over an x11rb connection,
//! and `XEvent::from_x11` turns raw x11rb events into the decoded form the
//! dispatcher consumes.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{debug, info};
use x11rb::connection::Connection;
use x11rb::protocol::Event;
use x11rb::protocol::xproto::{
    ChangeWindowAttributesAux, ConfigureWindowAux, ConnectionExt as _, CreateWindowAux,
    EventMask, GrabMode, InputFocus, MapState, ModMask, PropMode, StackMode, WindowClass,
};
use x11rb::rust_connection::RustConnection;
use x11rb::wrapper::ConnectionExt as _;

use crate::config::FrameConfig;
use crate::shared::{Geometry, Rectangle};
use crate::wm::event::{
    Atom, ClientMessage, ConfigMask, CreateNotify, FocusChange, FocusDetail, FocusMode,
    KeyPress, SizeRequest, WindowId, XEvent,
};
use crate::wm::events::ExistingWindow;
use crate::wm::ports::Transport;

/// ICCCM `WM_STATE` value for a hidden window
const ICONIC_STATE: u32 = 3;

/// Lock and NumLock, grabbed in every combination alongside each binding
const LOCK_MASKS: [u16; 4] = [0, 1 << 1, 1 << 4, (1 << 1) | (1 << 4)];

/// Interned atoms the transport needs
#[derive(Debug, Clone, Copy)]
pub struct Atoms {
    pub wm_state: Atom,
}

impl Atoms {
    pub fn new<C: Connection>(conn: &C) -> Result<Self> {
        let intern = |name: &str| -> Result<Atom> {
            Ok(conn.intern_atom(false, name.as_bytes())?.reply()?.atom)
        };

        Ok(Self {
            wm_state: intern("WM_STATE")?,
        })
    }
}

/// Transport over a live X11 connection. Cheap to clone; clones share the
/// connection and the atom name cache.
#[derive(Clone)]
pub struct X11Transport {
    conn: Arc<RustConnection>,
    screen_num: usize,
    root: WindowId,
    atoms: Atoms,
    frame: FrameConfig,
    atom_names: Rc<RefCell<HashMap<Atom, String>>>,
}

impl X11Transport {
    /// Connect to the display named by `$DISPLAY`
    pub fn connect(frame: FrameConfig) -> Result<Self> {
        let (conn, screen_num) =
            RustConnection::connect(None).context("Failed to connect to X server")?;
        info!("Connected to X server, screen {}", screen_num);

        let root = conn.setup().roots[screen_num].root;
        let atoms = Atoms::new(&conn).context("Failed to intern atoms")?;

        Ok(Self {
            conn: Arc::new(conn),
            screen_num,
            root,
            atoms,
            frame,
            atom_names: Rc::default(),
        })
    }

    pub fn connection(&self) -> Arc<RustConnection> {
        self.conn.clone()
    }

    /// Select substructure redirection on the root window
    pub fn become_wm(&self) -> Result<()> {
        let mask = EventMask::SUBSTRUCTURE_REDIRECT
            | EventMask::SUBSTRUCTURE_NOTIFY
            | EventMask::STRUCTURE_NOTIFY
            | EventMask::PROPERTY_CHANGE
            | EventMask::FOCUS_CHANGE;

        self.conn
            .change_window_attributes(self.root, &ChangeWindowAttributesAux::new().event_mask(mask))?
            .check()
            .context("Another window manager is already running")?;

        info!("Registered as window manager");
        Ok(())
    }

    /// Grab a key combination on the root window, regardless of lock state
    pub fn grab_key(&self, modifiers: u16, keycode: u8) -> Result<()> {
        for lock in LOCK_MASKS {
            self.conn.grab_key(
                false,
                self.root,
                ModMask::from(modifiers | lock),
                keycode,
                GrabMode::ASYNC,
                GrabMode::ASYNC,
            )?;
        }
        Ok(())
    }

    /// Children of the root window present before we took over
    pub fn existing_windows(&self) -> Result<Vec<ExistingWindow>> {
        let tree = self
            .conn
            .query_tree(self.root)?
            .reply()
            .context("Failed to query existing windows")?;

        let mut windows = Vec::with_capacity(tree.children.len());
        for &child in &tree.children {
            // Windows may vanish between the query and these requests
            let Ok(attrs) = self.conn.get_window_attributes(child)?.reply() else {
                continue;
            };
            let Ok(geometry) = self.conn.get_geometry(child)?.reply() else {
                continue;
            };
            windows.push(ExistingWindow {
                notify: CreateNotify {
                    window: child,
                    parent: self.root,
                    geometry: Geometry::new(
                        i32::from(geometry.x),
                        i32::from(geometry.y),
                        u32::from(geometry.width),
                        u32::from(geometry.height),
                    ),
                    border_width: geometry.border_width,
                    override_redirect: attrs.override_redirect,
                },
                viewable: attrs.map_state == MapState::VIEWABLE,
            });
        }
        debug!("Found {} existing windows", windows.len());
        Ok(windows)
    }
}

fn clamp_i16(value: i32) -> i16 {
    value.clamp(i32::from(i16::MIN), i32::from(i16::MAX)) as i16
}

/// Window sizes must be non-zero
fn clamp_size(value: u32) -> u16 {
    value.clamp(1, u32::from(u16::MAX)) as u16
}

impl Transport for X11Transport {
    fn root(&self) -> WindowId {
        self.root
    }

    fn generate_id(&self) -> Result<WindowId> {
        Ok(self.conn.generate_id()?)
    }

    fn create_frame(&self, frame: WindowId, geometry: Geometry) -> Result<()> {
        let screen = &self.conn.setup().roots[self.screen_num];
        self.conn.create_window(
            screen.root_depth,
            frame,
            self.root,
            clamp_i16(geometry.x),
            clamp_i16(geometry.y),
            clamp_size(geometry.width),
            clamp_size(geometry.height),
            0,
            WindowClass::INPUT_OUTPUT,
            0,
            &CreateWindowAux::new()
                .background_pixel(self.frame.inactive_border)
                .event_mask(
                    EventMask::SUBSTRUCTURE_REDIRECT
                        | EventMask::SUBSTRUCTURE_NOTIFY
                        | EventMask::ENTER_WINDOW
                        | EventMask::EXPOSURE
                        | EventMask::FOCUS_CHANGE,
                ),
        )?;
        Ok(())
    }

    fn reparent_window(&self, window: WindowId, parent: WindowId, x: i16, y: i16) -> Result<()> {
        self.conn.reparent_window(window, parent, x, y)?;
        Ok(())
    }

    fn map_window(&self, window: WindowId) -> Result<()> {
        self.conn.map_window(window)?;
        Ok(())
    }

    fn unmap_window(&self, window: WindowId) -> Result<()> {
        self.conn.unmap_window(window)?;
        Ok(())
    }

    fn destroy_window(&self, window: WindowId) -> Result<()> {
        self.conn.destroy_window(window)?;
        Ok(())
    }

    fn configure_window(&self, window: WindowId, request: &SizeRequest) -> Result<()> {
        let mask = request.mask;
        let mut aux = ConfigureWindowAux::new();
        if mask.contains(ConfigMask::X) {
            aux = aux.x(i32::from(request.x));
        }
        if mask.contains(ConfigMask::Y) {
            aux = aux.y(i32::from(request.y));
        }
        if mask.contains(ConfigMask::WIDTH) {
            aux = aux.width(u32::from(request.width));
        }
        if mask.contains(ConfigMask::HEIGHT) {
            aux = aux.height(u32::from(request.height));
        }
        if mask.contains(ConfigMask::BORDER_WIDTH) {
            aux = aux.border_width(u32::from(request.border_width));
        }
        if mask.contains(ConfigMask::SIBLING) {
            aux = aux.sibling(request.sibling);
        }
        if mask.contains(ConfigMask::STACK_MODE) {
            aux = aux.stack_mode(StackMode::from(request.stack_mode));
        }
        self.conn.configure_window(window, &aux)?;
        Ok(())
    }

    fn set_background(&self, window: WindowId, pixel: u32) -> Result<()> {
        self.conn.change_window_attributes(
            window,
            &ChangeWindowAttributesAux::new().background_pixel(pixel),
        )?;
        Ok(())
    }

    fn clear_area(&self, window: WindowId, area: Rectangle) -> Result<()> {
        self.conn.clear_area(
            false,
            window,
            clamp_i16(i32::from(area.x)),
            clamp_i16(i32::from(area.y)),
            area.width,
            area.height,
        )?;
        Ok(())
    }

    fn set_input_focus(&self, window: WindowId) -> Result<()> {
        self.conn
            .set_input_focus(InputFocus::POINTER_ROOT, window, x11rb::CURRENT_TIME)?;
        Ok(())
    }

    fn hiding_window(&self, window: WindowId) -> Result<()> {
        self.conn.change_property32(
            PropMode::REPLACE,
            window,
            self.atoms.wm_state,
            self.atoms.wm_state,
            &[ICONIC_STATE, x11rb::NONE],
        )?;
        Ok(())
    }

    fn atom_name(&self, atom: Atom) -> Option<String> {
        if let Some(name) = self.atom_names.borrow().get(&atom) {
            return Some(name.clone());
        }
        let reply = self.conn.get_atom_name(atom).ok()?.reply().ok()?;
        let name = String::from_utf8_lossy(&reply.name).into_owned();
        self.atom_names.borrow_mut().insert(atom, name.clone());
        Some(name)
    }

    fn flush(&self) -> Result<()> {
        self.conn.flush()?;
        Ok(())
    }
}

impl XEvent {
    /// Decode a raw x11rb event
    pub fn from_x11(event: &Event) -> Self {
        match event {
            Event::KeyPress(e) => XEvent::KeyPress(KeyPress {
                keycode: e.detail,
                state: u16::from(e.state),
                time: e.time,
                root: e.root,
                event: e.event,
                child: e.child,
            }),
            Event::KeyRelease(e) => XEvent::KeyRelease(KeyPress {
                keycode: e.detail,
                state: u16::from(e.state),
                time: e.time,
                root: e.root,
                event: e.event,
                child: e.child,
            }),
            Event::CreateNotify(e) => XEvent::CreateNotify(CreateNotify {
                window: e.window,
                parent: e.parent,
                geometry: Geometry::new(
                    i32::from(e.x),
                    i32::from(e.y),
                    u32::from(e.width),
                    u32::from(e.height),
                ),
                border_width: e.border_width,
                override_redirect: e.override_redirect,
            }),
            Event::MapRequest(e) => XEvent::MapRequest { window: e.window },
            Event::MapNotify(e) => XEvent::MapNotify { window: e.window },
            Event::UnmapNotify(e) => XEvent::UnmapNotify { window: e.window },
            Event::EnterNotify(e) => XEvent::EnterNotify { event: e.event },
            Event::LeaveNotify(e) => XEvent::LeaveNotify { event: e.event },
            Event::FocusIn(e) => XEvent::FocusIn(FocusChange {
                event: e.event,
                mode: FocusMode::from(u8::from(e.mode)),
                detail: FocusDetail::from(u8::from(e.detail)),
            }),
            Event::FocusOut(e) => XEvent::FocusOut(FocusChange {
                event: e.event,
                mode: FocusMode::from(u8::from(e.mode)),
                detail: FocusDetail::from(u8::from(e.detail)),
            }),
            Event::ConfigureRequest(e) => XEvent::ConfigureRequest(SizeRequest {
                window: e.window,
                x: e.x,
                y: e.y,
                width: e.width,
                height: e.height,
                border_width: e.border_width,
                sibling: e.sibling,
                stack_mode: u32::from(e.stack_mode),
                mask: ConfigMask::from_bits_truncate(u16::from(e.value_mask)),
            }),
            Event::PropertyNotify(e) => XEvent::PropertyNotify {
                window: e.window,
                atom: e.atom,
            },
            Event::Expose(e) => XEvent::Expose {
                window: e.window,
                area: Rectangle::new(e.x, e.y, e.width, e.height),
            },
            Event::DestroyNotify(e) => XEvent::DestroyNotify { window: e.window },
            Event::ConfigureNotify(e) => XEvent::ConfigureNotify { window: e.window },
            Event::ReparentNotify(e) => XEvent::ReparentNotify { window: e.window },
            Event::ClientMessage(e) => XEvent::ClientMessage(ClientMessage {
                window: e.window,
                type_: e.type_,
                format: e.format,
                data: e.data.as_data8().to_vec(),
            }),
            other => {
                let raw = format!("{other:?}");
                let kind = raw
                    .split(['(', ' ', '{'])
                    .next()
                    .unwrap_or_default()
                    .to_string();
                XEvent::Other { kind, raw }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_helpers() {
        assert_eq!(clamp_i16(-40_000), i16::MIN);
        assert_eq!(clamp_i16(12), 12);
        assert_eq!(clamp_size(0), 1);
        assert_eq!(clamp_size(70_000), u16::MAX);
    }

    #[test]
    fn test_configure_request_keeps_stack_mode() {
        use x11rb::protocol::xproto::{CONFIGURE_REQUEST_EVENT, ConfigWindow, ConfigureRequestEvent};

        let raw = Event::ConfigureRequest(ConfigureRequestEvent {
            response_type: CONFIGURE_REQUEST_EVENT,
            stack_mode: StackMode::BELOW,
            sequence: 0,
            parent: 1,
            window: 10,
            sibling: 0,
            x: 5,
            y: 6,
            width: 300,
            height: 200,
            border_width: 0,
            value_mask: ConfigWindow::WIDTH | ConfigWindow::STACK_MODE,
        });
        let XEvent::ConfigureRequest(request) = XEvent::from_x11(&raw) else {
            panic!("expected a configure request");
        };
        assert_eq!(request.window, 10);
        assert_eq!(request.mask, ConfigMask::WIDTH | ConfigMask::STACK_MODE);
        assert_eq!(StackMode::from(request.stack_mode), StackMode::BELOW);
    }
}
