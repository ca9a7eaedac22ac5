//! Recording collaborators for unit tests
//!
//! All three doubles can share one call log so tests can assert on the
//! order of effects across collaborators.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use anyhow::{Result, bail};

use crate::shared::{Geometry, Rectangle};
use crate::wm::client::ClientWindow;
use crate::wm::event::{Atom, KeyPress, SizeRequest, WindowId};
use crate::wm::ports::{GroupId, GroupManager, KeyBindings, Transport};

/// First id handed out by `RecordingTransport::generate_id`
pub const FIRST_GENERATED_ID: WindowId = 0x0040_0000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    CreateFrame(WindowId),
    Reparent { window: WindowId, parent: WindowId },
    Map(WindowId),
    Unmap(WindowId),
    Destroy(WindowId),
    Configure(WindowId),
    SetBackground { window: WindowId, pixel: u32 },
    ClearArea { window: WindowId, area: Rectangle },
    SetFocus(WindowId),
    Hiding(WindowId),
    AddToGroup(WindowId),
    RemoveFromGroup { group: GroupId, window: WindowId },
    Key(u8),
}

pub type CallLog = Rc<RefCell<Vec<Call>>>;

pub struct RecordingTransport {
    root: WindowId,
    log: CallLog,
    next_id: Cell<WindowId>,
    fail_reparent: Cell<bool>,
    atoms: HashMap<Atom, String>,
}

impl RecordingTransport {
    pub fn new(root: WindowId) -> Self {
        let atoms = [(39, "WM_NAME"), (302, "_NET_WM_STATE")]
            .into_iter()
            .map(|(atom, name)| (atom, name.to_string()))
            .collect();
        Self {
            root,
            log: CallLog::default(),
            next_id: Cell::new(FIRST_GENERATED_ID),
            fail_reparent: Cell::new(false),
            atoms,
        }
    }

    pub fn log(&self) -> CallLog {
        self.log.clone()
    }

    pub fn calls(&self) -> Vec<Call> {
        self.log.borrow().clone()
    }

    pub fn clear(&self) {
        self.log.borrow_mut().clear();
    }

    /// Make every following reparent request fail
    pub fn fail_reparent(&self) {
        self.fail_reparent.set(true);
    }

    fn record(&self, call: Call) {
        self.log.borrow_mut().push(call);
    }
}

impl Transport for RecordingTransport {
    fn root(&self) -> WindowId {
        self.root
    }

    fn generate_id(&self) -> Result<WindowId> {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        Ok(id)
    }

    fn create_frame(&self, frame: WindowId, _geometry: Geometry) -> Result<()> {
        self.record(Call::CreateFrame(frame));
        Ok(())
    }

    fn reparent_window(&self, window: WindowId, parent: WindowId, _x: i16, _y: i16) -> Result<()> {
        if self.fail_reparent.get() {
            bail!("reparent of 0x{window:x} refused");
        }
        self.record(Call::Reparent { window, parent });
        Ok(())
    }

    fn map_window(&self, window: WindowId) -> Result<()> {
        self.record(Call::Map(window));
        Ok(())
    }

    fn unmap_window(&self, window: WindowId) -> Result<()> {
        self.record(Call::Unmap(window));
        Ok(())
    }

    fn destroy_window(&self, window: WindowId) -> Result<()> {
        self.record(Call::Destroy(window));
        Ok(())
    }

    fn configure_window(&self, window: WindowId, _request: &SizeRequest) -> Result<()> {
        self.record(Call::Configure(window));
        Ok(())
    }

    fn set_background(&self, window: WindowId, pixel: u32) -> Result<()> {
        self.record(Call::SetBackground { window, pixel });
        Ok(())
    }

    fn clear_area(&self, window: WindowId, area: Rectangle) -> Result<()> {
        self.record(Call::ClearArea { window, area });
        Ok(())
    }

    fn set_input_focus(&self, window: WindowId) -> Result<()> {
        self.record(Call::SetFocus(window));
        Ok(())
    }

    fn hiding_window(&self, window: WindowId) -> Result<()> {
        self.record(Call::Hiding(window));
        Ok(())
    }

    fn atom_name(&self, atom: Atom) -> Option<String> {
        self.atoms.get(&atom).cloned()
    }

    fn flush(&self) -> Result<()> {
        Ok(())
    }
}

pub struct RecordingKeys {
    log: CallLog,
}

impl RecordingKeys {
    pub fn new(log: CallLog) -> Self {
        Self { log }
    }
}

impl KeyBindings for RecordingKeys {
    fn dispatch_event(&mut self, event: &KeyPress) {
        self.log.borrow_mut().push(Call::Key(event.keycode));
    }
}

/// Puts every window into group 0
pub struct RecordingGroups {
    log: CallLog,
}

impl RecordingGroups {
    pub fn new(log: CallLog) -> Self {
        Self { log }
    }
}

impl GroupManager for RecordingGroups {
    fn add_window(&mut self, window: &ClientWindow) -> GroupId {
        self.log.borrow_mut().push(Call::AddToGroup(window.id));
        0
    }

    fn remove_window(&mut self, group: GroupId, window: WindowId) {
        self.log
            .borrow_mut()
            .push(Call::RemoveFromGroup { group, window });
    }
}
