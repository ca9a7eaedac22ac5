//! Client windows and the entity union tracked by the registry

use anyhow::Result;
use tracing::{debug, trace};

use crate::shared::{Geometry, Rectangle};
use crate::wm::decorations::Frame;
use crate::wm::event::{Atom, CreateNotify, SizeRequest, WindowId};
use crate::wm::ports::{GroupId, Transport};

/// Visibility flag, tracked separately for what we asked for and what the
/// server reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Visibility {
    pub visible: bool,
}

/// A protocol-level client window
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientWindow {
    /// X11 window ID
    pub id: WindowId,

    /// Parent reported at creation time
    pub parent: WindowId,

    /// Created as a direct child of the root window
    pub toplevel: bool,

    /// Override-redirect windows are never framed or managed
    pub override_redirect: bool,

    /// Last known geometry
    pub geometry: Geometry,

    /// Visibility we want
    pub want: Visibility,

    /// Visibility the server reports
    pub real: Visibility,

    /// Decoration frame, by frame window id
    pub frame: Option<WindowId>,

    /// Group assigned by the group manager on first map
    pub group: Option<GroupId>,

    /// Most recent configure request
    pub size_request: Option<SizeRequest>,

    pub focused: bool,

    /// UnmapNotify events caused by our own reparenting, still to arrive
    pub ignore_unmaps: u32,

    /// Properties changed since the last refresh, in arrival order
    pending_properties: Vec<Atom>,
}

impl ClientWindow {
    pub fn new(id: WindowId, parent: WindowId, geometry: Geometry) -> Self {
        Self {
            id,
            parent,
            toplevel: false,
            override_redirect: false,
            geometry,
            want: Visibility::default(),
            real: Visibility::default(),
            frame: None,
            group: None,
            size_request: None,
            focused: false,
            ignore_unmaps: 0,
            pending_properties: Vec::new(),
        }
    }

    /// Build a client from a creation notification.
    ///
    /// A window is top-level when its reported parent is the root window.
    pub fn from_notify(event: &CreateNotify, root: WindowId) -> Self {
        Self {
            toplevel: event.parent == root,
            override_redirect: event.override_redirect,
            ..Self::new(event.window, event.parent, event.geometry)
        }
    }

    /// Whether the window qualifies for a frame
    pub fn is_manageable(&self) -> bool {
        self.toplevel && !self.override_redirect
    }

    pub fn update_size_request(&mut self, request: &SizeRequest, conn: &dyn Transport) -> Result<()> {
        self.size_request = Some(*request);
        if self.frame.is_some() {
            // Placement of framed windows belongs to the group manager
            debug!("Recorded size request for framed window 0x{:x}", self.id);
            return Ok(());
        }
        request.apply_to(&mut self.geometry);
        conn.configure_window(self.id, request)
    }

    pub fn update_property(&mut self, atom: Atom) {
        if !self.pending_properties.contains(&atom) {
            self.pending_properties.push(atom);
        }
    }

    pub fn pending_properties(&self) -> &[Atom] {
        &self.pending_properties
    }

    /// Map the client, then its frame
    pub fn show(&self, conn: &dyn Transport) -> Result<()> {
        conn.map_window(self.id)?;
        if let Some(frame) = self.frame {
            conn.map_window(frame)?;
        }
        Ok(())
    }

    pub fn focus_in(&mut self) {
        self.focused = true;
    }

    pub fn focus_out(&mut self) {
        self.focused = false;
    }

    pub fn expose(&mut self, area: Rectangle) {
        trace!("Expose on client 0x{:x}: {:?}", self.id, area);
    }

    /// Lifecycle end. Takes the frame window down with the client.
    pub fn destroyed(self, conn: &dyn Transport) -> Result<()> {
        debug!("Client 0x{:x} destroyed", self.id);
        if let Some(frame) = self.frame {
            conn.destroy_window(frame)?;
        }
        Ok(())
    }
}

/// Anything tracked by raw window id
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Entity {
    Client(ClientWindow),
    Frame(Frame),
}

impl Entity {
    pub fn id(&self) -> WindowId {
        match self {
            Entity::Client(client) => client.id,
            Entity::Frame(frame) => frame.id,
        }
    }

    pub fn as_client(&self) -> Option<&ClientWindow> {
        match self {
            Entity::Client(client) => Some(client),
            Entity::Frame(_) => None,
        }
    }

    pub fn as_client_mut(&mut self) -> Option<&mut ClientWindow> {
        match self {
            Entity::Client(client) => Some(client),
            Entity::Frame(_) => None,
        }
    }

    pub fn as_frame(&self) -> Option<&Frame> {
        match self {
            Entity::Frame(frame) => Some(frame),
            Entity::Client(_) => None,
        }
    }

    pub fn as_frame_mut(&mut self) -> Option<&mut Frame> {
        match self {
            Entity::Frame(frame) => Some(frame),
            Entity::Client(_) => None,
        }
    }

    /// Frame decorating this entity; frames have none
    pub fn frame(&self) -> Option<WindowId> {
        self.as_client().and_then(|client| client.frame)
    }

    pub fn group(&self) -> Option<GroupId> {
        self.as_client().and_then(|client| client.group)
    }

    pub fn set_actual_visible(&mut self, visible: bool) {
        match self {
            Entity::Client(client) => client.real.visible = visible,
            Entity::Frame(frame) => frame.visible = visible,
        }
    }

    pub fn focus_in(&mut self) {
        match self {
            Entity::Client(client) => client.focus_in(),
            Entity::Frame(frame) => frame.focus_in(),
        }
    }

    pub fn focus_out(&mut self) {
        match self {
            Entity::Client(client) => client.focus_out(),
            Entity::Frame(frame) => frame.focus_out(),
        }
    }

    pub fn expose(&mut self, area: Rectangle) {
        match self {
            Entity::Client(client) => client.expose(area),
            Entity::Frame(frame) => frame.expose(area),
        }
    }

    pub fn destroyed(self, conn: &dyn Transport) -> Result<()> {
        match self {
            Entity::Client(client) => client.destroyed(conn),
            Entity::Frame(frame) => {
                frame.destroyed();
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::RecordingTransport;
    use crate::testing::Call;
    use crate::wm::event::ConfigMask;

    const ROOT: WindowId = 1;

    fn notify(window: WindowId, parent: WindowId, override_redirect: bool) -> CreateNotify {
        CreateNotify {
            window,
            parent,
            geometry: Geometry::new(0, 0, 100, 100),
            border_width: 0,
            override_redirect,
        }
    }

    #[test]
    fn test_from_notify_toplevel() {
        let client = ClientWindow::from_notify(&notify(10, ROOT, false), ROOT);
        assert!(client.toplevel);
        assert!(client.is_manageable());
        assert_eq!(client.group, None);
        assert_eq!(client.frame, None);
    }

    #[test]
    fn test_from_notify_child_and_override() {
        let child = ClientWindow::from_notify(&notify(11, 99, false), ROOT);
        assert!(!child.toplevel);
        assert!(!child.is_manageable());

        let popup = ClientWindow::from_notify(&notify(12, ROOT, true), ROOT);
        assert!(popup.toplevel);
        assert!(!popup.is_manageable());
    }

    #[test]
    fn test_unframed_size_request_is_honoured() {
        let conn = RecordingTransport::new(ROOT);
        let mut client = ClientWindow::from_notify(&notify(10, ROOT, true), ROOT);
        let request = SizeRequest {
            window: 10,
            width: 320,
            height: 200,
            mask: ConfigMask::WIDTH | ConfigMask::HEIGHT,
            ..Default::default()
        };
        client.update_size_request(&request, &conn).unwrap();
        assert_eq!(client.geometry, Geometry::new(0, 0, 320, 200));
        assert_eq!(conn.calls(), vec![Call::Configure(10)]);
    }

    #[test]
    fn test_framed_size_request_is_only_recorded() {
        let conn = RecordingTransport::new(ROOT);
        let mut client = ClientWindow::from_notify(&notify(10, ROOT, false), ROOT);
        client.frame = Some(500);
        let request = SizeRequest {
            window: 10,
            width: 320,
            mask: ConfigMask::WIDTH,
            ..Default::default()
        };
        client.update_size_request(&request, &conn).unwrap();
        assert_eq!(client.size_request, Some(request));
        assert_eq!(client.geometry.width, 100);
        assert!(conn.calls().is_empty());
    }

    #[test]
    fn test_pending_properties_are_deduplicated() {
        let mut client = ClientWindow::new(10, ROOT, Geometry::default());
        client.update_property(39);
        client.update_property(40);
        client.update_property(39);
        assert_eq!(client.pending_properties(), &[39, 40]);
    }

    #[test]
    fn test_show_maps_client_then_frame() {
        let conn = RecordingTransport::new(ROOT);
        let mut client = ClientWindow::new(10, ROOT, Geometry::default());
        client.show(&conn).unwrap();
        client.frame = Some(500);
        client.show(&conn).unwrap();
        assert_eq!(conn.calls(), vec![Call::Map(10), Call::Map(10), Call::Map(500)]);
    }

    #[test]
    fn test_destroyed_takes_frame_down() {
        let conn = RecordingTransport::new(ROOT);
        let mut client = ClientWindow::new(10, ROOT, Geometry::default());
        client.frame = Some(500);
        client.destroyed(&conn).unwrap();
        assert_eq!(conn.calls(), vec![Call::Destroy(500)]);
    }
}
