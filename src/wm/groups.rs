//! Default group manager
//!
//! Named groups from the config file. A window that becomes manageable
//! joins the current group and is shown; layout inside a group is left to
//! the client's own geometry.

use tracing::{debug, warn};

use crate::wm::client::ClientWindow;
use crate::wm::event::WindowId;
use crate::wm::ports::{GroupId, GroupManager, Transport};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Group {
    pub name: String,
    pub windows: Vec<WindowId>,
}

pub struct Groups<T> {
    conn: T,
    groups: Vec<Group>,
    current: GroupId,
}

impl<T: Transport> Groups<T> {
    pub fn new(conn: T, names: &[String]) -> Self {
        let mut groups: Vec<Group> = names
            .iter()
            .map(|name| Group {
                name: name.clone(),
                windows: Vec::new(),
            })
            .collect();
        if groups.is_empty() {
            warn!("No groups configured, using a single default group");
            groups.push(Group {
                name: "1".into(),
                windows: Vec::new(),
            });
        }
        Self {
            conn,
            groups,
            current: 0,
        }
    }

    pub fn current(&self) -> GroupId {
        self.current
    }

    pub fn get(&self, group: GroupId) -> Option<&Group> {
        self.groups.get(group)
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Group `window` belongs to, if any
    pub fn group_of(&self, window: WindowId) -> Option<GroupId> {
        self.groups
            .iter()
            .position(|group| group.windows.contains(&window))
    }
}

impl<T: Transport> GroupManager for Groups<T> {
    fn add_window(&mut self, window: &ClientWindow) -> GroupId {
        let group = self.current;
        self.groups[group].windows.push(window.id);
        debug!(
            "Window 0x{:x} joined group {:?}",
            window.id, self.groups[group].name
        );

        if let Err(e) = window.show(&self.conn) {
            warn!("Failed to show window 0x{:x}: {:#}", window.id, e);
        }
        group
    }

    fn remove_window(&mut self, group: GroupId, window: WindowId) {
        match self.groups.get_mut(group) {
            Some(group) => group.windows.retain(|id| *id != window),
            None => warn!("Remove of 0x{:x} from unknown group {}", window, group),
        }
    }
}
