//! Decoration frames wrapped around managed top-level clients

use anyhow::Result;
use tracing::debug;

use crate::config::FrameConfig;
use crate::shared::{Geometry, Rectangle};
use crate::wm::event::WindowId;
use crate::wm::ports::Transport;

/// A frame window holding one reparented client
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// The frame's own window id
    pub id: WindowId,
    /// Client it decorates (non-owning, look it up in the registry)
    pub client: WindowId,
    pub geometry: Geometry,
    pub visible: bool,
    pub focused: bool,
    /// Area waiting to be repainted
    damage: Option<Rectangle>,
}

impl Frame {
    /// Create a frame window around `client` and reparent the client into it.
    ///
    /// The frame is `border` pixels larger than the client on every side.
    pub fn new(conn: &dyn Transport, client: WindowId, geometry: Geometry, border: u32) -> Result<Self> {
        let id = conn.generate_id()?;
        let frame_geometry = geometry.inflate(border);
        conn.create_frame(id, frame_geometry)?;
        let offset = i16::try_from(border).unwrap_or(i16::MAX);
        if let Err(e) = conn.reparent_window(client, id, offset, offset) {
            conn.destroy_window(id)?;
            return Err(e);
        }
        debug!("Framed client 0x{:x} in 0x{:x}", client, id);
        Ok(Self::from_parts(id, client, frame_geometry))
    }

    /// A frame record for an already existing frame window
    pub fn from_parts(id: WindowId, client: WindowId, geometry: Geometry) -> Self {
        Self {
            id,
            client,
            geometry,
            visible: false,
            focused: false,
            damage: None,
        }
    }

    /// Give input focus to the decorated client
    pub fn focus(&self, conn: &dyn Transport) -> Result<()> {
        conn.set_input_focus(self.client)
    }

    pub fn hide(&mut self, conn: &dyn Transport) -> Result<()> {
        self.visible = false;
        conn.unmap_window(self.id)
    }

    pub fn focus_in(&mut self) {
        self.focused = true;
    }

    pub fn focus_out(&mut self) {
        self.focused = false;
    }

    pub fn expose(&mut self, area: Rectangle) {
        self.damage = Some(match self.damage {
            Some(damage) => damage.union(&area),
            None => area,
        });
    }

    /// Take the accumulated damage, leaving the frame clean
    pub fn take_damage(&mut self) -> Option<Rectangle> {
        self.damage.take()
    }

    /// Border colour for the current focus state
    pub fn border_colour(&self, config: &FrameConfig) -> u32 {
        if self.focused {
            config.active_border
        } else {
            config.inactive_border
        }
    }

    /// Paint the frame in its border colour and clear the damaged area, or
    /// the whole frame when nothing is pending.
    pub fn repaint(&mut self, conn: &dyn Transport, config: &FrameConfig) -> Result<()> {
        conn.set_background(self.id, self.border_colour(config))?;
        let area = self.take_damage().unwrap_or_default();
        conn.clear_area(self.id, area)
    }

    pub fn damage(&self) -> Option<Rectangle> {
        self.damage
    }

    pub fn destroyed(self) {
        debug!("Frame 0x{:x} of client 0x{:x} destroyed", self.id, self.client);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{Call, RecordingTransport};

    #[test]
    fn test_new_frame_reparents_client() {
        let conn = RecordingTransport::new(1);
        let frame = Frame::new(&conn, 10, Geometry::new(100, 100, 200, 150), 2).unwrap();
        assert_eq!(frame.client, 10);
        assert_ne!(frame.id, 10);
        assert_eq!(frame.geometry, Geometry::new(98, 98, 204, 154));
        assert_eq!(
            conn.calls(),
            vec![
                Call::CreateFrame(frame.id),
                Call::Reparent { window: 10, parent: frame.id },
            ]
        );
    }

    #[test]
    fn test_expose_accumulates_damage() {
        let mut frame = Frame::from_parts(500, 10, Geometry::default());
        frame.expose(Rectangle::new(0, 0, 4, 4));
        frame.expose(Rectangle::new(10, 2, 4, 4));
        assert_eq!(frame.take_damage(), Some(Rectangle::new(0, 0, 14, 6)));
        assert_eq!(frame.damage(), None);
    }

    #[test]
    fn test_repaint_follows_focus() {
        let conn = RecordingTransport::new(1);
        let config = FrameConfig::default();
        let mut frame = Frame::from_parts(500, 10, Geometry::default());
        let whole = Rectangle::default();

        frame.focus_in();
        frame.repaint(&conn, &config).unwrap();
        frame.focus_out();
        frame.expose(Rectangle::new(0, 0, 2, 30));
        frame.repaint(&conn, &config).unwrap();

        assert_eq!(
            conn.calls(),
            vec![
                Call::SetBackground { window: 500, pixel: config.active_border },
                Call::ClearArea { window: 500, area: whole },
                Call::SetBackground { window: 500, pixel: config.inactive_border },
                Call::ClearArea { window: 500, area: Rectangle::new(0, 0, 2, 30) },
            ]
        );
        assert_eq!(frame.damage(), None);
    }

    #[test]
    fn test_hide_unmaps_frame_window() {
        let conn = RecordingTransport::new(1);
        let mut frame = Frame::from_parts(500, 10, Geometry::default());
        frame.visible = true;
        frame.hide(&conn).unwrap();
        assert!(!frame.visible);
        assert_eq!(conn.calls(), vec![Call::Unmap(500)]);
    }

    #[test]
    fn test_focus_targets_client() {
        let conn = RecordingTransport::new(1);
        let frame = Frame::from_parts(500, 10, Geometry::default());
        frame.focus(&conn).unwrap();
        assert_eq!(conn.calls(), vec![Call::SetFocus(10)]);
    }
}
