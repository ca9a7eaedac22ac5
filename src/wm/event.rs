//! Decoded protocol events
//!
//! The dispatcher works on this closed enum instead of the transport's raw
//! event type. The X11 driver converts into it (see `crate::x11`), tests
//! build it directly.

use bitflags::bitflags;

use crate::error::DecodeError;
use crate::shared::{Geometry, Rectangle};

/// Raw window identifier as allocated by the display server
pub type WindowId = u32;

/// Raw atom identifier
pub type Atom = u32;

/// Size of a client message payload in bytes
pub const CLIENT_MESSAGE_LEN: usize = 20;

/// Focus event mode (X11 `NotifyMode`)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusMode {
    Normal,
    Grab,
    Ungrab,
    WhileGrabbed,
}

impl From<u8> for FocusMode {
    fn from(value: u8) -> Self {
        match value {
            1 => Self::Grab,
            2 => Self::Ungrab,
            3 => Self::WhileGrabbed,
            _ => Self::Normal,
        }
    }
}

/// Focus event detail (X11 `NotifyDetail`)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusDetail {
    Ancestor,
    Virtual,
    Inferior,
    Nonlinear,
    NonlinearVirtual,
    Pointer,
    PointerRoot,
    None,
}

impl From<u8> for FocusDetail {
    fn from(value: u8) -> Self {
        match value {
            0 => Self::Ancestor,
            1 => Self::Virtual,
            2 => Self::Inferior,
            3 => Self::Nonlinear,
            4 => Self::NonlinearVirtual,
            5 => Self::Pointer,
            6 => Self::PointerRoot,
            _ => Self::None,
        }
    }
}

bitflags! {
    /// Which fields of a configure request are set (X11 `ConfigWindow`)
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ConfigMask: u16 {
        const X = 1 << 0;
        const Y = 1 << 1;
        const WIDTH = 1 << 2;
        const HEIGHT = 1 << 3;
        const BORDER_WIDTH = 1 << 4;
        const SIBLING = 1 << 5;
        const STACK_MODE = 1 << 6;
    }
}

impl Default for ConfigMask {
    fn default() -> Self {
        Self::empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyPress {
    pub keycode: u8,
    /// Modifier and button state mask
    pub state: u16,
    pub time: u32,
    pub root: WindowId,
    pub event: WindowId,
    pub child: WindowId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CreateNotify {
    pub window: WindowId,
    pub parent: WindowId,
    pub geometry: Geometry,
    pub border_width: u16,
    pub override_redirect: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FocusChange {
    pub event: WindowId,
    pub mode: FocusMode,
    pub detail: FocusDetail,
}

impl FocusChange {
    /// Grab/ungrab and pointer-crossing focus events are incidental; only
    /// the rest describe a real focus change.
    pub fn is_genuine(&self) -> bool {
        !matches!(self.mode, FocusMode::Grab | FocusMode::Ungrab)
            && self.detail != FocusDetail::Pointer
    }
}

/// Raw size/position request from a client
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SizeRequest {
    pub window: WindowId,
    pub x: i16,
    pub y: i16,
    pub width: u16,
    pub height: u16,
    pub border_width: u16,
    pub sibling: WindowId,
    pub stack_mode: u32,
    pub mask: ConfigMask,
}

impl SizeRequest {
    /// Apply the masked position/size fields onto `geometry`
    pub fn apply_to(&self, geometry: &mut Geometry) {
        if self.mask.contains(ConfigMask::X) {
            geometry.x = i32::from(self.x);
        }
        if self.mask.contains(ConfigMask::Y) {
            geometry.y = i32::from(self.y);
        }
        if self.mask.contains(ConfigMask::WIDTH) {
            geometry.width = u32::from(self.width);
        }
        if self.mask.contains(ConfigMask::HEIGHT) {
            geometry.height = u32::from(self.height);
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientMessage {
    pub window: WindowId,
    pub type_: Atom,
    pub format: u8,
    pub data: Vec<u8>,
}

/// One decoded event from the display connection
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum XEvent {
    KeyPress(KeyPress),
    KeyRelease(KeyPress),
    CreateNotify(CreateNotify),
    MapRequest { window: WindowId },
    MapNotify { window: WindowId },
    UnmapNotify { window: WindowId },
    EnterNotify { event: WindowId },
    LeaveNotify { event: WindowId },
    FocusIn(FocusChange),
    FocusOut(FocusChange),
    ConfigureRequest(SizeRequest),
    PropertyNotify { window: WindowId, atom: Atom },
    Expose { window: WindowId, area: Rectangle },
    DestroyNotify { window: WindowId },
    ConfigureNotify { window: WindowId },
    ReparentNotify { window: WindowId },
    ClientMessage(ClientMessage),
    /// Anything the dispatcher has no transition for
    Other { kind: String, raw: String },
}

impl XEvent {
    /// Event kind name, for diagnostics
    pub fn kind(&self) -> &str {
        match self {
            XEvent::KeyPress(_) => "KeyPress",
            XEvent::KeyRelease(_) => "KeyRelease",
            XEvent::CreateNotify(_) => "CreateNotify",
            XEvent::MapRequest { .. } => "MapRequest",
            XEvent::MapNotify { .. } => "MapNotify",
            XEvent::UnmapNotify { .. } => "UnmapNotify",
            XEvent::EnterNotify { .. } => "EnterNotify",
            XEvent::LeaveNotify { .. } => "LeaveNotify",
            XEvent::FocusIn(_) => "FocusIn",
            XEvent::FocusOut(_) => "FocusOut",
            XEvent::ConfigureRequest(_) => "ConfigureRequest",
            XEvent::PropertyNotify { .. } => "PropertyNotify",
            XEvent::Expose { .. } => "Expose",
            XEvent::DestroyNotify { .. } => "DestroyNotify",
            XEvent::ConfigureNotify { .. } => "ConfigureNotify",
            XEvent::ReparentNotify { .. } => "ReparentNotify",
            XEvent::ClientMessage(_) => "ClientMessage",
            XEvent::Other { kind, .. } => kind.as_str(),
        }
    }
}

/// Decode a client message payload as five little-endian 32-bit words
pub fn decode_client_message(data: &[u8]) -> Result<[u32; 5], DecodeError> {
    if data.len() != CLIENT_MESSAGE_LEN {
        return Err(DecodeError::PayloadLength(data.len()));
    }
    let mut words = [0u32; 5];
    for (word, chunk) in words.iter_mut().zip(data.chunks_exact(4)) {
        *word = u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
    }
    Ok(words)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_client_message_words() {
        let mut data = Vec::new();
        for word in [1u32, 0xdead_beef, 0, u32::MAX, 42] {
            data.extend_from_slice(&word.to_le_bytes());
        }
        assert_eq!(
            decode_client_message(&data),
            Ok([1, 0xdead_beef, 0, u32::MAX, 42])
        );
    }

    #[test]
    fn test_decode_client_message_is_little_endian() {
        let mut data = [0u8; 20];
        data[0] = 0x01;
        data[1] = 0x02;
        let words = decode_client_message(&data).unwrap();
        assert_eq!(words[0], 0x0201);
    }

    #[test]
    fn test_decode_client_message_rejects_wrong_length() {
        assert_eq!(
            decode_client_message(&[0u8; 19]),
            Err(DecodeError::PayloadLength(19))
        );
        assert_eq!(
            decode_client_message(&[0u8; 24]),
            Err(DecodeError::PayloadLength(24))
        );
    }

    #[test]
    fn test_focus_guard() {
        let genuine = FocusChange {
            event: 1,
            mode: FocusMode::WhileGrabbed,
            detail: FocusDetail::Nonlinear,
        };
        assert!(genuine.is_genuine());

        for mode in [FocusMode::Grab, FocusMode::Ungrab] {
            let ev = FocusChange { mode, ..genuine };
            assert!(!ev.is_genuine());
        }
        for mode in [FocusMode::Normal, FocusMode::WhileGrabbed] {
            let ev = FocusChange {
                mode,
                detail: FocusDetail::Pointer,
                ..genuine
            };
            assert!(!ev.is_genuine());
        }
    }

    #[test]
    fn test_size_request_applies_masked_fields_only() {
        let req = SizeRequest {
            window: 7,
            x: 10,
            width: 300,
            height: 999,
            mask: ConfigMask::X | ConfigMask::WIDTH,
            ..Default::default()
        };
        let mut geometry = Geometry::new(1, 2, 3, 4);
        req.apply_to(&mut geometry);
        assert_eq!(geometry, Geometry::new(10, 2, 300, 4));
    }

    #[test]
    fn test_notify_enumerants_decode() {
        assert_eq!(FocusMode::from(1), FocusMode::Grab);
        assert_eq!(FocusMode::from(3), FocusMode::WhileGrabbed);
        assert_eq!(FocusDetail::from(5), FocusDetail::Pointer);
        assert_eq!(FocusDetail::from(200), FocusDetail::None);
    }
}
