//! Typed errors for the window manager core.
//!
//! The dispatcher never lets these escape the event loop; they exist so the
//! registry and decoders can tell their callers exactly what went wrong
//! before the caller logs and moves on.

use thiserror::Error;

use crate::wm::event::WindowId;

/// Registry membership errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    /// The id is already tracked; the earlier entity was kept.
    #[error("window 0x{0:x} is already registered")]
    Duplicate(WindowId),
}

/// Errors decoding raw event payloads.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DecodeError {
    /// A client message payload must be exactly 20 bytes.
    #[error("client message payload must be 20 bytes, got {0}")]
    PayloadLength(usize),
}
