//! Window Manager Module
//!
//! The dispatcher, the registry it owns, the entities it tracks, and the
//! ports to its collaborators.

pub mod client;
pub mod decorations;
pub mod event;
pub mod events;
pub mod factory;
pub mod groups;
pub mod keyboard;
pub mod ports;
pub mod registry;

pub use client::{ClientWindow, Entity};
pub use decorations::Frame;
pub use event::XEvent;
pub use events::{EventDispatcher, EventResult, ExistingWindow};
pub use registry::Registry;
