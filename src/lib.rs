//! Tilenol
//!
//! Event routing and window lifecycle core of a tiling X11 window manager:
//! decoded protocol events go through a single dispatcher that keeps the
//! window/frame registry coherent and hands off to the key-binding and
//! grouping collaborators.

pub mod config;
pub mod error;
pub mod shared;
pub mod wm;
pub mod x11;
pub mod x11_async;

#[cfg(test)]
pub(crate) mod testing;
