//! Value types shared between the window manager core and the X11 driver.

pub mod window_state;

pub use window_state::{Geometry, Rectangle};
