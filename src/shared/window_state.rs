//! Geometry values carried by events and entities
//!
//! Plain copyable data: nothing in here talks to the display.

/// Window geometry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Geometry {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl Geometry {
    pub fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self { x, y, width, height }
    }

    /// Grow the geometry outwards by `border` pixels on every side.
    ///
    /// Used to size a frame around the client it decorates.
    pub fn inflate(&self, border: u32) -> Self {
        let offset = i32::try_from(border).unwrap_or(i32::MAX);
        let grow = border.saturating_mul(2);
        Self {
            x: self.x.saturating_sub(offset),
            y: self.y.saturating_sub(offset),
            width: self.width.saturating_add(grow),
            height: self.height.saturating_add(grow),
        }
    }
}

/// Damaged area reported by an Expose event, relative to the window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rectangle {
    pub x: u16,
    pub y: u16,
    pub width: u16,
    pub height: u16,
}

impl Rectangle {
    pub fn new(x: u16, y: u16, width: u16, height: u16) -> Self {
        Self { x, y, width, height }
    }

    /// Smallest rectangle covering both `self` and `other`
    pub fn union(&self, other: &Rectangle) -> Rectangle {
        let x = self.x.min(other.x);
        let y = self.y.min(other.y);
        let right = (u32::from(self.x) + u32::from(self.width))
            .max(u32::from(other.x) + u32::from(other.width));
        let bottom = (u32::from(self.y) + u32::from(self.height))
            .max(u32::from(other.y) + u32::from(other.height));
        Rectangle {
            x,
            y,
            width: (right - u32::from(x)).min(u32::from(u16::MAX)) as u16,
            height: (bottom - u32::from(y)).min(u32::from(u16::MAX)) as u16,
        }
    }
}
