//! Keyboard Module
//!
//! Default key-binding registry: exact `(modifiers, keycode)` lookup of the
//! bindings from the config file. A match spawns the bound shell command;
//! a runtime task waits on each child so none is left as a zombie.

use anyhow::{Context, Result};
use std::collections::HashMap;
use tokio::process::Command;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::KeyBindingConfig;
use crate::wm::event::KeyPress;
use crate::wm::ports::KeyBindings;

/// Modifier bits that take part in matching. Lock and NumLock (Mod2) are
/// masked out so bindings work regardless of their state.
pub const MODIFIER_MASK: u16 = SHIFT | CONTROL | MOD1 | MOD4;

pub const SHIFT: u16 = 1 << 0;
pub const CONTROL: u16 = 1 << 2;
/// Alt
pub const MOD1: u16 = 1 << 3;
/// Super/Windows
pub const MOD4: u16 = 1 << 6;

pub struct KeyRegistry {
    bindings: HashMap<(u16, u8), String>,
}

impl KeyRegistry {
    pub fn new(bindings: &[KeyBindingConfig]) -> Self {
        let mut registry = Self {
            bindings: HashMap::new(),
        };
        for binding in bindings {
            registry.add_binding(binding.modifiers, binding.keycode, binding.command.clone());
        }
        registry
    }

    pub fn add_binding(&mut self, modifiers: u16, keycode: u8, command: String) {
        debug!(
            "Adding key binding: modifiers={:x}, keycode={}, command={:?}",
            modifiers, keycode, command
        );
        let previous = self.bindings.insert((modifiers & MODIFIER_MASK, keycode), command);
        if let Some(previous) = previous {
            warn!("Key binding {:x}+{} replaced {:?}", modifiers, keycode, previous);
        }
    }

    /// Every bound `(modifiers, keycode)` pair, for grabbing on the root
    pub fn grabs(&self) -> impl Iterator<Item = (u16, u8)> + '_ {
        self.bindings.keys().copied()
    }

    /// Command bound to this key press, if any
    pub fn resolve(&self, event: &KeyPress) -> Option<&str> {
        self.bindings
            .get(&(event.state & MODIFIER_MASK, event.keycode))
            .map(String::as_str)
    }
}

impl KeyBindings for KeyRegistry {
    fn dispatch_event(&mut self, event: &KeyPress) {
        let Some(command) = self.resolve(event) else {
            debug!("Unbound key: state={:x}, keycode={}", event.state, event.keycode);
            return;
        };
        if let Err(e) = spawn_command(command) {
            warn!("Key binding {:?} failed: {:#}", command, e);
        }
    }
}

fn spawn_command(command: &str) -> Result<JoinHandle<()>> {
    let runtime = Handle::try_current().context("No runtime to reap the command")?;
    info!("Launching: {}", command);
    let mut child = Command::new("sh")
        .arg("-c")
        .arg(command)
        .spawn()
        .context("Failed to spawn command")?;

    let command = command.to_string();
    Ok(runtime.spawn(async move {
        match child.wait().await {
            Ok(status) => debug!("{:?} exited: {}", command, status),
            Err(e) => warn!("Failed to wait for {:?}: {}", command, e),
        }
    }))
}
