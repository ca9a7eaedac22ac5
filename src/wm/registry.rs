//! Window registry
//!
//! Entities are owned once, in `all_entities`. The `clients` and `frames`
//! indices are key sets whose membership follows the entity variant, so an
//! id can never sit in both.

use std::collections::{HashMap, HashSet};

use tracing::warn;

use crate::error::RegistryError;
use crate::wm::client::{ClientWindow, Entity};
use crate::wm::decorations::Frame;
use crate::wm::event::WindowId;

#[derive(Debug, Default)]
pub struct Registry {
    all_entities: HashMap<WindowId, Entity>,
    clients: HashSet<WindowId>,
    frames: HashSet<WindowId>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Track a new entity.
    ///
    /// A duplicate id is refused and the earlier entity is kept as is.
    pub fn register(&mut self, entity: Entity) -> Result<(), RegistryError> {
        let id = entity.id();
        if self.all_entities.contains_key(&id) {
            warn!("Window 0x{:x} is already registered, ignoring", id);
            return Err(RegistryError::Duplicate(id));
        }
        match entity {
            Entity::Client(_) => self.clients.insert(id),
            Entity::Frame(_) => self.frames.insert(id),
        };
        self.all_entities.insert(id, entity);
        Ok(())
    }

    pub fn lookup_any(&self, id: WindowId) -> Option<&Entity> {
        self.all_entities.get(&id)
    }

    pub fn lookup_any_mut(&mut self, id: WindowId) -> Option<&mut Entity> {
        self.all_entities.get_mut(&id)
    }

    pub fn lookup_client(&self, id: WindowId) -> Option<&ClientWindow> {
        if !self.clients.contains(&id) {
            return None;
        }
        self.all_entities.get(&id).and_then(Entity::as_client)
    }

    pub fn lookup_client_mut(&mut self, id: WindowId) -> Option<&mut ClientWindow> {
        if !self.clients.contains(&id) {
            return None;
        }
        self.all_entities.get_mut(&id).and_then(Entity::as_client_mut)
    }

    pub fn lookup_frame(&self, id: WindowId) -> Option<&Frame> {
        if !self.frames.contains(&id) {
            return None;
        }
        self.all_entities.get(&id).and_then(Entity::as_frame)
    }

    pub fn lookup_frame_mut(&mut self, id: WindowId) -> Option<&mut Frame> {
        if !self.frames.contains(&id) {
            return None;
        }
        self.all_entities.get_mut(&id).and_then(Entity::as_frame_mut)
    }

    /// Forget `id` in every index and hand the entity back
    pub fn remove(&mut self, id: WindowId) -> Option<Entity> {
        let entity = self.all_entities.remove(&id);
        self.clients.remove(&id);
        self.frames.remove(&id);
        entity
    }

    pub fn contains(&self, id: WindowId) -> bool {
        self.all_entities.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.all_entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.all_entities.is_empty()
    }

    pub fn clients(&self) -> impl Iterator<Item = &ClientWindow> {
        self.clients
            .iter()
            .filter_map(|id| self.all_entities.get(id).and_then(Entity::as_client))
    }

    pub fn frames(&self) -> impl Iterator<Item = &Frame> {
        self.frames
            .iter()
            .filter_map(|id| self.all_entities.get(id).and_then(Entity::as_frame))
    }

    /// The frame whose back-reference points at `client`
    pub fn frame_for(&self, client: WindowId) -> Option<&Frame> {
        self.frames().find(|frame| frame.client == client)
    }

    pub fn is_client(&self, id: WindowId) -> bool {
        self.clients.contains(&id)
    }

    pub fn is_frame(&self, id: WindowId) -> bool {
        self.frames.contains(&id)
    }
}
