//! Administrative actor references.
//!
//! A block record only stores an opaque [`ActorId`]. Resolving it to a
//! display name goes through an [`ActorDirectory`]; the store never owns or
//! validates actors.

use crate::config::AdminBlock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Opaque identifier of the administrator (or automated system) that set a block.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActorId(String);

impl ActorId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Display information for a resolved actor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    pub id: ActorId,
    pub name: String,
}

/// Lookup capability for actor references.
pub trait ActorDirectory: Send + Sync {
    /// Resolve an actor, or `None` if the id is unknown.
    fn lookup(&self, id: &ActorId) -> Option<Actor>;
}

/// Directory built from `[[admin]]` config blocks.
#[derive(Debug, Clone, Default)]
pub struct ConfiguredActors {
    actors: HashMap<ActorId, Actor>,
}

impl ConfiguredActors {
    pub fn from_blocks(blocks: &[AdminBlock]) -> Self {
        let actors = blocks
            .iter()
            .map(|b| {
                let id = ActorId::new(b.id.clone());
                let actor = Actor {
                    id: id.clone(),
                    name: b.name.clone().unwrap_or_else(|| b.id.clone()),
                };
                (id, actor)
            })
            .collect();
        Self { actors }
    }

    pub fn len(&self) -> usize {
        self.actors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actors.is_empty()
    }
}

impl ActorDirectory for ConfiguredActors {
    fn lookup(&self, id: &ActorId) -> Option<Actor> {
        self.actors.get(id).cloned()
    }
}
