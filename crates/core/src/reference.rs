//! References between catalog entities.

use serde::{Deserialize, Serialize};

use crate::resource::Resource;
use crate::types::EntityId;

/// A reference to another entity.
///
/// Depending on the endpoint the server either sends the bare identifier or
/// the populated object. Both forms expose the referenced id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Ref<T> {
    Id(EntityId),
    Populated(Box<T>),
}

impl<T: Resource> Ref<T> {
    pub fn id(&self) -> &str {
        match self {
            Ref::Id(id) => id,
            Ref::Populated(entity) => entity.id(),
        }
    }

    pub fn populated(&self) -> Option<&T> {
        match self {
            Ref::Id(_) => None,
            Ref::Populated(entity) => Some(entity),
        }
    }
}
