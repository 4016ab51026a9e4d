//! Serializer registry
//!
//! Binds serializers to Rust types and to their wire descriptors. Two entry
//! points decide what happens when a type is already bound:
//!
//! | Method | Same id bound | Different id bound |
//! |--------|---------------|--------------------|
//! | [`SerializerRegistry::register_default`] | `Unchanged` | `Kept` (existing wins) |
//! | [`SerializerRegistry::register`] | `Unchanged` | `Replaced` (new wins) |
//!
//! Built-ins go through `register_default`, contributed serializers through
//! `register`, so a contribution can shadow a built-in but a later built-in
//! pass never undoes a contribution.

use crate::error::{Result, SerializationError};
use crate::serializer::{Serializer, SerializerId};
use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use std::any::TypeId;
use std::sync::Arc;
use tracing::{debug, info};

/// Outcome of a registration
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Registration {
    /// Type was unbound
    Added,
    /// The same serializer was already bound
    Unchanged,
    /// A different serializer was bound and has been replaced
    Replaced {
        /// Id of the displaced serializer
        previous: SerializerId,
    },
    /// A different serializer was bound and has been kept
    Kept {
        /// Id of the serializer still bound
        existing: SerializerId,
    },
}

#[derive(Default)]
struct Bindings {
    by_type: FxHashMap<TypeId, Arc<dyn Serializer>>,
    by_descriptor: FxHashMap<String, Arc<dyn Serializer>>,
}

/// Type and descriptor bindings for one factory
#[derive(Default)]
pub struct SerializerRegistry {
    bindings: RwLock<Bindings>,
}

impl SerializerRegistry {
    /// Empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind unless the type already has a serializer
    pub fn register_default(&self, serializer: Arc<dyn Serializer>) -> Result<Registration> {
        self.bind(serializer, false)
    }

    /// Bind, replacing any different serializer for the type
    pub fn register(&self, serializer: Arc<dyn Serializer>) -> Result<Registration> {
        self.bind(serializer, true)
    }

    fn bind(&self, serializer: Arc<dyn Serializer>, replace: bool) -> Result<Registration> {
        let type_id = serializer.target_type();
        let descriptor = serializer.descriptor().to_string();
        let mut bindings = self.bindings.write();

        if let Some(owner) = bindings.by_descriptor.get(&descriptor) {
            if owner.target_type() != type_id {
                return Err(SerializationError::DescriptorConflict(descriptor));
            }
        }

        let existing = bindings.by_type.get(&type_id).map(Arc::clone);
        let outcome = match existing {
            Some(current) if current.id() == serializer.id() => return Ok(Registration::Unchanged),
            Some(current) if !replace => {
                return Ok(Registration::Kept {
                    existing: current.id(),
                })
            }
            Some(current) => {
                bindings.by_descriptor.remove(current.descriptor());
                info!(
                    previous = %current.id(),
                    replacement = %serializer.id(),
                    "serializer replaced"
                );
                Registration::Replaced {
                    previous: current.id(),
                }
            }
            None => Registration::Added,
        };

        debug!(serializer = %serializer.id(), descriptor = %descriptor, "serializer bound");
        bindings.by_descriptor.insert(descriptor, Arc::clone(&serializer));
        bindings.by_type.insert(type_id, serializer);
        Ok(outcome)
    }

    /// Serializer bound to a Rust type
    pub fn by_type(&self, type_id: TypeId) -> Option<Arc<dyn Serializer>> {
        self.bindings.read().by_type.get(&type_id).cloned()
    }

    /// Serializer bound to a wire descriptor
    pub fn by_descriptor(&self, descriptor: &str) -> Option<Arc<dyn Serializer>> {
        self.bindings.read().by_descriptor.get(descriptor).cloned()
    }

    /// Number of bound types
    pub fn len(&self) -> usize {
        self.bindings.read().by_type.len()
    }

    /// True if nothing is bound
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Bound descriptors, sorted
    pub fn descriptors(&self) -> Vec<String> {
        let mut names: Vec<String> = self.bindings.read().by_descriptor.keys().cloned().collect();
        names.sort();
        names
    }
}
