//! Resolution scopes
//!
//! A [`ResolutionScope`] plays the part of a class loader: it is the set of
//! portable types a reader can materialize. Resolution happens by portable
//! name (when decoding a descriptor) and by `TypeId` (when encoding a value).
//!
//! Scopes carry a process-unique [`ScopeId`]; factories are cached per
//! (policy, scope) pair.

use crate::codec::{FieldReader, FieldWriter, Portable};
use crate::error::{Result, SerializationError};
use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use std::any::{Any, TypeId};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

static NEXT_SCOPE_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique scope identity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ScopeId(u64);

impl fmt::Display for ScopeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "scope#{}", self.0)
    }
}

type WriteFn = fn(&dyn Any, &mut FieldWriter<'_, '_>) -> Result<()>;
type ReadFn = fn(&mut FieldReader<'_, '_>) -> Result<Box<dyn Any + Send + Sync>>;

/// Runtime handle for a portable type
#[derive(Clone)]
pub struct ClassInfo {
    name: &'static str,
    type_id: TypeId,
    rust_name: &'static str,
    write: WriteFn,
    read: ReadFn,
}

impl ClassInfo {
    /// Handle for `T`
    pub fn of<T: Portable>() -> Self {
        ClassInfo {
            name: T::TYPE_NAME,
            type_id: TypeId::of::<T>(),
            rust_name: std::any::type_name::<T>(),
            write: write_erased::<T>,
            read: read_erased::<T>,
        }
    }

    /// Portable type name
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Rust type id
    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    pub(crate) fn write_fields(&self, value: &dyn Any, fields: &mut FieldWriter<'_, '_>) -> Result<()> {
        (self.write)(value, fields)
    }

    pub(crate) fn read_fields(
        &self,
        fields: &mut FieldReader<'_, '_>,
    ) -> Result<Box<dyn Any + Send + Sync>> {
        (self.read)(fields)
    }
}

impl fmt::Debug for ClassInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClassInfo")
            .field("name", &self.name)
            .field("rust_name", &self.rust_name)
            .finish()
    }
}

fn write_erased<T: Portable>(value: &dyn Any, fields: &mut FieldWriter<'_, '_>) -> Result<()> {
    let value = value
        .downcast_ref::<T>()
        .ok_or_else(|| SerializationError::mismatch(T::TYPE_NAME, "value of another type"))?;
    value.write_fields(fields)
}

fn read_erased<T: Portable>(fields: &mut FieldReader<'_, '_>) -> Result<Box<dyn Any + Send + Sync>> {
    Ok(Box::new(T::read_fields(fields)?))
}

#[derive(Default)]
struct Classes {
    by_name: FxHashMap<&'static str, Arc<ClassInfo>>,
    by_type: FxHashMap<TypeId, Arc<ClassInfo>>,
}

/// Set of portable types a factory can resolve
pub struct ResolutionScope {
    id: ScopeId,
    label: String,
    classes: RwLock<Classes>,
}

impl ResolutionScope {
    /// Empty scope
    pub fn new(label: impl Into<String>) -> Self {
        ResolutionScope {
            id: ScopeId(NEXT_SCOPE_ID.fetch_add(1, Ordering::Relaxed)),
            label: label.into(),
            classes: RwLock::new(Classes::default()),
        }
    }

    /// Builder-style [`ResolutionScope::load`]
    pub fn with<T: Portable>(self) -> Self {
        self.load::<T>();
        self
    }

    /// Make `T` resolvable in this scope
    ///
    /// Loading the same type twice is a no-op.
    pub fn load<T: Portable>(&self) {
        self.load_class(ClassInfo::of::<T>());
    }

    /// Make a type resolvable from its handle
    pub fn load_class(&self, class: ClassInfo) {
        let class = Arc::new(class);
        let mut classes = self.classes.write();
        classes.by_name.insert(class.name, Arc::clone(&class));
        classes.by_type.insert(class.type_id, class);
    }

    /// Identity used for factory caching
    pub fn id(&self) -> ScopeId {
        self.id
    }

    /// Human readable label
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Resolve a portable name
    pub fn resolve(&self, name: &str) -> Option<Arc<ClassInfo>> {
        self.classes.read().by_name.get(name).cloned()
    }

    /// Resolve a Rust type
    pub fn class_of(&self, type_id: TypeId) -> Option<Arc<ClassInfo>> {
        self.classes.read().by_type.get(&type_id).cloned()
    }

    /// Number of loaded types
    pub fn len(&self) -> usize {
        self.classes.read().by_name.len()
    }

    /// True if nothing is loaded
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Debug for ResolutionScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolutionScope")
            .field("id", &self.id)
            .field("label", &self.label)
            .field("types", &self.len())
            .finish()
    }
}
