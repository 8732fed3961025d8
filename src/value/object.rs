use crate::{
    builder::SynthesizedImplementation, strategy::Fragment, types::TypeDescription, value::Value,
};
use std::{
    fmt::{Debug, Formatter},
    hash::{Hash, Hasher},
    sync::Arc,
};

/// A constructed synthesized implementation.
pub struct Instance {
    implementation: Arc<SynthesizedImplementation>,
    arguments: Vec<Value>,
}

impl Instance {
    pub(crate) fn new(
        implementation: Arc<SynthesizedImplementation>,
        arguments: Vec<Value>,
    ) -> Self {
        Self {
            implementation,
            arguments,
        }
    }

    pub fn implementation(&self) -> &Arc<SynthesizedImplementation> {
        &self.implementation
    }

    pub fn target(&self) -> &TypeDescription {
        self.implementation.target()
    }

    pub fn arguments(&self) -> &[Value] {
        &self.arguments
    }

    /// Fragment wired to the first member called `name`.
    pub fn fragment(&self, name: &str) -> Option<&Fragment> {
        self.implementation.member(name).map(|m| &m.fragment)
    }
}

impl Debug for Instance {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{:?}", self.implementation.name(), self.arguments)
    }
}

/// Shared handle to an [`Instance`]; equal only to handles of the same instance.
#[derive(Clone)]
#[repr(transparent)]
pub struct ObjectRef(pub Arc<Instance>);

impl ObjectRef {
    pub fn target(&self) -> &TypeDescription {
        self.0.target()
    }
}

impl PartialEq for ObjectRef {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for ObjectRef {}

impl Hash for ObjectRef {
    fn hash<H: Hasher>(&self, state: &mut H) {
        (Arc::as_ptr(&self.0) as usize).hash(state);
    }
}

impl Debug for ObjectRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}@{:p}", self.0, Arc::as_ptr(&self.0))
    }
}
